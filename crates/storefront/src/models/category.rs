//! Category domain types.

use serde::Serialize;

use freshdart_core::CategoryId;

/// Minimal category reference embedded in products and category details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A category with the number of active products in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub product_count: i64,
}

impl Category {
    #[must_use]
    pub fn to_ref(&self) -> CategoryRef {
        CategoryRef {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
        }
    }
}

/// A root category and its direct children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Category>,
}

/// A category with its parent and children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub parent: Option<CategoryRef>,
    pub children: Vec<Category>,
}

/// Group a name-ordered category list into roots with their children.
///
/// Children whose parent is missing from the list are dropped, matching a
/// hierarchy that only shows reachable categories.
#[must_use]
pub fn build_hierarchy(categories: Vec<Category>) -> Vec<CategoryNode> {
    let (roots, children): (Vec<_>, Vec<_>) =
        categories.into_iter().partition(|c| c.parent_id.is_none());

    roots
        .into_iter()
        .map(|root| {
            let kids = children
                .iter()
                .filter(|child| child.parent_id == Some(root.id))
                .cloned()
                .collect();
            CategoryNode {
                category: root,
                children: kids,
            }
        })
        .collect()
}
