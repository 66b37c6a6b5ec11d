//! Category repository.

use sqlx::PgPool;

use freshdart_core::CategoryId;

use super::RepositoryError;
use crate::models::category::{Category, CategoryDetail, CategoryNode, build_hierarchy};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
    description: Option<String>,
    image: Option<String>,
    parent_id: Option<i32>,
    product_count: i64,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: row.slug,
            description: row.description,
            image: row.image,
            parent_id: row.parent_id.map(CategoryId::new),
            product_count: row.product_count,
        }
    }
}

/// Categories with their count of active products.
const CATEGORY_SELECT: &str = r"
    SELECT c.id, c.name, c.slug, c.description, c.image, c.parent_id,
           (SELECT COUNT(*) FROM storefront.product p
            WHERE p.category_id = c.id AND p.status = 'ACTIVE') AS product_count
    FROM storefront.category c
";

/// Repository for category queries.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "{CATEGORY_SELECT} ORDER BY c.name ASC, c.id ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Root categories with their children, both ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn hierarchy(&self) -> Result<Vec<CategoryNode>, RepositoryError> {
        Ok(build_hierarchy(self.list().await?))
    }

    /// A category with its parent and children.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<CategoryDetail>, RepositoryError> {
        let Some(row) =
            sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} WHERE c.slug = $1"))
                .bind(slug)
                .fetch_optional(self.pool)
                .await?
        else {
            return Ok(None);
        };
        let category = Category::from(row);

        let parent = match category.parent_id {
            Some(parent_id) => sqlx::query_as::<_, CategoryRow>(&format!(
                "{CATEGORY_SELECT} WHERE c.id = $1"
            ))
            .bind(parent_id)
            .fetch_optional(self.pool)
            .await?
            .map(|row| Category::from(row).to_ref()),
            None => None,
        };

        let children = sqlx::query_as::<_, CategoryRow>(&format!(
            "{CATEGORY_SELECT} WHERE c.parent_id = $1 ORDER BY c.name ASC, c.id ASC"
        ))
        .bind(category.id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

        Ok(Some(CategoryDetail {
            category,
            parent,
            children,
        }))
    }
}
