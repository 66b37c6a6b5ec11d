//! Product repository: catalog listing, lookup and search.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use freshdart_core::{
    CategoryId, Freshness, ProductId, ProductImageId, ProductStatus, StockType, UserId,
};

use super::RepositoryError;
use crate::models::category::CategoryRef;
use crate::models::pagination::{Cursor, Page};
use crate::models::product::{Product, ProductImage, ProductQuery};

/// Columns shared by every product query; `p` is the product, `c` its category.
const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.name, p.slug, p.description, p.short_description,
           p.price, p.compare_at_price, p.stock_type, p.stock_quantity,
           p.stock_unit, p.min_order_qty, p.max_order_qty, p.weight_kg,
           p.best_before, p.shelf_life_days, p.status, p.featured, p.tags,
           p.created_at,
           c.id AS category_id, c.name AS category_name, c.slug AS category_slug
    FROM storefront.product p
    LEFT JOIN storefront.category c ON c.id = p.category_id
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    slug: String,
    description: Option<String>,
    short_description: Option<String>,
    price: Decimal,
    compare_at_price: Option<Decimal>,
    stock_type: StockType,
    stock_quantity: Decimal,
    stock_unit: String,
    min_order_qty: Decimal,
    max_order_qty: Option<Decimal>,
    weight_kg: Decimal,
    best_before: Option<DateTime<Utc>>,
    shelf_life_days: Option<i32>,
    status: ProductStatus,
    featured: bool,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    category_id: Option<i32>,
    category_name: Option<String>,
    category_slug: Option<String>,
}

impl ProductRow {
    fn into_product(self, images: Vec<ProductImage>, now: DateTime<Utc>) -> Product {
        let category = match (self.category_id, self.category_name, self.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(CategoryRef {
                id: CategoryId::new(id),
                name,
                slug,
            }),
            _ => None,
        };

        Product {
            id: ProductId::new(self.id),
            name: self.name,
            slug: self.slug,
            description: self.description,
            short_description: self.short_description,
            price: self.price,
            compare_at_price: self.compare_at_price,
            stock_type: self.stock_type,
            stock_quantity: self.stock_quantity,
            stock_unit: self.stock_unit,
            min_order_qty: self.min_order_qty,
            max_order_qty: self.max_order_qty,
            weight_kg: self.weight_kg,
            best_before: self.best_before,
            shelf_life_days: self.shelf_life_days,
            status: self.status,
            featured: self.featured,
            tags: self.tags,
            category,
            images,
            freshness: Freshness::at(self.best_before, now),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductImageRow {
    id: i32,
    product_id: i32,
    url: String,
    alt: Option<String>,
    is_primary: bool,
    sort_order: i32,
}

impl From<ProductImageRow> for ProductImage {
    fn from(row: ProductImageRow) -> Self {
        Self {
            id: ProductImageId::new(row.id),
            url: row.url,
            alt: row.alt,
            is_primary: row.is_primary,
            sort_order: row.sort_order,
        }
    }
}

/// Producer-facing product counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, sqlx::FromRow)]
pub struct ProducerProductStats {
    pub active_products: i64,
    pub out_of_stock: i64,
    pub expiring_soon: i64,
}

/// Escape `LIKE` wildcards and wrap the term for a substring match.
fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Repository for catalog queries.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Filtered, sorted listing with cursor pagination.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        query: &ProductQuery,
        limit: i64,
        cursor: Cursor,
    ) -> Result<Page<Product>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(PRODUCT_SELECT);
        qb.push(" WHERE p.status = ").push_bind(query.status);

        if let Some(slug) = &query.category_slug {
            qb.push(" AND c.slug = ").push_bind(slug.clone());
        }
        if let Some(featured) = query.featured {
            qb.push(" AND p.featured = ").push_bind(featured);
        }
        if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
            let pattern = contains_pattern(term);
            qb.push(" AND (p.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.description ILIKE ")
                .push_bind(pattern)
                .push(" OR ")
                .push_bind(term.to_lowercase())
                .push(" = ANY(p.tags))");
        }

        let direction = query.sort_order.keyword();
        qb.push(format!(
            " ORDER BY {} {direction} NULLS LAST, p.id {direction}",
            query.sort_by.column()
        ));
        qb.push(" LIMIT ")
            .push_bind(limit + 1)
            .push(" OFFSET ")
            .push_bind(cursor.offset());

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;
        let products = self.attach_images(rows).await?;

        Ok(Page::from_overfetch(products, cursor, limit))
    }

    /// Featured active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT}
             WHERE p.featured AND p.status = 'ACTIVE'
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        self.attach_images(rows).await
    }

    /// Look up a product by slug regardless of status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.slug = $1"))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        Ok(self.attach_images(row.into_iter().collect()).await?.pop())
    }

    /// Products with the given IDs, in no particular order. Unknown IDs are
    /// simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE p.id = ANY($1)"
        ))
        .bind(raw)
        .fetch_all(self.pool)
        .await?;

        self.attach_images(rows).await
    }

    /// Active products whose best-before falls within the next `days` days,
    /// soonest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn expiring_soon(&self, days: i64) -> Result<Vec<Product>, RepositoryError> {
        let now = Utc::now();
        let cutoff = now + Duration::days(days);

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT}
             WHERE p.status = 'ACTIVE' AND p.best_before BETWEEN $1 AND $2
             ORDER BY p.best_before ASC, p.id ASC"
        ))
        .bind(now)
        .bind(cutoff)
        .fetch_all(self.pool)
        .await?;

        self.attach_images(rows).await
    }

    /// Active products matching `term` in name, description, short
    /// description, or as an exact lowercase tag. Ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, term: &str, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let pattern = contains_pattern(term);

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT}
             WHERE p.status = 'ACTIVE'
               AND (p.name ILIKE $1
                    OR p.description ILIKE $1
                    OR p.short_description ILIKE $1
                    OR $2 = ANY(p.tags))
             ORDER BY p.name ASC, p.id ASC
             LIMIT $3"
        ))
        .bind(pattern)
        .bind(term.to_lowercase())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        self.attach_images(rows).await
    }

    /// Product counts for a producer's dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn producer_stats(
        &self,
        producer_id: UserId,
        expiring_within_days: i64,
    ) -> Result<ProducerProductStats, RepositoryError> {
        let now = Utc::now();
        let cutoff = now + Duration::days(expiring_within_days);

        let stats = sqlx::query_as::<_, ProducerProductStats>(
            r"
            SELECT
                COUNT(*) FILTER (WHERE status = 'ACTIVE') AS active_products,
                COUNT(*) FILTER (WHERE status = 'OUT_OF_STOCK'
                                    OR (status = 'ACTIVE' AND stock_quantity = 0)) AS out_of_stock,
                COUNT(*) FILTER (WHERE status = 'ACTIVE'
                                   AND best_before BETWEEN $2 AND $3) AS expiring_soon
            FROM storefront.product
            WHERE producer_id = $1
            ",
        )
        .bind(producer_id)
        .bind(now)
        .bind(cutoff)
        .fetch_one(self.pool)
        .await?;

        Ok(stats)
    }

    /// Load images for `rows` in one query and build domain products.
    async fn attach_images(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();

        let image_rows = sqlx::query_as::<_, ProductImageRow>(
            r"
            SELECT id, product_id, url, alt, is_primary, sort_order
            FROM storefront.product_image
            WHERE product_id = ANY($1)
            ORDER BY product_id, sort_order, id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut images: HashMap<i32, Vec<ProductImage>> = HashMap::new();
        for row in image_rows {
            images.entry(row.product_id).or_default().push(row.into());
        }

        let now = Utc::now();
        Ok(rows
            .into_iter()
            .map(|row| {
                let product_images = images.remove(&row.id).unwrap_or_default();
                row.into_product(product_images, now)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("salmon"), "%salmon%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
