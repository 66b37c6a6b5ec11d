//! Seed the catalog and shipping rates from a YAML file.
//!
//! Everything is upserted by its natural key (category and product slug,
//! zone name, rate band), so running the seed twice leaves one copy of each
//! row. Product images are replaced wholesale.
//!
//! ```bash
//! fd-cli seed                      # crates/cli/seed/demo.yaml
//! fd-cli seed -f my-catalog.yaml
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{Postgres, Transaction};
use tracing::{debug, error, info};

use freshdart_core::format::{format_price, format_weight};
use freshdart_core::{ProductStatus, ShippingRate, StockType};

use super::{ConnectError, connect};

/// Seed file bundled with the CLI.
pub const DEFAULT_SEED_FILE: &str = "crates/cli/seed/demo.yaml";

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
    pub shipping: Option<SeedShipping>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Slug of the parent category.
    pub parent: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    pub slug: String,
    /// Category slug.
    pub category: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub stock_type: StockType,
    pub stock_quantity: Decimal,
    pub stock_unit: String,
    pub min_order_qty: Decimal,
    pub max_order_qty: Option<Decimal>,
    pub weight_kg: Decimal,
    /// Days from seeding until best-before.
    pub best_before_days: Option<i64>,
    pub shelf_life_days: Option<i32>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<SeedImage>,
}

#[derive(Debug, Deserialize)]
pub struct SeedImage {
    pub url: String,
    pub alt: Option<String>,
    #[serde(default)]
    pub primary: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeedShipping {
    pub zone: String,
    pub rates: Vec<ShippingRate>,
}

/// Rows written by one seed run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
    pub images: usize,
    pub rates: usize,
}

/// Check cross-references and value ranges. Returns one message per problem.
#[must_use]
pub fn validate(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();

    let mut category_slugs = HashSet::new();
    for category in &seed.categories {
        if !category_slugs.insert(category.slug.as_str()) {
            errors.push(format!("duplicate category slug: {}", category.slug));
        }
    }
    for category in &seed.categories {
        if let Some(parent) = &category.parent
            && (!category_slugs.contains(parent.as_str()) || parent == &category.slug)
        {
            errors.push(format!(
                "category {}: unknown parent {parent}",
                category.slug
            ));
        }
    }

    let mut product_slugs = HashSet::new();
    for product in &seed.products {
        let slug = &product.slug;
        if !product_slugs.insert(slug.as_str()) {
            errors.push(format!("duplicate product slug: {slug}"));
        }
        if let Some(category) = &product.category
            && !category_slugs.contains(category.as_str())
        {
            errors.push(format!("product {slug}: unknown category {category}"));
        }
        if product.price < Decimal::ZERO {
            errors.push(format!("product {slug}: price cannot be negative"));
        }
        if product
            .compare_at_price
            .is_some_and(|compare| compare < product.price)
        {
            errors.push(format!("product {slug}: compare_at_price is below price"));
        }
        if product.min_order_qty <= Decimal::ZERO {
            errors.push(format!("product {slug}: min_order_qty must be positive"));
        }
        if product
            .max_order_qty
            .is_some_and(|max| max < product.min_order_qty)
        {
            errors.push(format!("product {slug}: max_order_qty is below min_order_qty"));
        }
        if product.images.iter().filter(|image| image.primary).count() > 1 {
            errors.push(format!("product {slug}: more than one primary image"));
        }
    }

    if let Some(shipping) = &seed.shipping {
        for rate in &shipping.rates {
            if rate.max_weight_kg.is_some_and(|max| max <= rate.min_weight_kg) {
                errors.push(format!(
                    "rate {} ({}) from {} kg: empty weight band",
                    rate.name, rate.shipping_type, rate.min_weight_kg
                ));
            }
        }
    }

    errors
}

/// Load, validate and apply a seed file.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or if any write
/// fails. Writes happen in one transaction.
pub async fn run(file_path: &str) -> Result<SeedSummary, SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()));
    }

    info!(path = %file_path, "Loading seed file");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    let pool = connect().await?;
    let mut tx = pool.begin().await?;

    let category_ids = seed_categories(&mut tx, &seed.categories).await?;
    let images = seed_products(&mut tx, &seed.products, &category_ids).await?;
    let rates = match &seed.shipping {
        Some(shipping) => seed_shipping(&mut tx, shipping).await?,
        None => 0,
    };

    tx.commit().await?;

    let summary = SeedSummary {
        categories: category_ids.len(),
        products: seed.products.len(),
        images,
        rates,
    };
    info!("Seeding complete!");
    info!("  Categories: {}", summary.categories);
    info!("  Products: {} ({} images)", summary.products, summary.images);
    info!("  Shipping rates: {}", summary.rates);

    Ok(summary)
}

async fn seed_categories(
    tx: &mut Transaction<'_, Postgres>,
    categories: &[SeedCategory],
) -> Result<HashMap<String, i32>, sqlx::Error> {
    let mut ids = HashMap::with_capacity(categories.len());

    for category in categories {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO storefront.category (name, slug, description, image)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                image = EXCLUDED.image
            RETURNING id
            ",
        )
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.image)
        .fetch_one(&mut **tx)
        .await?;
        ids.insert(category.slug.clone(), id);
    }

    // Parents are linked once every category has an ID.
    for category in categories {
        let parent_id = category.parent.as_ref().and_then(|slug| ids.get(slug)).copied();
        if let Some(&id) = ids.get(&category.slug) {
            sqlx::query("UPDATE storefront.category SET parent_id = $1 WHERE id = $2")
                .bind(parent_id)
                .bind(id)
                .execute(&mut **tx)
                .await?;
        }
    }

    Ok(ids)
}

async fn seed_products(
    tx: &mut Transaction<'_, Postgres>,
    products: &[SeedProduct],
    category_ids: &HashMap<String, i32>,
) -> Result<usize, sqlx::Error> {
    let now = Utc::now();
    let mut image_count = 0;

    for product in products {
        let category_id = product
            .category
            .as_ref()
            .and_then(|slug| category_ids.get(slug))
            .copied();
        let best_before = product.best_before_days.map(|days| now + Duration::days(days));

        let product_id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO storefront.product (
                name, slug, description, short_description, price, compare_at_price,
                stock_type, stock_quantity, stock_unit, min_order_qty, max_order_qty,
                weight_kg, best_before, shelf_life_days, category_id, status, featured, tags
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            ON CONFLICT (slug) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                short_description = EXCLUDED.short_description,
                price = EXCLUDED.price,
                compare_at_price = EXCLUDED.compare_at_price,
                stock_type = EXCLUDED.stock_type,
                stock_quantity = EXCLUDED.stock_quantity,
                stock_unit = EXCLUDED.stock_unit,
                min_order_qty = EXCLUDED.min_order_qty,
                max_order_qty = EXCLUDED.max_order_qty,
                weight_kg = EXCLUDED.weight_kg,
                best_before = EXCLUDED.best_before,
                shelf_life_days = EXCLUDED.shelf_life_days,
                category_id = EXCLUDED.category_id,
                status = EXCLUDED.status,
                featured = EXCLUDED.featured,
                tags = EXCLUDED.tags,
                updated_at = now()
            RETURNING id
            ",
        )
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(&product.short_description)
        .bind(product.price)
        .bind(product.compare_at_price)
        .bind(product.stock_type)
        .bind(product.stock_quantity)
        .bind(&product.stock_unit)
        .bind(product.min_order_qty)
        .bind(product.max_order_qty)
        .bind(product.weight_kg)
        .bind(best_before)
        .bind(product.shelf_life_days)
        .bind(category_id)
        .bind(product.status)
        .bind(product.featured)
        .bind(&product.tags)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query("DELETE FROM storefront.product_image WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut **tx)
            .await?;

        for (sort_order, image) in (0_i32..).zip(&product.images) {
            sqlx::query(
                r"
                INSERT INTO storefront.product_image (product_id, url, alt, is_primary, sort_order)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(product_id)
            .bind(&image.url)
            .bind(image.alt.as_deref().unwrap_or(&product.name))
            .bind(image.primary)
            .bind(sort_order)
            .execute(&mut **tx)
            .await?;
            image_count += 1;
        }

        debug!(
            slug = %product.slug,
            price = %format_price(product.price),
            weight = %format_weight(product.weight_kg),
            "seeded product"
        );
    }

    Ok(image_count)
}

async fn seed_shipping(
    tx: &mut Transaction<'_, Postgres>,
    shipping: &SeedShipping,
) -> Result<usize, sqlx::Error> {
    let zone_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO storefront.shipping_zone (name) VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        ",
    )
    .bind(&shipping.zone)
    .fetch_one(&mut **tx)
    .await?;

    for rate in &shipping.rates {
        sqlx::query(
            r"
            INSERT INTO storefront.shipping_rate (
                zone_id, name, shipping_type, min_weight_kg, max_weight_kg,
                base_price, price_per_kg, estimated_days
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (zone_id, shipping_type, min_weight_kg) DO UPDATE
            SET name = EXCLUDED.name,
                max_weight_kg = EXCLUDED.max_weight_kg,
                base_price = EXCLUDED.base_price,
                price_per_kg = EXCLUDED.price_per_kg,
                estimated_days = EXCLUDED.estimated_days
            ",
        )
        .bind(zone_id)
        .bind(&rate.name)
        .bind(rate.shipping_type)
        .bind(rate.min_weight_kg)
        .bind(rate.max_weight_kg)
        .bind(rate.base_price)
        .bind(rate.price_per_kg)
        .bind(i32::try_from(rate.estimated_days).unwrap_or(i32::MAX))
        .execute(&mut **tx)
        .await?;
    }

    Ok(shipping.rates.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use freshdart_core::ShippingType;

    const DEMO: &str = include_str!("../../seed/demo.yaml");

    #[test]
    fn test_bundled_seed_is_valid() {
        let seed: SeedFile = serde_yaml::from_str(DEMO).unwrap();
        assert_eq!(seed.categories.len(), 6);
        assert_eq!(seed.products.len(), 17);
        assert!(validate(&seed).is_empty(), "{:?}", validate(&seed));

        let salmon = seed
            .products
            .iter()
            .find(|p| p.slug == "fresh-salmon-fillet")
            .unwrap();
        assert_eq!(salmon.price, Decimal::new(68000, 2));
        assert_eq!(salmon.stock_type, StockType::Weight);
        assert_eq!(salmon.category.as_deref(), Some("meat-seafood"));

        let shipping = seed.shipping.unwrap();
        assert_eq!(shipping.zone, "Metro Manila");
        assert_eq!(
            shipping
                .rates
                .iter()
                .filter(|r| r.shipping_type == ShippingType::Express)
                .count(),
            1
        );
    }

    #[test]
    fn test_validate_reports_bad_references() {
        let seed: SeedFile = serde_yaml::from_str(
            r#"
categories:
  - name: Seafood
    slug: seafood
    parent: nowhere
products:
  - name: Tilapia
    slug: tilapia
    category: fish
    price: "150"
    stock_quantity: "10"
    stock_unit: kg
    min_order_qty: "0"
    weight_kg: "1"
  - name: Tilapia again
    slug: tilapia
    price: "150"
    compare_at_price: "100"
    stock_quantity: "10"
    stock_unit: kg
    min_order_qty: "1"
    weight_kg: "1"
"#,
        )
        .unwrap();

        let errors = validate(&seed);
        assert!(errors.iter().any(|e| e.contains("unknown parent nowhere")));
        assert!(errors.iter().any(|e| e.contains("unknown category fish")));
        assert!(errors.iter().any(|e| e.contains("min_order_qty must be positive")));
        assert!(errors.iter().any(|e| e.contains("duplicate product slug")));
        assert!(errors.iter().any(|e| e.contains("compare_at_price")));
    }
}
