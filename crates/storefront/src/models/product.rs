//! Product domain types and catalog query parameters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use freshdart_core::{
    CartItem, Freshness, ProductId, ProductImageId, ProductStatus, StockType,
};

use super::category::CategoryRef;

/// A product image. Lists are kept in `sort_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductImage {
    pub id: ProductImageId,
    pub url: String,
    pub alt: Option<String>,
    pub is_primary: bool,
    pub sort_order: i32,
}

/// A catalog product with its images and category.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub stock_type: StockType,
    pub stock_quantity: Decimal,
    /// Unit the quantity is counted in, e.g. `kg`, `pc`, `dozen`.
    pub stock_unit: String,
    pub min_order_qty: Decimal,
    pub max_order_qty: Option<Decimal>,
    /// Shipping weight of one unit of quantity.
    pub weight_kg: Decimal,
    pub best_before: Option<DateTime<Utc>>,
    pub shelf_life_days: Option<i32>,
    pub status: ProductStatus,
    pub featured: bool,
    pub tags: Vec<String>,
    pub category: Option<CategoryRef>,
    pub images: Vec<ProductImage>,
    pub freshness: Freshness,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// The primary image, or the first image when none is flagged.
    #[must_use]
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images
            .iter()
            .find(|image| image.is_primary)
            .or_else(|| self.images.first())
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Snapshot for a cart line holding `quantity` of this product.
    #[must_use]
    pub fn to_cart_item(&self, quantity: Decimal) -> CartItem {
        CartItem {
            product_id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            image_url: self.primary_image().map(|image| image.url.clone()),
            unit_price: self.price,
            weight_kg: self.weight_kg,
            stock_unit: self.stock_unit.clone(),
            min_order_qty: self.min_order_qty,
            max_order_qty: self.max_order_qty,
            quantity,
        }
    }
}

/// Sort key for product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductSort {
    Name,
    Price,
    #[default]
    CreatedAt,
    BestBefore,
}

impl ProductSort {
    /// Column expression used in `ORDER BY`.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "p.name",
            Self::Price => "p.price",
            Self::CreatedAt => "p.created_at",
            Self::BestBefore => "p.best_before",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filters for the product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub category_slug: Option<String>,
    pub featured: Option<bool>,
    pub status: ProductStatus,
    /// Case-insensitive match on name or description, or exact tag match.
    pub search: Option<String>,
    pub sort_by: ProductSort,
    pub sort_order: SortOrder,
}
