//! Product catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use freshdart_core::ProductStatus;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::{Cursor, Page, Product, ProductQuery, ProductSort, SortOrder};
use crate::routes::bounded;
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category_slug: Option<String>,
    pub featured: Option<bool>,
    pub status: Option<ProductStatus>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
    #[serde(default)]
    pub sort_by: ProductSort,
    #[serde(default)]
    pub sort_order: SortOrder,
}

/// Query parameters for a category's products.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringParams {
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
}

/// A page of products.
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub next_cursor: Option<String>,
}

impl From<Page<Product>> for ProductPage {
    fn from(page: Page<Product>) -> Self {
        Self {
            products: page.items,
            next_cursor: page.next_cursor,
        }
    }
}

/// List products with filters, sorting and cursor pagination.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ProductPage>> {
    let limit = bounded(params.limit, "limit", 20, 1, 100)?;
    let cursor = Cursor::decode(params.cursor.as_deref())?;

    let query = ProductQuery {
        category_slug: params.category_slug,
        featured: params.featured,
        status: params.status.unwrap_or_default(),
        search: params.search,
        sort_by: params.sort_by,
        sort_order: params.sort_order,
    };

    let page = ProductRepository::new(state.pool())
        .list(&query, limit, cursor)
        .await?;
    Ok(Json(page.into()))
}

/// Featured active products, newest first.
#[instrument(skip(state))]
pub async fn featured(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<Product>>> {
    let limit = bounded(params.limit, "limit", 8, 1, 20)?;
    let products = ProductRepository::new(state.pool()).featured(limit).await?;
    Ok(Json(products))
}

/// Active products close to their best-before date.
#[instrument(skip(state))]
pub async fn expiring_soon(
    State(state): State<AppState>,
    Query(params): Query<ExpiringParams>,
) -> Result<Json<Vec<Product>>> {
    let days = bounded(params.days, "days", 3, 1, 7)?;
    let products = ProductRepository::new(state.pool())
        .expiring_soon(days)
        .await?;
    Ok(Json(products))
}

/// Text and tag search over active products.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Product>>> {
    let term = params.q.trim();
    if term.is_empty() {
        return Err(AppError::BadRequest("Search query is required".to_string()));
    }
    let limit = bounded(params.limit, "limit", 20, 1, 50)?;

    let products = ProductRepository::new(state.pool())
        .search(term, limit)
        .await?;
    Ok(Json(products))
}

/// Product detail by slug.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Active products in a category, by slug.
///
/// An unknown slug yields an empty page rather than a 404.
#[instrument(skip(state))]
pub async fn by_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<ProductPage>> {
    let limit = bounded(params.limit, "limit", 20, 1, 100)?;
    let cursor = Cursor::decode(params.cursor.as_deref())?;

    let query = ProductQuery {
        category_slug: Some(slug),
        ..ProductQuery::default()
    };

    let page = ProductRepository::new(state.pool())
        .list(&query, limit, cursor)
        .await?;
    Ok(Json(page.into()))
}
