//! Category route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::models::{Category, CategoryDetail, CategoryNode};
use crate::state::AppState;

/// All categories ordered by name, with active product counts.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories))
}

/// Root categories with their children.
#[instrument(skip(state))]
pub async fn hierarchy(State(state): State<AppState>) -> Result<Json<Vec<CategoryNode>>> {
    let tree = CategoryRepository::new(state.pool()).hierarchy().await?;
    Ok(Json(tree))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryDetail>> {
    CategoryRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}
