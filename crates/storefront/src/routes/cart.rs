//! Cart route handlers.
//!
//! The cart lives in the session. Lines snapshot the product at the time it
//! was added; checkout prices from the catalog again.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use freshdart_core::{Cart, CartSummary, ProductId, ShippingType, validate_quantity};

use crate::db::ProductRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session_keys;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    #[serde(default)]
    pub shipping_type: ShippingType,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: Decimal,
    #[serde(default)]
    pub shipping_type: ShippingType,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: Decimal,
    #[serde(default)]
    pub shipping_type: ShippingType,
}

async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

async fn summarize(state: &AppState, cart: &Cart, shipping_type: ShippingType) -> Result<Json<CartSummary>> {
    let rates = state.shipping_rates().get().await?;
    Ok(Json(cart.summary(&rates, shipping_type)))
}

/// Current cart with shipping and totals.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<SummaryParams>,
) -> Result<Json<CartSummary>> {
    let cart = load_cart(&session).await?;
    summarize(&state, &cart, params.shipping_type).await
}

/// Add a product, merging with an existing line.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<CartSummary>> {
    validate_quantity(request.quantity)?;

    let product = ProductRepository::new(state.pool())
        .get_by_ids(&[request.product_id])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    if !product.is_available() {
        return Err(AppError::BadRequest(format!(
            "{} is not available",
            product.name
        )));
    }

    let mut cart = load_cart(&session).await?;
    cart.add_item(product.to_cart_item(request.quantity))?;
    save_cart(&session, &cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product", product.slug.as_str())]),
    );

    summarize(&state, &cart, request.shipping_type).await
}

/// Set a line's quantity; zero or less removes it.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<CartSummary>> {
    let mut cart = load_cart(&session).await?;
    cart.update_quantity(product_id, request.quantity)?;
    save_cart(&session, &cart).await?;

    summarize(&state, &cart, request.shipping_type).await
}

#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<CartSummary>> {
    let mut cart = load_cart(&session).await?;
    if !cart.remove_item(product_id) {
        return Err(freshdart_core::CartError::ItemNotFound(product_id).into());
    }
    save_cart(&session, &cart).await?;

    summarize(&state, &cart, params.shipping_type).await
}

#[instrument(skip(state, session))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CartSummary>> {
    session.remove::<Cart>(session_keys::CART).await?;
    summarize(&state, &Cart::new(), ShippingType::default()).await
}
