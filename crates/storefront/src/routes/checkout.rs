//! Checkout and order history handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use freshdart_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{Cursor, Order};
use crate::routes::bounded;
use crate::services::checkout::{
    CheckoutService, CreateSessionRequest, CreatedSession, PgCheckoutStore, Totals,
    TotalsRequest,
};
use crate::services::paymongo::PaymentGateway;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrdersParams {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub next_cursor: Option<String>,
}

type PgCheckout<'a> = CheckoutService<'a, PgCheckoutStore, dyn PaymentGateway + 'a>;

async fn service(state: &AppState) -> Result<PgCheckout<'_>> {
    let rates = state.shipping_rates().get().await?;
    Ok(CheckoutService::new(
        state.checkout_store(),
        state.payments(),
        rates,
        &state.config().base_url,
    ))
}

/// Price a basket without creating anything.
#[instrument(skip(state, request))]
pub async fn totals(
    State(state): State<AppState>,
    Json(request): Json<TotalsRequest>,
) -> Result<Json<Totals>> {
    let totals = service(&state).await?.calculate_totals(&request).await?;
    Ok(Json(totals))
}

/// Create a pending order and a hosted payment session for it.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn create_session(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreatedSession>> {
    let created = service(&state)
        .await?
        .create_session(&user, &request)
        .await?;

    add_breadcrumb(
        "checkout",
        "Checkout session created",
        Some(&[("order_number", created.order_number.as_str())]),
    );
    Ok(Json(created))
}

/// The signed-in user's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<OrdersParams>,
) -> Result<Json<OrderPage>> {
    let limit = bounded(params.limit, "limit", 10, 1, 50)?;
    let cursor = Cursor::decode(params.cursor.as_deref())?;

    let page = OrderRepository::new(state.pool())
        .list_for_user(user.id, limit, cursor)
        .await?;

    Ok(Json(OrderPage {
        orders: page.items,
        next_cursor: page.next_cursor,
    }))
}

/// One of the signed-in user's orders. Other users' orders are reported as
/// missing.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn order_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get_for_user(user.id, order_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}
