//! Role dashboards.
//!
//! Each handler sits behind the dashboard gate, so the signed-in user's role
//! already matches the area.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::db::orders::{CustomerOrderStats, MerchantOrderStats, ProducerOrderStats};
use crate::db::products::ProducerProductStats;
use crate::db::{OrderRepository, ProductRepository};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, OrderSummary};
use crate::state::AppState;

const CUSTOMER_RECENT_ORDERS: i64 = 5;
const MERCHANT_RECENT_ORDERS: i64 = 10;
const PRODUCER_RECENT_ORDERS: i64 = 10;
/// Window for the producer's "expiring soon" count.
const PRODUCER_EXPIRY_WINDOW_DAYS: i64 = 3;

#[derive(Debug, Serialize)]
pub struct CustomerDashboard {
    pub user: CurrentUser,
    pub stats: CustomerOrderStats,
    pub recent_orders: Vec<OrderSummary>,
}

#[derive(Debug, Serialize)]
pub struct MerchantDashboard {
    pub user: CurrentUser,
    pub stats: MerchantOrderStats,
    pub recent_orders: Vec<OrderSummary>,
}

#[derive(Debug, Serialize)]
pub struct ProducerDashboard {
    pub user: CurrentUser,
    pub products: ProducerProductStats,
    pub orders: ProducerOrderStats,
    pub recent_orders: Vec<OrderSummary>,
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn customer(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CustomerDashboard>> {
    let orders = OrderRepository::new(state.pool());
    let stats = orders.customer_stats(user.id).await?;
    let recent_orders = orders.recent(Some(user.id), CUSTOMER_RECENT_ORDERS).await?;

    Ok(Json(CustomerDashboard {
        user,
        stats,
        recent_orders,
    }))
}

/// Marketplace-wide order counts and revenue.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn merchant(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<MerchantDashboard>> {
    let orders = OrderRepository::new(state.pool());
    let stats = orders.merchant_stats().await?;
    let recent_orders = orders.recent(None, MERCHANT_RECENT_ORDERS).await?;

    Ok(Json(MerchantDashboard {
        user,
        stats,
        recent_orders,
    }))
}

/// Product and order counts for the producer's own listings.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn producer(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ProducerDashboard>> {
    let products = ProductRepository::new(state.pool())
        .producer_stats(user.id, PRODUCER_EXPIRY_WINDOW_DAYS)
        .await?;
    let orders = OrderRepository::new(state.pool());
    let order_stats = orders.producer_stats(user.id).await?;
    let recent_orders = orders
        .recent_for_producer(user.id, PRODUCER_RECENT_ORDERS)
        .await?;

    Ok(Json(ProducerDashboard {
        user,
        products,
        orders: order_stats,
        recent_orders,
    }))
}
