//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness
//! GET  /health/ready                   - Database readiness
//!
//! # Catalog
//! GET  /api/products                   - Filtered, sorted, paginated listing
//! GET  /api/products/featured          - Featured products
//! GET  /api/products/expiring-soon     - Best-before within N days
//! GET  /api/products/search            - Text and tag search
//! GET  /api/products/{slug}            - Product detail
//! GET  /api/categories                 - Categories with active counts
//! GET  /api/categories/hierarchy       - Roots with children
//! GET  /api/categories/{slug}          - Category detail
//! GET  /api/categories/{slug}/products - Products in a category
//!
//! # Cart (session)
//! GET    /api/cart                     - Cart summary
//! DELETE /api/cart                     - Clear cart
//! POST   /api/cart/items               - Add a product
//! PATCH  /api/cart/items/{product_id}  - Change quantity
//! DELETE /api/cart/items/{product_id}  - Remove a product
//!
//! # Shipping
//! GET  /api/shipping/quote             - Cost for a weight
//! GET  /api/shipping/delivery-dates    - Selectable delivery dates
//! GET  /api/shipping/time-slots        - Delivery windows
//!
//! # Checkout and orders
//! POST /api/checkout/totals            - Price a basket
//! POST /api/checkout/session           - Create order and payment session (auth)
//! GET  /api/orders                     - My orders (auth)
//! GET  /api/orders/{id}                - One of my orders (auth)
//!
//! # Auth (rate limited)
//! POST /api/auth/register
//! POST /api/auth/login
//! POST /api/auth/logout
//! GET  /api/auth/session
//!
//! # Pages
//! GET  /login, /register               - Guests only
//! GET  /{customer,merchant,producer}/dashboard - Role dashboards
//! ```

pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod dashboard;
pub mod health;
pub mod products;
pub mod shipping;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::error::{AppError, Result};
use crate::middleware::{auth_rate_limiter, dashboard_gate, guest_only};
use crate::state::AppState;

/// Read an optional integer parameter, applying a default and bounds.
///
/// # Errors
///
/// Returns `AppError::BadRequest` when the value is outside `min..=max`.
pub(crate) fn bounded(
    value: Option<i64>,
    name: &str,
    default: i64,
    min: i64,
    max: i64,
) -> Result<i64> {
    let value = value.unwrap_or(default);
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(AppError::BadRequest(format!(
            "{name} must be between {min} and {max}"
        )))
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/featured", get(products::featured))
        .route("/expiring-soon", get(products::expiring_soon))
        .route("/search", get(products::search))
        .route("/{slug}", get(products::show))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/hierarchy", get(categories::hierarchy))
        .route("/{slug}", get(categories::show))
        .route("/{slug}/products", get(products::by_category))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            axum::routing::patch(cart::update).delete(cart::remove),
        )
}

/// Create the shipping routes router.
pub fn shipping_routes() -> Router<AppState> {
    Router::new()
        .route("/quote", get(shipping::quote))
        .route("/delivery-dates", get(shipping::delivery_dates))
        .route("/time-slots", get(shipping::time_slots))
}

/// Create the auth API routes router.
pub fn auth_api_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
}

/// Login and register pages, hidden from signed-in users.
pub fn guest_page_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route_layer(axum_middleware::from_fn(guest_only))
}

/// Role dashboards, each open only to its own role.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/customer/dashboard", get(dashboard::customer))
        .route("/merchant/dashboard", get(dashboard::merchant))
        .route("/producer/dashboard", get(dashboard::producer))
        .route_layer(axum_middleware::from_fn(dashboard_gate))
}

/// Create all routes for the storefront.
///
/// `rate_limit_auth` wraps `/api/auth` in the per-IP limiter.
pub fn routes(rate_limit_auth: bool) -> Router<AppState> {
    let auth_api = if rate_limit_auth {
        auth_api_routes().layer(auth_rate_limiter())
    } else {
        auth_api_routes()
    };

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/products", product_routes())
        .nest("/api/categories", category_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/shipping", shipping_routes())
        .route("/api/checkout/totals", post(checkout::totals))
        .route("/api/checkout/session", post(checkout::create_session))
        .route("/api/orders", get(checkout::my_orders))
        .route("/api/orders/{id}", get(checkout::order_status))
        .nest("/api/auth", auth_api)
        .merge(guest_page_routes())
        .merge(dashboard_routes())
}
