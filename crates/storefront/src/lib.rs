//! FreshDart storefront library.
//!
//! The HTTP API of the marketplace: catalog, session cart, shipping quotes,
//! checkout through `PayMongo`, accounts and role dashboards. The binary in
//! `main.rs` wires it to `PostgreSQL`; tests build the same router over
//! in-memory pieces.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::Request, middleware as axum_middleware};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Build the application router.
///
/// `rate_limit_auth` enables the per-IP limiter on `/api/auth`; it keys on
/// the client address, so callers without proxy headers must serve the
/// router with connect info.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>, rate_limit_auth: bool) -> Router
where
    S: SessionStore + Clone,
{
    routes::routes(rate_limit_auth)
        .layer(session_layer)
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}
