//! Response hardening headers.
//!
//! Every response is JSON or a redirect, so the CSP allows nothing at all.
//! Only catalog reads may be cached, and only briefly.

use axum::{
    extract::Request,
    http::{
        HeaderMap, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'; base-uri 'none'";

/// Cacheable catalog reads; everything else is private.
fn is_public_catalog(path: &str) -> bool {
    path.starts_with("/api/products") || path.starts_with("/api/categories")
}

fn apply(headers: &mut HeaderMap, path: &str) {
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static(API_CSP));

    if !headers.contains_key(CACHE_CONTROL) {
        let value = if is_public_catalog(path) {
            "public, max-age=60"
        } else {
            "no-store"
        };
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(value));
    }
}

/// Add hardening headers to all responses.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;
    apply(response.headers_mut(), &path);
    response
}
