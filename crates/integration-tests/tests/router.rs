//! End-to-end request handling through the full storefront stack.
//!
//! Every case here is answered before the database is reached: gates,
//! validation, session state and cached shipping rates.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::{StatusCode, header};
use serde_json::json;

use freshdart_core::{Email, UserId, UserRole};
use freshdart_integration_tests::{
    StubGateway, TestApp, body_json, json_request, request,
};
use freshdart_storefront::models::CurrentUser;

fn user(role: UserRole) -> CurrentUser {
    CurrentUser {
        id: UserId::new(11),
        name: "Liza Bautista".to_owned(),
        email: Email::parse("liza@palengke.ph").unwrap(),
        role,
    }
}

fn location(response: &axum::http::Response<axum::body::Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

const DECIMAL_MAX: &str = "79228162514264337593543950335";

fn checkout_body(time_slot: &str) -> serde_json::Value {
    json!({
        "items": [{ "product_id": 1, "quantity": "2" }],
        "shipping_address": {
            "street": "45 Quezon Blvd",
            "city": "Quezon City",
            "state": "Metro Manila",
            "postal_code": "1100",
            "country": "Philippines",
            "phone": "+63 917 555 0123"
        },
        "delivery_date": "2026-10-22",
        "delivery_time_slot": time_slot,
        "shipping_type": "standard"
    })
}

// =============================================================================
// Health and stack
// =============================================================================

#[tokio::test]
async fn test_health_and_readiness() {
    let app = TestApp::new().await;

    let response = app.send(request("GET", "/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(request("GET", "/health/ready", None)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_request_id_and_security_headers() {
    let app = TestApp::new().await;

    let mut req = request("GET", "/health", None);
    req.headers_mut()
        .insert("x-request-id", "req-7f3a".parse().unwrap());
    let response = app.send(req).await;
    let headers = response.headers();
    assert_eq!(headers["x-request-id"], "req-7f3a");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");

    let response = app.send(request("GET", "/health", None)).await;
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);
}

// =============================================================================
// Role gates
// =============================================================================

#[tokio::test]
async fn test_dashboards_require_sign_in() {
    let app = TestApp::new().await;

    for path in ["/customer/dashboard", "/merchant/dashboard", "/producer/dashboard"] {
        let response = app.send(request("GET", path, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), "/login");
    }
}

#[tokio::test]
async fn test_wrong_role_is_sent_to_own_dashboard() {
    let app = TestApp::new().await;
    let cookie = app.sign_in(&user(UserRole::Producer)).await;

    let response = app
        .send(request("GET", "/merchant/dashboard", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/producer/dashboard");

    let response = app
        .send(request("GET", "/customer/dashboard", Some(&cookie)))
        .await;
    assert_eq!(location(&response), "/producer/dashboard");
}

#[tokio::test]
async fn test_guest_pages_redirect_signed_in_users() {
    let app = TestApp::new().await;

    let response = app.send(request("GET", "/login", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = app.sign_in(&user(UserRole::Merchant)).await;
    for path in ["/login", "/register"] {
        let response = app.send(request("GET", path, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/merchant/dashboard");
    }
}

#[tokio::test]
async fn test_api_requires_auth_with_json_401() {
    let app = TestApp::new().await;

    let response = app.send(request("GET", "/api/orders", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let response = app
        .send(json_request(
            "POST",
            "/api/checkout/session",
            None,
            &checkout_body("morning"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Auth session
// =============================================================================

#[tokio::test]
async fn test_session_reflects_sign_in_and_logout() {
    let app = TestApp::new().await;

    let body = body_json(app.send(request("GET", "/api/auth/session", None)).await).await;
    assert!(body["user"].is_null());

    let cookie = app.sign_in(&user(UserRole::Customer)).await;
    let body = body_json(
        app.send(request("GET", "/api/auth/session", Some(&cookie)))
            .await,
    )
    .await;
    assert_eq!(body["user"]["email"], "liza@palengke.ph");
    assert_eq!(body["user"]["role"], "CUSTOMER");

    let response = app
        .send(request("POST", "/api/auth/logout", Some(&cookie)))
        .await;
    assert_eq!(body_json(response).await["success"], true);

    let body = body_json(
        app.send(request("GET", "/api/auth/session", Some(&cookie)))
            .await,
    )
    .await;
    assert!(body["user"].is_null());
}

#[tokio::test]
async fn test_auth_input_rejected_before_lookup() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/register",
            None,
            &json!({ "name": "Liza", "email": "liza@palengke.ph", "password": "short" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({ "email": "not-an-email", "password": "whatever123" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_routes_are_rate_limited() {
    let app = TestApp::with_gateway(Arc::new(StubGateway::unconfigured()), true).await;

    let mut statuses = Vec::new();
    for _ in 0..6 {
        let mut req = request("GET", "/api/auth/session", None);
        req.headers_mut()
            .insert("x-forwarded-for", "203.0.113.50".parse().unwrap());
        statuses.push(app.send(req).await.status());
    }

    assert!(statuses[..5].iter().all(|s| *s == StatusCode::OK));
    assert_eq!(statuses[5], StatusCode::TOO_MANY_REQUESTS);

    // Other routes are not limited
    let response = app.send(request("GET", "/api/shipping/time-slots", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Catalog validation
// =============================================================================

#[tokio::test]
async fn test_catalog_parameters_validated() {
    let app = TestApp::new().await;

    let response = app.send(request("GET", "/api/products?limit=0", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "limit must be between 1 and 100");

    let response = app
        .send(request("GET", "/api/products/featured?limit=21", None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(request("GET", "/api/products/expiring-soon?days=8", None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(request("GET", "/api/products/search?q=", None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "Search query is required");
}

// =============================================================================
// Shipping and cart
// =============================================================================

#[tokio::test]
async fn test_shipping_endpoints() {
    let app = TestApp::new().await;

    let body = body_json(
        app.send(request(
            "GET",
            "/api/shipping/quote?weight_kg=2&shipping_type=express",
            None,
        ))
        .await,
    )
    .await;
    assert_eq!(body["rate_name"], "Express Delivery");
    assert_eq!(body["estimated_days"], 1);
    assert_eq!(body["cost"], "200");

    let response = app
        .send(request("GET", "/api/shipping/quote?weight_kg=-1", None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(
        app.send(request("GET", "/api/shipping/delivery-dates?days=7", None))
            .await,
    )
    .await;
    assert_eq!(body["estimated_days"], 3);
    let dates = body["dates"].as_array().unwrap();
    // Seven consecutive days contain exactly one Sunday
    assert_eq!(dates.len(), 6);

    let response = app
        .send(request("GET", "/api/shipping/delivery-dates?days=31", None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(app.send(request("GET", "/api/shipping/time-slots", None)).await).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|slot| slot["id"].as_str())
        .collect();
    assert_eq!(ids, ["morning", "afternoon", "evening"]);
}

#[tokio::test]
async fn test_extreme_weight_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .send(request(
            "GET",
            &format!("/api/shipping/quote?weight_kg={DECIMAL_MAX}&shipping_type=express"),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "weight_kg must be at most 100000");

    let body = body_json(
        app.send(request("GET", "/api/shipping/quote?weight_kg=100000", None))
            .await,
    )
    .await;
    assert_eq!(body["rate_name"], "Standard Delivery");
}

#[tokio::test]
async fn test_cart_rejects_huge_and_too_precise_quantities() {
    let app = TestApp::new().await;

    for (quantity, message) in [
        (DECIMAL_MAX, "quantity must be at most 100000"),
        ("0.3333", "quantity can have at most 3 decimal places"),
    ] {
        let response = app
            .send(json_request(
                "POST",
                "/api/cart/items",
                None,
                &json!({ "product_id": 1, "quantity": quantity }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], message);

        let response = app
            .send(json_request(
                "PATCH",
                "/api/cart/items/1",
                None,
                &json!({ "quantity": quantity }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_empty_cart_summary() {
    let app = TestApp::new().await;

    let body = body_json(app.send(request("GET", "/api/cart", None)).await).await;
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["subtotal"], "0");
    assert_eq!(body["shipping_type"], "standard");
    // Zero weight still pays the base rate
    assert_eq!(body["shipping"]["cost"], "50");
    assert_eq!(body["total"], "50");

    let response = app
        .send(request("DELETE", "/api/cart/items/5", None))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.send(request("DELETE", "/api/cart", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_totals_for_empty_basket() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(
            "POST",
            "/api/checkout/totals",
            None,
            &json!({ "items": [], "shipping_type": "express" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], "0");
    assert_eq!(body["estimated_days"], 0);
}

#[tokio::test]
async fn test_totals_reject_huge_and_too_precise_quantities() {
    let app = TestApp::new().await;

    for (quantity, message) in [
        (DECIMAL_MAX, "Invalid quantity: quantity must be at most 100000"),
        ("0.3333", "Invalid quantity: quantity can have at most 3 decimal places"),
    ] {
        let response = app
            .send(json_request(
                "POST",
                "/api/checkout/totals",
                None,
                &json!({ "items": [{ "product_id": 1, "quantity": quantity }] }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], message);
    }
}

#[tokio::test]
async fn test_checkout_without_payment_key() {
    let app = TestApp::new().await;
    let cookie = app.sign_in(&user(UserRole::Customer)).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/checkout/session",
            Some(&cookie),
            &checkout_body("morning"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "Payment configuration error");
}

#[tokio::test]
async fn test_checkout_validation_precedes_payment() {
    let gateway = Arc::new(StubGateway::succeeding());
    let app = TestApp::with_gateway(gateway.clone(), false).await;
    let cookie = app.sign_in(&user(UserRole::Customer)).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/checkout/session",
            Some(&cookie),
            &checkout_body("midnight"),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "Invalid delivery time slot: midnight");

    let mut empty = checkout_body("morning");
    empty["items"] = json!([]);
    let response = app
        .send(json_request("POST", "/api/checkout/session", Some(&cookie), &empty))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut huge = checkout_body("morning");
    huge["items"] = json!([{ "product_id": 1, "quantity": DECIMAL_MAX }]);
    let response = app
        .send(json_request("POST", "/api/checkout/session", Some(&cookie), &huge))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(gateway.call_count(), 0);
}
