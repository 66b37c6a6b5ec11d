//! `PayMongo` client for hosted checkout sessions.
//!
//! Checkout goes through the [`PaymentGateway`] trait so the service layer
//! can be exercised without the network.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use freshdart_core::{CurrencyCode, OrderId};

use crate::config::PaymentConfig;

/// Payment methods offered on the hosted checkout page.
pub const PAYMENT_METHOD_TYPES: &[&str] =
    &["card", "gcash", "grab_pay", "paymaya", "dob", "dob_ubp"];

/// Errors that can occur when talking to the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No secret key configured.
    #[error("payment provider is not configured")]
    NotConfigured,

    /// Line items would charge something other than the order total.
    #[error("line items do not add up to amount {amount}")]
    Unbalanced { amount: i64 },
}

/// Buyer details prefilled on the checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Billing {
    pub email: String,
    pub name: String,
}

/// One line on the hosted checkout page. Amounts are in centavos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: i64,
    pub amount: i64,
}

/// What the provider will charge for `items`: the sum of quantity × amount.
/// `None` on overflow.
#[must_use]
pub fn line_items_total(items: &[LineItem]) -> Option<i64> {
    items.iter().try_fold(0_i64, |total, item| {
        item.quantity
            .checked_mul(item.amount)
            .and_then(|line| total.checked_add(line))
    })
}

/// A checkout session to open for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub order_id: OrderId,
    /// Order total in centavos. The provider charges the line items, so they
    /// must add up to this.
    pub amount: i64,
    pub description: String,
    pub billing: Option<Billing>,
    pub line_items: Vec<LineItem>,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutSessionRequest {
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        line_items_total(&self.line_items) == Some(self.amount)
    }
}

/// The provider's handle for a created checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub checkout_url: String,
}

/// Creates hosted checkout sessions.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Whether credentials are present. Checkout refuses to create orders
    /// when this is false.
    fn is_configured(&self) -> bool;

    /// Open a checkout session.
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError>;
}

/// `PayMongo` API client.
#[derive(Clone)]
pub struct PayMongoClient {
    client: Option<reqwest::Client>,
    api_base: String,
}

impl std::fmt::Debug for PayMongoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayMongoClient")
            .field("configured", &self.client.is_some())
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl PayMongoClient {
    /// Create a client. Without a secret key the client is built but every
    /// call fails with [`PaymentError::NotConfigured`].
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let client = match &config.secret_key {
            Some(key) => {
                let mut headers = HeaderMap::new();

                let encoded = STANDARD.encode(key.expose_secret());
                let mut auth_value = HeaderValue::from_str(&format!("Basic {encoded}"))
                    .map_err(|e| PaymentError::Parse(format!("Invalid secret key format: {e}")))?;
                auth_value.set_sensitive(true);
                headers.insert(AUTHORIZATION, auth_value);
                headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

                Some(
                    reqwest::Client::builder()
                        .default_headers(headers)
                        .build()?,
                )
            }
            None => None,
        };

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
        })
    }
}

#[async_trait]
impl PaymentGateway for PayMongoClient {
    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let client = self.client.as_ref().ok_or(PaymentError::NotConfigured)?;
        if !request.is_balanced() {
            return Err(PaymentError::Unbalanced {
                amount: request.amount,
            });
        }
        let url = format!("{}/checkout_sessions", self.api_base);

        let response = client
            .post(&url)
            .json(&checkout_session_body(request))
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: SessionEnvelope = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        Ok(CheckoutSession {
            id: envelope.data.id,
            checkout_url: envelope.data.attributes.checkout_url,
        })
    }
}

/// JSON body for `POST /checkout_sessions`.
fn checkout_session_body(request: &CheckoutSessionRequest) -> serde_json::Value {
    let currency = CurrencyCode::PHP.code();
    let line_items: Vec<_> = request
        .line_items
        .iter()
        .map(|item| {
            serde_json::json!({
                "name": item.name,
                "quantity": item.quantity,
                "amount": item.amount,
                "currency": currency,
            })
        })
        .collect();

    let mut attributes = serde_json::json!({
        "line_items": line_items,
        "payment_method_types": PAYMENT_METHOD_TYPES,
        "description": request.description,
        "send_email_receipt": true,
        "success_url": request.success_url,
        "cancel_url": request.cancel_url,
        "metadata": {
            "order_id": request.order_id.to_string(),
        },
    });
    if let Some(billing) = &request.billing {
        attributes["billing"] = serde_json::json!(billing);
    }

    serde_json::json!({ "data": { "attributes": attributes } })
}

#[derive(Debug, Deserialize)]
struct SessionEnvelope {
    data: SessionData,
}

#[derive(Debug, Deserialize)]
struct SessionData {
    id: String,
    attributes: SessionAttributes,
}

#[derive(Debug, Deserialize)]
struct SessionAttributes {
    checkout_url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn request(billing: Option<Billing>) -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            order_id: OrderId::new(42),
            amount: 23_600,
            description: "Order #FD-261018-ABCD1234".to_owned(),
            billing,
            line_items: vec![
                LineItem {
                    name: "Tiger Prawns".to_owned(),
                    quantity: 2,
                    amount: 9_300,
                },
                LineItem {
                    name: "Standard Delivery".to_owned(),
                    quantity: 1,
                    amount: 5_000,
                },
            ],
            success_url: "https://freshdart.ph/checkout/success?order_id=42".to_owned(),
            cancel_url: "https://freshdart.ph/checkout/cancel?order_id=42".to_owned(),
        }
    }

    #[test]
    fn test_body_shape() {
        let body = checkout_session_body(&request(Some(Billing {
            email: "ana@example.ph".to_owned(),
            name: "Ana Reyes".to_owned(),
        })));
        let attrs = &body["data"]["attributes"];

        assert_eq!(attrs["line_items"][0]["currency"], "PHP");
        assert_eq!(attrs["line_items"][0]["amount"], 9_300);
        assert_eq!(attrs["payment_method_types"].as_array().unwrap().len(), 6);
        assert_eq!(attrs["send_email_receipt"], true);
        assert_eq!(attrs["metadata"]["order_id"], "42");
        assert_eq!(attrs["billing"]["email"], "ana@example.ph");
    }

    #[test]
    fn test_line_items_total_matches_amount() {
        let balanced = request(None);
        assert_eq!(line_items_total(&balanced.line_items), Some(23_600));
        assert!(balanced.is_balanced());

        let mut products_only = request(None);
        products_only.line_items.pop();
        assert!(!products_only.is_balanced());

        let huge = [LineItem {
            name: "Tiger Prawns".to_owned(),
            quantity: i64::MAX,
            amount: 2,
        }];
        assert_eq!(line_items_total(&huge), None);
    }

    #[tokio::test]
    async fn test_unbalanced_request_is_refused_before_sending() {
        let client = PayMongoClient::new(&PaymentConfig {
            secret_key: Some(SecretString::from("sk_test_abc123")),
            api_base: "http://127.0.0.1:1".to_owned(),
        })
        .unwrap();
        let mut request = request(None);
        request.line_items.pop();

        assert!(matches!(
            client.create_checkout_session(&request).await,
            Err(PaymentError::Unbalanced { amount: 23_600 })
        ));
    }

    #[test]
    fn test_body_omits_missing_billing() {
        let body = checkout_session_body(&request(None));
        assert!(body["data"]["attributes"].get("billing").is_none());
    }

    #[test]
    fn test_session_envelope_parses() {
        let envelope: SessionEnvelope = serde_json::from_value(serde_json::json!({
            "data": {
                "id": "cs_abc123",
                "type": "checkout_session",
                "attributes": { "checkout_url": "https://checkout.paymongo.com/cs_abc123" }
            }
        }))
        .unwrap();
        assert_eq!(envelope.data.id, "cs_abc123");
        assert_eq!(
            envelope.data.attributes.checkout_url,
            "https://checkout.paymongo.com/cs_abc123"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_client_refuses() {
        let client = PayMongoClient::new(&PaymentConfig {
            secret_key: None,
            api_base: "https://api.paymongo.com/v1/".to_owned(),
        })
        .unwrap();
        assert!(!client.is_configured());
        assert!(matches!(
            client.create_checkout_session(&request(None)).await,
            Err(PaymentError::NotConfigured)
        ));
    }

    #[test]
    fn test_configured_client_trims_base() {
        let client = PayMongoClient::new(&PaymentConfig {
            secret_key: Some(SecretString::from("sk_test_abc123")),
            api_base: "https://api.paymongo.com/v1/".to_owned(),
        })
        .unwrap();
        assert!(client.is_configured());
        assert_eq!(client.api_base, "https://api.paymongo.com/v1");
    }
}
