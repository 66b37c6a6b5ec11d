//! Checkout: pricing a basket and turning it into a paid-for order.
//!
//! Order creation is a two-step write. The order is inserted first so the
//! payment provider can reference its ID, then a hosted checkout session is
//! opened. If the provider call fails the order is deleted again.
//!
//! The service is generic over [`CheckoutStore`] and [`PaymentGateway`] so
//! that the whole flow runs against in-memory fakes in tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use freshdart_core::{
    CartError, DeliveryTimeSlot, Money, OrderId, ProductId, ProductStatus, ShippingRateTable,
    ShippingType, validate_quantity,
};

use super::paymongo::{
    Billing, CheckoutSessionRequest, LineItem, PaymentGateway, line_items_total,
};
use crate::db::{OrderRepository, ProductRepository, RepositoryError};
use crate::models::order::{
    NewOrder, NewOrderItem, PAYMENT_METHOD_PAYMONGO, ShippingAddress, generate_order_number,
};
use crate::models::product::Product;
use crate::models::session::CurrentUser;

/// Attempts at picking an unused order number.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart cannot be empty")]
    EmptyCart,

    #[error("Quantity must be greater than zero")]
    InvalidQuantity,

    #[error("Invalid quantity: {0}")]
    QuantityOutOfRange(CartError),

    #[error("{0}")]
    InvalidAddress(String),

    #[error("Invalid delivery time slot: {0}")]
    InvalidTimeSlot(String),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Product is not available: {0}")]
    ProductUnavailable(String),

    #[error("Insufficient stock for {name}. Available: {available}")]
    InsufficientStock { name: String, available: Decimal },

    #[error("Order total is out of range")]
    AmountOutOfRange,

    #[error("Payment line items do not match the order total")]
    AmountMismatch,

    #[error("Payment configuration error")]
    PaymentNotConfigured,

    #[error("Failed to create payment session")]
    PaymentFailed,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl CheckoutError {
    /// Whether the caller sent something we cannot accept, as opposed to a
    /// failure on our side.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::AmountMismatch
                | Self::PaymentNotConfigured
                | Self::PaymentFailed
                | Self::Repository(_)
        )
    }
}

// =============================================================================
// Requests and responses
// =============================================================================

/// A product and quantity submitted for pricing or checkout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TotalsRequest {
    #[serde(default)]
    pub items: Vec<CheckoutLine>,
    #[serde(default)]
    pub shipping_type: ShippingType,
}

/// Priced basket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub total_weight: Decimal,
    pub estimated_days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_rate_name: Option<String>,
}

impl Totals {
    const fn empty() -> Self {
        Self {
            subtotal: Decimal::ZERO,
            shipping_cost: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            total_weight: Decimal::ZERO,
            estimated_days: 0,
            shipping_rate_name: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    pub items: Vec<CheckoutLine>,
    pub shipping_address: ShippingAddress,
    pub delivery_date: NaiveDate,
    pub delivery_time_slot: String,
    #[serde(default)]
    pub delivery_notes: Option<String>,
    #[serde(default)]
    pub shipping_type: ShippingType,
}

/// Where to send the buyer to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedSession {
    pub order_id: OrderId,
    pub order_number: String,
    pub checkout_url: String,
}

// =============================================================================
// Store seam
// =============================================================================

/// Persistence used by checkout.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// Products with the given IDs; unknown IDs are absent.
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// Insert an order and its lines atomically.
    async fn insert_order(&self, order: &NewOrder) -> Result<OrderId, RepositoryError>;

    async fn set_payment_intent(
        &self,
        order_id: OrderId,
        payment_intent_id: &str,
    ) -> Result<(), RepositoryError>;

    async fn delete_order(&self, order_id: OrderId) -> Result<bool, RepositoryError>;
}

/// [`CheckoutStore`] backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgCheckoutStore {
    pool: PgPool,
}

impl PgCheckoutStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckoutStore for PgCheckoutStore {
    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get_by_ids(ids).await
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        OrderRepository::new(&self.pool).create(order).await
    }

    async fn set_payment_intent(
        &self,
        order_id: OrderId,
        payment_intent_id: &str,
    ) -> Result<(), RepositoryError> {
        OrderRepository::new(&self.pool)
            .set_payment_intent(order_id, payment_intent_id)
            .await
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<bool, RepositoryError> {
        OrderRepository::new(&self.pool).delete(order_id).await
    }
}

// =============================================================================
// Service
// =============================================================================

/// Checkout service.
pub struct CheckoutService<'a, S: ?Sized, G: ?Sized> {
    store: &'a S,
    gateway: &'a G,
    rates: Arc<ShippingRateTable>,
    base_url: &'a str,
}

impl<'a, S, G> CheckoutService<'a, S, G>
where
    S: CheckoutStore + ?Sized,
    G: PaymentGateway + ?Sized,
{
    /// `base_url` is the public origin used for the provider's return URLs.
    #[must_use]
    pub const fn new(
        store: &'a S,
        gateway: &'a G,
        rates: Arc<ShippingRateTable>,
        base_url: &'a str,
    ) -> Self {
        Self {
            store,
            gateway,
            rates,
            base_url,
        }
    }

    /// Price a basket at current catalog prices. Unknown products are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidQuantity` for a non-positive quantity,
    /// `CheckoutError::QuantityOutOfRange` for one that is too large or too
    /// precise, and `CheckoutError::Repository` if products cannot be loaded.
    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn calculate_totals(&self, request: &TotalsRequest) -> Result<Totals, CheckoutError> {
        if request.items.is_empty() {
            return Ok(Totals::empty());
        }
        check_quantities(&request.items)?;

        let products = self.store.products_by_ids(&product_ids(&request.items)).await?;

        let mut subtotal = Decimal::ZERO;
        let mut total_weight = Decimal::ZERO;
        for line in &request.items {
            let Some(product) = products.iter().find(|p| p.id == line.product_id) else {
                continue;
            };
            subtotal += round_money(product.price * line.quantity);
            total_weight += product.weight_kg * line.quantity;
        }

        let quote = self.rates.quote(total_weight, request.shipping_type);
        let shipping_cost = round_money(quote.cost);
        let tax = Decimal::ZERO;

        Ok(Totals {
            subtotal,
            shipping_cost,
            tax,
            total: subtotal + shipping_cost + tax,
            total_weight: round_weight(total_weight),
            estimated_days: quote.estimated_days,
            shipping_rate_name: Some(quote.rate_name),
        })
    }

    /// Create a pending order and open a hosted checkout session for it.
    ///
    /// # Errors
    ///
    /// Validation and stock failures are returned before anything is
    /// written. `CheckoutError::PaymentFailed` means the order was created
    /// and then removed again because the provider call failed.
    #[instrument(skip(self, buyer, request), fields(user_id = %buyer.id, lines = request.items.len()))]
    pub async fn create_session(
        &self,
        buyer: &CurrentUser,
        request: &CreateSessionRequest,
    ) -> Result<CreatedSession, CheckoutError> {
        if request.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        check_quantities(&request.items)?;
        request
            .shipping_address
            .validate()
            .map_err(CheckoutError::InvalidAddress)?;
        let delivery_time_slot = request
            .delivery_time_slot
            .parse::<DeliveryTimeSlot>()
            .map_err(|_| CheckoutError::InvalidTimeSlot(request.delivery_time_slot.clone()))?;

        if !self.gateway.is_configured() {
            error!("checkout attempted without a payment secret key");
            return Err(CheckoutError::PaymentNotConfigured);
        }

        let products = self.store.products_by_ids(&product_ids(&request.items)).await?;
        let items = price_lines(&request.items, &products)?;

        let subtotal: Decimal = items.iter().map(|item| item.total_price).sum();
        let total_weight: Decimal = items.iter().map(|item| item.weight_kg).sum();
        let quote = self.rates.quote(total_weight, request.shipping_type);
        let shipping_cost = round_money(quote.cost);
        let tax = Decimal::ZERO;
        let total = subtotal + shipping_cost + tax;

        let amount = Money::php(total)
            .to_minor_units()
            .ok_or(CheckoutError::AmountOutOfRange)?;
        let mut line_items = items
            .iter()
            .map(payment_line)
            .collect::<Option<Vec<_>>>()
            .ok_or(CheckoutError::AmountOutOfRange)?;
        for (name, charge) in [(quote.rate_name.as_str(), shipping_cost), ("Tax", tax)] {
            if charge > Decimal::ZERO {
                line_items.push(charge_line(name, charge).ok_or(CheckoutError::AmountOutOfRange)?);
            }
        }
        let charged = line_items_total(&line_items);
        if charged != Some(amount) {
            error!(amount, charged = ?charged, "payment line items do not add up to the order total");
            return Err(CheckoutError::AmountMismatch);
        }

        let mut order = NewOrder {
            order_number: String::new(),
            user_id: buyer.id,
            subtotal,
            shipping_cost,
            tax,
            total,
            total_weight_kg: round_weight(total_weight),
            shipping_type: request.shipping_type,
            delivery_date: request.delivery_date,
            delivery_time_slot,
            delivery_notes: request
                .delivery_notes
                .as_deref()
                .map(str::trim)
                .filter(|notes| !notes.is_empty())
                .map(str::to_owned),
            shipping_address: request.shipping_address.clone(),
            payment_method: PAYMENT_METHOD_PAYMONGO.to_owned(),
            items,
        };
        let order_id = self.insert_with_fresh_number(&mut order).await?;

        let session_request = CheckoutSessionRequest {
            order_id,
            amount,
            description: format!("Order #{}", order.order_number),
            billing: Some(Billing {
                email: buyer.email.to_string(),
                name: buyer.name.clone(),
            }),
            line_items,
            success_url: format!("{}/checkout/success?order_id={order_id}", self.base_url),
            cancel_url: format!("{}/checkout/cancel?order_id={order_id}", self.base_url),
        };

        let session = match self.gateway.create_checkout_session(&session_request).await {
            Ok(session) => session,
            Err(e) => {
                error!(order_id = %order_id, error = %e, "failed to create checkout session");
                self.roll_back(order_id).await;
                return Err(CheckoutError::PaymentFailed);
            }
        };

        if let Err(e) = self.store.set_payment_intent(order_id, &session.id).await {
            error!(order_id = %order_id, error = %e, "failed to record payment intent");
            self.roll_back(order_id).await;
            return Err(CheckoutError::PaymentFailed);
        }

        info!(
            order_id = %order_id,
            order_number = %order.order_number,
            total = %total,
            "checkout session created"
        );

        Ok(CreatedSession {
            order_id,
            order_number: order.order_number,
            checkout_url: session.checkout_url,
        })
    }

    async fn insert_with_fresh_number(&self, order: &mut NewOrder) -> Result<OrderId, CheckoutError> {
        let today = Utc::now().date_naive();
        let mut last_conflict = None;

        for _ in 0..ORDER_NUMBER_ATTEMPTS {
            order.order_number = generate_order_number(today);
            match self.store.insert_order(order).await {
                Ok(id) => return Ok(id),
                Err(RepositoryError::Conflict(msg)) => {
                    warn!(order_number = %order.order_number, "order number collision");
                    last_conflict = Some(RepositoryError::Conflict(msg));
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(last_conflict
            .unwrap_or_else(|| RepositoryError::Conflict("order number".to_owned()))
            .into())
    }

    async fn roll_back(&self, order_id: OrderId) {
        match self.store.delete_order(order_id).await {
            Ok(true) => info!(order_id = %order_id, "rolled back order"),
            Ok(false) => warn!(order_id = %order_id, "order to roll back was already gone"),
            Err(e) => error!(order_id = %order_id, error = %e, "failed to roll back order"),
        }
    }
}

// =============================================================================
// Pricing helpers
// =============================================================================

fn product_ids(lines: &[CheckoutLine]) -> Vec<ProductId> {
    let mut ids: Vec<ProductId> = lines.iter().map(|line| line.product_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn check_quantities(lines: &[CheckoutLine]) -> Result<(), CheckoutError> {
    for line in lines {
        match validate_quantity(line.quantity) {
            Ok(()) => {}
            Err(CartError::InvalidQuantity) => return Err(CheckoutError::InvalidQuantity),
            Err(e) => return Err(CheckoutError::QuantityOutOfRange(e)),
        }
    }
    Ok(())
}

/// Validate every line against the catalog and price it.
fn price_lines(
    lines: &[CheckoutLine],
    products: &[Product],
) -> Result<Vec<NewOrderItem>, CheckoutError> {
    let mut priced = Vec::with_capacity(lines.len());

    for line in lines {
        let product = products
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or(CheckoutError::ProductNotFound(line.product_id))?;

        if product.status != ProductStatus::Active {
            return Err(CheckoutError::ProductUnavailable(product.name.clone()));
        }
        if product.stock_quantity < line.quantity {
            return Err(CheckoutError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock_quantity.normalize(),
            });
        }

        priced.push(NewOrderItem {
            product_id: product.id,
            product_name: product.name.clone(),
            product_image: product.primary_image().map(|image| image.url.clone()),
            quantity: line.quantity,
            unit_type: product.stock_unit.clone(),
            unit_price: product.price,
            total_price: round_money(product.price * line.quantity),
            weight_kg: round_weight(product.weight_kg * line.quantity),
        });
    }

    Ok(priced)
}

/// Provider line for an order item.
///
/// The provider only accepts whole quantities, so a fractional quantity
/// (e.g. 0.5 kg) becomes a single line carrying the full line total.
fn payment_line(item: &NewOrderItem) -> Option<LineItem> {
    if item.quantity.fract().is_zero() {
        Some(LineItem {
            name: item.product_name.clone(),
            quantity: item.quantity.to_i64()?,
            amount: Money::php(item.unit_price).to_minor_units()?,
        })
    } else {
        Some(LineItem {
            name: format!(
                "{} ({} {})",
                item.product_name,
                item.quantity.normalize(),
                item.unit_type
            ),
            quantity: 1,
            amount: Money::php(item.total_price).to_minor_units()?,
        })
    }
}

/// Single provider line for an order-level charge such as shipping.
fn charge_line(name: &str, charge: Decimal) -> Option<LineItem> {
    Some(LineItem {
        name: name.to_owned(),
        quantity: 1,
        amount: Money::php(charge).to_minor_units()?,
    })
}

fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn round_weight(weight_kg: Decimal) -> Decimal {
    weight_kg.round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
}
