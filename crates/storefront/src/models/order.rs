//! Order domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use freshdart_core::{
    DeliveryTimeSlot, OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId,
    ShippingType, UserId,
};

/// Payment method recorded on orders paid through `PayMongo`.
pub const PAYMENT_METHOD_PAYMONGO: &str = "paymongo";

const ORDER_NUMBER_PREFIX: &str = "FD";
const ORDER_NUMBER_SUFFIX_LEN: usize = 8;

fn default_country() -> String {
    "Philippines".to_string()
}

/// Delivery address captured at checkout. Stored as JSON on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Check that every required field has content.
    ///
    /// # Errors
    ///
    /// Returns the message for the first blank field.
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            (&self.street, "Street address is required"),
            (&self.city, "City is required"),
            (&self.state, "State is required"),
            (&self.postal_code, "Postal code is required"),
            (&self.phone, "Phone number is required"),
        ];

        for (value, message) in required {
            if value.trim().is_empty() {
                return Err(message.to_string());
            }
        }
        Ok(())
    }
}

/// Order line priced at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: Decimal,
    pub unit_type: String,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    /// Weight of the whole line.
    pub weight_kg: Decimal,
}

/// Everything needed to insert an order and its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: UserId,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub total_weight_kg: Decimal,
    pub shipping_type: ShippingType,
    pub delivery_date: NaiveDate,
    pub delivery_time_slot: DeliveryTimeSlot,
    pub delivery_notes: Option<String>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_image: Option<String>,
    pub quantity: Decimal,
    pub unit_type: String,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub weight_kg: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub total_weight_kg: Decimal,
    pub shipping_type: ShippingType,
    pub delivery_date: NaiveDate,
    pub delivery_time_slot: DeliveryTimeSlot,
    pub delivery_notes: Option<String>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub payment_intent_id: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

/// Order row for listings and dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total: Decimal,
    pub item_count: i64,
    pub delivery_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Human-readable order number, e.g. `FD-261018-7KQ2M9XA`.
#[must_use]
pub fn generate_order_number(today: NaiveDate) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ORDER_NUMBER_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!(
        "{ORDER_NUMBER_PREFIX}-{}-{suffix}",
        today.format("%y%m%d")
    )
}
