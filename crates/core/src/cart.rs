//! Cart aggregate.
//!
//! Lines are keyed by product: adding a product that is already in the cart
//! merges the quantities, and setting a quantity of zero or less removes the
//! line. Each line carries a snapshot of the product's price and weight taken
//! when it was added; checkout re-reads both from the catalog.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shipping::{ShippingQuote, ShippingRateTable};
use crate::types::{ProductId, ShippingType};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be greater than zero")]
    InvalidQuantity,
    #[error("minimum order quantity for {name} is {min}")]
    BelowMinimum { name: String, min: Decimal },
    #[error("maximum order quantity for {name} is {max}")]
    AboveMaximum { name: String, max: Decimal },
    #[error("quantity must be at most 100000")]
    QuantityTooLarge,
    #[error("quantity can have at most 3 decimal places")]
    TooManyDecimals,
    #[error("product {0} is not in the cart")]
    ItemNotFound(ProductId),
}

/// Largest quantity a single line may hold.
pub const MAX_LINE_QUANTITY: i64 = 100_000;

/// Decimal places a quantity may carry. Order items store three.
pub const QUANTITY_SCALE: u32 = 3;

/// Check a requested line quantity before any arithmetic touches it.
///
/// # Errors
///
/// Fails if the quantity is not positive, exceeds [`MAX_LINE_QUANTITY`], or
/// has more than [`QUANTITY_SCALE`] decimal places.
pub fn validate_quantity(quantity: Decimal) -> Result<(), CartError> {
    if quantity <= Decimal::ZERO {
        return Err(CartError::InvalidQuantity);
    }
    if quantity > Decimal::from(MAX_LINE_QUANTITY) {
        return Err(CartError::QuantityTooLarge);
    }
    if quantity.normalize().scale() > QUANTITY_SCALE {
        return Err(CartError::TooManyDecimals);
    }
    Ok(())
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    /// Shipping weight of one unit of quantity.
    pub weight_kg: Decimal,
    pub stock_unit: String,
    pub min_order_qty: Decimal,
    pub max_order_qty: Option<Decimal>,
    pub quantity: Decimal,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * self.quantity
    }

    #[must_use]
    pub fn line_weight(&self) -> Decimal {
        self.weight_kg * self.quantity
    }

    fn check_limits(&self, quantity: Decimal) -> Result<(), CartError> {
        if quantity < self.min_order_qty {
            return Err(CartError::BelowMinimum {
                name: self.name.clone(),
                min: self.min_order_qty,
            });
        }
        if let Some(max) = self.max_order_qty
            && quantity > max
        {
            return Err(CartError::AboveMaximum {
                name: self.name.clone(),
                max,
            });
        }
        Ok(())
    }
}

/// Derived cart values for a chosen shipping type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub item_count: Decimal,
    pub subtotal: Decimal,
    pub total_weight_kg: Decimal,
    pub shipping_type: ShippingType,
    pub shipping: ShippingQuote,
    pub total: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `item.quantity` of a product, merging with an existing line.
    ///
    /// The existing line keeps its position; its product snapshot is
    /// refreshed from `item`.
    ///
    /// # Errors
    ///
    /// Fails if the quantity is rejected by [`validate_quantity`] or the
    /// merged quantity falls outside the product's order limits. The cart is
    /// unchanged on error.
    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        validate_quantity(item.quantity)?;

        match self.items.iter_mut().find(|line| line.product_id == item.product_id) {
            Some(line) => {
                let merged = line
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or(CartError::QuantityTooLarge)?;
                validate_quantity(merged)?;
                item.check_limits(merged)?;
                *line = CartItem {
                    quantity: merged,
                    ..item
                };
            }
            None => {
                item.check_limits(item.quantity)?;
                self.items.push(item);
            }
        }
        Ok(())
    }

    /// Remove a product's line. Returns whether a line was removed.
    pub fn remove_item(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.product_id != product_id);
        self.items.len() != before
    }

    /// Set a line's quantity; zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Fails if the quantity is rejected by [`validate_quantity`], the product
    /// is not in the cart, or the quantity breaks its order limits.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: Decimal,
    ) -> Result<(), CartError> {
        if quantity <= Decimal::ZERO {
            self.remove_item(product_id);
            return Ok(());
        }
        validate_quantity(quantity)?;

        let line = self
            .items
            .iter_mut()
            .find(|line| line.product_id == product_id)
            .ok_or(CartError::ItemNotFound(product_id))?;
        line.check_limits(quantity)?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn item_count(&self) -> Decimal {
        self.items.iter().map(|line| line.quantity).sum()
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    #[must_use]
    pub fn total_weight(&self) -> Decimal {
        self.items.iter().map(CartItem::line_weight).sum()
    }

    #[must_use]
    pub fn shipping(&self, rates: &ShippingRateTable, shipping_type: ShippingType) -> ShippingQuote {
        rates.quote(self.total_weight(), shipping_type)
    }

    /// Subtotal plus shipping.
    #[must_use]
    pub fn total(&self, rates: &ShippingRateTable, shipping_type: ShippingType) -> Decimal {
        self.subtotal() + self.shipping(rates, shipping_type).cost
    }

    #[must_use]
    pub fn summary(&self, rates: &ShippingRateTable, shipping_type: ShippingType) -> CartSummary {
        let subtotal = self.subtotal();
        let shipping = self.shipping(rates, shipping_type);
        CartSummary {
            items: self.items.clone(),
            item_count: self.item_count(),
            subtotal,
            total_weight_kg: self.total_weight(),
            shipping_type,
            total: subtotal + shipping.cost,
            shipping,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn salmon(quantity: Decimal) -> CartItem {
        CartItem {
            product_id: ProductId::new(1),
            name: "Fresh Salmon Fillet".to_owned(),
            slug: "fresh-salmon-fillet".to_owned(),
            image_url: None,
            unit_price: dec!(680),
            weight_kg: dec!(1),
            stock_unit: "kg".to_owned(),
            min_order_qty: dec!(0.5),
            max_order_qty: Some(dec!(5)),
            quantity,
        }
    }

    fn eggs(quantity: Decimal) -> CartItem {
        CartItem {
            product_id: ProductId::new(2),
            name: "Farm Fresh Eggs".to_owned(),
            slug: "farm-fresh-eggs".to_owned(),
            image_url: None,
            unit_price: dec!(180),
            weight_kg: dec!(0.7),
            stock_unit: "dozen".to_owned(),
            min_order_qty: dec!(1),
            max_order_qty: None,
            quantity,
        }
    }

    #[test]
    fn test_add_merges_same_product() {
        let mut cart = Cart::new();
        cart.add_item(salmon(dec!(1))).unwrap();
        cart.add_item(eggs(dec!(2))).unwrap();
        cart.add_item(salmon(dec!(1.5))).unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items().first().unwrap().quantity, dec!(2.5));
        assert_eq!(cart.item_count(), dec!(4.5));
    }

    #[test]
    fn test_add_rejects_non_positive_and_limits() {
        let mut cart = Cart::new();
        assert_eq!(cart.add_item(salmon(dec!(0))), Err(CartError::InvalidQuantity));
        assert!(matches!(
            cart.add_item(salmon(dec!(0.25))),
            Err(CartError::BelowMinimum { .. })
        ));

        cart.add_item(salmon(dec!(4))).unwrap();
        assert!(matches!(
            cart.add_item(salmon(dec!(2))),
            Err(CartError::AboveMaximum { .. })
        ));
        assert_eq!(cart.items().first().unwrap().quantity, dec!(4));
    }

    #[test]
    fn test_validate_quantity_bounds() {
        assert_eq!(validate_quantity(dec!(1.5)), Ok(()));
        assert_eq!(validate_quantity(dec!(1.5000)), Ok(()));
        assert_eq!(validate_quantity(dec!(100000)), Ok(()));
        assert_eq!(validate_quantity(dec!(-2)), Err(CartError::InvalidQuantity));
        assert_eq!(
            validate_quantity(dec!(100000.001)),
            Err(CartError::QuantityTooLarge)
        );
        assert_eq!(validate_quantity(Decimal::MAX), Err(CartError::QuantityTooLarge));
        assert_eq!(validate_quantity(dec!(0.3333)), Err(CartError::TooManyDecimals));
        assert_eq!(
            CartError::QuantityTooLarge.to_string(),
            format!("quantity must be at most {MAX_LINE_QUANTITY}")
        );
        assert_eq!(
            CartError::TooManyDecimals.to_string(),
            format!("quantity can have at most {QUANTITY_SCALE} decimal places")
        );
    }

    #[test]
    fn test_huge_or_too_precise_quantities_leave_cart_unchanged() {
        let mut cart = Cart::new();
        cart.add_item(eggs(dec!(60000))).unwrap();

        // Each add is in range on its own; the merged line is not.
        assert_eq!(
            cart.add_item(eggs(dec!(60000))),
            Err(CartError::QuantityTooLarge)
        );
        assert_eq!(cart.add_item(eggs(Decimal::MAX)), Err(CartError::QuantityTooLarge));
        assert_eq!(cart.add_item(eggs(dec!(0.3333))), Err(CartError::TooManyDecimals));
        assert_eq!(
            cart.update_quantity(ProductId::new(2), Decimal::MAX),
            Err(CartError::QuantityTooLarge)
        );
        assert_eq!(
            cart.update_quantity(ProductId::new(9), dec!(1.0001)),
            Err(CartError::TooManyDecimals)
        );
        assert_eq!(cart.items().first().unwrap().quantity, dec!(60000));
        assert_eq!(cart.subtotal(), dec!(10800000));
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add_item(eggs(dec!(3))).unwrap();
        cart.update_quantity(ProductId::new(2), dec!(0)).unwrap();
        assert!(cart.is_empty());

        // Removing something absent through update is not an error.
        cart.update_quantity(ProductId::new(9), dec!(-1)).unwrap();
    }

    #[test]
    fn test_update_unknown_product_fails() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.update_quantity(ProductId::new(9), dec!(1)),
            Err(CartError::ItemNotFound(ProductId::new(9)))
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add_item(salmon(dec!(1))).unwrap();
        cart.add_item(eggs(dec!(1))).unwrap();

        assert!(cart.remove_item(ProductId::new(1)));
        assert!(!cart.remove_item(ProductId::new(1)));
        assert_eq!(cart.items().len(), 1);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Decimal::ZERO);
    }

    #[test]
    fn test_totals_include_shipping() {
        let mut cart = Cart::new();
        cart.add_item(salmon(dec!(2))).unwrap();
        cart.add_item(eggs(dec!(2))).unwrap();
        let rates = ShippingRateTable::default();

        // weight 2 + 1.4 = 3.4 kg -> 50 + 3.4 × 15 = 101
        assert_eq!(cart.subtotal(), dec!(1720));
        assert_eq!(cart.total_weight(), dec!(3.4));
        assert_eq!(cart.shipping(&rates, ShippingType::Standard).cost, dec!(101));
        assert_eq!(cart.total(&rates, ShippingType::Standard), dec!(1821));

        let summary = cart.summary(&rates, ShippingType::Express);
        // 150 + 3.4 × 25 = 235
        assert_eq!(summary.shipping.cost, dec!(235));
        assert_eq!(summary.total, summary.subtotal + summary.shipping.cost);
    }

    #[test]
    fn test_empty_cart_still_quotes_base_shipping() {
        let cart = Cart::new();
        let rates = ShippingRateTable::default();
        assert_eq!(cart.total(&rates, ShippingType::Standard), dec!(50));
    }
}
