//! FreshDart Core - Shared types and pricing rules.
//!
//! This crate provides the domain types used across all FreshDart components:
//! - `storefront` - JSON API for catalog, cart, checkout and dashboards
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Shipping quotes and cart totals are computed here
//! so the storefront and the tests agree on a single set of pricing rules.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, roles and statuses
//! - [`shipping`] - Weight-banded shipping rates and delivery scheduling
//! - [`cart`] - Cart aggregate with derived totals
//! - [`freshness`] - Best-before classification for perishable products
//! - [`format`] - Display helpers for prices, weights and slugs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod format;
pub mod freshness;
pub mod shipping;
pub mod types;

pub use cart::{
    Cart, CartError, CartItem, CartSummary, MAX_LINE_QUANTITY, QUANTITY_SCALE, validate_quantity,
};
pub use freshness::Freshness;
pub use shipping::{DeliveryTimeSlot, ShippingQuote, ShippingRate, ShippingRateTable};
pub use types::*;
