//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Password accounts with a marketplace role
//! - `checkout` - Basket pricing and order creation with payment rollback
//! - `paymongo` - Hosted checkout sessions
//! - `shipping_rates` - Cached shipping rate table

pub mod auth;
pub mod checkout;
pub mod paymongo;
pub mod shipping_rates;
