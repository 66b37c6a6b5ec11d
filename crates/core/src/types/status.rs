//! Status and role enums shared by the storefront, the CLI and the database.
//!
//! Each enum maps to a `PostgreSQL` enum in the `storefront` schema when the
//! `postgres` feature is enabled. The serde and database spellings are the
//! same, so a value read from a row can be echoed in a JSON response as-is.

use serde::{Deserialize, Serialize};

/// Implements `as_str`, `Display` and `FromStr` from one table of spellings.
macro_rules! wire_names {
    ($ty:ident, $label:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// All variants in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The serialized (and database) spelling of this value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl ::core::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", $label, ": {}"), s)),
                }
            }
        }
    };
}

/// Marketplace account role.
///
/// Each role owns one dashboard area; see [`UserRole::dashboard_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.user_role", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Retail or MSME buyer.
    #[default]
    Customer,
    /// Reseller managing marketplace orders.
    Merchant,
    /// Farm or fishery supplying products.
    Producer,
}

wire_names!(UserRole, "user role", {
    Customer => "CUSTOMER",
    Merchant => "MERCHANT",
    Producer => "PRODUCER",
});

impl UserRole {
    /// URL prefix of the role's dashboard area.
    #[must_use]
    pub const fn area_prefix(self) -> &'static str {
        match self {
            Self::Customer => "/customer",
            Self::Merchant => "/merchant",
            Self::Producer => "/producer",
        }
    }

    /// Landing page for a signed-in user with this role.
    #[must_use]
    pub const fn dashboard_path(self) -> &'static str {
        match self {
            Self::Customer => "/customer/dashboard",
            Self::Merchant => "/merchant/dashboard",
            Self::Producer => "/producer/dashboard",
        }
    }

    /// The role whose dashboard area contains `path`, if any.
    #[must_use]
    pub fn owning_area(path: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|role| {
            let prefix = role.area_prefix();
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

/// Product availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.product_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    #[default]
    Active,
    OutOfStock,
    Discontinued,
}

wire_names!(ProductStatus, "product status", {
    Active => "ACTIVE",
    OutOfStock => "OUT_OF_STOCK",
    Discontinued => "DISCONTINUED",
});

/// Whether a product is sold by weight (kilograms) or by unit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.stock_type", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockType {
    #[default]
    Weight,
    Unit,
}

wire_names!(StockType, "stock type", {
    Weight => "WEIGHT",
    Unit => "UNIT",
});

/// Order fulfillment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.order_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

wire_names!(OrderStatus, "order status", {
    Pending => "PENDING",
    Confirmed => "CONFIRMED",
    Processing => "PROCESSING",
    Shipped => "SHIPPED",
    Delivered => "DELIVERED",
    Cancelled => "CANCELLED",
});

impl OrderStatus {
    /// Orders that are neither delivered nor cancelled.
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// Payment state of an order, driven by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.payment_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

wire_names!(PaymentStatus, "payment status", {
    Pending => "PENDING",
    Paid => "PAID",
    Failed => "FAILED",
    Refunded => "REFUNDED",
});

/// Delivery speed chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.shipping_type", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ShippingType {
    #[default]
    Standard,
    Express,
}

wire_names!(ShippingType, "shipping type", {
    Standard => "standard",
    Express => "express",
});
