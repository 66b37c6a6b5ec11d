//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. All of them serialize straight into API responses.

pub mod category;
pub mod order;
pub mod pagination;
pub mod product;
pub mod session;
pub mod user;

pub use category::{Category, CategoryDetail, CategoryNode, CategoryRef};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderSummary, ShippingAddress};
pub use pagination::{Cursor, CursorError, Page};
pub use product::{Product, ProductImage, ProductQuery, ProductSort, SortOrder};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
