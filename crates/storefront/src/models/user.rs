//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use freshdart_core::{Email, UserId, UserRole};

/// A marketplace account.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}
