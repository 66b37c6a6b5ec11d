//! Best-before classification for perishable products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// How close a product is to its best-before date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Freshness {
    Fresh,
    Good,
    ExpiringSoon,
    Expired,
}

impl Freshness {
    /// Classify by whole days remaining. Products without a best-before date
    /// are always fresh.
    #[must_use]
    pub const fn from_days(days_until_expiry: Option<i64>) -> Self {
        match days_until_expiry {
            None => Self::Fresh,
            Some(days) if days <= 0 => Self::Expired,
            Some(days) if days <= 2 => Self::ExpiringSoon,
            Some(days) if days <= 5 => Self::Good,
            Some(_) => Self::Fresh,
        }
    }

    #[must_use]
    pub fn at(best_before: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        Self::from_days(best_before.map(|date| days_until_expiry(date, now)))
    }

    /// Badge text shown next to the product.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fresh => "Fresh",
            Self::Good => "Good",
            Self::ExpiringSoon => "Use Soon",
            Self::Expired => "Expired",
        }
    }
}

/// Days until `best_before`, rounded up; a partial day counts as a day.
#[must_use]
pub fn days_until_expiry(best_before: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (best_before - now).num_milliseconds();
    millis.div_euclid(MILLIS_PER_DAY) + i64::from(millis.rem_euclid(MILLIS_PER_DAY) != 0)
}
