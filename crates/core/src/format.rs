//! Display helpers for prices, weights and slugs.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::Money;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_\s-]").expect("Invalid regex"));

static SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_-]+").expect("Invalid regex"));

/// Peso amount for display, e.g. `₱1,469.50`.
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    Money::php(amount).display()
}

/// Weight for display: grams below one kilogram, else kilograms with two
/// decimals (`750g`, `2.50kg`).
#[must_use]
pub fn format_weight(weight_kg: Decimal) -> String {
    if weight_kg < Decimal::ONE {
        let grams = (weight_kg * Decimal::ONE_THOUSAND)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        format!("{grams}g")
    } else {
        format!("{weight_kg:.2}kg")
    }
}

/// URL slug: lowercase ASCII letters and digits joined by single hyphens.
///
/// ```
/// use freshdart_core::format::slugify;
///
/// assert_eq!(slugify("Meat & Seafood"), "meat-seafood");
/// assert_eq!(slugify("  Fresh_Salmon -- Fillet "), "fresh-salmon-fillet");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let joined = SEPARATOR_RUNS.replace_all(&stripped, "-");
    joined.trim_matches('-').to_owned()
}
