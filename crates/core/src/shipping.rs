//! Weight-banded shipping rates and delivery scheduling.
//!
//! A [`ShippingRateTable`] holds tiers for each [`ShippingType`]. A quote
//! picks the first tier of the requested type whose half-open band
//! `[min_weight_kg, max_weight_kg)` contains the parcel weight and charges
//! `base_price + weight × price_per_kg`. Weights outside every band use the
//! last tier of that type. With no tiers at all, shipping is free.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use rust_decimal::Decimal;
use rust_decimal::dec;
use serde::{Deserialize, Serialize};

use crate::types::ShippingType;

/// Rate name reported when no tier of the requested type exists.
pub const FREE_SHIPPING: &str = "Free Shipping";

/// Delivery estimate used for free shipping.
pub const FREE_SHIPPING_DAYS: u32 = 3;

/// Heaviest parcel the quote endpoint will price.
pub const MAX_WEIGHT_KG: i64 = 100_000;

/// Number of calendar days offered by the delivery date picker.
pub const DEFAULT_DAYS_TO_SHOW: u32 = 7;

/// One pricing tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRate {
    pub name: String,
    pub shipping_type: ShippingType,
    pub min_weight_kg: Decimal,
    /// Exclusive upper bound; `None` means unbounded.
    pub max_weight_kg: Option<Decimal>,
    pub base_price: Decimal,
    pub price_per_kg: Decimal,
    pub estimated_days: u32,
}

impl ShippingRate {
    #[must_use]
    pub fn contains(&self, weight_kg: Decimal) -> bool {
        weight_kg >= self.min_weight_kg && self.max_weight_kg.is_none_or(|max| weight_kg < max)
    }

    /// `base_price + weight × price_per_kg`, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn cost_for(&self, weight_kg: Decimal) -> Decimal {
        self.base_price
            .saturating_add(weight_kg.saturating_mul(self.price_per_kg))
    }
}

/// Result of a shipping lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub cost: Decimal,
    pub estimated_days: u32,
    pub rate_name: String,
}

impl ShippingQuote {
    #[must_use]
    pub fn free() -> Self {
        Self {
            cost: Decimal::ZERO,
            estimated_days: FREE_SHIPPING_DAYS,
            rate_name: FREE_SHIPPING.to_owned(),
        }
    }
}

/// Ordered collection of shipping tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRateTable {
    rates: Vec<ShippingRate>,
}

impl ShippingRateTable {
    /// Build a table from tiers in lookup order.
    #[must_use]
    pub const fn new(rates: Vec<ShippingRate>) -> Self {
        Self { rates }
    }

    #[must_use]
    pub fn rates(&self) -> &[ShippingRate] {
        &self.rates
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Quote shipping for a parcel. Never fails.
    #[must_use]
    pub fn quote(&self, weight_kg: Decimal, shipping_type: ShippingType) -> ShippingQuote {
        let mut tiers = self
            .rates
            .iter()
            .filter(|rate| rate.shipping_type == shipping_type)
            .peekable();

        let mut last = None;
        while let Some(rate) = tiers.next() {
            if rate.contains(weight_kg) {
                return quote_from(rate, weight_kg);
            }
            if tiers.peek().is_none() {
                last = Some(rate);
            }
        }

        last.map_or_else(ShippingQuote::free, |rate| quote_from(rate, weight_kg))
    }
}

impl Default for ShippingRateTable {
    /// Built-in tiers used when no rates are configured in the database.
    fn default() -> Self {
        let standard = |min, max, base, per_kg| ShippingRate {
            name: "Standard Delivery".to_owned(),
            shipping_type: ShippingType::Standard,
            min_weight_kg: min,
            max_weight_kg: max,
            base_price: base,
            price_per_kg: per_kg,
            estimated_days: 3,
        };

        Self::new(vec![
            standard(dec!(0), Some(dec!(5)), dec!(50), dec!(15)),
            standard(dec!(5), Some(dec!(15)), dec!(75), dec!(12)),
            standard(dec!(15), None, dec!(100), dec!(10)),
            ShippingRate {
                name: "Express Delivery".to_owned(),
                shipping_type: ShippingType::Express,
                min_weight_kg: dec!(0),
                max_weight_kg: Some(dec!(10)),
                base_price: dec!(150),
                price_per_kg: dec!(25),
                estimated_days: 1,
            },
        ])
    }
}

fn quote_from(rate: &ShippingRate, weight_kg: Decimal) -> ShippingQuote {
    ShippingQuote {
        cost: rate.cost_for(weight_kg),
        estimated_days: rate.estimated_days,
        rate_name: rate.name.clone(),
    }
}

/// Delivery dates offered at checkout.
///
/// Starts `estimated_days` after `today` and walks `days_to_show`
/// consecutive calendar days, leaving out Sundays.
#[must_use]
pub fn available_delivery_dates(
    today: NaiveDate,
    estimated_days: u32,
    days_to_show: u32,
) -> Vec<NaiveDate> {
    let Some(start) = today.checked_add_days(Days::new(u64::from(estimated_days))) else {
        return Vec::new();
    };

    start
        .iter_days()
        .take(days_to_show as usize)
        .filter(|date| date.weekday() != Weekday::Sun)
        .collect()
}

/// Delivery windows a buyer can choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryTimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl DeliveryTimeSlot {
    pub const ALL: [Self; 3] = [Self::Morning, Self::Afternoon, Self::Evening];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Morning => "Morning (8:00 AM - 12:00 PM)",
            Self::Afternoon => "Afternoon (12:00 PM - 5:00 PM)",
            Self::Evening => "Evening (5:00 PM - 8:00 PM)",
        }
    }
}

impl std::str::FromStr for DeliveryTimeSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.id() == s)
            .ok_or_else(|| format!("invalid delivery time slot: {s}"))
    }
}
