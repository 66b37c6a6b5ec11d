//! Shipping rate repository.

use rust_decimal::Decimal;
use sqlx::PgPool;

use freshdart_core::{ShippingRate, ShippingRateTable, ShippingType};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct ShippingRateRow {
    name: String,
    shipping_type: ShippingType,
    min_weight_kg: Decimal,
    max_weight_kg: Option<Decimal>,
    base_price: Decimal,
    price_per_kg: Decimal,
    estimated_days: i32,
}

impl TryFrom<ShippingRateRow> for ShippingRate {
    type Error = RepositoryError;

    fn try_from(row: ShippingRateRow) -> Result<Self, Self::Error> {
        let estimated_days = u32::try_from(row.estimated_days).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative estimated_days for rate {}",
                row.name
            ))
        })?;

        Ok(Self {
            name: row.name,
            shipping_type: row.shipping_type,
            min_weight_kg: row.min_weight_kg,
            max_weight_kg: row.max_weight_kg,
            base_price: row.base_price,
            price_per_kg: row.price_per_kg,
            estimated_days,
        })
    }
}

/// Repository for weight-banded shipping rates.
pub struct ShippingRateRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShippingRateRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every stored rate, ordered by type and ascending weight band.
    ///
    /// An empty table means no rates are configured; callers fall back to
    /// [`ShippingRateTable::default`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn load_table(&self) -> Result<ShippingRateTable, RepositoryError> {
        let rows = sqlx::query_as::<_, ShippingRateRow>(
            r"
            SELECT r.name, r.shipping_type, r.min_weight_kg, r.max_weight_kg,
                   r.base_price, r.price_per_kg, r.estimated_days
            FROM storefront.shipping_rate r
            JOIN storefront.shipping_zone z ON z.id = r.zone_id
            ORDER BY z.id, r.shipping_type, r.min_weight_kg
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let rates = rows
            .into_iter()
            .map(ShippingRate::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ShippingRateTable::new(rates))
    }
}
