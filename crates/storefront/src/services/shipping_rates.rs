//! In-process cache of the shipping rate table.
//!
//! Rates change rarely, so the whole table is cached under a single key.
//! An empty `shipping_rate` table means the built-in default tiers apply.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::debug;

use freshdart_core::ShippingRateTable;

use crate::db::{RepositoryError, ShippingRateRepository};

/// Cached shipping rates, shared across requests.
#[derive(Clone)]
pub struct ShippingRateCache {
    pool: PgPool,
    cache: Cache<(), Arc<ShippingRateTable>>,
}

impl ShippingRateCache {
    #[must_use]
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { pool, cache }
    }

    /// The current rate table, loading it on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if loading fails.
    pub async fn get(&self) -> Result<Arc<ShippingRateTable>, RepositoryError> {
        if let Some(table) = self.cache.get(&()).await {
            return Ok(table);
        }

        let loaded = ShippingRateRepository::new(&self.pool).load_table().await?;
        let table = if loaded.is_empty() {
            debug!("no shipping rates stored, using default tiers");
            Arc::new(ShippingRateTable::default())
        } else {
            Arc::new(loaded)
        };

        self.cache.insert((), Arc::clone(&table)).await;
        Ok(table)
    }

    /// Replace the cached table until the TTL expires.
    pub async fn prime(&self, table: ShippingRateTable) {
        self.cache.insert((), Arc::new(table)).await;
    }

    /// Drop the cached table so the next read reloads it.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }
}
