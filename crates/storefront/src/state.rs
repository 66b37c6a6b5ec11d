//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::checkout::PgCheckoutStore;
use crate::services::paymongo::{PayMongoClient, PaymentError, PaymentGateway};
use crate::services::shipping_rates::ShippingRateCache;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    payments: Arc<dyn PaymentGateway>,
    shipping_rates: ShippingRateCache,
    checkout_store: PgCheckoutStore,
}

impl AppState {
    /// Create the application state with the `PayMongo` client.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, PaymentError> {
        let payments = Arc::new(PayMongoClient::new(&config.payment)?);
        Ok(Self::with_gateway(config, pool, payments))
    }

    /// Create the application state with a specific payment gateway.
    #[must_use]
    pub fn with_gateway(
        config: StorefrontConfig,
        pool: PgPool,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        let shipping_rates = ShippingRateCache::new(pool.clone(), config.shipping_rates_ttl);
        let checkout_store = PgCheckoutStore::new(pool.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                payments,
                shipping_rates,
                checkout_store,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn payments(&self) -> &dyn PaymentGateway {
        self.inner.payments.as_ref()
    }

    #[must_use]
    pub fn shipping_rates(&self) -> &ShippingRateCache {
        &self.inner.shipping_rates
    }

    #[must_use]
    pub fn checkout_store(&self) -> &PgCheckoutStore {
        &self.inner.checkout_store
    }
}
