//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::commerce::CommerceClient;
use crate::config::StorefrontConfig;
use crate::payment::{VnpayGateway, ZalopayGateway};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the remote API clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    commerce: CommerceClient,
    vnpay: VnpayGateway,
    zalopay: ZalopayGateway,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool (session store)
    ///
    /// # Errors
    ///
    /// Returns an error if one of the HTTP clients fails to build.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, reqwest::Error> {
        let commerce = CommerceClient::new(&config.commerce)?;
        let vnpay = VnpayGateway::new(&config.payment.vnpay, &config.payment.vnpay_locale)?;
        let zalopay = ZalopayGateway::new(&config.payment.zalopay)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                commerce,
                vnpay,
                zalopay,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the session-store connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the remote commerce API client.
    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }

    /// Get a reference to the VNPay gateway adapter.
    #[must_use]
    pub fn vnpay(&self) -> &VnpayGateway {
        &self.inner.vnpay
    }

    /// Get a reference to the ZaloPay gateway adapter.
    #[must_use]
    pub fn zalopay(&self) -> &ZalopayGateway {
        &self.inner.zalopay
    }
}
