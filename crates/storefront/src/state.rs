//! Application state shared across handlers.

use std::sync::Arc;

use katale_core::PricingPolicy;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, MarketplaceClient};
use crate::config::StorefrontConfig;
use crate::services::CheckoutService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the marketplace client and configuration. It holds
/// no per-shopper data; carts and checkouts live in the session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: MarketplaceClient,
    checkout: CheckoutService,
    shutdown: CancellationToken,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `shutdown` - Cancelled when the server begins graceful shutdown
    ///
    /// # Errors
    ///
    /// Returns an error if the marketplace API client cannot be built.
    pub fn new(config: StorefrontConfig, shutdown: CancellationToken) -> Result<Self, ApiError> {
        let api = MarketplaceClient::new(&config.api)?;
        let checkout = CheckoutService::new(api.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                checkout,
                shutdown,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the pricing policy.
    #[must_use]
    pub fn pricing(&self) -> &PricingPolicy {
        &self.inner.config.pricing
    }

    /// Get a reference to the marketplace API client.
    #[must_use]
    pub fn api(&self) -> &MarketplaceClient {
        &self.inner.api
    }

    /// Get a reference to the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    /// A token for one unit of work that is cancelled on server shutdown.
    #[must_use]
    pub fn cancellation(&self) -> CancellationToken {
        self.inner.shutdown.child_token()
    }
}
