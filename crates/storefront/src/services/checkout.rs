//! Checkout service: zone snapshots and order submission.
//!
//! Submission is a single best-effort `POST /api/orders`. Each attempt
//! carries the checkout's idempotency key, and a key that is already being
//! submitted is rejected here without touching the network. Attempts run
//! under a [`CancellationToken`] so server shutdown aborts them cleanly.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use katale_core::{
    Cart, CheckoutWizard, IdempotencyKey, OrderError, OrderReceipt, OrderRequest, ZoneResolver,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::api::{ApiError, MarketplaceClient};
use crate::models::CurrentUser;

/// Errors from submitting an order.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// No user identity in the session.
    #[error("no signed-in user")]
    NotSignedIn,

    /// Another request is already submitting this checkout.
    #[error("order {0} is already being submitted")]
    AlreadyInFlight(IdempotencyKey),

    /// The attempt was cancelled before the backend answered.
    #[error("order submission cancelled")]
    Cancelled,

    /// Cart or checkout state cannot produce an order.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// The marketplace API failed or rejected the order.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Zone loading and order submission against the marketplace API.
#[derive(Clone)]
pub struct CheckoutService {
    api: MarketplaceClient,
    in_flight: Arc<InFlight>,
}

/// Process-wide set of idempotency keys with a request on the wire.
#[derive(Debug, Default)]
struct InFlight {
    keys: Mutex<HashSet<IdempotencyKey>>,
}

/// Removes its key from the registry when dropped.
struct InFlightGuard<'a> {
    registry: &'a InFlight,
    key: IdempotencyKey,
}

impl InFlight {
    fn acquire(&self, key: IdempotencyKey) -> Option<InFlightGuard<'_>> {
        let inserted = self
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);

        inserted.then_some(InFlightGuard {
            registry: self,
            key,
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

impl CheckoutService {
    #[must_use]
    pub fn new(api: MarketplaceClient) -> Self {
        Self {
            api,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Take a snapshot of the delivery zones for a new checkout.
    ///
    /// A failed fetch is logged and yields an empty resolver, so every
    /// district is priced with the fallback shipping cost.
    #[instrument(skip(self))]
    pub async fn load_zones(&self) -> ZoneResolver {
        match self.api.delivery_zones().await {
            Ok(zones) => ZoneResolver::new(zones),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch delivery zones, using fallback shipping");
                ZoneResolver::empty()
            }
        }
    }

    /// Submit the order for a completed checkout.
    ///
    /// Nothing is sent when no user is signed in, when the checkout is not
    /// ready, when `cancel` has already fired, or when `key` is already being
    /// submitted by another request.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] describing which of the above happened, or the
    /// API failure.
    #[instrument(skip_all, fields(idempotency_key = %key, items = cart.items().len()))]
    pub async fn submit(
        &self,
        user: Option<&CurrentUser>,
        cart: &Cart,
        wizard: &CheckoutWizard,
        key: IdempotencyKey,
        cancel: &CancellationToken,
    ) -> Result<Option<OrderReceipt>, SubmitError> {
        let user = user.ok_or(SubmitError::NotSignedIn)?;
        let request = OrderRequest::from_checkout(user.id.clone(), cart, wizard)?;

        if cancel.is_cancelled() {
            return Err(SubmitError::Cancelled);
        }

        let _guard = self
            .in_flight
            .acquire(key)
            .ok_or(SubmitError::AlreadyInFlight(key))?;

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::warn!("Order submission cancelled while waiting for the marketplace API");
                Err(SubmitError::Cancelled)
            }
            result = self.api.create_order(&request, key) => {
                let receipt = result?;
                tracing::info!(
                    order_id = receipt.as_ref().map(|r| r.id.as_str()),
                    "Order created"
                );
                Ok(receipt)
            }
        }
    }
}
