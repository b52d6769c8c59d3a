//! Session-related types.
//!
//! Types stored in the session for identity, cart and checkout state.

use serde::{Deserialize, Serialize};

use katale_core::{
    CheckoutWizard, IdempotencyKey, OrderId, OrderStatus, PaymentMethod, Ugx, UserId,
    ZoneResolver,
};

/// Session-stored user identity.
///
/// Written by the sign-in service under [`keys::CURRENT_USER`] into the
/// session store both services share; the storefront only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Marketplace user ID, sent as the order's `customerId`.
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Checkout state for one session.
///
/// Created when the shopper first opens `/checkout`. The zone snapshot is
/// taken at that moment and reused for every quote until the checkout ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub wizard: CheckoutWizard,
    pub zones: ZoneResolver,
    /// Sent with every submission attempt; rotated after an order is created.
    pub idempotency_key: IdempotencyKey,
}

impl CheckoutSession {
    /// Start a checkout at the shipping step over a zone snapshot.
    #[must_use]
    pub fn start(zones: ZoneResolver) -> Self {
        Self {
            wizard: CheckoutWizard::new(),
            zones,
            idempotency_key: IdempotencyKey::generate(),
        }
    }
}

/// Summary of the last order placed in this session, shown on the confirmation page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    /// Present when the backend returned a receipt.
    pub order_id: Option<OrderId>,
    pub status: OrderStatus,
    pub total: Ugx,
    pub item_count: u32,
    pub payment_method: PaymentMethod,
}

/// Session keys for storefront data.
pub mod keys {
    /// Key for the signed-in user, written by the authentication service.
    pub const CURRENT_USER: &str = "user_session";

    /// Key for the shopping cart.
    pub const CART: &str = "cart";

    /// Key for the in-progress checkout.
    pub const CHECKOUT: &str = "checkout";

    /// Key for the most recently placed order.
    pub const LAST_ORDER: &str = "last_order";
}
