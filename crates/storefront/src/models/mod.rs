//! Domain models for storefront.
//!
//! Everything here is stored in the shopper's tower-session; the marketplace
//! backend owns all persistent data.

pub mod session;

pub use session::{CheckoutSession, CurrentUser, PlacedOrder, keys as session_keys};
