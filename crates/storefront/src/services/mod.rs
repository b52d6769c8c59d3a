//! Business logic services for storefront.
//!
//! # Services
//!
//! - `checkout` - Zone snapshot loading and order submission

pub mod checkout;

pub use checkout::{CheckoutService, SubmitError};
