//! Katale Core - Domain types and checkout rules.
//!
//! This crate provides the types and business rules shared by all Katale
//! components:
//! - `storefront` - Public-facing marketplace site (cart and checkout)
//! - `cli` - Command-line tools for zone inspection and price quotes
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session handling. Everything here can be unit tested without a
//! runtime, and the storefront decides where the state lives.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money, phone numbers and statuses
//! - [`cart`] - Session cart with per-line quantities
//! - [`delivery`] - Delivery zones and district resolution
//! - [`pricing`] - Subtotal, shipping, tax and total
//! - [`checkout`] - Three-step checkout wizard and field validation
//! - [`order`] - Order creation request sent to the marketplace API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod delivery;
pub mod order;
pub mod pricing;
pub mod types;

pub use cart::{Cart, CartError, CartItem};
pub use checkout::{
    CardDetails, CheckoutField, CheckoutForm, CheckoutStep, CheckoutWizard, PaymentDetails,
    ShippingDetails, StepError, ValidationError,
};
pub use delivery::{DeliveryZone, ZoneResolver};
pub use order::{
    IdempotencyKey, OrderError, OrderItemRequest, OrderReceipt, OrderRequest, ShippingAddress,
};
pub use pricing::{PriceBreakdown, PricingPolicy};
pub use types::*;
