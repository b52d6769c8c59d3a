//! Core types for Katale.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod phone;
pub mod status;

pub use id::*;
pub use money::{Ugx, UgxError};
pub use phone::{MobileNetwork, PhoneError, PhoneNumber};
pub use status::*;
