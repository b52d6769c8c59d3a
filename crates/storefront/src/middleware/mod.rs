//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with the shared `PostgreSQL` store)

pub mod auth;
pub mod session;

pub use auth::{OptionalAuth, login_redirect};
pub use session::{
    SESSION_COOKIE_NAME, create_session_layer, create_session_store, spawn_expired_deletion,
};
