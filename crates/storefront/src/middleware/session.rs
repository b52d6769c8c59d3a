//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. The store is
//! shared with the sign-in service: it writes `user_session` under the same
//! cookie, and the storefront adds the cart and checkout progress.

use sqlx::PgPool;
use tokio::task::JoinHandle;
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "katale_session";

/// Session expiry time in seconds (2 days).
const SESSION_EXPIRY_SECONDS: i64 = 2 * 24 * 60 * 60;

/// How often expired sessions are purged from the store.
const EXPIRED_DELETION_INTERVAL_SECONDS: u64 = 60;

/// Create the shared `PostgreSQL` session store.
///
/// Creates the `tower_sessions` schema and table if they do not exist yet.
///
/// # Errors
///
/// Returns `sqlx::Error` if the table cannot be created.
pub async fn create_session_store(pool: &PgPool) -> Result<PostgresStore, sqlx::Error> {
    let store = PostgresStore::new(pool.clone());
    store.migrate().await?;
    Ok(store)
}

/// Periodically delete expired sessions until the task is aborted.
pub fn spawn_expired_deletion(
    store: PostgresStore,
) -> JoinHandle<tower_sessions::session_store::Result<()>> {
    tokio::task::spawn(store.continuously_delete_expired(tokio::time::Duration::from_secs(
        EXPIRED_DELETION_INTERVAL_SECONDS,
    )))
}

/// Create the session layer over `store`.
///
/// # Arguments
///
/// * `store` - Session store (`PostgresStore` in production)
/// * `config` - Storefront configuration (for cookie security)
#[must_use]
pub fn create_session_layer<S>(store: S, config: &StorefrontConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
