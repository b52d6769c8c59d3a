//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `MARKETPLACE_API_URL` - Base URL of the marketplace REST API
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for the session
//!   store shared with the sign-in service (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_LOGIN_URL` - Where shoppers without a session are sent (default: /auth/login)
//! - `MARKETPLACE_API_TOKEN` - Bearer token for the marketplace API
//! - `MARKETPLACE_API_TIMEOUT_SECS` - Per-request timeout (default: 15)
//! - `CHECKOUT_FREE_SHIPPING_THRESHOLD` - Subtotal above which shipping is free (default: 100000)
//! - `CHECKOUT_FALLBACK_SHIPPING` - Shipping when no zone matches (default: 15000)
//! - `CHECKOUT_TAX_RATE` - VAT rate as a fraction (default: 0.18)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use katale_core::{PricingPolicy, Ugx};
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Login page for shoppers who reach checkout without a session
    pub login_url: String,
    /// Session store database, shared with the sign-in service
    pub database_url: SecretString,
    /// Marketplace API configuration
    pub api: MarketplaceApiConfig,
    /// Checkout pricing constants
    pub pricing: PricingPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Marketplace REST API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct MarketplaceApiConfig {
    /// Base URL; endpoint paths such as `api/orders` are resolved under it,
    /// keeping any path prefix
    pub base_url: Url,
    /// Optional bearer token sent with every request
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for MarketplaceApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketplaceApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MarketplaceApiConfig {
    /// Configuration for an API at `base_url` with no token and the default timeout.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            timeout: Duration::from_secs(15),
        }
    }

    /// Load the API settings from `MARKETPLACE_API_*` variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is missing or invalid, the timeout is
    /// not a number, or the token fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("MARKETPLACE_API_URL")?;
        let base_url = Url::parse(&raw).map_err(|e| {
            ConfigError::InvalidEnvVar("MARKETPLACE_API_URL".to_string(), e.to_string())
        })?;

        let token = get_optional_env("MARKETPLACE_API_TOKEN")
            .map(|value| {
                validate_secret_strength(&value, "MARKETPLACE_API_TOKEN")?;
                Ok(SecretString::from(value))
            })
            .transpose()?;

        let timeout_secs = get_env_or_default("MARKETPLACE_API_TIMEOUT_SECS", "15")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("MARKETPLACE_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            base_url,
            token,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let login_url = get_env_or_default("STOREFRONT_LOGIN_URL", "/auth/login");
        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;

        let api = MarketplaceApiConfig::from_env()?;
        let pricing = pricing_from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            login_url,
            database_url,
            api,
            pricing,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Minimal configuration pointing at a marketplace API, used by tests and tooling.
    #[must_use]
    pub fn for_api(api_base_url: Url) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: "http://localhost".to_string(),
            login_url: "/auth/login".to_string(),
            database_url: SecretString::from("postgres://localhost/katale"),
            api: MarketplaceApiConfig::new(api_base_url),
            pricing: PricingPolicy::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

/// Read pricing overrides, falling back to [`PricingPolicy::default`].
///
/// # Errors
///
/// Returns `ConfigError` if an override is not a valid amount or rate.
pub fn pricing_from_env() -> Result<PricingPolicy, ConfigError> {
    let defaults = PricingPolicy::default();

    let free_shipping_threshold = get_optional_env("CHECKOUT_FREE_SHIPPING_THRESHOLD")
        .map(|raw| parse_amount("CHECKOUT_FREE_SHIPPING_THRESHOLD", &raw))
        .transpose()?
        .unwrap_or(defaults.free_shipping_threshold);
    let fallback_shipping = get_optional_env("CHECKOUT_FALLBACK_SHIPPING")
        .map(|raw| parse_amount("CHECKOUT_FALLBACK_SHIPPING", &raw))
        .transpose()?
        .unwrap_or(defaults.fallback_shipping);
    let tax_rate = get_optional_env("CHECKOUT_TAX_RATE")
        .map(|raw| parse_rate("CHECKOUT_TAX_RATE", &raw))
        .transpose()?
        .unwrap_or(defaults.tax_rate);

    Ok(PricingPolicy {
        free_shipping_threshold,
        fallback_shipping,
        tax_rate,
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating an empty value as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Some(value) = get_optional_env(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Some(value) = get_optional_env("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_amount(key: &str, raw: &str) -> Result<Ugx, ConfigError> {
    Ugx::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a fraction between 0 and 1 inclusive.
fn parse_rate(key: &str, raw: &str) -> Result<Decimal, ConfigError> {
    let rate: Decimal = raw
        .trim()
        .parse()
        .map_err(|e: rust_decimal::Error| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("rate must be between 0 and 1 (got {rate})"),
        ));
    }
    Ok(rate)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated token."
            ),
        ));
    }

    Ok(())
}
