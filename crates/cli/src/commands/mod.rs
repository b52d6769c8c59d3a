//! CLI subcommand implementations.

pub mod quote;
pub mod zones;

use katale_core::{CartError, UgxError};
use katale_storefront::api::ApiError;
use katale_storefront::config::ConfigError;
use thiserror::Error;

/// Errors from running a CLI command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("marketplace API error: {0}")]
    Api(#[from] ApiError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid cart file: {0}")]
    CartFile(#[from] serde_yaml::Error),

    #[error("invalid cart: {0}")]
    Cart(#[from] CartError),

    #[error("invalid subtotal: {0}")]
    Subtotal(#[from] UgxError),
}
