//! Marketplace REST API client.
//!
//! # Architecture
//!
//! - The marketplace backend is the source of truth for zones and orders
//! - Plain JSON over HTTP via `reqwest`; every response is wrapped in an
//!   envelope `{ success, data?, error? }`
//! - No caching: delivery zones are fetched once per checkout session
//!
//! # Endpoints
//!
//! ```text
//! GET  /api/delivery-zones   -> { success, data: DeliveryZone[] }
//! POST /api/orders           -> { success, error?, data?: { id, status } }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use katale_storefront::api::MarketplaceClient;
//!
//! let client = MarketplaceClient::new(&config.api)?;
//! let zones = client.delivery_zones().await?;
//! let receipt = client.create_order(&request, IdempotencyKey::generate()).await?;
//! ```

mod client;

pub use client::{IDEMPOTENCY_KEY_HEADER, MarketplaceClient};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the marketplace API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status code.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// API answered `success: false`.
    #[error("Rejected by API: {0}")]
    Rejected(String),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Envelope reported success but carried no data.
    #[error("Response missing data")]
    MissingData,

    /// The configured token cannot be sent as a header.
    #[error("Invalid API token format: {0}")]
    InvalidToken(String),

    /// An endpoint path could not be joined onto the base URL.
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Response envelope used by every marketplace endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload of a successful response.
    pub(crate) fn into_data(self) -> Result<Option<T>, ApiError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ApiError::Rejected(
                self.error
                    .unwrap_or_else(|| "(no error message provided)".to_string()),
            ))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 503 - maintenance");

        let err = ApiError::Rejected("Product out of stock".to_string());
        assert_eq!(err.to_string(), "Rejected by API: Product out of stock");
    }

    #[test]
    fn test_envelope_success() {
        let envelope: Envelope<Vec<u32>> =
            serde_json::from_str(r#"{"success": true, "data": [1, 2]}"#).unwrap();
        assert_eq!(envelope.into_data().unwrap(), Some(vec![1, 2]));
    }

    #[test]
    fn test_envelope_success_without_data() {
        let envelope: Envelope<u32> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(envelope.into_data().unwrap(), None);
    }

    #[test]
    fn test_envelope_failure_keeps_message() {
        let envelope: Envelope<u32> =
            serde_json::from_str(r#"{"success": false, "error": "Invalid customer"}"#).unwrap();
        let err = envelope.into_data().unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Invalid customer"));
    }

    #[test]
    fn test_envelope_failure_without_message() {
        let envelope: Envelope<u32> = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert_eq!(
            envelope.into_data().unwrap_err().to_string(),
            "Rejected by API: (no error message provided)"
        );
    }
}
