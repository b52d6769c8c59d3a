//! `reqwest` implementation of the marketplace API client.

use std::sync::Arc;

use katale_core::{DeliveryZone, IdempotencyKey, OrderReceipt, OrderRequest};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::{ApiError, Envelope};
use crate::config::MarketplaceApiConfig;

/// Header carrying the per-checkout idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Client for the marketplace REST API.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct MarketplaceClient {
    inner: Arc<MarketplaceClientInner>,
}

struct MarketplaceClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl MarketplaceClient {
    /// Create a new marketplace API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &MarketplaceApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| ApiError::InvalidToken(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        // Endpoints resolve under the base path, so it must end in a slash
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(MarketplaceClientInner { client, base_url }),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Fetch the delivery zone listing.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the API reports failure, or the
    /// response carries no zone list.
    #[instrument(skip(self))]
    pub async fn delivery_zones(&self) -> Result<Vec<DeliveryZone>, ApiError> {
        let url = self.endpoint("api/delivery-zones")?;
        let response = self.inner.client.get(url).send().await?;

        let zones = read_envelope::<Vec<DeliveryZone>>(response)
            .await?
            .into_data()?
            .ok_or(ApiError::MissingData)?;

        tracing::debug!(count = zones.len(), "Fetched delivery zones");
        Ok(zones)
    }

    /// Create an order.
    ///
    /// Success is decided by the envelope alone. The receipt is optional: one
    /// that does not parse is logged and dropped, since the order exists.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects the order.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, items = request.order_items.len()))]
    pub async fn create_order(
        &self,
        request: &OrderRequest,
        idempotency_key: IdempotencyKey,
    ) -> Result<Option<OrderReceipt>, ApiError> {
        let url = self.endpoint("api/orders")?;
        let response = self
            .inner
            .client
            .post(url)
            .header(IDEMPOTENCY_KEY_HEADER, idempotency_key.to_string())
            .json(request)
            .send()
            .await?;

        let data = read_envelope::<serde_json::Value>(response)
            .await?
            .into_data()?;
        Ok(data.and_then(parse_receipt))
    }
}

/// Read an order receipt, tolerating shapes the storefront does not know.
fn parse_receipt(data: serde_json::Value) -> Option<OrderReceipt> {
    match serde_json::from_value(data) {
        Ok(receipt) => Some(receipt),
        Err(e) => {
            tracing::warn!(error = %e, "Order accepted with an unreadable receipt");
            None
        }
    }
}

/// Read a response body as an envelope, turning HTTP failures into [`ApiError::Status`].
async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<Envelope<T>, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        // Failure bodies usually still carry `{ success: false, error }`
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.error)
            .unwrap_or_else(|| body.chars().take(200).collect());

        tracing::warn!(status = %status, message = %message, "Marketplace API returned non-success status");
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse marketplace API response"
        );
        ApiError::Parse(e)
    })
}
