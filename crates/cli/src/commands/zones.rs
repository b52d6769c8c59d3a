//! Delivery zone inspection.

use katale_storefront::api::MarketplaceClient;
use katale_storefront::config::MarketplaceApiConfig;
use tracing::{info, warn};

use super::CommandError;

/// List the delivery zones the marketplace API currently serves.
///
/// # Errors
///
/// Returns an error if the API configuration is missing or the request fails.
pub async fn list() -> Result<(), CommandError> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = MarketplaceApiConfig::from_env()?;
    let client = MarketplaceClient::new(&config)?;
    info!(api = %client.base_url(), "Fetching delivery zones");

    let zones = client.delivery_zones().await?;
    if zones.is_empty() {
        warn!("The marketplace API returned no delivery zones; every district uses the fallback cost");
        return Ok(());
    }

    info!("Delivery zones ({})", zones.len());
    info!("==================");
    for zone in &zones {
        let state = if zone.is_active { "active" } else { "inactive" };
        info!(
            "{} [{}] {} ({state}): {}",
            zone.name,
            zone.id,
            zone.shipping_cost,
            zone.districts.join(", ")
        );
    }

    Ok(())
}
