//! Checkout price quotes from the command line.
//!
//! Prices a subtotal (or a cart file) for a district exactly the way the
//! storefront's order summary does.

use std::path::Path;

use katale_core::{Cart, CartItem, PriceBreakdown, Ugx, ZoneResolver};
use katale_storefront::api::MarketplaceClient;
use katale_storefront::config::{MarketplaceApiConfig, pricing_from_env};
use tracing::{info, warn};

use super::CommandError;

/// What to price.
#[derive(Debug)]
pub enum QuoteInput<'a> {
    /// A subtotal such as `50000` or `UGX 50,000`.
    Subtotal(&'a str),
    /// A YAML or JSON list of cart items.
    CartFile(&'a Path),
}

/// Print a price breakdown for a district.
///
/// With `offline`, no zones are fetched and the fallback shipping cost applies.
///
/// # Errors
///
/// Returns an error if the input cannot be read or priced, or if zones are
/// requested and the API configuration is invalid. A failed zone fetch is
/// only a warning.
pub async fn run(district: &str, input: QuoteInput<'_>, offline: bool) -> Result<(), CommandError> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let policy = pricing_from_env()?;
    let subtotal = match input {
        QuoteInput::Subtotal(raw) => Ugx::parse(raw)?,
        QuoteInput::CartFile(path) => {
            let cart = read_cart(path).await?;
            info!(lines = cart.items().len(), items = cart.item_count(), "Loaded cart");
            cart.subtotal()
        }
    };

    let zones = if offline {
        ZoneResolver::empty()
    } else {
        fetch_zones().await?
    };

    let breakdown = policy.quote(subtotal, &zones, district);
    for line in describe(district, &breakdown) {
        info!("{line}");
    }

    Ok(())
}

async fn fetch_zones() -> Result<ZoneResolver, CommandError> {
    let config = MarketplaceApiConfig::from_env()?;
    let client = MarketplaceClient::new(&config)?;

    match client.delivery_zones().await {
        Ok(zones) => Ok(ZoneResolver::new(zones)),
        Err(e) => {
            warn!(error = %e, "Failed to fetch delivery zones, using fallback shipping");
            Ok(ZoneResolver::empty())
        }
    }
}

async fn read_cart(path: &Path) -> Result<Cart, CommandError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Read {
            path: path.display().to_string(),
            source,
        })?;
    parse_cart(&content)
}

/// Build a cart from a YAML (or JSON) list of items, merging repeated products.
fn parse_cart(content: &str) -> Result<Cart, CommandError> {
    let items: Vec<CartItem> = serde_yaml::from_str(content)?;

    let mut cart = Cart::new();
    for item in items {
        cart.add(item)?;
    }
    Ok(cart)
}

/// Human-readable lines for a breakdown.
fn describe(district: &str, breakdown: &PriceBreakdown) -> Vec<String> {
    let delivery = if breakdown.free_shipping {
        "free".to_string()
    } else {
        match &breakdown.zone_name {
            Some(zone) => format!("zone {zone}"),
            None => "fallback rate".to_string(),
        }
    };

    vec![
        format!("Quote for {district}"),
        format!("  Subtotal: {}", breakdown.subtotal),
        format!("  Shipping: {} ({delivery})", breakdown.shipping),
        format!("  Tax:      {}", breakdown.tax),
        format!("  Total:    {}", breakdown.total),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use katale_core::{DeliveryZone, PricingPolicy, ZoneId};

    use super::*;

    const CART_YAML: &str = r"
- id: prod_beans
  name: Nambale beans (5kg)
  price: 30000
  quantity: 1
  vendorId: vendor_tororo
- id: prod_beans
  name: Nambale beans (5kg)
  price: 30000
  quantity: 1
  vendorId: vendor_tororo
- id: prod_honey
  name: Forest honey
  price: 18000
  quantity: 1
  image: https://cdn.katale.ug/honey.jpg
  vendorId: vendor_kabale
";

    fn central_zone() -> ZoneResolver {
        ZoneResolver::new(vec![DeliveryZone {
            id: ZoneId::new("zone_central"),
            name: "Central".to_string(),
            districts: vec!["Kampala".to_string(), "Wakiso".to_string()],
            shipping_cost: Ugx::from_shillings(5_000),
            is_active: true,
        }])
    }

    #[test]
    fn test_parse_cart_merges_products() {
        let cart = parse_cart(CART_YAML).unwrap();
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), Ugx::from_shillings(78_000));
    }

    #[test]
    fn test_parse_cart_accepts_json() {
        let json = r#"[{"id": "p1", "name": "Rolex", "price": 3000, "quantity": 2, "vendorId": "v1"}]"#;
        let cart = parse_cart(json).unwrap();
        assert_eq!(cart.subtotal(), Ugx::from_shillings(6_000));
    }

    #[test]
    fn test_parse_cart_rejects_zero_quantity() {
        let yaml = "- {id: p1, name: Rolex, price: 3000, quantity: 0, vendorId: v1}";
        assert!(matches!(parse_cart(yaml), Err(CommandError::Cart(_))));
    }

    #[test]
    fn test_describe_zone_quote() {
        let breakdown = PricingPolicy::default().quote(
            Ugx::from_shillings(50_000),
            &central_zone(),
            "Wakiso",
        );
        let lines = describe("Wakiso", &breakdown);
        assert_eq!(lines[2], "  Shipping: UGX 5,000 (zone Central)");
        assert_eq!(lines[4], "  Total:    UGX 64,000");
    }

    #[test]
    fn test_describe_fallback_quote() {
        let breakdown = PricingPolicy::default().quote(
            Ugx::from_shillings(50_000),
            &ZoneResolver::empty(),
            "Arua",
        );
        let lines = describe("Arua", &breakdown);
        assert_eq!(lines[2], "  Shipping: UGX 15,000 (fallback rate)");
        assert_eq!(lines[4], "  Total:    UGX 74,000");
    }

    #[test]
    fn test_describe_free_shipping() {
        let breakdown = PricingPolicy::default().quote(
            Ugx::from_shillings(150_000),
            &central_zone(),
            "Kampala",
        );
        let lines = describe("Kampala", &breakdown);
        assert_eq!(lines[2], "  Shipping: UGX 0 (free)");
        assert_eq!(lines[4], "  Total:    UGX 177,000");
    }
}
