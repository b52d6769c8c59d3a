//! Checkout price calculation.
//!
//! ```text
//! shipping = 0                      if subtotal > free_shipping_threshold
//!          = zone.shipping_cost     if the district resolves to a zone
//!          = fallback_shipping      otherwise
//! tax      = round(subtotal * tax_rate)   (nearest shilling, halves away from zero)
//! total    = subtotal + shipping + tax
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::delivery::{DeliveryZone, ZoneResolver};
use crate::types::{Ugx, ZoneId};

/// Pricing constants applied at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Orders with a subtotal strictly above this ship for free.
    pub free_shipping_threshold: Ugx,
    /// Shipping charged when the district matches no zone.
    pub fallback_shipping: Ugx,
    /// VAT rate applied to the subtotal.
    pub tax_rate: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Ugx::from_shillings(100_000),
            fallback_shipping: Ugx::from_shillings(15_000),
            // 18% VAT
            tax_rate: Decimal::new(18, 2),
        }
    }
}

/// Itemized checkout price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
    pub subtotal: Ugx,
    pub shipping: Ugx,
    pub tax: Ugx,
    pub total: Ugx,
    /// `true` when the free-shipping threshold waived the shipping cost.
    pub free_shipping: bool,
    /// Zone that priced the shipping, if the district resolved.
    pub zone_id: Option<ZoneId>,
    pub zone_name: Option<String>,
}

impl PricingPolicy {
    /// Shipping cost before the free-shipping threshold is considered.
    #[must_use]
    pub fn base_shipping(&self, zone: Option<&DeliveryZone>) -> Ugx {
        zone.map_or(self.fallback_shipping, |z| z.shipping_cost)
    }

    /// Price a subtotal for an already-resolved zone.
    #[must_use]
    pub fn price(&self, subtotal: Ugx, zone: Option<&DeliveryZone>) -> PriceBreakdown {
        let free_shipping = subtotal > self.free_shipping_threshold;
        let shipping = if free_shipping {
            Ugx::ZERO
        } else {
            self.base_shipping(zone)
        };
        let tax = subtotal.scale(self.tax_rate).round_whole();

        PriceBreakdown {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
            free_shipping,
            zone_id: zone.map(|z| z.id.clone()),
            zone_name: zone.map(|z| z.name.clone()),
        }
    }

    /// Resolve `district` against `zones` and price `subtotal`.
    #[must_use]
    pub fn quote(&self, subtotal: Ugx, zones: &ZoneResolver, district: &str) -> PriceBreakdown {
        self.price(subtotal, zones.resolve(district))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn zones() -> ZoneResolver {
        ZoneResolver::new(vec![DeliveryZone {
            id: ZoneId::new("central"),
            name: "Central".to_string(),
            districts: vec!["Kampala".to_string(), "Wakiso".to_string()],
            shipping_cost: Ugx::from_shillings(5_000),
            is_active: true,
        }])
    }

    #[test]
    fn test_unmatched_district_uses_fallback() {
        let quote = PricingPolicy::default().quote(Ugx::from_shillings(50_000), &zones(), "Gulu");

        assert_eq!(quote.shipping, Ugx::from_shillings(15_000));
        assert_eq!(quote.tax, Ugx::from_shillings(9_000));
        assert_eq!(quote.total, Ugx::from_shillings(74_000));
        assert!(!quote.free_shipping);
        assert!(quote.zone_id.is_none());
    }

    #[test]
    fn test_matched_district_uses_zone_cost() {
        let quote =
            PricingPolicy::default().quote(Ugx::from_shillings(50_000), &zones(), "Kampala");

        assert_eq!(quote.shipping, Ugx::from_shillings(5_000));
        assert_eq!(quote.total, Ugx::from_shillings(64_000));
        assert_eq!(quote.zone_name.as_deref(), Some("Central"));
    }

    #[test]
    fn test_free_shipping_above_threshold() {
        for district in ["Kampala", "Gulu", ""] {
            let quote =
                PricingPolicy::default().quote(Ugx::from_shillings(150_000), &zones(), district);
            assert_eq!(quote.shipping, Ugx::ZERO);
            assert_eq!(quote.tax, Ugx::from_shillings(27_000));
            assert_eq!(quote.total, Ugx::from_shillings(177_000));
            assert!(quote.free_shipping);
        }
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let quote = PricingPolicy::default().quote(Ugx::from_shillings(100_000), &zones(), "Gulu");
        assert_eq!(quote.shipping, Ugx::from_shillings(15_000));
        assert!(!quote.free_shipping);

        let quote = PricingPolicy::default().quote(Ugx::from_shillings(100_001), &zones(), "Gulu");
        assert_eq!(quote.shipping, Ugx::ZERO);
    }

    #[test]
    fn test_tax_rounds_to_whole_shilling() {
        // 18% of 1,003 = 180.54
        let quote = PricingPolicy::default().price(Ugx::from_shillings(1_003), None);
        assert_eq!(quote.tax, Ugx::from_shillings(181));

        // 18% of 25 = 4.5, rounds away from zero
        let quote = PricingPolicy::default().price(Ugx::from_shillings(25), None);
        assert_eq!(quote.tax, Ugx::from_shillings(5));
    }

    #[test]
    fn test_total_is_sum_of_parts() {
        let policy = PricingPolicy::default();
        for subtotal in [0, 1, 999, 55_555, 100_000, 100_001, 2_000_000] {
            let quote = policy.quote(Ugx::from_shillings(subtotal), &zones(), "Wakiso");
            assert_eq!(quote.total, quote.subtotal + quote.shipping + quote.tax);
        }
    }

    #[test]
    fn test_custom_policy() {
        let policy = PricingPolicy {
            free_shipping_threshold: Ugx::from_shillings(200_000),
            fallback_shipping: Ugx::from_shillings(10_000),
            tax_rate: Decimal::ZERO,
        };
        let quote = policy.quote(Ugx::from_shillings(150_000), &ZoneResolver::empty(), "Gulu");
        assert_eq!(quote.shipping, Ugx::from_shillings(10_000));
        assert_eq!(quote.total, Ugx::from_shillings(160_000));
    }
}
