//! Delivery zones and district resolution.
//!
//! A delivery zone groups administrative districts that share a shipping cost.
//! Zones are reference data owned by the marketplace backend; the storefront
//! fetches them once per checkout session and resolves the shopper's district
//! against that snapshot.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{Ugx, ZoneId};

/// A named group of districts sharing one shipping cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryZone {
    pub id: ZoneId,
    pub name: String,
    pub districts: Vec<String>,
    pub shipping_cost: Ugx,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl DeliveryZone {
    /// Returns `true` if the zone is active and lists `district` exactly.
    #[must_use]
    pub fn covers(&self, district: &str) -> bool {
        self.is_active && self.districts.iter().any(|d| d == district)
    }
}

/// Resolves districts to zones over a fixed snapshot of zone records.
///
/// Matching is case-sensitive and exact. When several active zones list the
/// same district, the first one in the snapshot wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneResolver {
    zones: Vec<DeliveryZone>,
}

impl ZoneResolver {
    #[must_use]
    pub const fn new(zones: Vec<DeliveryZone>) -> Self {
        Self { zones }
    }

    /// A resolver that never matches; every district gets the fallback cost.
    #[must_use]
    pub const fn empty() -> Self {
        Self { zones: Vec::new() }
    }

    #[must_use]
    pub fn zones(&self) -> &[DeliveryZone] {
        &self.zones
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Find the zone serving `district`, if any.
    #[must_use]
    pub fn resolve(&self, district: &str) -> Option<&DeliveryZone> {
        if district.is_empty() {
            return None;
        }
        self.zones.iter().find(|zone| zone.covers(district))
    }

    /// Sorted, de-duplicated districts served by active zones.
    #[must_use]
    pub fn districts(&self) -> Vec<&str> {
        self.zones
            .iter()
            .filter(|zone| zone.is_active)
            .flat_map(|zone| zone.districts.iter().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn zone(id: &str, cost: i64, districts: &[&str], active: bool) -> DeliveryZone {
        DeliveryZone {
            id: ZoneId::new(id),
            name: format!("Zone {id}"),
            districts: districts.iter().map(ToString::to_string).collect(),
            shipping_cost: Ugx::from_shillings(cost),
            is_active: active,
        }
    }

    #[test]
    fn test_resolve_exact_match() {
        let resolver = ZoneResolver::new(vec![
            zone("central", 5_000, &["Kampala", "Wakiso"], true),
            zone("east", 20_000, &["Jinja", "Mbale"], true),
        ]);

        assert_eq!(resolver.resolve("Jinja").unwrap().id, ZoneId::new("east"));
        assert_eq!(
            resolver.resolve("Kampala").unwrap().shipping_cost,
            Ugx::from_shillings(5_000)
        );
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let resolver = ZoneResolver::new(vec![zone("central", 5_000, &["Kampala"], true)]);
        assert!(resolver.resolve("kampala").is_none());
        assert!(resolver.resolve("Kampala ").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let resolver = ZoneResolver::new(vec![
            zone("first", 5_000, &["Mukono"], true),
            zone("second", 8_000, &["Mukono"], true),
        ]);
        assert_eq!(resolver.resolve("Mukono").unwrap().id, ZoneId::new("first"));
    }

    #[test]
    fn test_inactive_zones_never_match() {
        let resolver = ZoneResolver::new(vec![
            zone("old", 1_000, &["Gulu"], false),
            zone("north", 25_000, &["Gulu"], true),
        ]);
        assert_eq!(resolver.resolve("Gulu").unwrap().id, ZoneId::new("north"));

        let only_inactive = ZoneResolver::new(vec![zone("old", 1_000, &["Gulu"], false)]);
        assert!(only_inactive.resolve("Gulu").is_none());
    }

    #[test]
    fn test_empty_resolver_and_empty_district() {
        assert!(ZoneResolver::empty().resolve("Kampala").is_none());

        let resolver = ZoneResolver::new(vec![zone("odd", 1, &[""], true)]);
        assert!(resolver.resolve("").is_none());
    }

    #[test]
    fn test_districts_sorted_and_deduplicated() {
        let resolver = ZoneResolver::new(vec![
            zone("a", 1, &["Wakiso", "Kampala"], true),
            zone("b", 1, &["Kampala", "Entebbe"], true),
            zone("c", 1, &["Arua"], false),
        ]);
        assert_eq!(resolver.districts(), vec!["Entebbe", "Kampala", "Wakiso"]);
    }

    #[test]
    fn test_deserialize_backend_zone() {
        let json = r#"{
            "id": "clz1",
            "name": "Central",
            "districts": ["Kampala", "Wakiso"],
            "shippingCost": 5000,
            "isActive": true
        }"#;
        let zone: DeliveryZone = serde_json::from_str(json).unwrap();
        assert_eq!(zone.shipping_cost, Ugx::from_shillings(5_000));
        assert!(zone.covers("Wakiso"));

        let without_flag: DeliveryZone = serde_json::from_str(
            r#"{"id": 3, "name": "West", "districts": [], "shippingCost": 18000}"#,
        )
        .unwrap();
        assert!(without_flag.is_active);
    }
}
