//! Fixed keyword and conversion tables for the normalization and metrics
//! stages. Each table is a small immutable value handed to the component
//! that needs it at construction time.

use serde::Serialize;

/// Mutually exclusive classification assigned to every canonical event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Pickup,
    Delivery,
    OutForDelivery,
    InTransit,
    Arrival,
    Departure,
    Other,
}

/// Carrier event codes and status phrases per category. Order matters:
/// the first category with a matching keyword wins.
static CATEGORY_RULES: &[(EventCategory, &[&str])] = &[
    (EventCategory::Pickup, &["PU", "PICKUP", "PICKED UP"]),
    (EventCategory::Delivery, &["DL", "DELIVERED"]),
    (
        EventCategory::OutForDelivery,
        &["OD", "ON FEDEX VEHICLE FOR DELIVERY", "OUT FOR DELIVERY"],
    ),
    (EventCategory::InTransit, &["IT", "IN TRANSIT"]),
    (
        EventCategory::Arrival,
        &["AR", "AT LOCAL FEDEX FACILITY", "ARRIVED AT", "AT DESTINATION"],
    ),
    (EventCategory::Departure, &["DP", "LEFT FEDEX", "DEPARTED"]),
    (EventCategory::Other, &["OC", "SHIPMENT INFORMATION SENT"]),
];

/// Service tiers treated as expedited.
static EXPRESS_SERVICES: &[&str] = &[
    "FEDEX_EXPRESS_SAVER",
    "FEDEX_2_DAY",
    "FEDEX_2_DAY_AM",
    "FEDEX_STANDARD_OVERNIGHT",
    "FEDEX_PRIORITY_OVERNIGHT",
    "FEDEX_FIRST_OVERNIGHT",
    "EXPRESS",
];

/// Location-text fragments that identify a carrier sorting/transfer facility.
static FACILITY_KEYWORDS: &[&str] = &[
    "FACILITY",
    "FEDEX_FACILITY",
    "DESTINATION_FEDEX_FACILITY",
    "ORIGIN_FEDEX_FACILITY",
    "STATION",
    "HUB",
];

/// Multipliers from a weight unit to kilograms.
static WEIGHT_CONVERSIONS: &[(&str, f64)] = &[
    ("g", 0.001),
    ("lb", 0.453592),
    ("lbs", 0.453592),
    ("kg", 1.0),
];

/// Ordered event-classification rules.
#[derive(Debug, Clone)]
pub struct CategoryRules {
    rules: &'static [(EventCategory, &'static [&'static str])],
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self {
            rules: CATEGORY_RULES,
        }
    }
}

impl CategoryRules {
    /// Classifies already-uppercased event text. Falls back to
    /// [`EventCategory::Other`] when nothing matches.
    pub fn classify(&self, text_upper: &str) -> EventCategory {
        for (category, keywords) in self.rules {
            if keywords.iter().any(|k| text_upper.contains(k)) {
                return *category;
            }
        }
        EventCategory::Other
    }
}

/// Express service tier keyword list.
#[derive(Debug, Clone)]
pub struct ExpressServices {
    keywords: &'static [&'static str],
}

impl Default for ExpressServices {
    fn default() -> Self {
        Self {
            keywords: EXPRESS_SERVICES,
        }
    }
}

impl ExpressServices {
    /// Case-insensitive substring match against a service type string.
    pub fn matches(&self, service_type: &str) -> bool {
        let upper = service_type.to_uppercase();
        self.keywords.iter().any(|k| upper.contains(k))
    }
}

/// Facility-detection keyword list.
#[derive(Debug, Clone)]
pub struct FacilityKeywords {
    keywords: &'static [&'static str],
}

impl Default for FacilityKeywords {
    fn default() -> Self {
        Self {
            keywords: FACILITY_KEYWORDS,
        }
    }
}

impl FacilityKeywords {
    /// Case-insensitive substring match against raw arrival-location text.
    pub fn matches(&self, location_text: &str) -> bool {
        let upper = location_text.to_uppercase();
        self.keywords.iter().any(|k| upper.contains(k))
    }
}

/// Weight-unit conversion table.
#[derive(Debug, Clone)]
pub struct WeightTable {
    factors: &'static [(&'static str, f64)],
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            factors: WEIGHT_CONVERSIONS,
        }
    }
}

impl WeightTable {
    /// Kilogram multiplier for a unit string. Unrecognized units pass
    /// through unscaled.
    pub fn factor(&self, units: &str) -> f64 {
        let units = units.to_lowercase();
        self.factors
            .iter()
            .find(|(u, _)| *u == units)
            .map(|(_, f)| *f)
            .unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_codes() {
        let rules = CategoryRules::default();
        assert_eq!(rules.classify("PU PICKED UP"), EventCategory::Pickup);
        assert_eq!(rules.classify("DL DELIVERED"), EventCategory::Delivery);
        assert_eq!(
            rules.classify("OD ON FEDEX VEHICLE FOR DELIVERY"),
            EventCategory::OutForDelivery
        );
        assert_eq!(rules.classify("AR ARRIVED AT"), EventCategory::Arrival);
        assert_eq!(rules.classify("DP DEPARTED"), EventCategory::Departure);
    }

    #[test]
    fn test_classify_no_match_is_other() {
        let rules = CategoryRules::default();
        assert_eq!(rules.classify("XYZZY"), EventCategory::Other);
        assert_eq!(rules.classify(""), EventCategory::Other);
    }

    #[test]
    fn test_classify_first_category_wins() {
        // "PU" appears before anything else in the rule order, so text
        // containing both a pickup and a delivery keyword is a pickup.
        let rules = CategoryRules::default();
        assert_eq!(rules.classify("PU THEN DL"), EventCategory::Pickup);
    }

    #[test]
    fn test_express_matches() {
        let express = ExpressServices::default();
        assert!(express.matches("FEDEX_2_DAY"));
        assert!(express.matches("fedex_priority_overnight"));
        assert!(!express.matches("GROUND_HOME_DELIVERY"));
    }

    #[test]
    fn test_facility_matches() {
        let facilities = FacilityKeywords::default();
        assert!(facilities.matches("DESTINATION_FEDEX_FACILITY"));
        assert!(facilities.matches("Memphis hub"));
        assert!(!facilities.matches("CUSTOMER_DOORSTEP"));
    }

    #[test]
    fn test_weight_factors() {
        let table = WeightTable::default();
        assert_eq!(table.factor("kg"), 1.0);
        assert_eq!(table.factor("LB"), 0.453592);
        assert_eq!(table.factor("lbs"), 0.453592);
        assert_eq!(table.factor("g"), 0.001);
        // Unknown units pass through unscaled.
        assert_eq!(table.factor("stone"), 1.0);
    }
}
