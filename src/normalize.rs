//! Normalization of raw shipment records into the canonical shape.
//!
//! A shipment either normalizes completely or is rejected as a whole with a
//! [`RecordError`]; individual missing or malformed sub-fields never reject
//! the record, they resolve to sentinels ("UNKNOWN", 0.0, no timestamp,
//! `other`).

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{CategoryRules, EventCategory, WeightTable};
use crate::error::RecordError;
use crate::raw::{RawAddress, RawEvent, RawShipment, RawTimestamp, RawWeight};

const UNKNOWN: &str = "UNKNOWN";

/// City/state/postal triple. Missing components hold `"UNKNOWN"`, never an
/// empty value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl Location {
    pub fn unknown() -> Self {
        Self {
            city: UNKNOWN.to_string(),
            state: UNKNOWN.to_string(),
            postal_code: UNKNOWN.to_string(),
        }
    }

    /// True when every component is the `"UNKNOWN"` sentinel.
    pub fn is_unknown(&self) -> bool {
        self.city == UNKNOWN && self.state == UNKNOWN && self.postal_code == UNKNOWN
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CanonicalEvent {
    pub event_type: String,
    pub timestamp: Option<NaiveDateTime>,
    pub description: String,
    pub location: Location,
    pub arrival_location: String,
    pub category: EventCategory,
}

#[derive(Debug, Clone, Serialize)]
pub struct CanonicalShipment {
    pub tracking_number: String,
    pub carrier_code: String,
    pub service_type: String,
    pub service_description: String,
    pub package_weight_kg: f64,
    pub packaging_type: String,
    pub origin: Location,
    pub destination: Location,
    pub delivery_location_type: String,
    /// Ascending by timestamp; events without a timestamp sort first.
    pub events: Vec<CanonicalEvent>,
}

/// Maps raw shipments to canonical ones using the injected keyword and
/// conversion tables.
pub struct Normalizer {
    categories: CategoryRules,
    weights: WeightTable,
}

impl Normalizer {
    pub fn new(categories: CategoryRules, weights: WeightTable) -> Self {
        Self {
            categories,
            weights,
        }
    }

    /// Normalizes every record in `records`, splitting the batch into
    /// successes and per-record failures. Failures are logged and never
    /// abort the batch.
    pub fn normalize_all(&self, records: &[Value]) -> (Vec<CanonicalShipment>, Vec<RecordError>) {
        let mut shipments = Vec::with_capacity(records.len());
        let mut failures = Vec::new();

        for record in records {
            match self.normalize_value(record) {
                Ok(shipment) => shipments.push(shipment),
                Err(e) => {
                    warn!(error = %e, "Skipping shipment that failed normalization");
                    failures.push(e);
                }
            }
        }

        debug!(
            normalized = shipments.len(),
            skipped = failures.len(),
            "Normalization pass complete"
        );
        (shipments, failures)
    }

    /// Deserializes one raw record and normalizes it.
    pub fn normalize_value(&self, record: &Value) -> Result<CanonicalShipment, RecordError> {
        let raw: RawShipment =
            serde_json::from_value(record.clone()).map_err(RecordError::Malformed)?;
        Ok(self.normalize(raw))
    }

    /// Normalization proper is total: every missing sub-field has a defined
    /// default.
    pub fn normalize(&self, raw: RawShipment) -> CanonicalShipment {
        let (service_type, service_description) = match raw.service {
            Some(s) => (
                s.service_type.unwrap_or_else(|| UNKNOWN.to_string()),
                s.description.unwrap_or_default(),
            ),
            None => (UNKNOWN.to_string(), String::new()),
        };

        CanonicalShipment {
            tracking_number: raw.tracking_number.unwrap_or_else(|| UNKNOWN.to_string()),
            carrier_code: raw.carrier_code.unwrap_or_else(|| UNKNOWN.to_string()),
            service_type,
            service_description,
            package_weight_kg: self.extract_weight(raw.package_weight.as_ref()),
            packaging_type: raw
                .packaging
                .and_then(|p| p.packaging_type)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            origin: extract_address(raw.shipper_address.as_ref()),
            destination: extract_address(raw.destination_address.as_ref()),
            delivery_location_type: raw
                .delivery_location_type
                .unwrap_or_else(|| UNKNOWN.to_string()),
            events: self.normalize_events(raw.events),
        }
    }

    fn normalize_events(&self, events: Vec<RawEvent>) -> Vec<CanonicalEvent> {
        let mut canonical: Vec<CanonicalEvent> =
            events.into_iter().map(|e| self.normalize_event(e)).collect();

        // Ascending by timestamp. Missing timestamps take the minimum sort
        // key, so they land at the front regardless of true event time.
        canonical.sort_by_key(|e| e.timestamp.unwrap_or(NaiveDateTime::MIN));
        canonical
    }

    fn normalize_event(&self, event: RawEvent) -> CanonicalEvent {
        let event_type = event.event_type.unwrap_or_default();
        let description = event.event_description.unwrap_or_default();
        let text = format!("{} {}", event_type, description).to_uppercase();

        CanonicalEvent {
            timestamp: event.timestamp.as_ref().and_then(parse_timestamp),
            location: extract_address(event.address.as_ref()),
            arrival_location: event.arrival_location.unwrap_or_default(),
            category: self.categories.classify(&text),
            event_type,
            description,
        }
    }

    /// Converts a raw weight to kilograms. Missing weight is 0.0; an
    /// unrecognized unit leaves the value unscaled.
    fn extract_weight(&self, weight: Option<&RawWeight>) -> f64 {
        match weight {
            None => 0.0,
            Some(RawWeight::Scalar(v)) => *v,
            Some(RawWeight::Detailed { value, units }) => {
                let factor = units
                    .as_deref()
                    .map(|u| self.weights.factor(u))
                    .unwrap_or(1.0);
                value.unwrap_or(0.0) * factor
            }
        }
    }
}

fn extract_address(address: Option<&RawAddress>) -> Location {
    match address {
        None => Location::unknown(),
        Some(addr) => Location {
            city: addr.city.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            state: addr
                .state_or_province_code
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            postal_code: addr
                .postal_code
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
        },
    }
}

/// Parses any of the three accepted timestamp shapes. Failure at any step
/// yields `None`; an unparseable timestamp is a normal outcome, not an
/// error.
pub fn parse_timestamp(timestamp: &RawTimestamp) -> Option<NaiveDateTime> {
    match timestamp {
        RawTimestamp::Boxed { millis } => millis
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(from_epoch_millis),
        RawTimestamp::Text(s) => parse_timestamp_text(s),
        RawTimestamp::Millis(ms) => from_epoch_millis(*ms as i64),
    }
}

fn from_epoch_millis(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

fn parse_timestamp_text(raw: &str) -> Option<NaiveDateTime> {
    let cleaned = strip_utc_offset(raw.trim())
        .trim_end_matches('Z')
        .replace('T', " ");

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, fmt) {
            return Some(dt);
        }
    }

    // Lenient fallback for partial ISO-8601 shapes.
    if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, "%Y-%m-%d %H:%M") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(&cleaned, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Drops a trailing `±HH:MM` UTC offset, if present.
fn strip_utc_offset(s: &str) -> &str {
    let b = s.as_bytes();
    if b.len() >= 6 {
        let tail = &b[b.len() - 6..];
        if (tail[0] == b'+' || tail[0] == b'-')
            && tail[1].is_ascii_digit()
            && tail[2].is_ascii_digit()
            && tail[3] == b':'
            && tail[4].is_ascii_digit()
            && tail[5].is_ascii_digit()
        {
            return &s[..s.len() - 6];
        }
    }
    s
}
