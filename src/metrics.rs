//! Per-shipment transit performance metrics.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::config::{EventCategory, ExpressServices, FacilityKeywords};
use crate::normalize::{CanonicalEvent, CanonicalShipment};

/// One metrics row per qualifying shipment. Field order here is the detail
/// CSV column order.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentMetrics {
    pub tracking_number: String,
    pub service_type: String,
    pub carrier_code: String,
    pub package_weight_kg: f64,
    pub packaging_type: String,
    pub origin_city: String,
    pub origin_state: String,
    pub origin_pincode: String,
    pub destination_city: String,
    pub destination_state: String,
    pub destination_pincode: String,
    #[serde(serialize_with = "ser_opt_datetime")]
    pub pickup_datetime: Option<NaiveDateTime>,
    #[serde(serialize_with = "ser_opt_datetime")]
    pub delivery_datetime: Option<NaiveDateTime>,
    pub total_transit_hours: f64,
    pub num_facilities_visited: usize,
    pub num_in_transit_events: usize,
    pub time_in_inter_facility_transit_hours: f64,
    pub avg_hours_per_facility: f64,
    pub is_express_service: bool,
    pub delivery_location_type: String,
    pub num_out_for_delivery_attempts: usize,
    pub first_attempt_delivery: bool,
    pub total_events_count: usize,
}

fn ser_opt_datetime<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(dt) => serializer.serialize_str(&dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        None => serializer.serialize_str(""),
    }
}

/// Derives metrics from canonical shipments using the injected express and
/// facility keyword tables.
pub struct MetricsEngine {
    express: ExpressServices,
    facilities: FacilityKeywords,
}

impl MetricsEngine {
    pub fn new(express: ExpressServices, facilities: FacilityKeywords) -> Self {
        Self {
            express,
            facilities,
        }
    }

    /// Computes metrics for every qualifying shipment, returning the metrics
    /// and the count of shipments excluded for lacking two timestamped
    /// events.
    pub fn compute_all(&self, shipments: &[CanonicalShipment]) -> (Vec<ShipmentMetrics>, usize) {
        let mut metrics = Vec::with_capacity(shipments.len());
        let mut excluded = 0;

        for shipment in shipments {
            match self.compute(shipment) {
                Some(m) => metrics.push(m),
                None => {
                    excluded += 1;
                    debug!(
                        tracking_number = %shipment.tracking_number,
                        "Shipment excluded: fewer than 2 timestamped events"
                    );
                }
            }
        }

        (metrics, excluded)
    }

    /// Computes metrics for a single shipment, or `None` when fewer than two
    /// events carry a timestamp.
    pub fn compute(&self, shipment: &CanonicalShipment) -> Option<ShipmentMetrics> {
        let valid: Vec<&CanonicalEvent> = shipment
            .events
            .iter()
            .filter(|e| e.timestamp.is_some())
            .collect();

        if valid.len() < 2 {
            return None;
        }

        // Events are already in ascending timestamp order, so first/last
        // lookups below are chronological.
        let facility_events: Vec<&&CanonicalEvent> = valid
            .iter()
            .filter(|e| self.facilities.matches(&e.arrival_location))
            .collect();

        let mut facilities: HashSet<(&str, &str, &str)> = HashSet::new();
        for e in &facility_events {
            if !e.location.is_unknown() {
                facilities.insert((
                    e.location.city.as_str(),
                    e.location.state.as_str(),
                    e.location.postal_code.as_str(),
                ));
            }
        }
        let unique_facilities = facilities.len();

        let pickup_datetime = valid
            .iter()
            .find(|e| e.category == EventCategory::Pickup)
            .and_then(|e| e.timestamp);
        let delivery_datetime = valid
            .iter()
            .rev()
            .find(|e| e.category == EventCategory::Delivery)
            .and_then(|e| e.timestamp);

        let total_transit_hours = match (pickup_datetime, delivery_datetime) {
            (Some(pickup), Some(delivery)) => hours_between(pickup, delivery),
            _ => 0.0,
        };

        let inter_facility_hours = match (facility_events.first(), facility_events.last()) {
            (Some(first), Some(last)) if facility_events.len() >= 2 => {
                match (first.timestamp, last.timestamp) {
                    (Some(a), Some(b)) => hours_between(a, b),
                    _ => 0.0,
                }
            }
            _ => 0.0,
        };

        let avg_hours_per_facility = if unique_facilities > 0 {
            total_transit_hours / unique_facilities as f64
        } else {
            0.0
        };

        let attempts = valid
            .iter()
            .filter(|e| e.category == EventCategory::OutForDelivery)
            .count();
        let in_transit_events = valid
            .iter()
            .filter(|e| e.category == EventCategory::InTransit)
            .count();

        Some(ShipmentMetrics {
            tracking_number: shipment.tracking_number.clone(),
            service_type: shipment.service_type.clone(),
            carrier_code: shipment.carrier_code.clone(),
            package_weight_kg: round2(shipment.package_weight_kg),
            packaging_type: shipment.packaging_type.clone(),
            origin_city: shipment.origin.city.clone(),
            origin_state: shipment.origin.state.clone(),
            origin_pincode: shipment.origin.postal_code.clone(),
            destination_city: shipment.destination.city.clone(),
            destination_state: shipment.destination.state.clone(),
            destination_pincode: shipment.destination.postal_code.clone(),
            pickup_datetime,
            delivery_datetime,
            total_transit_hours: round2(total_transit_hours),
            num_facilities_visited: unique_facilities,
            num_in_transit_events: in_transit_events,
            time_in_inter_facility_transit_hours: round2(inter_facility_hours),
            avg_hours_per_facility: round2(avg_hours_per_facility),
            is_express_service: self.express.matches(&shipment.service_type),
            delivery_location_type: shipment.delivery_location_type.clone(),
            num_out_for_delivery_attempts: attempts,
            // A single attempt counts as first-attempt success, as does a
            // history with no out-for-delivery scan at all.
            first_attempt_delivery: attempts <= 1,
            total_events_count: valid.len(),
        })
    }
}

/// Elapsed hours from `start` to `end`, clamped at zero for inverted
/// timestamps.
fn hours_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    ((end - start).num_seconds() as f64 / 3600.0).max(0.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
