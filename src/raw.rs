//! Serde model for the loosely shaped carrier tracking input.
//!
//! Every nested field is optional. Absence is a normal condition resolved
//! to documented defaults by the normalizer, never an error here.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// One shipment as supplied by the producer, after the `trackDetails`
/// envelope has been unwrapped by the loader.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawShipment {
    pub tracking_number: Option<String>,
    pub carrier_code: Option<String>,
    pub service: Option<RawService>,
    #[serde(default, deserialize_with = "lenient")]
    pub package_weight: Option<RawWeight>,
    pub packaging: Option<RawPackaging>,
    #[serde(default, deserialize_with = "lenient")]
    pub shipper_address: Option<RawAddress>,
    #[serde(default, deserialize_with = "lenient")]
    pub destination_address: Option<RawAddress>,
    #[serde(default)]
    pub events: Vec<RawEvent>,
    pub delivery_location_type: Option<String>,
}

/// Accepts any JSON shape; a value that does not match `T` becomes `None`
/// instead of rejecting the whole record. Address, weight, and timestamp
/// fields tolerate malformation; the normalizer resolves the resulting
/// absence to its documented sentinel.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawService {
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPackaging {
    #[serde(rename = "type")]
    pub packaging_type: Option<String>,
}

/// Package weight arrives either as a `{value, units}` object or as a
/// bare number already in kilograms.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawWeight {
    Detailed {
        value: Option<f64>,
        units: Option<String>,
    },
    Scalar(f64),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAddress {
    pub city: Option<String>,
    pub state_or_province_code: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub event_type: Option<String>,
    pub event_description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<RawTimestamp>,
    #[serde(default, deserialize_with = "lenient")]
    pub address: Option<RawAddress>,
    pub arrival_location: Option<String>,
}

/// The three timestamp encodings observed on the wire, in resolution
/// priority order: a Mongo-style boxed millisecond count, a datetime
/// string, or a bare millisecond number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Boxed {
        #[serde(rename = "$numberLong")]
        millis: String,
    },
    Text(String),
    Millis(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shipment_with_everything_missing() {
        let raw: RawShipment = serde_json::from_value(json!({})).unwrap();
        assert!(raw.tracking_number.is_none());
        assert!(raw.service.is_none());
        assert!(raw.events.is_empty());
    }

    #[test]
    fn test_weight_shapes() {
        let detailed: RawWeight =
            serde_json::from_value(json!({"value": 2.5, "units": "LB"})).unwrap();
        assert!(matches!(detailed, RawWeight::Detailed { .. }));

        let scalar: RawWeight = serde_json::from_value(json!(1.2)).unwrap();
        assert!(matches!(scalar, RawWeight::Scalar(v) if v == 1.2));
    }

    #[test]
    fn test_timestamp_shapes() {
        let boxed: RawTimestamp =
            serde_json::from_value(json!({"$numberLong": "1700000000000"})).unwrap();
        assert!(matches!(boxed, RawTimestamp::Boxed { .. }));

        let text: RawTimestamp =
            serde_json::from_value(json!("2023-11-14T22:13:20Z")).unwrap();
        assert!(matches!(text, RawTimestamp::Text(_)));

        let millis: RawTimestamp = serde_json::from_value(json!(1700000000000u64)).unwrap();
        assert!(matches!(millis, RawTimestamp::Millis(_)));
    }

    #[test]
    fn test_malformed_sub_fields_become_none() {
        // Wrong-typed sub-fields must not reject the record.
        let raw: RawShipment = serde_json::from_value(json!({
            "trackingNumber": "A",
            "shipperAddress": "1600 Pennsylvania Ave",
            "packageWeight": "heavy",
            "events": [
                {"eventType": "PU", "timestamp": {"seconds": 5}, "address": 42}
            ]
        }))
        .unwrap();

        assert!(raw.shipper_address.is_none());
        assert!(raw.package_weight.is_none());
        assert_eq!(raw.events.len(), 1);
        assert!(raw.events[0].timestamp.is_none());
        assert!(raw.events[0].address.is_none());
    }

    #[test]
    fn test_event_with_partial_address() {
        let event: RawEvent = serde_json::from_value(json!({
            "eventType": "AR",
            "address": {"city": "Memphis"}
        }))
        .unwrap();
        let addr = event.address.unwrap();
        assert_eq!(addr.city.as_deref(), Some("Memphis"));
        assert!(addr.postal_code.is_none());
    }
}
