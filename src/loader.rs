//! Loading and gross-structure validation of the raw tracking JSON.
//!
//! The input file is an array of carrier tracking responses, each carrying
//! a `trackDetails` array; every track detail is one shipment. Validation
//! here is structural only; per-record problems are the normalizer's
//! business.

use std::fs;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::LoadError;

/// Gross-structure counts gathered while unwrapping the input.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub total_shipments: usize,
    pub shipments_with_events: usize,
    pub total_events: usize,
    pub event_types: Vec<String>,
}

/// Reads `path`, unwraps the `trackDetails` envelope, and validates that the
/// input yields at least one shipment with events.
#[tracing::instrument]
pub fn load_shipments(path: &str) -> Result<(Vec<Value>, ValidationReport), LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_string(),
        source,
    })?;
    let root: Value = serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: path.to_string(),
        source,
    })?;

    let Value::Array(responses) = root else {
        return Err(LoadError::NotAnArray);
    };
    debug!(responses = responses.len(), "Input parsed");

    let mut shipments = Vec::new();
    for response in &responses {
        if let Some(details) = response.get("trackDetails").and_then(Value::as_array) {
            shipments.extend(details.iter().cloned());
        }
    }

    let report = validate(&shipments);
    info!(
        total_shipments = report.total_shipments,
        shipments_with_events = report.shipments_with_events,
        total_events = report.total_events,
        event_types = ?report.event_types,
        "Input validated"
    );

    if report.shipments_with_events == 0 {
        return Err(LoadError::NoUsableShipments {
            total: report.total_shipments,
        });
    }

    Ok((shipments, report))
}

fn validate(shipments: &[Value]) -> ValidationReport {
    let mut report = ValidationReport {
        total_shipments: shipments.len(),
        ..Default::default()
    };

    let mut event_types = std::collections::BTreeSet::new();
    for shipment in shipments {
        let Some(events) = shipment.get("events").and_then(Value::as_array) else {
            continue;
        };
        if events.is_empty() {
            continue;
        }

        report.shipments_with_events += 1;
        report.total_events += events.len();

        for event in events {
            if let Some(event_type) = event.get("eventType").and_then(Value::as_str) {
                event_types.insert(event_type.to_string());
            }
        }
    }

    report.event_types = event_types.into_iter().collect();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_input(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn path_of(file: &NamedTempFile) -> &str {
        file.path().to_str().unwrap()
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_shipments("/nonexistent/shipments.json").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_invalid_json_is_json_error() {
        let file = write_input("{not json");
        let err = load_shipments(path_of(&file)).unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
    }

    #[test]
    fn test_non_array_root_is_rejected() {
        let file = write_input(r#"{"trackDetails": []}"#);
        let err = load_shipments(path_of(&file)).unwrap_err();
        assert!(matches!(err, LoadError::NotAnArray));
    }

    #[test]
    fn test_zero_usable_shipments_is_fatal() {
        let file = write_input(r#"[{"trackDetails": [{"trackingNumber": "X"}]}]"#);
        let err = load_shipments(path_of(&file)).unwrap_err();
        assert!(matches!(err, LoadError::NoUsableShipments { total: 1 }));
    }

    #[test]
    fn test_envelope_unwrap_and_report() {
        let file = write_input(
            r#"[
                {"trackDetails": [
                    {"trackingNumber": "A",
                     "events": [{"eventType": "PU"}, {"eventType": "DL"}]},
                    {"trackingNumber": "B", "events": []}
                ]},
                {"trackDetails": [
                    {"trackingNumber": "C", "events": [{"eventType": "PU"}]}
                ]},
                {"notTrackDetails": true}
            ]"#,
        );
        let (shipments, report) = load_shipments(path_of(&file)).unwrap();

        assert_eq!(shipments.len(), 3);
        assert_eq!(report.total_shipments, 3);
        assert_eq!(report.shipments_with_events, 2);
        assert_eq!(report.total_events, 3);
        assert_eq!(report.event_types, vec!["DL".to_string(), "PU".to_string()]);
    }
}
