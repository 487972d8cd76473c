//! Error taxonomy for the pipeline.
//!
//! [`LoadError`] aborts the whole run; [`RecordError`] is contained at the
//! single-shipment boundary and only ever costs that one shipment.

use thiserror::Error;

/// The raw input file is unusable as a whole.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("input is not an array of tracking responses")]
    NotAnArray,

    #[error("no usable shipments in input ({total} records, none with events)")]
    NoUsableShipments { total: usize },
}

/// A single shipment could not be processed. The record is skipped and
/// counted; the run continues.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("shipment record does not deserialize: {0}")]
    Malformed(#[source] serde_json::Error),
}
