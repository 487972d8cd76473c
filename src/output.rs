//! Output artifacts: detailed and summary CSV files plus a console report.
//!
//! The exporter owns formatting: detail rows carry 2-decimal numerics (as
//! rounded by the metrics engine) and `YYYY-MM-DD HH:MM:SS` datetimes;
//! summary values are rounded to 4 decimals here.

use std::collections::BTreeMap;

use anyhow::Result;
use tracing::info;

use crate::aggregate::{self, SummaryStat};
use crate::metrics::ShipmentMetrics;

/// Writes one row per shipment to `path`, with a header.
pub fn write_detailed_csv(path: &str, metrics: &[ShipmentMetrics]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for m in metrics {
        writer.serialize(m)?;
    }
    writer.flush()?;

    info!(path, records = metrics.len(), "Detailed CSV written");
    Ok(())
}

/// Writes the summary triples to `path`, values rounded to 4 decimals.
pub fn write_summary_csv(path: &str, stats: &[SummaryStat]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for stat in stats {
        let mut row = stat.clone();
        row.metric_value = round4(stat.metric_value);
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(path, rows = stats.len(), "Summary CSV written");
    Ok(())
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Logs the run headline: shipment count, service distribution, and
/// transit/facility/delivery performance.
pub fn print_report(metrics: &[ShipmentMetrics]) {
    if metrics.is_empty() {
        return;
    }

    info!(total_shipments = metrics.len(), "Analysis report");

    let mut service_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for m in metrics {
        *service_counts.entry(m.service_type.as_str()).or_default() += 1;
    }
    for (service, count) in &service_counts {
        let pct = (*count as f64 / metrics.len() as f64) * 100.0;
        info!(service, count, pct = format!("{:.1}", pct), "Service distribution");
    }

    let transit: Vec<f64> = metrics.iter().map(|m| m.total_transit_hours).collect();
    info!(
        avg_hours = format!("{:.2}", aggregate::mean(&transit)),
        median_hours = format!("{:.2}", aggregate::median(&transit)),
        "Transit performance"
    );

    let facilities: Vec<f64> = metrics
        .iter()
        .map(|m| m.num_facilities_visited as f64)
        .collect();
    info!(
        avg_facilities = format!("{:.2}", aggregate::mean(&facilities)),
        "Facility performance"
    );

    let first_attempt = metrics
        .iter()
        .filter(|m| m.first_attempt_delivery)
        .count() as f64
        / metrics.len() as f64
        * 100.0;
    info!(
        pct_first_attempt = format!("{:.1}", first_attempt),
        "Delivery performance"
    );
}
