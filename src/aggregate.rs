//! Run-level descriptive statistics over the full metrics set.
//!
//! Every statistic is degenerate-safe: an empty metrics set yields zeros,
//! never an error.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::metrics::ShipmentMetrics;

/// One summary row: `{category, name, value}`. Generated fresh per run.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryStat {
    pub metric_category: String,
    pub metric_name: String,
    pub metric_value: f64,
}

impl SummaryStat {
    fn new(category: &str, name: &str, value: f64) -> Self {
        Self {
            metric_category: category.to_string(),
            metric_name: name.to_string(),
            metric_value: value,
        }
    }
}

/// Aggregates shipment metrics into the run summary: overall transit
/// statistics, facility statistics, a per-service-type breakdown, and
/// delivery performance.
pub fn summarize(metrics: &[ShipmentMetrics]) -> Vec<SummaryStat> {
    let mut out = Vec::new();

    let transit: Vec<f64> = metrics.iter().map(|m| m.total_transit_hours).collect();
    let facilities: Vec<f64> = metrics
        .iter()
        .map(|m| m.num_facilities_visited as f64)
        .collect();
    let facility_counts: Vec<usize> =
        metrics.iter().map(|m| m.num_facilities_visited).collect();
    let hours_per_facility: Vec<f64> =
        metrics.iter().map(|m| m.avg_hours_per_facility).collect();

    let overall = "Overall Metrics";
    let avg_transit = mean(&transit);
    out.push(SummaryStat::new(
        overall,
        "total_shipments_analyzed",
        metrics.len() as f64,
    ));
    out.push(SummaryStat::new(overall, "avg_transit_hours", avg_transit));
    out.push(SummaryStat::new(
        overall,
        "median_transit_hours",
        median(&transit),
    ));
    out.push(SummaryStat::new(
        overall,
        "std_dev_transit_hours",
        stddev(&transit, avg_transit),
    ));
    out.push(SummaryStat::new(overall, "min_transit_hours", min(&transit)));
    out.push(SummaryStat::new(overall, "max_transit_hours", max(&transit)));

    let facility = "Facility Metrics";
    out.push(SummaryStat::new(
        facility,
        "avg_facilities_per_shipment",
        mean(&facilities),
    ));
    out.push(SummaryStat::new(
        facility,
        "median_facilities_per_shipment",
        median(&facilities),
    ));
    out.push(SummaryStat::new(
        facility,
        "mode_facilities_per_shipment",
        mode(&facility_counts),
    ));
    out.push(SummaryStat::new(
        facility,
        "avg_hours_per_facility",
        mean(&hours_per_facility),
    ));
    out.push(SummaryStat::new(
        facility,
        "median_hours_per_facility",
        median(&hours_per_facility),
    ));

    // Group set is dynamic; BTreeMap keeps the emission order stable
    // across runs.
    let mut by_service: BTreeMap<&str, Vec<&ShipmentMetrics>> = BTreeMap::new();
    for m in metrics {
        by_service.entry(m.service_type.as_str()).or_default().push(m);
    }
    for (service_type, group) in by_service {
        let category = format!("Service Type: {}", service_type);
        let group_transit: Vec<f64> = group.iter().map(|m| m.total_transit_hours).collect();
        let group_facilities: Vec<f64> = group
            .iter()
            .map(|m| m.num_facilities_visited as f64)
            .collect();

        out.push(SummaryStat::new(
            &category,
            "avg_transit_hours_by_service_type",
            mean(&group_transit),
        ));
        out.push(SummaryStat::new(
            &category,
            "avg_facilities_by_service_type",
            mean(&group_facilities),
        ));
        out.push(SummaryStat::new(
            &category,
            "count_shipments_by_service_type",
            group.len() as f64,
        ));
    }

    let delivery = "Delivery Performance";
    let first_attempt: Vec<f64> = metrics
        .iter()
        .map(|m| if m.first_attempt_delivery { 1.0 } else { 0.0 })
        .collect();
    let attempts: Vec<f64> = metrics
        .iter()
        .map(|m| m.num_out_for_delivery_attempts as f64)
        .collect();
    out.push(SummaryStat::new(
        delivery,
        "pct_first_attempt_delivery",
        mean(&first_attempt) * 100.0,
    ));
    out.push(SummaryStat::new(
        delivery,
        "avg_out_for_delivery_attempts",
        mean(&attempts),
    ));

    out
}

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Computes the median. Returns 0.0 for empty input.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Computes the most frequent value; ties go to the smallest value.
/// Returns 0.0 for empty input.
pub fn mode(values: &[usize]) -> f64 {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for v in values {
        *counts.entry(*v).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(v, _)| v as f64)
        .unwrap_or(0.0)
}

fn min(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
