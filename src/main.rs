//! CLI entry point for the transit performance rater.
//!
//! Runs the batch pipeline over a carrier tracking JSON file: load and
//! validate, normalize, compute per-shipment metrics, aggregate, and write
//! the detailed and summary CSVs.

use std::ffi::OsStr;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use transit_rater::{
    aggregate::summarize,
    config::{CategoryRules, ExpressServices, FacilityKeywords, WeightTable},
    loader::load_shipments,
    metrics::MetricsEngine,
    normalize::Normalizer,
    output::{print_report, write_detailed_csv, write_summary_csv},
};

#[derive(Parser)]
#[command(name = "transit_rater")]
#[command(about = "Derives transit performance metrics from package tracking data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a tracking JSON file and write the CSV outputs
    Analyze {
        /// Path to the tracking JSON file
        #[arg(value_name = "INPUT")]
        input: String,

        /// Directory to write the CSV outputs to
        #[arg(short, long, default_value = "output")]
        output_dir: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/transit_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("transit_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze { input, output_dir } => analyze(&input, &output_dir),
    }
}

/// Runs the full pipeline for one input file.
#[tracing::instrument]
fn analyze(input: &str, output_dir: &str) -> Result<()> {
    let start = Instant::now();

    let (records, _report) = load_shipments(input)?;

    let normalizer = Normalizer::new(CategoryRules::default(), WeightTable::default());
    let (shipments, failures) = normalizer.normalize_all(&records);
    if !failures.is_empty() {
        warn!(
            skipped = failures.len(),
            "Some shipments failed normalization"
        );
    }
    info!(normalized = shipments.len(), "Shipments normalized");

    let engine = MetricsEngine::new(ExpressServices::default(), FacilityKeywords::default());
    let (metrics, excluded) = engine.compute_all(&shipments);
    info!(
        computed = metrics.len(),
        excluded, "Shipment metrics computed"
    );

    let summary = summarize(&metrics);

    std::fs::create_dir_all(output_dir)?;
    let detailed_path = format!("{}/transit_performance_detailed.csv", output_dir);
    let summary_path = format!("{}/transit_performance_summary.csv", output_dir);
    write_detailed_csv(&detailed_path, &metrics)?;
    write_summary_csv(&summary_path, &summary)?;

    print_report(&metrics);

    info!(
        elapsed_secs = format!("{:.2}", start.elapsed().as_secs_f64()),
        detailed = %detailed_path,
        summary = %summary_path,
        "Analysis complete"
    );

    Ok(())
}
