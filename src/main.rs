use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod model;
mod service;

use model::Config;
use service::{
    write_report, AuditPipeline, NerClient, NominatimClient, PlainTextSource, RasterServiceClient,
    StacClient,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (ignore if missing)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(report_path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: terraclaim <report.txt> [output.csv]");
        return ExitCode::from(2);
    };
    let output_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("audit_report.csv"));

    let config = Config::from_env();

    let pipeline = match AuditPipeline::new(
        Arc::new(PlainTextSource),
        Arc::new(NerClient::new()),
        Arc::new(NominatimClient::new(config.geocode.timeout())),
        Arc::new(StacClient::new()),
        Arc::new(RasterServiceClient::new()),
        &config,
    ) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!(error = %e, "Failed to construct pipeline");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        report = %report_path.display(),
        baseline = config.baseline_year,
        target = config.target_year,
        "Starting environmental claim audit"
    );

    let report = match pipeline.run(&report_path).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "Audit failed");
            return ExitCode::FAILURE;
        }
    };

    let verified = report.verified();
    if let Err(e) = write_report(&output_path, &verified) {
        tracing::error!(error = %e, output = %output_path.display(), "Failed to write report");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        rows = verified.len(),
        data_unavailable = report.stats.data_unavailable,
        geocode_misses = report.stats.geocode_misses,
        output = %output_path.display(),
        "Audit report written"
    );

    ExitCode::SUCCESS
}
