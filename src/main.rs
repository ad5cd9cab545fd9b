//! Service entry point for the transit status engine.
//!
//! Loads configuration, starts the per-feed pollers, and logs a periodic
//! summary of the published snapshot. The JSON API that serves this state
//! to clients lives in a separate service and only consumes the read path.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use transit_status::config::EngineConfig;
use transit_status::engine::StatusEngine;
use transit_status::fetch::HttpFetcher;
use transit_status::scheduler;
use transit_status::snapshot::RouteStatus;
use transit_status::stations;

#[derive(Parser)]
#[command(name = "transit_status")]
#[command(about = "Live transit status ingestion engine", long_about = None)]
struct Cli {
    /// Path to the engine configuration JSON file; defaults apply if omitted
    #[arg(short, long)]
    config: Option<String>,

    /// Seconds between snapshot summary log lines
    #[arg(long, default_value_t = 60)]
    summary_interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/transit_status.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("transit_status.log"));

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

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let catalogue = match &config.stations_file {
        Some(path) => stations::load_catalogue(path)?,
        None => Vec::new(),
    };

    info!(
        routes = config.routes.len(),
        stations = catalogue.len(),
        trip_feeds = config.trip_update_feed_urls.len(),
        alerts_feed = %config.alerts_feed_url,
        "engine configured"
    );

    let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout())?);
    let sources = scheduler::sources_from_config(&config);
    let engine = Arc::new(StatusEngine::new(config, catalogue));

    let _pollers = scheduler::spawn(engine.clone(), fetcher, sources);

    let mut ticker = tokio::time::interval(Duration::from_secs(cli.summary_interval.max(1)));
    loop {
        ticker.tick().await;

        let snapshot = engine.snapshot();
        let disrupted = snapshot
            .routes
            .values()
            .filter(|r| !matches!(r.status, RouteStatus::Good | RouteStatus::Unknown))
            .count();
        let arrivals: usize = snapshot.arrivals_by_station.values().map(Vec::len).sum();

        info!(
            routes = snapshot.routes.len(),
            disrupted,
            stations_with_arrivals = snapshot.arrivals_by_station.len(),
            arrivals,
            fetched_at = %snapshot.fetched_at,
            "status summary"
        );
    }
}
