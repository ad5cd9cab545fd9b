//! Engine configuration.
//!
//! Loaded from a plain JSON file; every field has a default so a partial
//! config stays valid. Defaults point at the MTA subway endpoints, the
//! upstream this engine was built against.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

const MTA_FEED_BASE: &str = "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds";

/// One tracked line.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub id: String,
    /// Display name; falls back to the id when empty.
    #[serde(default)]
    pub name: String,
}

impl RouteConfig {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }
}

/// Recognized engine options.
///
/// Intervals and the fetch timeout are given in seconds. The alerts feed
/// and the per-line trip update feeds are polled at independent cadences.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub alerts_feed_url: String,
    pub trip_update_feed_urls: Vec<String>,
    pub poll_interval_alerts_secs: u64,
    pub poll_interval_trips_secs: u64,
    pub fetch_timeout_secs: u64,
    /// Lines the classifier reports on. Every configured route appears in
    /// every snapshot, alert feed coverage or not.
    pub routes: Vec<RouteConfig>,
    /// Optional CSV station catalogue (see [`crate::stations`]).
    pub stations_file: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            alerts_feed_url: format!("{MTA_FEED_BASE}/camsys%2Fsubway-alerts"),
            trip_update_feed_urls: ["", "-ace", "-bdfm", "-g", "-jz", "-nqrw", "-l", "-7", "-si"]
                .iter()
                .map(|suffix| format!("{MTA_FEED_BASE}/nyct%2Fgtfs{suffix}"))
                .collect(),
            poll_interval_alerts_secs: 60,
            poll_interval_trips_secs: 30,
            fetch_timeout_secs: 5,
            routes: default_routes(),
            stations_file: None,
        }
    }
}

impl EngineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {path}"))?;
        let config: EngineConfig =
            serde_json::from_str(&content).with_context(|| format!("parsing config file {path}"))?;
        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn poll_interval_alerts(&self) -> Duration {
        Duration::from_secs(self.poll_interval_alerts_secs)
    }

    pub fn poll_interval_trips(&self) -> Duration {
        Duration::from_secs(self.poll_interval_trips_secs)
    }
}

/// The NYC subway lines and their trunk names.
fn default_routes() -> Vec<RouteConfig> {
    [
        ("1", "Broadway - 7 Av Local"),
        ("2", "7 Av Express"),
        ("3", "7 Av Express"),
        ("4", "Lexington Av Express"),
        ("5", "Lexington Av Express"),
        ("6", "Lexington Av Local"),
        ("7", "Flushing Local"),
        ("GS", "42 St Shuttle"),
        ("A", "8 Av Express"),
        ("C", "8 Av Local"),
        ("E", "8 Av Local"),
        ("B", "6 Av Express"),
        ("D", "6 Av Express"),
        ("F", "6 Av Local"),
        ("M", "6 Av Local"),
        ("G", "Brooklyn-Queens Crosstown"),
        ("J", "Nassau St Local"),
        ("Z", "Nassau St Express"),
        ("L", "14 St - Canarsie Local"),
        ("N", "Broadway Express"),
        ("Q", "2 Av Express"),
        ("R", "Broadway Local"),
        ("W", "Broadway Local"),
        ("SI", "Staten Island Railway"),
    ]
    .iter()
    .map(|(id, name)| RouteConfig {
        id: id.to_string(),
        name: name.to_string(),
    })
    .collect()
}
