//! Periodic refresh of all configured feed sources.
//!
//! Each source runs its own timer and fetch cycle; no source blocks
//! another. A tick that fires while the previous cycle is still running is
//! skipped rather than queued, bounding outstanding requests to one per
//! source. Fetch and decode failures degrade the source (previous
//! contribution retained) and the next tick fires regardless.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::decode;
use crate::engine::StatusEngine;
use crate::fetch::FeedFetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Alerts,
    TripUpdates,
}

/// One upstream endpoint polled at a fixed cadence.
#[derive(Debug, Clone)]
pub struct FeedSource {
    pub id: String,
    pub url: String,
    pub kind: FeedKind,
    pub interval: Duration,
}

/// Expands the configuration into the full fan-out of feed sources: one
/// alerts source plus one source per trip update endpoint.
pub fn sources_from_config(config: &EngineConfig) -> Vec<FeedSource> {
    let mut sources = vec![FeedSource {
        id: "alerts".to_string(),
        url: config.alerts_feed_url.clone(),
        kind: FeedKind::Alerts,
        interval: config.poll_interval_alerts(),
    }];

    for (i, url) in config.trip_update_feed_urls.iter().enumerate() {
        let label = feed_label(url);
        let id = if label.is_empty() {
            format!("trips-{i}")
        } else {
            label.to_string()
        };
        sources.push(FeedSource {
            id,
            url: url.clone(),
            kind: FeedKind::TripUpdates,
            interval: config.poll_interval_trips(),
        });
    }

    sources
}

/// Short source label from a feed URL: the last path segment, with any
/// percent-encoded prefix ("nyct%2Fgtfs-ace") reduced to its tail.
fn feed_label(url: &str) -> &str {
    let tail = url.rsplit('/').next().unwrap_or(url);
    tail.rsplit("%2F").next().unwrap_or(tail)
}

/// Spawns one polling task per source. The tasks run until the process
/// exits; there is no user-triggered cancellation of scheduled cycles.
pub fn spawn(
    engine: Arc<StatusEngine>,
    fetcher: Arc<dyn FeedFetcher>,
    sources: Vec<FeedSource>,
) -> Vec<JoinHandle<()>> {
    sources
        .into_iter()
        .map(|source| {
            let engine = engine.clone();
            let fetcher = fetcher.clone();
            tokio::spawn(async move {
                info!(
                    feed = %source.id,
                    kind = ?source.kind,
                    interval_secs = source.interval.as_secs(),
                    "poller started"
                );
                poll_source(engine, fetcher, source).await;
            })
        })
        .collect()
}

async fn poll_source(engine: Arc<StatusEngine>, fetcher: Arc<dyn FeedFetcher>, source: FeedSource) {
    let mut ticker = time::interval(source.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        run_cycle(&engine, fetcher.as_ref(), &source).await;
    }
}

/// One fetch-decode-publish cycle for one source.
#[tracing::instrument(skip(engine, fetcher, source), fields(feed = %source.id))]
pub async fn run_cycle(engine: &StatusEngine, fetcher: &dyn FeedFetcher, source: &FeedSource) {
    let fetch_start = std::time::Instant::now();

    match fetcher.fetch(&source.url).await {
        Ok(bytes) => {
            let elapsed = fetch_start.elapsed();
            if elapsed.as_secs() > 15 {
                warn!(elapsed_secs = elapsed.as_secs(), "feed fetch was slow");
            }
            debug!(bytes = bytes.len(), "feed bytes received, decoding");

            match decode::decode(&bytes) {
                Ok(feed) => {
                    info!(
                        alerts = feed.alerts.len(),
                        trip_updates = feed.trip_updates.len(),
                        "feed cycle complete"
                    );
                    engine.apply_success(&source.id, feed);
                }
                Err(e) => {
                    warn!(error = %e, "feed decode failed, keeping previous contribution");
                    engine.apply_failure(&source.id, e.to_string());
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "feed fetch failed, keeping previous contribution");
            engine.apply_failure(&source.id, e.to_string());
        }
    }
}
