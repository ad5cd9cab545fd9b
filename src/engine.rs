//! Shared engine state: per-source feed contributions and the published
//! snapshot.
//!
//! Each feed source writes only its own contribution slice; a single merge
//! step then rebuilds and publishes the combined snapshot. A failed cycle
//! leaves the source's previous contribution in place (stale but
//! available), so readers keep the last successfully computed view.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::arrivals;
use crate::classify;
use crate::config::EngineConfig;
use crate::decode::DecodedFeed;
use crate::snapshot::{ArrivalEntry, Route, Snapshot, SnapshotStore};
use crate::stations::Station;

/// Per-source fetch observability.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedHealth {
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

#[derive(Default)]
struct EngineState {
    /// Latest successfully decoded feed per source id.
    contributions: HashMap<String, DecodedFeed>,
    health: HashMap<String, FeedHealth>,
}

pub struct StatusEngine {
    config: EngineConfig,
    stations: Vec<Station>,
    state: Mutex<EngineState>,
    snapshot: SnapshotStore,
}

impl StatusEngine {
    pub fn new(config: EngineConfig, stations: Vec<Station>) -> Self {
        StatusEngine {
            config,
            stations,
            state: Mutex::new(EngineState::default()),
            snapshot: SnapshotStore::new(),
        }
    }

    /// Records a successful cycle for `source_id` and publishes a snapshot
    /// rebuilt from every retained contribution.
    pub fn apply_success(&self, source_id: &str, feed: DecodedFeed) {
        let now = Utc::now();
        let rebuilt = {
            let mut state = self.state.lock().expect("engine state lock poisoned");

            let health = state.health.entry(source_id.to_string()).or_default();
            health.last_success = Some(now);
            health.last_error = None;
            health.consecutive_failures = 0;

            state.contributions.insert(source_id.to_string(), feed);
            self.rebuild(&state.contributions, now)
        };
        self.snapshot.store(rebuilt);
    }

    /// Records a failed cycle for `source_id`. The previous contribution
    /// and the published snapshot stay untouched.
    pub fn apply_failure(&self, source_id: &str, error: String) {
        let mut state = self.state.lock().expect("engine state lock poisoned");
        let health = state.health.entry(source_id.to_string()).or_default();
        health.last_error = Some(error);
        health.consecutive_failures += 1;
    }

    fn rebuild(&self, contributions: &HashMap<String, DecodedFeed>, now: DateTime<Utc>) -> Snapshot {
        let now_epoch = now.timestamp();

        let all_alerts = contributions.values().flat_map(|feed| feed.alerts.iter());
        let active = classify::group_active(all_alerts, now_epoch);
        let routes = classify::classify(&self.config.routes, &active, now);

        let all_trips = contributions
            .values()
            .flat_map(|feed| feed.trip_updates.iter());
        let arrivals_by_station = arrivals::compute(all_trips, now_epoch);

        Snapshot {
            routes,
            arrivals_by_station,
            fetched_at: now,
        }
    }

    /// Latest published state. Synchronous and non-blocking; never fetches.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load()
    }

    /// Status of one route; `Unknown` if it has never been classified.
    pub fn route_status(&self, route_id: &str) -> Route {
        self.snapshot
            .load()
            .routes
            .get(route_id)
            .cloned()
            .unwrap_or_else(|| Route::unknown(route_id))
    }

    /// Current predictions for one station, soonest first. Empty if the
    /// station has none.
    pub fn arrivals(&self, station_id: &str) -> Vec<ArrivalEntry> {
        self.snapshot
            .load()
            .arrivals_by_station
            .get(station_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn feed_health(&self) -> HashMap<String, FeedHealth> {
        self.state
            .lock()
            .expect("engine state lock poisoned")
            .health
            .clone()
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;
    use crate::decode::{RouteAlert, StopTime, TripUpdate};
    use crate::snapshot::RouteStatus;

    #[test]
    fn test_success_publishes_snapshot() {
        let engine = engine_for(&["A", "C"]);
        engine.apply_success("alerts", feed_with_alert("A", "Signal problems"));

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.routes.len(), 2);
        assert_eq!(snapshot.routes["A"].status, RouteStatus::Alert);
        assert_eq!(snapshot.routes["C"].status, RouteStatus::Good);
        assert!(snapshot.fetched_at > DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_failure_retains_previous_snapshot() {
        let engine = engine_for(&["A"]);
        engine.apply_success("alerts", feed_with_alert("A", "Signal problems"));
        let before = engine.snapshot();

        engine.apply_failure("alerts", "HTTP 500".to_string());

        let after = engine.snapshot();
        assert_eq!(before.routes, after.routes);
        assert_eq!(before.fetched_at, after.fetched_at);

        let health = engine.feed_health();
        assert_eq!(health["alerts"].consecutive_failures, 1);
        assert_eq!(health["alerts"].last_error.as_deref(), Some("HTTP 500"));
        assert!(health["alerts"].last_success.is_some());
    }

    #[test]
    fn test_success_after_failure_self_heals() {
        let engine = engine_for(&["A"]);
        engine.apply_failure("alerts", "timeout".to_string());
        engine.apply_failure("alerts", "timeout".to_string());
        assert_eq!(engine.feed_health()["alerts"].consecutive_failures, 2);

        engine.apply_success("alerts", feed_with_alert("A", "Back"));
        let health = engine.feed_health();
        assert_eq!(health["alerts"].consecutive_failures, 0);
        assert!(health["alerts"].last_error.is_none());
    }

    #[test]
    fn test_sources_merge_into_one_snapshot() {
        let engine = engine_for(&["A", "L"]);
        engine.apply_success("alerts", feed_with_alert("L", "Planned work"));
        engine.apply_success("gtfs-ace", feed_with_trip("A", "t1", "A32", 150));

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.routes["L"].status, RouteStatus::Alert);
        assert_eq!(snapshot.arrivals_by_station["A32"][0].eta_minutes, 2);
    }

    #[test]
    fn test_new_contribution_replaces_only_its_source() {
        let engine = engine_for(&["A"]);
        engine.apply_success("gtfs-ace", feed_with_trip("A", "t1", "A32", 120));
        engine.apply_success("gtfs", feed_with_trip("A", "t2", "127", 300));

        // Refresh of one source keeps the other's contribution.
        engine.apply_success("gtfs-ace", feed_with_trip("A", "t3", "A32", 60));

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.arrivals_by_station["A32"][0].trip_id, "t3");
        assert_eq!(snapshot.arrivals_by_station["127"][0].trip_id, "t2");
    }

    #[test]
    fn test_route_status_unknown_before_first_classification() {
        let engine = engine_for(&["A"]);
        let route = engine.route_status("A");
        assert_eq!(route.status, RouteStatus::Unknown);

        // Unconfigured routes also read as unknown rather than erroring.
        let route = engine.route_status("does-not-exist");
        assert_eq!(route.status, RouteStatus::Unknown);
    }

    #[test]
    fn test_arrivals_empty_for_unknown_station() {
        let engine = engine_for(&["A"]);
        assert!(engine.arrivals("R16").is_empty());
    }

    // Helper functions for tests

    fn engine_for(route_ids: &[&str]) -> StatusEngine {
        let config = EngineConfig {
            routes: route_ids
                .iter()
                .map(|id| RouteConfig {
                    id: id.to_string(),
                    name: String::new(),
                })
                .collect(),
            ..EngineConfig::default()
        };
        StatusEngine::new(config, vec![])
    }

    fn feed_with_alert(route_id: &str, header: &str) -> DecodedFeed {
        DecodedFeed {
            alerts: vec![RouteAlert {
                route_id: route_id.to_string(),
                header: header.to_string(),
                category: None,
                active_periods: vec![],
            }],
            trip_updates: vec![],
        }
    }

    fn feed_with_trip(route: &str, trip_id: &str, stop_id: &str, secs_ahead: i64) -> DecodedFeed {
        DecodedFeed {
            alerts: vec![],
            trip_updates: vec![TripUpdate {
                trip_id: trip_id.to_string(),
                route_id: route.to_string(),
                stop_times: vec![StopTime {
                    stop_id: stop_id.to_string(),
                    arrival: Some(Utc::now().timestamp() + secs_ahead),
                }],
            }],
        }
    }
}
