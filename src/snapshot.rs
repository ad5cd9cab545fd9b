//! Published view types and the atomically swapped store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Derived health of one route. Never set directly by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteStatus {
    Good,
    Delay,
    Alert,
    PlannedWork,
    Unknown,
}

/// Current state of one tracked line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub status: RouteStatus,
    /// Human-readable summary, truncated for display stability.
    pub message: String,
    /// Time of the last successful classification.
    pub updated_at: DateTime<Utc>,
}

impl Route {
    /// Placeholder for a route that has never been classified.
    pub fn unknown(id: &str) -> Self {
        Route {
            id: id.to_string(),
            name: id.to_string(),
            status: RouteStatus::Unknown,
            message: String::new(),
            updated_at: DateTime::UNIX_EPOCH,
        }
    }
}

/// One predicted arrival at one station, recomputed each cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrivalEntry {
    pub route_id: String,
    pub trip_id: String,
    pub station_id: String,
    /// Whole minutes until arrival, clamped to >= 0.
    pub eta_minutes: i64,
}

/// The atomic bundle of everything the engine knows right now.
///
/// `arrivals_by_station` values are sorted ascending by `eta_minutes`,
/// ties broken by `trip_id`. A snapshot is replaced wholesale, never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub routes: HashMap<String, Route>,
    pub arrivals_by_station: HashMap<String, Vec<ArrivalEntry>>,
    pub fetched_at: DateTime<Utc>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            routes: HashMap::new(),
            arrivals_by_station: HashMap::new(),
            fetched_at: DateTime::UNIX_EPOCH,
        }
    }
}

/// Holder of the latest published [`Snapshot`].
///
/// Readers clone the inner `Arc`, writers store a fresh one; the lock is
/// held only for the pointer swap, so readers never block on a rebuild and
/// never observe a partially updated snapshot.
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        SnapshotStore {
            current: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    pub fn load(&self) -> Arc<Snapshot> {
        self.current.read().expect("snapshot lock poisoned").clone()
    }

    pub fn store(&self, snapshot: Snapshot) {
        *self.current.write().expect("snapshot lock poisoned") = Arc::new(snapshot);
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}
