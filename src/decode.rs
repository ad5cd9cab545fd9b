//! Decoding of raw GTFS Realtime bytes into engine entities.
//!
//! Decoding is pure: identical bytes always yield identical entities. Every
//! optional feed field becomes an explicit `Option` on the decoded type, so
//! downstream logic branches on presence instead of probing attributes.

use prost::Message;

use crate::error::DecodeError;
use crate::gtfs_rt::{self, FeedMessage};

/// All entities extracted from one feed document.
///
/// An alert informing several routes appears once per informed route; an
/// alert informing no route is dropped (it applies to nothing we track).
/// Entities that are neither alerts nor trip updates (vehicle positions in
/// mixed feeds) are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFeed {
    pub alerts: Vec<RouteAlert>,
    pub trip_updates: Vec<TripUpdate>,
}

/// One alert as it applies to one route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteAlert {
    pub route_id: String,
    /// First available translation of the header text, empty if absent.
    pub header: String,
    pub category: Option<AlertCategory>,
    pub active_periods: Vec<ActivePeriod>,
}

/// Activity window of an alert. An open side is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePeriod {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

/// Operational category derived from the feed's cause/effect metadata.
///
/// Impact ordering for classification tie-breaks: `ServiceChange` >
/// `Delay` > `PlannedWork`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertCategory {
    Delay,
    PlannedWork,
    ServiceChange,
}

impl RouteAlert {
    /// Whether the alert is in effect at `now` (POSIX seconds).
    ///
    /// An alert with no activity periods is in effect for as long as it
    /// appears in the feed.
    pub fn active_at(&self, now: i64) -> bool {
        if self.active_periods.is_empty() {
            return true;
        }
        self.active_periods.iter().any(|p| {
            p.start.is_none_or(|s| now >= s as i64) && p.end.is_none_or(|e| now <= e as i64)
        })
    }
}

/// One trip's predicted stop times.
#[derive(Debug, Clone, PartialEq)]
pub struct TripUpdate {
    pub trip_id: String,
    pub route_id: String,
    pub stop_times: Vec<StopTime>,
}

/// Prediction for one trip at one stop. `arrival` is POSIX seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTime {
    pub stop_id: String,
    pub arrival: Option<i64>,
}

/// Decodes a protobuf-encoded feed document into [`DecodedFeed`].
///
/// # Errors
///
/// Returns [`DecodeError`] if the bytes are not valid protobuf for a
/// `FeedMessage`. The error is non-fatal upstream: the scheduler skips the
/// feed for the current cycle and keeps the previous contribution.
pub fn decode(bytes: &[u8]) -> Result<DecodedFeed, DecodeError> {
    let feed = FeedMessage::decode(bytes)?;

    let mut decoded = DecodedFeed::default();
    for entity in feed.entity {
        if let Some(alert) = entity.alert {
            expand_alert(alert, &mut decoded.alerts);
        }
        if let Some(update) = entity.trip_update {
            decoded.trip_updates.push(convert_trip_update(update));
        }
    }

    Ok(decoded)
}

/// Expands one feed alert into one [`RouteAlert`] per informed route.
fn expand_alert(alert: gtfs_rt::Alert, out: &mut Vec<RouteAlert>) {
    let header = first_translation(alert.header_text.as_ref());
    let category = categorize(&alert);
    let active_periods: Vec<ActivePeriod> = alert
        .active_period
        .iter()
        .map(|p| ActivePeriod {
            start: p.start,
            end: p.end,
        })
        .collect();

    for informed in &alert.informed_entity {
        let Some(route_id) = informed.route_id.as_deref() else {
            continue;
        };
        if route_id.is_empty() {
            continue;
        }
        out.push(RouteAlert {
            route_id: route_id.to_string(),
            header: header.clone(),
            category,
            active_periods: active_periods.clone(),
        });
    }
}

/// Takes the first available translation string, empty if none exists.
fn first_translation(text: Option<&gtfs_rt::TranslatedString>) -> String {
    text.and_then(|t| t.translation.first())
        .map(|t| t.text.clone())
        .unwrap_or_default()
}

/// Maps the feed's cause/effect enums onto an [`AlertCategory`].
///
/// The boundaries here are a policy choice, not a feed invariant; agencies
/// fill these fields inconsistently. Kept in one place so they stay easy
/// to adjust.
fn categorize(alert: &gtfs_rt::Alert) -> Option<AlertCategory> {
    use gtfs_rt::alert::{Cause, Effect};

    if alert.effect.is_some() {
        match alert.effect() {
            Effect::SignificantDelays => return Some(AlertCategory::Delay),
            Effect::NoService
            | Effect::ReducedService
            | Effect::Detour
            | Effect::ModifiedService
            | Effect::StopMoved => return Some(AlertCategory::ServiceChange),
            _ => {}
        }
    }

    if alert.cause.is_some() {
        match alert.cause() {
            Cause::Maintenance | Cause::Construction => return Some(AlertCategory::PlannedWork),
            _ => {}
        }
    }

    None
}

fn convert_trip_update(update: gtfs_rt::TripUpdate) -> TripUpdate {
    let stop_times = update
        .stop_time_update
        .into_iter()
        .map(|stu| StopTime {
            stop_id: stu.stop_id.unwrap_or_default(),
            arrival: stu.arrival.and_then(|event| event.time),
        })
        .collect();

    TripUpdate {
        trip_id: update.trip.trip_id.unwrap_or_default(),
        route_id: update.trip.route_id.unwrap_or_default(),
        stop_times,
    }
}
