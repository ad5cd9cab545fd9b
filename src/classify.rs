//! Reduction of decoded alerts into per-route status records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::config::RouteConfig;
use crate::decode::{AlertCategory, RouteAlert};
use crate::snapshot::{Route, RouteStatus};

/// Maximum length of a route's display message, in characters.
pub const MESSAGE_MAX_CHARS: usize = 80;

/// Classifies every configured route from its active alerts.
///
/// The output contains exactly one entry per configured route: a route with
/// no alerts is `Good`, a route with at least one alert takes the
/// highest-impact derived status among them, and the first-seen alert wins
/// message selection. Routes in `alerts_by_route` that are not configured
/// are ignored. This function never fails; absent data degrades to
/// defaults.
pub fn classify(
    routes: &[RouteConfig],
    alerts_by_route: &HashMap<String, Vec<RouteAlert>>,
    now: DateTime<Utc>,
) -> HashMap<String, Route> {
    routes
        .iter()
        .map(|route| {
            let (status, message) = match alerts_by_route.get(&route.id) {
                Some(alerts) if !alerts.is_empty() => {
                    let status = alerts
                        .iter()
                        .map(|a| status_for(a.category))
                        .max_by_key(|s| impact(*s))
                        .unwrap_or(RouteStatus::Alert);
                    (status, truncate_message(&alerts[0].header))
                }
                _ => (RouteStatus::Good, String::new()),
            };

            let classified = Route {
                id: route.id.clone(),
                name: route.display_name().to_string(),
                status,
                message,
                updated_at: now,
            };
            (route.id.clone(), classified)
        })
        .collect()
}

/// Groups alerts active at `now` by route id, preserving feed order.
pub fn group_active<'a, I>(alerts: I, now: i64) -> HashMap<String, Vec<RouteAlert>>
where
    I: IntoIterator<Item = &'a RouteAlert>,
{
    let mut by_route: HashMap<String, Vec<RouteAlert>> = HashMap::new();
    for alert in alerts {
        if alert.active_at(now) {
            by_route
                .entry(alert.route_id.clone())
                .or_default()
                .push(alert.clone());
        }
    }
    by_route
}

/// Status an alert imposes on its route. Uncategorized alerts default to
/// `Alert`, the highest-impact status.
fn status_for(category: Option<AlertCategory>) -> RouteStatus {
    match category {
        Some(AlertCategory::Delay) => RouteStatus::Delay,
        Some(AlertCategory::PlannedWork) => RouteStatus::PlannedWork,
        Some(AlertCategory::ServiceChange) | None => RouteStatus::Alert,
    }
}

/// Operational impact ranking: alert > delay > planned-work.
fn impact(status: RouteStatus) -> u8 {
    match status {
        RouteStatus::Alert => 3,
        RouteStatus::Delay => 2,
        RouteStatus::PlannedWork => 1,
        RouteStatus::Good | RouteStatus::Unknown => 0,
    }
}

/// Truncates to [`MESSAGE_MAX_CHARS`] characters, respecting char
/// boundaries.
fn truncate_message(header: &str) -> String {
    header.chars().take(MESSAGE_MAX_CHARS).collect()
}
