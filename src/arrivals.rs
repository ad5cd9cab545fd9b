//! Reduction of decoded trip updates into per-station arrival predictions.

use std::collections::HashMap;

use crate::decode::TripUpdate;
use crate::snapshot::ArrivalEntry;

/// Computes arrival predictions grouped by station.
///
/// For each stop time carrying an arrival, the ETA is the whole number of
/// minutes until that arrival, clamped to zero: a train already due reads
/// as "arriving now" rather than disappearing. Stop times without an
/// arrival are skipped. Each station's entries are sorted ascending by
/// ETA, ties broken by trip id for determinism. No per-station bound is
/// applied; display truncation belongs to the caller.
pub fn compute<'a, I>(trip_updates: I, now: i64) -> HashMap<String, Vec<ArrivalEntry>>
where
    I: IntoIterator<Item = &'a TripUpdate>,
{
    let mut by_station: HashMap<String, Vec<ArrivalEntry>> = HashMap::new();

    for update in trip_updates {
        for stop in &update.stop_times {
            let Some(arrival) = stop.arrival else {
                continue;
            };
            if stop.stop_id.is_empty() {
                continue;
            }

            let eta_minutes = (arrival - now).div_euclid(60).max(0);
            by_station
                .entry(stop.stop_id.clone())
                .or_default()
                .push(ArrivalEntry {
                    route_id: update.route_id.clone(),
                    trip_id: update.trip_id.clone(),
                    station_id: stop.stop_id.clone(),
                    eta_minutes,
                });
        }
    }

    for entries in by_station.values_mut() {
        entries.sort_by(|a, b| {
            a.eta_minutes
                .cmp(&b.eta_minutes)
                .then_with(|| a.trip_id.cmp(&b.trip_id))
        });
    }

    by_station
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::StopTime;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_near_future_arrival_rounds_down() {
        let updates = vec![trip("A", "t1", &[("R16", Some(NOW + 90))])];
        let arrivals = compute(&updates, NOW);

        assert_eq!(arrivals.len(), 1);
        let entry = &arrivals["R16"][0];
        assert_eq!(entry.eta_minutes, 1);
        assert_eq!(entry.route_id, "A");
        assert_eq!(entry.trip_id, "t1");
        assert_eq!(entry.station_id, "R16");
    }

    #[test]
    fn test_past_arrival_is_clamped_not_dropped() {
        let updates = vec![trip("A", "t1", &[("R16", Some(NOW - 30))])];
        let arrivals = compute(&updates, NOW);

        assert_eq!(arrivals["R16"].len(), 1);
        assert_eq!(arrivals["R16"][0].eta_minutes, 0);
    }

    #[test]
    fn test_far_past_arrival_is_clamped() {
        let updates = vec![trip("A", "t1", &[("R16", Some(NOW - 600))])];
        let arrivals = compute(&updates, NOW);
        assert_eq!(arrivals["R16"][0].eta_minutes, 0);
    }

    #[test]
    fn test_stop_without_arrival_is_skipped() {
        let updates = vec![trip("A", "t1", &[("R16", None), ("R17", Some(NOW + 120))])];
        let arrivals = compute(&updates, NOW);

        assert!(!arrivals.contains_key("R16"));
        assert_eq!(arrivals["R17"][0].eta_minutes, 2);
    }

    #[test]
    fn test_empty_trip_contributes_nothing() {
        let updates = vec![trip("A", "t1", &[])];
        assert!(compute(&updates, NOW).is_empty());
    }

    #[test]
    fn test_entries_sorted_by_eta() {
        let updates = vec![
            trip("A", "t1", &[("127", Some(NOW + 600))]),
            trip("A", "t2", &[("127", Some(NOW + 60))]),
            trip("C", "t3", &[("127", Some(NOW + 300))]),
        ];

        let arrivals = compute(&updates, NOW);
        let etas: Vec<i64> = arrivals["127"].iter().map(|e| e.eta_minutes).collect();
        assert_eq!(etas, vec![1, 5, 10]);
    }

    #[test]
    fn test_eta_ties_break_by_trip_id() {
        let updates = vec![
            trip("A", "t2", &[("127", Some(NOW + 60))]),
            trip("A", "t1", &[("127", Some(NOW + 90))]),
        ];

        let arrivals = compute(&updates, NOW);
        let trips: Vec<&str> = arrivals["127"].iter().map(|e| e.trip_id.as_str()).collect();
        // Both land at eta 1; order falls back to trip id.
        assert_eq!(trips, vec!["t1", "t2"]);
    }

    #[test]
    fn test_groups_by_station() {
        let updates = vec![trip(
            "A",
            "t1",
            &[("A32", Some(NOW + 60)), ("A33", Some(NOW + 180))],
        )];

        let arrivals = compute(&updates, NOW);
        assert_eq!(arrivals.len(), 2);
        assert_eq!(arrivals["A32"][0].eta_minutes, 1);
        assert_eq!(arrivals["A33"][0].eta_minutes, 3);
    }

    // Helper functions for tests

    fn trip(route: &str, trip_id: &str, stops: &[(&str, Option<i64>)]) -> TripUpdate {
        TripUpdate {
            trip_id: trip_id.to_string(),
            route_id: route.to_string(),
            stop_times: stops
                .iter()
                .map(|(stop_id, arrival)| StopTime {
                    stop_id: stop_id.to_string(),
                    arrival: *arrival,
                })
                .collect(),
        }
    }
}
