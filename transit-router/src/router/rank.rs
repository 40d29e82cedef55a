//! Itinerary ranking across branches.
//!
//! The transit, street and flex branches each return their own best
//! itineraries. These are merged, deduplicated and ranked to present the
//! most useful options first.

use std::cmp::Ordering;

use super::itinerary::Itinerary;

/// Rank itineraries by preference.
///
/// Itineraries are ranked by:
/// 1. Arrival time (earlier is better), or departure time (later is better)
///    for arrive-by requests
/// 2. Number of changes (fewer is better)
/// 3. Total duration (shorter is better)
/// 4. Generalized cost (lower is better)
///
/// Returns itineraries sorted best-first.
pub fn rank_itineraries(mut itineraries: Vec<Itinerary>, arrive_by: bool) -> Vec<Itinerary> {
    itineraries.sort_by(|a, b| {
        let primary = if arrive_by {
            b.departure_time().cmp(&a.departure_time())
        } else {
            a.arrival_time().cmp(&b.arrival_time())
        };
        if primary != Ordering::Equal {
            return primary;
        }

        let changes = a.change_count().cmp(&b.change_count());
        if changes != Ordering::Equal {
            return changes;
        }

        let duration = a.total_duration().cmp(&b.total_duration());
        if duration != Ordering::Equal {
            return duration;
        }

        a.generalized_cost.cmp(&b.generalized_cost)
    });

    itineraries
}

/// Deduplicate itineraries that are effectively identical.
///
/// Two itineraries are duplicates if they depart and arrive at the same
/// time with the same number of changes and the same sequence of legs.
/// When duplicates exist, keeps the cheapest.
pub fn deduplicate(mut itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
    if itineraries.len() <= 1 {
        return itineraries;
    }

    itineraries.sort_by(|a, b| {
        a.arrival_time()
            .cmp(&b.arrival_time())
            .then_with(|| a.departure_time().cmp(&b.departure_time()))
            .then_with(|| a.change_count().cmp(&b.change_count()))
            .then_with(|| a.generalized_cost.cmp(&b.generalized_cost))
    });

    let mut result: Vec<Itinerary> = Vec::with_capacity(itineraries.len());
    for itinerary in itineraries {
        let duplicate = result.iter().any(|kept| {
            kept.arrival_time() == itinerary.arrival_time()
                && kept.departure_time() == itinerary.departure_time()
                && kept.change_count() == itinerary.change_count()
                && kept.legs == itinerary.legs
        });
        if !duplicate {
            result.push(itinerary);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Time;
    use crate::router::itinerary::ItineraryLeg;

    fn time(s: &str) -> Time {
        Time::parse(s).unwrap()
    }

    /// One transit leg per (route, board, alight), plus zero-length access and egress.
    fn make_itinerary(rides: &[(&str, &str, &str)], cost: i32) -> Itinerary {
        let mut legs = Vec::new();
        let first = rides.first().map_or(time("00:00"), |r| time(r.1));
        let last = rides.last().map_or(time("00:00"), |r| time(r.2));
        legs.push(ItineraryLeg::Access {
            to: "A".into(),
            start: first,
            end: first,
            rides: 0,
        });
        for (route, board, alight) in rides {
            legs.push(ItineraryLeg::Transit {
                route: (*route).to_string(),
                trip: format!("{route}-{board}"),
                from: "A".into(),
                to: "B".into(),
                board: time(board),
                alight: time(alight),
            });
        }
        legs.push(ItineraryLeg::Egress {
            from: "B".into(),
            start: last,
            end: last,
            rides: 0,
        });
        Itinerary::new(legs, cost)
    }

    #[test]
    fn rank_by_arrival() {
        let late = make_itinerary(&[("L1", "10:00", "11:00")], 0);
        let early = make_itinerary(&[("L2", "10:10", "10:50")], 0);

        let ranked = rank_itineraries(vec![late.clone(), early.clone()], false);

        assert_eq!(ranked, vec![early, late]);
    }

    #[test]
    fn rank_by_changes_then_duration() {
        let direct = make_itinerary(&[("L1", "10:00", "11:00")], 0);
        let change = make_itinerary(&[("L2", "10:20", "10:40"), ("L3", "10:45", "11:00")], 0);
        let short = make_itinerary(&[("L4", "10:30", "11:00")], 0);

        let ranked = rank_itineraries(vec![change.clone(), direct.clone(), short.clone()], false);

        assert_eq!(ranked, vec![short, direct, change]);
    }

    #[test]
    fn arrive_by_prefers_later_departure() {
        let early = make_itinerary(&[("L1", "09:00", "10:00")], 0);
        let late = make_itinerary(&[("L2", "09:30", "10:00")], 0);

        let ranked = rank_itineraries(vec![early.clone(), late.clone()], true);

        assert_eq!(ranked, vec![late, early]);
    }

    #[test]
    fn deduplicate_keeps_cheapest() {
        let expensive = make_itinerary(&[("L1", "10:00", "11:00")], 500);
        let cheap = make_itinerary(&[("L1", "10:00", "11:00")], 100);

        let result = deduplicate(vec![expensive, cheap.clone()]);

        assert_eq!(result, vec![cheap]);
    }

    #[test]
    fn deduplicate_keeps_different_routes() {
        let one = make_itinerary(&[("L1", "10:00", "11:00")], 0);
        let other = make_itinerary(&[("L2", "10:00", "11:00")], 0);

        assert_eq!(deduplicate(vec![one, other]).len(), 2);
    }

    #[test]
    fn deduplicate_empty_and_single() {
        assert!(deduplicate(Vec::new()).is_empty());
        assert_eq!(deduplicate(vec![make_itinerary(&[], 0)]).len(), 1);
    }
}
