//! Pareto-optimal arrivals at the destination.

use tracing::debug;

use crate::domain::{AccessEgress, Time, TripSchedule};

use super::arrival::{ArrivalArena, ArrivalId};
use super::mapper::PathBuilder;
use super::pareto::{ParetoComparator, ParetoSet, TiePolicy};
use super::path::RaptorPath;

/// An egress leg taken from a stop arrival.
#[derive(Debug, Clone, Copy)]
pub struct DestinationArrival {
    pub previous: ArrivalId,
    pub egress: AccessEgress,
    pub arrival_time: Time,
    pub round: usize,
    pub iteration_departure_time: Time,
}

/// Path criteria used by the destination set.
///
/// Arrival time and number of transfers always count. Departure time
/// (later is better), travel duration and generalized cost are optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathComparator {
    pub departure_time: bool,
    pub duration: bool,
    pub generalized_cost: bool,
}

impl<T: TripSchedule> ParetoComparator<RaptorPath<T>> for PathComparator {
    fn left_dominance_exist(&self, left: &RaptorPath<T>, right: &RaptorPath<T>) -> bool {
        left.end_time() < right.end_time()
            || left.number_of_transfers() < right.number_of_transfers()
            || (self.departure_time && left.start_time() > right.start_time())
            || (self.duration && left.duration_secs() < right.duration_secs())
            || (self.generalized_cost && left.c1() < right.c1())
    }
}

/// Accumulates destination arrivals as a pareto set of paths.
#[derive(Debug)]
pub struct DestinationArrivals<T> {
    paths: ParetoSet<RaptorPath<T>, PathComparator>,
    builder: PathBuilder,
    latest_arrival: Option<Time>,
    rejected_by_latest_arrival: usize,
}

impl<T: TripSchedule> DestinationArrivals<T> {
    pub fn new(
        comparator: PathComparator,
        tie_policy: TiePolicy,
        builder: PathBuilder,
        latest_arrival: Option<Time>,
    ) -> Self {
        Self {
            paths: ParetoSet::with_tie_policy(comparator, tie_policy),
            builder,
            latest_arrival,
            rejected_by_latest_arrival: 0,
        }
    }

    /// Map `arrival` to a path and offer it to the set.
    ///
    /// Returns true if the path was kept.
    pub fn add(&mut self, arena: &ArrivalArena<T>, arrival: &DestinationArrival) -> bool {
        if self
            .latest_arrival
            .is_some_and(|latest| arrival.arrival_time > latest)
        {
            self.rejected_by_latest_arrival += 1;
            return false;
        }

        let path = self.builder.map_destination(arena, arrival);
        let added = self.paths.add(path);
        if added {
            debug!(
                round = arrival.round,
                arrival = %arrival.arrival_time,
                paths = self.paths.len(),
                "Destination reached"
            );
        }
        added
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Arrivals discarded for arriving after the latest arrival time.
    pub fn rejected_by_latest_arrival(&self) -> usize {
        self.rejected_by_latest_arrival
    }

    /// The current non-dominated paths.
    pub fn list_paths(&self) -> &[RaptorPath<T>] {
        self.paths.elements()
    }

    pub fn into_paths(self) -> Vec<RaptorPath<T>> {
        self.paths.into_vec()
    }
}
