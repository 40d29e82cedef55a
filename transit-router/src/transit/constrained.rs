//! Constrained transfers: stay-seated, guaranteed, prioritised and
//! forbidden trip-to-trip transfers.
//!
//! Constraints are looked up while boarding. The rider's previous trip and
//! the stop where they left it identify the transfer source; the boarding
//! position on the route identifies the target.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{StopIndex, StopPosition, Time, TransferConstraint, TripSchedule};

/// Where a transferring rider comes from.
#[derive(Debug, Clone, Copy)]
pub struct TransferSource<'a, T> {
    /// Trip the rider alighted from.
    pub trip: &'a T,
    /// Stop where the rider left `trip`.
    pub stop: StopIndex,
    /// Scheduled arrival of `trip` at `stop`, without slack.
    pub arrival_time: Time,
}

/// A boarding granted by a constrained transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstrainedBoarding {
    /// Index of the boarded trip in the route's timetable.
    pub trip_index: usize,
    pub constraint: TransferConstraint,
}

/// Constrained-transfer lookup for one route.
pub trait ConstrainedBoardingSearch<T: TripSchedule>: Send + Sync {
    /// Whether any constrained transfer boards this route at `to_pos`.
    fn transfer_exist_target(&self, to_pos: StopPosition) -> bool;

    /// Find the earliest trip a constrained transfer lets the rider board at
    /// `to_pos`.
    ///
    /// Stay-seated and guaranteed transfers only require the trip to depart
    /// no earlier than the source arrival. Other constraints require
    /// `earliest_board_time`, which includes slack. Forbidden transfers are
    /// never returned here.
    fn find(
        &self,
        timetable: &[Arc<T>],
        source: &TransferSource<'_, T>,
        to_pos: StopPosition,
        earliest_board_time: Time,
    ) -> Option<ConstrainedBoarding>;

    /// Whether boarding trip `trip_index` at `to_pos` from `source` is forbidden.
    fn is_forbidden(
        &self,
        source: &TransferSource<'_, T>,
        to_pos: StopPosition,
        trip_index: usize,
    ) -> bool;
}

#[derive(Debug, Clone)]
struct Entry {
    from_trip: String,
    from_stop: StopIndex,
    to_trip_index: usize,
    constraint: TransferConstraint,
}

impl Entry {
    fn matches<T: TripSchedule>(&self, source: &TransferSource<'_, T>) -> bool {
        self.from_stop == source.stop && self.from_trip == source.trip.id()
    }
}

/// In-memory constrained transfers targeting one route, keyed by board position.
#[derive(Debug, Clone, Default)]
pub struct RouteTransferConstraints {
    by_position: HashMap<StopPosition, Vec<Entry>>,
}

impl RouteTransferConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        from_trip: impl Into<String>,
        from_stop: StopIndex,
        to_pos: StopPosition,
        to_trip_index: usize,
        constraint: TransferConstraint,
    ) {
        self.by_position.entry(to_pos).or_default().push(Entry {
            from_trip: from_trip.into(),
            from_stop,
            to_trip_index,
            constraint,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.by_position.is_empty()
    }
}

impl<T: TripSchedule> ConstrainedBoardingSearch<T> for RouteTransferConstraints {
    fn transfer_exist_target(&self, to_pos: StopPosition) -> bool {
        self.by_position.contains_key(&to_pos)
    }

    fn find(
        &self,
        timetable: &[Arc<T>],
        source: &TransferSource<'_, T>,
        to_pos: StopPosition,
        earliest_board_time: Time,
    ) -> Option<ConstrainedBoarding> {
        self.by_position
            .get(&to_pos)?
            .iter()
            .filter(|entry| entry.matches(source) && !entry.constraint.is_not_allowed())
            .filter(|entry| {
                let Some(trip) = timetable.get(entry.to_trip_index) else {
                    return false;
                };
                let required = if entry.constraint.is_facilitated() {
                    source.arrival_time
                } else {
                    earliest_board_time
                };
                trip.departure(to_pos) >= required
            })
            .min_by_key(|entry| entry.to_trip_index)
            .map(|entry| ConstrainedBoarding {
                trip_index: entry.to_trip_index,
                constraint: entry.constraint,
            })
    }

    fn is_forbidden(
        &self,
        source: &TransferSource<'_, T>,
        to_pos: StopPosition,
        trip_index: usize,
    ) -> bool {
        self.by_position.get(&to_pos).is_some_and(|entries| {
            entries.iter().any(|entry| {
                entry.to_trip_index == trip_index
                    && entry.constraint.is_not_allowed()
                    && entry.matches(source)
            })
        })
    }
}
