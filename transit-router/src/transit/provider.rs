//! The read-only view of transit data consumed by the router.

use std::sync::Arc;

use crate::domain::{
    Pattern, RouteIndex, StopIndex, Transfer, TransferConstraint, TripSchedule,
};

use super::constrained::ConstrainedBoardingSearch;

/// A pattern and its timetable.
///
/// # Invariants
///
/// - Every trip in the timetable runs `pattern`.
/// - Trips are sorted by departure and never overtake each other, so the
///   timetable is sorted at every stop position.
#[derive(Debug, Clone)]
pub struct Route<T> {
    pattern: Arc<Pattern>,
    timetable: Vec<Arc<T>>,
}

impl<T: TripSchedule> Route<T> {
    pub(crate) fn new(pattern: Arc<Pattern>, timetable: Vec<Arc<T>>) -> Self {
        Self { pattern, timetable }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn timetable(&self) -> &[Arc<T>] {
        &self.timetable
    }

    /// Trip at `index` in the timetable.
    pub fn trip(&self, index: usize) -> &Arc<T> {
        &self.timetable[index]
    }
}

/// Trait for providing transit data to a search.
///
/// One provider is shared read-only by every concurrent search. The
/// in-memory [`super::TransitNetwork`] is the standard implementation;
/// tests plug in their own.
pub trait TransitDataProvider: Send + Sync {
    /// Trip type of this data set.
    type Trip: TripSchedule;

    /// Number of stops; stop indices are `0..number_of_stops()`.
    fn number_of_stops(&self) -> usize;

    /// Human-readable stop name, used when presenting paths.
    fn stop_name(&self, stop: StopIndex) -> &str;

    /// Street transfers leaving `stop`.
    fn transfers_from_stop(&self, stop: StopIndex) -> &[Transfer];

    /// Street transfers arriving at `stop`.
    fn transfers_to_stop(&self, stop: StopIndex) -> &[Transfer];

    /// Routes serving at least one of `stops`, each listed once, ascending.
    fn route_index_iterator(&self, stops: &[StopIndex]) -> Vec<RouteIndex>;

    fn route(&self, route: RouteIndex) -> &Route<Self::Trip>;

    /// Constrained transfers boarding `route`, if any exist.
    fn constrained_boarding_search(
        &self,
        route: RouteIndex,
    ) -> Option<&dyn ConstrainedBoardingSearch<Self::Trip>>;

    /// Constraint on the transfer from `from_trip` at `from_stop` to
    /// `to_trip` at `to_stop`, if one is registered.
    fn transfer_constraint(
        &self,
        from_trip: &Self::Trip,
        from_stop: StopIndex,
        to_trip: &Self::Trip,
        to_stop: StopIndex,
    ) -> Option<TransferConstraint>;
}
