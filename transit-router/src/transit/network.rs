//! In-memory transit network.
//!
//! A `TransitNetwork` is assembled with a [`NetworkBuilder`], which validates
//! everything once so searches never see malformed data. After `build()`
//! the network is immutable and can be shared between concurrent requests
//! behind an `Arc`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::domain::{
    DataError, Pattern, RouteIndex, StopIndex, StopPosition, Time, Transfer, TransferConstraint,
    Trip, TripSchedule, cost_from_seconds,
};

use super::constrained::{ConstrainedBoardingSearch, RouteTransferConstraints};
use super::provider::{Route, TransitDataProvider};

/// Default reluctance applied to walking transfers without an explicit cost.
pub const DEFAULT_WALK_RELUCTANCE: f64 = 2.0;

/// A stop with its external id and display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stop {
    pub id: String,
    pub name: String,
}

/// A constrained transfer as declared in the source data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstrainedTransfer {
    pub from_trip: String,
    pub from_stop: StopIndex,
    pub to_trip: String,
    pub to_stop: StopIndex,
    pub constraint: TransferConstraint,
}

type ConstraintKey = (String, StopIndex, String, StopIndex);

/// Validated, immutable transit network.
#[derive(Debug)]
pub struct TransitNetwork {
    stops: Vec<Stop>,
    routes: Vec<Route<Trip>>,
    routes_by_stop: Vec<Vec<RouteIndex>>,
    transfers_from: Vec<Vec<Transfer>>,
    transfers_to: Vec<Vec<Transfer>>,
    boarding_constraints: Vec<Option<RouteTransferConstraints>>,
    constraints: HashMap<ConstraintKey, TransferConstraint>,
}

impl TransitNetwork {
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn number_of_routes(&self) -> usize {
        self.routes.len()
    }

    /// Look up a stop by id, falling back to a case-insensitive name match.
    pub fn find_stop(&self, id_or_name: &str) -> Option<StopIndex> {
        self.stops
            .iter()
            .position(|s| s.id == id_or_name)
            .or_else(|| {
                self.stops
                    .iter()
                    .position(|s| s.name.eq_ignore_ascii_case(id_or_name))
            })
            .map(StopIndex)
    }
}

impl TransitDataProvider for TransitNetwork {
    type Trip = Trip;

    fn number_of_stops(&self) -> usize {
        self.stops.len()
    }

    fn stop_name(&self, stop: StopIndex) -> &str {
        self.stops.get(stop.0).map_or("?", |s| s.name.as_str())
    }

    fn transfers_from_stop(&self, stop: StopIndex) -> &[Transfer] {
        &self.transfers_from[stop.0]
    }

    fn transfers_to_stop(&self, stop: StopIndex) -> &[Transfer] {
        &self.transfers_to[stop.0]
    }

    fn route_index_iterator(&self, stops: &[StopIndex]) -> Vec<RouteIndex> {
        let routes: BTreeSet<RouteIndex> = stops
            .iter()
            .flat_map(|stop| self.routes_by_stop[stop.0].iter().copied())
            .collect();
        routes.into_iter().collect()
    }

    fn route(&self, route: RouteIndex) -> &Route<Trip> {
        &self.routes[route.0]
    }

    fn constrained_boarding_search(
        &self,
        route: RouteIndex,
    ) -> Option<&dyn ConstrainedBoardingSearch<Trip>> {
        self.boarding_constraints[route.0]
            .as_ref()
            .map(|c| c as &dyn ConstrainedBoardingSearch<Trip>)
    }

    fn transfer_constraint(
        &self,
        from_trip: &Trip,
        from_stop: StopIndex,
        to_trip: &Trip,
        to_stop: StopIndex,
    ) -> Option<TransferConstraint> {
        if self.constraints.is_empty() {
            return None;
        }
        let key = (
            from_trip.id().to_string(),
            from_stop,
            to_trip.id().to_string(),
            to_stop,
        );
        self.constraints.get(&key).copied()
    }
}

#[derive(Debug)]
struct RouteDraft {
    pattern: Arc<Pattern>,
    trips: Vec<Trip>,
}

/// Builder for [`TransitNetwork`].
///
/// # Examples
///
/// ```
/// use transit_router::transit::{NetworkBuilder, TransitDataProvider};
///
/// let mut builder = NetworkBuilder::new();
/// let a = builder.add_stop("A", "Alpha");
/// let b = builder.add_stop("B", "Bravo");
/// let route = builder.add_route("L1", vec![a, b]).unwrap();
/// builder.add_trip_times(route, "T1", &["10:00", "10:20"]).unwrap();
/// let network = builder.build().unwrap();
///
/// assert_eq!(network.number_of_stops(), 2);
/// assert_eq!(network.route_index_iterator(&[b]), vec![route]);
/// ```
#[derive(Debug)]
pub struct NetworkBuilder {
    stops: Vec<Stop>,
    routes: Vec<RouteDraft>,
    transfers: Vec<Transfer>,
    constrained: Vec<ConstrainedTransfer>,
    walk_reluctance: f64,
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self {
            stops: Vec::new(),
            routes: Vec::new(),
            transfers: Vec::new(),
            constrained: Vec::new(),
            walk_reluctance: DEFAULT_WALK_RELUCTANCE,
        }
    }

    /// Reluctance used to cost walks added with [`NetworkBuilder::add_walk`].
    pub fn with_walk_reluctance(mut self, walk_reluctance: f64) -> Self {
        self.walk_reluctance = walk_reluctance;
        self
    }

    pub fn add_stop(&mut self, id: impl Into<String>, name: impl Into<String>) -> StopIndex {
        self.stops.push(Stop {
            id: id.into(),
            name: name.into(),
        });
        StopIndex(self.stops.len() - 1)
    }

    /// Add a route whose pattern allows boarding and alighting everywhere.
    pub fn add_route(
        &mut self,
        name: impl Into<String>,
        stops: Vec<StopIndex>,
    ) -> Result<RouteIndex, DataError> {
        let index = RouteIndex(self.routes.len());
        let pattern = Pattern::new(index, name, stops)?;
        self.push_route(pattern)
    }

    /// Add a route with per-position boarding and alighting restrictions.
    pub fn add_route_with_restrictions(
        &mut self,
        name: impl Into<String>,
        stops: Vec<StopIndex>,
        board_allowed: Vec<bool>,
        alight_allowed: Vec<bool>,
    ) -> Result<RouteIndex, DataError> {
        let index = RouteIndex(self.routes.len());
        let pattern =
            Pattern::with_restrictions(index, name, stops, board_allowed, alight_allowed)?;
        self.push_route(pattern)
    }

    fn push_route(&mut self, pattern: Pattern) -> Result<RouteIndex, DataError> {
        for &stop in pattern.stops() {
            self.check_stop(stop)?;
        }
        let index = pattern.route();
        self.routes.push(RouteDraft {
            pattern: Arc::new(pattern),
            trips: Vec::new(),
        });
        Ok(index)
    }

    /// Add a trip with explicit arrival and departure times.
    pub fn add_trip(
        &mut self,
        route: RouteIndex,
        id: impl Into<String>,
        arrivals: Vec<Time>,
        departures: Vec<Time>,
    ) -> Result<(), DataError> {
        let draft = self.route_mut(route)?;
        let trip = Trip::new(id, draft.pattern.clone(), arrivals, departures)?;
        draft.trips.push(trip);
        Ok(())
    }

    /// Add a trip from "HH:MM[:SS]" strings, arriving and departing at the same time.
    pub fn add_trip_times(
        &mut self,
        route: RouteIndex,
        id: impl Into<String>,
        times: &[&str],
    ) -> Result<(), DataError> {
        let times = times
            .iter()
            .map(|s| Time::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        self.add_trip(route, id, times.clone(), times)
    }

    /// Add a one-way transfer with an explicit cost.
    pub fn add_transfer(
        &mut self,
        from: StopIndex,
        to: StopIndex,
        duration_secs: i32,
        c1: i32,
    ) -> Result<(), DataError> {
        self.check_stop(from)?;
        self.check_stop(to)?;
        self.transfers.push(Transfer::new(from, to, duration_secs, c1));
        Ok(())
    }

    /// Add a one-way walk, costed with the builder's walk reluctance.
    pub fn add_walk(
        &mut self,
        from: StopIndex,
        to: StopIndex,
        duration_secs: i32,
    ) -> Result<(), DataError> {
        let c1 = cost_from_seconds(f64::from(duration_secs) * self.walk_reluctance);
        self.add_transfer(from, to, duration_secs, c1)
    }

    pub fn add_constrained_transfer(&mut self, transfer: ConstrainedTransfer) {
        self.constrained.push(transfer);
    }

    fn check_stop(&self, stop: StopIndex) -> Result<(), DataError> {
        if stop.0 >= self.stops.len() {
            return Err(DataError::StopOutOfRange {
                stop,
                number_of_stops: self.stops.len(),
            });
        }
        Ok(())
    }

    fn route_mut(&mut self, route: RouteIndex) -> Result<&mut RouteDraft, DataError> {
        self.routes
            .get_mut(route.0)
            .ok_or_else(|| DataError::UnknownReference {
                kind: "route",
                id: route.to_string(),
            })
    }

    /// Validate and freeze the network.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate trip ids, overtaking trips, or
    /// constrained transfers that reference unknown trips or stops.
    pub fn build(self) -> Result<TransitNetwork, DataError> {
        let n = self.stops.len();
        let mut routes = Vec::with_capacity(self.routes.len());
        let mut routes_by_stop = vec![Vec::new(); n];
        let mut trip_locations: HashMap<String, (RouteIndex, usize)> = HashMap::new();

        for (index, draft) in self.routes.into_iter().enumerate() {
            let route_index = RouteIndex(index);
            let timetable = sort_timetable(&draft.pattern, draft.trips)?;

            for (trip_index, trip) in timetable.iter().enumerate() {
                if trip_locations
                    .insert(trip.id().to_string(), (route_index, trip_index))
                    .is_some()
                {
                    return Err(DataError::DuplicateTrip(trip.id().to_string()));
                }
            }

            let served: BTreeSet<StopIndex> = draft.pattern.stops().iter().copied().collect();
            for stop in served {
                routes_by_stop[stop.0].push(route_index);
            }

            routes.push(Route::new(draft.pattern, timetable));
        }

        let mut transfers_from = vec![Vec::new(); n];
        let mut transfers_to = vec![Vec::new(); n];
        for transfer in self.transfers {
            transfers_from[transfer.from_stop.0].push(transfer);
            transfers_to[transfer.to_stop.0].push(transfer);
        }

        let mut boarding_constraints: Vec<Option<RouteTransferConstraints>> =
            vec![None; routes.len()];
        let mut constraints = HashMap::new();

        for c in self.constrained {
            for stop in [c.from_stop, c.to_stop] {
                if stop.0 >= n {
                    return Err(DataError::StopOutOfRange {
                        stop,
                        number_of_stops: n,
                    });
                }
            }
            if !trip_locations.contains_key(&c.from_trip) {
                return Err(DataError::UnknownReference {
                    kind: "trip",
                    id: c.from_trip,
                });
            }
            let Some(&(route_index, trip_index)) = trip_locations.get(&c.to_trip) else {
                return Err(DataError::UnknownReference {
                    kind: "trip",
                    id: c.to_trip,
                });
            };

            let pattern: &Pattern = routes[route_index.0].pattern();
            let to_pos = pattern
                .positions()
                .find(|&pos| pattern.stop(pos) == c.to_stop && pattern.board_allowed(pos))
                .ok_or_else(|| DataError::UnknownReference {
                    kind: "boarding stop of trip",
                    id: format!("{}@{}", c.to_trip, c.to_stop),
                })?;

            boarding_constraints[route_index.0]
                .get_or_insert_with(RouteTransferConstraints::new)
                .add(c.from_trip.clone(), c.from_stop, to_pos, trip_index, c.constraint);
            constraints.insert((c.from_trip, c.from_stop, c.to_trip, c.to_stop), c.constraint);
        }

        debug!(
            stops = n,
            routes = routes.len(),
            constrained_transfers = constraints.len(),
            "Built transit network"
        );

        Ok(TransitNetwork {
            stops: self.stops,
            routes,
            routes_by_stop,
            transfers_from,
            transfers_to,
            boarding_constraints,
            constraints,
        })
    }
}

/// Sort trips by first departure and reject overtaking.
fn sort_timetable(pattern: &Pattern, mut trips: Vec<Trip>) -> Result<Vec<Arc<Trip>>, DataError> {
    trips.sort_by_key(|t| t.departure(StopPosition(0)));

    for pair in trips.windows(2) {
        let (earlier, later) = (&pair[0], &pair[1]);
        let overtakes = pattern.positions().any(|pos| {
            later.departure(pos) < earlier.departure(pos) || later.arrival(pos) < earlier.arrival(pos)
        });
        if overtakes {
            return Err(DataError::OvertakingTrips {
                pattern: pattern.name().to_string(),
                earlier: earlier.id().to_string(),
                later: later.id().to_string(),
            });
        }
    }

    Ok(trips.into_iter().map(Arc::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stop_builder() -> (NetworkBuilder, StopIndex, StopIndex) {
        let mut builder = NetworkBuilder::new();
        let a = builder.add_stop("A", "Alpha");
        let b = builder.add_stop("B", "Bravo");
        (builder, a, b)
    }

    #[test]
    fn route_index_iterator_lists_routes_once() {
        let (mut builder, a, b) = two_stop_builder();
        let c = builder.add_stop("C", "Charlie");
        let r0 = builder.add_route("L1", vec![a, b]).unwrap();
        let r1 = builder.add_route("L2", vec![b, c, b]).unwrap();
        let network = builder.build().unwrap();

        assert_eq!(network.route_index_iterator(&[b]), vec![r0, r1]);
        assert_eq!(network.route_index_iterator(&[c, b, c]), vec![r0, r1]);
        assert_eq!(network.route_index_iterator(&[a]), vec![r0]);
    }

    #[test]
    fn timetable_is_sorted_by_departure() {
        let (mut builder, a, b) = two_stop_builder();
        let route = builder.add_route("L1", vec![a, b]).unwrap();
        builder.add_trip_times(route, "late", &["11:00", "11:10"]).unwrap();
        builder.add_trip_times(route, "early", &["10:00", "10:10"]).unwrap();
        let network = builder.build().unwrap();

        let ids: Vec<&str> = network.route(route).timetable().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[test]
    fn overtaking_trips_are_rejected() {
        let (mut builder, a, b) = two_stop_builder();
        let route = builder.add_route("L1", vec![a, b]).unwrap();
        builder.add_trip_times(route, "slow", &["10:00", "10:50"]).unwrap();
        builder.add_trip_times(route, "fast", &["10:10", "10:20"]).unwrap();

        assert!(matches!(
            builder.build(),
            Err(DataError::OvertakingTrips { .. })
        ));
    }

    #[test]
    fn stop_out_of_range_is_rejected() {
        let (mut builder, a, _) = two_stop_builder();
        assert!(matches!(
            builder.add_route("L1", vec![a, StopIndex(5)]),
            Err(DataError::StopOutOfRange { .. })
        ));
        assert!(builder.add_walk(a, StopIndex(9), 60).is_err());
    }

    #[test]
    fn duplicate_trip_ids_are_rejected() {
        let (mut builder, a, b) = two_stop_builder();
        let route = builder.add_route("L1", vec![a, b]).unwrap();
        builder.add_trip_times(route, "T1", &["10:00", "10:10"]).unwrap();
        builder.add_trip_times(route, "T1", &["11:00", "11:10"]).unwrap();
        assert!(matches!(builder.build(), Err(DataError::DuplicateTrip(_))));
    }

    #[test]
    fn transfers_are_indexed_both_ways() {
        let (mut builder, a, b) = two_stop_builder();
        builder.add_walk(a, b, 120).unwrap();
        let network = builder.build().unwrap();

        assert_eq!(network.transfers_from_stop(a).len(), 1);
        assert_eq!(network.transfers_to_stop(b).len(), 1);
        assert!(network.transfers_from_stop(b).is_empty());
        // 120 s at reluctance 2.0
        assert_eq!(network.transfers_from_stop(a)[0].c1, 24_000);
    }

    #[test]
    fn constrained_transfers_resolve_trips() {
        let (mut builder, a, b) = two_stop_builder();
        let c = builder.add_stop("C", "Charlie");
        let r0 = builder.add_route("L1", vec![a, b]).unwrap();
        let r1 = builder.add_route("L2", vec![b, c]).unwrap();
        builder.add_trip_times(r0, "F1", &["10:00", "10:10"]).unwrap();
        builder.add_trip_times(r1, "T1", &["10:10", "10:20"]).unwrap();
        builder.add_constrained_transfer(ConstrainedTransfer {
            from_trip: "F1".into(),
            from_stop: b,
            to_trip: "T1".into(),
            to_stop: b,
            constraint: TransferConstraint::stay_seated(),
        });
        let network = builder.build().unwrap();

        assert!(network.constrained_boarding_search(r0).is_none());
        let search = network.constrained_boarding_search(r1).unwrap();
        assert!(search.transfer_exist_target(StopPosition(0)));

        let from = network.route(r0).trip(0).clone();
        let to = network.route(r1).trip(0).clone();
        assert_eq!(
            network.transfer_constraint(&from, b, &to, b),
            Some(TransferConstraint::stay_seated())
        );
        assert_eq!(network.transfer_constraint(&from, a, &to, b), None);
    }

    #[test]
    fn constrained_transfer_with_unknown_trip_is_rejected() {
        let (mut builder, a, b) = two_stop_builder();
        builder.add_constrained_transfer(ConstrainedTransfer {
            from_trip: "nope".into(),
            from_stop: a,
            to_trip: "nope".into(),
            to_stop: b,
            constraint: TransferConstraint::guaranteed(),
        });
        assert!(matches!(
            builder.build(),
            Err(DataError::UnknownReference { kind: "trip", .. })
        ));
    }

    #[test]
    fn find_stop_by_id_or_name() {
        let (builder, a, b) = two_stop_builder();
        let network = builder.build().unwrap();
        assert_eq!(network.find_stop("A"), Some(a));
        assert_eq!(network.find_stop("bravo"), Some(b));
        assert_eq!(network.find_stop("Z"), None);
        assert_eq!(network.stop_name(b), "Bravo");
    }
}
