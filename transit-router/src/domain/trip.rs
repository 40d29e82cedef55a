//! Trip patterns and scheduled trips.
//!
//! A `Pattern` is an ordered stop sequence shared by every trip of a route.
//! A trip adds arrival and departure times for each position in the
//! pattern. The routing engine only sees trips through [`TripSchedule`],
//! so callers may plug in their own schedule representation.

use std::fmt;
use std::sync::Arc;

use super::{DataError, RouteIndex, StopIndex, StopPosition, Time};

/// Ordered stop sequence of a route.
///
/// # Invariants
///
/// - At least two stops.
/// - `board_allowed` and `alight_allowed` have one entry per stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    route: RouteIndex,
    name: String,
    stops: Vec<StopIndex>,
    board_allowed: Vec<bool>,
    alight_allowed: Vec<bool>,
}

impl Pattern {
    /// Create a pattern where boarding and alighting is allowed everywhere.
    pub fn new(
        route: RouteIndex,
        name: impl Into<String>,
        stops: Vec<StopIndex>,
    ) -> Result<Self, DataError> {
        let n = stops.len();
        Self::with_restrictions(route, name, stops, vec![true; n], vec![true; n])
    }

    /// Create a pattern with per-position boarding and alighting flags.
    pub fn with_restrictions(
        route: RouteIndex,
        name: impl Into<String>,
        stops: Vec<StopIndex>,
        board_allowed: Vec<bool>,
        alight_allowed: Vec<bool>,
    ) -> Result<Self, DataError> {
        let name = name.into();
        if stops.len() < 2 {
            return Err(DataError::EmptyPattern(name));
        }
        for flags in [&board_allowed, &alight_allowed] {
            if flags.len() != stops.len() {
                return Err(DataError::LengthMismatch {
                    trip: name,
                    expected: stops.len(),
                    actual: flags.len(),
                });
            }
        }
        Ok(Self {
            route,
            name,
            stops,
            board_allowed,
            alight_allowed,
        })
    }

    /// Route this pattern belongs to.
    pub fn route(&self) -> RouteIndex {
        self.route
    }

    /// Display name of the route, e.g. "L1".
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of stops in the pattern.
    pub fn number_of_stops(&self) -> usize {
        self.stops.len()
    }

    /// Stop at the given position.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is outside the pattern.
    pub fn stop(&self, pos: StopPosition) -> StopIndex {
        self.stops[pos.0]
    }

    /// All stops in travel order.
    pub fn stops(&self) -> &[StopIndex] {
        &self.stops
    }

    pub fn board_allowed(&self, pos: StopPosition) -> bool {
        self.board_allowed[pos.0]
    }

    pub fn alight_allowed(&self, pos: StopPosition) -> bool {
        self.alight_allowed[pos.0]
    }

    /// Positions in travel order.
    pub fn positions(&self) -> impl Iterator<Item = StopPosition> + '_ {
        (0..self.stops.len()).map(StopPosition)
    }
}

/// Schedule of a single trip, as seen by the routing engine.
///
/// Times are read from the schedule on demand; nothing downstream caches
/// them. Trips are shared behind `Arc` and compared by [`TripSchedule::id`].
pub trait TripSchedule: fmt::Debug + Clone + Send + Sync + 'static {
    /// Unique trip identifier.
    fn id(&self) -> &str;

    /// The pattern this trip runs.
    fn pattern(&self) -> &Pattern;

    /// Arrival time at a position.
    fn arrival(&self, pos: StopPosition) -> Time;

    /// Departure time from a position.
    fn departure(&self, pos: StopPosition) -> Time;

    /// Stop served at a position.
    fn stop(&self, pos: StopPosition) -> StopIndex {
        self.pattern().stop(pos)
    }

    /// Find the first position serving `stop` with the given departure time.
    fn find_departure_stop_position(&self, time: Time, stop: StopIndex) -> Option<StopPosition> {
        self.pattern()
            .positions()
            .find(|&pos| self.stop(pos) == stop && self.departure(pos) == time)
    }

    /// Find the last position serving `stop` with the given arrival time.
    ///
    /// Searching from the end picks the later visit when a looping pattern
    /// serves the same stop twice at the same time.
    fn find_arrival_stop_position(&self, time: Time, stop: StopIndex) -> Option<StopPosition> {
        let positions: Vec<StopPosition> = self.pattern().positions().collect();
        positions
            .into_iter()
            .rev()
            .find(|&pos| self.stop(pos) == stop && self.arrival(pos) == time)
    }
}

/// In-memory trip with explicit stop times.
///
/// # Invariants
///
/// - One arrival and one departure per pattern position.
/// - `departure(pos) >= arrival(pos)`.
/// - `arrival(pos + 1) >= departure(pos)`.
#[derive(Debug, Clone)]
pub struct Trip {
    id: String,
    pattern: Arc<Pattern>,
    arrivals: Vec<Time>,
    departures: Vec<Time>,
}

impl Trip {
    /// Create a validated trip.
    ///
    /// # Errors
    ///
    /// Returns an error if the time vectors do not match the pattern length
    /// or if times go backwards along the trip.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use transit_router::domain::{Pattern, RouteIndex, StopIndex, Time, Trip, TripSchedule};
    ///
    /// let pattern = Arc::new(
    ///     Pattern::new(RouteIndex(0), "L1", vec![StopIndex(0), StopIndex(1)]).unwrap(),
    /// );
    /// let times = vec![Time::hms(10, 0, 0), Time::hms(10, 20, 0)];
    /// let trip = Trip::new("T1", pattern, times.clone(), times).unwrap();
    /// assert_eq!(trip.id(), "T1");
    /// ```
    pub fn new(
        id: impl Into<String>,
        pattern: Arc<Pattern>,
        arrivals: Vec<Time>,
        departures: Vec<Time>,
    ) -> Result<Self, DataError> {
        let id = id.into();
        let expected = pattern.number_of_stops();
        for actual in [arrivals.len(), departures.len()] {
            if actual != expected {
                return Err(DataError::LengthMismatch {
                    trip: id,
                    expected,
                    actual,
                });
            }
        }

        for i in 0..expected {
            if departures[i] < arrivals[i] {
                return Err(DataError::DepartureBeforeArrival {
                    trip: id,
                    position: StopPosition(i),
                });
            }
            if i > 0 && arrivals[i] < departures[i - 1] {
                return Err(DataError::DecreasingTimes {
                    trip: id,
                    position: StopPosition(i),
                });
            }
        }

        Ok(Self {
            id,
            pattern,
            arrivals,
            departures,
        })
    }

    /// Create a trip whose arrival and departure times are equal at every stop.
    pub fn with_times(
        id: impl Into<String>,
        pattern: Arc<Pattern>,
        times: Vec<Time>,
    ) -> Result<Self, DataError> {
        Self::new(id, pattern, times.clone(), times)
    }

    /// Shared handle to the pattern.
    pub fn pattern_arc(&self) -> &Arc<Pattern> {
        &self.pattern
    }
}

impl TripSchedule for Trip {
    fn id(&self) -> &str {
        &self.id
    }

    fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    fn arrival(&self, pos: StopPosition) -> Time {
        self.arrivals[pos.0]
    }

    fn departure(&self, pos: StopPosition) -> Time {
        self.departures[pos.0]
    }
}
