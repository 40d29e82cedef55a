//! Paths: the result of a search.
//!
//! A [`RaptorPath`] is an ordered list of legs starting with an access leg
//! and ending with an egress leg. Transit legs read their times from the
//! trip schedule; the other legs carry explicit times. [`LegPlan`] is the
//! untimed form of a leg, used while a path is being assembled.

use std::fmt;

use crate::domain::{
    AccessEgress, BoardAndAlightTime, StopIndex, Time, Transfer, TransferConstraint, TripSchedule,
    format_cost, format_duration,
};

/// A leg before times and costs are assigned.
#[derive(Debug, Clone)]
pub enum LegPlan<T> {
    Access(AccessEgress),
    Transit {
        ride: BoardAndAlightTime<T>,
        /// Constraint on the transfer to the next transit leg.
        transfer_after: Option<TransferConstraint>,
    },
    Transfer(Transfer),
    Egress(AccessEgress),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessLeg {
    pub access: AccessEgress,
    pub from_time: Time,
    pub to_time: Time,
    pub c1: i32,
}

#[derive(Debug, Clone)]
pub struct TransitLeg<T> {
    pub ride: BoardAndAlightTime<T>,
    pub transfer_after: Option<TransferConstraint>,
    pub c1: i32,
}

impl<T: TripSchedule> TransitLeg<T> {
    pub fn trip(&self) -> &T {
        self.ride.trip()
    }

    pub fn route_name(&self) -> &str {
        self.ride.trip().pattern().name()
    }

    pub fn from_stop(&self) -> StopIndex {
        self.ride.board_stop()
    }

    pub fn to_stop(&self) -> StopIndex {
        self.ride.alight_stop()
    }

    pub fn from_time(&self) -> Time {
        self.ride.board_time()
    }

    pub fn to_time(&self) -> Time {
        self.ride.alight_time()
    }
}

impl<T: TripSchedule> PartialEq for TransitLeg<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ride.trip().id() == other.ride.trip().id()
            && self.ride.board_pos() == other.ride.board_pos()
            && self.ride.alight_pos() == other.ride.alight_pos()
            && self.transfer_after == other.transfer_after
            && self.c1 == other.c1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferLeg {
    pub transfer: Transfer,
    pub from_time: Time,
    pub to_time: Time,
    pub c1: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EgressLeg {
    pub egress: AccessEgress,
    pub from_time: Time,
    pub to_time: Time,
    pub c1: i32,
}

/// A timed leg of a path.
#[derive(Debug, Clone)]
pub enum PathLeg<T> {
    Access(AccessLeg),
    Transit(TransitLeg<T>),
    Transfer(TransferLeg),
    Egress(EgressLeg),
}

impl<T: TripSchedule> PathLeg<T> {
    pub fn from_time(&self) -> Time {
        match self {
            PathLeg::Access(leg) => leg.from_time,
            PathLeg::Transit(leg) => leg.from_time(),
            PathLeg::Transfer(leg) => leg.from_time,
            PathLeg::Egress(leg) => leg.from_time,
        }
    }

    pub fn to_time(&self) -> Time {
        match self {
            PathLeg::Access(leg) => leg.to_time,
            PathLeg::Transit(leg) => leg.to_time(),
            PathLeg::Transfer(leg) => leg.to_time,
            PathLeg::Egress(leg) => leg.to_time,
        }
    }

    pub fn c1(&self) -> i32 {
        match self {
            PathLeg::Access(leg) => leg.c1,
            PathLeg::Transit(leg) => leg.c1,
            PathLeg::Transfer(leg) => leg.c1,
            PathLeg::Egress(leg) => leg.c1,
        }
    }

    pub fn as_transit(&self) -> Option<&TransitLeg<T>> {
        match self {
            PathLeg::Transit(leg) => Some(leg),
            _ => None,
        }
    }

    /// Untimed form of this leg.
    pub fn to_plan(&self) -> LegPlan<T> {
        match self {
            PathLeg::Access(leg) => LegPlan::Access(leg.access),
            PathLeg::Transit(leg) => LegPlan::Transit {
                ride: leg.ride.clone(),
                transfer_after: leg.transfer_after,
            },
            PathLeg::Transfer(leg) => LegPlan::Transfer(leg.transfer),
            PathLeg::Egress(leg) => LegPlan::Egress(leg.egress),
        }
    }
}

impl<T: TripSchedule> PartialEq for PathLeg<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PathLeg::Access(a), PathLeg::Access(b)) => a == b,
            (PathLeg::Transit(a), PathLeg::Transit(b)) => a == b,
            (PathLeg::Transfer(a), PathLeg::Transfer(b)) => a == b,
            (PathLeg::Egress(a), PathLeg::Egress(b)) => a == b,
            _ => false,
        }
    }
}

/// A complete path from origin to destination.
///
/// # Invariants
///
/// - The first leg is an access leg and the last an egress leg.
/// - `c1` is the sum of the leg costs.
#[derive(Debug, Clone)]
pub struct RaptorPath<T> {
    legs: Vec<PathLeg<T>>,
    iteration_departure_time: Time,
    c1: i32,
    c2: Option<i32>,
}

impl<T: TripSchedule> RaptorPath<T> {
    pub(crate) fn new(legs: Vec<PathLeg<T>>, iteration_departure_time: Time, c2: Option<i32>) -> Self {
        let c1 = legs.iter().map(PathLeg::c1).sum();
        Self {
            legs,
            iteration_departure_time,
            c1,
            c2,
        }
    }

    pub fn legs(&self) -> &[PathLeg<T>] {
        &self.legs
    }

    pub fn access_leg(&self) -> Option<&AccessLeg> {
        match self.legs.first() {
            Some(PathLeg::Access(leg)) => Some(leg),
            _ => None,
        }
    }

    pub fn egress_leg(&self) -> Option<&EgressLeg> {
        match self.legs.last() {
            Some(PathLeg::Egress(leg)) => Some(leg),
            _ => None,
        }
    }

    pub fn transit_legs(&self) -> impl Iterator<Item = &TransitLeg<T>> + '_ {
        self.legs.iter().filter_map(PathLeg::as_transit)
    }

    /// Departure time of the Range-RAPTOR iteration that found this path.
    pub fn iteration_departure_time(&self) -> Time {
        self.iteration_departure_time
    }

    pub fn start_time(&self) -> Time {
        self.legs
            .first()
            .map_or(self.iteration_departure_time, PathLeg::from_time)
    }

    pub fn end_time(&self) -> Time {
        self.legs
            .last()
            .map_or(self.iteration_departure_time, PathLeg::to_time)
    }

    pub fn duration_secs(&self) -> i32 {
        self.end_time().seconds_since(self.start_time())
    }

    /// Number of rides minus one. Flexible access and egress rides count.
    pub fn number_of_transfers(&self) -> usize {
        let flex_rides: usize = self
            .access_leg()
            .map_or(0, |leg| leg.access.num_rides)
            + self.egress_leg().map_or(0, |leg| leg.egress.num_rides);
        (self.transit_legs().count() + flex_rides).saturating_sub(1)
    }

    pub fn c1(&self) -> i32 {
        self.c1
    }

    pub fn c2(&self) -> Option<i32> {
        self.c2
    }

    pub fn with_c2(mut self, c2: Option<i32>) -> Self {
        self.c2 = c2;
        self
    }

    pub fn to_plans(&self) -> Vec<LegPlan<T>> {
        self.legs.iter().map(PathLeg::to_plan).collect()
    }

    /// Compact description such as "A ~ L1 ~ B ~ Walk 2m ~ C ~ L2 ~ D".
    pub fn summary<S: fmt::Display>(&self, stop_name: impl Fn(StopIndex) -> S) -> String {
        let mut out = String::new();
        if let Some(access) = self.access_leg() {
            out.push_str(&stop_name(access.access.stop).to_string());
        }
        for leg in &self.legs {
            match leg {
                PathLeg::Transit(leg) => {
                    out.push_str(&format!(" ~ {} ~ {}", leg.route_name(), stop_name(leg.to_stop())));
                }
                PathLeg::Transfer(leg) => {
                    out.push_str(&format!(
                        " ~ Walk {} ~ {}",
                        format_duration(leg.transfer.duration_secs),
                        stop_name(leg.transfer.to_stop)
                    ));
                }
                PathLeg::Access(_) | PathLeg::Egress(_) => {}
            }
        }
        out
    }
}

impl<T: TripSchedule> PartialEq for RaptorPath<T> {
    fn eq(&self, other: &Self) -> bool {
        self.legs == other.legs && self.c1 == other.c1 && self.c2 == other.c2
    }
}

impl<T: TripSchedule> fmt::Display for RaptorPath<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} {} {} {}tx {}]",
            self.summary(|stop| stop),
            self.start_time(),
            self.end_time(),
            format_duration(self.duration_secs()),
            self.number_of_transfers(),
            format_cost(self.c1)
        )
    }
}
