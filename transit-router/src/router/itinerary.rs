//! Rider-facing itineraries.
//!
//! An `Itinerary` is a path with stop names resolved, ready to present. All
//! three branches of a request produce itineraries, so results can be
//! ranked together.

use std::fmt;

use chrono::Duration;

use crate::domain::{Time, TripSchedule, format_cost, format_duration};
use crate::optimize::OptimizedPath;
use crate::raptor::{PathLeg, RaptorPath};
use crate::transit::TransitDataProvider;

/// One leg of an itinerary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItineraryLeg {
    /// From the origin to the first stop, walking or with on-demand rides
    Access {
        to: String,
        start: Time,
        end: Time,
        rides: usize,
    },
    /// A ride on a scheduled trip
    Transit {
        route: String,
        trip: String,
        from: String,
        to: String,
        board: Time,
        alight: Time,
    },
    /// A walk between two stops
    Walk {
        from: String,
        to: String,
        start: Time,
        end: Time,
    },
    /// From the last stop to the destination
    Egress {
        from: String,
        start: Time,
        end: Time,
        rides: usize,
    },
}

impl ItineraryLeg {
    pub fn start_time(&self) -> Time {
        match self {
            ItineraryLeg::Access { start, .. }
            | ItineraryLeg::Walk { start, .. }
            | ItineraryLeg::Egress { start, .. } => *start,
            ItineraryLeg::Transit { board, .. } => *board,
        }
    }

    pub fn end_time(&self) -> Time {
        match self {
            ItineraryLeg::Access { end, .. }
            | ItineraryLeg::Walk { end, .. }
            | ItineraryLeg::Egress { end, .. } => *end,
            ItineraryLeg::Transit { alight, .. } => *alight,
        }
    }

    /// Number of vehicle rides in this leg.
    pub fn rides(&self) -> usize {
        match self {
            ItineraryLeg::Access { rides, .. } | ItineraryLeg::Egress { rides, .. } => *rides,
            ItineraryLeg::Transit { .. } => 1,
            ItineraryLeg::Walk { .. } => 0,
        }
    }

    /// Returns true if this is a ride on a scheduled trip.
    pub fn is_transit(&self) -> bool {
        matches!(self, ItineraryLeg::Transit { .. })
    }
}

/// A complete trip from origin to destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Itinerary {
    pub legs: Vec<ItineraryLeg>,
    /// Generalized cost, in centi-seconds
    pub generalized_cost: i32,
    /// Transfer priority cost, if the transfers were optimized
    pub transfer_priority_cost: Option<i32>,
    /// Wait-time optimized cost, if the transfers were optimized
    pub wait_time_optimized_cost: Option<i32>,
}

impl Itinerary {
    pub fn new(legs: Vec<ItineraryLeg>, generalized_cost: i32) -> Self {
        Self {
            legs,
            generalized_cost,
            transfer_priority_cost: None,
            wait_time_optimized_cost: None,
        }
    }

    /// Map a path, naming stops through `provider`.
    pub fn from_path<P: TransitDataProvider>(provider: &P, path: &RaptorPath<P::Trip>) -> Self {
        let name = |stop| provider.stop_name(stop).to_string();
        let legs = path
            .legs()
            .iter()
            .map(|leg| match leg {
                PathLeg::Access(leg) => ItineraryLeg::Access {
                    to: name(leg.access.stop),
                    start: leg.from_time,
                    end: leg.to_time,
                    rides: leg.access.num_rides,
                },
                PathLeg::Transit(leg) => ItineraryLeg::Transit {
                    route: leg.route_name().to_string(),
                    trip: leg.trip().id().to_string(),
                    from: name(leg.from_stop()),
                    to: name(leg.to_stop()),
                    board: leg.from_time(),
                    alight: leg.to_time(),
                },
                PathLeg::Transfer(leg) => ItineraryLeg::Walk {
                    from: name(leg.transfer.from_stop),
                    to: name(leg.transfer.to_stop),
                    start: leg.from_time,
                    end: leg.to_time,
                },
                PathLeg::Egress(leg) => ItineraryLeg::Egress {
                    from: name(leg.egress.stop),
                    start: leg.from_time,
                    end: leg.to_time,
                    rides: leg.egress.num_rides,
                },
            })
            .collect();
        Self::new(legs, path.c1())
    }

    /// Map an optimized path, keeping its optimization costs.
    pub fn from_optimized<P: TransitDataProvider>(provider: &P, path: &OptimizedPath<P::Trip>) -> Self {
        Self {
            transfer_priority_cost: Some(path.transfer_priority_cost()),
            wait_time_optimized_cost: Some(path.wait_time_optimized_cost()),
            ..Self::from_path(provider, path.path())
        }
    }

    /// Returns the departure time from the origin.
    pub fn departure_time(&self) -> Option<Time> {
        self.legs.first().map(ItineraryLeg::start_time)
    }

    /// Returns the arrival time at the destination.
    pub fn arrival_time(&self) -> Option<Time> {
        self.legs.last().map(ItineraryLeg::end_time)
    }

    /// Returns the total duration, door to door.
    pub fn total_duration(&self) -> Duration {
        match (self.departure_time(), self.arrival_time()) {
            (Some(departure), Some(arrival)) => Duration::seconds(i64::from(arrival.seconds_since(departure))),
            _ => Duration::zero(),
        }
    }

    /// Returns the number of changes between vehicles.
    pub fn change_count(&self) -> usize {
        self.legs
            .iter()
            .map(ItineraryLeg::rides)
            .sum::<usize>()
            .saturating_sub(1)
    }

    /// Returns the number of transit legs.
    pub fn transit_leg_count(&self) -> usize {
        self.legs.iter().filter(|leg| leg.is_transit()).count()
    }
}

impl fmt::Display for Itinerary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (Some(departure), Some(arrival)) = (self.departure_time(), self.arrival_time()) else {
            return write!(f, "(empty itinerary)");
        };
        write!(
            f,
            "{departure} -> {arrival} ({}, {} change{}, cost {})",
            format_duration(arrival.seconds_since(departure)),
            self.change_count(),
            if self.change_count() == 1 { "" } else { "s" },
            format_cost(self.generalized_cost)
        )?;
        for leg in &self.legs {
            match leg {
                ItineraryLeg::Access { to, start, end, rides } => {
                    let mode = if *rides > 0 { "Flex" } else { "Walk" };
                    write!(f, "\n  {start} {mode} {} to {to}", format_duration(end.seconds_since(*start)))?;
                }
                ItineraryLeg::Transit {
                    route,
                    from,
                    to,
                    board,
                    alight,
                    ..
                } => {
                    write!(f, "\n  {board} {route} from {from} to {to}, arriving {alight}")?;
                }
                ItineraryLeg::Walk { from, to, start, end } => {
                    write!(
                        f,
                        "\n  {start} Walk {} from {from} to {to}",
                        format_duration(end.seconds_since(*start))
                    )?;
                }
                ItineraryLeg::Egress { from, start, end, rides } => {
                    let mode = if *rides > 0 { "Flex" } else { "Walk" };
                    write!(f, "\n  {start} {mode} {} from {from}", format_duration(end.seconds_since(*start)))?;
                }
            }
        }
        Ok(())
    }
}
