//! Round-based transit routing (Range-RAPTOR).
//!
//! [`RaptorWorker`] runs one search over a [`crate::transit::TransitDataProvider`]
//! and returns pareto-optimal [`RaptorPath`]s. Each round adds one boarding;
//! stop arrivals are kept per round in [`StopArrivals`], and paths reaching
//! the destination are collected in [`DestinationArrivals`].

mod arrival;
mod cancel;
mod cost;
mod destination;
mod error;
mod mapper;
mod pareto;
mod path;
mod request;
mod slack;
mod state;
mod worker;

#[cfg(test)]
mod worker_tests;

pub use arrival::{ArrivalArena, ArrivalId, ArrivalKind, StopArrival};
pub use cancel::Deadline;
pub use cost::{CostCalculator, DefaultCostCalculator};
pub use destination::{DestinationArrival, DestinationArrivals, PathComparator};
pub use error::RaptorError;
pub use mapper::PathBuilder;
pub use pareto::{ParetoComparator, ParetoSet, TiePolicy, pareto_filter};
pub use path::{AccessLeg, EgressLeg, LegPlan, PathLeg, RaptorPath, TransferLeg, TransitLeg};
pub use request::{DEFAULT_MAX_ROUNDS, RaptorProfile, RaptorRequest};
pub use slack::{DefaultSlackProvider, SlackProvider};
pub use state::{Claim, Label, PruneMode, StopArrivalState, StopArrivals};
pub use worker::RaptorWorker;
