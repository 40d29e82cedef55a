//! Domain types for the transit router.
//!
//! This module contains the core model types that represent validated
//! transit data. All types enforce their invariants at construction time,
//! so code that receives these types can trust their validity.

mod board_alight;
mod cost;
mod error;
mod index;
mod time;
mod transfer;
mod trip;

pub use board_alight::BoardAndAlightTime;
pub use cost::{cost_from_seconds, format_cost};
pub use error::DataError;
pub use index::{RouteIndex, StopIndex, StopPosition};
pub use time::{Time, TimeError, format_duration};
pub use transfer::{AccessEgress, Transfer, TransferConstraint, TransferPriority};
pub use trip::{Pattern, Trip, TripSchedule};
