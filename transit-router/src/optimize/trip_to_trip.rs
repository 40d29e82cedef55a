//! A candidate transfer point between two trips.

use std::fmt;
use std::sync::Arc;

use crate::domain::{StopIndex, StopPosition, Time, Transfer, TransferConstraint, TripSchedule};

/// A trip at one position of its pattern, with the relevant time.
#[derive(Debug, Clone)]
pub struct TripStopTime<T> {
    pub trip: Arc<T>,
    pub pos: StopPosition,
    pub stop: StopIndex,
    pub time: Time,
}

impl<T: TripSchedule> TripStopTime<T> {
    /// The trip arriving at `pos`.
    pub fn arrival(trip: Arc<T>, pos: StopPosition) -> Self {
        let (stop, time) = (trip.stop(pos), trip.arrival(pos));
        Self {
            trip,
            pos,
            stop,
            time,
        }
    }

    /// The trip departing from `pos`.
    pub fn departure(trip: Arc<T>, pos: StopPosition) -> Self {
        let (stop, time) = (trip.stop(pos), trip.departure(pos));
        Self {
            trip,
            pos,
            stop,
            time,
        }
    }
}

/// Alight `from` and board `to`, walking `path_transfer` in between if the
/// stops differ.
#[derive(Debug, Clone)]
pub struct TripToTripTransfer<T> {
    pub from: TripStopTime<T>,
    pub to: TripStopTime<T>,
    pub path_transfer: Option<Transfer>,
    pub constraint: Option<TransferConstraint>,
}

impl<T: TripSchedule> TripToTripTransfer<T> {
    pub fn is_same_stop(&self) -> bool {
        self.path_transfer.is_none()
    }

    pub fn walk_secs(&self) -> i32 {
        self.path_transfer.map_or(0, |t| t.duration_secs)
    }

    /// Time spent waiting at the boarding stop, slack included.
    pub fn wait_secs(&self) -> i32 {
        self.to.time.seconds_since(self.from.time) - self.walk_secs()
    }
}

impl<T: TripSchedule> fmt::Display for TripToTripTransfer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} {} ~ {}@{} {}",
            self.from.trip.id(),
            self.from.stop,
            self.from.time,
            self.to.trip.id(),
            self.to.stop,
            self.to.time
        )?;
        if let Some(transfer) = self.path_transfer {
            write!(f, " (walk {}s)", transfer.duration_secs)?;
        }
        Ok(())
    }
}
