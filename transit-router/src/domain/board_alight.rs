//! A ride on one trip between two positions.

use std::sync::Arc;

use super::{StopIndex, StopPosition, Time, TripSchedule};

/// Trip plus board and alight positions.
///
/// Times are always read back from the trip schedule, so a value can never
/// disagree with the timetable it came from.
///
/// # Invariants
///
/// `board_pos < alight_pos`
#[derive(Debug, Clone)]
pub struct BoardAndAlightTime<T> {
    trip: Arc<T>,
    board_pos: StopPosition,
    alight_pos: StopPosition,
}

impl<T: TripSchedule> BoardAndAlightTime<T> {
    /// Create a ride between two positions.
    ///
    /// Returns `None` if the alight position is not after the board position
    /// or outside the pattern.
    pub fn new(trip: Arc<T>, board_pos: StopPosition, alight_pos: StopPosition) -> Option<Self> {
        if board_pos >= alight_pos || alight_pos.0 >= trip.pattern().number_of_stops() {
            return None;
        }
        Some(Self {
            trip,
            board_pos,
            alight_pos,
        })
    }

    /// Locate a ride from stop/time pairs.
    ///
    /// The alight position is searched after the board position so looping
    /// patterns resolve to the visit actually ridden.
    pub fn from_stop_times(
        trip: Arc<T>,
        board_stop: StopIndex,
        board_time: Time,
        alight_stop: StopIndex,
        alight_time: Time,
    ) -> Option<Self> {
        let board_pos = trip.find_departure_stop_position(board_time, board_stop)?;
        let alight_pos = trip
            .pattern()
            .positions()
            .skip(board_pos.0 + 1)
            .find(|&pos| trip.stop(pos) == alight_stop && trip.arrival(pos) == alight_time)?;
        Self::new(trip, board_pos, alight_pos)
    }

    pub fn trip(&self) -> &Arc<T> {
        &self.trip
    }

    pub fn board_pos(&self) -> StopPosition {
        self.board_pos
    }

    pub fn alight_pos(&self) -> StopPosition {
        self.alight_pos
    }

    pub fn board_stop(&self) -> StopIndex {
        self.trip.stop(self.board_pos)
    }

    pub fn alight_stop(&self) -> StopIndex {
        self.trip.stop(self.alight_pos)
    }

    pub fn board_time(&self) -> Time {
        self.trip.departure(self.board_pos)
    }

    pub fn alight_time(&self) -> Time {
        self.trip.arrival(self.alight_pos)
    }

    /// In-vehicle time in seconds.
    pub fn ride_secs(&self) -> i32 {
        self.alight_time().seconds_since(self.board_time())
    }
}
