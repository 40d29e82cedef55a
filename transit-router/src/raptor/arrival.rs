//! Immutable stop arrivals and the arena that owns them.
//!
//! Every accepted arrival is pushed once and never changed. An arrival
//! points at the arrival it continues from, which always belongs to the
//! same or an earlier round, so following `previous` links ends at an
//! access arrival.

use crate::domain::{AccessEgress, BoardAndAlightTime, StopIndex, Time, Transfer, TransferConstraint};

/// Handle to an arrival in an [`ArrivalArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrivalId(usize);

/// How a stop was reached.
#[derive(Debug, Clone)]
pub enum ArrivalKind<T> {
    /// Reached directly from the origin.
    Access {
        access: AccessEgress,
        departure_time: Time,
    },

    /// Reached by a transit ride.
    Transit {
        previous: ArrivalId,
        ride: BoardAndAlightTime<T>,
        /// Constraint on the transfer that boarded the trip.
        constraint: Option<TransferConstraint>,
    },

    /// Reached by a street transfer.
    Transfer {
        previous: ArrivalId,
        transfer: Transfer,
    },
}

/// An accepted arrival at a stop.
#[derive(Debug, Clone)]
pub struct StopArrival<T> {
    pub stop: StopIndex,
    pub round: usize,
    /// Arrival time, including alight slack after transit.
    pub arrival_time: Time,
    pub kind: ArrivalKind<T>,
}

impl<T> StopArrival<T> {
    pub fn previous(&self) -> Option<ArrivalId> {
        match &self.kind {
            ArrivalKind::Access { .. } => None,
            ArrivalKind::Transit { previous, .. } | ArrivalKind::Transfer { previous, .. } => {
                Some(*previous)
            }
        }
    }

    pub fn is_transit(&self) -> bool {
        matches!(self.kind, ArrivalKind::Transit { .. })
    }

    /// Whether the rider is still on board a vehicle at this arrival.
    pub fn arrived_on_board(&self) -> bool {
        match &self.kind {
            ArrivalKind::Access { access, .. } => access.stop_reached_on_board,
            ArrivalKind::Transit { .. } => true,
            ArrivalKind::Transfer { .. } => false,
        }
    }
}

/// Append-only storage for the arrivals of one request.
#[derive(Debug)]
pub struct ArrivalArena<T> {
    arrivals: Vec<StopArrival<T>>,
}

impl<T> Default for ArrivalArena<T> {
    fn default() -> Self {
        Self {
            arrivals: Vec::new(),
        }
    }
}

impl<T> ArrivalArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, arrival: StopArrival<T>) -> ArrivalId {
        debug_assert!(
            arrival
                .previous()
                .is_none_or(|p| self.arrivals[p.0].round <= arrival.round),
            "an arrival must not continue from a later round"
        );
        self.arrivals.push(arrival);
        ArrivalId(self.arrivals.len() - 1)
    }

    /// # Panics
    ///
    /// Panics if `id` came from another arena.
    pub fn get(&self, id: ArrivalId) -> &StopArrival<T> {
        &self.arrivals[id.0]
    }

    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    /// The id the next pushed arrival will get.
    pub fn next_id(&self) -> ArrivalId {
        ArrivalId(self.arrivals.len())
    }

    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }

    /// Arrivals from `id` back to the access arrival, latest first.
    pub fn chain(&self, id: ArrivalId) -> impl Iterator<Item = &StopArrival<T>> + '_ {
        std::iter::successors(Some(self.get(id)), |arrival| {
            arrival.previous().map(|p| self.get(p))
        })
    }

    /// Whether the chain ending at `id` contains at least one transit ride.
    pub fn has_transit(&self, id: ArrivalId) -> bool {
        self.chain(id).any(StopArrival::is_transit)
    }
}
