//! Walking transfers, access/egress legs and transfer constraints.

use super::{StopIndex, Time};

/// A street transfer between two stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transfer {
    pub from_stop: StopIndex,
    pub to_stop: StopIndex,
    /// Walking time in seconds.
    pub duration_secs: i32,
    /// Generalized cost of the walk, in cost units.
    pub c1: i32,
}

impl Transfer {
    pub fn new(from_stop: StopIndex, to_stop: StopIndex, duration_secs: i32, c1: i32) -> Self {
        Self {
            from_stop,
            to_stop,
            duration_secs,
            c1,
        }
    }
}

/// A leg connecting the origin to a stop (access) or a stop to the
/// destination (egress).
///
/// Walking legs have no rides. Flexible (on-demand) legs carry the number
/// of rides they contain, and may end on board a vehicle, in which case the
/// rider can transfer or egress on foot as if alighting from transit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessEgress {
    pub stop: StopIndex,
    pub duration_secs: i32,
    pub c1: i32,
    pub num_rides: usize,
    pub stop_reached_on_board: bool,
}

impl AccessEgress {
    /// A walking leg with no rides.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_router::domain::{AccessEgress, StopIndex};
    ///
    /// let walk = AccessEgress::walk(StopIndex(2), 180, 360);
    /// assert!(!walk.has_rides());
    /// assert_eq!(walk.rounds(), 0);
    /// ```
    pub fn walk(stop: StopIndex, duration_secs: i32, c1: i32) -> Self {
        Self {
            stop,
            duration_secs,
            c1,
            num_rides: 0,
            stop_reached_on_board: false,
        }
    }

    /// A flexible leg with at least one ride.
    pub fn flex(
        stop: StopIndex,
        duration_secs: i32,
        c1: i32,
        num_rides: usize,
        stop_reached_on_board: bool,
    ) -> Self {
        Self {
            stop,
            duration_secs,
            c1,
            num_rides: num_rides.max(1),
            stop_reached_on_board,
        }
    }

    pub fn has_rides(&self) -> bool {
        self.num_rides > 0
    }

    /// Round in which an access leg becomes available, or the number of
    /// extra rounds an egress leg consumes.
    pub fn rounds(&self) -> usize {
        self.num_rides
    }

    /// Arrival time when starting the leg at `departure`.
    pub fn arrival_time(&self, departure: Time) -> Time {
        departure.plus_seconds(self.duration_secs)
    }
}

/// Priority of a constrained transfer.
///
/// `NotAllowed` forbids the transfer outright. The remaining levels rank
/// otherwise equal transfers during transfer optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransferPriority {
    NotAllowed,
    Allowed,
    Recommended,
    Preferred,
}

/// Constraint attached to a specific trip-to-trip transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferConstraint {
    pub priority: TransferPriority,
    /// The rider stays in the vehicle; no slack applies.
    pub stay_seated: bool,
    /// The departing trip waits for the feeder; no slack applies.
    pub guaranteed: bool,
}

/// Cost of a regular transfer with no constraint.
const ALLOWED_COST: i32 = 40;
const RECOMMENDED_COST: i32 = 30;
const PREFERRED_COST: i32 = 20;
const GUARANTEED_COST: i32 = 10;
const STAY_SEATED_COST: i32 = 0;
const NOT_ALLOWED_COST: i32 = 1000;

impl TransferConstraint {
    pub const NOT_ALLOWED: TransferConstraint = TransferConstraint {
        priority: TransferPriority::NotAllowed,
        stay_seated: false,
        guaranteed: false,
    };

    /// A constraint with the given priority and no facilitation.
    pub fn with_priority(priority: TransferPriority) -> Self {
        Self {
            priority,
            stay_seated: false,
            guaranteed: false,
        }
    }

    pub fn stay_seated() -> Self {
        Self {
            priority: TransferPriority::Allowed,
            stay_seated: true,
            guaranteed: false,
        }
    }

    pub fn guaranteed() -> Self {
        Self {
            priority: TransferPriority::Allowed,
            stay_seated: false,
            guaranteed: true,
        }
    }

    pub fn is_not_allowed(&self) -> bool {
        self.priority == TransferPriority::NotAllowed
    }

    /// Stay-seated and guaranteed transfers are not subject to slack.
    pub fn is_facilitated(&self) -> bool {
        self.stay_seated || self.guaranteed
    }

    /// Transfer priority cost; lower is better.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_router::domain::{TransferConstraint, TransferPriority};
    ///
    /// let seated = TransferConstraint::stay_seated().cost();
    /// let preferred = TransferConstraint::with_priority(TransferPriority::Preferred).cost();
    /// assert!(seated < preferred);
    /// assert!(preferred < TransferConstraint::regular_cost());
    /// ```
    pub fn cost(&self) -> i32 {
        if self.is_not_allowed() {
            return NOT_ALLOWED_COST;
        }
        if self.stay_seated {
            return STAY_SEATED_COST;
        }
        if self.guaranteed {
            return GUARANTEED_COST;
        }
        match self.priority {
            TransferPriority::Preferred => PREFERRED_COST,
            TransferPriority::Recommended => RECOMMENDED_COST,
            TransferPriority::Allowed => ALLOWED_COST,
            TransferPriority::NotAllowed => NOT_ALLOWED_COST,
        }
    }

    /// Priority cost of a transfer without any constraint.
    pub fn regular_cost() -> i32 {
        ALLOWED_COST
    }

    /// Priority cost of an optional constraint.
    pub fn cost_of(constraint: Option<&TransferConstraint>) -> i32 {
        constraint.map_or(ALLOWED_COST, TransferConstraint::cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flex_has_at_least_one_ride() {
        let flex = AccessEgress::flex(StopIndex(1), 600, 900, 0, true);
        assert_eq!(flex.num_rides, 1);
        assert!(flex.has_rides());
        assert!(flex.stop_reached_on_board);
    }

    #[test]
    fn arrival_time_adds_duration() {
        let walk = AccessEgress::walk(StopIndex(0), 195, 390);
        assert_eq!(
            walk.arrival_time(Time::hms(10, 0, 0)),
            Time::hms(10, 3, 15)
        );
    }

    #[test]
    fn priority_costs_are_ordered() {
        let costs = [
            TransferConstraint::stay_seated().cost(),
            TransferConstraint::guaranteed().cost(),
            TransferConstraint::with_priority(TransferPriority::Preferred).cost(),
            TransferConstraint::with_priority(TransferPriority::Recommended).cost(),
            TransferConstraint::cost_of(None),
            TransferConstraint::NOT_ALLOWED.cost(),
        ];
        assert!(costs.windows(2).all(|w| w[0] < w[1]), "{costs:?}");
    }

    #[test]
    fn facilitated_transfers() {
        assert!(TransferConstraint::stay_seated().is_facilitated());
        assert!(TransferConstraint::guaranteed().is_facilitated());
        assert!(!TransferConstraint::with_priority(TransferPriority::Preferred).is_facilitated());
        assert!(TransferConstraint::NOT_ALLOWED.is_not_allowed());
    }
}
