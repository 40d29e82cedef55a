//! Path tails built backward from the destination.
//!
//! A tail starts with a transit leg (the head) and runs to the egress. The
//! optimizer grows tails toward the origin by prepending a transit leg and a
//! transfer, and finally the access leg. Each extension clones the tail it
//! branches from; the clone is then extended in place.

use crate::domain::{BoardAndAlightTime, StopPosition, Time, TransferConstraint, TripSchedule};
use crate::raptor::{LegPlan, PathBuilder, TransitLeg};

use super::optimized::OptimizedPath;
use super::trip_to_trip::TripToTripTransfer;
use super::wait_time::TransferWaitTimeCostCalculator;

#[derive(Debug, Clone)]
pub struct OptimizedPathTail<T> {
    builder: PathBuilder,
    wait_time: Option<TransferWaitTimeCostCalculator>,
    iteration_departure_time: Time,
    legs: Vec<LegPlan<T>>,
    transfer_priority_cost: i32,
    wait_time_cost: i32,
    break_tie_cost: i32,
    c2: Option<i32>,
}

impl<T: TripSchedule> OptimizedPathTail<T> {
    /// A tail made of `legs`, which must start with a transit leg.
    pub fn new(
        builder: PathBuilder,
        wait_time: Option<TransferWaitTimeCostCalculator>,
        iteration_departure_time: Time,
        legs: Vec<LegPlan<T>>,
    ) -> Self {
        debug_assert!(matches!(legs.first(), Some(LegPlan::Transit { .. })));
        Self {
            builder,
            wait_time,
            iteration_departure_time,
            legs,
            transfer_priority_cost: 0,
            wait_time_cost: 0,
            break_tie_cost: 0,
            c2: None,
        }
    }

    pub fn legs(&self) -> &[LegPlan<T>] {
        &self.legs
    }

    /// The first transit leg of the tail.
    pub fn head(&self) -> Option<&BoardAndAlightTime<T>> {
        self.legs.iter().find_map(|leg| match leg {
            LegPlan::Transit { ride, .. } => Some(ride),
            _ => None,
        })
    }

    /// Whether the head trip can be boarded at `pos` and still reach its
    /// alight position.
    pub fn can_board_head_at(&self, pos: StopPosition) -> bool {
        self.head().is_some_and(|head| pos < head.alight_pos())
    }

    /// Prepend `leg`, alighting at the transfer's from-position, and the walk
    /// of `tx` if any. The current head is moved to board at the transfer's
    /// to-position.
    ///
    /// The new leg boards provisionally at the first position of its trip.
    /// Its real boarding is set by the next leg or the access prepended
    /// before it.
    ///
    /// Returns `None` if either ride would be empty.
    pub fn add_transit_and_transfer_leg(
        mut self,
        leg: &TransitLeg<T>,
        tx: &TripToTripTransfer<T>,
    ) -> Option<Self> {
        board_head_at(&mut self.legs, tx.to.pos)?;
        let ride = BoardAndAlightTime::new(leg.ride.trip().clone(), StopPosition(0), tx.from.pos)?;

        if let Some(walk) = tx.path_transfer {
            self.legs.insert(0, LegPlan::Transfer(walk));
        }
        self.legs.insert(
            0,
            LegPlan::Transit {
                ride,
                transfer_after: tx.constraint,
            },
        );

        self.transfer_priority_cost += TransferConstraint::cost_of(tx.constraint.as_ref());
        self.break_tie_cost += tx.from.time.seconds();
        if let Some(calc) = &self.wait_time {
            self.wait_time_cost += calc.cost(tx.wait_secs());
        }
        Some(self)
    }

    /// Board the head at its original position and prepend the legs before
    /// the first transit leg of the original path.
    pub fn insert_access(mut self, board_pos: StopPosition, prefix: &[LegPlan<T>]) -> Option<Self> {
        board_head_at(&mut self.legs, board_pos)?;
        for leg in prefix.iter().rev() {
            self.legs.insert(0, leg.clone());
        }
        Some(self)
    }

    /// Generalized cost with the head boarded at `pos`.
    ///
    /// The wait before the head is measured from the iteration departure
    /// time, so tails sharing a head trip compare fairly at any position.
    pub fn generalized_cost_at(&self, pos: StopPosition) -> i32 {
        let mut legs = self.legs.clone();
        let plans = match board_head_at(&mut legs, pos) {
            Some(()) => &legs,
            None => &self.legs,
        };
        self.builder.tail_cost(plans, self.iteration_departure_time)
    }

    /// [`Self::generalized_cost_at`] plus the wait-time penalty of every
    /// transfer, or just the generalized cost when wait-time optimization is
    /// off.
    pub fn wait_time_optimized_cost_at(&self, pos: StopPosition) -> i32 {
        self.generalized_cost_at(pos) + self.wait_time_cost
    }

    pub fn transfer_priority_cost(&self) -> i32 {
        self.transfer_priority_cost
    }

    pub fn break_tie_cost(&self) -> i32 {
        self.break_tie_cost
    }

    /// Second criterion assigned by a tail filter, if any.
    pub fn c2(&self) -> Option<i32> {
        self.c2
    }

    pub fn set_c2(&mut self, c2: i32) {
        self.c2 = Some(c2);
    }

    /// Time and cost the legs into a complete path. The path keeps the
    /// assigned c2, or `fallback_c2` when no filter assigned one.
    pub fn build(self, fallback_c2: Option<i32>) -> OptimizedPath<T> {
        let c2 = self.c2.or(fallback_c2);
        let path = self
            .builder
            .build(self.legs, self.iteration_departure_time, c2);
        let wait_time_optimized_cost = path.c1() + self.wait_time_cost;
        OptimizedPath::new(
            path,
            self.transfer_priority_cost,
            wait_time_optimized_cost,
            self.break_tie_cost,
        )
    }
}

/// Move the boarding of the first transit leg to `pos`.
fn board_head_at<T: TripSchedule>(legs: &mut [LegPlan<T>], pos: StopPosition) -> Option<()> {
    let ride = legs.iter_mut().find_map(|leg| match leg {
        LegPlan::Transit { ride, .. } => Some(ride),
        _ => None,
    })?;
    *ride = BoardAndAlightTime::new(ride.trip().clone(), pos, ride.alight_pos())?;
    Some(())
}
