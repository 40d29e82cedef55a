//! A path after transfer optimization, with the costs used to pick it.

use std::fmt;
use std::ops::Deref;

use crate::domain::{TransferConstraint, TripSchedule, format_cost};
use crate::raptor::{PathLeg, RaptorPath};

use super::wait_time::TransferWaitTimeCostCalculator;

#[derive(Debug, Clone)]
pub struct OptimizedPath<T> {
    path: RaptorPath<T>,
    transfer_priority_cost: i32,
    wait_time_optimized_cost: i32,
    break_tie_cost: i32,
}

impl<T: TripSchedule> OptimizedPath<T> {
    pub(crate) fn new(
        path: RaptorPath<T>,
        transfer_priority_cost: i32,
        wait_time_optimized_cost: i32,
        break_tie_cost: i32,
    ) -> Self {
        Self {
            path,
            transfer_priority_cost,
            wait_time_optimized_cost,
            break_tie_cost,
        }
    }

    /// Wrap a path as found by the search, computing the optimization costs
    /// of its own transfers.
    pub fn from_original(path: RaptorPath<T>, wait_time: Option<&TransferWaitTimeCostCalculator>) -> Self {
        let mut transfer_priority_cost = 0;
        let mut break_tie_cost = 0;
        let mut wait_cost = 0;
        let mut ready_at = None;

        for leg in path.legs() {
            match leg {
                PathLeg::Transit(transit) => {
                    if let Some(ready) = ready_at
                        && let Some(calc) = wait_time
                    {
                        wait_cost += calc.cost(transit.from_time().seconds_since(ready));
                    }
                    ready_at = Some(transit.to_time());
                }
                PathLeg::Transfer(transfer) => {
                    ready_at = ready_at.map(|t| t.plus_seconds(transfer.transfer.duration_secs));
                }
                PathLeg::Access(_) | PathLeg::Egress(_) => {}
            }
        }

        let transit: Vec<_> = path.transit_legs().collect();
        if let Some((_, before_last)) = transit.split_last() {
            for leg in before_last {
                transfer_priority_cost += TransferConstraint::cost_of(leg.transfer_after.as_ref());
                break_tie_cost += leg.to_time().seconds();
            }
        }

        let wait_time_optimized_cost = path.c1() + wait_cost;
        Self::new(path, transfer_priority_cost, wait_time_optimized_cost, break_tie_cost)
    }

    pub fn path(&self) -> &RaptorPath<T> {
        &self.path
    }

    pub fn into_path(self) -> RaptorPath<T> {
        self.path
    }

    /// Sum of the transfer priority costs; lower is better.
    pub fn transfer_priority_cost(&self) -> i32 {
        self.transfer_priority_cost
    }

    /// Generalized cost plus the wait-time penalty of every transfer.
    pub fn wait_time_optimized_cost(&self) -> i32 {
        self.wait_time_optimized_cost
    }

    /// Sum of the transfer alight times; lower prefers earlier transfers.
    pub fn break_tie_cost(&self) -> i32 {
        self.break_tie_cost
    }
}

impl<T: TripSchedule> PartialEq for OptimizedPath<T> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.transfer_priority_cost == other.transfer_priority_cost
            && self.wait_time_optimized_cost == other.wait_time_optimized_cost
            && self.break_tie_cost == other.break_tie_cost
    }
}

impl<T> Deref for OptimizedPath<T> {
    type Target = RaptorPath<T>;

    fn deref(&self) -> &Self::Target {
        &self.path
    }
}

impl<T: TripSchedule> fmt::Display for OptimizedPath<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [priority {} wait-time {}]",
            self.path,
            self.transfer_priority_cost,
            format_cost(self.wait_time_optimized_cost)
        )
    }
}
