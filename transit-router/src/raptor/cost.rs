//! Generalized cost (c1) of transit legs.
//!
//! Costs are integers in centi-seconds, see [`crate::domain::cost_from_seconds`].
//! Access, egress and transfer legs carry their own precomputed cost; the
//! calculator prices boarding, waiting and riding.

use std::fmt;

use crate::domain::{TransferConstraint, cost_from_seconds};

/// Prices the transit part of a path.
pub trait CostCalculator: fmt::Debug + Send + Sync {
    /// Cost of boarding a trip after waiting `wait_secs` at the stop.
    ///
    /// `first_boarding` is true for the first transit leg of a path.
    /// `constraint` is the constraint on the transfer into this trip, if any.
    fn board_cost(
        &self,
        first_boarding: bool,
        wait_secs: i32,
        constraint: Option<&TransferConstraint>,
    ) -> i32;

    /// Cost of `in_vehicle_secs` on board.
    fn transit_cost(&self, in_vehicle_secs: i32) -> i32;

    /// Cost of waiting `wait_secs`, without any boarding cost.
    fn wait_cost(&self, wait_secs: i32) -> i32;
}

/// Linear cost model with fixed boarding and transfer penalties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultCostCalculator {
    /// Penalty for every boarding, in seconds.
    pub board_cost_secs: i32,
    /// Extra penalty for every boarding after the first, in seconds.
    pub transfer_cost_secs: i32,
    pub wait_reluctance: f64,
    pub transit_reluctance: f64,
}

impl DefaultCostCalculator {
    pub fn new(
        board_cost_secs: i32,
        transfer_cost_secs: i32,
        wait_reluctance: f64,
        transit_reluctance: f64,
    ) -> Self {
        Self {
            board_cost_secs,
            transfer_cost_secs,
            wait_reluctance,
            transit_reluctance,
        }
    }
}

impl Default for DefaultCostCalculator {
    fn default() -> Self {
        Self::new(600, 0, 1.0, 1.0)
    }
}

impl CostCalculator for DefaultCostCalculator {
    fn board_cost(
        &self,
        first_boarding: bool,
        wait_secs: i32,
        constraint: Option<&TransferConstraint>,
    ) -> i32 {
        let wait = self.wait_cost(wait_secs);
        match constraint {
            // Staying in the vehicle is not a boarding
            Some(c) if c.stay_seated => wait,
            Some(c) if c.guaranteed => cost_from_seconds(f64::from(self.board_cost_secs)) + wait,
            _ => {
                let mut secs = self.board_cost_secs;
                if !first_boarding {
                    secs += self.transfer_cost_secs;
                }
                cost_from_seconds(f64::from(secs)) + wait
            }
        }
    }

    fn transit_cost(&self, in_vehicle_secs: i32) -> i32 {
        cost_from_seconds(self.transit_reluctance * f64::from(in_vehicle_secs))
    }

    fn wait_cost(&self, wait_secs: i32) -> i32 {
        cost_from_seconds(self.wait_reluctance * f64::from(wait_secs.max(0)))
    }
}
