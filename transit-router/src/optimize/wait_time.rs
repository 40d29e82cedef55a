//! Cost of short transfers.
//!
//! Two paths riding the same trips cost the same, but a path with a 2 minute
//! transfer is easier to miss than one with 10 minutes. The wait-time cost
//! adds a penalty that falls as the transfer wait grows:
//!
//! ```text
//! f(t) = n·t0 / (1 + (n − 1)·t / t0)
//! ```
//!
//! where `t0` is the minimum safe transfer time and `n` the penalty factor at
//! zero wait. `f(0) = n·t0` and `f(t0) = t0`.

use crate::domain::cost_from_seconds;

/// Share of the path's time in transit used as the minimum safe transfer time.
const MIN_SAFE_TRANSFER_TIME_FACTOR: f64 = 0.0667;

pub const DEFAULT_MIN_SAFE_WAIT_TIME_FACTOR: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferWaitTimeCostCalculator {
    min_safe_wait_time_factor: f64,
    min_safe_transfer_time_secs: i32,
}

impl Default for TransferWaitTimeCostCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SAFE_WAIT_TIME_FACTOR)
    }
}

impl TransferWaitTimeCostCalculator {
    pub fn new(min_safe_wait_time_factor: f64) -> Self {
        Self {
            min_safe_wait_time_factor: min_safe_wait_time_factor.max(1.0),
            min_safe_transfer_time_secs: 1,
        }
    }

    /// Set the minimum safe transfer time from the total time in transit.
    pub fn for_transit_time(mut self, transit_secs: i32) -> Self {
        let t0 = (f64::from(transit_secs) * MIN_SAFE_TRANSFER_TIME_FACTOR).round() as i32;
        self.min_safe_transfer_time_secs = t0.max(1);
        self
    }

    pub fn min_safe_transfer_time_secs(&self) -> i32 {
        self.min_safe_transfer_time_secs
    }

    /// Cost of waiting `wait_secs` at a transfer.
    pub fn cost(&self, wait_secs: i32) -> i32 {
        let n = self.min_safe_wait_time_factor;
        let t0 = f64::from(self.min_safe_transfer_time_secs);
        let t = f64::from(wait_secs.max(0));
        cost_from_seconds(n * t0 / (1.0 + (n - 1.0) * t / t0))
    }
}
