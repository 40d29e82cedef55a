//! Routing configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::optimize::TransferWaitTimeCostCalculator;
use crate::raptor::{DefaultCostCalculator, DefaultSlackProvider, RaptorProfile};

/// Defaults applied to every routing request.
///
/// Missing fields in a config file take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Maximum number of transfers; a search runs one more round than this.
    pub max_transfers: usize,

    /// Maximum number of itineraries to return.
    pub max_results: usize,

    /// Width of the departure window searched (minutes).
    pub search_window_mins: i64,

    /// Step between Range-RAPTOR iterations (seconds).
    pub iteration_step_secs: i64,

    /// Time from arriving at a stop to being ready to board (seconds).
    pub board_slack_secs: i64,

    /// Time from the vehicle arriving to being off it (seconds).
    pub alight_slack_secs: i64,

    /// Extra time required by every transfer (seconds).
    pub transfer_slack_secs: i64,

    /// Penalty for every boarding (seconds).
    pub board_cost_secs: i64,

    /// Extra penalty for boardings after the first (seconds).
    pub transfer_cost_secs: i64,

    pub wait_reluctance: f64,
    pub transit_reluctance: f64,

    /// Compare paths on duration too, keeping round-local arrivals.
    pub multi_criteria: bool,

    /// With `multi_criteria`, also compare generalized cost.
    pub generalized_cost: bool,

    /// Re-choose transfer points of every transit path.
    pub optimize_transfers: bool,

    /// Prefer longer waits at transfers when optimizing.
    pub optimize_wait_time: bool,

    /// Wait-time penalty factor at zero wait.
    pub min_safe_wait_time_factor: f64,

    /// Time allowed for each branch of a request (milliseconds).
    pub timeout_ms: i64,
}

impl RouterConfig {
    /// Returns the search window as a Duration.
    pub fn search_window(&self) -> Duration {
        Duration::minutes(self.search_window_mins)
    }

    /// Returns the iteration step as a Duration.
    pub fn iteration_step(&self) -> Duration {
        Duration::seconds(self.iteration_step_secs)
    }

    /// Returns the per-branch timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::milliseconds(self.timeout_ms)
    }

    /// Number of rounds needed for `max_transfers` transfers.
    pub fn max_rounds(&self) -> usize {
        self.max_transfers + 1
    }

    pub fn profile(&self) -> RaptorProfile {
        if self.multi_criteria {
            RaptorProfile::MultiCriteria {
                generalized_cost: self.generalized_cost,
            }
        } else {
            RaptorProfile::Standard
        }
    }

    pub fn slack_provider(&self) -> DefaultSlackProvider {
        DefaultSlackProvider::new(
            secs(self.board_slack_secs),
            secs(self.alight_slack_secs),
            secs(self.transfer_slack_secs),
        )
    }

    pub fn cost_calculator(&self) -> DefaultCostCalculator {
        DefaultCostCalculator::new(
            secs(self.board_cost_secs),
            secs(self.transfer_cost_secs),
            self.wait_reluctance,
            self.transit_reluctance,
        )
    }

    /// The wait-time calculator, if wait-time optimization is on.
    pub fn wait_time_calculator(&self) -> Option<TransferWaitTimeCostCalculator> {
        self.optimize_wait_time
            .then(|| TransferWaitTimeCostCalculator::new(self.min_safe_wait_time_factor))
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_transfers: 5,
            max_results: 10,
            search_window_mins: 60,
            iteration_step_secs: 60,
            board_slack_secs: 0,
            alight_slack_secs: 0,
            transfer_slack_secs: 120,
            board_cost_secs: 600,
            transfer_cost_secs: 0,
            wait_reluctance: 1.0,
            transit_reluctance: 1.0,
            multi_criteria: false,
            generalized_cost: false,
            optimize_transfers: true,
            optimize_wait_time: true,
            min_safe_wait_time_factor: 5.0,
            timeout_ms: 10_000,
        }
    }
}

/// Clamp a configured number of seconds into the engine's range.
fn secs(value: i64) -> i32 {
    value.clamp(0, i64::from(i32::MAX)) as i32
}
