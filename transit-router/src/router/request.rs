//! A routing request as seen by every branch.

use crate::domain::{AccessEgress, StopIndex, Time};
use crate::raptor::{Deadline, RaptorRequest};

use super::config::RouterConfig;

/// What a rider asked for.
///
/// Access and egress legs have already been resolved to stops by the
/// caller. Unset limits fall back to the [`RouterConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub access: Vec<AccessEgress>,
    pub egress: Vec<AccessEgress>,

    /// Departure time, or the latest arrival time when `arrive_by` is set.
    pub time: Time,
    pub arrive_by: bool,

    pub search_window_mins: Option<i64>,
    pub max_transfers: Option<usize>,
}

impl RouteRequest {
    pub fn new(access: Vec<AccessEgress>, egress: Vec<AccessEgress>, time: Time) -> Self {
        Self {
            access,
            egress,
            time,
            arrive_by: false,
            search_window_mins: None,
            max_transfers: None,
        }
    }

    /// Depart from `from` and arrive at `to`, with no walking at either end.
    pub fn between_stops(from: StopIndex, to: StopIndex, time: Time) -> Self {
        Self::new(
            vec![AccessEgress::walk(from, 0, 0)],
            vec![AccessEgress::walk(to, 0, 0)],
            time,
        )
    }

    /// Treat `time` as the latest arrival.
    pub fn arrive_by(mut self) -> Self {
        self.arrive_by = true;
        self
    }

    pub fn with_search_window(mut self, minutes: i64) -> Self {
        self.search_window_mins = Some(minutes);
        self
    }

    pub fn with_max_transfers(mut self, max_transfers: usize) -> Self {
        self.max_transfers = Some(max_transfers);
        self
    }

    /// Number of rounds allowed for this request.
    pub fn max_rounds(&self, config: &RouterConfig) -> usize {
        self.max_transfers
            .map_or_else(|| config.max_rounds(), |transfers| transfers + 1)
    }

    /// The transit search for this request.
    ///
    /// An arrive-by request searches the window ending at `time`, keeping
    /// only paths that arrive by then.
    pub fn to_raptor_request(&self, config: &RouterConfig, deadline: Deadline) -> RaptorRequest {
        let window_mins = self.search_window_mins.unwrap_or(config.search_window_mins);
        let request = RaptorRequest::new(self.time, self.access.clone(), self.egress.clone())
            .with_search_window(to_secs(window_mins.saturating_mul(60)))
            .with_iteration_step(to_secs(config.iteration_step_secs))
            .with_max_rounds(self.max_rounds(config))
            .with_profile(config.profile())
            .with_deadline(deadline);

        if self.arrive_by {
            request.arrive_by(self.time)
        } else {
            request
        }
    }
}

/// Negative values pass through so the search can reject them.
fn to_secs(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
