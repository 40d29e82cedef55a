//! Search request for one transit search.

use crate::domain::{AccessEgress, Time};

use super::cancel::Deadline;
use super::error::RaptorError;

/// Default number of rounds, i.e. boardings.
pub const DEFAULT_MAX_ROUNDS: usize = 6;

/// Criteria and pruning used by the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RaptorProfile {
    /// Arrival time and number of transfers. Stop arrivals are pruned
    /// against the best time seen in any round.
    #[default]
    Standard,

    /// Adds travel duration, and optionally generalized cost, to the
    /// destination criteria. Stop arrivals are only pruned within a round,
    /// so a later round may keep an arrival an earlier round already beat.
    MultiCriteria { generalized_cost: bool },
}

impl RaptorProfile {
    pub fn is_multi_criteria(&self) -> bool {
        matches!(self, RaptorProfile::MultiCriteria { .. })
    }

    pub fn includes_generalized_cost(&self) -> bool {
        matches!(
            self,
            RaptorProfile::MultiCriteria {
                generalized_cost: true
            }
        )
    }
}

/// Request for a Range-RAPTOR search.
#[derive(Debug, Clone)]
pub struct RaptorRequest {
    /// Start of the departure window.
    pub earliest_departure: Time,

    /// Destination arrivals after this time are discarded.
    pub latest_arrival: Option<Time>,

    /// Length of the departure window; zero runs a single iteration.
    pub search_window_secs: i32,

    /// Distance between iteration departure times.
    pub iteration_step_secs: i32,

    /// Prefer later departures over earlier ones with equal arrival.
    pub arrive_by: bool,

    /// Maximum number of boardings.
    pub max_rounds: usize,

    pub access: Vec<AccessEgress>,
    pub egress: Vec<AccessEgress>,
    pub profile: RaptorProfile,
    pub deadline: Option<Deadline>,
}

impl RaptorRequest {
    /// A depart-after request with a single iteration and default limits.
    pub fn new(earliest_departure: Time, access: Vec<AccessEgress>, egress: Vec<AccessEgress>) -> Self {
        Self {
            earliest_departure,
            latest_arrival: None,
            search_window_secs: 0,
            iteration_step_secs: 60,
            arrive_by: false,
            max_rounds: DEFAULT_MAX_ROUNDS,
            access,
            egress,
            profile: RaptorProfile::Standard,
            deadline: None,
        }
    }

    pub fn with_search_window(mut self, search_window_secs: i32) -> Self {
        self.search_window_secs = search_window_secs;
        self
    }

    pub fn with_iteration_step(mut self, iteration_step_secs: i32) -> Self {
        self.iteration_step_secs = iteration_step_secs;
        self
    }

    pub fn with_latest_arrival(mut self, latest_arrival: Time) -> Self {
        self.latest_arrival = Some(latest_arrival);
        self
    }

    /// Arrive by `latest_arrival`, departing no earlier than
    /// `search_window_secs` before it.
    pub fn arrive_by(mut self, latest_arrival: Time) -> Self {
        self.arrive_by = true;
        self.latest_arrival = Some(latest_arrival);
        self.earliest_departure = latest_arrival.minus_seconds(self.search_window_secs);
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_profile(mut self, profile: RaptorProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Validate the request.
    pub fn validate(&self) -> Result<(), RaptorError> {
        if self.access.is_empty() {
            return Err(RaptorError::NoAccess);
        }
        if self.egress.is_empty() {
            return Err(RaptorError::NoEgress);
        }
        if self.search_window_secs < 0 {
            return Err(RaptorError::InvalidRequest(
                "search window must not be negative".to_string(),
            ));
        }
        if self.iteration_step_secs <= 0 {
            return Err(RaptorError::InvalidRequest(
                "iteration step must be positive".to_string(),
            ));
        }
        if self.max_rounds == 0 {
            return Err(RaptorError::InvalidRequest(
                "at least one round is required".to_string(),
            ));
        }
        if self.arrive_by && self.latest_arrival.is_none() {
            return Err(RaptorError::InvalidRequest(
                "arrive-by search needs a latest arrival time".to_string(),
            ));
        }
        if let Some(latest) = self.latest_arrival
            && latest < self.earliest_departure
        {
            return Err(RaptorError::InvalidRequest(
                "latest arrival is before earliest departure".to_string(),
            ));
        }
        if self
            .access
            .iter()
            .chain(&self.egress)
            .any(|leg| leg.duration_secs < 0)
        {
            return Err(RaptorError::InvalidRequest(
                "access and egress durations must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Iteration departure times, latest first.
    ///
    /// The window end is included; the window start is always the last
    /// iteration even if the step does not divide the window.
    pub fn iteration_departure_times(&self) -> Vec<Time> {
        let step = self.iteration_step_secs.max(1);
        let mut times: Vec<Time> = (0..=self.search_window_secs.max(0))
            .rev()
            .step_by(step as usize)
            .map(|offset| self.earliest_departure.plus_seconds(offset))
            .collect();
        if times.last() != Some(&self.earliest_departure) {
            times.push(self.earliest_departure);
        }
        times
    }

    /// Highest number of rides on any access leg.
    pub fn max_access_rides(&self) -> usize {
        self.access.iter().map(AccessEgress::rounds).max().unwrap_or(0)
    }

    /// Whether departure time is a criterion when comparing paths.
    pub fn compares_departure_time(&self) -> bool {
        self.arrive_by || self.search_window_secs > 0
    }
}
