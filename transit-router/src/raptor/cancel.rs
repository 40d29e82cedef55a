//! Cooperative cancellation.

use std::time::{Duration, Instant};

/// Point in time after which a search gives up.
///
/// The worker polls the deadline between iterations, never in the middle of
/// a round, so an expired deadline is noticed within one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    /// Deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.0
    }
}
