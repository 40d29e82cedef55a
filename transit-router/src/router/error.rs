//! Per-request routing errors.

use crate::domain::Time;
use crate::raptor::RaptorError;

/// Error from one branch of a routing request.
///
/// Errors are collected per branch; a failed branch does not stop the
/// others from returning itineraries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    /// Invalid routing request
    #[error("invalid routing request: {0}")]
    InvalidRequest(String),

    #[error("no access to the transit network from the origin")]
    NoAccess,

    #[error("no egress from the transit network to the destination")]
    NoEgress,

    #[error("no transit connection found")]
    NoTransitConnection,

    #[error("no transit connection arriving before {latest_arrival}")]
    NoTransitConnectionInSearchWindow { latest_arrival: Time },

    /// The transfer limit stopped the search
    #[error("no connection within {max_rounds} rounds")]
    SearchExhausted { max_rounds: usize },

    /// Search timed out
    #[error("search took too long")]
    Timeout,

    /// A branch panicked or was cancelled
    #[error("{branch} search failed: {message}")]
    BranchFailed { branch: &'static str, message: String },
}

impl From<RaptorError> for RoutingError {
    fn from(error: RaptorError) -> Self {
        match error {
            RaptorError::InvalidRequest(message) => RoutingError::InvalidRequest(message),
            RaptorError::NoAccess => RoutingError::NoAccess,
            RaptorError::NoEgress => RoutingError::NoEgress,
            RaptorError::NoTransitConnection => RoutingError::NoTransitConnection,
            RaptorError::NoTransitConnectionInSearchWindow { latest_arrival } => {
                RoutingError::NoTransitConnectionInSearchWindow { latest_arrival }
            }
            RaptorError::SearchExhausted { max_rounds } => {
                RoutingError::SearchExhausted { max_rounds }
            }
            RaptorError::Timeout => RoutingError::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raptor_errors_keep_their_meaning() {
        assert_eq!(
            RoutingError::from(RaptorError::SearchExhausted { max_rounds: 2 }),
            RoutingError::SearchExhausted { max_rounds: 2 }
        );
        assert_eq!(RoutingError::from(RaptorError::Timeout), RoutingError::Timeout);
        assert_eq!(
            RoutingError::from(RaptorError::InvalidRequest("bad".into())).to_string(),
            "invalid routing request: bad"
        );
    }

    #[test]
    fn branch_failure_display() {
        let error = RoutingError::BranchFailed {
            branch: "street",
            message: "panicked".into(),
        };
        assert_eq!(error.to_string(), "street search failed: panicked");
    }
}
