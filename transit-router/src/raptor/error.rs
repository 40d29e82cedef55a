//! Search errors.

use crate::domain::Time;

/// Error from a single transit search.
///
/// None of these are retried; the router reports them alongside results
/// from other branches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RaptorError {
    /// The request is inconsistent
    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    /// No access leg reaches the network
    #[error("no access to the transit network from the origin")]
    NoAccess,

    /// No egress leg reaches the destination
    #[error("no egress from the transit network to the destination")]
    NoEgress,

    /// The search ran to completion without reaching the destination
    #[error("no transit connection found")]
    NoTransitConnection,

    /// Connections exist, but none arrive within the requested time
    #[error("no transit connection arriving before {latest_arrival}")]
    NoTransitConnectionInSearchWindow { latest_arrival: Time },

    /// The round limit stopped the search before it reached the destination
    #[error("no connection within {max_rounds} rounds")]
    SearchExhausted { max_rounds: usize },

    /// The deadline expired
    #[error("search took too long")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            RaptorError::SearchExhausted { max_rounds: 2 }.to_string(),
            "no connection within 2 rounds"
        );
        assert_eq!(RaptorError::Timeout.to_string(), "search took too long");
        assert_eq!(
            RaptorError::NoTransitConnectionInSearchWindow {
                latest_arrival: Time::hms(9, 30, 0)
            }
            .to_string(),
            "no transit connection arriving before 09:30"
        );
    }
}
