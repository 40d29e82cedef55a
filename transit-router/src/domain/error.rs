//! Domain error types.
//!
//! These errors represent malformed transit data. They are raised while a
//! network is being assembled and are fatal for that network: a request is
//! never routed over data that failed validation.

use super::{StopIndex, StopPosition, TimeError};

/// Validation failures for transit data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    /// A stop index is not below the number of stops in the network
    #[error("stop {stop} is out of range (network has {number_of_stops} stops)")]
    StopOutOfRange {
        stop: StopIndex,
        number_of_stops: usize,
    },

    /// A pattern was declared without stops
    #[error("pattern {0} has fewer than two stops")]
    EmptyPattern(String),

    /// Board/alight flags or stop times disagree with the pattern length
    #[error("trip {trip} has {actual} stop times, pattern has {expected} stops")]
    LengthMismatch {
        trip: String,
        expected: usize,
        actual: usize,
    },

    /// A trip departs a stop before arriving at it
    #[error("trip {trip} departs before it arrives at position {position:?}")]
    DepartureBeforeArrival { trip: String, position: StopPosition },

    /// A trip arrives at a stop before departing the previous one
    #[error("trip {trip} goes back in time at position {position:?}")]
    DecreasingTimes { trip: String, position: StopPosition },

    /// Two trips of one pattern overtake each other
    #[error("trips {earlier} and {later} overtake each other on pattern {pattern}")]
    OvertakingTrips {
        pattern: String,
        earlier: String,
        later: String,
    },

    /// A reference to a trip or route that does not exist
    #[error("unknown {kind}: {id}")]
    UnknownReference { kind: &'static str, id: String },

    /// A trip id is used twice
    #[error("duplicate trip id: {0}")]
    DuplicateTrip(String),

    /// A time value failed to parse
    #[error(transparent)]
    Time(#[from] TimeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DataError::StopOutOfRange {
            stop: StopIndex(12),
            number_of_stops: 10,
        };
        assert_eq!(
            err.to_string(),
            "stop 12 is out of range (network has 10 stops)"
        );

        let err = DataError::EmptyPattern("L1".into());
        assert_eq!(err.to_string(), "pattern L1 has fewer than two stops");

        let err = DataError::LengthMismatch {
            trip: "T1".into(),
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "trip T1 has 2 stop times, pattern has 3 stops"
        );

        let err = DataError::UnknownReference {
            kind: "trip",
            id: "X9".into(),
        };
        assert_eq!(err.to_string(), "unknown trip: X9");
    }

    #[test]
    fn time_errors_convert() {
        let err: DataError = super::super::Time::parse("99:00").unwrap_err().into();
        assert!(matches!(err, DataError::Time(_)));
    }
}
