//! Board, alight and transfer slack.

use std::fmt;

/// Minimum margins applied around boarding, alighting and transfers.
///
/// All values are in seconds. Slack is injected per request so different
/// modes or user profiles can use different margins.
pub trait SlackProvider: fmt::Debug + Send + Sync {
    /// Time required between arriving at a stop and the vehicle departing.
    fn board_slack(&self) -> i32;

    /// Time between the vehicle arriving and the rider being ready to move on.
    fn alight_slack(&self) -> i32;

    /// Extra margin for a transfer between two trips.
    fn transfer_slack(&self) -> i32;
}

/// Fixed slack values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultSlackProvider {
    pub board_slack_secs: i32,
    pub alight_slack_secs: i32,
    pub transfer_slack_secs: i32,
}

impl DefaultSlackProvider {
    pub fn new(board_slack_secs: i32, alight_slack_secs: i32, transfer_slack_secs: i32) -> Self {
        Self {
            board_slack_secs,
            alight_slack_secs,
            transfer_slack_secs,
        }
    }

    /// No slack at all; mostly useful in tests.
    pub fn zero() -> Self {
        Self::new(0, 0, 0)
    }
}

impl Default for DefaultSlackProvider {
    fn default() -> Self {
        Self::new(0, 0, 60)
    }
}

impl SlackProvider for DefaultSlackProvider {
    fn board_slack(&self) -> i32 {
        self.board_slack_secs
    }

    fn alight_slack(&self) -> i32 {
        self.alight_slack_secs
    }

    fn transfer_slack(&self) -> i32 {
        self.transfer_slack_secs
    }
}
