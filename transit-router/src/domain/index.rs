//! Dense indices into the transit network.
//!
//! Stops and routes are addressed by their position in the network's
//! tables. A `StopPosition` is different from a `StopIndex`: it is the
//! position within one pattern's stop sequence, which disambiguates
//! patterns that visit the same stop more than once.

use std::fmt;

/// Index of a stop in the network, `0..number_of_stops`.
///
/// # Examples
///
/// ```
/// use transit_router::domain::StopIndex;
///
/// let stop = StopIndex(3);
/// assert_eq!(usize::from(stop), 3);
/// assert_eq!(stop.to_string(), "3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopIndex(pub usize);

/// Position of a stop within a pattern's stop sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopPosition(pub usize);

impl StopPosition {
    /// Returns the next position.
    pub fn next(self) -> Self {
        StopPosition(self.0 + 1)
    }

    /// Returns the previous position, if any.
    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(StopPosition)
    }
}

/// Index of a route (one pattern plus its timetable) in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteIndex(pub usize);

macro_rules! index_conversions {
    ($($name:ident),*) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<usize> for $name {
                fn from(value: usize) -> Self {
                    $name(value)
                }
            }

            impl From<$name> for usize {
                fn from(value: $name) -> Self {
                    value.0
                }
            }
        )*
    };
}

index_conversions!(StopIndex, StopPosition, RouteIndex);
