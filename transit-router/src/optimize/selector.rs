//! Selecting the best tails for each boarding position of a trip.

use crate::domain::{StopPosition, TripSchedule};

use super::filter::PathTailFilter;
use super::tail::OptimizedPathTail;

/// Hands out the best tails boardable at a position, for positions visited
/// from the end of the trip toward its start.
///
/// A tail becomes a candidate once the position is before its head's alight
/// position. Candidates never leave again, so each call sees the tails of
/// every later call plus the ones newly in reach.
pub struct TransitPathLegSelector<'f, T> {
    filter: &'f dyn PathTailFilter<OptimizedPathTail<T>>,
    remaining: Vec<OptimizedPathTail<T>>,
    selection: Vec<OptimizedPathTail<T>>,
    last_position: Option<StopPosition>,
}

impl<'f, T: TripSchedule> TransitPathLegSelector<'f, T> {
    pub fn new(
        filter: &'f dyn PathTailFilter<OptimizedPathTail<T>>,
        tails: Vec<OptimizedPathTail<T>>,
    ) -> Self {
        Self {
            filter,
            remaining: tails,
            selection: Vec::new(),
            last_position: None,
        }
    }

    /// Best tails when the head trip is boarded at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is after the position of the previous call.
    pub fn next(&mut self, pos: StopPosition) -> &[OptimizedPathTail<T>] {
        if let Some(last) = self.last_position {
            assert!(
                pos <= last,
                "Stop position {} requested after {}; positions must not increase",
                pos.0,
                last.0
            );
        }
        self.last_position = Some(pos);

        let (candidates, remaining): (Vec<_>, Vec<_>) = std::mem::take(&mut self.remaining)
            .into_iter()
            .partition(|tail| tail.can_board_head_at(pos));
        self.remaining = remaining;
        if candidates.is_empty() {
            return &self.selection;
        }

        let mut elements = std::mem::take(&mut self.selection);
        elements.extend(candidates);
        self.selection = self.filter.filter(elements, pos);
        &self.selection
    }

    pub fn into_selection(self) -> Vec<OptimizedPathTail<T>> {
        self.selection
    }
}
