//! Earliest-trip search over a sorted timetable.

use std::sync::Arc;

use crate::domain::{StopPosition, Time, TripSchedule};

/// Find the first trip in `timetable[..upper]` departing `pos` no earlier
/// than `earliest_board_time`.
///
/// Only trips before `upper` are considered, so a rider already on board
/// trip `upper` can only switch to an earlier one. Trips for which `skip`
/// returns true are passed over.
///
/// The timetable must be sorted by departure at `pos`, which holds for
/// non-overtaking trips.
pub fn find_earliest_trip<T: TripSchedule>(
    timetable: &[Arc<T>],
    pos: StopPosition,
    earliest_board_time: Time,
    upper: usize,
    skip: impl Fn(usize) -> bool,
) -> Option<usize> {
    let candidates = &timetable[..upper.min(timetable.len())];
    let first = candidates.partition_point(|trip| trip.departure(pos) < earliest_board_time);
    (first..candidates.len()).find(|&index| !skip(index))
}
