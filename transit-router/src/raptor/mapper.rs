//! Turning arrivals and leg plans into timed, costed paths.

use std::sync::Arc;

use tracing::trace;

use crate::domain::{Time, TransferConstraint, TripSchedule};

use super::arrival::{ArrivalArena, ArrivalKind};
use super::cost::CostCalculator;
use super::destination::DestinationArrival;
use super::path::{AccessLeg, EgressLeg, LegPlan, PathLeg, RaptorPath, TransferLeg, TransitLeg};
use super::slack::SlackProvider;

/// Assigns times and generalized cost to leg plans.
///
/// Transit legs take their times from the trip. Legs after a transit leg
/// start when the rider is ready after alighting. Legs before the first
/// transit leg are shifted as late as possible, so the access leg ends
/// exactly when the rider must be at the first boarding stop.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    slack: Arc<dyn SlackProvider>,
    cost: Arc<dyn CostCalculator>,
}

impl PathBuilder {
    pub fn new(slack: Arc<dyn SlackProvider>, cost: Arc<dyn CostCalculator>) -> Self {
        Self { slack, cost }
    }

    pub fn slack(&self) -> &dyn SlackProvider {
        self.slack.as_ref()
    }

    pub fn cost_calculator(&self) -> &dyn CostCalculator {
        self.cost.as_ref()
    }

    /// Build a complete path.
    pub fn build<T: TripSchedule>(
        &self,
        plans: Vec<LegPlan<T>>,
        iteration_departure_time: Time,
        c2: Option<i32>,
    ) -> RaptorPath<T> {
        let Some(first_transit) = plans
            .iter()
            .position(|plan| matches!(plan, LegPlan::Transit { .. }))
        else {
            let legs = self.timed_legs(&plans, iteration_departure_time, true);
            return RaptorPath::new(legs, iteration_departure_time, c2);
        };

        let access_rides = match plans.first() {
            Some(LegPlan::Access(access)) => access.has_rides(),
            _ => false,
        };
        let board_time = match &plans[first_transit] {
            LegPlan::Transit { ride, .. } => ride.board_time(),
            _ => iteration_departure_time,
        };
        let mut slack_before = self.slack.board_slack();
        if access_rides {
            slack_before += self.slack.transfer_slack();
        }
        let prefix_end = board_time.minus_seconds(slack_before);

        let mut legs = self.shifted_prefix(&plans[..first_transit], prefix_end);
        legs.extend(self.timed_legs(&plans[first_transit..], prefix_end, !access_rides));
        RaptorPath::new(legs, iteration_departure_time, c2)
    }

    /// Timed legs of a path suffix starting with a transit leg.
    ///
    /// The wait before the first boarding is measured from `reference`, and
    /// the first boarding is priced as a transfer.
    pub fn timed_tail<T: TripSchedule>(&self, plans: &[LegPlan<T>], reference: Time) -> Vec<PathLeg<T>> {
        self.timed_legs(plans, reference, false)
    }

    /// Generalized cost of a path suffix; see [`PathBuilder::timed_tail`].
    pub fn tail_cost<T: TripSchedule>(&self, plans: &[LegPlan<T>], reference: Time) -> i32 {
        self.timed_tail(plans, reference).iter().map(PathLeg::c1).sum()
    }

    /// Path for an arrival at the destination.
    pub fn map_destination<T: TripSchedule>(
        &self,
        arena: &ArrivalArena<T>,
        arrival: &DestinationArrival,
    ) -> RaptorPath<T> {
        let mut plans = vec![LegPlan::Egress(arrival.egress)];
        // Constraint used to board the transit leg after the current one
        let mut next_constraint: Option<TransferConstraint> = None;

        for stop_arrival in arena.chain(arrival.previous) {
            match &stop_arrival.kind {
                ArrivalKind::Transit {
                    ride, constraint, ..
                } => {
                    plans.push(LegPlan::Transit {
                        ride: ride.clone(),
                        transfer_after: next_constraint,
                    });
                    next_constraint = *constraint;
                }
                ArrivalKind::Transfer { transfer, .. } => plans.push(LegPlan::Transfer(*transfer)),
                ArrivalKind::Access { access, .. } => plans.push(LegPlan::Access(*access)),
            }
        }
        plans.reverse();

        trace!(legs = plans.len(), arrival = %arrival.arrival_time, "Mapping destination arrival");
        self.build(plans, arrival.iteration_departure_time, None)
    }

    /// Legs before the first transit leg, shifted to end at `end`.
    fn shifted_prefix<T: TripSchedule>(&self, plans: &[LegPlan<T>], end: Time) -> Vec<PathLeg<T>> {
        let mut legs = Vec::with_capacity(plans.len());
        let mut to_time = end;
        for plan in plans.iter().rev() {
            match plan {
                LegPlan::Access(access) => {
                    let from_time = to_time.minus_seconds(access.duration_secs);
                    legs.push(PathLeg::Access(AccessLeg {
                        access: *access,
                        from_time,
                        to_time,
                        c1: access.c1,
                    }));
                    to_time = from_time;
                }
                LegPlan::Transfer(transfer) => {
                    let from_time = to_time.minus_seconds(transfer.duration_secs);
                    legs.push(PathLeg::Transfer(TransferLeg {
                        transfer: *transfer,
                        from_time,
                        to_time,
                        c1: transfer.c1,
                    }));
                    to_time = from_time;
                }
                LegPlan::Transit { .. } | LegPlan::Egress(_) => {}
            }
        }
        legs.reverse();
        legs
    }

    fn timed_legs<T: TripSchedule>(
        &self,
        plans: &[LegPlan<T>],
        start: Time,
        first_boarding: bool,
    ) -> Vec<PathLeg<T>> {
        let mut legs = Vec::with_capacity(plans.len());
        let mut prev_end = start;
        let mut first_boarding = first_boarding;
        let mut constraint_in: Option<TransferConstraint> = None;

        for plan in plans {
            match plan {
                LegPlan::Access(access) => {
                    let to_time = access.arrival_time(prev_end);
                    legs.push(PathLeg::Access(AccessLeg {
                        access: *access,
                        from_time: prev_end,
                        to_time,
                        c1: access.c1,
                    }));
                    prev_end = to_time;
                }
                LegPlan::Transit {
                    ride,
                    transfer_after,
                } => {
                    let wait = ride.board_time().seconds_since(prev_end);
                    let c1 = self
                        .cost
                        .board_cost(first_boarding, wait, constraint_in.as_ref())
                        + self.cost.transit_cost(ride.ride_secs());
                    legs.push(PathLeg::Transit(TransitLeg {
                        ride: ride.clone(),
                        transfer_after: *transfer_after,
                        c1,
                    }));
                    prev_end = ride.alight_time().plus_seconds(self.slack.alight_slack());
                    constraint_in = *transfer_after;
                    first_boarding = false;
                }
                LegPlan::Transfer(transfer) => {
                    let to_time = prev_end.plus_seconds(transfer.duration_secs);
                    legs.push(PathLeg::Transfer(TransferLeg {
                        transfer: *transfer,
                        from_time: prev_end,
                        to_time,
                        c1: transfer.c1,
                    }));
                    prev_end = to_time;
                }
                LegPlan::Egress(egress) => {
                    let to_time = egress.arrival_time(prev_end);
                    legs.push(PathLeg::Egress(EgressLeg {
                        egress: *egress,
                        from_time: prev_end,
                        to_time,
                        c1: egress.c1,
                    }));
                    prev_end = to_time;
                }
            }
        }
        legs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AccessEgress, BoardAndAlightTime, Pattern, RouteIndex, StopIndex, StopPosition, Transfer,
        Trip,
    };
    use crate::raptor::cost::DefaultCostCalculator;
    use crate::raptor::slack::DefaultSlackProvider;

    fn time(s: &str) -> Time {
        Time::parse(s).unwrap()
    }

    fn trip(id: &str, name: &str, stops: &[usize], times: &[&str]) -> Arc<Trip> {
        let pattern = Arc::new(
            Pattern::new(
                RouteIndex(0),
                name,
                stops.iter().copied().map(StopIndex).collect(),
            )
            .unwrap(),
        );
        Arc::new(Trip::with_times(id, pattern, times.iter().map(|s| time(s)).collect()).unwrap())
    }

    fn ride(trip: &Arc<Trip>, board: usize, alight: usize) -> BoardAndAlightTime<Trip> {
        BoardAndAlightTime::new(trip.clone(), StopPosition(board), StopPosition(alight)).unwrap()
    }

    fn builder(board: i32, alight: i32, transfer: i32) -> PathBuilder {
        PathBuilder::new(
            Arc::new(DefaultSlackProvider::new(board, alight, transfer)),
            Arc::new(DefaultCostCalculator::new(60, 0, 1.0, 1.0)),
        )
    }

    fn two_leg_plans() -> Vec<LegPlan<Trip>> {
        let t1 = trip("T1", "L1", &[0, 1], &["10:10", "10:30"]);
        let t2 = trip("T2", "L2", &[2, 3], &["10:40", "11:00"]);
        vec![
            LegPlan::Access(AccessEgress::walk(StopIndex(0), 120, 240)),
            LegPlan::Transit {
                ride: ride(&t1, 0, 1),
                transfer_after: None,
            },
            LegPlan::Transfer(Transfer::new(StopIndex(1), StopIndex(2), 300, 600)),
            LegPlan::Transit {
                ride: ride(&t2, 0, 1),
                transfer_after: None,
            },
            LegPlan::Egress(AccessEgress::walk(StopIndex(3), 60, 120)),
        ]
    }

    #[test]
    fn access_is_shifted_to_first_boarding() {
        let path = builder(30, 0, 0).build(two_leg_plans(), time("10:00"), None);
        let access = path.access_leg().unwrap();
        assert_eq!(access.to_time, time("10:09:30"));
        assert_eq!(access.from_time, time("10:07:30"));
        assert_eq!(path.start_time(), time("10:07:30"));
        assert_eq!(path.iteration_departure_time(), time("10:00"));
    }

    #[test]
    fn legs_after_transit_start_after_alight_slack() {
        let path = builder(0, 60, 0).build(two_leg_plans(), time("10:00"), None);
        let PathLeg::Transfer(transfer) = &path.legs()[2] else {
            panic!("expected transfer leg");
        };
        assert_eq!(transfer.from_time, time("10:31"));
        assert_eq!(transfer.to_time, time("10:36"));
        assert_eq!(path.end_time(), time("11:02"));
        assert_eq!(path.number_of_transfers(), 1);
    }

    #[test]
    fn cost_is_sum_of_legs() {
        let path = builder(0, 0, 0).build(two_leg_plans(), time("10:00"), None);
        // access 240 + board 6000 + ride 120000 + walk 600
        // + board 6000 + wait 300s + ride 120000 + egress 120
        let expected = 240 + 6000 + 120_000 + 600 + 6000 + 30_000 + 120_000 + 120;
        assert_eq!(path.c1(), expected);
        assert_eq!(
            path.legs().iter().map(PathLeg::c1).sum::<i32>(),
            path.c1()
        );
    }

    #[test]
    fn flex_access_counts_as_ride() {
        let mut plans = two_leg_plans();
        plans[0] = LegPlan::Access(AccessEgress::flex(StopIndex(0), 600, 900, 1, false));
        let path = builder(0, 0, 120).build(plans, time("09:30"), None);

        // Transfer slack applies before the first boarding after a flex ride
        assert_eq!(path.access_leg().unwrap().to_time, time("10:08"));
        assert_eq!(path.number_of_transfers(), 2);
    }

    #[test]
    fn summary_uses_stop_names() {
        let path = builder(0, 0, 0).build(two_leg_plans(), time("10:00"), None);
        let names = ["A", "B", "C", "D"];
        assert_eq!(
            path.summary(|stop| names[stop.0]),
            "A ~ L1 ~ B ~ Walk 5m ~ C ~ L2 ~ D"
        );
        assert!(path.to_string().starts_with("0 ~ L1 ~ 1"));
    }

    #[test]
    fn tail_cost_waits_from_reference() {
        let b = builder(0, 0, 0);
        let plans = two_leg_plans();
        let tail = &plans[3..];
        // board 6000 + wait 10m + ride 20m + egress
        assert_eq!(b.tail_cost(tail, time("10:30")), 6000 + 60_000 + 120_000 + 120);
    }

    #[test]
    fn plans_round_trip_through_path() {
        let b = builder(0, 0, 0);
        let path = b.build(two_leg_plans(), time("10:00"), Some(3));
        let rebuilt = b.build(path.to_plans(), time("10:00"), Some(3));
        assert_eq!(path, rebuilt);
        assert_eq!(rebuilt.c2(), Some(3));
    }
}
