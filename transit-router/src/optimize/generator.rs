//! Every feasible transfer point between consecutive transit legs.

use std::sync::Arc;

use tracing::trace;

use crate::domain::{StopPosition, Transfer, TripSchedule};
use crate::raptor::{SlackProvider, TransitLeg};
use crate::transit::TransitDataProvider;

use super::trip_to_trip::{TripStopTime, TripToTripTransfer};

/// Finds where a rider can move from one trip to the next.
///
/// A transfer is feasible when the to-trip departs after the from-trip
/// arrives plus alight slack, walk, transfer slack and board slack.
/// Stay-seated and guaranteed transfers only need the walk. Not-allowed
/// transfers are never generated.
pub struct TransferGenerator<'a, P: TransitDataProvider> {
    provider: &'a P,
    slack: &'a dyn SlackProvider,
}

impl<'a, P: TransitDataProvider> TransferGenerator<'a, P> {
    pub fn new(provider: &'a P, slack: &'a dyn SlackProvider) -> Self {
        Self { provider, slack }
    }

    /// One group of transfers per pair of consecutive legs.
    ///
    /// Transfers out of a leg are only generated after the earliest position
    /// the leg can be boarded: the original board position for the first
    /// leg, and the earliest transfer into it for the others. If a pair has
    /// no feasible transfer the search stops and the last group is empty.
    pub fn find_all_possible_transfers(
        &self,
        legs: &[&TransitLeg<P::Trip>],
    ) -> Vec<Vec<TripToTripTransfer<P::Trip>>> {
        let mut result = Vec::with_capacity(legs.len().saturating_sub(1));
        let Some(first) = legs.first() else {
            return result;
        };
        let mut earliest_board_pos = first.ride.board_pos();

        for pair in legs.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let transfers = self.find_transfers(
                from.ride.trip(),
                earliest_board_pos,
                to.ride.trip(),
                to.ride.alight_pos(),
            );
            trace!(
                from = from.trip().id(),
                to = to.trip().id(),
                transfers = transfers.len(),
                "Generated transfers"
            );

            let next_board_pos = transfers.iter().map(|tx| tx.to.pos).min();
            result.push(transfers);
            match next_board_pos {
                Some(pos) => earliest_board_pos = pos,
                None => break,
            }
        }
        result
    }

    fn find_transfers(
        &self,
        from_trip: &Arc<P::Trip>,
        from_board_pos: StopPosition,
        to_trip: &Arc<P::Trip>,
        to_alight_pos: StopPosition,
    ) -> Vec<TripToTripTransfer<P::Trip>> {
        let from_pattern = from_trip.pattern();
        let mut transfers = Vec::new();

        for from_pos in from_pattern.positions().skip(from_board_pos.0 + 1) {
            if !from_pattern.alight_allowed(from_pos) {
                continue;
            }
            let from = TripStopTime::arrival(from_trip.clone(), from_pos);

            self.add_transfers_to(&mut transfers, &from, None, to_trip, to_alight_pos);
            for walk in self.provider.transfers_from_stop(from.stop) {
                if walk.to_stop != from.stop {
                    self.add_transfers_to(&mut transfers, &from, Some(*walk), to_trip, to_alight_pos);
                }
            }
        }
        transfers
    }

    /// Add a transfer for every visit of the walk's end stop (or `from`'s
    /// stop) on the to-trip before `to_alight_pos`.
    fn add_transfers_to(
        &self,
        transfers: &mut Vec<TripToTripTransfer<P::Trip>>,
        from: &TripStopTime<P::Trip>,
        walk: Option<Transfer>,
        to_trip: &Arc<P::Trip>,
        to_alight_pos: StopPosition,
    ) {
        let target = walk.map_or(from.stop, |w| w.to_stop);
        let walk_secs = walk.map_or(0, |w| w.duration_secs);
        let to_pattern = to_trip.pattern();

        for to_pos in to_pattern.positions().take(to_alight_pos.0) {
            if to_pattern.stop(to_pos) != target || !to_pattern.board_allowed(to_pos) {
                continue;
            }
            let to = TripStopTime::departure(to_trip.clone(), to_pos);
            let constraint =
                self.provider
                    .transfer_constraint(&from.trip, from.stop, &to.trip, to.stop);
            if constraint.is_some_and(|c| c.is_not_allowed()) {
                continue;
            }

            let mut earliest = from.time.plus_seconds(walk_secs);
            if !constraint.is_some_and(|c| c.is_facilitated()) {
                earliest = earliest.plus_seconds(
                    self.slack.alight_slack() + self.slack.transfer_slack() + self.slack.board_slack(),
                );
            }
            if to.time < earliest {
                continue;
            }

            transfers.push(TripToTripTransfer {
                from: from.clone(),
                to,
                path_transfer: walk,
                constraint,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoardAndAlightTime, RouteIndex, StopIndex, Time, TransferConstraint, Trip};
    use crate::raptor::DefaultSlackProvider;
    use crate::transit::{ConstrainedTransfer, NetworkBuilder, TransitNetwork};

    fn leg(network: &TransitNetwork, route: usize, board: usize, alight: usize) -> TransitLeg<Trip> {
        let trip = network.route(RouteIndex(route)).trip(0).clone();
        TransitLeg {
            ride: BoardAndAlightTime::new(trip, StopPosition(board), StopPosition(alight)).unwrap(),
            transfer_after: None,
            c1: 0,
        }
    }

    fn summary(transfers: &[TripToTripTransfer<Trip>]) -> Vec<(usize, usize, bool)> {
        transfers
            .iter()
            .map(|tx| (tx.from.pos.0, tx.to.pos.0, tx.is_same_stop()))
            .collect()
    }

    /// L1: A B C D
    /// L2: E C F G
    fn two_routes(builder: &mut NetworkBuilder) -> Vec<StopIndex> {
        let s: Vec<StopIndex> = ["A", "B", "C", "D", "E", "F", "G"]
            .iter()
            .map(|id| builder.add_stop(*id, *id))
            .collect();
        let l1 = builder.add_route("L1", vec![s[0], s[1], s[2], s[3]]).unwrap();
        let l2 = builder.add_route("L2", vec![s[4], s[2], s[5], s[6]]).unwrap();
        builder
            .add_trip_times(l1, "T1", &["10:02", "10:10", "10:20", "10:30"])
            .unwrap();
        builder
            .add_trip_times(l2, "T2", &["10:12", "10:22", "10:32", "10:40"])
            .unwrap();
        s
    }

    #[test]
    fn same_stop_and_walking_transfers() {
        let mut builder = NetworkBuilder::new();
        let s = two_routes(&mut builder);
        builder.add_walk(s[1], s[4], 60).unwrap();
        builder.add_walk(s[3], s[5], 20).unwrap();
        let network = builder.build().unwrap();
        let slack = DefaultSlackProvider::new(10, 5, 15);

        let (l1, l2) = (leg(&network, 0, 0, 2), leg(&network, 1, 1, 3));
        let groups = TransferGenerator::new(&network, &slack).find_all_possible_transfers(&[&l1, &l2]);

        assert_eq!(groups.len(), 1);
        // B ~ walk ~ E, C ~ C, D ~ walk ~ F
        assert_eq!(summary(&groups[0]), vec![(1, 0, false), (2, 1, true), (3, 2, false)]);
    }

    #[test]
    fn slack_rules_out_tight_transfers() {
        let mut builder = NetworkBuilder::new();
        let s = two_routes(&mut builder);
        builder.add_walk(s[1], s[4], 60).unwrap();
        let network = builder.build().unwrap();
        // 10:10 + 60s walk + 90s slack misses the 10:12 departure
        let slack = DefaultSlackProvider::new(30, 30, 30);

        let (l1, l2) = (leg(&network, 0, 0, 2), leg(&network, 1, 1, 3));
        let groups = TransferGenerator::new(&network, &slack).find_all_possible_transfers(&[&l1, &l2]);

        assert_eq!(summary(&groups[0]), vec![(2, 1, true)]);
    }

    #[test]
    fn to_trip_is_boarded_before_its_alight_position() {
        let mut builder = NetworkBuilder::new();
        let s: Vec<StopIndex> = ["A", "C", "D", "E", "F"]
            .iter()
            .map(|id| builder.add_stop(*id, *id))
            .collect();
        let l1 = builder.add_route("L1", vec![s[0], s[1], s[2]]).unwrap();
        // Visits D twice; the second visit is after the alight stop F
        let l2 = builder.add_route("L2", vec![s[2], s[3], s[4], s[2]]).unwrap();
        builder.add_trip_times(l1, "T1", &["10:02", "10:10", "10:20"]).unwrap();
        builder
            .add_trip_times(l2, "T2", &["10:30", "10:40", "10:50", "11:00"])
            .unwrap();
        let network = builder.build().unwrap();
        let slack = DefaultSlackProvider::zero();

        let (l1, l2) = (leg(&network, 0, 0, 2), leg(&network, 1, 0, 2));
        let groups = TransferGenerator::new(&network, &slack).find_all_possible_transfers(&[&l1, &l2]);

        assert_eq!(summary(&groups[0]), vec![(2, 0, true)]);
    }

    #[test]
    fn guaranteed_transfer_needs_no_slack_and_not_allowed_is_skipped() {
        let mut builder = NetworkBuilder::new();
        let s: Vec<StopIndex> = ["A", "B", "C"]
            .iter()
            .map(|id| builder.add_stop(*id, *id))
            .collect();
        let l1 = builder.add_route("L1", vec![s[0], s[1], s[2]]).unwrap();
        let l2 = builder.add_route("L2", vec![s[1], s[2], s[0]]).unwrap();
        builder.add_trip_times(l1, "T1", &["10:00", "10:10", "10:20"]).unwrap();
        builder.add_trip_times(l2, "T2", &["10:10", "10:25", "10:40"]).unwrap();
        builder.add_constrained_transfer(ConstrainedTransfer {
            from_trip: "T1".into(),
            from_stop: s[1],
            to_trip: "T2".into(),
            to_stop: s[1],
            constraint: TransferConstraint::guaranteed(),
        });
        builder.add_constrained_transfer(ConstrainedTransfer {
            from_trip: "T1".into(),
            from_stop: s[2],
            to_trip: "T2".into(),
            to_stop: s[2],
            constraint: TransferConstraint::NOT_ALLOWED,
        });
        let network = builder.build().unwrap();
        let slack = DefaultSlackProvider::new(60, 60, 60);

        let (l1, l2) = (leg(&network, 0, 0, 2), leg(&network, 1, 0, 2));
        let groups = TransferGenerator::new(&network, &slack).find_all_possible_transfers(&[&l1, &l2]);

        assert_eq!(summary(&groups[0]), vec![(1, 0, true)]);
        assert_eq!(groups[0][0].constraint, Some(TransferConstraint::guaranteed()));
        assert_eq!(groups[0][0].wait_secs(), 0);
        assert_eq!(groups[0][0].to.time, Time::hms(10, 10, 0));
    }

    #[test]
    fn later_groups_start_after_earliest_boarding() {
        // L1: A B C, L2: B C D, L3: C D E; only one transfer pair per hop
        let mut builder = NetworkBuilder::new();
        let s: Vec<StopIndex> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|id| builder.add_stop(*id, *id))
            .collect();
        let l1 = builder.add_route("L1", vec![s[0], s[1]]).unwrap();
        let l2 = builder.add_route("L2", vec![s[1], s[2], s[3]]).unwrap();
        let l3 = builder.add_route("L3", vec![s[2], s[3], s[4]]).unwrap();
        builder.add_trip_times(l1, "T1", &["10:00", "10:10"]).unwrap();
        builder.add_trip_times(l2, "T2", &["10:15", "10:20", "10:30"]).unwrap();
        builder.add_trip_times(l3, "T3", &["10:25", "10:35", "10:45"]).unwrap();
        let network = builder.build().unwrap();
        let slack = DefaultSlackProvider::zero();

        let legs = [leg(&network, 0, 0, 1), leg(&network, 1, 0, 2), leg(&network, 2, 1, 2)];
        let refs: Vec<&TransitLeg<Trip>> = legs.iter().collect();
        let groups = TransferGenerator::new(&network, &slack).find_all_possible_transfers(&refs);

        assert_eq!(groups.len(), 2);
        assert_eq!(summary(&groups[0]), vec![(1, 0, true)]);
        // C at 10:20 to C at 10:25, and D at 10:30 to D at 10:35
        assert_eq!(summary(&groups[1]), vec![(1, 0, true), (2, 1, true)]);
    }

    #[test]
    fn missing_transfer_ends_the_search() {
        let mut builder = NetworkBuilder::new();
        two_routes(&mut builder);
        let network = builder.build().unwrap();
        // Nothing connects L2 back to L1 after its boarding at C
        let slack = DefaultSlackProvider::zero();
        let (l2, l1) = (leg(&network, 1, 1, 3), leg(&network, 0, 0, 3));
        let groups = TransferGenerator::new(&network, &slack).find_all_possible_transfers(&[&l2, &l1]);

        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_empty());
    }
}
