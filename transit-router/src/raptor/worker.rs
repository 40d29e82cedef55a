//! Range-RAPTOR worker.
//!
//! The search iterates over the departure window from the latest minute to
//! the earliest, keeping stop arrivals between iterations as upper bounds.
//! Within an iteration every round adds one boarding:
//!
//! 1. scan routes serving stops touched in the previous round
//! 2. add flexible access legs arriving on board
//! 3. relax transfers from stops reached on board
//! 4. add flexible access legs arriving on street
//! 5. check touched stops for egress to the destination
//!
//! When generalized cost is a criterion, every stop keeps a bag of
//! arrivals per round and each of them is carried through the phases.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::domain::{
    AccessEgress, BoardAndAlightTime, StopIndex, StopPosition, Time, TransferConstraint,
    TripSchedule,
};
use crate::transit::{ConstrainedBoardingSearch, TransferSource, TransitDataProvider, find_earliest_trip};

use super::arrival::{ArrivalArena, ArrivalId, ArrivalKind, StopArrival};
use super::cost::CostCalculator;
use super::destination::{DestinationArrival, DestinationArrivals, PathComparator};
use super::error::RaptorError;
use super::mapper::PathBuilder;
use super::pareto::{ParetoSet, TiePolicy};
use super::path::RaptorPath;
use super::request::RaptorRequest;
use super::slack::SlackProvider;
use super::state::{Claim, Label, PruneMode, StopArrivals};

/// The trip a route scan is currently riding.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OnBoard {
    trip_index: usize,
    board_pos: StopPosition,
    board_stop: StopIndex,
    previous: ArrivalId,
    constraint: Option<TransferConstraint>,
}

/// A trip being ridden with the generalized cost up to boarding it.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Riding {
    on_board: OnBoard,
    c1: i32,
}

/// An earlier trip or a cheaper ride.
fn riding_better(left: &Riding, right: &Riding) -> bool {
    left.on_board.trip_index < right.on_board.trip_index || left.c1 < right.c1
}

/// Runs one search. Single-threaded; borrows the provider read-only.
pub struct RaptorWorker<'a, P: TransitDataProvider> {
    provider: &'a P,
    request: &'a RaptorRequest,
    slack: Arc<dyn SlackProvider>,
    cost: Arc<dyn CostCalculator>,
    arena: ArrivalArena<P::Trip>,
    state: StopArrivals,
    destination: DestinationArrivals<P::Trip>,
    egress_by_stop: HashMap<StopIndex, Vec<AccessEgress>>,
    number_of_rounds: usize,
    round_limit_reached: bool,
}

impl<'a, P: TransitDataProvider> RaptorWorker<'a, P> {
    pub fn new(
        provider: &'a P,
        request: &'a RaptorRequest,
        slack: Arc<dyn SlackProvider>,
        cost: Arc<dyn CostCalculator>,
    ) -> Self {
        Self::with_tie_policy(provider, request, slack, cost, TiePolicy::default())
    }

    pub fn with_tie_policy(
        provider: &'a P,
        request: &'a RaptorRequest,
        slack: Arc<dyn SlackProvider>,
        cost: Arc<dyn CostCalculator>,
        tie_policy: TiePolicy,
    ) -> Self {
        let number_of_rounds = request.max_rounds.max(request.max_access_rides());
        let prune = if request.profile.includes_generalized_cost() {
            PruneMode::Pareto
        } else if request.profile.is_multi_criteria() {
            PruneMode::RoundLocal
        } else {
            PruneMode::Global
        };
        let comparator = PathComparator {
            departure_time: request.compares_departure_time(),
            duration: request.profile.is_multi_criteria(),
            generalized_cost: request.profile.includes_generalized_cost(),
        };

        let mut egress_by_stop: HashMap<StopIndex, Vec<AccessEgress>> = HashMap::new();
        for egress in &request.egress {
            egress_by_stop.entry(egress.stop).or_default().push(*egress);
        }

        Self {
            provider,
            request,
            slack: slack.clone(),
            cost: cost.clone(),
            arena: ArrivalArena::new(),
            state: StopArrivals::new(provider.number_of_stops(), number_of_rounds, prune),
            destination: DestinationArrivals::new(
                comparator,
                tie_policy,
                PathBuilder::new(slack, cost),
                request.latest_arrival,
            ),
            egress_by_stop,
            number_of_rounds,
            round_limit_reached: false,
        }
    }

    /// Run the search and return the pareto-optimal paths, earliest arrival
    /// first.
    pub fn route(mut self) -> Result<Vec<RaptorPath<P::Trip>>, RaptorError> {
        self.request.validate()?;
        let number_of_stops = self.provider.number_of_stops();
        if let Some(leg) = self
            .request
            .access
            .iter()
            .chain(&self.request.egress)
            .find(|leg| leg.stop.0 >= number_of_stops)
        {
            return Err(RaptorError::InvalidRequest(format!(
                "stop {} is outside the network",
                leg.stop
            )));
        }

        for departure in self.request.iteration_departure_times() {
            if self.request.deadline.is_some_and(|d| d.is_expired()) {
                debug!(departure = %departure, "Search deadline expired");
                return Err(RaptorError::Timeout);
            }
            self.run_iteration(departure);
        }

        debug!(
            arrivals = self.arena.len(),
            paths = self.destination.list_paths().len(),
            "Search complete"
        );
        self.finish()
    }

    /// Run every iteration and keep the stop arrival store for inspection.
    #[cfg(test)]
    pub(crate) fn route_with_state(
        mut self,
    ) -> (Result<Vec<RaptorPath<P::Trip>>, RaptorError>, StopArrivals) {
        for departure in self.request.iteration_departure_times() {
            self.run_iteration(departure);
        }
        let state = self.state.clone();
        (self.finish(), state)
    }

    fn finish(self) -> Result<Vec<RaptorPath<P::Trip>>, RaptorError> {
        if self.destination.is_empty() {
            if let Some(latest_arrival) = self.request.latest_arrival
                && self.destination.rejected_by_latest_arrival() > 0
            {
                return Err(RaptorError::NoTransitConnectionInSearchWindow { latest_arrival });
            }
            if self.round_limit_reached {
                return Err(RaptorError::SearchExhausted {
                    max_rounds: self.request.max_rounds,
                });
            }
            return Err(RaptorError::NoTransitConnection);
        }

        let mut paths = self.destination.into_paths();
        paths.sort_by_key(|p| {
            (
                p.end_time(),
                p.number_of_transfers(),
                Reverse(p.start_time()),
                p.c1(),
            )
        });
        Ok(paths)
    }

    fn run_iteration(&mut self, departure: Time) {
        debug!(departure = %departure, "Starting iteration");
        self.state.start_iteration();
        self.add_access(0, departure, false);

        let min_rounds = self.request.max_access_rides();
        for round in 1..=self.number_of_rounds {
            self.state.prepare_round();
            if self.state.touched_previous().is_empty() && round > min_rounds {
                break;
            }

            self.scan_routes(round);
            self.add_access(round, departure, true);
            self.relax_transfers(round);
            self.add_access(round, departure, false);
            self.check_destination(round, departure);

            if round == self.number_of_rounds && !self.state.touched().is_empty() {
                self.round_limit_reached = true;
            }
        }
    }

    fn keeps_bags(&self) -> bool {
        self.state.prune_mode() == PruneMode::Pareto
    }

    fn add_access(&mut self, round: usize, departure: Time, on_board: bool) {
        let request = self.request;
        let keeps_bags = self.keeps_bags();
        for access in &request.access {
            if access.rounds() != round || access.stop_reached_on_board != on_board {
                continue;
            }
            let time = access.arrival_time(departure);
            let label = Label {
                id: self.arena.next_id(),
                time,
                c1: access.c1,
                on_board,
            };
            let accepted = if keeps_bags {
                self.state.accepts_label(round, access.stop, &label)
            } else {
                self.state.accepts_access(round, access.stop, time, on_board)
            };
            if !accepted {
                continue;
            }
            let id = self.arena.push(StopArrival {
                stop: access.stop,
                round,
                arrival_time: time,
                kind: ArrivalKind::Access {
                    access: *access,
                    departure_time: departure,
                },
            });
            if keeps_bags {
                self.state.add_label(round, access.stop, label, Claim::Access);
            } else {
                self.state.set_access(round, access.stop, time, on_board, id);
            }
        }
    }

    fn scan_routes(&mut self, round: usize) {
        if self.keeps_bags() {
            self.scan_routes_with_bags(round);
            return;
        }
        let provider = self.provider;
        let routes = provider.route_index_iterator(self.state.touched_previous());
        trace!(
            round,
            stops = self.state.touched_previous().len(),
            routes = routes.len(),
            "Scanning routes"
        );

        for route_index in routes {
            let route = provider.route(route_index);
            let pattern = route.pattern();
            let timetable = route.timetable();
            let constraints = provider.constrained_boarding_search(route_index);
            let mut on_board: Option<OnBoard> = None;

            for pos in pattern.positions() {
                let stop = pattern.stop(pos);

                // Alight before boarding, so a trip is never left where it was boarded
                if let Some(boarding) = on_board
                    && stop != boarding.board_stop
                    && pattern.alight_allowed(pos)
                {
                    self.alight(round, &boarding, &timetable[boarding.trip_index], pos);
                }

                if pattern.board_allowed(pos)
                    && self.state.was_touched_previous(stop)
                    && let Some(prev_state) = self.state.state(round - 1, stop)
                    && let Some(previous) = prev_state.best_arrival()
                    && let Some(boarding) = self.find_boarding(
                        round,
                        timetable,
                        constraints,
                        pos,
                        (previous, prev_state.best_time()),
                        on_board.map(|b| b.trip_index),
                    )
                {
                    on_board = Some(boarding);
                }
            }
        }
    }

    /// Route scan carrying every arrival in the bags of the previous round.
    ///
    /// Each route keeps the rides not beaten by an earlier trip that cost
    /// no more.
    fn scan_routes_with_bags(&mut self, round: usize) {
        let provider = self.provider;
        let routes = provider.route_index_iterator(self.state.touched_previous());
        trace!(round, routes = routes.len(), "Scanning routes with bags");

        for route_index in routes {
            let route = provider.route(route_index);
            let pattern = route.pattern();
            let timetable = route.timetable();
            let constraints = provider.constrained_boarding_search(route_index);
            let mut riding: ParetoSet<Riding, fn(&Riding, &Riding) -> bool> = ParetoSet::with_tie_policy(
                riding_better as fn(&Riding, &Riding) -> bool,
                TiePolicy::RejectEqual,
            );

            for pos in pattern.positions() {
                let stop = pattern.stop(pos);

                if pattern.alight_allowed(pos) {
                    for ride in riding.iter() {
                        if stop != ride.on_board.board_stop {
                            self.alight_label(round, ride, &timetable[ride.on_board.trip_index], pos);
                        }
                    }
                }

                if !pattern.board_allowed(pos) || !self.state.was_touched_previous(stop) {
                    continue;
                }
                let labels = self.state.labels(round - 1, stop).to_vec();
                for label in labels {
                    let Some(on_board) = self.find_boarding(
                        round,
                        timetable,
                        constraints,
                        pos,
                        (label.id, label.time),
                        None,
                    ) else {
                        continue;
                    };
                    let board_time = timetable[on_board.trip_index].departure(pos);
                    let c1 = label.c1 + self.boarding_cost(&label, board_time, on_board.constraint.as_ref());
                    riding.add(Riding { on_board, c1 });
                }
            }
        }
    }

    fn alight_label(&mut self, round: usize, riding: &Riding, trip: &Arc<P::Trip>, pos: StopPosition) {
        let Some(ride) = BoardAndAlightTime::new(trip.clone(), riding.on_board.board_pos, pos) else {
            return;
        };
        let stop = ride.alight_stop();
        let label = Label {
            id: self.arena.next_id(),
            time: ride.alight_time().plus_seconds(self.slack.alight_slack()),
            c1: riding.c1 + self.cost.transit_cost(ride.ride_secs()),
            on_board: true,
        };
        if !self.state.accepts_label(round, stop, &label) {
            return;
        }
        self.arena.push(StopArrival {
            stop,
            round,
            arrival_time: label.time,
            kind: ArrivalKind::Transit {
                previous: riding.on_board.previous,
                ride,
                constraint: riding.on_board.constraint,
            },
        });
        self.state.add_label(round, stop, label, Claim::Transit);
    }

    /// Cost of boarding at `board_time` after arriving as `label`, priced
    /// the way the path will be.
    fn boarding_cost(&self, label: &Label, board_time: Time, constraint: Option<&TransferConstraint>) -> i32 {
        match &self.arena.get(label.id).kind {
            // The access leg is shifted to end just before boarding
            ArrivalKind::Access { access, .. } => {
                let mut wait = self.slack.board_slack();
                if access.has_rides() {
                    wait += self.slack.transfer_slack();
                }
                self.cost.board_cost(!access.has_rides(), wait, None)
            }
            ArrivalKind::Transit { .. } | ArrivalKind::Transfer { .. } => {
                self.cost
                    .board_cost(false, board_time.seconds_since(label.time), constraint)
            }
        }
    }

    fn alight(&mut self, round: usize, boarding: &OnBoard, trip: &Arc<P::Trip>, pos: StopPosition) {
        let Some(ride) = BoardAndAlightTime::new(trip.clone(), boarding.board_pos, pos) else {
            return;
        };
        let stop = ride.alight_stop();
        let time = ride.alight_time().plus_seconds(self.slack.alight_slack());
        if !self.state.accepts_transit(round, stop, time) {
            return;
        }
        let id = self.arena.push(StopArrival {
            stop,
            round,
            arrival_time: time,
            kind: ArrivalKind::Transit {
                previous: boarding.previous,
                ride,
                constraint: boarding.constraint,
            },
        });
        self.state.set_transit(round, stop, time, id);
    }

    /// Find the trip to board at `pos` after the `(arrival, time)` reaching
    /// the stop, if it is earlier than `current`.
    ///
    /// Constrained transfers are tried first; a regular boarding wins if it
    /// finds an earlier trip.
    fn find_boarding(
        &self,
        round: usize,
        timetable: &[Arc<P::Trip>],
        constraints: Option<&dyn ConstrainedBoardingSearch<P::Trip>>,
        pos: StopPosition,
        (previous, arrived): (ArrivalId, Time),
        current: Option<usize>,
    ) -> Option<OnBoard> {
        let stop = self.arena.get(previous).stop;
        let mut slack = self.slack.board_slack();
        if round > 1 {
            slack += self.slack.transfer_slack();
        }
        let earliest_board_time = arrived.plus_seconds(slack);
        let upper = current.unwrap_or(timetable.len());

        let source = self.transfer_source(previous);
        let search = constraints.filter(|search| search.transfer_exist_target(pos));
        let (constrained, regular) = match (search, &source) {
            (Some(search), Some(source)) => (
                search
                    .find(timetable, source, pos, earliest_board_time)
                    .filter(|b| b.trip_index < upper),
                find_earliest_trip(timetable, pos, earliest_board_time, upper, |i| {
                    search.is_forbidden(source, pos, i)
                }),
            ),
            _ => (
                None,
                find_earliest_trip(timetable, pos, earliest_board_time, upper, |_| false),
            ),
        };

        let (trip_index, constraint) = match (constrained, regular) {
            (Some(c), Some(r)) if r < c.trip_index => (r, None),
            (Some(c), _) => (c.trip_index, Some(c.constraint)),
            (None, Some(r)) => (r, None),
            (None, None) => return None,
        };

        Some(OnBoard {
            trip_index,
            board_pos: pos,
            board_stop: stop,
            previous,
            constraint,
        })
    }

    /// The trip a rider arriving at `previous` last rode, and where they
    /// left it.
    fn transfer_source(&self, previous: ArrivalId) -> Option<TransferSource<'_, P::Trip>> {
        let arrival = self.arena.get(previous);
        match &arrival.kind {
            ArrivalKind::Transit { ride, .. } => Some(TransferSource {
                trip: ride.trip().as_ref(),
                stop: arrival.stop,
                arrival_time: ride.alight_time(),
            }),
            ArrivalKind::Transfer {
                previous, transfer, ..
            } => match &self.arena.get(*previous).kind {
                ArrivalKind::Transit { ride, .. } => Some(TransferSource {
                    trip: ride.trip().as_ref(),
                    stop: transfer.from_stop,
                    // Facilitated transfers still need the walk
                    arrival_time: arrival.arrival_time,
                }),
                _ => None,
            },
            ArrivalKind::Access { .. } => None,
        }
    }

    fn relax_transfers(&mut self, round: usize) {
        if self.keeps_bags() {
            self.relax_transfers_with_bags(round);
            return;
        }
        let provider = self.provider;
        let stops: Vec<StopIndex> = self.state.reached_on_board().to_vec();

        for from in stops {
            let Some(from_state) = self.state.state(round, from) else {
                continue;
            };
            let (Some(previous), time) =
                (from_state.on_board_arrival(), from_state.best_on_board_time())
            else {
                continue;
            };

            for transfer in provider.transfers_from_stop(from) {
                if transfer.to_stop == from {
                    continue;
                }
                let arrival_time = time.plus_seconds(transfer.duration_secs);
                if !self.state.accepts_transfer(round, transfer.to_stop, arrival_time) {
                    continue;
                }
                let id = self.arena.push(StopArrival {
                    stop: transfer.to_stop,
                    round,
                    arrival_time,
                    kind: ArrivalKind::Transfer {
                        previous,
                        transfer: *transfer,
                    },
                });
                self.state.set_transfer(round, transfer.to_stop, arrival_time, id);
            }
        }
    }

    fn relax_transfers_with_bags(&mut self, round: usize) {
        let provider = self.provider;
        let stops: Vec<StopIndex> = self.state.reached_on_board().to_vec();

        for from in stops {
            let rides: Vec<Label> = self
                .state
                .labels(round, from)
                .iter()
                .filter(|label| label.on_board)
                .copied()
                .collect();

            for ride in rides {
                for transfer in provider.transfers_from_stop(from) {
                    if transfer.to_stop == from {
                        continue;
                    }
                    let label = Label {
                        id: self.arena.next_id(),
                        time: ride.time.plus_seconds(transfer.duration_secs),
                        c1: ride.c1 + transfer.c1,
                        on_board: false,
                    };
                    if !self.state.accepts_label(round, transfer.to_stop, &label) {
                        continue;
                    }
                    self.arena.push(StopArrival {
                        stop: transfer.to_stop,
                        round,
                        arrival_time: label.time,
                        kind: ArrivalKind::Transfer {
                            previous: ride.id,
                            transfer: *transfer,
                        },
                    });
                    self.state.add_label(round, transfer.to_stop, label, Claim::Transfer);
                }
            }
        }
    }

    fn check_destination(&mut self, round: usize, departure: Time) {
        let stops: Vec<StopIndex> = self.state.touched().to_vec();

        for stop in stops {
            let Some(egresses) = self.egress_by_stop.get(&stop) else {
                continue;
            };
            if self.keeps_bags() {
                let labels = self.state.labels(round, stop).to_vec();
                for egress in egresses {
                    for label in &labels {
                        if !(label.on_board || egress.has_rides()) || !self.arena.has_transit(label.id) {
                            continue;
                        }
                        let arrival = DestinationArrival {
                            previous: label.id,
                            egress: *egress,
                            arrival_time: egress.arrival_time(label.time),
                            round,
                            iteration_departure_time: departure,
                        };
                        self.destination.add(&self.arena, &arrival);
                    }
                }
                continue;
            }

            let Some(stop_state) = self.state.state(round, stop) else {
                continue;
            };

            for egress in egresses {
                // Walking out of a walk is not a path; it needs a ride first
                let (previous, time) = if egress.has_rides() {
                    (stop_state.best_arrival(), stop_state.best_time())
                } else {
                    (
                        stop_state.on_board_arrival(),
                        stop_state.best_on_board_time(),
                    )
                };
                let Some(previous) = previous else {
                    continue;
                };
                if !self.arena.has_transit(previous) {
                    continue;
                }

                let arrival = DestinationArrival {
                    previous,
                    egress: *egress,
                    arrival_time: egress.arrival_time(time),
                    round,
                    iteration_departure_time: departure,
                };
                self.destination.add(&self.arena, &arrival);
            }
        }
    }
}
