//! Per-round stop arrival state.
//!
//! For every round and stop the store keeps the best arrival time, the best
//! time arrived on board, and the arrival records behind them. The actual
//! arrivals live in an [`super::arrival::ArrivalArena`]; this module only
//! holds their ids.
//!
//! With [`PruneMode::Pareto`] each round and stop also keeps a bag of
//! arrivals not dominated on arrival time and generalized cost.

use crate::domain::{StopIndex, Time};

use super::arrival::ArrivalId;
use super::pareto::{ParetoSet, TiePolicy};

/// Which record holds the best arrival time of a stop in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Access,
    Transit,
    Transfer,
}

/// Arrival state of one stop in one round.
#[derive(Debug, Clone)]
pub struct StopArrivalState {
    best_time: Time,
    best_on_board_time: Time,
    claim: Option<Claim>,
    access: Option<ArrivalId>,
    transit: Option<ArrivalId>,
    transfer: Option<ArrivalId>,
    on_board: Option<ArrivalId>,
}

impl Default for StopArrivalState {
    fn default() -> Self {
        Self {
            best_time: Time::UNREACHED,
            best_on_board_time: Time::UNREACHED,
            claim: None,
            access: None,
            transit: None,
            transfer: None,
            on_board: None,
        }
    }
}

impl StopArrivalState {
    pub fn best_time(&self) -> Time {
        self.best_time
    }

    pub fn best_on_board_time(&self) -> Time {
        self.best_on_board_time
    }

    pub fn claim(&self) -> Option<Claim> {
        self.claim
    }

    pub fn arrived_on_board(&self) -> bool {
        self.on_board.is_some()
    }

    pub fn access(&self) -> Option<ArrivalId> {
        self.access
    }

    pub fn transit(&self) -> Option<ArrivalId> {
        self.transit
    }

    pub fn transfer(&self) -> Option<ArrivalId> {
        self.transfer
    }

    /// The arrival holding the best time.
    pub fn best_arrival(&self) -> Option<ArrivalId> {
        match self.claim? {
            Claim::Access => self.access,
            Claim::Transit => self.transit,
            Claim::Transfer => self.transfer,
        }
    }

    /// The arrival holding the best on-board time: a transit ride or an
    /// access leg that ends on board.
    pub fn on_board_arrival(&self) -> Option<ArrivalId> {
        self.on_board
    }

    fn set_on_board(&mut self, time: Time, id: ArrivalId) {
        self.best_on_board_time = time;
        self.on_board = Some(id);
    }

    fn take_claim(&mut self, time: Time, claim: Claim) {
        if time < self.best_time {
            self.best_time = time;
            self.claim = Some(claim);
        }
    }

    fn set_transit(&mut self, time: Time, id: ArrivalId) {
        self.transit = Some(id);
        self.set_on_board(time, id);
        self.take_claim(time, Claim::Transit);
    }

    fn set_transfer(&mut self, time: Time, id: ArrivalId) {
        self.transfer = Some(id);
        self.take_claim(time, Claim::Transfer);
    }

    fn set_access(&mut self, time: Time, on_board: bool, id: ArrivalId) {
        self.access = Some(id);
        if on_board {
            self.set_on_board(time, id);
        }
        self.take_claim(time, Claim::Access);
    }
}

/// How new arrivals are compared with existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneMode {
    /// Against the best time of the stop in any round.
    Global,
    /// Against the same round only.
    RoundLocal,
    /// Against the bag of the same round, on time and generalized cost.
    Pareto,
}

/// An arrival in a stop's bag with the criteria it is kept for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub id: ArrivalId,
    pub time: Time,
    pub c1: i32,
    pub on_board: bool,
}

/// Earlier, cheaper, or on board where the other is not.
fn label_better(left: &Label, right: &Label) -> bool {
    left.time < right.time || left.c1 < right.c1 || (left.on_board && !right.on_board)
}

type LabelBag = ParetoSet<Label, fn(&Label, &Label) -> bool>;

fn empty_bag() -> LabelBag {
    ParetoSet::with_tie_policy(label_better as fn(&Label, &Label) -> bool, TiePolicy::RejectEqual)
}

/// Set of stops with O(1) insert and ordered iteration.
#[derive(Debug, Clone)]
struct StopSet {
    marked: Vec<bool>,
    stops: Vec<StopIndex>,
}

impl StopSet {
    fn new(number_of_stops: usize) -> Self {
        Self {
            marked: vec![false; number_of_stops],
            stops: Vec::new(),
        }
    }

    fn insert(&mut self, stop: StopIndex) {
        if !self.marked[stop.0] {
            self.marked[stop.0] = true;
            self.stops.push(stop);
        }
    }

    fn contains(&self, stop: StopIndex) -> bool {
        self.marked[stop.0]
    }

    fn clear(&mut self) {
        for stop in self.stops.drain(..) {
            self.marked[stop.0] = false;
        }
    }
}

/// Stop arrival states for every round, kept across Range-RAPTOR iterations.
#[derive(Debug, Clone)]
pub struct StopArrivals {
    rounds: Vec<Vec<Option<StopArrivalState>>>,
    best_times: Vec<Time>,
    best_on_board_times: Vec<Time>,
    touched: StopSet,
    touched_previous: StopSet,
    reached_on_board: StopSet,
    bags: Vec<Vec<LabelBag>>,
    prune: PruneMode,
}

impl StopArrivals {
    /// Empty state for rounds `0..=max_rounds`.
    pub fn new(number_of_stops: usize, max_rounds: usize, prune: PruneMode) -> Self {
        let bags = match prune {
            PruneMode::Pareto => vec![vec![empty_bag(); number_of_stops]; max_rounds + 1],
            PruneMode::Global | PruneMode::RoundLocal => Vec::new(),
        };
        Self {
            rounds: vec![vec![None; number_of_stops]; max_rounds + 1],
            best_times: vec![Time::UNREACHED; number_of_stops],
            best_on_board_times: vec![Time::UNREACHED; number_of_stops],
            touched: StopSet::new(number_of_stops),
            touched_previous: StopSet::new(number_of_stops),
            reached_on_board: StopSet::new(number_of_stops),
            bags,
            prune,
        }
    }

    pub fn number_of_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn prune_mode(&self) -> PruneMode {
        self.prune
    }

    /// Reset the touched sets at the start of an iteration. Arrival times
    /// stay, as upper bounds for the next (earlier) departure.
    pub fn start_iteration(&mut self) {
        self.touched.clear();
        self.touched_previous.clear();
        self.reached_on_board.clear();
    }

    /// Move the stops touched in the finished round to "previous".
    pub fn prepare_round(&mut self) {
        std::mem::swap(&mut self.touched, &mut self.touched_previous);
        self.touched.clear();
        self.reached_on_board.clear();
    }

    pub fn touched(&self) -> &[StopIndex] {
        &self.touched.stops
    }

    pub fn touched_previous(&self) -> &[StopIndex] {
        &self.touched_previous.stops
    }

    pub fn was_touched_previous(&self, stop: StopIndex) -> bool {
        self.touched_previous.contains(stop)
    }

    /// Stops reached on board in the current round.
    pub fn reached_on_board(&self) -> &[StopIndex] {
        &self.reached_on_board.stops
    }

    pub fn state(&self, round: usize, stop: StopIndex) -> Option<&StopArrivalState> {
        self.rounds.get(round)?.get(stop.0)?.as_ref()
    }

    /// Best arrival time at `stop` using at most `round` rounds.
    pub fn best_arrival_time(&self, round: usize, stop: StopIndex) -> Time {
        (0..=round.min(self.rounds.len().saturating_sub(1)))
            .filter_map(|k| self.state(k, stop))
            .map(StopArrivalState::best_time)
            .min()
            .unwrap_or(Time::UNREACHED)
    }

    /// Best time at `stop` in any round.
    pub fn overall_best_time(&self, stop: StopIndex) -> Time {
        self.best_times[stop.0]
    }

    fn local(&self, round: usize, stop: StopIndex) -> (Time, Time) {
        self.state(round, stop).map_or((Time::UNREACHED, Time::UNREACHED), |s| {
            (s.best_time, s.best_on_board_time)
        })
    }

    fn limits(&self, round: usize, stop: StopIndex) -> (Time, Time) {
        match self.prune {
            PruneMode::Global => (self.best_times[stop.0], self.best_on_board_times[stop.0]),
            PruneMode::RoundLocal | PruneMode::Pareto => self.local(round, stop),
        }
    }

    /// Whether a transit arrival would improve the best on-board time.
    pub fn accepts_transit(&self, round: usize, stop: StopIndex, time: Time) -> bool {
        time < self.limits(round, stop).1
    }

    /// Whether a transfer arrival would improve the best time.
    pub fn accepts_transfer(&self, round: usize, stop: StopIndex, time: Time) -> bool {
        time < self.limits(round, stop).0
    }

    pub fn accepts_access(&self, round: usize, stop: StopIndex, time: Time, on_board: bool) -> bool {
        if on_board {
            self.accepts_transit(round, stop, time)
        } else {
            self.accepts_transfer(round, stop, time)
        }
    }

    pub fn set_transit(&mut self, round: usize, stop: StopIndex, time: Time, id: ArrivalId) {
        self.entry(round, stop).set_transit(time, id);
        self.update_bests(stop, time, true);
        self.reached_on_board.insert(stop);
    }

    pub fn set_transfer(&mut self, round: usize, stop: StopIndex, time: Time, id: ArrivalId) {
        self.entry(round, stop).set_transfer(time, id);
        self.update_bests(stop, time, false);
    }

    pub fn set_access(
        &mut self,
        round: usize,
        stop: StopIndex,
        time: Time,
        on_board: bool,
        id: ArrivalId,
    ) {
        self.entry(round, stop).set_access(time, on_board, id);
        self.update_bests(stop, time, on_board);
        if on_board {
            self.reached_on_board.insert(stop);
        }
    }

    /// The bag of `stop` in `round`; empty unless pruning is pareto.
    pub fn labels(&self, round: usize, stop: StopIndex) -> &[Label] {
        match self.bags.get(round).and_then(|bags| bags.get(stop.0)) {
            Some(bag) => bag.elements(),
            None => &[],
        }
    }

    /// Whether `label` would enter the bag.
    pub fn accepts_label(&self, round: usize, stop: StopIndex, label: &Label) -> bool {
        self.bags
            .get(round)
            .and_then(|bags| bags.get(stop.0))
            .is_some_and(|bag| bag.qualifies(label))
    }

    /// Put `label` in the bag, dropping the labels it dominates.
    ///
    /// The single best arrival of the round is only replaced when the label
    /// is faster.
    pub fn add_label(&mut self, round: usize, stop: StopIndex, label: Label, claim: Claim) {
        let Some(bag) = self.bags.get_mut(round).and_then(|bags| bags.get_mut(stop.0)) else {
            return;
        };
        if !bag.add(label) {
            return;
        }

        let (best, best_on_board) = self.local(round, stop);
        let Label { id, time, on_board, .. } = label;
        match claim {
            Claim::Transit if time < best_on_board => self.entry(round, stop).set_transit(time, id),
            Claim::Transfer if time < best => self.entry(round, stop).set_transfer(time, id),
            Claim::Access if time < best || (on_board && time < best_on_board) => {
                self.entry(round, stop).set_access(time, on_board, id);
            }
            _ => {}
        }
        self.update_bests(stop, time, on_board);
        if on_board {
            self.reached_on_board.insert(stop);
        }
    }

    fn entry(&mut self, round: usize, stop: StopIndex) -> &mut StopArrivalState {
        self.rounds[round][stop.0].get_or_insert_with(StopArrivalState::default)
    }

    fn update_bests(&mut self, stop: StopIndex, time: Time, on_board: bool) {
        let i = stop.0;
        self.best_times[i] = self.best_times[i].min(time);
        if on_board {
            self.best_on_board_times[i] = self.best_on_board_times[i].min(time);
        }
        self.touched.insert(stop);
    }
}
