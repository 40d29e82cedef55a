//! Re-choosing the transfer points of a path.
//!
//! The search fixes which trips a path rides, but not where it changes
//! between them. [`OptimizePathService`] enumerates every feasible transfer
//! point between consecutive trips and builds the path backward from the
//! destination, keeping only the best tails at each boarding position.

use tracing::debug;

use crate::domain::{Time, TripSchedule};
use crate::raptor::{LegPlan, PathBuilder, RaptorPath, TransitLeg};
use crate::transit::TransitDataProvider;

use super::filter::{MinCostFilterChain, PathTailFilter};
use super::generator::TransferGenerator;
use super::optimized::OptimizedPath;
use super::selector::TransitPathLegSelector;
use super::tail::OptimizedPathTail;
use super::trip_to_trip::TripToTripTransfer;
use super::wait_time::TransferWaitTimeCostCalculator;

type TailFilter<'a, T> = Box<dyn PathTailFilter<OptimizedPathTail<T>> + Send + Sync + 'a>;

pub struct OptimizePathService<'a, P: TransitDataProvider> {
    provider: &'a P,
    builder: PathBuilder,
    wait_time: Option<TransferWaitTimeCostCalculator>,
    filter: TailFilter<'a, P::Trip>,
}

impl<'a, P: TransitDataProvider> OptimizePathService<'a, P> {
    /// A service ranking tails by transfer priority, then wait-time
    /// optimized cost, then earliest transfers.
    ///
    /// Without a wait-time calculator the second criterion is the plain
    /// generalized cost.
    pub fn new(
        provider: &'a P,
        builder: PathBuilder,
        wait_time: Option<TransferWaitTimeCostCalculator>,
    ) -> Self {
        Self {
            provider,
            builder,
            wait_time,
            filter: Box::new(MinCostFilterChain::transfer_optimization()),
        }
    }

    pub fn with_filter(
        mut self,
        filter: impl PathTailFilter<OptimizedPathTail<P::Trip>> + Send + Sync + 'a,
    ) -> Self {
        self.filter = Box::new(filter);
        self
    }

    /// Every best realization of `original` riding the same trips.
    ///
    /// Paths with a single transit leg, or where some pair of trips has no
    /// feasible transfer, come back unchanged. No returned path arrives
    /// later or costs more than `original`.
    ///
    /// # Panics
    ///
    /// Panics if `original` has no transit leg.
    pub fn find_best_transit_path(&self, original: &RaptorPath<P::Trip>) -> Vec<OptimizedPath<P::Trip>> {
        let transit_legs: Vec<&TransitLeg<P::Trip>> = original.transit_legs().collect();
        assert!(
            !transit_legs.is_empty(),
            "Cannot optimize transfers of a path without transit"
        );

        let transit_secs: i32 = transit_legs.iter().map(|leg| leg.ride.ride_secs()).sum();
        let wait_time = self.wait_time.map(|calc| calc.for_transit_time(transit_secs));

        if transit_legs.len() == 1 {
            return vec![OptimizedPath::from_original(original.clone(), wait_time.as_ref())];
        }

        let mut groups = TransferGenerator::new(self.provider, self.builder.slack())
            .find_all_possible_transfers(&transit_legs);
        if groups.len() < transit_legs.len() - 1 || groups.iter().any(Vec::is_empty) {
            debug!(path = %original, "No feasible transfer between some trips");
            return vec![OptimizedPath::from_original(original.clone(), wait_time.as_ref())];
        }
        for group in &mut groups {
            group.sort_by(|a, b| b.to.pos.cmp(&a.to.pos));
        }

        let (prefix, suffix) = split_around_transit(original);
        let last = transit_legs[transit_legs.len() - 1];
        let mut seed = Vec::with_capacity(suffix.len() + 1);
        seed.push(LegPlan::Transit {
            ride: last.ride.clone(),
            transfer_after: None,
        });
        seed.extend(suffix);

        let iteration_departure_time = original.iteration_departure_time();
        let mut tails = vec![OptimizedPathTail::new(
            self.builder.clone(),
            wait_time,
            iteration_departure_time,
            seed,
        )];

        for i in (0..groups.len()).rev() {
            let earliest = earliest_departure_from_leg(original, &groups, i);
            tails = self.extend_tails(tails, transit_legs[i], &groups[i], earliest);
            debug!(leg = i, tails = tails.len(), "Extended path tails");
        }

        let board_pos = transit_legs[0].ride.board_pos();
        let mut selector = TransitPathLegSelector::new(self.filter.as_ref(), tails);
        selector.next(board_pos);
        let candidates: Vec<OptimizedPath<P::Trip>> = selector
            .into_selection()
            .into_iter()
            .filter_map(|tail| tail.insert_access(board_pos, &prefix))
            .map(|tail| tail.build(original.c2()))
            .collect();

        let result: Vec<OptimizedPath<P::Trip>> = candidates
            .into_iter()
            .filter(|path| path.end_time() <= original.end_time() && path.c1() <= original.c1())
            .collect();
        if result.is_empty() {
            debug!(path = %original, "Optimized paths are worse than the original");
            return vec![OptimizedPath::from_original(original.clone(), wait_time.as_ref())];
        }
        debug!(paths = result.len(), best = %result[0], "Optimized transfers");
        result
    }

    /// Extend every tail worth keeping with `leg` and each transfer out of it.
    fn extend_tails(
        &self,
        tails: Vec<OptimizedPathTail<P::Trip>>,
        leg: &TransitLeg<P::Trip>,
        transfers: &[TripToTripTransfer<P::Trip>],
        earliest: Time,
    ) -> Vec<OptimizedPathTail<P::Trip>> {
        let mut selector = TransitPathLegSelector::new(self.filter.as_ref(), tails);
        let mut extended = Vec::new();

        for tx in transfers {
            if tx.from.time <= earliest {
                continue;
            }
            for tail in selector.next(tx.to.pos) {
                if let Some(tail) = tail.clone().add_transit_and_transfer_leg(leg, tx) {
                    extended.push(tail);
                }
            }
        }
        extended
    }
}

/// Latest time before which no transfer out of leg `i` can happen: the
/// access arrival for the first leg, otherwise the earliest boarding of
/// leg `i`.
fn earliest_departure_from_leg<T: TripSchedule>(
    original: &RaptorPath<T>,
    groups: &[Vec<TripToTripTransfer<T>>],
    i: usize,
) -> Time {
    if i == 0 {
        return original
            .access_leg()
            .map_or(original.start_time(), |access| access.to_time);
    }
    groups[i - 1]
        .last()
        .map_or(original.start_time(), |tx| tx.to.time)
}

/// Leg plans before the first and after the last transit leg.
fn split_around_transit<T: TripSchedule>(path: &RaptorPath<T>) -> (Vec<LegPlan<T>>, Vec<LegPlan<T>>) {
    let plans = path.to_plans();
    let is_transit = |plan: &LegPlan<T>| matches!(plan, LegPlan::Transit { .. });
    let first = plans.iter().position(is_transit).unwrap_or(plans.len());
    let last = plans.iter().rposition(is_transit).map_or(plans.len(), |i| i + 1);
    (plans[..first].to_vec(), plans[last..].to_vec())
}
