//! Filters choosing between path tails that board the same trip.

use std::fmt;

use crate::domain::{StopPosition, TripSchedule};
use crate::raptor::{TiePolicy, pareto_filter};

use super::tail::OptimizedPathTail;

/// Reduce a set of tails to the ones worth extending when the head is
/// boarded at `board_pos`.
pub trait PathTailFilter<E> {
    fn filter(&self, elements: Vec<E>, board_pos: StopPosition) -> Vec<E>;
}

/// A cost of an element with its head boarded at a position.
pub type CostFn<E> = Box<dyn Fn(&E, StopPosition) -> i32 + Send + Sync>;

/// Keep the elements with the lowest cost, breaking ties with the next
/// cost function in the chain.
pub struct MinCostFilterChain<E> {
    costs: Vec<CostFn<E>>,
}

impl<E> MinCostFilterChain<E> {
    pub fn new() -> Self {
        Self { costs: Vec::new() }
    }

    pub fn with_cost(mut self, cost: impl Fn(&E, StopPosition) -> i32 + Send + Sync + 'static) -> Self {
        self.costs.push(Box::new(cost));
        self
    }
}

impl<E> Default for MinCostFilterChain<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for MinCostFilterChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinCostFilterChain")
            .field("costs", &self.costs.len())
            .finish()
    }
}

impl<T: TripSchedule> MinCostFilterChain<OptimizedPathTail<T>> {
    /// Transfer priority first, then wait-time optimized cost, then the
    /// earliest transfers.
    pub fn transfer_optimization() -> Self {
        Self::new()
            .with_cost(|tail: &OptimizedPathTail<T>, _| tail.transfer_priority_cost())
            .with_cost(|tail: &OptimizedPathTail<T>, pos| tail.wait_time_optimized_cost_at(pos))
            .with_cost(|tail: &OptimizedPathTail<T>, _| tail.break_tie_cost())
    }
}

impl<E> PathTailFilter<E> for MinCostFilterChain<E> {
    fn filter(&self, mut elements: Vec<E>, board_pos: StopPosition) -> Vec<E> {
        for cost in &self.costs {
            if elements.len() < 2 {
                break;
            }
            let values: Vec<i32> = elements.iter().map(|e| cost(e, board_pos)).collect();
            let Some(&min) = values.iter().min() else {
                break;
            };
            elements = elements
                .into_iter()
                .zip(values)
                .filter_map(|(e, value)| (value == min).then_some(e))
                .collect();
        }
        elements
    }
}

/// Keep the elements not dominated on the given criteria, lower being
/// better for each.
pub struct ParetoTailFilter<E> {
    criteria: Vec<CostFn<E>>,
}

impl<E> ParetoTailFilter<E> {
    pub fn new(criteria: Vec<CostFn<E>>) -> Self {
        Self { criteria }
    }
}

impl<E> fmt::Debug for ParetoTailFilter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParetoTailFilter")
            .field("criteria", &self.criteria.len())
            .finish()
    }
}

impl<E> PathTailFilter<E> for ParetoTailFilter<E> {
    fn filter(&self, elements: Vec<E>, board_pos: StopPosition) -> Vec<E> {
        let keys: Vec<(Vec<i32>, usize)> = elements
            .iter()
            .enumerate()
            .map(|(i, e)| (self.criteria.iter().map(|c| c(e, board_pos)).collect(), i))
            .collect();

        let better = |l: &(Vec<i32>, usize), r: &(Vec<i32>, usize)| l.0.iter().zip(&r.0).any(|(a, b)| a < b);
        let mut kept: Vec<usize> = pareto_filter(keys, better, TiePolicy::KeepDistinct)
            .into_iter()
            .map(|(_, i)| i)
            .collect();
        kept.sort_unstable();

        let mut kept = kept.into_iter().peekable();
        elements
            .into_iter()
            .enumerate()
            .filter_map(|(i, e)| {
                if kept.peek() == Some(&i) {
                    kept.next();
                    Some(e)
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Run an inner filter, then give every kept tail a c2.
///
/// The assigned c2 replaces the one the search computed for the original
/// path.
pub struct AssignC2Filter<F, T> {
    inner: F,
    c2: CostFn<OptimizedPathTail<T>>,
}

impl<F, T> AssignC2Filter<F, T> {
    pub fn new(inner: F, c2: impl Fn(&OptimizedPathTail<T>, StopPosition) -> i32 + Send + Sync + 'static) -> Self {
        Self {
            inner,
            c2: Box::new(c2),
        }
    }
}

impl<F: fmt::Debug, T> fmt::Debug for AssignC2Filter<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssignC2Filter")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<F, T> PathTailFilter<OptimizedPathTail<T>> for AssignC2Filter<F, T>
where
    F: PathTailFilter<OptimizedPathTail<T>>,
    T: TripSchedule,
{
    fn filter(&self, elements: Vec<OptimizedPathTail<T>>, board_pos: StopPosition) -> Vec<OptimizedPathTail<T>> {
        let mut kept = self.inner.filter(elements, board_pos);
        for tail in &mut kept {
            let c2 = (self.c2)(tail, board_pos);
            tail.set_c2(c2);
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    type Element = (i32, i32, i32);

    fn chain() -> MinCostFilterChain<Element> {
        MinCostFilterChain::new()
            .with_cost(|e: &Element, _| e.0)
            .with_cost(|e: &Element, _| e.1)
    }

    fn pareto() -> ParetoTailFilter<Element> {
        ParetoTailFilter::new(vec![
            Box::new(|e: &Element, _: StopPosition| e.0),
            Box::new(|e: &Element, _: StopPosition| e.1),
        ])
    }

    #[test]
    fn chain_breaks_ties_in_order() {
        let kept = chain().filter(vec![(2, 0, 0), (1, 5, 1), (1, 3, 2), (1, 3, 3)], StopPosition(0));
        assert_eq!(kept, vec![(1, 3, 2), (1, 3, 3)]);
    }

    #[test]
    fn chain_sees_board_position() {
        let filter = MinCostFilterChain::new().with_cost(|e: &Element, pos: StopPosition| (e.0 - pos.0 as i32).abs());
        assert_eq!(filter.filter(vec![(1, 0, 0), (4, 0, 1)], StopPosition(3)), vec![(4, 0, 1)]);
    }

    #[test]
    fn empty_chain_keeps_everything() {
        let elements = vec![(3, 0, 0), (1, 0, 1)];
        assert_eq!(MinCostFilterChain::new().filter(elements.clone(), StopPosition(0)), elements);
    }

    #[test]
    fn pareto_keeps_trade_offs() {
        let kept = pareto().filter(vec![(1, 5, 0), (2, 2, 1), (3, 3, 2), (5, 1, 3)], StopPosition(0));
        assert_eq!(kept, vec![(1, 5, 0), (2, 2, 1), (5, 1, 3)]);
    }

    proptest! {
        #[test]
        fn filters_are_idempotent(
            elements in prop::collection::vec((0..5i32, 0..5i32, any::<i32>()), 0..12),
            pos in 0..4usize,
        ) {
            let pos = StopPosition(pos);
            let (chain, pareto) = (chain(), pareto());
            let filters: [&dyn PathTailFilter<Element>; 2] = [&chain, &pareto];
            for filter in filters {
                let once = filter.filter(elements.clone(), pos);
                let twice = filter.filter(once.clone(), pos);
                prop_assert_eq!(&once, &twice);
                prop_assert_eq!(once.is_empty(), elements.is_empty());
                prop_assert!(once.iter().all(|e| elements.contains(e)));
            }
        }
    }
}
