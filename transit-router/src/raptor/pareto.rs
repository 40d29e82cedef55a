//! Pareto set with pluggable dominance.

/// Compares two elements criterion by criterion.
pub trait ParetoComparator<E> {
    /// Whether `left` is strictly better than `right` in at least one
    /// criterion.
    fn left_dominance_exist(&self, left: &E, right: &E) -> bool;

    /// `left` dominates `right`: better in at least one criterion and
    /// worse in none.
    fn dominates(&self, left: &E, right: &E) -> bool {
        self.left_dominance_exist(left, right) && !self.left_dominance_exist(right, left)
    }

    /// Equal in every criterion.
    fn is_tie(&self, left: &E, right: &E) -> bool {
        !self.left_dominance_exist(left, right) && !self.left_dominance_exist(right, left)
    }
}

impl<E, F> ParetoComparator<E> for F
where
    F: Fn(&E, &E) -> bool,
{
    fn left_dominance_exist(&self, left: &E, right: &E) -> bool {
        self(left, right)
    }
}

/// What to do with an element that ties an existing one in every criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiePolicy {
    /// Keep ties unless the element is an exact duplicate.
    #[default]
    KeepDistinct,
    /// Keep only the first of a set of tied elements.
    RejectEqual,
}

/// Set of mutually non-dominated elements.
#[derive(Debug, Clone)]
pub struct ParetoSet<E, C> {
    elements: Vec<E>,
    comparator: C,
    tie_policy: TiePolicy,
}

impl<E: PartialEq, C: ParetoComparator<E>> ParetoSet<E, C> {
    pub fn new(comparator: C) -> Self {
        Self::with_tie_policy(comparator, TiePolicy::default())
    }

    pub fn with_tie_policy(comparator: C, tie_policy: TiePolicy) -> Self {
        Self {
            elements: Vec::new(),
            comparator,
            tie_policy,
        }
    }

    /// Offer `candidate` to the set.
    ///
    /// Returns false if an existing element dominates it or the tie policy
    /// rejects it. Otherwise every element the candidate dominates is
    /// removed and the candidate is inserted.
    pub fn add(&mut self, candidate: E) -> bool {
        if !self.qualifies(&candidate) {
            return false;
        }

        let comparator = &self.comparator;
        self.elements
            .retain(|existing| !comparator.dominates(&candidate, existing));
        self.elements.push(candidate);
        true
    }

    /// Whether [`Self::add`] would insert `candidate`.
    pub fn qualifies(&self, candidate: &E) -> bool {
        for existing in &self.elements {
            if self.comparator.dominates(existing, candidate) {
                return false;
            }
            if self.comparator.is_tie(existing, candidate) {
                match self.tie_policy {
                    TiePolicy::RejectEqual => return false,
                    TiePolicy::KeepDistinct if existing == candidate => return false,
                    TiePolicy::KeepDistinct => {}
                }
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.elements.iter()
    }

    pub fn elements(&self) -> &[E] {
        &self.elements
    }

    pub fn into_vec(self) -> Vec<E> {
        self.elements
    }
}

/// Keep the non-dominated elements of `elements`.
pub fn pareto_filter<E: PartialEq, C: ParetoComparator<E>>(
    elements: Vec<E>,
    comparator: C,
    tie_policy: TiePolicy,
) -> Vec<E> {
    let mut set = ParetoSet::with_tie_policy(comparator, tie_policy);
    for element in elements {
        set.add(element);
    }
    set.into_vec()
}
