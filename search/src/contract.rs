//! Search space contract.

use levelcert_kernel::carrier::quantize::Precision;

use crate::key::DedupKey;

/// A successful transition: the next state and its non-negative step cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    pub state: S,
    pub cost: u32,
}

impl<S> Transition<S> {
    /// A unit-cost step.
    pub fn step(state: S) -> Self {
        Self { state, cost: 1 }
    }
}

/// Trait for puzzles that support bounded reachability search.
///
/// `State` is the solvability projection of a world (agent position,
/// movable-object layout, discovered set), never the full document.
///
/// # Contract
///
/// - All four methods are pure: same input, same output, no hidden RNG.
/// - `actions` enumerates in a fixed order. That order is the engine's
///   tie-break among equal-depth successors.
/// - `transition` returns `None` for invalid moves (wall, boundary,
///   out-of-range); the engine counts and skips them.
/// - `dedup_key` must quantize every continuous field (see
///   [`crate::key::DedupKeyBuilder`]); report the precision through
///   [`SearchSpace::precision`].
pub trait SearchSpace {
    type State: Clone;
    type Action: Clone;

    /// Enumerate candidate actions from `state`, in tie-break order.
    fn actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Apply `action`, or `None` when it is invalid from `state`.
    fn transition(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Option<Transition<Self::State>>;

    fn is_goal(&self, state: &Self::State) -> bool;

    fn dedup_key(&self, state: &Self::State) -> DedupKey;

    /// Distance-to-goal estimate used only to rank frontier entries when the
    /// frontier must be truncated. Lower is kept first.
    fn heuristic(&self, _state: &Self::State) -> u64 {
        0
    }

    /// Quantization precision used by `dedup_key`, if any float is involved.
    fn precision(&self) -> Option<Precision> {
        None
    }
}

/// Closure-backed [`SearchSpace`] for ad-hoc searches and tests.
pub struct FnSearchSpace<S, A, FA, FT, FG, FK> {
    actions: FA,
    transition: FT,
    goal: FG,
    key: FK,
    precision: Option<Precision>,
    _marker: std::marker::PhantomData<fn(S) -> A>,
}

impl<S, A, FA, FT, FG, FK> FnSearchSpace<S, A, FA, FT, FG, FK>
where
    S: Clone,
    A: Clone,
    FA: Fn(&S) -> Vec<A>,
    FT: Fn(&S, &A) -> Option<Transition<S>>,
    FG: Fn(&S) -> bool,
    FK: Fn(&S) -> DedupKey,
{
    pub fn new(actions: FA, transition: FT, goal: FG, key: FK) -> Self {
        Self {
            actions,
            transition,
            goal,
            key,
            precision: None,
            _marker: std::marker::PhantomData,
        }
    }

    #[must_use]
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = Some(precision);
        self
    }
}

impl<S, A, FA, FT, FG, FK> SearchSpace for FnSearchSpace<S, A, FA, FT, FG, FK>
where
    S: Clone,
    A: Clone,
    FA: Fn(&S) -> Vec<A>,
    FT: Fn(&S, &A) -> Option<Transition<S>>,
    FG: Fn(&S) -> bool,
    FK: Fn(&S) -> DedupKey,
{
    type State = S;
    type Action = A;

    fn actions(&self, state: &S) -> Vec<A> {
        (self.actions)(state)
    }

    fn transition(&self, state: &S, action: &A) -> Option<Transition<S>> {
        (self.transition)(state, action)
    }

    fn is_goal(&self, state: &S) -> bool {
        (self.goal)(state)
    }

    fn dedup_key(&self, state: &S) -> DedupKey {
        (self.key)(state)
    }

    fn precision(&self) -> Option<Precision> {
        self.precision
    }
}
