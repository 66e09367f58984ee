//! Typed search errors.
//!
//! `SearchError` represents pre-flight failures only. Runtime terminations
//! (goal reached, exhaustion, budget ceilings, caught callback panics) are
//! expressed via [`crate::search::SearchOutcome`] and always come with a
//! [`crate::report::SearchReport`].

/// Typed failure for pre-flight search validation.
///
/// These errors are returned before any state is expanded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The budget cannot admit even the root state.
    #[error("invalid search budget: {detail}")]
    InvalidBudget { detail: String },
    /// Monte Carlo estimation was asked for zero rollouts.
    #[error("sampling requires at least one rollout")]
    NoRollouts,
}
