//! Witness replay: re-simulate a solution path through the search space.
//!
//! A `Reached` verdict is only trusted once its witness replays from the
//! start state to a goal using the same `transition` callback.

use levelcert_search::SearchSpace;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// `transition` rejected the action at this witness position.
    #[error("witness action {step} is invalid from the replayed state")]
    InvalidAction { step: usize },
    /// The replay ended on a non-goal state.
    #[error("witness of length {length} does not end at a goal")]
    GoalNotReached { length: usize },
}

/// Apply `actions` from `start` and require the final state to be a goal.
///
/// Returns the final state and the summed transition cost.
///
/// # Errors
///
/// Returns [`ReplayError`] when an action is invalid or the last state is
/// not a goal.
pub fn replay_witness<W>(
    space: &W,
    start: &W::State,
    actions: &[W::Action],
) -> Result<(W::State, u64), ReplayError>
where
    W: SearchSpace + ?Sized,
{
    let mut state = start.clone();
    let mut cost = 0_u64;
    for (step, action) in actions.iter().enumerate() {
        let next = space
            .transition(&state, action)
            .ok_or(ReplayError::InvalidAction { step })?;
        cost = cost.saturating_add(u64::from(next.cost));
        state = next.state;
    }
    if space.is_goal(&state) {
        Ok((state, cost))
    } else {
        Err(ReplayError::GoalNotReached {
            length: actions.len(),
        })
    }
}
