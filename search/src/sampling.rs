//! Monte Carlo solvability estimate.
//!
//! Random rollouts give a lower-confidence hit rate, never a verdict, so the
//! result is its own type rather than a [`crate::search::SearchOutcome`].

use std::panic::{catch_unwind, AssertUnwindSafe};

use levelcert_kernel::carrier::rng::RngContext;

use crate::contract::SearchSpace;
use crate::error::SearchError;

/// Two-sided 95% normal quantile.
const WILSON_Z: f64 = 1.96;

/// Aggregate of random-walk rollouts.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledOutcome {
    pub trials: u32,
    pub hits: u32,
    /// Rollouts that ended early because a callback panicked.
    pub aborted: u32,
    pub hit_rate: f64,
    /// Lower bound of the Wilson score interval at 95% confidence.
    pub wilson_lower_bound: f64,
    /// Mean walk length among hits.
    pub mean_hit_depth: Option<f64>,
}

/// Run `rollouts` random walks of at most `max_depth` steps from `start`.
///
/// Each step picks uniformly among the actions whose transition is valid.
/// A walk stops at a goal, at a dead end, or at `max_depth`.
///
/// # Errors
///
/// Returns [`SearchError::NoRollouts`] when `rollouts` is zero.
pub fn estimate<W>(
    space: &W,
    start: &W::State,
    rollouts: u32,
    max_depth: u32,
    rng: &mut RngContext,
) -> Result<SampledOutcome, SearchError>
where
    W: SearchSpace + ?Sized,
{
    if rollouts == 0 {
        return Err(SearchError::NoRollouts);
    }

    let mut hits = 0_u32;
    let mut aborted = 0_u32;
    let mut hit_depth_sum = 0_u64;

    for _ in 0..rollouts {
        match catch_unwind(AssertUnwindSafe(|| rollout(space, start, max_depth, rng))) {
            Ok(Some(depth)) => {
                hits += 1;
                hit_depth_sum += u64::from(depth);
            }
            Ok(None) => {}
            Err(_) => aborted += 1,
        }
    }

    let hit_rate = f64::from(hits) / f64::from(rollouts);
    let mean_hit_depth = (hits > 0).then(|| {
        #[allow(clippy::cast_precision_loss)]
        let sum = hit_depth_sum as f64;
        sum / f64::from(hits)
    });

    tracing::debug!(rollouts, hits, aborted, hit_rate, "rollout estimate finished");

    Ok(SampledOutcome {
        trials: rollouts,
        hits,
        aborted,
        hit_rate,
        wilson_lower_bound: wilson_lower_bound(hits, rollouts),
        mean_hit_depth,
    })
}

fn rollout<W>(space: &W, start: &W::State, max_depth: u32, rng: &mut RngContext) -> Option<u32>
where
    W: SearchSpace + ?Sized,
{
    let mut state = start.clone();
    for depth in 0..=max_depth {
        if space.is_goal(&state) {
            return Some(depth);
        }
        if depth == max_depth {
            break;
        }
        let successors: Vec<W::State> = space
            .actions(&state)
            .iter()
            .filter_map(|a| space.transition(&state, a))
            .map(|t| t.state)
            .collect();
        let pick = rng.gen_index(successors.len())?;
        state = successors.into_iter().nth(pick)?;
    }
    None
}

/// Wilson score lower bound for `hits` out of `trials`.
#[must_use]
pub fn wilson_lower_bound(hits: u32, trials: u32) -> f64 {
    if hits == 0 || trials == 0 {
        return 0.0;
    }
    let n = f64::from(trials);
    let p = f64::from(hits) / n;
    let z2 = WILSON_Z * WILSON_Z;
    let centre = p + z2 / (2.0 * n);
    let margin = WILSON_Z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();
    ((centre - margin) / (1.0 + z2 / n)).max(0.0)
}
