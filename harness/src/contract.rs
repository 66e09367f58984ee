//! Level domain contract: what a puzzle family must provide.
//!
//! A domain supplies its generation steps, its structural schema, a reward
//! schedule, a solvability projection, deterministic narrowing and a
//! hand-verified fallback world. Domains do NOT implement search, retry,
//! persistence or reporting; those are engine and runner concerns.

use std::fmt::Debug;

use levelcert_kernel::carrier::world::WorldState;
use levelcert_search::{reachable, Budget, SearchOutcome, SearchReport, SearchSpace};

use crate::pipeline::StepRegistry;
use crate::report::IssueKind;
use crate::reward::RewardSchedule;
use crate::schema::Schema;
use crate::template::WorldTemplate;
use crate::witness::replay_witness;

/// A world could not be projected, or its search result cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    /// The world does not describe a valid search space or reward schedule.
    #[error("projection failed: {detail}")]
    Malformed { detail: String },

    #[error("search budget rejected: {detail}")]
    InvalidBudget { detail: String },

    /// The engine returned a witness that does not replay to a goal.
    #[error("witness replay failed: {detail}")]
    WitnessReplay { detail: String },
}

impl ProjectionError {
    /// A [`ProjectionError::Malformed`] error.
    pub fn new(detail: impl Into<String>) -> Self {
        Self::Malformed {
            detail: detail.into(),
        }
    }

    /// How the verifier files this error.
    ///
    /// Only a malformed world is a schema problem. A rejected budget or an
    /// unreplayable witness leaves the search verdict unproven.
    #[must_use]
    pub fn issue_kind(&self) -> IssueKind {
        match self {
            Self::Malformed { .. } => IssueKind::SchemaViolation,
            Self::InvalidBudget { .. } | Self::WitnessReplay { .. } => IssueKind::BudgetExceeded,
        }
    }
}

/// Type-erased result of one solvability search.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvabilityCheck {
    pub outcome: SearchOutcome,
    pub report: SearchReport,
    /// Rendered witness actions, when a goal was reached.
    pub witness: Option<Vec<String>>,
}

/// The contract a puzzle family implements to be generated and verified.
///
/// All methods are pure functions of their inputs.
pub trait LevelDomain: Send + Sync {
    /// Unique domain identifier (e.g. `"grid_maze"`).
    fn domain_id(&self) -> &str;

    /// Transforms available to this domain's templates.
    fn step_registry(&self) -> StepRegistry;

    fn schema(&self) -> Schema;

    /// The built-in template used when none is supplied.
    fn default_template(&self) -> WorldTemplate;

    /// # Errors
    ///
    /// Returns [`ProjectionError`] if the schedule cannot be read from `world`.
    fn reward_schedule(&self, world: &WorldState) -> Result<RewardSchedule, ProjectionError>;

    /// Project `world` into a search space and run the engine.
    ///
    /// Only called on worlds that passed [`LevelDomain::schema`].
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] if `world` cannot be projected.
    fn solvability(
        &self,
        world: &WorldState,
        budget: &Budget,
    ) -> Result<SolvabilityCheck, ProjectionError>;

    /// Deterministically loosen `template` for narrowing round `round`
    /// (starting at 1). `None` means no further narrowing is possible.
    fn narrow(&self, template: &WorldTemplate, round: u32) -> Option<WorldTemplate>;

    /// A statically known, minimal world that is solvable by construction.
    fn fallback_world(&self) -> WorldState;
}

/// Run the engine over `space` and replay any witness it returns.
///
/// Shared by domain `solvability` implementations. A witness that does not
/// replay means the space's callbacks are not pure.
///
/// # Errors
///
/// Returns [`ProjectionError`] for an invalid budget or a witness that
/// fails to replay.
pub fn solve<W>(space: &W, start: W::State, budget: &Budget) -> Result<SolvabilityCheck, ProjectionError>
where
    W: SearchSpace + ?Sized,
    W::Action: Debug,
{
    let result = reachable(space, start.clone(), budget).map_err(|e| ProjectionError::InvalidBudget {
        detail: e.to_string(),
    })?;

    let witness = match result.witness() {
        Some(actions) => {
            replay_witness(space, &start, &actions)
                .map_err(|e| ProjectionError::WitnessReplay { detail: e.to_string() })?;
            Some(actions.iter().map(|a| format!("{a:?}")).collect())
        }
        None => None,
    };

    Ok(SolvabilityCheck {
        outcome: result.outcome,
        report: result.report,
        witness,
    })
}
