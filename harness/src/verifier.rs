//! Verifier entry point: `validate(world) -> ValidationReport`.
//!
//! Order is fixed: structural check first, then solvability, then reward
//! analysis. A structurally invalid world never reaches the search engine.
//! The search depth is capped at the world's `max_steps`, so an accepted
//! level is solvable inside its own episode.

use levelcert_kernel::carrier::world::WorldState;
use levelcert_search::{Budget, Ceiling, SearchOutcome};

use crate::contract::LevelDomain;
use crate::report::{Issue, IssueKind, ValidationReport};
use crate::reward::{analyze, AnalyzerConfig, EpisodeLimits};
use crate::schema::check;

/// Validates worlds of one domain under a fixed budget and analyzer config.
///
/// Holds no mutable state, so one verifier can be shared across threads.
pub struct Verifier<'a> {
    domain: &'a dyn LevelDomain,
    budget: Budget,
    analyzer: AnalyzerConfig,
}

impl<'a> Verifier<'a> {
    #[must_use]
    pub fn new(domain: &'a dyn LevelDomain, budget: Budget, analyzer: AnalyzerConfig) -> Self {
        Self {
            domain,
            budget,
            analyzer,
        }
    }

    #[must_use]
    pub fn domain(&self) -> &'a dyn LevelDomain {
        self.domain
    }

    #[must_use]
    pub fn validate(&self, world: &WorldState) -> ValidationReport {
        let mut report = check(world, &self.domain.schema());
        if !report.is_valid() {
            return report;
        }

        let limits = match EpisodeLimits::from_world(world) {
            Ok(l) => l,
            Err(detail) => {
                report.push(Issue::critical(IssueKind::SchemaViolation, detail));
                return report;
            }
        };

        // Search no deeper than the episode lets the agent move.
        let episode_bound = limits.max_steps < self.budget.max_depth;
        let budget = self.budget.with_max_depth(self.budget.max_depth.min(limits.max_steps));

        match self.domain.solvability(world, &budget) {
            Ok(solved) => {
                report.search_outcome = Some(solved.outcome.label().to_string());
                report.search_report_digest = solved.report.digest().ok().map(|d| d.to_string());
                match solved.outcome {
                    SearchOutcome::Reached { depth, .. } if depth > limits.max_steps => {
                        report.push(Issue::critical(
                            IssueKind::Unreachable,
                            format!(
                                "shortest solution takes {depth} steps, episode allows {}",
                                limits.max_steps
                            ),
                        ));
                    }
                    SearchOutcome::Reached { depth, .. } => report.solution_depth = Some(depth),
                    SearchOutcome::Unreachable => report.push(Issue::critical(
                        IssueKind::Unreachable,
                        format!(
                            "no goal reachable (exhausted {} states)",
                            solved.report.visited
                        ),
                    )),
                    // A pure depth cutoff at the episode length is exhaustive
                    // for every path the agent could take.
                    SearchOutcome::BudgetExceeded {
                        ceiling: Ceiling::Depth,
                    } if episode_bound => report.push(Issue::critical(
                        IssueKind::Unreachable,
                        format!(
                            "no goal reachable within the {}-step episode ({} states explored)",
                            limits.max_steps, solved.report.visited
                        ),
                    )),
                    SearchOutcome::BudgetExceeded { ceiling } => report.push(Issue::critical(
                        IssueKind::BudgetExceeded,
                        format!(
                            "search inconclusive: {} ceiling hit after {} states",
                            ceiling.as_str(),
                            solved.report.visited
                        ),
                    )),
                    SearchOutcome::Aborted { stage } => report.push(Issue::critical(
                        IssueKind::BudgetExceeded,
                        format!("search aborted: panic in {}", stage.as_str()),
                    )),
                }
            }
            Err(e) => report.push(Issue::critical(e.issue_kind(), e.to_string())),
        }

        match self.domain.reward_schedule(world) {
            Ok(schedule) => report.extend(analyze(&schedule, limits, &self.analyzer)),
            Err(e) => report.push(Issue::critical(e.issue_kind(), e.to_string())),
        }

        tracing::debug!(
            domain = self.domain.domain_id(),
            valid = report.is_valid(),
            issues = report.issues.len(),
            "world validated"
        );
        report
    }
}
