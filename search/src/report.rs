//! `SearchReport`: counters and termination audit for one search.
//!
//! The report is the only artifact a search leaves behind besides its
//! outcome and witness. It serializes to canonical JSON so two runs with
//! identical inputs can be compared byte for byte.

use levelcert_kernel::carrier::quantize::Precision;
use levelcert_kernel::proof::canon::{canonical_json_bytes, CanonError};
use levelcert_kernel::proof::hash::{canonical_hash, ContentHash, HashDomain};

use crate::policy::Budget;
use crate::search::SearchOutcome;

/// Why the search loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// A dequeued node satisfied the goal predicate.
    GoalReached { node_id: u64 },
    /// The frontier emptied.
    FrontierExhausted,
    /// A new state needed admission after `max_visited` keys.
    VisitedBudgetExceeded,
    /// A search-space callback panicked; the panic was caught.
    InternalPanic { stage: PanicStage },
}

/// Callback in which a panic was caught.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanicStage {
    IsGoal,
    Actions,
    Transition,
    DedupKey,
    Heuristic,
}

impl PanicStage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IsGoal => "is_goal",
            Self::Actions => "actions",
            Self::Transition => "transition",
            Self::DedupKey => "dedup_key",
            Self::Heuristic => "heuristic",
        }
    }
}

/// Aggregate counters for one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub termination_reason: TerminationReason,
    /// Nodes whose successors were generated below the depth ceiling.
    pub expansions: u64,
    /// Nodes at `max_depth` probed for unvisited successors.
    pub depth_cutoff_nodes: u64,
    /// Valid transitions computed (including duplicates).
    pub transitions_generated: u64,
    /// Transitions the space rejected (`None`).
    pub invalid_transitions: u64,
    /// Valid transitions whose dedup key was already visited.
    pub duplicates_suppressed: u64,
    /// Nodes admitted, including the root.
    pub nodes_created: u64,
    /// Number of truncation events.
    pub frontier_prunes: u64,
    /// Nodes dropped by truncation.
    pub pruned_nodes: u64,
    pub frontier_high_water: u64,
    /// Distinct dedup keys admitted.
    pub visited: u64,
    pub budget: Budget,
    /// Quantization precision declared by the search space.
    pub precision: Option<Precision>,
    /// Fingerprint of the root's dedup key (empty if the key callback panicked).
    pub root_fingerprint: String,
}

impl SearchReport {
    /// Convert to a `serde_json::Value` with integer-only numbers.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "budget": {
                "max_depth": self.budget.max_depth,
                "max_frontier_size": self.budget.max_frontier_size,
                "max_visited": self.budget.max_visited,
            },
            "counters": {
                "depth_cutoff_nodes": self.depth_cutoff_nodes,
                "duplicates_suppressed": self.duplicates_suppressed,
                "expansions": self.expansions,
                "frontier_high_water": self.frontier_high_water,
                "frontier_prunes": self.frontier_prunes,
                "invalid_transitions": self.invalid_transitions,
                "nodes_created": self.nodes_created,
                "pruned_nodes": self.pruned_nodes,
                "transitions_generated": self.transitions_generated,
                "visited": self.visited,
            },
            "outcome": outcome_to_json(&self.outcome),
            "precision_decimals": self.precision.map(Precision::decimals),
            "root_fingerprint": self.root_fingerprint,
            "termination_reason": termination_reason_to_json(&self.termination_reason),
        })
    }

    /// Serialize the report to canonical JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError`] if serialization fails.
    pub fn to_canonical_json_bytes(&self) -> Result<Vec<u8>, CanonError> {
        canonical_json_bytes(&self.to_json_value())
    }

    /// Domain-separated digest of the canonical bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CanonError`] if serialization fails.
    pub fn digest(&self) -> Result<ContentHash, CanonError> {
        let bytes = self.to_canonical_json_bytes()?;
        Ok(canonical_hash(HashDomain::SearchReport, &bytes))
    }
}

/// JSON form of an outcome (`{"type": ..., ...}`).
#[must_use]
pub fn outcome_to_json(o: &SearchOutcome) -> serde_json::Value {
    match o {
        SearchOutcome::Reached { depth, cost } => {
            serde_json::json!({"cost": cost, "depth": depth, "type": "reached"})
        }
        SearchOutcome::Unreachable => serde_json::json!({"type": "unreachable"}),
        SearchOutcome::BudgetExceeded { ceiling } => {
            serde_json::json!({"ceiling": ceiling.as_str(), "type": "budget_exceeded"})
        }
        SearchOutcome::Aborted { stage } => {
            serde_json::json!({"stage": stage.as_str(), "type": "aborted"})
        }
    }
}

fn termination_reason_to_json(r: &TerminationReason) -> serde_json::Value {
    match r {
        TerminationReason::GoalReached { node_id } => {
            serde_json::json!({"node_id": node_id, "type": "goal_reached"})
        }
        TerminationReason::FrontierExhausted => serde_json::json!({"type": "frontier_exhausted"}),
        TerminationReason::VisitedBudgetExceeded => {
            serde_json::json!({"type": "visited_budget_exceeded"})
        }
        TerminationReason::InternalPanic { stage } => {
            serde_json::json!({"stage": stage.as_str(), "type": "internal_panic"})
        }
    }
}
