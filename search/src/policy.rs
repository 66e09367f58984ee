//! Search budget: hard ceilings on search cost.
//!
//! Timeouts are expressed only as these ceilings, never as wall-clock
//! timers, so a verification run is reproducible bit for bit. A search does
//! at most `O(max_frontier_size × max_depth)` expansions before it completes,
//! proves unreachability, or reports which ceiling it hit.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Hard ceilings for one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    /// Nodes at this depth are goal-tested but not expanded.
    pub max_depth: u32,
    /// Frontier truncation threshold (lossy when hit).
    pub max_frontier_size: usize,
    /// Maximum number of distinct dedup keys ever admitted.
    pub max_visited: usize,
}

impl Budget {
    /// Validate pre-flight constraints.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidBudget`] when `max_frontier_size` or
    /// `max_visited` is zero (no search could ever admit the root).
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_frontier_size == 0 {
            return Err(SearchError::InvalidBudget {
                detail: "max_frontier_size must be at least 1".into(),
            });
        }
        if self.max_visited == 0 {
            return Err(SearchError::InvalidBudget {
                detail: "max_visited must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Same budget with a different depth ceiling.
    #[must_use]
    pub fn with_max_depth(self, max_depth: u32) -> Self {
        Self { max_depth, ..self }
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_depth: 100,
            max_frontier_size: 10_000,
            max_visited: 100_000,
        }
    }
}

/// The ceiling that made a search inconclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ceiling {
    /// A node at `max_depth` still had an unvisited valid successor.
    Depth,
    /// The frontier was truncated and the remaining frontier drained.
    Frontier,
    /// A new state needed admission after `max_visited` keys.
    Visited,
}

impl Ceiling {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Depth => "depth",
            Self::Frontier => "frontier",
            Self::Visited => "visited",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_is_valid() {
        Budget::default().validate().unwrap();
    }

    #[test]
    fn zero_frontier_rejected() {
        let budget = Budget {
            max_frontier_size: 0,
            ..Budget::default()
        };
        let err = budget.validate().unwrap_err();
        assert!(
            matches!(err, SearchError::InvalidBudget { .. }),
            "expected InvalidBudget, got {err:?}"
        );
    }

    #[test]
    fn zero_visited_rejected() {
        let budget = Budget {
            max_visited: 0,
            ..Budget::default()
        };
        assert!(budget.validate().is_err());
    }

    #[test]
    fn zero_depth_is_allowed() {
        Budget::default().with_max_depth(0).validate().unwrap();
    }

    #[test]
    fn partial_budget_deserializes_with_defaults() {
        let b: Budget = serde_json::from_str(r#"{"max_depth": 20}"#).unwrap();
        assert_eq!(b.max_depth, 20);
        assert_eq!(b.max_frontier_size, Budget::default().max_frontier_size);
    }
}
