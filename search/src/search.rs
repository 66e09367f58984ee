//! Search entry point and expansion loop.
//!
//! Breadth-first and bounded. The goal predicate runs when a node is
//! dequeued, so the first goal found is at minimal depth. Tie-break among
//! equal-depth successors is the space's action enumeration order.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use levelcert_kernel::carrier::quantize::Precision;

use crate::contract::SearchSpace;
use crate::error::SearchError;
use crate::frontier::BreadthFirstFrontier;
use crate::node::SearchNode;
use crate::policy::{Budget, Ceiling};
use crate::report::{PanicStage, SearchReport, TerminationReason};

/// Three-valued solvability verdict (plus caught panics).
///
/// `Unreachable` is a proof over the bounded space: it is only produced when
/// the reachable space was exhausted without truncation, without a depth
/// cutoff hiding an unvisited successor, and without hitting the visited
/// ceiling. Every lossy termination is `BudgetExceeded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A goal state was dequeued `depth` transitions from the start.
    Reached { depth: u32, cost: u64 },
    Unreachable,
    BudgetExceeded { ceiling: Ceiling },
    /// A search-space callback panicked. Never treated as unsolvable.
    Aborted { stage: PanicStage },
}

impl SearchOutcome {
    #[must_use]
    pub fn is_reached(&self) -> bool {
        matches!(self, Self::Reached { .. })
    }

    /// `true` for `Reached` and `Unreachable`.
    #[must_use]
    pub fn is_conclusive(&self) -> bool {
        matches!(self, Self::Reached { .. } | Self::Unreachable)
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Reached { .. } => "reached",
            Self::Unreachable => "unreachable",
            Self::BudgetExceeded { .. } => "budget_exceeded",
            Self::Aborted { .. } => "aborted",
        }
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reached { depth, cost } => write!(f, "reached (depth {depth}, cost {cost})"),
            Self::Unreachable => write!(f, "unreachable"),
            Self::BudgetExceeded { ceiling } => {
                write!(f, "budget exceeded ({} ceiling)", ceiling.as_str())
            }
            Self::Aborted { stage } => write!(f, "aborted (panic in {})", stage.as_str()),
        }
    }
}

/// Result of a search execution.
///
/// Always carries a complete [`SearchReport`], however the search ended.
#[derive(Debug, Clone)]
pub struct SearchResult<S, A> {
    pub outcome: SearchOutcome,
    pub report: SearchReport,
    /// The goal node id (if found).
    pub goal_node: Option<u64>,
    /// All nodes created during search, indexed by `node_id`.
    pub nodes: Vec<SearchNode<S, A>>,
}

impl<S: Clone, A: Clone> SearchResult<S, A> {
    #[must_use]
    pub fn is_reached(&self) -> bool {
        self.outcome.is_reached()
    }

    #[must_use]
    pub fn node(&self, node_id: u64) -> Option<&SearchNode<S, A>> {
        self.nodes.get(index_of(node_id))
    }

    /// Action sequence from the start state to the goal.
    #[must_use]
    pub fn witness(&self) -> Option<Vec<A>> {
        let goal = self.goal_node?;
        Some(
            reconstruct_path(&self.nodes, goal)
                .into_iter()
                .filter_map(|id| self.node(id).and_then(|n| n.producing_action.clone()))
                .collect(),
        )
    }

    /// States along the witness path, start state first.
    #[must_use]
    pub fn witness_states(&self) -> Option<Vec<S>> {
        let goal = self.goal_node?;
        Some(
            reconstruct_path(&self.nodes, goal)
                .into_iter()
                .filter_map(|id| self.node(id).map(|n| n.state.clone()))
                .collect(),
        )
    }
}

/// Reconstruct the node-id path from root to `goal_node_id`.
#[must_use]
pub fn reconstruct_path<S, A>(nodes: &[SearchNode<S, A>], goal_node_id: u64) -> Vec<u64> {
    let mut path = Vec::new();
    let mut current_id = Some(goal_node_id);

    while let Some(id) = current_id {
        path.push(id);
        current_id = nodes.get(index_of(id)).and_then(|n| n.parent_id);
    }

    path.reverse();
    path
}

#[derive(Debug, Default)]
struct Counters {
    expansions: u64,
    depth_cutoff_nodes: u64,
    transitions_generated: u64,
    invalid_transitions: u64,
    duplicates_suppressed: u64,
    frontier_prunes: u64,
    pruned_nodes: u64,
    depth_ceiling_hit: bool,
}

/// Decide whether a goal is reachable from `start` within `budget`.
///
/// The loop:
/// 1. Pop the oldest frontier node and test the goal predicate.
/// 2. Below `max_depth`, generate every valid successor in action order,
///    skip visited keys, and admit the rest (failing on the visited ceiling).
/// 3. At `max_depth`, probe successors only: one unvisited valid successor
///    marks the depth ceiling as hit.
/// 4. If the frontier outgrew `max_frontier_size`, truncate it by
///    `(heuristic, depth, node_id)`.
///
/// Every callback runs under `catch_unwind`; a panic ends the search with
/// [`SearchOutcome::Aborted`].
///
/// # Errors
///
/// Returns [`SearchError::InvalidBudget`] if the budget fails pre-flight
/// validation. All runtime terminations are reported in the result.
pub fn reachable<W>(
    space: &W,
    start: W::State,
    budget: &Budget,
) -> Result<SearchResult<W::State, W::Action>, SearchError>
where
    W: SearchSpace + ?Sized,
{
    budget.validate()?;

    let mut counters = Counters::default();
    let mut frontier = BreadthFirstFrontier::new();
    let mut nodes: Vec<SearchNode<W::State, W::Action>> = Vec::new();

    let Some(root_key) = guarded(|| space.dedup_key(&start)) else {
        nodes.push(root_node(start));
        return Ok(finish(
            nodes,
            &frontier,
            &counters,
            TerminationReason::InternalPanic {
                stage: PanicStage::DedupKey,
            },
            budget,
            space.precision(),
            String::new(),
        ));
    };
    let root_fingerprint = root_key.fingerprint().as_str().to_string();
    nodes.push(root_node(start));
    frontier.push(0, 0, root_key);

    let termination = loop {
        let Some(current_id) = frontier.pop() else {
            break TerminationReason::FrontierExhausted;
        };
        let current = &nodes[index_of(current_id)];
        let (depth, cost) = (current.depth, current.cost);

        match guarded(|| space.is_goal(&current.state)) {
            Some(true) => break TerminationReason::GoalReached { node_id: current_id },
            Some(false) => {}
            None => {
                break TerminationReason::InternalPanic {
                    stage: PanicStage::IsGoal,
                }
            }
        }

        let Some(actions) = guarded(|| space.actions(&current.state)) else {
            break TerminationReason::InternalPanic {
                stage: PanicStage::Actions,
            };
        };

        let at_cutoff = depth >= budget.max_depth;
        if at_cutoff {
            counters.depth_cutoff_nodes += 1;
        } else {
            counters.expansions += 1;
        }

        let parent_state = current.state.clone();
        let mut stop: Option<TerminationReason> = None;

        for action in actions {
            let next = match guarded(|| space.transition(&parent_state, &action)) {
                Some(Some(t)) => t,
                Some(None) => {
                    counters.invalid_transitions += 1;
                    continue;
                }
                None => {
                    stop = Some(TerminationReason::InternalPanic {
                        stage: PanicStage::Transition,
                    });
                    break;
                }
            };
            counters.transitions_generated += 1;

            let Some(key) = guarded(|| space.dedup_key(&next.state)) else {
                stop = Some(TerminationReason::InternalPanic {
                    stage: PanicStage::DedupKey,
                });
                break;
            };
            if frontier.is_visited(&key) {
                counters.duplicates_suppressed += 1;
                continue;
            }

            if at_cutoff {
                // Breadth-first order admits every state within max_depth
                // before any cutoff node is popped, so this successor is
                // genuinely beyond the ceiling.
                counters.depth_ceiling_hit = true;
                break;
            }
            if frontier.visited_len() >= budget.max_visited {
                stop = Some(TerminationReason::VisitedBudgetExceeded);
                break;
            }

            let child_id = nodes.len() as u64;
            nodes.push(SearchNode {
                node_id: child_id,
                parent_id: Some(current_id),
                state: next.state,
                depth: depth + 1,
                cost: cost.saturating_add(u64::from(next.cost)),
                producing_action: Some(action),
            });
            frontier.push(child_id, depth + 1, key);
        }

        if let Some(reason) = stop {
            break reason;
        }

        if frontier.len() > budget.max_frontier_size {
            let max = budget.max_frontier_size;
            let arena = &nodes;
            let pruned = guarded(|| {
                frontier.prune_to(max, |id| space.heuristic(&arena[index_of(id)].state))
            });
            match pruned {
                Some(ids) => {
                    counters.frontier_prunes += 1;
                    counters.pruned_nodes += ids.len() as u64;
                }
                None => {
                    break TerminationReason::InternalPanic {
                        stage: PanicStage::Heuristic,
                    }
                }
            }
        }
    };

    Ok(finish(
        nodes,
        &frontier,
        &counters,
        termination,
        budget,
        space.precision(),
        root_fingerprint,
    ))
}

fn root_node<S, A>(state: S) -> SearchNode<S, A> {
    SearchNode {
        node_id: 0,
        parent_id: None,
        state,
        depth: 0,
        cost: 0,
        producing_action: None,
    }
}

fn guarded<T>(f: impl FnOnce() -> T) -> Option<T> {
    catch_unwind(AssertUnwindSafe(f)).ok()
}

#[allow(clippy::cast_possible_truncation)]
fn index_of(node_id: u64) -> usize {
    node_id as usize
}

fn outcome_of<S, A>(
    termination: TerminationReason,
    nodes: &[SearchNode<S, A>],
    counters: &Counters,
) -> SearchOutcome {
    match termination {
        TerminationReason::GoalReached { node_id } => {
            let (depth, cost) = nodes
                .get(index_of(node_id))
                .map_or((0, 0), |n| (n.depth, n.cost));
            SearchOutcome::Reached { depth, cost }
        }
        TerminationReason::FrontierExhausted => {
            if counters.frontier_prunes > 0 {
                SearchOutcome::BudgetExceeded {
                    ceiling: Ceiling::Frontier,
                }
            } else if counters.depth_ceiling_hit {
                SearchOutcome::BudgetExceeded {
                    ceiling: Ceiling::Depth,
                }
            } else {
                SearchOutcome::Unreachable
            }
        }
        TerminationReason::VisitedBudgetExceeded => SearchOutcome::BudgetExceeded {
            ceiling: Ceiling::Visited,
        },
        TerminationReason::InternalPanic { stage } => SearchOutcome::Aborted { stage },
    }
}

fn finish<S, A>(
    nodes: Vec<SearchNode<S, A>>,
    frontier: &BreadthFirstFrontier,
    counters: &Counters,
    termination: TerminationReason,
    budget: &Budget,
    precision: Option<Precision>,
    root_fingerprint: String,
) -> SearchResult<S, A> {
    let outcome = outcome_of(termination, &nodes, counters);
    let goal_node = match termination {
        TerminationReason::GoalReached { node_id } => Some(node_id),
        _ => None,
    };

    let report = SearchReport {
        outcome,
        termination_reason: termination,
        expansions: counters.expansions,
        depth_cutoff_nodes: counters.depth_cutoff_nodes,
        transitions_generated: counters.transitions_generated,
        invalid_transitions: counters.invalid_transitions,
        duplicates_suppressed: counters.duplicates_suppressed,
        nodes_created: nodes.len() as u64,
        frontier_prunes: counters.frontier_prunes,
        pruned_nodes: counters.pruned_nodes,
        frontier_high_water: frontier.high_water() as u64,
        visited: frontier.visited_len() as u64,
        budget: *budget,
        precision,
        root_fingerprint,
    };

    tracing::debug!(
        outcome = %outcome,
        expansions = report.expansions,
        visited = report.visited,
        frontier_prunes = report.frontier_prunes,
        "search finished"
    );

    SearchResult {
        outcome,
        report,
        goal_node,
        nodes,
    }
}
