//! Search engine lock tests: reference scenarios, conservativeness under
//! every ceiling, completeness against an independent flood fill, and
//! witness soundness.

use std::collections::VecDeque;

use levelcert_harness::witness::replay_witness;
use levelcert_harness::worlds::grid_maze::{Cell, MazeSpace};
use levelcert_harness::worlds::water_tanks::TankSpace;
use levelcert_kernel::carrier::quantize::Precision;
use levelcert_kernel::carrier::rng::RngContext;
use levelcert_kernel::carrier::world::WorldState;
use levelcert_search::report::TerminationReason;
use levelcert_search::{
    reachable, Budget, Ceiling, DedupKey, FnSearchSpace, PanicStage, SearchOutcome, Transition,
};
use lock_tests::scenarios::{maze_column_wall, maze_single_wall, tanks_classic};

fn project(world: &WorldState) -> (MazeSpace, Cell) {
    MazeSpace::from_world(world).expect("maze projects")
}

// ---------------------------------------------------------------------------
// Reference scenarios
// ---------------------------------------------------------------------------

#[test]
fn single_wall_maze_reaches_in_eight() {
    let (space, agent) = project(&maze_single_wall());
    let result = reachable(&space, agent, &Budget::default()).unwrap();
    assert_eq!(result.outcome, SearchOutcome::Reached { depth: 8, cost: 8 });
    assert_eq!(
        result.report.termination_reason,
        TerminationReason::GoalReached {
            node_id: result.goal_node.unwrap()
        }
    );
    assert_eq!(result.witness().unwrap().len(), 8);
}

#[test]
fn column_wall_maze_is_unreachable_after_ten_states() {
    let (space, agent) = project(&maze_column_wall());
    let result = reachable(&space, agent, &Budget::default()).unwrap();
    assert_eq!(result.outcome, SearchOutcome::Unreachable);
    assert_eq!(result.report.visited, 10);
    assert_eq!(result.report.frontier_prunes, 0);
    assert!(result.witness().is_none());
}

#[test]
fn classic_tanks_reach_in_six() {
    let (space, levels) = TankSpace::from_world(&tanks_classic()).unwrap();
    let result = reachable(&space, levels, &Budget::default()).unwrap();
    assert_eq!(result.outcome, SearchOutcome::Reached { depth: 6, cost: 6 });
}

// ---------------------------------------------------------------------------
// Conservativeness: lossy searches never claim unreachability
// ---------------------------------------------------------------------------

#[test]
fn depth_ceiling_is_budget_exceeded() {
    let (space, agent) = project(&maze_single_wall());
    let result = reachable(&space, agent, &Budget::default().with_max_depth(7)).unwrap();
    assert_eq!(
        result.outcome,
        SearchOutcome::BudgetExceeded {
            ceiling: Ceiling::Depth
        }
    );

    let result = reachable(&space, agent, &Budget::default().with_max_depth(8)).unwrap();
    assert_eq!(result.outcome, SearchOutcome::Reached { depth: 8, cost: 8 });
}

#[test]
fn truncated_frontier_on_unreachable_maze_is_budget_exceeded() {
    let (space, agent) = project(&maze_column_wall());
    let budget = Budget {
        max_frontier_size: 1,
        ..Budget::default()
    };
    let result = reachable(&space, agent, &budget).unwrap();
    assert_eq!(
        result.outcome,
        SearchOutcome::BudgetExceeded {
            ceiling: Ceiling::Frontier
        }
    );
    assert!(result.report.frontier_prunes > 0);
    assert!(result.report.pruned_nodes > 0);
}

#[test]
fn visited_ceiling_is_budget_exceeded() {
    let (space, agent) = project(&maze_column_wall());
    let budget = Budget {
        max_visited: 5,
        ..Budget::default()
    };
    let result = reachable(&space, agent, &budget).unwrap();
    assert_eq!(
        result.outcome,
        SearchOutcome::BudgetExceeded {
            ceiling: Ceiling::Visited
        }
    );
    assert_eq!(result.report.visited, 5);
    assert_eq!(result.report.termination_reason, TerminationReason::VisitedBudgetExceeded);
}

#[test]
fn panicking_goal_test_is_aborted_not_unreachable() {
    let space = FnSearchSpace::new(
        |_: &i64| vec![1_i64],
        |s: &i64, d: &i64| (*s < 10).then(|| Transition::step(s + d)),
        |s: &i64| {
            assert!(*s != 4, "goal predicate failed on 4");
            false
        },
        |s: &i64| DedupKey::builder(Precision::DEFAULT).i64(*s).finish(),
    );
    let result = reachable(&space, 0, &Budget::default()).unwrap();
    assert_eq!(
        result.outcome,
        SearchOutcome::Aborted {
            stage: PanicStage::IsGoal
        }
    );
    assert!(!result.outcome.is_conclusive());
}

// ---------------------------------------------------------------------------
// Completeness: agreement with an independent flood fill
// ---------------------------------------------------------------------------

const SIDE: i64 = 6;

fn flood_distance(walls: &[Cell], start: Cell, goal: Cell) -> Option<u32> {
    let open = |(r, c): Cell| (0..SIDE).contains(&r) && (0..SIDE).contains(&c) && !walls.contains(&(r, c));
    let mut dist = vec![None; usize::try_from(SIDE * SIDE).unwrap()];
    let idx = |(r, c): Cell| usize::try_from(r * SIDE + c).unwrap();
    dist[idx(start)] = Some(0_u32);
    let mut queue = VecDeque::from([start]);
    while let Some(cell) = queue.pop_front() {
        let d = dist[idx(cell)].unwrap();
        if cell == goal {
            return Some(d);
        }
        for (dr, dc) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
            let next = (cell.0 + dr, cell.1 + dc);
            if open(next) && dist[idx(next)].is_none() {
                dist[idx(next)] = Some(d + 1);
                queue.push_back(next);
            }
        }
    }
    None
}

#[test]
fn search_agrees_with_flood_fill_on_random_mazes() {
    let start = (0, 0);
    let goal = (SIDE - 1, SIDE - 1);
    let mut reached = 0;
    for seed in 0..60 {
        let mut rng = RngContext::from_seed(seed);
        let walls: Vec<Cell> = (0..SIDE)
            .flat_map(|r| (0..SIDE).map(move |c| (r, c)))
            .filter(|&cell| cell != start && cell != goal && rng.gen_bool_p(0.35))
            .collect();
        let space = MazeSpace::new(SIDE, SIDE, &walls, goal);
        let result = reachable(&space, start, &Budget::default()).unwrap();
        match flood_distance(&walls, start, goal) {
            Some(d) => {
                reached += 1;
                assert_eq!(
                    result.outcome,
                    SearchOutcome::Reached {
                        depth: d,
                        cost: u64::from(d)
                    },
                    "seed {seed}"
                );
            }
            None => assert_eq!(result.outcome, SearchOutcome::Unreachable, "seed {seed}"),
        }
    }
    assert!(reached > 0, "density too high: no maze was solvable");
}

// ---------------------------------------------------------------------------
// Soundness: every witness replays to a goal
// ---------------------------------------------------------------------------

#[test]
fn witnesses_replay_to_goal() {
    let (space, agent) = project(&maze_single_wall());
    let result = reachable(&space, agent, &Budget::default()).unwrap();
    let witness = result.witness().unwrap();
    let (end, cost) = replay_witness(&space, &agent, &witness).unwrap();
    assert_eq!(end, (4, 4));
    assert_eq!(cost, 8);

    let (space, levels) = TankSpace::from_world(&tanks_classic()).unwrap();
    let result = reachable(&space, levels.clone(), &Budget::default()).unwrap();
    let witness = result.witness().unwrap();
    let (end, cost) = replay_witness(&space, &levels, &witness).unwrap();
    assert!(end.iter().any(|&l| (l - 4.0).abs() < 1e-9));
    assert_eq!(cost, 6);
    assert_eq!(result.witness_states().unwrap().last(), Some(&end));
}
