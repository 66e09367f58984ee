//! Verifier lock tests: schema before search, issue classification, episode
//! length bounds, reward farming scenarios and checker idempotence.

use levelcert_harness::reward::AnalyzerConfig;
use levelcert_harness::worlds::grid_maze::GridMaze;
use levelcert_harness::worlds::water_tanks::WaterTanks;
use levelcert_harness::{IssueKind, LevelDomain, Severity, Verifier};
use levelcert_search::Budget;
use lock_tests::scenarios::{maze_column_wall, maze_single_wall, tanks_classic};
use serde_json::json;

fn verifier(domain: &dyn LevelDomain, budget: Budget) -> Verifier<'_> {
    Verifier::new(domain, budget, AnalyzerConfig::default())
}

// ---------------------------------------------------------------------------
// Solvability classification
// ---------------------------------------------------------------------------

#[test]
fn solvable_maze_is_valid_with_depth() {
    let report = verifier(&GridMaze, Budget::default()).validate(&maze_single_wall());
    assert!(report.is_valid(), "{:?}", report.issues);
    assert_eq!(report.solution_depth, Some(8));
    assert_eq!(report.search_outcome.as_deref(), Some("reached"));
    assert!(report.search_report_digest.as_deref().unwrap().starts_with("sha256:"));
}

#[test]
fn unreachable_maze_is_critical() {
    let report = verifier(&GridMaze, Budget::default()).validate(&maze_column_wall());
    assert!(!report.is_valid());
    assert!(report.has_kind(IssueKind::Unreachable));
    assert_eq!(report.solution_depth, None);
}

#[test]
fn inconclusive_search_is_budget_exceeded_not_unreachable() {
    let report = verifier(&GridMaze, Budget::default().with_max_depth(3)).validate(&maze_single_wall());
    assert!(!report.is_valid());
    assert!(report.has_kind(IssueKind::BudgetExceeded));
    assert!(!report.has_kind(IssueKind::Unreachable));
    assert_eq!(report.search_outcome.as_deref(), Some("budget_exceeded"));
}

#[test]
fn solution_longer_than_episode_is_rejected() {
    // The shortest path takes 8 moves; the episode allows 3.
    let mut world = maze_single_wall();
    world.set("max_steps", 3);
    let report = verifier(&GridMaze, Budget::default()).validate(&world);
    assert!(!report.is_valid());
    assert!(report.has_kind(IssueKind::Unreachable));
    assert!(!report.has_kind(IssueKind::BudgetExceeded));
    assert_eq!(report.solution_depth, None);
    let issue = report.issues.iter().find(|i| i.kind == IssueKind::Unreachable).unwrap();
    assert!(issue.message.contains("3-step episode"), "{}", issue.message);
}

#[test]
fn solution_exactly_filling_episode_is_accepted() {
    let mut world = maze_single_wall();
    world.set("max_steps", 8);
    let report = verifier(&GridMaze, Budget::default()).validate(&world);
    assert!(report.is_valid(), "{:?}", report.issues);
    assert_eq!(report.solution_depth, Some(8));
}

#[test]
fn tanks_episode_shorter_than_classic_solution_is_rejected() {
    let mut world = tanks_classic();
    world.set("max_steps", 5);
    let report = verifier(&WaterTanks, Budget::default()).validate(&world);
    assert!(report.has_kind(IssueKind::Unreachable));
    assert_eq!(report.solution_depth, None);
}

// ---------------------------------------------------------------------------
// Schema before search
// ---------------------------------------------------------------------------

#[test]
fn malformed_world_skips_search() {
    let mut world = maze_single_wall();
    world.set("grid", json!([[0, 0], [0, 0]]));
    let report = verifier(&GridMaze, Budget::default()).validate(&world);
    assert!(report.has_kind(IssueKind::SchemaViolation));
    assert_eq!(report.search_outcome, None);
    assert_eq!(report.search_report_digest, None);
}

#[test]
fn out_of_range_source_tank_is_schema_violation() {
    let mut world = tanks_classic();
    world.set("source", 5);
    let report = verifier(&WaterTanks, Budget::default()).validate(&world);
    assert!(report.has_kind(IssueKind::SchemaViolation));
    assert_eq!(report.search_outcome, None);
}

// ---------------------------------------------------------------------------
// Reward alignment through the verifier
// ---------------------------------------------------------------------------

fn maze_with_collectible(value: f64) -> levelcert_kernel::carrier::world::WorldState {
    let mut world = maze_single_wall();
    world.set("max_steps", 10);
    world.set(
        "rewards",
        json!([
            {"name": "reach_goal", "value": 1.0, "kind": "goal"},
            {"name": "collect", "value": value, "kind": "progress", "repeatable": true},
        ]),
    );
    world
}

#[test]
fn farmable_repeatable_reward_is_critical() {
    let report = verifier(&GridMaze, Budget::default()).validate(&maze_with_collectible(0.5));
    let issue = report
        .issues
        .iter()
        .find(|i| i.kind == IssueKind::RewardMisalignment)
        .expect("farming issue");
    assert_eq!(issue.severity, Severity::Critical);
    assert!(issue.message.contains("can earn 5"), "{}", issue.message);
    // Search still ran and succeeded; only the reward check rejects.
    assert_eq!(report.solution_depth, Some(8));
}

#[test]
fn farmable_step_reward_is_critical() {
    let mut world = maze_single_wall();
    world.set("max_steps", 10);
    world.set(
        "rewards",
        json!([
            {"name": "reach_goal", "value": 1.0, "kind": "goal"},
            {"name": "alive", "value": 0.5, "kind": "step", "repeatable": true},
        ]),
    );
    let report = verifier(&GridMaze, Budget::default()).validate(&world);
    assert!(!report.is_valid());
    let issue = report
        .issues
        .iter()
        .find(|i| i.kind == IssueKind::RewardMisalignment && i.severity == Severity::Critical)
        .expect("farming issue");
    assert!(issue.message.contains("can earn 5"), "{}", issue.message);
}

#[test]
fn small_repeatable_reward_passes() {
    let report = verifier(&GridMaze, Budget::default()).validate(&maze_with_collectible(0.01));
    assert!(report.is_valid(), "{:?}", report.issues);
    assert!(!report.has_kind(IssueKind::RewardMisalignment));
}

#[test]
fn missing_goal_reward_is_critical() {
    let mut world = maze_single_wall();
    world.set(
        "rewards",
        json!([{"name": "step_cost", "value": -0.01, "kind": "step", "repeatable": true}]),
    );
    let report = verifier(&GridMaze, Budget::default()).validate(&world);
    assert!(!report.is_valid());
    assert!(report.has_kind(IssueKind::RewardMisalignment));
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

#[test]
fn validation_is_idempotent() {
    for world in [maze_single_wall(), maze_column_wall(), maze_with_collectible(0.5)] {
        let v = verifier(&GridMaze, Budget::default());
        let first = v.validate(&world);
        for _ in 0..10 {
            assert_eq!(v.validate(&world), first);
        }
    }
    let v = verifier(&WaterTanks, Budget::default());
    let first = v.validate(&tanks_classic());
    assert_eq!(v.validate(&tanks_classic()), first);
}
