//! Cross-process determinism: fixture binaries must print identical output
//! regardless of working directory, locale and timezone.

use lock_tests::crossproc::assert_env_invariant;

#[test]
fn generate_fixture_is_env_invariant() {
    let baseline = assert_env_invariant("generate_fixture");
    assert!(baseline.contains("policy_digest=sha256:"));
    for id in ["grid_maze", "water_tanks"] {
        assert!(
            baseline.contains(&format!("{id}.template_digest=sha256:")),
            "missing template digest for {id}"
        );
        assert!(
            baseline.contains(&format!("{id}.42.world_digest=sha256:")),
            "missing world digest for {id} seed 42"
        );
    }
    assert!(!baseline.contains("solution_depth=None"));
}

#[test]
fn search_fixture_is_env_invariant() {
    let baseline = assert_env_invariant("search_fixture");
    assert!(baseline.contains("maze_single_wall.outcome=reached (depth 8, cost 8)"));
    assert!(baseline.contains("maze_column_wall.outcome=unreachable"));
    assert!(baseline.contains("maze_column_wall.visited=10"));
    assert!(baseline.contains("tanks_classic.outcome=reached (depth 6, cost 6)"));
    assert!(baseline.contains("tanks_classic.report_digest=sha256:"));
}

#[test]
fn fixture_output_is_stable_across_runs() {
    let root = lock_tests::crossproc::workspace_root();
    let first = lock_tests::crossproc::run_variant("generate_fixture", &root, &[]);
    for _ in 0..3 {
        assert_eq!(
            lock_tests::crossproc::run_variant("generate_fixture", &root, &[]),
            first
        );
    }
}
