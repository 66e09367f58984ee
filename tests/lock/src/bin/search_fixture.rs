//! Binary that runs the reference scenarios through the search engine and
//! prints deterministic output lines for cross-process verification.
//!
//! Usage: `search_fixture`
//!
//! Output: `key=value` lines (see source for format).

use levelcert_harness::worlds::grid_maze::MazeSpace;
use levelcert_harness::worlds::water_tanks::TankSpace;
use levelcert_kernel::carrier::rng::RngContext;
use levelcert_search::sampling::estimate;
use levelcert_search::{reachable, Budget, SearchReport};
use lock_tests::scenarios::{maze_column_wall, maze_single_wall, tanks_classic};

fn print_report(name: &str, report: &SearchReport) {
    println!("{name}.outcome={}", report.outcome);
    println!("{name}.expansions={}", report.expansions);
    println!("{name}.visited={}", report.visited);
    println!("{name}.duplicates_suppressed={}", report.duplicates_suppressed);
    println!("{name}.root_fingerprint={}", report.root_fingerprint);
    println!("{name}.report_digest={}", report.digest().expect("report digest"));
}

fn main() {
    let budget = Budget::default();

    let (maze, agent) = MazeSpace::from_world(&maze_single_wall()).expect("maze projects");
    let result = reachable(&maze, agent, &budget).expect("valid budget");
    print_report("maze_single_wall", &result.report);
    println!(
        "maze_single_wall.witness={:?}",
        result.witness().expect("reached")
    );

    let (maze, agent) = MazeSpace::from_world(&maze_column_wall()).expect("maze projects");
    let result = reachable(&maze, agent, &budget).expect("valid budget");
    print_report("maze_column_wall", &result.report);

    let (tanks, levels) = TankSpace::from_world(&tanks_classic()).expect("tanks project");
    let result = reachable(&tanks, levels.clone(), &budget).expect("valid budget");
    print_report("tanks_classic", &result.report);

    let mut rng = RngContext::from_seed(42);
    let sampled = estimate(&tanks, &levels, 200, 12, &mut rng).expect("rollouts > 0");
    println!("tanks_classic.sampled_hits={}", sampled.hits);
    println!("tanks_classic.sampled_draws={}", rng.draws());
}
