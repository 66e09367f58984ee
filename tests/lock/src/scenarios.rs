//! Worlds shared by lock tests and fixture binaries.
//!
//! Each constructor returns the same document on every call; fixtures print
//! digests of these worlds and tests compare them across processes.

use levelcert_harness::worlds::grid_maze::{maze_world, Cell};
use levelcert_harness::worlds::water_tanks::tanks_world;
use levelcert_kernel::carrier::world::WorldState;

/// Seeds generated by `generate_fixture` for every domain.
pub const FIXTURE_SEEDS: [u64; 4] = [0, 1, 7, 42];

/// 5×5 open grid with one wall at (2,2). Shortest path (0,0)→(4,4) is 8.
#[must_use]
pub fn maze_single_wall() -> WorldState {
    maze_world(5, 5, &[(2, 2)], (0, 0), (4, 4), 40)
}

/// 5×5 grid cut by a full wall in column 2. The goal is unreachable and the
/// agent's side holds 10 cells.
#[must_use]
pub fn maze_column_wall() -> WorldState {
    let walls: Vec<Cell> = (0..5).map(|r| (r, 2)).collect();
    maze_world(5, 5, &walls, (0, 0), (4, 4), 40)
}

/// 3/5 tanks measuring 4, the classic six-move puzzle.
#[must_use]
pub fn tanks_classic() -> WorldState {
    tanks_world(&[3.0, 5.0], &[0.0, 0.0], 0, 4.0, 30)
}
