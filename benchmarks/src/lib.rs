//! Shared regimes for levelcert benchmark suites.
//!
//! Each regime is a maze that stresses one part of the engine: plain
//! breadth, long corridors, frontier truncation or exhaustive dead ends.

use levelcert_harness::worlds::grid_maze::{Cell, MazeSpace};
use levelcert_kernel::carrier::rng::RngContext;
use levelcert_search::Budget;

/// A search input: space, start cell and budget.
pub struct Regime {
    pub space: MazeSpace,
    pub start: Cell,
    pub budget: Budget,
}

/// Open `side × side` grid, corner to corner.
#[must_use]
pub fn regime_open(side: i64) -> Regime {
    Regime {
        space: MazeSpace::new(side, side, &[], (side - 1, side - 1)),
        start: (0, 0),
        budget: Budget::default(),
    }
}

/// Serpentine corridor: every other row is a wall with one gap, alternating
/// sides, so the shortest path visits nearly every open cell.
#[must_use]
pub fn regime_serpentine(side: i64) -> Regime {
    let mut walls = Vec::new();
    for r in (1..side).step_by(2) {
        let gap = if (r / 2) % 2 == 0 { side - 1 } else { 0 };
        walls.extend((0..side).filter(|&c| c != gap).map(|c| (r, c)));
    }
    let goal_row = if (side - 1) % 2 == 0 { side - 1 } else { side - 2 };
    Regime {
        space: MazeSpace::new(side, side, &walls, (goal_row, 0)),
        start: (0, 0),
        budget: Budget {
            max_depth: u32::try_from(side * side).unwrap_or(u32::MAX),
            ..Budget::default()
        },
    }
}

/// Open grid searched with a frontier far smaller than its widest layer.
#[must_use]
pub fn regime_truncation(side: i64) -> Regime {
    Regime {
        budget: Budget {
            max_frontier_size: 8,
            ..Budget::default()
        },
        ..regime_open(side)
    }
}

/// Goal sealed in the far corner: the whole open region must be exhausted.
#[must_use]
pub fn regime_dead_end(side: i64) -> Regime {
    let goal = (side - 1, side - 1);
    let walls = [(side - 2, side - 1), (side - 1, side - 2)];
    Regime {
        space: MazeSpace::new(side, side, &walls, goal),
        start: (0, 0),
        budget: Budget::default(),
    }
}

/// Random walls at `density`, start and goal kept open.
#[must_use]
pub fn regime_random(side: i64, density: f64, seed: u64) -> Regime {
    let mut rng = RngContext::from_seed(seed);
    let goal = (side - 1, side - 1);
    let walls: Vec<Cell> = (0..side)
        .flat_map(|r| (0..side).map(move |c| (r, c)))
        .filter(|&cell| cell != (0, 0) && cell != goal && rng.gen_bool_p(density))
        .collect();
    Regime {
        space: MazeSpace::new(side, side, &walls, goal),
        start: (0, 0),
        budget: Budget::default(),
    }
}
