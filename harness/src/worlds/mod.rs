//! Reference puzzle domains.

pub mod grid_maze;
pub mod water_tanks;

use crate::contract::LevelDomain;

/// Identifiers accepted by [`domain_by_id`], sorted.
pub const DOMAIN_IDS: &[&str] = &[grid_maze::DOMAIN_ID, water_tanks::DOMAIN_ID];

/// Look up a reference domain by its identifier.
#[must_use]
pub fn domain_by_id(id: &str) -> Option<Box<dyn LevelDomain>> {
    match id {
        grid_maze::DOMAIN_ID => Some(Box::new(grid_maze::GridMaze)),
        water_tanks::DOMAIN_ID => Some(Box::new(water_tanks::WaterTanks)),
        _ => None,
    }
}
