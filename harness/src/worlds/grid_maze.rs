//! `GridMaze`: an agent walks a walled grid to a goal cell.
//!
//! World fields:
//!
//! ```text
//! rows, cols      grid dimensions
//! grid            rows × cols array of 0 (open) / 1 (wall)
//! agent, goal     [row, col]
//! rewards         reward schedule (see `crate::reward`)
//! ```
//!
//! Solvability state is the agent cell only. Moves are enumerated
//! up, down, left, right; that order is the search tie-break.

use serde_json::{json, Value};

use levelcert_kernel::carrier::quantize::Precision;
use levelcert_kernel::carrier::rng::RngContext;
use levelcert_kernel::carrier::world::WorldState;
use levelcert_search::{Budget, DedupKey, SearchSpace, Transition};

use crate::contract::{solve, LevelDomain, ProjectionError, SolvabilityCheck};
use crate::pipeline::{arg_f64, arg_u64, StepError, StepRegistry};
use crate::reward::RewardSchedule;
use crate::schema::{CrossRef, FieldKind, Length, Schema};
use crate::template::{StepSpec, WorldTemplate};

pub const DOMAIN_ID: &str = "grid_maze";

const DEFAULT_DENSITY: f64 = 0.3;
const MAX_DIM: i64 = 64;

pub type Cell = (i64, i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    #[must_use]
    pub fn delta(self) -> Cell {
        match self {
            Move::Up => (-1, 0),
            Move::Down => (1, 0),
            Move::Left => (0, -1),
            Move::Right => (0, 1),
        }
    }
}

/// Search projection of a maze world.
#[derive(Debug, Clone)]
pub struct MazeSpace {
    rows: i64,
    cols: i64,
    walls: Vec<bool>,
    goal: Cell,
}

impl MazeSpace {
    #[must_use]
    pub fn new(rows: i64, cols: i64, walls: &[Cell], goal: Cell) -> Self {
        let mut space = Self {
            rows,
            cols,
            walls: vec![false; cell_count(rows, cols)],
            goal,
        };
        for &cell in walls {
            if let Some(i) = space.index(cell) {
                space.walls[i] = true;
            }
        }
        space
    }

    /// Project a structurally valid world into `(space, agent)`.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] if a field is malformed or the agent or
    /// goal stands on a wall.
    pub fn from_world(world: &WorldState) -> Result<(Self, Cell), ProjectionError> {
        let rows = world
            .get_i64("rows")
            .ok_or_else(|| ProjectionError::new("`rows` missing"))?;
        let cols = world
            .get_i64("cols")
            .ok_or_else(|| ProjectionError::new("`cols` missing"))?;
        let grid = read_grid(world).ok_or_else(|| ProjectionError::new("`grid` malformed"))?;
        let agent = read_cell(world, "agent").ok_or_else(|| ProjectionError::new("`agent` malformed"))?;
        let goal = read_cell(world, "goal").ok_or_else(|| ProjectionError::new("`goal` malformed"))?;

        let walls: Vec<Cell> = cells_where(&grid, |v| v != 0);
        let space = Self::new(rows, cols, &walls, goal);
        if !space.is_open(agent) {
            return Err(ProjectionError::new("agent stands on a wall"));
        }
        if !space.is_open(goal) {
            return Err(ProjectionError::new("goal is inside a wall"));
        }
        Ok((space, agent))
    }

    fn index(&self, (r, c): Cell) -> Option<usize> {
        if (0..self.rows).contains(&r) && (0..self.cols).contains(&c) {
            usize::try_from(r * self.cols + c).ok()
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_open(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|i| !self.walls[i])
    }
}

fn cell_count(rows: i64, cols: i64) -> usize {
    usize::try_from(rows.max(0) * cols.max(0)).unwrap_or(0)
}

impl SearchSpace for MazeSpace {
    type State = Cell;
    type Action = Move;

    fn actions(&self, _state: &Cell) -> Vec<Move> {
        Move::ALL.to_vec()
    }

    fn transition(&self, &(r, c): &Cell, action: &Move) -> Option<Transition<Cell>> {
        let (dr, dc) = action.delta();
        let next = (r + dr, c + dc);
        self.is_open(next).then(|| Transition::step(next))
    }

    fn is_goal(&self, state: &Cell) -> bool {
        *state == self.goal
    }

    fn dedup_key(&self, &(r, c): &Cell) -> DedupKey {
        DedupKey::builder(Precision::DEFAULT).i64(r).i64(c).finish()
    }

    fn heuristic(&self, &(r, c): &Cell) -> u64 {
        (r - self.goal.0).unsigned_abs() + (c - self.goal.1).unsigned_abs()
    }
}

fn read_grid(world: &WorldState) -> Option<Vec<Vec<i64>>> {
    world
        .get_array("grid")?
        .iter()
        .map(|row| row.as_array()?.iter().map(Value::as_i64).collect())
        .collect()
}

fn read_cell(world: &WorldState, field: &str) -> Option<Cell> {
    match world.get_array(field)?.as_slice() {
        [r, c] => Some((r.as_i64()?, c.as_i64()?)),
        _ => None,
    }
}

fn cells_where(grid: &[Vec<i64>], pred: impl Fn(i64) -> bool) -> Vec<Cell> {
    let mut out = Vec::new();
    for (r, row) in (0_i64..).zip(grid) {
        for (c, &v) in (0_i64..).zip(row) {
            if pred(v) {
                out.push((r, c));
            }
        }
    }
    out
}

fn default_rewards() -> Value {
    json!([
        {"name": "reach_goal", "value": 1.0, "kind": "goal"},
        {"name": "step_cost", "value": -0.01, "kind": "step", "repeatable": true},
    ])
}

/// Build a maze world document from explicit parts.
#[must_use]
pub fn maze_world(rows: i64, cols: i64, walls: &[Cell], agent: Cell, goal: Cell, max_steps: u32) -> WorldState {
    let grid: Vec<Vec<i64>> = (0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| i64::from(walls.contains(&(r, c))))
                .collect()
        })
        .collect();
    let mut world = WorldState::new();
    world.set("rows", rows);
    world.set("cols", cols);
    world.set("grid", json!(grid));
    world.set("agent", json!([agent.0, agent.1]));
    world.set("goal", json!([goal.0, goal.1]));
    world.set("rewards", default_rewards());
    world.set("max_steps", max_steps);
    world.set("action_count", Move::ALL.len());
    world
}

fn dims(world: &WorldState) -> Result<(i64, i64), StepError> {
    let rows = world.get_i64("rows").ok_or_else(|| StepError::new("`rows` not set"))?;
    let cols = world.get_i64("cols").ok_or_else(|| StepError::new("`cols` not set"))?;
    if !(1..=MAX_DIM).contains(&rows) || !(1..=MAX_DIM).contains(&cols) {
        return Err(StepError::new(format!("grid {rows}x{cols} outside 1..={MAX_DIM}")));
    }
    Ok((rows, cols))
}

fn step_place_walls(mut world: WorldState, args: &Value, rng: &mut RngContext) -> Result<WorldState, StepError> {
    let density = arg_f64(args, "density", DEFAULT_DENSITY)?;
    if !(0.0..=1.0).contains(&density) {
        return Err(StepError::new(format!("density {density} outside [0, 1]")));
    }
    let (rows, cols) = dims(&world)?;
    let grid: Vec<Vec<i64>> = (0..rows)
        .map(|_| (0..cols).map(|_| i64::from(rng.gen_bool_p(density))).collect())
        .collect();
    world.set("grid", json!(grid));
    Ok(world)
}

fn step_carve_border(mut world: WorldState, _args: &Value, _rng: &mut RngContext) -> Result<WorldState, StepError> {
    let (rows, cols) = dims(&world)?;
    let mut grid = read_grid(&world).ok_or_else(|| StepError::new("`grid` must be placed first"))?;
    for (r, row) in (0_i64..).zip(grid.iter_mut()) {
        for (c, v) in (0_i64..).zip(row.iter_mut()) {
            if r == 0 || c == 0 || r == rows - 1 || c == cols - 1 {
                *v = 0;
            }
        }
    }
    world.set("grid", json!(grid));
    Ok(world)
}

fn step_place_agent(mut world: WorldState, _args: &Value, rng: &mut RngContext) -> Result<WorldState, StepError> {
    let grid = read_grid(&world).ok_or_else(|| StepError::new("`grid` must be placed first"))?;
    let free = cells_where(&grid, |v| v == 0);
    let &(r, c) = rng
        .choose(&free)
        .ok_or_else(|| StepError::new("no free cell for the agent"))?;
    world.set("agent", json!([r, c]));
    Ok(world)
}

fn step_place_goal(mut world: WorldState, args: &Value, rng: &mut RngContext) -> Result<WorldState, StepError> {
    let min_distance = arg_u64(args, "min_distance", 1)?;
    let grid = read_grid(&world).ok_or_else(|| StepError::new("`grid` must be placed first"))?;
    let agent = read_cell(&world, "agent").ok_or_else(|| StepError::new("`agent` must be placed first"))?;
    let candidates: Vec<Cell> = cells_where(&grid, |v| v == 0)
        .into_iter()
        .filter(|&(r, c)| (r - agent.0).unsigned_abs() + (c - agent.1).unsigned_abs() >= min_distance.max(1))
        .collect();
    let &(r, c) = rng
        .choose(&candidates)
        .ok_or_else(|| StepError::new(format!("no free cell at distance >= {min_distance} from the agent")))?;
    world.set("goal", json!([r, c]));
    Ok(world)
}

/// The grid maze domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridMaze;

impl LevelDomain for GridMaze {
    #[allow(clippy::unnecessary_literal_bound)]
    fn domain_id(&self) -> &str {
        DOMAIN_ID
    }

    fn step_registry(&self) -> StepRegistry {
        StepRegistry::new()
            .with_step("place_walls", step_place_walls)
            .with_step("carve_border", step_carve_border)
            .with_step("place_agent", step_place_agent)
            .with_step("place_goal", step_place_goal)
    }

    fn schema(&self) -> Schema {
        let cell = || FieldKind::array_of(FieldKind::integer(0, MAX_DIM - 1), Some(Length::Exact(2)));
        let in_grid = |field: &str| CrossRef::Cell {
            position: field.into(),
            rows: "/rows".into(),
            cols: "/cols".into(),
        };
        Schema::new()
            .require("/rows", FieldKind::integer(1, MAX_DIM))
            .require("/cols", FieldKind::integer(1, MAX_DIM))
            .require(
                "/grid",
                FieldKind::array_of(
                    FieldKind::array_of(FieldKind::integer(0, 1), Some(Length::Field("/cols".into()))),
                    Some(Length::Field("/rows".into())),
                ),
            )
            .require("/agent", cell())
            .require("/goal", cell())
            .require("/max_steps", FieldKind::integer(1, 100_000))
            .require("/action_count", FieldKind::integer(1, 64))
            .require("/rewards", FieldKind::array())
            .cross_ref(in_grid("/agent"))
            .cross_ref(in_grid("/goal"))
    }

    fn default_template(&self) -> WorldTemplate {
        let mut defaults = WorldState::new();
        defaults.set("rows", 7);
        defaults.set("cols", 7);
        defaults.set("rewards", default_rewards());
        WorldTemplate {
            template_id: "grid_maze_default".into(),
            version: 1,
            defaults,
            steps: vec![
                StepSpec::new("place_walls", json!({"density": DEFAULT_DENSITY})),
                StepSpec::new("carve_border", json!({})),
                StepSpec::new("place_agent", json!({})),
                StepSpec::new("place_goal", json!({"min_distance": 4})),
            ],
            max_steps: 60,
            action_count: 4,
        }
    }

    fn reward_schedule(&self, world: &WorldState) -> Result<RewardSchedule, ProjectionError> {
        RewardSchedule::from_world(world, "rewards").map_err(ProjectionError::new)
    }

    fn solvability(&self, world: &WorldState, budget: &Budget) -> Result<SolvabilityCheck, ProjectionError> {
        let (space, agent) = MazeSpace::from_world(world)?;
        solve(&space, agent, budget)
    }

    /// Halve wall density each round; stop once it reaches zero.
    fn narrow(&self, template: &WorldTemplate, _round: u32) -> Option<WorldTemplate> {
        let density = template
            .step_args("place_walls")
            .and_then(|a| a.get("density"))
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_DENSITY);
        if density <= 0.0 {
            return None;
        }
        let halved = (density * 500.0).round() / 1000.0;
        template.with_step_arg("place_walls", "density", halved)
    }

    fn fallback_world(&self) -> WorldState {
        maze_world(5, 5, &[], (0, 0), (4, 4), 40)
    }
}
