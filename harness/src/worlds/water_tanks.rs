//! `WaterTanks`: measure a target volume with fill, empty and pour moves.
//!
//! World fields:
//!
//! ```text
//! capacities   tank capacities (floats, one decimal)
//! levels       current volumes, same length as capacities
//! source       tank that starts full
//! target       volume that must appear in some tank
//! ```
//!
//! Volumes are continuous, so repeated pours drift by a few ULPs. Dedup keys
//! and the goal test quantize every volume at 1e-6 ([`PRECISION`]); states
//! that agree to six decimals are the same state.

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

pub const DOMAIN_ID: &str = "water_tanks";

/// Quantization used for dedup keys and the goal test.
pub const PRECISION: Precision = Precision::DEFAULT;

const MAX_TANKS: u64 = 8;
const MAX_CAPACITY: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TankAction {
    Fill(usize),
    Empty(usize),
    Pour { from: usize, to: usize },
}

/// Fill, empty and pour actions for `n` tanks, in enumeration order.
#[must_use]
pub fn all_actions(n: usize) -> Vec<TankAction> {
    let mut actions: Vec<TankAction> = (0..n).map(TankAction::Fill).collect();
    actions.extend((0..n).map(TankAction::Empty));
    for from in 0..n {
        for to in (0..n).filter(|&to| to != from) {
            actions.push(TankAction::Pour { from, to });
        }
    }
    actions
}

/// Search projection of a tanks world. State is the level vector.
#[derive(Debug, Clone)]
pub struct TankSpace {
    capacities: Vec<f64>,
    target: f64,
    actions: Vec<TankAction>,
}

impl TankSpace {
    #[must_use]
    pub fn new(capacities: Vec<f64>, target: f64) -> Self {
        let actions = all_actions(capacities.len());
        Self {
            capacities,
            target,
            actions,
        }
    }

    /// Project a structurally valid world into `(space, levels)`.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] on malformed fields or a level above its
    /// tank's capacity.
    pub fn from_world(world: &WorldState) -> Result<(Self, Vec<f64>), ProjectionError> {
        let capacities = read_floats(world, "capacities")
            .ok_or_else(|| ProjectionError::new("`capacities` malformed"))?;
        let levels = read_floats(world, "levels").ok_or_else(|| ProjectionError::new("`levels` malformed"))?;
        let target = world
            .get_f64("target")
            .ok_or_else(|| ProjectionError::new("`target` malformed"))?;
        if levels.len() != capacities.len() {
            return Err(ProjectionError::new("`levels` and `capacities` differ in length"));
        }
        if let Some(i) = (0..levels.len()).find(|&i| !(0.0..=capacities[i]).contains(&levels[i])) {
            return Err(ProjectionError::new(format!("tank {i} level outside [0, capacity]")));
        }
        Ok((Self::new(capacities, target), levels))
    }

    fn same(a: f64, b: f64) -> bool {
        matches!((PRECISION.quantize_f64(a), PRECISION.quantize_f64(b)), (Ok(x), Ok(y)) if x == y)
    }
}

impl SearchSpace for TankSpace {
    type State = Vec<f64>;
    type Action = TankAction;

    fn actions(&self, _state: &Vec<f64>) -> Vec<TankAction> {
        self.actions.clone()
    }

    fn transition(&self, levels: &Vec<f64>, action: &TankAction) -> Option<Transition<Vec<f64>>> {
        let mut next = levels.clone();
        match *action {
            TankAction::Fill(i) => {
                if Self::same(levels[i], self.capacities[i]) {
                    return None;
                }
                next[i] = self.capacities[i];
            }
            TankAction::Empty(i) => {
                if Self::same(levels[i], 0.0) {
                    return None;
                }
                next[i] = 0.0;
            }
            TankAction::Pour { from, to } => {
                let amount = levels[from].min(self.capacities[to] - levels[to]);
                if Self::same(amount, 0.0) || amount < 0.0 {
                    return None;
                }
                next[from] -= amount;
                next[to] += amount;
                if Self::same(next[from], 0.0) {
                    next[from] = 0.0;
                }
                if Self::same(next[to], self.capacities[to]) {
                    next[to] = self.capacities[to];
                }
            }
        }
        Some(Transition::step(next))
    }

    fn is_goal(&self, levels: &Vec<f64>) -> bool {
        levels.iter().any(|&l| Self::same(l, self.target))
    }

    fn dedup_key(&self, levels: &Vec<f64>) -> DedupKey {
        DedupKey::builder(PRECISION).f64s(levels).finish()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn heuristic(&self, levels: &Vec<f64>) -> u64 {
        let gap = levels
            .iter()
            .map(|l| (l - self.target).abs())
            .fold(f64::INFINITY, f64::min);
        if gap.is_finite() {
            (gap * 10.0).round() as u64
        } else {
            u64::MAX
        }
    }

    fn precision(&self) -> Option<Precision> {
        Some(PRECISION)
    }
}

fn read_floats(world: &WorldState, field: &str) -> Option<Vec<f64>> {
    world.get_array(field)?.iter().map(Value::as_f64).collect()
}

fn tenths(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn default_rewards() -> Value {
    json!([
        {"name": "target_measured", "value": 1.0, "kind": "goal"},
        {"name": "step_cost", "value": -0.01, "kind": "step", "repeatable": true},
        {"name": "spill", "value": -0.5, "kind": "terminal_failure"},
    ])
}

/// Build a tanks world document from explicit parts.
#[must_use]
pub fn tanks_world(capacities: &[f64], levels: &[f64], source: usize, target: f64, max_steps: u32) -> WorldState {
    let n = capacities.len();
    let mut world = WorldState::new();
    world.set("capacities", json!(capacities));
    world.set("levels", json!(levels));
    world.set("source", source);
    world.set("target", target);
    world.set("rewards", default_rewards());
    world.set("max_steps", max_steps);
    world.set("action_count", n * (n + 1));
    world
}

fn step_randomize_capacities(
    mut world: WorldState,
    args: &Value,
    rng: &mut RngContext,
) -> Result<WorldState, StepError> {
    let count = arg_u64(args, "count", 2)?;
    let min = arg_f64(args, "min", 1.0)?;
    let max = arg_f64(args, "max", 9.0)?;
    if !(2..=MAX_TANKS).contains(&count) {
        return Err(StepError::new(format!("count {count} outside 2..={MAX_TANKS}")));
    }
    if !(0.1 <= min && min < max && max <= MAX_CAPACITY) {
        return Err(StepError::new(format!("capacity range [{min}, {max}] is invalid")));
    }
    let capacities: Vec<f64> = (0..count).map(|_| tenths(rng.gen_range_f64(min, max))).collect();
    let n = capacities.len();
    world.set("levels", json!(vec![0.0; n]));
    world.set("capacities", json!(capacities));
    world.set("action_count", n * (n + 1));
    Ok(world)
}

fn step_fill_source(mut world: WorldState, args: &Value, _rng: &mut RngContext) -> Result<WorldState, StepError> {
    let capacities = read_floats(&world, "capacities")
        .ok_or_else(|| StepError::new("`capacities` must be set first"))?;
    let tank = usize::try_from(arg_u64(args, "tank", 0)?).map_err(|_| StepError::new("`tank` too large"))?;
    let Some(&full) = capacities.get(tank) else {
        return Err(StepError::new(format!("source tank {tank} does not exist")));
    };
    let mut levels = vec![0.0; capacities.len()];
    levels[tank] = full;
    world.set("levels", json!(levels));
    world.set("source", tank);
    Ok(world)
}

fn step_set_target(mut world: WorldState, args: &Value, rng: &mut RngContext) -> Result<WorldState, StepError> {
    let capacities = read_floats(&world, "capacities")
        .ok_or_else(|| StepError::new("`capacities` must be set first"))?;
    let mode = args.get("mode").and_then(Value::as_str).unwrap_or("random");
    let target = match mode {
        "random" => {
            let largest = capacities.iter().copied().fold(0.0, f64::max);
            if largest < 0.1 {
                return Err(StepError::new("no tank can hold a target volume"));
            }
            tenths(rng.gen_range_f64(0.1, largest))
        }
        "difference" => {
            let pairs: Vec<f64> = capacities
                .iter()
                .flat_map(|a| capacities.iter().map(move |b| tenths(a - b)))
                .filter(|&d| d > 0.0)
                .collect();
            *rng.choose(&pairs)
                .ok_or_else(|| StepError::new("all capacities are equal"))?
        }
        other => return Err(StepError::new(format!("unknown target mode `{other}`"))),
    };
    world.set("target", target);
    Ok(world)
}

/// The water tanks domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaterTanks;

impl LevelDomain for WaterTanks {
    #[allow(clippy::unnecessary_literal_bound)]
    fn domain_id(&self) -> &str {
        DOMAIN_ID
    }

    fn step_registry(&self) -> StepRegistry {
        StepRegistry::new()
            .with_step("randomize_capacities", step_randomize_capacities)
            .with_step("fill_source", step_fill_source)
            .with_step("set_target", step_set_target)
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .require("/capacities", FieldKind::array_of(FieldKind::number(0.1, MAX_CAPACITY), None))
            .require(
                "/levels",
                FieldKind::array_of(
                    FieldKind::number(0.0, MAX_CAPACITY),
                    Some(Length::SameAs("/capacities".into())),
                ),
            )
            .require("/source", FieldKind::integer(0, 7))
            .require("/target", FieldKind::number(0.0, MAX_CAPACITY))
            .require("/max_steps", FieldKind::integer(1, 100_000))
            .require("/action_count", FieldKind::integer(1, 128))
            .require("/rewards", FieldKind::array())
            .cross_ref(CrossRef::Index {
                index: "/source".into(),
                array: "/capacities".into(),
            })
    }

    fn default_template(&self) -> WorldTemplate {
        let mut defaults = WorldState::new();
        defaults.set("source", 0);
        defaults.set("rewards", default_rewards());
        WorldTemplate {
            template_id: "water_tanks_default".into(),
            version: 1,
            defaults,
            steps: vec![
                StepSpec::new("randomize_capacities", json!({"count": 3, "min": 1.0, "max": 9.0})),
                StepSpec::new("fill_source", json!({"tank": 0})),
                StepSpec::new("set_target", json!({"mode": "random"})),
            ],
            max_steps: 30,
            action_count: 12,
        }
    }

    fn reward_schedule(&self, world: &WorldState) -> Result<RewardSchedule, ProjectionError> {
        RewardSchedule::from_world(world, "rewards").map_err(ProjectionError::new)
    }

    fn solvability(&self, world: &WorldState, budget: &Budget) -> Result<SolvabilityCheck, ProjectionError> {
        let (space, levels) = TankSpace::from_world(world)?;
        solve(&space, levels, budget)
    }

    /// Round 1 switches random targets to capacity differences, which a
    /// single fill-and-pour can always measure.
    fn narrow(&self, template: &WorldTemplate, round: u32) -> Option<WorldTemplate> {
        let mode = template
            .step_args("set_target")
            .and_then(|a| a.get("mode"))
            .and_then(Value::as_str)
            .unwrap_or("random");
        if round > 1 || mode == "difference" {
            return None;
        }
        template.with_step_arg("set_target", "mode", "difference")
    }

    fn fallback_world(&self) -> WorldState {
        tanks_world(&[3.0, 5.0], &[0.0, 0.0], 0, 4.0, 30)
    }
}
