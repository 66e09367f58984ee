//! Reward alignment analyzer.
//!
//! Static arithmetic over a reward schedule. No simulation is involved: each
//! check compares what an agent could earn by completing the goal against
//! what it could earn without completing it.
//!
//! Trigger semantics are declared, not guessed: every trigger has a
//! [`TriggerKind`] and a set of tags, and [`AnalyzerConfig::action_tags`]
//! decides which tags mean "action taken" rather than "progress made".

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use levelcert_kernel::carrier::quantize::Precision;
use levelcert_kernel::carrier::world::{WorldError, WorldState};
use levelcert_kernel::proof::canon::canonical_json_bytes;
use levelcert_kernel::proof::hash::{canonical_hash, ContentHash, HashDomain};

use crate::pipeline::{FIELD_ACTION_COUNT, FIELD_MAX_STEPS};
use crate::report::{Issue, IssueKind, Severity, ValidationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Paid once when the goal is completed.
    Goal,
    /// Paid for measurable progress toward the goal.
    Progress,
    /// Paid every turn regardless of what the agent does.
    Step,
    /// Paid for taking a particular action.
    Action,
    /// Paid when the episode ends in failure.
    TerminalFailure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTrigger {
    pub name: String,
    pub value: f64,
    pub kind: TriggerKind,
    /// Whether the trigger can fire more than once per episode.
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl RewardTrigger {
    pub fn new(name: impl Into<String>, value: f64, kind: TriggerKind) -> Self {
        Self {
            name: name.into(),
            value,
            kind,
            repeatable: false,
            tags: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    #[must_use]
    pub fn tagged(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_string());
        self
    }
}

/// Named triggers of one level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardSchedule {
    pub triggers: Vec<RewardTrigger>,
}

impl RewardSchedule {
    #[must_use]
    pub fn new(triggers: Vec<RewardTrigger>) -> Self {
        Self { triggers }
    }

    /// Parse the schedule stored in `world[field]`.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the field is missing or
    /// does not deserialize.
    pub fn from_world(world: &WorldState, field: &str) -> Result<Self, String> {
        let value = world
            .get(field)
            .ok_or_else(|| format!("reward field `{field}` is missing"))?;
        serde_json::from_value(value.clone()).map_err(|e| format!("reward field `{field}`: {e}"))
    }

    /// Largest goal reward, if any goal trigger exists.
    #[must_use]
    pub fn goal_reward(&self) -> Option<f64> {
        self.of_kind(TriggerKind::Goal).map(|t| t.value).reduce(f64::max)
    }

    fn of_kind(&self, kind: TriggerKind) -> impl Iterator<Item = &RewardTrigger> {
        self.triggers.iter().filter(move |t| t.kind == kind)
    }

    /// Most a single non-goal trigger can pay out in one episode.
    #[must_use]
    pub fn farmable_total(trigger: &RewardTrigger, limits: EpisodeLimits) -> f64 {
        let fires = if trigger.repeatable {
            f64::from(limits.max_steps)
        } else if trigger.kind == TriggerKind::Action {
            // One-shot action triggers fire at most once per distinct action.
            f64::from(limits.action_count.min(limits.max_steps))
        } else {
            1.0
        };
        trigger.value * fires
    }

    /// Upper bound on positive reward over one episode.
    #[must_use]
    pub fn max_positive(&self, limits: EpisodeLimits) -> f64 {
        self.triggers
            .iter()
            .filter(|t| t.value > 0.0 && t.kind != TriggerKind::TerminalFailure)
            .map(|t| match t.kind {
                TriggerKind::Step => t.value * f64::from(limits.max_steps),
                TriggerKind::Goal => t.value,
                _ => Self::farmable_total(t, limits),
            })
            .sum()
    }

    /// Digest of the schedule with values quantized at the default precision.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if a value is not finite.
    pub fn digest(&self) -> Result<ContentHash, WorldError> {
        // Triggers hold only strings, numbers and bools; serialization cannot fail.
        let tree = serde_json::to_value(self).unwrap_or_default();
        let quantized = Precision::DEFAULT.quantize_value(&tree)?;
        let bytes = canonical_json_bytes(&quantized)?;
        Ok(canonical_hash(HashDomain::RewardSchedule, &bytes))
    }
}

/// Episode length and action-space size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeLimits {
    pub max_steps: u32,
    pub action_count: u32,
}

impl EpisodeLimits {
    /// Read the limits stamped into a world by the pipeline.
    ///
    /// # Errors
    ///
    /// Returns a description when either field is missing or out of range.
    pub fn from_world(world: &WorldState) -> Result<Self, String> {
        let read = |field: &str| {
            world
                .get_u64(field)
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| format!("`{field}` must be a u32"))
        };
        Ok(Self {
            max_steps: read(FIELD_MAX_STEPS)?,
            action_count: read(FIELD_ACTION_COUNT)?,
        })
    }
}

/// Thresholds and severity tiers for [`analyze`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Step rewards over a full episode may reach at most this fraction of
    /// the goal reward.
    pub density_fraction: f64,
    pub farming_severity: Severity,
    pub density_severity: Severity,
    pub misalignment_severity: Severity,
    pub penalty_severity: Severity,
    /// Tags that mark a trigger as rewarding an action rather than progress.
    pub action_tags: BTreeSet<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            density_fraction: 0.5,
            farming_severity: Severity::Critical,
            density_severity: Severity::Warning,
            misalignment_severity: Severity::Warning,
            penalty_severity: Severity::Warning,
            action_tags: ["action_taken", "interaction", "per_action"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Run every reward check over `schedule`.
#[must_use]
pub fn analyze(
    schedule: &RewardSchedule,
    limits: EpisodeLimits,
    config: &AnalyzerConfig,
) -> ValidationReport {
    let mut report = ValidationReport::new();
    let issue = |severity: Severity, message: String| {
        Issue::with_severity(IssueKind::RewardMisalignment, severity, message)
    };

    let goal = match schedule.goal_reward() {
        Some(g) if g > 0.0 => g,
        Some(g) => {
            report.push(Issue::critical(
                IssueKind::RewardMisalignment,
                format!("goal reward {g} is not positive"),
            ));
            return report;
        }
        None => {
            report.push(Issue::critical(
                IssueKind::RewardMisalignment,
                "schedule has no goal trigger",
            ));
            return report;
        }
    };

    // Continuous per-step reward over the whole episode. It is paid whatever
    // the agent does, so it counts toward every farming total.
    let step_total: f64 = schedule
        .of_kind(TriggerKind::Step)
        .filter(|t| t.value > 0.0)
        .map(|t| t.value * f64::from(limits.max_steps))
        .sum();

    // Farming: idling, or repeating one non-goal trigger, must not out-earn
    // the goal.
    if step_total >= goal {
        report.push(issue(
            config.farming_severity,
            format!(
                "per-step rewards can earn {step_total} over {} steps without the goal, not less than goal reward {goal}",
                limits.max_steps
            ),
        ));
    }
    for t in &schedule.triggers {
        if matches!(
            t.kind,
            TriggerKind::Goal | TriggerKind::Step | TriggerKind::TerminalFailure
        ) || t.value <= 0.0
        {
            continue;
        }
        let farm = RewardSchedule::farmable_total(t, limits) + step_total;
        if farm >= goal {
            report.push(issue(
                config.farming_severity,
                format!(
                    "trigger `{}` can earn {farm} over {} steps, not less than goal reward {goal}",
                    t.name, limits.max_steps
                ),
            ));
        }
    }

    // Density.
    let density_cap = config.density_fraction * goal;
    if step_total > density_cap {
        report.push(issue(
            config.density_severity,
            format!(
                "per-step rewards sum to {step_total} over {} steps, above {density_cap} ({} of goal)",
                limits.max_steps, config.density_fraction
            ),
        ));
    }

    // Misalignment: positive reward for acting rather than progressing.
    for t in &schedule.triggers {
        let action_like =
            t.kind == TriggerKind::Action || t.tags.iter().any(|tag| config.action_tags.contains(tag));
        if action_like && t.value > 0.0 && t.kind != TriggerKind::Goal {
            report.push(issue(
                config.misalignment_severity,
                format!("trigger `{}` rewards taking an action, not making progress", t.name),
            ));
        }
    }

    // Terminal penalties: non-positive and bounded by the reachable upside.
    let max_positive = schedule.max_positive(limits);
    for t in schedule.of_kind(TriggerKind::TerminalFailure) {
        if t.value > 0.0 {
            report.push(Issue::critical(
                IssueKind::RewardMisalignment,
                format!("terminal failure `{}` pays {} (must be non-positive)", t.name, t.value),
            ));
        } else if t.value.abs() > max_positive {
            report.push(issue(
                config.penalty_severity,
                format!(
                    "terminal failure `{}` penalty {} exceeds max achievable reward {max_positive}",
                    t.name,
                    t.value.abs()
                ),
            ));
        }
    }

    report
}
