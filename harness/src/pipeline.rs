//! Generation pipeline executor.
//!
//! A [`StepRegistry`] maps step names to pure transforms. Resolving a
//! [`WorldTemplate`] against a registry yields a [`Pipeline`]: the template's
//! defaults plus its steps in declaration order. Running a pipeline threads
//! one [`RngContext`] through every step, so a fixed seed gives a fixed world.
//!
//! A step that cannot satisfy its own preconditions returns a [`StepError`];
//! the executor wraps it in a [`StepFailure`] naming the step and aborts the
//! attempt.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

use levelcert_kernel::carrier::rng::RngContext;
use levelcert_kernel::carrier::world::WorldState;

use crate::template::{TemplateError, WorldTemplate};

/// Field stamped with the template's episode length.
pub const FIELD_MAX_STEPS: &str = "max_steps";
/// Field stamped with the template's action count.
pub const FIELD_ACTION_COUNT: &str = "action_count";

/// Precondition failure reported by a step transform.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct StepError {
    pub reason: String,
}

impl StepError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A step failure bound to its position in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("step `{step}` (index {index}) failed: {reason}")]
pub struct StepFailure {
    pub step: String,
    pub index: usize,
    pub reason: String,
}

/// A generation transform: `(world, args, rng) -> world`.
pub type StepFn =
    dyn Fn(WorldState, &Value, &mut RngContext) -> Result<WorldState, StepError> + Send + Sync;

/// Name → transform table supplied by a domain.
#[derive(Clone, Default)]
pub struct StepRegistry {
    steps: BTreeMap<String, Arc<StepFn>>,
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRegistry")
            .field("steps", &self.steps.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StepRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a transform.
    #[must_use]
    pub fn with_step<F>(mut self, name: &str, transform: F) -> Self
    where
        F: Fn(WorldState, &Value, &mut RngContext) -> Result<WorldState, StepError>
            + Send
            + Sync
            + 'static,
    {
        self.steps.insert(name.to_string(), Arc::new(transform));
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }

    /// Bind every step of `template` to its transform.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownStep`] for the first step name with
    /// no registered transform.
    pub fn resolve(&self, template: &WorldTemplate) -> Result<Pipeline, TemplateError> {
        let stages = template
            .steps
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                self.steps
                    .get(&spec.name)
                    .map(|transform| Stage {
                        name: spec.name.clone(),
                        args: spec.args.clone(),
                        transform: Arc::clone(transform),
                    })
                    .ok_or_else(|| TemplateError::UnknownStep {
                        name: spec.name.clone(),
                        index,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut defaults = template.defaults.clone();
        defaults.set(FIELD_MAX_STEPS, template.max_steps);
        defaults.set(FIELD_ACTION_COUNT, template.action_count);

        Ok(Pipeline {
            template_id: template.template_id.clone(),
            defaults,
            stages,
        })
    }
}

struct Stage {
    name: String,
    args: Value,
    transform: Arc<StepFn>,
}

/// A resolved, runnable step sequence.
pub struct Pipeline {
    template_id: String,
    defaults: WorldState,
    stages: Vec<Stage>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("template_id", &self.template_id)
            .field("stages", &self.step_names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Build one candidate world from a fresh copy of the defaults.
    ///
    /// A panicking transform is reported as a failure of that step.
    ///
    /// # Errors
    ///
    /// Returns the first [`StepFailure`]; later steps do not run.
    pub fn run(&self, rng: &mut RngContext) -> Result<WorldState, StepFailure> {
        let mut world = self.defaults.clone();
        for (index, stage) in self.stages.iter().enumerate() {
            let _span = tracing::debug_span!("step", name = %stage.name, index).entered();
            let input = world;
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                (stage.transform)(input, &stage.args, rng)
            }));
            world = match outcome {
                Ok(Ok(next)) => next,
                Ok(Err(e)) => {
                    tracing::debug!(reason = %e.reason, "step rejected its input");
                    return Err(StepFailure {
                        step: stage.name.clone(),
                        index,
                        reason: e.reason,
                    });
                }
                Err(_) => {
                    return Err(StepFailure {
                        step: stage.name.clone(),
                        index,
                        reason: "transform panicked".into(),
                    })
                }
            };
            tracing::trace!(fields = world.len(), draws = rng.draws(), "step applied");
        }
        Ok(world)
    }
}

/// Read a float argument, falling back to `default` when absent.
///
/// # Errors
///
/// Returns [`StepError`] when the argument is present but not a number.
pub fn arg_f64(args: &Value, key: &str, default: f64) -> Result<f64, StepError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_f64()
            .ok_or_else(|| StepError::new(format!("argument `{key}` must be a number"))),
    }
}

/// Read an unsigned integer argument, falling back to `default` when absent.
///
/// # Errors
///
/// Returns [`StepError`] when the argument is present but not a `u64`.
pub fn arg_u64(args: &Value, key: &str, default: u64) -> Result<u64, StepError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_u64()
            .ok_or_else(|| StepError::new(format!("argument `{key}` must be a non-negative integer"))),
    }
}
