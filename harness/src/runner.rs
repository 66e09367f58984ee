//! Solvability-guaranteed retry loop.
//!
//! # Loop
//!
//! ```text
//! round 0: template            → [pipeline → validate] × max_attempts
//! round r: narrow(template, r) → [pipeline → validate] × max_attempts
//! fallback: domain.fallback_world() → validate (must pass)
//! ```
//!
//! Attempt `n` (counted across rounds) runs on `RngContext::from_seed(seed)
//! .fork(n)`, so every attempt is reproducible on its own. Nothing leaves
//! this function without a passing [`ValidationReport`].

use serde::{Deserialize, Serialize};

use levelcert_kernel::carrier::rng::RngContext;
use levelcert_kernel::carrier::world::WorldState;

use crate::contract::LevelDomain;
use crate::policy::RetryPolicy;
use crate::report::{Issue, IssueKind, ValidationReport};
use crate::template::{TemplateError, WorldTemplate};
use crate::verifier::Verifier;

/// Where an accepted world came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Provenance {
    /// Accepted from the unmodified template.
    Generated { attempt: u32 },
    /// Accepted after `round` narrowing steps.
    Narrowed { round: u32, attempt: u32 },
    /// Every attempt failed; the domain's fallback world was emitted.
    Fallback,
}

/// A validated level.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedLevel {
    pub world: WorldState,
    pub report: ValidationReport,
    pub provenance: Provenance,
    /// Pipeline runs performed, across all rounds.
    pub attempts_used: u32,
    pub seed: u64,
    pub template_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthoringError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("invalid retry policy: {detail}")]
    InvalidPolicy { detail: String },
    /// The hand-verified fallback world failed validation.
    #[error("fallback world for `{domain_id}` failed validation: {report}")]
    FallbackInvalid {
        domain_id: String,
        report: ValidationReport,
    },
    /// The batch worker generating this seed panicked.
    #[error("generation worker panicked on seed {seed}")]
    WorkerPanicked { seed: u64 },
}

/// Generate a level that passes validation, or the domain's fallback.
///
/// # Errors
///
/// Returns [`AuthoringError::InvalidPolicy`] for an unusable policy,
/// [`AuthoringError::Template`] when the template names unknown steps, and
/// [`AuthoringError::FallbackInvalid`] if even the fallback fails.
pub fn generate_valid(
    domain: &dyn LevelDomain,
    template: &WorldTemplate,
    policy: &RetryPolicy,
    seed: u64,
) -> Result<GeneratedLevel, AuthoringError> {
    policy
        .validate()
        .map_err(|detail| AuthoringError::InvalidPolicy { detail })?;
    template.validate()?;

    let verifier = Verifier::new(domain, policy.budget, policy.analyzer.clone());
    let registry = domain.step_registry();
    let root = RngContext::from_seed(seed);
    let mut attempts_used = 0_u32;
    let mut current = template.clone();

    for round in 0..=policy.narrowing_rounds {
        if round > 0 {
            let Some(narrowed) = domain.narrow(&current, round) else {
                tracing::debug!(round, "no further narrowing available");
                break;
            };
            tracing::info!(round, template = %narrowed.template_id, "narrowing template");
            current = narrowed;
        }
        let pipeline = registry.resolve(&current)?;

        for attempt in 0..policy.max_attempts {
            let mut rng = root.fork(u64::from(attempts_used));
            attempts_used += 1;

            let report = match pipeline.run(&mut rng) {
                Ok(world) => {
                    let report = verifier.validate(&world);
                    if report.is_valid() {
                        let provenance = if round == 0 {
                            Provenance::Generated { attempt }
                        } else {
                            Provenance::Narrowed { round, attempt }
                        };
                        tracing::info!(
                            domain = domain.domain_id(),
                            seed,
                            attempts_used,
                            depth = ?report.solution_depth,
                            "level accepted"
                        );
                        return Ok(GeneratedLevel {
                            world,
                            report,
                            provenance,
                            attempts_used,
                            seed,
                            template_id: current.template_id.clone(),
                        });
                    }
                    report
                }
                Err(failure) => {
                    let mut report = ValidationReport::new();
                    report.push(Issue::critical(IssueKind::StepFailure, failure.to_string()));
                    report
                }
            };
            tracing::debug!(round, attempt, %report, "attempt rejected");
        }
    }

    tracing::warn!(
        domain = domain.domain_id(),
        seed,
        attempts_used,
        "all attempts failed, emitting fallback world"
    );
    let world = domain.fallback_world();
    let report = verifier.validate(&world);
    if !report.is_valid() {
        return Err(AuthoringError::FallbackInvalid {
            domain_id: domain.domain_id().to_string(),
            report,
        });
    }
    Ok(GeneratedLevel {
        world,
        report,
        provenance: Provenance::Fallback,
        attempts_used,
        seed,
        template_id: current.template_id,
    })
}
