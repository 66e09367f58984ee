//! Retry policy and its auditable snapshot.
//!
//! The snapshot is canonical JSON over every parameter that affects which
//! level a seed produces, so two runs can prove they used the same policy.

use serde::{Deserialize, Serialize};

use levelcert_kernel::carrier::quantize::Precision;
use levelcert_kernel::carrier::world::WorldError;
use levelcert_kernel::proof::canon::canonical_json_bytes;
use levelcert_kernel::proof::hash::{canonical_hash, ContentHash, HashDomain};
use levelcert_search::Budget;

use crate::reward::AnalyzerConfig;

const DEFAULT_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_NARROWING_ROUNDS: u32 = 3;

/// Bounds on the generate-verify loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts per narrowing round (round 0 is the unmodified template).
    pub max_attempts: u32,
    /// Narrowing rounds tried before the fallback world.
    pub narrowing_rounds: u32,
    pub budget: Budget,
    pub analyzer: AnalyzerConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            narrowing_rounds: DEFAULT_NARROWING_ROUNDS,
            budget: Budget::default(),
            analyzer: AnalyzerConfig::default(),
        }
    }
}

/// Policy configuration that can override defaults.
#[derive(Debug, Clone, Default)]
pub struct PolicyConfig {
    pub max_attempts: Option<u32>,
    pub narrowing_rounds: Option<u32>,
    pub budget: Option<Budget>,
    pub analyzer: Option<AnalyzerConfig>,
}

impl PolicyConfig {
    /// Apply overrides on top of [`RetryPolicy::default`].
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        let base = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(base.max_attempts),
            narrowing_rounds: self.narrowing_rounds.unwrap_or(base.narrowing_rounds),
            budget: self.budget.unwrap_or(base.budget),
            analyzer: self.analyzer.unwrap_or(base.analyzer),
        }
    }
}

/// In-memory policy snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySnapshot {
    /// Canonical JSON bytes of the snapshot.
    pub bytes: Vec<u8>,
}

impl PolicySnapshot {
    #[must_use]
    pub fn digest(&self) -> ContentHash {
        canonical_hash(HashDomain::PolicySnapshot, &self.bytes)
    }
}

impl RetryPolicy {
    /// Pre-flight checks.
    ///
    /// # Errors
    ///
    /// Returns a description when `max_attempts` is zero, the budget is
    /// invalid, or the density fraction is not in `[0, 1]`.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".into());
        }
        self.budget.validate().map_err(|e| e.to_string())?;
        if !(0.0..=1.0).contains(&self.analyzer.density_fraction) {
            return Err(format!(
                "density_fraction {} must be within [0, 1]",
                self.analyzer.density_fraction
            ));
        }
        Ok(())
    }

    /// Canonical snapshot. Floats are quantized at the default precision.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if a value cannot be quantized.
    pub fn snapshot(&self) -> Result<PolicySnapshot, WorldError> {
        let tags: Vec<&str> = self.analyzer.action_tags.iter().map(String::as_str).collect();
        let value = serde_json::json!({
            "analyzer": {
                "action_tags": tags,
                "density_fraction": self.analyzer.density_fraction,
                "density_severity": self.analyzer.density_severity,
                "farming_severity": self.analyzer.farming_severity,
                "misalignment_severity": self.analyzer.misalignment_severity,
                "penalty_severity": self.analyzer.penalty_severity,
            },
            "budget": {
                "max_depth": self.budget.max_depth,
                "max_frontier_size": self.budget.max_frontier_size,
                "max_visited": self.budget.max_visited,
            },
            "max_attempts": self.max_attempts,
            "narrowing_rounds": self.narrowing_rounds,
            "quantization_decimals": Precision::DEFAULT.decimals(),
        });
        let quantized = Precision::DEFAULT.quantize_value(&value)?;
        Ok(PolicySnapshot {
            bytes: canonical_json_bytes(&quantized)?,
        })
    }
}
