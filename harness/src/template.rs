//! World templates: the read-only input to generation.
//!
//! A template carries the default field layout, the ordered list of named
//! generation steps with their arguments, and the episode limits used by the
//! reward analyzer. Templates are loaded, never generated.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use levelcert_kernel::carrier::quantize::Precision;
use levelcert_kernel::carrier::world::{WorldError, WorldState};
use levelcert_kernel::proof::canon::canonical_json_bytes;
use levelcert_kernel::proof::hash::{canonical_hash, ContentHash, HashDomain};

/// One `{name, args}` entry of a template's step list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
    pub name: String,
    #[serde(default = "empty_args")]
    pub args: Value,
}

impl StepSpec {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

fn empty_args() -> Value {
    Value::Object(serde_json::Map::new())
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldTemplate {
    pub template_id: String,
    #[serde(default = "default_version")]
    pub version: u32,
    /// Starting document for every attempt.
    #[serde(default)]
    pub defaults: WorldState,
    pub steps: Vec<StepSpec>,
    /// Episode length used by the reward analyzer.
    pub max_steps: u32,
    /// Size of the agent's action space.
    pub action_count: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("cannot read template {path}: {detail}")]
    Io { path: String, detail: String },
    #[error("template is not valid JSON: {detail}")]
    Parse { detail: String },
    #[error("template {template_id}: {detail}")]
    Invalid { template_id: String, detail: String },
    /// A step name has no transform in the domain's registry.
    #[error("unknown generation step `{name}` at index {index}")]
    UnknownStep { name: String, index: usize },
    #[error(transparent)]
    World(#[from] WorldError),
}

impl WorldTemplate {
    /// Parse and validate a template from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Parse`] for malformed JSON and
    /// [`TemplateError::Invalid`] when the structure is unusable.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, TemplateError> {
        let template: Self = serde_json::from_slice(bytes).map_err(|e| TemplateError::Parse {
            detail: e.to_string(),
        })?;
        template.validate()?;
        Ok(template)
    }

    /// Load a template file.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Io`] if the file cannot be read, otherwise
    /// the errors of [`WorldTemplate::from_json_bytes`].
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let bytes = std::fs::read(path).map_err(|e| TemplateError::Io {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        Self::from_json_bytes(&bytes)
    }

    /// Structural checks that do not need a step registry.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Invalid`] for an empty id, no steps, or a
    /// zero episode length.
    pub fn validate(&self) -> Result<(), TemplateError> {
        let invalid = |detail: &str| TemplateError::Invalid {
            template_id: self.template_id.clone(),
            detail: detail.into(),
        };
        if self.template_id.is_empty() {
            return Err(invalid("template_id must not be empty"));
        }
        if self.steps.is_empty() {
            return Err(invalid("at least one generation step is required"));
        }
        if self.max_steps == 0 {
            return Err(invalid("max_steps must be at least 1"));
        }
        if self.steps.iter().any(|s| !s.args.is_object()) {
            return Err(invalid("step args must be JSON objects"));
        }
        Ok(())
    }

    /// Arguments of the first step named `name`.
    #[must_use]
    pub fn step_args(&self, name: &str) -> Option<&Value> {
        self.steps.iter().find(|s| s.name == name).map(|s| &s.args)
    }

    /// Copy of this template with `key` set in the args of every step named
    /// `step`. Returns `None` if no such step exists.
    #[must_use]
    pub fn with_step_arg(&self, step: &str, key: &str, value: impl Into<Value>) -> Option<Self> {
        let value = value.into();
        let mut out = self.clone();
        let mut found = false;
        for spec in out.steps.iter_mut().filter(|s| s.name == step) {
            if let Value::Object(args) = &mut spec.args {
                args.insert(key.to_string(), value.clone());
                found = true;
            }
        }
        found.then_some(out)
    }

    /// Canonical bytes, with floats quantized at the default precision.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::World`] if a float cannot be quantized.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, TemplateError> {
        let tree = serde_json::to_value(self).map_err(|e| TemplateError::Parse {
            detail: e.to_string(),
        })?;
        let quantized = Precision::DEFAULT
            .quantize_value(&tree)
            .map_err(WorldError::from)?;
        Ok(canonical_json_bytes(&quantized).map_err(WorldError::from)?)
    }

    /// Content digest binding this template.
    ///
    /// # Errors
    ///
    /// Same as [`WorldTemplate::canonical_bytes`].
    pub fn digest(&self) -> Result<ContentHash, TemplateError> {
        Ok(canonical_hash(HashDomain::Template, &self.canonical_bytes()?))
    }
}
