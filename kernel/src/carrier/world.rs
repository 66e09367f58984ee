//! `WorldState`: the level document produced by generation.
//!
//! A `WorldState` is a JSON object of named fields (grid, entities, counters,
//! global parameters). The kernel never interprets field semantics. It
//! clones, mutates through supplied transforms, serializes, and digests.
//!
//! Storage is an `Arc`'d map with clone-on-write: cloning a world is O(1), and
//! the first mutation through [`WorldState::set`] or [`WorldState::get_mut`]
//! detaches the clone from its siblings. Each generation attempt therefore
//! starts from a template clone without copying it and cannot leak mutations
//! into the template or into another attempt.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::carrier::quantize::{Precision, QuantizeError};
use crate::proof::canon::{canonical_json_bytes, CanonError};
use crate::proof::hash::{canonical_hash, ContentHash, HashDomain};

/// Errors constructing or digesting a `WorldState`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    /// The document root was not a JSON object.
    #[error("world document must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },
    /// A float could not be quantized for hashing.
    #[error("world digest: {0}")]
    Quantize(#[from] QuantizeError),
    /// Canonical serialization failed.
    #[error("world digest: {0}")]
    Canon(#[from] CanonError),
}

/// Opaque, clone-on-write level document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldState {
    fields: Arc<Map<String, Value>>,
}

impl WorldState {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NotAnObject`] unless `value` is an object.
    pub fn from_value(value: Value) -> Result<Self, WorldError> {
        match value {
            Value::Object(map) => Ok(Self {
                fields: Arc::new(map),
            }),
            other => Err(WorldError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Mutable access to a field, detaching shared storage first.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        Arc::make_mut(&mut self.fields).get_mut(name)
    }

    /// Set a field, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        Arc::make_mut(&mut self.fields).insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        if !self.fields.contains_key(name) {
            return None;
        }
        Arc::make_mut(&mut self.fields).remove(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Resolve an RFC 6901 JSON pointer (`/agent/x`) against the document.
    ///
    /// The empty pointer is not supported; the root is not a field.
    #[must_use]
    pub fn pointer(&self, path: &str) -> Option<&Value> {
        let rest = path.strip_prefix('/')?;
        let (head, tail) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };
        let head = head.replace("~1", "/").replace("~0", "~");
        let field = self.fields.get(&head)?;
        if tail.is_empty() {
            Some(field)
        } else {
            field.pointer(tail)
        }
    }

    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    #[must_use]
    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(Value::as_u64)
    }

    #[must_use]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get_array(&self, name: &str) -> Option<&Vec<Value>> {
        self.get(name).and_then(Value::as_array)
    }

    /// Field names in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names.into_iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object((*self.fields).clone())
    }

    /// True when both worlds still share one storage allocation.
    #[must_use]
    pub fn shares_storage_with(&self, other: &WorldState) -> bool {
        Arc::ptr_eq(&self.fields, &other.fields)
    }

    /// Canonical bytes of the quantized document.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if a float cannot be quantized.
    pub fn canonical_bytes(&self, precision: Precision) -> Result<Vec<u8>, WorldError> {
        let quantized = precision.quantize_value(&Value::Object((*self.fields).clone()))?;
        Ok(canonical_json_bytes(&quantized)?)
    }

    /// Content digest under the given quantization precision.
    ///
    /// Two worlds whose floats agree to `precision` share a digest.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if a float cannot be quantized.
    pub fn digest(&self, precision: Precision) -> Result<ContentHash, WorldError> {
        let bytes = self.canonical_bytes(precision)?;
        Ok(canonical_hash(HashDomain::WorldState, &bytes))
    }
}

impl TryFrom<Value> for WorldState {
    type Error = WorldError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
