//! Fixed-precision float quantization.
//!
//! Floats never reach a hash function directly. They are first mapped to the
//! integer `round(x * 10^decimals)` (half away from zero), so two values that
//! differ by less than half a unit in the last kept decimal collapse to the
//! same integer. The precision governs which mechanically distinct states are
//! treated as equal, so every search space documents the precision it uses.
//!
//! Integers in a JSON tree are left untouched; only numbers stored as `f64`
//! are quantized, and each becomes the tagged object `{"$q": n}` so that a
//! float never digests like an integer. Object keys that already start with
//! `$` gain one more `$`, which keeps the tag out of reach of real fields.
//! `serde_json` keeps `2.0` as a float across a write/read round trip, so a
//! document quantizes identically after persistence.

use serde::{Deserialize, Serialize};

/// Key of the object that stands in for a quantized float.
pub const QUANTIZED_TAG: &str = "$q";

/// Largest supported number of decimals (`10^15` still fits an `f64` mantissa).
pub const MAX_DECIMALS: u8 = 15;

/// Failure to quantize a value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QuantizeError {
    /// NaN or infinity.
    #[error("cannot quantize non-finite value {value}")]
    NonFinite { value: f64 },
    /// The scaled value does not fit in `i64`.
    #[error("value {value} overflows i64 at {decimals} decimals")]
    Overflow { value: f64, decimals: u8 },
    /// Requested precision is above [`MAX_DECIMALS`].
    #[error("precision of {decimals} decimals exceeds maximum {MAX_DECIMALS}")]
    PrecisionTooFine { decimals: u8 },
}

/// Quantization precision: number of decimal places kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Precision {
    decimals: u8,
}

impl Precision {
    /// The workspace default: 6 decimals (`1e-6`).
    pub const DEFAULT: Precision = Precision { decimals: 6 };

    /// Construct a precision.
    ///
    /// # Errors
    ///
    /// Returns [`QuantizeError::PrecisionTooFine`] above [`MAX_DECIMALS`].
    pub fn new(decimals: u8) -> Result<Self, QuantizeError> {
        if decimals > MAX_DECIMALS {
            return Err(QuantizeError::PrecisionTooFine { decimals });
        }
        Ok(Self { decimals })
    }

    #[must_use]
    pub fn decimals(self) -> u8 {
        self.decimals
    }

    /// The quantization step, e.g. `1e-6` for 6 decimals.
    #[must_use]
    pub fn step(self) -> f64 {
        10f64.powi(-i32::from(self.decimals))
    }

    /// Quantize a single float.
    ///
    /// `-0.0` and `0.0` both map to `0`.
    ///
    /// # Errors
    ///
    /// Returns [`QuantizeError::NonFinite`] for NaN/infinity and
    /// [`QuantizeError::Overflow`] when the scaled value leaves `i64` range.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn quantize_f64(self, value: f64) -> Result<i64, QuantizeError> {
        if !value.is_finite() {
            return Err(QuantizeError::NonFinite { value });
        }
        let scaled = (value * 10f64.powi(i32::from(self.decimals))).round();
        // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
        if scaled >= i64::MAX as f64 || scaled < i64::MIN as f64 {
            return Err(QuantizeError::Overflow {
                value,
                decimals: self.decimals,
            });
        }
        Ok(scaled as i64)
    }

    /// Replace every float in a JSON tree with `{"$q": quantized}`.
    ///
    /// The mapping is injective on its inputs: `2`, `2.0` and
    /// `{"$q": 2000000}` all produce different trees.
    ///
    /// # Errors
    ///
    /// Propagates the first [`QuantizeError`] encountered (depth-first,
    /// object keys in sorted order).
    pub fn quantize_value(self, value: &serde_json::Value) -> Result<serde_json::Value, QuantizeError> {
        use serde_json::Value;
        Ok(match value {
            Value::Number(n) if n.is_f64() => {
                let f = n.as_f64().unwrap_or(f64::NAN);
                let mut tagged = serde_json::Map::new();
                tagged.insert(QUANTIZED_TAG.to_string(), Value::from(self.quantize_f64(f)?));
                Value::Object(tagged)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|v| self.quantize_value(v))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                let mut out = serde_json::Map::new();
                for key in keys {
                    let escaped = if key.starts_with('$') {
                        format!("${key}")
                    } else {
                        key.clone()
                    };
                    out.insert(escaped, self.quantize_value(&map[key])?);
                }
                Value::Object(out)
            }
            other => other.clone(),
        })
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Precision {
    type Error = QuantizeError;

    fn try_from(decimals: u8) -> Result<Self, Self::Error> {
        Self::new(decimals)
    }
}

impl From<Precision> for u8 {
    fn from(p: Precision) -> Self {
        p.decimals
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "1e-{}", self.decimals)
    }
}
