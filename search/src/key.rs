//! Dedup keys: the quantized, ordered projection of a search state.
//!
//! A key is a self-delimiting byte string. Every pushed component writes a
//! one-byte type tag followed by a fixed-width or length-prefixed payload, so
//! `("ab", "c")` and `("a", "bc")` never produce the same key.
//!
//! Floats are quantized with the builder's [`Precision`] before they are
//! written. Non-finite values get dedicated tags (all NaNs compare equal),
//! and values that overflow the quantized range fall back to their raw bit
//! pattern, so building a key never fails.

use levelcert_kernel::carrier::quantize::{Precision, QuantizeError};
use levelcert_kernel::proof::hash::{canonical_hash, ContentHash, HashDomain};

const TAG_U64: u8 = 0x01;
const TAG_I64: u8 = 0x02;
const TAG_BOOL: u8 = 0x03;
const TAG_STR: u8 = 0x04;
const TAG_BYTES: u8 = 0x05;
const TAG_F64_QUANTIZED: u8 = 0x10;
const TAG_F64_NAN: u8 = 0x11;
const TAG_F64_POS_INF: u8 = 0x12;
const TAG_F64_NEG_INF: u8 = 0x13;
const TAG_F64_RAW: u8 = 0x14;

/// Ordered, hashable visited-set key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DedupKey(Vec<u8>);

impl DedupKey {
    /// Start building a key with the given float precision.
    #[must_use]
    pub fn builder(precision: Precision) -> DedupKeyBuilder {
        DedupKeyBuilder::new(precision)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Domain-separated digest of the key bytes (for reports and logs).
    #[must_use]
    pub fn fingerprint(&self) -> ContentHash {
        canonical_hash(HashDomain::DedupKey, &self.0)
    }
}

/// Builder for [`DedupKey`].
#[derive(Debug, Clone)]
pub struct DedupKeyBuilder {
    precision: Precision,
    bytes: Vec<u8>,
}

impl DedupKeyBuilder {
    #[must_use]
    pub fn new(precision: Precision) -> Self {
        Self {
            precision,
            bytes: Vec::with_capacity(32),
        }
    }

    #[must_use]
    pub fn u64(mut self, value: u64) -> Self {
        self.bytes.push(TAG_U64);
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    #[must_use]
    pub fn i64(mut self, value: i64) -> Self {
        self.bytes.push(TAG_I64);
        self.bytes.extend_from_slice(&value.to_le_bytes());
        self
    }

    #[must_use]
    pub fn bool(mut self, value: bool) -> Self {
        self.bytes.push(TAG_BOOL);
        self.bytes.push(u8::from(value));
        self
    }

    #[must_use]
    pub fn str(mut self, value: &str) -> Self {
        self.bytes.push(TAG_STR);
        self.push_len_prefixed(value.as_bytes());
        self
    }

    #[must_use]
    pub fn bytes(mut self, value: &[u8]) -> Self {
        self.bytes.push(TAG_BYTES);
        self.push_len_prefixed(value);
        self
    }

    /// Push a float, quantized to the builder's precision.
    #[must_use]
    pub fn f64(mut self, value: f64) -> Self {
        match self.precision.quantize_f64(value) {
            Ok(q) => {
                self.bytes.push(TAG_F64_QUANTIZED);
                self.bytes.extend_from_slice(&q.to_le_bytes());
            }
            Err(QuantizeError::NonFinite { .. }) if value.is_nan() => {
                self.bytes.push(TAG_F64_NAN);
            }
            Err(QuantizeError::NonFinite { .. }) if value > 0.0 => {
                self.bytes.push(TAG_F64_POS_INF);
            }
            Err(QuantizeError::NonFinite { .. }) => {
                self.bytes.push(TAG_F64_NEG_INF);
            }
            Err(_) => {
                self.bytes.push(TAG_F64_RAW);
                self.bytes.extend_from_slice(&value.to_bits().to_le_bytes());
            }
        }
        self
    }

    /// Push a sequence of floats (length-prefixed).
    #[must_use]
    pub fn f64s(mut self, values: &[f64]) -> Self {
        self = self.u64(values.len() as u64);
        for &v in values {
            self = self.f64(v);
        }
        self
    }

    #[must_use]
    pub fn finish(self) -> DedupKey {
        DedupKey(self.bytes)
    }

    fn push_len_prefixed(&mut self, data: &[u8]) {
        self.bytes
            .extend_from_slice(&(data.len() as u64).to_le_bytes());
        self.bytes.extend_from_slice(data);
    }
}
