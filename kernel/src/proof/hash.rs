//! Canonical hashing: SHA-256 with domain separation.
//!
//! **Exactly one place defines canonical hashing.** Digest strings have the
//! form `"sha256:<hex_digest>"`.

use sha2::{Digest, Sha256};

pub use super::hash_domain::HashDomain;

/// A content-addressed hash with algorithm identifier.
///
/// Format: `"algorithm:hex_digest"` (e.g., `"sha256:abcdef..."`)
///
/// Invariant: the inner string always contains exactly one `:` separator,
/// with non-empty substrings on both sides (enforced by [`ContentHash::parse`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash {
    full: String,
    colon: usize,
}

impl ContentHash {
    /// Parse from `"algorithm:hex"` format.
    ///
    /// Returns `None` if the format is invalid (missing colon,
    /// empty algorithm, or empty digest).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let colon = s.find(':')?;
        if colon == 0 || colon == s.len() - 1 {
            return None;
        }
        if s[colon + 1..].contains(':') {
            return None;
        }
        Some(Self {
            full: s.to_string(),
            colon,
        })
    }

    /// The algorithm portion (e.g., "sha256").
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.full[..self.colon]
    }

    /// The hex digest portion.
    #[must_use]
    pub fn hex_digest(&self) -> &str {
        &self.full[self.colon + 1..]
    }

    /// The full string representation (`"algorithm:hex_digest"`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full)
    }
}

/// Compute the canonical hash of a byte slice with domain separation.
///
/// `sha256(domain_bytes || data)`, rendered as `"sha256:<hex>"`.
#[must_use]
pub fn canonical_hash(domain: HashDomain, data: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(domain.as_bytes());
    hasher.update(data);
    let digest = hasher.finalize();
    let full = format!("sha256:{}", hex::encode(digest));
    ContentHash { full, colon: 6 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_parse_valid() {
        let h = ContentHash::parse("sha256:abcdef0123456789").unwrap();
        assert_eq!(h.algorithm(), "sha256");
        assert_eq!(h.hex_digest(), "abcdef0123456789");
        assert_eq!(h.as_str(), "sha256:abcdef0123456789");
    }

    #[test]
    fn content_hash_parse_rejects_bad_format() {
        assert!(ContentHash::parse("nocolon").is_none());
        assert!(ContentHash::parse(":noalg").is_none());
        assert!(ContentHash::parse("nodigest:").is_none());
        assert!(ContentHash::parse("a:b:c").is_none());
    }

    #[test]
    fn canonical_hash_round_trips_through_parse() {
        let h = canonical_hash(HashDomain::WorldState, b"abc");
        assert_eq!(h.algorithm(), "sha256");
        assert_eq!(h.hex_digest().len(), 64);
        assert_eq!(ContentHash::parse(h.as_str()).unwrap(), h);
    }

    #[test]
    fn domains_separate_identical_payloads() {
        let a = canonical_hash(HashDomain::WorldState, b"payload");
        let b = canonical_hash(HashDomain::DedupKey, b"payload");
        assert_ne!(a, b);
    }

    #[test]
    fn canonical_hash_is_deterministic() {
        let first = canonical_hash(HashDomain::Template, b"{}");
        for _ in 0..10 {
            assert_eq!(canonical_hash(HashDomain::Template, b"{}"), first);
        }
    }
}
