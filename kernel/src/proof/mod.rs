//! Proof module: canonical JSON and domain-separated hashing.
//!
//! Nothing in `proof` depends on `carrier`.

pub mod canon;
pub mod hash;
pub mod hash_domain;
