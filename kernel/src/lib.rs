//! levelcert kernel: the deterministic carrier layer.
//!
//! # API Surface
//!
//! - [`carrier::world::WorldState`] -- the opaque, clone-on-write level document
//! - [`carrier::rng::RngContext`] -- explicitly threaded, seeded random stream
//! - [`carrier::quantize::Precision`] -- float quantization for hashing and dedup
//! - [`proof::canon::canonical_json_bytes`] -- the single canonicalizer
//! - [`proof::hash::canonical_hash`] -- domain-separated SHA-256
//!
//! # Module Dependency Direction
//!
//! `carrier` ← `proof` for hashing only; `proof` depends on nothing internal.
//!
//! The kernel holds no global state. Every random draw goes through an
//! [`carrier::rng::RngContext`] value owned by the caller.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod carrier;
pub mod proof;
