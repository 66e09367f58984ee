//! levelcert search: bounded, deterministic breadth-first reachability.
//!
//! This crate depends only on `levelcert_kernel`. It does NOT depend on
//! `levelcert_harness`.
//!
//! # Crate dependency graph
//!
//! ```text
//! levelcert_kernel  ←  levelcert_search  ←  levelcert_harness
//! (world, rng, hash)   (frontier, engine)    (pipeline, retry, checks)
//! ```
//!
//! # Key types
//!
//! - [`SearchSpace`] -- trait a puzzle implements to be searched
//! - [`Budget`] -- hard ceilings on depth, frontier size and visited count
//! - [`SearchOutcome`] -- `Reached`, `Unreachable`, `BudgetExceeded`, or `Aborted`
//! - [`DedupKey`] -- quantized, ordered visited-set key
//! - [`SearchReport`] -- counters and termination audit for one search
//! - [`sampling::SampledOutcome`] -- Monte Carlo estimate (statistical, not a proof)

#![forbid(unsafe_code)]

pub mod contract;
pub mod error;
pub mod frontier;
pub mod key;
pub mod node;
pub mod policy;
pub mod report;
pub mod sampling;
pub mod search;

pub use contract::{FnSearchSpace, SearchSpace, Transition};
pub use error::SearchError;
pub use key::{DedupKey, DedupKeyBuilder};
pub use policy::{Budget, Ceiling};
pub use report::{PanicStage, SearchReport, TerminationReason};
pub use search::{reachable, SearchOutcome, SearchResult};
