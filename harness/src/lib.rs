//! levelcert harness: level generation, verification and certification.
//!
//! The harness runs a template through a domain's generation pipeline,
//! validates the result (schema, then solvability, then rewards) and
//! retries until a level passes or the domain's fallback is emitted.
//!
//! The harness does NOT implement search. Solvability is delegated to
//! `levelcert_search`; domains provide projections, never search loops.
//!
//! # Flow
//!
//! ```text
//! WorldTemplate ─resolve→ Pipeline ─run(rng)→ WorldState
//!                                                │
//!                  schema::check → LevelDomain::solvability → reward::analyze
//!                                                │
//!                                        ValidationReport
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod batch;
pub mod contract;
pub mod level_io;
pub mod pipeline;
pub mod policy;
pub mod report;
pub mod reward;
pub mod runner;
pub mod schema;
pub mod template;
pub mod verifier;
pub mod witness;
pub mod worlds;

pub use contract::{LevelDomain, ProjectionError, SolvabilityCheck};
pub use policy::{PolicyConfig, PolicySnapshot, RetryPolicy};
pub use report::{Issue, IssueKind, Severity, ValidationReport};
pub use runner::{generate_valid, AuthoringError, GeneratedLevel, Provenance};
pub use template::{StepSpec, TemplateError, WorldTemplate};
pub use verifier::Verifier;
