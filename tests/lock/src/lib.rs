//! Shared helpers for the levelcert lock tests and fixture binaries.

pub mod crossproc;
pub mod scenarios;
