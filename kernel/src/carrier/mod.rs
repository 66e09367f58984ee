//! Carrier module: the values every generation attempt owns.
//!
//! - [`world`] -- `WorldState`, the level document
//! - [`rng`] -- `RngContext`, the seeded random stream
//! - [`quantize`] -- fixed-precision float quantization

pub mod quantize;
pub mod rng;
pub mod world;
