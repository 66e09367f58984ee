//! `RngContext`: the seeded random stream threaded through generation.
//!
//! There is no global generator. Every generation attempt owns an
//! `RngContext`, and independent attempts derive their own streams with
//! [`RngContext::fork`], so attempts can run concurrently and any single
//! attempt can be reproduced from `(seed, stream)` alone.
//!
//! The backing generator is `ChaCha20Rng`, whose output for a given seed and
//! stream is fixed across platforms and crate releases. Index sampling goes
//! through `u64` so results do not depend on pointer width.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Deterministic, explicitly passed random stream.
#[derive(Debug, Clone)]
pub struct RngContext {
    seed: u64,
    stream: u64,
    draws: u64,
    rng: ChaCha20Rng,
}

impl RngContext {
    /// Root context for a seed (stream 0).
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self::with_stream(seed, 0)
    }

    fn with_stream(seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        Self {
            seed,
            stream,
            draws: 0,
            rng,
        }
    }

    /// Derive an independent child context.
    ///
    /// The child shares this context's seed and gets a stream id mixed from
    /// the parent's stream and `label`. The parent is not advanced, so forking
    /// attempt `n` never depends on how many draws attempt `n - 1` consumed.
    #[must_use]
    pub fn fork(&self, label: u64) -> Self {
        Self::with_stream(self.seed, mix_stream(self.stream, label))
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn stream(&self) -> u64 {
        self.stream
    }

    /// Number of primitive draws taken so far.
    #[must_use]
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Uniform index in `0..len`. Returns `None` when `len == 0`.
    pub fn gen_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let bound = len as u64;
        let pick = self.gen_range(0..bound);
        usize::try_from(pick).ok()
    }

    /// Uniform integer in `[low, high]` (inclusive). `low > high` yields `low`.
    pub fn gen_range_i64(&mut self, low: i64, high: i64) -> i64 {
        if low >= high {
            return low;
        }
        self.gen_range(low..=high)
    }

    /// Uniform float in `[low, high)`. A degenerate range yields `low`.
    pub fn gen_range_f64(&mut self, low: f64, high: f64) -> f64 {
        if low.partial_cmp(&high) != Some(std::cmp::Ordering::Less) {
            return low;
        }
        self.gen_range(low..high)
    }

    /// Bernoulli draw; `p` is clamped to `[0, 1]`.
    pub fn gen_bool_p(&mut self, p: f64) -> bool {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self.gen_bool(p)
    }

    /// Pick one element uniformly.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        let idx = self.gen_index(items.len())?;
        items.get(idx)
    }

    /// In-place Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(self);
    }
}

impl RngCore for RngContext {
    fn next_u32(&mut self) -> u32 {
        self.draws += 1;
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws += 1;
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws += 1;
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws += 1;
        self.rng.try_fill_bytes(dest)
    }
}

/// SplitMix64 finalizer over `(parent_stream, label)`.
fn mix_stream(parent: u64, label: u64) -> u64 {
    let mut z = parent
        .rotate_left(32)
        .wrapping_add(label)
        .wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
