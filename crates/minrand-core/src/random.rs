//! Random number sources for the assignment selector.
//!
//! The selector takes its randomness through [`RandomSource`] so callers can
//! choose between a freshly seeded generator per assignment (production), a
//! fixed seed (reproducible runs) or a scripted sequence (tests).

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Uniform draws used by the selector.
pub trait RandomSource {
    /// A uniform value in `[0, 1)`.
    fn float64(&mut self) -> f64;

    /// A uniform index in `[0, n)`. `n` is at least 1.
    fn intn(&mut self, n: usize) -> usize;
}

/// Adapter from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R>(R);

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl RngSource<SmallRng> {
    /// Seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self(SmallRng::from_os_rng())
    }

    /// Deterministic stream for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn float64(&mut self) -> f64 {
        self.0.random::<f64>()
    }

    fn intn(&mut self, n: usize) -> usize {
        self.0.random_range(0..n)
    }
}

/// Replays fixed draws, for tests that need a specific outcome.
///
/// Once a queue runs dry the source returns `0.0` and index `0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    floats: VecDeque<f64>,
    indices: VecDeque<usize>,
}

impl ScriptedSource {
    pub fn new(
        floats: impl IntoIterator<Item = f64>,
        indices: impl IntoIterator<Item = usize>,
    ) -> Self {
        Self {
            floats: floats.into_iter().collect(),
            indices: indices.into_iter().collect(),
        }
    }
}

impl RandomSource for ScriptedSource {
    fn float64(&mut self) -> f64 {
        self.floats.pop_front().unwrap_or(0.0)
    }

    fn intn(&mut self, n: usize) -> usize {
        self.indices.pop_front().unwrap_or(0) % n
    }
}
