//! Jitter RNG for scheduled protocol events (retries, periodic digest
//! re-emission, waiting-list re-checks).
//!
//! A process-global seeded RNG is used by default; tests inject a fixed
//! seed so that convergence and ordering assertions stay reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

pub struct Jitter {
    rng: StdRng,
}

impl Jitter {
    /// Seeds from the OS entropy source; use for production engines.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Fixed-seed constructor for deterministic tests.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws a uniform duration in `[low, high]` inclusive.
    pub fn next(&mut self, low: Duration, high: Duration) -> Duration {
        if low >= high {
            return low;
        }
        let low_ms = low.as_millis() as u64;
        let high_ms = high.as_millis() as u64;
        Duration::from_millis(self.rng.gen_range(low_ms..=high_ms))
    }
}
