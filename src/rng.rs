//! Draw generation for round resolution
//!
//! One well-distributed generator behind a lock so draws can be taken from
//! timer tasks concurrently with user-initiated rounds. Production engines
//! seed from OS entropy; tests substitute a fixed seed for reproducible
//! round sequences.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Shared source of uniform draws
pub struct DrawRng {
    inner: Mutex<StdRng>,
}

impl DrawRng {
    /// Generator seeded from OS entropy (production default)
    pub fn from_entropy() -> Self {
        Self {
            inner: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic generator for reproducible tests and simulations
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Uniform float in [0, 1)
    pub fn next_uniform(&self) -> f64 {
        self.inner.lock().unwrap().gen::<f64>()
    }

    /// Uniform integer in [0, max_exclusive)
    pub fn next_below(&self, max_exclusive: u32) -> u32 {
        debug_assert!(max_exclusive > 0);
        self.inner.lock().unwrap().gen_range(0..max_exclusive)
    }
}
