//! Injected pseudo-random source used when a call carries no sequence.

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Thread-safe source of non-negative seeds.
pub trait RandomSource: Send + Sync {
    fn next_seed(&self) -> u64;
}

/// `StdRng` behind a mutex, seeded once from the wall clock.
pub struct TimeSeededRandom {
    rng: Mutex<StdRng>,
}

impl TimeSeededRandom {
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        Self::with_seed(nanos)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for TimeSeededRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for TimeSeededRandom {
    fn next_seed(&self) -> u64 {
        // Kept within i64 range so the value is valid as a call sequence too.
        self.rng.lock().gen_range(0..=i64::MAX as u64)
    }
}
