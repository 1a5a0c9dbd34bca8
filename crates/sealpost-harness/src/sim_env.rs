//! Simulated environment with a seeded RNG and a manually advanced clock.
//!
//! Clones share state, so a clone handed to a service and the copy kept by
//! the test observe the same clock and draw from the same RNG stream.

use std::{
    ops::Sub,
    sync::{Arc, Mutex},
    time::Duration,
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sealpost_core::env::Environment;

/// Default wall clock origin: 2023-11-14T22:13:20Z.
pub const DEFAULT_EPOCH_MILLIS: u64 = 1_700_000_000_000;

/// Virtual monotonic instant, measured from simulation start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Time since simulation start.
    pub fn elapsed_since_start(self) -> Duration {
        self.0
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

struct SimState {
    rng: ChaCha20Rng,
    elapsed: Duration,
    epoch_millis: u64,
}

/// Deterministic [`Environment`] for tests.
///
/// Time only moves when [`SimEnv::advance`] is called.
#[derive(Clone)]
pub struct SimEnv {
    state: Arc<Mutex<SimState>>,
}

impl SimEnv {
    /// Environment seeded with 0.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Environment whose RNG stream is fixed by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                rng: ChaCha20Rng::seed_from_u64(seed),
                elapsed: Duration::ZERO,
                epoch_millis: DEFAULT_EPOCH_MILLIS,
            })),
        }
    }

    /// Move both clocks forward by `duration`.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock().expect("Mutex poisoned");
        state.elapsed += duration;
    }

    /// Set the wall clock origin without touching the monotonic clock.
    ///
    /// Lets tests simulate wall clock steps, including backwards jumps.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn set_epoch_millis(&self, epoch_millis: u64) {
        let mut state = self.state.lock().expect("Mutex poisoned");
        state.epoch_millis = epoch_millis;
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    #[allow(clippy::expect_used)]
    fn now(&self) -> SimInstant {
        SimInstant(self.state.lock().expect("Mutex poisoned").elapsed)
    }

    #[allow(clippy::expect_used)]
    fn wall_clock_millis(&self) -> u64 {
        let state = self.state.lock().expect("Mutex poisoned");
        let elapsed = u64::try_from(state.elapsed.as_millis()).unwrap_or(u64::MAX);
        state.epoch_millis.saturating_add(elapsed)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.state.lock().expect("Mutex poisoned").rng.fill_bytes(buffer);
    }
}
