//! Clock and entropy for the running server.
//!
//! Nothing here is reproducible. Tests that need determinism drive the
//! service with `SimEnv` from `sealpost-harness`.

use sealpost_core::env::Environment;

/// Wall clock, monotonic clock and OS entropy.
///
/// Every session id, token signing key, message id and password salt the
/// server mints is drawn through [`Environment::random_bytes`], which reads
/// the kernel CSPRNG via getrandom.
///
/// # Panics
///
/// `random_bytes` panics when the kernel refuses entropy.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// The system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn wall_clock_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}
