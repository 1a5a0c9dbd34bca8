//! Time and randomness behind a trait.
//!
//! Everything that reads a clock or draws random bytes (ids, salts, token
//! keys, session expiry, message timestamps) goes through [`Environment`].
//! Production passes the system clock and OS entropy; tests pass a seeded,
//! manually advanced environment and get reproducible runs.

use std::time::Duration;

/// Clock and entropy source.
///
/// # Contract
///
/// - `now()` is monotonic
/// - `random_bytes()` is cryptographically secure outside of tests
/// - No method fails under normal operation; an entropy failure is fatal
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic instant. Subtracting two yields the elapsed [`Duration`].
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current monotonic time, used for session expiry.
    fn now(&self) -> Self::Instant;

    /// Milliseconds since the Unix epoch, used for message timestamps.
    ///
    /// May step backwards; messages with equal timestamps keep insertion
    /// order.
    fn wall_clock_millis(&self) -> u64;

    /// Fill `buffer` with random bytes. Seeded environments repeat their
    /// sequence.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Random `u128`, used for account, message and session ids.
    fn random_u128(&self) -> u128 {
        let mut bytes = [0u8; 16];
        self.random_bytes(&mut bytes);
        u128::from_be_bytes(bytes)
    }
}
