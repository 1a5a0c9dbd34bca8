//! Fault-injecting storage for chaos tests.
//!
//! Wraps another backend and fails a seeded fraction of calls before they
//! reach it. Tests use it to check that store failures surface at the service
//! boundary as the generic store error and never leave partial writes.

use std::sync::{Arc, Mutex};

use sealpost_core::model::{Account, AccountId, Message};

use super::{Storage, StorageError};

/// Detail attached to injected failures. Tests assert it never leaks.
pub const INJECTED_FAILURE: &str = "chaotic failure injection";

const DEFAULT_SEED: u64 = 0x5EA1_9057_C4A0_5EED;

/// Storage wrapper failing calls at `failure_rate`.
///
/// A failed call never reaches the inner backend. Clones share the RNG and
/// the call counter, so a clone handed to the service and one kept by the
/// test observe the same sequence.
#[derive(Clone)]
pub struct ChaoticStorage<S: Storage> {
    inner: S,
    failure_rate: f64,
    chaos: Arc<Mutex<Chaos>>,
}

/// Seeded decision state.
struct Chaos {
    /// splitmix64 state
    state: u64,
    calls: usize,
}

impl Chaos {
    /// Uniform value in `[0, 1)` from the top 53 bits of splitmix64.
    fn next_unit(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }
}

impl<S: Storage> ChaoticStorage<S> {
    /// Wrap `inner` with a fixed default seed.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is outside `[0.0, 1.0]`.
    pub fn new(inner: S, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, DEFAULT_SEED)
    }

    /// Wrap `inner`; the same seed yields the same failure pattern.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is outside `[0.0, 1.0]`.
    pub fn with_seed(inner: S, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be within [0.0, 1.0], got {failure_rate}"
        );

        Self { inner, failure_rate, chaos: Arc::new(Mutex::new(Chaos { state: seed, calls: 0 })) }
    }

    /// The wrapped backend, for checking state after a chaotic run.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Calls attempted so far, failed ones included.
    pub fn operation_count(&self) -> usize {
        #[allow(clippy::expect_used)]
        self.chaos.lock().expect("chaos mutex poisoned").calls
    }

    /// Count the call and decide whether it fails.
    #[allow(clippy::expect_used)]
    fn inject(&self) -> Result<(), StorageError> {
        let mut chaos = self.chaos.lock().expect("chaos mutex poisoned");
        chaos.calls += 1;

        // next_unit() < 1.0, so a rate of 1.0 fails every call
        if chaos.next_unit() < self.failure_rate {
            Err(StorageError::Io(INJECTED_FAILURE.to_string()))
        } else {
            Ok(())
        }
    }
}

impl<S: Storage> Storage for ChaoticStorage<S> {
    fn insert_account(&self, account: &Account) -> Result<(), StorageError> {
        self.inject()?;
        self.inner.insert_account(account)
    }

    fn account_by_username(&self, username: &str) -> Result<Option<Account>, StorageError> {
        self.inject()?;
        self.inner.account_by_username(username)
    }

    fn account_by_id(&self, id: AccountId) -> Result<Option<Account>, StorageError> {
        self.inject()?;
        self.inner.account_by_id(id)
    }

    fn list_accounts(&self) -> Result<Vec<Account>, StorageError> {
        self.inject()?;
        self.inner.list_accounts()
    }

    fn insert_message(&self, message: &Message) -> Result<(), StorageError> {
        self.inject()?;
        self.inner.insert_message(message)
    }

    fn conversation(&self, a: AccountId, b: AccountId) -> Result<Vec<Message>, StorageError> {
        self.inject()?;
        self.inner.conversation(a, b)
    }
}
