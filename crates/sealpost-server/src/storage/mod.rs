//! Storage abstraction for accounts and messages
//!
//! One trait covers both the Account Store and the Message Store. The trait
//! is synchronous (no async); every method is a single atomic operation on
//! the backend.

mod chaotic;
mod error;
mod memory;
mod redb;

pub use chaotic::{ChaoticStorage, INJECTED_FAILURE};
pub use error::StorageError;
pub use memory::MemoryStorage;
use sealpost_core::model::{Account, AccountId, Message};

pub use self::redb::RedbStorage;

/// Storage abstraction for account and message records
///
/// Must be Clone (shared by the authority and the service), Send + Sync
/// (thread-safe), and synchronous (no async methods). Implementations share
/// internal state via Arc, so clones access the same underlying storage.
///
/// Stores trust their input: validation and normalization happen at the
/// service boundary before any record gets here.
///
/// # Panics
///
/// The in-memory backend panics on a poisoned mutex. Durable backends report
/// every failure as a [`StorageError`].
pub trait Storage: Clone + Send + Sync + 'static {
    /// Insert a new account.
    ///
    /// # Invariants
    ///
    /// - Atomic check-then-insert: of two racing inserts sharing a username
    ///   or email, exactly one succeeds
    /// - Post on error: nothing was written
    ///
    /// # Errors
    ///
    /// - `Duplicate`: `id`, `username` or `email` already exists
    fn insert_account(&self, account: &Account) -> Result<(), StorageError>;

    /// Account with exactly this username (case-sensitive).
    fn account_by_username(&self, username: &str) -> Result<Option<Account>, StorageError>;

    /// Account with this id.
    fn account_by_id(&self, id: AccountId) -> Result<Option<Account>, StorageError>;

    /// All accounts, ordered by username bytes.
    fn list_accounts(&self) -> Result<Vec<Account>, StorageError>;

    /// Append a message to the conversation between its two parties.
    ///
    /// # Invariants
    ///
    /// - Post: the whole record, both ciphertexts included, is persisted or
    ///   nothing is
    fn insert_message(&self, message: &Message) -> Result<(), StorageError>;

    /// Messages exchanged between `a` and `b` in either direction.
    ///
    /// Ordered by `timestamp_ms` ascending, ties in insertion order. The
    /// argument order does not matter.
    fn conversation(&self, a: AccountId, b: AccountId) -> Result<Vec<Message>, StorageError>;
}

/// Conversation key: the unordered pair of participants, lower id first.
pub(crate) fn conversation_key(a: AccountId, b: AccountId) -> (AccountId, AccountId) {
    if a <= b { (a, b) } else { (b, a) }
}
