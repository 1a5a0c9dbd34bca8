use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use sealpost_core::model::{Account, AccountId, Message};

use super::{Storage, StorageError, conversation_key};

/// Volatile backend for tests and simulation.
///
/// Clones share one `Arc<Mutex<_>>`. Every trait method holds the lock for
/// its whole body, so the username and email checks in `insert_account`
/// cannot interleave with another insert.
#[derive(Clone)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryStorageInner>>,
}

struct MemoryStorageInner {
    accounts: HashMap<AccountId, Account>,

    /// Username -> id, ordered for `list_accounts`
    usernames: BTreeMap<String, AccountId>,

    /// Normalized email -> id
    emails: HashMap<String, AccountId>,

    /// Conversation key -> messages, kept sorted by timestamp (stable)
    conversations: HashMap<(AccountId, AccountId), Vec<Message>>,
}

impl MemoryStorage {
    /// Empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryStorageInner {
                accounts: HashMap::new(),
                usernames: BTreeMap::new(),
                emails: HashMap::new(),
                conversations: HashMap::new(),
            })),
        }
    }

    /// Number of stored accounts.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn account_count(&self) -> usize {
        self.inner.lock().expect("Mutex poisoned").accounts.len()
    }

    /// Total number of messages across all conversations.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[allow(clippy::expect_used)]
    pub fn message_count(&self) -> usize {
        let inner = self.inner.lock().expect("Mutex poisoned");
        inner.conversations.values().map(Vec::len).sum()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    #[allow(clippy::expect_used)]
    fn insert_account(&self, account: &Account) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        if inner.usernames.contains_key(&account.username) {
            return Err(StorageError::Duplicate { field: "username" });
        }
        if inner.emails.contains_key(&account.email) {
            return Err(StorageError::Duplicate { field: "email" });
        }
        if inner.accounts.contains_key(&account.id) {
            return Err(StorageError::Duplicate { field: "id" });
        }

        inner.usernames.insert(account.username.clone(), account.id);
        inner.emails.insert(account.email.clone(), account.id);
        inner.accounts.insert(account.id, account.clone());

        debug_assert_eq!(inner.usernames.len(), inner.accounts.len());
        debug_assert_eq!(inner.emails.len(), inner.accounts.len());

        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn account_by_username(&self, username: &str) -> Result<Option<Account>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        Ok(inner.usernames.get(username).and_then(|id| inner.accounts.get(id)).cloned())
    }

    #[allow(clippy::expect_used)]
    fn account_by_id(&self, id: AccountId) -> Result<Option<Account>, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").accounts.get(&id).cloned())
    }

    #[allow(clippy::expect_used)]
    fn list_accounts(&self) -> Result<Vec<Account>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        Ok(inner.usernames.values().filter_map(|id| inner.accounts.get(id)).cloned().collect())
    }

    #[allow(clippy::expect_used)]
    fn insert_message(&self, message: &Message) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        let key = conversation_key(message.sender_id, message.recipient_id);
        let messages = inner.conversations.entry(key).or_default();

        // After every message with an equal or earlier timestamp
        let position = messages.partition_point(|m| m.timestamp_ms <= message.timestamp_ms);
        messages.insert(position, message.clone());

        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn conversation(&self, a: AccountId, b: AccountId) -> Result<Vec<Message>, StorageError> {
        let inner = self.inner.lock().expect("Mutex poisoned");

        Ok(inner.conversations.get(&conversation_key(a, b)).cloned().unwrap_or_default())
    }
}
