//! Redb-backed durable storage implementation.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety.
//! All state survives server restarts. Redb allows a single write
//! transaction at a time, so the uniqueness check and the insert of
//! `insert_account` cannot interleave with another registration.

use std::{fmt::Display, path::Path, sync::Arc};

use redb::{Database, ReadableTable, TableDefinition};
use sealpost_core::model::{Account, AccountId, Message};
use serde::{Serialize, de::DeserializeOwned};

use super::{Storage, StorageError, conversation_key};

/// Table: accounts
/// Key: account id as big-endian bytes [16 bytes]
/// Value: CBOR-encoded Account
const ACCOUNTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("accounts");

/// Table: usernames
/// Key: username UTF-8 bytes
/// Value: account id [16 bytes]
const USERNAMES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("usernames");

/// Table: emails
/// Key: normalized email UTF-8 bytes
/// Value: account id [16 bytes]
const EMAILS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("emails");

/// Table: messages
/// Key: (low id, high id, timestamp_ms, seq) as big-endian bytes [48 bytes]
/// Value: CBOR-encoded Message
const MESSAGES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("messages");

/// Table: meta
/// Key: counter name
/// Value: counter value
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

/// Insertion counter breaking timestamp ties in MESSAGES keys.
const MESSAGE_SEQ: &str = "message_seq";

const MESSAGE_KEY_LEN: usize = 48;

/// Durable storage backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbStorage {
    db: Arc<Database>,
}

impl RedbStorage {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates tables if they don't exist (ACCOUNTS, USERNAMES, EMAILS,
    /// MESSAGES, META).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(io)?;

        let txn = db.begin_write().map_err(io)?;
        {
            let _ = txn.open_table(ACCOUNTS).map_err(io)?;
            let _ = txn.open_table(USERNAMES).map_err(io)?;
            let _ = txn.open_table(EMAILS).map_err(io)?;
            let _ = txn.open_table(MESSAGES).map_err(io)?;
            let _ = txn.open_table(META).map_err(io)?;
        }
        txn.commit().map_err(io)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl Storage for RedbStorage {
    fn insert_account(&self, account: &Account) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(io)?;

        {
            let mut accounts = txn.open_table(ACCOUNTS).map_err(io)?;
            let mut usernames = txn.open_table(USERNAMES).map_err(io)?;
            let mut emails = txn.open_table(EMAILS).map_err(io)?;

            let id = account.id.to_be_bytes();

            // Returning early drops the transaction uncommitted
            if usernames.get(account.username.as_bytes()).map_err(io)?.is_some() {
                return Err(StorageError::Duplicate { field: "username" });
            }
            if emails.get(account.email.as_bytes()).map_err(io)?.is_some() {
                return Err(StorageError::Duplicate { field: "email" });
            }
            if accounts.get(id.as_slice()).map_err(io)?.is_some() {
                return Err(StorageError::Duplicate { field: "id" });
            }

            let bytes = encode(account)?;
            accounts.insert(id.as_slice(), bytes.as_slice()).map_err(io)?;
            usernames.insert(account.username.as_bytes(), id.as_slice()).map_err(io)?;
            emails.insert(account.email.as_bytes(), id.as_slice()).map_err(io)?;
        }

        txn.commit().map_err(io)?;

        Ok(())
    }

    fn account_by_username(&self, username: &str) -> Result<Option<Account>, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let usernames = txn.open_table(USERNAMES).map_err(io)?;
        let accounts = txn.open_table(ACCOUNTS).map_err(io)?;

        let Some(id) = usernames.get(username.as_bytes()).map_err(io)? else {
            return Ok(None);
        };

        match accounts.get(id.value()).map_err(io)? {
            Some(value) => decode(value.value()).map(Some),
            None => Err(StorageError::Serialization(format!("dangling username index for {username}"))),
        }
    }

    fn account_by_id(&self, id: AccountId) -> Result<Option<Account>, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let accounts = txn.open_table(ACCOUNTS).map_err(io)?;

        match accounts.get(id.to_be_bytes().as_slice()).map_err(io)? {
            Some(value) => decode(value.value()).map(Some),
            None => Ok(None),
        }
    }

    fn list_accounts(&self) -> Result<Vec<Account>, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let usernames = txn.open_table(USERNAMES).map_err(io)?;
        let accounts = txn.open_table(ACCOUNTS).map_err(io)?;

        let mut result = Vec::new();
        for entry in usernames.iter().map_err(io)? {
            let (_, id) = entry.map_err(io)?;
            if let Some(value) = accounts.get(id.value()).map_err(io)? {
                result.push(decode(value.value())?);
            }
        }

        Ok(result)
    }

    fn insert_message(&self, message: &Message) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(io)?;

        {
            let mut meta = txn.open_table(META).map_err(io)?;
            let mut messages = txn.open_table(MESSAGES).map_err(io)?;

            let seq = meta.get(MESSAGE_SEQ).map_err(io)?.map_or(0, |v| v.value());

            let (low, high) = conversation_key(message.sender_id, message.recipient_id);
            let key = encode_message_key(low, high, message.timestamp_ms, seq);
            let bytes = encode(message)?;

            messages.insert(key.as_slice(), bytes.as_slice()).map_err(io)?;
            meta.insert(MESSAGE_SEQ, seq + 1).map_err(io)?;
        }

        txn.commit().map_err(io)?;

        Ok(())
    }

    fn conversation(&self, a: AccountId, b: AccountId) -> Result<Vec<Message>, StorageError> {
        let txn = self.db.begin_read().map_err(io)?;
        let messages = txn.open_table(MESSAGES).map_err(io)?;

        let (low, high) = conversation_key(a, b);
        let start = encode_message_key(low, high, 0, 0);
        let end = encode_message_key(low, high, u64::MAX, u64::MAX);

        let mut result = Vec::new();
        for entry in messages.range(start.as_slice()..=end.as_slice()).map_err(io)? {
            let (_, value) = entry.map_err(io)?;
            result.push(decode(value.value())?);
        }

        Ok(result)
    }
}

/// Encode a message key.
///
/// Layout: [low id: 16 BE][high id: 16 BE][timestamp_ms: 8 BE][seq: 8 BE]
/// Lexicographic order groups a conversation together and sorts it by
/// timestamp, then insertion.
fn encode_message_key(
    low: AccountId,
    high: AccountId,
    timestamp_ms: u64,
    seq: u64,
) -> [u8; MESSAGE_KEY_LEN] {
    let mut key = [0u8; MESSAGE_KEY_LEN];
    key[..16].copy_from_slice(&low.to_be_bytes());
    key[16..32].copy_from_slice(&high.to_be_bytes());
    key[32..40].copy_from_slice(&timestamp_ms.to_be_bytes());
    key[40..].copy_from_slice(&seq.to_be_bytes());
    key
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(bytes)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    ciborium::from_reader(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn io(err: impl Display) -> StorageError {
    StorageError::Io(err.to_string())
}

#[cfg(test)]
mod tests {
    use sealpost_core::model::MessageId;
    use tempfile::tempdir;

    use super::*;

    fn account(id: u128, username: &str, email: &str) -> Account {
        Account {
            id: AccountId(id),
            username: username.into(),
            email: email.into(),
            credential_hash: "$argon2id$hash".into(),
            public_key: "pub".into(),
            wrapped_private_key: "blob".into(),
            created_at_ms: 42,
        }
    }

    fn message(id: u128, from: u128, to: u128, timestamp_ms: u64) -> Message {
        Message {
            id: MessageId(id),
            sender_id: AccountId(from),
            recipient_id: AccountId(to),
            content_for_recipient: format!("r{id}"),
            content_for_sender: format!("s{id}"),
            timestamp_ms,
        }
    }

    #[test]
    fn test_message_key_ordering() {
        let (low, high) = (AccountId(1), AccountId(2));
        let a = encode_message_key(low, high, 5, 9);
        let b = encode_message_key(low, high, 6, 0);
        let c = encode_message_key(low, high, 6, 1);
        let other = encode_message_key(low, AccountId(3), 0, 0);
        assert!(a < b && b < c && c < other);
    }

    #[test]
    fn test_account_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("test.redb")).unwrap();

        let stored = account(7, "alice", "alice@example.com");
        storage.insert_account(&stored).unwrap();

        assert_eq!(storage.account_by_username("alice").unwrap(), Some(stored.clone()));
        assert_eq!(storage.account_by_id(AccountId(7)).unwrap(), Some(stored));
        assert_eq!(storage.account_by_username("Alice").unwrap(), None);
        assert_eq!(storage.account_by_id(AccountId(8)).unwrap(), None);
    }

    #[test]
    fn test_duplicate_account_leaves_no_trace() {
        let dir = tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("test.redb")).unwrap();

        storage.insert_account(&account(1, "alice", "alice@example.com")).unwrap();
        assert_eq!(
            storage.insert_account(&account(2, "bob", "alice@example.com")),
            Err(StorageError::Duplicate { field: "email" })
        );

        // The failed insert must not have claimed the username
        assert_eq!(storage.account_by_username("bob").unwrap(), None);
        storage.insert_account(&account(2, "bob", "bob@example.com")).unwrap();
        assert_eq!(storage.list_accounts().unwrap().len(), 2);
    }

    #[test]
    fn test_conversation_is_scoped_and_ordered() {
        let dir = tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("test.redb")).unwrap();

        storage.insert_message(&message(1, 1, 2, 300)).unwrap();
        storage.insert_message(&message(2, 2, 1, 100)).unwrap();
        storage.insert_message(&message(3, 1, 3, 200)).unwrap();
        storage.insert_message(&message(4, 1, 2, 300)).unwrap();

        let ids: Vec<u128> =
            storage.conversation(AccountId(1), AccountId(2)).unwrap().iter().map(|m| m.id.0).collect();
        assert_eq!(ids, [2, 1, 4]);

        let reversed = storage.conversation(AccountId(2), AccountId(1)).unwrap();
        assert_eq!(reversed.len(), 3);
        assert!(storage.conversation(AccountId(2), AccountId(3)).unwrap().is_empty());
    }
}
