//! Property and concurrency tests shared by the storage backends.
//!
//! - Conversations are ordered by timestamp, ties by insertion
//! - Both directions of a pair see the same conversation
//! - Concurrent registrations of one username (or email) produce one account

use std::thread;

use proptest::prelude::*;
use sealpost_core::model::{Account, AccountId, Message, MessageId};
use sealpost_harness::{SimEnv, TestIdentity};
use sealpost_server::{
    AuthorityConfig, HashCost, MemoryStorage, RedbStorage, Service, ServiceError,
    storage::{Storage, StorageError},
};
use tempfile::tempdir;

fn account(id: u128, username: &str, email: &str) -> Account {
    Account {
        id: AccountId(id),
        username: username.to_owned(),
        email: email.to_owned(),
        credential_hash: "$argon2id$placeholder".to_owned(),
        public_key: "pk".to_owned(),
        wrapped_private_key: "blob".to_owned(),
        created_at_ms: 0,
    }
}

/// Insert `(timestamp, sender_is_a)` pairs and return the expected order of ids.
fn insert_all(storage: &impl Storage, entries: &[(u64, bool)]) -> Vec<u128> {
    let (a, b) = (AccountId(10), AccountId(20));
    for (i, &(timestamp_ms, from_a)) in entries.iter().enumerate() {
        let (sender_id, recipient_id) = if from_a { (a, b) } else { (b, a) };
        let message = Message {
            id: MessageId(i as u128),
            sender_id,
            recipient_id,
            content_for_recipient: "r".into(),
            content_for_sender: "s".into(),
            timestamp_ms,
        };
        storage.insert_message(&message).unwrap();
    }

    let mut expected: Vec<(u64, u128)> =
        entries.iter().enumerate().map(|(i, &(ts, _))| (ts, i as u128)).collect();
    expected.sort();
    expected.into_iter().map(|(_, id)| id).collect()
}

fn conversation_ids(storage: &impl Storage, a: u128, b: u128) -> Vec<u128> {
    storage.conversation(AccountId(a), AccountId(b)).unwrap().iter().map(|m| m.id.0).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn memory_conversation_is_ordered(
        entries in prop::collection::vec((0u64..6, any::<bool>()), 0..40)
    ) {
        let storage = MemoryStorage::new();
        let expected = insert_all(&storage, &entries);

        prop_assert_eq!(conversation_ids(&storage, 10, 20), expected.clone());
        prop_assert_eq!(conversation_ids(&storage, 20, 10), expected);
        prop_assert!(conversation_ids(&storage, 10, 30).is_empty());
    }

    #[test]
    fn redb_conversation_is_ordered(
        entries in prop::collection::vec((0u64..6, any::<bool>()), 0..20)
    ) {
        let dir = tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("order.redb")).unwrap();
        let expected = insert_all(&storage, &entries);

        prop_assert_eq!(conversation_ids(&storage, 10, 20), expected.clone());
        prop_assert_eq!(conversation_ids(&storage, 20, 10), expected);
    }
}

/// Race `threads` inserts that clash on username or email; exactly one wins.
fn race_inserts<S: Storage>(storage: &S, threads: u128) {
    let results: Vec<Result<(), StorageError>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let storage = storage.clone();
                scope.spawn(move || {
                    // Even threads clash on username, odd ones on email
                    let account = if i % 2 == 0 {
                        account(i + 1, "alice", &format!("alice{i}@example.com"))
                    } else {
                        account(i + 1, &format!("alice{i}"), "alice@example.com")
                    };
                    storage.insert_account(&account)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let accounts = storage.list_accounts().unwrap();
    let usernames: Vec<&str> = accounts.iter().map(|a| a.username.as_str()).collect();
    let emails: Vec<&str> = accounts.iter().map(|a| a.email.as_str()).collect();

    // One winner per clash group: an even thread and an odd thread
    assert_eq!(usernames.iter().filter(|u| **u == "alice").count(), 1);
    assert_eq!(emails.iter().filter(|e| **e == "alice@example.com").count(), 1);
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts.len(), results.iter().filter(|r| r.is_ok()).count());
    for result in &results {
        assert!(matches!(result, Ok(()) | Err(StorageError::Duplicate { .. })));
    }
}

#[test]
fn memory_registration_race_is_atomic() {
    race_inserts(&MemoryStorage::new(), 16);
}

#[test]
fn redb_registration_race_is_atomic() {
    let dir = tempdir().unwrap();
    race_inserts(&RedbStorage::open(dir.path().join("race.redb")).unwrap(), 16);
}

#[test]
fn concurrent_service_registrations_conflict() {
    let alice = TestIdentity::generate("alice", 81);
    let config =
        AuthorityConfig { credential_cost: HashCost::TESTING, ..AuthorityConfig::default() };
    let service = Service::new(SimEnv::with_seed(5), MemoryStorage::new(), config).unwrap();

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> =
            (0..8).map(|_| scope.spawn(|| service.register(&alice.registration()))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, ServiceError::Conflict))
    );
    assert_eq!(service.storage().account_count(), 1);
}
