//! Session registry for authenticated principals.
//!
//! The registry maintains bidirectional mappings: session → principal (for
//! resolving tokens) and account → sessions (for logging an account out
//! everywhere). The unwrapped private key of a session lives here and
//! nowhere else on the server; it is zeroized when the entry is dropped.
//!
//! Expiry is measured on the environment's monotonic clock. Expired entries
//! are invisible to lookups immediately and removed on the next purge.

use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use sealpost_core::model::{AccountId, SessionPrincipal};

/// A registered session.
struct SessionEntry<I> {
    principal: SessionPrincipal,
    issued_at: I,
}

/// Registry of live sessions, generic over the environment's instant type.
pub struct SessionRegistry<I> {
    ttl: Duration,
    /// Session ID → entry
    sessions: HashMap<u128, SessionEntry<I>>,
    /// Account ID → session IDs (reverse index)
    account_sessions: HashMap<AccountId, HashSet<u128>>,
}

impl<I> SessionRegistry<I>
where
    I: Copy + Ord + std::ops::Sub<Output = Duration>,
{
    /// Create an empty registry whose sessions live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, sessions: HashMap::new(), account_sessions: HashMap::new() }
    }

    /// Register a session issued at `now`.
    ///
    /// Returns `false` if the session ID is already taken. An account may
    /// hold several sessions at once.
    pub fn register(&mut self, session_id: u128, principal: SessionPrincipal, now: I) -> bool {
        if self.sessions.contains_key(&session_id) {
            return false;
        }

        self.account_sessions.entry(principal.id).or_default().insert(session_id);
        self.sessions.insert(session_id, SessionEntry { principal, issued_at: now });
        true
    }

    /// Principal of a live session. `None` if unknown or expired.
    pub fn resolve(&self, session_id: u128, now: I) -> Option<&SessionPrincipal> {
        self.sessions
            .get(&session_id)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| &entry.principal)
    }

    /// Remove a session. Returns its principal if it was registered.
    pub fn unregister(&mut self, session_id: u128) -> Option<SessionPrincipal> {
        let entry = self.sessions.remove(&session_id)?;

        let account = entry.principal.id;
        if let Some(sessions) = self.account_sessions.get_mut(&account) {
            sessions.remove(&session_id);
            if sessions.is_empty() {
                self.account_sessions.remove(&account);
            }
        }

        Some(entry.principal)
    }

    /// Remove every session of `account`. Returns how many were removed.
    pub fn unregister_account(&mut self, account: AccountId) -> usize {
        let Some(sessions) = self.account_sessions.remove(&account) else {
            return 0;
        };
        for session_id in &sessions {
            self.sessions.remove(session_id);
        }
        sessions.len()
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&mut self, now: I) -> usize {
        let expired: Vec<u128> = self
            .sessions
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(id, _)| *id)
            .collect();

        for session_id in &expired {
            self.unregister(*session_id);
        }
        expired.len()
    }

    /// Total number of registered sessions, expired ones included.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of sessions held by `account`.
    pub fn account_session_count(&self, account: AccountId) -> usize {
        self.account_sessions.get(&account).map_or(0, HashSet::len)
    }

    fn is_expired(&self, entry: &SessionEntry<I>, now: I) -> bool {
        now - entry.issued_at >= self.ttl
    }
}
