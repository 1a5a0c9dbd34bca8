//! Credential and session authority.
//!
//! Registration hashes the password and stores the account with the public
//! key and wrapped private key the client prepared. A login attempt walks a
//! fixed sequence of stages and stops at the first failure:
//!
//! ```text
//! LookupAccount ──► VerifyPassword ──► UnwrapPrivateKey ──► IssueSession
//!      │                  │                   │
//!      ▼                  ▼                   ▼
//!  UnknownUser     InvalidPassword    InvalidPassword / KeyMismatch
//! ```
//!
//! Every failure is reported to callers as the same "authentication failed";
//! the [`AuthFailure`] reason exists for server-side logging only. Unknown
//! usernames still pay for one password verification against a decoy hash.
//!
//! A successful login registers the principal, unwrapped private key
//! included, in the in-memory [`SessionRegistry`] and returns a token that
//! names the session. Nothing is retried automatically and there is no
//! lockout.

use std::{
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use sealpost_core::{
    env::Environment,
    model::{Account, AccountId, RegistrationRequest, SessionPrincipal},
    validate,
};
use sealpost_crypto::{import_private_key, import_public_key, unwrap_private_key};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    credential::{CredentialError, CredentialHasher, HashCost},
    registry::SessionRegistry,
    storage::{Storage, StorageError},
    token::{SessionToken, TokenSigner},
};

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Authority tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorityConfig {
    /// How long a session stays valid after login
    pub session_ttl: Duration,
    /// Argon2id cost for new credential hashes
    pub credential_cost: HashCost,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self { session_ttl: DEFAULT_SESSION_TTL, credential_cost: HashCost::default() }
    }
}

/// Stages of a login attempt, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    /// Find the account by username
    LookupAccount,
    /// Compare the password against the credential hash
    VerifyPassword,
    /// Open the wrapped private key with the password
    UnwrapPrivateKey,
    /// Register the session and sign its token
    IssueSession,
}

/// Why a login attempt was rejected. Never shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No account has this username
    UnknownUser,
    /// Password does not match the hash, or does not open the wrapped key
    InvalidPassword,
    /// Unwrapped private key does not belong to the stored public key
    KeyMismatch,
}

/// Errors from the authority.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Login rejected; the reason is for logs only
    #[error("authentication failed")]
    Failed {
        /// Reason for the rejection
        reason: AuthFailure,
        /// Stage the attempt stopped at
        stage: LoginStage,
    },

    /// Token is forged, unknown, logged out or expired
    #[error("session is invalid or expired")]
    InvalidSession,

    /// Account store failure
    #[error("storage error: {0}")]
    Store(#[from] StorageError),

    /// Credential hashing failure
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// A thread panicked while holding the session registry
    #[error("session registry lock poisoned")]
    Poisoned,
}

impl AuthError {
    fn failed(reason: AuthFailure, stage: LoginStage) -> Self {
        Self::Failed { reason, stage }
    }
}

/// Successful login: the principal and the token naming its session.
#[derive(Debug)]
pub struct LoginGrant {
    /// Identity and unwrapped key material, handed out once
    pub principal: SessionPrincipal,
    /// Bearer token for later calls
    pub token: SessionToken,
}

/// Verifies credentials and owns the live sessions.
pub struct Authority<E: Environment, S: Storage> {
    env: E,
    storage: S,
    hasher: CredentialHasher,
    signer: TokenSigner,
    sessions: Mutex<SessionRegistry<E::Instant>>,
}

impl<E: Environment, S: Storage> Authority<E, S> {
    /// Create an authority with a fresh token key and no sessions.
    pub fn new(env: E, storage: S, config: AuthorityConfig) -> Result<Self, AuthError> {
        let hasher = CredentialHasher::new(&env, config.credential_cost)?;
        let signer = TokenSigner::new(&env);
        let sessions = Mutex::new(SessionRegistry::new(config.session_ttl));
        Ok(Self { env, storage, hasher, signer, sessions })
    }

    /// Store a new account from an already validated request.
    ///
    /// # Errors
    ///
    /// - `Store(Duplicate)`: username or email is taken
    pub fn register(&self, request: &RegistrationRequest) -> Result<Account, AuthError> {
        let account = Account {
            id: AccountId(self.env.random_u128()),
            username: request.username.clone(),
            email: request.email.clone(),
            credential_hash: self.hasher.hash(&self.env, &request.password)?,
            public_key: request.public_key.clone(),
            wrapped_private_key: request.wrapped_private_key.clone(),
            created_at_ms: self.env.wall_clock_millis(),
        };

        self.storage.insert_account(&account)?;
        info!(account = %account.id, username = %account.username, "account registered");
        Ok(account)
    }

    /// Run a login attempt.
    ///
    /// `username` is normalized as at registration. A name that fails
    /// validation is treated as unknown.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<LoginGrant, AuthError> {
        let account = match validate::username(username) {
            Ok(name) => self.storage.account_by_username(&name)?,
            Err(_) => None,
        };
        let Some(account) = account else {
            self.hasher.verify_decoy(password);
            return Err(self.reject(username, AuthFailure::UnknownUser, LoginStage::LookupAccount));
        };

        if !self.hasher.verify(password, &account.credential_hash) {
            return Err(self.reject(
                username,
                AuthFailure::InvalidPassword,
                LoginStage::VerifyPassword,
            ));
        }

        let Ok(private_pem) = unwrap_private_key(&account.wrapped_private_key, password) else {
            return Err(self.reject(
                username,
                AuthFailure::InvalidPassword,
                LoginStage::UnwrapPrivateKey,
            ));
        };

        let private = import_private_key(&private_pem);
        let public = import_public_key(&account.public_key);
        let belongs = match (private, public) {
            (Ok(private), Ok(public)) => private.matches(&public),
            _ => false,
        };
        if !belongs {
            return Err(self.reject(
                username,
                AuthFailure::KeyMismatch,
                LoginStage::UnwrapPrivateKey,
            ));
        }

        let principal = SessionPrincipal {
            id: account.id,
            username: account.username,
            public_key: account.public_key,
            private_key: private_pem,
        };

        let now = self.env.now();
        let mut sessions = self.sessions()?;
        let session_id = loop {
            let candidate = self.env.random_u128();
            if sessions.register(candidate, principal.clone(), now) {
                break candidate;
            }
        };
        drop(sessions);

        info!(account = %principal.id, stage = ?LoginStage::IssueSession, "login succeeded");
        Ok(LoginGrant { principal, token: self.signer.issue(session_id) })
    }

    /// Principal of the session named by `token`.
    ///
    /// # Errors
    ///
    /// - `InvalidSession`: bad signature, unknown session or expired
    pub fn resolve(&self, token: &SessionToken) -> Result<SessionPrincipal, AuthError> {
        let session_id = self.signer.verify(token).ok_or(AuthError::InvalidSession)?;
        let now = self.env.now();
        self.sessions()?.resolve(session_id, now).cloned().ok_or(AuthError::InvalidSession)
    }

    /// End the session named by `token`.
    ///
    /// Returns whether a live session was removed. Forged tokens remove
    /// nothing.
    pub fn logout(&self, token: &SessionToken) -> Result<bool, AuthError> {
        let Some(session_id) = self.signer.verify(token) else {
            return Ok(false);
        };
        let removed = self.sessions()?.unregister(session_id);
        if let Some(principal) = &removed {
            info!(account = %principal.id, "logged out");
        }
        Ok(removed.is_some())
    }

    /// End every session of `account`.
    pub fn logout_account(&self, account: AccountId) -> Result<usize, AuthError> {
        Ok(self.sessions()?.unregister_account(account))
    }

    /// Drop expired sessions, zeroizing their keys.
    pub fn purge_expired(&self) -> Result<usize, AuthError> {
        let now = self.env.now();
        let purged = self.sessions()?.purge_expired(now);
        if purged > 0 {
            debug!(purged, "expired sessions purged");
        }
        Ok(purged)
    }

    /// Number of registered sessions, expired but unpurged ones included.
    pub fn session_count(&self) -> Result<usize, AuthError> {
        Ok(self.sessions()?.session_count())
    }

    fn reject(&self, username: &str, reason: AuthFailure, stage: LoginStage) -> AuthError {
        debug!(username, ?reason, ?stage, "login rejected");
        AuthError::failed(reason, stage)
    }

    fn sessions(&self) -> Result<MutexGuard<'_, SessionRegistry<E::Instant>>, AuthError> {
        self.sessions.lock().map_err(|_| AuthError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use sealpost_harness::{SimEnv, TestIdentity};

    use super::*;
    use crate::storage::MemoryStorage;

    fn config() -> AuthorityConfig {
        AuthorityConfig { session_ttl: Duration::from_secs(60), credential_cost: HashCost::TESTING }
    }

    fn authority() -> (SimEnv, Authority<SimEnv, MemoryStorage>) {
        let env = SimEnv::with_seed(3);
        let authority = Authority::new(env.clone(), MemoryStorage::new(), config()).unwrap();
        (env, authority)
    }

    fn alice() -> &'static TestIdentity {
        static ALICE: std::sync::OnceLock<TestIdentity> = std::sync::OnceLock::new();
        ALICE.get_or_init(|| TestIdentity::generate("alice", 21))
    }

    fn rejection(result: Result<LoginGrant, AuthError>) -> (AuthFailure, LoginStage) {
        match result {
            Err(AuthError::Failed { reason, stage }) => (reason, stage),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn login_name_is_normalized_like_registration() {
        let (_, authority) = authority();
        let mut request = alice().registration();
        request.username = "  alice ".to_owned();
        let request = validate::registration(&request).unwrap();
        let account = authority.register(&request).unwrap();

        let grant = authority.authenticate("  alice ", &alice().password).unwrap();
        assert_eq!(grant.principal.id, account.id);

        let long = "a".repeat(200);
        for name in ["", "al ice", long.as_str()] {
            assert_eq!(
                rejection(authority.authenticate(name, &alice().password)),
                (AuthFailure::UnknownUser, LoginStage::LookupAccount)
            );
        }
    }

    #[test]
    fn login_unwraps_key_and_issues_session() {
        let (_, authority) = authority();
        let account = authority.register(&alice().registration()).unwrap();
        assert_ne!(account.credential_hash, alice().password);

        let grant = authority.authenticate("alice", &alice().password).unwrap();
        assert_eq!(grant.principal.id, account.id);
        assert_eq!(grant.principal.private_key.as_str(), alice().private_pem.as_str());

        let resolved = authority.resolve(&grant.token).unwrap();
        assert_eq!(resolved.id, account.id);
    }

    #[test]
    fn unknown_user_and_wrong_password_look_the_same() {
        let (_, authority) = authority();
        authority.register(&alice().registration()).unwrap();

        let unknown = authority.authenticate("mallory", "whatever");
        let wrong = authority.authenticate("alice", "not-the-password");

        let unknown_text = unknown.as_ref().unwrap_err().to_string();
        let wrong_text = wrong.as_ref().unwrap_err().to_string();
        assert_eq!(unknown_text, "authentication failed");
        assert_eq!(unknown_text, wrong_text);

        assert_eq!(rejection(unknown), (AuthFailure::UnknownUser, LoginStage::LookupAccount));
        assert_eq!(rejection(wrong), (AuthFailure::InvalidPassword, LoginStage::VerifyPassword));
    }

    #[test]
    fn wrapped_key_under_other_password_fails_unwrap_stage() {
        let (_, authority) = authority();
        let bob = TestIdentity::generate("bob", 22);
        let mut request = alice().registration();
        // Hash matches the password, but the blob was sealed under bob's
        request.wrapped_private_key = bob.wrapped_private_key.clone();
        authority.register(&request).unwrap();

        let result = authority.authenticate("alice", &alice().password);
        assert_eq!(rejection(result), (AuthFailure::InvalidPassword, LoginStage::UnwrapPrivateKey));
    }

    #[test]
    fn foreign_key_pair_fails_key_check() {
        let (_, authority) = authority();
        let bob = TestIdentity::generate("bob", 22);
        let mut request = bob.registration();
        // Opens with bob's password but does not match the stored public key
        request.public_key = alice().public_pem.clone();
        authority.register(&request).unwrap();

        let result = authority.authenticate("bob", &bob.password);
        assert_eq!(rejection(result), (AuthFailure::KeyMismatch, LoginStage::UnwrapPrivateKey));
        assert_eq!(authority.session_count().unwrap(), 0);
    }

    #[test]
    fn session_expires_after_ttl() {
        let (env, authority) = authority();
        authority.register(&alice().registration()).unwrap();
        let grant = authority.authenticate("alice", &alice().password).unwrap();

        env.advance(Duration::from_secs(59));
        assert!(authority.resolve(&grant.token).is_ok());

        env.advance(Duration::from_secs(1));
        assert!(matches!(authority.resolve(&grant.token), Err(AuthError::InvalidSession)));
        assert_eq!(authority.purge_expired().unwrap(), 1);
        assert_eq!(authority.session_count().unwrap(), 0);
    }

    #[test]
    fn logout_ends_only_that_session() {
        let (_, authority) = authority();
        let account = authority.register(&alice().registration()).unwrap();
        let first = authority.authenticate("alice", &alice().password).unwrap();
        let second = authority.authenticate("alice", &alice().password).unwrap();

        assert!(authority.logout(&first.token).unwrap());
        assert!(!authority.logout(&first.token).unwrap());
        assert!(authority.resolve(&first.token).is_err());
        assert!(authority.resolve(&second.token).is_ok());

        assert_eq!(authority.logout_account(account.id).unwrap(), 1);
        assert!(authority.resolve(&second.token).is_err());
    }

    #[test]
    fn tokens_do_not_survive_a_new_authority() {
        let env = SimEnv::with_seed(4);
        let storage = MemoryStorage::new();
        let first = Authority::new(env.clone(), storage.clone(), config()).unwrap();
        first.register(&alice().registration()).unwrap();
        let grant = first.authenticate("alice", &alice().password).unwrap();

        let restarted = Authority::new(env, storage, config()).unwrap();
        assert!(matches!(restarted.resolve(&grant.token), Err(AuthError::InvalidSession)));
    }
}
