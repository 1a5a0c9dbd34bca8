//! Service boundary.
//!
//! [`Service`] is the single entry point the surrounding API layer calls.
//! It is constructed explicitly with its environment and store; there are no
//! global handles. Each operation validates its input, checks the session
//! where one is required, and translates lower-level failures into
//! [`ServiceError`]. Store failures are logged here and surfaced without
//! detail.

use sealpost_core::{
    ValidationError,
    env::Environment,
    model::{
        Account, AccountId, AccountSummary, Message, MessageId, PublicKeyRecord, RegistrationRequest,
        Role, SendRequest, SessionPrincipal, WrappedKeyRecord,
    },
    validate,
};
use sealpost_crypto::import_private_key;
use tracing::{debug, error, info, warn};

use crate::{
    authority::{AuthError, Authority, AuthorityConfig, LoginGrant},
    error::ServiceError,
    storage::{Storage, StorageError},
    token::SessionToken,
};

/// A message decrypted with the session's private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedMessage {
    /// Stored record
    pub message: Message,
    /// Role of the reading account
    pub role: Role,
    /// Recovered plaintext
    pub plaintext: String,
}

/// Messaging service over a store.
pub struct Service<E: Environment, S: Storage> {
    env: E,
    storage: S,
    authority: Authority<E, S>,
}

impl<E: Environment, S: Storage> Service<E, S> {
    /// Build a service over `storage`.
    pub fn new(env: E, storage: S, config: AuthorityConfig) -> Result<Self, ServiceError> {
        let authority =
            Authority::new(env.clone(), storage.clone(), config).map_err(auth_error)?;
        Ok(Self { env, storage, authority })
    }

    /// Underlying store.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Create an account.
    ///
    /// The request carries a key pair the client generated and a private key
    /// it already wrapped under `password`.
    ///
    /// # Errors
    ///
    /// - `Validation`: malformed field, including an unparseable public key
    ///   or wrapped key blob
    /// - `Conflict`: username or email already exists
    pub fn register(&self, request: &RegistrationRequest) -> Result<AccountSummary, ServiceError> {
        let request = validate::registration(request).map_err(rejected)?;

        match self.authority.register(&request) {
            Ok(account) => Ok(account.summary()),
            Err(AuthError::Store(StorageError::Duplicate { field })) => {
                debug!(field, "registration conflict");
                Err(ServiceError::Conflict)
            },
            Err(err) => Err(auth_error(err)),
        }
    }

    /// Log in.
    ///
    /// The returned principal carries the unwrapped private key for
    /// client-side decryption; the token is needed for every other call.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<LoginGrant, ServiceError> {
        self.authority.authenticate(username, password).map_err(auth_error)
    }

    /// Store a message the caller encrypted for both parties.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`: token does not name a live session
    /// - `Forbidden`: the session is not the sender
    /// - `Validation`: sender equals recipient, or a ciphertext is missing
    ///   or malformed
    /// - `NotFound`: recipient does not exist
    pub fn send_message(
        &self,
        token: &SessionToken,
        request: &SendRequest,
    ) -> Result<Message, ServiceError> {
        let principal = self.resolve(token)?;
        if principal.id != request.sender_id {
            warn!(session = %principal.id, sender = %request.sender_id, "sender mismatch");
            return Err(ServiceError::Forbidden);
        }

        validate::send(request).map_err(rejected)?;
        self.require_account(request.recipient_id, "recipient")?;

        let message = Message {
            id: MessageId(self.env.random_u128()),
            sender_id: request.sender_id,
            recipient_id: request.recipient_id,
            content_for_recipient: request.content_for_recipient.trim().to_owned(),
            content_for_sender: request.content_for_sender.trim().to_owned(),
            timestamp_ms: self.env.wall_clock_millis(),
        };

        self.storage.insert_message(&message).map_err(store_error)?;
        info!(message = %message.id, sender = %message.sender_id, "message stored");
        Ok(message)
    }

    /// Messages between the caller and `peer`, oldest first.
    ///
    /// Each record carries both ciphertexts; the caller reads the one
    /// matching its role.
    pub fn conversation(
        &self,
        token: &SessionToken,
        peer: AccountId,
    ) -> Result<Vec<Message>, ServiceError> {
        let principal = self.resolve(token)?;
        self.conversation_of(&principal, peer)
    }

    /// Conversation with `peer`, decrypted server-side with the session key.
    ///
    /// # Security
    ///
    /// RSA decryption in `rsa` 0.9 is not constant-time (RUSTSEC-2023-0071,
    /// the Marvin attack). Every failure maps to the same `Decryption`, but
    /// response timing can still leak. Expose this only to the session owner
    /// on trusted transports; the CLI reads client-side through
    /// `ClientSession::open` instead.
    ///
    /// # Errors
    ///
    /// - `Crypto(Decryption)`: a stored ciphertext does not open with the
    ///   session key
    pub fn read_conversation(
        &self,
        token: &SessionToken,
        peer: AccountId,
    ) -> Result<Vec<OpenedMessage>, ServiceError> {
        let principal = self.resolve(token)?;
        let messages = self.conversation_of(&principal, peer)?;
        let key = import_private_key(&principal.private_key)?;

        messages
            .into_iter()
            .map(|message| {
                let (role, ciphertext) = match message.role_of(principal.id) {
                    Some(Role::Sender) => (Role::Sender, &message.content_for_sender),
                    Some(Role::Recipient) => (Role::Recipient, &message.content_for_recipient),
                    None => return Err(ServiceError::Internal),
                };
                let plaintext = key.decrypt_text(ciphertext)?;
                Ok(OpenedMessage { message, role, plaintext })
            })
            .collect()
    }

    /// Public key of `username`, normalized as at registration. Never exposes
    /// the hash or the wrapped key.
    pub fn public_key(&self, username: &str) -> Result<PublicKeyRecord, ServiceError> {
        let account = self.account_named(username)?;

        Ok(PublicKeyRecord {
            id: account.id,
            username: account.username,
            public_key: account.public_key,
        })
    }

    /// Wrapped private key of `username`, for client-side unwrap.
    ///
    /// Unauthenticated: the blob is only useful together with the password.
    pub fn wrapped_private_key(&self, username: &str) -> Result<WrappedKeyRecord, ServiceError> {
        let account = self.account_named(username)?;

        Ok(WrappedKeyRecord {
            username: account.username,
            wrapped_private_key: account.wrapped_private_key,
        })
    }

    /// Every account except the caller, ordered by username.
    pub fn directory(&self, token: &SessionToken) -> Result<Vec<AccountSummary>, ServiceError> {
        let principal = self.resolve(token)?;
        let accounts = self.storage.list_accounts().map_err(store_error)?;

        Ok(accounts.iter().filter(|a| a.id != principal.id).map(|a| a.summary()).collect())
    }

    /// End the session named by `token`. Unknown tokens are ignored.
    pub fn logout(&self, token: &SessionToken) -> Result<(), ServiceError> {
        self.authority.logout(token).map(|_| ()).map_err(auth_error)
    }

    /// Drop expired sessions. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, ServiceError> {
        self.authority.purge_expired().map_err(auth_error)
    }

    fn resolve(&self, token: &SessionToken) -> Result<SessionPrincipal, ServiceError> {
        self.authority.resolve(token).map_err(auth_error)
    }

    fn conversation_of(
        &self,
        principal: &SessionPrincipal,
        peer: AccountId,
    ) -> Result<Vec<Message>, ServiceError> {
        if peer == principal.id {
            return Err(rejected(ValidationError::SelfAddressed));
        }
        self.require_account(peer, "peer")?;
        self.storage.conversation(principal.id, peer).map_err(store_error)
    }

    fn account_named(&self, username: &str) -> Result<Account, ServiceError> {
        let username = validate::username(username).map_err(rejected)?;
        self.storage
            .account_by_username(&username)
            .map_err(store_error)?
            .ok_or(ServiceError::NotFound("account"))
    }

    fn require_account(&self, id: AccountId, what: &'static str) -> Result<(), ServiceError> {
        match self.storage.account_by_id(id).map_err(store_error)? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound(what)),
        }
    }
}

fn rejected(err: ValidationError) -> ServiceError {
    warn!(%err, "request rejected");
    ServiceError::Validation(err)
}

fn store_error(err: StorageError) -> ServiceError {
    error!(%err, "storage operation failed");
    ServiceError::Store
}

fn auth_error(err: AuthError) -> ServiceError {
    match err {
        AuthError::Failed { reason, .. } => ServiceError::Authentication(reason),
        AuthError::InvalidSession => ServiceError::Unauthorized,
        AuthError::Store(err) => store_error(err),
        AuthError::Credential(err) => {
            error!(%err, "credential hashing failed");
            ServiceError::Internal
        },
        AuthError::Poisoned => {
            error!("session registry poisoned");
            ServiceError::Internal
        },
    }
}
