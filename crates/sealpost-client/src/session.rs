//! Unlocked client session.
//!
//! A [`ClientSession`] holds the account's decryption key in memory. It is
//! created either from the principal returned by a login, or by unwrapping
//! the stored blob locally with the password. Either way the private key is
//! checked against the account's public key before the session is usable.
//!
//! Every outgoing message is encrypted twice:
//!
//! ```text
//!                 ┌─► recipient public key ─► content_for_recipient
//!  plaintext ─────┤
//!                 └─► own public key ───────► content_for_sender
//! ```
//!
//! Both encryptions must succeed or no request is produced.

use std::fmt;

use sealpost_core::{
    ValidationError,
    model::{AccountId, Message, SendRequest, SessionPrincipal},
};
use sealpost_crypto::{
    CryptoError, DecryptionKey, EncryptionKey, import_private_key, import_public_key,
    unwrap_private_key,
};
use tracing::{debug, warn};

use crate::error::ClientError;

/// Account identity plus its unlocked key pair.
pub struct ClientSession {
    account_id: AccountId,
    username: String,
    public_pem: String,
    public_key: EncryptionKey,
    private_key: DecryptionKey,
}

impl ClientSession {
    /// Session from the principal a successful login returned.
    pub fn from_principal(principal: &SessionPrincipal) -> Result<Self, ClientError> {
        Self::from_keys(
            principal.id,
            &principal.username,
            &principal.public_key,
            &principal.private_key,
        )
    }

    /// Session from a wrapped private key fetched from the server.
    ///
    /// # Errors
    ///
    /// - `Crypto(Unwrap)`: wrong password, or the blob is corrupted
    /// - `KeyMismatch`: blob opened, but holds a different key
    pub fn unlock(
        account_id: AccountId,
        username: &str,
        public_pem: &str,
        wrapped_private_key: &str,
        password: &str,
    ) -> Result<Self, ClientError> {
        let private_pem = unwrap_private_key(wrapped_private_key, password)?;
        Self::from_keys(account_id, username, public_pem, &private_pem)
    }

    fn from_keys(
        account_id: AccountId,
        username: &str,
        public_pem: &str,
        private_pem: &str,
    ) -> Result<Self, ClientError> {
        let public_key = import_public_key(public_pem)?;
        let private_key = import_private_key(private_pem)?;
        if !private_key.matches(&public_key) {
            warn!(account = %account_id, "private key does not match public key");
            return Err(ClientError::KeyMismatch);
        }

        Ok(Self {
            account_id,
            username: username.to_owned(),
            public_pem: public_pem.trim().to_owned(),
            public_key,
            private_key,
        })
    }

    /// Own account id.
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Own username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Own public key as PEM.
    pub fn public_pem(&self) -> &str {
        &self.public_pem
    }

    /// Encrypt `plaintext` for `recipient_id` and for ourselves.
    ///
    /// # Errors
    ///
    /// - `Validation(SelfAddressed)`: `recipient_id` is our own account
    /// - `Crypto(InvalidArgument)`: empty plaintext
    /// - `Crypto(KeyImport)`: recipient key is not a public key PEM
    /// - `Crypto(MessageTooLarge)`: plaintext exceeds either key's bound
    pub fn compose(
        &self,
        recipient_id: AccountId,
        recipient_public_pem: &str,
        plaintext: &str,
    ) -> Result<SendRequest, ClientError> {
        if recipient_id == self.account_id {
            return Err(ValidationError::SelfAddressed.into());
        }
        if plaintext.is_empty() {
            return Err(CryptoError::InvalidArgument("plaintext is required").into());
        }

        let recipient_key = import_public_key(recipient_public_pem)?;
        let content_for_recipient = recipient_key.encrypt_text(plaintext)?;
        let content_for_sender = self.public_key.encrypt_text(plaintext)?;

        debug!(sender = %self.account_id, recipient = %recipient_id, "message composed");
        Ok(SendRequest {
            sender_id: self.account_id,
            recipient_id,
            content_for_recipient,
            content_for_sender,
        })
    }

    /// Decrypt the copy of `message` meant for this account.
    ///
    /// # Errors
    ///
    /// - `NotAParticipant`: we neither sent nor received it
    /// - `Crypto(Decryption)`: our copy does not open with our key
    pub fn open(&self, message: &Message) -> Result<String, ClientError> {
        let ciphertext = message.ciphertext_for(self.account_id).ok_or(
            ClientError::NotAParticipant { account: self.account_id, message: message.id },
        )?;
        Ok(self.private_key.decrypt_text(ciphertext)?)
    }
}

impl fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSession")
            .field("account_id", &self.account_id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
