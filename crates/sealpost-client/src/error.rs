//! Error types for client-side operations.

use sealpost_core::{
    ValidationError,
    model::{AccountId, MessageId},
};
use sealpost_crypto::CryptoError;
use thiserror::Error;

/// Errors produced while preparing, composing or opening messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Input rejected before any cryptography ran
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Key handling, encryption or decryption failed
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Unlocked private key is not the half of the account's public key
    #[error("private key does not match the account's public key")]
    KeyMismatch,

    /// Message was neither sent nor received by this account
    #[error("account {account} is not a participant in message {message}")]
    NotAParticipant {
        /// Account that tried to open the message
        account: AccountId,
        /// Message in question
        message: MessageId,
    },
}
