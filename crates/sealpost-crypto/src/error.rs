//! Error types for Sealpost cryptographic operations.
//!
//! Decryption and unwrap failures carry no detail. Whether the key was wrong,
//! the padding was bad or the bytes were corrupted, callers see the same
//! variant with the same message.

use thiserror::Error;

/// Errors produced by key handling, message encryption and the key vault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A required argument was empty or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The RSA key pair could not be generated.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// PEM framing or DER key material could not be parsed.
    #[error("key import failed: {0}")]
    KeyImport(String),

    /// Plaintext exceeds the RSA-OAEP payload bound of the key.
    #[error("message too large: {len} bytes exceeds the {max} byte limit")]
    MessageTooLarge {
        /// Length of the rejected plaintext in bytes
        len: usize,
        /// Largest plaintext the key accepts
        max: usize,
    },

    /// RSA-OAEP encryption failed after the input was accepted.
    #[error("encryption failed")]
    Encryption,

    /// Ciphertext does not decrypt under the given private key.
    #[error("decryption failed")]
    Decryption,

    /// Wrapped private key could not be opened with the given password.
    #[error("wrong password or corrupted data")]
    Unwrap,
}
