//! Sealpost Cryptographic Primitives
//!
//! Key handling and encryption for Sealpost. Every account owns an RSA-2048
//! key pair. The public half is published in PEM form. The private half is
//! stored only as a password-wrapped blob and unwrapped into memory at login.
//!
//! # Message Path
//!
//! ```text
//! plaintext (≤ 190 bytes UTF-8)
//!        │
//!        ├──► RSA-OAEP-SHA256 (recipient public key) ──► recipient copy
//!        │
//!        └──► RSA-OAEP-SHA256 (sender public key)    ──► sender copy
//! ```
//!
//! Each copy is standalone base64 ciphertext; only the matching private key
//! opens it. Plaintext longer than the OAEP bound of the key is rejected with
//! [`CryptoError::MessageTooLarge`] rather than split or truncated.
//!
//! # Key Vault
//!
//! ```text
//! password + salt ──► Argon2id ──► 256-bit key
//!                                      │
//! private key PEM ───────────────► AES-256-GCM ──► wrapped blob (base64)
//! ```
//!
//! The blob carries its own Argon2id parameters, salt and nonce, all bound
//! into the AEAD tag. A wrong password and a damaged blob produce the same
//! [`CryptoError::Unwrap`].
//!
//! # Security
//!
//! - Decryption failures are opaque: wrong key, bad padding and corrupted
//!   input all yield [`CryptoError::Decryption`]
//! - Private key PEM and unwrapped plaintext live in `Zeroizing` buffers
//! - Key handles are capability-restricted: an [`EncryptionKey`] cannot
//!   decrypt and a [`DecryptionKey`] is never serialized

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cipher;
pub mod error;
pub mod keys;
pub mod pem;
pub mod vault;

pub use cipher::{decrypt, encrypt};
pub use error::CryptoError;
pub use keys::{
    DecryptionKey, EncryptionKey, KeyPair, MODULUS_BITS, generate_key_pair,
    generate_key_pair_with, import_private_key, import_public_key, oaep_max_plaintext_len,
};
pub use vault::{VaultParams, WrappedBlob, unwrap as unwrap_private_key, wrap as wrap_private_key};
