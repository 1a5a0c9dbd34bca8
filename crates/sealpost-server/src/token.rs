//! Session tokens.
//!
//! A token is `<session id: 32 hex>.<HMAC-SHA256(id): 64 hex>`. It names a
//! session in the in-memory registry and carries nothing else; key material
//! never leaves the server process through a token. The signing key is drawn
//! per process, so a restart invalidates every outstanding token.

use std::fmt;

use hmac::{
    Hmac, Mac,
    digest::{Key, KeyInit},
};
use sealpost_core::env::Environment;
use sha2::Sha256;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// SHA-256 block size, the natural HMAC key length.
const KEY_LEN: usize = 64;
const ID_HEX_LEN: usize = 32;
const TAG_HEX_LEN: usize = 64;

/// Opaque bearer token for an authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap token text received from a caller. Not verified until resolved.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Token text to hand to the caller.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Issues and verifies session tokens under a per-process key.
pub struct TokenSigner {
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl TokenSigner {
    /// Signer with a fresh key from `env`.
    pub fn new<E: Environment>(env: &E) -> Self {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        env.random_bytes(key.as_mut_slice());
        Self { key }
    }

    /// Token for `session_id`.
    pub fn issue(&self, session_id: u128) -> SessionToken {
        let id = session_id.to_be_bytes();
        let tag = self.mac(&id).finalize().into_bytes();
        SessionToken(format!("{}.{}", hex::encode(id), hex::encode(tag)))
    }

    /// Session id named by `token`, if the tag verifies.
    ///
    /// Tag comparison is constant-time.
    pub fn verify(&self, token: &SessionToken) -> Option<u128> {
        let (id_hex, tag_hex) = token.as_str().split_once('.')?;
        if id_hex.len() != ID_HEX_LEN || tag_hex.len() != TAG_HEX_LEN {
            return None;
        }

        let mut id = [0u8; 16];
        hex::decode_to_slice(id_hex, &mut id).ok()?;
        let tag = hex::decode(tag_hex).ok()?;

        self.mac(&id).verify_slice(&tag).ok()?;
        Some(u128::from_be_bytes(id))
    }

    fn mac(&self, id: &[u8]) -> HmacSha256 {
        let key = Key::<HmacSha256>::from_slice(self.key.as_slice());
        let mut mac = <HmacSha256 as KeyInit>::new(key);
        mac.update(id);
        mac
    }
}
