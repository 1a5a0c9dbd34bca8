//! Password-wrapped private keys.
//!
//! A private key PEM is sealed under a key derived from the account password
//! with Argon2id, using AES-256-GCM. The result is a self-contained base64
//! blob; everything needed to unwrap it except the password is inside.
//!
//! ```text
//! [version: 1][m_cost: u32 BE][t_cost: u32 BE][p_cost: u32 BE]
//! [salt: 16][nonce: 12][ciphertext + tag: n + 16]
//! ```
//!
//! The header (version through salt) is authenticated as associated data, so
//! a blob with altered parameters fails exactly like a wrong password.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::{CryptoRng, RngCore, rngs::OsRng};
use zeroize::Zeroizing;

use crate::{
    error::CryptoError,
    pem::{self, PemLabel},
};

/// Current blob format version.
pub const BLOB_VERSION: u8 = 1;

/// Argon2 salt length in bytes.
pub const SALT_LEN: usize = 16;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// AES-GCM tag length in bytes.
pub const TAG_LEN: usize = 16;

const KEY_LEN: usize = 32;
const PARAMS_LEN: usize = 12;
const HEADER_LEN: usize = 1 + PARAMS_LEN + SALT_LEN;

/// Lanes accepted in a blob. Argon2 needs at least 8 KiB of memory per lane.
const MAX_P_COST: u32 = 4;
const MIN_M_COST_PER_LANE_KIB: u32 = 8;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultParams {
    /// Memory cost in KiB
    pub m_cost_kib: u32,
    /// Number of passes
    pub t_cost: u32,
    /// Degree of parallelism
    pub p_cost: u32,
}

impl VaultParams {
    /// Interactive login cost: 64 MiB, 3 passes, 1 lane.
    pub const INTERACTIVE: Self = Self { m_cost_kib: 64 * 1024, t_cost: 3, p_cost: 1 };

    /// Minimal cost for tests. Never use for real accounts.
    pub const TESTING: Self = Self { m_cost_kib: 256, t_cost: 1, p_cost: 1 };

    /// Whether a blob sealed with these parameters is accepted.
    ///
    /// Memory and passes must lie between [`Self::TESTING`] and
    /// [`Self::INTERACTIVE`], with 1..=4 lanes and at least 8 KiB per lane.
    /// Checked on parse, so an out-of-window blob costs no KDF work.
    pub fn is_admissible(self) -> bool {
        let (low, high) = (Self::TESTING, Self::INTERACTIVE);
        (1..=MAX_P_COST).contains(&self.p_cost)
            && (low.m_cost_kib..=high.m_cost_kib).contains(&self.m_cost_kib)
            && self.m_cost_kib >= MIN_M_COST_PER_LANE_KIB * self.p_cost
            && (low.t_cost..=high.t_cost).contains(&self.t_cost)
    }

    fn argon2(self) -> Option<Argon2<'static>> {
        if !self.is_admissible() {
            return None;
        }
        let params = Params::new(self.m_cost_kib, self.t_cost, self.p_cost, Some(KEY_LEN)).ok()?;
        Some(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for VaultParams {
    fn default() -> Self {
        Self::INTERACTIVE
    }
}

/// Parsed form of a wrapped private key.
///
/// Parsing checks structure only; it does not need or verify the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedBlob {
    params: VaultParams,
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

impl WrappedBlob {
    /// Parse the base64 text form.
    ///
    /// # Errors
    ///
    /// - `Unwrap`: not base64, wrong version, truncated, or parameters not
    ///   [admissible](VaultParams::is_admissible)
    pub fn parse(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD.decode(encoded.trim()).map_err(|_| CryptoError::Unwrap)?;

        if bytes.len() < HEADER_LEN + NONCE_LEN + TAG_LEN || bytes[0] != BLOB_VERSION {
            return Err(CryptoError::Unwrap);
        }

        let params = VaultParams {
            m_cost_kib: read_u32(&bytes[1..5]),
            t_cost: read_u32(&bytes[5..9]),
            p_cost: read_u32(&bytes[9..13]),
        };
        if !params.is_admissible() {
            return Err(CryptoError::Unwrap);
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[1 + PARAMS_LEN..HEADER_LEN]);

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[HEADER_LEN..HEADER_LEN + NONCE_LEN]);

        let ciphertext = bytes[HEADER_LEN + NONCE_LEN..].to_vec();

        Ok(Self { params, salt, nonce, ciphertext })
    }

    /// Base64 text form.
    pub fn encode(&self) -> String {
        let mut bytes = Vec::with_capacity(HEADER_LEN + NONCE_LEN + self.ciphertext.len());
        bytes.extend_from_slice(&self.header());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        STANDARD.encode(bytes)
    }

    /// Argon2id parameters the blob was sealed with.
    pub fn params(&self) -> VaultParams {
        self.params
    }

    fn header(&self) -> [u8; HEADER_LEN] {
        let mut header = [0u8; HEADER_LEN];
        header[0] = BLOB_VERSION;
        header[1..5].copy_from_slice(&self.params.m_cost_kib.to_be_bytes());
        header[5..9].copy_from_slice(&self.params.t_cost.to_be_bytes());
        header[9..13].copy_from_slice(&self.params.p_cost.to_be_bytes());
        header[13..HEADER_LEN].copy_from_slice(&self.salt);
        header
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}

fn derive_key(
    argon2: &Argon2<'_>,
    password: &str,
    salt: &[u8; SALT_LEN],
) -> Option<Zeroizing<[u8; KEY_LEN]>> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2.hash_password_into(password.as_bytes(), salt, key.as_mut_slice()).ok()?;
    Some(key)
}

/// Wrap `private_pem` under `password` with interactive parameters.
pub fn wrap(private_pem: &str, password: &str) -> Result<String, CryptoError> {
    wrap_with(&mut OsRng, private_pem, password, VaultParams::default())
}

/// Wrap with explicit parameters and RNG (salt and nonce source).
///
/// # Errors
///
/// - `InvalidArgument`: empty password, or parameters Argon2 rejects
/// - `KeyImport`: `private_pem` is not a `PRIVATE KEY` PEM
pub fn wrap_with<R: RngCore + CryptoRng>(
    rng: &mut R,
    private_pem: &str,
    password: &str,
    params: VaultParams,
) -> Result<String, CryptoError> {
    if password.is_empty() {
        return Err(CryptoError::InvalidArgument("password is required"));
    }
    pem::decode(PemLabel::PrivateKey, private_pem)?;

    let argon2 = params.argon2().ok_or(CryptoError::InvalidArgument("vault parameters"))?;

    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);

    let key =
        derive_key(&argon2, password, &salt).ok_or(CryptoError::InvalidArgument("vault parameters"))?;

    let mut blob = WrappedBlob { params, salt, nonce, ciphertext: Vec::new() };
    let header = blob.header();

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));
    blob.ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), Payload { msg: private_pem.as_bytes(), aad: &header })
        .map_err(|_| CryptoError::Encryption)?;

    Ok(blob.encode())
}

/// Recover the private key PEM from `blob` using `password`.
///
/// # Errors
///
/// - `Unwrap`: wrong password, malformed or tampered blob, or the plaintext
///   is not a private key PEM
pub fn unwrap(blob: &str, password: &str) -> Result<Zeroizing<String>, CryptoError> {
    let blob = WrappedBlob::parse(blob)?;
    let argon2 = blob.params.argon2().ok_or(CryptoError::Unwrap)?;
    let key = derive_key(&argon2, password, &blob.salt).ok_or(CryptoError::Unwrap)?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));
    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(&blob.nonce),
            Payload { msg: &blob.ciphertext, aad: &blob.header() },
        )
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::Unwrap)?;

    let text = std::str::from_utf8(&plaintext).map_err(|_| CryptoError::Unwrap)?;
    pem::decode(PemLabel::PrivateKey, text).map_err(|_| CryptoError::Unwrap)?;

    Ok(Zeroizing::new(text.to_owned()))
}
