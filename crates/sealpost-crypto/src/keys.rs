//! RSA key pairs and capability-restricted key handles.
//!
//! Public keys travel as SPKI PEM (`PUBLIC KEY`), private keys as PKCS#8 PEM
//! (`PRIVATE KEY`). Importing yields a handle that can do exactly one thing:
//! [`EncryptionKey`] encrypts, [`DecryptionKey`] decrypts.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::{CryptoRng, RngCore, rngs::OsRng};
use rsa::{
    Oaep, RsaPrivateKey, RsaPublicKey,
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey},
    traits::PublicKeyParts,
};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{
    error::CryptoError,
    pem::{self, PemLabel},
};

/// Modulus size of freshly generated key pairs.
pub const MODULUS_BITS: usize = 2048;

/// Smallest modulus accepted on import.
pub const MIN_MODULUS_BITS: usize = 2048;

/// Largest modulus accepted on import.
pub const MAX_MODULUS_BITS: usize = 4096;

/// SHA-256 output length, the OAEP hash.
const OAEP_HASH_LEN: usize = 32;

/// Largest OAEP plaintext for a modulus of `modulus_len` bytes.
///
/// `k - 2*hLen - 2`, which is 190 bytes for RSA-2048 with SHA-256.
pub const fn oaep_max_plaintext_len(modulus_len: usize) -> usize {
    modulus_len.saturating_sub(2 * OAEP_HASH_LEN + 2)
}

/// Freshly generated key pair in transportable PEM form.
pub struct KeyPair {
    public_pem: String,
    private_pem: Zeroizing<String>,
}

impl KeyPair {
    /// SPKI PEM of the public key.
    pub fn public_pem(&self) -> &str {
        &self.public_pem
    }

    /// PKCS#8 PEM of the private key.
    pub fn private_pem(&self) -> &str {
        &self.private_pem
    }

    /// Split into `(public_pem, private_pem)`.
    pub fn into_parts(self) -> (String, Zeroizing<String>) {
        (self.public_pem, self.private_pem)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair").field("public_pem", &self.public_pem).finish_non_exhaustive()
    }
}

/// Generate an RSA-2048 key pair (e = 65537) using the OS RNG.
pub fn generate_key_pair() -> Result<KeyPair, CryptoError> {
    generate_key_pair_with(&mut OsRng, MODULUS_BITS)
}

/// Generate a key pair of `bits` from a caller-provided RNG.
///
/// # Errors
///
/// - `KeyGeneration`: `bits` is outside the accepted range or the RSA
///   provider failed
pub fn generate_key_pair_with<R: RngCore + CryptoRng>(
    rng: &mut R,
    bits: usize,
) -> Result<KeyPair, CryptoError> {
    if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&bits) {
        return Err(CryptoError::KeyGeneration(format!("unsupported modulus size {bits}")));
    }

    let private = RsaPrivateKey::new(rng, bits)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    let public = RsaPublicKey::from(&private);

    let public_der =
        public.to_public_key_der().map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    let private_der =
        private.to_pkcs8_der().map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

    Ok(KeyPair {
        public_pem: pem::encode(PemLabel::PublicKey, public_der.as_bytes()).to_string(),
        private_pem: pem::encode(PemLabel::PrivateKey, private_der.as_bytes()),
    })
}

/// Import an SPKI public key PEM as an encrypt-only handle.
pub fn import_public_key(pem_text: &str) -> Result<EncryptionKey, CryptoError> {
    let der = pem::decode(PemLabel::PublicKey, pem_text)?;
    let inner = RsaPublicKey::from_public_key_der(&der)
        .map_err(|e| CryptoError::KeyImport(e.to_string()))?;
    check_modulus(inner.size())?;
    Ok(EncryptionKey { inner })
}

/// Import a PKCS#8 private key PEM as a decrypt-only handle.
pub fn import_private_key(pem_text: &str) -> Result<DecryptionKey, CryptoError> {
    let der = pem::decode(PemLabel::PrivateKey, pem_text)?;
    let inner = RsaPrivateKey::from_pkcs8_der(&der)
        .map_err(|e| CryptoError::KeyImport(e.to_string()))?;
    check_modulus(inner.size())?;
    Ok(DecryptionKey { inner })
}

fn check_modulus(modulus_len: usize) -> Result<(), CryptoError> {
    let bits = modulus_len * 8;
    if (MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&bits) {
        Ok(())
    } else {
        Err(CryptoError::KeyImport(format!("unsupported modulus size {bits}")))
    }
}

/// Encrypt-only RSA-OAEP (SHA-256) handle over a public key.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey {
    inner: RsaPublicKey,
}

impl EncryptionKey {
    /// Modulus length in bytes, which is also the ciphertext length.
    pub fn modulus_len(&self) -> usize {
        self.inner.size()
    }

    /// Largest plaintext this key can encrypt in one block.
    pub fn max_plaintext_len(&self) -> usize {
        oaep_max_plaintext_len(self.modulus_len())
    }

    /// Export as SPKI PEM.
    pub fn to_pem(&self) -> Result<String, CryptoError> {
        let der =
            self.inner.to_public_key_der().map_err(|e| CryptoError::KeyImport(e.to_string()))?;
        Ok(pem::encode(PemLabel::PublicKey, der.as_bytes()).to_string())
    }

    /// Encrypt raw bytes using the OS RNG.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.encrypt_with(&mut OsRng, plaintext)
    }

    /// Encrypt raw bytes with a caller-provided RNG for the OAEP seed.
    ///
    /// # Errors
    ///
    /// - `MessageTooLarge`: plaintext exceeds [`Self::max_plaintext_len`]
    /// - `Encryption`: the RSA provider rejected the operation
    pub fn encrypt_with<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let max = self.max_plaintext_len();
        if plaintext.len() > max {
            return Err(CryptoError::MessageTooLarge { len: plaintext.len(), max });
        }

        self.inner
            .encrypt(rng, Oaep::new::<Sha256>(), plaintext)
            .map_err(|_| CryptoError::Encryption)
    }

    /// Encrypt UTF-8 text and return base64 ciphertext.
    pub fn encrypt_text(&self, plaintext: &str) -> Result<String, CryptoError> {
        let ciphertext = self.encrypt(plaintext.as_bytes())?;
        Ok(STANDARD.encode(ciphertext))
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey").field("bits", &(self.modulus_len() * 8)).finish()
    }
}

/// Decrypt-only RSA-OAEP (SHA-256) handle over a private key.
///
/// The underlying key is zeroized when the handle is dropped.
pub struct DecryptionKey {
    inner: RsaPrivateKey,
}

impl DecryptionKey {
    /// The matching public key as an encrypt-only handle.
    pub fn public_key(&self) -> EncryptionKey {
        EncryptionKey { inner: self.inner.to_public_key() }
    }

    /// Whether `public` is the public half of this key.
    pub fn matches(&self, public: &EncryptionKey) -> bool {
        self.inner.to_public_key() == public.inner
    }

    /// Decrypt raw ciphertext bytes.
    ///
    /// # Errors
    ///
    /// - `Decryption`: wrong key, wrong length or corrupted ciphertext
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        if ciphertext.len() != self.inner.size() {
            return Err(CryptoError::Decryption);
        }

        self.inner
            .decrypt(Oaep::new::<Sha256>(), ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| CryptoError::Decryption)
    }

    /// Decrypt base64 ciphertext into UTF-8 text.
    pub fn decrypt_text(&self, ciphertext_b64: &str) -> Result<String, CryptoError> {
        let ciphertext =
            STANDARD.decode(ciphertext_b64.trim()).map_err(|_| CryptoError::Decryption)?;
        let plaintext = self.decrypt(&ciphertext)?;

        std::str::from_utf8(&plaintext).map(str::to_owned).map_err(|_| CryptoError::Decryption)
    }
}

impl fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionKey").finish_non_exhaustive()
    }
}
