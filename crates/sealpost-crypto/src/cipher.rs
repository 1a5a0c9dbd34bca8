//! Single-message RSA-OAEP encryption over PEM keys.
//!
//! Text in, base64 out. One call encrypts for one reader; dual encryption
//! (recipient copy plus sender copy) is composed from two calls by the client.

use crate::{
    error::CryptoError,
    keys::{import_private_key, import_public_key},
};

/// Encrypt `plaintext` for the holder of `recipient_public_pem`.
///
/// # Errors
///
/// - `InvalidArgument`: plaintext or key is empty
/// - `KeyImport`: key is not a valid public key PEM
/// - `MessageTooLarge`: plaintext exceeds the OAEP bound of the key
pub fn encrypt(plaintext: &str, recipient_public_pem: &str) -> Result<String, CryptoError> {
    if plaintext.is_empty() {
        return Err(CryptoError::InvalidArgument("plaintext is required"));
    }
    if recipient_public_pem.trim().is_empty() {
        return Err(CryptoError::InvalidArgument("public key is required"));
    }

    import_public_key(recipient_public_pem)?.encrypt_text(plaintext)
}

/// Decrypt base64 `ciphertext` with `private_pem`.
///
/// # Errors
///
/// - `InvalidArgument`: ciphertext or key is empty
/// - `KeyImport`: key is not a valid private key PEM
/// - `Decryption`: ciphertext was not produced for this key, or is corrupt
pub fn decrypt(ciphertext: &str, private_pem: &str) -> Result<String, CryptoError> {
    if ciphertext.trim().is_empty() {
        return Err(CryptoError::InvalidArgument("ciphertext is required"));
    }
    if private_pem.trim().is_empty() {
        return Err(CryptoError::InvalidArgument("private key is required"));
    }

    import_private_key(private_pem)?.decrypt_text(ciphertext)
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::keys::{KeyPair, MODULUS_BITS, generate_key_pair_with};

    fn alice() -> &'static KeyPair {
        static PAIR: OnceLock<KeyPair> = OnceLock::new();
        PAIR.get_or_init(|| {
            generate_key_pair_with(&mut ChaCha20Rng::seed_from_u64(11), MODULUS_BITS).unwrap()
        })
    }

    fn bob() -> &'static KeyPair {
        static PAIR: OnceLock<KeyPair> = OnceLock::new();
        PAIR.get_or_init(|| {
            generate_key_pair_with(&mut ChaCha20Rng::seed_from_u64(12), MODULUS_BITS).unwrap()
        })
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let ciphertext = encrypt("Hello, Bob!", bob().public_pem()).unwrap();
        let plaintext = decrypt(&ciphertext, bob().private_pem()).unwrap();
        assert_eq!(plaintext, "Hello, Bob!");
    }

    #[test]
    fn multibyte_text_roundtrip() {
        let text = "héllo wörld, こんにちは 🔐";
        let ciphertext = encrypt(text, alice().public_pem()).unwrap();
        assert_eq!(decrypt(&ciphertext, alice().private_pem()).unwrap(), text);
    }

    #[test]
    fn encryption_is_randomized() {
        let first = encrypt("same text", alice().public_pem()).unwrap();
        let second = encrypt("same text", alice().public_pem()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn empty_arguments_are_rejected() {
        assert!(matches!(encrypt("", alice().public_pem()), Err(CryptoError::InvalidArgument(_))));
        assert!(matches!(encrypt("hi", "   "), Err(CryptoError::InvalidArgument(_))));
        assert!(matches!(decrypt("", alice().private_pem()), Err(CryptoError::InvalidArgument(_))));
        assert!(matches!(decrypt("AAAA", ""), Err(CryptoError::InvalidArgument(_))));
    }

    #[test]
    fn exactly_190_bytes_is_accepted() {
        let text = "a".repeat(190);
        let ciphertext = encrypt(&text, alice().public_pem()).unwrap();
        assert_eq!(decrypt(&ciphertext, alice().private_pem()).unwrap(), text);
    }

    #[test]
    fn oversize_plaintext_is_rejected() {
        let text = "a".repeat(191);
        let result = encrypt(&text, alice().public_pem());
        assert_eq!(result, Err(CryptoError::MessageTooLarge { len: 191, max: 190 }));
    }

    #[test]
    fn bound_counts_utf8_bytes_not_chars() {
        // 64 three-byte chars = 192 bytes
        let text = "€".repeat(64);
        assert!(matches!(
            encrypt(&text, alice().public_pem()),
            Err(CryptoError::MessageTooLarge { len: 192, max: 190 })
        ));
    }

    #[test]
    fn wrong_key_and_corruption_fail_identically() {
        let ciphertext = encrypt("for alice only", alice().public_pem()).unwrap();

        let wrong_key = decrypt(&ciphertext, bob().private_pem()).unwrap_err();

        let mut bytes = STANDARD.decode(&ciphertext).unwrap();
        bytes[17] ^= 0x40;
        let corrupted = decrypt(&STANDARD.encode(bytes), alice().private_pem()).unwrap_err();

        let not_base64 = decrypt("%%%%", alice().private_pem()).unwrap_err();

        assert_eq!(wrong_key, CryptoError::Decryption);
        assert_eq!(corrupted, CryptoError::Decryption);
        assert_eq!(not_base64, CryptoError::Decryption);
        assert_eq!(wrong_key.to_string(), corrupted.to_string());
    }

    #[test]
    fn malformed_key_reports_import_error() {
        let result = encrypt("hi", "-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----");
        assert!(matches!(result, Err(CryptoError::KeyImport(_))));
    }
}
