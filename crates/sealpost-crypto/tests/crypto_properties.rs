//! Property-based tests for Sealpost cryptography
//!
//! 1. **Round-trip**: decrypt(encrypt(m, pub), priv) == m for every text within
//!    the OAEP bound
//! 2. **Bound**: every text above the bound is rejected, never truncated
//! 3. **Isolation**: a ciphertext for one key never opens under another
//! 4. **Vault**: unwrap(wrap(pem, pw), pw) == pem, and any other password fails

use std::sync::OnceLock;

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sealpost_crypto::{
    CryptoError, KeyPair, MODULUS_BITS, VaultParams, decrypt, encrypt, generate_key_pair_with,
    unwrap_private_key, vault::wrap_with,
};

const MAX_PLAINTEXT: usize = 190;

fn pair(seed: u64) -> KeyPair {
    generate_key_pair_with(&mut ChaCha20Rng::seed_from_u64(seed), MODULUS_BITS).unwrap()
}

fn first() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| pair(101))
}

fn second() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| pair(202))
}

// Strings whose UTF-8 encoding fits the OAEP bound, including multibyte chars
fn fitting_text() -> impl Strategy<Value = String> {
    prop::collection::vec(any::<char>(), 1..=MAX_PLAINTEXT).prop_map(|chars| {
        let mut text = String::new();
        for c in chars {
            if text.len() + c.len_utf8() > MAX_PLAINTEXT {
                break;
            }
            text.push(c);
        }
        text
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_encrypt_decrypt_roundtrip(text in fitting_text()) {
        let ciphertext = encrypt(&text, first().public_pem()).unwrap();
        let plaintext = decrypt(&ciphertext, first().private_pem()).unwrap();
        prop_assert_eq!(plaintext, text);
    }

    #[test]
    fn prop_ciphertext_isolated_to_recipient(text in fitting_text()) {
        let ciphertext = encrypt(&text, first().public_pem()).unwrap();
        let result = decrypt(&ciphertext, second().private_pem());
        prop_assert_eq!(result, Err(CryptoError::Decryption));
    }

    #[test]
    fn prop_oversize_rejected(extra in 1usize..400) {
        let text = "x".repeat(MAX_PLAINTEXT + extra);
        let result = encrypt(&text, first().public_pem());
        prop_assert_eq!(
            result,
            Err(CryptoError::MessageTooLarge { len: MAX_PLAINTEXT + extra, max: MAX_PLAINTEXT })
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_vault_roundtrip(password in "\\PC{1,40}", seed in any::<u64>()) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let blob = wrap_with(&mut rng, first().private_pem(), &password, VaultParams::TESTING)
            .unwrap();

        let pem = unwrap_private_key(&blob, &password).unwrap();
        prop_assert_eq!(pem.as_str(), first().private_pem());
    }

    #[test]
    fn prop_vault_rejects_other_passwords(
        password in "[a-z]{8,16}",
        other in "[A-Z]{8,16}",
    ) {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let blob = wrap_with(&mut rng, first().private_pem(), &password, VaultParams::TESTING)
            .unwrap();

        prop_assert!(matches!(unwrap_private_key(&blob, &other), Err(CryptoError::Unwrap)));
    }
}

#[test]
fn dual_copies_open_only_for_their_owner() {
    let text = "meet at noon";
    let for_second = encrypt(text, second().public_pem()).unwrap();
    let for_first = encrypt(text, first().public_pem()).unwrap();

    assert_eq!(decrypt(&for_second, second().private_pem()).unwrap(), text);
    assert_eq!(decrypt(&for_first, first().private_pem()).unwrap(), text);
    assert_eq!(decrypt(&for_second, first().private_pem()), Err(CryptoError::Decryption));
    assert_eq!(decrypt(&for_first, second().private_pem()), Err(CryptoError::Decryption));
}
