//! Ready-made identities for service and client tests.
//!
//! An identity is what a client holds right before registering: a key pair,
//! the password and the private key already wrapped under it. Key generation
//! is seeded so a given `(username, seed)` always yields the same keys.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sealpost_core::model::RegistrationRequest;
use sealpost_crypto::{MODULUS_BITS, VaultParams, generate_key_pair_with, vault::wrap_with};
use zeroize::Zeroizing;

/// Client-side registration material for one test user.
#[derive(Clone)]
pub struct TestIdentity {
    /// Username
    pub username: String,
    /// Email, already lowercase
    pub email: String,
    /// Login password
    pub password: String,
    /// SPKI PEM
    pub public_pem: String,
    /// PKCS#8 PEM
    pub private_pem: Zeroizing<String>,
    /// `private_pem` wrapped under `password` with [`VaultParams::TESTING`]
    pub wrapped_private_key: String,
}

impl TestIdentity {
    /// Generate an identity with password `"<username>-password"`.
    ///
    /// # Panics
    ///
    /// Panics if key generation or wrapping fails.
    #[allow(clippy::expect_used)]
    pub fn generate(username: &str, seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let pair = generate_key_pair_with(&mut rng, MODULUS_BITS).expect("key generation");
        let password = format!("{username}-password");
        let wrapped_private_key =
            wrap_with(&mut rng, pair.private_pem(), &password, VaultParams::TESTING)
                .expect("wrap private key");
        let (public_pem, private_pem) = pair.into_parts();

        Self {
            username: username.to_owned(),
            email: format!("{}@example.com", username.to_lowercase()),
            password,
            public_pem,
            private_pem,
            wrapped_private_key,
        }
    }

    /// Registration request for this identity.
    pub fn registration(&self) -> RegistrationRequest {
        RegistrationRequest {
            username: self.username.clone(),
            email: self.email.clone(),
            password: Zeroizing::new(self.password.clone()),
            public_key: self.public_pem.clone(),
            wrapped_private_key: self.wrapped_private_key.clone(),
        }
    }
}
