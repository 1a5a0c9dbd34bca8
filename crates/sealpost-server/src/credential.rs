//! Password credential hashing.
//!
//! Stored credentials are Argon2id PHC strings
//! (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so each hash carries its
//! own salt and cost and older hashes keep verifying after the cost changes.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use sealpost_core::env::Environment;

/// Salt bytes drawn from the environment per hash.
const SALT_LEN: usize = 16;

/// Password used for the decoy hash verified on unknown usernames.
const DECOY_PASSWORD: &[u8] = b"sealpost decoy credential";

/// Argon2id cost for credential hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory cost in KiB
    pub m_cost_kib: u32,
    /// Number of passes
    pub t_cost: u32,
    /// Degree of parallelism
    pub p_cost: u32,
}

impl HashCost {
    /// 19 MiB, 2 passes, 1 lane.
    pub const INTERACTIVE: Self = Self { m_cost_kib: 19 * 1024, t_cost: 2, p_cost: 1 };

    /// Minimal cost for tests.
    pub const TESTING: Self = Self { m_cost_kib: 256, t_cost: 1, p_cost: 1 };
}

impl Default for HashCost {
    fn default() -> Self {
        Self::INTERACTIVE
    }
}

/// Credential hash could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("credential hashing failed: {0}")]
pub struct CredentialError(String);

/// Hashes and verifies account passwords.
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    decoy: String,
}

impl CredentialHasher {
    /// Build a hasher and precompute the decoy hash.
    pub fn new<E: Environment>(env: &E, cost: HashCost) -> Result<Self, CredentialError> {
        let params = Params::new(cost.m_cost_kib, cost.t_cost, cost.p_cost, None)
            .map_err(|e| CredentialError(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut hasher = Self { argon2, decoy: String::new() };
        hasher.decoy = hasher.hash_bytes(env, DECOY_PASSWORD)?;
        Ok(hasher)
    }

    /// PHC string for `password` under a fresh salt.
    pub fn hash<E: Environment>(&self, env: &E, password: &str) -> Result<String, CredentialError> {
        self.hash_bytes(env, password.as_bytes())
    }

    /// Whether `password` matches `phc`. A malformed `phc` never matches.
    pub fn verify(&self, password: &str, phc: &str) -> bool {
        PasswordHash::new(phc)
            .is_ok_and(|hash| self.argon2.verify_password(password.as_bytes(), &hash).is_ok())
    }

    /// Run a verification against the decoy hash and discard the result.
    ///
    /// Called when the username does not exist so that unknown users and wrong
    /// passwords take comparable time.
    pub fn verify_decoy(&self, password: &str) {
        let _ = self.verify(password, &self.decoy);
    }

    fn hash_bytes<E: Environment>(
        &self,
        env: &E,
        password: &[u8],
    ) -> Result<String, CredentialError> {
        let mut salt = [0u8; SALT_LEN];
        env.random_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt).map_err(|e| CredentialError(e.to_string()))?;

        self.argon2
            .hash_password(password, &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CredentialError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use sealpost_harness::SimEnv;

    use super::*;

    fn hasher() -> (SimEnv, CredentialHasher) {
        let env = SimEnv::with_seed(1);
        let hasher = CredentialHasher::new(&env, HashCost::TESTING).unwrap();
        (env, hasher)
    }

    #[test]
    fn hash_verifies_only_its_password() {
        let (env, hasher) = hasher();
        let phc = hasher.hash(&env, "correct horse").unwrap();

        assert!(phc.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &phc));
        assert!(!hasher.verify("Correct horse", &phc));
    }

    #[test]
    fn hashes_are_salted() {
        let (env, hasher) = hasher();
        assert_ne!(hasher.hash(&env, "pw").unwrap(), hasher.hash(&env, "pw").unwrap());
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let (_, hasher) = hasher();
        assert!(!hasher.verify("pw", "not a phc string"));
        assert!(!hasher.verify("pw", ""));
    }

    #[test]
    fn decoy_is_a_real_hash() {
        let (_, hasher) = hasher();
        assert!(hasher.decoy.starts_with("$argon2id$"));
        assert!(hasher.verify("sealpost decoy credential", &hasher.decoy));
        hasher.verify_decoy("anything");
    }

    #[test]
    fn stored_cost_is_honored_on_verify() {
        let env = SimEnv::with_seed(2);
        let cheap = CredentialHasher::new(&env, HashCost::TESTING).unwrap();
        let other = CredentialHasher::new(
            &env,
            HashCost { m_cost_kib: 512, t_cost: 2, p_cost: 1 },
        )
        .unwrap();

        let phc = cheap.hash(&env, "pw").unwrap();
        assert!(other.verify("pw", &phc));
    }
}
