//! Registration material prepared before the first request.
//!
//! The key pair is generated here and the private key is wrapped under the
//! password before anything leaves the client. The plaintext private key is
//! dropped (and zeroized) once the wrap completes.

use rand::{CryptoRng, RngCore, rngs::OsRng};
use sealpost_core::{model::RegistrationRequest, validate};
use sealpost_crypto::{MODULUS_BITS, VaultParams, generate_key_pair_with, vault::wrap_with};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::ClientError;

/// Generate a key pair, wrap it under `password` and build the request.
///
/// # Errors
///
/// - `Validation`: username, email or password rejected
/// - `Crypto`: key generation or wrapping failed
pub fn prepare_registration(
    username: &str,
    email: &str,
    password: &str,
    params: VaultParams,
) -> Result<RegistrationRequest, ClientError> {
    prepare_registration_with(&mut OsRng, username, email, password, params)
}

/// [`prepare_registration`] with a caller-provided RNG.
pub fn prepare_registration_with<R: RngCore + CryptoRng>(
    rng: &mut R,
    username: &str,
    email: &str,
    password: &str,
    params: VaultParams,
) -> Result<RegistrationRequest, ClientError> {
    let username = validate::username(username)?;
    let email = validate::email(email)?;
    validate::password(password)?;

    let pair = generate_key_pair_with(rng, MODULUS_BITS)?;
    let wrapped_private_key = wrap_with(rng, pair.private_pem(), password, params)?;
    let (public_key, _private) = pair.into_parts();

    debug!(%username, "registration material prepared");
    Ok(RegistrationRequest {
        username,
        email,
        password: Zeroizing::new(password.to_owned()),
        public_key,
        wrapped_private_key,
    })
}
