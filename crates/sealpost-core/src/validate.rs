//! Boundary validation of untrusted input.
//!
//! Storage accepts whatever it is given. Everything arriving at the service
//! boundary passes through here first and comes out in normalized form.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use sealpost_crypto::{WrappedBlob, import_public_key, keys::MAX_MODULUS_BITS};

use crate::{
    error::ValidationError,
    model::{RegistrationRequest, SendRequest},
};

/// Longest accepted username in bytes.
pub const MAX_USERNAME_LEN: usize = 64;

/// Longest accepted email in bytes.
pub const MAX_EMAIL_LEN: usize = 254;

/// Longest accepted password in bytes.
pub const MAX_PASSWORD_LEN: usize = 1024;

/// Longest accepted PEM or vault blob in bytes.
pub const MAX_KEY_TEXT_LEN: usize = 8 * 1024;

/// Largest raw ciphertext: one RSA block of the largest accepted modulus.
pub const MAX_CIPHERTEXT_BYTES: usize = MAX_MODULUS_BITS / 8;

/// Username: trimmed, then 1..=64 bytes of non-whitespace, non-control chars.
///
/// Case is preserved and significant.
pub fn username(raw: &str) -> Result<String, ValidationError> {
    let value = required("username", raw)?;
    bounded("username", value, MAX_USERNAME_LEN)?;
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::Malformed {
            field: "username",
            reason: "must not contain whitespace or control characters",
        });
    }
    Ok(value.to_owned())
}

/// Email: trimmed and lowercased, `local@domain` with a dot in the domain.
pub fn email(raw: &str) -> Result<String, ValidationError> {
    let value = required("email", raw)?.to_lowercase();
    bounded("email", &value, MAX_EMAIL_LEN)?;

    let malformed = ValidationError::Malformed { field: "email", reason: "expected local@domain" };
    let Some((local, domain)) = value.split_once('@') else {
        return Err(malformed);
    };
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok || value.chars().any(char::is_whitespace) {
        return Err(malformed);
    }

    Ok(value)
}

/// Password: non-empty, bounded. Not trimmed; whitespace is significant.
pub fn password(raw: &str) -> Result<(), ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Missing { field: "password" });
    }
    bounded("password", raw, MAX_PASSWORD_LEN)
}

/// Public key: must import as an RSA SPKI PEM.
pub fn public_key(raw: &str) -> Result<(), ValidationError> {
    let value = required("public_key", raw)?;
    bounded("public_key", value, MAX_KEY_TEXT_LEN)?;
    import_public_key(value).map(|_| ()).map_err(|_| ValidationError::Malformed {
        field: "public_key",
        reason: "not an RSA public key PEM",
    })
}

/// Wrapped private key: must parse as a vault blob with admissible Argon2id
/// parameters, so no stored blob makes a login derive above interactive
/// cost. The password is not checked here.
pub fn wrapped_private_key(raw: &str) -> Result<(), ValidationError> {
    let value = required("wrapped_private_key", raw)?;
    bounded("wrapped_private_key", value, MAX_KEY_TEXT_LEN)?;
    WrappedBlob::parse(value).map(|_| ()).map_err(|_| ValidationError::Malformed {
        field: "wrapped_private_key",
        reason: "not a wrapped key blob",
    })
}

/// Ciphertext: base64 of at most one RSA block.
pub fn ciphertext(field: &'static str, raw: &str) -> Result<(), ValidationError> {
    let value = required(field, raw)?;
    let decoded = STANDARD
        .decode(value)
        .map_err(|_| ValidationError::Malformed { field, reason: "not base64" })?;
    if decoded.len() > MAX_CIPHERTEXT_BYTES {
        return Err(ValidationError::TooLong { field, max: MAX_CIPHERTEXT_BYTES });
    }
    Ok(())
}

/// Validate and normalize a registration request.
pub fn registration(request: &RegistrationRequest) -> Result<RegistrationRequest, ValidationError> {
    password(&request.password)?;
    public_key(&request.public_key)?;
    wrapped_private_key(&request.wrapped_private_key)?;

    Ok(RegistrationRequest {
        username: username(&request.username)?,
        email: email(&request.email)?,
        password: request.password.clone(),
        public_key: request.public_key.trim().to_owned(),
        wrapped_private_key: request.wrapped_private_key.trim().to_owned(),
    })
}

/// Validate a send request. Both ciphertexts must be present.
pub fn send(request: &SendRequest) -> Result<(), ValidationError> {
    if request.sender_id == request.recipient_id {
        return Err(ValidationError::SelfAddressed);
    }
    ciphertext("content_for_recipient", &request.content_for_recipient)?;
    ciphertext("content_for_sender", &request.content_for_sender)
}

fn required<'a>(field: &'static str, raw: &'a str) -> Result<&'a str, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    Ok(value)
}

fn bounded(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.len() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}
