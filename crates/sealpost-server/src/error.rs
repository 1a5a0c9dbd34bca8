//! Service boundary error types.

use std::fmt;

use sealpost_core::error::ValidationError;
use sealpost_crypto::CryptoError;

use crate::authority::AuthFailure;

/// Errors returned across the service boundary.
///
/// Messages are safe to show to callers. Store and internal failures carry
/// no detail; the detail is logged where the failure is translated.
#[derive(Debug)]
pub enum ServiceError {
    /// Malformed or missing input.
    Validation(ValidationError),

    /// Username or email already exists.
    Conflict,

    /// Login rejected.
    ///
    /// The reason is kept for tests and logs but not rendered by `Display`,
    /// so unknown users and wrong passwords are indistinguishable to callers.
    Authentication(AuthFailure),

    /// Token is forged, unknown, logged out or expired.
    Unauthorized,

    /// Authenticated, but acting on behalf of another account.
    Forbidden,

    /// Referenced record does not exist.
    NotFound(&'static str),

    /// Cryptographic failure (key import, oversize plaintext, decryption).
    Crypto(CryptoError),

    /// Persistence failure.
    Store,

    /// Unexpected failure inside the service.
    Internal,
}

impl ServiceError {
    /// Stable machine-readable code for the error class.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Conflict => "conflict",
            Self::Authentication(_) => "authentication",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Crypto(CryptoError::MessageTooLarge { .. }) => "message_too_large",
            Self::Crypto(CryptoError::Decryption | CryptoError::Unwrap) => "decryption",
            Self::Crypto(CryptoError::KeyImport(_)) => "key_import",
            Self::Crypto(CryptoError::KeyGeneration(_)) => "key_generation",
            Self::Crypto(_) => "crypto",
            Self::Store => "store",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "validation error: {err}"),
            Self::Conflict => write!(f, "username or email already exists"),
            Self::Authentication(_) => write!(f, "authentication failed"),
            Self::Unauthorized => write!(f, "session is invalid or expired"),
            Self::Forbidden => write!(f, "not permitted for this session"),
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::Crypto(err) => write!(f, "{err}"),
            Self::Store => write!(f, "storage failure"),
            Self::Internal => write!(f, "internal error"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Crypto(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<CryptoError> for ServiceError {
    fn from(err: CryptoError) -> Self {
        Self::Crypto(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_reason_is_not_rendered() {
        let unknown = ServiceError::Authentication(AuthFailure::UnknownUser);
        let wrong = ServiceError::Authentication(AuthFailure::InvalidPassword);
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.code(), wrong.code());
    }

    #[test]
    fn crypto_errors_map_to_taxonomy_codes() {
        let oversize = ServiceError::from(CryptoError::MessageTooLarge { len: 200, max: 190 });
        assert_eq!(oversize.code(), "message_too_large");
        assert_eq!(ServiceError::from(CryptoError::Unwrap).code(), "decryption");
        assert_eq!(ServiceError::from(CryptoError::Decryption).code(), "decryption");
    }

    #[test]
    fn store_failure_has_no_detail() {
        assert_eq!(ServiceError::Store.to_string(), "storage failure");
    }
}
