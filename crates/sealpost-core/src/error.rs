//! Error types for boundary validation.
//!
//! Every rejected input names the field it came from so the caller can
//! report it. Values are never echoed back; passwords and key material must
//! not end up in error messages or logs.

use thiserror::Error;

/// Input rejected at the service boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field was empty or whitespace
    #[error("{field} is required")]
    Missing {
        /// Field name
        field: &'static str,
    },

    /// Field exceeds its length limit
    #[error("{field} exceeds {max} bytes")]
    TooLong {
        /// Field name
        field: &'static str,
        /// Limit in bytes
        max: usize,
    },

    /// Field has the wrong shape
    #[error("{field} is malformed: {reason}")]
    Malformed {
        /// Field name
        field: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Sender and recipient are the same account
    #[error("sender and recipient must be different accounts")]
    SelfAddressed,
}
