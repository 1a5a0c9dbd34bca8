//! Storage error types.
//!
//! - `Duplicate`: a unique account field is already taken
//! - `Serialization`: failed to encode/decode a stored record
//! - `Io`: underlying storage system errors

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Unique constraint violated on insert
    ///
    /// Nothing was written. `field` is `username`, `email` or `id`.
    #[error("duplicate {field}")]
    Duplicate {
        /// Field whose value is already taken
        field: &'static str,
    },

    /// Serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error (file system, database, etc.)
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}
