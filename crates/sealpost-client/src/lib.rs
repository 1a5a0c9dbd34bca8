//! Sealpost client.
//!
//! Everything that must happen where the password is typed: key pair
//! generation, wrapping the private key, composing the dual ciphertext of an
//! outgoing message and opening the caller's copy of a stored one. The server
//! never needs to see plaintext for any of these.
//!
//! # Components
//!
//! - [`prepare_registration`]: key pair plus wrapped private key
//! - [`ClientSession`]: unlocked key pair for composing and reading

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod registration;
mod session;

pub use error::ClientError;
pub use registration::{prepare_registration, prepare_registration_with};
pub use session::ClientSession;
