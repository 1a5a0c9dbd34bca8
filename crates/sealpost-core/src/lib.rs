//! Sealpost Core
//!
//! Domain types shared by the server and client: accounts, dual-ciphertext
//! messages, session principals and the request shapes of the service
//! boundary. Input is validated and normalized by [`validate`] before it
//! reaches any store.
//!
//! [`Environment`] abstracts time and randomness so stores and the session
//! authority can run against a deterministic clock and seeded RNG in tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
pub mod model;
pub mod validate;

pub use env::Environment;
pub use error::ValidationError;
pub use model::{
    Account, AccountId, AccountSummary, Message, MessageId, ParseIdError, PublicKeyRecord,
    RegistrationRequest, Role, SendRequest, SessionPrincipal, WrappedKeyRecord,
};
