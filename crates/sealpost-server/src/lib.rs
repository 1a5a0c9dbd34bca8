//! Sealpost server.
//!
//! Hosts the store, the credential and session authority, and the
//! [`Service`] boundary that the CLI (or any API layer built on top) calls.
//! The server only ever stores ciphertext. It sees a plaintext private key
//! only during a login, after unwrapping it with the submitted password, and
//! keeps it in memory for the life of the session.
//!
//! # Components
//!
//! - [`Service`]: validated operations over a store
//! - [`Authority`]: password hashing, login stages, session tokens
//! - [`SessionRegistry`]: live sessions indexed by id and account
//! - [`storage`]: the [`Storage`] trait with memory, redb and fault-injecting
//!   backends
//! - [`SystemEnv`]: production environment (real time, OS RNG)
//!
//! ```text
//!  request ──► Service ──► validate ──► Authority ──► Storage
//!                 │                        │
//!                 │                        └─► SessionRegistry (in memory)
//!                 └──► ServiceError (generic, no store detail)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod authority;
pub mod credential;
mod error;
mod registry;
mod service;
pub mod storage;
mod system_env;
pub mod token;

pub use authority::{
    AuthError, AuthFailure, Authority, AuthorityConfig, DEFAULT_SESSION_TTL, LoginGrant,
    LoginStage,
};
pub use credential::{CredentialError, CredentialHasher, HashCost};
pub use error::ServiceError;
pub use registry::SessionRegistry;
pub use service::{OpenedMessage, Service};
pub use storage::{ChaoticStorage, MemoryStorage, RedbStorage, Storage, StorageError};
pub use system_env::SystemEnv;
pub use token::{SessionToken, TokenSigner};
