//! Deterministic test support for Sealpost.
//!
//! [`SimEnv`] implements the core `Environment` trait with a seeded ChaCha
//! RNG and a clock that only moves when told to, so ids, timestamps and
//! session expiry are reproducible. [`TestIdentity`] bundles the material a
//! client prepares before registering.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod sim_env;

pub use fixtures::TestIdentity;
pub use sim_env::{DEFAULT_EPOCH_MILLIS, SimEnv, SimInstant};
