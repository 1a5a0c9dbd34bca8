//! Fuzz target for wrapped private key blobs
//!
//! # Strategy
//!
//! - Random text: arbitrary strings parsed as blobs
//! - Bit flips: a valid blob with one byte of its decoded form flipped
//! - Small params: blobs whose KDF params are cheap enough to unwrap
//!
//! # Invariants
//!
//! - Parsing out-of-range params is rejected before any KDF work
//! - A flipped blob never unwraps
//! - Every unwrap failure is `Unwrap`, NEVER panics

#![no_main]

use std::sync::OnceLock;

use arbitrary::Arbitrary;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use libfuzzer_sys::fuzz_target;
use rand::rngs::OsRng;
use sealpost_crypto::{
    pem::{self, PemLabel},
    vault::wrap_with,
    CryptoError, VaultParams, WrappedBlob, unwrap_private_key,
};

const PASSWORD: &str = "fuzz password";

/// Blob wrapped once with cheap params, reused by every run.
fn reference_blob() -> &'static str {
    static BLOB: OnceLock<String> = OnceLock::new();
    BLOB.get_or_init(|| {
        let der: Vec<u8> = (0u8..=255).collect();
        let pem = pem::encode(PemLabel::PrivateKey, &der);
        wrap_with(&mut OsRng, &pem, PASSWORD, VaultParams::TESTING).expect("reference wrap")
    })
}

#[derive(Debug, Arbitrary)]
enum BlobInput {
    Random(String),
    Flip { index: usize, mask: u8 },
}

fuzz_target!(|input: BlobInput| {
    match input {
        BlobInput::Random(text) => {
            let Ok(blob) = WrappedBlob::parse(&text) else {
                return;
            };
            let params = blob.params();
            assert!(params.is_admissible());
            if params.m_cost_kib <= VaultParams::TESTING.m_cost_kib && params.t_cost <= 2 {
                let result = unwrap_private_key(&text, PASSWORD);
                assert!(matches!(result, Ok(_) | Err(CryptoError::Unwrap)));
            }
        }
        BlobInput::Flip { index, mask } => {
            let mask = mask.max(1);
            let mut bytes = STANDARD.decode(reference_blob()).expect("reference is base64");
            let index = index % bytes.len();
            bytes[index] ^= mask;

            let text = STANDARD.encode(&bytes);
            let Ok(flipped) = WrappedBlob::parse(&text) else {
                return;
            };
            let params = flipped.params();
            if params.m_cost_kib > VaultParams::TESTING.m_cost_kib || params.t_cost > 2 {
                return;
            }
            assert_eq!(unwrap_private_key(&text, PASSWORD).unwrap_err(), CryptoError::Unwrap);
        }
    }
});
