//! Fuzz target for PEM framing and key import
//!
//! # Strategy
//!
//! - Raw text: arbitrary strings fed to both key importers
//! - Framed garbage: valid header and footer around arbitrary base64 or DER
//! - Label swap: public framing around private material and vice versa
//!
//! # Invariants
//!
//! - Import returns `KeyImport` or a usable key, NEVER panics
//! - Anything that imports as a public key re-exports to PEM that imports
//!   again

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealpost_crypto::{
    import_private_key, import_public_key,
    pem::{self, PemLabel},
};

#[derive(Debug, Arbitrary)]
enum PemInput {
    Raw(String),
    Framed { private: bool, der: Vec<u8> },
    FramedText { private: bool, body: String },
}

fuzz_target!(|input: PemInput| {
    let text = match input {
        PemInput::Raw(text) => text,
        PemInput::Framed { private, der } => {
            let label = if private { PemLabel::PrivateKey } else { PemLabel::PublicKey };
            pem::encode(label, &der).to_string()
        }
        PemInput::FramedText { private, body } => {
            let label = if private { "PRIVATE KEY" } else { "PUBLIC KEY" };
            format!("-----BEGIN {label}-----\n{body}\n-----END {label}-----")
        }
    };

    if let Ok(key) = import_public_key(&text) {
        let exported = key.to_pem().expect("imported key must export");
        assert!(import_public_key(&exported).is_ok());
    }
    let _ = import_private_key(&text);
});
