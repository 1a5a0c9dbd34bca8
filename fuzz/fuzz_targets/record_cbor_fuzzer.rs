//! Fuzz target for stored record decoding
//!
//! Records are persisted as CBOR. A damaged database file must produce a
//! decode error, not a crash.
//!
//! # Strategy
//!
//! - Random bytes: arbitrary CBOR decoded as `Account` and `Message`
//! - Huge lengths: headers claiming massive byte/text/array lengths
//! - Deep nesting: arrays nested to arbitrary depth
//!
//! # Invariants
//!
//! - Decoding completes quickly and NEVER panics
//! - Huge claimed lengths are not allocated up front
//! - A record that decodes re-encodes to bytes that decode to the same value

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealpost_core::model::{Account, Message};

#[derive(Debug, Arbitrary)]
enum CborInput {
    Random(Vec<u8>),
    HugeLength { major: u8, exponent: u8 },
    Nested { depth: u8 },
}

fuzz_target!(|input: CborInput| {
    let bytes = match input {
        CborInput::Random(bytes) => bytes,
        CborInput::HugeLength { major, exponent } => {
            let claimed = if exponent % 33 < 32 { 1u32 << (exponent % 33) } else { u32::MAX };
            // 0x5A byte string, 0x7A text string, 0x9A array, 0xBA map
            let header = [0x5A, 0x7A, 0x9A, 0xBA][usize::from(major % 4)];
            let mut bytes = vec![header];
            bytes.extend_from_slice(&claimed.to_be_bytes());
            bytes.extend(std::iter::repeat_n(0x01, (claimed as usize).min(8)));
            bytes
        }
        CborInput::Nested { depth } => {
            let mut bytes = vec![0x81; usize::from(depth % 64)];
            bytes.push(0x01);
            bytes
        }
    };

    if let Ok(account) = ciborium::from_reader::<Account, _>(bytes.as_slice()) {
        let mut encoded = Vec::new();
        ciborium::into_writer(&account, &mut encoded).expect("encode account");
        let again: Account = ciborium::from_reader(encoded.as_slice()).expect("decode account");
        assert!(again == account);
    }

    if let Ok(message) = ciborium::from_reader::<Message, _>(bytes.as_slice()) {
        let mut encoded = Vec::new();
        ciborium::into_writer(&message, &mut encoded).expect("encode message");
        let again: Message = ciborium::from_reader(encoded.as_slice()).expect("decode message");
        assert_eq!(again, message);
    }
});
