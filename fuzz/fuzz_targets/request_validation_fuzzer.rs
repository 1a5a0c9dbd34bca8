//! Fuzz target for request validation
//!
//! # Strategy
//!
//! - Arbitrary registration fields (usernames, emails, passwords, key text)
//! - Arbitrary send requests, including self-addressed ones
//!
//! # Invariants
//!
//! - Validation NEVER panics
//! - Normalization is stable: a normalized request that validates again
//!   keeps its username and email
//! - Accepted usernames contain no whitespace
//! - A self-addressed send is always rejected

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sealpost_core::{
    model::{AccountId, RegistrationRequest, SendRequest},
    validate, ValidationError,
};
use zeroize::Zeroizing;

#[derive(Debug, Arbitrary)]
enum RequestInput {
    Register {
        username: String,
        email: String,
        password: String,
        public_key: String,
        wrapped_private_key: String,
    },
    Send {
        sender: u128,
        recipient: u128,
        content_for_recipient: String,
        content_for_sender: String,
    },
}

fuzz_target!(|input: RequestInput| {
    match input {
        RequestInput::Register { username, email, password, public_key, wrapped_private_key } => {
            let request = RegistrationRequest {
                username,
                email,
                password: Zeroizing::new(password),
                public_key,
                wrapped_private_key,
            };
            let Ok(normalized) = validate::registration(&request) else {
                return;
            };

            assert!(!normalized.username.chars().any(char::is_whitespace));

            // Lowercasing can grow an email past its bound, so only compare
            // when the second pass accepts it
            if let Ok(again) = validate::registration(&normalized) {
                assert_eq!(again.username, normalized.username);
                assert_eq!(again.email, normalized.email);
            }
        }
        RequestInput::Send { sender, recipient, content_for_recipient, content_for_sender } => {
            let request = SendRequest {
                sender_id: AccountId(sender),
                recipient_id: AccountId(recipient),
                content_for_recipient,
                content_for_sender,
            };
            let result = validate::send(&request);
            if sender == recipient {
                assert_eq!(result, Err(ValidationError::SelfAddressed));
            }
        }
    }
});
