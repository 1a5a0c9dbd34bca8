//! Typed domain model.
//!
//! Records are validated at the service boundary (see [`crate::validate`])
//! and stored as-is. Secret-bearing types redact themselves in `Debug`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u128);

        impl $name {
            /// Big-endian bytes, the order used in storage keys.
            pub fn to_be_bytes(self) -> [u8; 16] {
                self.0.to_be_bytes()
            }

            /// Inverse of [`Self::to_be_bytes`].
            pub fn from_be_bytes(bytes: [u8; 16]) -> Self {
                Self(u128::from_be_bytes(bytes))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:032x}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:032x})", stringify!($name), self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(ParseIdError);
                }
                u128::from_str_radix(s, 16).map(Self).map_err(|_| ParseIdError)
            }
        }
    };
}

hex_id!(
    /// Server-assigned account identifier, rendered as 32 hex digits.
    AccountId
);

hex_id!(
    /// Server-assigned message identifier, rendered as 32 hex digits.
    MessageId
);

/// Id text was not 32 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("expected a 32 digit hex id")]
pub struct ParseIdError;

/// Stored account record.
///
/// Holds no usable secret: `credential_hash` is a one-way hash and
/// `wrapped_private_key` is sealed under the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Immutable id
    pub id: AccountId,
    /// Unique, case-sensitive
    pub username: String,
    /// Unique after normalization (trimmed, lowercased)
    pub email: String,
    /// Argon2id PHC string of the password
    pub credential_hash: String,
    /// SPKI PEM, public by design
    pub public_key: String,
    /// Vault blob of the PKCS#8 private key PEM
    pub wrapped_private_key: String,
    /// Registration time, ms since Unix epoch
    pub created_at_ms: u64,
}

impl Account {
    /// Directory view without credential or key material.
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            public_key: self.public_key.clone(),
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("created_at_ms", &self.created_at_ms)
            .finish_non_exhaustive()
    }
}

/// Public view of an account. Never carries the hash or the wrapped key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    /// Account id
    pub id: AccountId,
    /// Username
    pub username: String,
    /// Normalized email
    pub email: String,
    /// SPKI PEM
    pub public_key: String,
}

/// Role of an account within a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Wrote the message; reads `content_for_sender`
    Sender,
    /// Received the message; reads `content_for_recipient`
    Recipient,
}

/// Stored message with one ciphertext per reader.
///
/// Immutable once stored. Both ciphertexts are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned id
    pub id: MessageId,
    /// Author
    pub sender_id: AccountId,
    /// Reader other than the author
    pub recipient_id: AccountId,
    /// Base64 RSA-OAEP ciphertext under the recipient's public key
    pub content_for_recipient: String,
    /// Base64 RSA-OAEP ciphertext under the sender's public key
    pub content_for_sender: String,
    /// Server-assigned, ms since Unix epoch
    pub timestamp_ms: u64,
}

impl Message {
    /// Role `account` plays in this message, if any.
    pub fn role_of(&self, account: AccountId) -> Option<Role> {
        if account == self.sender_id {
            Some(Role::Sender)
        } else if account == self.recipient_id {
            Some(Role::Recipient)
        } else {
            None
        }
    }

    /// Ciphertext `account` is able to decrypt, if it is a participant.
    pub fn ciphertext_for(&self, account: AccountId) -> Option<&str> {
        match self.role_of(account)? {
            Role::Sender => Some(&self.content_for_sender),
            Role::Recipient => Some(&self.content_for_recipient),
        }
    }

    /// The participant other than `account`.
    pub fn peer_of(&self, account: AccountId) -> Option<AccountId> {
        match self.role_of(account)? {
            Role::Sender => Some(self.recipient_id),
            Role::Recipient => Some(self.sender_id),
        }
    }
}

/// Account creation input.
///
/// The client generates the key pair and wraps the private key before
/// submitting; the server never sees the raw private key.
#[derive(Clone)]
pub struct RegistrationRequest {
    /// Desired username
    pub username: String,
    /// Contact email
    pub email: String,
    /// Login password, hashed before storage
    pub password: Zeroizing<String>,
    /// SPKI PEM
    pub public_key: String,
    /// Vault blob of the matching private key
    pub wrapped_private_key: String,
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Message send input. Both ciphertexts are produced by the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    /// Must be the authenticated account
    pub sender_id: AccountId,
    /// Must exist and differ from the sender
    pub recipient_id: AccountId,
    /// Base64 ciphertext for the recipient
    pub content_for_recipient: String,
    /// Base64 ciphertext for the sender
    pub content_for_sender: String,
}

/// Identity and unwrapped key material of an authenticated session.
#[derive(Clone)]
pub struct SessionPrincipal {
    /// Account id
    pub id: AccountId,
    /// Username
    pub username: String,
    /// SPKI PEM
    pub public_key: String,
    /// Unwrapped PKCS#8 PEM. Never persisted.
    pub private_key: Zeroizing<String>,
}

impl fmt::Debug for SessionPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionPrincipal")
            .field("id", &self.id)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Result of a public key lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyRecord {
    /// Account id
    pub id: AccountId,
    /// Username
    pub username: String,
    /// SPKI PEM
    pub public_key: String,
}

/// Result of a wrapped private key lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKeyRecord {
    /// Username
    pub username: String,
    /// Vault blob
    pub wrapped_private_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> Message {
        Message {
            id: MessageId(1),
            sender_id: AccountId(10),
            recipient_id: AccountId(20),
            content_for_recipient: "for-recipient".into(),
            content_for_sender: "for-sender".into(),
            timestamp_ms: 0,
        }
    }

    #[test]
    fn id_display_and_parse() {
        let id = AccountId(0xabc);
        let text = id.to_string();
        assert_eq!(text, "00000000000000000000000000000abc");
        assert_eq!(text.parse::<AccountId>(), Ok(id));
        assert_eq!("abc".parse::<AccountId>(), Err(ParseIdError));
        assert_eq!("z".repeat(32).parse::<MessageId>(), Err(ParseIdError));
    }

    #[test]
    fn ciphertext_follows_role() {
        let message = message();
        assert_eq!(message.role_of(AccountId(10)), Some(Role::Sender));
        assert_eq!(message.ciphertext_for(AccountId(10)), Some("for-sender"));
        assert_eq!(message.ciphertext_for(AccountId(20)), Some("for-recipient"));
        assert_eq!(message.ciphertext_for(AccountId(30)), None);
        assert_eq!(message.peer_of(AccountId(20)), Some(AccountId(10)));
    }

    #[test]
    fn debug_redacts_secrets() {
        let account = Account {
            id: AccountId(1),
            username: "alice".into(),
            email: "alice@example.com".into(),
            credential_hash: "$argon2id$secret-hash".into(),
            public_key: "pub".into(),
            wrapped_private_key: "wrapped-blob".into(),
            created_at_ms: 0,
        };
        let rendered = format!("{account:?}");
        assert!(!rendered.contains("secret-hash"));
        assert!(!rendered.contains("wrapped-blob"));

        let principal = SessionPrincipal {
            id: AccountId(1),
            username: "alice".into(),
            public_key: "pub".into(),
            private_key: Zeroizing::new("PRIVATE KEY material".into()),
        };
        assert!(!format!("{principal:?}").contains("material"));

        let request = RegistrationRequest {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: Zeroizing::new("hunter2".into()),
            public_key: "pub".into(),
            wrapped_private_key: "blob".into(),
        };
        assert!(!format!("{request:?}").contains("hunter2"));
    }

    #[test]
    fn summary_omits_key_material() {
        let account = Account {
            id: AccountId(7),
            username: "bob".into(),
            email: "bob@example.com".into(),
            credential_hash: "hash".into(),
            public_key: "pub".into(),
            wrapped_private_key: "blob".into(),
            created_at_ms: 5,
        };
        let summary = account.summary();
        assert_eq!(summary.id, AccountId(7));
        assert_eq!(summary.public_key, "pub");
    }
}
