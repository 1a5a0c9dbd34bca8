//! Property-based tests for boundary validation
//!
//! 1. **Idempotence**: normalizing an already normalized value is a no-op
//! 2. **Case**: usernames differing only in case stay distinct, emails do not
//! 3. **Ids**: the hex rendering of every id parses back to the same id

use proptest::prelude::*;
use sealpost_core::{AccountId, MessageId, validate};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_username_normalization_idempotent(raw in "[A-Za-z0-9_.-]{1,64}") {
        let once = validate::username(&format!("  {raw}\t")).unwrap();
        prop_assert_eq!(&once, &raw);
        prop_assert_eq!(validate::username(&once).unwrap(), once);
    }

    #[test]
    fn prop_username_case_is_significant(raw in "[a-z]{1,32}") {
        let lower = validate::username(&raw).unwrap();
        let upper = validate::username(&raw.to_uppercase()).unwrap();
        prop_assert_ne!(lower, upper);
    }

    #[test]
    fn prop_email_case_folds(local in "[A-Za-z0-9]{1,20}", domain in "[A-Za-z]{1,20}") {
        let mixed = format!("{local}@{domain}.Example");
        let normalized = validate::email(&mixed).unwrap();
        prop_assert_eq!(&normalized, &mixed.to_lowercase());
        prop_assert_eq!(validate::email(&normalized.to_uppercase()).unwrap(), normalized);
    }

    #[test]
    fn prop_ids_render_as_fixed_width_hex(value in any::<u128>()) {
        let account = AccountId(value);
        let text = account.to_string();
        prop_assert_eq!(text.len(), 32);
        prop_assert_eq!(text.parse::<AccountId>().unwrap(), account);
        prop_assert_eq!(text.parse::<MessageId>().unwrap(), MessageId(value));
    }
}

#[test]
fn stored_records_survive_cbor_encoding() {
    let message = sealpost_core::Message {
        id: MessageId(3),
        sender_id: AccountId(1),
        recipient_id: AccountId(2),
        content_for_recipient: "cmVjaXBpZW50".into(),
        content_for_sender: "c2VuZGVy".into(),
        timestamp_ms: 1_700_000_000_000,
    };

    let mut bytes = Vec::new();
    ciborium::into_writer(&message, &mut bytes).unwrap();
    let decoded: sealpost_core::Message = ciborium::from_reader(bytes.as_slice()).unwrap();
    assert_eq!(decoded, message);
}
