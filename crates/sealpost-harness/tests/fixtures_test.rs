//! Fixture identities must be internally consistent: the wrapped key opens
//! with the password and belongs to the published public key.

use sealpost_crypto::{import_private_key, import_public_key, unwrap_private_key};
use sealpost_harness::TestIdentity;

#[test]
fn identity_is_consistent() {
    let alice = TestIdentity::generate("Alice", 1);

    let unwrapped = unwrap_private_key(&alice.wrapped_private_key, &alice.password).unwrap();
    assert_eq!(unwrapped.as_str(), alice.private_pem.as_str());

    let private = import_private_key(&unwrapped).unwrap();
    let public = import_public_key(&alice.public_pem).unwrap();
    assert!(private.matches(&public));

    let request = alice.registration();
    assert_eq!(request.username, "Alice");
    assert_eq!(request.email, "alice@example.com");
}

#[test]
fn generation_is_deterministic_per_seed() {
    let first = TestIdentity::generate("bob", 5);
    let second = TestIdentity::generate("bob", 5);
    assert_eq!(first.public_pem, second.public_pem);
    assert_eq!(first.wrapped_private_key, second.wrapped_private_key);
}
