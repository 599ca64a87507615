mod common;

use serde_json::json;
use ticketseal::booking::PaymentDetails;
use ticketseal::hybrid::{self, HybridPayload};
use ticketseal::EnvelopeError;

use common::{flip_base64_char, pair_a, pair_b};

#[test]
fn test_payment_roundtrip() {
    let keys = pair_a();
    let payment = PaymentDetails {
        payment_reference: "PAY1".into(),
        card_last4: "4242".into(),
        amount: 700,
    };

    let sealed = hybrid::encrypt(&payment, keys.public_key()).unwrap();
    let opened: PaymentDetails = hybrid::decrypt(&sealed, keys.private_key()).unwrap();
    assert_eq!(opened, payment);
}

#[test]
fn test_arbitrary_json_roundtrip() {
    let keys = pair_a();
    let payload = json!({
        "nested": { "list": [1, 2.5, null, "x"], "flag": true },
        "unicode": "Écran 3 🎬",
        "empty": {}
    });

    let sealed = hybrid::encrypt(&payload, keys.public_key()).unwrap();
    let opened: serde_json::Value = hybrid::decrypt(&sealed, keys.private_key()).unwrap();
    assert_eq!(opened, payload);
}

#[test]
fn test_mismatched_private_key_fails() {
    // Encrypt for A, decrypt with B. Must fail, never return data.
    let sealed = hybrid::encrypt(&json!({"amount": 700}), pair_a().public_key()).unwrap();
    let result: Result<serde_json::Value, _> = hybrid::decrypt(&sealed, pair_b().private_key());
    assert!(matches!(result, Err(EnvelopeError::DecryptionFailure)));
}

#[test]
fn test_tampered_data_fails() {
    let keys = pair_a();
    let mut sealed = hybrid::encrypt(&json!({"amount": 700}), keys.public_key()).unwrap();
    sealed.encrypted_data = flip_base64_char(&sealed.encrypted_data);

    let result: Result<serde_json::Value, _> = hybrid::decrypt(&sealed, keys.private_key());
    assert!(matches!(result, Err(EnvelopeError::DecryptionFailure)));
}

#[test]
fn test_swapped_wrapped_key_fails() {
    // Wrapped key from one message cannot open another message's data.
    let keys = pair_a();
    let first = hybrid::encrypt(&json!({"n": 1}), keys.public_key()).unwrap();
    let second = hybrid::encrypt(&json!({"n": 2}), keys.public_key()).unwrap();
    let mixed = HybridPayload {
        encrypted_data: first.encrypted_data,
        encrypted_key: second.encrypted_key,
    };

    let result: Result<serde_json::Value, _> = hybrid::decrypt(&mixed, keys.private_key());
    assert!(result.is_err());
}

#[test]
fn test_fresh_content_key_per_message() {
    let keys = pair_a();
    let payload = json!({"amount": 700});
    let a = hybrid::encrypt(&payload, keys.public_key()).unwrap();
    let b = hybrid::encrypt(&payload, keys.public_key()).unwrap();
    assert_ne!(a.encrypted_key, b.encrypted_key);
    assert_ne!(a.encrypted_data, b.encrypted_data);
}

#[test]
fn test_non_base64_fields_fail() {
    let keys = pair_a();
    let bogus = HybridPayload {
        encrypted_data: "not base64!".into(),
        encrypted_key: "also not".into(),
    };
    let result: Result<serde_json::Value, _> = hybrid::decrypt(&bogus, keys.private_key());
    assert!(matches!(result, Err(EnvelopeError::DecryptionFailure)));
}

#[test]
fn test_wrong_target_type_fails() {
    let keys = pair_a();
    let sealed = hybrid::encrypt(&json!(["just", "a", "list"]), keys.public_key()).unwrap();
    let result: Result<PaymentDetails, _> = hybrid::decrypt(&sealed, keys.private_key());
    assert!(matches!(result, Err(EnvelopeError::DecryptionFailure)));
}
