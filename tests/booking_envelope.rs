mod common;

use ticketseal::booking::{self, BookingEnvelope};
use ticketseal::{EnvelopeConfig, EnvelopeError, Verdict};

use common::{flip_base64_char, init_tracing, pair_a, pair_b, sample_booking, store_with};

fn envelope() -> BookingEnvelope {
    init_tracing();
    BookingEnvelope::new(store_with(pair_a()), EnvelopeConfig::default())
}

#[test]
fn test_end_to_end_seal_and_verify() {
    let booking = sample_booking();
    let sealed = booking::seal(&booking, pair_a()).unwrap();

    let envelope = envelope();
    let mut stored = envelope.into_stored(&booking, sealed).unwrap();
    let result = booking::re_verify(&stored, pair_a().public_key()).unwrap();
    assert!(result.valid, "{}", result.reason);

    // Seat change after the fact.
    stored.seats = vec!["A1".into(), "A3".into()];
    let result = booking::re_verify(&stored, pair_a().public_key()).unwrap();
    assert!(!result.valid);
    assert_eq!(result.reason, Verdict::HashMismatch.reason());
}

#[test]
fn test_service_uses_active_pair() {
    let envelope = envelope();
    let booking = sample_booking();
    let sealed = envelope.seal(&booking).unwrap();
    let stored = envelope.into_stored(&booking, sealed).unwrap();

    assert!(envelope.re_verify(&stored).unwrap().valid);
    assert!(booking::re_verify(&stored, pair_a().public_key()).unwrap().valid);
}

#[test]
fn test_rows_without_stored_hash_still_verify() {
    let envelope = envelope();
    let booking = sample_booking();
    let sealed = envelope.seal(&booking).unwrap();
    let mut stored = envelope.into_stored(&booking, sealed).unwrap();
    stored.hash = None;
    assert!(envelope.re_verify(&stored).unwrap().valid);

    stored.total_amount = 0;
    let result = envelope.re_verify(&stored).unwrap();
    assert_eq!(result.reason, Verdict::InvalidSignature.reason());
}

#[test]
fn test_empty_stored_hash_skips_hash_check() {
    let envelope = envelope();
    let booking = sample_booking();
    let sealed = envelope.seal(&booking).unwrap();
    let mut stored = envelope.into_stored(&booking, sealed).unwrap();

    stored.hash = Some(String::new());
    let result = envelope.re_verify(&stored).unwrap();
    assert!(result.valid, "{}", result.reason);

    stored.hash = Some("   ".into());
    assert!(envelope.re_verify(&stored).unwrap().valid);

    stored.seats = vec!["A1".into(), "A3".into()];
    let result = envelope.re_verify(&stored).unwrap();
    assert_eq!(result.reason, Verdict::InvalidSignature.reason());
}

#[test]
fn test_regenerated_keys_fail_verification() {
    let booking = sample_booking();
    let signed_by_a = BookingEnvelope::new(store_with(pair_a()), EnvelopeConfig::default());
    let sealed = signed_by_a.seal(&booking).unwrap();
    let stored = signed_by_a.into_stored(&booking, sealed).unwrap();

    let now_b = BookingEnvelope::new(store_with(pair_b()), EnvelopeConfig::default());
    assert!(!now_b.re_verify(&stored).unwrap().valid);
}

#[test]
fn test_payment_decrypts_from_row() {
    let envelope = envelope();
    let booking = sample_booking();
    let sealed = envelope.seal(&booking).unwrap();
    let stored = envelope.into_stored(&booking, sealed).unwrap();

    let payment = envelope.decrypt_payment(&stored).unwrap();
    assert_eq!(payment, booking.payment());
    assert_eq!(payment.amount, 700);
}

#[test]
fn test_payment_missing_is_malformed() {
    let envelope = envelope();
    let booking = sample_booking();
    let sealed = envelope.seal(&booking).unwrap();
    let mut stored = envelope.into_stored(&booking, sealed).unwrap();
    stored.encrypted_payment = None;
    assert!(matches!(
        envelope.decrypt_payment(&stored),
        Err(EnvelopeError::MalformedInput(_))
    ));
}

#[test]
fn test_verify_all_reports_each_booking() {
    let envelope = envelope();

    let first = sample_booking();
    let mut second = sample_booking();
    second.id = "BK2".into();
    second.seats = vec!["B7".into()];
    second.total_amount = 350;
    let mut unsigned = sample_booking();
    unsigned.id = "BK3".into();

    let mut rows = Vec::new();
    for booking in [&first, &second] {
        let sealed = envelope.seal(booking).unwrap();
        rows.push(envelope.into_stored(booking, sealed).unwrap());
    }
    let sealed = envelope.seal(&unsigned).unwrap();
    let mut unsigned_row = envelope.into_stored(&unsigned, sealed).unwrap();
    unsigned_row.signature = None;
    rows.push(unsigned_row);

    rows[1].signature = rows[1].signature.as_deref().map(flip_base64_char);

    let results = envelope.verify_all(&rows).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results["BK1"].valid);
    assert_eq!(results["BK2"].reason, Verdict::InvalidSignature.reason());
    assert!(!results.contains_key("BK3"));
}

#[test]
fn test_unsigned_row_is_malformed() {
    let envelope = envelope();
    let booking = sample_booking();
    let sealed = envelope.seal(&booking).unwrap();
    let mut stored = envelope.into_stored(&booking, sealed).unwrap();
    stored.signature = Some(String::new());
    assert!(matches!(
        envelope.re_verify(&stored),
        Err(EnvelopeError::MalformedInput(_))
    ));
}

#[test]
fn test_qr_payload_in_row() {
    let config = EnvelopeConfig {
        verify_origin: "https://tickets.example".into(),
        qr_signature_chars: 20,
        ..EnvelopeConfig::default()
    };
    let envelope = BookingEnvelope::new(store_with(pair_a()), config);
    let booking = sample_booking();
    let sealed = envelope.seal(&booking).unwrap();
    let signature = sealed.signature.clone();
    let stored = envelope.into_stored(&booking, sealed).unwrap();

    let qr: serde_json::Value = serde_json::from_str(stored.qr_code.as_deref().unwrap()).unwrap();
    assert_eq!(qr["bookingId"], "BK1");
    assert_eq!(qr["verifyAt"], "https://tickets.example");
    assert_eq!(qr["signature"], format!("{}...", &signature[..20]));
}

#[test]
fn test_stored_row_survives_json() {
    let envelope = envelope();
    let booking = sample_booking();
    let sealed = envelope.seal(&booking).unwrap();
    let stored = envelope.into_stored(&booking, sealed).unwrap();

    let text = serde_json::to_string(&stored).unwrap();
    let reloaded: ticketseal::StoredBooking = serde_json::from_str(&text).unwrap();
    assert!(envelope.re_verify(&reloaded).unwrap().valid);
}
