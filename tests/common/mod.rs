//! Shared fixtures. RSA generation is slow, so each test binary creates at
//! most two key pairs and reuses them.
#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use ticketseal::keys::{generate_key_pair, KeyPair, MIN_RSA_BITS};
use ticketseal::store::{KeyBackend, MemoryKeyBackend};
use ticketseal::{BookingCore, KeyStore};

/// Route library logs to the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn pair_a() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| generate_key_pair(MIN_RSA_BITS).unwrap())
}

pub fn pair_b() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| generate_key_pair(MIN_RSA_BITS).unwrap())
}

/// A key store that already holds `pair`.
pub fn store_with(pair: &KeyPair) -> Arc<KeyStore> {
    let mut backend = MemoryKeyBackend::new();
    backend.save(pair).unwrap();
    Arc::new(KeyStore::with_backend(Box::new(backend), MIN_RSA_BITS))
}

pub fn sample_booking() -> BookingCore {
    BookingCore {
        id: "BK1".into(),
        user_id: "u1".into(),
        username: "alice".into(),
        movie_id: 3,
        movie_title: "Apocalypse Now".into(),
        show_id: Some(12),
        show_date: "2026-02-07".into(),
        show_time: "20:00".into(),
        hall: "Screen 3".into(),
        seats: vec!["A1".into(), "A2".into()],
        price_per_seat: Some(350),
        total_amount: 700,
        status: "confirmed".into(),
        booked_at: "2026-02-07T10:00:00Z".into(),
        payment_reference: "PAY1770458400000".into(),
        card_last4: "4242".into(),
    }
}

/// Change one character in the middle of a base64 string, keeping it
/// decodable.
pub fn flip_base64_char(text: &str) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    let i = chars.len() / 2;
    chars[i] = if chars[i] == 'A' { 'B' } else { 'A' };
    chars.into_iter().collect()
}
