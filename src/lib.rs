//! # ticketseal
//!
//! Integrity envelope for ticket bookings.
//!
//! Each confirmed booking gets two artifacts: its payment details are
//! hybrid encrypted (AES-256-GCM content key wrapped with RSA-OAEP), and a
//! fixed subset of its fields is hashed (SHA-256) and signed (RSA
//! PKCS#1 v1.5). When the booking is displayed again the subset is rebuilt
//! from storage and verified, so any edit to the stored row shows up as a
//! negative verdict.
//!
//! ## Public API
//!
//! - [`store::KeyStore`]: owns the session key pair, created on first use
//! - [`hybrid`]: `encrypt` / `decrypt` of any serializable payload
//! - [`signature`]: `hash`, `sign`, [`signature::SignedRecord`] and verdicts
//! - [`booking`]: `seal` / `re_verify` and the [`booking::BookingEnvelope`] service
//! - [`task`]: async wrappers for the RSA-heavy calls
//!
//! Keys live in the same process as the data they sign. A signature
//! therefore proves that a row was not edited after sealing, not who sealed
//! it.

pub mod booking;
pub mod canonical;
pub mod config;
pub(crate) mod crypto;
pub mod encoding;
pub mod error;
pub mod hybrid;
pub mod keys;
pub mod signature;
pub mod store;
pub mod task;

pub use booking::{BookingCore, BookingEnvelope, BookingRequest, SealedBooking, StoredBooking};
pub use config::EnvelopeConfig;
pub use error::EnvelopeError;
pub use hybrid::HybridPayload;
pub use keys::KeyPair;
pub use signature::{SignedRecord, VerificationResult, Verdict};
pub use store::KeyStore;
