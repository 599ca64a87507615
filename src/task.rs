//! Awaitable wrappers around the RSA-heavy operations.
//!
//! Key generation and RSA encrypt/sign are CPU bound. These helpers move
//! them onto tokio's blocking pool so an async caller does not stall its
//! executor. Semantics are identical to the synchronous functions.

use std::sync::Arc;

use tokio::task;

use crate::booking::{BookingCore, BookingEnvelope, SealedBooking, StoredBooking};
use crate::error::EnvelopeError;
use crate::keys::KeyPair;
use crate::signature::VerificationResult;
use crate::store::KeyStore;

async fn run_blocking<T, F>(f: F) -> Result<T, EnvelopeError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, EnvelopeError> + Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| EnvelopeError::Task(e.to_string()))?
}

/// [`KeyStore::get_or_create_key_pair`] on the blocking pool.
pub async fn get_or_create_key_pair(store: Arc<KeyStore>) -> Result<KeyPair, EnvelopeError> {
    run_blocking(move || store.get_or_create_key_pair()).await
}

/// [`BookingEnvelope::seal`] on the blocking pool.
pub async fn seal(envelope: BookingEnvelope, booking: BookingCore) -> Result<SealedBooking, EnvelopeError> {
    run_blocking(move || envelope.seal(&booking)).await
}

/// [`BookingEnvelope::re_verify`] on the blocking pool.
pub async fn re_verify(
    envelope: BookingEnvelope,
    stored: StoredBooking,
) -> Result<VerificationResult, EnvelopeError> {
    run_blocking(move || envelope.re_verify(&stored)).await
}
