//! Booking envelope.
//!
//! Combines the hybrid cipher and signed records for one booking:
//!
//! - **seal** (at confirmation): encrypt the payment details with the
//!   public key, sign the fixed signable subset with the private key.
//! - **re-verify** (at display): rebuild the signable subset from the stored
//!   row and check it against the active public key.
//!
//! The signable field list and the canonical rule are a strict contract
//! between the two phases. Verification is only expected to pass while the
//! key pair that signed the booking is still the active one.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EnvelopeConfig;
use crate::encoding::QrPayload;
use crate::error::EnvelopeError;
use crate::hybrid::{self, HybridPayload};
use crate::keys::KeyPair;
use crate::signature::{self, Signable, SignedRecord, VerificationResult};
use crate::store::KeyStore;

/// A booking as assembled at confirmation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCore {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub movie_id: u64,
    pub movie_title: String,
    pub show_id: Option<u64>,
    pub show_date: String,
    pub show_time: String,
    pub hall: String,
    pub seats: Vec<String>,
    pub price_per_seat: Option<u64>,
    pub total_amount: u64,
    pub status: String,
    pub booked_at: String,
    pub payment_reference: String,
    pub card_last4: String,
}

/// What the customer picked before confirming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub user_id: String,
    pub username: String,
    pub movie_id: u64,
    pub movie_title: String,
    pub show_id: u64,
    pub show_date: String,
    pub show_time: String,
    pub hall: String,
    pub seats: Vec<String>,
    pub price_per_seat: u64,
    pub card_last4: String,
}

impl BookingCore {
    /// Confirm a request at `now`: assigns the booking id and payment
    /// reference, totals the seats and stamps `booked_at` (RFC 3339, UTC,
    /// millisecond precision). A total that does not fit in `u64` is
    /// `MalformedInput`.
    pub fn confirm(request: BookingRequest, now: DateTime<Utc>) -> Result<Self, EnvelopeError> {
        let millis = now.timestamp_millis();
        let total_amount = request
            .price_per_seat
            .checked_mul(request.seats.len() as u64)
            .ok_or_else(|| {
                EnvelopeError::MalformedInput(format!(
                    "total for {} seats at {} overflows",
                    request.seats.len(),
                    request.price_per_seat
                ))
            })?;
        Ok(Self {
            id: format!("BK{millis}"),
            user_id: request.user_id,
            username: request.username,
            movie_id: request.movie_id,
            movie_title: request.movie_title,
            show_id: Some(request.show_id),
            show_date: request.show_date,
            show_time: request.show_time,
            hall: request.hall,
            seats: request.seats,
            price_per_seat: Some(request.price_per_seat),
            total_amount,
            status: "confirmed".to_string(),
            booked_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            payment_reference: format!("PAY{millis}"),
            card_last4: request.card_last4,
        })
    }

    /// The signed subset (schema v1).
    pub fn signable(&self) -> BookingSignableFields {
        BookingSignableFields::from(self)
    }

    /// The sensitive sub-object that gets hybrid encrypted.
    pub fn payment(&self) -> PaymentDetails {
        PaymentDetails {
            payment_reference: self.payment_reference.clone(),
            card_last4: self.card_last4.clone(),
            amount: self.total_amount,
        }
    }
}

/// Exactly the booking fields covered by the signature.
///
/// Every field here must be reconstructable from the stored row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSignableFields {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub movie_id: u64,
    pub movie_title: String,
    pub show_date: String,
    pub show_time: String,
    pub hall: String,
    pub seats: Vec<String>,
    pub total_amount: u64,
    pub status: String,
    pub booked_at: String,
}

impl Signable for BookingSignableFields {
    const KIND: &'static str = "booking";
    const VERSION: u32 = 1;
}

impl BookingSignableFields {
    /// The one place the v1 field list is spelled out. Both the sealing side
    /// and the re-verification side go through here.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: &str,
        user_id: &str,
        username: &str,
        movie_id: u64,
        movie_title: &str,
        show_date: &str,
        show_time: &str,
        hall: &str,
        seats: &[String],
        total_amount: u64,
        status: &str,
        booked_at: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            movie_id,
            movie_title: movie_title.to_string(),
            show_date: show_date.to_string(),
            show_time: show_time.to_string(),
            hall: hall.to_string(),
            seats: seats.to_vec(),
            total_amount,
            status: status.to_string(),
            booked_at: booked_at.to_string(),
        }
    }
}

impl From<&BookingCore> for BookingSignableFields {
    fn from(b: &BookingCore) -> Self {
        Self::new(
            &b.id,
            &b.user_id,
            &b.username,
            b.movie_id,
            &b.movie_title,
            &b.show_date,
            &b.show_time,
            &b.hall,
            &b.seats,
            b.total_amount,
            &b.status,
            &b.booked_at,
        )
    }
}

impl From<&StoredBooking> for BookingSignableFields {
    fn from(row: &StoredBooking) -> Self {
        Self::new(
            &row.booking_id,
            &row.user_id,
            &row.username,
            row.movie_id,
            &row.movie_title,
            &row.show_date,
            &row.show_time,
            &row.hall,
            &row.seats,
            row.total_amount,
            &row.status,
            &row.booked_at,
        )
    }
}

/// Payment data that never leaves the envelope in the clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub payment_reference: String,
    pub card_last4: String,
    pub amount: u64,
}

/// The artifacts persisted alongside a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedBooking {
    pub encrypted_payment: HybridPayload,
    pub signature: String,
    pub hash: String,
}

/// A booking row as the persistence layer returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBooking {
    pub booking_id: String,
    pub user_id: String,
    pub username: String,
    pub movie_id: u64,
    pub movie_title: String,
    pub show_date: String,
    pub show_time: String,
    pub hall: String,
    pub seats: Vec<String>,
    pub total_amount: u64,
    pub encrypted_payment: Option<HybridPayload>,
    pub signature: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub qr_code: Option<String>,
    pub status: String,
    pub booked_at: String,
}

impl StoredBooking {
    /// Rebuild the signed subset from the row's own columns.
    pub fn signable(&self) -> BookingSignableFields {
        BookingSignableFields::from(self)
    }

    /// The signed record implied by this row. `MalformedInput` if the row
    /// carries no signature.
    pub fn signed_record(&self) -> Result<SignedRecord<BookingSignableFields>, EnvelopeError> {
        let signature = self
            .signature
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                EnvelopeError::MalformedInput(format!("booking {} has no signature", self.booking_id))
            })?;
        Ok(SignedRecord {
            data: self.signable(),
            hash: self.hash.clone(),
            signature,
        })
    }
}

/// Encrypt the payment details and sign the booking with `keys`.
pub fn seal(booking: &BookingCore, keys: &KeyPair) -> Result<SealedBooking, EnvelopeError> {
    let encrypted_payment = hybrid::encrypt(&booking.payment(), keys.public_key())?;
    let record = SignedRecord::create(booking.signable(), keys.private_key())?;
    let hash = match record.hash {
        Some(hash) => hash,
        None => signature::hash(&record.data)?,
    };

    debug!(booking_id = %booking.id, "booking sealed");
    Ok(SealedBooking {
        encrypted_payment,
        signature: record.signature,
        hash,
    })
}

/// Verify a stored booking against `public_pem`.
pub fn re_verify(stored: &StoredBooking, public_pem: &str) -> Result<VerificationResult, EnvelopeError> {
    let result = stored.signed_record()?.verify(public_pem)?;
    if !result.valid {
        warn!(booking_id = %stored.booking_id, reason = %result.reason, "booking failed verification");
    }
    Ok(result)
}

// ---------------------------------------------------------------------------
// Service object
// ---------------------------------------------------------------------------

/// Booking envelope bound to a key store.
///
/// Always signs and verifies with the store's active pair; never creates
/// ad hoc keys per booking.
#[derive(Debug, Clone)]
pub struct BookingEnvelope {
    keys: Arc<KeyStore>,
    config: EnvelopeConfig,
}

impl BookingEnvelope {
    pub fn new(keys: Arc<KeyStore>, config: EnvelopeConfig) -> Self {
        Self { keys, config }
    }

    pub fn key_store(&self) -> &Arc<KeyStore> {
        &self.keys
    }

    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    /// Seal `booking` with the active key pair.
    pub fn seal(&self, booking: &BookingCore) -> Result<SealedBooking, EnvelopeError> {
        let pair = self.keys.get_or_create_key_pair()?;
        seal(booking, &pair)
    }

    /// Build the row the persistence layer stores for a sealed booking.
    pub fn into_stored(&self, booking: &BookingCore, sealed: SealedBooking) -> Result<StoredBooking, EnvelopeError> {
        let qr = self.qr_payload(&booking.id, &sealed.signature).to_json()?;
        Ok(StoredBooking {
            booking_id: booking.id.clone(),
            user_id: booking.user_id.clone(),
            username: booking.username.clone(),
            movie_id: booking.movie_id,
            movie_title: booking.movie_title.clone(),
            show_date: booking.show_date.clone(),
            show_time: booking.show_time.clone(),
            hall: booking.hall.clone(),
            seats: booking.seats.clone(),
            total_amount: booking.total_amount,
            encrypted_payment: Some(sealed.encrypted_payment),
            signature: Some(sealed.signature),
            hash: Some(sealed.hash),
            qr_code: Some(qr),
            status: booking.status.clone(),
            booked_at: booking.booked_at.clone(),
        })
    }

    /// Verify a stored booking against the active public key.
    pub fn re_verify(&self, stored: &StoredBooking) -> Result<VerificationResult, EnvelopeError> {
        let public_pem = self.keys.public_key()?;
        re_verify(stored, &public_pem)
    }

    /// Verify every signed booking, keyed by booking id. Rows without a
    /// signature are skipped.
    pub fn verify_all(
        &self,
        bookings: &[StoredBooking],
    ) -> Result<BTreeMap<String, VerificationResult>, EnvelopeError> {
        let public_pem = self.keys.public_key()?;
        let mut results = BTreeMap::new();
        for booking in bookings {
            if booking.signature.as_deref().map_or(true, |s| s.trim().is_empty()) {
                continue;
            }
            results.insert(booking.booking_id.clone(), re_verify(booking, &public_pem)?);
        }
        let invalid = results.values().filter(|r| !r.valid).count();
        info!(checked = results.len(), invalid, "batch verification finished");
        Ok(results)
    }

    /// Decrypt the payment details of a stored booking.
    pub fn decrypt_payment(&self, stored: &StoredBooking) -> Result<PaymentDetails, EnvelopeError> {
        let payload = stored.encrypted_payment.as_ref().ok_or_else(|| {
            EnvelopeError::MalformedInput(format!(
                "booking {} has no encrypted payment",
                stored.booking_id
            ))
        })?;
        let pair = self.keys.get_or_create_key_pair()?;
        hybrid::decrypt(payload, pair.private_key())
    }

    /// QR payload for a booking, using the configured origin and truncation.
    pub fn qr_payload(&self, booking_id: &str, signature: &str) -> QrPayload {
        QrPayload::new(
            booking_id,
            signature,
            &self.config.verify_origin,
            self.config.qr_signature_chars,
        )
    }
}
