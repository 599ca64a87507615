//! Signed records.
//!
//! A signed record pairs a typed data object with the SHA-256 of its
//! canonical form and an RSA signature over that same canonical form.
//! Verification recomputes both from the data and returns a [`Verdict`].
//!
//! Scheme: RSASSA-PKCS1-v1_5 with SHA-256, signature base64 encoded, hash
//! hex encoded.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::canonical;
use crate::crypto;
use crate::error::EnvelopeError;
use crate::keys;

/// A record type whose canonical form can be signed.
///
/// Implementors fix the exact field set that is signed. Adding or removing
/// a field is a new schema version: old signatures will no longer verify.
pub trait Signable: Serialize {
    /// Short record kind, used in logs.
    const KIND: &'static str;
    /// Schema version of the signed field set.
    const VERSION: u32;
}

impl Signable for Value {
    const KIND: &'static str = "json";
    const VERSION: u32 = 0;
}

/// SHA-256 over the canonical serialization of `data`, hex encoded.
pub fn hash<T: Serialize + ?Sized>(data: &T) -> Result<String, EnvelopeError> {
    Ok(crypto::sha256_hex(&canonical::to_canonical_bytes(data)?))
}

/// Sign the canonical serialization of `data`. Returns base64.
pub fn sign<T: Serialize + ?Sized>(data: &T, private_pem: &str) -> Result<String, EnvelopeError> {
    let private_key = keys::parse_private_pem(private_pem)?;
    let message = canonical::to_canonical_bytes(data)?;
    let signature = crypto::rsa_sign(&private_key, &message)?;
    Ok(STANDARD.encode(signature))
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// Outcome of checking a signed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Hash (when present) and signature both check out.
    Verified,
    /// The stored hash does not match the data.
    HashMismatch,
    /// The signature is undecodable or does not match the data and key.
    InvalidSignature,
}

impl Verdict {
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Verified)
    }

    /// Human-readable reason shown next to the tamper badge.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Verified => "Message integrity and authenticity verified",
            Self::HashMismatch => "Hash mismatch - data may have been tampered",
            Self::InvalidSignature => "Invalid signature - authenticity cannot be verified",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Flattened verdict as exposed to callers and JSON consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub valid: bool,
    pub reason: String,
}

impl From<Verdict> for VerificationResult {
    fn from(verdict: Verdict) -> Self {
        Self {
            valid: verdict.is_valid(),
            reason: verdict.reason().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Signed record
// ---------------------------------------------------------------------------

/// A data object with its hash and signature.
///
/// `hash` is optional: records written before hashes were stored carry
/// only a signature, or an empty hash. For those, verification skips the
/// hash comparison and relies on the signature alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedRecord<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub signature: String,
}

impl<T: Signable> SignedRecord<T> {
    /// Hash and sign `data` with the given private key.
    pub fn create(data: T, private_pem: &str) -> Result<Self, EnvelopeError> {
        let hash = hash(&data)?;
        let signature = sign(&data, private_pem)?;
        debug!(kind = T::KIND, version = T::VERSION, "signed record created");
        Ok(Self {
            data,
            hash: Some(hash),
            signature,
        })
    }

    /// Check integrity and authenticity against `public_pem`.
    ///
    /// A mismatch is reported through the returned verdict, never as an
    /// error. Errors are reserved for an empty signature (`MalformedInput`)
    /// and an unparseable public key (`InvalidKey`).
    pub fn verify(&self, public_pem: &str) -> Result<VerificationResult, EnvelopeError> {
        Ok(self.verdict(public_pem)?.into())
    }

    /// Same as [`verify`](Self::verify) but returns the typed verdict.
    pub fn verdict(&self, public_pem: &str) -> Result<Verdict, EnvelopeError> {
        if self.signature.trim().is_empty() {
            return Err(EnvelopeError::MalformedInput("record has no signature".into()));
        }
        let public_key = keys::parse_public_pem(public_pem)?;
        let message = canonical::to_canonical_bytes(&self.data)?;

        // An empty hash column counts as no hash.
        let supplied = self.hash.as_deref().map(str::trim).filter(|h| !h.is_empty());
        if let Some(expected) = supplied {
            if crypto::sha256_hex(&message) != expected.to_ascii_lowercase() {
                warn!(kind = T::KIND, "signed record hash mismatch");
                return Ok(Verdict::HashMismatch);
            }
        }

        let signature_ok = STANDARD
            .decode(self.signature.trim())
            .map(|raw| crypto::rsa_verify(&public_key, &message, &raw))
            .unwrap_or(false);
        if !signature_ok {
            warn!(kind = T::KIND, "signed record signature rejected");
            return Ok(Verdict::InvalidSignature);
        }

        debug!(kind = T::KIND, "signed record verified");
        Ok(Verdict::Verified)
    }
}

impl<T: DeserializeOwned> SignedRecord<T> {
    /// Parse a record from JSON. Missing `data` or `signature` fields, or a
    /// `data` object of the wrong shape, is `MalformedInput`.
    pub fn from_json(text: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(text)
            .map_err(|e| EnvelopeError::MalformedInput(format!("signed record: {e}")))
    }
}
