//! Hybrid encryption of structured payloads.
//!
//! 1. Generate a fresh 256-bit content key
//! 2. Encrypt the canonical JSON of the payload with AES-256-GCM
//! 3. Wrap the content key with RSA-OAEP/SHA-256
//!
//! Both outputs are base64 so the payload survives JSON and text columns.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::canonical;
use crate::crypto;
use crate::error::EnvelopeError;
use crate::keys;

/// An encrypted payload plus its wrapped content key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridPayload {
    /// base64(nonce || ciphertext || tag)
    pub encrypted_data: String,
    /// base64(RSA-OAEP(content key))
    pub encrypted_key: String,
}

/// Encrypt `payload` for the holder of `public_pem`'s private key.
pub fn encrypt<T: Serialize + ?Sized>(
    payload: &T,
    public_pem: &str,
) -> Result<HybridPayload, EnvelopeError> {
    let public_key = keys::parse_public_pem(public_pem)?;
    let plaintext = Zeroizing::new(canonical::to_canonical_bytes(payload)?);

    let content_key = crypto::generate_content_key()?;
    let sealed = crypto::aead_encrypt(&content_key, &plaintext)?;
    let wrapped = crypto::wrap_key(&public_key, &content_key)?;

    debug!(bytes = plaintext.len(), "hybrid payload encrypted");
    Ok(HybridPayload {
        encrypted_data: STANDARD.encode(sealed),
        encrypted_key: STANDARD.encode(wrapped),
    })
}

/// Decrypt a [`HybridPayload`] and deserialize it into `T`.
///
/// Either the whole payload is recovered or the call fails with
/// `DecryptionFailure`.
pub fn decrypt<T: DeserializeOwned>(
    payload: &HybridPayload,
    private_pem: &str,
) -> Result<T, EnvelopeError> {
    let private_key = keys::parse_private_pem(private_pem)?;

    let result = open_payload(payload, &private_key);

    if result.is_err() {
        warn!("hybrid payload failed to decrypt");
    }
    result
}

fn open_payload<T: DeserializeOwned>(
    payload: &HybridPayload,
    private_key: &keys::PrivateKey,
) -> Result<T, EnvelopeError> {
    let wrapped = STANDARD
        .decode(&payload.encrypted_key)
        .map_err(|_| EnvelopeError::DecryptionFailure)?;
    let sealed = STANDARD
        .decode(&payload.encrypted_data)
        .map_err(|_| EnvelopeError::DecryptionFailure)?;

    let content_key = crypto::unwrap_key(private_key, &wrapped)?;
    let plaintext = crypto::aead_decrypt(&content_key, &sealed)?;
    serde_json::from_slice(&plaintext).map_err(|_| EnvelopeError::DecryptionFailure)
}
