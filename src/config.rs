//! Envelope configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;
use crate::keys::MIN_RSA_BITS;

/// Knobs for key generation and the QR payload.
///
/// Every field has a default, so an empty TOML document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Modulus size for generated keys. Values below 2048 are rejected at
    /// generation time.
    pub rsa_bits: usize,
    /// Where the key pair is persisted. `None` keeps it in memory only.
    pub key_file: Option<PathBuf>,
    /// Origin printed into QR payloads as the place to verify a booking.
    pub verify_origin: String,
    /// Number of signature characters kept in the QR payload.
    pub qr_signature_chars: usize,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            rsa_bits: MIN_RSA_BITS,
            key_file: None,
            verify_origin: "http://localhost:5173".to_string(),
            qr_signature_chars: 50,
        }
    }
}

impl EnvelopeConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, EnvelopeError> {
        toml::from_str(text).map_err(|e| EnvelopeError::MalformedInput(format!("config: {e}")))
    }
}
