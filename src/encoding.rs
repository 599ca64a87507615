//! Base64 helpers and the booking QR payload.
//!
//! The QR payload is informational only. Its signature is truncated, so it
//! cannot be used to verify anything; verification always goes back to the
//! stored booking.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EnvelopeError;

/// base64 of a value's JSON form. Strings are encoded as their raw text,
/// not as a quoted JSON string.
pub fn encode_base64<T: Serialize + ?Sized>(value: &T) -> Result<String, EnvelopeError> {
    let json = serde_json::to_value(value).map_err(|e| EnvelopeError::Serialization(e.to_string()))?;
    let text = match json {
        Value::String(s) => s,
        other => other.to_string(),
    };
    Ok(STANDARD.encode(text))
}

/// Decode base64 text. JSON content comes back parsed; anything else is
/// returned as a string value.
pub fn decode_base64(encoded: &str) -> Result<Value, EnvelopeError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| EnvelopeError::MalformedInput(format!("base64: {e}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| EnvelopeError::MalformedInput("base64 content is not UTF-8".into()))?;
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

/// Contents of the QR code printed on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub booking_id: String,
    pub signature: String,
    pub verify_at: String,
}

impl QrPayload {
    /// Keep the first `keep` characters of the signature, marked with `...`.
    pub fn new(booking_id: &str, signature: &str, verify_at: &str, keep: usize) -> Self {
        let head: String = signature.chars().take(keep).collect();
        Self {
            booking_id: booking_id.to_string(),
            signature: format!("{head}..."),
            verify_at: verify_at.to_string(),
        }
    }

    /// The JSON text encoded into the QR image.
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(|e| EnvelopeError::Serialization(e.to_string()))
    }
}
