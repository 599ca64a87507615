//! Error types for ticketseal.
//!
//! Every error variant is a distinct failure mode of the envelope. Error
//! messages are intentionally minimal: they signal *what* failed without
//! echoing key material or plaintext.
//!
//! A failed signature or hash check is NOT an error. Those outcomes are
//! reported as a [`crate::signature::Verdict`] and the caller branches on it.

use thiserror::Error;

/// The single error type for all ticketseal operations.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The RSA provider could not produce a key pair, or the requested
    /// modulus size is below the supported minimum. Fatal for the session.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// A PEM key could not be parsed or has the wrong type.
    #[error("invalid key")]
    InvalidKey,

    /// Encryption failed. Either the AEAD seal or the RSA-OAEP wrap errored.
    #[error("encryption failed")]
    EncryptionFailure,

    /// Decryption failed. This includes: wrong private key, corrupted or
    /// tampered ciphertext, bad encoding, or plaintext that does not
    /// deserialize into the requested type.
    #[error("decryption failed")]
    DecryptionFailure,

    /// The RSA signer rejected the key or message.
    #[error("signing failed")]
    SigningFailure,

    /// The system's random number generator failed to produce bytes.
    #[error("randomness source failed")]
    RandomnessFailure,

    /// A value could not be serialized into canonical form.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The input is structurally unusable (missing signature, bad base64,
    /// missing record fields). A caller bug, not a trust failure.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The key backend could not read or write the persisted key pair.
    #[error("key storage failed: {0}")]
    Storage(#[from] std::io::Error),

    /// A blocking crypto task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}
