//! RSA key pair generation and PEM handling.
//!
//! This module owns two responsibilities:
//! 1. Generating the session's RSA key pair and encoding it as PEM.
//! 2. Parsing PEM strings back into `rsa` key types for the crypto layer.
//!
//! Encodings written: SPKI (`BEGIN PUBLIC KEY`) and PKCS#8
//! (`BEGIN PRIVATE KEY`). Encodings accepted: the above plus PKCS#1
//! (`BEGIN RSA PUBLIC KEY` / `BEGIN RSA PRIVATE KEY`), which is what most
//! JavaScript toolkits emit.

use std::fmt;

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::EnvelopeError;

/// Smallest modulus accepted for generation.
pub const MIN_RSA_BITS: usize = 2048;

/// Public exponent for every generated key.
pub const PUBLIC_EXPONENT: u32 = 65_537;

/// The session's asymmetric key pair, as PEM strings.
///
/// - Immutable once generated.
/// - Zeroised on drop. The private PEM never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    public_key: String,
    private_key: String,
}

impl KeyPair {
    /// Assemble a pair from PEM strings, checking that both parse and that
    /// they belong together.
    pub fn from_pem(public_key: String, private_key: String) -> Result<Self, EnvelopeError> {
        let public = parse_public_pem(&public_key)?;
        let private = parse_private_pem(&private_key)?;
        if RsaPublicKey::from(&private) != public {
            return Err(EnvelopeError::InvalidKey);
        }
        Ok(Self {
            public_key,
            private_key,
        })
    }

    /// The SPKI PEM public key. Safe to share.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// The PKCS#8 PEM private key. Stays inside the originating process.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Generate a fresh RSA key pair with the given modulus size.
///
/// Errors with `KeyGeneration` if `bits` is below [`MIN_RSA_BITS`] or the
/// provider fails. Generation is slow (hundreds of milliseconds at 2048
/// bits in release builds); prefer `task::get_or_create_key_pair` from async code.
pub fn generate_key_pair(bits: usize) -> Result<KeyPair, EnvelopeError> {
    if bits < MIN_RSA_BITS {
        return Err(EnvelopeError::KeyGeneration(format!(
            "modulus of {bits} bits is below the {MIN_RSA_BITS}-bit minimum"
        )));
    }

    let exponent = BigUint::from(PUBLIC_EXPONENT);
    let private = RsaPrivateKey::new_with_exp(&mut OsRng, bits, &exponent)
        .map_err(|e| EnvelopeError::KeyGeneration(e.to_string()))?;
    let public = RsaPublicKey::from(&private);

    let private_pem = private
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| EnvelopeError::KeyGeneration(e.to_string()))?;
    let public_pem = public
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| EnvelopeError::KeyGeneration(e.to_string()))?;

    Ok(KeyPair {
        public_key: public_pem,
        private_key: private_pem.as_str().to_owned(),
    })
}

/// Parse a public key from SPKI or PKCS#1 PEM.
pub(crate) fn parse_public_pem(pem: &str) -> Result<RsaPublicKey, EnvelopeError> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|_| EnvelopeError::InvalidKey)
}

/// Parsed private key, as handed to the `crypto` operations.
pub(crate) type PrivateKey = RsaPrivateKey;

/// Parse a private key from PKCS#8 or PKCS#1 PEM.
pub(crate) fn parse_private_pem(pem: &str) -> Result<PrivateKey, EnvelopeError> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|_| EnvelopeError::InvalidKey)
}

/// Modulus size of a PEM public key, in bits.
pub fn modulus_bits(public_pem: &str) -> Result<usize, EnvelopeError> {
    Ok(parse_public_pem(public_pem)?.n().bits())
}
