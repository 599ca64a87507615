//! Low-level cryptographic operations.
//!
//! Every primitive operation (AEAD, RSA wrap and sign, digest) runs here.
//! `keys` owns generation and PEM parsing, and hands out the parsed key
//! types. The hybrid cipher, signed records and booking envelope encrypt,
//! sign and hash only through the functions exposed here.
//!
//! Primitive choices:
//! - **Cipher**: AES-256-GCM (authenticated encryption, `ring`)
//! - **Nonce**: 96-bit (12 bytes), generated fresh per operation via `SystemRandom`
//! - **Content key**: 256 bits, generated fresh per message
//! - **Key wrap**: RSA-OAEP with SHA-256 (`rsa`)
//! - **Signature**: RSASSA-PKCS1-v1_5 with SHA-256 (`rsa`)
//! - **Digest**: SHA-256 (`ring`)

use rand::rngs::OsRng;
use ring::aead::{self, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::digest::{self, SHA256};
use ring::rand::{SecureRandom, SystemRandom};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::EnvelopeError;

/// The AEAD algorithm used for payload encryption.
const ALGORITHM: &aead::Algorithm = &AES_256_GCM;

/// Size of the nonce in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// Size of a content-encryption key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// A nonce generated for a single encryption operation.
/// Newtype so each `Nonce` is consumed on use.
struct OwnedNonce(Nonce);

fn generate_nonce() -> Result<OwnedNonce, EnvelopeError> {
    let rng = SystemRandom::new();
    let mut buf = [0u8; NONCE_LEN];
    rng.fill(&mut buf)
        .map_err(|_| EnvelopeError::RandomnessFailure)?;
    Ok(OwnedNonce(Nonce::assume_unique_for_key(buf)))
}

/// Generate a fresh 256-bit content-encryption key.
///
/// Called once per hybrid message. Content keys are never cached or reused.
pub fn generate_content_key() -> Result<Zeroizing<[u8; KEY_LEN]>, EnvelopeError> {
    let rng = SystemRandom::new();
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    rng.fill(key.as_mut())
        .map_err(|_| EnvelopeError::RandomnessFailure)?;
    Ok(key)
}

/// Encrypt a plaintext payload using AES-256-GCM.
///
/// # Layout of returned bytes
/// ```text
/// [ nonce (12 bytes) ][ ciphertext + GCM tag ]
/// ```
pub fn aead_encrypt(key_bytes: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let unbound = UnboundKey::new(ALGORITHM, key_bytes).map_err(|_| EnvelopeError::InvalidKey)?;
    let key = LessSafeKey::new(unbound);

    let nonce = generate_nonce()?;
    let aad = aead::Aad::empty();

    let mut output = Vec::with_capacity(NONCE_LEN + plaintext.len() + ALGORITHM.tag_len());
    output.extend_from_slice(nonce.0.as_ref());
    output.extend_from_slice(plaintext);

    // Encrypts `output[NONCE_LEN..]` in place and appends the GCM tag.
    let tag = key
        .seal_in_place_separate_tag(nonce.0, aad, &mut output[NONCE_LEN..])
        .map_err(|_| EnvelopeError::EncryptionFailure)?;
    output.extend_from_slice(tag.as_ref());

    Ok(output)
}

/// Decrypt a payload produced by [`aead_encrypt`].
///
/// A wrong key or any modification of nonce, ciphertext or tag fails the GCM
/// check. The caller never receives partial plaintext.
pub fn aead_decrypt(
    key_bytes: &[u8; KEY_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
    if ciphertext.len() < NONCE_LEN + ALGORITHM.tag_len() {
        return Err(EnvelopeError::DecryptionFailure);
    }

    let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| EnvelopeError::DecryptionFailure)?;

    let unbound = UnboundKey::new(ALGORITHM, key_bytes).map_err(|_| EnvelopeError::InvalidKey)?;
    let key = LessSafeKey::new(unbound);

    let mut buffer = Zeroizing::new(sealed.to_vec());
    let plaintext_len = key
        .open_in_place(nonce, aead::Aad::empty(), buffer.as_mut_slice())
        .map_err(|_| EnvelopeError::DecryptionFailure)?
        .len();
    buffer.truncate(plaintext_len);

    Ok(buffer)
}

/// Wrap a content key with RSA-OAEP/SHA-256.
pub fn wrap_key(public_key: &RsaPublicKey, content_key: &[u8; KEY_LEN]) -> Result<Vec<u8>, EnvelopeError> {
    public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), content_key)
        .map_err(|_| EnvelopeError::EncryptionFailure)
}

/// Unwrap a content key with RSA-OAEP/SHA-256.
///
/// Fails when the private key does not belong to the wrapping public key,
/// or when the recovered key is not exactly [`KEY_LEN`] bytes.
pub fn unwrap_key(
    private_key: &RsaPrivateKey,
    wrapped: &[u8],
) -> Result<Zeroizing<[u8; KEY_LEN]>, EnvelopeError> {
    let raw = Zeroizing::new(
        private_key
            .decrypt(Oaep::new::<Sha256>(), wrapped)
            .map_err(|_| EnvelopeError::DecryptionFailure)?,
    );
    if raw.len() != KEY_LEN {
        return Err(EnvelopeError::DecryptionFailure);
    }
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&raw);
    Ok(key)
}

/// SHA-256 of `bytes`, hex encoded (lowercase).
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(digest::digest(&SHA256, bytes).as_ref())
}

/// Sign `message` with RSASSA-PKCS1-v1_5/SHA-256. The digest is computed
/// internally; callers pass the canonical bytes, not a hash.
pub fn rsa_sign(private_key: &RsaPrivateKey, message: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let signing_key = SigningKey::<Sha256>::new(private_key.clone());
    let signature = signing_key
        .try_sign(message)
        .map_err(|_| EnvelopeError::SigningFailure)?;
    Ok(signature.to_vec())
}

/// Check an RSASSA-PKCS1-v1_5/SHA-256 signature. Returns `false` for any
/// malformed or non-matching signature; never errors.
pub fn rsa_verify(public_key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> bool {
    let Ok(signature) = Signature::try_from(signature) else {
        return false;
    };
    VerifyingKey::<Sha256>::new(public_key.clone())
        .verify(message, &signature)
        .is_ok()
}
