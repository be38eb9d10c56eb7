//! AES-256-GCM encryption and decryption of stored PINs.
//!
//! **Every call to [`encrypt`] samples a fresh nonce before sealing.** GCM nonce
//! reuse under one key breaks both confidentiality and authentication, so there
//! is no API that accepts a caller-supplied nonce.

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The key is the wrong length (must be [`KEY_LEN`] bytes).
    #[error("invalid key length: expected {KEY_LEN} bytes, got {0}")]
    CipherInit(usize),

    /// The OS CSPRNG could not produce a nonce.
    #[error("secure random source unavailable")]
    RandomSource,

    /// The stored text is not base64, is shorter than a nonce, or the
    /// plaintext is not UTF-8.
    #[error("malformed ciphertext")]
    MalformedInput,

    /// The GCM tag did not verify: wrong key or tampered data.
    #[error("ciphertext failed authentication")]
    Authentication,
}

/// Fixed-size key buffer holding exactly [`KEY_LEN`] bytes.
///
/// Zeroed on drop and never printed.
#[derive(Clone)]
pub struct SecretKey(Box<[u8; KEY_LEN]>);

impl SecretKey {
    /// Copy `bytes` into a new key.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::CipherInit`] if `bytes` is not [`KEY_LEN`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        if bytes.len() != KEY_LEN {
            return Err(CipherError::CipherInit(bytes.len()));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

/// Encrypt `plaintext` under `key`.
///
/// Output is standard base64 of `nonce ‖ ciphertext+tag`.
///
/// # Errors
///
/// Returns [`CipherError::CipherInit`] if `key` is not [`KEY_LEN`] bytes and
/// [`CipherError::RandomSource`] if no nonce could be generated.
pub fn encrypt(plaintext: &str, key: &[u8]) -> Result<String, CipherError> {
    let cipher = build_cipher(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|_| CipherError::RandomSource)?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    // Only fails on absurd plaintext lengths.
    let sealed = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|_| CipherError::MalformedInput)?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&sealed);
    Ok(STANDARD.encode(out))
}

/// Decrypt text produced by [`encrypt`].
///
/// # Errors
///
/// Returns [`CipherError::CipherInit`] for a bad key,
/// [`CipherError::MalformedInput`] if `encoded` cannot be split into nonce and
/// payload, and [`CipherError::Authentication`] if the tag does not verify.
pub fn decrypt(encoded: &str, key: &[u8]) -> Result<String, CipherError> {
    let raw = STANDARD
        .decode(encoded)
        .map_err(|_| CipherError::MalformedInput)?;
    if raw.len() < NONCE_LEN {
        return Err(CipherError::MalformedInput);
    }
    let cipher = build_cipher(key)?;

    let (nonce_bytes, sealed) = raw.split_at(NONCE_LEN);
    let opened = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), sealed)
        .map_err(|_| CipherError::Authentication)?;

    String::from_utf8(opened).map_err(|_| CipherError::MalformedInput)
}

fn build_cipher(key: &[u8]) -> Result<Aes256Gcm, CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::CipherInit(key.len()));
    }
    Aes256Gcm::new_from_slice(key).map_err(|_| CipherError::CipherInit(key.len()))
}
