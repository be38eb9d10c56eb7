//! PIN encryption at rest.
//!
//! # Ciphertext format
//!
//! ```text
//! base64(nonce[12] ‖ aes-256-gcm(ciphertext ‖ tag[16]))
//! ```
//!
//! Standard alphabet with padding. Rows written by the earlier PIN-only
//! deployment use the same layout and decrypt unchanged.

pub mod cipher;

use std::sync::Arc;

pub use cipher::{CipherError, SecretKey, KEY_LEN};

/// Encrypts and decrypts PINs under the process-wide [`SecretKey`].
///
/// Cheap to clone; the key lives behind an `Arc`.
#[derive(Clone, Debug)]
pub struct CredentialCipher {
    key: Arc<SecretKey>,
}

impl CredentialCipher {
    pub fn new(key: SecretKey) -> Self {
        Self { key: Arc::new(key) }
    }

    /// See [`cipher::encrypt`].
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        cipher::encrypt(plaintext, self.key.as_bytes())
    }

    /// See [`cipher::decrypt`].
    pub fn decrypt(&self, encoded: &str) -> Result<String, CipherError> {
        cipher::decrypt(encoded, self.key.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instances_with_same_key_interoperate() {
        let a = CredentialCipher::new(SecretKey::from_bytes(&[1u8; KEY_LEN]).unwrap());
        let b = CredentialCipher::new(SecretKey::from_bytes(&[1u8; KEY_LEN]).unwrap());
        let sealed = a.encrypt("9876").unwrap();
        assert_eq!(b.decrypt(&sealed).unwrap(), "9876");
    }

    #[test]
    fn instances_with_different_keys_do_not() {
        let a = CredentialCipher::new(SecretKey::from_bytes(&[1u8; KEY_LEN]).unwrap());
        let b = CredentialCipher::new(SecretKey::from_bytes(&[2u8; KEY_LEN]).unwrap());
        let sealed = a.encrypt("9876").unwrap();
        assert!(matches!(b.decrypt(&sealed), Err(CipherError::Authentication)));
    }
}
