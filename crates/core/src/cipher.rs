//! Transaction encryption.
//!
//! Blocks are built through the narrow [`Encryptor`] trait and inspected
//! through [`Decryptor`]. Integrity checking needs neither: it only ever
//! sees ciphertext.
//!
//! [`AesGcmCipher`] seals each payload with AES-256-GCM under a fresh random
//! 96-bit nonce. The stored form is `base64(nonce || ciphertext || tag)`, so
//! every payload is plain ASCII.

use crate::key::SymmetricKey;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Length of the AES-GCM nonce prefix in bytes.
pub const NONCE_LEN: usize = 12;

/// Errors from encryption, decryption, and key handling.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    Encryption(String),
    #[error("decryption failed: {0}")]
    Decryption(String),
    #[error("key file not found: {}", .0.display())]
    KeyMissing(PathBuf),
    #[error("key file already exists: {}", .0.display())]
    KeyExists(PathBuf),
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("key I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Seals plaintext into an opaque ciphertext string.
pub trait Encryptor {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError>;
}

/// Opens ciphertext produced by a matching [`Encryptor`].
pub trait Decryptor {
    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError>;
}

impl<F> Encryptor for F
where
    F: Fn(&str) -> Result<String, CryptoError>,
{
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        self(plaintext)
    }
}

/// AES-256-GCM cipher bound to one ledger key.
#[derive(Clone)]
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl AesGcmCipher {
    /// Create a cipher for the given key.
    pub fn new(key: &SymmetricKey) -> Result<Self, CryptoError> {
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { cipher })
    }
}

impl Encryptor for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(STANDARD.encode(out))
    }
}

impl Decryptor for AesGcmCipher {
    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let raw = STANDARD
            .decode(ciphertext)
            .map_err(|e| CryptoError::Decryption(format!("invalid base64: {}", e)))?;
        if raw.len() < NONCE_LEN {
            return Err(CryptoError::Decryption(format!(
                "ciphertext too short ({} bytes)",
                raw.len()
            )));
        }

        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let opened = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| {
                CryptoError::Decryption("authentication failed (wrong key or corrupted data)".into())
            })?;

        String::from_utf8(opened)
            .map_err(|e| CryptoError::Decryption(format!("plaintext is not UTF-8: {}", e)))
    }
}

impl fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AesGcmCipher(..)")
    }
}
