//! Symmetric key material and explicit key selection.
//!
//! A [`KeyProvider`] names where the ledger key comes from. The caller picks
//! the variant; nothing here falls back from one source to another or saves
//! a key as a side effect of loading one.

use crate::cipher::CryptoError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a ledger key in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// A 256-bit symmetric key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    /// Generate a new random key using the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create a key from raw bytes; must be exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKey(format!("expected {} bytes, got {}", KEY_LEN, bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Encode as base64 text (the key file format).
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse from base64 text, ignoring surrounding whitespace.
    pub fn from_base64(s: &str) -> Result<Self, CryptoError> {
        let mut bytes = STANDARD
            .decode(s.trim())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    /// Read a key file.
    pub fn load(path: &Path) -> Result<Self, CryptoError> {
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CryptoError::KeyMissing(path.to_path_buf()),
            _ => CryptoError::Io(e),
        })?;
        Self::from_base64(&contents)
    }

    /// Write a new key file. Never overwrites an existing one.
    pub fn save(&self, path: &Path) -> Result<(), CryptoError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => CryptoError::KeyExists(path.to_path_buf()),
                _ => CryptoError::Io(e),
            })?;
        file.write_all(self.to_base64().as_bytes())?;
        file.sync_all()?;
        Ok(())
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SymmetricKey {}

/// Where the ledger key comes from.
#[derive(Clone)]
pub enum KeyProvider {
    /// Generate a fresh key and write it to the path (fails if it exists).
    GenerateAndPersist(PathBuf),
    /// Read an existing key file.
    LoadFromPath(PathBuf),
    /// Use key bytes supplied by the caller.
    UseProvidedKey(Vec<u8>),
}

impl KeyProvider {
    /// Produce the key this provider names.
    pub fn resolve(&self) -> Result<SymmetricKey, CryptoError> {
        match self {
            KeyProvider::GenerateAndPersist(path) => {
                let key = SymmetricKey::generate();
                key.save(path)?;
                info!(path = %path.display(), "generated new ledger key");
                Ok(key)
            }
            KeyProvider::LoadFromPath(path) => {
                let key = SymmetricKey::load(path)?;
                info!(path = %path.display(), "loaded ledger key");
                Ok(key)
            }
            KeyProvider::UseProvidedKey(bytes) => SymmetricKey::from_bytes(bytes),
        }
    }

    /// Human-readable name for this provider (for diagnostics/logging).
    pub fn provider_name(&self) -> &'static str {
        match self {
            KeyProvider::GenerateAndPersist(_) => "generate-and-persist",
            KeyProvider::LoadFromPath(_) => "load-from-path",
            KeyProvider::UseProvidedKey(_) => "provided",
        }
    }
}

impl fmt::Debug for KeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyProvider::GenerateAndPersist(path) => {
                f.debug_tuple("GenerateAndPersist").field(path).finish()
            }
            KeyProvider::LoadFromPath(path) => f.debug_tuple("LoadFromPath").field(path).finish(),
            KeyProvider::UseProvidedKey(_) => f.write_str("UseProvidedKey(..)"),
        }
    }
}

impl Drop for KeyProvider {
    fn drop(&mut self) {
        if let KeyProvider::UseProvidedKey(bytes) = self {
            bytes.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_random() {
        assert_ne!(SymmetricKey::generate(), SymmetricKey::generate());
    }

    #[test]
    fn test_from_bytes_wrong_length() {
        let result = SymmetricKey::from_bytes(&[0u8; 16]);
        assert!(matches!(result, Err(CryptoError::InvalidKey(_))));
    }

    #[test]
    fn test_base64_roundtrip() {
        let key = SymmetricKey::generate();
        let parsed = SymmetricKey::from_base64(&format!("{}\n", key.to_base64())).unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn test_debug_hides_material() {
        let key = SymmetricKey::from_bytes(&[7u8; KEY_LEN]).unwrap();
        assert_eq!(format!("{:?}", key), "SymmetricKey(..)");
        let provider = KeyProvider::UseProvidedKey(vec![7u8; KEY_LEN]);
        assert_eq!(format!("{:?}", provider), "UseProvidedKey(..)");
    }

    #[test]
    fn test_generate_and_persist_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.key");

        let generated = KeyProvider::GenerateAndPersist(path.clone()).resolve().unwrap();
        let loaded = KeyProvider::LoadFromPath(path).resolve().unwrap();
        assert_eq!(generated, loaded);
    }

    #[test]
    fn test_generate_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.key");

        KeyProvider::GenerateAndPersist(path.clone()).resolve().unwrap();
        let result = KeyProvider::GenerateAndPersist(path).resolve();
        assert!(matches!(result, Err(CryptoError::KeyExists(_))));
    }

    #[test]
    fn test_load_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.key");

        let result = KeyProvider::LoadFromPath(path.clone()).resolve();
        assert!(matches!(result, Err(CryptoError::KeyMissing(p)) if p == path));
        assert!(!path.exists());
    }

    #[test]
    fn test_provided_key() {
        let key = KeyProvider::UseProvidedKey(vec![1u8; KEY_LEN]).resolve().unwrap();
        assert_eq!(key.as_bytes(), &[1u8; KEY_LEN]);

        let bad = KeyProvider::UseProvidedKey(vec![1u8; 3]).resolve();
        assert!(matches!(bad, Err(CryptoError::InvalidKey(_))));
    }
}
