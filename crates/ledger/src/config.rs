//! Ledger configuration file.

use sealchain_core::KeyProvider;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default name of the configuration file in the working directory.
pub const CONFIG_FILE_NAME: &str = "sealchain.json";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the ledger keeps its blocks and key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Directory of `block_{i}.json` files.
    pub blocks_dir: PathBuf,
    /// Base64 key file.
    pub key_file: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            blocks_dir: PathBuf::from("blockchain_data"),
            key_file: PathBuf::from("key.key"),
        }
    }
}

impl LedgerConfig {
    /// Load a config file, falling back to defaults if it does not exist.
    ///
    /// Missing fields take their default values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source: std::io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        let text = serde_json::to_string_pretty(self).map_err(|e| write_err(e.into()))?;
        fs::write(path, text).map_err(write_err)
    }

    /// Key source for first-time setup: reuse the key file if present,
    /// otherwise generate one there.
    ///
    /// [`Ledger::open`](crate::Ledger::open) rejects generation when the
    /// block directory already holds a chain.
    pub fn init_key_provider(&self) -> KeyProvider {
        if self.key_file.exists() {
            KeyProvider::LoadFromPath(self.key_file.clone())
        } else {
            KeyProvider::GenerateAndPersist(self.key_file.clone())
        }
    }

    /// Key source for an existing ledger. Never creates a key.
    pub fn key_provider(&self) -> KeyProvider {
        KeyProvider::LoadFromPath(self.key_file.clone())
    }
}
