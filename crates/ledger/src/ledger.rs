//! Main ledger orchestration.
//!
//! Brings together the key, the payload cipher and the chain store.

use crate::config::{ConfigError, LedgerConfig};
use crate::inspect::{inspect_block, InspectedBlock};
use sealchain_core::{AesGcmCipher, Block, CryptoError, KeyProvider};
use sealchain_storage::{BlockDir, ChainStore, StorageError};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("key error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot read batch file {}: {source}", path.display())]
    BatchRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("batch file {} is not JSON: {source}", path.display())]
    BatchParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("batch file {} must hold a JSON array of records", path.display())]
    InvalidBatch { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// An open ledger: its chain plus the cipher that seals new batches.
#[derive(Debug)]
pub struct Ledger {
    chain: ChainStore,
    cipher: AesGcmCipher,
}

impl Ledger {
    /// Resolve the key, open the block directory and load or create the chain.
    ///
    /// A fresh key is only ever generated for an empty ledger; asking for one
    /// over existing blocks fails with [`CryptoError::KeyMissing`].
    pub fn open(config: &LedgerConfig, keys: KeyProvider) -> Result<Self> {
        if let KeyProvider::GenerateAndPersist(path) = &keys {
            if has_blocks(&config.blocks_dir)? {
                warn!(
                    blocks_dir = %config.blocks_dir.display(),
                    key_file = %path.display(),
                    "refusing to generate a key for an existing chain"
                );
                return Err(CryptoError::KeyMissing(path.clone()).into());
            }
        }

        let key = keys.resolve()?;
        let cipher = AesGcmCipher::new(&key)?;

        let dir = BlockDir::open(&config.blocks_dir)?;
        let mut chain = ChainStore::new(dir);
        chain.initialize(&cipher)?;

        info!(
            blocks_dir = %config.blocks_dir.display(),
            key = keys.provider_name(),
            blocks = chain.len(),
            "ledger opened"
        );
        Ok(Self { chain, cipher })
    }

    /// Seal a batch of records into a new block.
    pub fn log_batch(&mut self, records: &[Value]) -> Result<&Block> {
        Ok(self.chain.append(records, &self.cipher)?)
    }

    /// Read a JSON array of records from a file and log it as one batch.
    pub fn log_file(&mut self, path: &Path) -> Result<&Block> {
        let records = read_batch(path)?;
        info!(path = %path.display(), records = records.len(), "logging batch file");
        self.log_batch(&records)
    }

    /// Decrypt every block in the chain.
    pub fn inspect(&self) -> Vec<InspectedBlock> {
        (0u64..)
            .zip(self.chain.blocks())
            .map(|(index, block)| inspect_block(index, block, &self.cipher))
            .collect()
    }

    pub fn chain(&self) -> &ChainStore {
        &self.chain
    }

    pub fn cipher(&self) -> &AesGcmCipher {
        &self.cipher
    }
}

/// True if `path` is a block directory holding at least one block.
fn has_blocks(path: &Path) -> Result<bool> {
    match BlockDir::open_existing(path) {
        Ok(dir) => Ok(!dir.is_empty()?),
        Err(StorageError::DirNotFound(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Load a batch file: a JSON array whose elements are the records.
pub fn read_batch(path: &Path) -> Result<Vec<Value>> {
    let text = fs::read_to_string(path).map_err(|source| LedgerError::BatchRead {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: Value = serde_json::from_str(&text).map_err(|source| LedgerError::BatchParse {
        path: path.to_path_buf(),
        source,
    })?;

    match doc {
        Value::Array(records) => Ok(records),
        _ => Err(LedgerError::InvalidBatch {
            path: path.to_path_buf(),
        }),
    }
}
