//! Block record files with atomic writes and a single-writer lock.
//!
//! A ledger directory holds one `block_{index}.json` file per block. Indices
//! are parsed as integers for ordering (`block_10` sorts after `block_2`).
//! Other entries (the lock file, in-flight temporary files) are ignored.

use sealchain_core::{BlockRecord, CryptoError};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, trace};

const BLOCK_FILE_PREFIX: &str = "block_";
const BLOCK_FILE_SUFFIX: &str = ".json";
const LOCK_FILE_NAME: &str = ".sealchain.lock";

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed block record {index}: {source}")]
    Json {
        index: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("encryption error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("block directory not found: {}", .0.display())]
    DirNotFound(PathBuf),

    #[error("chain is empty; initialize it before appending")]
    EmptyChain,

    #[error("block {0} is missing from the record sequence")]
    MissingBlock(u64),

    #[error("block {0} already exists")]
    BlockExists(u64),

    #[error("ledger is locked by another writer ({})", .0.display())]
    Locked(PathBuf),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A directory of block record files.
#[derive(Debug, Clone)]
pub struct BlockDir {
    root: PathBuf,
}

impl BlockDir {
    /// Open a block directory, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        fs::create_dir_all(path.as_ref())?;
        Ok(Self {
            root: path.as_ref().to_path_buf(),
        })
    }

    /// Open an existing block directory without creating anything.
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(StorageError::DirNotFound(root));
        }
        Ok(Self { root })
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.root
    }

    // =========================================================================
    // File Naming
    // =========================================================================

    /// File name for a block index.
    /// Format: "block_{index}.json"
    pub fn block_file_name(index: u64) -> String {
        format!("{}{}{}", BLOCK_FILE_PREFIX, index, BLOCK_FILE_SUFFIX)
    }

    /// Parse the index out of a block file name.
    pub fn parse_index(file_name: &str) -> Option<u64> {
        let digits = file_name
            .strip_prefix(BLOCK_FILE_PREFIX)?
            .strip_suffix(BLOCK_FILE_SUFFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Zero-padded names never come from `block_file_name`.
        if digits.len() > 1 && digits.starts_with('0') {
            return None;
        }
        digits.parse().ok()
    }

    /// Full path of a block file.
    pub fn block_path(&self, index: u64) -> PathBuf {
        self.root.join(Self::block_file_name(index))
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Indices of all block files, ascending.
    pub fn indices(&self) -> Result<Vec<u64>> {
        let mut indices = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            match name.to_str().and_then(Self::parse_index) {
                Some(index) => indices.push(index),
                None => trace!(entry = ?name, "skipping non-block entry"),
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }

    /// Check if the directory holds no block files.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.indices()?.is_empty())
    }

    /// Check if a block file exists.
    pub fn contains(&self, index: u64) -> bool {
        self.block_path(index).is_file()
    }

    /// Read the raw bytes of a block file.
    pub fn read_raw(&self, index: u64) -> Result<Vec<u8>> {
        fs::read(self.block_path(index)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::MissingBlock(index),
            _ => StorageError::Io(e),
        })
    }

    /// Read and decode a block record.
    pub fn read(&self, index: u64) -> Result<BlockRecord> {
        let bytes = self.read_raw(index)?;
        BlockRecord::from_json_slice(&bytes).map_err(|source| StorageError::Json { index, source })
    }

    /// All records in ascending index order.
    ///
    /// Indices must run 0, 1, 2, ... without gaps; a gap is reported as
    /// [`StorageError::MissingBlock`] for the first absent index.
    pub fn records(&self) -> Result<Vec<(u64, BlockRecord)>> {
        let indices = self.indices()?;
        let mut records = Vec::with_capacity(indices.len());

        for (expected, index) in (0u64..).zip(indices) {
            if index != expected {
                return Err(StorageError::MissingBlock(expected));
            }
            records.push((index, self.read(index)?));
        }

        Ok(records)
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Write a new block record.
    ///
    /// The record is written to a temporary file in the same directory,
    /// synced, and renamed into place, so a reader sees either no file or
    /// the complete record. An existing record is never replaced.
    pub fn write(&self, index: u64, record: &BlockRecord) -> Result<()> {
        if self.contains(index) {
            return Err(StorageError::BlockExists(index));
        }

        let encoded = record.to_json_bytes()?;
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&encoded)?;
        tmp.as_file().sync_all()?;

        let target = self.block_path(index);
        tmp.persist_noclobber(&target).map_err(|e| match e.error.kind() {
            ErrorKind::AlreadyExists => StorageError::BlockExists(index),
            _ => StorageError::Io(e.error),
        })?;

        debug!(index, path = %target.display(), bytes = encoded.len(), "wrote block record");
        Ok(())
    }

    /// Take the single-writer lock for this directory.
    ///
    /// Fails with [`StorageError::Locked`] while another [`WriterLock`] on
    /// the same directory is alive. The lock is released on drop.
    pub fn lock(&self) -> Result<WriterLock> {
        let path = self.root.join(LOCK_FILE_NAME);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StorageError::Locked(path.clone()),
                _ => StorageError::Io(e),
            })?;
        writeln!(file, "{}", std::process::id())?;

        Ok(WriterLock { path, _file: file })
    }
}

/// Exclusive right to append to a [`BlockDir`].
#[derive(Debug)]
pub struct WriterLock {
    path: PathBuf,
    _file: File,
}

impl Drop for WriterLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            debug!(path = %self.path.display(), error = %e, "failed to remove lock file");
        }
    }
}
