//! Chain integrity rules.
//!
//! Every check here runs over the stored ciphertext and stored digests. The
//! verifier is never handed a key or a decryptor, so a swapped or edited
//! payload is caught even by an operator who cannot read it.

use sealchain_core::{compute_root, Block, BlockRecord, GENESIS_PREVIOUS_HASH};
use sealchain_storage::{BlockDir, StorageError};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A tampered or corrupted block, with the index of the first bad record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    #[error("merkle root mismatch at block {index} (stored {stored:?}, computed {computed:?})")]
    MerkleMismatch {
        index: u64,
        stored: Option<String>,
        computed: Option<String>,
    },

    #[error("block hash mismatch at block {index} (stored {stored}, computed {computed})")]
    HashMismatch {
        index: u64,
        stored: String,
        computed: String,
    },

    #[error("previous hash mismatch at block {index} (expected {expected}, found {found})")]
    LinkageBreak {
        index: u64,
        expected: String,
        found: String,
    },
}

impl IntegrityViolation {
    /// Index of the offending block.
    pub fn index(&self) -> u64 {
        match self {
            Self::MerkleMismatch { index, .. }
            | Self::HashMismatch { index, .. }
            | Self::LinkageBreak { index, .. } => *index,
        }
    }

    /// Short name of the violated rule.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MerkleMismatch { .. } => "merkle-mismatch",
            Self::HashMismatch { .. } => "hash-mismatch",
            Self::LinkageBreak { .. } => "linkage-break",
        }
    }
}

/// Errors from verifying a block directory.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Integrity(#[from] IntegrityViolation),

    #[error("could not read chain: {0}")]
    Storage(#[from] StorageError),
}

impl VerifyError {
    /// The integrity violation, if this is one.
    pub fn violation(&self) -> Option<&IntegrityViolation> {
        match self {
            Self::Integrity(v) => Some(v),
            Self::Storage(_) => None,
        }
    }
}

/// Summary of a chain that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    /// Number of blocks checked.
    pub blocks: usize,
    /// Hash of the last block, `None` for an empty directory.
    pub head_hash: Option<String>,
}

/// Stateless chain verifier.
pub struct ChainVerifier;

impl ChainVerifier {
    /// Check one record against the hash its predecessor committed to.
    ///
    /// Rules run in a fixed order: merkle root, then block hash, then
    /// linkage. The first failing rule is reported.
    pub fn verify_record(
        index: u64,
        record: &BlockRecord,
        expected_previous_hash: &str,
    ) -> Result<(), IntegrityViolation> {
        let computed_root = compute_root(&record.transactions);
        if computed_root != record.merkle_root {
            return Err(IntegrityViolation::MerkleMismatch {
                index,
                stored: record.merkle_root.clone(),
                computed: computed_root,
            });
        }

        let computed_hash = Block::compute_hash(
            record.timestamp,
            &record.previous_hash,
            record.merkle_root.as_deref(),
        );
        if computed_hash != record.hash {
            return Err(IntegrityViolation::HashMismatch {
                index,
                stored: record.hash.clone(),
                computed: computed_hash,
            });
        }

        if record.previous_hash != expected_previous_hash {
            return Err(IntegrityViolation::LinkageBreak {
                index,
                expected: expected_previous_hash.to_owned(),
                found: record.previous_hash.clone(),
            });
        }

        Ok(())
    }

    /// Walk records in order, stopping at the first violation.
    ///
    /// Records must already be in ascending index order starting at
    /// genesis.
    pub fn verify_records<'a, I>(records: I) -> Result<Verified, IntegrityViolation>
    where
        I: IntoIterator<Item = (u64, &'a BlockRecord)>,
    {
        let mut expected_previous_hash = GENESIS_PREVIOUS_HASH.to_owned();
        let mut blocks = 0;

        for (index, record) in records {
            if let Err(violation) = Self::verify_record(index, record, &expected_previous_hash) {
                warn!(index, kind = violation.kind(), "integrity violation");
                return Err(violation);
            }
            debug!(index, hash = %record.hash, "block verified");

            expected_previous_hash = record.hash.clone();
            blocks += 1;
        }

        let head_hash = (blocks > 0).then_some(expected_previous_hash);
        Ok(Verified { blocks, head_hash })
    }

    /// Verify every record in a block directory.
    pub fn verify(dir: &BlockDir) -> Result<Verified, VerifyError> {
        let records = dir.records()?;
        let verified = Self::verify_records(records.iter().map(|(i, r)| (*i, r)))?;

        info!(
            dir = %dir.path().display(),
            blocks = verified.blocks,
            "chain verified"
        );
        Ok(verified)
    }

    /// Verify the block directory at `path` without creating it.
    pub fn verify_path<P: AsRef<Path>>(path: P) -> Result<Verified, VerifyError> {
        let dir = BlockDir::open_existing(path)?;
        Self::verify(&dir)
    }

    /// Verify blocks already held in memory, genesis first.
    pub fn verify_blocks(blocks: &[Block]) -> Result<Verified, IntegrityViolation> {
        let records: Vec<BlockRecord> = blocks.iter().map(Block::to_record).collect();
        Self::verify_records((0u64..).zip(records.iter()))
    }
}
