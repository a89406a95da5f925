//! Decrypted views of stored blocks.
//!
//! Each transaction is opened on its own. A payload that fails to decrypt
//! or parse is reported in place and the rest of the block is still shown.

use sealchain_core::{verify_proof, Block, CryptoError, Decryptor};
use sealchain_storage::{BlockDir, StorageError};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a single transaction could not be shown.
#[derive(Debug, Error)]
pub enum InspectError {
    #[error(transparent)]
    Decrypt(#[from] CryptoError),

    #[error("decrypted payload is not JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A block together with its opened transactions.
#[derive(Debug)]
pub struct InspectedBlock {
    pub index: u64,
    pub block: Block,
    pub transactions: Vec<Result<Value, InspectError>>,
}

impl InspectedBlock {
    /// Number of transactions that could not be opened.
    pub fn failures(&self) -> usize {
        self.transactions.iter().filter(|tx| tx.is_err()).count()
    }

    /// True if every transaction decrypted and parsed.
    pub fn is_readable(&self) -> bool {
        self.failures() == 0
    }

    /// Check each stored payload's inclusion proof against the stored
    /// merkle root, in transaction order.
    pub fn inclusion_proofs(&self) -> Vec<bool> {
        let tree = self.block.merkle_tree();
        (0..self.block.tx_count())
            .map(|position| match (self.block.merkle_root(), tree.proof(position)) {
                (Some(root), Some(proof)) => verify_proof(root, &proof),
                _ => false,
            })
            .collect()
    }
}

/// Open one ciphertext payload into its plaintext record.
pub fn open_transaction<D>(ciphertext: &str, decryptor: &D) -> Result<Value, InspectError>
where
    D: Decryptor + ?Sized,
{
    let plaintext = decryptor.decrypt(ciphertext)?;
    Ok(serde_json::from_str(&plaintext)?)
}

/// Decrypt every transaction of a block.
pub fn inspect_block<D>(index: u64, block: &Block, decryptor: &D) -> InspectedBlock
where
    D: Decryptor + ?Sized,
{
    let transactions = block
        .transactions()
        .iter()
        .enumerate()
        .map(|(position, ciphertext)| {
            let opened = open_transaction(ciphertext, decryptor);
            if let Err(e) = &opened {
                warn!(block = index, transaction = position, error = %e, "could not open transaction");
            }
            opened
        })
        .collect();

    let inspected = InspectedBlock {
        index,
        block: block.clone(),
        transactions,
    };
    debug!(
        block = index,
        transactions = inspected.transactions.len(),
        failures = inspected.failures(),
        "inspected block"
    );
    inspected
}

/// Decrypt every transaction of every block in a directory, genesis first.
///
/// Only storage failures abort; decryption failures are kept per transaction.
pub fn inspect_chain<D>(dir: &BlockDir, decryptor: &D) -> Result<Vec<InspectedBlock>, StorageError>
where
    D: Decryptor + ?Sized,
{
    Ok(dir
        .records()?
        .into_iter()
        .map(|(index, record)| inspect_block(index, &Block::from_record(record), decryptor))
        .collect())
}
