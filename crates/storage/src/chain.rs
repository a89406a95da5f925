//! In-memory chain mirrored 1:1 with the block files on disk.

use crate::db::{BlockDir, Result, StorageError};
use sealchain_core::{Block, Encryptor};
use serde_json::Value;
use tracing::{debug, info};

/// Manages the ordered block sequence and its persisted records.
///
/// The only mutation is [`ChainStore::append`]; blocks are never removed or
/// edited once committed.
#[derive(Debug)]
pub struct ChainStore {
    dir: BlockDir,
    blocks: Vec<Block>,
}

impl ChainStore {
    /// Create an uninitialized ChainStore over the given directory.
    pub fn new(dir: BlockDir) -> Self {
        Self {
            dir,
            blocks: Vec::new(),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Load the persisted chain, or create it with a genesis block.
    ///
    /// The genesis block is written only when the directory holds no block
    /// records at all.
    pub fn initialize<E>(&mut self, encryptor: &E) -> Result<()>
    where
        E: Encryptor + ?Sized,
    {
        if !self.dir.is_empty()? {
            return self.reload();
        }

        let _lock = self.dir.lock()?;
        let genesis = Block::genesis(encryptor)?;
        self.dir.write(0, &genesis.to_record())?;

        info!(
            dir = %self.dir.path().display(),
            hash = genesis.hash(),
            "created genesis block"
        );
        self.blocks = vec![genesis];
        Ok(())
    }

    /// Replace the in-memory chain with the persisted records.
    ///
    /// Stored derived fields are taken as-is; run the verifier to check them.
    pub fn reload(&mut self) -> Result<()> {
        let blocks: Vec<Block> = self
            .dir
            .records()?
            .into_iter()
            .map(|(_, record)| Block::from_record(record))
            .collect();

        info!(dir = %self.dir.path().display(), blocks = blocks.len(), "reloaded chain");
        self.blocks = blocks;
        Ok(())
    }

    // =========================================================================
    // Chain Operations
    // =========================================================================

    /// Seal a batch of plaintext records into a new block and append it.
    ///
    /// Fails with [`StorageError::EmptyChain`] if the chain was never
    /// initialized, and with [`StorageError::Locked`] if another writer
    /// holds the directory.
    pub fn append<E>(&mut self, transactions: &[Value], encryptor: &E) -> Result<&Block>
    where
        E: Encryptor + ?Sized,
    {
        let previous_hash = self.latest().ok_or(StorageError::EmptyChain)?.hash().to_owned();
        let index = self.blocks.len() as u64;

        let _lock = self.dir.lock()?;
        let block = Block::construct(transactions, previous_hash, encryptor)?;
        self.dir.write(index, &block.to_record())?;

        info!(
            index,
            hash = block.hash(),
            transactions = block.tx_count(),
            "appended block"
        );
        self.blocks.push(block);
        Ok(&self.blocks[self.blocks.len() - 1])
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All blocks, genesis first.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get the latest block.
    pub fn latest(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Get a block by its index.
    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Get the last N blocks with their indices (most recent first).
    pub fn recent(&self, count: usize) -> Vec<(usize, &Block)> {
        let recent: Vec<(usize, &Block)> =
            self.blocks.iter().enumerate().rev().take(count).collect();
        debug!(requested = count, returned = recent.len(), "recent blocks");
        recent
    }

    /// The underlying block directory.
    pub fn dir(&self) -> &BlockDir {
        &self.dir
    }
}
