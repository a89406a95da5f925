//! Persistent storage layer for sealchain.
//!
//! This crate provides the storage backend for the ledger:
//! - Block records, one JSON file per block
//! - Atomic record writes and the single-writer lock
//! - The in-memory chain mirrored with those files
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Application Layer                     │
//! │             (Ledger, CLI, Inspection, Verifier)          │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │                   Storage Layer                          │
//! │  ┌──────────────────────┐  ┌──────────────────────────┐  │
//! │  │ ChainStore           │  │ BlockDir                 │  │
//! │  │  - Genesis           │  │  - block_{i}.json files  │  │
//! │  │  - Append            │  │  - numeric ordering      │  │
//! │  │  - Reload            │  │  - atomic rename, lock   │  │
//! │  └──────────────────────┘  └──────────────────────────┘  │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │                    File System                           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use sealchain_core::{AesGcmCipher, SymmetricKey};
//! use sealchain_storage::{BlockDir, ChainStore};
//! use serde_json::json;
//!
//! let cipher = AesGcmCipher::new(&SymmetricKey::generate()).unwrap();
//!
//! let dir = BlockDir::open("./blockchain_data").unwrap();
//! let mut chain = ChainStore::new(dir);
//! chain.initialize(&cipher).unwrap();
//! chain.append(&[json!({"file": "a.txt", "action": "modified"})], &cipher).unwrap();
//! ```

pub mod chain;
pub mod db;

// Re-export commonly used types
pub use chain::ChainStore;
pub use db::{BlockDir, Result, StorageError, WriterLock};
