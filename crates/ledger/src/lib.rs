//! Ledger orchestration for sealchain.
//!
//! This crate ties the pieces into a usable ledger:
//! - **Config**: where blocks and the key live
//! - **Ledger**: key resolution, batch logging, chain loading
//! - **Inspect**: per-transaction decryption for operators holding the key
//!
//! Integrity checks live in `sealchain-verifier`, which needs no key.
//!
//! # Example
//!
//! ```rust,no_run
//! use sealchain_ledger::{Ledger, LedgerConfig};
//! use serde_json::json;
//!
//! let config = LedgerConfig::default();
//! let mut ledger = Ledger::open(&config, config.init_key_provider()).unwrap();
//!
//! ledger
//!     .log_batch(&[json!({"file": "report.pdf", "action": "created"})])
//!     .unwrap();
//!
//! for block in ledger.inspect() {
//!     println!("block {}: {} failures", block.index, block.failures());
//! }
//! ```

pub mod config;
pub mod inspect;
pub mod ledger;

// Re-export commonly used types
pub use config::{ConfigError, LedgerConfig, CONFIG_FILE_NAME};
pub use inspect::{inspect_block, inspect_chain, open_transaction, InspectError, InspectedBlock};
pub use ledger::{read_batch, Ledger, LedgerError, Result};
