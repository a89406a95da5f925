//! Integrity verification for sealchain ledgers.
//!
//! The verifier reads block records and recomputes merkle roots, block
//! hashes and linkage from the stored ciphertext. It has no access to the
//! encryption key.
//!
//! # Example
//!
//! ```rust,no_run
//! use sealchain_verifier::ChainVerifier;
//!
//! match ChainVerifier::verify_path("./blockchain_data") {
//!     Ok(v) => println!("{} blocks ok", v.blocks),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

pub mod verifier;

pub use verifier::{ChainVerifier, IntegrityViolation, Verified, VerifyError};
