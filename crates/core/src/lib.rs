//! Core ledger primitives for sealchain.
//!
//! This crate provides the fundamental types used throughout the ledger:
//! - SHA-256 hex digests
//! - Merkle roots and proofs over opaque payloads
//! - Blocks and their persisted records
//! - Canonical text of plaintext records
//! - Payload encryption and key material

pub mod block;
pub mod canonical;
pub mod cipher;
pub mod hash;
pub mod key;
pub mod merkle;

// Re-export commonly used types at the crate root
pub use block::{genesis_transactions, Block, BlockRecord, GENESIS_PREVIOUS_HASH};
pub use canonical::{float_repr, to_canonical_string};
pub use cipher::{AesGcmCipher, CryptoError, Decryptor, Encryptor};
pub use hash::{digest, digest_concat};
pub use key::{KeyProvider, SymmetricKey};
pub use merkle::{compute_root, verify_proof, MerkleProof, MerkleTree};
