//! Block and persisted block record structures.

use crate::canonical::{float_repr, to_canonical_string};
use crate::cipher::{CryptoError, Encryptor};
use crate::hash::digest_concat;
use crate::merkle::{compute_root, MerkleTree};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// The single plaintext record sealed into every genesis block.
pub fn genesis_transactions() -> Vec<Value> {
    vec![json!({"info": "Genesis Block"})]
}

/// On-disk form of a block: exactly these five fields, in this order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub timestamp: f64,
    pub transactions: Vec<String>,
    pub previous_hash: String,
    pub merkle_root: Option<String>,
    pub hash: String,
}

impl BlockRecord {
    /// Encode as pretty-printed JSON with four-space indentation.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(buf)
    }

    /// Decode from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// A sealed batch of encrypted transactions linked to its predecessor.
///
/// Fields are private: a block never changes after it is built. The derived
/// fields (`merkle_root`, `hash`) are computed by [`Block::construct`] and
/// [`Block::from_ciphertext`], and taken as given by [`Block::reconstruct`].
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    timestamp: f64,
    transactions: Vec<String>,
    previous_hash: String,
    merkle_root: Option<String>,
    hash: String,
}

impl Block {
    /// Encrypt a batch of plaintext records and seal them into a new block.
    ///
    /// Each record is encrypted from its canonical text, in order.
    pub fn construct<E>(
        transactions: &[Value],
        previous_hash: impl Into<String>,
        encryptor: &E,
    ) -> Result<Self, CryptoError>
    where
        E: Encryptor + ?Sized,
    {
        let timestamp = Self::current_timestamp();
        let sealed = transactions
            .iter()
            .map(|tx| encryptor.encrypt(&to_canonical_string(tx)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_ciphertext(sealed, previous_hash, timestamp))
    }

    /// Create the genesis block.
    pub fn genesis<E>(encryptor: &E) -> Result<Self, CryptoError>
    where
        E: Encryptor + ?Sized,
    {
        Self::construct(&genesis_transactions(), GENESIS_PREVIOUS_HASH, encryptor)
    }

    /// Build a block from already-encrypted payloads at a given time.
    pub fn from_ciphertext(
        transactions: Vec<String>,
        previous_hash: impl Into<String>,
        timestamp: f64,
    ) -> Self {
        let previous_hash = previous_hash.into();
        let merkle_root = compute_root(&transactions);
        let hash = Self::compute_hash(timestamp, &previous_hash, merkle_root.as_deref());

        Self {
            timestamp,
            transactions,
            previous_hash,
            merkle_root,
            hash,
        }
    }

    /// Rehydrate a block from stored fields without recomputing anything.
    ///
    /// The result may be inconsistent if the stored data was altered; use
    /// [`Block::verify_merkle_root`] and [`Block::verify_hash`] to check.
    pub fn reconstruct(
        transactions: Vec<String>,
        previous_hash: String,
        timestamp: f64,
        merkle_root: Option<String>,
        hash: String,
    ) -> Self {
        Self {
            timestamp,
            transactions,
            previous_hash,
            merkle_root,
            hash,
        }
    }

    /// Rehydrate from a persisted record.
    pub fn from_record(record: BlockRecord) -> Self {
        Self::reconstruct(
            record.transactions,
            record.previous_hash,
            record.timestamp,
            record.merkle_root,
            record.hash,
        )
    }

    /// Persisted form of this block.
    pub fn to_record(&self) -> BlockRecord {
        BlockRecord {
            timestamp: self.timestamp,
            transactions: self.transactions.clone(),
            previous_hash: self.previous_hash.clone(),
            merkle_root: self.merkle_root.clone(),
            hash: self.hash.clone(),
        }
    }

    /// Block hash: `digest(float_repr(timestamp) ++ previous_hash ++ merkle_root)`.
    ///
    /// The three fields are joined with no separator and an absent merkle
    /// root contributes nothing, so different field splits of the same
    /// characters hash identically. The layout is fixed by existing chains.
    pub fn compute_hash(timestamp: f64, previous_hash: &str, merkle_root: Option<&str>) -> String {
        let timestamp = float_repr(timestamp);
        digest_concat(&[timestamp.as_str(), previous_hash, merkle_root.unwrap_or("")])
    }

    /// Current Unix time in seconds, with sub-second precision.
    pub fn current_timestamp() -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_secs_f64()
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Encrypted payloads, in block order.
    pub fn transactions(&self) -> &[String] {
        &self.transactions
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn merkle_root(&self) -> Option<&str> {
        self.merkle_root.as_deref()
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Rebuild the merkle tree over this block's payloads (for proofs).
    pub fn merkle_tree(&self) -> MerkleTree {
        MerkleTree::new(&self.transactions)
    }

    /// Verify the merkle root matches the transactions.
    pub fn verify_merkle_root(&self) -> bool {
        compute_root(&self.transactions) == self.merkle_root
    }

    /// Verify the stored hash matches the other stored fields.
    pub fn verify_hash(&self) -> bool {
        Self::compute_hash(self.timestamp, &self.previous_hash, self.merkle_root()) == self.hash
    }
}

impl From<BlockRecord> for Block {
    fn from(record: BlockRecord) -> Self {
        Self::from_record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::digest;

    fn stub_encrypt(plaintext: &str) -> Result<String, CryptoError> {
        Ok(format!("enc({})", plaintext))
    }

    fn failing_encrypt(_: &str) -> Result<String, CryptoError> {
        Err(CryptoError::Encryption("no key".into()))
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis(&stub_encrypt).unwrap();

        assert!(genesis.is_genesis());
        assert_eq!(genesis.previous_hash(), "0");
        assert_eq!(genesis.transactions(), [r#"enc({"info": "Genesis Block"})"#]);
        assert_eq!(
            genesis.merkle_root(),
            Some(digest(r#"enc({"info": "Genesis Block"})"#).as_str())
        );

        let expected_hash = digest(format!(
            "{}0{}",
            float_repr(genesis.timestamp()),
            genesis.merkle_root().unwrap()
        ));
        assert_eq!(genesis.hash(), expected_hash);
    }

    #[test]
    fn test_known_hash_vector() {
        let block = Block::from_ciphertext(vec!["tx1".into()], "0", 1700000000.5);

        assert_eq!(
            block.merkle_root(),
            Some("709b55bd3da0f5a838125bd0ee20c5bfdd7caba173912d4281cae816b79a201b")
        );
        assert_eq!(
            block.hash(),
            "8c95d42c1504775a5d0de1273572e1e81fe3e1e3b7e4573af3ea6fb85e48db68"
        );
    }

    #[test]
    fn test_block_links_to_previous() {
        let genesis = Block::genesis(&stub_encrypt).unwrap();
        let next = Block::construct(&[json!({"x": 1})], genesis.hash(), &stub_encrypt).unwrap();

        assert!(!next.is_genesis());
        assert_eq!(next.previous_hash(), genesis.hash());
        assert_eq!(next.transactions(), [r#"enc({"x": 1})"#]);
        assert!(next.timestamp() >= genesis.timestamp());
    }

    #[test]
    fn test_block_hash_deterministic() {
        let a = Block::from_ciphertext(vec!["a".into(), "b".into()], "0", 42.0);
        let b = Block::from_ciphertext(vec!["a".into(), "b".into()], "0", 42.0);
        assert_eq!(a.hash(), b.hash());
        assert!(a.verify_hash());
        assert!(a.verify_merkle_root());
    }

    #[test]
    fn test_empty_block_merkle_root() {
        let block = Block::construct(&[], "0", &stub_encrypt).unwrap();

        assert_eq!(block.tx_count(), 0);
        assert_eq!(block.merkle_root(), None);
        assert!(block.verify_merkle_root());
        assert_eq!(
            block.hash(),
            digest(format!("{}0", float_repr(block.timestamp())))
        );
    }

    #[test]
    fn test_encryption_failure_propagates() {
        let result = Block::construct(&[json!({"x": 1})], "0", &failing_encrypt);
        assert!(matches!(result, Err(CryptoError::Encryption(_))));
    }

    #[test]
    fn test_dyn_encryptor() {
        let encryptor: &dyn Encryptor = &stub_encrypt;
        let block = Block::construct(&[json!("a")], "0", encryptor).unwrap();
        assert_eq!(block.transactions(), [r#"enc("a")"#]);
    }

    #[test]
    fn test_reconstruct_keeps_stored_fields() {
        let block = Block::reconstruct(
            vec!["tx".into()],
            "0".into(),
            1.0,
            Some("bogus".into()),
            "also bogus".into(),
        );

        assert_eq!(block.merkle_root(), Some("bogus"));
        assert_eq!(block.hash(), "also bogus");
        assert!(!block.verify_merkle_root());
        assert!(!block.verify_hash());
    }

    #[test]
    fn test_record_roundtrip() {
        let payloads = vec!["x".into(), "y".into(), "z".into()];
        let block = Block::from_ciphertext(payloads, "0", 1712345678.123456);
        let record = block.to_record();
        assert_eq!(Block::from(record.clone()), block);

        let bytes = record.to_json_bytes().unwrap();
        let decoded = BlockRecord::from_json_slice(&bytes).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.to_json_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_record_layout() {
        let record = BlockRecord {
            timestamp: 1.5,
            transactions: vec!["abc".into()],
            previous_hash: "0".into(),
            merkle_root: None,
            hash: "h".into(),
        };
        let text = String::from_utf8(record.to_json_bytes().unwrap()).unwrap();

        assert_eq!(
            text,
            "{\n    \"timestamp\": 1.5,\n    \"transactions\": [\n        \"abc\"\n    ],\n    \
             \"previous_hash\": \"0\",\n    \"merkle_root\": null,\n    \"hash\": \"h\"\n}"
        );
    }

    #[test]
    fn test_merkle_tree_proof_for_transaction() {
        let block = Block::from_ciphertext(vec!["a".into(), "b".into(), "c".into()], "0", 1.0);
        let tree = block.merkle_tree();
        let proof = tree.proof(2).unwrap();

        assert_eq!(tree.root(), block.merkle_root());
        assert!(crate::merkle::verify_proof(block.merkle_root().unwrap(), &proof));
    }
}
