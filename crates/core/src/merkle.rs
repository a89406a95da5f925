//! Merkle tree over opaque transaction payloads.
//!
//! Leaves are `digest(payload)`. Each parent is `digest(left ++ right)` where
//! `++` joins the two hex strings with no separator. An odd trailing node is
//! paired with itself. A single leaf is already a complete tree, so its root
//! is the leaf digest.

use crate::hash::{digest, digest_concat};

/// Compute the merkle root of an ordered sequence of payloads.
///
/// Returns `None` if the sequence is empty.
pub fn compute_root<S: AsRef<str>>(payloads: &[S]) -> Option<String> {
    let mut current_level: Vec<String> = payloads.iter().map(|p| digest(p.as_ref())).collect();

    if current_level.is_empty() {
        return None;
    }

    while current_level.len() > 1 {
        current_level = next_level(&current_level);
    }

    current_level.pop()
}

fn next_level(level: &[String]) -> Vec<String> {
    level
        .chunks(2)
        .map(|chunk| match chunk {
            [left, right] => digest_concat(&[left, right]),
            // Odd number of elements: hash the last one with itself
            [last] => digest_concat(&[last, last]),
            _ => unreachable!("chunks(2) yields one or two elements"),
        })
        .collect()
}

/// A merkle tree kept in memory for inclusion proofs.
///
/// Only the root is ever persisted; the tree is rebuilt from the payloads
/// whenever a proof is needed.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// All nodes in the tree, level by level (leaves first).
    levels: Vec<Vec<String>>,
}

/// A merkle proof for a single leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    /// Index of the leaf in the payload sequence.
    pub index: usize,
    /// The leaf digest being proven.
    pub leaf: String,
    /// Sibling digests from leaf to root.
    pub siblings: Vec<String>,
    /// Direction for each sibling (true = sibling is on the right).
    pub directions: Vec<bool>,
}

impl MerkleTree {
    /// Build a merkle tree from payloads.
    pub fn new<S: AsRef<str>>(payloads: &[S]) -> Self {
        let leaves: Vec<String> = payloads.iter().map(|p| digest(p.as_ref())).collect();
        if leaves.is_empty() {
            return Self { levels: Vec::new() };
        }

        let mut levels = vec![leaves];
        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let next = next_level(current);
            levels.push(next);
        }

        Self { levels }
    }

    /// Get the root of the merkle tree, `None` for an empty tree.
    pub fn root(&self) -> Option<&str> {
        self.levels
            .last()
            .and_then(|level| level.first())
            .map(String::as_str)
    }

    /// Get the number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map(|l| l.len()).unwrap_or(0)
    }

    /// Generate a proof for the leaf at the given index.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaf_count() {
            return None;
        }

        let leaf = self.levels[0][index].clone();
        let mut siblings = Vec::new();
        let mut directions = Vec::new();
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let is_right = idx % 2 == 0;
            let sibling_idx = if is_right { idx + 1 } else { idx - 1 };

            // Odd leaf hashes with itself
            let sibling = level.get(sibling_idx).unwrap_or(&level[idx]).clone();

            siblings.push(sibling);
            directions.push(is_right);
            idx /= 2;
        }

        Some(MerkleProof {
            index,
            leaf,
            siblings,
            directions,
        })
    }
}

/// Verify a merkle proof against a given root.
pub fn verify_proof(root: &str, proof: &MerkleProof) -> bool {
    if proof.siblings.len() != proof.directions.len() {
        return false;
    }

    let mut current = proof.leaf.clone();
    for (sibling, is_right) in proof.siblings.iter().zip(proof.directions.iter()) {
        current = if *is_right {
            digest_concat(&[&current, sibling])
        } else {
            digest_concat(&[sibling, &current])
        };
    }

    current == root
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn payloads(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("tx{}", i)).collect()
    }

    #[test]
    fn test_merkle_root_empty() {
        let empty: [&str; 0] = [];
        assert_eq!(compute_root(&empty), None);
        assert_eq!(MerkleTree::new(&empty).root(), None);
    }

    #[test]
    fn test_merkle_root_single_is_leaf_digest() {
        let root = compute_root(&["tx1"]).unwrap();
        assert_eq!(root, digest("tx1"));
    }

    #[test]
    fn test_merkle_root_two() {
        let root = compute_root(&["a", "b"]).unwrap();
        let expected = digest(format!("{}{}", digest("a"), digest("b")));
        assert_eq!(root, expected);
    }

    #[test]
    fn test_merkle_root_odd_duplicates_last() {
        let (da, db, dc) = (digest("a"), digest("b"), digest("c"));
        let left = digest(format!("{}{}", da, db));
        let right = digest(format!("{}{}", dc, dc));
        let expected = digest(format!("{}{}", left, right));

        assert_eq!(compute_root(&["a", "b", "c"]).unwrap(), expected);
    }

    #[test]
    fn test_merkle_root_four() {
        let d: Vec<String> = ["tx1", "tx2", "tx3", "tx4"].iter().map(digest).collect();
        let left = digest_concat(&[&d[0], &d[1]]);
        let right = digest_concat(&[&d[2], &d[3]]);
        let expected = digest_concat(&[&left, &right]);

        assert_eq!(compute_root(&["tx1", "tx2", "tx3", "tx4"]).unwrap(), expected);
    }

    #[test]
    fn test_merkle_root_order_matters() {
        let forward = payloads(4);
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_ne!(compute_root(&forward), compute_root(&reversed));
    }

    #[test]
    fn test_merkle_tree_root_matches() {
        for n in 1..=9 {
            let p = payloads(n);
            let tree = MerkleTree::new(&p);
            assert_eq!(tree.root().map(str::to_owned), compute_root(&p), "n = {}", n);
            assert_eq!(tree.leaf_count(), n);
        }
    }

    #[test]
    fn test_merkle_proof_valid() {
        let p = payloads(8);
        let tree = MerkleTree::new(&p);
        let root = tree.root().unwrap().to_owned();

        for i in 0..p.len() {
            let proof = tree.proof(i).unwrap();
            assert_eq!(proof.leaf, digest(&p[i]));
            assert!(verify_proof(&root, &proof));
        }
    }

    #[test]
    fn test_merkle_proof_odd_leaves() {
        let tree = MerkleTree::new(&payloads(5));
        for i in 0..5 {
            let proof = tree.proof(i).unwrap();
            assert!(verify_proof(tree.root().unwrap(), &proof));
        }
    }

    #[test]
    fn test_merkle_proof_single_leaf() {
        let tree = MerkleTree::new(&["only"]);
        let proof = tree.proof(0).unwrap();
        assert!(proof.siblings.is_empty());
        assert!(verify_proof(tree.root().unwrap(), &proof));
    }

    #[test]
    fn test_merkle_proof_invalid_index() {
        let tree = MerkleTree::new(&payloads(4));
        assert!(tree.proof(10).is_none());
    }

    #[test]
    fn test_merkle_proof_wrong_root() {
        let tree = MerkleTree::new(&payloads(4));
        let proof = tree.proof(0).unwrap();

        assert!(!verify_proof(&digest("wrong"), &proof));
    }

    #[test]
    fn test_merkle_proof_tampered_sibling() {
        let tree = MerkleTree::new(&payloads(4));
        let mut proof = tree.proof(2).unwrap();
        proof.siblings[0] = digest("forged");

        assert!(!verify_proof(tree.root().unwrap(), &proof));
    }

    proptest! {
        #[test]
        fn prop_root_deterministic(p in prop::collection::vec(".*", 1..16)) {
            prop_assert_eq!(compute_root(&p), compute_root(&p));
            prop_assert!(compute_root(&p).is_some());
        }

        #[test]
        fn prop_swap_changes_root(
            p in prop::collection::vec("[a-z0-9]{1,12}", 2..12),
            i in any::<prop::sample::Index>(),
            j in any::<prop::sample::Index>(),
        ) {
            let (i, j) = (i.index(p.len()), j.index(p.len()));
            prop_assume!(p[i] != p[j]);

            let mut swapped = p.clone();
            swapped.swap(i, j);
            prop_assert_ne!(compute_root(&p), compute_root(&swapped));
        }

        #[test]
        fn prop_every_proof_verifies(p in prop::collection::vec("[a-z]{0,8}", 1..20)) {
            let tree = MerkleTree::new(&p);
            for i in 0..p.len() {
                let proof = tree.proof(i).unwrap();
                prop_assert!(verify_proof(tree.root().unwrap(), &proof));
            }
        }
    }
}
