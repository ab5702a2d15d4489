//! Merkle Tree for Note Commitments
//!
//! Sparse Merkle tree used by off-chain mirrors to serve inclusion paths.
//! The ledger side keeps only a frontier (see the accumulator in umbra-core);
//! this tree stores every leaf so paths can be computed for any of them.
//!
//! ```text
//!                    Root
//!                   /    \
//!                 H01    H23
//!                /  \   /   \
//!               H0  H1 H2   H3
//!               |   |   |    |
//!              C0  C1  C2   C3  (Note Commitments)
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::commitment::Commitment;
use crate::poseidon::hash2;

/// Default tree depth (supports ~1M notes); a deployment-time constant
pub const DEFAULT_TREE_DEPTH: usize = 20;

/// A Merkle path proving inclusion of a note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerklePath {
    /// Sibling hashes from leaf to root
    pub siblings: Vec<[u8; 32]>,
    /// Position bits (false = left, true = right)
    pub path_bits: Vec<bool>,
    /// The leaf index
    pub leaf_index: u64,
}

impl MerklePath {
    /// Verify that this path proves inclusion of `leaf` in `root`
    pub fn verify(&self, leaf: &Commitment, root: &[u8; 32]) -> bool {
        let computed = compute_root_from_path(&leaf.0, &self.siblings, &self.path_bits);
        &computed == root
    }
}

/// Compute root from leaf and authentication path
pub fn compute_root_from_path(
    leaf: &[u8; 32],
    siblings: &[[u8; 32]],
    path_bits: &[bool],
) -> [u8; 32] {
    let mut current = *leaf;

    for (sibling, is_right) in siblings.iter().zip(path_bits.iter()) {
        current = if *is_right {
            hash2(sibling, &current)
        } else {
            hash2(&current, sibling)
        };
    }

    current
}

/// Merkle hasher with precomputed empty-subtree roots
#[derive(Debug, Clone)]
pub struct MerkleHasher {
    depth: usize,
    /// Empty subtree root at each level (index 0 = leaf level)
    empty_roots: Vec<[u8; 32]>,
}

impl MerkleHasher {
    pub fn new(depth: usize) -> Self {
        let empty_leaf = hash2(&[0u8; 32], &[0u8; 32]);
        let mut empty_roots = vec![empty_leaf];
        for _ in 0..depth {
            let prev = *empty_roots.last().expect("non-empty by construction");
            empty_roots.push(hash2(&prev, &prev));
        }

        Self { depth, empty_roots }
    }

    /// Hash two children to get parent
    pub fn hash_pair(&self, left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
        hash2(left, right)
    }

    /// Get the empty root at a given level
    pub fn empty_root(&self, level: usize) -> &[u8; 32] {
        &self.empty_roots[level]
    }

    /// The configured tree depth
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Sparse Merkle tree for note commitments
///
/// Uses lazy evaluation - only stores non-empty nodes.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// Non-empty nodes: (level, index) -> hash
    nodes: HashMap<(usize, u64), [u8; 32]>,
    /// Next available leaf index
    next_index: u64,
    /// Hasher with precomputed empty roots
    hasher: MerkleHasher,
    /// Current root
    root: [u8; 32],
}

impl MerkleTree {
    /// Create a new empty tree of the given depth
    pub fn new(depth: usize) -> Self {
        let hasher = MerkleHasher::new(depth);
        let root = *hasher.empty_root(depth);

        Self {
            nodes: HashMap::new(),
            next_index: 0,
            hasher,
            root,
        }
    }

    /// Get current root
    pub fn root(&self) -> [u8; 32] {
        self.root
    }

    /// Get next available leaf index
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Insert a commitment at the next index and return that index
    pub fn insert(&mut self, commitment: &Commitment) -> u64 {
        let leaf_index = self.next_index;
        self.insert_at(leaf_index, commitment);
        leaf_index
    }

    /// Insert at a specific leaf index (for replay/reconstruction)
    pub fn insert_at(&mut self, leaf_index: u64, commitment: &Commitment) {
        self.nodes.insert((0, leaf_index), commitment.0);
        self.next_index = self.next_index.max(leaf_index + 1);

        // Update path to root
        let mut current_index = leaf_index;
        let mut current_hash = commitment.0;

        for level in 0..self.hasher.depth() {
            let is_right = current_index & 1 == 1;
            let sibling_index = if is_right {
                current_index - 1
            } else {
                current_index + 1
            };

            let sibling = self
                .nodes
                .get(&(level, sibling_index))
                .copied()
                .unwrap_or_else(|| *self.hasher.empty_root(level));

            current_hash = if is_right {
                self.hasher.hash_pair(&sibling, &current_hash)
            } else {
                self.hasher.hash_pair(&current_hash, &sibling)
            };

            current_index /= 2;
            self.nodes.insert((level + 1, current_index), current_hash);
        }

        self.root = current_hash;
    }

    /// Get Merkle path for a leaf index
    pub fn path(&self, leaf_index: u64) -> Option<MerklePath> {
        if leaf_index >= self.next_index {
            return None;
        }

        let depth = self.hasher.depth();
        let mut siblings = Vec::with_capacity(depth);
        let mut path_bits = Vec::with_capacity(depth);
        let mut current_index = leaf_index;

        for level in 0..depth {
            let is_right = current_index & 1 == 1;
            path_bits.push(is_right);

            let sibling_index = if is_right {
                current_index - 1
            } else {
                current_index + 1
            };

            let sibling = self
                .nodes
                .get(&(level, sibling_index))
                .copied()
                .unwrap_or_else(|| *self.hasher.empty_root(level));

            siblings.push(sibling);
            current_index /= 2;
        }

        Some(MerklePath {
            siblings,
            path_bits,
            leaf_index,
        })
    }

    /// Get commitment at a leaf index
    pub fn get(&self, leaf_index: u64) -> Option<Commitment> {
        self.nodes.get(&(0, leaf_index)).map(|h| Commitment(*h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPTH: usize = 8;

    #[test]
    fn test_empty_tree() {
        let tree = MerkleTree::new(DEPTH);
        assert_eq!(tree.next_index(), 0);

        let hasher = MerkleHasher::new(DEPTH);
        assert_eq!(tree.root(), *hasher.empty_root(DEPTH));
    }

    #[test]
    fn test_insert_and_path() {
        let mut tree = MerkleTree::new(DEPTH);

        let c1 = Commitment([1u8; 32]);
        let c2 = Commitment([2u8; 32]);

        assert_eq!(tree.insert(&c1), 0);
        assert_eq!(tree.insert(&c2), 1);

        let path1 = tree.path(0).unwrap();
        assert!(path1.verify(&c1, &tree.root()));

        let path2 = tree.path(1).unwrap();
        assert!(path2.verify(&c2, &tree.root()));
    }

    #[test]
    fn test_path_invalid_commitment() {
        let mut tree = MerkleTree::new(DEPTH);
        tree.insert(&Commitment([1u8; 32]));

        let path = tree.path(0).unwrap();
        assert!(!path.verify(&Commitment([99u8; 32]), &tree.root()));
    }

    #[test]
    fn test_insert_at_advances_next_index() {
        let mut tree = MerkleTree::new(DEPTH);

        tree.insert_at(3, &Commitment([1u8; 32]));
        assert_eq!(tree.next_index(), 4);
        assert!(tree.path(3).is_some(), "replayed leaf should have a path");
    }

    #[test]
    fn test_root_changes() {
        let mut tree = MerkleTree::new(DEPTH);
        let root0 = tree.root();

        tree.insert(&Commitment([1u8; 32]));
        let root1 = tree.root();
        assert_ne!(root0, root1, "root should change after insert");

        tree.insert(&Commitment([2u8; 32]));
        assert_ne!(root1, tree.root(), "root should change after each insert");
    }
}
