//! Commitment Accumulator
//!
//! Append-only fixed-depth Merkle tree of note commitments. Keeps only the
//! frontier (the rightmost filled-subtree hash per level) rather than the
//! full tree, so an insert is O(depth) time and the whole structure is
//! O(depth) space. Path queries live in the indexer's mirror, not here.
//!
//! A bounded history of recent roots is retained so a proof built against a
//! slightly stale root still lands under concurrent load. Every insert
//! advances the history and may evict the oldest retained root.

use std::collections::{HashSet, VecDeque};

use umbra_shielded::{Commitment, MerkleHasher};

use super::error::LedgerError;

/// Bounded ring of recent Merkle roots
#[derive(Debug, Clone)]
pub struct RootHistory {
    /// Recent roots, most recent at the front
    roots: VecDeque<[u8; 32]>,
    /// Maximum history size
    max_size: usize,
}

impl RootHistory {
    pub fn new(max_size: usize) -> Self {
        Self {
            roots: VecDeque::with_capacity(max_size),
            max_size: max_size.max(1),
        }
    }

    /// Add a new root, evicting the oldest when full
    pub fn push(&mut self, root: [u8; 32]) {
        self.roots.push_front(root);
        if self.roots.len() > self.max_size {
            self.roots.pop_back();
        }
    }

    /// Check if a root is still retained
    pub fn contains(&self, root: &[u8; 32]) -> bool {
        self.roots.contains(root)
    }

    /// Get the most recent root
    pub fn current(&self) -> Option<&[u8; 32]> {
        self.roots.front()
    }
}

/// Frontier-based append-only commitment accumulator
#[derive(Debug, Clone)]
pub struct MerkleAccumulator {
    /// Tree depth, fixed at initialization
    depth: usize,
    /// Hasher with precomputed empty-subtree roots
    hasher: MerkleHasher,
    /// Rightmost filled-subtree hash per level (index 0 = leaf level)
    frontier: Vec<Option<[u8; 32]>>,
    /// Next insertion index
    next_index: u64,
    /// Every commitment ever inserted, for duplicate rejection
    seen: HashSet<Commitment>,
    /// Recent valid roots
    history: RootHistory,
    /// Current root
    root: [u8; 32],
}

impl MerkleAccumulator {
    /// Create an empty accumulator of the given depth with a bounded root
    /// history of `history_size` entries
    pub fn new(depth: usize, history_size: usize) -> Self {
        let hasher = MerkleHasher::new(depth);
        let root = *hasher.empty_root(depth);
        let mut history = RootHistory::new(history_size);
        history.push(root);

        Self {
            depth,
            hasher,
            frontier: vec![None; depth],
            next_index: 0,
            seen: HashSet::new(),
            history,
            root,
        }
    }

    /// Insert a commitment, returning its leaf index
    ///
    /// Rejects commitments already present and inserts past capacity.
    pub fn insert(&mut self, commitment: Commitment) -> Result<u64, LedgerError> {
        if self.seen.contains(&commitment) {
            return Err(LedgerError::DuplicateCommitment);
        }
        if self.next_index >= self.capacity() {
            return Err(LedgerError::TreeFull);
        }

        let leaf_index = self.next_index;
        self.next_index += 1;

        // Walk up the tree, folding the new leaf into the frontier
        let mut current = commitment.0;
        let mut current_index = leaf_index;

        for level in 0..self.depth {
            let is_right = current_index & 1 == 1;

            if is_right {
                // Left sibling is the filled subtree at this level
                let left = self.frontier[level].unwrap_or(*self.hasher.empty_root(level));
                current = self.hasher.hash_pair(&left, &current);
                self.frontier[level] = None;
            } else {
                // We are the leftmost of a new pair; right side is still empty
                self.frontier[level] = Some(current);
                current = self.hasher.hash_pair(&current, self.hasher.empty_root(level));
            }

            current_index /= 2;
        }

        self.root = current;
        self.history.push(current);
        self.seen.insert(commitment);

        Ok(leaf_index)
    }

    /// The current root
    pub fn current_root(&self) -> [u8; 32] {
        self.root
    }

    /// Whether a root is still within the retained history
    pub fn is_known_root(&self, root: &[u8; 32]) -> bool {
        self.history.contains(root)
    }

    /// Whether a commitment has ever been inserted
    pub fn contains(&self, commitment: &Commitment) -> bool {
        self.seen.contains(commitment)
    }

    /// Number of leaves inserted so far
    pub fn leaf_count(&self) -> u64 {
        self.next_index
    }

    /// Remaining free leaves
    pub fn remaining(&self) -> u64 {
        self.capacity() - self.next_index
    }

    /// The configured depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn capacity(&self) -> u64 {
        1u64 << self.depth
    }
}
