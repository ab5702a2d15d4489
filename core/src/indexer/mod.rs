//! Indexer
//!
//! Read-side mirror of the ledger, rebuilt purely from the sequenced record
//! stream. Maintains a full sparse Merkle tree (the ledger itself keeps only
//! the frontier) so wallets can fetch membership paths, plus the spent
//! nullifier set and the encrypted note payloads for trial decryption.
//!
//! Replay is idempotent and order-tolerant: records at an already-applied
//! sequence are dropped, records from the future are buffered until the gap
//! closes. A reorg is handled by truncating the retained log at the last
//! common sequence and replaying from scratch; the mirror converges to the
//! same state as if the discarded records never existed.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info, warn};

use umbra_shielded::{Commitment, EncryptedNote, MerklePath, MerkleTree, NullifierHash};

use crate::ledger::ops::{LedgerRecord, SequencedRecord};

pub struct Indexer {
    depth: usize,
    tree: MerkleTree,
    nullifiers: HashSet<NullifierHash>,
    /// Encrypted payload per leaf index, for wallet trial decryption
    outputs: BTreeMap<u64, EncryptedNote>,
    /// Applied records in sequence order; the replay source for rollback
    log: Vec<SequencedRecord>,
    /// Out-of-order arrivals waiting for the gap before them to close
    pending: BTreeMap<u64, SequencedRecord>,
    next_seq: u64,
}

impl Indexer {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            tree: MerkleTree::new(depth),
            nullifiers: HashSet::new(),
            outputs: BTreeMap::new(),
            log: Vec::new(),
            pending: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Ingest one sequenced record
    ///
    /// Duplicates (seq below the watermark) are dropped, gaps are buffered,
    /// and in-order records are applied together with any buffered
    /// successors they unblock.
    pub fn apply(&mut self, record: SequencedRecord) {
        if record.seq < self.next_seq {
            debug!("dropping replayed record seq {}", record.seq);
            return;
        }
        if record.seq > self.next_seq {
            debug!(
                "buffering out-of-order record seq {} (expecting {})",
                record.seq, self.next_seq
            );
            self.pending.insert(record.seq, record);
            return;
        }

        self.apply_in_order(record);
        while let Some(next) = self.pending.remove(&self.next_seq) {
            self.apply_in_order(next);
        }
    }

    fn apply_in_order(&mut self, record: SequencedRecord) {
        self.project(&record.record);
        self.next_seq = record.seq + 1;
        self.log.push(record);
    }

    fn project(&mut self, record: &LedgerRecord) {
        match record {
            LedgerRecord::Shielded {
                commitment,
                leaf_index,
                ..
            } => {
                self.tree.insert_at(*leaf_index, commitment);
            }
            LedgerRecord::Transferred {
                nullifier_hash,
                out_commitment_1,
                out_commitment_2,
                leaf_index_1,
                leaf_index_2,
                memo_1,
                memo_2,
            } => {
                self.nullifiers.insert(*nullifier_hash);
                self.insert_output(*leaf_index_1, out_commitment_1, memo_1);
                if let Some(index) = leaf_index_2 {
                    self.insert_output(*index, out_commitment_2, memo_2);
                }
            }
            LedgerRecord::Unshielded {
                nullifier_hash,
                change_commitment,
                change_leaf_index,
                ..
            } => {
                self.nullifiers.insert(*nullifier_hash);
                if let Some(index) = change_leaf_index {
                    self.tree.insert_at(*index, change_commitment);
                }
            }
            LedgerRecord::Swapped {
                input_nullifier_hash,
                out_commitment_1,
                out_commitment_2,
                leaf_index_1,
                leaf_index_2,
                memo,
                ..
            } => {
                self.nullifiers.insert(*input_nullifier_hash);
                self.insert_output(*leaf_index_1, out_commitment_1, memo);
                if let Some(index) = leaf_index_2 {
                    self.tree.insert_at(*index, out_commitment_2);
                }
            }
        }
    }

    fn insert_output(&mut self, leaf_index: u64, commitment: &Commitment, memo: &EncryptedNote) {
        self.tree.insert_at(leaf_index, commitment);
        if !memo.is_empty() {
            self.outputs.insert(leaf_index, memo.clone());
        }
    }

    /// Discard everything after `common_seq` and rebuild from the retained
    /// log. `common_seq` is the last sequence both sides agree on; pass
    /// `None` to rebuild from genesis.
    pub fn rollback(&mut self, common_seq: Option<u64>) {
        let keep = match common_seq {
            Some(seq) => self
                .log
                .iter()
                .position(|r| r.seq > seq)
                .unwrap_or(self.log.len()),
            None => 0,
        };

        warn!(
            "rolling back: keeping {} of {} records",
            keep,
            self.log.len()
        );

        let retained: Vec<SequencedRecord> = self.log.drain(..).take(keep).collect();

        self.tree = MerkleTree::new(self.depth);
        self.nullifiers.clear();
        self.outputs.clear();
        self.pending.clear();
        self.next_seq = 0;

        for record in retained {
            self.apply_in_order(record);
        }

        info!("rollback complete at seq watermark {}", self.next_seq);
    }

    /// Membership path for a leaf, if that leaf has been indexed
    pub fn path(&self, leaf_index: u64) -> Option<MerklePath> {
        self.tree.path(leaf_index)
    }

    pub fn current_root(&self) -> [u8; 32] {
        self.tree.root()
    }

    pub fn is_nullifier_spent(&self, hash: &NullifierHash) -> bool {
        self.nullifiers.contains(hash)
    }

    /// Encrypted outputs at or after `from_leaf`, in leaf order
    pub fn encrypted_outputs(&self, from_leaf: u64) -> Vec<(u64, EncryptedNote)> {
        self.outputs
            .range(from_leaf..)
            .map(|(index, note)| (*index, note.clone()))
            .collect()
    }

    /// Sequence watermark: the next record this mirror expects
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
