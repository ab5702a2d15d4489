//! Nullifier Registry
//!
//! The set of spent nullifier hashes. `check_and_spend` is the sole
//! double-spend defense: check and set are one step, so there is no window
//! between them. No deletion, no path to "un-spend".

use std::collections::HashSet;

use umbra_shielded::NullifierHash;

use super::error::LedgerError;

#[derive(Debug, Clone, Default)]
pub struct NullifierRegistry {
    spent: HashSet<NullifierHash>,
}

impl NullifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically check that a nullifier hash is unspent and mark it spent
    pub fn check_and_spend(&mut self, hash: NullifierHash) -> Result<(), LedgerError> {
        if self.spent.insert(hash) {
            Ok(())
        } else {
            Err(LedgerError::AlreadySpent)
        }
    }

    /// Advisory check; the authoritative answer is `check_and_spend`
    pub fn is_spent(&self, hash: &NullifierHash) -> bool {
        self.spent.contains(hash)
    }

    /// Number of spent nullifiers
    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }
}
