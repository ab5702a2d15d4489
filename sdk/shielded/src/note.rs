//! Shielded Notes
//!
//! A Note represents value held privately in the umbra pool.
//!
//! ```text
//! Note = {
//!     value: u64,           // Amount in the token's smallest unit
//!     token: TokenId,       // Which token this note denominates
//!     owner_pk: [u8; 32],   // Derived from the owner's spending key
//!     secret: [u8; 32],     // Random; feeds the nullifier
//!     blinding: [u8; 32],   // Random; makes the commitment hiding
//!     leaf_index: u64,      // Set once the commitment is inserted
//! }
//! ```
//!
//! Notes are never stored centrally in plaintext; the ledger only ever sees
//! the commitment and, on spend, the nullifier hash.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::commitment::{Commitment, note_commitment};
use crate::nullifier::{Nullifier, derive_nullifier};
use crate::poseidon::hash2;

/// Domain tag for owner key derivation
const OWNER_DOMAIN: [u8; 32] = *b"umbra/owner-v1\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0";

/// Token identifier (32 bytes; mint address or equivalent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(pub [u8; 32]);

impl TokenId {
    /// Sentinel for the native asset
    pub const NATIVE: Self = Self([0u8; 32]);

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Note value in base units of the note's token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteValue(pub u64);

impl NoteValue {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// A shielded note representing privately held value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// The value (amount) held in this note
    pub value: NoteValue,
    /// The token this note denominates
    pub token: TokenId,
    /// Owner's public key (who can spend this note)
    pub owner_pk: [u8; 32],
    /// Random secret; feeds nullifier derivation
    pub secret: [u8; 32],
    /// Random blinding factor for hiding the commitment
    pub blinding: [u8; 32],
    /// Leaf index in the commitment accumulator (None until inserted)
    pub leaf_index: Option<u64>,
}

impl Note {
    /// Create a new note with random secret and blinding
    pub fn new<R: Rng>(value: u64, token: TokenId, owner_pk: [u8; 32], rng: &mut R) -> Self {
        let mut secret = [0u8; 32];
        let mut blinding = [0u8; 32];
        rng.fill_bytes(&mut secret);
        rng.fill_bytes(&mut blinding);

        Self {
            value: NoteValue(value),
            token,
            owner_pk,
            secret,
            blinding,
            leaf_index: None,
        }
    }

    /// Create a note with explicit secrets (for testing/recovery)
    pub fn with_secrets(
        value: u64,
        token: TokenId,
        owner_pk: [u8; 32],
        secret: [u8; 32],
        blinding: [u8; 32],
    ) -> Self {
        Self {
            value: NoteValue(value),
            token,
            owner_pk,
            secret,
            blinding,
            leaf_index: None,
        }
    }

    /// Compute the commitment for this note
    pub fn commitment(&self) -> Commitment {
        note_commitment(self.value.0, &self.owner_pk, &self.secret, &self.blinding)
    }

    /// Derive the nullifier for spending this note
    ///
    /// Requires the spending key and that the leaf index is set
    pub fn nullifier(&self, spending_key: &SpendingKey) -> Option<Nullifier> {
        let leaf_index = self.leaf_index?;
        Some(derive_nullifier(&self.secret, leaf_index, spending_key.as_bytes()))
    }

    /// Set the accumulator leaf index (called after insertion)
    pub fn with_leaf_index(mut self, leaf_index: u64) -> Self {
        self.leaf_index = Some(leaf_index);
        self
    }

    /// Check if this note has been inserted into the accumulator
    pub fn is_inserted(&self) -> bool {
        self.leaf_index.is_some()
    }
}

/// Spending key - allows spending notes
///
/// This is the most sensitive key. Loss = loss of funds.
/// Compromise = theft of funds.
#[derive(Debug, Clone)]
pub struct SpendingKey {
    key: [u8; 32],
}

impl SpendingKey {
    /// Generate a random spending key
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut key = [0u8; 32];
        rng.fill_bytes(&mut key);
        Self { key }
    }

    /// Create from raw bytes
    pub fn from_bytes(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    /// Derive the owner public key: pk = H("umbra/owner-v1", sk)
    pub fn owner_pk(&self) -> [u8; 32] {
        hash2(&OWNER_DOMAIN, &self.key)
    }
}
