//! Note Commitments
//!
//! A commitment is the only trace of a note's creation the ledger ever sees.
//!
//! ```text
//! Commitment = H(H(amount, owner_pk), H(secret, blinding))
//! ```
//!
//! The nested structure lets circuits open either half independently: the
//! value/owner half for spend authorization, the secret/blinding half for
//! nullifier derivation.

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

use crate::poseidon::{field_bytes_from_u64, field_from_bytes, field_to_bytes, hash2};

/// A note commitment (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment(pub [u8; 32]);

impl Commitment {
    /// Sentinel for "no output": an all-zero commitment is never inserted
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create commitment from field element
    pub fn from_field(f: Fr) -> Self {
        Self(field_to_bytes(f))
    }

    /// Convert to field element
    pub fn to_field(&self) -> Fr {
        field_from_bytes(&self.0)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Whether this is the "no output" sentinel
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl AsRef<[u8]> for Commitment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Commit to a note: C = H(H(amount, owner_pk), H(secret, blinding))
pub fn note_commitment(
    amount: u64,
    owner_pk: &[u8; 32],
    secret: &[u8; 32],
    blinding: &[u8; 32],
) -> Commitment {
    let value_half = hash2(&field_bytes_from_u64(amount), owner_pk);
    let secret_half = hash2(secret, blinding);
    Commitment(hash2(&value_half, &secret_half))
}
