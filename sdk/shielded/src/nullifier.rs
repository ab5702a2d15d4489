//! Nullifiers
//!
//! A nullifier is revealed when a note is spent; it proves knowledge of the
//! note's secret without revealing which note it came from.
//!
//! ```text
//! nullifier      = H(H(secret, leaf_index), spending_key)
//! nullifier_hash = H(nullifier, nullifier)
//! ```
//!
//! Only the `nullifier_hash` is published. Once published it is permanent;
//! no operation referencing it may succeed again.

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

use crate::poseidon::{field_bytes_from_u64, field_from_bytes, field_to_bytes, hash2};

/// A nullifier (32 bytes) - kept client-side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nullifier(pub [u8; 32]);

impl Nullifier {
    /// Create from field element
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

    /// The public value published on spend
    pub fn hash(&self) -> NullifierHash {
        NullifierHash(hash2(&self.0, &self.0))
    }
}

/// The published form of a nullifier (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NullifierHash(pub [u8; 32]);

impl NullifierHash {
    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for NullifierHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Derive the nullifier for a note
///
/// # Arguments
/// * `secret` - The note's secret
/// * `leaf_index` - The note's leaf index in the accumulator (prevents
///   nullifier grinding across identical notes)
/// * `spending_key` - The owner's spending key
pub fn derive_nullifier(secret: &[u8; 32], leaf_index: u64, spending_key: &[u8; 32]) -> Nullifier {
    let inner = hash2(secret, &field_bytes_from_u64(leaf_index));
    Nullifier(hash2(&inner, spending_key))
}
