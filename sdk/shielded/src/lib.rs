//! Umbra Shielded SDK
//!
//! Note-based privacy primitives for the umbra shielded pool.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Shielded Operation                           │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────────┐ │
//! │  │  Nullifier   │  │ Commitments  │  │   Encrypted Output    │ │
//! │  │  (spent)     │  │  (new notes) │  │   (for recipient)     │ │
//! │  └──────────────┘  └──────────────┘  └───────────────────────┘ │
//! │         │                 │                     │               │
//! │         ▼                 ▼                     ▼               │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              ZK Proof (Groth16 / BN254)                  │   │
//! │  │  • Valid nullifier derivation                            │   │
//! │  │  • Valid commitment structure                            │   │
//! │  │  • Value conservation: Σ inputs = Σ outputs + fee        │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod encryption;
pub mod merkle;
pub mod note;
pub mod nullifier;
pub mod poseidon;
pub mod proof;

pub use commitment::{Commitment, note_commitment};
pub use encryption::{EncryptedNote, decrypt_note, encrypt_note, try_decrypt_note};
pub use merkle::{DEFAULT_TREE_DEPTH, MerkleHasher, MerklePath, MerkleTree};
pub use note::{Note, NoteValue, SpendingKey, TokenId};
pub use nullifier::{Nullifier, NullifierHash, derive_nullifier};
pub use proof::{MockVerifier, OperationKind, Proof, ProofVerifier};
