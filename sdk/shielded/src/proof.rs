//! Proof Bundles and Verification
//!
//! The ledger never inspects proofs itself; it hands the declared operation
//! kind, the public inputs it reconstructed from the call, and the raw proof
//! to a [`ProofVerifier`] and trusts the boolean absolutely. This is the one
//! place cryptographic soundness is assumed rather than enforced locally.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// A Groth16 proof over BN254, encoded as 8 32-byte limbs:
/// `pi_a` (x, y), `pi_b` (x_c1, x_c0, y_c1, y_c0), `pi_c` (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof(pub [[u8; 32]; 8]);

impl Proof {
    /// An all-zero proof (placeholder; never verifies against a real key)
    pub fn zero() -> Self {
        Self([[0u8; 32]; 8])
    }
}

/// The four shielded operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Shield,
    Transfer,
    Unshield,
    Swap,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shield => "shield",
            Self::Transfer => "transfer",
            Self::Unshield => "unshield",
            Self::Swap => "swap",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "shield" => Some(Self::Shield),
            "transfer" => Some(Self::Transfer),
            "unshield" => Some(Self::Unshield),
            "swap" => Some(Self::Swap),
            _ => None,
        }
    }
}

/// Verifies a proof against a declared operation kind and public inputs
///
/// Must be pure and deterministic for fixed `(kind, public_inputs, proof)`.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, kind: OperationKind, public_inputs: &[[u8; 32]], proof: &Proof) -> bool;
}

/// Mock verifier for tests and dev mode
///
/// Accepts or rejects everything, and records the calls it sees so tests can
/// assert the ledger bound the right public inputs.
pub struct MockVerifier {
    accept: bool,
    record: bool,
    calls: Mutex<Vec<(OperationKind, Vec<[u8; 32]>)>>,
}

impl MockVerifier {
    pub fn accept_all() -> Self {
        Self {
            accept: true,
            record: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn reject_all() -> Self {
        Self {
            accept: false,
            record: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Disable call recording; long-running processes must not accumulate
    /// an unbounded log
    pub fn silent(mut self) -> Self {
        self.record = false;
        self
    }

    /// The `(kind, public_inputs)` pairs seen so far
    pub fn calls(&self) -> Vec<(OperationKind, Vec<[u8; 32]>)> {
        self.calls.lock().expect("verifier call log poisoned").clone()
    }
}

impl ProofVerifier for MockVerifier {
    fn verify(&self, kind: OperationKind, public_inputs: &[[u8; 32]], _proof: &Proof) -> bool {
        if self.record {
            self.calls
                .lock()
                .expect("verifier call log poisoned")
                .push((kind, public_inputs.to_vec()));
        }
        self.accept
    }
}
