//! Groth16 Proof Verification
//!
//! Verifies operation proofs over BN254 against per-operation verifying
//! keys loaded from disk. Proofs arrive as eight 32-byte limbs in the
//! alt-bn128 layout (pi_a x/y, pi_b in c1-before-c0 order, pi_c x/y),
//! big-endian within each limb; public inputs are the same 32-byte
//! little-endian field encodings used everywhere else in the pool.
//!
//! All decode failures are soft: a malformed proof verifies as false,
//! never as an error, so the ledger maps it to a plain rejection.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ff::PrimeField;
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof as ArkProof, VerifyingKey};
use ark_serialize::CanonicalDeserialize;
use log::{debug, warn};

use umbra_shielded::{OperationKind, Proof, ProofVerifier};

/// Verifier holding one prepared key per proof-carrying operation
pub struct Groth16Verifier {
    keys: HashMap<OperationKind, PreparedVerifyingKey<Bn254>>,
}

impl Groth16Verifier {
    /// Load verifying keys from `dir`, expecting `transfer.vk`,
    /// `unshield.vk`, and `swap.vk` in compressed arkworks serialization
    pub fn load(dir: &Path) -> Result<Self> {
        let mut keys = HashMap::new();

        for kind in [
            OperationKind::Transfer,
            OperationKind::Unshield,
            OperationKind::Swap,
        ] {
            let path = dir.join(format!("{}.vk", kind.as_str()));
            let bytes = std::fs::read(&path)
                .with_context(|| format!("reading verifying key {}", path.display()))?;
            let vk = VerifyingKey::<Bn254>::deserialize_compressed(&bytes[..])
                .with_context(|| format!("deserializing verifying key {}", path.display()))?;
            keys.insert(kind, ark_groth16::prepare_verifying_key(&vk));
        }

        Ok(Self { keys })
    }

    fn decode_proof(proof: &Proof) -> Option<ArkProof<Bn254>> {
        let a = g1_from_limbs(&proof.0[0], &proof.0[1])?;
        let b = g2_from_limbs(&proof.0[2], &proof.0[3], &proof.0[4], &proof.0[5])?;
        let c = g1_from_limbs(&proof.0[6], &proof.0[7])?;
        Some(ArkProof { a, b, c })
    }
}

impl ProofVerifier for Groth16Verifier {
    fn verify(&self, kind: OperationKind, public_inputs: &[[u8; 32]], proof: &Proof) -> bool {
        let Some(pvk) = self.keys.get(&kind) else {
            // Shield carries no proof; anything else without a key is a
            // deployment error and must fail closed
            warn!("no verifying key for {}", kind.as_str());
            return false;
        };

        let Some(proof) = Self::decode_proof(proof) else {
            debug!("malformed {} proof rejected", kind.as_str());
            return false;
        };

        let inputs: Vec<Fr> = public_inputs
            .iter()
            .map(|b| Fr::from_le_bytes_mod_order(b))
            .collect();

        Groth16::<Bn254>::verify_proof(pvk, &proof, &inputs).unwrap_or(false)
    }
}

fn g1_from_limbs(x: &[u8; 32], y: &[u8; 32]) -> Option<G1Affine> {
    if x.iter().all(|b| *b == 0) && y.iter().all(|b| *b == 0) {
        return Some(G1Affine::identity());
    }

    let x = fq_from_be(x)?;
    let y = fq_from_be(y)?;
    let point = G1Affine::new_unchecked(x, y);
    (point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()).then_some(point)
}

fn g2_from_limbs(
    x_c1: &[u8; 32],
    x_c0: &[u8; 32],
    y_c1: &[u8; 32],
    y_c0: &[u8; 32],
) -> Option<G2Affine> {
    let all_zero = [x_c1, x_c0, y_c1, y_c0]
        .iter()
        .all(|limb| limb.iter().all(|b| *b == 0));
    if all_zero {
        return Some(G2Affine::identity());
    }

    let x = Fq2::new(fq_from_be(x_c0)?, fq_from_be(x_c1)?);
    let y = Fq2::new(fq_from_be(y_c0)?, fq_from_be(y_c1)?);
    let point = G2Affine::new_unchecked(x, y);
    (point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()).then_some(point)
}

/// Strict big-endian base-field decode; values at or above the modulus
/// are rejected rather than reduced
fn fq_from_be(bytes: &[u8; 32]) -> Option<Fq> {
    use ark_ff::BigInteger;

    let value = Fq::from_be_bytes_mod_order(bytes);
    // Round-trip to detect non-canonical encodings
    let canonical = value.into_bigint().to_bytes_be();
    let mut padded = [0u8; 32];
    padded[32 - canonical.len()..].copy_from_slice(&canonical);
    (&padded == bytes).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::AffineRepr;

    #[test]
    fn test_zero_limbs_decode_as_identity() {
        let proof = Proof::zero();
        let decoded = Groth16Verifier::decode_proof(&proof).unwrap();
        assert!(decoded.a.is_zero());
        assert!(decoded.b.is_zero());
        assert!(decoded.c.is_zero());
    }

    #[test]
    fn test_off_curve_point_rejected() {
        let mut limbs = [[0u8; 32]; 8];
        // x = 1, y = 1 is not on y^2 = x^3 + 3
        limbs[0][31] = 1;
        limbs[1][31] = 1;
        assert!(Groth16Verifier::decode_proof(&Proof(limbs)).is_none());
    }

    #[test]
    fn test_non_canonical_fq_rejected() {
        // The BN254 base-field modulus itself is a non-canonical encoding
        let modulus: [u8; 32] = [
            0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81,
            0x58, 0x5d, 0x97, 0x81, 0x6a, 0x91, 0x68, 0x71, 0xca, 0x8d, 0x3c, 0x20, 0x8c, 0x16,
            0xd8, 0x7c, 0xfd, 0x47,
        ];
        assert!(fq_from_be(&modulus).is_none());
        assert!(fq_from_be(&[0u8; 32]).is_some());
    }

    #[test]
    fn test_missing_key_fails_closed() {
        let verifier = Groth16Verifier { keys: HashMap::new() };
        assert!(!verifier.verify(OperationKind::Transfer, &[], &Proof::zero()));
    }
}
