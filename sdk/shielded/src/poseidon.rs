//! Poseidon Hashing
//!
//! Shared Poseidon sponge parameters for the whole protocol. Every digest —
//! note commitments, nullifiers, Merkle parents — is built from the single
//! two-to-one compression `hash2`.
//!
//! Field: BN254 Fr (254 bits)
//! Rate: 2, Capacity: 1
//! Security: 128 bits

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    CryptographicSponge,
    poseidon::{PoseidonConfig, PoseidonSponge, find_poseidon_ark_and_mds},
};
use ark_ff::{BigInteger, PrimeField};
use std::sync::OnceLock;

/// Poseidon configuration, computed once per process
pub fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    static CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();
    CONFIG.get_or_init(|| {
        let prime_bits: u64 = 254;
        let rate: usize = 2;
        let capacity: usize = 1;
        let full_rounds: u64 = 8;
        let partial_rounds: u64 = 57;
        let alpha: u64 = 5;
        let skip_matrices: u64 = 0;

        let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
            prime_bits,
            rate,
            full_rounds,
            partial_rounds,
            skip_matrices,
        );

        PoseidonConfig::new(
            full_rounds as usize,
            partial_rounds as usize,
            alpha,
            mds,
            ark,
            rate,
            capacity,
        )
    })
}

/// Two-to-one Poseidon compression: H(left, right)
pub fn hash2(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut sponge = PoseidonSponge::new(poseidon_config());

    sponge.absorb(&field_from_bytes(left));
    sponge.absorb(&field_from_bytes(right));

    let result: Fr = sponge.squeeze_field_elements(1)[0];
    field_to_bytes(result)
}

/// Encode a field element as 32 little-endian bytes
pub fn field_to_bytes(f: Fr) -> [u8; 32] {
    let bytes = f.into_bigint().to_bytes_le();
    let mut arr = [0u8; 32];
    arr[..bytes.len()].copy_from_slice(&bytes);
    arr
}

/// Decode 32 little-endian bytes into a field element
pub fn field_from_bytes(bytes: &[u8; 32]) -> Fr {
    Fr::from_le_bytes_mod_order(bytes)
}

/// Encode a u64 as a 32-byte field element (amounts, leaf indices, fees)
pub fn field_bytes_from_u64(v: u64) -> [u8; 32] {
    field_to_bytes(Fr::from(v))
}
