//! API request and response types
//!
//! All 32-byte values cross the wire as lowercase hex strings; the proof is
//! a single 512-hex-char string covering its eight limbs in order.

use serde::{Deserialize, Serialize};

use umbra_shielded::{Commitment, EncryptedNote, NullifierHash, Proof, TokenId};

use crate::ledger::ops::{Operation, ShieldOp, SwapOp, TransferOp, UnshieldOp};

fn zero32() -> [u8; 32] {
    [0u8; 32]
}

#[derive(Debug, Deserialize)]
pub struct ShieldRequest {
    #[serde(with = "hex::serde")]
    pub commitment: [u8; 32],
    #[serde(with = "hex::serde", default = "zero32")]
    pub token: [u8; 32],
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub proof: String,
    #[serde(with = "hex::serde")]
    pub root: [u8; 32],
    #[serde(with = "hex::serde")]
    pub nullifier_hash: [u8; 32],
    #[serde(with = "hex::serde")]
    pub out_commitment_1: [u8; 32],
    #[serde(with = "hex::serde", default = "zero32")]
    pub out_commitment_2: [u8; 32],
    #[serde(with = "hex::serde", default = "zero32")]
    pub relayer: [u8; 32],
    #[serde(default)]
    pub fee: u64,
    pub memo_1: Option<EncryptedNoteDto>,
    pub memo_2: Option<EncryptedNoteDto>,
}

#[derive(Debug, Deserialize)]
pub struct UnshieldRequest {
    pub proof: String,
    #[serde(with = "hex::serde")]
    pub root: [u8; 32],
    #[serde(with = "hex::serde")]
    pub nullifier_hash: [u8; 32],
    #[serde(with = "hex::serde")]
    pub recipient: [u8; 32],
    #[serde(with = "hex::serde", default = "zero32")]
    pub token: [u8; 32],
    pub amount: u64,
    #[serde(with = "hex::serde", default = "zero32")]
    pub change_commitment: [u8; 32],
    #[serde(with = "hex::serde", default = "zero32")]
    pub relayer: [u8; 32],
    #[serde(default)]
    pub fee: u64,
}

#[derive(Debug, Deserialize)]
pub struct SwapRequest {
    pub proof: String,
    #[serde(with = "hex::serde")]
    pub root: [u8; 32],
    #[serde(with = "hex::serde")]
    pub input_nullifier_hash: [u8; 32],
    #[serde(with = "hex::serde")]
    pub out_commitment_1: [u8; 32],
    #[serde(with = "hex::serde", default = "zero32")]
    pub out_commitment_2: [u8; 32],
    #[serde(with = "hex::serde")]
    pub token_in: [u8; 32],
    #[serde(with = "hex::serde")]
    pub token_out: [u8; 32],
    pub swap_amount: u64,
    pub output_amount: u64,
    pub min_amount_out: u64,
    pub memo: Option<EncryptedNoteDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EncryptedNoteDto {
    #[serde(with = "hex::serde")]
    pub ephemeral_pk: [u8; 32],
    #[serde(with = "hex::serde")]
    pub nonce: [u8; 12],
    #[serde(with = "hex::serde")]
    pub ciphertext: Vec<u8>,
}

impl From<EncryptedNoteDto> for EncryptedNote {
    fn from(dto: EncryptedNoteDto) -> Self {
        Self {
            ephemeral_pk: dto.ephemeral_pk,
            nonce: dto.nonce,
            ciphertext: dto.ciphertext,
        }
    }
}

impl From<&EncryptedNote> for EncryptedNoteDto {
    fn from(note: &EncryptedNote) -> Self {
        Self {
            ephemeral_pk: note.ephemeral_pk,
            nonce: note.nonce,
            ciphertext: note.ciphertext.clone(),
        }
    }
}

/// Decode the 512-hex-char proof string into eight 32-byte limbs
pub fn parse_proof(raw: &str) -> Result<Proof, String> {
    let bytes = hex::decode(raw).map_err(|e| format!("proof is not hex: {e}"))?;
    if bytes.len() != 256 {
        return Err(format!("proof must be 256 bytes, got {}", bytes.len()));
    }
    let mut limbs = [[0u8; 32]; 8];
    for (i, limb) in limbs.iter_mut().enumerate() {
        limb.copy_from_slice(&bytes[i * 32..(i + 1) * 32]);
    }
    Ok(Proof(limbs))
}

fn memo_or_empty(memo: Option<EncryptedNoteDto>) -> EncryptedNote {
    memo.map(Into::into).unwrap_or_else(EncryptedNote::empty)
}

impl TryFrom<ShieldRequest> for Operation {
    type Error = String;

    fn try_from(req: ShieldRequest) -> Result<Self, String> {
        Ok(Operation::Shield(ShieldOp {
            commitment: Commitment(req.commitment),
            token: TokenId(req.token),
            amount: req.amount,
        }))
    }
}

impl TryFrom<TransferRequest> for Operation {
    type Error = String;

    fn try_from(req: TransferRequest) -> Result<Self, String> {
        Ok(Operation::Transfer(TransferOp {
            proof: parse_proof(&req.proof)?,
            root: req.root,
            nullifier_hash: NullifierHash(req.nullifier_hash),
            out_commitment_1: Commitment(req.out_commitment_1),
            out_commitment_2: Commitment(req.out_commitment_2),
            relayer: req.relayer,
            fee: req.fee,
            memo_1: memo_or_empty(req.memo_1),
            memo_2: memo_or_empty(req.memo_2),
        }))
    }
}

impl TryFrom<UnshieldRequest> for Operation {
    type Error = String;

    fn try_from(req: UnshieldRequest) -> Result<Self, String> {
        Ok(Operation::Unshield(UnshieldOp {
            proof: parse_proof(&req.proof)?,
            root: req.root,
            nullifier_hash: NullifierHash(req.nullifier_hash),
            recipient: req.recipient,
            token: TokenId(req.token),
            amount: req.amount,
            change_commitment: Commitment(req.change_commitment),
            relayer: req.relayer,
            fee: req.fee,
        }))
    }
}

impl TryFrom<SwapRequest> for Operation {
    type Error = String;

    fn try_from(req: SwapRequest) -> Result<Self, String> {
        Ok(Operation::Swap(SwapOp {
            proof: parse_proof(&req.proof)?,
            root: req.root,
            input_nullifier_hash: NullifierHash(req.input_nullifier_hash),
            out_commitment_1: Commitment(req.out_commitment_1),
            out_commitment_2: Commitment(req.out_commitment_2),
            token_in: TokenId(req.token_in),
            token_out: TokenId(req.token_out),
            swap_amount: req.swap_amount,
            output_amount: req.output_amount,
            min_amount_out: req.min_amount_out,
            memo: memo_or_empty(req.memo),
        }))
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub next_seq: u64,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    #[serde(with = "hex::serde")]
    pub root: [u8; 32],
    pub leaf_count: u64,
}

#[derive(Debug, Serialize)]
pub struct PathResponse {
    pub leaf_index: u64,
    pub siblings: Vec<String>,
    pub path_bits: Vec<bool>,
    #[serde(with = "hex::serde")]
    pub root: [u8; 32],
}

#[derive(Debug, Serialize)]
pub struct NullifierResponse {
    pub spent: bool,
}

#[derive(Debug, Serialize)]
pub struct OutputEntry {
    pub leaf_index: u64,
    #[serde(flatten)]
    pub note: EncryptedNoteDto,
}

#[derive(Debug, Serialize)]
pub struct OutputsResponse {
    pub outputs: Vec<OutputEntry>,
}

#[derive(Debug, Serialize)]
pub struct RelayResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
