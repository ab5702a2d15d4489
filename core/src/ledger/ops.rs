//! Operations and Records
//!
//! The four shielded operations as a closed tagged union with a single
//! dispatch point in the ledger, and the sequenced records the ledger emits
//! for the indexer to replay.

use serde::{Deserialize, Serialize};

use umbra_shielded::{Commitment, EncryptedNote, NullifierHash, OperationKind, Proof, TokenId};

/// Convert a public balance into a private note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShieldOp {
    pub commitment: Commitment,
    pub token: TokenId,
    pub amount: u64,
}

/// Move value between notes without revealing sender, recipient, or amount
///
/// Native-token notes only: the call surface carries no token field, so the
/// fee and the transferred value are both native-denominated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOp {
    pub proof: Proof,
    pub root: [u8; 32],
    pub nullifier_hash: NullifierHash,
    pub out_commitment_1: Commitment,
    /// Zero sentinel means "no change output"
    pub out_commitment_2: Commitment,
    pub relayer: [u8; 32],
    pub fee: u64,
    pub memo_1: EncryptedNote,
    pub memo_2: EncryptedNote,
}

/// Convert a note back into a public balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnshieldOp {
    pub proof: Proof,
    pub root: [u8; 32],
    pub nullifier_hash: NullifierHash,
    pub recipient: [u8; 32],
    pub token: TokenId,
    pub amount: u64,
    /// Zero sentinel means the note was spent in full
    pub change_commitment: Commitment,
    pub relayer: [u8; 32],
    pub fee: u64,
}

/// Exchange one token for another while still shielded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapOp {
    pub proof: Proof,
    pub root: [u8; 32],
    pub input_nullifier_hash: NullifierHash,
    /// Output note, denominated in `token_out`
    pub out_commitment_1: Commitment,
    /// Change note, same token as the input; zero sentinel if none
    pub out_commitment_2: Commitment,
    pub token_in: TokenId,
    pub token_out: TokenId,
    pub swap_amount: u64,
    pub output_amount: u64,
    pub min_amount_out: u64,
    pub memo: EncryptedNote,
}

/// One logical ledger operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    Shield(ShieldOp),
    Transfer(TransferOp),
    Unshield(UnshieldOp),
    Swap(SwapOp),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Shield(_) => OperationKind::Shield,
            Self::Transfer(_) => OperationKind::Transfer,
            Self::Unshield(_) => OperationKind::Unshield,
            Self::Swap(_) => OperationKind::Swap,
        }
    }

    /// Relayer fee carried by this operation
    pub fn fee(&self) -> u64 {
        match self {
            Self::Shield(_) | Self::Swap(_) => 0,
            Self::Transfer(op) => op.fee,
            Self::Unshield(op) => op.fee,
        }
    }

    /// Token the fee is denominated in
    pub fn fee_token(&self) -> TokenId {
        match self {
            Self::Unshield(op) => op.token,
            _ => TokenId::NATIVE,
        }
    }
}

/// A record emitted by one accepted operation, consumed by the indexer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerRecord {
    Shielded {
        commitment: Commitment,
        leaf_index: u64,
        token: TokenId,
        amount: u64,
    },
    Transferred {
        nullifier_hash: NullifierHash,
        out_commitment_1: Commitment,
        out_commitment_2: Commitment,
        leaf_index_1: u64,
        leaf_index_2: Option<u64>,
        memo_1: EncryptedNote,
        memo_2: EncryptedNote,
    },
    Unshielded {
        nullifier_hash: NullifierHash,
        recipient: [u8; 32],
        token: TokenId,
        amount: u64,
        change_commitment: Commitment,
        change_leaf_index: Option<u64>,
    },
    Swapped {
        input_nullifier_hash: NullifierHash,
        out_commitment_1: Commitment,
        out_commitment_2: Commitment,
        token_in: TokenId,
        token_out: TokenId,
        swap_amount: u64,
        output_amount: u64,
        leaf_index_1: u64,
        leaf_index_2: Option<u64>,
        memo: EncryptedNote,
    },
}

/// A record tagged with its position in the ledger's total order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencedRecord {
    pub seq: u64,
    pub record: LedgerRecord,
}
