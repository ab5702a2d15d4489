//! Ledger Error Taxonomy
//!
//! Every variant is terminal for the attempted operation; the ledger never
//! retries. The relayer's simulate step converts most of these into
//! pre-submission rejections.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    /// Proof did not verify against the declared kind and public inputs
    #[error("invalid proof")]
    InvalidProof,

    /// Nullifier hash already present in the registry (double spend)
    #[error("nullifier already spent")]
    AlreadySpent,

    /// Commitment already present in the accumulator
    #[error("duplicate commitment")]
    DuplicateCommitment,

    /// Root not in the retained history (stale or fabricated)
    #[error("unknown root")]
    UnknownRoot,

    /// Payout would exceed the custody actually held for the token
    #[error("insufficient custody")]
    InsufficientCustody,

    /// Swap output exceeds the token's surplus custody
    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    /// Proof-bound output amount below the declared minimum
    #[error("slippage exceeded: output below minimum")]
    SlippageExceeded,

    /// Token not in the supported set
    #[error("unsupported token")]
    UnsupportedToken,

    /// Amount must be positive
    #[error("invalid amount")]
    InvalidAmount,

    /// Primary output is the zero sentinel, which is never a real note
    #[error("invalid commitment")]
    InvalidCommitment,

    /// The accumulator has no free leaves left
    #[error("commitment tree full")]
    TreeFull,
}
