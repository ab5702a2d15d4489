//! Shielded Ledger
//!
//! Orchestrates one logical operation at a time: validates the proof and
//! every precondition, then updates the accumulator, nullifier registry, and
//! custody accounting, and emits a sequenced record.
//!
//! Each call is atomic: every precondition (root, nullifier, duplicate
//! commitments, custody, liquidity, slippage, proof) is checked before the
//! first mutation, so a rejected operation leaves no partial state behind.
//! The underlying substrate executes operations in a single global order, so
//! there is no internal concurrency to manage here.

pub mod accumulator;
pub mod custody;
pub mod error;
pub mod nullifiers;
pub mod ops;

use std::sync::Arc;

use log::info;

use umbra_shielded::{
    Commitment, NullifierHash, OperationKind, ProofVerifier, TokenId,
    poseidon::field_bytes_from_u64,
};

use accumulator::MerkleAccumulator;
use custody::CustodyLedger;
use error::LedgerError;
use nullifiers::NullifierRegistry;
use ops::{LedgerRecord, Operation, SequencedRecord, ShieldOp, SwapOp, TransferOp, UnshieldOp};

/// The shielded pool's persistent state plus its operation state machine
pub struct ShieldedLedger {
    accumulator: MerkleAccumulator,
    nullifiers: NullifierRegistry,
    custody: CustodyLedger,
    verifier: Arc<dyn ProofVerifier>,
    next_seq: u64,
}

impl Clone for ShieldedLedger {
    fn clone(&self) -> Self {
        Self {
            accumulator: self.accumulator.clone(),
            nullifiers: self.nullifiers.clone(),
            custody: self.custody.clone(),
            verifier: Arc::clone(&self.verifier),
            next_seq: self.next_seq,
        }
    }
}

impl ShieldedLedger {
    pub fn new(
        depth: usize,
        root_history_size: usize,
        supported_tokens: impl IntoIterator<Item = TokenId>,
        verifier: Arc<dyn ProofVerifier>,
    ) -> Self {
        Self {
            accumulator: MerkleAccumulator::new(depth, root_history_size),
            nullifiers: NullifierRegistry::new(),
            custody: CustodyLedger::new(supported_tokens),
            verifier,
            next_seq: 0,
        }
    }

    /// Apply one operation; fully applied or fully rejected
    pub fn apply(&mut self, op: &Operation) -> Result<SequencedRecord, LedgerError> {
        let record = match op {
            Operation::Shield(op) => self.shield(op)?,
            Operation::Transfer(op) => self.transfer(op)?,
            Operation::Unshield(op) => self.unshield(op)?,
            Operation::Swap(op) => self.swap(op)?,
        };

        debug_assert!(
            self.custody.invariant_holds(),
            "custody invariant violated by accepted operation"
        );

        let seq = self.next_seq;
        self.next_seq += 1;

        info!("applied {} as seq {}", op.kind().as_str(), seq);

        Ok(SequencedRecord { seq, record })
    }

    fn shield(&mut self, op: &ShieldOp) -> Result<LedgerRecord, LedgerError> {
        // validate
        if op.amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if !self.custody.is_supported(&op.token) {
            return Err(LedgerError::UnsupportedToken);
        }
        self.ensure_insertable(&[op.commitment])?;

        // mutate
        let leaf_index = self.accumulator.insert(op.commitment)?;
        self.custody.shield(op.token, op.amount);

        Ok(LedgerRecord::Shielded {
            commitment: op.commitment,
            leaf_index,
            token: op.token,
            amount: op.amount,
        })
    }

    fn transfer(&mut self, op: &TransferOp) -> Result<LedgerRecord, LedgerError> {
        // validate
        self.ensure_known_root(&op.root)?;
        self.ensure_unspent(&op.nullifier_hash)?;
        // The zero sentinel means "no output" and must never become a leaf;
        // only the second output may omit itself
        if op.out_commitment_1.is_zero() {
            return Err(LedgerError::InvalidCommitment);
        }
        self.ensure_insertable(&self.transfer_outputs(op))?;
        if op.fee > 0 && !self.custody.can_release(&TokenId::NATIVE, u128::from(op.fee)) {
            return Err(LedgerError::InsufficientCustody);
        }

        let public_inputs = [
            op.root,
            op.nullifier_hash.0,
            op.out_commitment_1.0,
            op.out_commitment_2.0,
            field_bytes_from_u64(op.fee),
        ];
        if !self
            .verifier
            .verify(OperationKind::Transfer, &public_inputs, &op.proof)
        {
            return Err(LedgerError::InvalidProof);
        }

        // mutate
        self.nullifiers.check_and_spend(op.nullifier_hash)?;
        let leaf_index_1 = self.accumulator.insert(op.out_commitment_1)?;
        let leaf_index_2 = if op.out_commitment_2.is_zero() {
            None
        } else {
            Some(self.accumulator.insert(op.out_commitment_2)?)
        };
        if op.fee > 0 {
            // The fee portion of the spent note leaves the pool to the
            // relayer: both the liability and the real balance shrink
            self.custody.release(TokenId::NATIVE, u128::from(op.fee))?;
        }

        Ok(LedgerRecord::Transferred {
            nullifier_hash: op.nullifier_hash,
            out_commitment_1: op.out_commitment_1,
            out_commitment_2: op.out_commitment_2,
            leaf_index_1,
            leaf_index_2,
            memo_1: op.memo_1.clone(),
            memo_2: op.memo_2.clone(),
        })
    }

    fn unshield(&mut self, op: &UnshieldOp) -> Result<LedgerRecord, LedgerError> {
        // validate
        self.ensure_known_root(&op.root)?;
        self.ensure_unspent(&op.nullifier_hash)?;
        if op.amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if !self.custody.is_supported(&op.token) {
            return Err(LedgerError::UnsupportedToken);
        }

        // The payout must be checked before the nullifier is marked spent:
        // a failed payout must not burn the note
        let payout = u128::from(op.amount) + u128::from(op.fee);
        if !self.custody.can_release(&op.token, payout) {
            return Err(LedgerError::InsufficientCustody);
        }

        if !op.change_commitment.is_zero() {
            self.ensure_insertable(&[op.change_commitment])?;
        }

        let public_inputs = [
            op.root,
            op.nullifier_hash.0,
            op.recipient,
            field_bytes_from_u64(op.amount),
            op.change_commitment.0,
            field_bytes_from_u64(op.fee),
        ];
        if !self
            .verifier
            .verify(OperationKind::Unshield, &public_inputs, &op.proof)
        {
            return Err(LedgerError::InvalidProof);
        }

        // mutate
        self.nullifiers.check_and_spend(op.nullifier_hash)?;
        let change_leaf_index = if op.change_commitment.is_zero() {
            None
        } else {
            Some(self.accumulator.insert(op.change_commitment)?)
        };
        self.custody.release(op.token, payout)?;

        Ok(LedgerRecord::Unshielded {
            nullifier_hash: op.nullifier_hash,
            recipient: op.recipient,
            token: op.token,
            amount: op.amount,
            change_commitment: op.change_commitment,
            change_leaf_index,
        })
    }

    fn swap(&mut self, op: &SwapOp) -> Result<LedgerRecord, LedgerError> {
        // validate
        self.ensure_known_root(&op.root)?;
        self.ensure_unspent(&op.input_nullifier_hash)?;
        if !self.custody.is_supported(&op.token_in) || !self.custody.is_supported(&op.token_out) {
            return Err(LedgerError::UnsupportedToken);
        }
        if op.token_in == op.token_out {
            return Err(LedgerError::UnsupportedToken);
        }
        if op.swap_amount == 0 || op.output_amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if op.out_commitment_1.is_zero() {
            return Err(LedgerError::InvalidCommitment);
        }

        // The slippage bound uses the proof-bound output amount, never a
        // recomputation from a possibly stale price source
        if op.output_amount < op.min_amount_out {
            return Err(LedgerError::SlippageExceeded);
        }

        // Surplus-only liquidity: new token_out liability must be backed by
        // custody the pool already holds beyond its existing liability
        if self.custody.surplus(&op.token_out) < u128::from(op.output_amount) {
            return Err(LedgerError::InsufficientLiquidity);
        }
        if self.custody.total_shielded(&op.token_in) < u128::from(op.swap_amount) {
            return Err(LedgerError::InsufficientCustody);
        }

        self.ensure_insertable(&self.swap_outputs(op))?;

        let public_inputs = [
            op.root,
            op.input_nullifier_hash.0,
            op.out_commitment_1.0,
            op.out_commitment_2.0,
            op.token_in.0,
            op.token_out.0,
            field_bytes_from_u64(op.swap_amount),
            field_bytes_from_u64(op.output_amount),
            field_bytes_from_u64(op.min_amount_out),
        ];
        if !self
            .verifier
            .verify(OperationKind::Swap, &public_inputs, &op.proof)
        {
            return Err(LedgerError::InvalidProof);
        }

        // mutate
        self.nullifiers.check_and_spend(op.input_nullifier_hash)?;
        let leaf_index_1 = self.accumulator.insert(op.out_commitment_1)?;
        let leaf_index_2 = if op.out_commitment_2.is_zero() {
            None
        } else {
            Some(self.accumulator.insert(op.out_commitment_2)?)
        };
        self.custody
            .swap(op.token_in, op.swap_amount, op.token_out, op.output_amount)?;

        Ok(LedgerRecord::Swapped {
            input_nullifier_hash: op.input_nullifier_hash,
            out_commitment_1: op.out_commitment_1,
            out_commitment_2: op.out_commitment_2,
            token_in: op.token_in,
            token_out: op.token_out,
            swap_amount: op.swap_amount,
            output_amount: op.output_amount,
            leaf_index_1,
            leaf_index_2,
            memo: op.memo.clone(),
        })
    }

    // ------------------------------------------------------------------
    // Validation helpers
    // ------------------------------------------------------------------

    fn ensure_known_root(&self, root: &[u8; 32]) -> Result<(), LedgerError> {
        if self.accumulator.is_known_root(root) {
            Ok(())
        } else {
            Err(LedgerError::UnknownRoot)
        }
    }

    fn ensure_unspent(&self, hash: &NullifierHash) -> Result<(), LedgerError> {
        if self.nullifiers.is_spent(hash) {
            Err(LedgerError::AlreadySpent)
        } else {
            Ok(())
        }
    }

    /// Check all prospective inserts up front so the mutation phase cannot
    /// fail halfway: none already present, mutually distinct, and room left
    fn ensure_insertable(&self, commitments: &[Commitment]) -> Result<(), LedgerError> {
        for (i, c) in commitments.iter().enumerate() {
            if self.accumulator.contains(c) {
                return Err(LedgerError::DuplicateCommitment);
            }
            if commitments[..i].contains(c) {
                return Err(LedgerError::DuplicateCommitment);
            }
        }
        if (commitments.len() as u64) > self.accumulator.remaining() {
            return Err(LedgerError::TreeFull);
        }
        Ok(())
    }

    fn transfer_outputs(&self, op: &TransferOp) -> Vec<Commitment> {
        let mut outputs = vec![op.out_commitment_1];
        if !op.out_commitment_2.is_zero() {
            outputs.push(op.out_commitment_2);
        }
        outputs
    }

    fn swap_outputs(&self, op: &SwapOp) -> Vec<Commitment> {
        let mut outputs = vec![op.out_commitment_1];
        if !op.out_commitment_2.is_zero() {
            outputs.push(op.out_commitment_2);
        }
        outputs
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn current_root(&self) -> [u8; 32] {
        self.accumulator.current_root()
    }

    pub fn is_known_root(&self, root: &[u8; 32]) -> bool {
        self.accumulator.is_known_root(root)
    }

    pub fn is_nullifier_spent(&self, hash: &NullifierHash) -> bool {
        self.nullifiers.is_spent(hash)
    }

    pub fn leaf_count(&self) -> u64 {
        self.accumulator.leaf_count()
    }

    pub fn total_shielded(&self, token: &TokenId) -> u128 {
        self.custody.total_shielded(token)
    }

    pub fn actual_custody(&self, token: &TokenId) -> u128 {
        self.custody.actual_custody(token)
    }

    pub fn surplus(&self, token: &TokenId) -> u128 {
        self.custody.surplus(token)
    }

    pub fn custody_invariant_holds(&self) -> bool {
        self.custody.invariant_holds()
    }

    /// Operator top-up of real custody (seeds swap liquidity)
    pub fn fund(&mut self, token: TokenId, amount: u64) {
        self.custody.fund(token, amount);
    }

    /// Sequence number the next accepted operation will get
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_shielded::{EncryptedNote, MockVerifier, Proof};

    const DEPTH: usize = 8;
    const HISTORY: usize = 8;

    fn token(b: u8) -> TokenId {
        TokenId([b; 32])
    }

    fn ledger_with(verifier: Arc<dyn ProofVerifier>) -> ShieldedLedger {
        ShieldedLedger::new(DEPTH, HISTORY, [token(1), token(2)], verifier)
    }

    fn ledger() -> ShieldedLedger {
        ledger_with(Arc::new(MockVerifier::accept_all()))
    }

    fn shield(ledger: &mut ShieldedLedger, c: u8, token_: TokenId, amount: u64) -> SequencedRecord {
        ledger
            .apply(&Operation::Shield(ShieldOp {
                commitment: Commitment([c; 32]),
                token: token_,
                amount,
            }))
            .expect("shield should succeed")
    }

    fn transfer_op(ledger: &ShieldedLedger, nh: u8, out1: u8, out2: u8, fee: u64) -> Operation {
        Operation::Transfer(TransferOp {
            proof: Proof::zero(),
            root: ledger.current_root(),
            nullifier_hash: NullifierHash([nh; 32]),
            out_commitment_1: Commitment([out1; 32]),
            out_commitment_2: Commitment([out2; 32]),
            relayer: [0u8; 32],
            fee,
            memo_1: EncryptedNote::empty(),
            memo_2: EncryptedNote::empty(),
        })
    }

    #[test]
    fn test_shield_updates_custody_and_tree() {
        let mut ledger = ledger();

        let rec = shield(&mut ledger, 1, token(1), 100);

        assert_eq!(rec.seq, 0);
        assert!(matches!(
            rec.record,
            LedgerRecord::Shielded { leaf_index: 0, amount: 100, .. }
        ));
        assert_eq!(ledger.total_shielded(&token(1)), 100);
        assert_eq!(ledger.actual_custody(&token(1)), 100);
        assert_eq!(ledger.leaf_count(), 1);
    }

    #[test]
    fn test_shield_zero_amount_rejected() {
        let mut ledger = ledger();

        let err = ledger
            .apply(&Operation::Shield(ShieldOp {
                commitment: Commitment([1u8; 32]),
                token: token(1),
                amount: 0,
            }))
            .unwrap_err();

        assert_eq!(err, LedgerError::InvalidAmount);
        assert_eq!(ledger.leaf_count(), 0);
    }

    #[test]
    fn test_shield_unsupported_token_rejected() {
        let mut ledger = ledger();

        let err = ledger
            .apply(&Operation::Shield(ShieldOp {
                commitment: Commitment([1u8; 32]),
                token: token(99),
                amount: 10,
            }))
            .unwrap_err();

        assert_eq!(err, LedgerError::UnsupportedToken);
    }

    #[test]
    fn test_transfer_binds_public_inputs() {
        let verifier = Arc::new(MockVerifier::accept_all());
        let mut ledger = ledger_with(verifier.clone());
        shield(&mut ledger, 1, TokenId::NATIVE, 100);

        let op = transfer_op(&ledger, 10, 20, 30, 5);
        ledger.apply(&op).unwrap();

        let calls = verifier.calls();
        assert_eq!(calls.len(), 1);
        let (kind, inputs) = &calls[0];
        assert_eq!(*kind, OperationKind::Transfer);
        assert_eq!(inputs.len(), 5);
        assert_eq!(inputs[1], [10u8; 32], "nullifier hash must be bound");
        assert_eq!(inputs[2], [20u8; 32]);
        assert_eq!(inputs[3], [30u8; 32]);
        assert_eq!(inputs[4], field_bytes_from_u64(5), "fee must be bound");
    }

    #[test]
    fn test_transfer_inserts_outputs_and_pays_fee() {
        let mut ledger = ledger();
        shield(&mut ledger, 1, TokenId::NATIVE, 100);

        let rec = ledger.apply(&transfer_op(&ledger, 10, 20, 30, 5)).unwrap();

        match rec.record {
            LedgerRecord::Transferred {
                leaf_index_1,
                leaf_index_2,
                ..
            } => {
                assert_eq!(leaf_index_1, 1);
                assert_eq!(leaf_index_2, Some(2));
            }
            other => panic!("unexpected record {other:?}"),
        }
        assert_eq!(ledger.total_shielded(&TokenId::NATIVE), 95);
        assert_eq!(ledger.actual_custody(&TokenId::NATIVE), 95);
        assert!(ledger.is_nullifier_spent(&NullifierHash([10u8; 32])));
    }

    #[test]
    fn test_transfer_zero_change_sentinel() {
        let mut ledger = ledger();
        shield(&mut ledger, 1, TokenId::NATIVE, 100);

        let rec = ledger.apply(&transfer_op(&ledger, 10, 20, 0, 0)).unwrap();

        match rec.record {
            LedgerRecord::Transferred { leaf_index_2, .. } => assert_eq!(leaf_index_2, None),
            other => panic!("unexpected record {other:?}"),
        }
        assert_eq!(ledger.leaf_count(), 2, "zero sentinel must not be inserted");
    }

    #[test]
    fn test_transfer_double_spend_no_state_change() {
        let mut ledger = ledger();
        shield(&mut ledger, 1, TokenId::NATIVE, 100);
        ledger.apply(&transfer_op(&ledger, 10, 20, 30, 0)).unwrap();

        let root_before = ledger.current_root();
        let leaves_before = ledger.leaf_count();

        let err = ledger
            .apply(&transfer_op(&ledger, 10, 40, 50, 0))
            .unwrap_err();

        assert_eq!(err, LedgerError::AlreadySpent);
        assert_eq!(ledger.current_root(), root_before, "no state change on reject");
        assert_eq!(ledger.leaf_count(), leaves_before);
    }

    #[test]
    fn test_transfer_invalid_proof_rejected_atomically() {
        let mut ledger = ledger_with(Arc::new(MockVerifier::reject_all()));
        // shield requires no proof, so it still succeeds
        shield(&mut ledger, 1, TokenId::NATIVE, 100);

        let err = ledger
            .apply(&transfer_op(&ledger, 10, 20, 30, 0))
            .unwrap_err();

        assert_eq!(err, LedgerError::InvalidProof);
        assert!(
            !ledger.is_nullifier_spent(&NullifierHash([10u8; 32])),
            "rejected proof must not burn the nullifier"
        );
        assert_eq!(ledger.leaf_count(), 1);
    }

    #[test]
    fn test_transfer_stale_root_rejected() {
        let mut ledger = ShieldedLedger::new(
            DEPTH,
            2,
            [token(1)],
            Arc::new(MockVerifier::accept_all()),
        );

        shield(&mut ledger, 1, TokenId::NATIVE, 100);
        let old_root = ledger.current_root();

        // Two more inserts evict old_root from the 2-deep history
        shield(&mut ledger, 2, TokenId::NATIVE, 100);
        shield(&mut ledger, 3, TokenId::NATIVE, 100);

        let op = Operation::Transfer(TransferOp {
            proof: Proof::zero(),
            root: old_root,
            nullifier_hash: NullifierHash([10u8; 32]),
            out_commitment_1: Commitment([20u8; 32]),
            out_commitment_2: Commitment::ZERO,
            relayer: [0u8; 32],
            fee: 0,
            memo_1: EncryptedNote::empty(),
            memo_2: EncryptedNote::empty(),
        });

        assert_eq!(ledger.apply(&op).unwrap_err(), LedgerError::UnknownRoot);
    }

    #[test]
    fn test_transfer_duplicate_output_rejected() {
        let mut ledger = ledger();
        shield(&mut ledger, 1, TokenId::NATIVE, 100);

        // Output equal to an existing commitment
        let err = ledger.apply(&transfer_op(&ledger, 10, 1, 0, 0)).unwrap_err();
        assert_eq!(err, LedgerError::DuplicateCommitment);

        // Both outputs equal to each other
        let err = ledger
            .apply(&transfer_op(&ledger, 10, 20, 20, 0))
            .unwrap_err();
        assert_eq!(err, LedgerError::DuplicateCommitment);
    }

    #[test]
    fn test_transfer_zero_primary_output_rejected() {
        let mut ledger = ledger();
        shield(&mut ledger, 1, TokenId::NATIVE, 100);

        // A zero first output would insert the sentinel as a real leaf
        let err = ledger.apply(&transfer_op(&ledger, 10, 0, 20, 0)).unwrap_err();

        assert_eq!(err, LedgerError::InvalidCommitment);
        assert!(!ledger.is_nullifier_spent(&NullifierHash([10u8; 32])));
        assert_eq!(ledger.leaf_count(), 1);
    }

    #[test]
    fn test_swap_zero_primary_output_rejected() {
        let mut ledger = ledger();
        shield(&mut ledger, 1, token(1), 100);
        ledger.fund(token(2), 100);

        let err = ledger
            .apply(&Operation::Swap(SwapOp {
                proof: Proof::zero(),
                root: ledger.current_root(),
                input_nullifier_hash: NullifierHash([10u8; 32]),
                out_commitment_1: Commitment::ZERO,
                out_commitment_2: Commitment([30u8; 32]),
                token_in: token(1),
                token_out: token(2),
                swap_amount: 50,
                output_amount: 45,
                min_amount_out: 40,
                memo: EncryptedNote::empty(),
            }))
            .unwrap_err();

        assert_eq!(err, LedgerError::InvalidCommitment);
        assert_eq!(ledger.leaf_count(), 1);
    }

    #[test]
    fn test_unshield_pays_out_and_shrinks_pool() {
        let mut ledger = ledger();
        shield(&mut ledger, 1, token(1), 100);

        let rec = ledger
            .apply(&Operation::Unshield(UnshieldOp {
                proof: Proof::zero(),
                root: ledger.current_root(),
                nullifier_hash: NullifierHash([10u8; 32]),
                recipient: [7u8; 32],
                token: token(1),
                amount: 38,
                change_commitment: Commitment([20u8; 32]),
                relayer: [0u8; 32],
                fee: 2,
            }))
            .unwrap();

        assert!(matches!(
            rec.record,
            LedgerRecord::Unshielded { amount: 38, change_leaf_index: Some(1), .. }
        ));
        assert_eq!(ledger.total_shielded(&token(1)), 60);
        assert_eq!(ledger.actual_custody(&token(1)), 60);
    }

    #[test]
    fn test_unshield_custody_checked_before_nullifier() {
        let mut ledger = ledger();
        shield(&mut ledger, 1, token(1), 100);

        let nh = NullifierHash([10u8; 32]);
        let err = ledger
            .apply(&Operation::Unshield(UnshieldOp {
                proof: Proof::zero(),
                root: ledger.current_root(),
                nullifier_hash: nh,
                recipient: [7u8; 32],
                token: token(1),
                amount: 200,
                change_commitment: Commitment::ZERO,
                relayer: [0u8; 32],
                fee: 0,
            }))
            .unwrap_err();

        assert_eq!(err, LedgerError::InsufficientCustody);
        assert!(
            !ledger.is_nullifier_spent(&nh),
            "failed payout must not burn the note"
        );
    }

    #[test]
    fn test_swap_requires_surplus_liquidity() {
        let mut ledger = ledger();
        shield(&mut ledger, 1, token(1), 100);

        let op = Operation::Swap(SwapOp {
            proof: Proof::zero(),
            root: ledger.current_root(),
            input_nullifier_hash: NullifierHash([10u8; 32]),
            out_commitment_1: Commitment([20u8; 32]),
            out_commitment_2: Commitment([30u8; 32]),
            token_in: token(1),
            token_out: token(2),
            swap_amount: 50,
            output_amount: 45,
            min_amount_out: 40,
            memo: EncryptedNote::empty(),
        });

        // No token(2) custody at all: accepting would mint an unbacked note
        assert_eq!(
            ledger.apply(&op).unwrap_err(),
            LedgerError::InsufficientLiquidity
        );
        assert!(ledger.custody_invariant_holds());

        // With surplus seeded, the same swap goes through
        ledger.fund(token(2), 45);
        ledger.apply(&op).unwrap();

        assert_eq!(ledger.total_shielded(&token(1)), 50);
        assert_eq!(ledger.total_shielded(&token(2)), 45);
        assert!(ledger.custody_invariant_holds());
    }

    #[test]
    fn test_swap_slippage_uses_bound_output() {
        let mut ledger = ledger();
        shield(&mut ledger, 1, token(1), 100);
        ledger.fund(token(2), 100);

        let err = ledger
            .apply(&Operation::Swap(SwapOp {
                proof: Proof::zero(),
                root: ledger.current_root(),
                input_nullifier_hash: NullifierHash([10u8; 32]),
                out_commitment_1: Commitment([20u8; 32]),
                out_commitment_2: Commitment::ZERO,
                token_in: token(1),
                token_out: token(2),
                swap_amount: 50,
                output_amount: 39,
                min_amount_out: 40,
                memo: EncryptedNote::empty(),
            }))
            .unwrap_err();

        assert_eq!(err, LedgerError::SlippageExceeded);
    }

    #[test]
    fn test_swap_same_token_rejected() {
        let mut ledger = ledger();
        shield(&mut ledger, 1, token(1), 100);

        let err = ledger
            .apply(&Operation::Swap(SwapOp {
                proof: Proof::zero(),
                root: ledger.current_root(),
                input_nullifier_hash: NullifierHash([10u8; 32]),
                out_commitment_1: Commitment([20u8; 32]),
                out_commitment_2: Commitment::ZERO,
                token_in: token(1),
                token_out: token(1),
                swap_amount: 50,
                output_amount: 50,
                min_amount_out: 0,
                memo: EncryptedNote::empty(),
            }))
            .unwrap_err();

        assert_eq!(err, LedgerError::UnsupportedToken);
    }

    #[test]
    fn test_seq_increases_only_on_success() {
        let mut ledger = ledger();

        assert_eq!(shield(&mut ledger, 1, token(1), 10).seq, 0);
        ledger
            .apply(&Operation::Shield(ShieldOp {
                commitment: Commitment([1u8; 32]),
                token: token(1),
                amount: 10,
            }))
            .unwrap_err();
        assert_eq!(shield(&mut ledger, 2, token(1), 10).seq, 1);
    }
}
