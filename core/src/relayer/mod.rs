//! Relayer
//!
//! Accepts operations on behalf of wallets so that fee payment never links
//! back to the sender. Every submission is simulated against a snapshot of
//! the ledger first; only operations that pass simulation are submitted for
//! real, and the gap between the two is surfaced as a distinct `LostRace`
//! outcome when another spend of the same nullifier lands in between.
//!
//! The relayer fronts the execution cost of each submission from a bounded
//! native reserve and earns the operation's fee back on acceptance. When
//! the reserve cannot cover one more submission the relayer refuses service
//! instead of submitting at a loss.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::{info, warn};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use umbra_shielded::TokenId;

use crate::ledger::error::LedgerError;
use crate::ledger::ops::{Operation, SequencedRecord};
use crate::ledger::ShieldedLedger;

/// Terminal outcome of one relayed operation
#[derive(Debug, Clone)]
pub enum RelayOutcome {
    /// Applied; the record is on its way to the indexer
    Accepted { seq: u64 },
    /// Failed validation in simulation; nothing was submitted
    Rejected { error: LedgerError },
    /// Passed simulation but another spend of the same nullifier landed
    /// first; the submission cost is gone, the note is not ours to blame
    LostRace,
}

#[derive(Debug, Error)]
pub enum RelayError {
    /// The reserve cannot cover one more submission
    #[error("relayer unavailable")]
    ReserveExhausted,
}

pub struct Relayer {
    ledger: Arc<tokio::sync::Mutex<ShieldedLedger>>,
    records_tx: UnboundedSender<SequencedRecord>,
    /// Execution cost fronted per submission, in native units
    base_cost: u64,
    reserve: Mutex<u64>,
    /// Fees earned per token since start
    earned: Mutex<HashMap<TokenId, u128>>,
}

impl Relayer {
    pub fn new(
        ledger: Arc<tokio::sync::Mutex<ShieldedLedger>>,
        records_tx: UnboundedSender<SequencedRecord>,
        base_cost: u64,
        reserve: u64,
    ) -> Self {
        Self {
            ledger,
            records_tx,
            base_cost,
            reserve: Mutex::new(reserve),
            earned: Mutex::new(HashMap::new()),
        }
    }

    /// Relay one operation end to end: reserve check, simulation, submit
    pub async fn relay(&self, op: &Operation) -> Result<RelayOutcome, RelayError> {
        self.ensure_reserve()?;

        if let Err(error) = self.simulate(op).await {
            return Ok(RelayOutcome::Rejected { error });
        }

        // The ledger lock is released between simulation and submission,
        // so a competing spend can land here; submit() classifies that
        self.submit(op).await
    }

    /// Dry-run the operation against a snapshot of the current state
    pub async fn simulate(&self, op: &Operation) -> Result<(), LedgerError> {
        let mut snapshot = self.ledger.lock().await.clone();
        snapshot.apply(op).map(|_| ())
    }

    /// Submit for real, paying the base cost from the reserve win or lose
    pub async fn submit(&self, op: &Operation) -> Result<RelayOutcome, RelayError> {
        self.charge_base_cost()?;

        let result = {
            let mut ledger = self.ledger.lock().await;
            ledger.apply(op)
        };

        match result {
            Ok(record) => {
                self.credit_fee(op);
                let seq = record.seq;
                // A closed receiver means the indexer task is gone; the
                // ledger state is still authoritative, so log and move on
                if self.records_tx.send(record).is_err() {
                    warn!("record channel closed; indexer will need a replay");
                }
                info!("relayed {} accepted as seq {}", op.kind().as_str(), seq);
                Ok(RelayOutcome::Accepted { seq })
            }
            // Simulation passed, so a nullifier clash now means someone
            // else spent the same note in the window
            Err(LedgerError::AlreadySpent) => {
                info!("relayed {} lost the spend race", op.kind().as_str());
                Ok(RelayOutcome::LostRace)
            }
            Err(error) => Ok(RelayOutcome::Rejected { error }),
        }
    }

    fn ensure_reserve(&self) -> Result<(), RelayError> {
        let reserve = self.reserve.lock().unwrap_or_else(|e| e.into_inner());
        if *reserve < self.base_cost {
            return Err(RelayError::ReserveExhausted);
        }
        Ok(())
    }

    fn charge_base_cost(&self) -> Result<(), RelayError> {
        let mut reserve = self.reserve.lock().unwrap_or_else(|e| e.into_inner());
        if *reserve < self.base_cost {
            return Err(RelayError::ReserveExhausted);
        }
        *reserve -= self.base_cost;
        Ok(())
    }

    fn credit_fee(&self, op: &Operation) {
        let fee = op.fee();
        if fee == 0 {
            return;
        }
        let mut earned = self.earned.lock().unwrap_or_else(|e| e.into_inner());
        *earned.entry(op.fee_token()).or_insert(0) += u128::from(fee);
    }

    /// Native units still available for fronting submissions
    pub fn reserve_remaining(&self) -> u64 {
        *self.reserve.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fees earned in `token` since start
    pub fn earned(&self, token: &TokenId) -> u128 {
        self.earned
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(token)
            .copied()
            .unwrap_or(0)
    }
}
