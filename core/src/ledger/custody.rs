//! Custody Accounting
//!
//! Per-token double entry: `total_shielded` is what the pool privately owes
//! across all unspent notes of a token; `actual_custody` is what it really
//! holds. The invariant that must survive every operation is
//!
//! ```text
//! total_shielded[token] <= actual_custody[token]   for every token
//! ```
//!
//! Shield raises both sides together, unshield lowers both together, and a
//! swap may only create `total_shielded` liability out of pre-existing
//! surplus custody — never out of thin air.

use std::collections::{HashMap, HashSet};

use umbra_shielded::TokenId;

use super::error::LedgerError;

#[derive(Debug, Clone)]
pub struct CustodyLedger {
    /// Private liability per token: sum over all unspent notes
    total_shielded: HashMap<TokenId, u128>,
    /// Real balance held per token
    actual_custody: HashMap<TokenId, u128>,
    /// Tokens this deployment accepts
    supported: HashSet<TokenId>,
}

impl CustodyLedger {
    /// Create a custody ledger; the native token is always supported
    pub fn new(supported: impl IntoIterator<Item = TokenId>) -> Self {
        let mut tokens: HashSet<TokenId> = supported.into_iter().collect();
        tokens.insert(TokenId::NATIVE);

        Self {
            total_shielded: HashMap::new(),
            actual_custody: HashMap::new(),
            supported: tokens,
        }
    }

    pub fn is_supported(&self, token: &TokenId) -> bool {
        self.supported.contains(token)
    }

    pub fn total_shielded(&self, token: &TokenId) -> u128 {
        self.total_shielded.get(token).copied().unwrap_or(0)
    }

    pub fn actual_custody(&self, token: &TokenId) -> u128 {
        self.actual_custody.get(token).copied().unwrap_or(0)
    }

    /// Custody held beyond the shielded liability; the only value a swap may
    /// convert into new liability
    pub fn surplus(&self, token: &TokenId) -> u128 {
        self.actual_custody(token)
            .saturating_sub(self.total_shielded(token))
    }

    /// Shield: real funds came in and a matching note liability was created
    pub fn shield(&mut self, token: TokenId, amount: u64) {
        *self.total_shielded.entry(token).or_insert(0) += u128::from(amount);
        *self.actual_custody.entry(token).or_insert(0) += u128::from(amount);
    }

    /// Operator top-up of real custody with no matching liability
    /// (seeds the surplus that backs swap outputs)
    pub fn fund(&mut self, token: TokenId, amount: u64) {
        *self.actual_custody.entry(token).or_insert(0) += u128::from(amount);
    }

    /// Whether `amount` can leave the pool for this token
    pub fn can_release(&self, token: &TokenId, amount: u128) -> bool {
        self.total_shielded(token) >= amount && self.actual_custody(token) >= amount
    }

    /// Unshield / fee payout: value leaves both the liability and the
    /// real balance. Callers must have checked `can_release` during
    /// validation; this re-checks to stay safe against misuse.
    pub fn release(&mut self, token: TokenId, amount: u128) -> Result<(), LedgerError> {
        if !self.can_release(&token, amount) {
            return Err(LedgerError::InsufficientCustody);
        }
        *self.total_shielded.entry(token).or_insert(0) -= amount;
        *self.actual_custody.entry(token).or_insert(0) -= amount;
        Ok(())
    }

    /// Swap: move liability from `token_in` to `token_out` without moving
    /// custody. The `token_out` side must be backed by surplus.
    pub fn swap(
        &mut self,
        token_in: TokenId,
        swap_amount: u64,
        token_out: TokenId,
        output_amount: u64,
    ) -> Result<(), LedgerError> {
        if self.total_shielded(&token_in) < u128::from(swap_amount) {
            return Err(LedgerError::InsufficientCustody);
        }
        if self.surplus(&token_out) < u128::from(output_amount) {
            return Err(LedgerError::InsufficientLiquidity);
        }

        *self.total_shielded.entry(token_in).or_insert(0) -= u128::from(swap_amount);
        *self.total_shielded.entry(token_out).or_insert(0) += u128::from(output_amount);

        Ok(())
    }

    /// The invariant every reachable state must satisfy
    pub fn invariant_holds(&self) -> bool {
        self.total_shielded
            .iter()
            .all(|(token, total)| *total <= self.actual_custody(token))
    }
}
