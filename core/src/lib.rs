//! Umbra core service
//!
//! Single-node shielded pool: the ledger applies operations in one total
//! order, the relayer fronts submission costs for fee privacy, and the
//! indexer mirrors accepted records for wallet sync.

pub mod api;
pub mod config;
pub mod indexer;
pub mod ledger;
pub mod relayer;
pub mod verifier;
