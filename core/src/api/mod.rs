//! HTTP API
//!
//! Thin JSON surface over the relayer and the indexer mirror. Wallets
//! submit operations through `/relay/{operation}` and sync by polling
//! `/root`, `/path/{leaf_index}`, `/nullifier/{hash}`, and
//! `/outputs/{from_leaf}`.

pub mod handlers;
pub mod routes;
pub mod types;

pub use handlers::ApiState;
pub use routes::router;
