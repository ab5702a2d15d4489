//! Umbra node entrypoint
//!
//! Wires config, ledger, relayer, indexer, and the HTTP API together and
//! serves until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{info, warn};

use umbra_core::api::{self, ApiState};
use umbra_core::config::UmbraConfig;
use umbra_core::indexer::Indexer;
use umbra_core::ledger::ShieldedLedger;
use umbra_core::relayer::Relayer;
use umbra_core::verifier::Groth16Verifier;
use umbra_shielded::{MockVerifier, ProofVerifier};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = UmbraConfig::load()?;
    let tokens = config.supported_tokens()?;

    let verifier: Arc<dyn ProofVerifier> = if config.features.dev_mode {
        warn!("dev mode: all proofs accepted, do not expose this node");
        Arc::new(MockVerifier::accept_all().silent())
    } else {
        Arc::new(
            Groth16Verifier::load(&config.ledger.verifying_key_dir)
                .context("loading verifying keys")?,
        )
    };

    let ledger = Arc::new(tokio::sync::Mutex::new(ShieldedLedger::new(
        config.ledger.tree_depth,
        config.ledger.root_history,
        tokens,
        verifier,
    )));
    let indexer = Arc::new(tokio::sync::Mutex::new(Indexer::new(
        config.ledger.tree_depth,
    )));

    let (records_tx, mut records_rx) = tokio::sync::mpsc::unbounded_channel();
    let relayer = Arc::new(Relayer::new(
        ledger.clone(),
        records_tx,
        config.relayer.base_cost,
        config.relayer.reserve,
    ));

    // Indexer feed: every accepted record lands in the mirror
    let indexer_feed = indexer.clone();
    tokio::spawn(async move {
        while let Some(record) = records_rx.recv().await {
            indexer_feed.lock().await.apply(record);
        }
        info!("record channel closed; indexer feed stopped");
    });

    let state = ApiState {
        ledger,
        indexer,
        relayer,
        start_time: Instant::now(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api.port));
    info!("umbra node listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, api::router(state))
        .await
        .context("serving api")?;

    Ok(())
}
