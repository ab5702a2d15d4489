//! API handlers
//!
//! Mutations go through the relayer; reads come from the ledger (roots,
//! nullifiers) or the indexer mirror (paths, encrypted outputs).

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::debug;

use umbra_shielded::NullifierHash;

use crate::indexer::Indexer;
use crate::ledger::ShieldedLedger;
use crate::ledger::ops::Operation;
use crate::relayer::{RelayError, RelayOutcome, Relayer};

use super::types::{
    ErrorResponse, HealthResponse, NullifierResponse, OutputEntry, OutputsResponse, PathResponse,
    RelayResponse, RootResponse, ShieldRequest, SwapRequest, TransferRequest, UnshieldRequest,
};

#[derive(Clone)]
pub struct ApiState {
    pub ledger: Arc<tokio::sync::Mutex<ShieldedLedger>>,
    pub indexer: Arc<tokio::sync::Mutex<Indexer>>,
    pub relayer: Arc<Relayer>,
    pub start_time: Instant,
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: message.into() }),
    )
        .into_response()
}

fn not_found(message: impl Into<String>) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse { error: message.into() }),
    )
        .into_response()
}

pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let ledger = state.ledger.lock().await;
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.start_time.elapsed().as_secs(),
        next_seq: ledger.next_seq(),
    })
}

pub async fn current_root(State(state): State<ApiState>) -> Json<RootResponse> {
    let ledger = state.ledger.lock().await;
    Json(RootResponse {
        root: ledger.current_root(),
        leaf_count: ledger.leaf_count(),
    })
}

pub async fn merkle_path(
    State(state): State<ApiState>,
    Path(leaf_index): Path<u64>,
) -> Response {
    let indexer = state.indexer.lock().await;
    match indexer.path(leaf_index) {
        Some(path) => Json(PathResponse {
            leaf_index,
            siblings: path.siblings.iter().map(hex::encode).collect(),
            path_bits: path.path_bits,
            root: indexer.current_root(),
        })
        .into_response(),
        None => not_found(format!("no leaf at index {leaf_index}")),
    }
}

pub async fn nullifier_status(
    State(state): State<ApiState>,
    Path(hash): Path<String>,
) -> Response {
    let bytes = match hex::decode(&hash) {
        Ok(b) => b,
        Err(e) => return bad_request(format!("nullifier hash is not hex: {e}")),
    };
    let Ok(arr) = <[u8; 32]>::try_from(bytes) else {
        return bad_request("nullifier hash must be 32 bytes");
    };

    let ledger = state.ledger.lock().await;
    Json(NullifierResponse {
        spent: ledger.is_nullifier_spent(&NullifierHash(arr)),
    })
    .into_response()
}

pub async fn encrypted_outputs(
    State(state): State<ApiState>,
    Path(from_leaf): Path<u64>,
) -> Json<OutputsResponse> {
    let indexer = state.indexer.lock().await;
    let outputs = indexer
        .encrypted_outputs(from_leaf)
        .iter()
        .map(|(leaf_index, note)| OutputEntry {
            leaf_index: *leaf_index,
            note: note.into(),
        })
        .collect();
    Json(OutputsResponse { outputs })
}

pub async fn relay_operation(
    State(state): State<ApiState>,
    Path(kind): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let op: Result<Operation, String> = match kind.as_str() {
        "shield" => parse_body::<ShieldRequest>(body),
        "transfer" => parse_body::<TransferRequest>(body),
        "unshield" => parse_body::<UnshieldRequest>(body),
        "swap" => parse_body::<SwapRequest>(body),
        other => return not_found(format!("unknown operation: {other}")),
    };

    let op = match op {
        Ok(op) => op,
        Err(e) => return bad_request(e),
    };

    debug!("relaying {} via api", op.kind().as_str());

    match state.relayer.relay(&op).await {
        Ok(RelayOutcome::Accepted { seq }) => Json(RelayResponse {
            status: "accepted",
            seq: Some(seq),
            error: None,
        })
        .into_response(),
        Ok(RelayOutcome::Rejected { error }) => (
            StatusCode::BAD_REQUEST,
            Json(RelayResponse {
                status: "rejected",
                seq: None,
                error: Some(error.to_string()),
            }),
        )
            .into_response(),
        Ok(RelayOutcome::LostRace) => (
            StatusCode::CONFLICT,
            Json(RelayResponse {
                status: "lost_race",
                seq: None,
                error: None,
            }),
        )
            .into_response(),
        Err(RelayError::ReserveExhausted) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "relayer unavailable".into(),
            }),
        )
            .into_response(),
    }
}

fn parse_body<T>(body: serde_json::Value) -> Result<Operation, String>
where
    T: serde::de::DeserializeOwned + TryInto<Operation, Error = String>,
{
    let request: T = serde_json::from_value(body).map_err(|e| e.to_string())?;
    request.try_into()
}
