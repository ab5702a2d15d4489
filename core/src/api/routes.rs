//! Route table

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use super::handlers::{self, ApiState};

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/root", get(handlers::current_root))
        .route("/path/{leaf_index}", get(handlers::merkle_path))
        .route("/nullifier/{hash}", get(handlers::nullifier_status))
        .route("/outputs/{from_leaf}", get(handlers::encrypted_outputs))
        .route("/relay/{operation}", post(handlers::relay_operation))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
