use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::schedule::SYSTEM_BLOCKS;
use crate::types::AppState;

/// GET /health
pub async fn get_health() -> Response {
    (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
}

/// GET /blocks
/// Returns the fixed list of system blocks
pub async fn get_blocks() -> Response {
    (StatusCode::OK, Json(SYSTEM_BLOCKS.to_vec())).into_response()
}

/// GET /status
/// Returns snapshot cache and circuit breaker state for monitoring
pub async fn get_status(State(s): State<Arc<AppState>>) -> Response {
    let catalog = s.catalog.state();
    let cached = catalog.cache.get();

    (
        StatusCode::OK,
        Json(json!({
            "snapshotCached": cached.is_some(),
            "snapshotFingerprint": cached.as_ref().map(|b| b.fingerprint.clone()),
            "snapshotAgeSecs": catalog.cache.age().map(|a| a.as_secs()),
            "snapshotTtlSecs": catalog.cache.ttl().as_secs(),
            "catalogFailures": catalog.circuit_breaker.failure_count(),
            "draftLocks": s.draft_locks.len(),
        })),
    )
        .into_response()
}
