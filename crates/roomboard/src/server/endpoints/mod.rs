use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;

use crate::catalog::CatalogError;
use crate::schedule::Board;
use crate::server::types::ApiErrorType;
use crate::types::AppState;

pub mod drafts;
pub mod occupancy;
pub mod status;

/// Query parameters accepted by read endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshParams {
    /// If true, bypass the snapshot cache and refetch from the catalog
    #[serde(default)]
    pub refresh: bool,
}

/// Converts CatalogError to API response.
///
/// A failed load is never answered as an empty board, so clients can tell
/// "nothing is occupied" from "occupancy is unknown".
fn catalog_error_to_response(error: CatalogError) -> Response {
    let (status, message) = match &error {
        CatalogError::CircuitBreakerOpen => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Catalog temporarily unavailable due to repeated failures",
        ),
        _ => (
            StatusCode::BAD_GATEWAY,
            "Failed to load rooms and subjects from the catalog",
        ),
    };

    ApiErrorType::from((status, message, Some(error.to_string()))).into_response()
}

async fn load_board(state: &AppState, refresh: bool) -> Result<Arc<Board>, Response> {
    state
        .catalog
        .load_board(refresh)
        .await
        .map_err(catalog_error_to_response)
}
