//! Draft endpoints: the pending assignment list of a section being edited.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info, warn};

use super::load_board;
use crate::catalog::{Day, ScheduleAssignment};
use crate::db::{DraftRecord, DraftStoreError};
use crate::schedule::{Draft, RoomRef, SelectorError};
use crate::server::types::ApiErrorType;
use crate::types::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDraftRequest {
    /// Omit for a section the catalog doesn't have yet
    #[serde(default)]
    pub section_id: Option<i64>,
    /// Overrides the section's schedule as known to the catalog
    #[serde(default)]
    pub initial: Option<Vec<ScheduleAssignment>>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub room: RoomRef,
    pub day: Day,
    pub blocks: Vec<u8>,
}

#[derive(Debug, Deserialize)]
pub struct DraftAvailabilityParams {
    /// Room id or room code
    pub room: String,
    pub day: Day,
}

fn store_error_to_response(error: DraftStoreError) -> Response {
    error!("Draft store failure: {}", error);
    ApiErrorType::from((
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to access drafts",
        Some(error.to_string()),
    ))
    .into_response()
}

fn selector_error_to_response(error: SelectorError) -> Response {
    let (status, message) = match &error {
        SelectorError::BlockUnavailable { .. } => {
            (StatusCode::CONFLICT, "Block is occupied by another section")
        }
        SelectorError::IndexOutOfRange { .. } => {
            (StatusCode::NOT_FOUND, "Pending assignment not found")
        }
        SelectorError::EmptySelection | SelectorError::UnknownBlock(_) => {
            (StatusCode::BAD_REQUEST, "Invalid block selection")
        }
    };

    ApiErrorType::from((status, message, Some(error.to_string()))).into_response()
}

fn draft_not_found(draft_id: i64) -> Response {
    warn!("Draft not found: {}", draft_id);
    ApiErrorType::from((
        StatusCode::NOT_FOUND,
        "Draft not found",
        Some(format!("No draft with ID: {}", draft_id)),
    ))
    .into_response()
}

fn fetch_draft(s: &AppState, draft_id: i64) -> Result<DraftRecord, Response> {
    match s.drafts.get(draft_id) {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err(draft_not_found(draft_id)),
        Err(e) => Err(store_error_to_response(e)),
    }
}

/// Takes the draft's lock and loads it under the lock.
///
/// Unknown draft ids never leave a lock entry behind.
async fn lock_draft(
    s: &AppState,
    draft_id: i64,
) -> Result<(OwnedMutexGuard<()>, DraftRecord), Response> {
    fetch_draft(s, draft_id)?;

    let guard = s.draft_lock(draft_id).lock_owned().await;
    match fetch_draft(s, draft_id) {
        Ok(record) => Ok((guard, record)),
        Err(response) => {
            // Deleted while we waited
            drop(guard);
            s.forget_draft_lock(draft_id);
            Err(response)
        }
    }
}

/// Persists `draft`'s pending list and answers with the stored record plus
/// one extra field describing the change.
fn save_and_respond(
    s: &AppState,
    draft_id: i64,
    draft: &Draft,
    (key, value): (&str, serde_json::Value),
) -> Response {
    match s.drafts.save_pending(draft_id, &draft.pending) {
        Ok(true) => {}
        Ok(false) => return draft_not_found(draft_id),
        Err(e) => return store_error_to_response(e),
    }

    match fetch_draft(s, draft_id) {
        Ok(record) => {
            let mut body = serde_json::Map::new();
            body.insert(key.to_string(), value);
            body.insert("draft".to_string(), json!(record));
            (StatusCode::OK, Json(serde_json::Value::Object(body))).into_response()
        }
        Err(response) => response,
    }
}

/// POST /drafts
/// Opens a draft for a section, seeded with its current schedule
pub async fn post_draft(
    State(s): State<Arc<AppState>>,
    Json(request): Json<CreateDraftRequest>,
) -> Response {
    info!("POST /drafts section={:?}", request.section_id);

    let initial = match (request.initial, request.section_id) {
        (Some(initial), _) => initial,
        (None, Some(section_id)) => {
            let board = match load_board(&s, false).await {
                Ok(board) => board,
                Err(response) => return response,
            };
            match board.find_section(section_id) {
                Some((_, section)) => section.schedule_assignments.clone(),
                None => {
                    warn!("Section not found: {}", section_id);
                    return ApiErrorType::from((
                        StatusCode::NOT_FOUND,
                        "Section not found",
                        Some(format!("No section with ID: {}", section_id)),
                    ))
                    .into_response();
                }
            }
        }
        (None, None) => Vec::new(),
    };

    match s.drafts.create(&Draft::new(request.section_id, initial)) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

/// GET /drafts/:draft_id
pub async fn get_draft(Path(draft_id): Path<i64>, State(s): State<Arc<AppState>>) -> Response {
    info!("GET /drafts/{}", draft_id);

    match fetch_draft(&s, draft_id) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(response) => response,
    }
}

/// GET /drafts/:draft_id/availability?room=...&day=...
/// Block availability with the draft's own initial slots exempted
pub async fn get_draft_availability(
    Path(draft_id): Path<i64>,
    State(s): State<Arc<AppState>>,
    Query(params): Query<DraftAvailabilityParams>,
) -> Response {
    info!(
        "GET /drafts/{}/availability room={} day={}",
        draft_id, params.room, params.day
    );

    if params.room.trim().is_empty() {
        return ApiErrorType::from((
            StatusCode::BAD_REQUEST,
            "Missing room",
            Some("Pass a room id or room code".to_string()),
        ))
        .into_response();
    }

    let record = match fetch_draft(&s, draft_id) {
        Ok(record) => record,
        Err(response) => return response,
    };
    let board = match load_board(&s, false).await {
        Ok(board) => board,
        Err(response) => return response,
    };

    let room = board.parse_room(&params.room);
    let blocks = record.draft.availability(&board.index, &room, params.day);
    (
        StatusCode::OK,
        Json(json!({
            "draftId": draft_id,
            "room": params.room.trim(),
            "day": params.day,
            "blocks": blocks,
            "fingerprint": board.fingerprint,
        })),
    )
        .into_response()
}

/// POST /drafts/:draft_id/blocks
/// Appends the chosen blocks of one room/day to the pending list
pub async fn post_confirm_blocks(
    Path(draft_id): Path<i64>,
    State(s): State<Arc<AppState>>,
    Json(request): Json<ConfirmRequest>,
) -> Response {
    info!(
        "POST /drafts/{}/blocks day={} blocks={:?}",
        draft_id, request.day, request.blocks
    );

    let (_guard, mut record) = match lock_draft(&s, draft_id).await {
        Ok(locked) => locked,
        Err(response) => return response,
    };
    let board = match load_board(&s, false).await {
        Ok(board) => board,
        Err(response) => return response,
    };

    let Some(room) = board.find_room(&request.room) else {
        warn!("Room not found: {:?}", request.room);
        return ApiErrorType::from((
            StatusCode::NOT_FOUND,
            "Room not found",
            Some(format!("No room matching {:?}", request.room)),
        ))
        .into_response();
    };

    match record
        .draft
        .confirm(&board.index, room, request.day, &request.blocks)
    {
        Ok(added) => save_and_respond(&s, draft_id, &record.draft, ("added", json!(added))),
        Err(e) => {
            warn!("Rejected block selection for draft {}: {}", draft_id, e);
            selector_error_to_response(e)
        }
    }
}

/// DELETE /drafts/:draft_id/assignments/:index
/// Removes one pending assignment by position
pub async fn delete_assignment(
    Path((draft_id, index)): Path<(i64, usize)>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("DELETE /drafts/{}/assignments/{}", draft_id, index);

    let (_guard, mut record) = match lock_draft(&s, draft_id).await {
        Ok(locked) => locked,
        Err(response) => return response,
    };

    match record.draft.remove(index) {
        Ok(removed) => save_and_respond(&s, draft_id, &record.draft, ("removed", json!(removed))),
        Err(e) => selector_error_to_response(e),
    }
}

/// DELETE /drafts/:draft_id
pub async fn delete_draft(Path(draft_id): Path<i64>, State(s): State<Arc<AppState>>) -> Response {
    info!("DELETE /drafts/{}", draft_id);

    let deleted = {
        let lock = s.draft_lock(draft_id);
        let _guard = lock.lock().await;
        s.drafts.delete(draft_id)
    };

    match deleted {
        Ok(true) => {
            s.forget_draft_lock(draft_id);
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => {
            s.forget_draft_lock(draft_id);
            draft_not_found(draft_id)
        }
        // The draft may still exist, so holders of its lock must keep it
        Err(e) => store_error_to_response(e),
    }
}
