//! Read-only occupancy endpoints: rooms, occupied blocks, selector
//! availability, the day grid and the conflict report.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::{load_board, RefreshParams};
use crate::catalog::{Day, ScheduleAssignment};
use crate::schedule::{availability, GridView, RoomRef};
use crate::server::types::ApiErrorType;
use crate::types::AppState;

#[derive(Debug, Deserialize)]
pub struct OccupancyParams {
    /// Room id or room code
    pub room: String,
    pub day: Day,
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub room: RoomRef,
    pub day: Day,
    /// The edited section's assignments before editing; taken from the
    /// catalog when omitted and `section_id` is given
    #[serde(default)]
    pub initial: Option<Vec<ScheduleAssignment>>,
    #[serde(default)]
    pub section_id: Option<i64>,
}

fn bad_room() -> Response {
    ApiErrorType::from((
        StatusCode::BAD_REQUEST,
        "Missing room",
        Some("Pass a room id or room code".to_string()),
    ))
    .into_response()
}

/// GET /rooms
/// Returns the rooms of the current snapshot
pub async fn get_rooms(
    State(s): State<Arc<AppState>>,
    Query(params): Query<RefreshParams>,
) -> Response {
    info!("GET /rooms (refresh={})", params.refresh);

    match load_board(&s, params.refresh).await {
        Ok(board) => (
            StatusCode::OK,
            Json(json!({
                "fingerprint": board.fingerprint,
                "fetchedAt": board.snapshot.fetched_at,
                "rooms": board.snapshot.rooms,
            })),
        )
            .into_response(),
        Err(response) => response,
    }
}

/// GET /occupancy?room=...&day=...
/// Returns the occupied block numbers of one room on one day
pub async fn get_occupancy(
    State(s): State<Arc<AppState>>,
    Query(params): Query<OccupancyParams>,
) -> Response {
    info!("GET /occupancy room={} day={}", params.room, params.day);

    if params.room.trim().is_empty() {
        return bad_room();
    }

    match load_board(&s, params.refresh).await {
        Ok(board) => {
            let room = board.parse_room(&params.room);
            let blocks = board.index.occupied_blocks(&room, params.day);
            (
                StatusCode::OK,
                Json(json!({
                    "room": params.room.trim(),
                    "day": params.day,
                    "blocks": blocks,
                    "fingerprint": board.fingerprint,
                })),
            )
                .into_response()
        }
        Err(response) => response,
    }
}

/// POST /selector/availability
/// Returns every system block with its occupied/selectable flags
pub async fn post_availability(
    State(s): State<Arc<AppState>>,
    Json(request): Json<AvailabilityRequest>,
) -> Response {
    info!(
        "POST /selector/availability day={} section={:?}",
        request.day, request.section_id
    );

    if request.room.is_empty() {
        return bad_room();
    }

    let board = match load_board(&s, false).await {
        Ok(board) => board,
        Err(response) => return response,
    };

    let initial = match (request.initial, request.section_id) {
        (Some(initial), _) => initial,
        (None, Some(section_id)) => match board.find_section(section_id) {
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
        },
        (None, None) => Vec::new(),
    };

    let blocks = availability(&board.index, &request.room, request.day, &initial);
    (
        StatusCode::OK,
        Json(json!({
            "room": request.room,
            "day": request.day,
            "blocks": blocks,
            "fingerprint": board.fingerprint,
        })),
    )
        .into_response()
}

/// GET /grid/:day
/// Returns the rooms × blocks grid for one day
pub async fn get_grid(
    Path(day): Path<Day>,
    State(s): State<Arc<AppState>>,
    Query(params): Query<RefreshParams>,
) -> Response {
    info!("GET /grid/{} (refresh={})", day, params.refresh);

    match load_board(&s, params.refresh).await {
        Ok(board) => {
            let grid = GridView::for_day(&board.index, &board.snapshot.rooms, day);
            (
                StatusCode::OK,
                Json(json!({
                    "fingerprint": board.fingerprint,
                    "occupiedCells": grid.occupied_cells(),
                    "grid": grid,
                })),
            )
                .into_response()
        }
        Err(response) => response,
    }
}

/// GET /conflicts
/// Returns every (room, day, block) claimed by more than one section
pub async fn get_conflicts(
    State(s): State<Arc<AppState>>,
    Query(params): Query<RefreshParams>,
) -> Response {
    info!("GET /conflicts (refresh={})", params.refresh);

    match load_board(&s, params.refresh).await {
        Ok(board) => {
            let conflicts: Vec<_> = board
                .index
                .conflicts()
                .into_iter()
                .map(|c| {
                    json!({
                        "room": board.room_label(&c.room),
                        "roomKey": c.room,
                        "day": c.day,
                        "blockNumber": c.block_number,
                        "occupants": c.occupants,
                    })
                })
                .collect();

            if !conflicts.is_empty() {
                warn!("{} double-booked cells in current snapshot", conflicts.len());
            }

            (StatusCode::OK, Json(conflicts)).into_response()
        }
        Err(response) => response,
    }
}

/// POST /snapshot/refresh
/// Drops the cached snapshot and loads a fresh one
pub async fn post_refresh(State(s): State<Arc<AppState>>) -> Response {
    info!("POST /snapshot/refresh");

    s.catalog.invalidate();
    match load_board(&s, true).await {
        Ok(board) => (
            StatusCode::OK,
            Json(json!({
                "fingerprint": board.fingerprint,
                "fetchedAt": board.snapshot.fetched_at,
                "rooms": board.snapshot.rooms.len(),
                "subjects": board.snapshot.subjects.len(),
            })),
        )
            .into_response(),
        Err(response) => response,
    }
}
