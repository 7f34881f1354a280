use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::server::endpoints::{drafts, occupancy, status};
use crate::types::AppState;

mod endpoints;
mod types;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Read-only views over the current occupancy board
    let occupancy_router = Router::new()
        .route("/rooms", get(occupancy::get_rooms))
        .route("/occupancy", get(occupancy::get_occupancy))
        .route("/selector/availability", post(occupancy::post_availability))
        .route("/grid/:day", get(occupancy::get_grid))
        .route("/conflicts", get(occupancy::get_conflicts))
        .route("/snapshot/refresh", post(occupancy::post_refresh));

    // Pending assignment lists of sections being edited
    let draft_router = Router::new()
        .route("/drafts", post(drafts::post_draft))
        .route(
            "/drafts/:draft_id",
            get(drafts::get_draft).delete(drafts::delete_draft),
        )
        .route(
            "/drafts/:draft_id/availability",
            get(drafts::get_draft_availability),
        )
        .route("/drafts/:draft_id/blocks", post(drafts::post_confirm_blocks))
        .route(
            "/drafts/:draft_id/assignments/:index",
            delete(drafts::delete_assignment),
        );

    Router::new()
        .route("/health", get(status::get_health))
        .route("/status", get(status::get_status))
        .route("/blocks", get(status::get_blocks))
        .merge(occupancy_router)
        .merge(draft_router)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::endpoints::test_util::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        };

        let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_grid_route_parses_day() {
        let router = create_router(scenario_state());

        let (status, body) = call(&router, "GET", "/grid/MONDAY", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["grid"]["day"], "MONDAY");
        assert_eq!(body["occupiedCells"], 1);

        let (status, _) = call(&router, "GET", "/grid/someday", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_occupancy_query_string() {
        let router = create_router(scenario_state());

        let (status, body) = call(&router, "GET", "/occupancy?room=LG1-402&day=MONDAY", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["blocks"], json!([3]));

        let (status, body) = call(&router, "GET", "/occupancy?room=2&day=TUESDAY", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["blocks"], json!([5]));

        let (status, _) = call(&router, "GET", "/occupancy?room=LG1-402", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_camel_case_request_bodies() {
        let router = create_router(scenario_state());

        let (status, body) = call(
            &router,
            "POST",
            "/selector/availability",
            Some(json!({ "room": { "code": "LG1-402" }, "day": "MONDAY", "sectionId": 100 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["blocks"][2]["selfOwned"], true);

        let (status, body) = call(&router, "POST", "/drafts", Some(json!({ "sectionId": 200 }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["sectionId"], 200);
        assert_eq!(body["pending"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_draft_routes() {
        let state = scenario_state();
        let router = create_router(state.clone());

        let (_, body) = call(&router, "POST", "/drafts", Some(json!({}))).await;
        let draft_id = body["draftId"].as_i64().unwrap();

        let (status, body) = call(
            &router,
            "POST",
            &format!("/drafts/{draft_id}/blocks"),
            Some(json!({ "room": { "id": 2 }, "day": "TUESDAY", "blocks": [5, 6] })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Block is occupied by another section");

        let (status, body) = call(
            &router,
            "GET",
            &format!("/drafts/{draft_id}/availability?room=LG1-403&day=TUESDAY"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["draftId"], draft_id);
        assert_eq!(body["blocks"][4]["selectable"], false);

        let (status, _) = call(&router, "DELETE", "/drafts/9999/assignments/0", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&router, "DELETE", &format!("/drafts/{draft_id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.draft_locks.is_empty());

        let (status, body) = call(&router, "GET", "/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["draftLocks"], 0);
    }
}
