//! Users and listening events

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use nh_common::db::{Event, User};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Event types a client may log
pub const EVENT_TYPES: [&str; 3] = ["login", "play", "stop"];

#[derive(Debug, Deserialize)]
pub struct UserBody {
    pub user_id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: String,
    pub saved: bool,
}

/// POST /api/users
pub async fn upsert_user(
    State(state): State<AppState>,
    Json(body): Json<UserBody>,
) -> ApiResult<Json<UserResponse>> {
    let user_id = body.user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::BadRequest("user_id is required".to_string()));
    }
    if !state.store.upsert_user(user_id, body.name.trim()).await {
        return Err(ApiError::storage("upsert_user", state.store.last_error()));
    }
    Ok(Json(UserResponse {
        user_id: user_id.to_string(),
        saved: true,
    }))
}

/// GET /api/users/:user_id
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<User>> {
    state
        .store
        .fetch_user(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown user {}", user_id)))
}

#[derive(Debug, Deserialize)]
pub struct EventBody {
    pub event_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// POST /api/users/:user_id/events
pub async fn log_event(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<EventBody>,
) -> ApiResult<StatusCode> {
    if !EVENT_TYPES.contains(&body.event_type.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "Unknown event type '{}'; expected one of {:?}",
            body.event_type, EVENT_TYPES
        )));
    }
    let logged = state
        .store
        .log_event(&user_id, &body.event_type, body.payload)
        .await;
    if !logged {
        return Err(ApiError::storage("log_event", state.store.last_error()));
    }
    Ok(StatusCode::CREATED)
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// GET /api/users/:user_id/events?limit=
///
/// Listening history, newest first.
pub async fn list_events(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<Event>>> {
    Ok(Json(state.store.fetch_events(&user_id, query.limit).await?))
}
