//! Stored recommendations and listener playlists

use axum::{
    extract::{Path, Query, State},
    Json,
};
use nh_common::recommend::{
    allocate, build_playlist, Allocation, AllocationOptions, Catalog, PlaylistTrack,
    RecommendationRecord,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Largest playlist a caller may request
const MAX_PLAYLIST_TRACKS: usize = 100;

async fn load_record(state: &AppState, user_id: &str) -> ApiResult<RecommendationRecord> {
    if user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("user_id must not be empty".to_string()));
    }
    state
        .store
        .fetch_recommendations(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No recommendations for {}", user_id)))
}

/// GET /api/recommendations/:user_id
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<RecommendationRecord>> {
    Ok(Json(load_record(&state, &user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct PlaylistQuery {
    pub max_tracks: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PlaylistResponse {
    pub user_id: String,
    pub allocations: Vec<Allocation>,
    pub tracks: Vec<PlaylistTrack>,
}

/// GET /api/playlist/:user_id?max_tracks=
pub async fn get_playlist(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<PlaylistQuery>,
) -> ApiResult<Json<PlaylistResponse>> {
    let playlist_size = query
        .max_tracks
        .unwrap_or(state.settings.allocation.playlist_size);
    if playlist_size == 0 || playlist_size > MAX_PLAYLIST_TRACKS {
        return Err(ApiError::BadRequest(format!(
            "max_tracks must be between 1 and {}",
            MAX_PLAYLIST_TRACKS
        )));
    }

    let record = load_record(&state, &user_id).await?;
    let catalog = Catalog::from_tracks(state.store.fetch_songs(None, None).await?);

    let options = AllocationOptions {
        playlist_size,
        ..state.settings.allocation
    };
    let allocations = allocate(&record.categories, &catalog, options);
    let tracks = build_playlist(&allocations, &catalog, playlist_size);
    debug!(user_id = %user_id, tracks = tracks.len(), "Built playlist");

    Ok(Json(PlaylistResponse {
        user_id,
        allocations,
        tracks,
    }))
}
