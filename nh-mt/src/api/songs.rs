//! Song catalog

use axum::{
    extract::{Path, Query, State},
    Json,
};
use nh_common::db::{default_audio_url, Track};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SongQuery {
    pub category: Option<String>,
    pub limit: Option<usize>,
}

/// GET /api/songs?category=&limit=
pub async fn list_songs(
    State(state): State<AppState>,
    Query(query): Query<SongQuery>,
) -> ApiResult<Json<Vec<Track>>> {
    let songs = state
        .store
        .fetch_songs(query.category.as_deref(), query.limit)
        .await?;
    Ok(Json(songs))
}

/// Track body for PUT; the id comes from the path
#[derive(Debug, Deserialize)]
pub struct SongBody {
    pub name: String,
    pub category: Option<String>,
    pub duration: Option<i64>,
    pub bpm: Option<i64>,
    pub key: Option<String>,
    pub url: Option<String>,
}

/// PUT /api/songs/:song_id
///
/// Tracks without a URL get the default audio source of their category.
pub async fn put_song(
    State(state): State<AppState>,
    Path(song_id): Path<String>,
    Json(body): Json<SongBody>,
) -> ApiResult<Json<Track>> {
    if song_id.trim().is_empty() || body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("song id and name are required".to_string()));
    }

    let url = body.url.or_else(|| {
        let category = body.category.as_deref().unwrap_or_default();
        Some(default_audio_url(category).to_string())
    });
    let track = Track {
        id: song_id.trim().to_string(),
        name: body.name,
        category: body.category,
        duration_secs: body.duration,
        bpm: body.bpm,
        key: body.key,
        url,
    };

    if !state.store.put_song(&track).await {
        return Err(ApiError::storage("put_song", state.store.last_error()));
    }
    Ok(Json(track))
}
