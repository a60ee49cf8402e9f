//! Health check and build information

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub model_loaded: bool,
    pub storage: String,
}

/// GET /health
///
/// Always answers 200; a failing store reports `"degraded"`.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_loaded = state.session.read().await.pipeline.has_classifier();
    let storage_ok = state.store.health_check().await;

    Json(HealthResponse {
        status: if storage_ok { "ok" } else { "degraded" }.to_string(),
        module: "nh-mt".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded,
        storage: if storage_ok { "ok" } else { "unavailable" }.to_string(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
pub struct BuildInfo {
    pub version: String,
    pub git_hash: String,
    pub build_timestamp: String,
    pub build_profile: String,
}

/// GET /api/buildinfo
pub async fn get_build_info() -> Json<BuildInfo> {
    Json(BuildInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        build_profile: env!("BUILD_PROFILE").to_string(),
    })
}
