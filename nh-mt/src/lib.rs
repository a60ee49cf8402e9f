//! nh-mt library - music therapy service
//!
//! Caregivers upload EEG batches, get cognitive insights and genre
//! predictions, and persist a ranked recommendation per patient. Listeners
//! fetch a playlist allocated from their stored recommendation.

use axum::Router;
use nh_common::config::TomlConfig;
use nh_common::db::TherapyStore;
use nh_common::recommend::AllocationOptions;
use nh_common::PipelineContext;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Current batch together with the patient it belongs to
///
/// Replaced as a unit on every batch upload.
#[derive(Debug, Default)]
pub struct Session {
    pub pipeline: PipelineContext,
    pub patient_id: Option<String>,
}

/// Service tunables taken from the module config
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ServiceSettings {
    pub allocation: AllocationOptions,
}

impl ServiceSettings {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            allocation: AllocationOptions {
                playlist_size: config.playlist_size,
                renormalize_after_filter: config.renormalize_after_filter,
            },
        }
    }
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<Session>>,
    pub store: Arc<dyn TherapyStore>,
    pub settings: ServiceSettings,
}

impl AppState {
    pub fn new(
        pipeline: PipelineContext,
        store: Arc<dyn TherapyStore>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            session: Arc::new(RwLock::new(Session {
                pipeline,
                patient_id: None,
            })),
            store,
            settings,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    let api = Router::new()
        .route("/api/batches", post(api::upload_batch))
        .route(
            "/api/batches/current",
            get(api::get_current_batch).delete(api::discard_batch),
        )
        .route("/api/insights", get(api::get_insights))
        .route("/api/predictions", post(api::run_predictions))
        .route("/api/recommendations/:user_id", get(api::get_recommendations))
        .route("/api/playlist/:user_id", get(api::get_playlist))
        .route("/api/songs", get(api::list_songs))
        .route("/api/songs/:song_id", put(api::put_song))
        .route("/api/users", post(api::upsert_user))
        .route("/api/users/:user_id", get(api::get_user))
        .route(
            "/api/users/:user_id/events",
            get(api::list_events).post(api::log_event),
        )
        .route("/api/buildinfo", get(api::get_build_info));

    Router::new()
        .merge(api)
        .merge(api::health_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
