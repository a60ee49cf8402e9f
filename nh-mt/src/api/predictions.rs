//! Classification of the current batch and recommendation persistence

use axum::{extract::State, Json};
use nh_common::pipeline::PredictionSummary;
use nh_common::recommend::{CategoryScore, CognitiveSummary};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub summary: PredictionSummary,
    pub ranking: Vec<CategoryScore>,
    pub top_category: Option<String>,
    pub patient_id: Option<String>,
    /// `None` when nothing was persisted (no patient or empty ranking)
    pub saved: Option<bool>,
    pub storage_error: Option<String>,
}

/// POST /api/predictions
///
/// Classifies the current batch. A storage failure does not fail the
/// request; it is reported through `saved` and `storage_error`.
pub async fn run_predictions(State(state): State<AppState>) -> ApiResult<Json<PredictionResponse>> {
    let (summary, ranking, cognitive, patient_id) = {
        let mut session = state.session.write().await;
        let summary = session.pipeline.classify()?;
        let (ranking, cognitive) = match session.pipeline.current() {
            Some(scored) => (scored.ranking(), scored.cognitive_summary()),
            None => (Vec::new(), CognitiveSummary::default()),
        };
        (summary, ranking, cognitive, session.patient_id.clone())
    };

    let mut saved = None;
    let mut storage_error = None;
    if let Some(user_id) = patient_id.as_deref() {
        if !ranking.is_empty() {
            let cognitive = (!cognitive.is_empty()).then_some(&cognitive);
            let ok = state.store.put_recommendations(user_id, &ranking, cognitive).await;
            if ok {
                info!(patient = user_id, categories = ranking.len(), "Saved recommendations");
            } else {
                storage_error = Some(
                    state
                        .store
                        .last_error()
                        .unwrap_or_else(|| "recommendation write failed".to_string()),
                );
                warn!(patient = user_id, "Could not save recommendations");
            }
            saved = Some(ok);
        }
    }

    Ok(Json(PredictionResponse {
        summary,
        top_category: ranking.first().map(|r| r.category.clone()),
        ranking,
        patient_id,
        saved,
        storage_error,
    }))
}
