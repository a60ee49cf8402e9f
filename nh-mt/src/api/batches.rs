//! EEG batch upload, inspection and cognitive insights

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use nh_common::classify::Prediction;
use nh_common::eeg::{parse_csv, BandValues, Column, CognitiveScores};
use nh_common::recommend::CognitiveSummary;
use nh_common::Error;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Patient whose recommendation record this batch feeds
    pub patient_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub rows: usize,
    pub columns: Vec<Column>,
    pub patient_id: Option<String>,
    pub cognitive_scores: CognitiveSummary,
    pub model_loaded: bool,
}

/// POST /api/batches?patient_id=
///
/// Body is CSV text with a header row. Replaces the current batch and its
/// patient wholesale.
pub async fn upload_batch(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: String,
) -> ApiResult<Json<UploadResponse>> {
    if body.trim().is_empty() {
        return Err(ApiError::BadRequest("Request body must be CSV text".to_string()));
    }
    let batch = parse_csv(&body)?;
    let patient_id = query
        .patient_id
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let mut session = state.session.write().await;
    let model_loaded = session.pipeline.has_classifier();
    let scored = session.pipeline.submit(batch);
    let response = UploadResponse {
        rows: scored.len(),
        columns: scored.batch.columns.clone(),
        patient_id: patient_id.clone(),
        cognitive_scores: scored.cognitive_summary(),
        model_loaded,
    };
    session.patient_id = patient_id;

    info!(
        rows = response.rows,
        patient = response.patient_id.as_deref().unwrap_or("-"),
        "Loaded EEG batch"
    );
    Ok(Json(response))
}

/// One scored row; non-finite numbers serialize as null
#[derive(Debug, Serialize)]
pub struct RowView {
    pub index: usize,
    pub timestamp: Option<String>,
    pub label: Option<String>,
    pub bands: BandValues,
    pub scores: CognitiveScores,
    pub normalized: CognitiveScores,
    pub prediction: Option<Prediction>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub patient_id: Option<String>,
    pub columns: Vec<Column>,
    pub classified: bool,
    pub rows: Vec<RowView>,
}

/// GET /api/batches/current
pub async fn get_current_batch(State(state): State<AppState>) -> ApiResult<Json<BatchResponse>> {
    let session = state.session.read().await;
    let scored = session.pipeline.current().ok_or(Error::NoBatch)?;

    let rows = scored
        .batch
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| RowView {
            index: i,
            timestamp: row.timestamp.map(|t| t.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            label: row.label.clone(),
            bands: scored.bands[i],
            scores: scored.raw[i],
            normalized: scored.normalized[i],
            prediction: scored.predictions.as_ref().and_then(|p| p.get(i).cloned()),
        })
        .collect();

    Ok(Json(BatchResponse {
        patient_id: session.patient_id.clone(),
        columns: scored.batch.columns.clone(),
        classified: scored.predictions.is_some(),
        rows,
    }))
}

/// DELETE /api/batches/current
pub async fn discard_batch(State(state): State<AppState>) -> ApiResult<StatusCode> {
    let mut session = state.session.write().await;
    session.pipeline.discard().ok_or(Error::NoBatch)?;
    session.patient_id = None;
    info!("Discarded current EEG batch");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub rows: usize,
    pub patient_id: Option<String>,
    /// Means of the normalized scores, focus inverted
    pub cognitive_scores: CognitiveSummary,
    /// Average engagement clamped to the 0-10 scale
    pub engagement_achieved: Option<f64>,
}

/// GET /api/insights
pub async fn get_insights(State(state): State<AppState>) -> ApiResult<Json<InsightsResponse>> {
    let session = state.session.read().await;
    let scored = session.pipeline.current().ok_or(Error::NoBatch)?;
    let summary = scored.cognitive_summary();

    Ok(Json(InsightsResponse {
        rows: scored.len(),
        patient_id: session.patient_id.clone(),
        cognitive_scores: summary,
        engagement_achieved: summary.engagement.map(|e| e.clamp(0.0, 10.0)),
    }))
}
