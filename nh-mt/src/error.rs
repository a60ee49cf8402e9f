//! Error types for nh-mt
//!
//! Every handler error renders as `{"error": {"code", "message"}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nh_common::Error as CommonError;
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Storage call returned a falsy result (503)
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// nh-common error, mapped per variant
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl ApiError {
    /// Storage failure, carrying the store's last error text when present
    pub fn storage(operation: &str, last_error: Option<String>) -> Self {
        match last_error {
            Some(detail) => {
                ApiError::StorageUnavailable(format!("{} failed: {}", operation, detail))
            }
            None => ApiError::StorageUnavailable(format!("{} failed", operation)),
        }
    }

    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::StorageUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Common(err) => match err {
                CommonError::NoBatch => (StatusCode::NOT_FOUND, "NO_BATCH"),
                CommonError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CommonError::EmptyBatch => (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_BATCH"),
                CommonError::MissingModel => (StatusCode::CONFLICT, "MISSING_MODEL"),
                CommonError::NoFeatureColumns => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "NO_FEATURE_COLUMNS")
                }
                CommonError::Classifier(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "CLASSIFIER_ERROR")
                }
                CommonError::StorageUnavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE")
                }
                CommonError::Csv(_) | CommonError::InvalidInput(_) => {
                    (StatusCode::BAD_REQUEST, "BAD_REQUEST")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.parts();
        let message = match &self {
            ApiError::Common(err) => err.to_string(),
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::StorageUnavailable(msg)
            | ApiError::Internal(msg) => msg.clone(),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
