//! Common error types for NeuroHarmony

use crate::classify::ClassifierError;
use thiserror::Error;

/// Common result type for NeuroHarmony operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across NeuroHarmony services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding error during batch ingest
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// No batch has been submitted to the pipeline
    #[error("No EEG batch loaded")]
    NoBatch,

    /// The submitted batch has no rows
    #[error("EEG batch contains no rows")]
    EmptyBatch,

    /// No classifier available; scoring works, classification is skipped
    #[error("No pre-trained model available")]
    MissingModel,

    /// Feature selection left nothing to feed the classifier
    #[error("No suitable numeric feature columns found for prediction")]
    NoFeatureColumns,

    /// The classifier call failed; the batch was left untouched
    #[error("Error running predictions: {0}")]
    Classifier(#[from] ClassifierError),

    /// Storage collaborator returned a falsy/null result
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}
