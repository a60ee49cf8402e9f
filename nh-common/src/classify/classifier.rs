//! Classifier contract
//!
//! The pre-trained classifier is an external black box. Its capabilities are
//! fixed when the handle is built: either discrete prediction only, or
//! prediction plus per-class confidence aligned with an ordered class list.

use super::features::FeatureMatrix;
use super::labels::ClassCode;
use std::sync::Arc;
use thiserror::Error;

/// Classifier call failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("expected {expected} features, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("feature columns do not match the model: expected {expected:?}, got {actual:?}")]
    FeatureNameMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("non-finite value in feature '{column}' at row {row}")]
    NonFiniteFeature { row: usize, column: String },

    #[error("classifier returned {actual} outputs for {expected} rows")]
    OutputLength { expected: usize, actual: usize },

    #[error("probability row {row} has {actual} entries for {expected} classes")]
    ProbabilityWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("invalid model: {0}")]
    InvalidModel(String),
}

/// Discrete prediction capability
pub trait Classifier: Send + Sync {
    /// One class code per feature row
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<ClassCode>, ClassifierError>;
}

/// Prediction with per-class confidence
pub trait ConfidenceClassifier: Classifier {
    /// Class codes in the column order of the probability matrix
    fn classes(&self) -> &[ClassCode];

    /// Probability matrix `[rows][classes]`
    fn predict_with_confidence(
        &self,
        features: &FeatureMatrix,
    ) -> Result<Vec<Vec<f64>>, ClassifierError>;
}

/// Capability-tagged classifier handle
#[derive(Clone)]
pub enum ClassifierHandle {
    Discrete(Arc<dyn Classifier>),
    WithConfidence(Arc<dyn ConfidenceClassifier>),
}

impl ClassifierHandle {
    pub fn discrete<C: Classifier + 'static>(classifier: C) -> Self {
        ClassifierHandle::Discrete(Arc::new(classifier))
    }

    pub fn with_confidence<C: ConfidenceClassifier + 'static>(classifier: C) -> Self {
        ClassifierHandle::WithConfidence(Arc::new(classifier))
    }

    pub fn supports_confidence(&self) -> bool {
        matches!(self, ClassifierHandle::WithConfidence(_))
    }

    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<ClassCode>, ClassifierError> {
        match self {
            ClassifierHandle::Discrete(c) => c.predict(features),
            ClassifierHandle::WithConfidence(c) => c.predict(features),
        }
    }
}

impl std::fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierHandle::Discrete(_) => f.write_str("ClassifierHandle::Discrete"),
            ClassifierHandle::WithConfidence(c) => f
                .debug_tuple("ClassifierHandle::WithConfidence")
                .field(&c.classes())
                .finish(),
        }
    }
}
