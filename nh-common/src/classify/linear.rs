//! Linear model artifact
//!
//! A multinomial linear classifier exported to JSON:
//!
//! ```json
//! {
//!   "classes": [1, 2, 3, 4, 5],
//!   "feature_names": ["Delta_TP9_mean", "..."],
//!   "weights": [[0.1, "..."], "..."],
//!   "intercepts": [0.0, "..."],
//!   "supports_confidence": true
//! }
//! ```
//!
//! `predict` takes the arg-max logit (first maximum wins); confidence is the
//! softmax of the logits.

use super::classifier::{Classifier, ClassifierError, ClassifierHandle, ConfidenceClassifier};
use super::features::FeatureMatrix;
use super::labels::ClassCode;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub classes: Vec<ClassCode>,
    /// When present, the selected feature columns must match exactly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    /// `[class][feature]`
    pub weights: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
    #[serde(default = "default_supports_confidence")]
    pub supports_confidence: bool,
}

fn default_supports_confidence() -> bool {
    true
}

impl LinearModel {
    /// Check internal consistency of the artifact
    pub fn validate(&self) -> std::result::Result<(), ClassifierError> {
        if self.classes.is_empty() {
            return Err(ClassifierError::InvalidModel("no classes".to_string()));
        }
        if self.weights.len() != self.classes.len() || self.intercepts.len() != self.classes.len() {
            return Err(ClassifierError::InvalidModel(format!(
                "{} classes but {} weight rows and {} intercepts",
                self.classes.len(),
                self.weights.len(),
                self.intercepts.len()
            )));
        }
        let width = self.weights[0].len();
        if width == 0 || self.weights.iter().any(|w| w.len() != width) {
            return Err(ClassifierError::InvalidModel(
                "weight rows must be non-empty and equally long".to_string(),
            ));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != width {
                return Err(ClassifierError::InvalidModel(format!(
                    "{} feature names for {} weights per class",
                    names.len(),
                    width
                )));
            }
        }
        Ok(())
    }

    pub fn feature_count(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    /// Parse and validate a JSON artifact
    pub fn from_json(json: &str) -> Result<Self> {
        let model: LinearModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Load and validate an artifact from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Wrap into a handle with the capability declared by the artifact
    pub fn into_handle(self) -> ClassifierHandle {
        if self.supports_confidence {
            ClassifierHandle::with_confidence(self)
        } else {
            ClassifierHandle::discrete(self)
        }
    }

    fn check_features(&self, features: &FeatureMatrix) -> std::result::Result<(), ClassifierError> {
        if features.width() != self.feature_count() {
            return Err(ClassifierError::FeatureCountMismatch {
                expected: self.feature_count(),
                actual: features.width(),
            });
        }
        if let Some(names) = &self.feature_names {
            if names != &features.columns {
                return Err(ClassifierError::FeatureNameMismatch {
                    expected: names.clone(),
                    actual: features.columns.clone(),
                });
            }
        }
        for (row, values) in features.values.iter().enumerate() {
            if let Some(col) = values.iter().position(|v| !v.is_finite()) {
                return Err(ClassifierError::NonFiniteFeature {
                    row,
                    column: features.columns[col].clone(),
                });
            }
        }
        Ok(())
    }

    fn logits(&self, row: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| w.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect()
    }
}

/// Index of the first maximum, NaN entries ignored
pub(crate) fn arg_max(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &v) in values.iter().enumerate().filter(|(_, v)| !v.is_nan()) {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((idx, v)),
        }
    }
    best.map(|(idx, _)| idx)
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl Classifier for LinearModel {
    fn predict(
        &self,
        features: &FeatureMatrix,
    ) -> std::result::Result<Vec<ClassCode>, ClassifierError> {
        self.check_features(features)?;
        features
            .values
            .iter()
            .map(|row| {
                arg_max(&self.logits(row))
                    .map(|idx| self.classes[idx].clone())
                    .ok_or_else(|| ClassifierError::InvalidModel("no classes".to_string()))
            })
            .collect()
    }
}

impl ConfidenceClassifier for LinearModel {
    fn classes(&self) -> &[ClassCode] {
        &self.classes
    }

    fn predict_with_confidence(
        &self,
        features: &FeatureMatrix,
    ) -> std::result::Result<Vec<Vec<f64>>, ClassifierError> {
        self.check_features(features)?;
        Ok(features
            .values
            .iter()
            .map(|row| softmax(&self.logits(row)))
            .collect())
    }
}

/// Load the configured model, degrading to "no model" on any failure
pub fn load_classifier(path: Option<&Path>) -> Option<ClassifierHandle> {
    let path = path?;
    if !path.exists() {
        warn!("No model found at {}; predictions disabled", path.display());
        return None;
    }
    match LinearModel::load(path) {
        Ok(model) => {
            info!(
                classes = model.classes.len(),
                features = model.feature_count(),
                confidence = model.supports_confidence,
                "Loaded pre-trained model from {}",
                path.display()
            );
            Some(model.into_handle())
        }
        Err(e) => {
            warn!("Failed to load model {}: {}; predictions disabled", path.display(), e);
            None
        }
    }
}
