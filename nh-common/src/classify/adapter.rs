//! Classifier adapter
//!
//! Invokes the classifier on a feature matrix and interprets its output:
//! one class code per row mapped to a genre label, plus (when the handle
//! supports confidence) the top probability, its index into the classifier's
//! class list and the label resolved from that index.
//!
//! The top label may differ from the discrete prediction's label when the
//! classifier's probability ranking and its prediction disagree.

use super::classifier::{ClassifierError, ClassifierHandle};
use super::features::FeatureMatrix;
use super::labels::{class_code_to_label, ClassCode};
use super::linear::arg_max;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Highest-probability class of a row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopClass {
    pub probability: f64,
    /// Position in the classifier's class list
    pub index: usize,
    pub label: String,
}

/// Per-row prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub class_code: ClassCode,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<TopClass>,
}

/// Run the classifier over every row
///
/// Any failure (from the classifier or from malformed output) is returned
/// whole; no partial predictions are produced.
pub fn run_predictions(
    classifier: &ClassifierHandle,
    features: &FeatureMatrix,
) -> Result<Vec<Prediction>, ClassifierError> {
    let codes = classifier.predict(features)?;
    if codes.len() != features.rows() {
        return Err(ClassifierError::OutputLength {
            expected: features.rows(),
            actual: codes.len(),
        });
    }

    // Label each distinct code once
    let mut labels: HashMap<ClassCode, String> = HashMap::new();
    let mut label_for = |code: &ClassCode| -> String {
        labels
            .entry(code.clone())
            .or_insert_with(|| class_code_to_label(code))
            .clone()
    };

    let tops: Vec<Option<TopClass>> = match classifier {
        ClassifierHandle::Discrete(_) => vec![None; codes.len()],
        ClassifierHandle::WithConfidence(c) => {
            let classes = c.classes();
            let proba = c.predict_with_confidence(features)?;
            if proba.len() != features.rows() {
                return Err(ClassifierError::OutputLength {
                    expected: features.rows(),
                    actual: proba.len(),
                });
            }
            proba
                .iter()
                .enumerate()
                .map(|(row, p)| {
                    if p.len() != classes.len() {
                        return Err(ClassifierError::ProbabilityWidth {
                            row,
                            expected: classes.len(),
                            actual: p.len(),
                        });
                    }
                    let index = arg_max(p).ok_or(ClassifierError::ProbabilityWidth {
                        row,
                        expected: classes.len(),
                        actual: 0,
                    })?;
                    Ok(Some(TopClass {
                        probability: p[index],
                        index,
                        label: label_for(&classes[index]),
                    }))
                })
                .collect::<Result<_, _>>()?
        }
    };

    let predictions: Vec<Prediction> = codes
        .into_iter()
        .zip(tops)
        .map(|(class_code, top)| Prediction {
            label: label_for(&class_code),
            class_code,
            top,
        })
        .collect();

    debug!(
        rows = predictions.len(),
        confidence = classifier.supports_confidence(),
        "Classifier predictions complete"
    );

    Ok(predictions)
}
