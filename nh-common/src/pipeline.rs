//! Scoring-and-recommendation pipeline context
//!
//! The caller owns a [`PipelineContext`] holding the classifier handle and the
//! most recent batch. Each submitted batch moves forward exactly once:
//!
//! aggregate → score → normalize → select features → classify → rank
//!
//! Submitting a batch replaces the previous one wholesale. A failing stage
//! reports its error and leaves every upstream result (and any previous
//! predictions) untouched.

use crate::classify::{run_predictions, ClassCode, ClassifierHandle, FeatureMatrix, Prediction};
use crate::eeg::{normalize_scores, BandValues, Batch, CognitiveScores};
use crate::recommend::{rank_predictions, CategoryScore, CognitiveSummary};
use crate::{Error, Result};
use serde::Serialize;
use tracing::{info, warn};

/// A batch after aggregation, scoring and normalization
#[derive(Debug, Clone)]
pub struct ScoredBatch {
    pub batch: Batch,
    pub bands: Vec<BandValues>,
    pub raw: Vec<CognitiveScores>,
    pub normalized: Vec<CognitiveScores>,
    /// Set only by a fully successful classification
    pub predictions: Option<Vec<Prediction>>,
}

impl ScoredBatch {
    /// Aggregate, score and normalize a batch
    pub fn score(batch: Batch) -> Self {
        let bands: Vec<BandValues> = batch.rows.iter().map(BandValues::from_row).collect();
        let raw: Vec<CognitiveScores> = bands.iter().map(CognitiveScores::from_bands).collect();
        let normalized = normalize_scores(&raw);
        Self {
            batch,
            bands,
            raw,
            normalized,
            predictions: None,
        }
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    pub fn cognitive_summary(&self) -> CognitiveSummary {
        CognitiveSummary::from_normalized(&self.normalized)
    }

    /// Category ranking of the current predictions (empty if unclassified)
    pub fn ranking(&self) -> Vec<CategoryScore> {
        self.predictions
            .as_deref()
            .map(rank_predictions)
            .unwrap_or_default()
    }
}

/// Strength band of a top-class probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    Strong,
    Good,
    Moderate,
    Weak,
}

impl ConfidenceBand {
    pub fn from_probability(p: f64) -> Self {
        if p >= 0.8 {
            ConfidenceBand::Strong
        } else if p >= 0.6 {
            ConfidenceBand::Good
        } else if p >= 0.4 {
            ConfidenceBand::Moderate
        } else {
            ConfidenceBand::Weak
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassCount {
    pub class_code: ClassCode,
    pub count: usize,
}

/// Top class of the most recent row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestTopClass {
    pub label: String,
    /// Clamped to [0, 1]
    pub probability: f64,
    pub strength: ConfidenceBand,
}

/// Outcome of a classification run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSummary {
    pub rows: usize,
    /// Descending by count, ties in first-seen order
    pub class_counts: Vec<ClassCount>,
    /// Share of labelled rows whose predicted label matches their label
    pub label_agreement: Option<f64>,
    pub latest: Option<LatestTopClass>,
}

impl PredictionSummary {
    fn from_predictions(batch: &Batch, predictions: &[Prediction]) -> Self {
        let mut class_counts: Vec<ClassCount> = Vec::new();
        for p in predictions {
            match class_counts.iter_mut().find(|c| c.class_code == p.class_code) {
                Some(c) => c.count += 1,
                None => class_counts.push(ClassCount {
                    class_code: p.class_code.clone(),
                    count: 1,
                }),
            }
        }
        class_counts.sort_by(|a, b| b.count.cmp(&a.count));

        let labelled: Vec<bool> = batch
            .rows
            .iter()
            .zip(predictions)
            .filter_map(|(row, p)| row.label.as_ref().map(|l| *l == p.label))
            .collect();
        let label_agreement = if labelled.is_empty() {
            None
        } else {
            Some(labelled.iter().filter(|m| **m).count() as f64 / labelled.len() as f64)
        };

        let latest = predictions.last().and_then(|p| {
            p.top.as_ref().map(|top| {
                let probability = top.probability.clamp(0.0, 1.0);
                LatestTopClass {
                    label: top.label.clone(),
                    probability,
                    strength: ConfidenceBand::from_probability(probability),
                }
            })
        });

        Self {
            rows: predictions.len(),
            class_counts,
            label_agreement,
            latest,
        }
    }
}

/// Caller-owned pipeline state: classifier handle plus current batch
#[derive(Debug, Default)]
pub struct PipelineContext {
    classifier: Option<ClassifierHandle>,
    current: Option<ScoredBatch>,
}

impl PipelineContext {
    pub fn new(classifier: Option<ClassifierHandle>) -> Self {
        Self {
            classifier,
            current: None,
        }
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn classifier(&self) -> Option<&ClassifierHandle> {
        self.classifier.as_ref()
    }

    /// Score a new batch, replacing the current one
    pub fn submit(&mut self, batch: Batch) -> &ScoredBatch {
        let scored = ScoredBatch::score(batch);
        info!(
            rows = scored.len(),
            columns = scored.batch.columns.len(),
            "Scored EEG batch"
        );
        self.current.insert(scored)
    }

    pub fn current(&self) -> Option<&ScoredBatch> {
        self.current.as_ref()
    }

    /// Drop the current batch
    pub fn discard(&mut self) -> Option<ScoredBatch> {
        self.current.take()
    }

    /// Classify the current batch
    ///
    /// On any failure the batch keeps its scored state and previous
    /// predictions, if any.
    pub fn classify(&mut self) -> Result<PredictionSummary> {
        let scored = self.current.as_mut().ok_or(Error::NoBatch)?;
        if scored.is_empty() {
            return Err(Error::EmptyBatch);
        }
        let classifier = self.classifier.as_ref().ok_or(Error::MissingModel)?;

        let features = FeatureMatrix::from_batch(&scored.batch).inspect_err(|e| {
            warn!("Classification skipped: {}", e);
        })?;

        let predictions = run_predictions(classifier, &features).map_err(|e| {
            warn!("Classifier call failed: {}", e);
            Error::Classifier(e)
        })?;

        let summary = PredictionSummary::from_predictions(&scored.batch, &predictions);
        scored.predictions = Some(predictions);

        info!(
            rows = summary.rows,
            features = features.width(),
            classes = summary.class_counts.len(),
            "Predictions added to the batch"
        );
        Ok(summary)
    }

    /// Ranking of the current batch's predictions
    pub fn ranking(&self) -> Result<Vec<CategoryScore>> {
        let scored = self.current.as_ref().ok_or(Error::NoBatch)?;
        Ok(scored.ranking())
    }
}
