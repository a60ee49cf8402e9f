//! Category ranking
//!
//! Turns per-row predictions into a category distribution:
//! - with confidence: group rows by top label, sum their top probabilities,
//!   divide by the grand total (probability-weighted)
//! - without: relative frequency of the predicted label
//!
//! Output is sorted by descending score; equal scores keep first-encounter
//! order. Zero rows or zero total weight yield an empty ranking.

use crate::classify::Prediction;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub score: f64,
}

/// Accumulates per-category weight in first-encounter order
#[derive(Default)]
struct Grouped {
    entries: Vec<(String, f64)>,
}

impl Grouped {
    fn add(&mut self, category: &str, weight: f64) {
        match self.entries.iter_mut().find(|(c, _)| c == category) {
            Some((_, total)) => *total += weight,
            None => self.entries.push((category.to_string(), weight)),
        }
    }

    fn into_ranking(self) -> Vec<CategoryScore> {
        let total: f64 = self.entries.iter().map(|(_, w)| w).sum();
        if !(total > 0.0) || !total.is_finite() {
            return Vec::new();
        }

        let mut ranking: Vec<CategoryScore> = self
            .entries
            .into_iter()
            .map(|(category, weight)| CategoryScore {
                category,
                score: weight / total,
            })
            .collect();
        // Stable: ties keep grouping order
        ranking.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranking
    }
}

/// Rank categories for a batch of predictions
pub fn rank_predictions(predictions: &[Prediction]) -> Vec<CategoryScore> {
    let weighted = !predictions.is_empty() && predictions.iter().all(|p| p.top.is_some());

    let mut grouped = Grouped::default();
    for prediction in predictions {
        match &prediction.top {
            Some(top) if weighted => grouped.add(&top.label, top.probability),
            _ => grouped.add(&prediction.label, 1.0),
        }
    }

    let ranking = grouped.into_ranking();
    debug!(
        rows = predictions.len(),
        categories = ranking.len(),
        weighted,
        "Ranked prediction categories"
    );
    ranking
}
