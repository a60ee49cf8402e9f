//! Recommendation record and batch cognitive summary

use super::ranking::CategoryScore;
use crate::eeg::normalize::SCALE_MAX;
use crate::eeg::CognitiveScores;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Batch means of the normalized scores (0-10 scale, 2 decimals)
///
/// Focus is inverted (`10 - normalized theta/beta`) so that higher reads as
/// better focus, like the other two.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CognitiveSummary {
    pub engagement: Option<f64>,
    pub focus: Option<f64>,
    pub relaxation: Option<f64>,
}

impl CognitiveSummary {
    pub fn from_normalized(normalized: &[CognitiveScores]) -> Self {
        Self {
            engagement: finite_mean(normalized.iter().map(|s| s.engagement)),
            focus: finite_mean(normalized.iter().map(|s| SCALE_MAX - s.focus)),
            relaxation: finite_mean(normalized.iter().map(|s| s.relaxation)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.engagement.is_none() && self.focus.is_none() && self.relaxation.is_none()
    }
}

/// Mean over finite values rounded to 2 decimals; `None` when there are none
fn finite_mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        return None;
    }
    Some(round2(sum / count as f64))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

/// Persisted per-user recommendation, replaced wholesale on every write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub user_id: String,
    pub categories: Vec<CategoryScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cognitive_scores: Option<CognitiveSummary>,
    pub updated_at: DateTime<Utc>,
}
