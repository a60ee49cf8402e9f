//! Cognitive scorer
//!
//! Row-local indices derived from band means:
//! - engagement = mean(beta, gamma) - mean(alpha, theta)
//! - focus = theta / beta, +inf when beta is zero (focus undefined)
//! - relaxation = -engagement, always the exact negation

use super::bands::BandValues;
use serde::Serialize;

/// Engagement, focus and relaxation for one row (raw or normalized)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CognitiveScores {
    pub engagement: f64,
    pub focus: f64,
    pub relaxation: f64,
}

impl CognitiveScores {
    /// Raw scores from band means
    pub fn from_bands(bands: &BandValues) -> Self {
        let engagement = engagement_score(bands);
        Self {
            engagement,
            focus: focus_score(bands),
            relaxation: -engagement,
        }
    }
}

pub fn engagement_score(bands: &BandValues) -> f64 {
    let high_freq = (bands.beta + bands.gamma) / 2.0;
    let low_freq = (bands.alpha + bands.theta) / 2.0;
    high_freq - low_freq
}

/// Theta/beta ratio; lower means better focus
pub fn focus_score(bands: &BandValues) -> f64 {
    if bands.beta == 0.0 {
        return f64::INFINITY;
    }
    bands.theta / bands.beta
}
