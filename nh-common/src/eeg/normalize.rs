//! Score normalizer
//!
//! Rescales each score column independently over the whole batch:
//! `normalized = 10 * (value - min) / (max - min)`.
//!
//! When `min == max` (single row, constant column, all values infinite) or the
//! column has no comparable values at all (empty, all NaN) every row gets the
//! midpoint 5.0 instead of dividing by zero. NaN values are skipped when
//! finding min/max, infinities take part in the comparison.

use super::scoring::CognitiveScores;

/// Score assigned to every row of a degenerate column
pub const MIDPOINT_SCORE: f64 = 5.0;

/// Upper bound of the normalized scale
pub const SCALE_MAX: f64 = 10.0;

/// Normalize one column
pub fn normalize_column(values: &[f64]) -> Vec<f64> {
    let mut bounds: Option<(f64, f64)> = None;
    for &v in values.iter().filter(|v| !v.is_nan()) {
        bounds = Some(match bounds {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        });
    }

    match bounds {
        Some((min, max)) if min != max => values
            .iter()
            .map(|v| SCALE_MAX * (v - min) / (max - min))
            .collect(),
        _ => vec![MIDPOINT_SCORE; values.len()],
    }
}

/// Normalize all three score columns of a batch
pub fn normalize_scores(raw: &[CognitiveScores]) -> Vec<CognitiveScores> {
    let engagement: Vec<f64> = raw.iter().map(|s| s.engagement).collect();
    let focus: Vec<f64> = raw.iter().map(|s| s.focus).collect();
    let relaxation: Vec<f64> = raw.iter().map(|s| s.relaxation).collect();

    let engagement = normalize_column(&engagement);
    let focus = normalize_column(&focus);
    let relaxation = normalize_column(&relaxation);

    engagement
        .into_iter()
        .zip(focus)
        .zip(relaxation)
        .map(|((engagement, focus), relaxation)| CognitiveScores {
            engagement,
            focus,
            relaxation,
        })
        .collect()
}
