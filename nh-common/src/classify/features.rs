//! Feature selector
//!
//! Picks the classifier inputs out of the batch schema. Excluded:
//! - known non-feature fields (band means, labels, timestamps, indices)
//! - columns produced by this pipeline (score and prediction prefixes)
//! - any `*_normalized` column
//! - non-numeric columns
//!
//! The result keeps schema order, so every row yields the same vector layout.

use crate::eeg::{Batch, Column, ColumnKind};
use crate::{Error, Result};
use serde::Serialize;

/// Exact column names that are never features
pub const NON_FEATURE_COLUMNS: [&str; 11] = [
    "delta",
    "theta",
    "alpha",
    "beta",
    "gamma",
    "melody_category",
    "Melody #",
    "label",
    "category",
    "timestamp",
    "index",
];

/// Prefixes of columns generated by scoring and prediction
pub const GENERATED_PREFIXES: [&str; 4] = [
    "engagement_score",
    "focus_score",
    "relaxation_score",
    "predicted_",
];

pub const NORMALIZED_SUFFIX: &str = "_normalized";

fn is_generated_or_reserved(name: &str) -> bool {
    NON_FEATURE_COLUMNS.contains(&name)
        || GENERATED_PREFIXES.iter().any(|p| name.starts_with(p))
        || name.ends_with(NORMALIZED_SUFFIX)
}

/// Indices of the feature columns in schema order
pub fn select_feature_columns(columns: &[Column]) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.kind == ColumnKind::Numeric && !is_generated_or_reserved(&c.name))
        .map(|(idx, _)| idx)
        .collect()
}

/// Rows × selected features, row-major
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Build the matrix for a batch; refuses when no feature column survives
    pub fn from_batch(batch: &Batch) -> Result<Self> {
        let selected = select_feature_columns(&batch.columns);
        if selected.is_empty() {
            return Err(Error::NoFeatureColumns);
        }

        let columns = selected
            .iter()
            .map(|&idx| batch.columns[idx].name.clone())
            .collect();
        let values = (0..batch.len())
            .map(|row| selected.iter().map(|&col| batch.value(row, col)).collect())
            .collect();

        Ok(Self { columns, values })
    }

    pub fn rows(&self) -> usize {
        self.values.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}
