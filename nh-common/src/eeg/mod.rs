//! EEG batch model and per-row cognitive scoring
//!
//! Data flows strictly forward:
//! raw rows → band means → raw cognitive scores → batch-normalized scores.

pub mod bands;
pub mod ingest;
pub mod normalize;
pub mod sample;
pub mod scoring;

pub use bands::BandValues;
pub use ingest::parse_csv;
pub use normalize::{normalize_column, normalize_scores};
pub use sample::{Batch, BandReadings, Cell, Column, ColumnKind, SampleRow};
pub use scoring::CognitiveScores;

use serde::{Deserialize, Serialize};

/// Canonical EEG frequency bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl Band {
    pub const ALL: [Band; 5] = [Band::Delta, Band::Theta, Band::Alpha, Band::Beta, Band::Gamma];

    /// Name as it appears in input column headers
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Delta => "Delta",
            Band::Theta => "Theta",
            Band::Alpha => "Alpha",
            Band::Beta => "Beta",
            Band::Gamma => "Gamma",
        }
    }

    /// Name of the derived per-row band mean column
    pub fn column_name(&self) -> &'static str {
        match self {
            Band::Delta => "delta",
            Band::Theta => "theta",
            Band::Alpha => "alpha",
            Band::Beta => "beta",
            Band::Gamma => "gamma",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Fixed electrode positions (Muse headband layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Electrode {
    TP9,
    AF7,
    AF8,
    TP10,
}

impl Electrode {
    pub const ALL: [Electrode; 4] = [
        Electrode::TP9,
        Electrode::AF7,
        Electrode::AF8,
        Electrode::TP10,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Electrode::TP9 => "TP9",
            Electrode::AF7 => "AF7",
            Electrode::AF8 => "AF8",
            Electrode::TP10 => "TP10",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Input column name for a `(band, electrode)` mean reading
pub fn reading_column(band: Band, electrode: Electrode) -> String {
    format!("{}_{}_mean", band.as_str(), electrode.as_str())
}

/// Inverse of [`reading_column`]
pub fn parse_reading_column(name: &str) -> Option<(Band, Electrode)> {
    let stem = name.strip_suffix("_mean")?;
    let (band_name, electrode_name) = stem.split_once('_')?;
    let band = Band::ALL.into_iter().find(|b| b.as_str() == band_name)?;
    let electrode = Electrode::ALL
        .into_iter()
        .find(|e| e.as_str() == electrode_name)?;
    Some((band, electrode))
}
