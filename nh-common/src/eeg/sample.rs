//! Typed batch rows
//!
//! Readings for the recognized `(band, electrode)` pairs are pulled out of the
//! loose tabular input once, at ingest time, into a fixed grid. Absent columns
//! read as 0.0. All other cells are kept verbatim, aligned with the batch
//! schema, for feature selection.

use super::{Band, Electrode};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Column type inferred over the whole batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// One raw input cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    /// Numeric view; text and missing cells read as NaN
    pub fn as_f64(&self) -> f64 {
        match self {
            Cell::Number(v) => *v,
            Cell::Text(_) | Cell::Missing => f64::NAN,
        }
    }
}

/// Electrode × band mean readings for one row
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandReadings {
    values: [[f64; 4]; 5],
}

impl BandReadings {
    pub fn get(&self, band: Band, electrode: Electrode) -> f64 {
        self.values[band.index()][electrode.index()]
    }

    pub fn set(&mut self, band: Band, electrode: Electrode, value: f64) {
        self.values[band.index()][electrode.index()] = value;
    }

    /// All four electrode readings of one band
    pub fn band(&self, band: Band) -> &[f64; 4] {
        &self.values[band.index()]
    }

    /// Same reading on every electrode of `band`
    pub fn with_band(mut self, band: Band, value: f64) -> Self {
        self.values[band.index()] = [value; 4];
        self
    }
}

/// One EEG observation
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub readings: BandReadings,
    pub timestamp: Option<NaiveDateTime>,
    /// Existing label carried by the input, if any
    pub label: Option<String>,
    /// Raw cells aligned with [`Batch::columns`]
    pub cells: Vec<Cell>,
}

/// An ingested batch: schema in first-seen order plus typed rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub columns: Vec<Column>,
    pub rows: Vec<SampleRow>,
}

impl Batch {
    pub fn new(columns: Vec<Column>, rows: Vec<SampleRow>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Numeric value of a named cell for a row, NaN if absent
    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.rows
            .get(row)
            .and_then(|r| r.cells.get(column))
            .map(Cell::as_f64)
            .unwrap_or(f64::NAN)
    }
}
