//! CSV batch ingest
//!
//! Column typing follows the whole batch: a column is numeric when every
//! non-empty cell parses as a float (including `inf`/`NaN`), text otherwise.
//! Ragged rows are tolerated; missing trailing cells read as empty.

use super::sample::{BandReadings, Batch, Cell, Column, ColumnKind, SampleRow};
use super::parse_reading_column;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

/// Column holding the observation time
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Columns that may carry an existing label, in lookup order
pub const LABEL_COLUMNS: [&str; 3] = ["melody_category", "label", "category"];

/// Parse CSV text (header row required) into a typed batch
pub fn parse_csv(text: &str) -> Result<Batch> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(Error::InvalidInput("CSV has no header columns".to_string()));
    }

    let mut records: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        cells.resize(headers.len(), String::new());
        records.push(cells);
    }

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| Column {
            name: name.clone(),
            kind: infer_kind(records.iter().map(|r| r[idx].as_str())),
        })
        .collect();

    let readings_at: Vec<_> = columns
        .iter()
        .map(|c| parse_reading_column(&c.name))
        .collect();
    let timestamp_idx = columns.iter().position(|c| c.name == TIMESTAMP_COLUMN);
    let label_idx: Vec<usize> = LABEL_COLUMNS
        .iter()
        .filter_map(|name| columns.iter().position(|c| c.name == *name))
        .collect();

    let rows = records
        .into_iter()
        .map(|raw| {
            let cells: Vec<Cell> = raw
                .iter()
                .zip(&columns)
                .map(|(value, column)| to_cell(value, column.kind))
                .collect();

            let mut readings = BandReadings::default();
            for (cell, pair) in cells.iter().zip(&readings_at) {
                if let Some((band, electrode)) = pair {
                    readings.set(*band, *electrode, cell.as_f64());
                }
            }

            let timestamp = timestamp_idx.and_then(|idx| parse_timestamp(&raw[idx]));
            let label = label_idx.iter().find_map(|&idx| cell_label(&cells[idx]));

            SampleRow {
                readings,
                timestamp,
                label,
                cells,
            }
        })
        .collect::<Vec<_>>();

    debug!(rows = rows.len(), columns = columns.len(), "Parsed EEG CSV batch");

    Ok(Batch::new(columns, rows))
}

fn infer_kind<'a>(mut values: impl Iterator<Item = &'a str>) -> ColumnKind {
    let all_numeric = values.all(|v| v.is_empty() || v.parse::<f64>().is_ok());
    if all_numeric {
        ColumnKind::Numeric
    } else {
        ColumnKind::Text
    }
}

fn to_cell(value: &str, kind: ColumnKind) -> Cell {
    if value.is_empty() {
        return Cell::Missing;
    }
    match kind {
        ColumnKind::Numeric => value.parse::<f64>().map(Cell::Number).unwrap_or(Cell::Missing),
        ColumnKind::Text => Cell::Text(value.to_string()),
    }
}

fn cell_label(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Text(s) => Some(s.clone()),
        Cell::Number(v) if v.is_finite() && v.fract() == 0.0 => Some(format!("{}", *v as i64)),
        Cell::Number(v) if v.is_finite() => Some(v.to_string()),
        _ => None,
    }
}

/// Coerce a timestamp cell; anything unparseable becomes `None`
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eeg::{Band, Electrode};

    #[test]
    fn test_parse_typed_columns_and_readings() {
        let csv = "timestamp,Beta_TP9_mean,Theta_AF7_mean,melody_category,note\n\
                   2024-03-01 10:00:00,2.5,4,Classical,calm\n\
                   not-a-date,1.5,,Rock,\n";
        let batch = parse_csv(csv).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.columns[1].kind, ColumnKind::Numeric);
        assert_eq!(batch.columns[3].kind, ColumnKind::Text);
        assert_eq!(batch.columns[4].kind, ColumnKind::Text);
        assert_eq!(batch.columns[0].kind, ColumnKind::Text);

        let first = &batch.rows[0];
        assert_eq!(first.readings.get(Band::Beta, Electrode::TP9), 2.5);
        assert_eq!(first.readings.get(Band::Theta, Electrode::AF7), 4.0);
        // Absent columns read as zero
        assert_eq!(first.readings.get(Band::Gamma, Electrode::AF8), 0.0);
        assert!(first.timestamp.is_some());
        assert_eq!(first.label.as_deref(), Some("Classical"));

        let second = &batch.rows[1];
        assert!(second.timestamp.is_none());
        // Empty cell in a present column is a missing measurement
        assert!(second.readings.get(Band::Theta, Electrode::AF7).is_nan());
        assert_eq!(second.cells[4], Cell::Missing);
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let csv = "a,b,c\n1,2\n3,4,5\n";
        let batch = parse_csv(csv).unwrap();
        assert_eq!(batch.rows[0].cells.len(), 3);
        assert_eq!(batch.rows[0].cells[2], Cell::Missing);
        assert_eq!(batch.columns[2].kind, ColumnKind::Numeric);
    }

    #[test]
    fn test_numeric_label_formatting() {
        let csv = "label,x\n3,1.0\n";
        let batch = parse_csv(csv).unwrap();
        assert_eq!(batch.rows[0].label.as_deref(), Some("3"));
    }

    #[test]
    fn test_header_only_is_empty_batch() {
        let batch = parse_csv("Beta_TP9_mean,Theta_TP9_mean\n").unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.columns.len(), 2);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-03-01T10:00:00Z").is_some());
        assert!(parse_timestamp("2024-03-01 10:00:00.250").is_some());
        assert!(parse_timestamp("2024-03-01").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
