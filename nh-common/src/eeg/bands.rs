//! Band aggregation
//!
//! Collapses the four electrode readings of each band into one arithmetic mean
//! per row. Missing readings were already substituted with 0.0 at ingest, so
//! aggregation is total.

use super::sample::{BandReadings, SampleRow};
use super::{Band, Electrode};
use serde::Serialize;

/// Per-row band means, named after the lower-cased band
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BandValues {
    pub delta: f64,
    pub theta: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl BandValues {
    /// Aggregate one row's readings
    pub fn from_readings(readings: &BandReadings) -> Self {
        Self {
            delta: band_mean(readings, Band::Delta),
            theta: band_mean(readings, Band::Theta),
            alpha: band_mean(readings, Band::Alpha),
            beta: band_mean(readings, Band::Beta),
            gamma: band_mean(readings, Band::Gamma),
        }
    }

    pub fn from_row(row: &SampleRow) -> Self {
        Self::from_readings(&row.readings)
    }

    pub fn get(&self, band: Band) -> f64 {
        match band {
            Band::Delta => self.delta,
            Band::Theta => self.theta,
            Band::Alpha => self.alpha,
            Band::Beta => self.beta,
            Band::Gamma => self.gamma,
        }
    }
}

/// Arithmetic mean over the fixed electrode set
fn band_mean(readings: &BandReadings, band: Band) -> f64 {
    readings.band(band).iter().sum::<f64>() / Electrode::ALL.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_over_four_electrodes() {
        let mut readings = BandReadings::default();
        readings.set(Band::Alpha, Electrode::TP9, 1.0);
        readings.set(Band::Alpha, Electrode::AF7, 2.0);
        readings.set(Band::Alpha, Electrode::AF8, 3.0);
        readings.set(Band::Alpha, Electrode::TP10, 6.0);

        let values = BandValues::from_readings(&readings);
        assert_eq!(values.alpha, 3.0);
        assert_eq!(values.delta, 0.0);
    }

    #[test]
    fn test_absent_electrodes_count_as_zero() {
        let mut readings = BandReadings::default();
        readings.set(Band::Gamma, Electrode::AF8, 8.0);

        // 8 / 4, not 8 / 1
        assert_eq!(BandValues::from_readings(&readings).gamma, 2.0);
    }

    #[test]
    fn test_get_by_band() {
        let readings = BandReadings::default().with_band(Band::Beta, 2.0);
        let values = BandValues::from_readings(&readings);
        assert_eq!(values.get(Band::Beta), 2.0);
        assert_eq!(values.get(Band::Theta), 0.0);
    }
}
