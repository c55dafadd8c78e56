use serde::Serialize;

use crate::measurement::Measurement;
use crate::overlay::fmt_number;

/// Element ids of the summary tiles, in display order.
pub const STAT_FIELDS: [&str; 4] = ["total-measurements", "avg-cpm", "max-cpm", "min-cpm"];

/// Summary of the raw counts of one import.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MeasurementStats {
    pub total: usize,
    pub avg_cpm: f64,
    pub max_cpm: f64,
    pub min_cpm: f64,
}

impl MeasurementStats {
    /// Counts every record, located or not. `None` for an empty import.
    pub fn from_measurements(measurements: &[Measurement]) -> Option<Self> {
        if measurements.is_empty() {
            return None;
        }
        let (sum, min, max) = measurements.iter().map(|m| m.cpm).fold(
            (0.0, f64::INFINITY, f64::NEG_INFINITY),
            |(sum, min, max), c| (sum + c, min.min(c), max.max(c)),
        );
        Some(MeasurementStats {
            total: measurements.len(),
            avg_cpm: sum / measurements.len() as f64,
            max_cpm: max,
            min_cpm: min,
        })
    }

    /// Display text for each of [`STAT_FIELDS`]; the average keeps one decimal.
    pub fn display_values(&self) -> [String; 4] {
        [
            self.total.to_string(),
            format!("{:.1}", self.avg_cpm),
            fmt_number(self.max_cpm),
            fmt_number(self.min_cpm),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn summarises_counts() {
        let ms = [
            Measurement::at(35.0, 139.0, 30.0),
            Measurement::at(35.0, 139.0, 40.0),
            Measurement {
                cpm: 50.0,
                ..Default::default()
            },
        ];
        let s = MeasurementStats::from_measurements(&ms).unwrap();
        assert_eq!(s.total, 3);
        assert_relative_eq!(s.avg_cpm, 40.0);
        assert_eq!((s.min_cpm, s.max_cpm), (30.0, 50.0));
        assert_eq!(s.display_values(), ["3", "40.0", "50", "30"]);
    }

    #[test]
    fn empty_import_has_no_stats() {
        assert!(MeasurementStats::from_measurements(&[]).is_none());
    }
}
