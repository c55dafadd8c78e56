//! Severity bands shared by the marker and heatmap renderings.
//!
//! Both tables are scanned from the highest threshold down and the first band
//! whose lower bound is `<=` the dose rate wins. The last entry of each table has
//! no lower bound and catches everything else, including NaN and negative input.

use serde::Serialize;

use crate::constants::HEAT_INTENSITY_SCALE;

/// One row of the marker classification table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SeverityBand {
    /// Inclusive lower bound in µSv/h; `None` for the terminal "very low" band.
    pub lower_bound: Option<f64>,
    /// `lower_bound` as printed in the legend, e.g. `1.0`.
    pub threshold_text: &'static str,
    pub color: &'static str,
    /// Circle marker radius in px.
    pub marker_size: u8,
    pub label: &'static str,
}

const fn band(
    lower_bound: Option<(f64, &'static str)>,
    color: &'static str,
    marker_size: u8,
    label: &'static str,
) -> SeverityBand {
    let (lower_bound, threshold_text) = match lower_bound {
        Some((lb, text)) => (Some(lb), text),
        None => (None, ""),
    };
    SeverityBand {
        lower_bound,
        threshold_text,
        color,
        marker_size,
        label,
    }
}

/// Marker bands, highest threshold first.
pub const SEVERITY_BANDS: [SeverityBand; 12] = [
    band(Some((100.0, "100")), "#ffff00", 12, "Extreme"),
    band(Some((65.54, "65.54")), "#ffff80", 11, "Very Extreme"),
    band(Some((10.0, "10")), "#ff8000", 10, "Very High"),
    band(Some((5.0, "5")), "#ff4000", 9, "High"),
    band(Some((1.65, "1.65")), "#ff0000", 8, "Elevated High"),
    band(Some((1.0, "1.0")), "#ff0080", 7, "Moderate High"),
    band(Some((0.43, "0.43")), "#ff00ff", 6, "Moderate"),
    band(Some((0.25, "0.25")), "#8000ff", 5, "Low-Moderate"),
    band(Some((0.14, "0.14")), "#0080ff", 4, "Elevated Normal"),
    band(Some((0.08, "0.08")), "#00ffff", 4, "Normal"),
    band(Some((0.03, "0.03")), "#0000ff", 3, "Low Normal"),
    band(None, "#000000", 3, "Very Low"),
];

/// Coarse band used by the heatmap.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HeatBand {
    pub lower_bound: Option<f64>,
    /// Weight before the intensity scale is applied.
    pub weight: f64,
    /// Gradient color at `weight`, equal to the marker color at `lower_bound`.
    pub color: &'static str,
}

/// Heat bands, highest threshold first.
pub const HEAT_BANDS: [HeatBand; 6] = [
    HeatBand {
        lower_bound: Some(100.0),
        weight: 1.00,
        color: "#ffff00",
    },
    HeatBand {
        lower_bound: Some(10.0),
        weight: 0.82,
        color: "#ff8000",
    },
    HeatBand {
        lower_bound: Some(1.0),
        weight: 0.64,
        color: "#ff0080",
    },
    HeatBand {
        lower_bound: Some(0.25),
        weight: 0.46,
        color: "#8000ff",
    },
    HeatBand {
        lower_bound: Some(0.08),
        weight: 0.28,
        color: "#00ffff",
    },
    HeatBand {
        lower_bound: None,
        weight: 0.12,
        color: "#0000ff",
    },
];

/// Position of the marker band for `dose_rate` in [`SEVERITY_BANDS`].
pub fn band_index(dose_rate: f64) -> usize {
    SEVERITY_BANDS
        .iter()
        .position(|b| b.lower_bound.is_none_or(|lb| dose_rate >= lb))
        .unwrap_or(SEVERITY_BANDS.len() - 1)
}

/// Classify a dose rate (µSv/h) into its marker band.
pub fn classify(dose_rate: f64) -> &'static SeverityBand {
    &SEVERITY_BANDS[band_index(dose_rate)]
}

/// Classify a dose rate into its heat band.
pub fn heat_band(dose_rate: f64) -> &'static HeatBand {
    HEAT_BANDS
        .iter()
        .find(|b| b.lower_bound.is_none_or(|lb| dose_rate >= lb))
        .unwrap_or(&HEAT_BANDS[HEAT_BANDS.len() - 1])
}

/// Heat weight for a dose rate, intensity scale included.
pub fn heat_weight(dose_rate: f64) -> f64 {
    heat_band(dose_rate).weight * HEAT_INTENSITY_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    fn thresholds(it: impl Iterator<Item = Option<f64>>) -> Vec<f64> {
        it.flatten().collect()
    }

    #[test]
    fn marker_thresholds_strictly_decrease() {
        let t = thresholds(SEVERITY_BANDS.iter().map(|b| b.lower_bound));
        assert_eq!(t.len(), SEVERITY_BANDS.len() - 1);
        for w in t.windows(2) {
            assert!(w[0] > w[1], "{} should be above {}", w[0], w[1]);
        }
        assert!(SEVERITY_BANDS.last().is_some_and(|b| b.lower_bound.is_none()));
    }

    #[test]
    fn threshold_text_reads_as_the_bound() {
        for b in &SEVERITY_BANDS {
            match b.lower_bound {
                Some(lb) => assert_eq!(b.threshold_text.parse::<f64>().ok(), Some(lb)),
                None => assert!(b.threshold_text.is_empty()),
            }
        }
    }

    #[test]
    fn marker_colors_are_unique() {
        let colors: HashSet<_> = SEVERITY_BANDS.iter().map(|b| b.color).collect();
        assert_eq!(colors.len(), SEVERITY_BANDS.len());
    }

    #[test]
    fn heat_thresholds_and_weights_strictly_decrease() {
        let t = thresholds(HEAT_BANDS.iter().map(|b| b.lower_bound));
        for w in t.windows(2) {
            assert!(w[0] > w[1]);
        }
        for w in HEAT_BANDS.windows(2) {
            assert!(w[0].weight > w[1].weight);
        }
        assert!(HEAT_BANDS.iter().all(|b| (0.0..=1.0).contains(&b.weight)));
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert_eq!(classify(100.0).color, "#ffff00");
        assert_eq!(classify(99.999).color, "#ffff80");
        assert_eq!(classify(65.54).marker_size, 11);
        assert_eq!(classify(1.65).color, "#ff0000");
        assert_eq!(classify(1.6499).color, "#ff0080");
        assert_eq!(classify(0.03).color, "#0000ff");
        assert_eq!(classify(0.0299).color, "#000000");
    }

    #[test]
    fn out_of_domain_input_is_clamped() {
        assert_eq!(classify(-5.0).label, "Very Low");
        assert_eq!(classify(f64::NEG_INFINITY).label, "Very Low");
        assert_eq!(classify(f64::NAN).label, "Very Low");
        assert_eq!(classify(f64::INFINITY).label, "Extreme");
        assert_relative_eq!(heat_weight(f64::NAN), 0.12 * 0.8);
        assert_relative_eq!(heat_weight(f64::INFINITY), 0.8);
    }

    #[test]
    fn classified_band_has_greatest_threshold_not_above_dose() {
        let mut d = 0.0;
        while d < 150.0 {
            let got = classify(d);
            let expected = SEVERITY_BANDS
                .iter()
                .filter_map(|b| b.lower_bound)
                .filter(|lb| *lb <= d)
                .fold(None, |acc: Option<f64>, lb| Some(acc.map_or(lb, |a| a.max(lb))));
            assert_eq!(got.lower_bound, expected, "dose {d}");
            d += 0.007;
        }
    }

    #[test]
    fn heat_weights_for_reference_doses() {
        assert_relative_eq!(heat_weight(1.0), 0.512, epsilon = 1e-12);
        assert_relative_eq!(heat_weight(100.0), 0.8, epsilon = 1e-12);
        assert_relative_eq!(heat_weight(0.3), 0.46 * 0.8, epsilon = 1e-12);
        assert_relative_eq!(heat_weight(0.0), 0.12 * 0.8, epsilon = 1e-12);
    }

    #[test]
    fn heat_colors_agree_with_marker_colors() {
        for hb in &HEAT_BANDS {
            match hb.lower_bound {
                Some(lb) => assert_eq!(classify(lb).color, hb.color, "threshold {lb}"),
                // the heat floor shares the lowest colored marker band
                None => assert_eq!(classify(0.03).color, hb.color),
            }
        }
    }

    #[test]
    fn every_heat_threshold_is_a_marker_threshold() {
        let marker: Vec<f64> = thresholds(SEVERITY_BANDS.iter().map(|b| b.lower_bound));
        for lb in thresholds(HEAT_BANDS.iter().map(|b| b.lower_bound)) {
            assert!(marker.contains(&lb), "{lb} missing from marker table");
        }
    }
}
