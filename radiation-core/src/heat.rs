//! Heatmap rendering: grid aggregation of located readings.
//!
//! Readings are bucketed into square cells of [`HEAT_CELL_SIZE_DEG`] and each
//! cell contributes a single point carrying the band weight of its *mean* dose
//! rate. Dense clusters of quiet readings therefore never outshine a few hot
//! ones; the layer shows level, not count.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bands::{HEAT_BANDS, heat_weight};
use crate::color::Rgb;
use crate::constants::{
    HEAT_BLUR_PX, HEAT_CELL_SIZE_DEG, HEAT_INTENSITY_SCALE, HEAT_MAX_WEIGHT, HEAT_MAX_ZOOM,
    HEAT_MIN_OPACITY, HEAT_RADIUS_PX,
};
use crate::measurement::{Measurement, located};

/// Integer cell coordinates: `(floor(lat / size), floor(lng / size))`.
pub type CellKey = (i64, i64);

pub fn cell_key(lat: f64, lng: f64, cell_size: f64) -> CellKey {
    ((lat / cell_size).floor() as i64, (lng / cell_size).floor() as i64)
}

/// Running sums for one occupied cell.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GridCell {
    pub sum_lat: f64,
    pub sum_lng: f64,
    pub sum_dose_rate: f64,
    pub count: u32,
}

impl GridCell {
    fn add(&mut self, lat: f64, lng: f64, dose_rate: f64) {
        self.sum_lat += lat;
        self.sum_lng += lng;
        self.sum_dose_rate += dose_rate;
        self.count += 1;
    }

    pub fn mean_lat(&self) -> f64 {
        self.sum_lat / f64::from(self.count)
    }

    pub fn mean_lng(&self) -> f64 {
        self.sum_lng / f64::from(self.count)
    }

    pub fn mean_dose_rate(&self) -> f64 {
        self.sum_dose_rate / f64::from(self.count)
    }
}

/// Bucket located readings into cells. Only occupied cells appear in the result.
pub fn aggregate(measurements: &[Measurement], cell_size: f64) -> BTreeMap<CellKey, GridCell> {
    let mut grid: BTreeMap<CellKey, GridCell> = BTreeMap::new();
    for (lat, lng, m) in located(measurements) {
        grid.entry(cell_key(lat, lng, cell_size))
            .or_default()
            .add(lat, lng, m.dose_rate());
    }
    grid
}

/// One weighted point of the heat layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lng: f64,
    pub weight: f64,
}

impl HeatPoint {
    pub fn from_cell(cell: &GridCell) -> Self {
        HeatPoint {
            lat: cell.mean_lat(),
            lng: cell.mean_lng(),
            weight: heat_weight(cell.mean_dose_rate()),
        }
    }
}

/// A `(weight, color)` stop of the heat palette.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GradientStop {
    pub weight: f64,
    pub color: &'static str,
}

/// Heat palette whose stops sit at the scaled band weights, in ascending order,
/// so a cell's point weight lands exactly on its band's color.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeatGradient {
    pub stops: Vec<GradientStop>,
}

impl Default for HeatGradient {
    fn default() -> Self {
        let floor = HEAT_BANDS[HEAT_BANDS.len() - 1].color;
        let mut stops = vec![GradientStop {
            weight: 0.0,
            color: floor,
        }];
        stops.extend(HEAT_BANDS.iter().rev().map(|b| GradientStop {
            weight: b.weight * HEAT_INTENSITY_SCALE,
            color: b.color,
        }));
        HeatGradient { stops }
    }
}

impl HeatGradient {
    /// Palette color at `weight`, interpolated linearly between neighbouring stops.
    pub fn color_at(&self, weight: f64) -> Rgb {
        let rgb = |s: &GradientStop| s.color.parse::<Rgb>().unwrap_or(Rgb::new(0, 0, 0));
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Rgb::new(0, 0, 0);
        };
        if weight.is_nan() || weight <= first.weight {
            return rgb(first);
        }
        if weight >= last.weight {
            return rgb(last);
        }
        self.stops
            .windows(2)
            .find(|w| weight <= w[1].weight)
            .map(|w| {
                let span = w[1].weight - w[0].weight;
                let t = if span > 0.0 {
                    (weight - w[0].weight) / span
                } else {
                    1.0
                };
                rgb(&w[0]).lerp(rgb(&w[1]), t)
            })
            .unwrap_or_else(|| rgb(last))
    }
}

/// Display options of the heat layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatStyle {
    pub radius: f64,
    pub blur: f64,
    pub max_zoom: u8,
    pub max: f64,
    pub min_opacity: f64,
}

impl Default for HeatStyle {
    fn default() -> Self {
        HeatStyle {
            radius: HEAT_RADIUS_PX,
            blur: HEAT_BLUR_PX,
            max_zoom: HEAT_MAX_ZOOM,
            max: HEAT_MAX_WEIGHT,
            min_opacity: HEAT_MIN_OPACITY,
        }
    }
}

/// Aggregated heat layer ready to be attached.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeatLayer {
    pub points: Vec<HeatPoint>,
    pub style: HeatStyle,
    pub gradient: HeatGradient,
}

/// Aggregate located readings into one weighted point per occupied cell.
pub fn plan_heat(measurements: &[Measurement], style: &HeatStyle) -> HeatLayer {
    let points: Vec<HeatPoint> = aggregate(measurements, HEAT_CELL_SIZE_DEG)
        .values()
        .map(HeatPoint::from_cell)
        .collect();
    log::debug!(
        "aggregated {} measurement(s) into {} heat cell(s)",
        measurements.len(),
        points.len()
    );
    HeatLayer {
        points,
        style: style.clone(),
        gradient: HeatGradient::default(),
    }
}
