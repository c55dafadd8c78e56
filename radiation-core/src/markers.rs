//! Point rendering: one classified circle marker per located measurement.

use geo::BoundingRect;
use geo_types::{MultiPoint, Point};
use serde::{Deserialize, Serialize};

use crate::bands::classify;
use crate::constants::{
    MARKER_FILL_OPACITY, MARKER_OPACITY, MARKER_STROKE_COLOR, MARKER_STROKE_WEIGHT,
};
use crate::measurement::{Measurement, located};
use crate::overlay::MarkerOverlay;

/// Outline and opacity shared by every marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub stroke_color: String,
    pub stroke_weight: f64,
    pub opacity: f64,
    pub fill_opacity: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        MarkerStyle {
            stroke_color: MARKER_STROKE_COLOR.to_string(),
            stroke_weight: MARKER_STROKE_WEIGHT,
            opacity: MARKER_OPACITY,
            fill_opacity: MARKER_FILL_OPACITY,
        }
    }
}

/// Everything the map needs to place one circle marker.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarkerSpec {
    pub lat: f64,
    pub lng: f64,
    pub radius: f64,
    pub fill_color: &'static str,
    pub band_label: &'static str,
    pub style: MarkerStyle,
    pub overlay: MarkerOverlay,
}

/// Geographic bounding box in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// Smallest box containing every `(lat, lng)` pair, `None` when empty.
    pub fn around(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Bounds> {
        let mp: MultiPoint<f64> = points
            .into_iter()
            .map(|(lat, lng)| Point::new(lng, lat))
            .collect();
        mp.bounding_rect().map(|r| Bounds {
            south: r.min().y,
            west: r.min().x,
            north: r.max().y,
            east: r.max().x,
        })
    }

    /// Grow each side by `ratio` of the box height (latitude) or width (longitude).
    pub fn pad(&self, ratio: f64) -> Bounds {
        let dlat = (self.north - self.south).abs() * ratio;
        let dlng = (self.east - self.west).abs() * ratio;
        Bounds {
            south: self.south - dlat,
            west: self.west - dlng,
            north: self.north + dlat,
            east: self.east + dlng,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }
}

/// Markers planned for one dataset, plus the extent they cover.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MarkerLayer {
    pub markers: Vec<MarkerSpec>,
    pub bounds: Option<Bounds>,
}

impl MarkerLayer {
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

pub fn marker_for(lat: f64, lng: f64, m: &Measurement, style: &MarkerStyle) -> MarkerSpec {
    let band = classify(m.dose_rate());
    MarkerSpec {
        lat,
        lng,
        radius: f64::from(band.marker_size),
        fill_color: band.color,
        band_label: band.label,
        style: style.clone(),
        overlay: MarkerOverlay::from_measurement(m),
    }
}

/// Classify every located measurement into a marker. Readings without
/// coordinates are dropped without notice.
pub fn plan_markers(measurements: &[Measurement], style: &MarkerStyle) -> MarkerLayer {
    let markers: Vec<MarkerSpec> = located(measurements)
        .map(|(lat, lng, m)| marker_for(lat, lng, m, style))
        .collect();
    let skipped = measurements.len() - markers.len();
    if skipped > 0 {
        log::debug!("{skipped} measurement(s) without coordinates left off the map");
    }
    let bounds = Bounds::around(markers.iter().map(|m| (m.lat, m.lng)));
    MarkerLayer { markers, bounds }
}
