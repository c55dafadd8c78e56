//! Off-screen [`MapSurface`] that records layers and renders them as SVG.
//!
//! Geographic coordinates are projected with spherical Web-Mercator onto a
//! fixed-size canvas fitted to the last viewport the session asked for.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use radiation_core::constants::DEFAULT_CENTER;
use radiation_core::{Bounds, HeatLayer, Legend, MapSurface, MarkerSpec};

/// Smallest extent shown, in degrees, so a single reading is not blown up.
const MIN_SPAN_DEG: f64 = 0.005;
const MAX_LAT: f64 = 85.051_128_78;
const BACKGROUND: &str = "#f2efe9";

/// Web-Mercator to canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    width: f64,
    height: f64,
    center: (f64, f64),
    scale: f64,
}

fn mercator(lat: f64, lng: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    let x = (lng + 180.0) / 360.0;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0;
    (x, y)
}

impl Projection {
    /// Fit `bounds` into a `width` × `height` canvas, keeping the aspect ratio.
    pub fn fit(bounds: &Bounds, width: u32, height: u32) -> Self {
        let (lat, lng) = bounds.center();
        let half_lat = ((bounds.north - bounds.south) / 2.0).max(MIN_SPAN_DEG / 2.0);
        let half_lng = ((bounds.east - bounds.west) / 2.0).max(MIN_SPAN_DEG / 2.0);
        let (x0, y1) = mercator(lat - half_lat, lng - half_lng);
        let (x1, y0) = mercator(lat + half_lat, lng + half_lng);
        let (w, h) = (f64::from(width.max(1)), f64::from(height.max(1)));
        let scale = (w / (x1 - x0)).min(h / (y1 - y0));
        Projection {
            width: w,
            height: h,
            center: ((x0 + x1) / 2.0, (y0 + y1) / 2.0),
            scale,
        }
    }

    pub fn project(&self, lat: f64, lng: f64) -> (f64, f64) {
        let (x, y) = mercator(lat, lng);
        (
            self.width / 2.0 + (x - self.center.0) * self.scale,
            self.height / 2.0 + (y - self.center.1) * self.scale,
        )
    }
}

#[derive(Debug)]
pub struct SvgSurface {
    width: u32,
    height: u32,
    viewport: Option<Bounds>,
    markers: BTreeMap<usize, MarkerSpec>,
    heat: BTreeMap<usize, HeatLayer>,
    legend: Option<Legend>,
    next_id: usize,
}

impl SvgSurface {
    pub fn new(width: u32, height: u32) -> Self {
        SvgSurface {
            width,
            height,
            viewport: None,
            markers: BTreeMap::new(),
            heat: BTreeMap::new(),
            legend: None,
            next_id: 0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn viewport(&self) -> Option<Bounds> {
        self.viewport
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn heat_point_count(&self) -> usize {
        self.heat.values().map(|l| l.points.len()).sum()
    }

    fn id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    /// Viewport to draw: the fitted one, else the data extent, else the default centre.
    fn frame(&self) -> Bounds {
        if let Some(b) = self.viewport {
            return b;
        }
        let heat_points = self
            .heat
            .values()
            .flat_map(|l| l.points.iter().map(|p| (p.lat, p.lng)));
        let marker_points = self.markers.values().map(|m| (m.lat, m.lng));
        Bounds::around(heat_points.chain(marker_points)).unwrap_or(Bounds {
            south: DEFAULT_CENTER.0,
            west: DEFAULT_CENTER.1,
            north: DEFAULT_CENTER.0,
            east: DEFAULT_CENTER.1,
        })
    }

    pub fn to_svg(&self) -> String {
        let proj = Projection::fit(&self.frame(), self.width, self.height);
        let mut s = String::new();
        s.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        s.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"sans-serif\" font-size=\"12\">\n",
            w = self.width,
            h = self.height
        ));
        s.push_str(&format!(
            "<rect x=\"0\" y=\"0\" width=\"100%\" height=\"100%\" fill=\"{BACKGROUND}\"/>\n"
        ));
        for layer in self.heat.values() {
            push_heat(&mut s, layer, &proj);
        }
        for m in self.markers.values() {
            push_marker(&mut s, m, &proj);
        }
        if let Some(legend) = &self.legend {
            push_legend(&mut s, legend, self.width, self.height);
        }
        s.push_str("</svg>\n");
        s
    }
}

fn push_marker(s: &mut String, m: &MarkerSpec, proj: &Projection) {
    let (x, y) = proj.project(m.lat, m.lng);
    let st = &m.style;
    s.push_str(&format!(
        "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{}\" fill=\"{}\" fill-opacity=\"{}\" stroke=\"{}\" stroke-width=\"{}\" stroke-opacity=\"{}\"><title>{}</title></circle>\n",
        m.radius,
        m.fill_color,
        st.fill_opacity,
        svg_escape(&st.stroke_color),
        st.stroke_weight,
        st.opacity,
        svg_escape(&m.overlay.lines().join("\n")),
    ));
}

// One radial gradient per distinct weight, then a blurred disc per cell.
fn push_heat(s: &mut String, layer: &HeatLayer, proj: &Projection) {
    let style = &layer.style;
    let mut ids: BTreeMap<u64, usize> = BTreeMap::new();
    for p in &layer.points {
        let next = ids.len();
        ids.entry(p.weight.to_bits()).or_insert(next);
    }
    s.push_str("<defs>\n");
    for (bits, id) in &ids {
        let weight = f64::from_bits(*bits);
        let alpha = (weight / style.max).clamp(style.min_opacity, 1.0);
        let color = layer.gradient.color_at(weight / style.max);
        s.push_str(&format!(
            "<radialGradient id=\"heat-{id}\"><stop offset=\"0\" stop-color=\"{color}\" stop-opacity=\"{alpha:.3}\"/><stop offset=\"1\" stop-color=\"{color}\" stop-opacity=\"0\"/></radialGradient>\n"
        ));
    }
    s.push_str("</defs>\n");
    let r = style.radius + style.blur;
    for p in &layer.points {
        let (x, y) = proj.project(p.lat, p.lng);
        let id = ids.get(&p.weight.to_bits()).copied().unwrap_or_default();
        s.push_str(&format!(
            "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{r}\" fill=\"url(#heat-{id})\"/>\n"
        ));
    }
}

fn push_legend(s: &mut String, legend: &Legend, width: u32, height: u32) {
    let row_h = 16.0;
    let w = 210.0;
    let h = 28.0 + row_h * legend.entries.len() as f64 + 6.0;
    let x = f64::from(width) - w - 10.0;
    let y = f64::from(height) - h - 10.0;
    s.push_str(&format!(
        "<g class=\"radiation-legend\"><rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{w}\" height=\"{h}\" rx=\"4\" fill=\"#ffffff\" fill-opacity=\"0.9\" stroke=\"#999\"/>\n"
    ));
    s.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" font-weight=\"bold\" fill=\"#333\">{}</text>\n",
        x + 8.0,
        y + 18.0,
        svg_escape(legend.title)
    ));
    for (i, e) in legend.entries.iter().enumerate() {
        let top = y + 26.0 + row_h * i as f64;
        s.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"12\" height=\"12\" fill=\"{}\" stroke=\"#666\" stroke-width=\"0.5\"/><text x=\"{:.1}\" y=\"{:.1}\" fill=\"#333\">{} ({})</text>\n",
            x + 8.0,
            top,
            e.color,
            x + 26.0,
            top + 10.5,
            svg_escape(&e.range),
            svg_escape(e.label)
        ));
    }
    s.push_str("</g>\n");
}

fn svg_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl MapSurface for SvgSurface {
    type Marker = usize;
    type Heat = usize;

    fn is_attached(&self) -> bool {
        true
    }

    fn add_marker(&mut self, marker: &MarkerSpec) -> usize {
        let id = self.id();
        self.markers.insert(id, marker.clone());
        id
    }

    fn remove_marker(&mut self, marker: usize) {
        self.markers.remove(&marker);
    }

    fn add_heat_layer(&mut self, layer: &HeatLayer) -> usize {
        let id = self.id();
        self.heat.insert(id, layer.clone());
        id
    }

    fn remove_heat_layer(&mut self, layer: usize) {
        self.heat.remove(&layer);
    }

    fn fit_bounds(&mut self, bounds: &Bounds) {
        self.viewport = Some(*bounds);
    }

    fn add_legend(&mut self, legend: &Legend) {
        self.legend = Some(legend.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use radiation_core::{MapViewSession, Measurement, ViewConfig, ViewMode};

    #[test]
    fn projection_keeps_north_up_and_centres_the_frame() {
        let b = Bounds {
            south: 35.0,
            west: 139.0,
            north: 35.1,
            east: 139.2,
        };
        let p = Projection::fit(&b, 800, 600);
        let (cx, cy) = p.project(35.05, 139.1);
        assert_relative_eq!(cx, 400.0, epsilon = 1.0);
        assert_relative_eq!(cy, 300.0, epsilon = 1.0);
        let (_, north) = p.project(35.1, 139.1);
        let (_, south) = p.project(35.0, 139.1);
        assert!(north < south);
        let (west, _) = p.project(35.05, 139.0);
        assert!(west >= -0.5);
    }

    #[test]
    fn single_point_gets_a_minimum_span() {
        let b = Bounds::around([(35.0, 139.0)]).unwrap();
        let p = Projection::fit(&b, 400, 400);
        assert!(p.scale.is_finite() && p.scale > 0.0);
        let (x, y) = p.project(35.0, 139.0);
        assert_relative_eq!(x, 200.0, epsilon = 0.05);
        assert_relative_eq!(y, 200.0, epsilon = 0.05);
    }

    #[test]
    fn markers_render_as_circles_with_band_colors() {
        let mut session = MapViewSession::new(SvgSurface::new(640, 480), ViewConfig::default());
        session.load(vec![
            Measurement::at(35.0, 139.0, 334.0),
            Measurement::at(35.01, 139.01, 33_400.0),
        ]);
        let svg = session.surface().to_svg();
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("fill=\"#ff0080\""));
        assert!(svg.contains("fill=\"#ffff00\""));
        assert!(svg.contains("Radiation Levels (µSv/h)"));
        assert!(svg.contains("&lt; 0.03 (Very Low)"));
    }

    #[test]
    fn heatmap_replaces_markers() {
        let mut session = MapViewSession::new(SvgSurface::new(640, 480), ViewConfig::default());
        session.load(vec![
            Measurement::at(35.00012, 139.00012, 30.0),
            Measurement::at(35.00022, 139.00012, 40.0),
            Measurement::at(35.01, 139.01, 334.0),
        ]);
        session.set_mode(ViewMode::Heatmap);
        let surface = session.surface();
        assert_eq!(surface.marker_count(), 0);
        assert_eq!(surface.heat_point_count(), 2);
        let svg = surface.to_svg();
        assert_eq!(svg.matches("<radialGradient").count(), 2);
        assert_eq!(svg.matches("fill=\"url(#heat-").count(), 2);
        // cells take the marker color of their mean dose
        assert!(svg.contains("stop-color=\"#ff0080\""));
        assert!(svg.contains("stop-color=\"#00ffff\""));
    }

    #[test]
    fn empty_surface_still_renders() {
        let svg = SvgSurface::new(100, 100).to_svg();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
