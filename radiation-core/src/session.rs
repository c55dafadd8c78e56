//! View-mode controller.
//!
//! A [`MapViewSession`] owns the map surface, the measurements of the import
//! being shown and whichever layer is currently attached. Marker and heat
//! layers are mutually exclusive: switching modes always detaches one before
//! building the other, and asking for the mode already on screen is a no-op.

use serde::{Deserialize, Serialize};

use crate::config::ViewConfig;
use crate::events::{Subscription, Subscriptions};
use crate::heat::{HeatLayer, plan_heat};
use crate::legend::{Legend, legend};
use crate::markers::{Bounds, MarkerSpec, plan_markers};
use crate::measurement::Measurement;

/// Rendering capabilities the session needs from a map library.
pub trait MapSurface {
    /// Handle to a placed marker.
    type Marker;
    /// Handle to an attached heat layer.
    type Heat;

    /// Whether the map container still exists. Nothing is drawn on a detached surface.
    fn is_attached(&self) -> bool;
    fn add_marker(&mut self, marker: &MarkerSpec) -> Self::Marker;
    fn remove_marker(&mut self, marker: Self::Marker);
    fn add_heat_layer(&mut self, layer: &HeatLayer) -> Self::Heat;
    fn remove_heat_layer(&mut self, layer: Self::Heat);
    fn fit_bounds(&mut self, bounds: &Bounds);
    fn add_legend(&mut self, legend: &Legend);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Markers,
    Heatmap,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Markers => ViewMode::Heatmap,
            ViewMode::Heatmap => ViewMode::Markers,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Markers => "markers",
            ViewMode::Heatmap => "heatmap",
        }
    }
}

/// The layer currently attached to the map.
#[derive(Debug)]
pub enum ActiveLayer<M, H> {
    None,
    Markers(Vec<M>),
    Heat(H),
}

impl<M, H> Default for ActiveLayer<M, H> {
    fn default() -> Self {
        ActiveLayer::None
    }
}

/// What a session call did to the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Marker layer rebuilt with this many markers.
    Markers(usize),
    /// Heat layer rebuilt with this many cells.
    Heatmap(usize),
    /// The requested state was already on screen.
    Unchanged,
    /// The surface is gone or the session was torn down.
    Detached,
    /// A load finished after a newer one started.
    Stale,
}

/// Identifies one load so a late completion can be told apart from the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

pub struct MapViewSession<S: MapSurface> {
    surface: S,
    config: ViewConfig,
    measurements: Vec<Measurement>,
    mode: ViewMode,
    active: ActiveLayer<S::Marker, S::Heat>,
    marker_bounds: Option<Bounds>,
    subscriptions: Subscriptions,
    generation: u64,
    torn_down: bool,
}

impl<S: MapSurface> MapViewSession<S> {
    /// Wrap a freshly initialised map and draw the legend on it.
    pub fn new(mut surface: S, config: ViewConfig) -> Self {
        if surface.is_attached() {
            surface.add_legend(&legend());
        }
        MapViewSession {
            surface,
            config,
            measurements: Vec::new(),
            mode: ViewMode::Markers,
            active: ActiveLayer::None,
            marker_bounds: None,
            subscriptions: Subscriptions::default(),
            generation: 0,
            torn_down: false,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn active_layer(&self) -> &ActiveLayer<S::Marker, S::Heat> {
        &self.active
    }

    pub fn marker_count(&self) -> usize {
        match &self.active {
            ActiveLayer::Markers(m) => m.len(),
            _ => 0,
        }
    }

    pub fn has_heat_layer(&self) -> bool {
        matches!(self.active, ActiveLayer::Heat(_))
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// False once torn down or when the map container has disappeared.
    pub fn is_live(&self) -> bool {
        !self.torn_down && self.surface.is_attached()
    }

    /// Keep a listener alive until teardown.
    pub fn subscribe(&mut self, sub: Subscription) {
        if self.torn_down {
            sub.dispose();
        } else {
            self.subscriptions.push(sub);
        }
    }

    /// Start a load. Any ticket handed out earlier becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket(self.generation)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        !self.torn_down && ticket.0 == self.generation
    }

    /// Finish a load: replace the dataset and show it as markers.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        measurements: Vec<Measurement>,
    ) -> RenderOutcome {
        if !self.is_current(ticket) {
            log::debug!("dropping load {} (current is {})", ticket.0, self.generation);
            return RenderOutcome::Stale;
        }
        if !self.is_live() {
            return RenderOutcome::Detached;
        }
        self.measurements = measurements;
        self.clear_active();
        self.render_markers()
    }

    /// Load a dataset that is already in memory.
    pub fn load(&mut self, measurements: Vec<Measurement>) -> RenderOutcome {
        let ticket = self.begin_load();
        self.complete_load(ticket, measurements)
    }

    /// Replace the dataset and redraw it in the current mode.
    pub fn reload(&mut self, measurements: Vec<Measurement>) -> RenderOutcome {
        if !self.is_live() {
            return RenderOutcome::Detached;
        }
        self.generation += 1;
        self.measurements = measurements;
        self.clear_active();
        match self.mode {
            ViewMode::Markers => self.render_markers(),
            ViewMode::Heatmap => self.render_heat(),
        }
    }

    /// Switch between markers and heatmap on the data already loaded.
    pub fn toggle(&mut self) -> RenderOutcome {
        match self.mode {
            ViewMode::Markers => self.show_heatmap(),
            ViewMode::Heatmap => self.show_markers(),
        }
    }

    pub fn set_mode(&mut self, mode: ViewMode) -> RenderOutcome {
        match mode {
            ViewMode::Markers => self.show_markers(),
            ViewMode::Heatmap => self.show_heatmap(),
        }
    }

    pub fn show_markers(&mut self) -> RenderOutcome {
        if !self.is_live() {
            return RenderOutcome::Detached;
        }
        if self.mode == ViewMode::Markers && matches!(self.active, ActiveLayer::Markers(_)) {
            return RenderOutcome::Unchanged;
        }
        self.clear_active();
        self.render_markers()
    }

    pub fn show_heatmap(&mut self) -> RenderOutcome {
        if !self.is_live() {
            return RenderOutcome::Detached;
        }
        if self.mode == ViewMode::Heatmap && self.has_heat_layer() {
            return RenderOutcome::Unchanged;
        }
        self.clear_active();
        self.render_heat()
    }

    /// Re-fit the viewport to the markers on screen.
    pub fn fit_to_data(&mut self) -> RenderOutcome {
        if !self.is_live() {
            return RenderOutcome::Detached;
        }
        let count = self.marker_count();
        match self.marker_bounds {
            Some(b) if count > 0 => {
                self.surface.fit_bounds(&b.pad(self.config.fit_padding));
                RenderOutcome::Markers(count)
            }
            _ => RenderOutcome::Unchanged,
        }
    }

    /// Detach everything, drop listeners and the dataset. Later calls report `Detached`.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        if self.surface.is_attached() {
            self.clear_active();
        } else {
            self.active = ActiveLayer::None;
        }
        self.subscriptions.dispose_all();
        self.measurements.clear();
        self.marker_bounds = None;
        self.generation += 1;
        self.torn_down = true;
        log::debug!("map view torn down");
    }

    fn clear_active(&mut self) {
        match std::mem::take(&mut self.active) {
            ActiveLayer::None => {}
            ActiveLayer::Markers(markers) => {
                for m in markers {
                    self.surface.remove_marker(m);
                }
            }
            ActiveLayer::Heat(layer) => self.surface.remove_heat_layer(layer),
        }
        self.marker_bounds = None;
    }

    fn render_markers(&mut self) -> RenderOutcome {
        let plan = plan_markers(&self.measurements, &self.config.marker);
        let handles: Vec<S::Marker> = plan
            .markers
            .iter()
            .map(|m| self.surface.add_marker(m))
            .collect();
        if let Some(b) = plan.bounds {
            self.surface.fit_bounds(&b.pad(self.config.fit_padding));
        }
        let count = handles.len();
        self.active = ActiveLayer::Markers(handles);
        self.marker_bounds = plan.bounds;
        self.mode = ViewMode::Markers;
        log::info!("showing {count} marker(s)");
        RenderOutcome::Markers(count)
    }

    fn render_heat(&mut self) -> RenderOutcome {
        let layer = plan_heat(&self.measurements, &self.config.heat);
        let cells = layer.points.len();
        self.active = ActiveLayer::Heat(self.surface.add_heat_layer(&layer));
        self.mode = ViewMode::Heatmap;
        log::info!("showing heatmap with {cells} cell(s)");
        RenderOutcome::Heatmap(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_toggles_between_two_states() {
        assert_eq!(ViewMode::default(), ViewMode::Markers);
        assert_eq!(ViewMode::Markers.toggled(), ViewMode::Heatmap);
        assert_eq!(ViewMode::Heatmap.toggled().toggled(), ViewMode::Heatmap);
        assert_eq!(ViewMode::Heatmap.as_str(), "heatmap");
    }

    #[test]
    fn mode_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&ViewMode::Heatmap).unwrap(), "\"heatmap\"");
        let m: ViewMode = serde_json::from_str("\"markers\"").unwrap();
        assert_eq!(m, ViewMode::Markers);
    }
}
