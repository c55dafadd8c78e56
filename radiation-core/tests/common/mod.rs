//! In-memory map used to drive the session without a browser.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use radiation_core::{Bounds, HeatLayer, Legend, MapSurface, MarkerSpec};

#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    AddMarker(usize),
    RemoveMarker(usize),
    AddHeat(usize),
    RemoveHeat(usize),
    Fit(Bounds),
    Legend(usize),
}

#[derive(Default)]
pub struct RecordingSurface {
    pub attached: Rc<Cell<bool>>,
    pub ops: Vec<Op>,
    pub markers: BTreeMap<usize, MarkerSpec>,
    pub heat: BTreeMap<usize, HeatLayer>,
    pub viewport: Option<Bounds>,
    next_id: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        RecordingSurface {
            attached: Rc::new(Cell::new(true)),
            ..Default::default()
        }
    }

    fn id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    pub fn marker_specs(&self) -> Vec<MarkerSpec> {
        self.markers.values().cloned().collect()
    }

    pub fn legend_count(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, Op::Legend(_))).count()
    }
}

impl MapSurface for RecordingSurface {
    type Marker = usize;
    type Heat = usize;

    fn is_attached(&self) -> bool {
        self.attached.get()
    }

    fn add_marker(&mut self, marker: &MarkerSpec) -> usize {
        let id = self.id();
        self.markers.insert(id, marker.clone());
        self.ops.push(Op::AddMarker(id));
        id
    }

    fn remove_marker(&mut self, marker: usize) {
        assert!(self.markers.remove(&marker).is_some(), "marker {marker} removed twice");
        self.ops.push(Op::RemoveMarker(marker));
    }

    fn add_heat_layer(&mut self, layer: &HeatLayer) -> usize {
        let id = self.id();
        self.heat.insert(id, layer.clone());
        self.ops.push(Op::AddHeat(id));
        id
    }

    fn remove_heat_layer(&mut self, layer: usize) {
        assert!(self.heat.remove(&layer).is_some(), "heat layer {layer} removed twice");
        self.ops.push(Op::RemoveHeat(layer));
    }

    fn fit_bounds(&mut self, bounds: &Bounds) {
        self.viewport = Some(*bounds);
        self.ops.push(Op::Fit(*bounds));
    }

    fn add_legend(&mut self, legend: &Legend) {
        self.ops.push(Op::Legend(legend.entries.len()));
    }
}
