//! Leaflet bindings and the [`MapSurface`] backed by them.
//!
//! Only the handful of Leaflet calls the view needs are bound. The heat layer
//! comes from the `leaflet.heat` plugin; when the plugin is absent the heatmap
//! degrades to an empty view and a console warning.

use js_sys::{Array, Function, Object};
use radiation_core::{
    Bounds, HeatLayer, Legend, MapSurface, MarkerSpec, Subscription, ViewConfig,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement};

use crate::LoadError;

#[wasm_bindgen]
extern "C" {
    #[derive(Clone, Debug)]
    pub type Map;

    #[wasm_bindgen(catch, js_namespace = L, js_name = map)]
    fn new_map(container: &HtmlElement) -> Result<Map, JsValue>;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &Map, center: &Array, zoom: u8) -> Map;

    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &Map, bounds: &Array) -> Map;

    #[wasm_bindgen(method, js_name = removeLayer)]
    fn remove_layer(this: &Map, layer: &Layer) -> Map;

    #[wasm_bindgen(method)]
    fn remove(this: &Map) -> Map;

    #[derive(Clone, Debug)]
    pub type Layer;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &Layer, map: &Map) -> Layer;

    #[wasm_bindgen(method, js_name = bindTooltip)]
    fn bind_tooltip(this: &Layer, content: &str) -> Layer;

    #[wasm_bindgen(method, js_name = bindPopup)]
    fn bind_popup(this: &Layer, content: &str) -> Layer;

    #[wasm_bindgen(method, js_name = setStyle)]
    fn set_style(this: &Layer, style: &Object) -> Layer;

    #[wasm_bindgen(method)]
    fn on(this: &Layer, event: &str, handler: &Function) -> Layer;

    #[wasm_bindgen(method)]
    fn off(this: &Layer, event: &str, handler: &Function) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    fn tile_layer(url: &str, options: &Object) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = circleMarker)]
    fn circle_marker(latlng: &Array, options: &Object) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = heatLayer)]
    fn heat_layer(points: &Array, options: &Object) -> Layer;

    type Control;

    #[wasm_bindgen(js_namespace = L, js_name = control)]
    fn control(options: &Object) -> Control;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_control_to(this: &Control, map: &Map) -> Control;
}

/// Build a plain JS object from key/value pairs.
fn options(pairs: &[(&str, JsValue)]) -> Object {
    let obj = Object::new();
    for (k, v) in pairs {
        let _ = js_sys::Reflect::set(&obj, &JsValue::from_str(k), v);
    }
    obj
}

fn lat_lng(lat: f64, lng: f64) -> Array {
    Array::of2(&JsValue::from_f64(lat), &JsValue::from_f64(lng))
}

fn bounds_array(b: &Bounds) -> Array {
    Array::of2(&lat_lng(b.south, b.west), &lat_lng(b.north, b.east))
}

/// Whether `L.<name>` exists and is callable.
fn leaflet_has(name: &str) -> bool {
    js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("L"))
        .ok()
        .filter(|l| l.is_object())
        .and_then(|l| js_sys::Reflect::get(&l, &JsValue::from_str(name)).ok())
        .is_some_and(|f| f.is_function())
}

/// Register a Leaflet event handler; disposing the subscription unregisters it.
fn on_layer(
    layer: &Layer,
    event: &'static str,
    handler: impl FnMut(JsValue) + 'static,
) -> Subscription {
    let cb = Closure::<dyn FnMut(JsValue)>::wrap(Box::new(handler));
    layer.on(event, cb.as_ref().unchecked_ref());
    let layer = layer.clone();
    Subscription::new(move || {
        layer.off(event, cb.as_ref().unchecked_ref());
        drop(cb);
    })
}

/// A placed circle marker and the hover handlers bound to it.
pub struct LeafletMarker {
    layer: Layer,
    _hover: [Subscription; 2],
}

pub struct LeafletSurface {
    map: Map,
    container: HtmlElement,
    document: Document,
}

impl LeafletSurface {
    /// Create the map inside the configured container with the base tile layer.
    pub fn create(document: &Document, config: &ViewConfig) -> Result<Self, LoadError> {
        if !leaflet_has("map") {
            return Err(LoadError::LeafletMissing);
        }
        let container = document
            .get_element_by_id(&config.container_id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .ok_or_else(|| LoadError::MissingContainer(config.container_id.clone()))?;
        let map = new_map(&container).map_err(LoadError::from_js)?;
        map.set_view(&lat_lng(config.center[0], config.center[1]), config.zoom);
        tile_layer(
            &config.tile_url,
            &options(&[("attribution", config.tile_attribution.as_str().into())]),
        )
        .add_to(&map);
        Ok(LeafletSurface {
            map,
            container,
            document: document.clone(),
        })
    }

    pub fn container(&self) -> &HtmlElement {
        &self.container
    }

    /// Destroy the Leaflet map and release its DOM.
    pub fn remove(&self) {
        self.map.remove();
    }
}

impl MapSurface for LeafletSurface {
    type Marker = LeafletMarker;
    type Heat = Option<Layer>;

    fn is_attached(&self) -> bool {
        self.container.is_connected()
    }

    fn add_marker(&mut self, spec: &MarkerSpec) -> LeafletMarker {
        let style = &spec.style;
        let layer = circle_marker(
            &lat_lng(spec.lat, spec.lng),
            &options(&[
                ("radius", spec.radius.into()),
                ("fillColor", spec.fill_color.into()),
                ("color", style.stroke_color.as_str().into()),
                ("weight", style.stroke_weight.into()),
                ("opacity", style.opacity.into()),
                ("fillOpacity", style.fill_opacity.into()),
            ]),
        );
        let html = spec.overlay.to_html();
        layer.bind_tooltip(&html);
        layer.bind_popup(&html);

        let weight = style.stroke_weight;
        let target = layer.clone();
        let over = on_layer(&layer, "mouseover", move |_| {
            target.set_style(&options(&[("weight", (weight * 2.0).into())]));
        });
        let target = layer.clone();
        let out = on_layer(&layer, "mouseout", move |_| {
            target.set_style(&options(&[("weight", weight.into())]));
        });

        layer.add_to(&self.map);
        LeafletMarker {
            layer,
            _hover: [over, out],
        }
    }

    fn remove_marker(&mut self, marker: LeafletMarker) {
        self.map.remove_layer(&marker.layer);
    }

    fn add_heat_layer(&mut self, heat: &HeatLayer) -> Option<Layer> {
        if !leaflet_has("heatLayer") {
            log::warn!("leaflet.heat is not loaded; heatmap unavailable");
            return None;
        }
        let points: Array = heat
            .points
            .iter()
            .map(|p| {
                Array::of3(
                    &JsValue::from_f64(p.lat),
                    &JsValue::from_f64(p.lng),
                    &JsValue::from_f64(p.weight),
                )
            })
            .collect();
        let gradient = Object::new();
        for stop in &heat.gradient.stops {
            let _ = js_sys::Reflect::set(
                &gradient,
                &JsValue::from_str(&stop.weight.to_string()),
                &JsValue::from_str(stop.color),
            );
        }
        let style = &heat.style;
        let layer = heat_layer(
            &points,
            &options(&[
                ("radius", style.radius.into()),
                ("blur", style.blur.into()),
                ("maxZoom", style.max_zoom.into()),
                ("max", style.max.into()),
                ("minOpacity", style.min_opacity.into()),
                ("gradient", gradient.into()),
            ]),
        );
        Some(layer.add_to(&self.map))
    }

    fn remove_heat_layer(&mut self, layer: Option<Layer>) {
        if let Some(layer) = layer {
            self.map.remove_layer(&layer);
        }
    }

    fn fit_bounds(&mut self, bounds: &Bounds) {
        self.map.fit_bounds(&bounds_array(bounds));
    }

    fn add_legend(&mut self, legend: &Legend) {
        let div = match self.document.create_element("div") {
            Ok(div) => div,
            Err(err) => {
                log::warn!("legend not drawn: {err:?}");
                return;
            }
        };
        div.set_class_name("radiation-legend");
        div.set_inner_html(&legend.to_html());
        let ctl = control(&options(&[("position", "bottomright".into())]));
        let on_add = Closure::once_into_js(move |_map: JsValue| -> JsValue { div.into() });
        let _ = js_sys::Reflect::set(&ctl, &JsValue::from_str("onAdd"), &on_add);
        ctl.add_control_to(&self.map);
    }
}
