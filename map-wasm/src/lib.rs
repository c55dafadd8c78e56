//! Browser front end for a bGeigie import: a Leaflet map that shows the
//! measurements as classified markers or as an aggregated heatmap.
//!
//! The module starts itself when the page already contains the map container.
//! Pages that render the container later call `initImportMap(id)`; the other
//! exports back the page's buttons.

use std::cell::RefCell;
use std::rc::Rc;

use radiation_core::{
    MapViewSession, Measurement, MeasurementStats, RenderOutcome, ViewConfig, parse_measurements,
};
use thiserror::Error;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Window};

mod console;
mod dom;
mod leaflet;
mod state;
mod utils;

use leaflet::LeafletSurface;
use state::State;

/// Why the map could not be set up or filled.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Leaflet is not loaded")]
    LeafletMissing,
    #[error("map container #{0} not found")]
    MissingContainer(String),
    #[error("request failed: {0}")]
    Fetch(String),
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("bad measurement payload: {0}")]
    Decode(#[from] radiation_core::Error),
}

impl LoadError {
    pub(crate) fn from_js(value: JsValue) -> Self {
        let text = value
            .as_string()
            .or_else(|| {
                value
                    .dyn_ref::<js_sys::Error>()
                    .map(|e| String::from(e.message()))
            })
            .unwrap_or_else(|| format!("{value:?}"));
        LoadError::Fetch(text)
    }
}

impl From<LoadError> for JsValue {
    fn from(e: LoadError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

/// Host page overrides from `window.__SAFECAST_MAP`, as an object or a JSON string.
fn read_config(window: &Window) -> ViewConfig {
    let raw = match js_sys::Reflect::get(window, &JsValue::from_str("__SAFECAST_MAP")) {
        Ok(v) if !v.is_undefined() && !v.is_null() => v,
        _ => return ViewConfig::default(),
    };
    let text = raw.as_string().or_else(|| {
        js_sys::JSON::stringify(&raw)
            .ok()
            .and_then(|s| s.as_string())
    });
    match text.map(|t| ViewConfig::from_json(&t)) {
        Some(Ok(cfg)) => cfg,
        Some(Err(e)) => {
            log::warn!("ignoring window.__SAFECAST_MAP: {e}");
            ViewConfig::default()
        }
        None => ViewConfig::default(),
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console::init(log::LevelFilter::Info);
    let window = web_sys::window().ok_or("no window")?;
    let config = read_config(&window);
    log::set_max_level(config.log_level());
    let document = window.document().ok_or("no document")?;
    if document.get_element_by_id(&config.container_id).is_none() {
        log::debug!("no #{} on this page yet", config.container_id);
        return Ok(());
    }
    let import_id = dom::page_import_id(&window, &document, &config.container_id);
    mount(window, document, config, import_id)
}

/// Replace any existing map with a fresh one and load `import_id` into it.
#[wasm_bindgen(js_name = initImportMap)]
pub fn init_import_map(import_id: String) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let config = read_config(&window);
    mount(window, document, config, Some(import_id))
}

/// Load another import into the existing map.
#[wasm_bindgen(js_name = loadImport)]
pub fn load_import(import_id: String) -> Result<(), JsValue> {
    let state = state::current().ok_or("map not initialised")?;
    load(&state, import_id);
    Ok(())
}

/// Switch between markers and heatmap. Returns the mode now shown.
#[wasm_bindgen(js_name = toggleHeatmap)]
pub fn toggle_heatmap() -> Option<String> {
    state::with_state(|s| {
        let outcome = s.session.toggle();
        log::debug!("toggle: {outcome:?}");
        dom::update_toggle_label(&s.document, s.session.mode());
        s.session.mode().as_str().to_string()
    })
}

#[wasm_bindgen(js_name = fitToData)]
pub fn fit_to_data() {
    state::with_state(|s| s.session.fit_to_data());
}

#[wasm_bindgen(js_name = currentImport)]
pub fn current_import() -> Option<String> {
    state::with_state(|s| s.import_id.clone()).flatten()
}

#[wasm_bindgen(js_name = currentMode)]
pub fn current_mode() -> Option<String> {
    state::with_state(|s| s.session.mode().as_str().to_string())
}

/// Remove the map and every listener it registered.
#[wasm_bindgen(js_name = teardownMap)]
pub fn teardown_map() {
    unmount();
}

fn unmount() {
    if let Some(old) = state::replace(None) {
        let mut s = old.borrow_mut();
        s.session.teardown();
        s.session.surface().remove();
        log::debug!("map removed");
    }
}

fn mount(
    window: Window,
    document: Document,
    config: ViewConfig,
    import_id: Option<String>,
) -> Result<(), JsValue> {
    unmount();
    let surface = LeafletSurface::create(&document, &config)?;
    let session = MapViewSession::new(surface, config);
    let state = Rc::new(RefCell::new(State {
        window,
        document: document.clone(),
        session,
        import_id: None,
    }));
    attach_controls(&state)?;
    state::replace(Some(state.clone()));
    dom::update_stats(&document, None);
    if let Some(id) = import_id {
        load(&state, id);
    }
    Ok(())
}

// Wires up the optional toggle and fit buttons of the page.
fn attach_controls(state: &Rc<RefCell<State>>) -> Result<(), JsValue> {
    let document = state.borrow().document.clone();
    let toggle = dom::on_click(&document, dom::TOGGLE_BUTTON_ID, |_| {
        toggle_heatmap();
    })?;
    let fit = dom::on_click(&document, dom::FIT_BUTTON_ID, |_| fit_to_data())?;
    let mut s = state.borrow_mut();
    for sub in [toggle, fit].into_iter().flatten() {
        s.session.subscribe(sub);
    }
    dom::update_toggle_label(&document, s.session.mode());
    Ok(())
}

fn load(state: &Rc<RefCell<State>>, import_id: String) {
    let (ticket, urls, window) = {
        let mut s = state.borrow_mut();
        s.import_id = Some(import_id.clone());
        let path = s.session.config().measurements_url(&import_id);
        let mut urls = vec![utils::asset_url(&path)];
        let rooted = format!("/{}", path.trim_start_matches('/'));
        if !urls.contains(&rooted) {
            urls.push(rooted);
        }
        (s.session.begin_load(), urls, s.window.clone())
    };
    let state = state.clone();
    wasm_bindgen_futures::spawn_local(async move {
        let urls: Vec<&str> = urls.iter().map(String::as_str).collect();
        let result = fetch_measurements(&window, &urls).await;
        let mut s = state.borrow_mut();
        match result {
            Ok(measurements) => {
                let stats = MeasurementStats::from_measurements(&measurements);
                let outcome = s.session.complete_load(ticket, measurements);
                match outcome {
                    RenderOutcome::Stale | RenderOutcome::Detached => {
                        log::debug!("import {import_id} arrived after the view changed ({outcome:?})");
                    }
                    _ => {
                        dom::update_stats(&s.document, stats.as_ref());
                        dom::update_toggle_label(&s.document, s.session.mode());
                        log::info!("import {import_id}: {outcome:?}");
                    }
                }
            }
            Err(e) if s.session.is_current(ticket) && s.session.is_live() => {
                log::error!("failed to load import {import_id}: {e}");
                drop(s);
                fail(&state, LOAD_FAILED_MESSAGE);
            }
            Err(e) => log::debug!("ignoring failed load of import {import_id}: {e}"),
        }
    });
}

const LOAD_FAILED_MESSAGE: &str = "Failed to load measurement data";

// Tear the map down and leave only the message in its container.
fn fail(state: &Rc<RefCell<State>>, message: &str) {
    if state::current().is_some_and(|cur| Rc::ptr_eq(&cur, state)) {
        state::replace(None);
    }
    let mut s = state.borrow_mut();
    s.session.teardown();
    s.session.surface().remove();
    dom::show_error(s.session.surface().container(), message);
}

async fn fetch_measurements(window: &Window, urls: &[&str]) -> Result<Vec<Measurement>, LoadError> {
    let text = utils::fetch_text_with_fallbacks(window, urls).await?;
    Ok(parse_measurements(&text)?)
}
