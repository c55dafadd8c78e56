use radiation_core::{MeasurementStats, STAT_FIELDS, Subscription, ViewMode};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, EventTarget, HtmlElement, Window};

use crate::utils::get_query_param;

pub const TOGGLE_BUTTON_ID: &str = "toggle-heatmap";
pub const FIT_BUTTON_ID: &str = "fit-to-data";

/// Attach a DOM listener; disposing the subscription detaches it and frees the closure.
pub fn listen(
    target: &EventTarget,
    event: &'static str,
    handler: impl FnMut(Event) + 'static,
) -> Result<Subscription, JsValue> {
    let cb = Closure::<dyn FnMut(Event)>::wrap(Box::new(handler));
    target.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref())?;
    let target = target.clone();
    Ok(Subscription::new(move || {
        let _ = target.remove_event_listener_with_callback(event, cb.as_ref().unchecked_ref());
        drop(cb);
    }))
}

/// Listen for clicks on `#id` when the page has such an element.
pub fn on_click(
    document: &Document,
    id: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<Option<Subscription>, JsValue> {
    match document.get_element_by_id(id) {
        Some(el) => listen(&el, "click", handler).map(Some),
        None => Ok(None),
    }
}

/// Fill the summary tiles; `-` when there is nothing to summarise.
pub fn update_stats(document: &Document, stats: Option<&MeasurementStats>) {
    let values = stats
        .map(MeasurementStats::display_values)
        .unwrap_or_else(|| std::array::from_fn(|_| "-".to_string()));
    for (id, value) in STAT_FIELDS.iter().zip(values) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(&value));
        }
    }
}

/// Label the toggle button with the mode it switches to.
pub fn update_toggle_label(document: &Document, mode: ViewMode) {
    if let Some(el) = document.get_element_by_id(TOGGLE_BUTTON_ID) {
        let label = match mode {
            ViewMode::Markers => "Show Heatmap",
            ViewMode::Heatmap => "Show Markers",
        };
        el.set_text_content(Some(label));
    }
}

pub const ERROR_CLASS: &str = "map-error";

/// Markup shown in place of the map when its data cannot be loaded.
pub fn error_markup(message: &str) -> String {
    format!(
        "<div class=\"{ERROR_CLASS}\" role=\"alert\">{}</div>",
        radiation_core::overlay::escape_html(message)
    )
}

/// Replace whatever the container holds with an error message.
pub fn show_error(container: &HtmlElement, message: &str) {
    container.set_inner_html(&error_markup(message));
}

/// Import id from `?import=` or, failing that, the container's `data-import-id`.
pub fn page_import_id(window: &Window, document: &Document, container_id: &str) -> Option<String> {
    window
        .location()
        .search()
        .ok()
        .and_then(|search| get_query_param(&search, "import"))
        .or_else(|| {
            document
                .get_element_by_id(container_id)?
                .dyn_into::<HtmlElement>()
                .ok()?
                .dataset()
                .get("importId")
        })
        .filter(|id| !id.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_markup_is_a_single_escaped_alert() {
        let html = error_markup("Failed to load <measurement> data");
        assert_eq!(
            html,
            "<div class=\"map-error\" role=\"alert\">Failed to load &lt;measurement&gt; data</div>"
        );
    }
}
