use wasm_bindgen::{JsCast, JsValue};
use web_sys::Window;

use crate::LoadError;

/// Prefix `path` with `base`, leaving absolute URLs untouched.
pub fn join_base(base: &str, path: &str) -> String {
    let p = path.trim();
    if p.starts_with("http://") || p.starts_with("https://") || p.starts_with("data:") {
        return p.to_string();
    }
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    format!("{}{}", base, p.trim_start_matches('/'))
}

/// Build an absolute URL for an API path, taking into account the optional
/// `window.__BASE_URL` which is set by the host page.
pub fn asset_url(path: &str) -> String {
    let base = web_sys::window()
        .and_then(|w| {
            let v = js_sys::Reflect::get(&w, &JsValue::from_str("__BASE_URL")).ok()?;
            v.as_string()
        })
        .unwrap_or_else(|| "/".to_string());
    join_base(&base, path)
}

/// Fetch a text resource trying a list of fallback URLs in order.
/// The error of the last attempt is returned when all of them fail.
pub async fn fetch_text_with_fallbacks(window: &Window, urls: &[&str]) -> Result<String, LoadError> {
    let mut last = LoadError::Fetch("no URL to fetch".to_string());
    for url in urls {
        let resp_value =
            match wasm_bindgen_futures::JsFuture::from(window.fetch_with_str(url)).await {
                Ok(v) => v,
                Err(e) => {
                    last = LoadError::from_js(e);
                    continue;
                }
            };
        let resp: web_sys::Response = match resp_value.dyn_into() {
            Ok(r) => r,
            Err(e) => {
                last = LoadError::from_js(e);
                continue;
            }
        };
        if !resp.ok() {
            last = LoadError::Status {
                url: url.to_string(),
                status: resp.status(),
            };
            continue;
        }
        let text_promise = resp.text().map_err(LoadError::from_js)?;
        let text_js = wasm_bindgen_futures::JsFuture::from(text_promise)
            .await
            .map_err(LoadError::from_js)?;
        return text_js
            .as_string()
            .ok_or_else(|| LoadError::Fetch(format!("{url}: body is not text")));
    }
    Err(last)
}

/// Simple query string parser used at start-up.
pub fn get_query_param(search: &str, key: &str) -> Option<String> {
    let s = search.trim_start_matches('?');
    for pair in s.split('&') {
        let mut it = pair.splitn(2, '=');
        let k = it.next()?;
        let v = it.next().unwrap_or("");
        if k == key {
            return Some(url_decode(v));
        }
    }
    None
}

fn url_decode(s: &str) -> String {
    percent_encoding::percent_decode_str(&s.replace('+', " "))
        .decode_utf8()
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.to_string())
}
