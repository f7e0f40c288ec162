mod app;
mod canvas;
mod dom;
mod ort;

use wasm_bindgen::prelude::*;

// Model lists and canvas settings, embedded at compile time
const MODELS_JSON: &str = include_str!("../models.json");
const SINGLE_MODEL_JSON: &str = include_str!("../models_single.json");

/// Pick the embedded configuration from the page's query string.
///
/// `?single` runs the one-model page, anything else the comparison.
fn config_for_query(search: &str) -> &'static str {
    let single = search
        .trim_start_matches('?')
        .split('&')
        .any(|param| param == "single" || param.starts_with("single="));
    if single {
        SINGLE_MODEL_JSON
    } else {
        MODELS_JSON
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or("no window")?;
    let search = window.location().search()?;
    app::init(config_for_query(&search))
}

/// Detach the drawing pad's input handlers
#[wasm_bindgen]
pub fn unbind() {
    app::unbind();
}
