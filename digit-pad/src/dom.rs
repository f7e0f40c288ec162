//! Page construction and prediction bar rendering

use recognizer::{DemoConfig, ModelDisplay, PredictionBoard, NUM_CLASSES};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement};

pub const CANVAS_ID: &str = "canvas";
pub const CLEAR_BUTTON_ID: &str = "clear-button";

const COLUMN_CLASS: &str = "prediction-col";
const TOP_COLUMN_CLASS: &str = "prediction-col top-prediction";
const BAR_HEIGHT_PX: u32 = 100;

const STYLES: &str = "\
body { margin: 0; font-family: sans-serif; background: #fafafa; color: #212121; } \
#app { display: flex; flex-wrap: wrap; gap: 24px; padding: 24px; align-items: flex-start; } \
#canvas { border: 1px solid #bdbdbd; background: #fff; cursor: crosshair; } \
.panel { display: flex; flex-direction: column; align-items: center; } \
.panel-title { font-size: 14px; margin-bottom: 6px; } \
.prediction-row { display: flex; gap: 4px; } \
.prediction-col { display: flex; flex-direction: column; align-items: center; } \
.bar-track { width: 16px; background: #eeeeee; display: flex; align-items: flex-end; } \
.bar-fill { width: 100%; height: 0; background: #9e9e9e; } \
.top-prediction .bar-fill { background: #43a047; } \
.top-prediction .bar-label { font-weight: bold; color: #43a047; } \
.bar-label { font-size: 12px; margin-top: 2px; }";

/// Id of the column element for one model's class bar
pub fn prediction_element_id(key: &str, class: usize) -> String {
    format!("prediction-{}-{}", key, class)
}

/// Bar fill height as a CSS percentage
pub fn bar_height(magnitude: f32) -> String {
    format!("{}%", magnitude)
}

fn element(document: &Document, tag: &str, class: &str) -> Result<Element, JsValue> {
    let el = document.create_element(tag)?;
    el.set_class_name(class);
    Ok(el)
}

/// Build the canvas, the clear button and one bar panel per model
pub fn setup_ui(document: &Document, config: &DemoConfig) -> Result<HtmlCanvasElement, JsValue> {
    let head = document.head().ok_or("no head")?;
    let style = document.create_element("style")?;
    style.set_text_content(Some(STYLES));
    head.append_child(&style)?;

    let body = document.body().ok_or("no body")?;
    let app = element(document, "div", "")?;
    app.set_id("app");
    body.append_child(&app)?;

    // Drawing column
    let pad = element(document, "div", "panel")?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()?;
    canvas.set_id(CANVAS_ID);
    let display_size = config.canvas.size as f64 * config.canvas.display_scale;
    canvas.set_attribute(
        "style",
        &format!("width: {}px; height: {}px;", display_size, display_size),
    )?;
    pad.append_child(&canvas)?;

    let clear = element(document, "button", "")?;
    clear.set_id(CLEAR_BUTTON_ID);
    clear.set_text_content(Some("Clear"));
    clear.set_attribute("style", "margin-top: 8px; padding: 4px 16px;")?;
    pad.append_child(&clear)?;
    app.append_child(&pad)?;

    for model in &config.models {
        let panel = element(document, "div", "panel")?;
        let title = element(document, "div", "panel-title")?;
        title.set_text_content(Some(&model.title));
        panel.append_child(&title)?;

        let row = element(document, "div", "prediction-row")?;
        for class in 0..NUM_CLASSES {
            let col = element(document, "div", COLUMN_CLASS)?;
            col.set_id(&prediction_element_id(&model.key, class));

            let track = element(document, "div", "bar-track")?;
            track.set_attribute("style", &format!("height: {}px;", BAR_HEIGHT_PX))?;
            let fill = element(document, "div", "bar-fill")?;
            track.append_child(&fill)?;
            col.append_child(&track)?;

            let label = element(document, "div", "bar-label")?;
            label.set_text_content(Some(&class.to_string()));
            col.append_child(&label)?;

            row.append_child(&col)?;
        }
        panel.append_child(&row)?;
        app.append_child(&panel)?;
    }

    Ok(canvas)
}

fn render_display(document: &Document, display: &ModelDisplay) -> Result<(), JsValue> {
    for (class, bar) in display.bars().iter().enumerate() {
        let Some(col) = document.get_element_by_id(&prediction_element_id(display.key(), class))
        else {
            continue;
        };
        let fill = col
            .first_element_child()
            .and_then(|track| track.first_element_child())
            .ok_or("bar column has no fill element")?
            .dyn_into::<HtmlElement>()?;

        fill.style().set_property("height", &bar_height(bar.magnitude))?;
        col.set_class_name(if bar.is_top { TOP_COLUMN_CLASS } else { COLUMN_CLASS });
    }
    Ok(())
}

/// Write every model's bars to the page
pub fn render_board(document: &Document, board: &PredictionBoard) -> Result<(), JsValue> {
    for display in board.displays() {
        render_display(document, display)?;
    }
    Ok(())
}
