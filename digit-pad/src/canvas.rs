//! Drawing surface over an HTML canvas 2D context

use recognizer::{CanvasConfig, DrawingSurface, Point, RecognizerError, Result, StrokeStyle};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

pub struct CanvasSurface {
    document: Document,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    size: u32,
}

fn surface_error(e: JsValue) -> RecognizerError {
    RecognizerError::Surface(format!("{:?}", e))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .map_err(surface_error)?
        .ok_or_else(|| RecognizerError::Surface("no 2d context".into()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| RecognizerError::Surface("context is not 2d".into()))
}

impl CanvasSurface {
    /// Size the canvas to its native raster and set up the pen
    pub fn new(document: &Document, canvas: HtmlCanvasElement, config: &CanvasConfig) -> Result<Self> {
        canvas.set_width(config.size);
        canvas.set_height(config.size);

        let ctx = context_2d(&canvas)?;
        ctx.set_line_width(config.stroke_width);
        ctx.set_line_join("round");
        ctx.set_font(&config.font);
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        ctx.set_fill_style_str(&config.ink_color);
        ctx.set_stroke_style_str(&config.ink_color);

        Ok(Self {
            document: document.clone(),
            canvas,
            ctx,
            size: config.size,
        })
    }
}

impl DrawingSurface for CanvasSurface {
    fn size(&self) -> u32 {
        self.size
    }

    fn clear(&mut self) {
        let size = self.size as f64;
        self.ctx.clear_rect(0.0, 0.0, size, size);
    }

    fn stroke_segment(&mut self, from: Point, to: Point, style: &StrokeStyle) {
        self.ctx.set_line_width(style.width);
        self.ctx.set_stroke_style_str(&style.color);
        self.ctx.begin_path();
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.close_path();
        self.ctx.stroke();
    }

    fn show_message(&mut self, text: &str) -> Result<()> {
        self.clear();
        let center = self.size as f64 / 2.0;
        self.ctx.fill_text(text, center, center).map_err(surface_error)
    }

    fn sample(&self, target: u32) -> Result<Vec<u8>> {
        let scaled = self
            .document
            .create_element("canvas")
            .map_err(surface_error)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| RecognizerError::Surface("created element is not a canvas".into()))?;
        scaled.set_width(target);
        scaled.set_height(target);

        let side = target as f64;
        let ctx = context_2d(&scaled)?;
        ctx.set_fill_style_str("#fff");
        ctx.fill_rect(0.0, 0.0, side, side);
        ctx.draw_image_with_html_canvas_element_and_dw_and_dh(&self.canvas, 0.0, 0.0, side, side)
            .map_err(surface_error)?;

        let image = ctx.get_image_data(0.0, 0.0, side, side).map_err(surface_error)?;
        Ok(image.data().0)
    }
}
