//! Boundary to the 2D painting context that holds the drawing

use crate::config::CanvasConfig;
use crate::coords::Point;
use crate::error::Result;

/// How line segments are painted
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    /// Line width in native units
    pub width: f64,
    /// CSS colour shared by segment and caps
    pub color: String,
}

impl StrokeStyle {
    pub fn from_config(canvas: &CanvasConfig) -> Self {
        Self {
            width: canvas.stroke_width,
            color: canvas.ink_color.clone(),
        }
    }
}

/// A square raster that strokes can be painted on and pixels read back from.
///
/// Implementations join segments with round joins and close each segment's path, so
/// a near zero length segment still leaves a round dot of the stroke width.
pub trait DrawingSurface {
    /// Native side length in pixels
    fn size(&self) -> u32;

    /// Reset every pixel to transparent
    fn clear(&mut self);

    /// Paint one closed segment from `from` to `to`
    fn stroke_segment(&mut self, from: Point, to: Point, style: &StrokeStyle);

    /// Replace the content with a centred status message
    fn show_message(&mut self, text: &str) -> Result<()>;

    /// Resample the whole surface onto a white `target`x`target` raster and
    /// return its RGBA bytes, row major, four bytes per pixel
    fn sample(&self, target: u32) -> Result<Vec<u8>>;
}
