//! Stroke rendering between consecutive pointer samples

use crate::config::CanvasConfig;
use crate::coords::Point;
use crate::surface::{DrawingSurface, StrokeStyle};

/// Paints pen segments with a fixed style.
///
/// A pointer-down paints a segment from a synthetic previous point `dot_epsilon`
/// away from the pointer, so a click without movement still leaves a dot.
#[derive(Debug, Clone)]
pub struct StrokeRenderer {
    style: StrokeStyle,
    dot_epsilon: f64,
}

impl StrokeRenderer {
    pub fn new(style: StrokeStyle, dot_epsilon: f64) -> Self {
        Self { style, dot_epsilon }
    }

    pub fn from_config(canvas: &CanvasConfig) -> Self {
        Self::new(StrokeStyle::from_config(canvas), canvas.dot_epsilon)
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    /// Previous point to use for the first segment of a stroke starting at `at`
    pub fn dot_origin(&self, at: Point) -> Point {
        at.offset(self.dot_epsilon)
    }

    pub fn draw_segment<S: DrawingSurface>(&self, surface: &mut S, from: Point, to: Point) {
        surface.stroke_segment(from, to, &self.style);
    }
}
