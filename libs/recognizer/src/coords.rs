//! Display-to-native coordinate mapping

/// A position in native canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Same point shifted by `delta` on both axes
    pub fn offset(&self, delta: f64) -> Self {
        Self {
            x: self.x + delta,
            y: self.y + delta,
        }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Converts pointer offsets in the displayed element into native raster coordinates.
///
/// `scale` is displayed size over native size, so 0.5 means the 280px raster is shown
/// at 140px and every offset is doubled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    scale: f64,
}

impl CoordinateMapper {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    pub fn to_native(&self, offset_x: f64, offset_y: f64) -> Point {
        Point {
            x: offset_x / self.scale,
            y: offset_y / self.scale,
        }
    }
}
