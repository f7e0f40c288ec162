//! Software drawing surface backed by an in-memory RGBA image.
//!
//! Used off the browser: headless sessions, tests and benchmarks. Strokes are
//! rasterised as anti-aliased capsules, which is what a closed two-point path with
//! round joins looks like on a 2D canvas.

use crate::coords::Point;
use crate::error::{RecognizerError, Result};
use crate::surface::{DrawingSurface, StrokeStyle};
use image::imageops::{self, FilterType};
use image::{Pixel, Rgba, RgbaImage};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

pub struct RasterSurface {
    pixels: RgbaImage,
    message: Option<String>,
}

impl RasterSurface {
    pub fn new(size: u32) -> Self {
        Self {
            pixels: RgbaImage::new(size, size),
            message: None,
        }
    }

    /// Paint every pixel with an opaque colour
    pub fn fill(&mut self, rgb: [u8; 3]) {
        let color = Rgba([rgb[0], rgb[1], rgb[2], 255]);
        for pixel in self.pixels.pixels_mut() {
            *pixel = color;
        }
        self.message = None;
    }

    /// Number of pixels with any ink on them
    pub fn inked_pixels(&self) -> usize {
        self.pixels.pixels().filter(|p| p[3] > 0).count()
    }

    pub fn is_blank(&self) -> bool {
        self.inked_pixels() == 0 && self.message.is_none()
    }

    /// Status message currently shown, if any
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }
}

impl DrawingSurface for RasterSurface {
    fn size(&self) -> u32 {
        self.pixels.width()
    }

    fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
        self.message = None;
    }

    fn stroke_segment(&mut self, from: Point, to: Point, style: &StrokeStyle) {
        let [r, g, b] = parse_hex_color(&style.color).unwrap_or([0, 0, 0]);
        let half = style.width / 2.0;
        let size = self.size() as f64;

        // Bounding box of the capsule plus one pixel of anti-aliasing
        let min_x = (from.x.min(to.x) - half - 1.0).floor().max(0.0) as u32;
        let max_x = (from.x.max(to.x) + half + 1.0).ceil().min(size) as u32;
        let min_y = (from.y.min(to.y) - half - 1.0).floor().max(0.0) as u32;
        let max_y = (from.y.max(to.y) + half + 1.0).ceil().min(size) as u32;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let coverage = (half + 0.5 - distance_to_segment(center, from, to)).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    let alpha = (coverage * 255.0).round() as u8;
                    self.pixels.get_pixel_mut(x, y).blend(&Rgba([r, g, b, alpha]));
                }
            }
        }
    }

    fn show_message(&mut self, text: &str) -> Result<()> {
        self.clear();
        self.message = Some(text.to_string());
        Ok(())
    }

    fn sample(&self, target: u32) -> Result<Vec<u8>> {
        if target == 0 {
            return Err(RecognizerError::Surface("sample size must be positive".into()));
        }

        // Composite onto white first so transparent areas resample as paper, not black
        let (width, height) = self.pixels.dimensions();
        let flattened = RgbaImage::from_fn(width, height, |x, y| {
            let mut out = WHITE;
            out.blend(self.pixels.get_pixel(x, y));
            out
        });

        let resized = imageops::resize(&flattened, target, target, FilterType::Triangle);
        Ok(resized.into_raw())
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq == 0.0 {
        return p.distance_to(&a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * abx, a.y + t * aby))
}

/// Parse `#rgb` or `#rrggbb`
pub fn parse_hex_color(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some([r, g, b])
        }
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17;
            }
            Some(out)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink() -> StrokeStyle {
        StrokeStyle {
            width: 28.0,
            color: "#212121".to_string(),
        }
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#212121"), Some([0x21, 0x21, 0x21]));
        assert_eq!(parse_hex_color("#fff"), Some([255, 255, 255]));
        assert_eq!(parse_hex_color("212121"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }

    #[test]
    fn test_new_surface_is_blank() {
        let surface = RasterSurface::new(280);
        assert_eq!(surface.size(), 280);
        assert!(surface.is_blank());
    }

    #[test]
    fn test_segment_paints_capsule() {
        let mut surface = RasterSurface::new(280);
        surface.stroke_segment(Point::new(100.0, 140.0), Point::new(180.0, 140.0), &ink());

        // On the segment the ink is opaque
        let center = surface.pixel(140, 140);
        assert_eq!(center[3], 255);
        assert!(center[..3].iter().all(|&c| (32..=34).contains(&c)));
        // Round end reaches past the endpoint by half the width
        assert_eq!(surface.pixel(190, 140)[3], 255);
        // Well outside the capsule nothing is painted
        assert_eq!(surface.pixel(140, 170)[3], 0);
        assert_eq!(surface.pixel(220, 140)[3], 0);
    }

    #[test]
    fn test_near_zero_segment_leaves_dot() {
        let mut surface = RasterSurface::new(280);
        let p = Point::new(140.0, 140.0);
        surface.stroke_segment(p.offset(1e-3), p, &ink());

        assert!(surface.inked_pixels() > 500);
        assert_eq!(surface.pixel(140, 140)[3], 255);
    }

    #[test]
    fn test_segment_outside_surface_is_clipped() {
        let mut surface = RasterSurface::new(280);
        surface.stroke_segment(Point::new(-500.0, -500.0), Point::new(-400.0, -400.0), &ink());
        assert_eq!(surface.inked_pixels(), 0);

        surface.stroke_segment(Point::new(275.0, 275.0), Point::new(400.0, 400.0), &ink());
        assert!(surface.inked_pixels() > 0);
    }

    #[test]
    fn test_clear_resets_pixels_and_message() {
        let mut surface = RasterSurface::new(280);
        surface.show_message("Loading...").unwrap();
        assert_eq!(surface.message(), Some("Loading..."));
        surface.stroke_segment(Point::new(10.0, 10.0), Point::new(50.0, 50.0), &ink());

        surface.clear();
        assert!(surface.is_blank());
    }

    #[test]
    fn test_sample_blank_is_white() {
        let surface = RasterSurface::new(280);
        let rgba = surface.sample(28).unwrap();
        assert_eq!(rgba.len(), 28 * 28 * 4);
        assert!(rgba.iter().all(|&v| v >= 254));
    }

    #[test]
    fn test_sample_rejects_zero_target() {
        let surface = RasterSurface::new(280);
        assert!(matches!(surface.sample(0), Err(RecognizerError::Surface(_))));
    }
}
