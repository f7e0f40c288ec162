//! Drawing surface to model input conversion.
//!
//! Every cycle the surface is resampled onto a white `size`x`size` raster, each
//! pixel's RGB channels are averaged to grey, the grey is inverted so ink is high,
//! and the result is mapped from [0, 1] to [-1, 1]:
//!
//! ```text
//! gray  = (r + g + b) / 3
//! x     = (255 - gray) / 255
//! value = (x - 0.5) / 0.5
//! ```
//!
//! The arithmetic runs in f64 and is narrowed to f32 once at the end, so the values
//! match a browser computing the same expression on JS numbers and storing them in a
//! `Float32Array`.

use crate::error::{RecognizerError, Result};
use crate::surface::DrawingSurface;

/// Flat model input, logically shaped (1, 1, size, size)
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    data: Vec<f32>,
    size: usize,
}

impl InputTensor {
    /// Convert RGBA bytes of a `size`x`size` raster
    pub fn from_rgba(rgba: &[u8], size: usize) -> Result<Self> {
        let expected = size * size * 4;
        if rgba.len() != expected {
            return Err(RecognizerError::shape_mismatch(expected, rgba.len()));
        }

        let data = rgba.chunks_exact(4).map(|px| normalize_pixel(px[0], px[1], px[2])).collect();
        Ok(Self { data, size })
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Batch, channel, height, width
    pub fn dims(&self) -> [usize; 4] {
        [1, 1, self.size, self.size]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.size + col]
    }

    /// Coarse text rendering for logs, one character per cell
    pub fn to_ascii_art(&self) -> String {
        const CHARS: [char; 5] = [' ', '░', '▒', '▓', '█'];

        let mut result = String::with_capacity(self.size * (self.size + 1));
        for row in 0..self.size {
            for col in 0..self.size {
                let ink = ((self.at(row, col) + 1.0) / 2.0).clamp(0.0, 1.0);
                let idx = (ink * (CHARS.len() - 1) as f32).round() as usize;
                result.push(CHARS[idx]);
            }
            result.push('\n');
        }
        result
    }
}

#[inline]
fn normalize_pixel(r: u8, g: u8, b: u8) -> f32 {
    let gray = (r as f64 + g as f64 + b as f64) / 3.0;
    let x = (255.0 - gray) / 255.0;
    ((x - 0.5) / 0.5) as f32
}

/// Samples a drawing surface into model input
#[derive(Debug, Clone, Copy)]
pub struct TensorExtractor {
    size: u32,
}

impl TensorExtractor {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn extract<S: DrawingSurface>(&self, surface: &S) -> Result<InputTensor> {
        let rgba = surface.sample(self.size)?;
        InputTensor::from_rgba(&rgba, self.size as usize)
    }
}

impl Default for TensorExtractor {
    fn default() -> Self {
        Self::new(28)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(size: usize, value: u8) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(size * size * 4);
        for _ in 0..size * size {
            rgba.extend_from_slice(&[value, value, value, 255]);
        }
        rgba
    }

    #[test]
    fn test_white_maps_to_minus_one() {
        let tensor = InputTensor::from_rgba(&solid(28, 255), 28).unwrap();
        assert_eq!(tensor.len(), 784);
        assert!(tensor.data().iter().all(|&v| v == -1.0));
    }

    #[test]
    fn test_black_maps_to_plus_one() {
        let tensor = InputTensor::from_rgba(&solid(28, 0), 28).unwrap();
        assert!(tensor.data().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_channels_are_averaged() {
        // (255 + 0 + 0) / 3 = 85 -> x = 170/255 -> value = 1/3
        let mut rgba = solid(1, 0);
        rgba[0] = 255;
        let tensor = InputTensor::from_rgba(&rgba, 1).unwrap();
        assert!((tensor.data()[0] - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_mid_gray_matches_float_expression() {
        let tensor = InputTensor::from_rgba(&solid(1, 128), 1).unwrap();
        let expected = (((255.0 - 128.0) / 255.0 - 0.5) / 0.5) as f32;
        assert_eq!(tensor.data()[0], expected);
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let err = InputTensor::from_rgba(&[0u8; 12], 28).unwrap_err();
        assert!(matches!(
            err,
            RecognizerError::ShapeMismatch { expected: 3136, actual: 12 }
        ));
    }

    #[test]
    fn test_dims_are_nchw() {
        let tensor = InputTensor::from_rgba(&solid(28, 255), 28).unwrap();
        assert_eq!(tensor.dims(), [1, 1, 28, 28]);
    }

    #[test]
    fn test_ascii_art_shape() {
        let tensor = InputTensor::from_rgba(&solid(3, 0), 3).unwrap();
        let art = tensor.to_ascii_art();
        let lines: Vec<&str> = art.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "███");
    }
}
