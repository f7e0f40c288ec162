//! Demo configuration: canvas geometry, model list and display policy

use crate::error::{RecognizerError, Result};
use crate::normalize::OutputKind;
use crate::presenter::HighlightPolicy;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One pretrained classifier as listed in the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Unique key, also used in element ids
    pub key: String,
    /// Label shown above the model's bars
    pub title: String,
    /// Resource locator handed to the inference engine
    pub path: String,
    /// True when the model already emits probabilities, false for logits
    pub prob: bool,
}

impl ModelConfig {
    pub fn new(key: &str, title: &str, path: &str, prob: bool) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            path: path.to_string(),
            prob,
        }
    }

    pub fn output_kind(&self) -> OutputKind {
        OutputKind::from_prob_flag(self.prob)
    }
}

/// Geometry and pen settings of the drawing canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Native raster side length in pixels
    pub size: u32,
    /// Displayed size divided by native size
    pub display_scale: f64,
    /// Stroke width in native units
    pub stroke_width: f64,
    /// Ink colour for strokes and messages
    pub ink_color: String,
    /// Font used for status messages
    pub font: String,
    /// Offset of the synthetic previous point on pointer-down
    pub dot_epsilon: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            size: 280,
            display_scale: 0.5,
            stroke_width: 28.0,
            ink_color: "#212121".to_string(),
            font: "28px sans-serif".to_string(),
            dot_epsilon: 1e-3,
        }
    }
}

/// Text painted on the canvas for each lifecycle phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub loading: String,
    pub ready: String,
    pub failed: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            loading: "Loading...".to_string(),
            ready: "Draw a number here!".to_string(),
            failed: "Model load failed".to_string(),
        }
    }
}

/// Full configuration of a drawing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub canvas: CanvasConfig,
    /// Side length of the model input (28 for MNIST)
    pub tensor_size: u32,
    /// How winning bars are chosen when probabilities tie
    pub highlight: HighlightPolicy,
    pub messages: Messages,
    pub log_level: LevelFilter,
    pub models: Vec<ModelConfig>,
}

impl DemoConfig {
    /// Four CNNs trained on growing subsets of MNIST, side by side
    pub fn comparison() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            tensor_size: 28,
            highlight: HighlightPolicy::default(),
            messages: Messages::default(),
            log_level: LevelFilter::Info,
            models: vec![
                ModelConfig::new("100", "100 samples", "./cnn.onnx", true),
                ModelConfig::new("600", "600 samples", "./cnn_mnist_600.onnx", false),
                ModelConfig::new("6000", "6000 samples", "./cnn_mnist_6000.onnx", false),
                ModelConfig::new("60000", "60000 samples", "./cnn_mnist_60000.onnx", false),
            ],
        }
    }

    /// A single probability-emitting CNN
    pub fn single_model() -> Self {
        Self {
            models: vec![ModelConfig::new("cnn", "CNN", "./cnn.onnx", true)],
            ..Self::comparison()
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: DemoConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(RecognizerError::Config("no models configured".into()));
        }

        let mut keys = HashSet::new();
        for model in &self.models {
            if model.key.is_empty() {
                return Err(RecognizerError::Config("model key must not be empty".into()));
            }
            if !keys.insert(model.key.as_str()) {
                return Err(RecognizerError::Config(format!(
                    "duplicate model key '{}'",
                    model.key
                )));
            }
        }

        let canvas = &self.canvas;
        if canvas.size == 0 {
            return Err(RecognizerError::Config("canvas size must be positive".into()));
        }
        if !(canvas.display_scale > 0.0 && canvas.display_scale.is_finite()) {
            return Err(RecognizerError::Config(format!(
                "display scale must be positive, got {}",
                canvas.display_scale
            )));
        }
        if !(canvas.stroke_width > 0.0) {
            return Err(RecognizerError::Config(format!(
                "stroke width must be positive, got {}",
                canvas.stroke_width
            )));
        }
        if self.tensor_size == 0 || self.tensor_size > canvas.size {
            return Err(RecognizerError::Config(format!(
                "tensor size {} must be in 1..={}",
                self.tensor_size, canvas.size
            )));
        }

        Ok(())
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self::comparison()
    }
}
