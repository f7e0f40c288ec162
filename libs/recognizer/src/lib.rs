//! Handwritten digit recognition pipeline
//!
//! Turns pointer strokes into a 28x28 model input, runs it through one or more
//! pretrained classifiers and keeps a bar display of each model's class
//! probabilities. Painting and model execution sit behind traits so the same
//! pipeline drives a browser canvas or the in-memory raster used in tests.

pub mod config;
pub mod coords;
pub mod error;
pub mod model;
pub mod normalize;
pub mod presenter;
pub mod raster;
pub mod session;
pub mod stroke;
pub mod surface;
pub mod tensor;

pub use config::{CanvasConfig, DemoConfig, Messages, ModelConfig};
pub use coords::{CoordinateMapper, Point};
pub use error::{RecognizerError, Result};
pub use model::{
    load_models, InferenceEngine, InferenceSession, ModelAdapter, ModelDescriptor, NamedTensors,
    Tensor,
};
pub use normalize::{softmax, OutputKind, ProbabilityVector, NUM_CLASSES};
pub use presenter::{Bar, HighlightPolicy, ModelDisplay, PredictionBoard};
pub use raster::RasterSurface;
pub use session::{CycleReport, InferenceCycle, ModelOutcome, Phase, RelatedTarget, SessionController};
pub use stroke::StrokeRenderer;
pub use surface::{DrawingSurface, StrokeStyle};
pub use tensor::{InputTensor, TensorExtractor};
