//! Inference engine boundary and per-model adapters.
//!
//! The engine is opaque: it turns a resource path into a session, and a session runs
//! named float tensors to named float tensors. Sessions are single-threaded and their
//! futures are not required to be `Send`, which matches running inside a browser.

use crate::config::ModelConfig;
use crate::error::{RecognizerError, Result};
use crate::normalize::{OutputKind, ProbabilityVector};
use crate::tensor::InputTensor;
use futures::future::try_join_all;
use std::collections::HashMap;

/// Named float tensor exchanged with an engine
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    pub data: Vec<f32>,
    pub dims: Vec<usize>,
}

impl Tensor {
    pub fn new(data: Vec<f32>, dims: Vec<usize>) -> Self {
        Self { data, dims }
    }
}

impl From<&InputTensor> for Tensor {
    fn from(input: &InputTensor) -> Self {
        Self {
            data: input.data().to_vec(),
            dims: input.dims().to_vec(),
        }
    }
}

pub type NamedTensors = HashMap<String, Tensor>;

/// A loaded model
#[allow(async_fn_in_trait)]
pub trait InferenceSession {
    fn input_names(&self) -> &[String];

    fn output_names(&self) -> &[String];

    async fn run(&self, feeds: NamedTensors) -> Result<NamedTensors>;
}

/// Creates sessions from resource paths
#[allow(async_fn_in_trait)]
pub trait InferenceEngine {
    type Session: InferenceSession;

    async fn load(&self, path: &str) -> Result<Self::Session>;
}

/// Static description of a configured model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub key: String,
    pub title: String,
    pub path: String,
    pub output: OutputKind,
}

impl From<&ModelConfig> for ModelDescriptor {
    fn from(config: &ModelConfig) -> Self {
        Self {
            key: config.key.clone(),
            title: config.title.clone(),
            path: config.path.clone(),
            output: config.output_kind(),
        }
    }
}

/// A descriptor bound to its loaded session.
///
/// Only exists once the load has succeeded, so a ready adapter never lacks a session.
pub struct ModelAdapter<S> {
    descriptor: ModelDescriptor,
    session: S,
}

impl<S: InferenceSession> ModelAdapter<S> {
    pub fn new(descriptor: ModelDescriptor, session: S) -> Self {
        Self { descriptor, session }
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    pub fn key(&self) -> &str {
        &self.descriptor.key
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Run the input through the session's first input and read its first output
    pub async fn classify(&self, input: &InputTensor) -> Result<Vec<f32>> {
        let input_name = self
            .session
            .input_names()
            .first()
            .ok_or(RecognizerError::MissingBinding("input"))?
            .clone();
        let output_name = self
            .session
            .output_names()
            .first()
            .ok_or(RecognizerError::MissingBinding("output"))?
            .clone();

        let mut feeds = NamedTensors::new();
        feeds.insert(input_name, Tensor::from(input));

        let mut outputs = self.session.run(feeds).await?;
        let output = outputs
            .remove(&output_name)
            .ok_or(RecognizerError::MissingOutput(output_name))?;
        Ok(output.data)
    }

    /// Classify and normalise into a probability vector
    pub async fn predict(&self, input: &InputTensor) -> Result<ProbabilityVector> {
        let raw = self.classify(input).await?;
        self.descriptor.output.normalize(raw)
    }
}

/// Load every configured model concurrently; the first rejection fails the whole load
pub async fn load_models<E: InferenceEngine>(
    engine: &E,
    models: &[ModelConfig],
) -> Result<Vec<ModelAdapter<E::Session>>> {
    let loads = models.iter().map(|config| async move {
        log::info!("loading model '{}' from {}", config.key, config.path);
        let session = engine.load(&config.path).await.map_err(|e| match e {
            RecognizerError::ModelLoad { .. } => e,
            other => RecognizerError::model_load(&config.key, other),
        })?;
        log::info!("model '{}' ready", config.key);
        Ok::<_, RecognizerError>(ModelAdapter::new(ModelDescriptor::from(config), session))
    });

    try_join_all(loads).await
}
