//! Inference engine backed by onnxruntime-web.
//!
//! The page loads `ort.min.js`, which defines a global `ort` namespace. Sessions and
//! tensors are the JS objects themselves; names are read once at load.

use js_sys::{Array, Float32Array, Object, Promise, Reflect};
use recognizer::{InferenceEngine, InferenceSession, NamedTensors, RecognizerError, Result, Tensor};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen(js_namespace = ort)]
extern "C" {
    #[wasm_bindgen(js_name = InferenceSession)]
    type OrtInferenceSession;

    #[wasm_bindgen(catch, static_method_of = OrtInferenceSession, js_class = "InferenceSession")]
    fn create(path: &str) -> std::result::Result<Promise, JsValue>;

    #[wasm_bindgen(method, getter, js_name = inputNames)]
    fn input_names(this: &OrtInferenceSession) -> Array;

    #[wasm_bindgen(method, getter, js_name = outputNames)]
    fn output_names(this: &OrtInferenceSession) -> Array;

    #[wasm_bindgen(catch, method)]
    fn run(this: &OrtInferenceSession, feeds: &Object) -> std::result::Result<Promise, JsValue>;

    #[wasm_bindgen(js_name = Tensor)]
    type OrtTensor;

    #[wasm_bindgen(catch, constructor, js_class = "Tensor")]
    fn new(kind: &str, data: &Float32Array, dims: &Array) -> std::result::Result<OrtTensor, JsValue>;

    #[wasm_bindgen(method, getter)]
    fn data(this: &OrtTensor) -> JsValue;

    #[wasm_bindgen(method, getter)]
    fn dims(this: &OrtTensor) -> Array;
}

fn engine_error(e: JsValue) -> RecognizerError {
    RecognizerError::Engine(format!("{:?}", e))
}

fn string_list(names: Array) -> Vec<String> {
    names.iter().filter_map(|name| name.as_string()).collect()
}

/// Creates sessions through `ort.InferenceSession.create`
#[derive(Debug, Default, Clone, Copy)]
pub struct OrtEngine;

impl InferenceEngine for OrtEngine {
    type Session = OrtSession;

    async fn load(&self, path: &str) -> Result<OrtSession> {
        let promise = OrtInferenceSession::create(path).map_err(engine_error)?;
        let inner: OrtInferenceSession = JsFuture::from(promise)
            .await
            .map_err(engine_error)?
            .unchecked_into();

        Ok(OrtSession {
            input_names: string_list(inner.input_names()),
            output_names: string_list(inner.output_names()),
            inner,
        })
    }
}

pub struct OrtSession {
    inner: OrtInferenceSession,
    input_names: Vec<String>,
    output_names: Vec<String>,
}

impl OrtSession {
    fn to_js(tensor: &Tensor) -> Result<OrtTensor> {
        let data = Float32Array::from(tensor.data.as_slice());
        let dims: Array = tensor.dims.iter().map(|&d| JsValue::from_f64(d as f64)).collect();
        OrtTensor::new("float32", &data, &dims).map_err(engine_error)
    }

    fn from_js(tensor: &OrtTensor) -> Tensor {
        let data = Float32Array::new(&tensor.data()).to_vec();
        let dims = tensor
            .dims()
            .iter()
            .filter_map(|d| d.as_f64())
            .map(|d| d as usize)
            .collect();
        Tensor::new(data, dims)
    }
}

impl InferenceSession for OrtSession {
    fn input_names(&self) -> &[String] {
        &self.input_names
    }

    fn output_names(&self) -> &[String] {
        &self.output_names
    }

    async fn run(&self, feeds: NamedTensors) -> Result<NamedTensors> {
        let js_feeds = Object::new();
        for (name, tensor) in &feeds {
            let value = Self::to_js(tensor)?;
            Reflect::set(&js_feeds, &JsValue::from_str(name), &value).map_err(engine_error)?;
        }

        let promise = self.inner.run(&js_feeds).map_err(engine_error)?;
        let output_map = JsFuture::from(promise).await.map_err(engine_error)?;

        let mut outputs = NamedTensors::new();
        for name in &self.output_names {
            let value = Reflect::get(&output_map, &JsValue::from_str(name)).map_err(engine_error)?;
            if value.is_undefined() {
                continue;
            }
            outputs.insert(name.clone(), Self::from_js(&value.unchecked_into()));
        }
        Ok(outputs)
    }
}
