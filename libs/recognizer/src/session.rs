//! Session lifecycle and the draw, infer, display loop.
//!
//! A session starts in `Loading` with the loading message on the surface. When
//! every model has loaded it becomes `Ready`, otherwise `Failed`, which is terminal.
//! Pointer and clear input is ignored outside `Ready`.
//!
//! Each painted segment yields an [`InferenceCycle`]: the input tensor is extracted
//! synchronously, then the cycle runs the models one after another. The caller
//! drives the cycle to completion and hands its [`CycleReport`] back through
//! [`SessionController::apply_cycle`]. Cycles are neither queued nor cancelled, so
//! when they overlap the last report applied for a model wins.

use crate::config::DemoConfig;
use crate::coords::{CoordinateMapper, Point};
use crate::error::{RecognizerError, Result};
use crate::model::{InferenceSession, ModelAdapter};
use crate::normalize::ProbabilityVector;
use crate::presenter::PredictionBoard;
use crate::stroke::StrokeRenderer;
use crate::surface::DrawingSurface;
use crate::tensor::{InputTensor, TensorExtractor};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Loading,
    Ready,
    /// Startup failed; holds the load error message
    Failed(String),
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Loading => "loading",
            Phase::Ready => "ready",
            Phase::Failed(_) => "failed",
        }
    }
}

/// What the pointer left behind when it exited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelatedTarget {
    /// No element, the pointer left the window
    None,
    /// The outermost document element
    Root,
    /// Some other element inside the page
    Element,
}

#[derive(Debug, Clone, Copy, Default)]
struct PointerState {
    is_down: bool,
    last: Point,
}

/// Result of one model within a cycle
#[derive(Debug)]
pub struct ModelOutcome {
    pub key: String,
    pub result: Result<ProbabilityVector>,
}

/// Everything a finished cycle produced, one outcome per model
#[derive(Debug, Default)]
pub struct CycleReport {
    pub outcomes: Vec<ModelOutcome>,
}

impl CycleReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

/// One inference pass over a snapshot of the drawing
pub struct InferenceCycle<M> {
    input: InputTensor,
    models: Vec<Rc<ModelAdapter<M>>>,
}

impl<M: InferenceSession> InferenceCycle<M> {
    pub fn input(&self) -> &InputTensor {
        &self.input
    }

    /// Run every model in order, awaiting each before starting the next.
    ///
    /// A failing model is logged and recorded; the remaining models still run.
    pub async fn run(self) -> CycleReport {
        let mut outcomes = Vec::with_capacity(self.models.len());
        for model in &self.models {
            let result = model.predict(&self.input).await;
            if let Err(e) = &result {
                log::warn!("model '{}' failed this cycle: {}", model.key(), e);
            }
            outcomes.push(ModelOutcome {
                key: model.key().to_string(),
                result,
            });
        }
        CycleReport { outcomes }
    }
}

/// Owns the drawing surface, the loaded models and the prediction board
pub struct SessionController<S, M> {
    config: DemoConfig,
    surface: S,
    mapper: CoordinateMapper,
    renderer: StrokeRenderer,
    extractor: TensorExtractor,
    models: Vec<Rc<ModelAdapter<M>>>,
    board: PredictionBoard,
    phase: Phase,
    pointer: PointerState,
    has_intro_text: bool,
}

impl<S: DrawingSurface, M: InferenceSession> SessionController<S, M> {
    /// Validate the configuration and show the loading message
    pub fn new(config: DemoConfig, mut surface: S) -> Result<Self> {
        config.validate()?;
        if surface.size() != config.canvas.size {
            return Err(RecognizerError::Config(format!(
                "surface is {}px but canvas is configured as {}px",
                surface.size(),
                config.canvas.size
            )));
        }
        surface.show_message(&config.messages.loading)?;

        Ok(Self {
            mapper: CoordinateMapper::new(config.canvas.display_scale),
            renderer: StrokeRenderer::from_config(&config.canvas),
            extractor: TensorExtractor::new(config.tensor_size),
            board: PredictionBoard::new(&config.models, config.highlight),
            models: Vec::new(),
            phase: Phase::Loading,
            pointer: PointerState::default(),
            has_intro_text: true,
            surface,
            config,
        })
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn board(&self) -> &PredictionBoard {
        &self.board
    }

    pub fn is_pointer_down(&self) -> bool {
        self.pointer.is_down
    }

    /// Leave `Loading` with the outcome of loading every model.
    ///
    /// Succeeds into `Ready` only when an adapter exists for every configured
    /// model, in configuration order.
    pub fn finish_loading(&mut self, loaded: Result<Vec<ModelAdapter<M>>>) -> Result<&Phase> {
        if self.phase != Phase::Loading {
            return Err(RecognizerError::InvalidTransition {
                action: "finish loading",
                phase: self.phase.name(),
            });
        }

        match loaded.and_then(|models| self.check_loaded(models)) {
            Ok(models) => {
                self.models = models.into_iter().map(Rc::new).collect();
                self.phase = Phase::Ready;
                self.has_intro_text = true;
                log::info!("all {} models loaded, session ready", self.models.len());
                let ready = self.config.messages.ready.clone();
                self.show_status(&ready);
            }
            Err(e) => {
                log::error!("model load failed: {}", e);
                self.phase = Phase::Failed(e.to_string());
                let failed = self.config.messages.failed.clone();
                self.show_status(&failed);
            }
        }
        Ok(&self.phase)
    }

    /// The phase has already changed; a message that cannot be painted is only logged
    fn show_status(&mut self, text: &str) {
        self.surface.clear();
        if let Err(e) = self.surface.show_message(text) {
            log::warn!("could not show '{}': {}", text, e);
        }
    }

    fn check_loaded(&self, models: Vec<ModelAdapter<M>>) -> Result<Vec<ModelAdapter<M>>> {
        let expected: Vec<&str> = self.config.models.iter().map(|m| m.key.as_str()).collect();
        let actual: Vec<&str> = models.iter().map(|m| m.key()).collect();
        if expected != actual {
            return Err(RecognizerError::Config(format!(
                "loaded models {:?} do not match configured models {:?}",
                actual, expected
            )));
        }
        Ok(models)
    }

    /// Start a stroke at the pointer's display offset
    pub fn pointer_down(&mut self, offset_x: f64, offset_y: f64) -> Option<InferenceCycle<M>> {
        if !self.is_ready() {
            return None;
        }

        self.pointer.is_down = true;
        if self.has_intro_text {
            self.clear();
            self.has_intro_text = false;
        }

        let at = self.mapper.to_native(offset_x, offset_y);
        self.pointer.last = self.renderer.dot_origin(at);
        self.pointer_move(offset_x, offset_y)
    }

    /// Track the pointer; paints a segment while the pointer is down
    pub fn pointer_move(&mut self, offset_x: f64, offset_y: f64) -> Option<InferenceCycle<M>> {
        if !self.is_ready() {
            return None;
        }

        let at = self.mapper.to_native(offset_x, offset_y);
        let cycle = if self.pointer.is_down {
            self.renderer.draw_segment(&mut self.surface, self.pointer.last, at);
            self.begin_cycle()
        } else {
            None
        };
        self.pointer.last = at;
        cycle
    }

    pub fn pointer_up(&mut self) {
        self.pointer.is_down = false;
    }

    /// A pointer-out whose related target is missing or the root element means the
    /// pointer left the window, where a release would go unseen.
    pub fn pointer_out(&mut self, related: RelatedTarget) {
        if matches!(related, RelatedTarget::None | RelatedTarget::Root) {
            self.pointer.is_down = false;
        }
    }

    /// Blank the surface and every model's bars
    pub fn clear(&mut self) {
        if !self.is_ready() {
            return;
        }
        self.surface.clear();
        self.board.clear();
        self.has_intro_text = true;
    }

    fn begin_cycle(&self) -> Option<InferenceCycle<M>> {
        match self.extractor.extract(&self.surface) {
            Ok(input) => {
                log::trace!("model input:\n{}", input.to_ascii_art());
                Some(InferenceCycle {
                    input,
                    models: self.models.clone(),
                })
            }
            Err(e) => {
                log::error!("could not read the drawing: {}", e);
                None
            }
        }
    }

    /// Write every successful outcome to its model's bars
    pub fn apply_cycle(&mut self, report: CycleReport) {
        for outcome in report.outcomes {
            match outcome.result {
                Ok(probs) => {
                    log::debug!("model '{}' predicts {}", outcome.key, probs.argmax());
                    self.board.present(&outcome.key, &probs);
                }
                Err(_) => {
                    log::debug!("model '{}' keeps its previous bars", outcome.key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelDescriptor, NamedTensors, Tensor};
    use crate::raster::RasterSurface;

    struct FixedSession {
        names: Vec<String>,
        output: Vec<f32>,
    }

    impl InferenceSession for FixedSession {
        fn input_names(&self) -> &[String] {
            &self.names[..1]
        }

        fn output_names(&self) -> &[String] {
            &self.names[1..]
        }

        async fn run(&self, _feeds: NamedTensors) -> Result<NamedTensors> {
            let mut out = NamedTensors::new();
            out.insert(self.names[1].clone(), Tensor::new(self.output.clone(), vec![1, 10]));
            Ok(out)
        }
    }

    fn loaded(config: &DemoConfig) -> Vec<ModelAdapter<FixedSession>> {
        config
            .models
            .iter()
            .map(|m| {
                let session = FixedSession {
                    names: vec!["input".into(), "output".into()],
                    output: vec![0.1; 10],
                };
                ModelAdapter::new(ModelDescriptor::from(m), session)
            })
            .collect()
    }

    fn controller() -> SessionController<RasterSurface, FixedSession> {
        let config = DemoConfig::single_model();
        SessionController::new(config, RasterSurface::new(280)).unwrap()
    }

    #[test]
    fn test_starts_loading_with_message() {
        let ctl = controller();
        assert_eq!(ctl.phase(), &Phase::Loading);
        assert_eq!(ctl.surface().message(), Some("Loading..."));
    }

    #[test]
    fn test_input_ignored_while_loading() {
        let mut ctl = controller();
        assert!(ctl.pointer_down(10.0, 10.0).is_none());
        assert!(!ctl.is_pointer_down());
        assert_eq!(ctl.surface().inked_pixels(), 0);
    }

    #[test]
    fn test_ready_shows_instruction() {
        let mut ctl = controller();
        let models = loaded(ctl.config());
        assert_eq!(ctl.finish_loading(Ok(models)).unwrap(), &Phase::Ready);
        assert_eq!(ctl.surface().message(), Some("Draw a number here!"));
    }

    #[test]
    fn test_failed_load_is_terminal() {
        let mut ctl = controller();
        let phase = ctl
            .finish_loading(Err(RecognizerError::model_load("cnn", "404")))
            .unwrap()
            .clone();
        assert!(matches!(phase, Phase::Failed(_)));
        assert_eq!(ctl.surface().message(), Some("Model load failed"));
        assert!(ctl.pointer_down(10.0, 10.0).is_none());

        let models = loaded(ctl.config());
        assert!(matches!(
            ctl.finish_loading(Ok(models)),
            Err(RecognizerError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_mismatched_models_fail_startup() {
        let mut ctl = controller();
        let phase = ctl.finish_loading(Ok(Vec::new())).unwrap();
        assert!(matches!(phase, Phase::Failed(_)));
    }

    #[test]
    fn test_surface_size_must_match_config() {
        let result: Result<SessionController<_, FixedSession>> =
            SessionController::new(DemoConfig::single_model(), RasterSurface::new(100));
        assert!(matches!(result, Err(RecognizerError::Config(_))));
    }

    #[test]
    fn test_first_pointer_down_removes_intro() {
        let mut ctl = controller();
        let models = loaded(ctl.config());
        ctl.finish_loading(Ok(models)).unwrap();

        let cycle = ctl.pointer_down(70.0, 70.0);
        assert!(cycle.is_some());
        assert_eq!(ctl.surface().message(), None);
        assert!(ctl.surface().inked_pixels() > 0);
    }

    #[test]
    fn test_move_without_down_does_not_draw() {
        let mut ctl = controller();
        let models = loaded(ctl.config());
        ctl.finish_loading(Ok(models)).unwrap();
        ctl.clear();

        assert!(ctl.pointer_move(20.0, 20.0).is_none());
        assert!(ctl.pointer_move(80.0, 80.0).is_none());
        assert_eq!(ctl.surface().inked_pixels(), 0);
    }

    #[test]
    fn test_pointer_out_inside_page_keeps_drawing() {
        let mut ctl = controller();
        let models = loaded(ctl.config());
        ctl.finish_loading(Ok(models)).unwrap();

        ctl.pointer_down(20.0, 20.0);
        ctl.pointer_out(RelatedTarget::Element);
        assert!(ctl.is_pointer_down());
        ctl.pointer_out(RelatedTarget::Root);
        assert!(!ctl.is_pointer_down());
    }

    /// Raster whose status messages start failing once `broken` is set
    struct FlakySurface {
        inner: RasterSurface,
        broken: Rc<std::cell::Cell<bool>>,
    }

    impl DrawingSurface for FlakySurface {
        fn size(&self) -> u32 {
            self.inner.size()
        }

        fn clear(&mut self) {
            self.inner.clear();
        }

        fn stroke_segment(&mut self, from: Point, to: Point, style: &crate::surface::StrokeStyle) {
            self.inner.stroke_segment(from, to, style);
        }

        fn show_message(&mut self, text: &str) -> Result<()> {
            if self.broken.get() {
                return Err(RecognizerError::Surface("font unavailable".into()));
            }
            self.inner.show_message(text)
        }

        fn sample(&self, target: u32) -> Result<Vec<u8>> {
            self.inner.sample(target)
        }
    }

    #[test]
    fn test_unpaintable_message_still_completes_transition() {
        let broken = Rc::new(std::cell::Cell::new(false));
        let surface = FlakySurface {
            inner: RasterSurface::new(280),
            broken: Rc::clone(&broken),
        };
        let mut ctl: SessionController<_, FixedSession> =
            SessionController::new(DemoConfig::single_model(), surface).unwrap();
        broken.set(true);

        let models = loaded(ctl.config());
        assert_eq!(ctl.finish_loading(Ok(models)).unwrap(), &Phase::Ready);
        assert!(ctl.pointer_down(70.0, 70.0).is_some());
    }

    #[test]
    fn test_unpaintable_failure_message_still_fails() {
        let broken = Rc::new(std::cell::Cell::new(false));
        let surface = FlakySurface {
            inner: RasterSurface::new(280),
            broken: Rc::clone(&broken),
        };
        let mut ctl: SessionController<_, FixedSession> =
            SessionController::new(DemoConfig::single_model(), surface).unwrap();
        broken.set(true);

        let phase = ctl
            .finish_loading(Err(RecognizerError::model_load("cnn", "404")))
            .unwrap()
            .clone();
        assert!(matches!(phase, Phase::Failed(_)));
        assert!(ctl.pointer_down(70.0, 70.0).is_none());
    }

    #[test]
    fn test_cycle_input_reflects_stroke() {
        let mut ctl = controller();
        let models = loaded(ctl.config());
        ctl.finish_loading(Ok(models)).unwrap();

        let cycle = ctl.pointer_down(72.5, 72.5).unwrap();
        assert_eq!(cycle.input().len(), 784);
        // The dot is centred on native (145, 145), the centre of input cell (14, 14)
        assert!(cycle.input().at(14, 14) > 0.5);
        assert!(cycle.input().at(0, 0) < -0.99);
    }
}
