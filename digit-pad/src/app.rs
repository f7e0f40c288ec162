use crate::canvas::CanvasSurface;
use crate::dom;
use crate::ort::{OrtEngine, OrtSession};
use gloo::events::EventListener;
use log::LevelFilter;
use recognizer::{load_models, DemoConfig, InferenceCycle, Phase, RelatedTarget, SessionController};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Event, HtmlCanvasElement, MouseEvent, Node};

type Controller = SessionController<CanvasSurface, OrtSession>;
type Shared = Rc<RefCell<Controller>>;

/// Event subscriptions held by the page. Dropping a listener removes it.
struct Bindings {
    listeners: Vec<EventListener>,
}

impl Bindings {
    fn unbind(&mut self) {
        let count = self.listeners.len();
        self.listeners.clear();
        log::debug!("removed {} event listeners", count);
    }
}

thread_local! {
    static BINDINGS: RefCell<Option<Bindings>> = const { RefCell::new(None) };
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Route `log` records to the browser console; `Off` installs nothing
fn init_logging(level: LevelFilter) {
    let Some(level) = level.to_level() else {
        return;
    };
    if console_log::init_with_level(level).is_err() {
        log::debug!("console logger already installed");
    }
}

pub fn init(models_json: &str) -> Result<(), JsValue> {
    let config = DemoConfig::from_json(models_json).map_err(js_error)?;
    init_logging(config.log_level);
    if let Ok(json) = config.to_json() {
        log::debug!("configuration:\n{}", json);
    }

    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;

    let canvas = dom::setup_ui(&document, &config)?;
    let surface = CanvasSurface::new(&document, canvas.clone(), &config.canvas).map_err(js_error)?;

    let models = config.models.clone();
    let controller: Shared = Rc::new(RefCell::new(
        SessionController::new(config, surface).map_err(js_error)?,
    ));

    log::info!("loading {} models", models.len());
    spawn_local(async move {
        let loaded = load_models(&OrtEngine, &models).await;
        let ready = match controller.borrow_mut().finish_loading(loaded) {
            Ok(phase) => *phase == Phase::Ready,
            Err(e) => {
                log::error!("startup failed: {}", e);
                false
            }
        };
        if !ready {
            return;
        }

        match setup_handlers(&document, &canvas, &controller) {
            Ok(bindings) => BINDINGS.with(|b| *b.borrow_mut() = Some(bindings)),
            Err(e) => log::error!("could not bind input handlers: {:?}", e),
        }
    });

    Ok(())
}

/// Remove every input handler the page installed
pub fn unbind() {
    BINDINGS.with(|b| {
        if let Some(mut bindings) = b.borrow_mut().take() {
            bindings.unbind();
        }
    });
}

fn mouse_offset(event: &Event) -> Option<(f64, f64)> {
    let event = event.dyn_ref::<MouseEvent>()?;
    Some((event.offset_x() as f64, event.offset_y() as f64))
}

fn related_target(event: &Event) -> RelatedTarget {
    let related = event
        .dyn_ref::<MouseEvent>()
        .and_then(|event| event.related_target());
    match related {
        None => RelatedTarget::None,
        Some(target) => match target.dyn_ref::<Node>() {
            Some(node) if node.node_name() == "HTML" => RelatedTarget::Root,
            _ => RelatedTarget::Element,
        },
    }
}

fn render(document: &Document, controller: &Shared) {
    if let Err(e) = dom::render_board(document, controller.borrow().board()) {
        log::warn!("could not render predictions: {:?}", e);
    }
}

/// Run a cycle off the event handler and publish its outcomes when it finishes
fn dispatch(cycle: InferenceCycle<OrtSession>, document: &Document, controller: &Shared) {
    let document = document.clone();
    let controller = controller.clone();
    spawn_local(async move {
        let report = cycle.run().await;
        if report.failures() > 0 {
            log::debug!("{} models failed this cycle", report.failures());
        }
        controller.borrow_mut().apply_cycle(report);
        render(&document, &controller);
    });
}

fn setup_handlers(
    document: &Document,
    canvas: &HtmlCanvasElement,
    controller: &Shared,
) -> Result<Bindings, JsValue> {
    let body = document.body().ok_or("no body")?;
    let clear_button = document
        .get_element_by_id(dom::CLEAR_BUTTON_ID)
        .ok_or("no clear button")?;

    let mut listeners = Vec::new();

    // Mouse down starts a stroke
    let doc = document.clone();
    let ctl = controller.clone();
    listeners.push(EventListener::new(canvas, "mousedown", move |event| {
        let Some((x, y)) = mouse_offset(event) else {
            return;
        };
        let cycle = ctl.borrow_mut().pointer_down(x, y);
        render(&doc, &ctl);
        if let Some(cycle) = cycle {
            dispatch(cycle, &doc, &ctl);
        }
    }));

    // Mouse move extends it
    let doc = document.clone();
    let ctl = controller.clone();
    listeners.push(EventListener::new(canvas, "mousemove", move |event| {
        let Some((x, y)) = mouse_offset(event) else {
            return;
        };
        let cycle = ctl.borrow_mut().pointer_move(x, y);
        if let Some(cycle) = cycle {
            dispatch(cycle, &doc, &ctl);
        }
    }));

    // Release anywhere on the page ends it
    let ctl = controller.clone();
    listeners.push(EventListener::new(&body, "mouseup", move |_| {
        ctl.borrow_mut().pointer_up();
    }));

    let ctl = controller.clone();
    listeners.push(EventListener::new(&body, "mouseout", move |event| {
        ctl.borrow_mut().pointer_out(related_target(event));
    }));

    let doc = document.clone();
    let ctl = controller.clone();
    listeners.push(EventListener::new(&clear_button, "mousedown", move |_| {
        ctl.borrow_mut().clear();
        render(&doc, &ctl);
    }));

    log::debug!("bound {} event listeners", listeners.len());
    Ok(Bindings { listeners })
}
