use std::cell::RefCell;
use std::rc::Rc;

use log::LevelFilter;
use puzzle_core::{
    Engine, GameSession, ImageInfo, LevelRequest, PuzzleConfig, PuzzleEvent, canvas_point,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, CanvasRenderingContext2d, CustomEvent, CustomEventInit, Document,
    Event, HtmlCanvasElement, Window,
};

mod canvas;
mod loader;
mod progress;
mod state;
mod utils;

use crate::canvas::CanvasSurface;
use crate::progress::LocalStorageProgress;
use crate::state::{STATE, State, with_state};
use crate::utils::{
    asset_url, canvas_bounds, fetch_text_with_fallbacks, get_query_param, js_error_text, log,
    pointer_sample, sync_canvas_size,
};

const SESSION_KEY: &str = "pm_session_player";
const DEFAULT_PLAYER: &str = "guest";

fn draw(state: &mut State) {
    let ready = state.image_ready();
    let mut surface = CanvasSurface::new(&state.ctx, state.image.as_ref());
    state.session.engine().render(&mut surface, ready);
}

fn update_stage_dom(state: &State, level: u32) {
    if let Some(el) = state.document.get_element_by_id("stage-title") {
        el.set_text_content(Some(&format!("Stage {level}")));
    }
}

fn show_element(document: &Document, id: &str, visible: bool) {
    if let Some(el) = document.get_element_by_id(id) {
        let classes = el.class_list();
        let _ = if visible {
            classes.remove_1("hidden")
        } else {
            classes.add_1("hidden")
        };
    }
}

fn dispatch_dom_event(window: &Window, event: &PuzzleEvent) -> Result<(), JsValue> {
    let json = serde_json::to_string(event).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let init = CustomEventInit::new();
    init.set_detail(&js_sys::JSON::parse(&json)?);
    let ev = CustomEvent::new_with_event_init_dict(event.dom_name(), &init)?;
    window.dispatch_event(&ev)?;
    Ok(())
}

/// Applies queued engine events to the page chrome and returns them for
/// dispatch. Listeners may call back into the exports, so the caller must
/// release its borrow before handing the events to `dispatch_events`.
fn flush_events(state: &mut State) -> Vec<PuzzleEvent> {
    let events = state.session.engine_mut().drain_events();
    for event in &events {
        match event {
            PuzzleEvent::LevelLoaded { level, .. } => update_stage_dom(state, *level),
            PuzzleEvent::PuzzleCompleted { .. } => {
                show_element(&state.document, "complete-modal", true)
            }
            PuzzleEvent::ImageLoadFailed { .. } => {
                show_element(&state.document, "load-error", true)
            }
            PuzzleEvent::PieceSnapped { .. } => {}
        }
    }
    events
}

fn dispatch_events(window: &Window, events: Vec<PuzzleEvent>) {
    for event in events {
        if let Err(e) = dispatch_dom_event(window, &event) {
            log(&format!("Failed to dispatch {}: {}", event.dom_name(), js_error_text(&e)));
        }
    }
}

/// Fetches the level image and generates the puzzle once it has decoded.
/// A completion arriving after a newer request was issued is dropped.
fn start_load(state: Rc<RefCell<State>>, req: LevelRequest) {
    {
        let mut s = state.borrow_mut();
        s.image = None;
        show_element(&s.document, "load-error", false);
        update_stage_dom(&s, req.level);
        draw(&mut s);
    }
    let url = asset_url(&req.asset);
    wasm_bindgen_futures::spawn_local(async move {
        let loaded = loader::load_image(&url).await;
        let mut s = state.borrow_mut();
        let window = s.window.clone();
        if !s.session.engine().is_current(req.ticket) {
            log::debug!("dropping stale image {url}");
            return;
        }
        match loaded {
            Ok(img) => match ImageInfo::new(img.natural_width(), img.natural_height()) {
                Ok(info) => {
                    let viewport = sync_canvas_size(&s.window, &s.canvas);
                    let engine = s.session.engine_mut();
                    engine.resize(viewport);
                    match engine.complete_load(req.ticket, info) {
                        Ok(true) => s.image = Some(img),
                        Ok(false) => {}
                        Err(e) => {
                            engine.fail_load(req.ticket, e.to_string());
                        }
                    }
                }
                Err(e) => {
                    s.session.engine_mut().fail_load(req.ticket, e.to_string());
                }
            },
            Err(e) => {
                s.session
                    .engine_mut()
                    .fail_load(req.ticket, js_error_text(&e));
            }
        }
        draw(&mut s);
        let events = flush_events(&mut s);
        drop(s);
        dispatch_events(&window, events);
    });
}

/// Issues a level request through `f` and starts loading it.
fn request_level(
    state: &Rc<RefCell<State>>,
    f: impl FnOnce(&mut GameSession<LocalStorageProgress>) -> puzzle_core::Result<LevelRequest>,
) {
    let req = f(&mut state.borrow_mut().session);
    match req {
        Ok(req) => start_load(state.clone(), req),
        Err(e) => log::error!("cannot start level: {e}"),
    }
}

fn listen(
    target: &web_sys::EventTarget,
    events: &[&str],
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let cb = Closure::<dyn FnMut(Event)>::wrap(Box::new(handler));
    let opts = AddEventListenerOptions::new();
    opts.set_passive(false);
    for name in events {
        target.add_event_listener_with_callback_and_add_event_listener_options(
            name,
            cb.as_ref().unchecked_ref(),
            &opts,
        )?;
    }
    cb.forget();
    Ok(())
}

fn attach_ui(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let (window, canvas, document) = {
        let s = state.borrow();
        (s.window.clone(), s.canvas.clone(), s.document.clone())
    };

    // Press on the canvas; move and release anywhere so drags can leave it.
    {
        let st = state.clone();
        listen(&canvas, &["mousedown", "touchstart"], move |e: Event| {
            e.prevent_default();
            let Some(sample) = pointer_sample(&e) else {
                return;
            };
            let mut s = st.borrow_mut();
            let at = canvas_point(sample, canvas_bounds(&s.canvas));
            if s.session.pointer_down(at) {
                draw(&mut s);
            }
        })?;
    }
    {
        let st = state.clone();
        listen(&window, &["mousemove", "touchmove"], move |e: Event| {
            let mut s = st.borrow_mut();
            if !s.session.engine().drag().is_dragging() {
                return;
            }
            e.prevent_default();
            let Some(sample) = pointer_sample(&e) else {
                return;
            };
            let at = canvas_point(sample, canvas_bounds(&s.canvas));
            if s.session.pointer_move(at) {
                draw(&mut s);
            }
        })?;
    }
    {
        let st = state.clone();
        listen(&window, &["mouseup", "touchend", "touchcancel"], move |_e: Event| {
            let mut s = st.borrow_mut();
            if !s.session.engine().drag().is_dragging() {
                return;
            }
            s.session.pointer_up();
            draw(&mut s);
            let events = flush_events(&mut s);
            let window = s.window.clone();
            drop(s);
            dispatch_events(&window, events);
        })?;
    }
    {
        let st = state.clone();
        listen(&window, &["resize"], move |_e: Event| {
            let mut s = st.borrow_mut();
            let viewport = sync_canvas_size(&s.window, &s.canvas);
            s.session.engine_mut().resize(viewport);
            draw(&mut s);
        })?;
    }

    if let Some(btn) = document.get_element_by_id("next-level-btn") {
        let st = state.clone();
        listen(&btn, &["click"], move |_e: Event| {
            show_element(&st.borrow().document, "complete-modal", false);
            request_level(&st, |session| session.next_level());
        })?;
    }
    if let Some(btn) = document.get_element_by_id("retry-btn") {
        let st = state.clone();
        listen(&btn, &["click"], move |_e: Event| {
            request_level(&st, |session| session.engine_mut().retry());
        })?;
    }
    Ok(())
}

fn init_canvas(
    document: &Document,
) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), JsValue> {
    let cv = document
        .get_element_by_id("puzzle-canvas")
        .or_else(|| document.get_element_by_id("cv"))
        .ok_or_else(|| JsValue::from_str("canvas #puzzle-canvas not found"))?
        .dyn_into::<HtmlCanvasElement>()?;
    let ctx = cv
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2D context not available"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    Ok((cv, ctx))
}

/// Player id from `?player=`, else the remembered one, else a guest.
fn resolve_player(window: &Window) -> String {
    let storage = window.local_storage().ok().flatten();
    let from_query = window
        .location()
        .search()
        .ok()
        .and_then(|s| get_query_param(&s, "player"))
        .filter(|p| !p.trim().is_empty());
    let player = from_query
        .or_else(|| storage.as_ref()?.get_item(SESSION_KEY).ok().flatten())
        .unwrap_or_else(|| DEFAULT_PLAYER.to_string());
    if let Some(storage) = storage {
        let _ = storage.set_item(SESSION_KEY, &player);
    }
    player
}

/// Optional `puzzle.json` next to the page; defaults when absent or invalid.
async fn load_config(window: &Window) -> PuzzleConfig {
    let url = asset_url("puzzle.json");
    let Some(text) = fetch_text_with_fallbacks(window, &[&url, "puzzle.json"]).await else {
        return PuzzleConfig::default();
    };
    PuzzleConfig::from_json(&text).unwrap_or_else(|e| {
        log::warn!("puzzle.json ignored: {e}");
        PuzzleConfig::default()
    })
}

fn random_seed() -> u64 {
    let hi = (js_sys::Math::random() * u32::MAX as f64) as u64;
    let lo = (js_sys::Math::random() * u32::MAX as f64) as u64;
    (hi << 32) ^ lo ^ js_sys::Date::now() as u64
}

fn boot(
    window: Window,
    document: Document,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    config: PuzzleConfig,
) -> Result<(), JsValue> {
    let engine = Engine::new(config, random_seed())
        .or_else(|e| {
            log::warn!("{e}; using default configuration");
            Engine::new(PuzzleConfig::default(), random_seed())
        })
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let player = resolve_player(&window);
    let session = GameSession::login(engine, LocalStorageProgress::open(&window), &player);

    let state = Rc::new(RefCell::new(State {
        window,
        document,
        canvas,
        ctx,
        session,
        image: None,
    }));
    {
        let mut s = state.borrow_mut();
        let viewport = sync_canvas_size(&s.window, &s.canvas);
        s.session.engine_mut().resize(viewport);
    }
    STATE.with(|st| st.replace(Some(state.clone())));
    attach_ui(state.clone())?;
    request_level(&state, |session| session.start_level());
    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    utils::init_logging(LevelFilter::Info);
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let (canvas, ctx) = init_canvas(&document)?;

    wasm_bindgen_futures::spawn_local(async move {
        let config = load_config(&window).await;
        if let Err(err) = boot(window, document, canvas, ctx, config) {
            log(&format!("Failed to start puzzle: {}", js_error_text(&err)));
        }
    });
    Ok(())
}

/// Loads the player's next level after a completion.
#[wasm_bindgen]
pub fn next_level() {
    with_state(|st| {
        show_element(&st.borrow().document, "complete-modal", false);
        request_level(st, |session| session.next_level());
    });
}

/// Retries the current level, e.g. after its image failed to load.
#[wasm_bindgen]
pub fn retry_level() {
    with_state(|st| request_level(st, |session| session.engine_mut().retry()));
}
