use std::cell::RefCell;
use std::rc::Rc;

use puzzle_core::GameSession;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlImageElement, Window};

use crate::progress::LocalStorageProgress;

/// Global application state stored behind an `Rc<RefCell<_>>` so it can be
/// shared across the WASM callbacks.
pub struct State {
    pub window: Window,
    pub document: Document,
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
    pub session: GameSession<LocalStorageProgress>,
    /// Image of the level being played; `None` until its load completes.
    pub image: Option<HtmlImageElement>,
}

impl State {
    /// True once the level image has decoded and can be sampled.
    pub fn image_ready(&self) -> bool {
        self.image
            .as_ref()
            .is_some_and(|img| img.complete() && img.natural_width() > 0)
    }
}

/// Thread local storage for the single runtime state instance.
thread_local! {
    pub static STATE: RefCell<Option<Rc<RefCell<State>>>> = const { RefCell::new(None) };
}

/// Runs `f` against the live state, if the app has started.
pub fn with_state<R>(f: impl FnOnce(&Rc<RefCell<State>>) -> R) -> Option<R> {
    STATE.with(|st| st.borrow().as_ref().map(f))
}
