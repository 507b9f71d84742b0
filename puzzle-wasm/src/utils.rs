use log::{Level, LevelFilter, Log, Metadata, Record};
use puzzle_core::{CanvasBounds, Point, PointerSample, Size};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Event, HtmlCanvasElement, MouseEvent, TouchEvent, Window};

/// Log a message to the browser console.
pub fn log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

/// Forwards `log` records to the matching console method.
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&msg),
            Level::Warn => web_sys::console::warn_1(&msg),
            Level::Info => web_sys::console::info_1(&msg),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

/// Installs the console logger; a second call is a no-op.
pub fn init_logging(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Resize the canvas backing store to the window's inner size and return it.
pub fn sync_canvas_size(window: &Window, canvas: &HtmlCanvasElement) -> Size {
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(canvas.width() as f64)
        .max(1.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(canvas.height() as f64)
        .max(1.0);
    if canvas.width() != w as u32 {
        canvas.set_width(w as u32);
    }
    if canvas.height() != h as u32 {
        canvas.set_height(h as u32);
    }
    Size::new(canvas.width() as f64, canvas.height() as f64)
}

pub fn canvas_bounds(canvas: &HtmlCanvasElement) -> CanvasBounds {
    let rect = canvas.get_bounding_client_rect();
    CanvasBounds {
        left: rect.left(),
        top: rect.top(),
        css_w: rect.width(),
        css_h: rect.height(),
        pixel_w: canvas.width() as f64,
        pixel_h: canvas.height() as f64,
    }
}

/// Extract client coordinates from a mouse or touch event. Only the first
/// touch point is considered.
pub fn pointer_sample(e: &Event) -> Option<PointerSample> {
    if let Some(me) = e.dyn_ref::<MouseEvent>() {
        return Some(PointerSample {
            client: Point::new(me.client_x() as f64, me.client_y() as f64),
            first_touch: None,
        });
    }
    let te = e.dyn_ref::<TouchEvent>()?;
    let touch = te.touches().get(0).or_else(|| te.changed_touches().get(0))?;
    let p = Point::new(touch.client_x() as f64, touch.client_y() as f64);
    Some(PointerSample {
        client: p,
        first_touch: Some(p),
    })
}

/// Best-effort text of a rejected JS promise or thrown value.
pub fn js_error_text(err: &JsValue) -> String {
    if let Some(s) = err.as_string() {
        return s;
    }
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    if let Some(ev) = err.dyn_ref::<Event>() {
        return format!("{} event", ev.type_());
    }
    format!("{err:?}")
}

/// Build an absolute URL for an asset, taking into account the optional
/// `window.__BASE_URL` which is set by the host page.
pub fn asset_url(path: &str) -> String {
    let p = path.trim();
    if p.starts_with("http://") || p.starts_with("https://") || p.starts_with("data:") {
        return p.to_string();
    }
    let base = web_sys::window()
        .and_then(|w| {
            js_sys::Reflect::get(&w, &JsValue::from_str("__BASE_URL"))
                .ok()?
                .as_string()
        })
        .unwrap_or_else(|| "/".to_string());
    join_url(&base, p)
}

fn join_url(base: &str, path: &str) -> String {
    let sep = if base.ends_with('/') { "" } else { "/" };
    format!("{}{}{}", base, sep, path.trim_start_matches('/'))
}

/// Fetch a text resource trying a list of fallback URLs in order.
pub async fn fetch_text_with_fallbacks(window: &Window, urls: &[&str]) -> Option<String> {
    for url in urls {
        let resp_value =
            match wasm_bindgen_futures::JsFuture::from(window.fetch_with_str(url)).await {
                Ok(v) => v,
                Err(_) => continue,
            };
        let resp: web_sys::Response = match resp_value.dyn_into() {
            Ok(r) => r,
            Err(_) => continue,
        };
        if !resp.ok() {
            log::debug!("{url}: HTTP {}", resp.status());
            continue;
        }
        if let Ok(text_promise) = resp.text()
            && let Ok(text_js) = wasm_bindgen_futures::JsFuture::from(text_promise).await
            && let Some(s) = text_js.as_string()
        {
            return Some(s);
        }
    }
    None
}

/// Simple query string parser used at start-up.
pub fn get_query_param(search: &str, key: &str) -> Option<String> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| url_decode(v))
}

fn url_decode(s: &str) -> String {
    let s = s.replace('+', " ");
    percent_encoding::percent_decode_str(&s)
        .decode_utf8_lossy()
        .to_string()
}
