use js_sys::Promise;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlImageElement;

/// Loads an image and resolves once it has decoded, so its natural size is
/// known. Rejects on a network or decode error.
pub async fn load_image(url: &str) -> Result<HtmlImageElement, JsValue> {
    let img = HtmlImageElement::new()?;
    let done = Promise::new(&mut |resolve, reject| {
        img.set_onload(Some(&resolve));
        img.set_onerror(Some(&reject));
    });
    img.set_src(url);
    let result = JsFuture::from(done).await;
    img.set_onload(None);
    img.set_onerror(None);
    result.map(|_| img)
}
