//! Small DOM helpers and RAII event subscriptions.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<(web::Window, web::Document)> {
    let window = web::window()?;
    let document = window.document()?;
    Some((window, document))
}

/// `performance.now()` in milliseconds, or 0 when unavailable.
#[inline]
pub fn performance_now_ms() -> f64 {
    web::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

#[inline]
pub fn device_pixel_ratio() -> f32 {
    web::window()
        .map(|w| w.device_pixel_ratio() as f32)
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(1.0)
}

pub fn media_query(query: &str) -> Option<web::MediaQueryList> {
    web::window()?.match_media(query).ok().flatten()
}

#[inline]
pub fn media_matches(query: &str) -> bool {
    media_query(query).map(|m| m.matches()).unwrap_or(false)
}

pub fn set_root_css_prop(root: &web::HtmlElement, name: &str, value: &str) {
    let _ = root.style().set_property(name, value);
}

pub fn set_root_attr(root: &web::HtmlElement, name: &str, value: &str) {
    let _ = root.set_attribute(name, value);
}

/// An attached event listener that detaches itself when dropped, so teardown
/// is deterministic instead of accumulating forgotten closures.
pub struct Subscription {
    target: web::EventTarget,
    event: String,
    closure: Closure<dyn FnMut(web::Event)>,
}

impl Subscription {
    pub fn listen(
        target: &web::EventTarget,
        event: &str,
        handler: impl FnMut(web::Event) + 'static,
    ) -> Self {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web::Event)>);
        let _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        Self {
            target: target.clone(),
            event: event.to_string(),
            closure,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(&self.event, self.closure.as_ref().unchecked_ref());
    }
}
