//! Pointer input: maps client X to a logical target coordinate and stamps
//! the most recent input time for the latency percentile.

use crate::dom::{self, Subscription};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct InputTracker {
    rect_left: Cell<f64>,
    rect_width: Cell<f64>,
    logical_w: Cell<f32>,
    target_x: Cell<Option<f32>>,
    latest_input_at: Cell<Option<f64>>,
}

impl InputTracker {
    pub fn new(logical_w: f32) -> Rc<Self> {
        Rc::new(Self {
            rect_left: Cell::new(0.0),
            rect_width: Cell::new(1.0),
            logical_w: Cell::new(logical_w.max(1.0)),
            target_x: Cell::new(None),
            latest_input_at: Cell::new(None),
        })
    }

    pub fn refresh_rect(&self, canvas: &web::HtmlCanvasElement) {
        let rect = canvas.get_bounding_client_rect();
        self.rect_left.set(rect.left());
        self.rect_width.set(rect.width().max(1.0));
    }

    pub fn set_logical_width(&self, logical_w: f32) {
        self.logical_w.set(logical_w.max(1.0));
    }

    /// Most recent pointer target in logical coordinates, if any input has
    /// arrived since the session started.
    pub fn target_x(&self) -> Option<f32> {
        self.target_x.get()
    }

    /// One-shot read of the last input timestamp; consumed per frame so each
    /// input contributes a single latency sample.
    pub fn consume_latest_input_at(&self) -> Option<f64> {
        self.latest_input_at.take()
    }

    fn emit(&self, client_x: f64) {
        let normalized = (client_x - self.rect_left.get()) / self.rect_width.get();
        let logical = (normalized as f32 * self.logical_w.get()).clamp(0.0, self.logical_w.get());
        self.target_x.set(Some(logical));
        self.latest_input_at.set(Some(dom::performance_now_ms()));
    }

    /// Attach pointer listeners; dropping the returned subscriptions detaches
    /// them.
    pub fn attach(self: &Rc<Self>, canvas: &web::HtmlCanvasElement) -> Vec<Subscription> {
        self.refresh_rect(canvas);
        let target: &web::EventTarget = canvas.as_ref();
        let mut subs = Vec::with_capacity(2);

        let tracker = self.clone();
        let canvas_down = canvas.clone();
        subs.push(Subscription::listen(target, "pointerdown", move |ev| {
            let ev: web::PointerEvent = ev.unchecked_into();
            if !ev.is_primary() && ev.pointer_type() != "mouse" {
                return;
            }
            tracker.refresh_rect(&canvas_down);
            tracker.emit(ev.client_x() as f64);
        }));

        let tracker = self.clone();
        subs.push(Subscription::listen(target, "pointermove", move |ev| {
            let ev: web::PointerEvent = ev.unchecked_into();
            if !ev.is_primary() && ev.pointer_type() != "mouse" {
                return;
            }
            tracker.emit(ev.client_x() as f64);
        }));

        subs
    }
}
