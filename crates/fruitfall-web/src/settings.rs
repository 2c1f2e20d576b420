//! Persisted quality settings and their change subscription.
//!
//! This is the settings collaborator surface: it supplies the initial quality
//! mode and notifies subscribers on change. Nothing here reads rendering
//! state back.

use crate::dom;
use fruitfall_core::QualityMode;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use web_sys as web;

const QUALITY_STORAGE_KEY: &str = "fruitfall.quality-mode";

type QualityListener = Box<dyn FnMut(QualityMode)>;

pub struct Settings {
    mode: Cell<QualityMode>,
    listeners: RefCell<Vec<QualityListener>>,
}

impl Settings {
    pub fn load() -> Rc<Self> {
        let mode = read_storage(QUALITY_STORAGE_KEY)
            .and_then(|raw| match raw.parse::<QualityMode>() {
                Ok(mode) => Some(mode),
                Err(err) => {
                    log::warn!("[settings] {err}; falling back to auto");
                    None
                }
            })
            .unwrap_or_default();
        Rc::new(Self {
            mode: Cell::new(mode),
            listeners: RefCell::new(Vec::new()),
        })
    }

    pub fn quality_mode(&self) -> QualityMode {
        self.mode.get()
    }

    pub fn set_quality_mode(&self, mode: QualityMode) {
        if self.mode.replace(mode) == mode {
            return;
        }
        write_storage(QUALITY_STORAGE_KEY, mode.as_str());
        log::info!("[settings] quality mode -> {}", mode.as_str());
        for listener in self.listeners.borrow_mut().iter_mut() {
            listener(mode);
        }
    }

    pub fn subscribe(&self, listener: impl FnMut(QualityMode) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }
}

fn local_storage() -> Option<web::Storage> {
    web::window()?.local_storage().ok().flatten()
}

fn read_storage(key: &str) -> Option<String> {
    local_storage()?.get_item(key).ok().flatten()
}

fn write_storage(key: &str, value: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(key, value);
    }
}

/// Touch capability + pointer coarseness, gathered once per profile apply.
pub fn pointer_environment() -> (u32, bool) {
    let touch_points = web::window()
        .map(|w| w.navigator().max_touch_points().max(0) as u32)
        .unwrap_or(0);
    let coarse = dom::media_matches("(pointer: coarse)");
    (touch_points, coarse)
}

#[inline]
pub fn prefers_reduced_motion() -> bool {
    dom::media_matches("(prefers-reduced-motion: reduce)")
}
