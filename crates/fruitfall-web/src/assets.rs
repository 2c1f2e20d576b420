//! Sprite store: async image decode with one retry, a warmup barrier, and
//! the session-ticket guard that discards stale async completions.

use fnv::FnvHashMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

// Bump when image assets are replaced so browsers fetch fresh files.
const ASSET_VERSION: &str = "2026-02-15-4";
const ASSET_PRELOAD_TIMEOUT_MS: f64 = 1800.0;
const ASSET_START_REQUIRED_RATIO: f32 = 0.5;
const WARMUP_POLL_MS: i32 = 50;

const IMAGE_MANIFEST: &[(&str, &str)] = &[
    ("fx_fruit_pop", "assets/images/game-effects/fx_fruit_pop_v1.png"),
    (
        "meteor_star_face1",
        "assets/images/game-effects/meteor_star_face1_v1.png",
    ),
    (
        "meteor_star_face2",
        "assets/images/game-effects/meteor_star_face2_v1.png",
    ),
    (
        "meteor_star_face3",
        "assets/images/game-effects/meteor_star_face3_v1.png",
    ),
    (
        "background_day_sky",
        "assets/images/backgrounds/background_day_sky_v1.png",
    ),
    (
        "background_fever_sky",
        "assets/images/backgrounds/background_fever_sky_v1.png",
    ),
];

/// Sprite keys for the three shooting-star faces, indexed by pool variant.
pub const METEOR_VARIANTS: [&str; 3] = [
    "meteor_star_face1",
    "meteor_star_face2",
    "meteor_star_face3",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotState {
    Pending,
    Ready,
    Failed,
}

struct ImageSlot {
    image: web::HtmlImageElement,
    url: String,
    state: Cell<SlotState>,
    retried: Cell<bool>,
    // one-shot decode callbacks, kept alive for the image's lifetime
    callbacks: RefCell<Vec<Closure<dyn FnMut()>>>,
}

pub struct AssetStore {
    slots: FnvHashMap<&'static str, Rc<ImageSlot>>,
    session_ticket: Cell<u64>,
}

impl AssetStore {
    /// Build the store and kick off every decode in the background.
    pub fn load() -> Rc<Self> {
        let mut slots = FnvHashMap::default();
        for (key, path) in IMAGE_MANIFEST {
            if let Ok(image) = web::HtmlImageElement::new() {
                let slot = Rc::new(ImageSlot {
                    image,
                    url: format!("{path}?v={ASSET_VERSION}"),
                    state: Cell::new(SlotState::Pending),
                    retried: Cell::new(false),
                    callbacks: RefCell::new(Vec::new()),
                });
                begin_load(&slot);
                slots.insert(*key, slot);
            } else {
                log::warn!("[assets] could not create image element for {key}");
            }
        }
        Rc::new(Self {
            slots,
            session_ticket: Cell::new(0),
        })
    }

    /// Decoded image for `key`, or `None` while pending/failed — callers fall
    /// back to procedural drawing.
    pub fn get(&self, key: &str) -> Option<web::HtmlImageElement> {
        let slot = self.slots.get(key)?;
        if slot.state.get() != SlotState::Ready {
            return None;
        }
        if slot.image.natural_width() == 0 || slot.image.natural_height() == 0 {
            return None;
        }
        Some(slot.image.clone())
    }

    pub fn ready_ratio(&self) -> f32 {
        if self.slots.is_empty() {
            return 1.0;
        }
        let ready = self
            .slots
            .values()
            .filter(|s| s.state.get() == SlotState::Ready)
            .count();
        ready as f32 / self.slots.len() as f32
    }

    /// Start a new session; any async completion holding an older ticket must
    /// discard its result.
    pub fn begin_session(&self) -> u64 {
        let next = self.session_ticket.get() + 1;
        self.session_ticket.set(next);
        next
    }

    pub fn current_session(&self) -> u64 {
        self.session_ticket.get()
    }
}

fn begin_load(slot: &Rc<ImageSlot>) {
    {
        let slot_ok = slot.clone();
        let onload = Closure::wrap(Box::new(move || {
            slot_ok.state.set(SlotState::Ready);
        }) as Box<dyn FnMut()>);
        slot.image.set_onload(Some(onload.as_ref().unchecked_ref()));
        slot.callbacks.borrow_mut().push(onload);
    }
    {
        let slot_err = slot.clone();
        let onerror = Closure::wrap(Box::new(move || {
            if !slot_err.retried.replace(true) {
                log::warn!("[assets] retrying {}", slot_err.url);
                slot_err.image.set_src(&format!("{}&retry=1", slot_err.url));
            } else {
                log::warn!("[assets] failed to load {}", slot_err.url);
                slot_err.state.set(SlotState::Failed);
            }
        }) as Box<dyn FnMut()>);
        slot.image
            .set_onerror(Some(onerror.as_ref().unchecked_ref()));
        slot.callbacks.borrow_mut().push(onerror);
    }
    slot.image.set_src(&slot.url);
}

/// Wait (bounded) for the store to reach the required ready ratio. Returns
/// `false` when the session ticket went stale while waiting.
pub async fn warmup(store: Rc<AssetStore>, ticket: u64) -> bool {
    let started = crate::dom::performance_now_ms();
    loop {
        if store.current_session() != ticket {
            return false;
        }
        if store.ready_ratio() >= 1.0 {
            return true;
        }
        if crate::dom::performance_now_ms() - started >= ASSET_PRELOAD_TIMEOUT_MS {
            let ratio = store.ready_ratio();
            if ratio < ASSET_START_REQUIRED_RATIO {
                log::warn!(
                    "[assets] ready ratio {ratio:.3} below required {ASSET_START_REQUIRED_RATIO} after warmup timeout"
                );
            }
            return true;
        }
        sleep_ms(WARMUP_POLL_MS).await;
    }
}

async fn sleep_ms(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        if let Some(window) = web::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}
