#![cfg(target_arch = "wasm32")]
//! WASM entry point: fail-fast bootstrap, event wiring, and the frame loop.

pub mod assets;
pub mod dom;
pub mod draw;
pub mod frame;
pub mod input;
pub mod raster;
pub mod settings;
pub mod viewport;

pub use frame::{FrameContext, FrameFault, GameScene, SceneEvent};

use crate::assets::AssetStore;
use crate::dom::Subscription;
use crate::input::InputTracker;
use crate::raster::AssetRasterCache;
use crate::settings::Settings;
use crate::viewport::ViewportRenderer;
use fruitfall_core::{
    FeverFx, PerfMonitor, PerfOptions, BASE_LOGICAL_W, RASTER_BUDGET_DEFAULT_BYTES,
};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("fruitfall-web starting");

    if let Err(e) = init() {
        log::error!("init error: {e:?}");
    }
    Ok(())
}

fn init() -> anyhow::Result<()> {
    let (window, document) =
        dom::window_document().ok_or_else(|| anyhow::anyhow!("no window/document"))?;

    let canvas: web::HtmlCanvasElement = document
        .get_element_by_id("game")
        .ok_or_else(|| anyhow::anyhow!("missing #game canvas"))?
        .dyn_into()
        .map_err(|e| anyhow::anyhow!(format!("{e:?}")))?;
    let ctx: web::CanvasRenderingContext2d = canvas
        .get_context("2d")
        .map_err(|e| anyhow::anyhow!(format!("{e:?}")))?
        .ok_or_else(|| anyhow::anyhow!("2D context unavailable"))?
        .dyn_into()
        .map_err(|e| anyhow::anyhow!(format!("{e:?}")))?;
    let root: web::HtmlElement = document
        .document_element()
        .and_then(|e| e.dyn_into().ok())
        .ok_or_else(|| anyhow::anyhow!("no document root element"))?;

    let settings = Settings::load();
    let assets = AssetStore::load();
    let input = InputTracker::new(BASE_LOGICAL_W);

    let viewport = ViewportRenderer::new(canvas.clone(), ctx, document.clone(), root.clone());
    let raster = AssetRasterCache::new(document, RASTER_BUDGET_DEFAULT_BYTES);
    let perf = PerfMonitor::new(PerfOptions::default());
    let fever = FeverFx::new(rand::random());

    let frame_ctx = Rc::new(RefCell::new(FrameContext::new(
        viewport,
        raster,
        assets,
        perf,
        fever,
        settings.clone(),
        input.clone(),
        root,
    )));
    frame_ctx.borrow_mut().apply_responsive_profile();

    let mut subs = input.attach(&canvas);
    let pending = frame_ctx.borrow().profile_apply_flag();
    for event in ["resize", "orientationchange"] {
        let pending = pending.clone();
        subs.push(Subscription::listen(&window, event, move |_| {
            pending.set(true);
        }));
    }
    for query in ["(prefers-reduced-motion: reduce)", "(pointer: coarse)"] {
        if let Some(mql) = dom::media_query(query) {
            let pending = pending.clone();
            subs.push(Subscription::listen(&mql, "change", move |_| {
                pending.set(true);
            }));
        }
    }
    {
        let pending = pending.clone();
        let mode_cell = frame_ctx.borrow().mode_cell();
        settings.subscribe(move |mode| {
            mode_cell.set(mode);
            pending.set(true);
        });
    }
    {
        // First click starts a session; later clicks while stopped restart.
        let ctx_click = frame_ctx.clone();
        subs.push(Subscription::listen(&canvas, "click", move |_| {
            let running = ctx_click.borrow().is_running();
            if !running {
                frame::begin_session(&ctx_click);
            }
        }));
    }
    frame_ctx.borrow_mut().hold_subscriptions(subs);

    frame::start_loop(frame_ctx);
    Ok(())
}
