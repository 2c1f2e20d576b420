//! The per-frame orchestrator: perf sampling, deferred profile application,
//! fever advancement, pool retirement, ordered draws, and fault recovery.
//!
//! All mutable state lives in [`FrameContext`] with one owner per field:
//! the perf monitor owns the tier, the profile snapshot owns the scale
//! coefficients, the fever machine owns its pools. Everything is touched
//! only from the frame-ordered callback chain.

use crate::assets::{self, AssetStore};
use crate::dom::{self, Subscription};
use crate::draw::{self, BackgroundCache};
use crate::input::InputTracker;
use crate::raster::AssetRasterCache;
use crate::settings::{self, Settings};
use crate::viewport::{ViewportConfig, ViewportRenderer};
use fruitfall_core::{
    clamp_frame_dt, compute_profile, detect_device_class, DeviceClass, FeverEvent, FeverFx,
    FeverPhase, PerfMonitor, ProfileInputs, QualityMode, QualityTier, ResizeRemap,
    ResponsiveProfileSnapshot, ViewportSnapshot, BASE_LOGICAL_H, BASE_LOGICAL_W,
};
use glam::Vec2;
use instant::Instant;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

/// Events the gameplay collaborator reports into the rendering core.
#[derive(Clone, Copy, Debug)]
pub enum SceneEvent {
    /// A bonus item was caught: opens/extends the fever window.
    BonusCaught { x: f32, y: f32 },
    /// A scoring catch during fever: hit feedback only.
    BonusHit { x: f32, y: f32, color: &'static str },
}

/// Seam for the gameplay collaborator. The rendering core calls these in
/// frame order; no rendering state flows back out besides the profile.
pub trait GameScene {
    fn update(
        &mut self,
        dt: f32,
        now: f64,
        profile: &ResponsiveProfileSnapshot,
        input: &InputTracker,
        events: &mut Vec<SceneEvent>,
    );
    fn draw(
        &mut self,
        ctx: &web::CanvasRenderingContext2d,
        profile: &ResponsiveProfileSnapshot,
        view: &ViewportSnapshot,
    ) -> Result<(), JsValue>;
    fn rescale(&mut self, remap: &ResizeRemap);
    fn reset(&mut self);
}

/// Single-slot diagnostic for the most recent in-frame fault.
#[derive(Clone, Debug)]
pub struct FrameFault {
    pub message: String,
    pub at_ms: f64,
    pub tier: QualityTier,
    pub phase: FeverPhase,
}

pub struct FrameContext {
    pub viewport: ViewportRenderer,
    pub raster: AssetRasterCache,
    pub assets: Rc<AssetStore>,
    pub perf: PerfMonitor,
    pub fever: FeverFx,
    pub profile: ResponsiveProfileSnapshot,
    pub settings: Rc<Settings>,
    pub input: Rc<InputTracker>,
    scene: Option<Box<dyn GameScene>>,
    background: BackgroundCache,
    root: web::HtmlElement,
    mode: Rc<Cell<QualityMode>>,
    pending_profile_apply: Rc<Cell<bool>>,
    running: bool,
    paused: bool,
    total_elapsed: f64,
    last_instant: Instant,
    last_fault: Option<FrameFault>,
    scene_events: Vec<SceneEvent>,
    _subscriptions: Vec<Subscription>,
}

impl FrameContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        viewport: ViewportRenderer,
        raster: AssetRasterCache,
        assets: Rc<AssetStore>,
        perf: PerfMonitor,
        fever: FeverFx,
        settings: Rc<Settings>,
        input: Rc<InputTracker>,
        root: web::HtmlElement,
    ) -> Self {
        let mode = Rc::new(Cell::new(settings.quality_mode()));
        Self {
            viewport,
            raster,
            assets,
            perf,
            fever,
            profile: ResponsiveProfileSnapshot::default(),
            settings,
            input,
            scene: None,
            background: BackgroundCache::new(),
            root,
            mode,
            pending_profile_apply: Rc::new(Cell::new(false)),
            running: false,
            paused: false,
            total_elapsed: 0.0,
            last_instant: Instant::now(),
            last_fault: None,
            scene_events: Vec::new(),
            _subscriptions: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.running {
            self.paused = paused;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.running {
            self.paused = !self.paused;
        }
    }

    pub fn last_fault(&self) -> Option<&FrameFault> {
        self.last_fault.as_ref()
    }

    /// Shared single-flight flag: resize/media/tier events set it, the next
    /// frame callback collapses any burst into one reapplication.
    pub fn profile_apply_flag(&self) -> Rc<Cell<bool>> {
        self.pending_profile_apply.clone()
    }

    pub fn mode_cell(&self) -> Rc<Cell<QualityMode>> {
        self.mode.clone()
    }

    pub fn attach_scene(&mut self, scene: Box<dyn GameScene>) {
        self.scene = Some(scene);
    }

    pub fn hold_subscriptions(&mut self, subs: Vec<Subscription>) {
        self._subscriptions = subs;
    }

    /// One animation callback. Any fault inside the frame body lands in the
    /// single diagnostic slot; the loop itself reschedules regardless.
    pub fn frame(&mut self) {
        let now = Instant::now();
        let dt = clamp_frame_dt((now - self.last_instant).as_secs_f32());
        self.last_instant = now;
        let now_ms = dom::performance_now_ms();

        if let Err(err) = self.frame_body(dt, now_ms) {
            let fault = FrameFault {
                message: format!("{err:?}"),
                at_ms: now_ms,
                tier: self.perf.tier(),
                phase: self.fever.phase(),
            };
            log::warn!(
                "[frame] recovered from fault: {} (tier {}, phase {})",
                fault.message,
                fault.tier.as_str(),
                fault.phase.as_str()
            );
            self.last_fault = Some(fault);
        }
    }

    fn frame_body(&mut self, dt: f32, now_ms: f64) -> Result<(), JsValue> {
        self.viewport.pre_frame();

        let verdict = self.perf.record_frame(dt * 1000.0);
        if let Some(input_at) = self.input.consume_latest_input_at() {
            self.perf.record_input_latency(input_at, now_ms);
        }
        let mode = self.mode.get();
        if let Some(fixed) = mode.fixed_tier() {
            if self.perf.tier() != fixed {
                self.perf.set_tier(fixed);
            }
        } else if verdict.tier_changed {
            self.pending_profile_apply.set(true);
        }
        if self.pending_profile_apply.take() {
            self.apply_responsive_profile();
        }

        let snap = self.viewport.snapshot();
        let state = self.fever.visual_state(self.total_elapsed);
        let fever_sky = self.fever.is_running() || state.intensity > 0.05;
        self.background.draw(&self.viewport, &self.assets, fever_sky)?;
        draw::draw_fever_backdrop(
            self.viewport.ctx(),
            &self.fever,
            &state,
            &self.profile,
            self.total_elapsed,
            snap.logical_w,
            snap.logical_h,
        )?;

        if self.running && !self.paused {
            self.total_elapsed += dt as f64;

            let mut events = std::mem::take(&mut self.scene_events);
            events.clear();
            if let Some(scene) = self.scene.as_mut() {
                scene.update(dt, self.total_elapsed, &self.profile, &self.input, &mut events);
            }
            for event in events.drain(..) {
                match event {
                    SceneEvent::BonusCaught { x, y } => {
                        let at = Vec2::new(x, y);
                        let fever_events = self.fever.trigger_enter(self.total_elapsed, at);
                        emit_fever_events(&fever_events);
                        self.fever.trigger_hit(at, "#ffd670");
                        self.warm_pop_tint("#ffd670");
                    }
                    SceneEvent::BonusHit { x, y, color } => {
                        self.fever.trigger_hit(Vec2::new(x, y), color);
                        self.warm_pop_tint(color);
                    }
                }
            }
            self.scene_events = events;

            let p95 = self.perf.frame_p95_ms();
            let fever_events = self.fever.update(dt, self.total_elapsed, p95);
            emit_fever_events(&fever_events);
        }

        draw::draw_shooting_stars(
            self.viewport.ctx(),
            &self.fever,
            &self.assets,
            &mut self.raster,
            snap.render_scale,
            snap.logical_h,
        )?;
        if let Some(scene) = self.scene.as_mut() {
            scene.draw(self.viewport.ctx(), &self.profile, &snap)?;
        }
        draw::draw_hit_bursts(self.viewport.ctx(), &self.fever)?;
        draw::draw_sparks(self.viewport.ctx(), &self.fever)?;
        draw::draw_shockwaves(self.viewport.ctx(), &self.fever)?;
        Ok(())
    }

    /// Re-derive every size/density coefficient for the current device and
    /// tier, remapping live entity coordinates when the logical resolution
    /// changed.
    pub fn apply_responsive_profile(&mut self) {
        let Some((window, _document)) = dom::window_document() else {
            return;
        };
        let dpr = dom::device_pixel_ratio();
        let (touch_points, coarse_pointer) = settings::pointer_environment();
        let reduced_motion = settings::prefers_reduced_motion();
        let inner_w = window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(BASE_LOGICAL_W as f64) as f32;
        let inner_h = window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(BASE_LOGICAL_H as f64) as f32;

        let device = detect_device_class(touch_points, coarse_pointer, inner_w, dpr);
        let mode = self.mode.get();
        let tier = mode.fixed_tier().unwrap_or_else(|| self.perf.tier());

        let prev = self.viewport.snapshot();
        self.viewport.refresh_rect_cache();
        let css = self.viewport.snapshot();
        // Desktop simulates in a fixed space; touch devices track the CSS box.
        let (logical_w, logical_h) = if device == DeviceClass::Desktop {
            (BASE_LOGICAL_W, BASE_LOGICAL_H)
        } else {
            (css.css_w.max(320.0), css.css_h.max(180.0))
        };
        let snap = self.viewport.configure(&ViewportConfig {
            logical_w,
            logical_h,
            mode,
            tier,
        });

        let logical_changed = (snap.logical_w - prev.logical_w).abs() > 0.5
            || (snap.logical_h - prev.logical_h).abs() > 0.5;
        let scale_changed = (snap.render_scale - prev.render_scale).abs() > 1e-4;
        if logical_changed {
            self.background.invalidate();
            self.raster.clear_sprite_raster_cache();
            if let Some(remap) = ResizeRemap::between(
                prev.logical_w,
                prev.logical_h,
                snap.logical_w,
                snap.logical_h,
            ) {
                if !remap.is_identity() {
                    self.fever.rescale(&remap);
                    if let Some(scene) = self.scene.as_mut() {
                        scene.rescale(&remap);
                    }
                }
            }
        } else if scale_changed {
            // Raster buckets are keyed against the old backing resolution.
            self.raster.clear_sprite_raster_cache();
        }

        self.input.refresh_rect(self.viewport.canvas());
        self.input.set_logical_width(snap.logical_w);

        self.profile = compute_profile(&ProfileInputs {
            device,
            tier,
            reduced_motion,
            coarse_pointer,
            device_pixel_ratio: dpr,
            logical_w: snap.logical_w,
            logical_h: snap.logical_h,
            viewport_short_edge: inner_w.min(inner_h),
        });
        self.perf.set_render_scale(snap.render_scale);
        self.fever.set_profile(&self.profile);
        self.write_css_outputs();

        log::info!(
            "[profile] device={} tier={} logical={}x{} scale={:.2}",
            device.as_str(),
            tier.as_str(),
            snap.logical_w as u32,
            snap.logical_h as u32,
            snap.render_scale
        );
    }

    /// One-way output surface for layout/visual styling outside the canvas.
    fn write_css_outputs(&self) {
        let p = &self.profile;
        let root = &self.root;
        dom::set_root_css_prop(root, "--ui-scale", &format!("{:.3}", p.ui_scale));
        dom::set_root_css_prop(root, "--hud-scale", &format!("{:.3}", p.hud_scale));
        dom::set_root_css_prop(root, "--title-scale", &format!("{:.3}", p.title_scale));
        dom::set_root_css_prop(root, "--fx-density", &format!("{:.3}", p.fx_density));
        dom::set_root_css_prop(root, "--fruit-scale", &format!("{:.3}", p.fruit_scale));
        dom::set_root_css_prop(root, "--basket-scale", &format!("{:.3}", p.basket_scale));
        dom::set_root_css_prop(root, "--pause-scale", &format!("{:.3}", p.pause_scale));
        dom::set_root_css_prop(root, "--motion-scale", &format!("{:.3}", p.motion_scale));
        dom::set_root_css_prop(root, "--tap-target", &format!("{}px", p.tap_target_px));
        dom::set_root_css_prop(root, "--hud-inset-top", &format!("{}px", p.hud_inset_top_px));
        dom::set_root_css_prop(root, "--hud-inset-side", &format!("{}px", p.hud_inset_side_px));
        dom::set_root_attr(root, "data-device", p.device.as_str());
        dom::set_root_attr(
            root,
            "data-motion",
            if p.reduced_motion { "reduced" } else { "full" },
        );
        dom::set_root_attr(root, "data-quality-mode", self.mode.get().as_str());
        dom::set_root_attr(root, "data-quality-tier", p.tier.as_str());
    }

    /// Build the tint variant on the event frame so the pop draw that
    /// follows never stalls on pixel readback.
    fn warm_pop_tint(&mut self, color: &str) {
        if let Some(img) = self.assets.get("fx_fruit_pop") {
            let _ = self.raster.get_fruit_pop_tint_source(&img, color);
        }
    }

    fn prepare_session(&mut self) {
        self.running = false;
        self.paused = false;
        self.total_elapsed = 0.0;
        self.fever.clear();
        self.perf.reset();
        self.background.invalidate();
        if let Some(scene) = self.scene.as_mut() {
            scene.reset();
        }
    }

    fn start_running(&mut self) {
        self.running = true;
        self.paused = false;
        self.last_instant = Instant::now();
    }
}

fn emit_fever_events(events: &[FeverEvent]) {
    // Trigger surface for the audio/gameplay collaborators; nothing flows
    // back into the rendering core.
    for event in events {
        log::debug!("[fever] {event:?}");
    }
}

/// Start (or restart) a game session. Asset warmup runs asynchronously; the
/// session ticket discards completions that a newer session superseded.
pub fn begin_session(frame_ctx: &Rc<RefCell<FrameContext>>) {
    let (assets, ticket) = {
        let ctx = frame_ctx.borrow();
        (ctx.assets.clone(), ctx.assets.begin_session())
    };
    frame_ctx.borrow_mut().prepare_session();

    let frame_ctx = frame_ctx.clone();
    wasm_bindgen_futures::spawn_local(async move {
        let fresh = assets::warmup(assets, ticket).await;
        let mut ctx = frame_ctx.borrow_mut();
        if !fresh || ctx.assets.current_session() != ticket {
            log::info!("[session] discarding stale warmup (ticket {ticket})");
            return;
        }
        ctx.start_running();
        log::info!("[session] started (ticket {ticket})");
    });
}

/// Drive [`FrameContext::frame`] from requestAnimationFrame. The closure
/// reschedules unconditionally, so a faulting frame never stops the loop.
pub fn start_loop(frame_ctx: Rc<RefCell<FrameContext>>) {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let tick_clone = tick.clone();
    let frame_ctx_tick = frame_ctx.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        frame_ctx_tick.borrow_mut().frame();
        if let Some(w) = web::window() {
            let _ = w.request_animation_frame(
                tick_clone
                    .borrow()
                    .as_ref()
                    .unwrap()
                    .as_ref()
                    .unchecked_ref(),
            );
        }
    }) as Box<dyn FnMut()>));
    if let Some(w) = web::window() {
        let _ = w.request_animation_frame(tick.borrow().as_ref().unwrap().as_ref().unchecked_ref());
    }
}
