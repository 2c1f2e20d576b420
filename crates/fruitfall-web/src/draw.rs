//! Draw passes for the background and the fever effect layers.
//!
//! Everything here consumes the intensity scalar and the pool slices
//! read-only; pool mutation happens only in the frame-ordered update.

use crate::assets::{AssetStore, METEOR_VARIANTS};
use crate::raster::AssetRasterCache;
use crate::viewport::{Layer, ViewportRenderer};
use fruitfall_core::{
    ease_in_cubic, ease_out_cubic, FeverFx, FeverPhase, FeverVisualState,
    ResponsiveProfileSnapshot, SparkMode, WaveMode, METEOR_FLOOR_FRACTION,
};
use std::f64::consts::TAU;
use wasm_bindgen::JsValue;

const SPARK_TONES: [&str; 3] = ["#ffe18f", "#ff8cbf", "#8bc9ff"];
const STREAM_TONES: [&str; 3] = ["#86d8ff", "#9ea7ff", "#ffd2fb"];
const WAVE_TONES: [&str; 2] = ["255,255,255", "255,211,106"];

/// Static sky composition, re-rendered into an off-screen layer only when its
/// key (logical size + sky variant) changes.
pub struct BackgroundCache {
    layer: Option<Layer>,
    key: String,
}

impl BackgroundCache {
    pub fn new() -> Self {
        Self {
            layer: None,
            key: String::new(),
        }
    }

    pub fn invalidate(&mut self) {
        self.layer = None;
        self.key.clear();
    }

    pub fn draw(
        &mut self,
        viewport: &ViewportRenderer,
        assets: &AssetStore,
        fever_sky: bool,
    ) -> Result<(), JsValue> {
        let snap = viewport.snapshot();
        let (w, h) = (snap.logical_w, snap.logical_h);
        let sprite = if fever_sky {
            "background_fever_sky"
        } else {
            "background_day_sky"
        };
        let key = format!("{}x{}:{}", w as u32, h as u32, sprite);
        if self.layer.is_none() || self.key != key {
            if let Some(layer) = viewport.create_layer(w, h) {
                compose_sky(&layer.ctx, w, h, assets.get(sprite).as_ref(), fever_sky)?;
                self.layer = Some(layer);
                self.key = key;
            }
        }
        match &self.layer {
            Some(layer) => viewport
                .ctx()
                .draw_image_with_html_canvas_element_and_dw_and_dh(
                    &layer.canvas,
                    0.0,
                    0.0,
                    w as f64,
                    h as f64,
                ),
            // Layer allocation failed: fall back to composing directly.
            None => compose_sky(viewport.ctx(), w, h, assets.get(sprite).as_ref(), fever_sky),
        }
    }
}

fn compose_sky(
    ctx: &web_sys::CanvasRenderingContext2d,
    w: f32,
    h: f32,
    image: Option<&web_sys::HtmlImageElement>,
    fever_sky: bool,
) -> Result<(), JsValue> {
    let (w, h) = (w as f64, h as f64);
    let sky = ctx.create_linear_gradient(0.0, 0.0, 0.0, h);
    if fever_sky {
        sky.add_color_stop(0.0, "#2e1d71")?;
        sky.add_color_stop(0.34, "#6331ae")?;
        sky.add_color_stop(0.68, "#a73fbe")?;
        sky.add_color_stop(1.0, "#5a73cf")?;
    } else {
        sky.add_color_stop(0.0, "#8fd3ff")?;
        sky.add_color_stop(0.62, "#c9ecff")?;
        sky.add_color_stop(1.0, "#f2fbff")?;
    }
    ctx.set_fill_style_canvas_gradient(&sky);
    ctx.fill_rect(0.0, 0.0, w, h);

    if let Some(img) = image {
        ctx.save();
        ctx.set_global_alpha(0.92);
        ctx.draw_image_with_html_image_element_and_dw_and_dh(img, 0.0, 0.0, w, h)?;
        ctx.restore();
    }
    Ok(())
}

pub fn draw_fever_backdrop(
    ctx: &web_sys::CanvasRenderingContext2d,
    fx: &FeverFx,
    state: &FeverVisualState,
    profile: &ResponsiveProfileSnapshot,
    now_sec: f64,
    w: f32,
    h: f32,
) -> Result<(), JsValue> {
    if state.intensity <= 0.001 {
        return Ok(());
    }
    let (w, h) = (w as f64, h as f64);
    let intensity = state.intensity as f64;
    let pulse_freq = if profile.reduced_motion { 4.3 } else { 6.4 };
    let pulse = 0.5
        + 0.5
            * (now_sec * pulse_freq * profile.background_motion_scale as f64
                + fx.hit_pulse() as f64 * 2.0)
                .sin();
    let (cx, cy) = if state.phase == FeverPhase::Enter {
        (fx.origin().x as f64, fx.origin().y as f64)
    } else {
        (w * 0.5, h * 0.34)
    };

    ctx.save();
    let wash = ctx.create_linear_gradient(0.0, 0.0, w, h);
    wash.add_color_stop(0.0, "rgba(88,136,255,.38)")?;
    wash.add_color_stop(0.55, "rgba(152,112,255,.33)")?;
    wash.add_color_stop(1.0, "rgba(89,232,255,.34)")?;
    ctx.set_global_alpha((0.10 + pulse * 0.10) * intensity);
    ctx.set_fill_style_canvas_gradient(&wash);
    ctx.fill_rect(0.0, 0.0, w, h);
    ctx.restore();

    ctx.save();
    let aura = ctx.create_radial_gradient(cx, cy, (w * 0.03).max(24.0), cx, cy, w * 0.52)?;
    aura.add_color_stop(0.0, "rgba(235,246,255,0.62)")?;
    aura.add_color_stop(0.24, "rgba(141,213,255,0.42)")?;
    aura.add_color_stop(0.56, "rgba(188,140,255,0.22)")?;
    aura.add_color_stop(1.0, "rgba(103,184,255,0)")?;
    ctx.set_global_alpha((0.14 + pulse * 0.12) * intensity);
    ctx.set_fill_style_canvas_gradient(&aura);
    ctx.fill_rect(0.0, 0.0, w, h);
    ctx.restore();

    let dynamic_fx = fx.runtime_fx_density() as f64;
    let stream_alpha = ((0.08 + intensity * 0.16) * (0.5 + dynamic_fx * 0.5)).min(0.34);
    if stream_alpha > 0.01 && !fx.streams().is_empty() {
        let motion = profile.background_motion_scale as f64;
        ctx.save();
        let _ = ctx.set_global_composite_operation("lighter");
        for s in fx.streams() {
            let travel = (now_sec * (92.0 + s.speed as f64 * 86.0) * motion
                + s.seed as f64 * 0.73)
                .rem_euclid(w + s.len as f64 * 2.0);
            let x = travel - s.len as f64;
            let y = h * s.lane as f64
                + (now_sec * 1.6 * s.speed as f64 + s.seed as f64).sin()
                    * s.amp as f64
                    * (0.2 + intensity * 0.8);
            ctx.set_global_alpha(stream_alpha * (0.6 + (s.tone % 3) as f64 * 0.14));
            ctx.set_stroke_style_str(STREAM_TONES[s.tone as usize % STREAM_TONES.len()]);
            ctx.set_line_width(s.width as f64 * (0.68 + intensity * 0.34));
            ctx.begin_path();
            ctx.move_to(x, y);
            ctx.line_to(x + s.len as f64, y - s.amp as f64 * 0.2);
            ctx.stroke();
        }
        ctx.restore();
    }

    if fx.flash() > 0.001 {
        ctx.save();
        ctx.set_global_alpha(
            fx.flash() as f64 * if profile.reduced_motion { 0.14 } else { 0.26 },
        );
        ctx.set_fill_style_str("#ddf5ff");
        ctx.fill_rect(0.0, 0.0, w, h);
        ctx.restore();
    }
    Ok(())
}

pub fn draw_shockwaves(
    ctx: &web_sys::CanvasRenderingContext2d,
    fx: &FeverFx,
) -> Result<(), JsValue> {
    if fx.shockwaves().is_empty() {
        return Ok(());
    }
    let density = fx.runtime_fx_density() as f64;
    ctx.save();
    let _ = ctx.set_global_composite_operation("lighter");
    for wave in fx.shockwaves() {
        if wave.age < 0.0 {
            continue;
        }
        let p = (wave.age / wave.life).clamp(0.0, 1.0);
        let k = match wave.mode {
            WaveMode::Collapse => ease_in_cubic(p),
            WaveMode::Expand => ease_out_cubic(p),
        };
        let radius = wave.start_r + (wave.end_r - wave.start_r) * k;
        let base = if wave.mode == WaveMode::Collapse {
            0.46
        } else {
            0.58
        };
        let alpha = (1.0 - p) as f64 * base * (0.45 + density * 0.55);
        if alpha <= 0.01 {
            continue;
        }
        ctx.set_global_alpha(alpha);
        ctx.set_stroke_style_str(&format!(
            "rgba({}, 1)",
            WAVE_TONES[wave.tone as usize % WAVE_TONES.len()]
        ));
        ctx.set_line_width((wave.width * (1.0 - p * 0.78)).max(1.4) as f64);
        ctx.begin_path();
        ctx.arc(wave.pos.x as f64, wave.pos.y as f64, radius.max(0.0) as f64, 0.0, TAU)?;
        ctx.stroke();
    }
    ctx.restore();
    Ok(())
}

pub fn draw_sparks(
    ctx: &web_sys::CanvasRenderingContext2d,
    fx: &FeverFx,
) -> Result<(), JsValue> {
    if fx.sparks().is_empty() {
        return Ok(());
    }
    ctx.save();
    let _ = ctx.set_global_composite_operation("lighter");
    for s in fx.sparks() {
        let life_k = 1.0 - s.age / s.life;
        if life_k <= 0.0 {
            continue;
        }
        let trail = if s.mode == SparkMode::Converge {
            0.020
        } else {
            0.03
        };
        let tail = s.pos - s.vel * trail;
        ctx.set_global_alpha(life_k as f64 * if s.mode == SparkMode::Hit { 0.88 } else { 0.76 });
        let tone = SPARK_TONES[s.tone as usize % SPARK_TONES.len()];
        ctx.set_stroke_style_str(tone);
        ctx.set_line_width((s.size * life_k).max(1.1) as f64);
        ctx.begin_path();
        ctx.move_to(tail.x as f64, tail.y as f64);
        ctx.line_to(s.pos.x as f64, s.pos.y as f64);
        ctx.stroke();
        if s.mode == SparkMode::Hit {
            ctx.begin_path();
            ctx.arc(
                s.pos.x as f64,
                s.pos.y as f64,
                (s.size * life_k * 0.75) as f64,
                0.0,
                TAU,
            )?;
            ctx.set_fill_style_str(tone);
            ctx.fill();
        }
    }
    ctx.restore();
    Ok(())
}

pub fn draw_hit_bursts(
    ctx: &web_sys::CanvasRenderingContext2d,
    fx: &FeverFx,
) -> Result<(), JsValue> {
    if fx.hit_bursts().is_empty() {
        return Ok(());
    }
    ctx.save();
    let _ = ctx.set_global_composite_operation("lighter");
    for hb in fx.hit_bursts() {
        let p = (hb.age / hb.life).clamp(0.0, 1.0);
        let life_k = 1.0 - p;
        if life_k <= 0.0 {
            continue;
        }
        let ring_r = hb.r0 + (hb.r1 - hb.r0) * ease_out_cubic(p);
        ctx.set_global_alpha(life_k as f64 * 0.66);
        ctx.set_stroke_style_str(&hb.color.key);
        ctx.set_line_width((7.0 * life_k).max(1.2) as f64);
        ctx.begin_path();
        ctx.arc(hb.pos.x as f64, hb.pos.y as f64, ring_r as f64, 0.0, TAU)?;
        ctx.stroke();

        let cross = (6.0 + ring_r * 0.24) as f64;
        let (x, y) = (hb.pos.x as f64, hb.pos.y as f64);
        ctx.set_line_width((4.0 * life_k).max(1.0) as f64);
        ctx.begin_path();
        ctx.move_to(x - cross, y);
        ctx.line_to(x + cross, y);
        ctx.move_to(x, y - cross);
        ctx.line_to(x, y + cross);
        ctx.stroke();
    }
    ctx.restore();
    Ok(())
}

pub fn draw_shooting_stars(
    ctx: &web_sys::CanvasRenderingContext2d,
    fx: &FeverFx,
    assets: &AssetStore,
    raster: &mut AssetRasterCache,
    dpr: f32,
    logical_h: f32,
) -> Result<(), JsValue> {
    if fx.stars().is_empty() {
        return Ok(());
    }
    let floor_y = (logical_h * METEOR_FLOOR_FRACTION) as f64;
    ctx.save();
    let _ = ctx.set_global_composite_operation("lighter");
    for s in fx.stars() {
        let life_t = (s.age / s.life).clamp(0.0, 1.0);
        let life_k = 1.0 - life_t;
        if life_k <= 0.0 {
            continue;
        }
        let depth_scale = 1.0 - life_t * (1.0 - s.end_scale);
        let draw_size = (s.size * depth_scale).round().max(1.0);

        let sprite_key = METEOR_VARIANTS[s.variant as usize % METEOR_VARIANTS.len()];
        let entry = assets
            .get(sprite_key)
            .and_then(|img| raster.get_sprite_raster(sprite_key, &img, draw_size, draw_size, dpr));
        let (draw_w, draw_h) = entry
            .as_ref()
            .map(|e| (e.draw_w as f64, e.draw_h as f64))
            .unwrap_or((draw_size as f64, draw_size as f64));
        if s.pos.y as f64 + draw_h * 0.5 >= floor_y {
            continue;
        }

        ctx.save();
        let _ = ctx.translate(s.pos.x as f64, s.pos.y as f64);
        let _ = ctx.rotate(s.rotation as f64);
        ctx.set_global_alpha(life_k as f64 * 0.92);
        match entry {
            Some(e) => {
                ctx.draw_image_with_html_canvas_element_and_dw_and_dh(
                    &e.canvas,
                    -draw_w * 0.5,
                    -draw_h * 0.5,
                    draw_w,
                    draw_h,
                )?;
            }
            // Sprite still decoding or failed: procedural star keeps the
            // effect visible at lower fidelity.
            None => draw_procedural_star(ctx, draw_size as f64 * 0.5)?,
        }
        ctx.restore();
    }
    ctx.restore();
    Ok(())
}

fn draw_procedural_star(
    ctx: &web_sys::CanvasRenderingContext2d,
    radius: f64,
) -> Result<(), JsValue> {
    let inner = radius * 0.46;
    ctx.begin_path();
    for i in 0..10 {
        let r = if i % 2 == 0 { radius } else { inner };
        let angle = -TAU / 4.0 + TAU * i as f64 / 10.0;
        let (x, y) = (angle.cos() * r, angle.sin() * r);
        if i == 0 {
            ctx.move_to(x, y);
        } else {
            ctx.line_to(x, y);
        }
    }
    ctx.close_path();
    ctx.set_fill_style_str("#ffd670");
    ctx.fill();
    ctx.set_line_width(1.5);
    ctx.set_stroke_style_str("#fffdf4");
    ctx.stroke();
    Ok(())
}
