//! Viewport math: logical-to-physical scale selection and aspect correction.
//!
//! Pure functions only; the web crate owns the canvas and applies these to
//! the backing store and the 2D transform.

use crate::quality::{QualityMode, QualityTier};

pub const DRAW_FIX_MIN: f32 = 0.55;
pub const DRAW_FIX_MAX: f32 = 1.65;

/// Cap the device-pixel-ratio by the user's mode, or by the live tier when
/// the mode is `Auto`. Fixed modes get tier-independent ceilings so a pinned
/// mode keeps its fidelity while the tier still shapes everything else.
pub fn render_scale_cap(mode: QualityMode, tier: QualityTier, dpr: f32) -> f32 {
    let dpr = if dpr.is_finite() { dpr.max(1.0) } else { 1.0 };
    let cap = match mode {
        QualityMode::Quality => 3.0,
        QualityMode::Balanced => 2.5,
        QualityMode::Performance => 1.75,
        QualityMode::Auto => match tier {
            QualityTier::Quality => 2.5,
            QualityTier::Balanced => 2.25,
            QualityTier::Performance => 1.75,
        },
    };
    dpr.min(cap)
}

/// Physical backing-store extent for one axis.
#[inline]
pub fn physical_extent(logical: f32, render_scale: f32) -> u32 {
    (logical * render_scale).round().max(1.0) as u32
}

/// Corrective Y multiplier for the mismatch between the displayed (CSS)
/// aspect ratio and the fixed logical aspect ratio, clamped so a degenerate
/// container cannot flatten or stretch the scene into unreadability.
pub fn draw_fix_scale_y(css_w: f32, css_h: f32, logical_w: f32, logical_h: f32) -> f32 {
    let sx = css_w / logical_w.max(1.0);
    let sy = css_h / logical_h.max(1.0);
    if !(sx.is_finite() && sy.is_finite()) || sx <= 0.0 || sy <= 0.0 {
        return 1.0;
    }
    (sx / sy).clamp(DRAW_FIX_MIN, DRAW_FIX_MAX)
}

/// Resolved viewport parameters, recomputed by `configure` and consumed
/// read-only by drawing code.
#[derive(Clone, Copy, Debug)]
pub struct ViewportSnapshot {
    pub logical_w: f32,
    pub logical_h: f32,
    pub css_w: f32,
    pub css_h: f32,
    pub render_scale: f32,
    pub device_pixel_ratio: f32,
    pub draw_fix_scale_y: f32,
}

impl Default for ViewportSnapshot {
    fn default() -> Self {
        Self {
            logical_w: crate::constants::BASE_LOGICAL_W,
            logical_h: crate::constants::BASE_LOGICAL_H,
            css_w: crate::constants::BASE_LOGICAL_W,
            css_h: crate::constants::BASE_LOGICAL_H,
            render_scale: 1.0,
            device_pixel_ratio: 1.0,
            draw_fix_scale_y: 1.0,
        }
    }
}
