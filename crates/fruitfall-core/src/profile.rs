//! Responsive profile: a pure function from (device class, quality tier,
//! motion preference, pointer coarseness) to the coefficient bundle every
//! drawing subsystem reads.
//!
//! Each coefficient is clamped independently so no input combination can
//! drive a visual to zero or to a runaway multiplier. Device class, DPR and
//! tier all discount FX density multiplicatively, so degradation compounds
//! predictably under combined device + load pressure.

use crate::constants::{BASE_BASKET_W, BASE_LOGICAL_H, BASE_LOGICAL_W};
use crate::quality::QualityTier;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Tablet => "tablet",
            DeviceClass::Desktop => "desktop",
        }
    }

    pub fn preset(self) -> DevicePreset {
        match self {
            DeviceClass::Mobile => DevicePreset {
                ui_scale: 0.86,
                hud_scale: 0.83,
                title_scale: 0.84,
                fx_density: 0.56,
                fruit_scale: 1.05,
                basket_scale: 0.61,
                pause_scale: 0.78,
                cloud_scale: 1.5,
                tap_target_px: 44.0,
            },
            DeviceClass::Tablet => DevicePreset {
                ui_scale: 0.95,
                hud_scale: 0.91,
                title_scale: 0.93,
                fx_density: 0.78,
                fruit_scale: 1.02,
                basket_scale: 0.96,
                pause_scale: 0.90,
                cloud_scale: 1.0,
                tap_target_px: 42.0,
            },
            DeviceClass::Desktop => DevicePreset {
                ui_scale: 1.0,
                hud_scale: 1.0,
                title_scale: 1.0,
                fx_density: 1.0,
                fruit_scale: 1.0,
                basket_scale: 1.0,
                pause_scale: 1.0,
                cloud_scale: 1.0,
                tap_target_px: 40.0,
            },
        }
    }
}

/// Per-class baseline coefficients.
#[derive(Clone, Copy, Debug)]
pub struct DevicePreset {
    pub ui_scale: f32,
    pub hud_scale: f32,
    pub title_scale: f32,
    pub fx_density: f32,
    pub fruit_scale: f32,
    pub basket_scale: f32,
    pub pause_scale: f32,
    pub cloud_scale: f32,
    pub tap_target_px: f32,
}

/// Touch capability + viewport width + DPR heuristic. Narrow viewports read
/// as mobile even without touch; mid-width high-DPR screens read as tablet.
pub fn detect_device_class(
    touch_points: u32,
    coarse_pointer: bool,
    viewport_w: f32,
    dpr: f32,
) -> DeviceClass {
    let touch_capable = touch_points > 0 || coarse_pointer;
    if (touch_capable && viewport_w <= 760.0) || viewport_w <= 430.0 {
        return DeviceClass::Mobile;
    }
    if (touch_capable && viewport_w <= 1180.0) || (viewport_w <= 1024.0 && dpr >= 1.25) {
        return DeviceClass::Tablet;
    }
    DeviceClass::Desktop
}

/// Everything the profile computation needs, gathered by the frontend.
#[derive(Clone, Copy, Debug)]
pub struct ProfileInputs {
    pub device: DeviceClass,
    pub tier: QualityTier,
    pub reduced_motion: bool,
    pub coarse_pointer: bool,
    pub device_pixel_ratio: f32,
    pub logical_w: f32,
    pub logical_h: f32,
    /// Shorter edge of the window, for HUD inset anchoring.
    pub viewport_short_edge: f32,
}

/// Immutable coefficient bundle; superseded wholesale on recompute.
#[derive(Clone, Copy, Debug)]
pub struct ResponsiveProfileSnapshot {
    pub device: DeviceClass,
    pub tier: QualityTier,
    pub reduced_motion: bool,
    pub logical_w: f32,
    pub logical_h: f32,
    pub ui_scale: f32,
    pub hud_scale: f32,
    pub title_scale: f32,
    pub fx_density: f32,
    pub particle_density: f32,
    pub fruit_scale: f32,
    pub basket_scale: f32,
    pub basket_w: f32,
    pub basket_h: f32,
    pub fruit_radius_min: f32,
    pub fruit_radius_max: f32,
    pub pause_scale: f32,
    pub tap_target_px: f32,
    pub motion_scale: f32,
    pub background_motion_scale: f32,
    pub rotation_motion_scale: f32,
    pub float_text_scale: f32,
    pub cloud_scale: f32,
    pub hud_inset_top_px: f32,
    pub hud_inset_side_px: f32,
}

impl Default for ResponsiveProfileSnapshot {
    fn default() -> Self {
        compute_profile(&ProfileInputs {
            device: DeviceClass::Desktop,
            tier: QualityTier::Quality,
            reduced_motion: false,
            coarse_pointer: false,
            device_pixel_ratio: 1.0,
            logical_w: BASE_LOGICAL_W,
            logical_h: BASE_LOGICAL_H,
            viewport_short_edge: BASE_LOGICAL_H,
        })
    }
}

pub fn compute_profile(inputs: &ProfileInputs) -> ResponsiveProfileSnapshot {
    let preset = inputs.device.preset();
    let dpr = inputs.device_pixel_ratio;

    let dpr_fx_penalty = if dpr >= 3.0 {
        0.90
    } else if dpr >= 2.0 {
        0.95
    } else {
        1.0
    };
    let reduced_fx_mul = if inputs.reduced_motion {
        match inputs.device {
            DeviceClass::Mobile => 0.50,
            DeviceClass::Tablet => 0.58,
            DeviceClass::Desktop => 0.64,
        }
    } else {
        1.0
    };
    let tier_fx_mul = match inputs.tier {
        QualityTier::Performance => 0.72,
        QualityTier::Balanced => 0.88,
        QualityTier::Quality => 1.0,
    };
    let motion_scale = if inputs.reduced_motion {
        if inputs.device == DeviceClass::Mobile {
            0.45
        } else {
            0.55
        }
    } else {
        1.0
    };

    let pointer_bump = if inputs.coarse_pointer { 1.02 } else { 1.0 };
    let hud_scale = (preset.hud_scale * pointer_bump).clamp(0.78, 1.08);
    let ui_scale =
        (preset.ui_scale * if inputs.coarse_pointer { 1.01 } else { 1.0 }).clamp(0.80, 1.10);
    let fx_density =
        (preset.fx_density * dpr_fx_penalty * reduced_fx_mul * tier_fx_mul).clamp(0.14, 1.0);
    let particle_density =
        (fx_density * if inputs.reduced_motion { 0.65 } else { 0.92 }).clamp(0.14, 1.06);
    let pause_scale = (preset.pause_scale * motion_scale).clamp(0.62, 1.02);
    let tap_target_px = preset.tap_target_px.max(if inputs.coarse_pointer {
        44.0
    } else {
        preset.tap_target_px
    });

    let tier_motion_mul = match inputs.tier {
        QualityTier::Performance => 0.72,
        QualityTier::Balanced => 0.88,
        QualityTier::Quality => 1.0,
    };
    let background_motion_scale = (motion_scale
        * if inputs.reduced_motion { 0.88 } else { 1.0 }
        * tier_motion_mul)
        .clamp(0.26, 1.0);
    let rotation_motion_scale =
        (motion_scale * if inputs.reduced_motion { 0.78 } else { 1.0 }).clamp(0.28, 1.0);
    let float_text_scale = ui_scale.clamp(0.82, 1.05);

    // One viewport-based rule keeps the HUD anchor stable across devices.
    let short_edge = inputs.viewport_short_edge.max(320.0);
    let hud_inset_top_px = (short_edge * 0.017).clamp(8.0, 14.0).round();
    let hud_inset_side_px = (short_edge * 0.015).clamp(8.0, 14.0).round();

    let basket_w = BASE_BASKET_W * preset.basket_scale;
    let fruit_base_diameter = basket_w * 0.75;
    let fruit_radius_min = (fruit_base_diameter * 0.90 * preset.fruit_scale) / 2.0;
    let fruit_radius_max = (fruit_base_diameter * 1.10 * preset.fruit_scale) / 2.0;

    ResponsiveProfileSnapshot {
        device: inputs.device,
        tier: inputs.tier,
        reduced_motion: inputs.reduced_motion,
        logical_w: inputs.logical_w.max(1.0),
        logical_h: inputs.logical_h.max(1.0),
        ui_scale,
        hud_scale,
        title_scale: preset.title_scale,
        fx_density,
        particle_density,
        fruit_scale: preset.fruit_scale,
        basket_scale: preset.basket_scale,
        basket_w,
        basket_h: crate::constants::BASE_BASKET_H * preset.basket_scale,
        fruit_radius_min,
        fruit_radius_max,
        pause_scale,
        tap_target_px,
        motion_scale,
        background_motion_scale,
        rotation_motion_scale,
        float_text_scale,
        cloud_scale: preset.cloud_scale,
        hud_inset_top_px,
        hud_inset_side_px,
    }
}

/// Proportional coordinate remap applied to live entities when the logical
/// resolution changes. A remap, not a re-simulation: gameplay state survives
/// a resize.
#[derive(Clone, Copy, Debug)]
pub struct ResizeRemap {
    pub scale_x: f32,
    pub scale_y: f32,
}

impl ResizeRemap {
    pub fn between(prev_w: f32, prev_h: f32, next_w: f32, next_h: f32) -> Option<Self> {
        let scale_x = next_w / prev_w.max(1.0);
        let scale_y = next_h / prev_h.max(1.0);
        if !(scale_x.is_finite() && scale_y.is_finite()) || scale_x <= 0.0 || scale_y <= 0.0 {
            return None;
        }
        Some(Self { scale_x, scale_y })
    }

    /// Uniform scale for radii and widths.
    #[inline]
    pub fn min_scale(&self) -> f32 {
        self.scale_x.min(self.scale_y)
    }

    pub fn is_identity(&self) -> bool {
        (self.scale_x - 1.0).abs() < 1e-6 && (self.scale_y - 1.0).abs() < 1e-6
    }
}
