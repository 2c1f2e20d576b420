// Shared tuning constants used by the core systems and the web frontend.

// Logical simulation space
pub const BASE_LOGICAL_W: f32 = 1280.0; // fixed desktop simulation width
pub const BASE_LOGICAL_H: f32 = 720.0;
pub const BASE_BASKET_W: f32 = 240.0;
pub const BASE_BASKET_H: f32 = 62.0;

// Frame pacing
pub const MAX_FRAME_DT: f32 = 0.033; // cap on simulated seconds per frame

// Fever timing
pub const FEVER_DURATION_SEC: f64 = 10.0;
pub const FEVER_ENTER_DURATION: f32 = 0.82;
pub const FEVER_EXIT_DURATION: f32 = 0.56;
pub const FEVER_ENTER_DURATION_REDUCED: f32 = 0.64; // prefers-reduced-motion
pub const FEVER_EXIT_DURATION_REDUCED: f32 = 0.44;

// Shooting stars
pub const SHOOTING_STAR_MAX_ACTIVE: usize = 4;
pub const SHOOTING_STAR_INTERVAL: f32 = 0.75; // seconds between spawn attempts
pub const METEOR_FLOOR_FRACTION: f32 = 2.0 / 3.0; // stars never cross this height

/// Clamp a wall-clock frame delta so a suspended tab or a single stalled
/// frame cannot produce a large simulation jump.
#[inline]
pub fn clamp_frame_dt(dt_sec: f32) -> f32 {
    if !dt_sec.is_finite() || dt_sec < 0.0 {
        return 0.0;
    }
    dt_sec.min(MAX_FRAME_DT)
}

#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let p = t.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

#[inline]
pub fn ease_in_cubic(t: f32) -> f32 {
    let p = t.clamp(0.0, 1.0);
    p * p * p
}
