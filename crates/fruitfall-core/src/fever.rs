//! Fever-mode visual state machine and its particle pools.
//!
//! Four phases (idle → enter → active → exit → idle). The single signal the
//! background renderer consumes is the continuous `intensity` scalar; the
//! discrete phase only matters for spawning and for collaborator events.
//! Every pool is retired in place each update; that per-frame removal pass
//! is the only memory bound.

use crate::constants::*;
use crate::profile::{ResizeRemap, ResponsiveProfileSnapshot};
use crate::raster::{parse_hex_color, TintColor};
use glam::Vec2;
use rand::prelude::*;
use smallvec::SmallVec;
use std::f32::consts::TAU;

// Intensity curve. The active baseline equals the enter curve's endpoint so
// the enter→active hand-off is continuous.
const ENTER_INTENSITY_BASE: f32 = 0.48;
const ENTER_INTENSITY_SPAN: f32 = 0.56;
const ACTIVE_INTENSITY_BASE: f32 = ENTER_INTENSITY_BASE + ENTER_INTENSITY_SPAN;
const EXIT_INTENSITY_BASE: f32 = 0.92;
const INTENSITY_MAX: f32 = 1.24;
const HIT_PULSE_MAX: f32 = 1.25;

// Runtime FX quality follows a frame-p95-derived target with a ~240 ms time
// constant, smoothing sudden density drops.
const FX_QUALITY_APPROACH_PER_SEC: f32 = 4.2;
const FX_QUALITY_MIN: f32 = 0.58;

const SPARK_GRAVITY: f32 = 320.0;
const STAR_CULL_MARGIN: f32 = 48.0;
const DEFAULT_HIT_COLOR: &str = "#ffd670";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeverPhase {
    Idle,
    Enter,
    Active,
    Exit,
}

impl FeverPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            FeverPhase::Idle => "idle",
            FeverPhase::Enter => "enter",
            FeverPhase::Active => "active",
            FeverPhase::Exit => "exit",
        }
    }
}

/// Continuous view of the state machine at a point in time.
#[derive(Clone, Copy, Debug)]
pub struct FeverVisualState {
    pub phase: FeverPhase,
    pub intensity: f32,
    pub enter_t: f32,
    pub exit_t: f32,
}

/// Phase-transition notifications for the audio/gameplay collaborators.
/// No data flows back: these are trigger events only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeverEvent {
    EnterStarted,
    ActiveStarted,
    ExitStarted,
    Ended,
}

pub type FeverEvents = SmallVec<[FeverEvent; 4]>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveMode {
    Expand,
    Collapse,
}

/// Radial ring spawned on phase entry/exit.
#[derive(Clone, Debug)]
pub struct Shockwave {
    pub pos: Vec2,
    /// Negative at spawn for staggered rings; drawn only once non-negative.
    pub age: f32,
    pub life: f32,
    pub start_r: f32,
    pub end_r: f32,
    pub width: f32,
    /// 0 = white, 1 = amber.
    pub tone: u8,
    pub mode: WaveMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SparkMode {
    Burst,
    Converge,
    Hit,
}

#[derive(Clone, Debug)]
pub struct Spark {
    pub pos: Vec2,
    pub vel: Vec2,
    pub age: f32,
    pub life: f32,
    pub size: f32,
    pub tone: u8,
    pub mode: SparkMode,
}

/// Expanding ring + cross flash at a bonus-catch point.
#[derive(Clone, Debug)]
pub struct HitBurst {
    pub pos: Vec2,
    pub age: f32,
    pub life: f32,
    pub r0: f32,
    pub r1: f32,
    pub color: TintColor,
}

#[derive(Clone, Debug)]
pub struct ShootingStar {
    pub pos: Vec2,
    pub vel: Vec2,
    pub age: f32,
    pub life: f32,
    /// Sprite variant index (three meteor faces).
    pub variant: u8,
    pub size: f32,
    pub end_scale: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
}

/// Horizontal ambient streak; position is derived from time, so the entry
/// itself never ages out — the pool is rebuilt on profile changes instead.
#[derive(Clone, Debug)]
pub struct Stream {
    pub lane: f32,
    pub seed: f32,
    pub speed: f32,
    pub len: f32,
    pub width: f32,
    pub amp: f32,
    pub tone: u8,
}

pub struct FeverFx {
    phase: FeverPhase,
    phase_start: f64,
    enter_duration: f32,
    exit_duration: f32,
    origin: Vec2,
    flash: f32,
    hit_pulse: f32,
    /// Game-time deadline; `active → exit` follows from time alone.
    fever_until: f64,
    runtime_fx_quality: f32,
    star_timer: f32,

    shockwaves: Vec<Shockwave>,
    sparks: Vec<Spark>,
    hit_bursts: Vec<HitBurst>,
    stars: Vec<ShootingStar>,
    streams: Vec<Stream>,

    rng: StdRng,

    // profile-derived
    bounds: Vec2,
    fx_density: f32,
    reduced_motion: bool,
    star_size: f32,
}

impl FeverFx {
    pub fn new(seed: u64) -> Self {
        let mut fx = Self {
            phase: FeverPhase::Idle,
            phase_start: 0.0,
            enter_duration: FEVER_ENTER_DURATION,
            exit_duration: FEVER_EXIT_DURATION,
            origin: Vec2::new(BASE_LOGICAL_W * 0.5, BASE_LOGICAL_H * 0.35),
            flash: 0.0,
            hit_pulse: 0.0,
            fever_until: 0.0,
            runtime_fx_quality: 1.0,
            star_timer: 0.0,
            shockwaves: Vec::new(),
            sparks: Vec::new(),
            hit_bursts: Vec::new(),
            stars: Vec::new(),
            streams: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            bounds: Vec2::new(BASE_LOGICAL_W, BASE_LOGICAL_H),
            fx_density: 1.0,
            reduced_motion: false,
            star_size: 56.0,
        };
        fx.rebuild_streams();
        fx
    }

    pub fn phase(&self) -> FeverPhase {
        self.phase
    }

    /// Whether the fever multiplier window is open (enter or active).
    pub fn is_running(&self) -> bool {
        matches!(self.phase, FeverPhase::Enter | FeverPhase::Active)
    }

    pub fn remaining(&self, now: f64) -> f64 {
        if self.is_running() {
            (self.fever_until - now).max(0.0)
        } else {
            0.0
        }
    }

    pub fn flash(&self) -> f32 {
        self.flash
    }

    pub fn hit_pulse(&self) -> f32 {
        self.hit_pulse
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Effective spawn density: profile density scaled by the load-following
    /// quality scalar.
    pub fn runtime_fx_density(&self) -> f32 {
        self.fx_density * self.runtime_fx_quality
    }

    pub fn shockwaves(&self) -> &[Shockwave] {
        &self.shockwaves
    }

    pub fn sparks(&self) -> &[Spark] {
        &self.sparks
    }

    pub fn hit_bursts(&self) -> &[HitBurst] {
        &self.hit_bursts
    }

    pub fn stars(&self) -> &[ShootingStar] {
        &self.stars
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    /// Adopt a new responsive profile: bounds, density, motion preference and
    /// the fruit-derived star size. Streams are rebuilt at the new density.
    pub fn set_profile(&mut self, profile: &ResponsiveProfileSnapshot) {
        self.bounds = Vec2::new(profile.logical_w, profile.logical_h);
        self.fx_density = profile.fx_density;
        self.reduced_motion = profile.reduced_motion;
        let star_radius = ((profile.fruit_radius_min + profile.fruit_radius_max) * 0.44)
            .clamp(18.0, 36.0);
        self.star_size = star_radius * 2.0;
        self.rebuild_streams();
    }

    /// External trigger: a bonus item was caught at `origin`.
    ///
    /// From idle/exit this starts the enter transition (ring + spark burst).
    /// While already in enter/active it only extends the deadline and the
    /// hit-pulse decay — the phase is not restarted and nothing stacks.
    pub fn trigger_enter(&mut self, now: f64, origin: Vec2) -> FeverEvents {
        let mut events = FeverEvents::new();
        self.fever_until = self.fever_until.max(now) + FEVER_DURATION_SEC;
        match self.phase {
            FeverPhase::Enter | FeverPhase::Active => {
                let bump = if self.reduced_motion { 0.24 } else { 0.38 };
                self.hit_pulse = (self.hit_pulse + bump).min(HIT_PULSE_MAX);
            }
            FeverPhase::Idle | FeverPhase::Exit => {
                self.phase = FeverPhase::Enter;
                self.phase_start = now;
                self.enter_duration = if self.reduced_motion {
                    FEVER_ENTER_DURATION_REDUCED
                } else {
                    FEVER_ENTER_DURATION
                };
                self.exit_duration = if self.reduced_motion {
                    FEVER_EXIT_DURATION_REDUCED
                } else {
                    FEVER_EXIT_DURATION
                };
                self.origin = origin;
                self.flash = if self.reduced_motion { 0.26 } else { 0.78 };
                self.hit_pulse = self
                    .hit_pulse
                    .max(if self.reduced_motion { 0.26 } else { 0.52 });
                self.spawn_entry_shockwaves(origin);
                self.spawn_entry_sparks(origin);
                events.push(FeverEvent::EnterStarted);
            }
        }
        events
    }

    /// External trigger: bonus-catch feedback at `pos`. Malformed colors fall
    /// back to the default amber.
    pub fn trigger_hit(&mut self, pos: Vec2, color: &str) {
        let color = parse_hex_color(color).unwrap_or_else(|| TintColor {
            key: String::from(DEFAULT_HIT_COLOR),
            r: 255,
            g: 214,
            b: 112,
        });
        let life = if self.reduced_motion { 0.24 } else { 0.32 };
        self.hit_bursts.push(HitBurst {
            pos,
            age: 0.0,
            life,
            r0: 10.0,
            r1: 58.0,
            color,
        });
        let bump = if self.reduced_motion { 0.24 } else { 0.38 };
        self.hit_pulse = (self.hit_pulse + bump).min(HIT_PULSE_MAX);

        let density = self.runtime_fx_density();
        let base = if self.reduced_motion { 4.0 } else { 10.0 };
        let count = ((base * density).round() as usize).max(4);
        for i in 0..count {
            let angle =
                TAU * i as f32 / count as f32 + self.rng.gen_range(-0.24..0.24f32);
            let speed = self.rng.gen_range(120.0..340.0f32);
            self.sparks.push(Spark {
                pos,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                age: 0.0,
                life: self.rng.gen_range(0.16..0.34),
                size: self.rng.gen_range(1.2..3.2),
                tone: (i % 3) as u8,
                mode: SparkMode::Hit,
            });
        }
    }

    /// Phase-dependent intensity; see the module docs for the curve shape.
    pub fn visual_state(&self, now: f64) -> FeverVisualState {
        match self.phase {
            FeverPhase::Idle => FeverVisualState {
                phase: FeverPhase::Idle,
                intensity: 0.0,
                enter_t: 0.0,
                exit_t: 0.0,
            },
            FeverPhase::Enter => {
                let t = (((now - self.phase_start) as f32) / self.enter_duration)
                    .clamp(0.0, 1.0);
                let intensity = (ENTER_INTENSITY_BASE
                    + ease_out_cubic(t) * ENTER_INTENSITY_SPAN
                    + self.hit_pulse * 0.22)
                    .clamp(0.0, INTENSITY_MAX);
                FeverVisualState {
                    phase: FeverPhase::Enter,
                    intensity,
                    enter_t: t,
                    exit_t: 0.0,
                }
            }
            FeverPhase::Active => {
                let intensity =
                    (ACTIVE_INTENSITY_BASE + self.hit_pulse * 0.22).clamp(0.0, INTENSITY_MAX);
                FeverVisualState {
                    phase: FeverPhase::Active,
                    intensity,
                    enter_t: 1.0,
                    exit_t: 0.0,
                }
            }
            FeverPhase::Exit => {
                let t = (((now - self.phase_start) as f32) / self.exit_duration)
                    .clamp(0.0, 1.0);
                let intensity = ((EXIT_INTENSITY_BASE - ease_in_cubic(t) * EXIT_INTENSITY_BASE)
                    + self.hit_pulse * 0.16)
                    .clamp(0.0, 1.0);
                FeverVisualState {
                    phase: FeverPhase::Exit,
                    intensity,
                    enter_t: 1.0,
                    exit_t: t,
                }
            }
        }
    }

    /// Advance the machine and every pool by `dt` at game time `now`.
    /// `frame_p95_ms` feeds the runtime FX-quality target.
    pub fn update(&mut self, dt: f32, now: f64, frame_p95_ms: f32) -> FeverEvents {
        let mut events = FeverEvents::new();

        let target = if frame_p95_ms > 34.0 {
            0.58
        } else if frame_p95_ms > 28.0 {
            0.68
        } else if frame_p95_ms > 24.0 {
            0.78
        } else if frame_p95_ms > 18.0 {
            0.90
        } else {
            1.0
        };
        self.runtime_fx_quality +=
            (target - self.runtime_fx_quality) * (dt * FX_QUALITY_APPROACH_PER_SEC).min(1.0);
        self.runtime_fx_quality = self.runtime_fx_quality.clamp(FX_QUALITY_MIN, 1.0);

        self.hit_pulse =
            (self.hit_pulse - dt * if self.reduced_motion { 2.7 } else { 4.4 }).max(0.0);
        self.flash = (self.flash - dt * if self.reduced_motion { 1.7 } else { 2.6 }).max(0.0);

        if self.is_running() && now >= self.fever_until {
            self.begin_exit(now);
            events.push(FeverEvent::ExitStarted);
        }

        let state = self.visual_state(now);
        if self.phase == FeverPhase::Enter && state.enter_t >= 1.0 {
            self.phase = FeverPhase::Active;
            self.phase_start = now;
            events.push(FeverEvent::ActiveStarted);
        } else if self.phase == FeverPhase::Exit && state.exit_t >= 1.0 {
            self.phase = FeverPhase::Idle;
            self.phase_start = now;
            self.flash = 0.0;
            self.hit_pulse = 0.0;
            events.push(FeverEvent::Ended);
        }

        let state = self.visual_state(now);
        let meteors_on = self.is_running() || state.intensity > 0.06;
        if meteors_on {
            self.star_timer += dt;
            while self.star_timer >= SHOOTING_STAR_INTERVAL
                && self.stars.len() < SHOOTING_STAR_MAX_ACTIVE
            {
                self.star_timer -=
                    SHOOTING_STAR_INTERVAL * self.rng.gen_range(0.72..1.08f32);
                self.spawn_shooting_star(state.intensity);
            }
            if self.stars.len() >= SHOOTING_STAR_MAX_ACTIVE {
                self.star_timer = self.star_timer.min(SHOOTING_STAR_INTERVAL * 0.15);
            }
        } else {
            self.star_timer = 0.0;
        }

        self.shockwaves.retain_mut(|w| {
            w.age += dt;
            w.age <= w.life
        });

        self.sparks.retain_mut(|s| {
            s.age += dt;
            if s.age > s.life {
                return false;
            }
            if s.mode != SparkMode::Converge {
                s.vel.y += SPARK_GRAVITY * dt;
            }
            s.pos += s.vel * dt;
            true
        });

        self.hit_bursts.retain_mut(|hb| {
            hb.age += dt;
            hb.age <= hb.life
        });

        let floor_y = self.bounds.y * METEOR_FLOOR_FRACTION;
        let bounds = self.bounds;
        self.stars.retain_mut(|s| {
            s.age += dt;
            s.pos += s.vel * dt;
            s.rotation += s.rotation_speed * dt;
            let life_t = (s.age / s.life).clamp(0.0, 1.0);
            let depth_scale = 1.0 - life_t * (1.0 - s.end_scale);
            let current_half = s.size * depth_scale * 0.5;
            s.age <= s.life
                && s.pos.y + current_half < floor_y
                && s.pos.x + s.size >= -STAR_CULL_MARGIN
                && s.pos.x - s.size <= bounds.x + STAR_CULL_MARGIN
                && s.pos.y + s.size >= -STAR_CULL_MARGIN
                && s.pos.y - s.size <= floor_y + STAR_CULL_MARGIN
        });

        events
    }

    /// Remap pool positions proportionally after a logical-resolution change.
    pub fn rescale(&mut self, remap: &ResizeRemap) {
        let uniform = remap.min_scale();
        for w in &mut self.shockwaves {
            w.pos.x *= remap.scale_x;
            w.pos.y *= remap.scale_y;
            w.start_r *= uniform;
            w.end_r *= uniform;
            w.width *= uniform;
        }
        for s in &mut self.sparks {
            s.pos.x *= remap.scale_x;
            s.pos.y *= remap.scale_y;
        }
        for hb in &mut self.hit_bursts {
            hb.pos.x *= remap.scale_x;
            hb.pos.y *= remap.scale_y;
            hb.r0 *= uniform;
            hb.r1 *= uniform;
        }
        for s in &mut self.stars {
            s.pos.x *= remap.scale_x;
            s.pos.y *= remap.scale_y;
        }
        self.origin.x *= remap.scale_x;
        self.origin.y *= remap.scale_y;
        self.bounds.x *= remap.scale_x;
        self.bounds.y *= remap.scale_y;
    }

    /// Drop every pool and return to idle (new game session).
    pub fn clear(&mut self) {
        self.shockwaves.clear();
        self.sparks.clear();
        self.hit_bursts.clear();
        self.stars.clear();
        self.phase = FeverPhase::Idle;
        self.phase_start = 0.0;
        self.fever_until = 0.0;
        self.flash = 0.0;
        self.hit_pulse = 0.0;
        self.star_timer = 0.0;
        self.rebuild_streams();
    }

    fn begin_exit(&mut self, now: f64) {
        self.phase = FeverPhase::Exit;
        self.phase_start = now;
        self.flash = self
            .flash
            .max(if self.reduced_motion { 0.18 } else { 0.34 });
        self.hit_pulse = self
            .hit_pulse
            .max(if self.reduced_motion { 0.2 } else { 0.32 });
        let center = Vec2::new(self.bounds.x * 0.5, self.bounds.y * 0.32);
        self.spawn_exit_shockwave(center);
        self.spawn_exit_converge(center);
    }

    fn spawn_entry_shockwaves(&mut self, origin: Vec2) {
        let base = if self.reduced_motion { 1.0 } else { 2.0 };
        let count = ((base * self.runtime_fx_density()).round() as usize).max(1);
        let max_dim = self.bounds.x.max(self.bounds.y);
        for i in 0..count {
            let fi = i as f32;
            self.shockwaves.push(Shockwave {
                pos: origin,
                age: -fi * 0.08,
                life: self.enter_duration + 0.24 + fi * 0.08,
                start_r: 16.0 + fi * 10.0,
                end_r: max_dim * (0.50 + fi * 0.12),
                width: 18.0 - fi * 5.0,
                tone: if i == 0 { 0 } else { 1 },
                mode: WaveMode::Expand,
            });
        }
    }

    fn spawn_exit_shockwave(&mut self, center: Vec2) {
        let max_dim = self.bounds.x.max(self.bounds.y);
        self.shockwaves.push(Shockwave {
            pos: center,
            age: 0.0,
            life: self.exit_duration + 0.18,
            start_r: max_dim * 0.46,
            end_r: 24.0,
            width: 12.0,
            tone: 0,
            mode: WaveMode::Collapse,
        });
    }

    fn spawn_entry_sparks(&mut self, origin: Vec2) {
        let density = self.runtime_fx_density();
        let base = if self.reduced_motion { 14.0 } else { 30.0 };
        let count = ((base * density).round() as usize).max(10);
        for i in 0..count {
            let angle =
                TAU * i as f32 / count as f32 + self.rng.gen_range(-0.18..0.18f32);
            let speed = self.rng.gen_range(210.0..640.0f32) * (0.52 + density * 0.48);
            let lift = self.rng.gen_range(10.0..56.0f32);
            self.sparks.push(Spark {
                pos: origin,
                vel: Vec2::new(angle.cos() * speed, angle.sin() * speed - lift),
                age: 0.0,
                life: self.rng.gen_range(0.34..0.82),
                size: self.rng.gen_range(2.0..5.0),
                tone: (i % 3) as u8,
                mode: SparkMode::Burst,
            });
        }
    }

    fn spawn_exit_converge(&mut self, center: Vec2) {
        let density = self.runtime_fx_density();
        let base = if self.reduced_motion { 12.0 } else { 22.0 };
        let count = ((base * density).round() as usize).max(8);
        for i in 0..count {
            let pos = match i % 4 {
                0 => Vec2::new(self.rng.gen_range(0.0..self.bounds.x), -8.0),
                1 => Vec2::new(self.bounds.x + 8.0, self.rng.gen_range(0.0..self.bounds.y)),
                2 => Vec2::new(self.rng.gen_range(0.0..self.bounds.x), self.bounds.y + 8.0),
                _ => Vec2::new(-8.0, self.rng.gen_range(0.0..self.bounds.y)),
            };
            let delta = center - pos;
            let dist = delta.length().max(1.0);
            let speed = dist / self.rng.gen_range(0.42..0.76f32);
            self.sparks.push(Spark {
                pos,
                vel: delta / dist * speed,
                age: 0.0,
                life: self.rng.gen_range(0.46..0.82),
                size: self.rng.gen_range(1.8..4.1),
                tone: (i % 3) as u8,
                mode: SparkMode::Converge,
            });
        }
    }

    fn spawn_shooting_star(&mut self, intensity: f32) {
        let speed = self.rng.gen_range(155.0..265.0f32)
            * if self.reduced_motion { 0.64 } else { 1.0 }
            * (0.82 + intensity * 0.25);
        let w = self.bounds.x;
        let h = self.bounds.y;
        let floor_y = h * METEOR_FLOOR_FRACTION;

        let start = Vec2::new(
            self.rng.gen_range(w * 0.12..w * 0.88),
            self.rng.gen_range(h * 0.12..h * 0.28),
        );
        let target_x = (start.x + self.rng.gen_range(-w * 0.05..w * 0.05))
            .clamp(w * 0.10, w * 0.90);
        let min_target_y = (start.y + h * 0.24).clamp(h * 0.56, floor_y * 0.94);
        let max_target_y = floor_y * 0.985;
        let target_y = if max_target_y > min_target_y {
            self.rng.gen_range(min_target_y..max_target_y)
        } else {
            min_target_y
        };

        let delta = Vec2::new(target_x, target_y) - start;
        let len = delta.length().max(0.0001);
        let life = ((len / speed) * self.rng.gen_range(0.90..1.04f32)).max(0.78);
        let spin_turns = self.rng.gen_range(0.18..0.60f32);
        let spin_sign = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };

        self.stars.push(ShootingStar {
            pos: start,
            vel: delta / len * speed,
            age: 0.0,
            life,
            variant: self.rng.gen_range(0u8..3),
            size: self.star_size,
            end_scale: self.rng.gen_range(0.40..0.69),
            rotation: self.rng.gen_range(0.0..TAU),
            rotation_speed: TAU * spin_turns / life * spin_sign,
        });
    }

    fn rebuild_streams(&mut self) {
        self.streams.clear();
        let base = if self.reduced_motion { 8.0 } else { 16.0 };
        let count = ((base * self.runtime_fx_density()).round() as usize).max(6);
        for i in 0..count {
            self.streams.push(Stream {
                lane: self.rng.gen_range(0.15..0.80),
                seed: self.rng.gen_range(0.0..1000.0),
                speed: self.rng.gen_range(0.58..1.72),
                len: self.rng.gen_range(64.0..172.0),
                width: self.rng.gen_range(1.2..3.4),
                amp: self.rng.gen_range(6.0..20.0),
                tone: (i % 3) as u8,
            });
        }
    }
}
