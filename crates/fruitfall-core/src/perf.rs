//! Rolling frame/input sampling and the hysteresis-driven quality tier.
//!
//! The monitor accumulates "debt" in milliseconds: frames over the slow
//! threshold add their overage to `slow_debt`, frames under the fast
//! threshold add their underage to `fast_debt`, and frames on the other side
//! of each threshold pay the debt down at half the frame's cost. Crossing a
//! hold level steps the tier one level and zeroes both accumulators. The
//! fast hold is deliberately much longer than the slow hold: degrade quickly
//! to protect frame time, recover slowly so the tier does not flap.

use crate::quality::QualityTier;
use std::collections::VecDeque;

/// Tuning knobs for [`PerfMonitor`].
#[derive(Clone, Debug)]
pub struct PerfOptions {
    pub frame_window: usize,
    pub input_window: usize,
    pub slow_threshold_ms: f32,
    pub fast_threshold_ms: f32,
    pub slow_hold_ms: f32,
    pub fast_hold_ms: f32,
}

impl Default for PerfOptions {
    fn default() -> Self {
        Self {
            frame_window: 120,
            input_window: 120,
            slow_threshold_ms: 24.0,
            fast_threshold_ms: 18.0,
            slow_hold_ms: 3000.0,
            fast_hold_ms: 8000.0,
        }
    }
}

/// Result of feeding one frame sample.
#[derive(Clone, Copy, Debug)]
pub struct FrameVerdict {
    pub tier_changed: bool,
    pub tier: QualityTier,
}

/// Point-in-time statistics over the rolling windows.
#[derive(Clone, Copy, Debug)]
pub struct PerfSnapshot {
    pub fps_avg: f32,
    pub fps_p1: f32,
    pub frame_p95_ms: f32,
    pub input_latency_p95_ms: f32,
    pub render_scale: f32,
    pub tier: QualityTier,
}

struct RollingWindow {
    values: VecDeque<f32>,
    limit: usize,
}

impl RollingWindow {
    fn new(limit: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(limit.max(1)),
            limit: limit.max(1),
        }
    }

    fn push(&mut self, v: f32) {
        if self.values.len() == self.limit {
            self.values.pop_front();
        }
        self.values.push_back(v);
    }

    fn sorted_snapshot(&self) -> Vec<f32> {
        let mut out: Vec<f32> = self.values.iter().copied().collect();
        out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        out
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// Index into a sorted sample set at `floor((n-1) * p)`, clamped.
fn percentile_from_sorted(sorted: &[f32], p: f32) -> f32 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (((sorted.len() - 1) as f32 * p).floor() as usize).min(sorted.len() - 1);
    sorted[idx]
}

pub struct PerfMonitor {
    opts: PerfOptions,
    frame_times: RollingWindow,
    fps_values: RollingWindow,
    input_latencies: RollingWindow,
    slow_debt_ms: f32,
    fast_debt_ms: f32,
    tier: QualityTier,
    render_scale: f32,
}

impl PerfMonitor {
    pub fn new(opts: PerfOptions) -> Self {
        Self {
            frame_times: RollingWindow::new(opts.frame_window),
            fps_values: RollingWindow::new(opts.frame_window),
            input_latencies: RollingWindow::new(opts.input_window),
            opts,
            slow_debt_ms: 0.0,
            fast_debt_ms: 0.0,
            tier: QualityTier::Quality,
            render_scale: 1.0,
        }
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    /// Feed one frame's duration. Non-finite or non-positive samples are
    /// ignored and leave every accumulator untouched.
    pub fn record_frame(&mut self, frame_ms: f32) -> FrameVerdict {
        if !frame_ms.is_finite() || frame_ms <= 0.0 {
            return FrameVerdict {
                tier_changed: false,
                tier: self.tier,
            };
        }
        self.frame_times.push(frame_ms);
        self.fps_values.push(1000.0 / frame_ms);

        if frame_ms > self.opts.slow_threshold_ms {
            self.slow_debt_ms += frame_ms - self.opts.slow_threshold_ms;
        } else {
            self.slow_debt_ms = (self.slow_debt_ms - frame_ms * 0.5).max(0.0);
        }

        if frame_ms < self.opts.fast_threshold_ms {
            self.fast_debt_ms += self.opts.fast_threshold_ms - frame_ms;
        } else {
            self.fast_debt_ms = (self.fast_debt_ms - frame_ms * 0.5).max(0.0);
        }

        let mut next = self.tier;
        if self.slow_debt_ms >= self.opts.slow_hold_ms {
            next = self.tier.cheaper();
            self.slow_debt_ms = 0.0;
            self.fast_debt_ms = 0.0;
        } else if self.fast_debt_ms >= self.opts.fast_hold_ms {
            next = self.tier.richer();
            self.slow_debt_ms = 0.0;
            self.fast_debt_ms = 0.0;
        }

        let tier_changed = next != self.tier;
        if tier_changed {
            log::info!(
                "[perf] tier {} -> {} (p95 {:.1}ms)",
                self.tier.as_str(),
                next.as_str(),
                self.frame_p95_ms()
            );
        }
        self.tier = next;
        FrameVerdict {
            tier_changed,
            tier: next,
        }
    }

    /// Record the latency between an input event and the frame that consumed
    /// it. Negative or non-finite latencies are dropped.
    pub fn record_input_latency(&mut self, input_started_at_ms: f64, frame_now_ms: f64) {
        if !input_started_at_ms.is_finite() || !frame_now_ms.is_finite() {
            return;
        }
        let latency = (frame_now_ms - input_started_at_ms) as f32;
        if latency.is_finite() && latency >= 0.0 {
            self.input_latencies.push(latency);
        }
    }

    /// Manual override: pin the tier and drop any accumulated debt.
    pub fn set_tier(&mut self, tier: QualityTier) {
        self.tier = tier;
        self.slow_debt_ms = 0.0;
        self.fast_debt_ms = 0.0;
    }

    pub fn set_render_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale > 0.0 {
            self.render_scale = scale;
        }
    }

    pub fn frame_p95_ms(&self) -> f32 {
        percentile_from_sorted(&self.frame_times.sorted_snapshot(), 0.95)
    }

    pub fn snapshot(&self) -> PerfSnapshot {
        let frame = self.frame_times.sorted_snapshot();
        let fps = self.fps_values.sorted_snapshot();
        let input = self.input_latencies.sorted_snapshot();
        let fps_avg = if fps.is_empty() {
            0.0
        } else {
            fps.iter().sum::<f32>() / fps.len() as f32
        };
        PerfSnapshot {
            fps_avg,
            fps_p1: percentile_from_sorted(&fps, 0.01),
            frame_p95_ms: percentile_from_sorted(&frame, 0.95),
            input_latency_p95_ms: percentile_from_sorted(&input, 0.95),
            render_scale: self.render_scale,
            tier: self.tier,
        }
    }

    /// Clear every window and accumulator. The tier is left alone so a reset
    /// (new game session) does not visibly re-negotiate quality.
    pub fn reset(&mut self) {
        self.frame_times.clear();
        self.fps_values.clear();
        self.input_latencies.clear();
        self.slow_debt_ms = 0.0;
        self.fast_debt_ms = 0.0;
    }
}
