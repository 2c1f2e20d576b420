// Tier hysteresis and rolling-window statistics.

use fruitfall_core::{clamp_frame_dt, PerfMonitor, PerfOptions, QualityTier, MAX_FRAME_DT};

fn monitor() -> PerfMonitor {
    PerfMonitor::new(PerfOptions::default())
}

#[test]
fn starts_at_quality_tier() {
    assert_eq!(monitor().tier(), QualityTier::Quality);
}

#[test]
fn ignores_non_finite_and_non_positive_samples() {
    let mut perf = monitor();
    for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 0.0, -5.0] {
        let verdict = perf.record_frame(bad);
        assert!(!verdict.tier_changed);
        assert_eq!(verdict.tier, QualityTier::Quality);
    }
    assert_eq!(perf.frame_p95_ms(), 0.0, "bad samples must not enter the window");
}

#[test]
fn sustained_slow_frames_step_one_tier_per_hold_crossing() {
    // 30 ms frames against the 24 ms threshold: 6 ms of slow debt per frame,
    // so the 3000 ms hold is crossed every 500 frames.
    let mut perf = monitor();
    for i in 1..=499 {
        let verdict = perf.record_frame(30.0);
        assert!(!verdict.tier_changed, "no step expected at frame {i}");
    }
    let verdict = perf.record_frame(30.0);
    assert!(verdict.tier_changed);
    assert_eq!(verdict.tier, QualityTier::Balanced);

    for _ in 0..499 {
        assert!(!perf.record_frame(30.0).tier_changed);
    }
    let verdict = perf.record_frame(30.0);
    assert!(verdict.tier_changed);
    assert_eq!(verdict.tier, QualityTier::Performance);

    // Already at the cheapest tier: further slow frames change nothing.
    for _ in 0..600 {
        let verdict = perf.record_frame(30.0);
        assert!(!verdict.tier_changed);
        assert_eq!(verdict.tier, QualityTier::Performance);
    }
}

#[test]
fn recovery_needs_the_longer_fast_hold() {
    let mut perf = monitor();
    perf.set_tier(QualityTier::Performance);
    // 10 ms frames against the 18 ms threshold: 8 ms of fast debt per frame,
    // so the 8000 ms hold is crossed at frame 1000.
    for i in 1..=999 {
        let verdict = perf.record_frame(10.0);
        assert!(!verdict.tier_changed, "recovered too early at frame {i}");
    }
    let verdict = perf.record_frame(10.0);
    assert!(verdict.tier_changed);
    assert_eq!(verdict.tier, QualityTier::Balanced);
}

#[test]
fn a_step_zeroes_both_accumulators() {
    let mut perf = monitor();
    for _ in 0..500 {
        perf.record_frame(30.0);
    }
    assert_eq!(perf.tier(), QualityTier::Balanced);
    // A recovery right after a degrade step must pay the full fast hold.
    for i in 1..=999 {
        let verdict = perf.record_frame(10.0);
        assert!(!verdict.tier_changed, "premature recovery at frame {i}");
    }
    assert!(perf.record_frame(10.0).tier_changed);
    assert_eq!(perf.tier(), QualityTier::Quality);
}

#[test]
fn borderline_frames_pay_debt_down() {
    let mut perf = monitor();
    // Alternate one slow frame (6 ms debt) with one 20 ms frame (decays
    // 10 ms): debt never accumulates, the tier never moves.
    for _ in 0..2000 {
        assert!(!perf.record_frame(30.0).tier_changed);
        assert!(!perf.record_frame(20.0).tier_changed);
    }
    assert_eq!(perf.tier(), QualityTier::Quality);
}

#[test]
fn manual_override_pins_tier_and_drops_debt() {
    let mut perf = monitor();
    for _ in 0..499 {
        perf.record_frame(30.0);
    }
    perf.set_tier(QualityTier::Quality);
    // The 499 frames of accumulated slow debt are gone.
    for _ in 0..499 {
        assert!(!perf.record_frame(30.0).tier_changed);
    }
    assert!(perf.record_frame(30.0).tier_changed);
}

#[test]
fn frame_p95_indexes_sorted_window() {
    let mut perf = monitor();
    for ms in 1..=100 {
        perf.record_frame(ms as f32);
    }
    // floor((100 - 1) * 0.95) = 94 -> 95.0 in the sorted window.
    assert_eq!(perf.frame_p95_ms(), 95.0);
}

#[test]
fn window_evicts_oldest_samples_first() {
    let mut perf = monitor();
    for _ in 0..200 {
        perf.record_frame(10.0);
    }
    for _ in 0..120 {
        perf.record_frame(20.0);
    }
    // The 10 ms samples have been pushed out of the 120-slot window.
    assert_eq!(perf.frame_p95_ms(), 20.0);
}

#[test]
fn input_latency_percentile_drops_negative_samples() {
    let mut perf = monitor();
    perf.record_input_latency(100.0, 90.0); // negative latency, dropped
    perf.record_input_latency(f64::NAN, 100.0);
    for i in 1..=100 {
        perf.record_input_latency(0.0, i as f64);
    }
    let snap = perf.snapshot();
    assert_eq!(snap.input_latency_p95_ms, 95.0);
}

#[test]
fn snapshot_reports_fps_statistics() {
    let mut perf = monitor();
    for _ in 0..60 {
        perf.record_frame(20.0);
    }
    let snap = perf.snapshot();
    assert!((snap.fps_avg - 50.0).abs() < 1e-3);
    assert!((snap.fps_p1 - 50.0).abs() < 1e-3);
    assert_eq!(snap.tier, QualityTier::Quality);
}

#[test]
fn reset_clears_windows_but_keeps_tier() {
    let mut perf = monitor();
    for _ in 0..500 {
        perf.record_frame(30.0);
    }
    assert_eq!(perf.tier(), QualityTier::Balanced);
    perf.reset();
    assert_eq!(perf.frame_p95_ms(), 0.0);
    assert_eq!(perf.tier(), QualityTier::Balanced);
}

#[test]
fn dt_clamp_caps_large_and_bad_deltas() {
    // A backgrounded tab coming back must not produce a simulation jump.
    assert_eq!(clamp_frame_dt(5.0), MAX_FRAME_DT);
    assert_eq!(clamp_frame_dt(0.016), 0.016);
    assert_eq!(clamp_frame_dt(-1.0), 0.0);
    assert_eq!(clamp_frame_dt(f32::NAN), 0.0);
}

#[test]
fn tier_steps_saturate_at_the_ends() {
    assert_eq!(QualityTier::Performance.cheaper(), QualityTier::Performance);
    assert_eq!(QualityTier::Quality.richer(), QualityTier::Quality);
    assert_eq!(QualityTier::Quality.cheaper(), QualityTier::Balanced);
    assert_eq!(QualityTier::Performance.richer(), QualityTier::Balanced);
}
