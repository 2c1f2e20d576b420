// Fever phase totality, intensity continuity, and pool lifecycle bounds.

use fruitfall_core::{
    compute_profile, DeviceClass, FeverEvent, FeverFx, FeverPhase, ProfileInputs, QualityTier,
    ResizeRemap, SHOOTING_STAR_MAX_ACTIVE,
};
use glam::Vec2;

const DT: f32 = 0.016;
const SMOOTH_P95: f32 = 12.0;

fn fx() -> FeverFx {
    FeverFx::new(7)
}

/// Advance `fx` from `*now` to `until`, collecting emitted events.
fn drive(fx: &mut FeverFx, now: &mut f64, until: f64) -> Vec<FeverEvent> {
    let mut events = Vec::new();
    while *now < until {
        *now += DT as f64;
        events.extend(fx.update(DT, *now, SMOOTH_P95));
    }
    events
}

#[test]
fn idle_without_trigger_stays_idle() {
    let mut fx = fx();
    let mut now = 0.0;
    let events = drive(&mut fx, &mut now, 5.0);
    assert!(events.is_empty());
    assert_eq!(fx.phase(), FeverPhase::Idle);
    assert_eq!(fx.visual_state(now).intensity, 0.0);
    assert_eq!(fx.remaining(now), 0.0);
}

#[test]
fn full_cycle_walks_the_phase_table_in_order() {
    let mut fx = fx();
    let mut now = 0.0;
    let mut events: Vec<FeverEvent> = fx
        .trigger_enter(now, Vec2::new(640.0, 260.0))
        .into_iter()
        .collect();
    assert_eq!(fx.phase(), FeverPhase::Enter);
    events.extend(drive(&mut fx, &mut now, 12.0));
    assert_eq!(fx.phase(), FeverPhase::Idle);
    assert_eq!(
        events,
        vec![
            FeverEvent::EnterStarted,
            FeverEvent::ActiveStarted,
            FeverEvent::ExitStarted,
            FeverEvent::Ended,
        ]
    );
}

#[test]
fn intensity_is_continuous_across_enter_to_active() {
    let mut fx = fx();
    let mut now = 0.0;
    fx.trigger_enter(now, Vec2::new(640.0, 260.0));

    let mut prev = fx.visual_state(now).intensity;
    let mut crossed = false;
    while now < 2.0 {
        let was_enter = fx.phase() == FeverPhase::Enter;
        now += 0.004;
        fx.update(0.004, now, SMOOTH_P95);
        let cur = fx.visual_state(now).intensity;
        if was_enter && fx.phase() == FeverPhase::Active {
            crossed = true;
        }
        assert!(
            (cur - prev).abs() < 0.05,
            "intensity jumped {prev} -> {cur} at t={now}"
        );
        prev = cur;
    }
    assert!(crossed, "the enter->active boundary was never exercised");
}

#[test]
fn retrigger_while_running_extends_without_restarting() {
    let mut fx = fx();
    let mut now = 0.0;
    fx.trigger_enter(now, Vec2::new(640.0, 260.0));
    drive(&mut fx, &mut now, 1.0);
    assert_eq!(fx.phase(), FeverPhase::Active);

    let pulse_before = fx.hit_pulse();
    let events = fx.trigger_enter(now, Vec2::new(100.0, 100.0));
    assert!(events.is_empty(), "no phase transition on a running re-trigger");
    assert_eq!(fx.phase(), FeverPhase::Active);
    assert!(fx.hit_pulse() > pulse_before, "pulse decay must extend");
    // Deadline stacked onto the previous one: 10s initial + 10s extension.
    assert!((fx.remaining(now) - (20.0 - now)).abs() < 1e-6);
}

#[test]
fn trigger_during_exit_starts_a_fresh_enter() {
    let mut fx = fx();
    let mut now = 0.0;
    fx.trigger_enter(now, Vec2::new(640.0, 260.0));
    drive(&mut fx, &mut now, 10.1);
    assert_eq!(fx.phase(), FeverPhase::Exit);
    let events = fx.trigger_enter(now, Vec2::new(300.0, 300.0));
    assert_eq!(events.as_slice(), &[FeverEvent::EnterStarted]);
    assert_eq!(fx.phase(), FeverPhase::Enter);
}

#[test]
fn all_ephemeral_pools_drain_once_lifetimes_elapse() {
    let mut fx = fx();
    let mut now = 0.0;
    fx.trigger_enter(now, Vec2::new(640.0, 260.0));
    fx.trigger_hit(Vec2::new(400.0, 300.0), "#ffd670");
    fx.trigger_hit(Vec2::new(500.0, 320.0), "#ff8cbf");
    assert!(!fx.sparks().is_empty());
    assert!(!fx.shockwaves().is_empty());
    assert!(!fx.hit_bursts().is_empty());

    drive(&mut fx, &mut now, 40.0);
    assert!(fx.shockwaves().is_empty());
    assert!(fx.sparks().is_empty());
    assert!(fx.hit_bursts().is_empty());
    assert!(fx.stars().is_empty());
}

#[test]
fn shooting_stars_respect_the_active_ceiling() {
    let mut fx = fx();
    let mut now = 0.0;
    fx.trigger_enter(now, Vec2::new(640.0, 260.0));
    let mut saw_star = false;
    while now < 9.0 {
        now += DT as f64;
        fx.update(DT, now, SMOOTH_P95);
        saw_star |= !fx.stars().is_empty();
        assert!(fx.stars().len() <= SHOOTING_STAR_MAX_ACTIVE);
    }
    assert!(saw_star, "the timer-driven spawner never ran");
}

#[test]
fn heavy_frames_decay_runtime_density_smoothly() {
    let mut fx = fx();
    let baseline = fx.runtime_fx_density();
    assert!((baseline - 1.0).abs() < 1e-6);
    // One heavy sample moves density only part way toward the 0.58 target...
    fx.update(0.016, 0.016, 40.0);
    let after_one = fx.runtime_fx_density();
    assert!(after_one < baseline && after_one > 0.58);
    // ...but a sustained load converges to it.
    let mut now = 0.016;
    for _ in 0..120 {
        now += 0.016;
        fx.update(0.016, now, 40.0);
    }
    assert!((fx.runtime_fx_density() - 0.58).abs() < 0.02);
}

#[test]
fn malformed_hit_color_falls_back_to_default() {
    let mut fx = fx();
    fx.trigger_hit(Vec2::new(10.0, 10.0), "not-a-color");
    assert_eq!(fx.hit_bursts()[0].color.key, "#ffd670");
}

#[test]
fn profile_changes_rebuild_ambient_streams() {
    let mut fx = fx();
    assert_eq!(fx.streams().len(), 16);

    let reduced_mobile = compute_profile(&ProfileInputs {
        device: DeviceClass::Mobile,
        tier: QualityTier::Quality,
        reduced_motion: true,
        coarse_pointer: true,
        device_pixel_ratio: 2.0,
        logical_w: 390.0,
        logical_h: 760.0,
        viewport_short_edge: 390.0,
    });
    fx.set_profile(&reduced_mobile);
    // 8 * (low density) rounds below the floor of 6.
    assert_eq!(fx.streams().len(), 6);
}

#[test]
fn rescale_remaps_positions_proportionally() {
    let mut fx = fx();
    fx.trigger_enter(0.0, Vec2::new(100.0, 200.0));
    let remap = ResizeRemap::between(1280.0, 720.0, 640.0, 360.0).unwrap();
    fx.rescale(&remap);
    assert_eq!(fx.shockwaves()[0].pos, Vec2::new(50.0, 100.0));
    assert_eq!(fx.origin(), Vec2::new(50.0, 100.0));
}

#[test]
fn clear_returns_to_idle_and_empties_pools() {
    let mut fx = fx();
    let mut now = 0.0;
    fx.trigger_enter(now, Vec2::new(640.0, 260.0));
    drive(&mut fx, &mut now, 2.0);
    fx.clear();
    assert_eq!(fx.phase(), FeverPhase::Idle);
    assert!(fx.sparks().is_empty());
    assert!(fx.shockwaves().is_empty());
    assert!(fx.stars().is_empty());
    assert_eq!(fx.remaining(now), 0.0);
    assert_eq!(fx.visual_state(now).intensity, 0.0);
}
