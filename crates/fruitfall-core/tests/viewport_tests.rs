// Render-scale cap tables and aspect correction.

use fruitfall_core::{
    draw_fix_scale_y, physical_extent, render_scale_cap, QualityMode, QualityTier,
    DRAW_FIX_MAX, DRAW_FIX_MIN,
};

#[test]
fn fixed_modes_cap_independent_of_tier() {
    for tier in [
        QualityTier::Quality,
        QualityTier::Balanced,
        QualityTier::Performance,
    ] {
        assert_eq!(render_scale_cap(QualityMode::Quality, tier, 4.0), 3.0);
        assert_eq!(render_scale_cap(QualityMode::Balanced, tier, 4.0), 2.5);
        assert_eq!(render_scale_cap(QualityMode::Performance, tier, 4.0), 1.75);
    }
}

#[test]
fn auto_mode_caps_by_current_tier() {
    assert_eq!(
        render_scale_cap(QualityMode::Auto, QualityTier::Quality, 4.0),
        2.5
    );
    assert_eq!(
        render_scale_cap(QualityMode::Auto, QualityTier::Balanced, 4.0),
        2.25
    );
    assert_eq!(
        render_scale_cap(QualityMode::Auto, QualityTier::Performance, 4.0),
        1.75
    );
}

#[test]
fn low_dpr_passes_through_uncapped() {
    assert_eq!(
        render_scale_cap(QualityMode::Quality, QualityTier::Quality, 1.5),
        1.5
    );
    // DPR is floored at 1 and non-finite values fall back to 1.
    assert_eq!(
        render_scale_cap(QualityMode::Auto, QualityTier::Quality, 0.5),
        1.0
    );
    assert_eq!(
        render_scale_cap(QualityMode::Auto, QualityTier::Quality, f32::NAN),
        1.0
    );
}

#[test]
fn physical_extent_rounds_and_floors_at_one() {
    assert_eq!(physical_extent(1280.0, 1.5), 1920);
    assert_eq!(physical_extent(853.4, 1.5), 1280);
    assert_eq!(physical_extent(0.0, 1.0), 1);
}

#[test]
fn draw_fix_is_unity_for_matching_aspect() {
    assert_eq!(draw_fix_scale_y(1280.0, 720.0, 1280.0, 720.0), 1.0);
    assert_eq!(draw_fix_scale_y(640.0, 360.0, 1280.0, 720.0), 1.0);
}

#[test]
fn draw_fix_compensates_for_stretched_containers() {
    // Same logical space shown in a taller container: the Y scale shrinks.
    let fix = draw_fix_scale_y(1280.0, 1280.0, 1280.0, 720.0);
    assert!((fix - 720.0 / 1280.0).abs() < 1e-4);
    // A wider container grows it.
    let fix = draw_fix_scale_y(1280.0, 480.0, 1280.0, 720.0);
    assert!(fix > 1.0);
}

#[test]
fn draw_fix_clamps_extreme_and_degenerate_inputs() {
    assert_eq!(draw_fix_scale_y(1280.0, 9000.0, 1280.0, 720.0), DRAW_FIX_MIN);
    assert_eq!(draw_fix_scale_y(9000.0, 180.0, 1280.0, 720.0), DRAW_FIX_MAX);
    assert_eq!(draw_fix_scale_y(0.0, 720.0, 1280.0, 720.0), 1.0);
    assert_eq!(draw_fix_scale_y(f32::NAN, 720.0, 1280.0, 720.0), 1.0);
}
