// Device-class detection, coefficient clamps, and resize remapping.

use fruitfall_core::{
    compute_profile, detect_device_class, DeviceClass, ProfileInputs, QualityTier, ResizeRemap,
};

fn inputs(device: DeviceClass, tier: QualityTier, reduced: bool) -> ProfileInputs {
    ProfileInputs {
        device,
        tier,
        reduced_motion: reduced,
        coarse_pointer: device != DeviceClass::Desktop,
        device_pixel_ratio: 2.0,
        logical_w: 1280.0,
        logical_h: 720.0,
        viewport_short_edge: 720.0,
    }
}

#[test]
fn device_detection_heuristics() {
    // Touch + narrow viewport, or very narrow regardless of touch.
    assert_eq!(detect_device_class(2, true, 700.0, 2.0), DeviceClass::Mobile);
    assert_eq!(detect_device_class(0, false, 400.0, 1.0), DeviceClass::Mobile);
    // Touch at mid width, or mid width with high DPR.
    assert_eq!(detect_device_class(2, true, 1100.0, 2.0), DeviceClass::Tablet);
    assert_eq!(detect_device_class(0, false, 1000.0, 1.5), DeviceClass::Tablet);
    // Everything else.
    assert_eq!(
        detect_device_class(0, false, 1920.0, 1.0),
        DeviceClass::Desktop
    );
    assert_eq!(
        detect_device_class(0, false, 1000.0, 1.0),
        DeviceClass::Desktop
    );
}

#[test]
fn desktop_quality_profile_is_the_unscaled_baseline() {
    let p = compute_profile(&ProfileInputs {
        device: DeviceClass::Desktop,
        tier: QualityTier::Quality,
        reduced_motion: false,
        coarse_pointer: false,
        device_pixel_ratio: 1.0,
        logical_w: 1280.0,
        logical_h: 720.0,
        viewport_short_edge: 720.0,
    });
    assert_eq!(p.ui_scale, 1.0);
    assert_eq!(p.fx_density, 1.0);
    assert_eq!(p.basket_scale, 1.0);
    assert_eq!(p.motion_scale, 1.0);
    assert_eq!(p.basket_w, 240.0);
    // Fruit radii derive from the basket body: 240 * 0.75 = 180 diameter.
    assert!((p.fruit_radius_min - 81.0).abs() < 1e-3);
    assert!((p.fruit_radius_max - 99.0).abs() < 1e-3);
}

#[test]
fn device_and_tier_discounts_compound_multiplicatively() {
    let p = compute_profile(&ProfileInputs {
        device: DeviceClass::Mobile,
        tier: QualityTier::Performance,
        reduced_motion: true,
        coarse_pointer: true,
        device_pixel_ratio: 3.0,
        logical_w: 390.0,
        logical_h: 760.0,
        viewport_short_edge: 390.0,
    });
    // 0.56 (mobile) * 0.90 (dpr>=3) * 0.50 (reduced, mobile) * 0.72 (perf)
    assert!((p.fx_density - 0.56 * 0.90 * 0.50 * 0.72).abs() < 1e-4);
}

#[test]
fn fx_density_is_monotonic_in_tier() {
    for device in [DeviceClass::Mobile, DeviceClass::Tablet, DeviceClass::Desktop] {
        let q = compute_profile(&inputs(device, QualityTier::Quality, false)).fx_density;
        let b = compute_profile(&inputs(device, QualityTier::Balanced, false)).fx_density;
        let p = compute_profile(&inputs(device, QualityTier::Performance, false)).fx_density;
        assert!(q >= b && b >= p, "tier discount not monotonic on {device:?}");
    }
}

#[test]
fn every_coefficient_stays_in_its_safe_range() {
    for device in [DeviceClass::Mobile, DeviceClass::Tablet, DeviceClass::Desktop] {
        for tier in [
            QualityTier::Quality,
            QualityTier::Balanced,
            QualityTier::Performance,
        ] {
            for reduced in [false, true] {
                for dpr in [1.0, 2.0, 3.5] {
                    let mut i = inputs(device, tier, reduced);
                    i.device_pixel_ratio = dpr;
                    let p = compute_profile(&i);
                    assert!((0.80..=1.10).contains(&p.ui_scale));
                    assert!((0.78..=1.08).contains(&p.hud_scale));
                    assert!((0.14..=1.0).contains(&p.fx_density));
                    assert!((0.14..=1.06).contains(&p.particle_density));
                    assert!((0.62..=1.02).contains(&p.pause_scale));
                    assert!((0.26..=1.0).contains(&p.background_motion_scale));
                    assert!((0.28..=1.0).contains(&p.rotation_motion_scale));
                    assert!((0.82..=1.05).contains(&p.float_text_scale));
                    assert!(p.tap_target_px >= 40.0);
                    assert!((8.0..=14.0).contains(&p.hud_inset_top_px));
                    assert!((8.0..=14.0).contains(&p.hud_inset_side_px));
                    assert!(p.fruit_radius_min > 0.0);
                    assert!(p.fruit_radius_max > p.fruit_radius_min);
                }
            }
        }
    }
}

#[test]
fn coarse_pointer_guarantees_a_44px_tap_target() {
    let mut i = inputs(DeviceClass::Desktop, QualityTier::Quality, false);
    i.coarse_pointer = true;
    assert_eq!(compute_profile(&i).tap_target_px, 44.0);
}

#[test]
fn remap_is_proportional_to_the_resolution_change() {
    let remap = ResizeRemap::between(1280.0, 720.0, 640.0, 360.0).unwrap();
    assert_eq!(remap.scale_x, 0.5);
    assert_eq!(remap.scale_y, 0.5);
    assert_eq!(remap.min_scale(), 0.5);
    assert!(!remap.is_identity());

    let identity = ResizeRemap::between(1280.0, 720.0, 1280.0, 720.0).unwrap();
    assert!(identity.is_identity());
}

#[test]
fn remap_rejects_degenerate_targets() {
    assert!(ResizeRemap::between(1280.0, 720.0, 0.0, 360.0).is_none());
    assert!(ResizeRemap::between(1280.0, 720.0, 640.0, -1.0).is_none());
    // Degenerate previous sizes fall back to the 1 px floor instead.
    assert!(ResizeRemap::between(0.0, 0.0, 640.0, 360.0).is_some());
}

#[test]
fn non_uniform_remap_uses_min_scale_for_radii() {
    let remap = ResizeRemap::between(1000.0, 1000.0, 2000.0, 1500.0).unwrap();
    assert_eq!(remap.scale_x, 2.0);
    assert_eq!(remap.scale_y, 1.5);
    assert_eq!(remap.min_scale(), 1.5);
}
