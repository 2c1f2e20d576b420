// Cache-key bucketing, the byte-budget invariant, and tint math.

use fruitfall_core::{
    dpr_bucket, estimate_rgba_bytes, normalize_hex_color, parse_hex_color, plan_raster,
    size_bucket, tint_pixels, RasterKey, RasterLedger, RASTER_BUDGET_FLOOR_BYTES,
    TINT_ALPHA_CUTOFF,
};

const MIB: usize = 1024 * 1024;

fn key(sprite: &str) -> RasterKey {
    RasterKey::new(sprite, 40.0, 40.0, 1.0)
}

#[test]
fn hex_normalization_handles_case_shorthand_and_whitespace() {
    assert_eq!(normalize_hex_color("#FF0000").as_deref(), Some("#ff0000"));
    assert_eq!(normalize_hex_color("#ff0000").as_deref(), Some("#ff0000"));
    assert_eq!(normalize_hex_color("#AbC").as_deref(), Some("#aabbcc"));
    assert_eq!(normalize_hex_color("  #A1B2C3  ").as_deref(), Some("#a1b2c3"));
    assert_eq!(normalize_hex_color("red"), None);
    assert_eq!(normalize_hex_color("#12345"), None);
    assert_eq!(normalize_hex_color("#gg0000"), None);
    assert_eq!(normalize_hex_color(""), None);
}

#[test]
fn tint_color_normalization_is_case_insensitive() {
    let upper = parse_hex_color("#FF0000").unwrap();
    let lower = parse_hex_color("#ff0000").unwrap();
    assert_eq!(upper, lower);
    assert_eq!(upper.key, "#ff0000");
    assert_eq!((upper.r, upper.g, upper.b), (255, 0, 0));
}

#[test]
fn near_duplicate_draw_sizes_share_a_bucket() {
    // Differ by less than the 4 px granularity at equal DPR: one key.
    let a = RasterKey::new("bonus_star", 40.0, 40.0, 1.0);
    let b = RasterKey::new("bonus_star", 42.0, 41.0, 1.0);
    assert_eq!(a, b);
}

#[test]
fn bucket_uses_larger_dimension_with_a_floor() {
    assert_eq!(size_bucket(40.0, 40.0), 40);
    assert_eq!(size_bucket(10.0, 43.0), 40);
    assert_eq!(size_bucket(44.0, 8.0), 44);
    assert_eq!(size_bucket(1.0, 1.0), 4);
    assert_eq!(size_bucket(0.0, 0.0), 4);
}

#[test]
fn dpr_quantizes_to_hundredths_with_unit_floor() {
    assert_eq!(dpr_bucket(1.0), 100);
    assert_eq!(dpr_bucket(0.5), 100);
    assert_eq!(dpr_bucket(2.0), 200);
    assert_eq!(dpr_bucket(2.004), 200);
    assert_eq!(dpr_bucket(2.006), 201);
    assert_eq!(dpr_bucket(f32::NAN), 100);
}

#[test]
fn raster_plan_scales_source_to_bucket_and_dpr() {
    let key = RasterKey::new("apple", 40.0, 40.0, 2.0);
    let plan = plan_raster(128, 128, &key).unwrap();
    assert_eq!(plan.raster_w, 80);
    assert_eq!(plan.raster_h, 80);
    assert_eq!(plan.draw_w, 40.0);
    assert_eq!(plan.draw_h, 40.0);
    assert_eq!(plan.bytes, estimate_rgba_bytes(80, 80));
}

#[test]
fn raster_plan_preserves_aspect_and_rejects_empty_sources() {
    let key = RasterKey::new("banner", 64.0, 64.0, 1.0);
    let plan = plan_raster(200, 100, &key).unwrap();
    assert_eq!(plan.raster_w, 64);
    assert_eq!(plan.raster_h, 32);
    assert!(plan_raster(0, 100, &key).is_none());
    assert!(plan_raster(100, 0, &key).is_none());
}

#[test]
fn ledger_never_exceeds_its_budget() {
    let mut ledger: RasterLedger<u32> = RasterLedger::new(RASTER_BUDGET_FLOOR_BYTES);
    for i in 0..32 {
        ledger.insert(key(&format!("sprite_{i}")), i, MIB);
        assert!(ledger.bytes() <= ledger.budget());
    }
    assert_eq!(ledger.len(), 4);
}

#[test]
fn budget_configuration_is_floor_clamped() {
    let ledger: RasterLedger<()> = RasterLedger::new(1);
    assert_eq!(ledger.budget(), RASTER_BUDGET_FLOOR_BYTES);
    let ledger: RasterLedger<()> = RasterLedger::new(48 * MIB);
    assert_eq!(ledger.budget(), 48 * MIB);
}

#[test]
fn eviction_is_least_recently_used_with_touch_promotion() {
    let mut ledger: RasterLedger<&str> = RasterLedger::new(4 * MIB);
    ledger.insert(key("a"), "a", MIB);
    ledger.insert(key("b"), "b", MIB);
    ledger.insert(key("c"), "c", MIB);
    ledger.insert(key("d"), "d", MIB);
    // Touch the oldest entry so it survives the next eviction.
    assert_eq!(ledger.get(&key("a")), Some(&"a"));
    ledger.insert(key("e"), "e", MIB);
    assert!(ledger.get(&key("b")).is_none(), "b was LRU and must be gone");
    assert!(ledger.get(&key("a")).is_some());
    assert!(ledger.get(&key("e")).is_some());
    assert!(ledger.bytes() <= ledger.budget());
}

#[test]
fn reinserting_a_key_replaces_without_leaking_bytes() {
    let mut ledger: RasterLedger<u8> = RasterLedger::new(8 * MIB);
    ledger.insert(key("a"), 1, MIB);
    ledger.insert(key("a"), 2, 2 * MIB);
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.bytes(), 2 * MIB);
    assert_eq!(ledger.get(&key("a")), Some(&2));
}

#[test]
fn clear_empties_ledger_and_byte_count() {
    let mut ledger: RasterLedger<u8> = RasterLedger::new(8 * MIB);
    ledger.insert(key("a"), 1, MIB);
    ledger.insert(key("b"), 2, MIB);
    ledger.clear();
    assert!(ledger.is_empty());
    assert_eq!(ledger.bytes(), 0);
    assert!(ledger.get(&key("a")).is_none());
}

#[test]
fn tint_preserves_luminance_and_zeroes_cutoff_pixels() {
    let tint = parse_hex_color("#ff0000").unwrap();
    // White, mid gray, and a nearly transparent pixel.
    let mut pixels = vec![
        255, 255, 255, 255, //
        128, 128, 128, 255, //
        200, 200, 200, TINT_ALPHA_CUTOFF,
    ];
    tint_pixels(&mut pixels, &tint, TINT_ALPHA_CUTOFF);

    // White keeps full luminance in the tint channel only.
    assert_eq!(&pixels[0..4], &[255, 0, 0, 255]);
    // Mid gray keeps roughly half luminance.
    assert_eq!(pixels[4], 128);
    assert_eq!(&pixels[5..7], &[0, 0]);
    // At the cutoff the pixel is fully zeroed, alpha included.
    assert_eq!(&pixels[8..12], &[0, 0, 0, 0]);
}

#[test]
fn tint_channels_scale_with_the_tint_color() {
    let tint = parse_hex_color("#8040c0").unwrap();
    let mut pixels = vec![255, 255, 255, 255];
    tint_pixels(&mut pixels, &tint, TINT_ALPHA_CUTOFF);
    assert_eq!(&pixels[0..3], &[0x80, 0x40, 0xc0]);
}
