//! Raster-cache policy: key bucketing, the byte-budgeted LRU ledger, and the
//! luminance-preserving tint math.
//!
//! The ledger is generic over the stored bitmap handle so the policy can be
//! exercised on the host without a canvas. The web crate pairs it with
//! off-screen canvas elements.

use fnv::FnvHashMap;
use std::collections::VecDeque;

pub const RASTER_BUDGET_DEFAULT_BYTES: usize = 48 * 1024 * 1024;
pub const RASTER_BUDGET_FLOOR_BYTES: usize = 4 * 1024 * 1024;
pub const TINT_ALPHA_CUTOFF: u8 = 6; // alpha at/under this is zeroed to avoid halos

/// Normalize `#rgb`/`#rrggbb` (any case, surrounding whitespace) to a
/// lowercase 6-digit `#rrggbb`. Returns `None` for anything else.
pub fn normalize_hex_color(color: &str) -> Option<String> {
    let trimmed = color.trim();
    let body = trimmed.strip_prefix('#')?;
    if !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match body.len() {
        3 => {
            let mut out = String::with_capacity(7);
            out.push('#');
            for c in body.chars() {
                let lc = c.to_ascii_lowercase();
                out.push(lc);
                out.push(lc);
            }
            Some(out)
        }
        6 => Some(format!("#{}", body.to_ascii_lowercase())),
        _ => None,
    }
}

/// A parsed tint color keyed by its normalized hex form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TintColor {
    pub key: String,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub fn parse_hex_color(color: &str) -> Option<TintColor> {
    let key = normalize_hex_color(color)?;
    let r = u8::from_str_radix(&key[1..3], 16).ok()?;
    let g = u8::from_str_radix(&key[3..5], 16).ok()?;
    let b = u8::from_str_radix(&key[5..7], 16).ok()?;
    Some(TintColor { key, r, g, b })
}

/// Quantize a requested draw size to the cache bucket: the larger dimension
/// floored to a multiple of 4, never below 4. Collapses continuous
/// zoom/resize requests onto a small set of keys.
pub fn size_bucket(target_w: f32, target_h: f32) -> u32 {
    let largest = target_w.max(target_h).max(0.0);
    (((largest / 4.0).floor() as u32) * 4).max(4)
}

/// Quantize a device-pixel-ratio to hundredths, floored at 1.0.
pub fn dpr_bucket(dpr: f32) -> u32 {
    let safe = if dpr.is_finite() { dpr.max(1.0) } else { 1.0 };
    ((safe * 100.0).round() as u32).max(100)
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RasterKey {
    pub sprite: String,
    pub size_bucket: u32,
    pub dpr_hundredths: u32,
}

impl RasterKey {
    pub fn new(sprite: &str, target_w: f32, target_h: f32, dpr: f32) -> Self {
        Self {
            sprite: sprite.to_string(),
            size_bucket: size_bucket(target_w, target_h),
            dpr_hundredths: dpr_bucket(dpr),
        }
    }
}

/// Physical raster dimensions and byte cost for one cache entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterPlan {
    pub raster_w: u32,
    pub raster_h: u32,
    /// Logical draw size the raster maps back to (physical / DPR).
    pub draw_w: f32,
    pub draw_h: f32,
    pub bytes: usize,
}

/// Estimated RGBA8 cost of a surface.
#[inline]
pub fn estimate_rgba_bytes(w: u32, h: u32) -> usize {
    w.max(1) as usize * h.max(1) as usize * 4
}

/// Scale a source image onto the bucketed size (largest dimension fits the
/// bucket, aspect preserved) and expand by the DPR for the backing store.
/// Returns `None` when the source has no area.
pub fn plan_raster(src_w: u32, src_h: u32, key: &RasterKey) -> Option<RasterPlan> {
    if src_w == 0 || src_h == 0 {
        return None;
    }
    let dpr = key.dpr_hundredths as f32 / 100.0;
    let scale = key.size_bucket as f32 / src_w.max(src_h) as f32;
    let draw_w = (src_w as f32 * scale).round().max(1.0);
    let draw_h = (src_h as f32 * scale).round().max(1.0);
    let raster_w = (draw_w * dpr).round().max(1.0) as u32;
    let raster_h = (draw_h * dpr).round().max(1.0) as u32;
    Some(RasterPlan {
        raster_w,
        raster_h,
        draw_w: raster_w as f32 / dpr,
        draw_h: raster_h as f32 / dpr,
        bytes: estimate_rgba_bytes(raster_w, raster_h),
    })
}

/// Byte-budgeted LRU ledger over bitmap handles of type `T`.
///
/// Insertion order doubles as recency order: a hit re-inserts its key at the
/// back, eviction pops from the front. The live-byte sum never exceeds the
/// budget (floor-clamped at [`RASTER_BUDGET_FLOOR_BYTES`]).
pub struct RasterLedger<T> {
    entries: FnvHashMap<RasterKey, (T, usize)>,
    order: VecDeque<RasterKey>,
    bytes: usize,
    budget: usize,
}

impl<T> RasterLedger<T> {
    pub fn new(budget_bytes: usize) -> Self {
        Self {
            entries: FnvHashMap::default(),
            order: VecDeque::new(),
            bytes: 0,
            budget: budget_bytes.max(RASTER_BUDGET_FLOOR_BYTES),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Look up an entry, promoting it to most-recently-used on a hit.
    pub fn get(&mut self, key: &RasterKey) -> Option<&T> {
        if !self.entries.contains_key(key) {
            return None;
        }
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
            self.order.push_back(key.clone());
        }
        self.entries.get(key).map(|(v, _)| v)
    }

    /// Insert an entry, evicting least-recently-used entries until the new
    /// total fits the budget. An entry larger than the whole budget is still
    /// admitted once the ledger is empty; the invariant then holds again
    /// from the next insertion.
    pub fn insert(&mut self, key: RasterKey, value: T, bytes: usize) {
        self.remove(&key);
        while self.bytes + bytes > self.budget {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some((_, b)) = self.entries.remove(&oldest) {
                self.bytes = self.bytes.saturating_sub(b);
            }
        }
        self.bytes += bytes;
        self.order.push_back(key.clone());
        self.entries.insert(key, (value, bytes));
    }

    fn remove(&mut self, key: &RasterKey) {
        if let Some((_, b)) = self.entries.remove(key) {
            self.bytes = self.bytes.saturating_sub(b);
            if let Some(pos) = self.order.iter().position(|k| k == key) {
                self.order.remove(pos);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.bytes = 0;
    }

    /// Keys in recency order (oldest first). Exposed for tests and stats.
    pub fn keys_oldest_first(&self) -> impl Iterator<Item = &RasterKey> {
        self.order.iter()
    }
}

/// Recolor RGBA8 pixels in place, preserving luminance: each pixel above the
/// alpha cutoff becomes `tint_channel * luma / 255`; pixels at/under the
/// cutoff are fully zeroed so scaled-up rasters do not halo.
pub fn tint_pixels(pixels: &mut [u8], tint: &TintColor, alpha_cutoff: u8) {
    for px in pixels.chunks_exact_mut(4) {
        if px[3] <= alpha_cutoff {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            px[3] = 0;
            continue;
        }
        let luma =
            ((px[0] as u32 * 77 + px[1] as u32 * 150 + px[2] as u32 * 29) >> 8).min(255);
        px[0] = ((tint.r as u32 * luma + 127) / 255) as u8;
        px[1] = ((tint.g as u32 * luma + 127) / 255) as u8;
        px[2] = ((tint.b as u32 * luma + 127) / 255) as u8;
    }
}
