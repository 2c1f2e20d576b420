//! The asset raster cache: core ledger policy paired with off-screen canvas
//! bitmaps, plus the tinted-source cache for pop effects.

use fnv::FnvHashMap;
use fruitfall_core::{
    parse_hex_color, plan_raster, tint_pixels, RasterKey, RasterLedger, TINT_ALPHA_CUTOFF,
};
use std::collections::HashSet;
use wasm_bindgen::{Clamped, JsCast};
use web_sys as web;

/// A cached raster: the off-screen bitmap plus the logical size it draws at.
#[derive(Clone)]
pub struct RasterEntry {
    pub canvas: web::HtmlCanvasElement,
    pub draw_w: f32,
    pub draw_h: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct RasterStats {
    pub raster_entries: usize,
    pub raster_bytes: usize,
    pub tint_entries: usize,
    pub budget_bytes: usize,
}

pub struct AssetRasterCache {
    document: web::Document,
    ledger: RasterLedger<RasterEntry>,
    tints: FnvHashMap<String, web::HtmlCanvasElement>,
    tint_fallbacks_logged: HashSet<String>,
}

impl AssetRasterCache {
    pub fn new(document: web::Document, budget_bytes: usize) -> Self {
        Self {
            document,
            ledger: RasterLedger::new(budget_bytes),
            tints: FnvHashMap::default(),
            tint_fallbacks_logged: HashSet::new(),
        }
    }

    /// Rasterize `img` at the bucketed target size, or return the cached
    /// bitmap. `None` means the caller should draw the source directly.
    pub fn get_sprite_raster(
        &mut self,
        sprite_key: &str,
        img: &web::HtmlImageElement,
        target_w: f32,
        target_h: f32,
        dpr: f32,
    ) -> Option<RasterEntry> {
        if target_w <= 0.0 || target_h <= 0.0 {
            return None;
        }
        let src_w = img.natural_width();
        let src_h = img.natural_height();
        if src_w == 0 || src_h == 0 {
            return None;
        }

        let key = RasterKey::new(sprite_key, target_w, target_h, dpr);
        if let Some(entry) = self.ledger.get(&key) {
            return Some(entry.clone());
        }

        let plan = plan_raster(src_w, src_h, &key)?;
        let canvas = self.create_canvas(plan.raster_w, plan.raster_h)?;
        let ctx = context_2d(&canvas)?;
        ctx.set_image_smoothing_enabled(true);
        ctx.set_image_smoothing_quality(web::ImageSmoothingQuality::High);
        ctx.draw_image_with_html_image_element_and_dw_and_dh(
            img,
            0.0,
            0.0,
            plan.raster_w as f64,
            plan.raster_h as f64,
        )
        .ok()?;

        let entry = RasterEntry {
            canvas,
            draw_w: plan.draw_w,
            draw_h: plan.draw_h,
        };
        self.ledger.insert(key, entry.clone(), plan.bytes);
        Some(entry)
    }

    /// Luminance-preserving recolor of `base_img`, cached by normalized hex
    /// color. When pixel readback is unavailable (tainted canvas) this falls
    /// back to a flat `source-in` fill, which loses the luma shading — a
    /// visibly different result, logged once per color.
    pub fn get_fruit_pop_tint_source(
        &mut self,
        base_img: &web::HtmlImageElement,
        tint_color: &str,
    ) -> Option<web::HtmlCanvasElement> {
        let tint = parse_hex_color(tint_color)?;
        if let Some(cached) = self.tints.get(&tint.key) {
            return Some(cached.clone());
        }

        let src_w = base_img.natural_width().max(1);
        let src_h = base_img.natural_height().max(1);
        let canvas = self.create_canvas(src_w, src_h)?;
        let ctx = context_2d(&canvas)?;
        ctx.set_image_smoothing_enabled(true);
        ctx.set_image_smoothing_quality(web::ImageSmoothingQuality::High);
        ctx.draw_image_with_html_image_element(base_img, 0.0, 0.0)
            .ok()?;

        match ctx.get_image_data(0.0, 0.0, src_w as f64, src_h as f64) {
            Ok(image_data) => {
                let mut pixels = image_data.data().0;
                tint_pixels(&mut pixels, &tint, TINT_ALPHA_CUTOFF);
                let recolored = web::ImageData::new_with_u8_clamped_array_and_sh(
                    Clamped(pixels.as_slice()),
                    src_w,
                    src_h,
                )
                .ok()?;
                ctx.put_image_data(&recolored, 0.0, 0.0).ok()?;
            }
            Err(_) => {
                if self.tint_fallbacks_logged.insert(tint.key.clone()) {
                    log::warn!(
                        "[raster] tint readback unavailable for {}; using flat source-in fill",
                        tint.key
                    );
                }
                let _ = ctx.set_global_composite_operation("source-in");
                ctx.set_fill_style_str(&tint.key);
                ctx.fill_rect(0.0, 0.0, src_w as f64, src_h as f64);
                let _ = ctx.set_global_composite_operation("source-over");
            }
        }

        self.tints.insert(tint.key, canvas.clone());
        Some(canvas)
    }

    /// Drop every rasterized sprite (logical resolution or render scale
    /// changed); tinted sources are resolution-independent and survive.
    pub fn clear_sprite_raster_cache(&mut self) {
        self.ledger.clear();
    }

    pub fn stats(&self) -> RasterStats {
        RasterStats {
            raster_entries: self.ledger.len(),
            raster_bytes: self.ledger.bytes(),
            tint_entries: self.tints.len(),
            budget_bytes: self.ledger.budget(),
        }
    }

    fn create_canvas(&self, w: u32, h: u32) -> Option<web::HtmlCanvasElement> {
        let canvas: web::HtmlCanvasElement = self
            .document
            .create_element("canvas")
            .ok()?
            .dyn_into()
            .ok()?;
        canvas.set_width(w.max(1));
        canvas.set_height(h.max(1));
        Some(canvas)
    }
}

fn context_2d(canvas: &web::HtmlCanvasElement) -> Option<web::CanvasRenderingContext2d> {
    canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}
