//! Canvas ownership: backing-store sizing, the logical-to-physical transform,
//! and the per-frame surface reset.

use crate::dom;
use fruitfall_core::{
    draw_fix_scale_y, physical_extent, render_scale_cap, QualityMode, QualityTier,
    ViewportSnapshot,
};
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct ViewportConfig {
    pub logical_w: f32,
    pub logical_h: f32,
    pub mode: QualityMode,
    pub tier: QualityTier,
}

/// An off-screen composition surface.
pub struct Layer {
    pub canvas: web::HtmlCanvasElement,
    pub ctx: web::CanvasRenderingContext2d,
}

pub struct ViewportRenderer {
    canvas: web::HtmlCanvasElement,
    ctx: web::CanvasRenderingContext2d,
    document: web::Document,
    root: web::HtmlElement,
    snapshot: ViewportSnapshot,
    mode: QualityMode,
    tier: QualityTier,
}

impl ViewportRenderer {
    pub fn new(
        canvas: web::HtmlCanvasElement,
        ctx: web::CanvasRenderingContext2d,
        document: web::Document,
        root: web::HtmlElement,
    ) -> Self {
        Self {
            canvas,
            ctx,
            document,
            root,
            snapshot: ViewportSnapshot::default(),
            mode: QualityMode::Auto,
            tier: QualityTier::Quality,
        }
    }

    pub fn ctx(&self) -> &web::CanvasRenderingContext2d {
        &self.ctx
    }

    pub fn canvas(&self) -> &web::HtmlCanvasElement {
        &self.canvas
    }

    pub fn snapshot(&self) -> ViewportSnapshot {
        self.snapshot
    }

    /// Re-resolve the render scale and backing-store size. The canvas is only
    /// touched when the physical size actually changed; reallocating the
    /// surface is expensive.
    pub fn configure(&mut self, cfg: &ViewportConfig) -> ViewportSnapshot {
        if cfg.logical_w.is_finite() && cfg.logical_w > 0.0 {
            self.snapshot.logical_w = cfg.logical_w;
        }
        if cfg.logical_h.is_finite() && cfg.logical_h > 0.0 {
            self.snapshot.logical_h = cfg.logical_h;
        }
        self.mode = cfg.mode;
        self.tier = cfg.tier;

        self.refresh_rect_cache();
        let dpr = dom::device_pixel_ratio();
        let render_scale = render_scale_cap(self.mode, self.tier, dpr);
        self.snapshot.device_pixel_ratio = dpr;
        self.snapshot.render_scale = render_scale;

        let physical_w = physical_extent(self.snapshot.logical_w, render_scale);
        let physical_h = physical_extent(self.snapshot.logical_h, render_scale);
        if self.canvas.width() != physical_w {
            self.canvas.set_width(physical_w);
        }
        if self.canvas.height() != physical_h {
            self.canvas.set_height(physical_h);
        }

        let s = render_scale as f64;
        let _ = self.ctx.set_transform(s, 0.0, 0.0, s, 0.0, 0.0);
        self.ctx.set_image_smoothing_enabled(true);
        self.ctx
            .set_image_smoothing_quality(web::ImageSmoothingQuality::High);

        dom::set_root_css_prop(&self.root, "--render-scale", &format!("{render_scale:.3}"));
        dom::set_root_attr(&self.root, "data-quality-tier", self.tier.as_str());

        self.snapshot
    }

    pub fn refresh_rect_cache(&mut self) {
        let rect = self.canvas.get_bounding_client_rect();
        let css_w = rect.width() as f32;
        let css_h = rect.height() as f32;
        self.snapshot.css_w = if css_w > 0.0 {
            css_w.round().max(1.0)
        } else {
            self.snapshot.logical_w
        };
        self.snapshot.css_h = if css_h > 0.0 {
            css_h.round().max(1.0)
        } else {
            self.snapshot.logical_h
        };
        self.snapshot.draw_fix_scale_y = draw_fix_scale_y(
            self.snapshot.css_w,
            self.snapshot.css_h,
            self.snapshot.logical_w,
            self.snapshot.logical_h,
        );
    }

    /// Reset the surface for a new frame. The clear runs under an identity
    /// transform over the full physical extent; a scaled clear-rect would
    /// miss pixels outside the logical bounds after a scale-down.
    pub fn pre_frame(&self) {
        let _ = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        self.ctx.clear_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
        let s = self.snapshot.render_scale as f64;
        let _ = self.ctx.set_transform(s, 0.0, 0.0, s, 0.0, 0.0);
        self.ctx.set_global_alpha(1.0);
        let _ = self.ctx.set_global_composite_operation("source-over");
    }

    pub fn create_layer(&self, width: f32, height: f32) -> Option<Layer> {
        let w = width.round().max(1.0) as u32;
        let h = height.round().max(1.0) as u32;
        let canvas: web::HtmlCanvasElement = self
            .document
            .create_element("canvas")
            .ok()?
            .dyn_into()
            .ok()?;
        canvas.set_width(w);
        canvas.set_height(h);
        let ctx: web::CanvasRenderingContext2d =
            self.canvas_context(&canvas)?;
        ctx.set_image_smoothing_enabled(true);
        ctx.set_image_smoothing_quality(web::ImageSmoothingQuality::High);
        Some(Layer { canvas, ctx })
    }

    fn canvas_context(
        &self,
        canvas: &web::HtmlCanvasElement,
    ) -> Option<web::CanvasRenderingContext2d> {
        canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into()
            .ok()
    }
}
