//! Keeps the backing store in device pixels while drawing happens in CSS pixels.

use crate::api::{snapshot, CanvasRenderingContext2D, ImageData, LineCap, Paint};
use crate::config::SurfaceStyle;
use crate::error::Result;
use crate::geometry::LineSegment;
use crate::viewport::ViewportMetrics;

/// Owns the raster buffer of the one reusable drawing surface.
pub struct Surface<C> {
    canvas: C,
    style: SurfaceStyle,
    pen_width: f64,
    logical_width: f64,
    logical_height: f64,
    device_pixel_ratio: f64,
}

impl<C: CanvasRenderingContext2D> Surface<C> {
    pub fn new(canvas: C, style: SurfaceStyle, pen_width: f64) -> Self {
        let logical_width = canvas.backing_width() as f64;
        let logical_height = canvas.backing_height() as f64;
        Self {
            canvas,
            style,
            pen_width,
            logical_width,
            logical_height,
            device_pixel_ratio: 1.0,
        }
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    /// CSS size the element is pinned to.
    pub fn logical_size(&self) -> (f64, f64) {
        (self.logical_width, self.logical_height)
    }

    pub fn backing_size(&self) -> (u32, u32) {
        (self.canvas.backing_width(), self.canvas.backing_height())
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    pub fn pen_width(&self) -> f64 {
        self.pen_width
    }

    /// Matches the backing store to `metrics` and installs the dpr scale.
    /// Returns whether the store had to be reallocated.
    pub fn resize_to_match_container(&mut self, metrics: &ViewportMetrics) -> Result<bool> {
        let (w, h) = metrics.device_size();
        let reallocated = self.backing_size() != (w, h);
        if reallocated {
            self.canvas.set_backing_size(w, h)?;
        }
        self.logical_width = metrics.width;
        self.logical_height = metrics.height;
        self.device_pixel_ratio = metrics.device_pixel_ratio;

        let dpr = metrics.device_pixel_ratio;
        self.canvas.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
        Ok(reallocated)
    }

    /// Fills the whole store opaquely and installs the pen style.
    pub fn paint_background(&mut self) -> Result<()> {
        let (w, h) = self.backing_size();
        self.canvas.set_fill_style(Paint::Color(self.style.background.clone()))?;
        // The rect is in device pixels under the dpr scale, so it over-covers.
        self.canvas.fill_rect(0.0, 0.0, w as f64, h as f64)?;
        self.canvas.set_stroke_style(Paint::Color(self.style.ink.clone()))?;
        self.canvas.set_line_cap(LineCap::Round)?;
        self.canvas.set_line_width(self.pen_width)?;
        Ok(())
    }

    /// The only way content is erased.
    pub fn clear(&mut self, metrics: &ViewportMetrics) -> Result<()> {
        self.resize_to_match_container(metrics)?;
        self.paint_background()
    }

    pub fn set_pen_width(&mut self, width: f64) -> Result<()> {
        self.pen_width = width;
        self.canvas.set_line_width(width)
    }

    pub fn draw_segment(&mut self, segment: &LineSegment) -> Result<()> {
        self.canvas.begin_path()?;
        self.canvas.move_to(segment.from.x, segment.from.y)?;
        self.canvas.line_to(segment.to.x, segment.to.y)?;
        self.canvas.stroke()
    }

    /// Reads the full backing store; used at commit.
    pub fn snapshot(&self) -> Result<ImageData> {
        snapshot(&self.canvas)
    }
}
