//! Cairo backend implementing the canvas traits over an ARGB32 image surface,
//! behind the optional `cairo` crate feature.

use cairo::{Context, Format, ImageSurface, LineCap as CairoLineCap, Operator};

use crate::api::*;
use crate::error::{Result, SigpadError};

/// Adapter that translates canvas calls into Cairo operations on an owned surface.
pub struct CairoCanvas {
    surface: ImageSurface,
    ctx: Context,
    fill_style: Paint,
    stroke_style: Paint,
    has_current_point: bool,
}

impl CairoCanvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let (surface, ctx) = create_surface(width, height)?;
        Ok(Self {
            surface,
            ctx,
            fill_style: Paint::Color("#000000".into()),
            stroke_style: Paint::Color("#000000".into()),
            has_current_point: false,
        })
    }

    pub fn surface(&self) -> &ImageSurface {
        &self.surface
    }

    fn apply_paint(&self, paint: &Paint) {
        let [r, g, b, a] = paint.rgba();
        self.ctx.set_source_rgba(
            r as f64 / 255.0,
            g as f64 / 255.0,
            b as f64 / 255.0,
            a as f64 / 255.0,
        );
    }

    fn image_surface_from_rgba(&self, image: &ImageData) -> Result<ImageSurface> {
        let width = image.width;
        let height = image.height;
        let data = image.data.as_slice();

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or(SigpadError::InvalidDimensions { width, height })?;
        if data.len() != expected {
            return Err(SigpadError::InvalidDimensions { width, height });
        }

        let mut buf = vec![0u8; expected];
        for (i, chunk) in data.chunks_exact(4).enumerate() {
            let r = chunk[0] as u16;
            let g = chunk[1] as u16;
            let b = chunk[2] as u16;
            let a = chunk[3] as u16;
            let pr = (r * a + 127) / 255;
            let pg = (g * a + 127) / 255;
            let pb = (b * a + 127) / 255;
            let idx = i * 4;
            // Cairo ARgb32 expects premultiplied alpha with native-endian (BGRA on little-endian).
            buf[idx] = pb as u8;
            buf[idx + 1] = pg as u8;
            buf[idx + 2] = pr as u8;
            buf[idx + 3] = a as u8;
        }

        let stride = (width * 4) as i32;
        let surface = ImageSurface::create_for_data(buf, Format::ARgb32, width as i32, height as i32, stride)?;
        Ok(surface)
    }
}

fn create_surface(width: u32, height: u32) -> Result<(ImageSurface, Context)> {
    if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
        return Err(SigpadError::InvalidDimensions { width, height });
    }
    let surface = ImageSurface::create(Format::ARgb32, width as i32, height as i32)?;
    let ctx = Context::new(&surface)?;
    Ok((surface, ctx))
}

impl CanvasTransforms for CairoCanvas {
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<()> {
        let matrix = cairo::Matrix::new(a, b, c, d, e, f);
        self.ctx.set_matrix(matrix);
        Ok(())
    }

    fn get_transform(&self) -> Result<Matrix> {
        let m = self.ctx.matrix();
        Ok([m.xx(), m.yx(), m.xy(), m.yy(), m.x0(), m.y0()])
    }
}

impl CanvasLineStyles for CairoCanvas {
    fn set_line_width(&mut self, value: f64) -> Result<()> {
        if value.is_finite() && value > 0.0 {
            self.ctx.set_line_width(value);
        }
        Ok(())
    }

    fn line_width(&self) -> Result<f64> {
        Ok(self.ctx.line_width())
    }

    fn set_line_cap(&mut self, value: LineCap) -> Result<()> {
        self.ctx.set_line_cap(map_line_cap(value));
        Ok(())
    }

    fn line_cap(&self) -> Result<LineCap> {
        Ok(map_line_cap_back(self.ctx.line_cap()))
    }
}

impl CanvasFillStrokeStyles for CairoCanvas {
    fn set_fill_style(&mut self, style: Paint) -> Result<()> {
        self.fill_style = style;
        Ok(())
    }

    fn fill_style(&self) -> Result<Paint> {
        Ok(self.fill_style.clone())
    }

    fn set_stroke_style(&mut self, style: Paint) -> Result<()> {
        self.stroke_style = style;
        Ok(())
    }

    fn stroke_style(&self) -> Result<Paint> {
        Ok(self.stroke_style.clone())
    }
}

impl CanvasRectangles for CairoCanvas {
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        // fillRect() does not disturb the current path.
        let path = self.ctx.copy_path()?;
        self.ctx.new_path();
        self.ctx.rectangle(x, y, w, h);
        self.apply_paint(&self.fill_style);
        self.ctx.fill()?;
        self.ctx.append_path(&path);
        Ok(())
    }
}

impl CanvasPaths for CairoCanvas {
    fn begin_path(&mut self) -> Result<()> {
        self.ctx.new_path();
        self.has_current_point = false;
        Ok(())
    }

    fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.ctx.move_to(x, y);
        self.has_current_point = true;
        Ok(())
    }

    fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        if !self.has_current_point {
            self.move_to(x, y)?;
        }
        self.ctx.line_to(x, y);
        Ok(())
    }

    fn stroke(&mut self) -> Result<()> {
        self.apply_paint(&self.stroke_style);
        self.ctx.stroke_preserve()?;
        Ok(())
    }
}

impl CanvasImageData for CairoCanvas {
    fn get_image_data(&self, sx: u32, sy: u32, sw: u32, sh: u32) -> Result<ImageData> {
        let mut out = ImageData::new(sw, sh);
        let width = self.surface.width().max(0) as u32;
        let height = self.surface.height().max(0) as u32;
        let stride = self.surface.stride().max(0) as usize;

        self.surface.flush();
        self.surface.with_data(|data| {
            for row in 0..sh {
                let y = sy.saturating_add(row);
                if y >= height {
                    break;
                }
                for col in 0..sw {
                    let x = sx.saturating_add(col);
                    if x >= width {
                        break;
                    }
                    let src = y as usize * stride + x as usize * 4;
                    let Some(px) = data.get(src..src + 4) else {
                        continue;
                    };
                    let pixel = u32::from_ne_bytes([px[0], px[1], px[2], px[3]]);
                    let a = (pixel >> 24) & 0xff;
                    let demultiply = |c: u32| if a == 0 { 0 } else { ((c * 255 + a / 2) / a).min(255) as u8 };
                    let dst = ((row * sw + col) * 4) as usize;
                    out.data[dst] = demultiply((pixel >> 16) & 0xff);
                    out.data[dst + 1] = demultiply((pixel >> 8) & 0xff);
                    out.data[dst + 2] = demultiply(pixel & 0xff);
                    out.data[dst + 3] = a as u8;
                }
            }
        })?;
        Ok(out)
    }

    fn put_image_data(&mut self, data: &ImageData, dx: f64, dy: f64) -> Result<()> {
        let source = self.image_surface_from_rgba(data)?;
        let dx = dx.round();
        let dy = dy.round();

        self.ctx.save()?;
        self.ctx.identity_matrix();
        self.ctx.new_path();
        self.ctx.set_operator(Operator::Source);
        self.ctx.set_source_surface(&source, dx, dy)?;
        self.ctx.rectangle(dx, dy, data.width as f64, data.height as f64);
        self.ctx.fill()?;
        self.ctx.restore()?;
        Ok(())
    }
}

impl CanvasBackingStore for CairoCanvas {
    fn backing_width(&self) -> u32 {
        self.surface.width().max(0) as u32
    }

    fn backing_height(&self) -> u32 {
        self.surface.height().max(0) as u32
    }

    fn set_backing_size(&mut self, width: u32, height: u32) -> Result<()> {
        let (surface, ctx) = create_surface(width, height)?;
        self.surface = surface;
        self.ctx = ctx;
        self.fill_style = Paint::Color("#000000".into());
        self.stroke_style = Paint::Color("#000000".into());
        self.has_current_point = false;
        Ok(())
    }
}

impl CanvasRenderingContext2D for CairoCanvas {}

fn map_line_cap(cap: LineCap) -> CairoLineCap {
    match cap {
        LineCap::Butt => CairoLineCap::Butt,
        LineCap::Round => CairoLineCap::Round,
        LineCap::Square => CairoLineCap::Square,
    }
}

fn map_line_cap_back(cap: CairoLineCap) -> LineCap {
    match cap {
        CairoLineCap::Round => LineCap::Round,
        CairoLineCap::Square => LineCap::Square,
        _ => LineCap::Butt,
    }
}
