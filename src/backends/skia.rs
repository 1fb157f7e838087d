//! Software raster backend built on tiny-skia behind the `skia` crate feature.
//! Pixels are kept premultiplied in the pixmap and converted to straight alpha
//! at the ImageData boundary.

use tiny_skia::{
    ColorU8, LineCap as SkiaLineCap, Paint as SkiaPaint, PathBuilder, Pixmap,
    Rect as SkiaRect, Stroke, Transform,
};

use crate::api::*;
use crate::error::{Result, SigpadError};

#[derive(Clone, Debug)]
struct SkiaState {
    line_width: f64,
    line_cap: LineCap,
    fill_style: Paint,
    stroke_style: Paint,
    transform: Matrix,
}

impl Default for SkiaState {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            line_cap: LineCap::Butt,
            fill_style: Paint::Color("#000".into()),
            stroke_style: Paint::Color("#000".into()),
            transform: IDENTITY,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Segment {
    MoveTo(f64, f64),
    LineTo(f64, f64),
}

/// Adapter that translates canvas calls into tiny-skia pixmap operations.
pub struct SkiaCanvas {
    pixmap: Pixmap,
    state: SkiaState,
    path: Vec<Segment>,
}

impl SkiaCanvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            pixmap: new_pixmap(width, height)?,
            state: SkiaState::default(),
            path: Vec::new(),
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    fn transform(&self) -> Transform {
        let [a, b, c, d, e, f] = self.state.transform;
        Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
    }

    fn paint_for(style: &Paint) -> SkiaPaint<'static> {
        let [r, g, b, a] = style.rgba();
        let mut paint = SkiaPaint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;
        paint
    }
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap> {
    Pixmap::new(width, height).ok_or(SigpadError::InvalidDimensions { width, height })
}

impl CanvasTransforms for SkiaCanvas {
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<()> {
        self.state.transform = [a, b, c, d, e, f];
        Ok(())
    }

    fn get_transform(&self) -> Result<Matrix> {
        Ok(self.state.transform)
    }
}

impl CanvasLineStyles for SkiaCanvas {
    fn set_line_width(&mut self, value: f64) -> Result<()> {
        if value.is_finite() && value > 0.0 {
            self.state.line_width = value;
        }
        Ok(())
    }

    fn line_width(&self) -> Result<f64> {
        Ok(self.state.line_width)
    }

    fn set_line_cap(&mut self, value: LineCap) -> Result<()> {
        self.state.line_cap = value;
        Ok(())
    }

    fn line_cap(&self) -> Result<LineCap> {
        Ok(self.state.line_cap)
    }
}

impl CanvasFillStrokeStyles for SkiaCanvas {
    fn set_fill_style(&mut self, style: Paint) -> Result<()> {
        self.state.fill_style = style;
        Ok(())
    }

    fn fill_style(&self) -> Result<Paint> {
        Ok(self.state.fill_style.clone())
    }

    fn set_stroke_style(&mut self, style: Paint) -> Result<()> {
        self.state.stroke_style = style;
        Ok(())
    }

    fn stroke_style(&self) -> Result<Paint> {
        Ok(self.state.stroke_style.clone())
    }
}

impl CanvasRectangles for SkiaCanvas {
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        // Empty or non-finite rectangles paint nothing, as in the browser.
        let Some(rect) = SkiaRect::from_xywh(x as f32, y as f32, w as f32, h as f32) else {
            return Ok(());
        };
        let paint = Self::paint_for(&self.state.fill_style);
        let transform = self.transform();
        self.pixmap.fill_rect(rect, &paint, transform, None);
        Ok(())
    }
}

impl CanvasPaths for SkiaCanvas {
    fn begin_path(&mut self) -> Result<()> {
        self.path.clear();
        Ok(())
    }

    fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.path.push(Segment::MoveTo(x, y));
        Ok(())
    }

    fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        if self.path.is_empty() {
            self.path.push(Segment::MoveTo(x, y));
        }
        self.path.push(Segment::LineTo(x, y));
        Ok(())
    }

    fn stroke(&mut self) -> Result<()> {
        let mut pb = PathBuilder::new();
        for seg in &self.path {
            match *seg {
                Segment::MoveTo(x, y) => pb.move_to(x as f32, y as f32),
                Segment::LineTo(x, y) => pb.line_to(x as f32, y as f32),
            }
        }
        let Some(path) = pb.finish() else {
            return Ok(());
        };

        let stroke = Stroke {
            width: self.state.line_width as f32,
            line_cap: map_line_cap(self.state.line_cap),
            ..Stroke::default()
        };
        let paint = Self::paint_for(&self.state.stroke_style);
        let transform = self.transform();
        self.pixmap.stroke_path(&path, &paint, &stroke, transform, None);
        Ok(())
    }
}

impl CanvasImageData for SkiaCanvas {
    fn get_image_data(&self, sx: u32, sy: u32, sw: u32, sh: u32) -> Result<ImageData> {
        let mut out = ImageData::new(sw, sh);
        let width = self.pixmap.width();
        let height = self.pixmap.height();
        let pixels = self.pixmap.pixels();

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
                let Some(px) = pixels.get((y * width + x) as usize) else {
                    continue;
                };
                let c = px.demultiply();
                let idx = ((row * sw + col) * 4) as usize;
                out.data[idx..idx + 4].copy_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
            }
        }
        Ok(out)
    }

    fn put_image_data(&mut self, data: &ImageData, dx: f64, dy: f64) -> Result<()> {
        if !data.is_well_formed() {
            return Err(SigpadError::InvalidDimensions {
                width: data.width,
                height: data.height,
            });
        }
        let dx = dx.round() as i64;
        let dy = dy.round() as i64;
        let width = self.pixmap.width() as i64;
        let height = self.pixmap.height() as i64;
        let pixels = self.pixmap.pixels_mut();

        for (i, chunk) in data.data.chunks_exact(4).enumerate() {
            let x = dx + (i as i64 % data.width as i64);
            let y = dy + (i as i64 / data.width as i64);
            if x < 0 || y < 0 || x >= width || y >= height {
                continue;
            }
            let color = ColorU8::from_rgba(chunk[0], chunk[1], chunk[2], chunk[3]).premultiply();
            if let Some(slot) = pixels.get_mut((y * width + x) as usize) {
                *slot = color;
            }
        }
        Ok(())
    }
}

impl CanvasBackingStore for SkiaCanvas {
    fn backing_width(&self) -> u32 {
        self.pixmap.width()
    }

    fn backing_height(&self) -> u32 {
        self.pixmap.height()
    }

    fn set_backing_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.pixmap = new_pixmap(width, height)?;
        self.state = SkiaState::default();
        self.path.clear();
        Ok(())
    }
}

impl CanvasRenderingContext2D for SkiaCanvas {}

fn map_line_cap(cap: LineCap) -> SkiaLineCap {
    match cap {
        LineCap::Butt => SkiaLineCap::Butt,
        LineCap::Round => SkiaLineCap::Round,
        LineCap::Square => SkiaLineCap::Square,
    }
}
