//! Traits mirroring the subset of the HTML Canvas 2D context that the drawing
//! engine needs. Backends implement them over a device-pixel backing store.

use crate::error::Result;

/// Affine matrix in DOMMatrix order (a, b, c, d, e, f).
pub type Matrix = [f64; 6];

pub const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Represents a color that can be used for fill/stroke.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Color(String),
}

impl Paint {
    pub fn rgba(&self) -> [u8; 4] {
        match self {
            Paint::Color(c) => parse_color(c),
        }
    }
}

/// Straight-alpha RGBA8 pixels, row-major, `width * height * 4` bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl ImageData {
    /// Fully transparent image. Mirrors createImageData(width, height).
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let len = width as usize * height as usize;
        let mut data = Vec::with_capacity(len * 4);
        for _ in 0..len {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.width as usize * self.height as usize * 4
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

pub trait CanvasTransforms {
    /// Replaces the current transform with the provided matrix. Mirrors setTransform().
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<()>;
    /// Returns the current transform. Mirrors getTransform().
    fn get_transform(&self) -> Result<Matrix>;
}

pub trait CanvasLineStyles {
    /// Sets stroke thickness in user units. Mirrors lineWidth.
    fn set_line_width(&mut self, value: f64) -> Result<()>;
    fn line_width(&self) -> Result<f64>;

    /// Sets the shape of the line end caps. Mirrors lineCap.
    fn set_line_cap(&mut self, value: LineCap) -> Result<()>;
    fn line_cap(&self) -> Result<LineCap>;
}

pub trait CanvasFillStrokeStyles {
    fn set_fill_style(&mut self, style: Paint) -> Result<()>;
    fn fill_style(&self) -> Result<Paint>;

    fn set_stroke_style(&mut self, style: Paint) -> Result<()>;
    fn stroke_style(&self) -> Result<Paint>;
}

pub trait CanvasRectangles {
    /// Fills the specified rectangle using the current fill style. Mirrors fillRect().
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()>;
}

pub trait CanvasPaths {
    /// Starts a new empty path list. Mirrors beginPath().
    fn begin_path(&mut self) -> Result<()>;
    /// Moves the current point without drawing. Mirrors moveTo().
    fn move_to(&mut self, x: f64, y: f64) -> Result<()>;
    /// Adds a straight line from the current point to (x, y). Mirrors lineTo().
    fn line_to(&mut self, x: f64, y: f64) -> Result<()>;
    /// Strokes the current path. Mirrors stroke().
    fn stroke(&mut self) -> Result<()>;
}

pub trait CanvasImageData {
    /// Returns ImageData for the given device-pixel rectangle. Mirrors getImageData().
    fn get_image_data(&self, sx: u32, sy: u32, sw: u32, sh: u32) -> Result<ImageData>;
    /// Writes the ImageData at device pixel (dx, dy), ignoring the transform. Mirrors putImageData().
    fn put_image_data(&mut self, data: &ImageData, dx: f64, dy: f64) -> Result<()>;
}

/// The device-pixel store behind a canvas element (`canvas.width`/`canvas.height`).
pub trait CanvasBackingStore {
    fn backing_width(&self) -> u32;
    fn backing_height(&self) -> u32;

    /// Reallocates the store. Like assigning `canvas.width`, this discards all
    /// pixels and resets the drawing state to its defaults.
    fn set_backing_size(&mut self, width: u32, height: u32) -> Result<()>;
}

pub trait CanvasRenderingContext2D:
    CanvasTransforms
    + CanvasLineStyles
    + CanvasFillStrokeStyles
    + CanvasRectangles
    + CanvasPaths
    + CanvasImageData
    + CanvasBackingStore
{
}

/// Reads the full backing store as ImageData.
pub fn snapshot<C: CanvasRenderingContext2D + ?Sized>(canvas: &C) -> Result<ImageData> {
    canvas.get_image_data(0, 0, canvas.backing_width(), canvas.backing_height())
}

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa` and a handful of keywords.
/// Anything else falls back to opaque black.
pub fn parse_color(color: &str) -> [u8; 4] {
    let c = color.trim();
    if let Some(hex) = c.strip_prefix('#') {
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        let parsed = match hex.len() {
            3 => {
                let mut out = [255u8; 4];
                let mut ok = true;
                for (i, ch) in hex.chars().enumerate().take(3) {
                    match ch.to_digit(16) {
                        Some(v) => out[i] = (v as u8) * 17,
                        None => ok = false,
                    }
                }
                ok.then_some(out)
            }
            6 | 8 if hex.is_ascii() => {
                let r = channel(&hex[0..2]);
                let g = channel(&hex[2..4]);
                let b = channel(&hex[4..6]);
                let a = if hex.len() == 8 {
                    channel(&hex[6..8])
                } else {
                    Some(255)
                };
                match (r, g, b, a) {
                    (Some(r), Some(g), Some(b), Some(a)) => Some([r, g, b, a]),
                    _ => None,
                }
            }
            _ => None,
        };
        if let Some(rgba) = parsed {
            return rgba;
        }
    }

    match c.to_ascii_lowercase().as_str() {
        "white" => [255, 255, 255, 255],
        "transparent" => [0, 0, 0, 0],
        _ => [0, 0, 0, 255],
    }
}
