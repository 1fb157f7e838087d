use crate::api::*;
use crate::error::{Result, SigpadError};

#[derive(Debug, Clone, PartialEq)]
pub enum PathCommand {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPath {
    pub commands: Vec<PathCommand>,
}

impl RecordedPath {
    pub fn new(commands: Vec<PathCommand>) -> Self {
        Self { commands }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub line_width: f64,
    pub line_cap: LineCap,
    pub fill_style: Paint,
    pub stroke_style: Paint,
    pub transform: Matrix,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Resize {
        width: u32,
        height: u32,
    },
    FillRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        state: Snapshot,
    },
    StrokePath {
        path: RecordedPath,
        state: Snapshot,
    },
    PutImageData {
        width: u32,
        height: u32,
        dx: f64,
        dy: f64,
    },
}

#[derive(Clone, Debug)]
struct RecorderState {
    line_width: f64,
    line_cap: LineCap,
    fill_style: Paint,
    stroke_style: Paint,
    transform: Matrix,
}

impl Default for RecorderState {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            line_cap: LineCap::Butt,
            fill_style: Paint::Color("#000".to_string()),
            stroke_style: Paint::Color("#000".to_string()),
            transform: IDENTITY,
        }
    }
}

/// Backing store that keeps a log of draw operations instead of pixels.
pub struct RecordingCanvas {
    ops: Vec<DrawOp>,
    state: RecorderState,
    width: u32,
    height: u32,
    current_path: Vec<PathCommand>,
    current_point: Option<(f64, f64)>,
}

impl RecordingCanvas {
    /// Canvas elements start out at 300x150.
    pub fn new() -> Self {
        Self::with_size(300, 150)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            ops: Vec::new(),
            state: RecorderState::default(),
            width,
            height,
            current_path: Vec::new(),
            current_point: None,
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Segments stroked since the last resize, as (from, to) pairs in user units.
    pub fn stroked_segments(&self) -> Vec<((f64, f64), (f64, f64))> {
        let last_resize = self
            .ops
            .iter()
            .rposition(|op| matches!(op, DrawOp::Resize { .. }))
            .map_or(0, |i| i + 1);
        let mut out = Vec::new();
        for op in self.ops.iter().skip(last_resize) {
            if let DrawOp::StrokePath { path, .. } = op {
                let mut from = None;
                for cmd in &path.commands {
                    match *cmd {
                        PathCommand::MoveTo { x, y } => from = Some((x, y)),
                        PathCommand::LineTo { x, y } => {
                            if let Some(f) = from {
                                out.push((f, (x, y)));
                            }
                            from = Some((x, y));
                        }
                    }
                }
            }
        }
        out
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            line_width: self.state.line_width,
            line_cap: self.state.line_cap,
            fill_style: self.state.fill_style.clone(),
            stroke_style: self.state.stroke_style.clone(),
            transform: self.state.transform,
        }
    }

    fn ensure_subpath(&mut self) -> Result<()> {
        if self.current_point.is_none() {
            self.move_to(0.0, 0.0)?;
        }
        Ok(())
    }

    fn record_op(&mut self, op: DrawOp) {
        self.ops.push(op);
    }
}

impl Default for RecordingCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasTransforms for RecordingCanvas {
    fn set_transform(&mut self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<()> {
        self.state.transform = [a, b, c, d, e, f];
        Ok(())
    }

    fn get_transform(&self) -> Result<Matrix> {
        Ok(self.state.transform)
    }
}

impl CanvasLineStyles for RecordingCanvas {
    fn set_line_width(&mut self, value: f64) -> Result<()> {
        // Canvas ignores non-positive and non-finite widths.
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

impl CanvasFillStrokeStyles for RecordingCanvas {
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

impl CanvasRectangles for RecordingCanvas {
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        let op = DrawOp::FillRect {
            x,
            y,
            w,
            h,
            state: self.snapshot(),
        };
        self.record_op(op);
        Ok(())
    }
}

impl CanvasPaths for RecordingCanvas {
    fn begin_path(&mut self) -> Result<()> {
        self.current_path.clear();
        self.current_point = None;
        Ok(())
    }

    fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.current_path.push(PathCommand::MoveTo { x, y });
        self.current_point = Some((x, y));
        Ok(())
    }

    fn line_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.ensure_subpath()?;
        self.current_path.push(PathCommand::LineTo { x, y });
        self.current_point = Some((x, y));
        Ok(())
    }

    fn stroke(&mut self) -> Result<()> {
        // stroke() leaves the path in place; beginPath() is what clears it.
        let op = DrawOp::StrokePath {
            path: RecordedPath::new(self.current_path.clone()),
            state: self.snapshot(),
        };
        self.record_op(op);
        Ok(())
    }
}

impl CanvasImageData for RecordingCanvas {
    fn get_image_data(&self, _sx: u32, _sy: u32, _sw: u32, _sh: u32) -> Result<ImageData> {
        Err(SigpadError::Other(Box::new(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "recording canvas holds no pixels",
        ))))
    }

    fn put_image_data(&mut self, data: &ImageData, dx: f64, dy: f64) -> Result<()> {
        self.record_op(DrawOp::PutImageData {
            width: data.width,
            height: data.height,
            dx,
            dy,
        });
        Ok(())
    }
}

impl CanvasBackingStore for RecordingCanvas {
    fn backing_width(&self) -> u32 {
        self.width
    }

    fn backing_height(&self) -> u32 {
        self.height
    }

    fn set_backing_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.width = width;
        self.height = height;
        self.state = RecorderState::default();
        self.current_path.clear();
        self.current_point = None;
        self.record_op(DrawOp::Resize { width, height });
        Ok(())
    }
}

impl CanvasRenderingContext2D for RecordingCanvas {}
