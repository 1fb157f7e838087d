//! Points and boxes in CSS (logical) pixels.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A bounding box as reported by getBoundingClientRect().
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Converts a viewport (client) position into coordinates local to this box.
    pub fn to_local(&self, client: Point) -> Point {
        let origin = self.origin();
        Point::new(client.x - origin.x, client.y - origin.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    pub from: Point,
    pub to: Point,
}

impl LineSegment {
    pub fn is_degenerate(&self) -> bool {
        self.from == self.to
    }
}

/// Applies a DOMMatrix-ordered transform to a point.
pub fn apply_matrix(m: &crate::api::Matrix, p: Point) -> Point {
    let [a, b, c, d, e, f] = *m;
    Point::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
}
