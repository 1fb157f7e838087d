//! Measures the drawing surface's container in CSS pixels together with the
//! device pixel ratio. Nothing here is cached across events: zoom, rotation and
//! on-screen keyboards all move the layout box, and some platforms report that
//! only through visual-viewport resize or scroll.

use crate::geometry::Rect;

/// Platform seam answering layout questions about the surface's container.
pub trait MetricsSource {
    /// CSS-pixel bounding box of the container, as getBoundingClientRect() reports it.
    fn bounding_rect(&self) -> Rect;

    /// `window.devicePixelRatio`, if the platform reports one.
    fn device_pixel_ratio(&self) -> Option<f64>;

    /// Height of the visible viewport under dynamic browser chrome, if known.
    fn visible_height(&self) -> Option<f64> {
        None
    }
}

/// Signals after which the surface must be re-measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportEvent {
    WindowResize,
    OrientationChange,
    VisualViewportResize,
    /// Some platforms report pinch-zoom only as a visual-viewport scroll.
    VisualViewportScroll,
    BecameVisible,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportMetrics {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl ViewportMetrics {
    /// Backing-store size for these metrics: `max(1, round(css * dpr))` per axis.
    pub fn device_size(&self) -> (u32, u32) {
        (
            device_pixels(self.width, self.device_pixel_ratio),
            device_pixels(self.height, self.device_pixel_ratio),
        )
    }
}

fn device_pixels(css: f64, dpr: f64) -> u32 {
    let px = (css * dpr).round();
    if px.is_finite() && px >= 1.0 {
        px.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

fn sanitize_dpr(dpr: Option<f64>) -> f64 {
    match dpr {
        Some(d) if d.is_finite() && d > 0.0 => d,
        _ => 1.0,
    }
}

fn sanitize_length(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

/// Measures on every call. The only state is the visible height pinned at
/// activation, which caps the measured height for that session.
pub struct ViewportProvider {
    source: Box<dyn MetricsSource>,
    pinned_visible_height: Option<f64>,
}

impl ViewportProvider {
    pub fn new(source: Box<dyn MetricsSource>) -> Self {
        Self {
            source,
            pinned_visible_height: None,
        }
    }

    pub fn measure(&self) -> ViewportMetrics {
        let rect = self.source.bounding_rect();
        let mut height = sanitize_length(rect.height);
        if let Some(cap) = self.pinned_visible_height {
            height = height.min(cap);
        }
        ViewportMetrics {
            width: sanitize_length(rect.width),
            height,
            device_pixel_ratio: sanitize_dpr(self.source.device_pixel_ratio()),
        }
    }

    pub fn bounding_rect(&self) -> Rect {
        self.source.bounding_rect()
    }

    /// Samples the visible viewport height once, at activation.
    pub fn pin_visible_height(&mut self) {
        self.pinned_visible_height = self
            .source
            .visible_height()
            .filter(|h| h.is_finite() && *h > 0.0);
    }

    pub fn unpin_visible_height(&mut self) {
        self.pinned_visible_height = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeSource {
        rect: Rc<Cell<Rect>>,
        dpr: Option<f64>,
        visible: Rc<Cell<Option<f64>>>,
    }

    impl MetricsSource for FakeSource {
        fn bounding_rect(&self) -> Rect {
            self.rect.get()
        }

        fn device_pixel_ratio(&self) -> Option<f64> {
            self.dpr
        }

        fn visible_height(&self) -> Option<f64> {
            self.visible.get()
        }
    }

    #[test]
    fn device_size_rounds_and_never_collapses() {
        let m = ViewportMetrics {
            width: 100.4,
            height: 0.2,
            device_pixel_ratio: 1.5,
        };
        assert_eq!(m.device_size(), (151, 1));
    }

    #[test]
    fn missing_or_bogus_dpr_defaults_to_one() {
        let rect = Rc::new(Cell::new(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let visible = Rc::new(Cell::new(None));
        for dpr in [None, Some(0.0), Some(f64::NAN), Some(-2.0)] {
            let provider = ViewportProvider::new(Box::new(FakeSource {
                rect: rect.clone(),
                dpr,
                visible: visible.clone(),
            }));
            assert_eq!(provider.measure().device_pixel_ratio, 1.0);
        }
    }

    #[test]
    fn measures_fresh_every_call() {
        let rect = Rc::new(Cell::new(Rect::new(0.0, 0.0, 320.0, 200.0)));
        let provider = ViewportProvider::new(Box::new(FakeSource {
            rect: rect.clone(),
            dpr: Some(2.0),
            visible: Rc::new(Cell::new(None)),
        }));
        assert_eq!(provider.measure().width, 320.0);
        rect.set(Rect::new(0.0, 0.0, 640.0, 480.0));
        let m = provider.measure();
        assert_eq!((m.width, m.height), (640.0, 480.0));
    }

    #[test]
    fn visible_height_is_pinned_at_activation_only() {
        let rect = Rc::new(Cell::new(Rect::new(0.0, 0.0, 300.0, 500.0)));
        let visible = Rc::new(Cell::new(Some(400.0)));
        let mut provider = ViewportProvider::new(Box::new(FakeSource {
            rect,
            dpr: Some(1.0),
            visible: visible.clone(),
        }));
        provider.pin_visible_height();
        visible.set(Some(250.0));
        assert_eq!(provider.measure().height, 400.0);

        provider.unpin_visible_height();
        assert_eq!(provider.measure().height, 500.0);
    }
}
