//! Owns the single reusable drawing surface and the at-most-one session
//! bound to it.
//!
//! Opening is two-phase. [`DrawingSessionManager::request_open`] makes the
//! surface visible and hands back a [`FrameTicket`]; the host runs
//! [`DrawingSessionManager::on_frame`] with that ticket after the next paint,
//! when layout has settled and measuring is meaningful. A ticket whose session
//! has since been closed or retargeted is stale and does nothing.

use crate::api::CanvasRenderingContext2D;
use crate::codec::{self, ImageBlob};
use crate::config::SurfaceStyle;
use crate::error::{Result, SigpadError};
use crate::field::FieldId;
use crate::stroke::{PointerCapture, PointerInput, StrokeController, StrokeOutcome, StrokeState};
use crate::surface::Surface;
use crate::viewport::{MetricsSource, ViewportEvent, ViewportProvider};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

/// Deferred "after next paint" callback token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTicket {
    session: SessionId,
}

impl FrameTicket {
    pub fn session(&self) -> SessionId {
        self.session
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawingSession {
    id: SessionId,
    field: FieldId,
    pen_width: f64,
    measured: bool,
}

impl DrawingSession {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn field(&self) -> FieldId {
        self.field
    }

    pub fn pen_width(&self) -> f64 {
        self.pen_width
    }

    /// Whether the deferred measurement has run.
    pub fn is_measured(&self) -> bool {
        self.measured
    }
}

pub struct DrawingSessionManager<C> {
    surface: Surface<C>,
    strokes: StrokeController,
    viewport: ViewportProvider,
    capture: Box<dyn PointerCapture>,
    session: Option<DrawingSession>,
    next_id: u64,
}

impl<C: CanvasRenderingContext2D> DrawingSessionManager<C> {
    pub fn new(
        canvas: C,
        style: SurfaceStyle,
        pen_width: f64,
        metrics: Box<dyn MetricsSource>,
        capture: Box<dyn PointerCapture>,
    ) -> Self {
        Self {
            surface: Surface::new(canvas, style, pen_width),
            strokes: StrokeController::new(),
            viewport: ViewportProvider::new(metrics),
            capture,
            session: None,
            next_id: 0,
        }
    }

    pub fn surface(&self) -> &Surface<C> {
        &self.surface
    }

    pub fn session(&self) -> Option<&DrawingSession> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn active_field(&self) -> Option<FieldId> {
        self.session.map(|s| s.field)
    }

    pub fn stroke_state(&self) -> StrokeState {
        self.strokes.state()
    }

    /// Phase one of opening. Opening while a session is live retargets the
    /// surface to `field` and drops the old session's state.
    pub fn request_open(&mut self, field: FieldId, pen_width: f64) -> FrameTicket {
        if let Some(previous) = self.session {
            log::debug!("retargeting drawing surface from {:?} to {:?}", previous.field, field);
        }
        self.strokes.cancel(self.capture.as_mut());
        self.viewport.pin_visible_height();

        let id = SessionId(self.next_id);
        self.next_id += 1;
        self.session = Some(DrawingSession {
            id,
            field,
            pen_width,
            measured: false,
        });
        FrameTicket { session: id }
    }

    /// Phase two: measure, resize and paint. Returns `Ok(false)` when the
    /// ticket's session is no longer the open one.
    pub fn on_frame(&mut self, ticket: FrameTicket) -> Result<bool> {
        if !self.session.is_some_and(|s| s.id == ticket.session) {
            log::debug!("stale frame callback for {:?}", ticket.session);
            return Ok(false);
        }
        self.prepare_surface()?;
        Ok(true)
    }

    /// Re-measures after a layout change. Any ink on the surface is lost.
    pub fn handle_viewport_event(&mut self, event: ViewportEvent) -> Result<bool> {
        match self.session {
            Some(session) if session.measured => {
                log::debug!("{event:?} while open; re-measuring");
                self.erase()?;
                Ok(true)
            }
            // Either closed, or the pending frame callback will measure.
            _ => Ok(false),
        }
    }

    /// Routes one pointer event. Input is ignored until the surface is measured.
    pub fn handle_pointer(&mut self, input: &PointerInput) -> Result<StrokeOutcome> {
        if !self.session.is_some_and(|s| s.measured) {
            return Ok(StrokeOutcome::Ignored);
        }

        let bounds = self.viewport.bounding_rect();
        let outcome = self.strokes.handle(input, bounds, self.capture.as_mut());
        // Zero-length segments are pruned, as a canvas would.
        if let StrokeOutcome::Segment(segment) = &outcome {
            if !segment.is_degenerate() {
                self.surface.draw_segment(segment)?;
            }
        }
        Ok(outcome)
    }

    pub fn clear(&mut self) -> Result<()> {
        if self.session.is_none() {
            return Err(SigpadError::NoSession);
        }
        self.erase()
    }

    /// Runtime pen change; applies to the live drawing style when open.
    pub fn set_pen_width(&mut self, width: f64) -> Result<()> {
        match self.session.as_mut() {
            Some(session) => {
                session.pen_width = width;
                self.surface.set_pen_width(width)
            }
            None => Ok(()),
        }
    }

    /// Encodes the surface for the active field and closes the session.
    /// A session whose frame has not run yet commits a blank surface, never
    /// whatever an earlier session left behind.
    pub fn commit(&mut self) -> Result<(FieldId, ImageBlob)> {
        let session = self.session.ok_or(SigpadError::NoSession)?;
        if !session.measured {
            self.prepare_surface()?;
        }
        let field = session.field;
        let blob = codec::encode(&self.surface.snapshot()?)?;
        self.close();
        Ok((field, blob))
    }

    /// Discards the session. Safe mid-stroke and when already closed.
    pub fn close(&mut self) -> Option<FieldId> {
        self.strokes.cancel(self.capture.as_mut());
        self.viewport.unpin_visible_height();
        self.session.take().map(|s| s.field)
    }

    /// Measures, paints and installs the session pen on behalf of the open session.
    fn prepare_surface(&mut self) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Err(SigpadError::NoSession);
        };
        session.measured = true;
        let pen_width = session.pen_width;

        self.strokes.cancel(self.capture.as_mut());
        self.surface.set_pen_width(pen_width)?;
        self.erase()
    }

    fn erase(&mut self) -> Result<()> {
        let metrics = self.viewport.measure();
        self.surface.clear(&metrics)
    }
}
