//! The host-facing facade. Host chrome wires its buttons to [`SignaturePad::clear`],
//! [`SignaturePad::save`] and [`SignaturePad::close`], region clicks to
//! [`SignaturePad::activate`], and forwards pointer, layout, frame and timer
//! callbacks to the matching `handle_*`/`run_frame`/`poll` methods.

use crate::api::CanvasRenderingContext2D;
use crate::config::{PenConfig, SurfaceStyle};
use crate::discovery::{self, Candidate, Discovered};
use crate::error::Result;
use crate::field::{FieldId, Presentation, ValueSlot};
use crate::session::{DrawingSessionManager, FrameTicket};
use crate::stroke::{PointerCapture, PointerInput, StrokeOutcome};
use crate::sync::FieldSynchronizer;
use crate::viewport::{MetricsSource, ViewportEvent};

/// Runs a callback after the next rendered frame (`requestAnimationFrame`).
pub trait FrameScheduler {
    fn request_frame(&mut self, ticket: FrameTicket);
}

/// Platform seams handed to [`SignaturePad::new`].
pub struct Platform {
    pub metrics: Box<dyn MetricsSource>,
    pub capture: Box<dyn PointerCapture>,
    pub scheduler: Box<dyn FrameScheduler>,
}

pub struct SignaturePad<C> {
    fields: FieldSynchronizer,
    sessions: DrawingSessionManager<C>,
    scheduler: Box<dyn FrameScheduler>,
}

impl<C: CanvasRenderingContext2D> SignaturePad<C> {
    pub fn new(canvas: C, style: SurfaceStyle, pen: PenConfig, platform: Platform) -> Self {
        let fields = FieldSynchronizer::new(pen);
        let sessions = DrawingSessionManager::new(
            canvas,
            style,
            fields.pen().current(),
            platform.metrics,
            platform.capture,
        );
        Self {
            fields,
            sessions,
            scheduler: platform.scheduler,
        }
    }

    pub fn fields(&self) -> &FieldSynchronizer {
        &self.fields
    }

    pub fn sessions(&self) -> &DrawingSessionManager<C> {
        &self.sessions
    }

    pub fn register(&mut self, presentation: Box<dyn Presentation>, slot: Box<dyn ValueSlot>) -> FieldId {
        self.fields.register(presentation, slot)
    }

    pub fn discover<I>(&mut self, candidates: I, marker: &str) -> Discovered
    where
        I: IntoIterator<Item = Candidate>,
    {
        discovery::discover(&mut self.fields, candidates, marker)
    }

    /// Opens (or retargets) the drawing surface for `id` and schedules the
    /// measuring frame. Returns false if the field cannot be opened.
    pub fn activate(&mut self, id: FieldId) -> bool {
        let Some(pen_width) = self.fields.prepare_activation(id) else {
            return false;
        };
        let ticket = self.sessions.request_open(id, pen_width);
        self.scheduler.request_frame(ticket);
        true
    }

    pub fn run_frame(&mut self, ticket: FrameTicket) -> Result<bool> {
        self.sessions.on_frame(ticket)
    }

    pub fn handle_pointer(&mut self, input: &PointerInput) -> Result<StrokeOutcome> {
        self.sessions.handle_pointer(input)
    }

    pub fn handle_viewport_event(&mut self, event: ViewportEvent) -> Result<bool> {
        self.sessions.handle_viewport_event(event)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.sessions.clear()
    }

    /// Commits the drawing into the active field and closes the surface.
    pub fn save(&mut self) -> Result<FieldId> {
        let (id, blob) = self.sessions.commit()?;
        log::debug!("saving {} bytes of image reference into {id:?}", blob.as_str().len());
        self.fields.commit(id, blob)?;
        Ok(id)
    }

    /// Closes without committing; slot and presentation are left as they were.
    pub fn close(&mut self) -> Option<FieldId> {
        self.sessions.close()
    }

    pub fn poll(&mut self) -> Vec<FieldId> {
        self.fields.poll()
    }

    pub fn notify_changed(&mut self, id: FieldId) -> Result<bool> {
        self.fields.notify_changed(id)
    }

    /// Host-page pen control. Returns the clamped width now in force.
    pub fn set_pen_width(&mut self, px: f64) -> Result<f64> {
        let applied = self.fields.set_pen_width(px);
        self.sessions.set_pen_width(applied)?;
        Ok(applied)
    }
}
