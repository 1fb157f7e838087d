//! Single-active-stroke state machine. The first pointer down wins; every
//! other pointer is ignored until that stroke ends.

use crate::error::Result;
use crate::geometry::{LineSegment, Point, Rect};

pub type PointerId = i32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
    Leave,
}

/// A pointer event in viewport (client) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
    pub pointer_id: PointerId,
    pub phase: PointerPhase,
    pub client: Point,
}

impl PointerInput {
    pub fn new(pointer_id: PointerId, phase: PointerPhase, x: f64, y: f64) -> Self {
        Self {
            pointer_id,
            phase,
            client: Point::new(x, y),
        }
    }
}

/// Routes a pointer's later events to the drawing surface regardless of where it travels.
pub trait PointerCapture {
    fn set_pointer_capture(&mut self, pointer_id: PointerId) -> Result<()>;
    fn release_pointer_capture(&mut self, pointer_id: PointerId) -> Result<()>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum StrokeState {
    #[default]
    Idle,
    Active {
        pointer_id: PointerId,
        last: Point,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StrokeOutcome {
    Ignored,
    Began { at: Point },
    /// Draw this segment. The platform's default gesture must be suppressed.
    Segment(LineSegment),
    Ended,
}

impl StrokeOutcome {
    pub fn suppresses_default(&self) -> bool {
        matches!(self, StrokeOutcome::Segment(_))
    }
}

#[derive(Debug, Default)]
pub struct StrokeController {
    state: StrokeState,
}

impl StrokeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StrokeState {
        self.state
    }

    pub fn active_pointer(&self) -> Option<PointerId> {
        match self.state {
            StrokeState::Idle => None,
            StrokeState::Active { pointer_id, .. } => Some(pointer_id),
        }
    }

    /// `bounds` is the canvas's current bounding box, used to convert to local coordinates.
    pub fn handle(
        &mut self,
        input: &PointerInput,
        bounds: Rect,
        capture: &mut dyn PointerCapture,
    ) -> StrokeOutcome {
        match input.phase {
            PointerPhase::Down => self.begin(input, bounds, capture),
            PointerPhase::Move => self.advance(input, bounds),
            PointerPhase::Up | PointerPhase::Cancel | PointerPhase::Leave => self.end(input.pointer_id, capture),
        }
    }

    /// Drops any active stroke and releases its capture. Safe to call when idle.
    pub fn cancel(&mut self, capture: &mut dyn PointerCapture) {
        if let Some(pointer_id) = self.active_pointer() {
            release(capture, pointer_id);
        }
        self.state = StrokeState::Idle;
    }

    fn begin(&mut self, input: &PointerInput, bounds: Rect, capture: &mut dyn PointerCapture) -> StrokeOutcome {
        if let Some(active) = self.active_pointer() {
            if active != input.pointer_id {
                log::trace!("pointer {} ignored, {} is drawing", input.pointer_id, active);
                return StrokeOutcome::Ignored;
            }
        }

        let at = bounds.to_local(input.client);
        self.state = StrokeState::Active {
            pointer_id: input.pointer_id,
            last: at,
        };
        if let Err(err) = capture.set_pointer_capture(input.pointer_id) {
            log::debug!("pointer capture for {} failed: {err}", input.pointer_id);
        }
        log::trace!("stroke began for pointer {} at {:?}", input.pointer_id, at);
        StrokeOutcome::Began { at }
    }

    fn advance(&mut self, input: &PointerInput, bounds: Rect) -> StrokeOutcome {
        let StrokeState::Active { pointer_id, last } = self.state else {
            return StrokeOutcome::Ignored;
        };
        if pointer_id != input.pointer_id {
            return StrokeOutcome::Ignored;
        }

        let to = bounds.to_local(input.client);
        self.state = StrokeState::Active { pointer_id, last: to };
        StrokeOutcome::Segment(LineSegment { from: last, to })
    }

    fn end(&mut self, pointer_id: PointerId, capture: &mut dyn PointerCapture) -> StrokeOutcome {
        if self.active_pointer() != Some(pointer_id) {
            return StrokeOutcome::Ignored;
        }
        release(capture, pointer_id);
        self.state = StrokeState::Idle;
        log::trace!("stroke ended for pointer {pointer_id}");
        StrokeOutcome::Ended
    }
}

fn release(capture: &mut dyn PointerCapture, pointer_id: PointerId) {
    // The platform may already have dropped the capture.
    if let Err(err) = capture.release_pointer_capture(pointer_id) {
        log::debug!("releasing pointer capture for {pointer_id} failed: {err}");
    }
}
