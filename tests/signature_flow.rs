#![cfg(feature = "skia")]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use sigpad::api::{CanvasTransforms, ImageData};
use sigpad::backends::skia::SkiaCanvas;
use sigpad::config::AttributeSource;
use sigpad::geometry::{apply_matrix, Point, Rect};
use sigpad::stroke::PointerId;
use sigpad::{
    codec, FieldId, FrameScheduler, FrameTicket, MetricsSource, PenConfig, Platform, PointerCapture,
    PointerInput, PointerPhase, Preview, SignaturePad, StrokeOutcome, SurfaceStyle, ValueSlot,
};

const WHITE: [u8; 4] = [255, 255, 255, 255];

#[derive(Clone, Default)]
struct Region {
    attrs: Rc<RefCell<HashMap<String, String>>>,
    renders: Rc<RefCell<Vec<Preview>>>,
}

impl Region {
    fn with_attrs(pairs: &[(&str, &str)]) -> Self {
        let region = Self::default();
        for (k, v) in pairs {
            region.attrs.borrow_mut().insert(k.to_string(), v.to_string());
        }
        region
    }

    fn last(&self) -> Option<Preview> {
        self.renders.borrow().last().cloned()
    }

    fn render_count(&self) -> usize {
        self.renders.borrow().len()
    }
}

impl AttributeSource for Region {
    fn attribute(&self, name: &str) -> Option<String> {
        self.attrs.borrow().get(name).cloned()
    }
}

impl sigpad::Presentation for Region {
    fn render(&mut self, preview: &Preview) {
        self.renders.borrow_mut().push(preview.clone());
    }
}

#[derive(Clone, Default)]
struct Slot(Rc<RefCell<String>>);

impl Slot {
    fn get(&self) -> String {
        self.0.borrow().clone()
    }

    fn set(&self, value: &str) {
        *self.0.borrow_mut() = value.to_string();
    }
}

impl ValueSlot for Slot {
    fn value(&self) -> String {
        self.get()
    }

    fn set_value(&mut self, value: &str) {
        self.set(value);
    }
}

struct Container {
    rect: Rc<Cell<Rect>>,
    dpr: f64,
}

impl MetricsSource for Container {
    fn bounding_rect(&self) -> Rect {
        self.rect.get()
    }

    fn device_pixel_ratio(&self) -> Option<f64> {
        Some(self.dpr)
    }
}

#[derive(Clone, Default)]
struct Capture(Rc<RefCell<Vec<PointerId>>>);

impl PointerCapture for Capture {
    fn set_pointer_capture(&mut self, pointer_id: PointerId) -> sigpad::Result<()> {
        self.0.borrow_mut().push(pointer_id);
        Ok(())
    }

    fn release_pointer_capture(&mut self, pointer_id: PointerId) -> sigpad::Result<()> {
        self.0.borrow_mut().retain(|id| *id != pointer_id);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Frames(Rc<RefCell<Vec<FrameTicket>>>);

impl FrameScheduler for Frames {
    fn request_frame(&mut self, ticket: FrameTicket) {
        self.0.borrow_mut().push(ticket);
    }
}

struct Harness {
    pad: SignaturePad<SkiaCanvas>,
    frames: Frames,
    capture: Capture,
}

impl Harness {
    fn new(rect: Rect, dpr: f64) -> Self {
        let frames = Frames::default();
        let capture = Capture::default();
        let pad = SignaturePad::new(
            SkiaCanvas::new(1, 1).unwrap(),
            SurfaceStyle::default(),
            PenConfig::default(),
            Platform {
                metrics: Box::new(Container {
                    rect: Rc::new(Cell::new(rect)),
                    dpr,
                }),
                capture: Box::new(capture.clone()),
                scheduler: Box::new(frames.clone()),
            },
        );
        Self { pad, frames, capture }
    }

    /// Activates `id` and runs the frame the pad asked for.
    fn open(&mut self, id: FieldId) {
        assert!(self.pad.activate(id));
        let ticket = self.frames.0.borrow_mut().pop().unwrap();
        assert!(self.pad.run_frame(ticket).unwrap());
    }

    fn pointer(&mut self, id: PointerId, phase: PointerPhase, x: f64, y: f64) -> StrokeOutcome {
        self.pad.handle_pointer(&PointerInput::new(id, phase, x, y)).unwrap()
    }

    fn snapshot(&self) -> ImageData {
        self.pad.sessions().surface().snapshot().unwrap()
    }
}

fn is_blank(image: &ImageData) -> bool {
    image.data.chunks_exact(4).all(|px| px == WHITE)
}

fn is_inked(px: Option<[u8; 4]>) -> bool {
    px.is_some_and(|[r, g, b, _]| r < 128 && g < 128 && b < 128)
}

#[test]
fn save_then_reopen_and_discard_leaves_field_signed() {
    let mut h = Harness::new(Rect::new(0.0, 0.0, 200.0, 100.0), 2.0);
    let region = Region::with_attrs(&[("data-placeholder", "Sign here"), ("data-border-visible", "true")]);
    let slot = Slot::default();
    let id = h.pad.register(Box::new(region.clone()), Box::new(slot.clone()));

    match region.last() {
        Some(Preview::Empty { placeholder, border }) => {
            assert_eq!(placeholder.as_deref(), Some("Sign here"));
            assert!(border.is_some());
        }
        other => panic!("expected empty state, got {other:?}"),
    }

    h.open(id);
    assert_eq!(h.pad.sessions().surface().backing_size(), (400, 200));
    assert!(h.pointer(1, PointerPhase::Down, 10.0, 10.0) != StrokeOutcome::Ignored);
    assert!(h.pointer(1, PointerPhase::Move, 190.0, 90.0).suppresses_default());
    assert_eq!(h.pointer(1, PointerPhase::Up, 190.0, 90.0), StrokeOutcome::Ended);

    let drawn = h.snapshot();
    assert!(is_inked(drawn.pixel(200, 100)));

    assert_eq!(h.pad.save().unwrap(), id);
    assert!(!h.pad.sessions().is_open());

    let saved = slot.get();
    let blob = codec::decode(&saved).expect("slot holds an image reference");
    assert_eq!(blob.to_image_data().unwrap(), drawn);
    assert_eq!(region.last(), Some(Preview::Signed(blob)));
    assert!(h.pad.fields().field(id).unwrap().is_signed());

    let renders = region.render_count();
    h.open(id);
    h.pad.clear().unwrap();
    assert_eq!(h.pad.close(), Some(id));

    assert_eq!(slot.get(), saved);
    assert_eq!(region.render_count(), renders);
    assert!(h.pad.fields().field(id).unwrap().is_signed());
}

#[test]
fn external_mutation_shows_within_one_poll() {
    let mut h = Harness::new(Rect::new(0.0, 0.0, 50.0, 50.0), 1.0);
    let region = Region::default();
    let slot = Slot::default();
    let id = h.pad.register(Box::new(region.clone()), Box::new(slot.clone()));
    assert_eq!(h.pad.fields().poll_interval().as_millis(), 500);

    let image = codec::encode(&ImageData::filled(4, 2, [10, 20, 30, 255])).unwrap();
    slot.set(image.as_str());

    assert_eq!(h.pad.poll(), vec![id]);
    assert_eq!(region.last(), Some(Preview::Signed(image)));
    assert!(h.pad.fields().field(id).unwrap().is_signed());

    slot.set("not an image");
    assert_eq!(h.pad.poll(), vec![id]);
    assert!(matches!(region.last(), Some(Preview::Empty { .. })));
    assert!(h.pad.poll().is_empty());
}

#[test]
fn backing_store_tracks_device_pixels() {
    let mut h = Harness::new(Rect::new(30.0, 40.0, 201.0, 101.0), 1.5);
    let id = h.pad.register(Box::new(Region::default()), Box::new(Slot::default()));
    h.open(id);

    let surface = h.pad.sessions().surface();
    assert_eq!(surface.backing_size(), (302, 152));
    assert_eq!(surface.logical_size(), (201.0, 101.0));

    // Client (50, 90)..(210, 90) is local (20, 50)..(180, 50).
    h.pointer(1, PointerPhase::Down, 50.0, 90.0);
    h.pointer(1, PointerPhase::Move, 210.0, 90.0);

    let transform = h.pad.sessions().surface().canvas().get_transform().unwrap();
    let on_line = apply_matrix(&transform, Point::new(100.0, 50.0));
    let off_line = apply_matrix(&transform, Point::new(100.0, 20.0));
    let image = h.snapshot();
    assert!(is_inked(image.pixel(on_line.x as u32, on_line.y as u32)));
    assert_eq!(image.pixel(off_line.x as u32, off_line.y as u32), Some(WHITE));
}

#[test]
fn second_pointer_waits_for_first() {
    let mut h = Harness::new(Rect::new(0.0, 0.0, 100.0, 100.0), 1.0);
    let id = h.pad.register(Box::new(Region::default()), Box::new(Slot::default()));
    h.open(id);

    assert!(matches!(h.pointer(1, PointerPhase::Down, 10.0, 10.0), StrokeOutcome::Began { .. }));
    assert_eq!(h.pointer(2, PointerPhase::Down, 50.0, 50.0), StrokeOutcome::Ignored);
    assert_eq!(h.pointer(2, PointerPhase::Move, 90.0, 90.0), StrokeOutcome::Ignored);
    assert!(is_blank(&h.snapshot()));
    assert_eq!(*h.capture.0.borrow(), vec![1]);

    assert_eq!(h.pointer(1, PointerPhase::Up, 10.0, 10.0), StrokeOutcome::Ended);
    assert!(matches!(h.pointer(2, PointerPhase::Down, 50.0, 50.0), StrokeOutcome::Began { .. }));
    assert_eq!(*h.capture.0.borrow(), vec![2]);

    h.pad.close();
    assert!(h.capture.0.borrow().is_empty());
}

#[test]
fn clear_is_idempotent_and_erases_ink() {
    let mut h = Harness::new(Rect::new(0.0, 0.0, 80.0, 40.0), 2.0);
    let id = h.pad.register(Box::new(Region::default()), Box::new(Slot::default()));
    h.open(id);

    h.pad.clear().unwrap();
    let once = h.snapshot();
    h.pad.clear().unwrap();
    assert_eq!(h.snapshot(), once);
    assert!(is_blank(&once));

    h.pointer(1, PointerPhase::Down, 5.0, 5.0);
    h.pointer(1, PointerPhase::Move, 75.0, 35.0);
    assert_ne!(h.snapshot(), once);

    h.pad.clear().unwrap();
    assert_eq!(h.snapshot(), once);
}

#[test]
fn save_before_first_frame_commits_a_blank_surface() {
    let mut h = Harness::new(Rect::new(0.0, 0.0, 60.0, 30.0), 2.0);
    let slot_a = Slot::default();
    let slot_b = Slot::default();
    let a = h.pad.register(Box::new(Region::default()), Box::new(slot_a.clone()));
    let b = h.pad.register(Box::new(Region::default()), Box::new(slot_b.clone()));

    h.open(a);
    h.pointer(1, PointerPhase::Down, 5.0, 5.0);
    h.pointer(1, PointerPhase::Move, 55.0, 25.0);
    h.pointer(1, PointerPhase::Up, 55.0, 25.0);
    h.pad.save().unwrap();

    assert!(h.pad.activate(b));
    assert_eq!(h.pad.save().unwrap(), b);
    assert_ne!(slot_b.get(), slot_a.get());

    let committed = codec::decode(&slot_b.get()).unwrap().to_image_data().unwrap();
    assert_eq!((committed.width, committed.height), (120, 60));
    assert!(is_blank(&committed));

    // The frame requested for B arrives after the session ended.
    let ticket = h.frames.0.borrow_mut().pop().unwrap();
    assert!(!h.pad.run_frame(ticket).unwrap());
}

#[test]
fn stale_frame_after_close_changes_nothing() {
    let mut h = Harness::new(Rect::new(0.0, 0.0, 80.0, 40.0), 2.0);
    let id = h.pad.register(Box::new(Region::default()), Box::new(Slot::default()));
    assert!(h.pad.activate(id));
    h.pad.close();

    let ticket = h.frames.0.borrow_mut().pop().unwrap();
    assert!(!h.pad.run_frame(ticket).unwrap());
    assert_eq!(h.pad.sessions().surface().backing_size(), (1, 1));
}
