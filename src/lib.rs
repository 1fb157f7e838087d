//! Headless core of a signature-capture widget.
//!
//! A host binds presentation regions to persisted value slots, forwards
//! pointer, layout and frame events, and gets back PNG data URLs written into
//! those slots. Drawing goes through the Canvas-2D-shaped traits in [`api`], so
//! any backend in [`backends`] (or the host's own) can supply the pixels.

pub mod api;
pub mod backends;
pub mod codec;
pub mod config;
pub mod discovery;
pub mod error;
pub mod field;
pub mod geometry;
pub mod pad;
pub mod session;
pub mod stroke;
pub mod surface;
pub mod sync;
pub mod viewport;

pub use codec::{ImageBlob, ImageFormat};
pub use config::{FieldOptions, PenConfig, SurfaceStyle};
pub use error::{Result, SigpadError};
pub use field::{FieldId, Presentation, Preview, SignatureField, ValueSlot};
pub use pad::{FrameScheduler, Platform, SignaturePad};
pub use session::{DrawingSessionManager, FrameTicket};
pub use stroke::{PointerCapture, PointerInput, PointerPhase, StrokeOutcome};
pub use viewport::{MetricsSource, ViewportEvent};
