//! Backing-store implementations of the canvas traits.

pub mod recording;

#[cfg(feature = "skia")]
pub mod skia;

#[cfg(feature = "cairo")]
pub mod cairo;
