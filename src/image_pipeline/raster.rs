//! Canonical raster representation
//!
//! Every conversion passes through a [`RasterBuffer`]: interleaved, row-major,
//! linear-light `f32` samples, independent of the source container.

pub mod types;

pub use types::{PlanarLayout, RasterBuffer, SampleFormat, SampleKind};
