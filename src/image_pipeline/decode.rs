//! Sample decoding module
//!
//! Turns native scanlines of any supported `(kind, bits)` combination into a
//! canonical [`RasterBuffer`](crate::image_pipeline::RasterBuffer).

mod decoder;
pub mod samples;

pub use decoder::decode_raster;
pub use samples::{SampleDecoder, lookup, supported_formats};
