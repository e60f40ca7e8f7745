//! Channel layout mapping
//!
//! Maps a normalized raster onto the channel arrangement and sample type of a
//! destination container.

mod mapper;
pub mod types;

pub use mapper::{encode_pixels, map_channels, quantize_u8, quantize_u16};
pub use types::{AlphaPolicy, EncodedImage, PixelData};
