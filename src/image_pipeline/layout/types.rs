//! Destination pixel types

use half::f16;

use crate::image_pipeline::raster::SampleFormat;

/// What to put in a destination alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaPolicy {
    /// Keep source alpha, synthesize 1.0 when the source has none
    #[default]
    Preserve,
    /// Always write 1.0
    Opaque,
}

/// Interleaved destination samples in their native type.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F16(Vec<f16>),
    F32(Vec<f32>),
}

impl PixelData {
    pub fn len(&self) -> usize {
        match self {
            PixelData::U8(v) => v.len(),
            PixelData::U16(v) => v.len(),
            PixelData::F16(v) => v.len(),
            PixelData::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pixels ready to be handed to a container writer.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub width: usize,
    pub height: usize,
    pub format: SampleFormat,
    pub data: PixelData,
}

impl EncodedImage {
    pub fn channels(&self) -> usize {
        self.format.samples_per_pixel
    }
}
