//! Raster and sample format types

use std::fmt;

use crate::image_pipeline::common::error::{ConversionError, Result, Stage};

/// Native storage type of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    /// Unsigned integer (TIFF SampleFormat=1)
    Unsigned,
    /// Two's complement signed integer (TIFF SampleFormat=2)
    Signed,
    /// IEEE floating point (TIFF SampleFormat=3)
    Float,
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleKind::Unsigned => f.write_str("unsigned-int"),
            SampleKind::Signed => f.write_str("signed-int"),
            SampleKind::Float => f.write_str("float"),
        }
    }
}

/// How channels are arranged in the source scanlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanarLayout {
    /// All channels of a pixel interleaved in one scanline
    Contiguous,
    /// One scanline stream per channel
    Planar,
}

/// Native encoding of a container's pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleFormat {
    pub kind: SampleKind,
    pub bits_per_sample: u16,
    pub samples_per_pixel: usize,
    pub layout: PlanarLayout,
}

impl SampleFormat {
    /// Creates a format, normalizing the layout: a single channel cannot be
    /// separated, so it is always contiguous.
    pub fn new(
        kind: SampleKind,
        bits_per_sample: u16,
        samples_per_pixel: usize,
        layout: PlanarLayout,
    ) -> Self {
        let layout = if samples_per_pixel == 1 {
            PlanarLayout::Contiguous
        } else {
            layout
        };
        Self {
            kind,
            bits_per_sample,
            samples_per_pixel,
            layout,
        }
    }

    pub fn contiguous(kind: SampleKind, bits_per_sample: u16, samples_per_pixel: usize) -> Self {
        Self::new(kind, bits_per_sample, samples_per_pixel, PlanarLayout::Contiguous)
    }

    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample as usize).div_ceil(8)
    }

    pub fn is_integer(&self) -> bool {
        !matches!(self.kind, SampleKind::Float)
    }

    /// Number of separate scanline streams a reader has to provide.
    pub fn plane_count(&self) -> usize {
        match self.layout {
            PlanarLayout::Contiguous => 1,
            PlanarLayout::Planar => self.samples_per_pixel,
        }
    }

    /// Samples carried by one pixel of a single stream.
    pub fn samples_per_stream(&self) -> usize {
        match self.layout {
            PlanarLayout::Contiguous => self.samples_per_pixel,
            PlanarLayout::Planar => 1,
        }
    }

    /// Byte length of one scanline of one stream.
    pub fn scanline_len(&self, width: usize) -> usize {
        width * self.bytes_per_sample() * self.samples_per_stream()
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-bit x{} ({:?})",
            self.kind, self.bits_per_sample, self.samples_per_pixel, self.layout
        )
    }
}

/// Normalized image: `width * height * channel_count` finite `f32` samples,
/// stored as `samples[channel + channel_count * (x + width * y)]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffer {
    width: usize,
    height: usize,
    channel_count: usize,
    samples: Vec<f32>,
}

impl RasterBuffer {
    pub fn new(width: usize, height: usize, channel_count: usize) -> Result<Self> {
        Self::from_samples(
            width,
            height,
            channel_count,
            vec![0.0; width * height * channel_count],
        )
    }

    pub fn from_samples(
        width: usize,
        height: usize,
        channel_count: usize,
        samples: Vec<f32>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ConversionError::InvalidDimensions(width, height));
        }
        if !matches!(channel_count, 1 | 3 | 4) {
            return Err(ConversionError::unsupported(
                Stage::Decode,
                format!("samples_per_pixel={channel_count}"),
            ));
        }
        let expected = width * height * channel_count;
        if samples.len() != expected {
            return Err(ConversionError::InvalidDimensions(width, height));
        }
        Ok(Self {
            width,
            height,
            channel_count,
            samples,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn has_alpha(&self) -> bool {
        self.channel_count == 4
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn index(&self, x: usize, y: usize, channel: usize) -> usize {
        channel + self.channel_count * (x + self.width * y)
    }

    pub fn get(&self, x: usize, y: usize, channel: usize) -> f32 {
        self.samples[self.index(x, y, channel)]
    }

    pub fn pixel(&self, x: usize, y: usize) -> &[f32] {
        let start = self.index(x, y, 0);
        &self.samples[start..start + self.channel_count]
    }

    pub fn pixels(&self) -> impl Iterator<Item = &[f32]> {
        self.samples.chunks_exact(self.channel_count)
    }

    pub fn pixels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.samples.chunks_exact_mut(self.channel_count)
    }

    /// Mutable view of row `y`.
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let len = self.width * self.channel_count;
        &mut self.samples[y * len..(y + 1) * len]
    }
}
