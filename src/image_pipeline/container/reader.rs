use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::container::types::ContainerKind;
use crate::image_pipeline::raster::SampleFormat;

/// Row access to native, undecoded samples.
pub trait ScanlineSource {
    fn dimensions(&self) -> (usize, usize);

    fn sample_format(&self) -> SampleFormat;

    /// Little-endian bytes of `row` in stream `plane` (always 0 for contiguous data).
    fn read_scanline(&self, row: usize, plane: usize) -> Result<&[u8]>;
}

/// Container pixels as read from disk, one byte buffer per plane.
#[derive(Debug, Clone)]
pub struct ScanlineImage {
    pub width: usize,
    pub height: usize,
    pub format: SampleFormat,
    planes: Vec<Vec<u8>>,
}

impl ScanlineImage {
    pub fn new(width: usize, height: usize, format: SampleFormat, planes: Vec<Vec<u8>>) -> Self {
        Self {
            width,
            height,
            format,
            planes,
        }
    }

    pub fn planes(&self) -> &[Vec<u8>] {
        &self.planes
    }
}

impl ScanlineSource for ScanlineImage {
    fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn sample_format(&self) -> SampleFormat {
        self.format
    }

    fn read_scanline(&self, row: usize, plane: usize) -> Result<&[u8]> {
        let row_len = self.format.scanline_len(self.width);
        let missing = || ConversionError::MalformedScanline {
            row,
            plane,
            expected: row_len,
            actual: 0,
        };

        let data = self.planes.get(plane).ok_or_else(missing)?;
        if row >= self.height {
            return Err(missing());
        }
        let start = row * row_len;
        let end = (start + row_len).min(data.len());
        // A truncated plane yields a short row; the sample decoder rejects it.
        Ok(data.get(start..end).unwrap_or(&[]))
    }
}

pub trait ImageReader {
    fn container(&self) -> ContainerKind;

    fn read_image(&self, data: &[u8]) -> Result<ScanlineImage>;
}

impl<R: ImageReader + ?Sized> ImageReader for Box<R> {
    fn container(&self) -> ContainerKind {
        (**self).container()
    }

    fn read_image(&self, data: &[u8]) -> Result<ScanlineImage> {
        (**self).read_image(data)
    }
}
