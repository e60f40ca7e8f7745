use std::io::Cursor;

use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result, Stage};
use crate::image_pipeline::container::reader::{ImageReader, ScanlineImage};
use crate::image_pipeline::container::types::ContainerKind;
use crate::image_pipeline::raster::{SampleFormat, SampleKind};

/// PNG reader. Palette and sub-byte images are expanded to 8-bit by the codec.
pub struct PngReader;

fn decode_error(e: png::DecodingError) -> ConversionError {
    ConversionError::DecodeError {
        container: "PNG",
        reason: e.to_string(),
    }
}

impl ImageReader for PngReader {
    fn container(&self) -> ContainerKind {
        ContainerKind::Png
    }

    fn read_image(&self, data: &[u8]) -> Result<ScanlineImage> {
        debug!("Decoding PNG image, {} bytes", data.len());

        let mut decoder = png::Decoder::new(Cursor::new(data));
        decoder.set_transformations(png::Transformations::EXPAND);
        let mut reader = decoder.read_info().map_err(decode_error)?;

        let (color_type, bit_depth) = reader.output_color_type();
        let samples_per_pixel = color_type.samples();
        let bits_per_sample = match bit_depth {
            png::BitDepth::Eight => 8,
            png::BitDepth::Sixteen => 16,
            other => {
                return Err(ConversionError::unsupported(
                    Stage::Read,
                    format!("PNG bit depth {other:?}"),
                ));
            }
        };

        let buf_size = reader.output_buffer_size().ok_or_else(|| ConversionError::DecodeError {
            container: "PNG",
            reason: "cannot determine output buffer size".into(),
        })?;
        let mut buf = vec![0u8; buf_size];
        let info = reader.next_frame(&mut buf).map_err(decode_error)?;
        buf.truncate(info.buffer_size());

        // PNG stores 16-bit samples big-endian.
        if bits_per_sample == 16 {
            for pair in buf.chunks_exact_mut(2) {
                pair.swap(0, 1);
            }
        }

        let format =
            SampleFormat::contiguous(SampleKind::Unsigned, bits_per_sample, samples_per_pixel);
        debug!(width = info.width, height = info.height, %format, "PNG header");

        Ok(ScanlineImage::new(
            info.width as usize,
            info.height as usize,
            format,
            vec![buf],
        ))
    }
}
