use std::io::{Cursor, Write};

use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder, colortype};
use tiff::tags::Predictor;
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result, Stage};
use crate::image_pipeline::container::types::{ContainerKind, TiffCompression};
use crate::image_pipeline::container::writer::ImageWriter;
use crate::image_pipeline::conversions::{ConversionConfig, OutputDepth};
use crate::image_pipeline::layout::{EncodedImage, PixelData};
use crate::image_pipeline::raster::{SampleFormat, SampleKind};

/// Writes 8-bit, 16-bit or 32-bit float TIFF, keeping the source channel
/// count unless configured otherwise.
pub struct TiffWriter;

fn encode_error(e: tiff::TiffError) -> ConversionError {
    ConversionError::EncodeError {
        container: "TIFF",
        reason: e.to_string(),
    }
}

fn compression(config: &ConversionConfig) -> Compression {
    match config.tiff_compression {
        TiffCompression::None => Compression::Uncompressed,
        TiffCompression::Lzw => Compression::Lzw,
        TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
        TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
        TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
    }
}

impl ImageWriter for TiffWriter {
    fn container(&self) -> ContainerKind {
        ContainerKind::Tiff
    }

    fn target_format(
        &self,
        source: &SampleFormat,
        config: &ConversionConfig,
    ) -> Result<SampleFormat> {
        let depth = config.output_depth.unwrap_or(match (source.kind, source.bits_per_sample) {
            (SampleKind::Float, _) => OutputDepth::F32,
            (_, 8) => OutputDepth::U8,
            _ => OutputDepth::U16,
        });
        if depth == OutputDepth::F16 {
            return Err(ConversionError::unsupported(
                Stage::Encode,
                "TIFF output does not support 16-bit float",
            ));
        }
        let (kind, bits) = depth.sample_type();
        let channels = config.output_channels.unwrap_or(source.samples_per_pixel);
        Ok(SampleFormat::contiguous(kind, bits, channels))
    }

    fn write_image(
        &self,
        image: &EncodedImage,
        output: &mut dyn Write,
        config: &ConversionConfig,
    ) -> Result<()> {
        debug!("Encoding TIFF image: {}x{} ({})", image.width, image.height, image.format);

        let mut buffer = Vec::new();
        let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(encode_error)?
            .with_compression(compression(config));

        // Horizontal differencing is only defined here for integer samples.
        if config.predictor == Some(2) && image.format.is_integer() {
            encoder = encoder.with_predictor(Predictor::Horizontal);
        }

        let (width, height) = (image.width as u32, image.height as u32);
        let written = match (&image.data, image.channels()) {
            (PixelData::U8(d), 1) => encoder.write_image::<colortype::Gray8>(width, height, d),
            (PixelData::U8(d), 3) => encoder.write_image::<colortype::RGB8>(width, height, d),
            (PixelData::U8(d), 4) => encoder.write_image::<colortype::RGBA8>(width, height, d),
            (PixelData::U16(d), 1) => encoder.write_image::<colortype::Gray16>(width, height, d),
            (PixelData::U16(d), 3) => encoder.write_image::<colortype::RGB16>(width, height, d),
            (PixelData::U16(d), 4) => encoder.write_image::<colortype::RGBA16>(width, height, d),
            (PixelData::F32(d), 1) => {
                encoder.write_image::<colortype::Gray32Float>(width, height, d)
            }
            (PixelData::F32(d), 3) => {
                encoder.write_image::<colortype::RGB32Float>(width, height, d)
            }
            (PixelData::F32(d), 4) => {
                encoder.write_image::<colortype::RGBA32Float>(width, height, d)
            }
            _ => {
                return Err(ConversionError::unsupported(
                    Stage::Encode,
                    format!("TIFF output {}", image.format),
                ));
            }
        };
        written.map_err(encode_error)?;

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }
}
