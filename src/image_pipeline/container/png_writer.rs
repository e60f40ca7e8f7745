use std::io::Write;

use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result, Stage};
use crate::image_pipeline::container::types::ContainerKind;
use crate::image_pipeline::container::writer::ImageWriter;
use crate::image_pipeline::conversions::{ConversionConfig, OutputDepth};
use crate::image_pipeline::layout::{EncodedImage, PixelData};
use crate::image_pipeline::raster::SampleFormat;

/// Writes 8-bit (default) or 16-bit PNG, RGBA unless configured otherwise.
pub struct PngWriter;

fn encode_error(e: png::EncodingError) -> ConversionError {
    ConversionError::EncodeError {
        container: "PNG",
        reason: e.to_string(),
    }
}

impl ImageWriter for PngWriter {
    fn container(&self) -> ContainerKind {
        ContainerKind::Png
    }

    fn target_format(
        &self,
        _source: &SampleFormat,
        config: &ConversionConfig,
    ) -> Result<SampleFormat> {
        let depth = config.output_depth.unwrap_or(OutputDepth::U8);
        if !matches!(depth, OutputDepth::U8 | OutputDepth::U16) {
            return Err(ConversionError::unsupported(
                Stage::Encode,
                format!("PNG output depth {depth:?}"),
            ));
        }
        let (kind, bits) = depth.sample_type();
        Ok(SampleFormat::contiguous(kind, bits, config.output_channels.unwrap_or(4)))
    }

    fn write_image(
        &self,
        image: &EncodedImage,
        output: &mut dyn Write,
        config: &ConversionConfig,
    ) -> Result<()> {
        debug!("Encoding PNG image: {}x{} ({})", image.width, image.height, image.format);

        let color = match image.channels() {
            1 => png::ColorType::Grayscale,
            3 => png::ColorType::Rgb,
            4 => png::ColorType::Rgba,
            n => {
                return Err(ConversionError::unsupported(
                    Stage::Encode,
                    format!("PNG with {n} channels"),
                ));
            }
        };
        let (depth, bytes) = match &image.data {
            PixelData::U8(d) => (png::BitDepth::Eight, d.clone()),
            PixelData::U16(d) => (
                png::BitDepth::Sixteen,
                d.iter().flat_map(|v| v.to_be_bytes()).collect(),
            ),
            _ => {
                return Err(ConversionError::unsupported(
                    Stage::Encode,
                    format!("PNG output {}", image.format),
                ));
            }
        };

        let mut buffer = Vec::new();
        {
            let mut encoder =
                png::Encoder::new(&mut buffer, image.width as u32, image.height as u32);
            encoder.set_color(color);
            encoder.set_depth(depth);
            match config.gamma {
                Some(gamma) => encoder.set_source_gamma(png::ScaledFloat::new(1.0 / gamma)),
                None => encoder.set_source_srgb(png::SrgbRenderingIntent::Perceptual),
            }

            let mut writer = encoder.write_header().map_err(encode_error)?;
            writer.write_image_data(&bytes).map_err(encode_error)?;
            writer.finish().map_err(encode_error)?;
        }

        output.write_all(&buffer)?;

        debug!("PNG encoding complete");
        Ok(())
    }
}
