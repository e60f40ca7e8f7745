use std::io::{Cursor, Write};

use exr::compression::Compression;
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result, Stage};
use crate::image_pipeline::container::types::{ContainerKind, ExrCompression};
use crate::image_pipeline::container::writer::ImageWriter;
use crate::image_pipeline::conversions::{ConversionConfig, OutputDepth};
use crate::image_pipeline::layout::{EncodedImage, PixelData};
use crate::image_pipeline::raster::SampleFormat;

/// Writes a single RGBA (or RGB) layer of half or full floats.
pub struct ExrWriter;

fn encode_error(e: exr::error::Error) -> ConversionError {
    ConversionError::EncodeError {
        container: "EXR",
        reason: e.to_string(),
    }
}

fn compression(config: &ConversionConfig) -> Compression {
    match config.exr_compression {
        ExrCompression::None => Compression::Uncompressed,
        ExrCompression::Rle => Compression::RLE,
        ExrCompression::Zip => Compression::ZIP16,
        ExrCompression::Piz => Compression::PIZ,
    }
}

/// Builds and writes one layer whose pixels are read from the interleaved `$data`.
macro_rules! write_layer {
    ($data:expr, $width:expr, $height:expr, $encoding:expr, rgba) => {{
        let (data, width) = ($data, $width);
        let channels = SpecificChannels::rgba(|pos: Vec2<usize>| {
            let i = 4 * (pos.y() * width + pos.x());
            (data[i], data[i + 1], data[i + 2], data[i + 3])
        });
        write_layer!(@write channels, width, $height, $encoding)
    }};
    ($data:expr, $width:expr, $height:expr, $encoding:expr, rgb) => {{
        let (data, width) = ($data, $width);
        let channels = SpecificChannels::rgb(|pos: Vec2<usize>| {
            let i = 3 * (pos.y() * width + pos.x());
            (data[i], data[i + 1], data[i + 2])
        });
        write_layer!(@write channels, width, $height, $encoding)
    }};
    (@write $channels:expr, $width:expr, $height:expr, $encoding:expr) => {{
        let layer = Layer::new(($width, $height), LayerAttributes::default(), $encoding, $channels);
        let mut buffer = Vec::new();
        let written = Image::from_layer(layer)
            .write()
            .to_buffered(Cursor::new(&mut buffer));
        written.map(|_| buffer)
    }};
}

impl ImageWriter for ExrWriter {
    fn container(&self) -> ContainerKind {
        ContainerKind::Exr
    }

    fn target_format(
        &self,
        _source: &SampleFormat,
        config: &ConversionConfig,
    ) -> Result<SampleFormat> {
        let depth = config.output_depth.unwrap_or(OutputDepth::F16);
        if !matches!(depth, OutputDepth::F16 | OutputDepth::F32) {
            return Err(ConversionError::unsupported(
                Stage::Encode,
                format!("EXR output depth {depth:?}"),
            ));
        }
        let channels = config.output_channels.unwrap_or(4);
        if !matches!(channels, 3 | 4) {
            return Err(ConversionError::unsupported(
                Stage::Encode,
                format!("EXR output with {channels} channel(s)"),
            ));
        }
        let (kind, bits) = depth.sample_type();
        Ok(SampleFormat::contiguous(kind, bits, channels))
    }

    fn write_image(
        &self,
        image: &EncodedImage,
        output: &mut dyn Write,
        config: &ConversionConfig,
    ) -> Result<()> {
        use exr::prelude::*;

        debug!("Encoding EXR image: {}x{} ({})", image.width, image.height, image.format);

        let encoding = Encoding {
            compression: compression(config),
            ..Encoding::SMALL_LOSSLESS
        };
        let (width, height) = (image.width, image.height);

        let written = match (&image.data, image.channels()) {
            (PixelData::F16(d), 4) => write_layer!(d, width, height, encoding, rgba),
            (PixelData::F16(d), 3) => write_layer!(d, width, height, encoding, rgb),
            (PixelData::F32(d), 4) => write_layer!(d, width, height, encoding, rgba),
            (PixelData::F32(d), 3) => write_layer!(d, width, height, encoding, rgb),
            _ => {
                return Err(ConversionError::unsupported(
                    Stage::Encode,
                    format!("EXR output {}", image.format),
                ));
            }
        };
        let buffer = written.map_err(encode_error)?;

        output.write_all(&buffer)?;

        debug!("EXR encoding complete");
        Ok(())
    }
}
