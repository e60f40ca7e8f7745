//! TIFF reader built on the `tiff` crate.
//!
//! Header tags are validated before any pixel data is decoded, so an
//! unsupported bit depth or channel count fails without touching the strips.
//! Contiguous images are read in one pass; planar images are read strip by
//! strip, one plane after another.

use std::io::Cursor;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result, Stage};
use crate::image_pipeline::container::reader::{ImageReader, ScanlineImage};
use crate::image_pipeline::container::types::ContainerKind;
use crate::image_pipeline::decode;
use crate::image_pipeline::raster::{PlanarLayout, SampleFormat, SampleKind};

pub struct TiffReader;

const PLANAR_CONFIG_CONTIGUOUS: u16 = 1;
const PLANAR_CONFIG_SEPARATE: u16 = 2;

const PHOTOMETRIC_BLACK_IS_ZERO: u16 = 1;
const PHOTOMETRIC_RGB: u16 = 2;

fn decode_error(e: tiff::TiffError) -> ConversionError {
    ConversionError::DecodeError {
        container: "TIFF",
        reason: e.to_string(),
    }
}

/// All samples must share one value; TIFF stores per-sample arrays.
fn uniform(values: &[u16], tag: &str) -> Result<u16> {
    match values.split_first() {
        Some((first, rest)) if rest.iter().all(|v| v == first) => Ok(*first),
        Some(_) => Err(ConversionError::unsupported(
            Stage::Read,
            format!("mixed {tag} values {values:?}"),
        )),
        None => Err(ConversionError::unsupported(Stage::Read, format!("empty {tag}"))),
    }
}

fn sample_kind(code: u16) -> Result<SampleKind> {
    match code {
        1 => Ok(SampleKind::Unsigned),
        2 => Ok(SampleKind::Signed),
        3 => Ok(SampleKind::Float),
        other => Err(ConversionError::unsupported(
            Stage::Read,
            format!("SampleFormat={other}"),
        )),
    }
}

fn read_format<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<SampleFormat> {
    if decoder.find_tag(Tag::TileWidth).map_err(decode_error)?.is_some() {
        return Err(ConversionError::unsupported(Stage::Read, "tiled TIFF"));
    }

    let photometric = decoder
        .find_tag_unsigned::<u16>(Tag::PhotometricInterpretation)
        .map_err(decode_error)?
        .unwrap_or(PHOTOMETRIC_BLACK_IS_ZERO);
    if !matches!(photometric, PHOTOMETRIC_BLACK_IS_ZERO | PHOTOMETRIC_RGB) {
        return Err(ConversionError::unsupported(
            Stage::Read,
            format!("PhotometricInterpretation={photometric}"),
        ));
    }

    let samples_per_pixel = decoder
        .find_tag_unsigned::<u16>(Tag::SamplesPerPixel)
        .map_err(decode_error)?
        .unwrap_or(1) as usize;
    let bits = decoder
        .find_tag_unsigned_vec::<u16>(Tag::BitsPerSample)
        .map_err(decode_error)?
        .unwrap_or_else(|| vec![1]);
    let kinds = decoder
        .find_tag_unsigned_vec::<u16>(Tag::SampleFormat)
        .map_err(decode_error)?
        .unwrap_or_else(|| vec![1]);
    let planar = decoder
        .find_tag_unsigned::<u16>(Tag::PlanarConfiguration)
        .map_err(decode_error)?
        .unwrap_or(PLANAR_CONFIG_CONTIGUOUS);

    let layout = match planar {
        PLANAR_CONFIG_CONTIGUOUS => PlanarLayout::Contiguous,
        PLANAR_CONFIG_SEPARATE => PlanarLayout::Planar,
        other => {
            return Err(ConversionError::PlanarConfigUnsupported {
                stage: Stage::Read,
                detail: format!("PlanarConfiguration={other}"),
            });
        }
    };

    let format = SampleFormat::new(
        sample_kind(uniform(&kinds, "SampleFormat")?)?,
        uniform(&bits, "BitsPerSample")?,
        samples_per_pixel,
        layout,
    );

    // Reject before decoding strips.
    decode::lookup(format.kind, format.bits_per_sample)?;
    if !matches!(format.samples_per_pixel, 1 | 3 | 4) {
        return Err(ConversionError::unsupported(
            Stage::Read,
            format!("samples_per_pixel={}", format.samples_per_pixel),
        ));
    }
    Ok(format)
}

/// Typed samples from the codec as little-endian bytes.
fn into_le_bytes(result: DecodingResult) -> Result<Vec<u8>> {
    let bytes = match result {
        DecodingResult::U8(v) => v,
        DecodingResult::U16(v) => v.iter().flat_map(|s| s.to_le_bytes()).collect(),
        DecodingResult::U32(v) => v.iter().flat_map(|s| s.to_le_bytes()).collect(),
        DecodingResult::I8(v) => v.iter().flat_map(|s| s.to_le_bytes()).collect(),
        DecodingResult::I16(v) => v.iter().flat_map(|s| s.to_le_bytes()).collect(),
        DecodingResult::I32(v) => v.iter().flat_map(|s| s.to_le_bytes()).collect(),
        DecodingResult::F16(v) => v.iter().flat_map(|s| s.to_le_bytes()).collect(),
        DecodingResult::F32(v) => v.iter().flat_map(|s| s.to_le_bytes()).collect(),
        _ => {
            return Err(ConversionError::unsupported(
                Stage::Read,
                "TIFF sample type without a decoder",
            ));
        }
    };
    Ok(bytes)
}

fn planar_error(e: tiff::TiffError) -> ConversionError {
    match e {
        tiff::TiffError::UnsupportedError(inner) => ConversionError::PlanarConfigUnsupported {
            stage: Stage::Read,
            detail: inner.to_string(),
        },
        other => decode_error(other),
    }
}

fn read_planes<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    format: &SampleFormat,
    height: usize,
) -> Result<Vec<Vec<u8>>> {
    let (_, rows_per_strip) = decoder.chunk_dimensions();
    let strips_per_plane = height.div_ceil(rows_per_strip.max(1) as usize);

    let mut planes = Vec::with_capacity(format.samples_per_pixel);
    for plane in 0..format.samples_per_pixel {
        let mut data = Vec::new();
        for strip in 0..strips_per_plane {
            let index = (plane * strips_per_plane + strip) as u32;
            let chunk = decoder.read_chunk(index).map_err(planar_error)?;
            data.extend(into_le_bytes(chunk)?);
        }
        planes.push(data);
    }
    Ok(planes)
}

impl ImageReader for TiffReader {
    fn container(&self) -> ContainerKind {
        ContainerKind::Tiff
    }

    fn read_image(&self, data: &[u8]) -> Result<ScanlineImage> {
        debug!("Decoding TIFF image, {} bytes", data.len());

        let mut decoder = Decoder::new(Cursor::new(data)).map_err(decode_error)?;
        let (width, height) = decoder.dimensions().map_err(decode_error)?;
        let (width, height) = (width as usize, height as usize);
        let format = read_format(&mut decoder)?;

        debug!(width, height, %format, "TIFF header");

        let planes = match format.layout {
            PlanarLayout::Contiguous => {
                vec![into_le_bytes(decoder.read_image().map_err(decode_error)?)?]
            }
            PlanarLayout::Planar => read_planes(&mut decoder, &format, height)?,
        };

        Ok(ScanlineImage::new(width, height, format, planes))
    }
}
