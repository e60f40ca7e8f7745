use half::f16;
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result, Stage};
use crate::image_pipeline::layout::types::{AlphaPolicy, EncodedImage, PixelData};
use crate::image_pipeline::raster::{PlanarLayout, RasterBuffer, SampleFormat, SampleKind};

#[inline]
pub fn quantize_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * u8::MAX as f32).round() as u8
}

#[inline]
pub fn quantize_u16(v: f32) -> u16 {
    (v.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16
}

/// Rearranges `raster` into `target_channels` interleaved channels.
///
/// Extra source channels are dropped, luminance is broadcast to R, G and B,
/// and a missing alpha is written as 1.0. Color cannot be folded down to a
/// single channel.
pub fn map_channels(
    raster: &RasterBuffer,
    target_channels: usize,
    alpha: AlphaPolicy,
) -> Result<Vec<f32>> {
    let source_channels = raster.channel_count();
    let mismatch = || ConversionError::ChannelCountMismatch {
        source_channels,
        target_channels,
    };
    if !matches!(target_channels, 1 | 3 | 4) || (target_channels == 1 && source_channels != 1) {
        return Err(mismatch());
    }

    let mut out = Vec::with_capacity(raster.width() * raster.height() * target_channels);
    for pixel in raster.pixels() {
        let rgb = match source_channels {
            1 => [pixel[0]; 3],
            _ => [pixel[0], pixel[1], pixel[2]],
        };
        match target_channels {
            1 => out.push(pixel[0]),
            3 => out.extend_from_slice(&rgb),
            _ => {
                let a = match alpha {
                    AlphaPolicy::Opaque => 1.0,
                    AlphaPolicy::Preserve => pixel.get(3).copied().unwrap_or(1.0),
                };
                out.extend_from_slice(&rgb);
                out.push(a);
            }
        }
    }
    Ok(out)
}

/// Produces the destination's native samples for `target`.
pub fn encode_pixels(
    raster: &RasterBuffer,
    target: &SampleFormat,
    alpha: AlphaPolicy,
) -> Result<EncodedImage> {
    if target.layout == PlanarLayout::Planar {
        return Err(ConversionError::PlanarConfigUnsupported {
            stage: Stage::Encode,
            detail: format!("planar output ({target})"),
        });
    }

    debug!(
        source_channels = raster.channel_count(),
        %target,
        ?alpha,
        "Mapping channels"
    );
    let mapped = map_channels(raster, target.samples_per_pixel, alpha)?;

    let data = match (target.kind, target.bits_per_sample) {
        (SampleKind::Unsigned, 8) => {
            PixelData::U8(mapped.iter().map(|&v| quantize_u8(v)).collect())
        }
        (SampleKind::Unsigned, 16) => {
            PixelData::U16(mapped.iter().map(|&v| quantize_u16(v)).collect())
        }
        (SampleKind::Float, 16) => {
            PixelData::F16(mapped.iter().map(|&v| f16::from_f32(v)).collect())
        }
        (SampleKind::Float, 32) => PixelData::F32(mapped),
        (kind, bits) => {
            return Err(ConversionError::unsupported(
                Stage::Encode,
                format!("kind={kind}, bits_per_sample={bits}"),
            ));
        }
    };

    Ok(EncodedImage {
        width: raster.width(),
        height: raster.height(),
        format: *target,
        data,
    })
}
