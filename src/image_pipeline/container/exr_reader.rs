//! OpenEXR reader built on the `exr` crate.
//!
//! Reads the first valid layer at its largest resolution level and picks its
//! channels by name: `R`, `G`, `B` (and `A`) when present, otherwise
//! luminance `Y`. A `Y` + `A` layer is expanded to grey RGBA. Layers whose
//! selected channels are all half floats are handed on as 16-bit samples.

use std::io::Cursor;

use exr::image::{AnyChannels, FlatSamples};
use exr::prelude::{ReadChannels, ReadLayers};
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result, Stage};
use crate::image_pipeline::container::reader::{ImageReader, ScanlineImage};
use crate::image_pipeline::container::types::ContainerKind;
use crate::image_pipeline::raster::{SampleFormat, SampleKind};

pub struct ExrReader;

fn channel<'a>(channels: &'a AnyChannels<FlatSamples>, name: &str) -> Option<&'a FlatSamples> {
    channels
        .list
        .iter()
        .find(|c| c.name.to_string() == name)
        .map(|c| &c.sample_data)
}

/// Channels in output order, repeated where luminance is broadcast.
fn select_channels<'a>(channels: &'a AnyChannels<FlatSamples>) -> Result<Vec<&'a FlatSamples>> {
    let find = |name| channel(channels, name);
    match (find("R"), find("G"), find("B"), find("Y"), find("A")) {
        (Some(r), Some(g), Some(b), _, alpha) => {
            Ok([Some(r), Some(g), Some(b), alpha].into_iter().flatten().collect())
        }
        (_, _, _, Some(y), Some(a)) => Ok(vec![y, y, y, a]),
        (_, _, _, Some(y), None) => Ok(vec![y]),
        _ => {
            let names: Vec<String> = channels.list.iter().map(|c| c.name.to_string()).collect();
            Err(ConversionError::unsupported(
                Stage::Read,
                format!("EXR layer without RGB or Y channels: {names:?}"),
            ))
        }
    }
}

fn to_f32(samples: &FlatSamples) -> Result<Vec<f32>> {
    match samples {
        FlatSamples::F16(v) => Ok(v.iter().map(|s| s.to_f32()).collect()),
        FlatSamples::F32(v) => Ok(v.clone()),
        FlatSamples::U32(_) => Err(ConversionError::unsupported(
            Stage::Read,
            "EXR color channel with u32 samples",
        )),
    }
}

impl ImageReader for ExrReader {
    fn container(&self) -> ContainerKind {
        ContainerKind::Exr
    }

    fn read_image(&self, data: &[u8]) -> Result<ScanlineImage> {
        debug!("Decoding EXR image, {} bytes", data.len());

        let image = exr::prelude::read()
            .no_deep_data()
            .largest_resolution_level()
            .all_channels()
            .first_valid_layer()
            .all_attributes()
            .from_buffered(Cursor::new(data))
            .map_err(|e| ConversionError::DecodeError {
                container: "EXR",
                reason: e.to_string(),
            })?;

        let width = image.layer_data.size.width();
        let height = image.layer_data.size.height();
        let selected = select_channels(&image.layer_data.channel_data)?;
        let all_half = selected.iter().all(|s| matches!(s, FlatSamples::F16(_)));

        let planes = selected
            .iter()
            .map(|s| to_f32(s))
            .collect::<Result<Vec<_>>>()?;
        if planes.iter().any(|p| p.len() != width * height) {
            return Err(ConversionError::unsupported(
                Stage::Read,
                "subsampled EXR channels",
            ));
        }

        let samples_per_pixel = planes.len();
        let bits_per_sample: u16 = if all_half { 16 } else { 32 };
        let mut bytes =
            Vec::with_capacity(width * height * samples_per_pixel * bits_per_sample as usize / 8);
        for i in 0..width * height {
            for plane in &planes {
                if all_half {
                    bytes.extend_from_slice(&half::f16::from_f32(plane[i]).to_le_bytes());
                } else {
                    bytes.extend_from_slice(&plane[i].to_le_bytes());
                }
            }
        }

        let format =
            SampleFormat::contiguous(SampleKind::Float, bits_per_sample, samples_per_pixel);
        debug!(width, height, %format, "EXR header");

        Ok(ScanlineImage::new(width, height, format, vec![bytes]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::container::ScanlineSource;
    use crate::image_pipeline::decode::decode_raster;
    use exr::prelude::*;
    use half::f16;

    fn write_layer(width: usize, channels: Vec<AnyChannel<FlatSamples>>) -> Vec<u8> {
        let layer = Layer::new(
            (width, 1),
            LayerAttributes::default(),
            Encoding::UNCOMPRESSED,
            AnyChannels::sort(channels.into()),
        );
        let mut buffer = Vec::new();
        Image::from_layer(layer)
            .write()
            .to_buffered(Cursor::new(&mut buffer))
            .unwrap();
        buffer
    }

    #[test]
    fn test_luminance_is_a_single_channel() {
        let bytes = write_layer(
            2,
            vec![AnyChannel::new("Y", FlatSamples::F32(vec![0.25, 0.75]))],
        );

        let image = ExrReader.read_image(&bytes).unwrap();

        assert_eq!(image.format, SampleFormat::contiguous(SampleKind::Float, 32, 1));
        let raster = decode_raster(&image).unwrap();
        assert_eq!(raster.samples(), &[0.25f32, 0.75]);
    }

    #[test]
    fn test_luminance_alpha_becomes_grey_rgba() {
        let half = |v: f32| f16::from_f32(v);
        let bytes = write_layer(
            1,
            vec![
                AnyChannel::new("Y", FlatSamples::F16(vec![half(0.5)])),
                AnyChannel::new("A", FlatSamples::F16(vec![half(0.25)])),
            ],
        );

        let image = ExrReader.read_image(&bytes).unwrap();

        assert_eq!(image.format, SampleFormat::contiguous(SampleKind::Float, 16, 4));
        let raster = decode_raster(&image).unwrap();
        assert_eq!(raster.samples(), &[0.5f32, 0.5, 0.5, 0.25]);
    }

    #[test]
    fn test_channels_are_reordered_to_rgba() {
        // Stored alphabetically as A, B, G, R.
        let bytes = write_layer(
            1,
            vec![
                AnyChannel::new("R", FlatSamples::F32(vec![0.1])),
                AnyChannel::new("G", FlatSamples::F32(vec![0.2])),
                AnyChannel::new("B", FlatSamples::F32(vec![0.3])),
                AnyChannel::new("A", FlatSamples::F32(vec![0.4])),
            ],
        );

        let image = ExrReader.read_image(&bytes).unwrap();

        let raster = decode_raster(&image).unwrap();
        assert_eq!(raster.samples(), &[0.1f32, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_rejects_layer_without_color() {
        let bytes = write_layer(1, vec![AnyChannel::new("Z", FlatSamples::F32(vec![4.0]))]);

        let err = ExrReader.read_image(&bytes).unwrap_err();

        assert!(matches!(
            err,
            ConversionError::FormatUnsupported {
                stage: Stage::Read,
                ..
            }
        ));
    }
}
