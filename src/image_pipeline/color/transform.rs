//! Color stage
//!
//! Exposure, clipping and a transfer function applied per sample to the
//! color channels of a raster.

use tracing::debug;

use crate::image_pipeline::color::transfer::{self, Transfer};
use crate::image_pipeline::decode::samples::sanitize;
use crate::image_pipeline::raster::RasterBuffer;

/// Per-sample mapping applied by a [`ColorStage`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorTransform {
    Identity,
    SrgbEncode,
    SrgbDecode,
    GammaEncode(f32),
    GammaDecode(f32),
}

impl ColorTransform {
    /// Transform that brings values stored with `transfer` into linear light.
    pub fn decoding(transfer: Transfer) -> Self {
        match transfer {
            Transfer::Linear => ColorTransform::Identity,
            Transfer::Srgb => ColorTransform::SrgbDecode,
            Transfer::Gamma(g) => ColorTransform::GammaDecode(g),
        }
    }

    /// Transform that encodes linear light with `transfer`.
    pub fn encoding(transfer: Transfer) -> Self {
        match transfer {
            Transfer::Linear => ColorTransform::Identity,
            Transfer::Srgb => ColorTransform::SrgbEncode,
            Transfer::Gamma(g) => ColorTransform::GammaEncode(g),
        }
    }

    #[inline]
    pub fn apply(self, v: f32) -> f32 {
        match self {
            ColorTransform::Identity => v,
            ColorTransform::SrgbEncode => transfer::srgb_encode(v),
            ColorTransform::SrgbDecode => transfer::srgb_decode(v),
            ColorTransform::GammaEncode(g) => transfer::gamma_encode(v, g),
            ColorTransform::GammaDecode(g) => transfer::gamma_decode(v, g),
        }
    }
}

/// A color transform with an optional exposure pre-scale, applied in place
/// to the R, G and B channels of a raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStage {
    pub transform: ColorTransform,
    pub exposure_stops: f32,
    /// Clip to [0, 1] after exposure, before the transform.
    pub clamp_to_unit: bool,
}

impl ColorStage {
    pub fn new(transform: ColorTransform) -> Self {
        Self {
            transform,
            exposure_stops: 0.0,
            clamp_to_unit: false,
        }
    }

    pub fn with_exposure(mut self, stops: f32) -> Self {
        self.exposure_stops = stops;
        self
    }

    pub fn clamped(mut self, clamp: bool) -> Self {
        self.clamp_to_unit = clamp;
        self
    }

    pub fn is_identity(&self) -> bool {
        self.transform == ColorTransform::Identity
            && self.exposure_stops == 0.0
            && !self.clamp_to_unit
    }

    #[inline]
    pub fn map(&self, v: f32) -> f32 {
        let mut v = v;
        if self.exposure_stops != 0.0 {
            v = transfer::exposure(v, self.exposure_stops);
        }
        if self.clamp_to_unit {
            v = v.clamp(0.0, 1.0);
        }
        sanitize(self.transform.apply(v))
    }

    pub fn apply(&self, raster: &mut RasterBuffer) {
        if self.is_identity() {
            return;
        }
        debug!(transform = ?self.transform, exposure = self.exposure_stops, "Applying color stage");

        let color_channels = if raster.has_alpha() { 3 } else { raster.channel_count() };
        for pixel in raster.pixels_mut() {
            for v in &mut pixel[..color_channels] {
                *v = self.map(*v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rgba(values: &[[f32; 4]]) -> RasterBuffer {
        let samples = values.iter().flatten().copied().collect();
        RasterBuffer::from_samples(values.len(), 1, 4, samples).unwrap()
    }

    #[test]
    fn test_alpha_is_exempt() {
        let mut raster = rgba(&[[0.2, 0.5, 0.9, 0.2], [1.5, -0.1, 0.0, 0.7]]);
        let stages = [
            ColorStage::new(ColorTransform::SrgbEncode),
            ColorStage::new(ColorTransform::SrgbDecode),
            ColorStage::new(ColorTransform::GammaEncode(2.2)).clamped(true),
            ColorStage::new(ColorTransform::Identity).with_exposure(3.0),
        ];
        for stage in stages {
            stage.apply(&mut raster);
            assert_eq!(raster.get(0, 0, 3), 0.2);
            assert_eq!(raster.get(1, 0, 3), 0.7);
        }
    }

    #[test]
    fn test_decode_then_encode_is_identity() {
        let original = rgba(&[[0.0, 0.25, 0.5, 1.0], [0.75, 0.9, 1.0, 0.5]]);
        let mut raster = original.clone();

        ColorStage::new(ColorTransform::SrgbDecode).apply(&mut raster);
        ColorStage::new(ColorTransform::SrgbEncode).apply(&mut raster);

        for (a, b) in raster.samples().iter().zip(original.samples()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_exposure_applies_before_encode() {
        let stage = ColorStage::new(ColorTransform::GammaEncode(2.0)).with_exposure(2.0);
        // 0.0625 * 4 = 0.25, sqrt(0.25) = 0.5
        assert_abs_diff_eq!(stage.map(0.0625), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_clamp_before_gamma() {
        let stage = ColorStage::new(ColorTransform::GammaEncode(2.2)).clamped(true);
        assert_eq!(stage.map(3.0), 1.0);

        let unclamped = ColorStage::new(ColorTransform::GammaEncode(2.2));
        assert!(unclamped.map(3.0) > 1.0);
    }

    #[test]
    fn test_single_channel_is_transformed() {
        let mut raster = RasterBuffer::from_samples(2, 1, 1, vec![0.5, 1.0]).unwrap();
        ColorStage::new(ColorTransform::SrgbDecode).apply(&mut raster);
        assert_abs_diff_eq!(raster.samples()[0], 0.214, epsilon = 1e-3);
    }

    #[test]
    fn test_results_stay_finite() {
        let stage = ColorStage::new(ColorTransform::Identity).with_exposure(200.0);
        assert!(stage.map(1.0).is_finite());
    }

    #[test]
    fn test_transfer_mapping() {
        assert_eq!(ColorTransform::decoding(Transfer::Linear), ColorTransform::Identity);
        assert_eq!(ColorTransform::decoding(Transfer::Srgb), ColorTransform::SrgbDecode);
        assert_eq!(
            ColorTransform::encoding(Transfer::Gamma(1.8)),
            ColorTransform::GammaEncode(1.8)
        );
    }
}
