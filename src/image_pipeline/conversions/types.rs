//! Conversion configuration types

use crate::image_pipeline::color::Transfer;
use crate::image_pipeline::container::{ExrCompression, TiffCompression};
use crate::image_pipeline::layout::AlphaPolicy;

/// Sample type of the written file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputDepth {
    U8,
    U16,
    F16,
    F32,
}

/// Configuration for a container conversion
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Write alpha = 1.0 regardless of the source
    pub ignore_alpha: bool,
    /// Gamma used instead of sRGB for integer destinations
    pub gamma: Option<f32>,
    /// Exposure adjustment in stops, applied before encoding
    pub exposure_stops: f32,
    /// Override for how source samples are encoded; `None` picks sRGB for
    /// integer sources and linear for float sources
    pub source_transfer: Option<Transfer>,
    /// Output sample type; `None` uses the container default
    pub output_depth: Option<OutputDepth>,
    /// Output channel count (1, 3 or 4); `None` uses the container default
    pub output_channels: Option<usize>,
    pub tiff_compression: TiffCompression,
    /// Predictor value for TIFF compression (2 for horizontal differencing)
    pub predictor: Option<u16>,
    pub exr_compression: ExrCompression,
    /// Whether to validate image dimensions before conversion
    pub validate_dimensions: bool,
    pub max_dimension: Option<usize>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            ignore_alpha: false,
            gamma: None,
            exposure_stops: 0.0,
            source_transfer: None,
            output_depth: None,
            output_channels: None,
            tiff_compression: TiffCompression::Lzw,
            predictor: None,
            exr_compression: ExrCompression::Zip,
            validate_dimensions: true,
            max_dimension: Some(65536),
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }

    pub fn alpha_policy(&self) -> AlphaPolicy {
        if self.ignore_alpha {
            AlphaPolicy::Opaque
        } else {
            AlphaPolicy::Preserve
        }
    }

    /// Transfer used to encode integer destinations.
    pub fn output_transfer(&self) -> Transfer {
        match self.gamma {
            Some(g) => Transfer::Gamma(g),
            None => Transfer::Srgb,
        }
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    ignore_alpha: Option<bool>,
    gamma: Option<Option<f32>>,
    exposure_stops: Option<f32>,
    source_transfer: Option<Option<Transfer>>,
    output_depth: Option<Option<OutputDepth>>,
    output_channels: Option<Option<usize>>,
    tiff_compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    exr_compression: Option<ExrCompression>,
    validate_dimensions: Option<bool>,
    max_dimension: Option<Option<usize>>,
}

impl ConversionConfigBuilder {
    pub fn ignore_alpha(mut self, ignore: bool) -> Self {
        self.ignore_alpha = Some(ignore);
        self
    }

    pub fn gamma(mut self, gamma: Option<f32>) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn exposure(mut self, stops: f32) -> Self {
        self.exposure_stops = Some(stops);
        self
    }

    pub fn source_transfer(mut self, transfer: Option<Transfer>) -> Self {
        self.source_transfer = Some(transfer);
        self
    }

    pub fn output_depth(mut self, depth: Option<OutputDepth>) -> Self {
        self.output_depth = Some(depth);
        self
    }

    pub fn output_channels(mut self, channels: Option<usize>) -> Self {
        self.output_channels = Some(channels);
        self
    }

    pub fn tiff_compression(mut self, compression: TiffCompression) -> Self {
        self.tiff_compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn exr_compression(mut self, compression: ExrCompression) -> Self {
        self.exr_compression = Some(compression);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn max_dimension(mut self, max: Option<usize>) -> Self {
        self.max_dimension = Some(max);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            ignore_alpha: self.ignore_alpha.unwrap_or(default.ignore_alpha),
            gamma: self.gamma.unwrap_or(default.gamma),
            exposure_stops: self.exposure_stops.unwrap_or(default.exposure_stops),
            source_transfer: self.source_transfer.unwrap_or(default.source_transfer),
            output_depth: self.output_depth.unwrap_or(default.output_depth),
            output_channels: self.output_channels.unwrap_or(default.output_channels),
            tiff_compression: self.tiff_compression.unwrap_or(default.tiff_compression),
            predictor: self.predictor.unwrap_or(default.predictor),
            exr_compression: self.exr_compression.unwrap_or(default.exr_compression),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            max_dimension: self.max_dimension.unwrap_or(default.max_dimension),
        }
    }
}
