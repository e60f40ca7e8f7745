use std::io::Write;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::container::types::ContainerKind;
use crate::image_pipeline::conversions::{ConversionConfig, OutputDepth};
use crate::image_pipeline::layout::EncodedImage;
use crate::image_pipeline::raster::{SampleFormat, SampleKind};

pub trait ImageWriter {
    fn container(&self) -> ContainerKind;

    /// Destination encoding for a source in `source` format.
    fn target_format(
        &self,
        source: &SampleFormat,
        config: &ConversionConfig,
    ) -> Result<SampleFormat>;

    fn write_image(
        &self,
        image: &EncodedImage,
        output: &mut dyn Write,
        config: &ConversionConfig,
    ) -> Result<()>;
}

impl<W: ImageWriter + ?Sized> ImageWriter for Box<W> {
    fn container(&self) -> ContainerKind {
        (**self).container()
    }

    fn target_format(
        &self,
        source: &SampleFormat,
        config: &ConversionConfig,
    ) -> Result<SampleFormat> {
        (**self).target_format(source, config)
    }

    fn write_image(
        &self,
        image: &EncodedImage,
        output: &mut dyn Write,
        config: &ConversionConfig,
    ) -> Result<()> {
        (**self).write_image(image, output, config)
    }
}

impl OutputDepth {
    pub fn sample_type(self) -> (SampleKind, u16) {
        match self {
            OutputDepth::U8 => (SampleKind::Unsigned, 8),
            OutputDepth::U16 => (SampleKind::Unsigned, 16),
            OutputDepth::F16 => (SampleKind::Float, 16),
            OutputDepth::F32 => (SampleKind::Float, 32),
        }
    }
}
