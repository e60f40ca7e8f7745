//! Image conversion pipeline module
//!
//! Converts rasters between TIFF, OpenEXR and PNG. Each conversion reads
//! native scanlines, decodes them into a linear-light `f32` raster, applies
//! the color transforms and re-encodes the result for the destination
//! container.

pub mod color;
pub mod common;
pub mod container;
pub mod conversions;
pub mod decode;
pub mod layout;
pub mod raster;

pub use common::{ConversionError, PipelineTimings, Result, Stage};

pub use raster::{PlanarLayout, RasterBuffer, SampleFormat, SampleKind};

pub use color::{ColorStage, ColorTransform, Transfer};

pub use container::{
    ContainerKind, ExrCompression, ImageReader, ImageWriter, ScanlineImage, ScanlineSource,
    TiffCompression,
};

pub use conversions::{
    ConversionConfig, ConversionConfigBuilder, ConversionPipeline, OutputDepth, convert_path,
};
