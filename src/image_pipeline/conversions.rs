//! Pipeline conversions module
//!
//! Orchestrates read → decode → color → channel mapping → write for any pair
//! of supported containers.

mod pipeline;
pub mod types;

#[cfg(test)]
mod tests;

pub use pipeline::{ConversionPipeline, convert_path};
pub use types::{ConversionConfig, ConversionConfigBuilder, OutputDepth};
