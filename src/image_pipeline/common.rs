//! Common utilities module
//!
//! Shared error types and stage timing used across the image pipeline.

pub mod error;
pub mod timing;

pub use error::{ConversionError, Result, Stage};
pub use timing::{PipelineTimings, StageTiming, Timer};
