//! Color-space transforms
//!
//! Element-wise transfer functions between linear light and display-encoded
//! values, applied to the color channels of a raster. Alpha is never mapped.

pub mod transfer;
mod transform;

pub use transfer::Transfer;
pub use transform::{ColorStage, ColorTransform};
