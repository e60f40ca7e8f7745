//! Container kinds and per-container write options

use std::fmt;
use std::path::Path;

use crate::image_pipeline::common::error::{ConversionError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Tiff,
    Exr,
    Png,
}

const EXR_MAGIC: [u8; 4] = [0x76, 0x2f, 0x31, 0x01];
const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

impl ContainerKind {
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "tif" | "tiff" => Some(ContainerKind::Tiff),
            "exr" => Some(ContainerKind::Exr),
            "png" => Some(ContainerKind::Png),
            _ => None,
        }
    }

    pub fn from_magic(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
            Some(ContainerKind::Tiff)
        } else if data.starts_with(&EXR_MAGIC) {
            Some(ContainerKind::Exr)
        } else if data.starts_with(&PNG_MAGIC) {
            Some(ContainerKind::Png)
        } else {
            None
        }
    }

    /// Container of an input file: magic bytes first, extension as fallback.
    pub fn detect(path: &Path, data: &[u8]) -> Result<Self> {
        Self::from_magic(data)
            .or_else(|| Self::from_extension(path))
            .ok_or_else(|| ConversionError::UnsupportedContainer(path.display().to_string()))
    }

    pub fn for_output(path: &Path) -> Result<Self> {
        Self::from_extension(path)
            .ok_or_else(|| ConversionError::UnsupportedContainer(path.display().to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ContainerKind::Tiff => "TIFF",
            ContainerKind::Exr => "EXR",
            ContainerKind::Png => "PNG",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression
    Lzw,
    /// Deflate compression - fast level
    DeflateFast,
    /// Deflate compression - balanced
    DeflateBalanced,
    /// Deflate compression - best compression (slower)
    DeflateBest,
}

/// EXR compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExrCompression {
    None,
    Rle,
    Zip,
    Piz,
}
