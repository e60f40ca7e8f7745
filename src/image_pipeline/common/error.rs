use std::fmt;

use thiserror::Error;

/// Pipeline stage an error was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Decode,
    Encode,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Read => "read",
            Stage::Decode => "decode",
            Stage::Encode => "encode",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("read stage: failed to read input file: {0}")]
    InputReadError(String),

    #[error("write stage: failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("read stage: failed to decode {container} image: {reason}")]
    DecodeError { container: &'static str, reason: String },

    #[error("write stage: failed to encode {container} image: {reason}")]
    EncodeError { container: &'static str, reason: String },

    #[error("read stage: invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("{stage} stage: unsupported sample format: {detail}")]
    FormatUnsupported { stage: Stage, detail: String },

    #[error("{stage} stage: unsupported planar configuration: {detail}")]
    PlanarConfigUnsupported { stage: Stage, detail: String },

    #[error(
        "encode stage: cannot map {source_channels} source channel(s) to {target_channels} destination channel(s)"
    )]
    ChannelCountMismatch {
        source_channels: usize,
        target_channels: usize,
    },

    #[error(
        "decode stage: malformed scanline (row={row}, plane={plane}): expected {expected} bytes, got {actual}"
    )]
    MalformedScanline {
        row: usize,
        plane: usize,
        expected: usize,
        actual: usize,
    },

    #[error("read stage: unsupported container for {0}")]
    UnsupportedContainer(String),

    #[error("write stage: IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConversionError {
    pub fn unsupported(stage: Stage, detail: impl Into<String>) -> Self {
        ConversionError::FormatUnsupported {
            stage,
            detail: detail.into(),
        }
    }

    /// Stage the error was raised from.
    pub fn stage(&self) -> Stage {
        match self {
            ConversionError::FormatUnsupported { stage, .. }
            | ConversionError::PlanarConfigUnsupported { stage, .. } => *stage,
            ConversionError::InputReadError(_)
            | ConversionError::DecodeError { .. }
            | ConversionError::InvalidDimensions(..)
            | ConversionError::UnsupportedContainer(_) => Stage::Read,
            ConversionError::MalformedScanline { .. } => Stage::Decode,
            ConversionError::ChannelCountMismatch { .. } => Stage::Encode,
            ConversionError::OutputWriteError(_)
            | ConversionError::EncodeError { .. }
            | ConversionError::IoError(_) => Stage::Write,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;
