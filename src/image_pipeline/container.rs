//! Container readers and writers
//!
//! Thin adapters over the `tiff`, `exr` and `png` codecs. Readers expose
//! native scanlines; writers pick a destination format and persist encoded
//! pixels.

mod exr_reader;
mod exr_writer;
mod png_reader;
mod png_writer;
mod reader;
mod tiff_reader;
mod tiff_writer;
pub mod types;
mod writer;

pub use exr_reader::ExrReader;
pub use exr_writer::ExrWriter;
pub use png_reader::PngReader;
pub use png_writer::PngWriter;
pub use reader::{ImageReader, ScanlineImage, ScanlineSource};
pub use tiff_reader::TiffReader;
pub use tiff_writer::TiffWriter;
pub use types::{ContainerKind, ExrCompression, TiffCompression};
pub use writer::ImageWriter;

pub fn reader_for(kind: ContainerKind) -> Box<dyn ImageReader> {
    match kind {
        ContainerKind::Tiff => Box::new(TiffReader),
        ContainerKind::Exr => Box::new(ExrReader),
        ContainerKind::Png => Box::new(PngReader),
    }
}

pub fn writer_for(kind: ContainerKind) -> Box<dyn ImageWriter> {
    match kind {
        ContainerKind::Tiff => Box::new(TiffWriter),
        ContainerKind::Exr => Box::new(ExrWriter),
        ContainerKind::Png => Box::new(PngWriter),
    }
}
