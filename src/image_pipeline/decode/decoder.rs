use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result, Stage};
use crate::image_pipeline::container::ScanlineSource;
use crate::image_pipeline::decode::samples;
use crate::image_pipeline::raster::{PlanarLayout, RasterBuffer};

/// Decodes every scanline of `source` into an interleaved linear `f32` buffer.
///
/// Contiguous and planar sources produce the same buffer layout; planar
/// streams are decoded one channel at a time through a scratch row.
pub fn decode_raster<S: ScanlineSource + ?Sized>(source: &S) -> Result<RasterBuffer> {
    let (width, height) = source.dimensions();
    let format = source.sample_format();
    let channels = format.samples_per_pixel;

    if !matches!(channels, 1 | 3 | 4) {
        return Err(ConversionError::unsupported(
            Stage::Decode,
            format!("samples_per_pixel={channels} ({format})"),
        ));
    }
    let decoder = samples::lookup(format.kind, format.bits_per_sample)?;

    debug!(width, height, %format, "Decoding samples");

    let mut raster = RasterBuffer::new(width, height, channels)?;

    match format.layout {
        PlanarLayout::Contiguous => {
            for y in 0..height {
                let line = source.read_scanline(y, 0)?;
                decoder.decode_row(line, raster.row_mut(y), y, 0)?;
            }
        }
        PlanarLayout::Planar => {
            let mut scratch = vec![0.0f32; width];
            for c in 0..channels {
                for y in 0..height {
                    let line = source.read_scanline(y, c)?;
                    decoder.decode_row(line, &mut scratch, y, c)?;
                    let row = raster.row_mut(y);
                    for (x, &v) in scratch.iter().enumerate() {
                        row[c + channels * x] = v;
                    }
                }
            }
        }
    }

    Ok(raster)
}
