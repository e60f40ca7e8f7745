//! Typed sample readers.
//!
//! Scanline bytes are little-endian. Each reader checks the byte length
//! against the output slice before touching either buffer.

use half::f16;

use crate::image_pipeline::common::error::{ConversionError, Result, Stage};
use crate::image_pipeline::raster::SampleKind;

type DecodeFn = fn(&[u8], &mut [f32]);

/// Decoder for one `(kind, bits_per_sample)` combination.
#[derive(Debug, Clone, Copy)]
pub struct SampleDecoder {
    pub kind: SampleKind,
    pub bits_per_sample: u16,
    decode: DecodeFn,
}

const SAMPLE_DECODERS: [SampleDecoder; 8] = [
    SampleDecoder { kind: SampleKind::Unsigned, bits_per_sample: 8, decode: decode_u8 },
    SampleDecoder { kind: SampleKind::Unsigned, bits_per_sample: 16, decode: decode_u16 },
    SampleDecoder { kind: SampleKind::Unsigned, bits_per_sample: 32, decode: decode_u32 },
    SampleDecoder { kind: SampleKind::Signed, bits_per_sample: 8, decode: decode_i8 },
    SampleDecoder { kind: SampleKind::Signed, bits_per_sample: 16, decode: decode_i16 },
    SampleDecoder { kind: SampleKind::Signed, bits_per_sample: 32, decode: decode_i32 },
    SampleDecoder { kind: SampleKind::Float, bits_per_sample: 16, decode: decode_f16 },
    SampleDecoder { kind: SampleKind::Float, bits_per_sample: 32, decode: decode_f32 },
];

/// Every `(kind, bits_per_sample)` pair the decoder accepts.
pub fn supported_formats() -> impl Iterator<Item = (SampleKind, u16)> {
    SAMPLE_DECODERS.iter().map(|d| (d.kind, d.bits_per_sample))
}

pub fn lookup(kind: SampleKind, bits_per_sample: u16) -> Result<&'static SampleDecoder> {
    SAMPLE_DECODERS
        .iter()
        .find(|d| d.kind == kind && d.bits_per_sample == bits_per_sample)
        .ok_or_else(|| {
            ConversionError::unsupported(
                Stage::Decode,
                format!("kind={kind}, bits_per_sample={bits_per_sample}"),
            )
        })
}

impl SampleDecoder {
    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    /// Decodes `out.len()` samples from `bytes`. `row` and `plane` only label
    /// the error when the lengths disagree.
    pub fn decode_row(
        &self,
        bytes: &[u8],
        out: &mut [f32],
        row: usize,
        plane: usize,
    ) -> Result<()> {
        let expected = out.len() * self.bytes_per_sample();
        if bytes.len() != expected {
            return Err(ConversionError::MalformedScanline {
                row,
                plane,
                expected,
                actual: bytes.len(),
            });
        }
        (self.decode)(bytes, out);
        Ok(())
    }
}

/// Replaces NaN with 0 and infinities with the largest finite value.
pub fn sanitize(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else if v.is_infinite() {
        f32::MAX.copysign(v)
    } else {
        v
    }
}

fn decode_u8(bytes: &[u8], out: &mut [f32]) {
    for (o, &b) in out.iter_mut().zip(bytes) {
        *o = b as f32 / u8::MAX as f32;
    }
}

fn decode_u16(bytes: &[u8], out: &mut [f32]) {
    for (o, b) in out.iter_mut().zip(bytes.chunks_exact(2)) {
        *o = u16::from_le_bytes([b[0], b[1]]) as f32 / u16::MAX as f32;
    }
}

fn decode_u32(bytes: &[u8], out: &mut [f32]) {
    for (o, b) in out.iter_mut().zip(bytes.chunks_exact(4)) {
        let v = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        *o = (v as f64 / u32::MAX as f64) as f32;
    }
}

// Signed samples divide by their own positive maximum; MIN would land just
// below -1 and is pinned there.
fn decode_i8(bytes: &[u8], out: &mut [f32]) {
    for (o, &b) in out.iter_mut().zip(bytes) {
        *o = (i8::from_le_bytes([b]) as f32 / i8::MAX as f32).max(-1.0);
    }
}

fn decode_i16(bytes: &[u8], out: &mut [f32]) {
    for (o, b) in out.iter_mut().zip(bytes.chunks_exact(2)) {
        *o = (i16::from_le_bytes([b[0], b[1]]) as f32 / i16::MAX as f32).max(-1.0);
    }
}

fn decode_i32(bytes: &[u8], out: &mut [f32]) {
    for (o, b) in out.iter_mut().zip(bytes.chunks_exact(4)) {
        let v = i32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        *o = (v as f64 / i32::MAX as f64).max(-1.0) as f32;
    }
}

fn decode_f16(bytes: &[u8], out: &mut [f32]) {
    for (o, b) in out.iter_mut().zip(bytes.chunks_exact(2)) {
        *o = sanitize(f16::from_le_bytes([b[0], b[1]]).to_f32());
    }
}

fn decode_f32(bytes: &[u8], out: &mut [f32]) {
    for (o, b) in out.iter_mut().zip(bytes.chunks_exact(4)) {
        *o = sanitize(f32::from_le_bytes([b[0], b[1], b[2], b[3]]));
    }
}
