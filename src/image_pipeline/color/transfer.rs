//! Transfer functions.
//!
//! sRGB follows IEC 61966-2-1; gamma is a pure power curve.

/// Encoding of the values stored in a container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transfer {
    Linear,
    Srgb,
    Gamma(f32),
}

/// Linear light to sRGB. Input is clipped to [0, 1].
#[inline]
pub fn srgb_encode(v: f32) -> f32 {
    let v = v.clamp(0.0, 1.0);
    if v <= 0.0031308 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// sRGB to linear light. Not clamped: values above 1 stay above 1.
#[inline]
pub fn srgb_decode(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// `v^(1/gamma)`. Negative input encodes to 0.
#[inline]
pub fn gamma_encode(v: f32, gamma: f32) -> f32 {
    if v <= 0.0 { 0.0 } else { v.powf(1.0 / gamma) }
}

/// `v^gamma`, the inverse of [`gamma_encode`].
#[inline]
pub fn gamma_decode(v: f32, gamma: f32) -> f32 {
    if v <= 0.0 { 0.0 } else { v.powf(gamma) }
}

/// Multiplies by `2^stops`.
#[inline]
pub fn exposure(v: f32, stops: f32) -> f32 {
    v * stops.exp2()
}
