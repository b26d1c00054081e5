//! Image decoding and luminance conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the RGBA
//! pixel buffer the rest of the pipeline works from, plus the Rec. 709
//! luminance image used for thresholding.

use image::{GrayImage, Luma, RgbaImage};

use crate::types::PipelineError;

/// Rec. 709 luma weights for R, G and B.
const REC709: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// Decode raw image bytes into an RGBA pixel buffer.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}

/// Round to the nearest integer, ties toward positive infinity.
///
/// `f64::round` sends ties away from zero, which disagrees for negative
/// halves; every rounding in the stitch pipeline goes through here so
/// coordinates and deltas agree on one convention.
#[must_use]
pub fn round_half_up(value: f64) -> f64 {
    // `(value + 0.5).floor()` rounds 0.49999999999999994 up to 1.
    let whole = value.floor();
    if value - whole >= 0.5 { whole + 1.0 } else { whole }
}

/// Rec. 709 luminance of one pixel, rounded and clamped to `0..=255`.
///
/// Alpha is ignored.
#[must_use]
#[allow(
    clippy::suboptimal_flops,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    // Left to right, no fused multiply-add.
    let y = f64::from(r) * REC709[0] + f64::from(g) * REC709[1] + f64::from(b) * REC709[2];
    round_half_up(y).clamp(0.0, 255.0) as u8
}

/// Convert an RGBA buffer to a single-channel luminance image.
#[must_use = "returns the luminance image"]
pub fn luminance(pixels: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(pixels.width(), pixels.height(), |x, y| {
        let [r, g, b, _] = pixels.get_pixel(x, y).0;
        Luma([luma(r, g, b)])
    })
}
