//! Mask selection: painted overlay or automatic threshold.
//!
//! A caller may supply an RGBA overlay the user painted over the image.
//! Any pixel with non-zero alpha counts as painted. When the overlay has
//! no painted pixels at all, the mask is derived from the image with
//! [`threshold::compute_mask`](crate::threshold::compute_mask).

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::threshold;
use crate::types::{Dimensions, Mask, PipelineError};

/// How the mask for a conversion was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskSource {
    /// Taken from a painted overlay.
    Overlay,
    /// Derived from luminance with the given Otsu threshold.
    Threshold(u8),
}

impl MaskSource {
    /// The Otsu threshold, if the mask was computed rather than painted.
    #[must_use]
    pub const fn threshold(self) -> Option<u8> {
        match self {
            Self::Overlay => None,
            Self::Threshold(level) => Some(level),
        }
    }
}

/// Returns `true` if any pixel of `overlay` has non-zero alpha.
#[must_use]
pub fn has_coverage(overlay: &RgbaImage) -> bool {
    overlay.pixels().any(|p| p.0[3] > 0)
}

impl Mask {
    /// Build a mask from the alpha channel of an overlay.
    #[must_use]
    pub fn from_alpha(overlay: &RgbaImage) -> Self {
        Self::from_fn(overlay.width(), overlay.height(), |x, y| {
            overlay.get_pixel(x, y).0[3] > 0
        })
    }
}

/// Choose the mask for `pixels`.
///
/// A painted `overlay` wins; otherwise the mask is computed from the
/// image's luminance.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionMismatch`] if `overlay` is present
/// and its size differs from `pixels`.
pub fn resolve_mask(
    pixels: &RgbaImage,
    overlay: Option<&RgbaImage>,
) -> Result<(Mask, MaskSource), PipelineError> {
    if let Some(overlay) = overlay {
        if overlay.dimensions() != pixels.dimensions() {
            return Err(PipelineError::DimensionMismatch {
                image: dimensions_of(pixels),
                overlay: dimensions_of(overlay),
            });
        }
        if has_coverage(overlay) {
            log::debug!("using painted mask overlay");
            return Ok((Mask::from_alpha(overlay), MaskSource::Overlay));
        }
        log::debug!("mask overlay is blank, falling back to threshold");
    }

    let (mask, level) = threshold::compute_mask(pixels);
    Ok((mask, MaskSource::Threshold(level)))
}

fn dimensions_of(image: &RgbaImage) -> Dimensions {
    Dimensions {
        width: image.width(),
        height: image.height(),
    }
}
