//! Automatic foreground extraction via Otsu thresholding.
//!
//! The luminance histogram is split at the level that maximizes the
//! between-class variance. Pixels darker than that level become
//! foreground: artwork is assumed to be dark ink on a light ground.

use image::{GrayImage, RgbaImage};

use crate::grayscale;
use crate::types::Mask;

/// Threshold used when no split improves on zero variance
/// (uniform or empty images).
pub const DEFAULT_THRESHOLD: u8 = 127;

/// Select a threshold with Otsu's method over the 256-bin histogram.
///
/// Levels with an empty background class are skipped, and the scan
/// stops once the foreground class is empty. Only a strictly larger
/// variance replaces the current best, so ties keep the lowest level.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let histogram = imageproc::stats::histogram(gray);
    let bins = &histogram.channels[0];

    let total = u64::from(gray.width()) * u64::from(gray.height());
    let sum: f64 = bins
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * f64::from(count))
        .sum();

    let mut sum_background = 0.0;
    let mut weight_background: u64 = 0;
    let mut best_variance = 0.0;
    let mut threshold = DEFAULT_THRESHOLD;

    for (level, &count) in (0_u8..=255).zip(bins.iter()) {
        weight_background += u64::from(count);
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total - weight_background;
        if weight_foreground == 0 {
            break;
        }
        sum_background += f64::from(level) * f64::from(count);

        let wb = weight_background as f64;
        let wf = weight_foreground as f64;
        let diff = sum_background / wb - (sum - sum_background) / wf;
        let between = wb * wf * diff * diff;
        if between > best_variance {
            best_variance = between;
            threshold = level;
        }
    }

    threshold
}

/// Foreground mask from a luminance image and a threshold: a pixel is
/// foreground when its luminance is strictly below `threshold`.
#[must_use]
pub fn mask_below(gray: &GrayImage, threshold: u8) -> Mask {
    Mask::from_fn(gray.width(), gray.height(), |x, y| {
        gray.get_pixel(x, y).0[0] < threshold
    })
}

/// Derive a foreground mask from an RGBA buffer.
///
/// Returns the mask together with the threshold that produced it.
#[must_use = "returns the computed mask"]
pub fn compute_mask(pixels: &RgbaImage) -> (Mask, u8) {
    let gray = grayscale::luminance(pixels);
    let threshold = otsu_threshold(&gray);
    log::debug!(
        "otsu threshold {threshold} for {}x{} image",
        gray.width(),
        gray.height()
    );
    (mask_below(&gray, threshold), threshold)
}
