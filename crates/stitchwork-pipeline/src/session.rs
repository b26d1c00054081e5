//! A single image-to-stitch conversion and everything it produced.

use image::RgbaImage;

use crate::grayscale;
use crate::mask::{self, MaskSource};
use crate::scanline::{self, TraceStats};
use crate::types::{Dimensions, Mask, PipelineError, StitchConfig, StitchPath};

/// Result of converting one image.
///
/// Holds the mask and path that were traced together with the scale
/// needed to serialize the path into machine units. Serializers take
/// what they need from here; nothing is kept in shared state between
/// conversions.
#[derive(Debug, Clone)]
pub struct ConversionSession {
    /// Source canvas size in pixels.
    pub dimensions: Dimensions,
    /// Foreground mask the path was traced over.
    pub mask: Mask,
    /// Whether `mask` was painted or thresholded.
    pub mask_source: MaskSource,
    /// Ordered stitch path in pixel coordinates.
    pub path: StitchPath,
    /// Machine units (0.1 mm) per source pixel for the configured hoop.
    pub units_per_pixel: f64,
    /// Counts gathered while tracing.
    pub stats: TraceStats,
}

impl ConversionSession {
    /// Otsu threshold used for the mask, or `None` for a painted mask.
    #[must_use]
    pub const fn threshold(&self) -> Option<u8> {
        self.mask_source.threshold()
    }
}

/// Convert decoded pixels into a stitch path.
///
/// `overlay` is an optional painted mask of the same size as `pixels`;
/// see [`mask::resolve_mask`].
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
/// Returns [`PipelineError::DimensionMismatch`] if `overlay` differs in
/// size from `pixels`.
pub fn convert(
    pixels: &RgbaImage,
    overlay: Option<&RgbaImage>,
    config: &StitchConfig,
) -> Result<ConversionSession, PipelineError> {
    config.validate()?;

    let dimensions = Dimensions {
        width: pixels.width(),
        height: pixels.height(),
    };
    let (mask, mask_source) = mask::resolve_mask(pixels, overlay)?;
    let (path, stats) = scanline::trace_with_config(&mask, config);
    let units_per_pixel = config.hoop.units_per_pixel(dimensions);

    log::debug!(
        "{}x{} image, {} hoop, {units_per_pixel:.4} units/px, {} stitch points",
        dimensions.width,
        dimensions.height,
        config.hoop,
        path.len()
    );

    Ok(ConversionSession {
        dimensions,
        mask,
        mask_source,
        path,
        units_per_pixel,
        stats,
    })
}

/// Decode `image_bytes` (PNG, JPEG, BMP, WebP) and convert it.
///
/// The mask is always derived by thresholding; use [`convert`] to supply
/// a painted overlay.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is unrecognized.
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
pub fn process(
    image_bytes: &[u8],
    config: &StitchConfig,
) -> Result<ConversionSession, PipelineError> {
    let pixels = grayscale::decode(image_bytes)?;
    convert(&pixels, None, config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::hoop::Hoop;

    /// Light ground with a checkered dark rectangle covering
    /// `x in 10..30, y in 10..20`.
    fn dark_block(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let inside = (10..30).contains(&x) && (10..20).contains(&y);
            let v = match (inside, (x + y) % 2 == 0) {
                (true, true) => 20,
                (true, false) => 60,
                (false, true) => 220,
                (false, false) => 230,
            };
            Rgba([v, v, v, 255])
        })
    }

    fn encode_png(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn process_empty_input() {
        let result = process(&[], &StitchConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn process_corrupt_input() {
        let result = process(&[0xFF, 0x00], &StitchConfig::default());
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn process_dark_block_produces_path_inside_block() {
        let png = encode_png(&dark_block(40, 30));
        let session = process(&png, &StitchConfig::default()).unwrap();

        assert_eq!(
            session.dimensions,
            Dimensions {
                width: 40,
                height: 30
            }
        );
        assert!(session.threshold().is_some());
        assert!(session.path.len() >= 2, "expected a non-trivial path");

        let bounds = session.mask.foreground_bounds().unwrap();
        assert!(bounds.min_x >= 10 && bounds.max_x < 30);
        assert!(bounds.min_y >= 10 && bounds.max_y < 20);
        assert!(scanline::within(&session.path, &bounds));
    }

    #[test]
    fn units_per_pixel_follow_hoop() {
        let pixels = dark_block(40, 30);
        let config = StitchConfig {
            hoop: Hoop::FiveBySeven,
            ..StitchConfig::default()
        };
        let session = convert(&pixels, None, &config).unwrap();
        // min(130 / 40, 180 / 30) mm/px = 3.25 mm/px.
        assert!((session.units_per_pixel - 32.5).abs() < 1e-9);
    }

    #[test]
    fn painted_overlay_replaces_threshold() {
        let pixels = dark_block(40, 30);
        let overlay = RgbaImage::from_fn(40, 30, |x, y| {
            if (0..8).contains(&x) && (0..8).contains(&y) {
                Rgba([255, 0, 0, 128])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });
        let session = convert(&pixels, Some(&overlay), &StitchConfig::default()).unwrap();
        assert_eq!(session.mask_source, MaskSource::Overlay);
        assert_eq!(session.threshold(), None);
        assert_eq!(session.mask.foreground_count(), 64);
        for p in session.path.points() {
            assert!((0..8).contains(&p.x) && (0..8).contains(&p.y), "{p:?}");
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_tracing() {
        let pixels = dark_block(40, 30);
        let config = StitchConfig {
            step_px: 0.5,
            ..StitchConfig::default()
        };
        let result = convert(&pixels, None, &config);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn blank_image_gives_empty_path() {
        let pixels = RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255]));
        let session = convert(&pixels, None, &StitchConfig::default()).unwrap();
        assert_eq!(session.mask.foreground_count(), 0);
        assert!(session.path.is_empty());
        assert_eq!(session.stats, TraceStats::default());
    }

    #[test]
    fn conversion_is_deterministic() {
        let pixels = dark_block(40, 30);
        let a = convert(&pixels, None, &StitchConfig::default()).unwrap();
        let b = convert(&pixels, None, &StitchConfig::default()).unwrap();
        assert_eq!(a.path, b.path);
        assert_eq!(a.mask, b.mask);
    }
}
