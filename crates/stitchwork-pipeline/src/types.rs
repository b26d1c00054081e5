//! Shared types for the stitchwork raster-to-stitch pipeline.

use serde::{Deserialize, Serialize};

use crate::hoop::Hoop;

/// Re-export `RgbaImage` so downstream crates can hand pixel buffers to
/// the pipeline without depending on `image` directly.
pub use image::RgbaImage;

/// Re-export `GrayImage` for the luminance intermediate.
pub use image::GrayImage;

/// A stitch position in integer pixel coordinates (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StitchPoint {
    /// Horizontal position (pixels from left edge).
    pub x: i32,
    /// Vertical position (pixels from top edge).
    pub y: i32,
}

impl StitchPoint {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

/// Inclusive integer bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    /// Smallest x covered.
    pub min_x: i32,
    /// Smallest y covered.
    pub min_y: i32,
    /// Largest x covered.
    pub max_x: i32,
    /// Largest y covered.
    pub max_y: i32,
}

impl Bounds {
    /// A box covering exactly one point.
    #[must_use]
    pub const fn point(p: StitchPoint) -> Self {
        Self {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        }
    }

    /// Grow the box to cover `p`.
    pub fn include(&mut self, p: StitchPoint) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Clamp a point into the box.
    #[must_use]
    pub fn clamp(&self, p: StitchPoint) -> StitchPoint {
        StitchPoint::new(
            p.x.clamp(self.min_x, self.max_x),
            p.y.clamp(self.min_y, self.max_y),
        )
    }

    /// Center of the box in continuous coordinates.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            (f64::from(self.min_x) + f64::from(self.max_x)) / 2.0,
            (f64::from(self.min_y) + f64::from(self.max_y)) / 2.0,
        )
    }
}

/// An ordered sequence of stitch points.
///
/// Adjacent points are joined either by a short travel segment or by a
/// long jump; the two are told apart only by their distance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StitchPath(Vec<StitchPoint>);

impl StitchPath {
    /// Create a new path from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<StitchPoint>) -> Self {
        Self(points)
    }

    /// Returns `true` if the path has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the path.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&StitchPoint> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&StitchPoint> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[StitchPoint] {
        &self.0
    }

    /// Consumes the path and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<StitchPoint> {
        self.0
    }

    /// Bounding box of all points, or `None` for an empty path.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        let (first, rest) = self.0.split_first()?;
        let mut bounds = Bounds::point(*first);
        for p in rest {
            bounds.include(*p);
        }
        Some(bounds)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Binary foreground mask, one entry per pixel, row-major.
///
/// `true` marks pixels that should be filled with stitches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Mask {
    /// Build a mask by evaluating `f` at every pixel.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Mask width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Mask dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Foreground test at signed coordinates; anything outside the grid
    /// is background.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> bool {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return false;
        };
        if x >= self.width || y >= self.height {
            return false;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Number of foreground pixels.
    #[must_use]
    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&on| on).count()
    }

    /// Tight bounding box of all foreground pixels.
    #[must_use]
    pub fn foreground_bounds(&self) -> Option<Bounds> {
        let width = self.width as usize;
        let mut bounds: Option<Bounds> = None;
        for (i, _) in self.data.iter().enumerate().filter(|(_, on)| **on) {
            // Indices fit in i32 for any image the decoder accepts.
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let p = StitchPoint::new((i % width) as i32, (i / width) as i32);
            match bounds.as_mut() {
                Some(b) => b.include(p),
                None => bounds = Some(Bounds::point(p)),
            }
        }
        bounds
    }
}

/// Parameters for a single conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    /// Spacing between scan lines in pixels.
    pub step_px: f64,

    /// Scan direction in degrees (0 = horizontal).
    pub angle_deg: f64,

    /// Physical hoop the design is scaled into.
    pub hoop: Hoop,
}

impl StitchConfig {
    /// Default scan spacing in pixels.
    pub const DEFAULT_STEP_PX: f64 = 4.0;
    /// Default scan angle in degrees.
    pub const DEFAULT_ANGLE_DEG: f64 = 45.0;
    /// Smallest scan spacing the stitcher accepts.
    pub const MIN_STEP_PX: f64 = 1.0;

    /// Check that the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `step_px` is not a
    /// finite value of at least [`Self::MIN_STEP_PX`] or `angle_deg` is
    /// not finite.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.step_px.is_finite() || self.step_px < Self::MIN_STEP_PX {
            return Err(PipelineError::InvalidConfig(format!(
                "step_px must be at least {}, got {}",
                Self::MIN_STEP_PX,
                self.step_px
            )));
        }
        if !self.angle_deg.is_finite() {
            return Err(PipelineError::InvalidConfig(format!(
                "angle_deg must be finite, got {}",
                self.angle_deg
            )));
        }
        Ok(())
    }
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            step_px: Self::DEFAULT_STEP_PX,
            angle_deg: Self::DEFAULT_ANGLE_DEG,
            hoop: Hoop::default(),
        }
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// A mask overlay does not match the image it masks.
    #[error("mask overlay is {overlay:?} but the image is {image:?}")]
    DimensionMismatch {
        /// Dimensions of the source image.
        image: Dimensions,
        /// Dimensions of the supplied overlay.
        overlay: Dimensions,
    },

    /// Conversion configuration is invalid.
    #[error("invalid stitch configuration: {0}")]
    InvalidConfig(String),
}
