//! Embroidery hoop sizes and the pixel-to-machine-unit scale they imply.
//!
//! DST coordinates are expressed in 0.1 mm units. The design is scaled
//! uniformly so the whole canvas fits inside the selected hoop.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::Dimensions;

/// Machine units per millimetre (one DST unit is 0.1 mm).
pub const UNITS_PER_MM: f64 = 10.0;

/// A physical embroidery hoop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hoop {
    /// 4x4 inch hoop, 100 x 100 mm stitch field.
    #[default]
    #[serde(rename = "4x4")]
    FourByFour,
    /// 5x7 inch hoop, 130 x 180 mm stitch field.
    #[serde(rename = "5x7")]
    FiveBySeven,
    /// 6x10 inch hoop, 160 x 260 mm stitch field.
    #[serde(rename = "6x10")]
    SixByTen,
}

impl Hoop {
    /// Every supported hoop, smallest first.
    pub const ALL: [Self; 3] = [Self::FourByFour, Self::FiveBySeven, Self::SixByTen];

    /// Usable stitch field as `(width_mm, height_mm)`.
    #[must_use]
    pub const fn size_mm(self) -> (f64, f64) {
        match self {
            Self::FourByFour => (100.0, 100.0),
            Self::FiveBySeven => (130.0, 180.0),
            Self::SixByTen => (160.0, 260.0),
        }
    }

    /// Selector string as shown to users (`"4x4"`, `"5x7"`, `"6x10"`).
    #[must_use]
    pub const fn selector(self) -> &'static str {
        match self {
            Self::FourByFour => "4x4",
            Self::FiveBySeven => "5x7",
            Self::SixByTen => "6x10",
        }
    }

    /// Lenient lookup: unknown selectors fall back to the 4x4 hoop.
    #[must_use]
    pub fn from_selector(selector: &str) -> Self {
        selector.parse().unwrap_or_default()
    }

    /// Machine units per source pixel for a canvas of `dimensions`.
    ///
    /// The smaller of the two axis ratios wins so the canvas fits the
    /// hoop in both directions.
    #[must_use]
    pub fn units_per_pixel(self, dimensions: Dimensions) -> f64 {
        let (width_mm, height_mm) = self.size_mm();
        let per_px_x = width_mm / f64::from(dimensions.width.max(1));
        let per_px_y = height_mm / f64::from(dimensions.height.max(1));
        UNITS_PER_MM * per_px_x.min(per_px_y)
    }
}

impl fmt::Display for Hoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

/// Error returned when parsing an unknown hoop selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hoop {0:?}, expected one of 4x4, 5x7, 6x10")]
pub struct UnknownHoop(pub String);

impl FromStr for Hoop {
    type Err = UnknownHoop;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|hoop| hoop.selector() == s.trim())
            .ok_or_else(|| UnknownHoop(s.to_owned()))
    }
}
