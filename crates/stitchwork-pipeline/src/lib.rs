//! stitchwork-pipeline: Pure raster-to-stitch pipeline (sans-IO).
//!
//! Converts a raster image into a single ordered stitch path through:
//! decode -> luminance -> Otsu threshold (or painted mask) ->
//! angled scanline fill -> decimation.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and pixel buffers and returns structured data. Machine
//! formats live in `stitchwork-export`; files live in the CLI.

pub mod diagnostics;
pub mod grayscale;
pub mod hoop;
pub mod mask;
pub mod scanline;
pub mod session;
pub mod threshold;
pub mod types;

pub use hoop::Hoop;
pub use mask::MaskSource;
pub use scanline::{TraceStats, trace_stitches};
pub use session::{ConversionSession, convert, process};
pub use types::{
    Bounds, Dimensions, GrayImage, Mask, PipelineError, RgbaImage, StitchConfig, StitchPath,
    StitchPoint,
};
