//! stitchwork-export: Pure format serializers (sans-IO)
//!
//! Converts stitch paths into output formats: Tajima DST for embroidery
//! machines and SVG for previews.

pub mod dst;
pub mod svg;
pub mod tajima;

pub use dst::{DstHeader, DstMetadata, to_dst};
pub use svg::{SvgMetadata, build_path_data, to_svg};
pub use tajima::{MAX_DELTA, Record, RecordKind, split_delta};
