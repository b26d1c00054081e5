//! Tajima DST export serializer.
//!
//! A DST file is a 512-byte text header followed by 3-byte stitch
//! records (see [`tajima`](crate::tajima)) and one end record.
//!
//! The header is a run of `NAME:value` fields, each space-padded (or
//! truncated) to a 26-byte column, the whole block padded with spaces
//! to 509 bytes and closed by `1A 00 00`. The `+X`/`-X` and `+Y`/`-Y`
//! fields both carry the unsigned extent of the design on that axis,
//! which permissive readers accept.
//!
//! This is a pure function with no I/O -- it returns a `Vec<u8>`.

use std::fmt;

use stitchwork_pipeline::StitchPath;
use stitchwork_pipeline::grayscale::round_half_up;

use crate::tajima::{self, END_RECORD};

/// Total header size in bytes.
pub const HEADER_LEN: usize = 512;

/// Width of one header field column.
const FIELD_WIDTH: usize = 26;

/// Header bytes before the terminator.
const HEADER_TEXT_LEN: usize = HEADER_LEN - HEADER_TERMINATOR.len();

/// Closes the header text block.
const HEADER_TERMINATOR: [u8; 3] = [0x1A, 0x00, 0x00];

/// Label used when none is given.
pub const DEFAULT_LABEL: &str = "DESIGN";

/// Metadata to embed in the DST header.
#[derive(Debug, Clone, Default)]
pub struct DstMetadata<'a> {
    /// Design name, emitted as the `LA:` field.
    ///
    /// Typically the source image filename without extension. Defaults to
    /// [`DEFAULT_LABEL`]. Characters outside printable ASCII are replaced
    /// with `_`; anything past the field width is cut off.
    pub label: Option<&'a str>,
}

/// Values written into a DST header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DstHeader {
    /// Design name.
    pub label: String,
    /// Number of stitch records, excluding the end record.
    pub stitch_count: usize,
    /// Horizontal extent in machine units.
    pub extent_x: i32,
    /// Vertical extent in machine units.
    pub extent_y: i32,
    /// Negated minimum x of the scaled design.
    pub offset_x: i32,
    /// Negated minimum y of the scaled design.
    pub offset_y: i32,
}

impl DstHeader {
    /// Header for a design with no stitches.
    #[must_use]
    pub fn empty(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            stitch_count: 0,
            extent_x: 0,
            extent_y: 0,
            offset_x: 0,
            offset_y: 0,
        }
    }

    /// Header fields in file order, unpadded.
    fn fields(&self) -> [String; 12] {
        [
            format!("LA:{}", self.label),
            format!("ST:{:>7}", self.stitch_count),
            "CO:1".to_owned(),
            format!("+X:{:>5}", self.extent_x),
            format!("-X:{:>5}", self.extent_x),
            format!("+Y:{:>5}", self.extent_y),
            format!("-Y:{:>5}", self.extent_y),
            format!("AX:+{:>5}", self.offset_x),
            format!("AY:+{:>5}", self.offset_y),
            "MX:+00000".to_owned(),
            "MY:+00000".to_owned(),
            "PD:**********".to_owned(),
        ]
    }

    /// Render the fixed 512-byte header block.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [b' '; HEADER_LEN];
        let mut pos = 0;
        for field in self.fields() {
            let bytes = field.as_bytes();
            let n = bytes.len().min(FIELD_WIDTH);
            out[pos..pos + n].copy_from_slice(&bytes[..n]);
            pos += FIELD_WIDTH;
        }
        out[HEADER_TEXT_LEN..].copy_from_slice(&HEADER_TERMINATOR);
        out
    }
}

impl fmt::Display for DstHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} stitches, {}x{} units",
            self.stitch_count, self.extent_x, self.extent_y
        )
    }
}

/// Serialize a stitch path into DST bytes.
///
/// Points are scaled by `units_per_pixel` (0.1 mm per unit) and shifted
/// so the center of their bounding box is the origin, then encoded as
/// move records. Paths with fewer than two points produce a zero-stitch
/// header followed by the end record.
///
/// # Examples
///
/// ```
/// use stitchwork_pipeline::{StitchPath, StitchPoint};
/// use stitchwork_export::{DstMetadata, to_dst};
///
/// let path = StitchPath::new(vec![StitchPoint::new(0, 0), StitchPoint::new(5, 3)]);
/// let dst = to_dst(&path, 1.0, &DstMetadata::default());
/// assert_eq!(dst.len(), 512 + 3 + 3);
/// assert!(dst.starts_with(b"LA:DESIGN"));
/// assert_eq!(&dst[dst.len() - 3..], &[0x00, 0x00, 0xF3]);
/// ```
#[must_use]
pub fn to_dst(path: &StitchPath, units_per_pixel: f64, metadata: &DstMetadata<'_>) -> Vec<u8> {
    let label = sanitize_label(metadata.label.unwrap_or(DEFAULT_LABEL));

    let units = tajima::to_units(path, units_per_pixel);
    let (header, records) = if units.len() < 2 {
        (DstHeader::empty(&label), Vec::new())
    } else {
        let (min_x, min_y, max_x, max_y) = extents(&units);
        let center_x = (min_x + max_x) / 2.0;
        let center_y = (min_y + max_y) / 2.0;
        let centered: Vec<(f64, f64)> = units
            .iter()
            .map(|&(x, y)| (x - center_x, y - center_y))
            .collect();
        let records = tajima::encode_deltas(&centered);
        let header = DstHeader {
            label,
            stitch_count: records.len(),
            extent_x: to_int(max_x - min_x),
            extent_y: to_int(max_y - min_y),
            offset_x: -to_int(min_x),
            offset_y: -to_int(min_y),
        };
        (header, records)
    };

    log::debug!("dst: {header}");

    let mut out = Vec::with_capacity(HEADER_LEN + 3 * (records.len() + 1));
    out.extend_from_slice(&header.to_bytes());
    for record in records.iter().chain(std::iter::once(&END_RECORD)) {
        out.extend_from_slice(&record.bytes());
    }
    out
}

/// `(min_x, min_y, max_x, max_y)` of a non-empty point set.
fn extents(points: &[(f64, f64)]) -> (f64, f64, f64, f64) {
    points.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(min_x, min_y, max_x, max_y), &(x, y)| {
            (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
        },
    )
}

// Hoop-sized designs are a few thousand units across.
#[allow(clippy::cast_possible_truncation)]
fn to_int(value: f64) -> i32 {
    round_half_up(value) as i32
}

/// Keep printable ASCII, replace everything else with `_`.
fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stitchwork_pipeline::StitchPoint;

    use super::*;
    use crate::tajima::{Record, RecordKind};

    fn path(coords: &[(i32, i32)]) -> StitchPath {
        StitchPath::new(
            coords
                .iter()
                .map(|&(x, y)| StitchPoint::new(x, y))
                .collect(),
        )
    }

    fn header_text(dst: &[u8]) -> String {
        String::from_utf8_lossy(&dst[..HEADER_TEXT_LEN]).into_owned()
    }

    fn field(dst: &[u8], index: usize) -> String {
        header_text(dst)[index * FIELD_WIDTH..(index + 1) * FIELD_WIDTH]
            .trim_end()
            .to_owned()
    }

    fn records(dst: &[u8]) -> Vec<Record> {
        dst[HEADER_LEN..]
            .chunks_exact(3)
            .map(|c| Record([c[0], c[1], c[2]]))
            .collect()
    }

    #[test]
    fn empty_path_is_header_and_end_record() {
        let dst = to_dst(&StitchPath::default(), 5.0, &DstMetadata::default());
        assert_eq!(dst.len(), HEADER_LEN + 3);
        assert_eq!(field(&dst, 1), "ST:      0");
        assert_eq!(field(&dst, 3), "+X:    0");
        assert_eq!(&dst[HEADER_LEN..], &[0x00, 0x00, 0xF3]);
    }

    #[test]
    fn single_point_is_degenerate() {
        let dst = to_dst(&path(&[(7, 7)]), 5.0, &DstMetadata::default());
        assert_eq!(dst.len(), HEADER_LEN + 3);
        assert_eq!(field(&dst, 1), "ST:      0");
    }

    #[test]
    fn header_layout() {
        let dst = to_dst(&StitchPath::default(), 1.0, &DstMetadata::default());
        let expected = [
            "LA:DESIGN",
            "ST:      0",
            "CO:1",
            "+X:    0",
            "-X:    0",
            "+Y:    0",
            "-Y:    0",
            "AX:+    0",
            "AY:+    0",
            "MX:+00000",
            "MY:+00000",
            "PD:**********",
        ];
        for (i, want) in expected.iter().enumerate() {
            assert_eq!(field(&dst, i), *want, "field {i}");
        }
        assert!(dst[12 * FIELD_WIDTH..HEADER_TEXT_LEN].iter().all(|&b| b == b' '));
        assert_eq!(&dst[509..512], &[0x1A, 0x00, 0x00]);
    }

    #[test]
    fn length_matches_record_count() {
        let p = path(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        let dst = to_dst(&p, 2.0, &DstMetadata::default());
        assert_eq!(dst.len(), HEADER_LEN + 3 * (3 + 1));
        assert_eq!(field(&dst, 1), "ST:      3");
    }

    #[test]
    fn extents_and_offsets() {
        // Scaled by 3: x spans 6..36, y spans 3..15.
        let p = path(&[(2, 1), (12, 5), (4, 3)]);
        let dst = to_dst(&p, 3.0, &DstMetadata::default());
        assert_eq!(field(&dst, 3), "+X:   30");
        assert_eq!(field(&dst, 4), "-X:   30");
        assert_eq!(field(&dst, 5), "+Y:   12");
        assert_eq!(field(&dst, 6), "-Y:   12");
        assert_eq!(field(&dst, 7), "AX:+   -6");
        assert_eq!(field(&dst, 8), "AY:+   -3");
    }

    #[test]
    fn moves_sum_to_path_displacement() {
        let p = path(&[(0, 0), (10, 4), (3, 9)]);
        let dst = to_dst(&p, 4.0, &DstMetadata::default());
        let recs = records(&dst);
        let (end, stitches) = recs.split_last().unwrap();
        assert_eq!(end.kind(), RecordKind::End);
        let (dx, dy) = stitches
            .iter()
            .map(|r| r.deltas())
            .fold((0, 0), |(ax, ay), (x, y)| (ax + x, ay + y));
        assert_eq!((dx, dy), (12, 36));
    }

    #[test]
    fn long_move_is_split_with_zero_padding() {
        // 50 px at 5 units/px is 250 units across, 0 down.
        let p = path(&[(0, 0), (50, 0)]);
        let dst = to_dst(&p, 5.0, &DstMetadata::default());
        let moves: Vec<_> = records(&dst)
            .iter()
            .filter(|r| r.kind() == RecordKind::Normal)
            .map(|r| r.deltas())
            .collect();
        assert_eq!(moves, vec![(121, 0), (121, 0), (8, 0)]);
        assert_eq!(field(&dst, 1), "ST:      3");
    }

    #[test]
    fn custom_label_is_sanitized_and_truncated() {
        let meta = DstMetadata {
            label: Some("rosé\tpetal"),
        };
        let dst = to_dst(&StitchPath::default(), 1.0, &meta);
        assert_eq!(field(&dst, 0), "LA:ros__petal");

        let long = "x".repeat(40);
        let meta = DstMetadata {
            label: Some(&long),
        };
        let dst = to_dst(&StitchPath::default(), 1.0, &meta);
        assert_eq!(field(&dst, 0).len(), FIELD_WIDTH);
        assert_eq!(&dst[FIELD_WIDTH..FIELD_WIDTH + 3], b"ST:");
    }
}
