//! Tajima stitch record encoding.
//!
//! A Tajima record is three bytes carrying a relative move of at most
//! 121 units on each axis. Each axis is written in balanced ternary: one
//! "plus" and one "minus" bit for each of the weights 1, 3, 9, 27 and
//! 81, scattered over the three bytes as follows.
//!
//! ```text
//!          bit7  bit6  bit5  bit4  bit3  bit2  bit1  bit0
//! byte 0   y+1   y-1   y+9   y-9   x-9   x+9   x-1   x+1
//! byte 1   y+3   y-3   y+27  y-27  x-27  x+27  x-3   x+3
//! byte 2   jump  seq   y+81  y-81  x-81  x+81  set   set
//! ```
//!
//! The two low bits of byte 2 are always set. Tajima +y points up, the
//! opposite of image rows, so `dy` is negated on the way in.

use stitchwork_pipeline::StitchPath;
use stitchwork_pipeline::grayscale::round_half_up;

/// Largest move one record can carry on either axis.
pub const MAX_DELTA: i32 = 121;

/// Bits of byte 2 that are set in every record.
const CONTROL_BITS: u8 = 0x03;
/// Byte 2 flag marking a jump (needle up) record.
const JUMP_FLAG: u8 = 0x80;
/// Byte 2 of the end-of-design record.
const END_FLAGS: u8 = 0xF3;

/// One balanced-ternary digit: weight, byte, then the plus and minus
/// bits for x followed by those for y. Largest weight first.
const DIGITS: [(i32, usize, u8, u8, u8, u8); 5] = [
    (81, 2, 0x04, 0x08, 0x20, 0x10),
    (27, 1, 0x04, 0x08, 0x20, 0x10),
    (9, 0, 0x04, 0x08, 0x20, 0x10),
    (3, 1, 0x01, 0x02, 0x80, 0x40),
    (1, 0, 0x01, 0x02, 0x80, 0x40),
];

/// What a record tells the machine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Move with the needle down.
    Normal,
    /// Move with the needle up.
    Jump,
    /// End of design.
    End,
}

/// A packed 3-byte Tajima record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record(pub [u8; 3]);

/// The record that terminates every design.
pub const END_RECORD: Record = Record([0x00, 0x00, END_FLAGS]);

impl Record {
    /// Raw bytes as written to the file.
    #[must_use]
    pub const fn bytes(self) -> [u8; 3] {
        self.0
    }

    /// Decode the kind of move.
    #[must_use]
    pub const fn kind(self) -> RecordKind {
        let flags = self.0[2];
        if flags & END_FLAGS == END_FLAGS {
            RecordKind::End
        } else if flags & JUMP_FLAG != 0 {
            RecordKind::Jump
        } else {
            RecordKind::Normal
        }
    }

    /// Decode the move as `(dx, dy)` in image orientation (y down).
    #[must_use]
    pub fn deltas(self) -> (i32, i32) {
        let mut dx = 0;
        let mut up = 0;
        for (weight, byte, x_plus, x_minus, y_plus, y_minus) in DIGITS {
            let b = self.0[byte];
            dx += weight * (i32::from(b & x_plus != 0) - i32::from(b & x_minus != 0));
            up += weight * (i32::from(b & y_plus != 0) - i32::from(b & y_minus != 0));
        }
        (dx, -up)
    }
}

/// Break `delta` into parts of at most [`MAX_DELTA`] in magnitude.
///
/// Whole `±121` parts are peeled off while the remainder is too large,
/// then the remainder is appended, so the parts sum to `delta`. Zero
/// yields `[0]`.
#[must_use]
pub fn split_delta(delta: i32) -> Vec<i32> {
    let mut parts = Vec::new();
    let mut rest = delta;
    while rest.unsigned_abs() > MAX_DELTA.unsigned_abs() {
        let part = MAX_DELTA * rest.signum();
        parts.push(part);
        rest -= part;
    }
    parts.push(rest);
    parts
}

/// Pack one move into a record.
///
/// `dx` and `dy` are in image orientation and must each lie within
/// `-MAX_DELTA..=MAX_DELTA`; [`split_delta`] guarantees this. `kind`
/// [`RecordKind::End`] ignores the deltas and yields [`END_RECORD`].
#[must_use]
pub fn pack_record(dx: i32, dy: i32, kind: RecordKind) -> Record {
    debug_assert!(
        (-MAX_DELTA..=MAX_DELTA).contains(&dx) && (-MAX_DELTA..=MAX_DELTA).contains(&dy),
        "delta ({dx}, {dy}) out of record range"
    );

    let mut bytes = [0_u8, 0, CONTROL_BITS];
    match kind {
        RecordKind::End => return END_RECORD,
        RecordKind::Jump => bytes[2] |= JUMP_FLAG,
        RecordKind::Normal => {}
    }

    let mut x = dx;
    let mut y = -dy;
    for (weight, byte, x_plus, x_minus, y_plus, y_minus) in DIGITS {
        let half = weight / 2;
        if x > half {
            bytes[byte] |= x_plus;
            x -= weight;
        } else if x < -half {
            bytes[byte] |= x_minus;
            x += weight;
        }
        if y > half {
            bytes[byte] |= y_plus;
            y -= weight;
        } else if y < -half {
            bytes[byte] |= y_minus;
            y += weight;
        }
    }
    Record(bytes)
}

/// Scale pixel coordinates into machine units.
#[must_use]
pub fn to_units(path: &StitchPath, units_per_pixel: f64) -> Vec<(f64, f64)> {
    path.points()
        .iter()
        .map(|p| (f64::from(p.x) * units_per_pixel, f64::from(p.y) * units_per_pixel))
        .collect()
}

/// Encode successive moves between `points` (in machine units).
///
/// Each move is rounded to whole units, split with [`split_delta`], and
/// the shorter axis is padded with zeros so both axes have the same
/// number of parts. Every part becomes one [`RecordKind::Normal`]
/// record. The end record is not included.
#[must_use]
pub fn encode_deltas(points: &[(f64, f64)]) -> Vec<Record> {
    let mut records = Vec::with_capacity(points.len().saturating_sub(1));
    for pair in points.windows(2) {
        let dx = unit_delta(pair[1].0 - pair[0].0);
        let dy = unit_delta(pair[1].1 - pair[0].1);
        let xs = split_delta(dx);
        let ys = split_delta(dy);
        for i in 0..xs.len().max(ys.len()) {
            let px = xs.get(i).copied().unwrap_or(0);
            let py = ys.get(i).copied().unwrap_or(0);
            records.push(pack_record(px, py, RecordKind::Normal));
        }
    }
    records
}

/// Scale `path` into machine units and encode its moves.
#[must_use]
pub fn encode_path(path: &StitchPath, units_per_pixel: f64) -> Vec<Record> {
    encode_deltas(&to_units(path, units_per_pixel))
}

// A move between two points of a hoop-sized design is far inside i32.
#[allow(clippy::cast_possible_truncation)]
fn unit_delta(delta: f64) -> i32 {
    round_half_up(delta) as i32
}
