//! Angled scanline fill: mask to an ordered stitch path.
//!
//! A family of parallel lines at `angle_deg` (0 = horizontal) is laid
//! over the foreground bounding box, `step_px` apart, centered on the
//! box. Each line is walked in unit increments through image space and
//! every foreground run it crosses becomes one segment of the path.
//! The mask itself is never rotated; lines are sampled directly in
//! pixel coordinates.
//!
//! Segments are appended line by line in a single path. When the next
//! segment starts more than `2 * step_px` from the current end of the
//! path, its start point is appended as a jump target; otherwise the
//! thread runs straight to the segment's far end.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::grayscale::round_half_up;
#[cfg(test)]
use crate::types::Bounds;
use crate::types::{Mask, StitchConfig, StitchPath, StitchPoint};

/// Scan lines extend this factor beyond the image diagonal.
const WALK_MARGIN: f64 = 1.2;

/// Consecutive points closer than this (in pixels) are merged.
pub const MIN_STITCH_PX: f64 = 1.0;

/// Counts gathered while tracing, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStats {
    /// Number of scan lines walked.
    pub line_count: usize,
    /// Number of foreground runs found across all lines.
    pub segment_count: usize,
    /// Number of segment starts farther than the jump distance.
    pub jump_count: usize,
    /// Points before decimation.
    pub raw_point_count: usize,
}

/// Trace a stitch path over `mask`.
///
/// `step_px` below [`StitchConfig::MIN_STEP_PX`] is raised to it. A
/// non-finite `angle_deg` is treated as horizontal. An empty mask gives
/// an empty path.
#[must_use = "returns the traced stitch path"]
pub fn trace_stitches(mask: &Mask, step_px: f64, angle_deg: f64) -> StitchPath {
    trace_with_stats(mask, step_px, angle_deg).0
}

/// Like [`trace_stitches`], also returning [`TraceStats`].
#[must_use = "returns the traced stitch path"]
#[allow(clippy::suboptimal_flops)]
pub fn trace_with_stats(mask: &Mask, step_px: f64, angle_deg: f64) -> (StitchPath, TraceStats) {
    let step = sanitize_step(step_px);
    let angle = if angle_deg.is_finite() {
        angle_deg
    } else {
        log::warn!("scan angle {angle_deg} is not finite, using 0");
        0.0
    };

    let mut stats = TraceStats::default();
    let Some(bounds) = mask.foreground_bounds() else {
        log::debug!("mask has no foreground, nothing to trace");
        return (StitchPath::default(), stats);
    };

    let rad = angle.to_radians();
    let (sin, cos) = rad.sin_cos();
    let (normal_y, normal_x) = (rad + FRAC_PI_2).sin_cos();
    let (center_x, center_y) = bounds.center();

    let span = normal_x.abs() * f64::from(bounds.max_x - bounds.min_x)
        + normal_y.abs() * f64::from(bounds.max_y - bounds.min_y);
    let line_count = line_count(span, step);

    let length = f64::from(mask.width()).hypot(f64::from(mask.height())) * WALK_MARGIN;
    let half_x = cos * length / 2.0;
    let half_y = sin * length / 2.0;
    // Diagonal of a u32 image, well inside u32 range.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let samples = length.ceil() as u32;

    let jump_distance = step * 2.0;
    let mut points: Vec<StitchPoint> = Vec::new();

    for index in 0..=line_count {
        let offset = f64::from(index) - f64::from(line_count) / 2.0;
        let origin_x = center_x + normal_x * offset * step;
        let origin_y = center_y + normal_y * offset * step;
        let start = (origin_x - half_x, origin_y - half_y);
        let end = (origin_x + half_x, origin_y + half_y);

        let markers = walk_line(mask, start, end, samples);
        for run in markers.chunks_exact(2) {
            stats.segment_count += 1;
            let a = bounds.clamp(run[0]);
            let b = bounds.clamp(run[1]);
            match points.last() {
                Some(last) if last.distance(a) > jump_distance => {
                    stats.jump_count += 1;
                    points.push(a);
                }
                Some(_) => {}
                None => points.push(a),
            }
            points.push(b);
        }
    }

    stats.line_count = line_count as usize + 1;
    stats.raw_point_count = points.len();

    let path = StitchPath::new(decimate(&points, MIN_STITCH_PX));
    log::debug!(
        "traced {} lines, {} segments, {} jumps, {} -> {} points",
        stats.line_count,
        stats.segment_count,
        stats.jump_count,
        stats.raw_point_count,
        path.len()
    );
    (path, stats)
}

/// Trace with the step and angle taken from `config`.
#[must_use = "returns the traced stitch path"]
pub fn trace_with_config(mask: &Mask, config: &StitchConfig) -> (StitchPath, TraceStats) {
    trace_with_stats(mask, config.step_px, config.angle_deg)
}

fn sanitize_step(step_px: f64) -> f64 {
    if step_px.is_finite() && step_px >= StitchConfig::MIN_STEP_PX {
        return step_px;
    }
    log::warn!(
        "scan step {step_px} is below {}, clamping",
        StitchConfig::MIN_STEP_PX
    );
    StitchConfig::MIN_STEP_PX
}

/// `max(1, floor(span / step))`; lines are placed at offsets
/// `-n/2, -n/2 + 1, ..., n/2` around the center.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn line_count(span: f64, step: f64) -> u32 {
    ((span / step).floor() as u32).max(1)
}

/// Walk from `start` to `end` in `samples` equal increments, returning
/// run boundaries.
///
/// A run starts at the first foreground sample after background and ends
/// at the first background sample after foreground. A run still open at
/// the end of the walk is closed at `end`.
#[allow(clippy::suboptimal_flops)]
fn walk_line(mask: &Mask, start: (f64, f64), end: (f64, f64), samples: u32) -> Vec<StitchPoint> {
    let mut markers = Vec::new();
    let mut inside = false;
    let total = f64::from(samples.max(1));

    for s in 0..=samples {
        let t = f64::from(s) / total;
        let p = round_point(
            start.0 + (end.0 - start.0) * t,
            start.1 + (end.1 - start.1) * t,
        );
        let on = mask.get(p.x, p.y);
        if on != inside {
            markers.push(p);
            inside = on;
        }
    }
    if inside {
        markers.push(round_point(end.0, end.1));
    }
    markers
}

#[allow(clippy::cast_possible_truncation)]
fn round_point(x: f64, y: f64) -> StitchPoint {
    StitchPoint::new(round_half_up(x) as i32, round_half_up(y) as i32)
}

/// Drop points closer than `min_step` to the last kept point.
#[must_use]
pub fn decimate(points: &[StitchPoint], min_step: f64) -> Vec<StitchPoint> {
    let mut out: Vec<StitchPoint> = Vec::with_capacity(points.len());
    for &p in points {
        match out.last() {
            Some(last) if last.distance(p) < min_step => {}
            _ => out.push(p),
        }
    }
    out
}

/// Returns `true` if every point lies within `bounds`.
#[cfg(test)]
pub(crate) fn within(path: &StitchPath, bounds: &Bounds) -> bool {
    path.points().iter().all(|p| bounds.clamp(*p) == *p)
}
