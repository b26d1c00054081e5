//! Per-stage timing and counts for a conversion.
//!
//! [`process_with_diagnostics`] runs the same stages as
//! [`process`](crate::process) and records how long each took and what
//! it produced. Time is read through the [`Clock`] trait so this crate
//! stays free of platform timers; callers supply one backed by
//! `std::time::Instant` or whatever their platform offers.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::grayscale;
use crate::mask::{self, MaskSource};
use crate::scanline;
use crate::session::ConversionSession;
use crate::types::{Dimensions, PipelineError, StitchConfig};

/// Source of timestamps for diagnostics.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// Current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Image decoding.
    pub decode: StageDiagnostics,
    /// Mask selection: painted overlay or Otsu threshold.
    pub mask: StageDiagnostics,
    /// Scanline tracing and decimation.
    pub trace: StageDiagnostics,
    /// Total wall-clock duration of the conversion (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
    },
    /// Mask selection metrics.
    Mask {
        /// Where the mask came from.
        source: MaskSource,
        /// Foreground pixels in the mask.
        foreground_pixel_count: usize,
        /// Total pixel count, for computing coverage.
        total_pixel_count: u64,
    },
    /// Tracing metrics.
    Trace {
        /// Scan line spacing in pixels.
        step_px: f64,
        /// Scan angle in degrees.
        angle_deg: f64,
        /// Scan lines walked.
        line_count: usize,
        /// Foreground runs crossed.
        segment_count: usize,
        /// Segment starts emitted as jumps.
        jump_count: usize,
        /// Points before decimation.
        points_before: usize,
        /// Points after decimation.
        points_after: usize,
    },
}

/// High-level summary for the whole conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Hoop selector the design was scaled for.
    pub hoop: String,
    /// Machine units per source pixel.
    pub units_per_pixel: f64,
    /// Points in the final stitch path.
    pub final_point_count: usize,
}

/// Decode, mask and trace, timing each stage with `clock`.
///
/// Produces the same [`ConversionSession`] as
/// [`convert`](crate::convert) on the decoded pixels.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is unrecognized.
/// Returns [`PipelineError::DimensionMismatch`] if `overlay` differs in
/// size from the decoded image.
pub fn process_with_diagnostics<C: Clock>(
    image_bytes: &[u8],
    overlay: Option<&RgbaImage>,
    config: &StitchConfig,
    clock: &C,
) -> Result<(ConversionSession, PipelineDiagnostics), PipelineError> {
    config.validate()?;
    let total_start = clock.now();

    let start = clock.now();
    let pixels = grayscale::decode(image_bytes)?;
    let dimensions = Dimensions {
        width: pixels.width(),
        height: pixels.height(),
    };
    let decode = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Decode {
            input_bytes: image_bytes.len(),
            width: dimensions.width,
            height: dimensions.height,
        },
    };

    let start = clock.now();
    let (mask, mask_source) = mask::resolve_mask(&pixels, overlay)?;
    let mask_stage = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Mask {
            source: mask_source,
            foreground_pixel_count: mask.foreground_count(),
            total_pixel_count: u64::from(dimensions.width) * u64::from(dimensions.height),
        },
    };

    let start = clock.now();
    let (path, stats) = scanline::trace_with_config(&mask, config);
    let trace = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Trace {
            step_px: config.step_px,
            angle_deg: config.angle_deg,
            line_count: stats.line_count,
            segment_count: stats.segment_count,
            jump_count: stats.jump_count,
            points_before: stats.raw_point_count,
            points_after: path.len(),
        },
    };

    let units_per_pixel = config.hoop.units_per_pixel(dimensions);
    let summary = PipelineSummary {
        image_width: dimensions.width,
        image_height: dimensions.height,
        hoop: config.hoop.to_string(),
        units_per_pixel,
        final_point_count: path.len(),
    };
    let diagnostics = PipelineDiagnostics {
        decode,
        mask: mask_stage,
        trace,
        total_duration: clock.elapsed(&total_start),
        summary,
    };

    let session = ConversionSession {
        dimensions,
        mask,
        mask_source,
        path,
        units_per_pixel,
        stats,
    };
    Ok((session, diagnostics))
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Conversion Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{}  |  Hoop: {} ({:.4} units/px)",
            self.summary.image_width,
            self.summary.image_height,
            self.summary.hoop,
            self.summary.units_per_pixel,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in [
            ("Decode", &self.decode),
            ("Mask", &self.mask),
            ("Trace", &self.trace),
        ] {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Final stitch points: {}",
            self.summary.final_point_count
        ));

        lines.join("\n")
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Mask {
            source,
            foreground_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let coverage = if *total_pixel_count > 0 {
                *foreground_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            let origin = match source {
                MaskSource::Overlay => "painted".to_owned(),
                MaskSource::Threshold(level) => format!("otsu={level}"),
            };
            format!("{origin} foreground={foreground_pixel_count} ({coverage:.1}%)")
        }
        StageMetrics::Trace {
            step_px,
            angle_deg,
            line_count,
            segment_count,
            jump_count,
            points_before,
            points_after,
        } => format!(
            "step={step_px:.1} angle={angle_deg:.1} {line_count} lines, {segment_count} runs, {jump_count} jumps, {points_before}->{points_after} pts",
        ),
    }
}
