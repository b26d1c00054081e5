//! stitchwork: convert a raster image into a Tajima DST embroidery file.
//!
//! Reads an image, derives a foreground mask (Otsu threshold or a painted
//! overlay), fills it with angled scanline stitches and writes the result
//! as `.dst`, optionally with an SVG preview and per-stage diagnostics.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin stitchwork -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use stitchwork_export::{DstMetadata, SvgMetadata};
use stitchwork_pipeline::diagnostics::{self, Clock};
use stitchwork_pipeline::{ConversionSession, Hoop, RgbaImage, StitchConfig};

/// Convert a raster image into a Tajima DST embroidery file.
///
/// Dark regions of the image are filled with parallel rows of stitches
/// laid at the given angle and spacing, scaled to fit the chosen hoop.
#[derive(Parser)]
#[command(name = "stitchwork", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Where to write the DST file [default: IMAGE_PATH with a .dst extension].
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write an SVG preview of the stitch path.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Painted mask overlay; pixels with non-zero alpha are filled.
    ///
    /// Must match the image size. A fully transparent overlay falls back
    /// to automatic thresholding.
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Spacing between stitch rows in pixels.
    #[arg(long, default_value_t = StitchConfig::DEFAULT_STEP_PX)]
    step: f64,

    /// Stitch row angle in degrees (0 = horizontal).
    #[arg(long, default_value_t = StitchConfig::DEFAULT_ANGLE_DEG, allow_negative_numbers = true)]
    angle: f64,

    /// Hoop the design is scaled into (4x4, 5x7, 6x10).
    #[arg(long, default_value_t = Hoop::default())]
    hoop: Hoop,

    /// Design name stored in the DST header [default: image file stem].
    #[arg(long)]
    label: Option<String>,

    /// Full stitch config as a JSON string.
    ///
    /// When provided, --step, --angle and --hoop are ignored. The JSON
    /// must be a valid `StitchConfig` serialization; missing fields take
    /// their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Print per-stage diagnostics.
    #[arg(long)]
    diagnostics: bool,

    /// Print diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Build a [`StitchConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<StitchConfig, String> {
    let config: StitchConfig = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        StitchConfig {
            step_px: cli.step,
            angle_deg: cli.angle,
            hoop: cli.hoop,
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Install a stderr logger at a level chosen by `-v` repetitions.
fn init_logging(verbose: u8) -> Result<(), String> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{l:<5} {t} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|e| format!("Error configuring logging: {e}"))?;
    log4rs::init_config(config).map_err(|e| format!("Error installing logger: {e}"))?;
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), String> {
    std::fs::write(path, contents).map_err(|e| format!("Error writing {}: {e}", path.display()))
}

fn load_overlay(path: &Path) -> Result<RgbaImage, String> {
    let bytes = read_file(path)?;
    stitchwork_pipeline::grayscale::decode(&bytes)
        .map_err(|e| format!("Error decoding mask {}: {e}", path.display()))
}

fn file_stem(path: &Path) -> &str {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(stitchwork_export::dst::DEFAULT_LABEL)
}

/// Run the conversion, printing diagnostics when requested.
fn convert(
    cli: &Cli,
    image_bytes: &[u8],
    overlay: Option<&RgbaImage>,
    config: &StitchConfig,
) -> Result<ConversionSession, String> {
    if !(cli.diagnostics || cli.json) {
        let pixels = stitchwork_pipeline::grayscale::decode(image_bytes)
            .map_err(|e| format!("Pipeline error: {e}"))?;
        return stitchwork_pipeline::convert(&pixels, overlay, config)
            .map_err(|e| format!("Pipeline error: {e}"));
    }

    let (session, diagnostics) =
        diagnostics::process_with_diagnostics(image_bytes, overlay, config, &StdClock)
            .map_err(|e| format!("Pipeline error: {e}"))?;
    if cli.json {
        let json = serde_json::to_string_pretty(&diagnostics)
            .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
        println!("{json}");
    } else {
        println!("{}", diagnostics.report());
    }
    Ok(session)
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = config_from_cli(cli)?;

    let image_bytes = read_file(&cli.image_path)?;
    log::info!(
        "image: {} ({} bytes)",
        cli.image_path.display(),
        image_bytes.len()
    );
    log::info!("config: {config:?}");

    let overlay = cli.mask.as_deref().map(load_overlay).transpose()?;
    let session = convert(cli, &image_bytes, overlay.as_ref(), &config)?;

    let stem = file_stem(&cli.image_path);
    let label = cli.label.as_deref().unwrap_or(stem);
    let dst = stitchwork_export::to_dst(
        &session.path,
        session.units_per_pixel,
        &DstMetadata { label: Some(label) },
    );
    let dst_path = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.image_path.with_extension("dst"));
    write_file(&dst_path, &dst)?;
    log::info!(
        "DST written to {} ({} points, {} bytes)",
        dst_path.display(),
        session.path.len(),
        dst.len()
    );
    if session.path.is_empty() {
        log::warn!("no foreground found, wrote an empty design");
    }

    if let Some(ref svg_path) = cli.svg {
        let description = format!(
            "step={} angle={} hoop={}",
            config.step_px, config.angle_deg, config.hoop
        );
        let metadata = SvgMetadata {
            title: Some(stem),
            description: Some(&description),
        };
        let svg = stitchwork_export::to_svg(&session.path, session.dimensions, &metadata);
        write_file(svg_path, svg.as_bytes())?;
        log::info!(
            "SVG written to {} ({} bytes)",
            svg_path.display(),
            svg.len()
        );
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(msg) = init_logging(cli.verbose) {
        eprintln!("{msg}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
