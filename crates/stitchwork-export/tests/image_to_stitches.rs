//! Integration test: run generated images through the pipeline and export
//! to DST and SVG.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use image::{Rgba, RgbaImage};
use stitchwork_export::tajima::{Record, RecordKind};
use stitchwork_export::{DstMetadata, SvgMetadata, to_dst, to_svg};
use stitchwork_pipeline::grayscale::round_half_up;
use stitchwork_pipeline::{Hoop, StitchConfig};

const WIDTH: u32 = 60;
const HEIGHT: u32 = 40;

/// Dark disc of radius 12 on a light ground.
///
/// One mid-gray pixel in the corner gives the histogram a third level,
/// so the Otsu split lands between the disc and the ground.
fn disc_image() -> RgbaImage {
    RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let dx = f64::from(x) - 30.0;
        let dy = f64::from(y) - 20.0;
        if (x, y) == (0, 0) {
            Rgba([40, 40, 40, 255])
        } else if dx.hypot(dy) < 12.0 {
            Rgba([10, 10, 10, 255])
        } else {
            Rgba([220, 220, 220, 255])
        }
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

fn header_field(dst: &[u8], index: usize) -> String {
    std::str::from_utf8(&dst[index * 26..(index + 1) * 26])
        .unwrap()
        .trim_end()
        .to_owned()
}

fn header_number(dst: &[u8], index: usize) -> i64 {
    let field = header_field(dst, index);
    field[3..].trim_start_matches('+').trim().parse().unwrap()
}

#[test]
#[allow(clippy::cast_possible_truncation)]
fn disc_image_to_dst() {
    let png = encode_png(&disc_image());
    let session = stitchwork_pipeline::process(&png, &StitchConfig::default())
        .expect("pipeline should succeed");

    assert_eq!(session.threshold(), Some(40));
    let bounds = session.mask.foreground_bounds().expect("disc is foreground");
    assert!(bounds.min_x >= 18 && bounds.max_x <= 42, "{bounds:?}");
    assert!(bounds.min_y >= 8 && bounds.max_y <= 32, "{bounds:?}");
    assert!(session.path.len() >= 2);

    let dst = to_dst(
        &session.path,
        session.units_per_pixel,
        &DstMetadata {
            label: Some("disc"),
        },
    );
    assert_eq!(header_field(&dst, 0), "LA:disc");

    let stitch_count = usize::try_from(header_number(&dst, 1)).unwrap();
    assert_eq!(dst.len(), 512 + 3 * (stitch_count + 1));
    assert!(stitch_count >= session.path.len() - 1);

    let records: Vec<Record> = dst[512..]
        .chunks_exact(3)
        .map(|c| Record([c[0], c[1], c[2]]))
        .collect();
    let (end, stitches) = records.split_last().unwrap();
    assert_eq!(end.kind(), RecordKind::End);
    assert!(stitches.iter().all(|r| r.kind() == RecordKind::Normal));

    // 4x4 hoop over 60x40 px: min(100/60, 100/40) mm/px.
    let upp = Hoop::FourByFour.units_per_pixel(session.dimensions);
    assert!((session.units_per_pixel - upp).abs() < f64::EPSILON);
    let path_bounds = session.path.bounds().unwrap();
    let extent_x = round_half_up(f64::from(path_bounds.max_x - path_bounds.min_x) * upp);
    let extent_y = round_half_up(f64::from(path_bounds.max_y - path_bounds.min_y) * upp);
    assert_eq!(header_number(&dst, 3), extent_x as i64);
    assert_eq!(header_number(&dst, 4), extent_x as i64);
    assert_eq!(header_number(&dst, 5), extent_y as i64);
    assert_eq!(header_number(&dst, 6), extent_y as i64);
}

#[test]
fn disc_image_to_svg() {
    let png = encode_png(&disc_image());
    let session = stitchwork_pipeline::process(&png, &StitchConfig::default()).unwrap();

    let svg = to_svg(
        &session.path,
        session.dimensions,
        &SvgMetadata {
            title: Some("disc"),
            description: Some("step=4 angle=45"),
        },
    );
    assert!(svg.contains(r#"viewBox="0 0 60 40""#));
    assert!(svg.contains("<path"));
    assert!(svg.contains("<title>disc</title>"));
    assert!(svg.trim_end().ends_with("</svg>"));
}

#[test]
fn blank_image_gives_zero_stitch_file() {
    let png = encode_png(&RgbaImage::from_pixel(
        WIDTH,
        HEIGHT,
        Rgba([255, 255, 255, 255]),
    ));
    let session = stitchwork_pipeline::process(&png, &StitchConfig::default()).unwrap();
    assert!(session.path.is_empty());

    let dst = to_dst(&session.path, session.units_per_pixel, &DstMetadata::default());
    assert_eq!(dst.len(), 515);
    assert_eq!(header_field(&dst, 1), "ST:      0");
    assert_eq!(&dst[509..512], &[0x1A, 0x00, 0x00]);
    assert_eq!(&dst[512..], &[0x00, 0x00, 0xF3]);
}

#[test]
fn painted_overlay_limits_stitches() {
    let pixels = disc_image();
    let overlay = RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| {
        if (40..56).contains(&x) && (4..12).contains(&y) {
            Rgba([0, 0, 255, 200])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    let config = StitchConfig {
        step_px: 2.0,
        angle_deg: 0.0,
        hoop: Hoop::FiveBySeven,
    };
    let session = stitchwork_pipeline::convert(&pixels, Some(&overlay), &config).unwrap();
    assert_eq!(session.threshold(), None);
    for p in session.path.points() {
        assert!((40..56).contains(&p.x) && (4..12).contains(&p.y), "{p:?}");
    }

    let dst = to_dst(&session.path, session.units_per_pixel, &DstMetadata::default());
    let stitch_count = usize::try_from(header_number(&dst, 1)).unwrap();
    assert!(stitch_count > 0);
    assert_eq!(dst.len(), 512 + 3 * (stitch_count + 1));
}
