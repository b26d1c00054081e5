//! SVG preview serializer.
//!
//! Renders a stitch path as a single `<path>` over the source canvas,
//! using the [`svg`] crate for document construction, XML escaping, and
//! path data formatting. Coordinates stay in source pixels, so the
//! preview lines up with the input image.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Path, Title};
use svg::node::{Text, Value};

use stitchwork_pipeline::{Dimensions, StitchPath, StitchPoint};

/// Metadata to embed in the SVG document.
///
/// Both fields are optional. When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, typically the source image filename.
    pub title: Option<&'a str>,

    /// Document description, typically the conversion parameters.
    pub description: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from a stitch path.
///
/// Uses `M` for the first point and `L` for subsequent points.
/// Returns an empty string for paths with fewer than 2 points.
///
/// # Examples
///
/// ```
/// use stitchwork_pipeline::{StitchPath, StitchPoint};
/// use stitchwork_export::build_path_data;
///
/// let path = StitchPath::new(vec![StitchPoint::new(10, 20), StitchPoint::new(30, 40)]);
/// assert_eq!(build_path_data(&path), "M10,20 L30,40");
/// ```
#[must_use]
pub fn build_path_data(path: &StitchPath) -> String {
    let points = path.points();
    if points.len() < 2 {
        return String::new();
    }

    let xy = |p: &StitchPoint| (f64::from(p.x), f64::from(p.y));
    let mut data = Data::new().move_to(xy(&points[0]));
    for p in &points[1..] {
        data = data.line_to(xy(p));
    }
    String::from(Value::from(data))
}

/// Serialize a stitch path into an SVG document string.
///
/// The document is sized to `dimensions` with a matching `viewBox`. A
/// path with fewer than two points yields a document with no `<path>`.
///
/// # Examples
///
/// ```
/// use stitchwork_pipeline::{Dimensions, StitchPath, StitchPoint};
/// use stitchwork_export::{SvgMetadata, to_svg};
///
/// let path = StitchPath::new(vec![StitchPoint::new(10, 15), StitchPoint::new(12, 18)]);
/// let dims = Dimensions { width: 800, height: 600 };
/// let metadata = SvgMetadata {
///     title: Some("rose"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&path, dims, &metadata);
/// assert!(svg.contains("<title>rose</title>"));
/// assert!(svg.contains("M10,15 L12,18"));
/// ```
#[must_use]
pub fn to_svg(path: &StitchPath, dimensions: Dimensions, metadata: &SvgMetadata<'_>) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    let d = build_path_data(path);
    if !d.is_empty() {
        doc = doc.add(
            Path::new()
                .set("d", d)
                .set("fill", "none")
                .set("stroke", "black")
                .set("stroke-width", 1),
        );
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    fn path(coords: &[(i32, i32)]) -> StitchPath {
        StitchPath::new(
            coords
                .iter()
                .map(|&(x, y)| StitchPoint::new(x, y))
                .collect(),
        )
    }

    #[test]
    fn build_path_data_empty_path() {
        assert_eq!(build_path_data(&StitchPath::default()), "");
    }

    #[test]
    fn build_path_data_single_point() {
        assert_eq!(build_path_data(&path(&[(5, 5)])), "");
    }

    #[test]
    fn build_path_data_three_points() {
        let d = build_path_data(&path(&[(10, 15), (12, 18), (14, 20)]));
        assert_eq!(d, "M10,15 L12,18 L14,20");
    }

    #[test]
    fn empty_path_produces_valid_svg_with_no_path() {
        let svg = to_svg(&StitchPath::default(), dims(100, 50), &SvgMetadata::default());
        assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(svg.contains(r#"width="100""#));
        assert!(svg.contains(r#"height="50""#));
        assert!(svg.contains(r#"viewBox="0 0 100 50""#));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn path_attributes() {
        let svg = to_svg(&path(&[(10, 20), (30, 40)]), dims(800, 600), &SvgMetadata::default());
        assert!(svg.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
        assert!(svg.contains(r#"d="M10,20 L30,40""#));
        assert!(svg.contains(r#"fill="none""#));
        assert!(svg.contains(r#"stroke="black""#));
        assert!(svg.contains(r#"stroke-width="1""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn title_and_desc_precede_path() {
        let meta = SvgMetadata {
            title: Some("tulip"),
            description: Some("step=4 angle=45 hoop=4x4"),
        };
        let svg = to_svg(&path(&[(1, 2), (3, 4)]), dims(10, 10), &meta);
        let title_pos = svg.find("<title>tulip</title>").unwrap();
        let desc_pos = svg.find("<desc>step=4 angle=45 hoop=4x4</desc>").unwrap();
        let path_pos = svg.find("<path").unwrap();
        assert!(title_pos < desc_pos);
        assert!(desc_pos < path_pos);
    }

    #[test]
    fn metadata_is_escaped() {
        let meta = SvgMetadata {
            title: Some("A <B> & C"),
            description: None,
        };
        let svg = to_svg(&StitchPath::default(), dims(10, 10), &meta);
        assert!(svg.contains("<title>A &lt;B&gt; &amp; C</title>"));
        assert!(!svg.contains("<desc>"));
    }
}
