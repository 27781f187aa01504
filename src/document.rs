//! Loading of SVG documents into parsed paths
use crate::{
    Point, Scalar, Segment, SvgParserError,
    svg::{parse_length, parse_path_data, parse_points},
};
use std::{fmt, fs, io, path::Path};

/// Single path of the document
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPath {
    /// Segments with absolute coordinates in drawing order
    pub segments: Vec<Segment>,
    /// Raw path data, absent for basic shapes converted to segments
    pub commands: Option<String>,
}

impl ParsedPath {
    /// Parse path data of a `path` element
    pub fn from_path_data(data: &str) -> Result<Self, SvgParserError> {
        Ok(Self {
            segments: parse_path_data(data)?,
            commands: Some(data.to_owned()),
        })
    }
}

/// SVG document parsed into paths and metadata required for geometry extraction
#[derive(Debug, Clone)]
pub struct SvgDocument {
    source: String,
    paths: Vec<ParsedPath>,
    view_box: Option<String>,
}

impl SvgDocument {
    /// Read and parse SVG document from the file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let _guard = tracing::debug_span!("[load]", path = %path.display()).entered();
        let source = fs::read_to_string(path)?;
        Self::parse(source)
    }

    /// Parse SVG document from its source text
    pub fn parse(source: impl Into<String>) -> Result<Self, DocumentError> {
        let source = source.into();
        let (paths, view_box) = {
            let options = roxmltree::ParsingOptions {
                allow_dtd: true,
                ..Default::default()
            };
            let doc = roxmltree::Document::parse_with_options(&source, options)?;
            let root = doc.root_element();
            if root.tag_name().name() != "svg" {
                return Err(DocumentError::NotSvg(root.tag_name().name().to_owned()));
            }
            let view_box = root.attribute("viewBox").map(str::to_owned);
            (collect_paths(&doc)?, view_box)
        };
        tracing::debug!(paths = paths.len(), "[load:paths]");
        Ok(Self {
            source,
            paths,
            view_box,
        })
    }

    /// Source text of the document
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn paths(&self) -> &[ParsedPath] {
        &self.paths
    }

    /// Raw value of the `viewBox` attribute of the root element
    pub fn view_box(&self) -> Option<&str> {
        self.view_box.as_deref()
    }
}

/// Elements converted to paths, in the order they are collected
const SHAPES: [&str; 6] = ["polyline", "polygon", "line", "ellipse", "circle", "rect"];

// All `path` elements come first in document order, followed by basic shapes
// grouped by element kind.
fn collect_paths(doc: &roxmltree::Document<'_>) -> Result<Vec<ParsedPath>, DocumentError> {
    let elements = || doc.descendants().filter(|node| node.is_element());
    let mut paths = Vec::new();
    for (index, node) in elements()
        .filter(|node| node.tag_name().name() == "path")
        .enumerate()
    {
        let Some(data) = node.attribute("d") else {
            tracing::warn!(index, "[load] path without path data");
            continue;
        };
        let path = ParsedPath::from_path_data(data)
            .map_err(|error| DocumentError::InvalidPathData { index, error })?;
        paths.push(path);
    }
    for shape in SHAPES {
        for node in elements().filter(|node| node.tag_name().name() == shape) {
            let segments = shape_segments(node)
                .map_err(|error| DocumentError::InvalidShape { shape, error })?;
            paths.push(ParsedPath {
                segments,
                commands: None,
            });
        }
    }
    Ok(paths)
}

fn attr(node: roxmltree::Node<'_, '_>, name: &str) -> Result<Scalar, SvgParserError> {
    node.attribute(name).map_or(Ok(0.0), parse_length)
}

fn polyline(points: &[Point], close: bool) -> Vec<Segment> {
    let mut segments: Vec<_> = points
        .windows(2)
        .map(|pair| Segment::line(pair[0], pair[1]))
        .collect();
    if let (true, Some(first), Some(last)) = (close, points.first(), points.last()) {
        if first != last {
            segments.push(Segment::line(*last, *first));
        }
    }
    segments
}

// Elliptic outline as two half arcs starting at the leftmost point
fn ellipse(center: Point, rx: Scalar, ry: Scalar) -> Vec<Segment> {
    if rx <= 0.0 || ry <= 0.0 {
        return Vec::new();
    }
    let radii = Point::new(rx, ry);
    let left = Point::new(center.x() - rx, center.y());
    let right = Point::new(center.x() + rx, center.y());
    let arc = |start, end| Segment::Arc {
        start,
        end,
        radii,
        rotation: 0.0,
        large_arc: true,
        sweep: false,
    };
    vec![arc(left, right), arc(right, left)]
}

fn shape_segments(node: roxmltree::Node<'_, '_>) -> Result<Vec<Segment>, SvgParserError> {
    let segments = match node.tag_name().name() {
        "line" => vec![Segment::line(
            (attr(node, "x1")?, attr(node, "y1")?),
            (attr(node, "x2")?, attr(node, "y2")?),
        )],
        "polyline" => polyline(&parse_points(node.attribute("points").unwrap_or(""))?, false),
        "polygon" => polyline(&parse_points(node.attribute("points").unwrap_or(""))?, true),
        "rect" => {
            let (x, y) = (attr(node, "x")?, attr(node, "y")?);
            let (width, height) = (attr(node, "width")?, attr(node, "height")?);
            if width <= 0.0 || height <= 0.0 {
                return Ok(Vec::new());
            }
            let corners = [
                Point::new(x, y),
                Point::new(x + width, y),
                Point::new(x + width, y + height),
                Point::new(x, y + height),
            ];
            polyline(&corners, true)
        }
        "circle" => {
            let r = attr(node, "r")?;
            ellipse(Point::new(attr(node, "cx")?, attr(node, "cy")?), r, r)
        }
        "ellipse" => ellipse(
            Point::new(attr(node, "cx")?, attr(node, "cy")?),
            attr(node, "rx")?,
            attr(node, "ry")?,
        ),
        _ => Vec::new(),
    };
    Ok(segments)
}

/// Broad class of a document error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentErrorKind {
    /// Document could not be read or is not an SVG document
    Unreadable,
    /// Document is readable but lacks or misdeclares required data
    Malformed,
}

/// Error while loading document or extracting its geometry
#[derive(Debug)]
pub enum DocumentError {
    /// IO error propagated while reading the file
    Io(io::Error),
    /// Document is not well formed XML
    Xml(roxmltree::Error),
    /// Root element is not `svg`
    NotSvg(String),
    /// Root element does not declare `viewBox`
    MissingViewBox,
    /// `viewBox` is not four integers
    InvalidViewBox(SvgParserError),
    /// Path data of the `index`-th path element failed to parse
    InvalidPathData { index: usize, error: SvgParserError },
    /// Attributes of a basic shape failed to parse
    InvalidShape {
        shape: &'static str,
        error: SvgParserError,
    },
}

impl DocumentError {
    pub fn kind(&self) -> DocumentErrorKind {
        match self {
            DocumentError::Io(_) | DocumentError::Xml(_) | DocumentError::NotSvg(_) => {
                DocumentErrorKind::Unreadable
            }
            DocumentError::MissingViewBox
            | DocumentError::InvalidViewBox(_)
            | DocumentError::InvalidPathData { .. }
            | DocumentError::InvalidShape { .. } => DocumentErrorKind::Malformed,
        }
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::Io(error) => write!(f, "failed to read document: {}", error),
            DocumentError::Xml(error) => write!(f, "failed to parse document: {}", error),
            DocumentError::NotSvg(name) => write!(f, "root element is <{}> instead of <svg>", name),
            DocumentError::MissingViewBox => write!(f, "document does not declare viewBox"),
            DocumentError::InvalidViewBox(error) => write!(f, "malformed viewBox: {}", error),
            DocumentError::InvalidPathData { index, error } => {
                write!(f, "malformed data of path #{}: {}", index, error)
            }
            DocumentError::InvalidShape { shape, error } => {
                write!(f, "malformed <{}> element: {}", shape, error)
            }
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::Io(error) => Some(error),
            DocumentError::Xml(error) => Some(error),
            DocumentError::InvalidViewBox(error) => Some(error),
            DocumentError::InvalidPathData { error, .. } => Some(error),
            DocumentError::InvalidShape { error, .. } => Some(error),
            DocumentError::NotSvg(_) | DocumentError::MissingViewBox => None,
        }
    }
}

impl From<io::Error> for DocumentError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<roxmltree::Error> for DocumentError {
    fn from(error: roxmltree::Error) -> Self {
        Self::Xml(error)
    }
}
