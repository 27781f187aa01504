//! Overlay SVG documents and annotate their path geometry for visual comparison.
//!
//! Main features:
//!  - SVG path data parsing and basic shape conversion
//!  - Extraction of endpoints, control points and the endpoints they belong to
//!  - Command statistics per document
//!  - Layered overlay of recolored rasters with geometry annotations
//!
#![deny(warnings)]

mod color;
mod command;
mod document;
mod ellipse;
mod extract;
mod geometry;
mod image;
mod layer;
mod overlay;
mod raster;
mod segment;
mod svg;

pub use color::{ColorError, ColorU8};
pub use command::{CommandCounts, CommandKind};
pub use document::{DocumentError, DocumentErrorKind, ParsedPath, SvgDocument};
pub use ellipse::EllipArc;
pub use extract::{DocumentGeometry, UnrecognizedSegment, extract};
pub use geometry::{EPSILON, Owners, PI, Point, Scalar, ViewBox, scalar_fmt};
pub use image::{Image, ImageMut, ImageOwned, Shape, Size};
pub use layer::{DEFAULT_OPACITY, Layer, LayerId, LayerStack, TINT_PALETTE};
pub use overlay::{DEFAULT_SCALE, Overlay, Style, View, ZOOM_FACTOR};
pub use raster::{RasterError, Rasterizer, ResvgRasterizer, raster_size, recolor};
pub use segment::Segment;
pub use svg::{SvgParserError, SvgPathCmd, SvgPathParser, parse_path_data};
