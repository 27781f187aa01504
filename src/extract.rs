//! Extraction of endpoints, control points and command statistics from parsed paths
use crate::{
    CommandCounts, DocumentError, Owners, ParsedPath, Point, Scalar, Segment, SvgDocument,
    ViewBox,
};

/// Segment skipped during extraction because its kind is not known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UnrecognizedSegment {
    /// Index of the path in the document
    pub path: usize,
    /// Index of the segment in the path
    pub segment: usize,
    pub kind: &'static str,
}

/// Geometry of a document used to annotate its rendering
///
/// Computed once when the document is opened and never changed afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DocumentGeometry {
    end_points: Vec<Point>,
    control_points: Vec<Point>,
    command_counts: CommandCounts,
    view_box: ViewBox,
    diagnostics: Vec<UnrecognizedSegment>,
}

impl DocumentGeometry {
    /// Extract geometry of the loaded document
    pub fn from_document(doc: &SvgDocument) -> Result<Self, DocumentError> {
        let view_box = doc.view_box().ok_or(DocumentError::MissingViewBox)?;
        extract(doc.paths(), view_box)
    }

    /// Endpoints of all segments, without consecutive duplicates
    pub fn end_points(&self) -> &[Point] {
        &self.end_points
    }

    /// Control points of Bezier segments, each owned by endpoints it influences
    pub fn control_points(&self) -> &[Point] {
        &self.control_points
    }

    pub fn command_counts(&self) -> &CommandCounts {
        &self.command_counts
    }

    pub fn view_box(&self) -> ViewBox {
        self.view_box
    }

    pub fn width(&self) -> Scalar {
        self.view_box.width()
    }

    pub fn height(&self) -> Scalar {
        self.view_box.height()
    }

    /// Segments that were skipped because their kind is unknown
    pub fn diagnostics(&self) -> &[UnrecognizedSegment] {
        &self.diagnostics
    }

    /// Resolve owners of the point into endpoints
    pub fn owners_of(&self, point: &Point) -> impl Iterator<Item = Point> + '_ {
        point
            .owners()
            .iter()
            .filter_map(|index| self.end_points.get(index).copied())
    }

    /// Edges connecting every control point with the endpoints it belongs to
    pub fn connectors(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.control_points.iter().flat_map(move |control| {
            self.owners_of(control)
                .map(move |end_point| (*control, end_point))
        })
    }
}

/// Extract document geometry from parsed paths and the raw `viewBox` value
///
/// Endpoints are collected in drawing order, a segment start is only recorded
/// if it differs from the last recorded endpoint. Each cubic contributes two
/// control points owned by the segment start and end respectively, each quadratic
/// contributes one control point owned by both. Commands are counted from the raw
/// path data of each path.
pub fn extract(paths: &[ParsedPath], view_box: &str) -> Result<DocumentGeometry, DocumentError> {
    let view_box: ViewBox = view_box.parse().map_err(DocumentError::InvalidViewBox)?;
    let _guard = tracing::debug_span!("[extract]", paths = paths.len()).entered();

    let mut end_points: Vec<Point> = Vec::new();
    let mut control_points = Vec::new();
    let mut command_counts = CommandCounts::default();
    let mut diagnostics = Vec::new();

    for (path_index, path) in paths.iter().enumerate() {
        for (segment_index, segment) in path.segments.iter().enumerate() {
            if let Segment::Unrecognized { kind, .. } = segment {
                tracing::warn!(
                    path = path_index,
                    segment = segment_index,
                    kind,
                    "[extract] unrecognized segment"
                );
                diagnostics.push(UnrecognizedSegment {
                    path: path_index,
                    segment: segment_index,
                    kind,
                });
                continue;
            }

            let start = segment.start().with_owners(Owners::None);
            let end = segment.end().with_owners(Owners::None);
            if end_points.last() != Some(&start) {
                end_points.push(start);
            }
            let start_index = end_points.len() - 1;
            end_points.push(end);
            let end_index = end_points.len() - 1;

            match segment {
                Segment::CubicBezier {
                    control1, control2, ..
                } => {
                    control_points.push(control1.with_owners(Owners::One(start_index)));
                    control_points.push(control2.with_owners(Owners::One(end_index)));
                }
                Segment::QuadraticBezier { control, .. } => {
                    control_points.push(control.with_owners(Owners::Two(start_index, end_index)));
                }
                _ => {}
            }
        }
        if let Some(commands) = &path.commands {
            command_counts.count(commands);
        }
    }

    tracing::debug!(
        end_points = end_points.len(),
        control_points = control_points.len(),
        commands = command_counts.all,
        "[extract:done]"
    );
    Ok(DocumentGeometry {
        end_points,
        control_points,
        command_counts,
        view_box,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CommandKind, DocumentErrorKind, assert_approx_eq};

    fn path(data: &str) -> ParsedPath {
        ParsedPath::from_path_data(data).expect("valid path data")
    }

    fn points(coords: &[(Scalar, Scalar)]) -> Vec<Point> {
        coords.iter().copied().map(Point::from).collect()
    }

    #[test]
    fn test_polyline_endpoints() -> Result<(), DocumentError> {
        let geometry = extract(&[path("M0,0 L10,0 L10,10")], "0 0 100 100")?;
        assert_eq!(
            geometry.end_points(),
            points(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)])
        );
        assert!(geometry.control_points().is_empty());
        assert_eq!(
            *geometry.command_counts(),
            CommandCounts {
                all: 3,
                moves: 1,
                lines: 2,
                ..Default::default()
            }
        );
        Ok(())
    }

    #[test]
    fn test_cubic_control_points() -> Result<(), DocumentError> {
        let geometry = extract(&[path("M0,0 C2,2 4,4 6,6")], "0 0 10 10")?;
        assert_eq!(geometry.end_points(), points(&[(0.0, 0.0), (6.0, 6.0)]));
        assert_eq!(geometry.control_points(), points(&[(2.0, 2.0), (4.0, 4.0)]));

        let [c1, c2] = geometry.control_points() else {
            panic!("two control points expected");
        };
        assert_eq!(c1.owners(), Owners::One(0));
        assert_eq!(c2.owners(), Owners::One(1));
        assert_eq!(geometry.owners_of(c1).collect::<Vec<_>>(), points(&[(0.0, 0.0)]));
        assert_eq!(geometry.owners_of(c2).collect::<Vec<_>>(), points(&[(6.0, 6.0)]));
        assert_eq!(geometry.command_counts().cubics, 1);
        assert_eq!(geometry.command_counts().all, 2);
        Ok(())
    }

    #[test]
    fn test_quadratic_control_points() -> Result<(), DocumentError> {
        let geometry = extract(&[path("M1,1 Q2,0 3,1 T5,1")], "0 0 10 10")?;
        assert_eq!(
            geometry.end_points(),
            points(&[(1.0, 1.0), (3.0, 1.0), (5.0, 1.0)])
        );
        let controls = geometry.control_points();
        assert_eq!(controls.len(), 2);
        assert_eq!(controls[0].owners(), Owners::Two(0, 1));
        assert_eq!(controls[1].owners(), Owners::Two(1, 2));
        assert_eq!(controls[1], Point::new(4.0, 2.0));
        assert_eq!(
            geometry.connectors().collect::<Vec<_>>(),
            vec![
                (Point::new(2.0, 0.0), Point::new(1.0, 1.0)),
                (Point::new(2.0, 0.0), Point::new(3.0, 1.0)),
                (Point::new(4.0, 2.0), Point::new(3.0, 1.0)),
                (Point::new(4.0, 2.0), Point::new(5.0, 1.0)),
            ]
        );
        // `T` is not one of the counted command letters
        assert_eq!(geometry.command_counts().all, 2);
        Ok(())
    }

    #[test]
    fn test_view_box_size() -> Result<(), DocumentError> {
        let geometry = extract(&[], "0 0 100 50")?;
        assert_approx_eq!(geometry.width(), 100.0);
        assert_approx_eq!(geometry.height(), 50.0);
        assert!(geometry.end_points().is_empty());

        let error = extract(&[], "bad").unwrap_err();
        assert!(matches!(error, DocumentError::InvalidViewBox(_)));
        assert_eq!(error.kind(), DocumentErrorKind::Malformed);
        Ok(())
    }

    #[test]
    fn test_subpath_junction() -> Result<(), DocumentError> {
        // second path starts where the first one ends
        let joined = extract(&[path("M0,0 L5,0"), path("M5,0 L5,5")], "0 0 10 10")?;
        assert_eq!(
            joined.end_points(),
            points(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)])
        );

        // second path starts elsewhere
        let split = extract(&[path("M0,0 L5,0"), path("M7,7 L9,9")], "0 0 10 10")?;
        assert_eq!(
            split.end_points(),
            points(&[(0.0, 0.0), (5.0, 0.0), (7.0, 7.0), (9.0, 9.0)])
        );

        // only consecutive duplicates are suppressed
        let revisit = extract(&[path("M0,0 L5,0 L0,0 M5,0 L6,0")], "0 0 10 10")?;
        assert_eq!(
            revisit.end_points(),
            points(&[(0.0, 0.0), (5.0, 0.0), (0.0, 0.0), (5.0, 0.0), (6.0, 0.0)])
        );
        Ok(())
    }

    #[test]
    fn test_arc_contributes_endpoints_only() -> Result<(), DocumentError> {
        let geometry = extract(&[path("M0,0 A5,5 0 0 1 10,0 L10,5")], "0 0 10 10")?;
        assert_eq!(
            geometry.end_points(),
            points(&[(0.0, 0.0), (10.0, 0.0), (10.0, 5.0)])
        );
        assert!(geometry.control_points().is_empty());
        assert_eq!(geometry.command_counts().get(CommandKind::Arc), 1);
        Ok(())
    }

    #[test]
    fn test_unrecognized_segment_is_skipped() -> Result<(), DocumentError> {
        let parsed = ParsedPath {
            segments: vec![
                Segment::line((0.0, 0.0), (1.0, 0.0)),
                Segment::Unrecognized {
                    kind: "spline",
                    start: Point::new(1.0, 0.0),
                    end: Point::new(3.0, 3.0),
                },
                Segment::line((1.0, 0.0), (1.0, 1.0)),
            ],
            commands: None,
        };
        let geometry = extract(&[parsed], "0 0 4 4")?;
        assert_eq!(
            geometry.end_points(),
            points(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)])
        );
        assert_eq!(
            geometry.diagnostics(),
            &[UnrecognizedSegment {
                path: 0,
                segment: 1,
                kind: "spline"
            }]
        );
        assert_eq!(geometry.command_counts().all, 0);
        Ok(())
    }

    #[test]
    fn test_move_segment_contributes_endpoints() -> Result<(), DocumentError> {
        let parsed = ParsedPath {
            segments: vec![
                Segment::Move {
                    start: Point::new(0.0, 0.0),
                    end: Point::new(2.0, 2.0),
                },
                Segment::line((2.0, 2.0), (3.0, 2.0)),
            ],
            commands: Some("M2,2 L3,2".to_owned()),
        };
        let geometry = extract(&[parsed], "0 0 4 4")?;
        assert_eq!(
            geometry.end_points(),
            points(&[(0.0, 0.0), (2.0, 2.0), (3.0, 2.0)])
        );
        Ok(())
    }

    #[test]
    fn test_idempotent() -> Result<(), DocumentError> {
        let paths = [
            path("M0,0 C1,2 3,4 5,6 Q7,8 9,10 L0,0"),
            path("m3,3 c1,1 2,2 3,3 z"),
        ];
        let first = extract(&paths, "0 0 20 20")?;
        let second = extract(&paths, "0 0 20 20")?;
        assert_eq!(first, second);
        let owners = |geometry: &DocumentGeometry| {
            geometry
                .control_points()
                .iter()
                .map(|point| geometry.owners_of(point).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        };
        assert_eq!(owners(&first), owners(&second));
        Ok(())
    }

    #[test]
    fn test_invariants() -> Result<(), DocumentError> {
        let paths = [
            path("M12 1C9.79 1 8 2.31 8 3.92c0 1.94.5 3.03 0 6.08 0-4.5-2.77-6.34-4-6.34"),
            path("M2.5 6 c-.28 0-.5-.22-.5-.5s.22-.5.5-.5.5.22.5.5-.22.5-.5.5z"),
            path("M0 0 q1 1 2 0 t2 0 h3 v3 A1 2 0 0 0 4 4 Z"),
        ];
        let geometry = extract(&paths, "0 0 16 16")?;
        let segments: usize = paths.iter().map(|path| path.segments.len()).sum();

        assert!(!geometry.end_points().is_empty());
        assert!(geometry.end_points().len() <= 2 * segments);
        assert!(geometry.end_points().len() >= segments + 1);
        for window in geometry.end_points().windows(2) {
            assert_ne!(window[0], window[1]);
        }

        // every control point is owned by endpoints of the segment that produced it
        let mut controls = geometry.control_points().iter();
        for segment in paths.iter().flat_map(|path| path.segments.iter()) {
            let expected: Vec<Vec<Point>> = match segment {
                Segment::CubicBezier { start, end, .. } => vec![vec![*start], vec![*end]],
                Segment::QuadraticBezier { start, end, .. } => vec![vec![*start, *end]],
                _ => continue,
            };
            for owners in expected {
                let control = controls.next().expect("missing control point");
                assert_eq!(geometry.owners_of(control).collect::<Vec<_>>(), owners);
            }
        }
        assert!(controls.next().is_none());

        let counts = geometry.command_counts();
        assert_eq!(
            counts.all,
            counts.moves + counts.lines + counts.cubics + counts.quadratics + counts.arcs
        );
        Ok(())
    }
}
