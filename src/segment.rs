use crate::{CommandKind, Point, Scalar};

/// Single drawing command of a path with absolute coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Move {
        start: Point,
        end: Point,
    },
    /// Straight line, including horizontal, vertical and closing lines
    Line {
        start: Point,
        end: Point,
    },
    CubicBezier {
        start: Point,
        control1: Point,
        control2: Point,
        end: Point,
    },
    QuadraticBezier {
        start: Point,
        control: Point,
        end: Point,
    },
    /// Elliptic arc, only its endpoints take part in geometry extraction
    Arc {
        start: Point,
        end: Point,
        radii: Point,
        rotation: Scalar,
        large_arc: bool,
        sweep: bool,
    },
    /// Segment kind without a known variant, it is reported but otherwise skipped
    Unrecognized {
        kind: &'static str,
        start: Point,
        end: Point,
    },
}

impl Segment {
    pub fn start(&self) -> Point {
        use Segment::*;
        *match self {
            Move { start, .. } => start,
            Line { start, .. } => start,
            CubicBezier { start, .. } => start,
            QuadraticBezier { start, .. } => start,
            Arc { start, .. } => start,
            Unrecognized { start, .. } => start,
        }
    }

    pub fn end(&self) -> Point {
        use Segment::*;
        *match self {
            Move { end, .. } => end,
            Line { end, .. } => end,
            CubicBezier { end, .. } => end,
            QuadraticBezier { end, .. } => end,
            Arc { end, .. } => end,
            Unrecognized { end, .. } => end,
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Segment::Move { .. } => CommandKind::Move,
            Segment::Line { .. } => CommandKind::Line,
            Segment::CubicBezier { .. } => CommandKind::Cubic,
            Segment::QuadraticBezier { .. } => CommandKind::Quadratic,
            Segment::Arc { .. } => CommandKind::Arc,
            Segment::Unrecognized { .. } => CommandKind::Unrecognized,
        }
    }

    pub fn line(start: impl Into<Point>, end: impl Into<Point>) -> Self {
        Segment::Line {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn cubic(
        start: impl Into<Point>,
        control1: impl Into<Point>,
        control2: impl Into<Point>,
        end: impl Into<Point>,
    ) -> Self {
        Segment::CubicBezier {
            start: start.into(),
            control1: control1.into(),
            control2: control2.into(),
            end: end.into(),
        }
    }

    pub fn quad(start: impl Into<Point>, control: impl Into<Point>, end: impl Into<Point>) -> Self {
        Segment::QuadraticBezier {
            start: start.into(),
            control: control.into(),
            end: end.into(),
        }
    }
}
