//! SVG path data parser
//!
//! See [SVG Path Specification](https://www.w3.org/TR/SVG11/paths.html#PathData)
use crate::{Point, Scalar, Segment, ViewBox};
use std::{fmt, str::FromStr};

/// Possible SVG path commands, all points are absolute
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SvgPathCmd {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    ArcTo {
        radii: Point,
        x_axis_rot: Scalar,
        large: bool,
        sweep: bool,
        dst: Point,
    },
    Close(Point),
}

impl SvgPathCmd {
    /// Get destination point of the SVG command
    pub fn dst(&self) -> Point {
        use SvgPathCmd::*;
        *match self {
            MoveTo(dst) => dst,
            LineTo(dst) => dst,
            QuadTo(_, dst) => dst,
            CubicTo(_, _, dst) => dst,
            ArcTo { dst, .. } => dst,
            Close(dst) => dst,
        }
    }
}

struct Parser<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.offset += 1;
        Some(byte)
    }

    // consume single byte if it satisfies predicate
    fn eat(&mut self, pred: impl FnOnce(u8) -> bool) -> bool {
        match self.peek() {
            Some(byte) if pred(byte) => {
                self.offset += 1;
                true
            }
            _ => false,
        }
    }

    // consume ascii digits, returns number of consumed digits
    fn digits(&mut self) -> usize {
        let start = self.offset;
        while self.eat(|byte| byte.is_ascii_digit()) {}
        self.offset - start
    }

    fn is_empty(&mut self) -> bool {
        self.skip_separators();
        self.peek().is_none()
    }

    fn skip_separators(&mut self) {
        while self.eat(|byte| matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | b',')) {}
    }

    // parse single scalar value from the input
    fn parse_scalar(&mut self) -> Result<Scalar, SvgParserError> {
        self.skip_separators();
        let start = self.offset;
        self.eat(|byte| matches!(byte, b'-' | b'+'));
        let whole = self.digits();
        let frac = if self.eat(|byte| byte == b'.') {
            self.digits()
        } else {
            0
        };
        if whole + frac == 0 {
            self.offset = start;
            return Err(SvgParserError::InvalidScalar);
        }
        // exponent is only consumed if it is followed by digits, `e` might belong to units
        let mantissa_end = self.offset;
        if self.eat(|byte| matches!(byte, b'e' | b'E')) {
            self.eat(|byte| matches!(byte, b'-' | b'+'));
            if self.digits() == 0 {
                self.offset = mantissa_end;
            }
        }
        std::str::from_utf8(&self.input[start..self.offset])
            .ok()
            .and_then(|number| number.parse().ok())
            .ok_or(SvgParserError::InvalidScalar)
    }
}

/// Path parser for SVG encoded path
///
/// See [SVG Path Specification](https://www.w3.org/TR/SVG11/paths.html#PathData)
pub struct SvgPathParser<'a> {
    parser: Parser<'a>,
    // previous operation
    prev_op: Option<u8>,
    // previous command (used to determine smooth points)
    prev_cmd: Option<SvgPathCmd>,
    // current position from which next relative curve will start
    position: Point,
    // current sub-path starting position
    subpath_start: Point,
}

impl<'a> SvgPathParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            parser: Parser::new(input.as_bytes()),
            prev_op: None,
            prev_cmd: None,
            position: Point::new(0.0, 0.0),
            subpath_start: Point::new(0.0, 0.0),
        }
    }

    // parse pair of scalars and convert it to a point
    fn parse_point(&mut self) -> Result<Point, SvgParserError> {
        let point = Point::new(self.parser.parse_scalar()?, self.parser.parse_scalar()?);
        match self.prev_op {
            Some(cmd) if cmd.is_ascii_lowercase() => Ok(point.add(self.position)),
            _ => Ok(point),
        }
    }

    // parse flag `0|1` used by elliptic arc command
    fn parse_flag(&mut self) -> Result<bool, SvgParserError> {
        self.parser.skip_separators();
        match self.parser.bump() {
            Some(b'0') => Ok(false),
            Some(b'1') => Ok(true),
            _ => Err(SvgParserError::InvalidFlag),
        }
    }

    // parse svg command, none indicates end of input
    fn parse_op(&mut self) -> Result<Option<u8>, SvgParserError> {
        let op = match self.parser.peek() {
            None => return Ok(None),
            Some(op) => op,
        };
        match op {
            b'M' | b'm' | b'L' | b'l' | b'V' | b'v' | b'H' | b'h' | b'C' | b'c' | b'S' | b's'
            | b'Q' | b'q' | b'T' | b't' | b'A' | b'a' | b'Z' | b'z' => {
                self.parser.bump();
                // coordinates following move-to are implicit line-to commands
                self.prev_op = match op {
                    b'm' => Some(b'l'),
                    b'M' => Some(b'L'),
                    b'Z' | b'z' => None,
                    _ => Some(op),
                };
                Ok(Some(op))
            }
            _ => match self.prev_op {
                Some(prev) => Ok(Some(prev)),
                None => Err(SvgParserError::InvalidCmd(op)),
            },
        }
    }

    /// Parse single SVG path command from the input
    pub fn parse_cmd(&mut self) -> Result<Option<SvgPathCmd>, SvgParserError> {
        self.parser.skip_separators();
        let op = match self.parse_op()? {
            None => return Ok(None),
            Some(op) => op,
        };
        let cmd = match op {
            b'M' | b'm' => {
                let dst = self.parse_point()?;
                self.subpath_start = dst;
                SvgPathCmd::MoveTo(dst)
            }
            b'L' | b'l' => SvgPathCmd::LineTo(self.parse_point()?),
            b'V' | b'v' => {
                let y = self.parser.parse_scalar()?;
                let p0 = self.position;
                let y = if op == b'v' { p0.y() + y } else { y };
                SvgPathCmd::LineTo(Point::new(p0.x(), y))
            }
            b'H' | b'h' => {
                let x = self.parser.parse_scalar()?;
                let p0 = self.position;
                let x = if op == b'h' { p0.x() + x } else { x };
                SvgPathCmd::LineTo(Point::new(x, p0.y()))
            }
            b'Q' | b'q' => SvgPathCmd::QuadTo(self.parse_point()?, self.parse_point()?),
            b'T' | b't' => {
                let p1 = match self.prev_cmd {
                    Some(SvgPathCmd::QuadTo(p1, p2)) => p2.scale(2.0).sub(p1),
                    _ => self.position,
                };
                let p2 = self.parse_point()?;
                SvgPathCmd::QuadTo(p1, p2)
            }
            b'C' | b'c' => SvgPathCmd::CubicTo(
                self.parse_point()?,
                self.parse_point()?,
                self.parse_point()?,
            ),
            b'S' | b's' => {
                let p1 = match self.prev_cmd {
                    Some(SvgPathCmd::CubicTo(_, p2, p3)) => p3.scale(2.0).sub(p2),
                    _ => self.position,
                };
                let p2 = self.parse_point()?;
                let p3 = self.parse_point()?;
                SvgPathCmd::CubicTo(p1, p2, p3)
            }
            b'A' | b'a' => {
                let rx = self.parser.parse_scalar()?;
                let ry = self.parser.parse_scalar()?;
                let x_axis_rot = self.parser.parse_scalar()?;
                let large = self.parse_flag()?;
                let sweep = self.parse_flag()?;
                let dst = self.parse_point()?;
                SvgPathCmd::ArcTo {
                    radii: Point::new(rx, ry),
                    x_axis_rot,
                    large,
                    sweep,
                    dst,
                }
            }
            b'Z' | b'z' => SvgPathCmd::Close(self.subpath_start),
            _ => return Err(SvgParserError::InvalidCmd(op)),
        };
        self.position = cmd.dst();
        self.prev_cmd = Some(cmd);
        Ok(self.prev_cmd)
    }
}

impl Iterator for SvgPathParser<'_> {
    type Item = Result<SvgPathCmd, SvgParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.parse_cmd().transpose()
    }
}

/// Convert SVG path data into segments with absolute coordinates
///
/// Move-to commands only change the current position. Closing command produces
/// a line back to the start of the sub-path unless the current point is already
/// there. Arcs with a zero radius degrade to lines, and arcs with coinciding
/// endpoints are dropped.
pub fn parse_path_data(data: &str) -> Result<Vec<Segment>, SvgParserError> {
    let mut segments = Vec::new();
    let mut position = Point::new(0.0, 0.0);
    for cmd in SvgPathParser::new(data) {
        let cmd = cmd?;
        let start = position;
        position = cmd.dst();
        let segment = match cmd {
            SvgPathCmd::MoveTo(_) => continue,
            SvgPathCmd::LineTo(end) => Segment::Line { start, end },
            SvgPathCmd::QuadTo(control, end) => Segment::QuadraticBezier {
                start,
                control,
                end,
            },
            SvgPathCmd::CubicTo(control1, control2, end) => Segment::CubicBezier {
                start,
                control1,
                control2,
                end,
            },
            SvgPathCmd::ArcTo {
                radii,
                x_axis_rot,
                large,
                sweep,
                dst,
            } => {
                if start == dst {
                    continue;
                }
                if radii.x() == 0.0 || radii.y() == 0.0 {
                    Segment::Line { start, end: dst }
                } else {
                    Segment::Arc {
                        start,
                        end: dst,
                        radii: Point::new(radii.x().abs(), radii.y().abs()),
                        rotation: x_axis_rot,
                        large_arc: large,
                        sweep,
                    }
                }
            }
            SvgPathCmd::Close(end) => {
                if start == end {
                    continue;
                }
                Segment::Line { start, end }
            }
        };
        segments.push(segment);
    }
    Ok(segments)
}

/// Parse length attribute value, unit suffix is ignored
pub(crate) fn parse_length(text: &str) -> Result<Scalar, SvgParserError> {
    Parser::new(text.as_bytes()).parse_scalar()
}

/// Parse list of points as used by `points` attribute of `polyline` and `polygon`
pub(crate) fn parse_points(text: &str) -> Result<Vec<Point>, SvgParserError> {
    let mut parser = Parser::new(text.as_bytes());
    let mut points = Vec::new();
    while !parser.is_empty() {
        let x = parser.parse_scalar()?;
        let y = parser.parse_scalar()?;
        points.push(Point::new(x, y));
    }
    Ok(points)
}

impl FromStr for ViewBox {
    type Err = SvgParserError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut values = [0i64; 4];
        let mut tokens = text.split_whitespace();
        for value in values.iter_mut() {
            *value = tokens
                .next()
                .and_then(|token| token.parse().ok())
                .ok_or(SvgParserError::InvalidViewBox)?;
        }
        if tokens.next().is_some() {
            return Err(SvgParserError::InvalidViewBox);
        }
        let [x_min, y_min, x_max, y_max] = values;
        Ok(ViewBox::new(x_min, y_min, x_max, y_max))
    }
}

/// Error while parsing path data or view box in the SVG format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SvgParserError {
    /// Failed to parse SVG command
    InvalidCmd(u8),
    /// Failed to parse scalar value
    InvalidScalar,
    /// Failed to parse flag value
    InvalidFlag,
    /// View box is not four whitespace separated integers
    InvalidViewBox,
}

impl fmt::Display for SvgParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SvgParserError::InvalidCmd(byte) => {
                write!(f, "invalid path command {:?}", char::from(*byte))
            }
            SvgParserError::InvalidScalar => write!(f, "invalid number"),
            SvgParserError::InvalidFlag => write!(f, "invalid arc flag"),
            SvgParserError::InvalidViewBox => write!(f, "invalid view box"),
        }
    }
}

impl std::error::Error for SvgParserError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_parse_scalar() -> Result<(), SvgParserError> {
        let mut parser = Parser::new(b"1 .22e0.32 3.21e-3-1.24 1e4 5px");
        assert_approx_eq!(parser.parse_scalar()?, 1.0);
        assert_approx_eq!(parser.parse_scalar()?, 0.22);
        assert_approx_eq!(parser.parse_scalar()?, 0.32);
        assert_approx_eq!(parser.parse_scalar()?, 3.21e-3);
        assert_approx_eq!(parser.parse_scalar()?, -1.24);
        assert_approx_eq!(parser.parse_scalar()?, 1e4);
        assert_approx_eq!(parser.parse_scalar()?, 5.0);
        assert!(parser.parse_scalar().is_err());
        Ok(())
    }

    #[test]
    fn test_parse_cmds() -> Result<(), SvgParserError> {
        let cmds = SvgPathParser::new("M1 2 3 4 h2 v-1 Z")
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(
            cmds,
            vec![
                SvgPathCmd::MoveTo(Point::new(1.0, 2.0)),
                SvgPathCmd::LineTo(Point::new(3.0, 4.0)),
                SvgPathCmd::LineTo(Point::new(5.0, 4.0)),
                SvgPathCmd::LineTo(Point::new(5.0, 3.0)),
                SvgPathCmd::Close(Point::new(1.0, 2.0)),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_parse_relative_and_smooth() -> Result<(), SvgParserError> {
        let segments = parse_path_data("m1,1 c1,1 2,2 3,3 s4,4 5,5 q1,0 1,1 t1,1")?;
        assert_eq!(
            segments,
            vec![
                Segment::cubic((1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)),
                Segment::cubic((4.0, 4.0), (5.0, 5.0), (8.0, 8.0), (9.0, 9.0)),
                Segment::quad((9.0, 9.0), (10.0, 9.0), (10.0, 10.0)),
                Segment::quad((10.0, 10.0), (10.0, 11.0), (11.0, 11.0)),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_parse_close_and_subpaths() -> Result<(), SvgParserError> {
        let segments = parse_path_data("M0 0 L1 0 L1 1 z M5 5 L6 6 L5 5 Z")?;
        assert_eq!(
            segments,
            vec![
                Segment::line((0.0, 0.0), (1.0, 0.0)),
                Segment::line((1.0, 0.0), (1.0, 1.0)),
                Segment::line((1.0, 1.0), (0.0, 0.0)),
                Segment::line((5.0, 5.0), (6.0, 6.0)),
                Segment::line((6.0, 6.0), (5.0, 5.0)),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_parse_arcs() -> Result<(), SvgParserError> {
        let segments = parse_path_data("M0 0 A5 5 0 1 0 10 0 a0 3 0 0 1 0 10 A1 1 0 0 0 10 10")?;
        assert_eq!(segments.len(), 2);
        assert_eq!(
            segments[0],
            Segment::Arc {
                start: Point::new(0.0, 0.0),
                end: Point::new(10.0, 0.0),
                radii: Point::new(5.0, 5.0),
                rotation: 0.0,
                large_arc: true,
                sweep: false,
            }
        );
        assert_eq!(segments[1], Segment::line((10.0, 0.0), (10.0, 10.0)));

        // compact flags
        let segments = parse_path_data("M0 0a5,5 0 01 10,0")?;
        assert!(matches!(segments[0], Segment::Arc { sweep: true, large_arc: false, .. }));
        Ok(())
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_path_data("10 10"), Err(SvgParserError::InvalidCmd(b'1')));
        assert_eq!(parse_path_data("M0 0 L1"), Err(SvgParserError::InvalidScalar));
        assert_eq!(parse_path_data("M0 0 A1 1 0 2 0 1 1"), Err(SvgParserError::InvalidFlag));
        assert_eq!(parse_path_data("M0 0 Z 1 1"), Err(SvgParserError::InvalidCmd(b'1')));
        assert_eq!(parse_path_data(""), Ok(Vec::new()));
    }

    #[test]
    fn test_parse_points() -> Result<(), SvgParserError> {
        let points = parse_points(" 0,0 10,0\n10 10 ")?;
        assert_eq!(
            points,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)]
        );
        assert!(parse_points("0,0 10").is_err());
        assert_approx_eq!(parse_length("12.5px")?, 12.5);
        Ok(())
    }

    #[test]
    fn test_parse_view_box() {
        assert_eq!("0 0 100 50".parse::<ViewBox>(), Ok(ViewBox::new(0, 0, 100, 50)));
        assert_eq!(" -10  5 30 7 ".parse::<ViewBox>(), Ok(ViewBox::new(-10, 5, 30, 7)));
        assert_eq!("bad".parse::<ViewBox>(), Err(SvgParserError::InvalidViewBox));
        assert_eq!("0 0 100".parse::<ViewBox>(), Err(SvgParserError::InvalidViewBox));
        assert_eq!("0 0 100 50 1".parse::<ViewBox>(), Err(SvgParserError::InvalidViewBox));
        assert_eq!("0 0 100.5 50".parse::<ViewBox>(), Err(SvgParserError::InvalidViewBox));
        assert_eq!("0,0,100,50".parse::<ViewBox>(), Err(SvgParserError::InvalidViewBox));
    }
}
