use crate::{PI, Point, Scalar, Segment};

/// Elliptic arc in the center parametrization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipArc {
    /// center of the ellipse
    center: Point,
    /// radius along x-axis before the rotation
    rx: Scalar,
    /// radius along y-axis before the rotation
    ry: Scalar,
    /// rotation in radians
    phi: Scalar,
    /// angular start
    eta: Scalar,
    /// angular size
    eta_delta: Scalar,
}

impl EllipArc {
    /// Convert arc from SVG arguments to parametric curve
    ///
    /// See [Arc implementation notes](https://www.w3.org/TR/SVG/implnote.html#ArcImplementationNotes)
    pub fn new_param(
        src: Point,
        dst: Point,
        radii: Point,
        x_axis_rot: Scalar,
        large_flag: bool,
        sweep_flag: bool,
    ) -> Option<Self> {
        let rx = radii.x().abs();
        let ry = radii.y().abs();
        if rx == 0.0 || ry == 0.0 {
            return None;
        }
        let phi = x_axis_rot * PI / 180.0;

        // Eq 5.1
        let p1 = src.sub(dst).scale(0.5).rotate(-phi);
        let (x1, y1) = (p1.x(), p1.y());
        // scale up radii that are too small to reach the destination
        let s = (x1 / rx).powi(2) + (y1 / ry).powi(2);
        let (rx, ry) = if s > 1.0 {
            let s = s.sqrt();
            (rx * s, ry * s)
        } else {
            (rx, ry)
        };
        // Eq 5.2
        let sq = ((rx * ry).powi(2) / ((rx * y1).powi(2) + (ry * x1).powi(2)) - 1.0)
            .max(0.0)
            .sqrt();
        let sq = if large_flag == sweep_flag { -sq } else { sq };
        let (cx, cy) = (sq * rx * y1 / ry, -sq * ry * x1 / rx);
        // Eq 5.3
        let center = Point::new(cx, cy)
            .rotate(phi)
            .add(src.add(dst).scale(0.5));
        // Eq 5.5-6
        let v0 = Point::new(1.0, 0.0);
        let v1 = Point::new((x1 - cx) / rx, (y1 - cy) / ry);
        let v2 = Point::new((-x1 - cx) / rx, (-y1 - cy) / ry);
        let eta = v0.angle_between(v1)?;
        let eta_delta = v1.angle_between(v2)?.rem_euclid(2.0 * PI);
        let eta_delta = if !sweep_flag && eta_delta > 0.0 {
            eta_delta - 2.0 * PI
        } else if sweep_flag && eta_delta < 0.0 {
            eta_delta + 2.0 * PI
        } else {
            eta_delta
        };

        Some(Self {
            center,
            rx,
            ry,
            phi,
            eta,
            eta_delta,
        })
    }

    /// Build parametric arc from an arc segment
    pub fn from_segment(segment: &Segment) -> Option<Self> {
        match *segment {
            Segment::Arc {
                start,
                end,
                radii,
                rotation,
                large_arc,
                sweep,
            } => Self::new_param(start, end, radii, rotation, large_arc, sweep),
            _ => None,
        }
    }

    pub fn center(&self) -> Point {
        self.center
    }

    /// Point of the arc at parameter `t` in `[0, 1]`
    pub fn at(&self, t: Scalar) -> Point {
        let (angle_sin, angle_cos) = (self.eta + t * self.eta_delta).sin_cos();
        Point::new(self.rx * angle_cos, self.ry * angle_sin)
            .rotate(self.phi)
            .add(self.center)
    }

    /// Approximate arc with `count` line segments, returns `count + 1` points
    pub fn flatten(&self, count: usize) -> impl Iterator<Item = Point> + '_ {
        let count = count.max(1);
        (0..=count).map(move |index| self.at(index as Scalar / count as Scalar))
    }
}
