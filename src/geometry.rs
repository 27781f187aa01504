use std::{
    fmt,
    ops::{Add, Mul, Sub},
};

pub type Scalar = f64;
pub const EPSILON: f64 = f64::EPSILON;
pub const PI: f64 = std::f64::consts::PI;

/// Format floats in a compact way suitable for SVG path
pub fn scalar_fmt(f: &mut fmt::Formatter<'_>, value: Scalar) -> fmt::Result {
    let value_abs = value.abs();
    if value_abs.fract() < EPSILON {
        write!(f, "{}", value.trunc() as i64)
    } else if value_abs > 9999.0 || value_abs <= 0.0001 {
        write!(f, "{:.3e}", value)
    } else {
        let ten: Scalar = 10.0;
        let round = ten.powi(6 - (value_abs.trunc() + 1.0).log10().ceil() as i32);
        write!(f, "{}", (value * round).round() / round)
    }
}

/// Endpoints a control point belongs to.
///
/// Owners are stored as indices into the endpoint sequence of the
/// [`DocumentGeometry`](crate::DocumentGeometry) that produced the point,
/// endpoints are never mutated after extraction so indices stay valid for
/// the lifetime of the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Owners {
    #[default]
    None,
    One(usize),
    Two(usize, usize),
}

impl Owners {
    pub fn len(&self) -> usize {
        match self {
            Owners::None => 0,
            Owners::One(_) => 1,
            Owners::Two(_, _) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Owners::None)
    }

    /// Iterate over endpoint indices
    pub fn iter(self) -> impl Iterator<Item = usize> {
        let pair = match self {
            Owners::None => [None, None],
            Owners::One(index) => [Some(index), None],
            Owners::Two(first, second) => [Some(first), Some(second)],
        };
        pair.into_iter().flatten()
    }
}

/// Value representing a 2D point or vector, optionally tagged with the
/// endpoints it belongs to.
///
/// Equality only looks at coordinates and is exact, owners are ignored.
#[derive(Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    x: Scalar,
    y: Scalar,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Owners::is_empty")
    )]
    owners: Owners,
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        scalar_fmt(f, self.x)?;
        write!(f, ",")?;
        scalar_fmt(f, self.y)?;
        if !self.owners.is_empty() {
            write!(f, "@{:?}", self.owners.iter().collect::<Vec<_>>())?;
        }
        Ok(())
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Point {
    #[inline]
    pub fn new(x: Scalar, y: Scalar) -> Self {
        Self {
            x,
            y,
            owners: Owners::None,
        }
    }

    /// Get `x` component of the point
    #[inline]
    pub fn x(&self) -> Scalar {
        self.x
    }

    /// Get `y` component of the point
    #[inline]
    pub fn y(&self) -> Scalar {
        self.y
    }

    #[inline]
    pub fn owners(&self) -> Owners {
        self.owners
    }

    /// Same coordinates with a different owner set
    #[inline]
    pub fn with_owners(self, owners: Owners) -> Self {
        Self { owners, ..self }
    }

    /// Component-wise sum, owners of `self` are kept
    #[inline]
    pub fn add(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            owners: self.owners,
        }
    }

    /// Component-wise difference, owners of `self` are kept
    #[inline]
    pub fn sub(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            owners: self.owners,
        }
    }

    /// Add the same value to both components
    #[inline]
    pub fn add_scalar(self, value: Scalar) -> Self {
        Self {
            x: self.x + value,
            y: self.y + value,
            owners: self.owners,
        }
    }

    /// Subtract the same value from both components
    #[inline]
    pub fn sub_scalar(self, value: Scalar) -> Self {
        Self {
            x: self.x - value,
            y: self.y - value,
            owners: self.owners,
        }
    }

    /// Multiply both components by `factor`, owners of `self` are kept
    #[inline]
    pub fn scale(self, factor: Scalar) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            owners: self.owners,
        }
    }

    /// Get length of the vector (distance from the origin)
    pub fn length(self) -> Scalar {
        self.x.hypot(self.y)
    }

    /// Distance between two points
    pub fn dist(self, other: Self) -> Scalar {
        self.sub(other).length()
    }

    /// Dot product of two vectors
    pub fn dot(self, other: Self) -> Scalar {
        self.x * other.x + self.y * other.y
    }

    /// Cross product of two vectors
    pub fn cross(self, other: Self) -> Scalar {
        self.x * other.y - self.y * other.x
    }

    /// Rotate vector around the origin by `angle` radians, owners of `self` are kept
    pub fn rotate(self, angle: Scalar) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
            owners: self.owners,
        }
    }

    /// Signed angle (from self to the other) between two vectors
    pub fn angle_between(self, other: Self) -> Option<Scalar> {
        let lengths = self.length() * other.length();
        if lengths < EPSILON {
            return None;
        }
        let angle = (self.dot(other) / lengths).clamp(-1.0, 1.0).acos();
        if self.cross(other) < 0.0 {
            Some(-angle)
        } else {
            Some(angle)
        }
    }
}

impl From<(Scalar, Scalar)> for Point {
    #[inline]
    fn from(xy: (Scalar, Scalar)) -> Self {
        Self::new(xy.0, xy.1)
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, other: Point) -> Self::Output {
        Point::add(self, other)
    }
}

impl Add<Scalar> for Point {
    type Output = Point;

    #[inline]
    fn add(self, other: Scalar) -> Self::Output {
        self.add_scalar(other)
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, other: Point) -> Self::Output {
        Point::sub(self, other)
    }
}

impl Sub<Scalar> for Point {
    type Output = Point;

    #[inline]
    fn sub(self, other: Scalar) -> Self::Output {
        self.sub_scalar(other)
    }
}

impl Mul<Scalar> for Point {
    type Output = Point;

    #[inline]
    fn mul(self, factor: Scalar) -> Self::Output {
        self.scale(factor)
    }
}

impl Mul<Point> for Scalar {
    type Output = Point;

    #[inline]
    fn mul(self, other: Point) -> Self::Output {
        other.scale(self)
    }
}

/// Coordinate rectangle declared by the `viewBox` attribute of the document.
///
/// Values are read as `xmin ymin xmax ymax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewBox {
    pub x_min: i64,
    pub y_min: i64,
    pub x_max: i64,
    pub y_max: i64,
}

impl ViewBox {
    pub fn new(x_min: i64, y_min: i64, x_max: i64, y_max: i64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> Scalar {
        (self.x_max - self.x_min) as Scalar
    }

    pub fn height(&self) -> Scalar {
        (self.y_max - self.y_min) as Scalar
    }

    /// Top-left corner
    pub fn min(&self) -> Point {
        Point::new(self.x_min as Scalar, self.y_min as Scalar)
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}
