//! 2D point/vector primitive.
//!
//! [`Point`] is a plain value type. Arithmetic mutates the receiver in place
//! and returns `&mut Self` so that scratch points taken from a
//! [`PointPool`](crate::point_pool::PointPool) can be chained without
//! allocating. Conversion to and from flat `f64` coordinate buffers happens
//! explicitly through [`Point::read`] and [`Point::write`].

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default comparison tolerance for floating point coordinates.
pub const TOLERANCE: f64 = 1e-9;

/// Returns true if `a` and `b` differ by less than `tolerance`.
#[inline]
pub fn almost_equal(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

/// A 2D point or vector.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Reads the point stored at pair index `index` of a flat coordinate buffer.
    #[inline]
    pub fn read(buffer: &[f64], index: usize) -> Self {
        Self::new(buffer[index << 1], buffer[(index << 1) + 1])
    }

    /// Writes the point into pair index `index` of a flat coordinate buffer.
    #[inline]
    pub fn write(&self, buffer: &mut [f64], index: usize) {
        buffer[index << 1] = self.x;
        buffer[(index << 1) + 1] = self.y;
    }

    /// Overwrites both coordinates.
    #[inline]
    pub fn set(&mut self, x: f64, y: f64) -> &mut Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Copies coordinates from another point.
    #[inline]
    pub fn update(&mut self, other: Point) -> &mut Self {
        self.x = other.x;
        self.y = other.y;
        self
    }

    /// Translates the point by `other`.
    #[inline]
    pub fn translate(&mut self, other: Point) -> &mut Self {
        self.x += other.x;
        self.y += other.y;
        self
    }

    /// Multiplies both coordinates by `factor`.
    #[inline]
    pub fn scale(&mut self, factor: f64) -> &mut Self {
        self.x *= factor;
        self.y *= factor;
        self
    }

    /// Reverses the vector direction.
    #[inline]
    pub fn reverse(&mut self) -> &mut Self {
        self.x = -self.x;
        self.y = -self.y;
        self
    }

    /// Rotates the point around the origin by a precomputed sine/cosine pair.
    #[inline]
    pub fn rotate(&mut self, sin: f64, cos: f64) -> &mut Self {
        let x = self.x * cos - self.y * sin;
        let y = self.x * sin + self.y * cos;
        self.x = x;
        self.y = y;
        self
    }

    /// Turns the vector into its right-hand normal `(y, -x)`.
    #[inline]
    pub fn normal(&mut self) -> &mut Self {
        let x = self.x;
        self.x = self.y;
        self.y = -x;
        self
    }

    /// Scales the vector to unit length. Zero vectors are left untouched.
    #[inline]
    pub fn normalize(&mut self) -> &mut Self {
        let length_squared = self.length_squared();
        if length_squared == 1.0 || length_squared == 0.0 {
            return self;
        }
        self.scale(1.0 / length_squared.sqrt())
    }

    /// Dot product.
    #[inline]
    pub fn dot(&self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Cross product (z component of the 3D cross product).
    #[inline]
    pub fn cross(&self, other: Point) -> f64 {
        self.y * other.x - self.x * other.y
    }

    /// Squared vector length.
    #[inline]
    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Vector length.
    #[inline]
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Returns true if both coordinates are within `tolerance` of `other`.
    #[inline]
    pub fn almost_equal(&self, other: Point, tolerance: f64) -> bool {
        almost_equal(self.x, other.x, tolerance) && almost_equal(self.y, other.y, tolerance)
    }

    /// Returns true if the point lies strictly inside segment `a`-`b`,
    /// excluding both end points.
    pub fn on_segment(&self, a: Point, b: Point) -> bool {
        let p = *self;

        // vertical segment
        if almost_equal(a.x, b.x, TOLERANCE) && almost_equal(p.x, a.x, TOLERANCE) {
            return !almost_equal(p.y, b.y, TOLERANCE)
                && !almost_equal(p.y, a.y, TOLERANCE)
                && p.y < a.y.max(b.y)
                && p.y > a.y.min(b.y);
        }

        // horizontal segment
        if almost_equal(a.y, b.y, TOLERANCE) && almost_equal(p.y, a.y, TOLERANCE) {
            return !almost_equal(p.x, b.x, TOLERANCE)
                && !almost_equal(p.x, a.x, TOLERANCE)
                && p.x < a.x.max(b.x)
                && p.x > a.x.min(b.x);
        }

        if (p.x < a.x && p.x < b.x)
            || (p.x > a.x && p.x > b.x)
            || (p.y < a.y && p.y < b.y)
            || (p.y > a.y && p.y > b.y)
        {
            return false;
        }

        if p.almost_equal(a, TOLERANCE) || p.almost_equal(b, TOLERANCE) {
            return false;
        }

        let cross = (p.y - a.y) * (b.x - a.x) - (p.x - a.x) * (b.y - a.y);
        if cross.abs() > TOLERANCE {
            return false;
        }

        let dot = (p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y);
        if dot < 0.0 || almost_equal(dot, 0.0, TOLERANCE) {
            return false;
        }

        let len2 = (b.x - a.x) * (b.x - a.x) + (b.y - a.y) * (b.y - a.y);
        !(dot > len2 || almost_equal(dot, len2, TOLERANCE))
    }

    /// Converts to a tuple.
    #[inline]
    pub fn to_tuple(self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// Intersection of segments `a`-`b` and `e`-`f`.
///
/// With `infinite` set, the segments are treated as infinite lines. Returns
/// `None` for parallel lines or when the intersection lies outside either
/// segment.
pub fn line_intersect(a: Point, b: Point, e: Point, f: Point, infinite: bool) -> Option<Point> {
    let a1 = b.y - a.y;
    let b1 = a.x - b.x;
    let c1 = b.x * a.y - a.x * b.y;
    let a2 = f.y - e.y;
    let b2 = e.x - f.x;
    let c2 = f.x * e.y - e.x * f.y;

    let denom = a1 * b2 - a2 * b1;
    let x = (b1 * c2 - b2 * c1) / denom;
    let y = (a2 * c1 - a1 * c2) / denom;

    if !x.is_finite() || !y.is_finite() {
        return None;
    }

    if !infinite {
        let outside = |lo: f64, hi: f64, v: f64| {
            (lo - hi).abs() > TOLERANCE && if lo < hi { v < lo || v > hi } else { v > lo || v < hi }
        };
        if outside(a.x, b.x, x) || outside(a.y, b.y, y) || outside(e.x, f.x, x) || outside(e.y, f.y, y)
        {
            return None;
        }
    }

    Some(Point::new(x, y))
}
