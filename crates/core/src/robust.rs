//! Robust orientation predicates.
//!
//! Wraps Shewchuk's adaptive precision `orient2d` from the `robust` crate
//! behind a fast floating-point filter. Used where a sign decision must not
//! flip under rounding, such as stripping collinear vertices from traced
//! no-fit polygon loops.
//!
//! ## References
//!
//! - Shewchuk, J.R. (1997). "Adaptive Precision Floating-Point Arithmetic and
//!   Fast Robust Predicates for Computational Geometry"

use crate::point::Point;
use robust::{orient2d as robust_orient2d, Coord};

/// Result of an orientation test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Points are arranged counter-clockwise (left turn).
    CounterClockwise,
    /// Points are arranged clockwise (right turn).
    Clockwise,
    /// Points are collinear.
    Collinear,
}

impl Orientation {
    /// Returns true if the orientation is counter-clockwise.
    #[inline]
    pub fn is_ccw(self) -> bool {
        matches!(self, Orientation::CounterClockwise)
    }

    /// Returns true if the orientation is clockwise.
    #[inline]
    pub fn is_cw(self) -> bool {
        matches!(self, Orientation::Clockwise)
    }

    /// Returns true if the points are collinear.
    #[inline]
    pub fn is_collinear(self) -> bool {
        matches!(self, Orientation::Collinear)
    }

    fn from_determinant(det: f64) -> Self {
        if det > 0.0 {
            Orientation::CounterClockwise
        } else if det < 0.0 {
            Orientation::Clockwise
        } else {
            Orientation::Collinear
        }
    }
}

/// Exact orientation of `pc` relative to the directed line `pa` -> `pb`.
#[inline]
pub fn orient2d(pa: Point, pb: Point, pc: Point) -> Orientation {
    Orientation::from_determinant(robust_orient2d(
        Coord { x: pa.x, y: pa.y },
        Coord { x: pb.x, y: pb.y },
        Coord { x: pc.x, y: pc.y },
    ))
}

/// Relative error bound under which the fast determinant is trusted.
const FILTER_EPSILON: f64 = 1e-12;

/// Orientation test that only falls back to exact arithmetic near zero.
#[inline]
pub fn orient2d_filtered(pa: Point, pb: Point, pc: Point) -> Orientation {
    let acx = pa.x - pc.x;
    let bcx = pb.x - pc.x;
    let acy = pa.y - pc.y;
    let bcy = pb.y - pc.y;

    let det = acx * bcy - acy * bcx;
    let det_sum = (acx * bcy).abs() + (acy * bcx).abs();

    if det.abs() > FILTER_EPSILON * det_sum {
        return Orientation::from_determinant(det);
    }

    orient2d(pa, pb, pc)
}

/// Removes consecutive duplicates and exactly collinear vertices from a closed loop.
///
/// Returns the input unchanged when fewer than three vertices would remain.
pub fn strip_collinear(points: &[Point]) -> Vec<Point> {
    let mut result: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if result.last().map_or(true, |last| *last != p) {
            result.push(p);
        }
    }
    while result.len() > 1 && result.first() == result.last() {
        result.pop();
    }

    let mut changed = true;
    while changed && result.len() > 3 {
        changed = false;
        let n = result.len();
        for i in 0..n {
            let prev = result[(i + n - 1) % n];
            let next = result[(i + 1) % n];
            if orient2d_filtered(prev, result[i], next).is_collinear() {
                result.remove(i);
                changed = true;
                break;
            }
        }
    }

    if result.len() < 3 {
        return points.to_vec();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orient2d_basic() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(1.0, 0.0);
        assert_eq!(orient2d(a, b, Point::new(0.5, 1.0)), Orientation::CounterClockwise);
        assert_eq!(orient2d(a, b, Point::new(0.5, -1.0)), Orientation::Clockwise);
        assert_eq!(orient2d(a, b, Point::new(2.0, 0.0)), Orientation::Collinear);
    }

    #[test]
    fn test_filtered_near_degenerate() {
        // tiny perturbation that a naive determinant may get wrong
        let a = Point::new(0.5, 0.5);
        let b = Point::new(12.0, 12.0);
        let c = Point::new(24.0, 24.0 + 1e-13);
        assert_eq!(orient2d_filtered(a, b, c), orient2d(a, b, c));
    }

    #[test]
    fn test_strip_collinear() {
        let loop_points = [
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(0.0, 0.0),
        ];
        let stripped = strip_collinear(&loop_points);
        assert_eq!(stripped.len(), 4);
        assert!(!stripped.contains(&Point::new(5.0, 0.0)));
    }
}
