//! Axis-aligned bounding rectangle.

use crate::point::Point;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle stored as position and size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundRect {
    position: Point,
    size: Point,
}

impl BoundRect {
    /// Creates a rectangle from its minimum corner and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            position: Point::new(x, y),
            size: Point::new(width, height),
        }
    }

    /// Computes the bounds of a point set. Returns an empty rectangle for no points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::default();
        };

        let (mut min, mut max) = (*first, *first);
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }

        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Overwrites position and size in place.
    pub fn update(&mut self, position: Point, size: Point) -> &mut Self {
        self.position = position;
        self.size = size;
        self
    }

    /// Minimum corner.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Width and height as a vector.
    pub fn size(&self) -> Point {
        self.size
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn width(&self) -> f64 {
        self.size.x
    }

    pub fn height(&self) -> f64 {
        self.size.y
    }

    /// Maximum x coordinate.
    pub fn right(&self) -> f64 {
        self.position.x + self.size.x
    }

    /// Maximum y coordinate.
    pub fn bottom(&self) -> f64 {
        self.position.y + self.size.y
    }

    pub fn area(&self) -> f64 {
        self.size.x * self.size.y
    }

    /// Returns true if a rectangle of this size fits strictly inside `other`'s size.
    pub fn fits_inside(&self, other: &BoundRect) -> bool {
        self.size.x < other.size.x && self.size.y < other.size.y
    }

    /// Grows the rectangle to include `point`.
    pub fn expand(&mut self, point: Point) -> &mut Self {
        let min_x = self.position.x.min(point.x);
        let min_y = self.position.y.min(point.y);
        let max_x = self.right().max(point.x);
        let max_y = self.bottom().max(point.y);
        self.update(
            Point::new(min_x, min_y),
            Point::new(max_x - min_x, max_y - min_y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let points = [Point::new(1.0, 5.0), Point::new(-2.0, 3.0), Point::new(4.0, -1.0)];
        let rect = BoundRect::from_points(&points);
        assert_eq!(rect, BoundRect::new(-2.0, -1.0, 6.0, 6.0));
        assert_eq!(rect.right(), 4.0);
        assert_eq!(rect.bottom(), 5.0);
    }

    #[test]
    fn test_fits_inside_is_strict() {
        let bin = BoundRect::new(0.0, 0.0, 10.0, 10.0);
        assert!(BoundRect::new(3.0, 3.0, 9.0, 9.0).fits_inside(&bin));
        assert!(!BoundRect::new(0.0, 0.0, 10.0, 5.0).fits_inside(&bin));
    }

    #[test]
    fn test_expand() {
        let mut rect = BoundRect::new(0.0, 0.0, 1.0, 1.0);
        rect.expand(Point::new(3.0, -2.0));
        assert_eq!(rect, BoundRect::new(0.0, -2.0, 3.0, 3.0));
    }
}
