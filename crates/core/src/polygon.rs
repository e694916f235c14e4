//! Polygon over an owned point buffer.
//!
//! The loop is implicit: the last point connects back to the first. Signed
//! area follows the y-down screen convention, so a negative area is the
//! canonical (clockwise on screen) winding.

use crate::bound_rect::BoundRect;
use crate::point::{almost_equal, Point, TOLERANCE};
use crate::rotation::RotationTable;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An ordered point loop with cached bounds.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polygon {
    points: Vec<Point>,
    bounds: BoundRect,
    closed: bool,
}

impl Polygon {
    /// Creates a closed polygon.
    pub fn new(points: Vec<Point>) -> Self {
        let bounds = BoundRect::from_points(&points);
        Self {
            points,
            bounds,
            closed: true,
        }
    }

    /// Creates an open polyline.
    pub fn open(points: Vec<Point>) -> Self {
        Self {
            closed: false,
            ..Self::new(points)
        }
    }

    /// Creates a closed polygon from `(x, y)` tuples.
    pub fn from_tuples(points: &[(f64, f64)]) -> Self {
        Self::new(points.iter().map(|&p| Point::from(p)).collect())
    }

    /// Creates a closed polygon from interleaved `x, y` coordinates.
    pub fn from_flat(coords: &[f64]) -> Self {
        Self::new((0..coords.len() / 2).map(|i| Point::read(coords, i)).collect())
    }

    /// Axis-aligned rectangle with its minimum corner at `(x, y)`.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(vec![
            Point::new(x, y),
            Point::new(x + width, y),
            Point::new(x + width, y + height),
            Point::new(x, y + height),
        ])
    }

    /// Interleaved `x, y` coordinates.
    pub fn to_flat(&self) -> Vec<f64> {
        let mut coords = vec![0.0; self.points.len() * 2];
        for (i, p) in self.points.iter().enumerate() {
            p.write(&mut coords, i);
        }
        coords
    }

    /// Replaces the point buffer and recomputes the bounds.
    pub fn bind(&mut self, points: Vec<Point>) {
        self.points = points;
        self.update_bounds();
    }

    fn update_bounds(&mut self) {
        self.bounds = BoundRect::from_points(&self.points);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Consumes the polygon, returning its points.
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// Point at `index`, wrapping around the loop.
    pub fn point(&self, index: usize) -> Point {
        self.points[index % self.points.len()]
    }

    /// Point at `index`, `None` when out of range.
    pub fn get(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    /// First point of the loop (the reference point for placement).
    pub fn first(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn bounds(&self) -> &BoundRect {
        &self.bounds
    }

    /// Signed area; negative for the canonical winding.
    pub fn area(&self) -> f64 {
        signed_area(&self.points)
    }

    pub fn abs_area(&self) -> f64 {
        self.area().abs()
    }

    /// Point-in-polygon test. `None` when the point lies on a vertex or edge.
    pub fn contains(&self, point: Point) -> Option<bool> {
        point_in_polygon(point, &self.points, Point::default())
    }

    /// Returns true if every vertex lies on the bounding box outline.
    pub fn is_rectangle(&self, tolerance: f64) -> bool {
        if self.points.len() < 4 {
            return false;
        }
        let b = self.bounds;
        self.points.iter().all(|p| {
            (almost_equal(p.x, b.x(), tolerance) || almost_equal(p.x, b.right(), tolerance))
                && (almost_equal(p.y, b.y(), tolerance) || almost_equal(p.y, b.bottom(), tolerance))
        })
    }

    /// Translates every point.
    pub fn translate(&mut self, offset: Point) -> &mut Self {
        for p in &mut self.points {
            p.translate(offset);
        }
        self.update_bounds();
        self
    }

    /// Rotates around the origin by `angle` degrees.
    pub fn rotate(&mut self, table: &RotationTable, angle: f64) -> &mut Self {
        if angle != 0.0 {
            let (sin, cos) = table.sin_cos(angle);
            for p in &mut self.points {
                p.rotate(sin, cos);
            }
            self.update_bounds();
        }
        self
    }

    /// Returns a rotated copy.
    pub fn rotated(&self, table: &RotationTable, angle: f64) -> Self {
        let mut copy = self.clone();
        copy.rotate(table, angle);
        copy
    }

    /// Reverses the winding.
    pub fn reverse(&mut self) -> &mut Self {
        self.points.reverse();
        self
    }

    /// Removes the closing duplicate and consecutive duplicates, then forces
    /// the canonical (negative area) winding.
    ///
    /// Returns false if fewer than three points remain.
    pub fn normalize(&mut self) -> bool {
        let mut points: Vec<Point> = Vec::with_capacity(self.points.len());
        for &p in &self.points {
            if points.last().map_or(true, |last| !last.almost_equal(p, TOLERANCE)) {
                points.push(p);
            }
        }
        while points.len() > 1 && points[0].almost_equal(points[points.len() - 1], TOLERANCE) {
            points.pop();
        }

        self.bind(points);
        if self.area() > 0.0 {
            self.reverse();
        }

        self.points.len() >= 3
    }
}

/// Signed area of a point loop (negative = canonical winding).
pub fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    let mut j = n - 1;
    for i in 0..n {
        area += (points[j].x + points[i].x) * (points[j].y - points[i].y);
        j = i;
    }
    0.5 * area
}

/// Ray-casting point-in-polygon with the loop translated by `offset`.
///
/// Returns `None` when the point sits exactly on a vertex or an edge.
pub fn point_in_polygon(point: Point, points: &[Point], offset: Point) -> Option<bool> {
    let n = points.len();
    if n < 3 {
        return None;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = points[i] + offset;
        let pj = points[j] + offset;
        j = i;

        if pi.almost_equal(point, TOLERANCE) || point.on_segment(pi, pj) {
            return None;
        }
        if pi.almost_equal(pj, TOLERANCE) {
            continue;
        }

        let crosses = (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
        if crosses {
            inside = !inside;
        }
    }

    Some(inside)
}
