//! Integer polygon clipping.
//!
//! A Vatti sweep over an arena of edges: paths are split into bounds that
//! start at local minima, the sweep walks scanbeams from the largest Y down,
//! and output rings are collected as linked point records that are joined,
//! split and cleaned once the sweep is done.
//!
//! All coordinates are integers. Floating point polygons are scaled with
//! [`to_path`] and restored with [`to_polygon`], rounding half away from zero.

mod edge;
mod engine;
mod output;

pub use engine::ClippingEngine;

use polynest_core::{Point, Polygon};

/// Integer coordinate used by the sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IntPoint {
    pub x: i64,
    pub y: i64,
}

impl IntPoint {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

pub type Path = Vec<IntPoint>;
pub type Paths = Vec<Path>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipType {
    Intersection,
    Union,
    Difference,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyType {
    Subject,
    Clip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyFillType {
    EvenOdd,
    NonZero,
    Positive,
    Negative,
}

/// Largest magnitude for which slope products fit in an `i64`.
pub const LO_RANGE: i64 = 47_453_132;
/// Largest accepted coordinate magnitude.
pub const HI_RANGE: i64 = 4_503_599_627_370_495;

/// Rounds half away from zero.
#[inline]
pub fn clipper_round(value: f64) -> i64 {
    if value < 0.0 {
        (value - 0.5) as i64
    } else {
        (value + 0.5) as i64
    }
}

/// Signed area of an integer path; positive for counter-clockwise loops in
/// y-up coordinates.
pub fn area(path: &[IntPoint]) -> f64 {
    let n = path.len();
    if n < 3 {
        return 0.0;
    }
    let mut a = 0.0;
    let mut j = n - 1;
    for i in 0..n {
        a += (path[j].x as f64 + path[i].x as f64) * (path[j].y as f64 - path[i].y as f64);
        j = i;
    }
    -a * 0.5
}

/// True for a non-negative [`area`].
pub fn orientation(path: &[IntPoint]) -> bool {
    area(path) >= 0.0
}

pub fn reverse_paths(paths: &mut Paths) {
    for path in paths.iter_mut() {
        path.reverse();
    }
}

/// Splits self-touching and self-intersecting regions of `path` into simple
/// polygons by unioning it with itself in strictly simple mode.
pub fn simplify_polygon(path: &[IntPoint], fill: PolyFillType) -> Paths {
    let mut clipper = ClippingEngine::new();
    clipper.set_strictly_simple(true);
    if !clipper.add_path(path, PolyType::Subject) {
        return Paths::new();
    }
    clipper
        .execute_with(ClipType::Union, fill, fill)
        .unwrap_or_default()
}

/// Removes vertices closer than `distance` to a neighbour or to the line
/// through their neighbours. Returns an empty path when fewer than three
/// vertices survive.
pub fn clean_polygon(path: &[IntPoint], distance: f64) -> Path {
    let size = path.len();
    if size == 0 {
        return Path::new();
    }

    let mut next: Vec<usize> = (0..size).map(|i| (i + 1) % size).collect();
    let mut prev: Vec<usize> = (0..size).map(|i| (i + size - 1) % size).collect();
    let mut visited = vec![false; size];
    let mut remaining = size;

    let exclude = |op: usize, next: &mut Vec<usize>, prev: &mut Vec<usize>, visited: &mut Vec<bool>| {
        let result = prev[op];
        next[result] = next[op];
        prev[next[op]] = result;
        visited[result] = false;
        result
    };

    let dist_sqrd = distance * distance;
    let mut op = 0;
    while !visited[op] && next[op] != prev[op] {
        let (p, pp, pn) = (path[op], path[prev[op]], path[next[op]]);
        if points_are_close(p, pp, dist_sqrd) {
            op = exclude(op, &mut next, &mut prev, &mut visited);
            remaining -= 1;
        } else if points_are_close(pp, pn, dist_sqrd) {
            let after = next[op];
            exclude(after, &mut next, &mut prev, &mut visited);
            op = exclude(op, &mut next, &mut prev, &mut visited);
            remaining = remaining.saturating_sub(2);
        } else if slopes_near_collinear(pp, p, pn, dist_sqrd) {
            op = exclude(op, &mut next, &mut prev, &mut visited);
            remaining -= 1;
        } else {
            visited[op] = true;
            op = next[op];
        }
    }

    if remaining < 3 {
        return Path::new();
    }
    let mut out = Path::with_capacity(remaining);
    for _ in 0..remaining {
        out.push(path[op]);
        op = next[op];
    }
    out
}

fn points_are_close(a: IntPoint, b: IntPoint, dist_sqrd: f64) -> bool {
    let dx = a.x as f64 - b.x as f64;
    let dy = a.y as f64 - b.y as f64;
    dx * dx + dy * dy <= dist_sqrd
}

fn distance_from_line_sqrd(pt: IntPoint, ln1: IntPoint, ln2: IntPoint) -> f64 {
    let a = (ln1.y - ln2.y) as f64;
    let b = (ln2.x - ln1.x) as f64;
    let c = a * ln1.x as f64 + b * ln1.y as f64;
    let c = a * pt.x as f64 + b * pt.y as f64 - c;
    (c * c) / (a * a + b * b)
}

/// Tests the point lying geometrically between the other two, which makes
/// spikes easier to catch.
fn slopes_near_collinear(pt1: IntPoint, pt2: IntPoint, pt3: IntPoint, dist_sqrd: f64) -> bool {
    if (pt1.x - pt2.x).abs() > (pt1.y - pt2.y).abs() {
        if (pt1.x > pt2.x) == (pt1.x < pt3.x) {
            distance_from_line_sqrd(pt1, pt2, pt3) < dist_sqrd
        } else if (pt2.x > pt1.x) == (pt2.x < pt3.x) {
            distance_from_line_sqrd(pt2, pt1, pt3) < dist_sqrd
        } else {
            distance_from_line_sqrd(pt3, pt1, pt2) < dist_sqrd
        }
    } else if (pt1.y > pt2.y) == (pt1.y < pt3.y) {
        distance_from_line_sqrd(pt1, pt2, pt3) < dist_sqrd
    } else if (pt2.y > pt1.y) == (pt2.y < pt3.y) {
        distance_from_line_sqrd(pt2, pt1, pt3) < dist_sqrd
    } else {
        distance_from_line_sqrd(pt3, pt1, pt2) < dist_sqrd
    }
}

/// Scales a polygon onto the integer grid.
pub fn to_path(points: &[Point], scale: f64) -> Path {
    points
        .iter()
        .map(|p| IntPoint::new(clipper_round(p.x * scale), clipper_round(p.y * scale)))
        .collect()
}

/// Scales an integer path back to a polygon.
pub fn to_polygon(path: &[IntPoint], scale: f64) -> Polygon {
    Polygon::new(
        path.iter()
            .map(|p| Point::new(p.x as f64 / scale, p.y as f64 / scale))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(x: i64, y: i64) -> IntPoint {
        IntPoint::new(x, y)
    }

    fn square(x: i64, y: i64, size: i64) -> Path {
        vec![ip(x, y), ip(x + size, y), ip(x + size, y + size), ip(x, y + size)]
    }

    #[test]
    fn test_clipper_round_half_away_from_zero() {
        assert_eq!(clipper_round(2.5), 3);
        assert_eq!(clipper_round(-2.5), -3);
        assert_eq!(clipper_round(2.4999), 2);
        assert_eq!(clipper_round(-0.4), 0);
        assert_eq!(clipper_round(0.0), 0);
    }

    #[test]
    fn test_area_and_orientation() {
        let sq = square(0, 0, 10);
        assert_eq!(area(&sq), 100.0);
        assert!(orientation(&sq));
        let mut rev = sq.clone();
        rev.reverse();
        assert_eq!(area(&rev), -100.0);
        assert!(!orientation(&rev));
        assert_eq!(area(&sq[..2]), 0.0);
    }

    #[test]
    fn test_clean_polygon_drops_collinear_and_close_points() {
        let path = vec![
            ip(0, 0),
            ip(5, 0),
            ip(10, 0),
            ip(10, 10),
            ip(10, 10),
            ip(0, 10),
        ];
        let cleaned = clean_polygon(&path, 1.415);
        assert_eq!(cleaned.len(), 4);
        assert_eq!(area(&cleaned).abs(), 100.0);
    }

    #[test]
    fn test_clean_polygon_collapses_degenerate() {
        let path = vec![ip(0, 0), ip(1, 0), ip(0, 1)];
        assert!(clean_polygon(&path, 5.0).is_empty());
        assert!(clean_polygon(&[], 1.0).is_empty());
    }

    #[test]
    fn test_simplify_bowtie() {
        let bowtie = vec![ip(0, 0), ip(10, 10), ip(10, 0), ip(0, 10)];
        let parts = simplify_polygon(&bowtie, PolyFillType::NonZero);
        assert_eq!(parts.len(), 2);
        let total: f64 = parts.iter().map(|p| area(p).abs()).sum();
        assert_eq!(total, 50.0);
    }

    #[test]
    fn test_scaling_round_trip() {
        let poly = Polygon::from_tuples(&[(0.1, 0.2), (3.25, 0.0), (1.0, 4.5)]);
        let path = to_path(poly.points(), 100.0);
        assert_eq!(path[0], ip(10, 20));
        assert_eq!(path[1], ip(325, 0));
        let back = to_polygon(&path, 100.0);
        assert_eq!(back, poly);
    }
}
