//! Polygon offsetting on the integer grid.
//!
//! The offset contour is built vertex by vertex from the unit normals of the
//! adjacent edges and then cleaned with a union pass: a positive delta keeps
//! every region the raw contour winds around positively, a negative delta
//! subtracts the contour from an oversized frame and keeps the hole that is
//! left behind.

use crate::clipper::{
    area, clipper_round, orientation, ClipType, ClippingEngine, IntPoint, Path, Paths, PolyFillType,
    PolyType,
};

/// Joins with `1 + n1·n2` at or above this value are mitered, the rest squared.
pub const MITER_THRESHOLD: f64 = 1.8;

/// Margin of the frame used to extract inset contours.
const FRAME_MARGIN: i64 = 10;

const NEAR_ZERO: f64 = 1e-20;

#[derive(Debug, Clone, Copy, Default)]
struct Normal {
    x: f64,
    y: f64,
}

fn unit_normal(pt1: IntPoint, pt2: IntPoint) -> Normal {
    if pt1 == pt2 {
        return Normal::default();
    }
    let dx = (pt2.x - pt1.x) as f64;
    let dy = (pt2.y - pt1.y) as f64;
    let f = 1.0 / (dx * dx + dy * dy).sqrt();
    Normal { x: dy * f, y: -dx * f }
}

/// Grows or shrinks closed integer paths by a fixed distance.
#[derive(Debug, Default)]
pub struct OffsetEngine {
    source: Path,
    normals: Vec<Normal>,
    dest: Path,
    delta: f64,
    sin_a: f64,
}

impl OffsetEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offsets `path` by `delta` grid units. Positive values grow the polygon.
    ///
    /// Returns an empty list when the path collapses.
    pub fn execute(&mut self, path: &[IntPoint], delta: f64) -> Paths {
        self.source = dedup_closed(path);
        if self.source.is_empty() {
            return Paths::new();
        }
        if delta.abs() < NEAR_ZERO {
            return if self.source.len() >= 3 {
                vec![self.source.clone()]
            } else {
                Paths::new()
            };
        }
        if self.source.len() < 3 && !(self.source.len() == 1 && delta > 0.0) {
            return Paths::new();
        }
        if !orientation(&self.source) {
            self.source.reverse();
        }

        self.delta = delta;
        self.build_contour();
        let contour = std::mem::take(&mut self.dest);
        if contour.len() < 3 {
            return Paths::new();
        }

        let mut clipper = ClippingEngine::new();
        if delta > 0.0 {
            clipper.add_path(&contour, PolyType::Subject);
            return clipper
                .execute(ClipType::Union, PolyFillType::Positive)
                .unwrap_or_default();
        }

        let frame = frame_around(&contour);
        clipper.add_path(&contour, PolyType::Subject);
        clipper.add_path(&frame, PolyType::Subject);
        clipper.set_reverse_solution(true);
        let mut solution = clipper
            .execute(ClipType::Union, PolyFillType::Negative)
            .unwrap_or_default();
        if !solution.is_empty() {
            solution.remove(0);
        }
        solution
    }

    fn build_contour(&mut self) {
        let len = self.source.len();
        self.dest = Path::with_capacity(len * 2);

        if len == 1 {
            let p = self.source[0];
            let d = self.delta;
            for (x, y) in [(-d, 0.0), (0.0, -d), (d, 0.0), (0.0, d)] {
                self.dest
                    .push(IntPoint::new(clipper_round(p.x as f64 + x), clipper_round(p.y as f64 + y)));
            }
            return;
        }

        self.normals = (0..len)
            .map(|j| unit_normal(self.source[j], self.source[(j + 1) % len]))
            .collect();

        let mut k = len - 1;
        for j in 0..len {
            self.offset_point(j, k);
            k = j;
        }
    }

    fn push_along(&mut self, j: usize, normal: Normal) {
        let p = self.source[j];
        self.dest.push(IntPoint::new(
            clipper_round(p.x as f64 + normal.x * self.delta),
            clipper_round(p.y as f64 + normal.y * self.delta),
        ));
    }

    fn offset_point(&mut self, j: usize, k: usize) {
        let (nj, nk) = (self.normals[j], self.normals[k]);
        self.sin_a = nk.x * nj.y - nj.x * nk.y;
        let cos_a = nk.x * nj.x + nj.y * nk.y;

        if (self.sin_a * self.delta).abs() < 1.0 {
            // nearly straight: a single point is enough
            if cos_a > 0.0 {
                self.push_along(j, nk);
                return;
            }
        } else {
            self.sin_a = self.sin_a.clamp(-1.0, 1.0);
        }

        if self.sin_a * self.delta < 0.0 {
            self.push_along(j, nk);
            self.dest.push(self.source[j]);
            self.push_along(j, nj);
        } else if 1.0 + cos_a >= MITER_THRESHOLD {
            self.do_miter(j, k, 1.0 + cos_a);
        } else {
            self.do_square(j, k, cos_a);
        }
    }

    fn do_square(&mut self, j: usize, k: usize, cos_a: f64) {
        let (nj, nk) = (self.normals[j], self.normals[k]);
        let p = self.source[j];
        let dx = (self.sin_a.atan2(cos_a) / 4.0).tan();
        self.dest.push(IntPoint::new(
            clipper_round(p.x as f64 + self.delta * (nk.x - nk.y * dx)),
            clipper_round(p.y as f64 + self.delta * (nk.y + nk.x * dx)),
        ));
        self.dest.push(IntPoint::new(
            clipper_round(p.x as f64 + self.delta * (nj.x + nj.y * dx)),
            clipper_round(p.y as f64 + self.delta * (nj.y - nj.x * dx)),
        ));
    }

    fn do_miter(&mut self, j: usize, k: usize, r: f64) {
        let (nj, nk) = (self.normals[j], self.normals[k]);
        let p = self.source[j];
        let q = self.delta / r;
        self.dest.push(IntPoint::new(
            clipper_round(p.x as f64 + (nk.x + nj.x) * q),
            clipper_round(p.y as f64 + (nk.y + nj.y) * q),
        ));
    }
}

/// Strips the closing point and consecutive duplicates.
fn dedup_closed(path: &[IntPoint]) -> Path {
    let mut out = Path::with_capacity(path.len());
    for &p in path {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

/// Clockwise rectangle enclosing `path` with a small margin.
fn frame_around(path: &[IntPoint]) -> Path {
    let (mut left, mut top) = (i64::MAX, i64::MAX);
    let (mut right, mut bottom) = (i64::MIN, i64::MIN);
    for p in path {
        left = left.min(p.x);
        right = right.max(p.x);
        top = top.min(p.y);
        bottom = bottom.max(p.y);
    }
    let frame = vec![
        IntPoint::new(left - FRAME_MARGIN, bottom + FRAME_MARGIN),
        IntPoint::new(right + FRAME_MARGIN, bottom + FRAME_MARGIN),
        IntPoint::new(right + FRAME_MARGIN, top - FRAME_MARGIN),
        IntPoint::new(left - FRAME_MARGIN, top - FRAME_MARGIN),
    ];
    debug_assert!(area(&frame) < 0.0);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(size: i64) -> Path {
        vec![
            IntPoint::new(0, 0),
            IntPoint::new(size, 0),
            IntPoint::new(size, size),
            IntPoint::new(0, size),
        ]
    }

    fn total_area(paths: &Paths) -> f64 {
        paths.iter().map(|p| area(p)).sum()
    }

    #[test]
    fn test_grow_square() {
        let grown = OffsetEngine::new().execute(&square(1000), 10.0);
        assert_eq!(grown.len(), 1);
        let a = total_area(&grown);
        // square joins cut a little off each corner of the full 1020² square
        assert!(a > 1000.0 * 1000.0 + 4.0 * 10.0 * 1000.0);
        assert!(a <= 1020.0 * 1020.0);
    }

    #[test]
    fn test_shrink_square() {
        let shrunk = OffsetEngine::new().execute(&square(1000), -10.0);
        assert_eq!(shrunk.len(), 1);
        assert_relative_eq!(total_area(&shrunk), 980.0 * 980.0, max_relative = 1e-9);
        assert!(orientation(&shrunk[0]));
    }

    #[test]
    fn test_orientation_is_normalized() {
        let mut reversed = square(1000);
        reversed.reverse();
        let grown = OffsetEngine::new().execute(&reversed, 10.0);
        assert_eq!(grown.len(), 1);
        assert!(total_area(&grown) > 1_000_000.0);
    }

    #[test]
    fn test_shrink_to_nothing() {
        assert!(OffsetEngine::new().execute(&square(10), -20.0).is_empty());
    }

    #[test]
    fn test_zero_delta_copies() {
        let same = OffsetEngine::new().execute(&square(100), 0.0);
        assert_eq!(same, vec![square(100)]);
    }

    #[test]
    fn test_single_point_diamond() {
        let diamond = OffsetEngine::new().execute(&[IntPoint::new(50, 50)], 10.0);
        assert_eq!(diamond.len(), 1);
        assert_eq!(diamond[0].len(), 4);
        assert_relative_eq!(total_area(&diamond), 200.0);
        assert!(OffsetEngine::new().execute(&[IntPoint::new(50, 50)], -10.0).is_empty());
    }

    #[test]
    fn test_degenerate_input() {
        assert!(OffsetEngine::new().execute(&[], 5.0).is_empty());
        let segment = vec![IntPoint::new(0, 0), IntPoint::new(10, 0)];
        assert!(OffsetEngine::new().execute(&segment, 5.0).is_empty());
    }

    #[test]
    fn test_obtuse_corner_is_mitered() {
        // 30 degree turns satisfy the miter threshold, so the grown contour
        // keeps one vertex per corner
        let dodecagon: Path = (0..12)
            .map(|i| {
                let a = f64::from(i) * std::f64::consts::PI / 6.0;
                IntPoint::new(clipper_round(1000.0 * a.cos()), clipper_round(1000.0 * a.sin()))
            })
            .collect();
        let grown = OffsetEngine::new().execute(&dodecagon, 20.0);
        assert_eq!(grown.len(), 1);
        assert_eq!(grown[0].len(), 12);
    }

    #[test]
    fn test_concave_notch_survives_round_trip() {
        let l_shape = vec![
            IntPoint::new(0, 0),
            IntPoint::new(2000, 0),
            IntPoint::new(2000, 1000),
            IntPoint::new(1000, 1000),
            IntPoint::new(1000, 2000),
            IntPoint::new(0, 2000),
        ];
        let mut engine = OffsetEngine::new();
        let grown = engine.execute(&l_shape, 50.0);
        assert_eq!(grown.len(), 1);
        let back = engine.execute(&grown[0], -50.0);
        assert_eq!(back.len(), 1);
        assert_relative_eq!(total_area(&back), area(&l_shape), max_relative = 0.01);
    }
}
