//! Synthetic problem generator.
//!
//! Produces reproducible problems for stress testing: plain rectangles,
//! convex polygons, concave shapes and parts with holes.

use std::f64::consts::PI;

use rand::prelude::*;

use crate::problem::{ConfigOverrides, PartSpec, Problem};

/// Kinds of generated problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SyntheticKind {
    Rectangles,
    Convex,
    Concave,
    Holes,
}

/// Generator for synthetic nesting problems.
#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    rng: StdRng,
}

impl SyntheticGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Same seed, same problem.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self, kind: SyntheticKind, count: usize, bin_width: f64, bin_height: f64) -> Problem {
        match kind {
            SyntheticKind::Rectangles => self.rectangles(count, bin_width, bin_height),
            SyntheticKind::Convex => self.convex(count, bin_width, bin_height),
            SyntheticKind::Concave => self.concave(count, bin_width, bin_height),
            SyntheticKind::Holes => self.with_holes(count, bin_width, bin_height),
        }
    }

    /// Random rectangles with sides between 5% and 25% of the bin.
    pub fn rectangles(&mut self, count: usize, bin_width: f64, bin_height: f64) -> Problem {
        let parts = (0..count)
            .map(|_| {
                let w = bin_width * self.rng.gen_range(0.05..0.25);
                let h = bin_height * self.rng.gen_range(0.05..0.25);
                PartSpec::new(rectangle(w, h), 1)
            })
            .collect();
        problem("synthetic_rectangles", bin_width, bin_height, parts)
    }

    /// Regular polygons with 3 to 8 sides.
    pub fn convex(&mut self, count: usize, bin_width: f64, bin_height: f64) -> Problem {
        let max_radius = 0.12 * bin_width.min(bin_height);
        let parts = (0..count)
            .map(|_| {
                let sides = self.rng.gen_range(3..=8);
                let radius = self.rng.gen_range(0.3 * max_radius..max_radius);
                PartSpec::new(regular_polygon(sides, radius), 1)
            })
            .collect();
        problem("synthetic_convex", bin_width, bin_height, parts)
    }

    /// A mix of stars, L, T and cross shapes.
    pub fn concave(&mut self, count: usize, bin_width: f64, bin_height: f64) -> Problem {
        let size = 0.15 * bin_width.min(bin_height);
        let parts = (0..count)
            .map(|_| {
                let points = match self.rng.gen_range(0..4) {
                    0 => self.star(size),
                    1 => self.l_shape(size),
                    2 => self.t_shape(size),
                    _ => self.cross(size),
                };
                PartSpec::new(points, 1)
            })
            .collect();
        problem("synthetic_concave", bin_width, bin_height, parts)
    }

    /// Square frames, each followed by a small square that fits its hole.
    ///
    /// The frame hole is a separate part lying inside the outline, which is
    /// how the tree builder learns about holes.
    pub fn with_holes(&mut self, count: usize, bin_width: f64, bin_height: f64) -> Problem {
        let max = 0.3 * bin_width.min(bin_height);
        let mut parts = Vec::with_capacity(count * 2);
        for _ in 0..count {
            let outer = self.rng.gen_range(0.5 * max..max);
            let hole = outer * self.rng.gen_range(0.4..0.6);
            let inset = (outer - hole) / 2.0;
            parts.push(PartSpec::new(rectangle(outer, outer), 1));
            parts.push(PartSpec::new(
                rectangle(hole, hole)
                    .into_iter()
                    .map(|[x, y]| [x + inset, y + inset])
                    .collect(),
                1,
            ));
            let filler = hole * 0.8;
            parts.push(PartSpec::new(rectangle(filler, filler), 1));
        }
        let mut problem = problem("synthetic_holes", bin_width, bin_height, parts);
        problem.config.use_holes = Some(true);
        problem
    }

    fn star(&mut self, size: f64) -> Vec<[f64; 2]> {
        let points = self.rng.gen_range(5..=8);
        let outer = size * self.rng.gen_range(0.6..1.0);
        let inner = outer * self.rng.gen_range(0.3..0.5);
        (0..points * 2)
            .map(|i| {
                let angle = PI * i as f64 / points as f64 - PI / 2.0;
                let r = if i % 2 == 0 { outer } else { inner };
                [r * angle.cos(), r * angle.sin()]
            })
            .collect()
    }

    fn l_shape(&mut self, size: f64) -> Vec<[f64; 2]> {
        let w = size * self.rng.gen_range(0.6..1.0);
        let h = size * self.rng.gen_range(0.6..1.0);
        let notch_w = w * self.rng.gen_range(0.4..0.6);
        let notch_h = h * self.rng.gen_range(0.4..0.6);
        vec![
            [0.0, 0.0],
            [w, 0.0],
            [w, h - notch_h],
            [w - notch_w, h - notch_h],
            [w - notch_w, h],
            [0.0, h],
        ]
    }

    fn t_shape(&mut self, size: f64) -> Vec<[f64; 2]> {
        let w = size * self.rng.gen_range(0.7..1.0);
        let h = size * self.rng.gen_range(0.7..1.0);
        let stem_w = w * 0.3;
        let stem_h = h * 0.6;
        let left = (w - stem_w) / 2.0;
        vec![
            [0.0, h - stem_h],
            [left, h - stem_h],
            [left, 0.0],
            [left + stem_w, 0.0],
            [left + stem_w, h - stem_h],
            [w, h - stem_h],
            [w, h],
            [0.0, h],
        ]
    }

    fn cross(&mut self, size: f64) -> Vec<[f64; 2]> {
        let size = size * self.rng.gen_range(0.7..1.0);
        let arm = size * 0.3;
        let c = (size - arm) / 2.0;
        vec![
            [c, 0.0],
            [c + arm, 0.0],
            [c + arm, c],
            [size, c],
            [size, c + arm],
            [c + arm, c + arm],
            [c + arm, size],
            [c, size],
            [c, c + arm],
            [0.0, c + arm],
            [0.0, c],
            [c, c],
        ]
    }
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn problem(name: &str, bin_width: f64, bin_height: f64, parts: Vec<PartSpec>) -> Problem {
    Problem {
        name: name.to_string(),
        bin: rectangle(bin_width, bin_height),
        parts,
        config: ConfigOverrides::default(),
    }
}

fn rectangle(width: f64, height: f64) -> Vec<[f64; 2]> {
    vec![[0.0, 0.0], [width, 0.0], [width, height], [0.0, height]]
}

fn regular_polygon(sides: usize, radius: f64) -> Vec<[f64; 2]> {
    (0..sides)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / sides as f64 - PI / 2.0;
            [radius * angle.cos(), radius * angle.sin()]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangles_fit_the_bin() {
        let mut gen = SyntheticGenerator::with_seed(42);
        let problem = gen.rectangles(10, 200.0, 100.0);
        assert_eq!(problem.part_count(), 10);
        for part in &problem.parts {
            let poly = part.polygon();
            let b = poly.bounds();
            assert!(b.width() <= 50.0 && b.height() <= 25.0);
        }
    }

    #[test]
    fn test_reproducibility() {
        let a = SyntheticGenerator::with_seed(123).generate(SyntheticKind::Concave, 6, 100.0, 100.0);
        let b = SyntheticGenerator::with_seed(123).generate(SyntheticKind::Concave, 6, 100.0, 100.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_holes_lie_inside_frames() {
        let problem = SyntheticGenerator::with_seed(7).with_holes(2, 100.0, 100.0);
        assert_eq!(problem.parts.len(), 6);
        assert_eq!(problem.config.use_holes, Some(true));

        let frame = problem.parts[0].polygon();
        let hole = problem.parts[1].polygon();
        for p in hole.points() {
            assert_eq!(frame.contains(*p), Some(true));
        }
    }
}
