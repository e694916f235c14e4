//! JSON problem files.
//!
//! ```json
//! {
//!   "name": "plates",
//!   "bin": [[0, 0], [500, 0], [500, 300], [0, 300]],
//!   "parts": [
//!     { "points": [[0, 0], [100, 0], [100, 50], [0, 50]], "quantity": 3 },
//!     { "points": [[0, 0], [80, 0], [40, 60]] }
//!   ],
//!   "config": { "spacing": 2, "rotations": 4 }
//! }
//! ```
//!
//! Holes are given as extra parts that lie inside another part; the tree
//! builder nests them.

use std::fs;
use std::path::Path;

use polynest_core::{NestConfig, Point, Polygon};
use serde::{Deserialize, Serialize};

use crate::BenchError;

/// A polygon outline with a copy count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSpec {
    pub points: Vec<[f64; 2]>,
    #[serde(default = "one")]
    pub quantity: usize,
}

fn one() -> usize {
    1
}

impl PartSpec {
    pub fn new(points: Vec<[f64; 2]>, quantity: usize) -> Self {
        Self { points, quantity }
    }

    pub fn polygon(&self) -> Polygon {
        Polygon::new(self.points.iter().map(|&[x, y]| Point::new(x, y)).collect())
    }
}

/// Optional overrides of the default [`NestConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub curve_tolerance: Option<f64>,
    pub spacing: Option<f64>,
    pub rotations: Option<u32>,
    pub population_size: Option<usize>,
    pub mutation_rate: Option<u32>,
    pub use_holes: Option<bool>,
}

impl ConfigOverrides {
    pub fn apply(&self, mut config: NestConfig) -> NestConfig {
        if let Some(v) = self.curve_tolerance {
            config = config.with_curve_tolerance(v);
        }
        if let Some(v) = self.spacing {
            config = config.with_spacing(v);
        }
        if let Some(v) = self.rotations {
            config = config.with_rotations(v);
        }
        if let Some(v) = self.population_size {
            config = config.with_population_size(v);
        }
        if let Some(v) = self.mutation_rate {
            config = config.with_mutation_rate(v);
        }
        if let Some(v) = self.use_holes {
            config = config.with_use_holes(v);
        }
        config
    }
}

/// One bin and the parts to nest into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(default)]
    pub name: String,
    pub bin: Vec<[f64; 2]>,
    pub parts: Vec<PartSpec>,
    #[serde(default)]
    pub config: ConfigOverrides,
}

impl Problem {
    pub fn from_json(json: &str) -> Result<Self, BenchError> {
        let problem: Self = serde_json::from_str(json)?;
        problem.validate()?;
        Ok(problem)
    }

    /// Loads a problem file. An empty name is replaced by the file stem.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BenchError> {
        let path = path.as_ref();
        let mut problem = Self::from_json(&fs::read_to_string(path)?)?;
        if problem.name.is_empty() {
            problem.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(problem)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BenchError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), BenchError> {
        if self.bin.len() < 3 {
            return Err(BenchError::Problem("bin needs at least three points".into()));
        }
        if let Some(i) = self.parts.iter().position(|p| p.points.len() < 3) {
            return Err(BenchError::Problem(format!("part {} needs at least three points", i)));
        }
        Ok(())
    }

    pub fn bin_polygon(&self) -> Polygon {
        Polygon::new(self.bin.iter().map(|&[x, y]| Point::new(x, y)).collect())
    }

    /// Expands quantities. Returns the polygons and, for each, the index of
    /// the part spec it came from.
    pub fn expand(&self) -> (Vec<Polygon>, Vec<usize>) {
        let mut polygons = Vec::new();
        let mut origin = Vec::new();
        for (i, part) in self.parts.iter().enumerate() {
            for _ in 0..part.quantity {
                polygons.push(part.polygon());
                origin.push(i);
            }
        }
        (polygons, origin)
    }

    /// Total number of parts after expanding quantities.
    pub fn part_count(&self) -> usize {
        self.parts.iter().map(|p| p.quantity).sum()
    }

    pub fn nest_config(&self) -> NestConfig {
        self.config.apply(NestConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "bin": [[0, 0], [100, 0], [100, 50], [0, 50]],
        "parts": [
            { "points": [[0, 0], [10, 0], [10, 10], [0, 10]], "quantity": 3 },
            { "points": [[0, 0], [8, 0], [4, 6]] }
        ],
        "config": { "spacing": 2, "rotations": 2 }
    }"#;

    #[test]
    fn test_parse_and_expand() {
        let problem = Problem::from_json(JSON).unwrap();
        assert_eq!(problem.part_count(), 4);
        let (polygons, origin) = problem.expand();
        assert_eq!(polygons.len(), 4);
        assert_eq!(origin, vec![0, 0, 0, 1]);
        assert_eq!(problem.bin_polygon().abs_area(), 5000.0);

        let config = problem.nest_config();
        assert_eq!(config.spacing, 2.0);
        assert_eq!(config.rotations, 2);
        assert_eq!(config.population_size, NestConfig::default().population_size);
    }

    #[test]
    fn test_rejects_degenerate_bin() {
        let json = r#"{ "bin": [[0, 0], [1, 1]], "parts": [] }"#;
        assert!(matches!(Problem::from_json(json), Err(BenchError::Problem(_))));
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(Problem::from_json("{ bin: "), Err(BenchError::Json(_))));
    }
}
