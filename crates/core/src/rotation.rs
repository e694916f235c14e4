//! Read-only rotation lookup.
//!
//! A [`RotationTable`] is built once from the configured number of rotation
//! steps and shared by reference (or `Arc`) with every component that rotates
//! polygons or derives rotation indices for cache keys.

use crate::point::Point;

/// Precomputed angles with their sine and cosine.
#[derive(Debug, Clone)]
pub struct RotationTable {
    angles: Vec<f64>,
    sin_cos: Vec<(f64, f64)>,
}

impl RotationTable {
    /// Builds the table for `rotations` evenly spaced steps over a full turn.
    /// Zero steps behaves like one (angle 0 only).
    pub fn new(rotations: u32) -> Self {
        let steps = rotations.max(1);
        let angles: Vec<f64> = (0..steps).map(|i| f64::from(i) * 360.0 / f64::from(steps)).collect();
        let sin_cos = angles
            .iter()
            .map(|a| {
                let r = a.to_radians();
                (r.sin(), r.cos())
            })
            .collect();

        Self { angles, sin_cos }
    }

    /// Number of rotation steps.
    pub fn len(&self) -> usize {
        self.angles.len()
    }

    /// Always false; a table holds at least angle 0.
    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    /// All angles in degrees.
    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    /// Angle in degrees for `index`.
    pub fn angle(&self, index: usize) -> f64 {
        self.angles[index % self.angles.len()]
    }

    /// Rotation index for an angle in degrees.
    ///
    /// The step width is rounded to whole degrees first, matching the cache
    /// key layout.
    pub fn index_of(&self, angle: f64) -> usize {
        let step = (360.0 / self.angles.len() as f64).round();
        let index = (angle / step).round();
        if index.is_finite() && index > 0.0 {
            index as usize
        } else {
            0
        }
    }

    /// Sine and cosine for an angle in degrees, served from the table when the
    /// angle is one of its steps.
    pub fn sin_cos(&self, angle: f64) -> (f64, f64) {
        if let Some(i) = self.angles.iter().position(|a| *a == angle) {
            return self.sin_cos[i];
        }
        let r = angle.to_radians();
        (r.sin(), r.cos())
    }

    /// Rotates `point` around the origin by `angle` degrees.
    pub fn rotate(&self, point: &mut Point, angle: f64) {
        let (sin, cos) = self.sin_cos(angle);
        point.rotate(sin, cos);
    }
}
