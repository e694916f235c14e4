//! Placement results.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position of one placed part.
///
/// `x`/`y` translate the part after it has been rotated by `rotation`
/// degrees around the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    pub source: i32,
    pub rotation: f64,
    pub x: f64,
    pub y: f64,
}

impl Placement {
    pub fn new(source: i32, rotation: f64, x: f64, y: f64) -> Self {
        Self {
            source,
            rotation,
            x,
            y,
        }
    }
}

/// Outcome of evaluating one genome.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacementResult {
    /// Scalar score; lower is better.
    pub fitness: f64,
    /// Area of the bin used for the evaluation.
    pub area: f64,
    /// Placements grouped per opened bin.
    pub bins: Vec<Vec<Placement>>,
    /// Sources of parts that could not be placed in any bin.
    pub unplaced: Vec<i32>,
}

impl PlacementResult {
    /// Number of bins that received at least one part.
    pub fn bins_used(&self) -> usize {
        self.bins.len()
    }

    /// Total number of placed parts.
    pub fn placement_count(&self) -> usize {
        self.bins.iter().map(Vec::len).sum()
    }

    /// Number of distinct parts that were placed.
    pub fn placed_count(&self) -> usize {
        let mut sources: Vec<i32> = self.placements().map(|(_, p)| p.source).collect();
        sources.sort_unstable();
        sources.dedup();
        sources.len()
    }

    /// Returns true if every part was placed.
    pub fn all_placed(&self) -> bool {
        self.unplaced.is_empty()
    }

    /// Iterates over every placement with its bin index.
    pub fn placements(&self) -> impl Iterator<Item = (usize, &Placement)> {
        self.bins
            .iter()
            .enumerate()
            .flat_map(|(bin, placements)| placements.iter().map(move |p| (bin, p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let result = PlacementResult {
            fitness: 1.5,
            area: 100.0,
            bins: vec![
                vec![Placement::new(0, 0.0, 0.0, 0.0), Placement::new(1, 90.0, 5.0, 0.0)],
                vec![Placement::new(2, 0.0, 0.0, 0.0)],
            ],
            unplaced: vec![3],
        };
        assert_eq!(result.bins_used(), 2);
        assert_eq!(result.placement_count(), 3);
        assert_eq!(result.placed_count(), 3);
        assert!(!result.all_placed());
        assert_eq!(result.placements().last().map(|(bin, p)| (bin, p.source)), Some((1, 2)));
    }
}
