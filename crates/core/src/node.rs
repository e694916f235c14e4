//! Part/hole forest nodes.

use crate::polygon::Polygon;
use crate::rotation::RotationTable;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Source id used for the bin node.
pub const BIN_SOURCE: i32 = -1;

/// One physical part (or the bin) with its holes.
///
/// `source` identifies the input polygon the node was built from; the bin
/// uses [`BIN_SOURCE`]. `children` are holes, which may themselves contain
/// nested parts-in-holes recursively.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolygonNode {
    pub source: i32,
    pub rotation: f64,
    pub polygon: Polygon,
    pub children: Vec<PolygonNode>,
}

impl PolygonNode {
    /// Creates a leaf node at rotation 0.
    pub fn new(source: i32, polygon: Polygon) -> Self {
        Self {
            source,
            rotation: 0.0,
            polygon,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<PolygonNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Absolute area of the outer loop.
    pub fn area(&self) -> f64 {
        self.polygon.abs_area()
    }

    /// Number of nodes in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(PolygonNode::count).sum::<usize>()
    }

    /// Deep copy with every loop rotated by `angle` degrees and `rotation`
    /// set to `angle` on the copied root.
    pub fn rotated(&self, table: &RotationTable, angle: f64) -> Self {
        Self {
            source: self.source,
            rotation: angle,
            polygon: self.polygon.rotated(table, angle),
            children: self
                .children
                .iter()
                .map(|child| child.rotated(table, angle))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotated_keeps_structure() {
        let table = RotationTable::new(4);
        let hole = PolygonNode::new(1, Polygon::rectangle(2.0, 2.0, 2.0, 2.0));
        let part = PolygonNode::new(0, Polygon::rectangle(0.0, 0.0, 10.0, 6.0)).with_children(vec![hole]);

        let rotated = part.rotated(&table, 90.0);
        assert_eq!(rotated.count(), 2);
        assert_eq!(rotated.rotation, 90.0);
        assert_relative_eq!(rotated.polygon.bounds().width(), 6.0, epsilon = 1e-9);
        assert_relative_eq!(rotated.children[0].polygon.bounds().x(), -4.0, epsilon = 1e-9);
    }
}
