//! Input cleaning and the part/hole forest.
//!
//! Raw polygons go through a strictly simple self-union (keeping the largest
//! piece) and a near-collinear point sweep on the integer grid before they
//! are used anywhere else. Parts that end up inside other parts become their
//! holes, and the forest is then offset by half the spacing with the sign
//! flipping at every depth so that holes shrink while parts grow.

use polynest_core::{BoundRect, Error, NestConfig, Point, Polygon, PolygonNode, Result, BIN_SOURCE};
use rayon::prelude::*;

use crate::clipper::{area, clean_polygon, simplify_polygon, to_path, to_polygon, PolyFillType};
use crate::offset::OffsetEngine;

/// The prepared bin.
#[derive(Debug, Clone)]
pub struct BinBounds {
    /// Bin polygon, inset by half the spacing and moved to the origin.
    pub node: PolygonNode,
    /// Bounds of `node` (always at the origin).
    pub bounds: BoundRect,
    /// Where the inset bin sits in input coordinates.
    pub result_bounds: BoundRect,
    /// Absolute area of the inset bin.
    pub area: f64,
}

impl BinBounds {
    /// Maps a position relative to the prepared bin back to input coordinates.
    pub fn to_input(&self, x: f64, y: f64) -> (f64, f64) {
        (x + self.result_bounds.x(), y + self.result_bounds.y())
    }
}

/// Builds the bin and part forest for a nesting run.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    clipper_scale: f64,
    curve_tolerance: f64,
    spacing: f64,
}

impl TreeBuilder {
    pub fn new(config: &NestConfig) -> Self {
        Self {
            clipper_scale: config.clipper_scale,
            curve_tolerance: config.curve_tolerance,
            spacing: config.spacing,
        }
    }

    /// Removes self-intersections (keeping the largest resulting piece) and
    /// near-coincident points. Returns `None` when nothing usable is left.
    pub fn clean_polygon(&self, polygon: &Polygon) -> Option<Polygon> {
        if polygon.len() < 3 {
            return None;
        }
        let path = to_path(polygon.points(), self.clipper_scale);
        let simple = simplify_polygon(&path, PolyFillType::NonZero);

        let biggest = simple.iter().fold(None::<(&Vec<_>, f64)>, |best, candidate| {
            let a = area(candidate).abs();
            match best {
                Some((_, best_area)) if best_area >= a => best,
                _ => Some((candidate, a)),
            }
        })?;

        let clean = clean_polygon(biggest.0, self.curve_tolerance * self.clipper_scale);
        if clean.len() < 3 {
            return None;
        }
        Some(to_polygon(&clean, self.clipper_scale))
    }

    /// Offsets a polygon by `offset` input units.
    ///
    /// A zero offset returns the polygon unchanged. Shrinking may split the
    /// polygon into several pieces or make it disappear entirely.
    pub fn offset_polygon(&self, polygon: &Polygon, offset: f64) -> Vec<Polygon> {
        if offset.abs() < polynest_core::TOLERANCE {
            return vec![polygon.clone()];
        }
        let path = to_path(polygon.points(), self.clipper_scale);
        OffsetEngine::new()
            .execute(&path, offset * self.clipper_scale)
            .iter()
            .map(|p| to_polygon(p, self.clipper_scale))
            .collect()
    }

    /// Cleans the bin, insets it by half the spacing and moves it to the
    /// origin with the canonical winding.
    pub fn generate_bounds(&self, bin: &Polygon) -> Result<BinBounds> {
        let mut polygon = self
            .clean_polygon(bin)
            .ok_or_else(|| Error::InvalidBoundary("bin polygon is degenerate".into()))?;

        if self.spacing > 0.0 {
            let mut inset = self.offset_polygon(&polygon, -0.5 * self.spacing);
            match inset.len() {
                0 => {
                    return Err(Error::InvalidBoundary(format!(
                        "bin collapses when inset by {}",
                        0.5 * self.spacing
                    )))
                }
                1 => polygon = inset.remove(0),
                n => log::warn!("bin inset split into {} pieces; keeping the uninset bin", n),
            }
        }

        let result_bounds = *polygon.bounds();
        polygon.translate(-result_bounds.position());
        if polygon.area() > 0.0 {
            polygon.reverse();
        }

        let bounds = *polygon.bounds();
        let area = polygon.abs_area();
        Ok(BinBounds {
            node: PolygonNode::new(BIN_SOURCE, polygon),
            bounds,
            result_bounds,
            area,
        })
    }

    /// Cleans every part, nests parts found inside other parts as holes and
    /// applies the spacing offset.
    ///
    /// Node sources are indices into `parts`. Parts that collapse during
    /// cleaning or whose area is not above `curve_tolerance²` are skipped.
    pub fn generate_tree(&self, parts: &[Polygon]) -> Vec<PolygonNode> {
        let min_area = self.curve_tolerance * self.curve_tolerance;
        let cleaned: Vec<(i32, Polygon)> = parts
            .par_iter()
            .enumerate()
            .filter_map(|(i, part)| match self.clean_polygon(part) {
                Some(polygon) if polygon.abs_area() > min_area => Some((i as i32, polygon)),
                _ => {
                    log::warn!("skipping degenerate part {}", i);
                    None
                }
            })
            .collect();

        let mut forest = build_forest(cleaned);
        self.offset_tree(&mut forest, 0.5 * self.spacing);
        forest
    }

    /// Offsets every node by `offset`, flipping the sign for each level of
    /// children. A node whose offset does not yield exactly one polygon keeps
    /// its current outline.
    pub fn offset_tree(&self, nodes: &mut [PolygonNode], offset: f64) {
        if offset.abs() < polynest_core::TOLERANCE {
            return;
        }
        nodes.par_iter_mut().for_each(|node| {
            let mut offset_paths = self.offset_polygon(&node.polygon, offset);
            if offset_paths.len() == 1 {
                node.polygon = offset_paths.remove(0);
            }
            self.offset_tree(&mut node.children, -offset);
        });
    }
}

/// Parents each polygon under the smallest polygon containing its first
/// point; equal areas resolve to the first match.
fn build_forest(items: Vec<(i32, Polygon)>) -> Vec<PolygonNode> {
    let n = items.len();
    let parent: Vec<Option<usize>> = (0..n)
        .map(|i| {
            let probe = items[i].1.first()?;
            containers(&items, i, probe).fold(None, |best: Option<usize>, j| match best {
                Some(b) if items[b].1.abs_area() <= items[j].1.abs_area() => Some(b),
                _ => Some(j),
            })
        })
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut roots = Vec::new();
    for (i, p) in parent.iter().enumerate() {
        match p {
            Some(j) => children[*j].push(i),
            None => roots.push(i),
        }
    }

    let mut slots: Vec<Option<(i32, Polygon)>> = items.into_iter().map(Some).collect();
    let forest: Vec<PolygonNode> = roots
        .into_iter()
        .filter_map(|i| assemble(i, &children, &mut slots))
        .collect();

    let reached: usize = forest.iter().map(PolygonNode::count).sum();
    if reached < n {
        log::warn!("{} parts dropped: mutually containing outlines", n - reached);
    }
    forest
}

fn containers<'a>(items: &'a [(i32, Polygon)], i: usize, probe: Point) -> impl Iterator<Item = usize> + 'a {
    items
        .iter()
        .enumerate()
        .filter(move |(j, (_, polygon))| *j != i && polygon.contains(probe) == Some(true))
        .map(|(j, _)| j)
}

fn assemble(
    i: usize,
    children: &[Vec<usize>],
    slots: &mut [Option<(i32, Polygon)>],
) -> Option<PolygonNode> {
    let (source, polygon) = slots[i].take()?;
    let holes = children[i]
        .iter()
        .filter_map(|&c| assemble(c, children, slots))
        .collect();
    Some(PolygonNode::new(source, polygon).with_children(holes))
}
