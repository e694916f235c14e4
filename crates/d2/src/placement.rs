//! Greedy placement of one genome.
//!
//! Parts are placed in genome order. The first part of a bin goes to the
//! leftmost position of its inner bin NFP. Every later part may go anywhere
//! on the boundary of the bin NFP minus the union of the outer NFPs of the
//! parts already in the bin; the vertex that keeps `2 * width + height` of the
//! combined bounding box smallest wins, ties going to the smaller x.

use polynest_core::{
    almost_equal, BoundRect, Placement, PlacementResult, Point, Polygon, PolygonNode, RotationTable,
    BIN_SOURCE, TOLERANCE,
};

use crate::clipper::{
    area, clean_polygon, to_path, to_polygon, ClipType, ClippingEngine, Path, Paths, PolyFillType,
    PolyType,
};
use crate::codec::{NfpCache, NfpKey, PlacementJob};

/// Penalty per part left out of every bin.
pub const UNPLACED_PENALTY: f64 = 2.0;

/// NFP loops smaller than this are not scanned for positions.
const MIN_CANDIDATE_AREA: f64 = 2.0;

/// A part already sitting in the current bin.
struct Placed<'a> {
    node: &'a PolygonNode,
    rotation: u32,
    position: Point,
}

/// Evaluates placement jobs.
#[derive(Debug)]
pub struct PlacementEngine {
    scale: f64,
    clipper: ClippingEngine,
}

impl PlacementEngine {
    /// Creates an engine clipping on a grid of `clipper_scale` units per unit.
    pub fn new(clipper_scale: f64) -> Self {
        Self {
            scale: clipper_scale,
            clipper: ClippingEngine::new(),
        }
    }

    /// Places every part of `job` and scores the layout. Lower is better.
    pub fn place_paths(&mut self, job: &PlacementJob) -> PlacementResult {
        let table = RotationTable::new(job.config.rotations);
        let mut remaining: Vec<&PolygonNode> = job.parts.iter().collect();
        let mut bins = Vec::new();
        let mut fitness = 0.0;

        while !remaining.is_empty() {
            fitness += 1.0;
            let mut placed: Vec<Placed<'_>> = Vec::new();
            let mut placements = Vec::new();
            let mut skipped = Vec::new();
            let mut min_width = None;

            for part in remaining {
                let rotation = table.index_of(part.rotation) as u32;
                let position = match self.find_position(&job.nfp_cache, &placed, part, rotation) {
                    Search::First(position) => position,
                    Search::Scanned(Some((position, width))) => {
                        min_width = Some(width);
                        position
                    }
                    Search::Scanned(None) => {
                        min_width = None;
                        skipped.push(part);
                        continue;
                    }
                    Search::Skip => {
                        skipped.push(part);
                        continue;
                    }
                };
                placements.push(Placement::new(part.source, part.rotation, position.x, position.y));
                placed.push(Placed {
                    node: part,
                    rotation,
                    position,
                });
            }

            if let Some(width) = min_width {
                fitness += width / job.area;
            }
            remaining = skipped;
            if placements.is_empty() {
                break;
            }
            bins.push(placements);
        }

        fitness += UNPLACED_PENALTY * remaining.len() as f64;
        PlacementResult {
            fitness,
            area: job.area,
            bins,
            unplaced: remaining.iter().map(|part| part.source).collect(),
        }
    }

    fn find_position(&mut self, cache: &NfpCache, placed: &[Placed<'_>], part: &PolygonNode, rotation: u32) -> Search {
        let bin_key = NfpKey::new(BIN_SOURCE, part.source, 0, rotation, true).pack();
        let Some(bin_nfp) = cache.get(&bin_key).filter(|loops| !loops.is_empty()) else {
            log::debug!("no bin NFP for part {}", part.source);
            return Search::Skip;
        };
        let Some(first) = part.polygon.first() else {
            return Search::Skip;
        };

        if placed.is_empty() {
            let leftmost = bin_nfp
                .iter()
                .flat_map(|nfp| nfp.points())
                .fold(None::<Point>, |best, &p| match best {
                    Some(b) if b.x <= p.x => Some(b),
                    _ => Some(p),
                });
            return leftmost.map_or(Search::Skip, |p| Search::First(p - first));
        }

        let mut outer = Vec::with_capacity(placed.len());
        for other in placed {
            let key = NfpKey::new(other.node.source, part.source, other.rotation, rotation, false).pack();
            match cache.get(&key) {
                Some(loops) => outer.push((loops, other.position)),
                None => {
                    log::debug!("missing NFP for parts {} and {}", other.node.source, part.source);
                    return Search::Skip;
                }
            }
        }

        let Some(candidates) = self.feasible_region(bin_nfp, &outer) else {
            return Search::Scanned(None);
        };

        let placed_bounds = placed
            .iter()
            .flat_map(|other| {
                other
                    .node
                    .polygon
                    .points()
                    .iter()
                    .map(move |&p| p + other.position)
            })
            .fold(None::<BoundRect>, |bounds, p| match bounds {
                Some(mut b) => Some(*b.expand(p)),
                None => Some(BoundRect::new(p.x, p.y, 0.0, 0.0)),
            });
        let part_bounds = part.polygon.bounds();

        let mut best: Option<(f64, Point, f64)> = None;
        for nfp in candidates.iter().filter(|nfp| nfp.abs_area() >= MIN_CANDIDATE_AREA) {
            for &vertex in nfp.points() {
                let shift = vertex - first;
                let mut bounds = BoundRect::new(
                    part_bounds.x() + shift.x,
                    part_bounds.y() + shift.y,
                    part_bounds.width(),
                    part_bounds.height(),
                );
                if let Some(placed_bounds) = placed_bounds {
                    bounds.expand(placed_bounds.position());
                    bounds.expand(Point::new(placed_bounds.right(), placed_bounds.bottom()));
                }
                let score = 2.0 * bounds.width() + bounds.height();
                let better = match best {
                    None => true,
                    Some((best_score, best_shift, _)) => {
                        score < best_score || (almost_equal(score, best_score, TOLERANCE) && shift.x < best_shift.x)
                    }
                };
                if better {
                    best = Some((score, shift, bounds.width()));
                }
            }
        }
        Search::Scanned(best.map(|(_, shift, width)| (shift, width)))
    }

    /// Bin NFP minus the union of the translated outer NFPs, as polygons in
    /// part coordinates. `None` when nothing is left.
    fn feasible_region(&mut self, bin_nfp: &[Polygon], outer: &[(&Vec<Polygon>, Point)]) -> Option<Vec<Polygon>> {
        let scale = self.scale;

        self.clipper.clear();
        for (loops, position) in outer {
            for nfp in loops.iter() {
                let shifted: Vec<Point> = nfp.points().iter().map(|&p| p + *position).collect();
                let path = clean_polygon(&to_path(&shifted, scale), 0.0001 * scale);
                if self.keeps(&path) {
                    self.clipper.add_path(&path, PolyType::Subject);
                }
            }
        }
        let combined = self.clipper.execute(ClipType::Union, PolyFillType::NonZero)?;

        self.clipper.clear();
        self.clipper.add_paths(&combined, PolyType::Clip);
        for nfp in bin_nfp {
            self.clipper.add_path(&to_path(nfp.points(), scale), PolyType::Subject);
        }
        let region: Paths = self
            .clipper
            .execute(ClipType::Difference, PolyFillType::NonZero)?
            .iter()
            .map(|path| clean_polygon(path, 0.0001 * scale))
            .filter(|path| self.keeps(path))
            .collect();
        self.clipper.clear();

        if region.is_empty() {
            return None;
        }
        Some(region.iter().map(|path| to_polygon(path, scale)).collect())
    }

    fn keeps(&self, path: &Path) -> bool {
        path.len() > 2 && area(path).abs() > 0.1 * self.scale * self.scale
    }
}

/// Outcome of looking for one part's position.
enum Search {
    /// First part of the bin at the leftmost bin NFP vertex.
    First(Point),
    /// Scanned the feasible region; the best shift and the resulting width.
    Scanned(Option<(Point, f64)>),
    /// An NFP the part needs is missing.
    Skip,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfp::NfpEngine;
    use approx::assert_relative_eq;
    use polynest_core::PackedConfig;

    const SCALE: f64 = 1e7;

    fn square(source: i32, size: f64) -> PolygonNode {
        PolygonNode::new(source, Polygon::rectangle(0.0, 0.0, size, size))
    }

    /// Builds a placement job with every NFP the parts need.
    fn job(bin: f64, parts: Vec<PolygonNode>) -> PlacementJob {
        let bin_node = square(BIN_SOURCE, bin);
        let mut engine = NfpEngine::new();
        let mut cache = NfpCache::new();
        for (i, part) in parts.iter().enumerate() {
            let loops = engine.no_fit_polygon(&bin_node.polygon, &part.polygon, true).unwrap();
            if !loops.is_empty() {
                cache.insert(NfpKey::new(BIN_SOURCE, part.source, 0, 0, true).pack(), loops);
            }
            for other in &parts[..i] {
                let loops = engine.no_fit_polygon(&other.polygon, &part.polygon, false).unwrap();
                cache.insert(NfpKey::new(other.source, part.source, 0, 0, false).pack(), loops);
            }
        }
        let mut config = PackedConfig::unpack(0);
        config.rotations = 1;
        PlacementJob {
            config,
            area: bin * bin,
            nfp_cache: cache,
            parts,
        }
    }

    #[test]
    fn test_first_part_goes_left() {
        let result = PlacementEngine::new(SCALE).place_paths(&job(100.0, vec![square(0, 10.0)]));
        assert_eq!(result.bins.len(), 1);
        let p = result.bins[0][0];
        assert_relative_eq!(p.x, 0.0);
        assert_relative_eq!(result.fitness, 1.0);
    }

    #[test]
    fn test_two_squares_share_a_bin() {
        let result = PlacementEngine::new(SCALE).place_paths(&job(100.0, vec![square(0, 10.0), square(1, 10.0)]));
        assert_eq!(result.bins_used(), 1);
        assert_eq!(result.placement_count(), 2);
        assert!(result.unplaced.is_empty());

        let (a, b) = (result.bins[0][0], result.bins[0][1]);
        let apart_x = (a.x - b.x).abs() >= 10.0 - 1e-6;
        let apart_y = (a.y - b.y).abs() >= 10.0 - 1e-6;
        assert!(apart_x || apart_y);
        // width weighs double, so the second square stacks on top of the first
        assert_relative_eq!(b.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(b.y, 10.0, epsilon = 1e-6);
        assert_relative_eq!(result.fitness, 1.0 + 10.0 / 10_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_oversized_part_is_unplaced() {
        let result = PlacementEngine::new(SCALE).place_paths(&job(100.0, vec![square(0, 10.0), square(1, 150.0)]));
        assert_eq!(result.placed_count(), 1);
        assert_eq!(result.unplaced, vec![1]);
        assert!(result.fitness >= 1.0 + UNPLACED_PENALTY);
    }

    #[test]
    fn test_overflow_opens_second_bin() {
        let parts = vec![square(0, 60.0), square(1, 60.0)];
        let result = PlacementEngine::new(SCALE).place_paths(&job(100.0, parts));
        assert_eq!(result.bins_used(), 2);
        assert!(result.unplaced.is_empty());
        assert!(result.fitness >= 2.0 && result.fitness < 3.0);
    }

    #[test]
    fn test_missing_bin_nfp_skips_part() {
        let mut job = job(100.0, vec![square(0, 10.0), square(1, 10.0)]);
        job.nfp_cache.remove(&NfpKey::new(BIN_SOURCE, 1, 0, 0, true).pack());
        let result = PlacementEngine::new(SCALE).place_paths(&job);
        assert_eq!(result.placed_count(), 1);
        assert_eq!(result.unplaced, vec![1]);
    }
}
