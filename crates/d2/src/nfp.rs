//! No-Fit Polygon (NFP) computation.
//!
//! The NFP of a stationary polygon A and a moving polygon B is the set of
//! positions of B's first vertex at which B touches A without overlapping
//! it. Outer NFPs keep B outside A; inner NFPs (`inside`) keep B inside A,
//! which is how parts are fitted into the bin and into holes.
//!
//! This module implements:
//! - **Rectangle case**: closed form for an axis-aligned rectangular bin
//! - **General case**: the orbital algorithm in [`crate::nfp_sliding`]
//! - **Pair jobs**: winding normalization, the outer-loop sanity check and
//!   hole NFPs for one cache entry

use polynest_core::{point_in_polygon, strip_collinear, Point, PointPool, Polygon, PolygonNode, Result};

use crate::codec::{NfpKey, PairJob};
use crate::nfp_sliding::orbit;

/// Tolerance for treating a bin as an axis-aligned rectangle.
const RECTANGLE_TOLERANCE: f64 = 0.001;

/// Inner NFP of B inside an axis-aligned rectangle A: the rectangle shrunk by
/// B's bounding box, expressed in positions of B's first vertex.
///
/// Returns `None` if B is wider or taller than A.
pub fn no_fit_polygon_rectangle(a: &Polygon, b: &Polygon) -> Option<Polygon> {
    let (ab, bb) = (a.bounds(), b.bounds());
    let first = b.first()?;
    if bb.width() > ab.width() || bb.height() > ab.height() {
        return None;
    }

    let min_x = ab.x() - bb.x() + first.x;
    let min_y = ab.y() - bb.y() + first.y;
    let max_x = ab.right() - bb.right() + first.x;
    let max_y = ab.bottom() - bb.bottom() + first.y;
    Some(Polygon::new(vec![
        Point::new(min_x, min_y),
        Point::new(max_x, min_y),
        Point::new(max_x, max_y),
        Point::new(min_x, max_y),
    ]))
}

/// Computes NFPs. Each engine owns the scratch pool used by the distance
/// queries, so one engine per thread.
#[derive(Debug, Default)]
pub struct NfpEngine {
    pool: PointPool,
}

impl NfpEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// NFP loops of `moving` against `stationary`.
    ///
    /// Inner NFPs of a rectangular `stationary` use the closed form. Returns
    /// no loops for degenerate input or when B cannot be placed at all.
    pub fn no_fit_polygon(&mut self, stationary: &Polygon, moving: &Polygon, inside: bool) -> Result<Vec<Polygon>> {
        if stationary.len() < 3 || moving.len() < 3 {
            return Ok(Vec::new());
        }
        if inside && stationary.is_rectangle(RECTANGLE_TOLERANCE) {
            return Ok(no_fit_polygon_rectangle(stationary, moving).into_iter().collect());
        }
        let loops = orbit(&mut self.pool, stationary.points(), moving.points(), inside)?;
        Ok(loops.iter().map(|l| Polygon::new(strip_collinear(l))).collect())
    }

    /// Computes the cache entry for one pair job.
    ///
    /// Inner loops all get the canonical (negative) winding. Outer loops are
    /// canonical too, except loops lying inside the first one, which are
    /// pockets and get the opposite winding. With holes enabled, inner NFPs of
    /// the moving part inside each hole of the stationary part are appended
    /// with the opposite winding as well.
    ///
    /// An empty result means the NFP could not be computed.
    pub fn pair_nfp(&mut self, job: &PairJob) -> Result<Vec<Polygon>> {
        let key = NfpKey::unpack(job.key);
        let a = &job.stationary.polygon;
        let b = &job.moving.polygon;

        if key.inside {
            let mut loops = self.no_fit_polygon(a, b, true)?;
            if loops.is_empty() {
                log::warn!("no inner NFP for part {} (key {})", key.moving, job.key);
            }
            for nfp in &mut loops {
                if nfp.area() > 0.0 {
                    nfp.reverse();
                }
            }
            return Ok(loops);
        }

        let mut loops = self.no_fit_polygon(a, b, false)?;
        let Some(first) = loops.first() else {
            log::warn!("no outer NFP for parts {} and {}", key.stationary, key.moving);
            return Ok(Vec::new());
        };
        // the first outer loop always encloses A
        if first.abs_area() < a.abs_area() {
            log::warn!(
                "outer NFP of parts {} and {} is smaller than the stationary part ({} < {})",
                key.stationary,
                key.moving,
                first.abs_area(),
                a.abs_area()
            );
            return Ok(Vec::new());
        }

        for i in 0..loops.len() {
            if loops[i].area() > 0.0 {
                loops[i].reverse();
            }
            if i > 0 {
                let probe = loops[i].first();
                let pocket = probe.map_or(false, |p| {
                    point_in_polygon(p, loops[0].points(), Point::default()) == Some(true)
                });
                if pocket && loops[i].area() < 0.0 {
                    loops[i].reverse();
                }
            }
        }

        if job.config.use_holes {
            self.append_hole_nfps(&job.stationary.children, b, &mut loops)?;
        }
        Ok(loops)
    }

    fn append_hole_nfps(
        &mut self,
        holes: &[PolygonNode],
        moving: &Polygon,
        loops: &mut Vec<Polygon>,
    ) -> Result<()> {
        let bb = *moving.bounds();
        for hole in holes {
            let hb = hole.polygon.bounds();
            // B's bounding box must fit strictly
            if !(hb.width() > bb.width() && hb.height() > bb.height()) {
                continue;
            }
            for mut nfp in self.no_fit_polygon(&hole.polygon, moving, true)? {
                if nfp.area() < 0.0 {
                    nfp.reverse();
                }
                loops.push(nfp);
            }
        }
        Ok(())
    }
}
