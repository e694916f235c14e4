//! Orbital (sliding) algorithm for No-Fit Polygon generation.
//!
//! ## Algorithm Overview
//!
//! 1. Place the moving polygon B at a position where it touches the
//!    stationary polygon A without overlapping it.
//! 2. Collect every contact between the two outlines and derive one
//!    candidate translation per contact edge.
//! 3. Slide B along the candidate that travels furthest before a collision,
//!    recording the position of B's first vertex after every step.
//! 4. Stop once the reference point returns to a point already visited.
//!
//! After a loop closes, unexplored vertices of A are searched for another
//! valid start position, which discovers interior loops (pockets of a
//! concave A) and separate reachable regions.
//!
//! All positions are expressed as an offset applied to B's own coordinates;
//! A is never moved.

use polynest_core::{almost_equal, line_intersect, point_in_polygon, Point, PointPool, Result, TOLERANCE};

/// Cosine-free guard for "same line, opposite direction" slide vectors.
const REVERSAL_TOLERANCE: f64 = 1e-4;

// ============================================================================
// Contacts and slide vectors
// ============================================================================

/// How the two outlines touch at the current offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactType {
    /// A vertex of A coincides with a vertex of B.
    VertexVertex,
    /// A vertex of B lies inside an edge of A.
    VertexOnStationaryEdge,
    /// A vertex of A lies inside an edge of B.
    VertexOnMovingEdge,
}

/// One contact. For edge contacts the index on the edge side is the edge's
/// end vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub contact_type: ContactType,
    pub stationary_idx: usize,
    pub moving_idx: usize,
}

/// A candidate translation of B.
#[derive(Debug, Clone, Copy)]
struct SlideVector {
    vector: Point,
    /// Vertices of A bounding the edge the vector came from.
    stationary_edge: Option<(usize, usize)>,
}

#[inline]
fn wrap_prev(i: usize, n: usize) -> usize {
    if i == 0 {
        n - 1
    } else {
        i - 1
    }
}

#[inline]
fn wrap_next(i: usize, n: usize) -> usize {
    if i + 1 == n {
        0
    } else {
        i + 1
    }
}

/// Finds every vertex/vertex and vertex/edge contact between `a` and `b`
/// translated by `offset`.
pub fn find_contacts(a: &[Point], b: &[Point], offset: Point) -> Vec<Contact> {
    let mut contacts = Vec::new();
    for i in 0..a.len() {
        let next_i = wrap_next(i, a.len());
        for j in 0..b.len() {
            let next_j = wrap_next(j, b.len());
            let bj = b[j] + offset;
            if a[i].almost_equal(bj, TOLERANCE) {
                contacts.push(Contact {
                    contact_type: ContactType::VertexVertex,
                    stationary_idx: i,
                    moving_idx: j,
                });
            } else if bj.on_segment(a[i], a[next_i]) {
                contacts.push(Contact {
                    contact_type: ContactType::VertexOnStationaryEdge,
                    stationary_idx: next_i,
                    moving_idx: j,
                });
            } else if a[i].on_segment(bj, b[next_j] + offset) {
                contacts.push(Contact {
                    contact_type: ContactType::VertexOnMovingEdge,
                    stationary_idx: i,
                    moving_idx: next_j,
                });
            }
        }
    }
    contacts
}

fn slide_vectors(a: &[Point], b: &[Point], offset: Point, contacts: &[Contact], marked: &mut [bool]) -> Vec<SlideVector> {
    let mut vectors = Vec::with_capacity(contacts.len() * 4);
    for contact in contacts {
        let ai = contact.stationary_idx;
        let bi = contact.moving_idx;
        marked[ai] = true;

        let prev_ai = wrap_prev(ai, a.len());
        let next_ai = wrap_next(ai, a.len());
        let (vertex_a, prev_a, next_a) = (a[ai], a[prev_ai], a[next_ai]);
        let (vertex_b, prev_b, next_b) = (b[bi], b[wrap_prev(bi, b.len())], b[wrap_next(bi, b.len())]);

        match contact.contact_type {
            ContactType::VertexVertex => {
                vectors.push(SlideVector {
                    vector: prev_a - vertex_a,
                    stationary_edge: Some((ai, prev_ai)),
                });
                vectors.push(SlideVector {
                    vector: next_a - vertex_a,
                    stationary_edge: Some((ai, next_ai)),
                });
                // B's edges run backwards relative to A
                vectors.push(SlideVector {
                    vector: vertex_b - prev_b,
                    stationary_edge: None,
                });
                vectors.push(SlideVector {
                    vector: vertex_b - next_b,
                    stationary_edge: None,
                });
            }
            ContactType::VertexOnStationaryEdge => {
                let moved_b = vertex_b + offset;
                vectors.push(SlideVector {
                    vector: vertex_a - moved_b,
                    stationary_edge: Some((prev_ai, ai)),
                });
                vectors.push(SlideVector {
                    vector: prev_a - moved_b,
                    stationary_edge: Some((ai, prev_ai)),
                });
            }
            ContactType::VertexOnMovingEdge => {
                vectors.push(SlideVector {
                    vector: vertex_a - (vertex_b + offset),
                    stationary_edge: None,
                });
                vectors.push(SlideVector {
                    vector: vertex_a - (prev_b + offset),
                    stationary_edge: None,
                });
            }
        }
    }
    vectors
}

/// True if `vector` points back along `previous`.
fn reverses(vector: Point, previous: Point) -> bool {
    if vector.dot(previous) >= 0.0 {
        return false;
    }
    let mut unit = vector;
    unit.normalize();
    let mut prev_unit = previous;
    prev_unit.normalize();
    (unit.y * prev_unit.x - unit.x * prev_unit.y).abs() < REVERSAL_TOLERANCE
}

// ============================================================================
// Distance queries
// ============================================================================

/// Signed distance from `p` to the segment `s1`-`s2` along `normal`.
///
/// Unless `infinite` is set, `None` is returned when `p` does not project
/// strictly inside the segment.
pub fn point_distance(p: Point, s1: Point, s2: Point, normal: Point, infinite: bool) -> Option<f64> {
    let mut normal = normal;
    normal.normalize();
    let dir = Point::new(normal.y, -normal.x);

    let pdot = p.dot(dir);
    let s1dot = s1.dot(dir);
    let s2dot = s2.dot(dir);
    let pdotnorm = p.dot(normal);
    let s1dotnorm = s1.dot(normal);
    let s2dotnorm = s2.dot(normal);

    if !infinite {
        let le = |x: f64, y: f64| x < y || almost_equal(x, y, TOLERANCE);
        let ge = |x: f64, y: f64| x > y || almost_equal(x, y, TOLERANCE);
        if (le(pdot, s1dot) && le(pdot, s2dot)) || (ge(pdot, s1dot) && ge(pdot, s2dot)) {
            return None;
        }
        let on_both = almost_equal(pdot, s1dot, TOLERANCE) && almost_equal(pdot, s2dot, TOLERANCE);
        if on_both && pdotnorm > s1dotnorm && pdotnorm > s2dotnorm {
            return Some((pdotnorm - s1dotnorm).min(pdotnorm - s2dotnorm));
        }
        if on_both && pdotnorm < s1dotnorm && pdotnorm < s2dotnorm {
            return Some(-(s1dotnorm - pdotnorm).min(s2dotnorm - pdotnorm));
        }
    }

    Some(-(pdotnorm - s1dotnorm + (s1dotnorm - s2dotnorm) * (s1dot - pdot) / (s1dot - s2dot)))
}

/// Distance segment `a`-`b` can travel along `direction` (a unit vector)
/// before hitting segment `e`-`f`. `None` if the segments never meet or only
/// graze each other.
pub fn segment_distance(a: Point, b: Point, e: Point, f: Point, direction: Point) -> Option<f64> {
    let normal = Point::new(direction.y, -direction.x);
    let reverse = -direction;

    let dot_a = a.dot(normal);
    let dot_b = b.dot(normal);
    let dot_e = e.dot(normal);
    let dot_f = f.dot(normal);

    let cross_a = a.dot(direction);
    let cross_b = b.dot(direction);
    let cross_e = e.dot(direction);
    let cross_f = f.dot(direction);

    let ab_min = dot_a.min(dot_b);
    let ab_max = dot_a.max(dot_b);
    let ef_max = dot_e.max(dot_f);
    let ef_min = dot_e.min(dot_f);

    // segments that merely touch at one point
    if almost_equal(ab_max, ef_min, TOLERANCE) || almost_equal(ab_min, ef_max, TOLERANCE) {
        return None;
    }
    // segments miss each other completely
    if ab_max < ef_min || ab_min > ef_max {
        return None;
    }

    let overlap = if (ab_max > ef_max && ab_min < ef_min) || (ef_max > ab_max && ef_min < ab_min) {
        1.0
    } else {
        let min_max = ab_max.min(ef_max);
        let max_min = ab_min.max(ef_min);
        let max_max = ab_max.max(ef_max);
        let min_min = ab_min.min(ef_min);
        (min_max - max_min) / (max_max - min_min)
    };

    let cross_abe = (e.y - a.y) * (b.x - a.x) - (e.x - a.x) * (b.y - a.y);
    let cross_abf = (f.y - a.y) * (b.x - a.x) - (f.x - a.x) * (b.y - a.y);

    // collinear
    if almost_equal(cross_abe, 0.0, TOLERANCE) && almost_equal(cross_abf, 0.0, TOLERANCE) {
        let mut ab_norm = Point::new(b.y - a.y, a.x - b.x);
        ab_norm.normalize();
        let mut ef_norm = Point::new(f.y - e.y, e.x - f.x);
        ef_norm.normalize();

        // segment normals must point in opposite directions
        if (ab_norm.y * ef_norm.x - ab_norm.x * ef_norm.y).abs() < TOLERANCE && ab_norm.dot(ef_norm) < 0.0 {
            // normal of AB must point along the direction of travel
            let normdot = ab_norm.dot(direction);
            if almost_equal(normdot, 0.0, TOLERANCE) {
                return None;
            }
            if normdot < 0.0 {
                return Some(0.0);
            }
        }
        return None;
    }

    // a touching end point only counts if the other end keeps moving into EF
    let moving_away = |d: Option<f64>, other: Option<f64>| match d {
        Some(d) if almost_equal(d, 0.0, TOLERANCE) => {
            other.map_or(false, |o| o < 0.0 || almost_equal(o * overlap, 0.0, TOLERANCE))
        }
        _ => false,
    };

    let mut distances: Vec<f64> = Vec::with_capacity(4);

    if almost_equal(dot_a, dot_e, TOLERANCE) {
        distances.push(cross_a - cross_e);
    } else if almost_equal(dot_a, dot_f, TOLERANCE) {
        distances.push(cross_a - cross_f);
    } else if dot_a > ef_min && dot_a < ef_max {
        let d = point_distance(a, e, f, reverse, false);
        if !moving_away(d, point_distance(b, e, f, reverse, true)) {
            distances.extend(d);
        }
    }

    if almost_equal(dot_b, dot_e, TOLERANCE) {
        distances.push(cross_b - cross_e);
    } else if almost_equal(dot_b, dot_f, TOLERANCE) {
        distances.push(cross_b - cross_f);
    } else if dot_b > ef_min && dot_b < ef_max {
        let d = point_distance(b, e, f, reverse, false);
        if !moving_away(d, point_distance(a, e, f, reverse, true)) {
            distances.extend(d);
        }
    }

    if dot_e > ab_min && dot_e < ab_max {
        let d = point_distance(e, a, b, direction, false);
        if !moving_away(d, point_distance(f, a, b, direction, true)) {
            distances.extend(d);
        }
    }

    if dot_f > ab_min && dot_f < ab_max {
        let d = point_distance(f, a, b, direction, false);
        if !moving_away(d, point_distance(e, a, b, direction, true)) {
            distances.extend(d);
        }
    }

    distances.into_iter().reduce(f64::min)
}

/// Largest distance B (at `offset`) can slide along `direction` before one of
/// its edges hits an edge of A.
///
/// With `ignore_negative`, distances behind the direction of travel are
/// skipped. The five working points (both edges plus the unit direction)
/// are leased from `pool`.
pub fn polygon_slide_distance(
    pool: &mut PointPool,
    a: &[Point],
    b: &[Point],
    offset: Point,
    direction: Point,
    ignore_negative: bool,
) -> Result<Option<f64>> {
    pool.with_scratch(5, |scratch| {
        let [a1, a2, b1, b2, dir] = scratch else {
            return None;
        };
        dir.update(direction).normalize();

        let mut distance: Option<f64> = None;
        for i in 0..b.len() {
            b1.update(b[i]).translate(offset);
            b2.update(b[wrap_next(i, b.len())]).translate(offset);
            if b1.almost_equal(*b2, TOLERANCE) {
                continue;
            }
            for j in 0..a.len() {
                a1.update(a[j]);
                a2.update(a[wrap_next(j, a.len())]);
                if a1.almost_equal(*a2, TOLERANCE) {
                    continue;
                }
                let Some(d) = segment_distance(*a1, *a2, *b1, *b2, *dir) else {
                    continue;
                };
                if distance.map_or(true, |current| d < current)
                    && (!ignore_negative || d > 0.0 || almost_equal(d, 0.0, TOLERANCE))
                {
                    distance = Some(d);
                }
            }
        }
        distance
    })
}

/// Projects every vertex of B (at `b_offset`) onto the edges of A (at
/// `a_offset`) along `direction` and returns the largest of the per-vertex
/// minimum projections.
pub fn polygon_projection_distance(
    a: &[Point],
    a_offset: Point,
    b: &[Point],
    b_offset: Point,
    direction: Point,
) -> Option<f64> {
    let mut distance: Option<f64> = None;
    for &vertex in b {
        let p = vertex + b_offset;
        let mut min_projection: Option<f64> = None;
        for j in 0..a.len() {
            let s1 = a[j] + a_offset;
            let s2 = a[wrap_next(j, a.len())] + a_offset;
            if ((s2.y - s1.y) * direction.x - (s2.x - s1.x) * direction.y).abs() < TOLERANCE {
                continue;
            }
            if let Some(d) = point_distance(p, s1, s2, direction, false) {
                if min_projection.map_or(true, |m| d < m) {
                    min_projection = Some(d);
                }
            }
        }
        if let Some(m) = min_projection {
            if distance.map_or(true, |d| m > d) {
                distance = Some(m);
            }
        }
    }
    distance
}

// ============================================================================
// Intersection and start positions
// ============================================================================

fn straddles(first: Option<bool>, second: Option<bool>) -> bool {
    matches!((first, second), (Some(true), Some(false)) | (Some(false), Some(true)))
}

/// Neighbour indices around edge `i`-`i+1`, skipping a neighbour that
/// coincides with the edge end it is adjacent to.
fn edge_neighbours(points: &[Point], i: usize) -> (usize, usize) {
    let n = points.len();
    let next = wrap_next(i, n);
    let mut before = wrap_prev(i, n);
    if points[before].almost_equal(points[i], TOLERANCE) {
        before = wrap_prev(before, n);
    }
    let mut after = wrap_next(next, n);
    if points[after].almost_equal(points[next], TOLERANCE) {
        after = wrap_next(after, n);
    }
    (before, after)
}

/// True if A and B (at `offset`) overlap. Touching outlines do not count;
/// a vertex on the other outline only counts if its neighbours lie on
/// opposite sides.
pub fn polygons_intersect(a: &[Point], b: &[Point], offset: Point) -> bool {
    let origin = Point::default();
    for i in 0..a.len() {
        let (prev_a, next_a) = edge_neighbours(a, i);
        let a0 = a[prev_a];
        let a1 = a[i];
        let a2 = a[wrap_next(i, a.len())];
        let a3 = a[next_a];

        for j in 0..b.len() {
            let (prev_b, next_b) = edge_neighbours(b, j);
            let b0 = b[prev_b] + offset;
            let b1 = b[j] + offset;
            let b2 = b[wrap_next(j, b.len())] + offset;
            let b3 = b[next_b] + offset;

            if b1.on_segment(a1, a2) || a1.almost_equal(b1, TOLERANCE) {
                if straddles(point_in_polygon(b0, a, origin), point_in_polygon(b2, a, origin)) {
                    return true;
                }
                continue;
            }
            if b2.on_segment(a1, a2) || a2.almost_equal(b2, TOLERANCE) {
                if straddles(point_in_polygon(b1, a, origin), point_in_polygon(b3, a, origin)) {
                    return true;
                }
                continue;
            }
            if a1.on_segment(b1, b2) || a1.almost_equal(b2, TOLERANCE) {
                if straddles(point_in_polygon(a0, b, offset), point_in_polygon(a2, b, offset)) {
                    return true;
                }
                continue;
            }
            if a2.on_segment(b1, b2) || a2.almost_equal(b1, TOLERANCE) {
                if straddles(point_in_polygon(a1, b, offset), point_in_polygon(a3, b, offset)) {
                    return true;
                }
                continue;
            }
            if line_intersect(b1, b2, a1, a2, false).is_some() {
                return true;
            }
        }
    }
    false
}

/// Inside/outside state of B at `offset`, decided by the first vertex of B
/// that is not on A's outline.
fn moving_inside(a: &[Point], b: &[Point], offset: Point) -> Option<bool> {
    b.iter()
        .find_map(|&p| point_in_polygon(p + offset, a, Point::default()))
}

fn on_known_loop(reference: Point, loops: &[Vec<Point>]) -> bool {
    loops
        .iter()
        .flatten()
        .any(|p| p.almost_equal(reference, TOLERANCE))
}

/// Looks for an offset where B touches A from the requested side without
/// overlapping it and whose reference point is not on a known loop.
///
/// Every vertex of A is tried at most once per NFP computation; `marked`
/// records the vertices already explored, including those visited while
/// tracing loops.
pub fn search_start_point(
    a: &[Point],
    b: &[Point],
    inside: bool,
    loops: &[Vec<Point>],
    marked: &mut [bool],
) -> Option<Point> {
    let valid = |offset: Point, b_inside: bool| {
        b_inside == inside && !polygons_intersect(a, b, offset) && !on_known_loop(b[0] + offset, loops)
    };

    for i in 0..a.len() {
        if marked[i] {
            continue;
        }
        marked[i] = true;

        for &vertex in b {
            let mut offset = a[i] - vertex;
            // A and B are the same shape
            let mut b_inside = moving_inside(a, b, offset)?;
            if valid(offset, b_inside) {
                return Some(offset);
            }

            // slide B along the edge of A until they no longer overlap
            let mut v = a[wrap_next(i, a.len())] - a[i];
            let origin = Point::default();
            let d1 = polygon_projection_distance(a, origin, b, offset, v);
            let d2 = polygon_projection_distance(b, offset, a, origin, -v);
            let d = match (d1, d2) {
                (Some(d1), Some(d2)) => d1.min(d2),
                (Some(d), None) | (None, Some(d)) => d,
                (None, None) => continue,
            };
            if d <= 0.0 || almost_equal(d, 0.0, TOLERANCE) {
                continue;
            }

            let vd2 = v.length_squared();
            if d * d < vd2 && !almost_equal(d * d, vd2, TOLERANCE) {
                v.scale(d / vd2.sqrt());
            }
            offset += v;

            if let Some(state) = moving_inside(a, b, offset) {
                b_inside = state;
            }
            if valid(offset, b_inside) {
                return Some(offset);
            }
        }
    }
    None
}

// ============================================================================
// Orbiting
// ============================================================================

/// Index of the first vertex with the smallest (`lowest`) or largest y.
fn extreme_y(points: &[Point], lowest: bool) -> usize {
    let mut best = 0;
    for (i, p) in points.iter().enumerate().skip(1) {
        let better = if lowest {
            p.y < points[best].y
        } else {
            p.y > points[best].y
        };
        if better {
            best = i;
        }
    }
    best
}

/// Traces one NFP loop starting with B at `start`. Returns `None` when the
/// orbit gets stuck or does not close within the step cap.
fn trace_loop(
    pool: &mut PointPool,
    a: &[Point],
    b: &[Point],
    start: Point,
    marked: &mut [bool],
) -> Result<Option<Vec<Point>>> {
    let mut offset = start;
    let start_reference = b[0] + start;
    let mut reference = start_reference;
    let mut nfp = vec![reference];
    let mut previous: Option<Point> = None;
    let cap = 10 * (a.len() + b.len());

    for _ in 0..cap {
        let contacts = find_contacts(a, b, offset);
        let candidates = slide_vectors(a, b, offset, &contacts, marked);

        // the first candidate reaching the largest distance wins
        let mut best: Option<(SlideVector, f64)> = None;
        for candidate in candidates {
            let v = candidate.vector;
            if v.x == 0.0 && v.y == 0.0 {
                continue;
            }
            if previous.map_or(false, |p| reverses(v, p)) {
                continue;
            }

            let length2 = v.length_squared();
            let d = match polygon_slide_distance(pool, a, b, offset, v, true)? {
                Some(d) if d * d <= length2 => d,
                _ => length2.sqrt(),
            };
            if d > best.map_or(0.0, |(_, max)| max) {
                best = Some((candidate, d));
            }
        }

        let (mut chosen, max_d) = match best {
            Some((chosen, d)) if !almost_equal(d, 0.0, TOLERANCE) => (chosen, d),
            _ => {
                log::debug!("orbit stuck after {} points", nfp.len());
                return Ok(None);
            }
        };

        if let Some((s, e)) = chosen.stationary_edge {
            marked[s] = true;
            marked[e] = true;
        }

        let length2 = chosen.vector.length_squared();
        if max_d * max_d < length2 && !almost_equal(max_d * max_d, length2, TOLERANCE) {
            chosen.vector.scale((max_d * max_d / length2).sqrt());
        }
        previous = Some(chosen.vector);

        reference += chosen.vector;
        if reference.almost_equal(start_reference, TOLERANCE) {
            return Ok(Some(nfp));
        }
        // starting on a shared horizontal edge can close the loop elsewhere
        if nfp[..nfp.len() - 1]
            .iter()
            .any(|p| reference.almost_equal(*p, TOLERANCE))
        {
            return Ok(Some(nfp));
        }

        nfp.push(reference);
        offset += chosen.vector;
    }

    log::warn!("no-fit polygon loop did not close within {} steps", cap);
    Ok(None)
}

/// Computes the NFP loops of B orbiting A (or inside A with `inside`).
///
/// Loop points are positions of B's first vertex. Returns no loops for
/// polygons with fewer than three points or when no valid start position
/// exists.
pub fn orbit(pool: &mut PointPool, a: &[Point], b: &[Point], inside: bool) -> Result<Vec<Vec<Point>>> {
    if a.len() < 3 || b.len() < 3 {
        return Ok(Vec::new());
    }

    let mut marked = vec![false; a.len()];
    let mut loops: Vec<Vec<Point>> = Vec::new();

    let mut start = if inside {
        search_start_point(a, b, true, &loops, &mut marked)
    } else {
        // B's top vertex on A's bottom vertex cannot overlap
        Some(a[extreme_y(a, true)] - b[extreme_y(b, false)])
    };

    while let Some(offset) = start {
        if let Some(nfp) = trace_loop(pool, a, b, offset, &mut marked)? {
            loops.push(nfp);
        }
        start = search_start_point(a, b, inside, &loops, &mut marked);
    }

    Ok(loops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use polynest_core::signed_area;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&p| Point::from(p)).collect()
    }

    fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
        pts(&[(x, y), (x + size, y), (x + size, y + size), (x, y + size)])
    }

    #[test]
    fn test_point_distance_projects_inside_segment() {
        let d = point_distance(
            Point::new(5.0, 3.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, -1.0),
            false,
        );
        assert_relative_eq!(d.unwrap(), 3.0);
        let outside = point_distance(
            Point::new(15.0, 3.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, -1.0),
            false,
        );
        assert!(outside.is_none());
    }

    #[test]
    fn test_segment_distance_head_on() {
        // EF at x = -10 slides right into AB at x = 0
        let d = segment_distance(
            Point::new(0.0, 0.0),
            Point::new(0.0, 4.0),
            Point::new(-10.0, -2.0),
            Point::new(-10.0, 6.0),
            Point::new(1.0, 0.0),
        );
        assert_relative_eq!(d.unwrap(), 10.0);

        // moving away gives a negative distance
        let d = segment_distance(
            Point::new(0.0, 0.0),
            Point::new(0.0, 4.0),
            Point::new(10.0, -2.0),
            Point::new(10.0, 6.0),
            Point::new(1.0, 0.0),
        );
        assert_relative_eq!(d.unwrap(), -10.0);
    }

    #[test]
    fn test_segment_distance_misses() {
        let d = segment_distance(
            Point::new(0.0, 0.0),
            Point::new(0.0, 4.0),
            Point::new(10.0, 5.0),
            Point::new(10.0, 9.0),
            Point::new(1.0, 0.0),
        );
        assert!(d.is_none());
    }

    #[test]
    fn test_slide_distance_between_squares() {
        let mut pool = PointPool::new();
        let a = square(0.0, 0.0, 10.0);
        let b = square(0.0, 0.0, 5.0);
        let d = polygon_slide_distance(&mut pool, &a, &b, Point::new(-20.0, 2.0), Point::new(1.0, 0.0), true)
            .unwrap();
        assert_relative_eq!(d.unwrap(), 15.0);
        assert_eq!(pool.available(), polynest_core::POOL_CAPACITY);
    }

    #[test]
    fn test_projection_distance() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(0.0, 0.0, 5.0);
        let d = polygon_projection_distance(&a, Point::default(), &b, Point::new(-20.0, 2.0), Point::new(1.0, 0.0));
        // the trailing vertices are 20 away from A's left edge
        assert_relative_eq!(d.unwrap(), 20.0);
    }

    #[test]
    fn test_polygons_intersect() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(0.0, 0.0, 4.0);
        assert!(polygons_intersect(&a, &b, Point::new(8.0, 3.0)));
        assert!(!polygons_intersect(&a, &b, Point::new(20.0, 3.0)));
        // edge to edge contact is not an overlap
        assert!(!polygons_intersect(&a, &b, Point::new(10.0, 3.0)));
        assert!(!polygons_intersect(&a, &b, Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_find_contacts() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(0.0, 0.0, 4.0);
        let contacts = find_contacts(&a, &b, Point::new(10.0, 10.0));
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].contact_type, ContactType::VertexVertex);
        assert_eq!((contacts[0].stationary_idx, contacts[0].moving_idx), (2, 0));

        let contacts = find_contacts(&a, &b, Point::new(10.0, 3.0));
        assert!(contacts
            .iter()
            .any(|c| c.contact_type == ContactType::VertexOnStationaryEdge));
    }

    #[test]
    fn test_reverses() {
        assert!(reverses(Point::new(-2.0, 0.0), Point::new(1.0, 0.0)));
        assert!(!reverses(Point::new(-2.0, 1.0), Point::new(1.0, 0.0)));
        assert!(!reverses(Point::new(2.0, 0.0), Point::new(1.0, 0.0)));
    }

    #[test]
    fn test_orbit_square_around_square() {
        let mut pool = PointPool::new();
        let a = square(0.0, 0.0, 10.0);
        let b = square(0.0, 0.0, 5.0);
        let loops = orbit(&mut pool, &a, &b, false).unwrap();
        assert_eq!(loops.len(), 1);
        // Minkowski difference of the two squares: 15 x 15
        assert_relative_eq!(signed_area(&loops[0]).abs(), 225.0, epsilon = 1e-6);
    }

    #[test]
    fn test_orbit_inside_square() {
        let mut pool = PointPool::new();
        let a = square(0.0, 0.0, 10.0);
        let b = square(0.0, 0.0, 4.0);
        let loops = orbit(&mut pool, &a, &b, true).unwrap();
        assert_eq!(loops.len(), 1);
        assert_relative_eq!(signed_area(&loops[0]).abs(), 36.0, epsilon = 1e-6);
    }

    #[test]
    fn test_orbit_too_big_inside() {
        let mut pool = PointPool::new();
        let a = square(0.0, 0.0, 10.0);
        let b = square(0.0, 0.0, 12.0);
        assert!(orbit(&mut pool, &a, &b, true).unwrap().is_empty());
    }

    #[test]
    fn test_orbit_degenerate() {
        let mut pool = PointPool::new();
        let a = square(0.0, 0.0, 10.0);
        let b = pts(&[(0.0, 0.0), (1.0, 0.0)]);
        assert!(orbit(&mut pool, &a, &b, false).unwrap().is_empty());
    }
}
