//! Edge table construction: paths become doubly linked edge rings, which are
//! then split into left and right bounds hanging off local minima.

use super::engine::ClippingEngine;
use super::{IntPoint, PolyType, HI_RANGE, LO_RANGE};

pub(super) type EdgeId = usize;

/// Dx of a horizontal edge.
pub(super) const HORIZONTAL: f64 = -1.0e40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum EdgeSide {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub(super) struct TEdge {
    pub bot: IntPoint,
    pub curr: IntPoint,
    pub top: IntPoint,
    pub delta: IntPoint,
    pub dx: f64,
    pub poly_typ: PolyType,
    pub side: EdgeSide,
    pub wind_delta: i32,
    pub wind_cnt: i32,
    pub wind_cnt2: i32,
    pub out_idx: Option<usize>,
    pub next: EdgeId,
    pub prev: EdgeId,
    pub next_in_lml: Option<EdgeId>,
    pub next_in_ael: Option<EdgeId>,
    pub prev_in_ael: Option<EdgeId>,
    pub next_in_sel: Option<EdgeId>,
    pub prev_in_sel: Option<EdgeId>,
}

impl TEdge {
    fn new(curr: IntPoint, next: EdgeId, prev: EdgeId) -> Self {
        Self {
            bot: IntPoint::default(),
            curr,
            top: IntPoint::default(),
            delta: IntPoint::default(),
            dx: 0.0,
            poly_typ: PolyType::Subject,
            side: EdgeSide::Left,
            wind_delta: 0,
            wind_cnt: 0,
            wind_cnt2: 0,
            out_idx: None,
            next,
            prev,
            next_in_lml: None,
            next_in_ael: None,
            prev_in_ael: None,
            next_in_sel: None,
            prev_in_sel: None,
        }
    }

    #[inline]
    pub fn is_horizontal(&self) -> bool {
        self.delta.y == 0
    }

    /// X of the edge at scanline `y`.
    #[inline]
    pub fn top_x(&self, y: i64) -> i64 {
        if y == self.top.y {
            self.top.x
        } else {
            self.bot.x + super::clipper_round(self.dx * (y - self.bot.y) as f64)
        }
    }

    fn set_dx(&mut self) {
        self.delta = IntPoint::new(self.top.x - self.bot.x, self.top.y - self.bot.y);
        self.dx = if self.delta.y == 0 {
            HORIZONTAL
        } else {
            self.delta.x as f64 / self.delta.y as f64
        };
    }

    fn reverse_horizontal(&mut self) {
        std::mem::swap(&mut self.top.x, &mut self.bot.x);
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) struct LocalMinimum {
    pub y: i64,
    pub left_bound: EdgeId,
    pub right_bound: EdgeId,
}

/// Slope equality of two edges.
pub(super) fn edge_slopes_equal(e1: &TEdge, e2: &TEdge, full_range: bool) -> bool {
    if full_range {
        i128::from(e1.delta.y) * i128::from(e2.delta.x) == i128::from(e1.delta.x) * i128::from(e2.delta.y)
    } else {
        e1.delta.y.wrapping_mul(e2.delta.x) == e1.delta.x.wrapping_mul(e2.delta.y)
    }
}

/// Slope equality of `pt1 -> pt2` and `pt2 -> pt3`.
pub(super) fn slopes_equal3(pt1: IntPoint, pt2: IntPoint, pt3: IntPoint, full_range: bool) -> bool {
    slopes_equal4(pt1, pt2, pt2, pt3, full_range)
}

/// Slope equality of `pt1 -> pt2` and `pt3 -> pt4`.
pub(super) fn slopes_equal4(
    pt1: IntPoint,
    pt2: IntPoint,
    pt3: IntPoint,
    pt4: IntPoint,
    full_range: bool,
) -> bool {
    if full_range {
        i128::from(pt1.y - pt2.y) * i128::from(pt3.x - pt4.x)
            == i128::from(pt1.x - pt2.x) * i128::from(pt3.y - pt4.y)
    } else {
        (pt1.y - pt2.y).wrapping_mul(pt3.x - pt4.x) == (pt1.x - pt2.x).wrapping_mul(pt3.y - pt4.y)
    }
}

pub(super) fn pt2_is_between_pt1_and_pt3(pt1: IntPoint, pt2: IntPoint, pt3: IntPoint) -> bool {
    if pt1 == pt3 || pt1 == pt2 || pt3 == pt2 {
        false
    } else if pt1.x != pt3.x {
        (pt2.x > pt1.x) == (pt2.x < pt3.x)
    } else {
        (pt2.y > pt1.y) == (pt2.y < pt3.y)
    }
}

/// Returns false when the point is outside the accepted range and switches
/// to full range arithmetic when it exceeds [`LO_RANGE`].
fn range_test(pt: IntPoint, full_range: &mut bool) -> bool {
    let max = pt.x.abs().max(pt.y.abs());
    if *full_range {
        max <= HI_RANGE
    } else if max > LO_RANGE {
        *full_range = true;
        max <= HI_RANGE
    } else {
        true
    }
}

impl ClippingEngine {
    /// Adds a closed path. Returns false when the path has fewer than three
    /// distinct non-collinear vertices, is completely flat, or holds a
    /// coordinate outside the accepted range.
    pub fn add_path(&mut self, path: &[IntPoint], poly_typ: PolyType) -> bool {
        let mut high = match path.len().checked_sub(1) {
            Some(high) => high,
            None => return false,
        };
        while high > 0 && path[high] == path[0] {
            high -= 1;
        }
        while high > 0 && path[high] == path[high - 1] {
            high -= 1;
        }
        if high < 2 {
            return false;
        }

        let mut full_range = self.use_full_range;
        if !path[..=high].iter().all(|&pt| range_test(pt, &mut full_range)) {
            log::warn!("clipping path rejected: coordinate outside the accepted range");
            return false;
        }

        // Ring of edges appended to the arena; rolled back if rejected.
        let base = self.edges.len();
        for i in 0..=high {
            let next = base + if i == high { 0 } else { i + 1 };
            let prev = base + if i == 0 { high } else { i - 1 };
            self.edges.push(TEdge::new(path[i], next, prev));
        }

        // Remove duplicate vertices and collinear edges.
        let mut e_start = base;
        let mut e = e_start;
        let mut e_loop_stop = e_start;
        loop {
            let (curr, next) = (self.edges[e].curr, self.edges[e].next);
            if curr == self.edges[next].curr {
                if e == next {
                    break;
                }
                if e == e_start {
                    e_start = next;
                }
                e = self.remove_edge(e);
                e_loop_stop = e;
                continue;
            }
            let prev = self.edges[e].prev;
            if prev == next {
                break;
            }
            if slopes_equal3(self.edges[prev].curr, curr, self.edges[next].curr, full_range)
                && (!self.preserve_collinear
                    || !pt2_is_between_pt1_and_pt3(self.edges[prev].curr, curr, self.edges[next].curr))
            {
                if e == e_start {
                    e_start = next;
                }
                e = self.remove_edge(e);
                e = self.edges[e].prev;
                e_loop_stop = e;
                continue;
            }
            e = next;
            if e == e_loop_stop {
                break;
            }
        }

        if self.edges[e].prev == self.edges[e].next {
            self.edges.truncate(base);
            return false;
        }

        // Second stage of edge initialisation.
        let mut is_flat = true;
        e = e_start;
        loop {
            self.init_edge2(e, poly_typ);
            e = self.edges[e].next;
            if is_flat && self.edges[e].curr.y != self.edges[e_start].curr.y {
                is_flat = false;
            }
            if e == e_start {
                break;
            }
        }
        if is_flat {
            self.edges.truncate(base);
            return false;
        }

        self.use_full_range = full_range;

        let mut e_min: Option<EdgeId> = None;
        loop {
            e = self.find_next_loc_min(e);
            if Some(e) == e_min {
                break;
            }
            if e_min.is_none() {
                e_min = Some(e);
            }

            // e and e.prev share a local minimum; the smaller dx starts the
            // left bound.
            let prev = self.edges[e].prev;
            let (left, right, left_is_forward) = if self.edges[e].dx < self.edges[prev].dx {
                (prev, e, false)
            } else {
                (e, prev, true)
            };
            let lm = LocalMinimum {
                y: self.edges[e].bot.y,
                left_bound: left,
                right_bound: right,
            };

            let wind = if self.edges[left].next == right { -1 } else { 1 };
            self.edges[left].wind_delta = wind;
            self.edges[right].wind_delta = -wind;

            let e_left = self.process_bound(left, left_is_forward);
            let e_right = self.process_bound(right, !left_is_forward);
            self.minima.push(lm);
            e = if left_is_forward { e_left } else { e_right };
        }
        true
    }

    /// Adds several closed paths; true if at least one was accepted.
    pub fn add_paths(&mut self, paths: &[Vec<IntPoint>], poly_typ: PolyType) -> bool {
        let mut added = false;
        for path in paths {
            if self.add_path(path, poly_typ) {
                added = true;
            }
        }
        added
    }

    fn remove_edge(&mut self, e: EdgeId) -> EdgeId {
        let (prev, next) = (self.edges[e].prev, self.edges[e].next);
        self.edges[prev].next = next;
        self.edges[next].prev = prev;
        next
    }

    fn init_edge2(&mut self, e: EdgeId, poly_typ: PolyType) {
        let next_curr = self.edges[self.edges[e].next].curr;
        let edge = &mut self.edges[e];
        if edge.curr.y >= next_curr.y {
            edge.bot = edge.curr;
            edge.top = next_curr;
        } else {
            edge.top = edge.curr;
            edge.bot = next_curr;
        }
        edge.set_dx();
        edge.poly_typ = poly_typ;
    }

    fn find_next_loc_min(&self, mut e: EdgeId) -> EdgeId {
        let edges = &self.edges;
        loop {
            while edges[e].bot != edges[edges[e].prev].bot || edges[e].curr == edges[e].top {
                e = edges[e].next;
            }
            if !edges[e].is_horizontal() && !edges[edges[e].prev].is_horizontal() {
                break;
            }
            while edges[edges[e].prev].is_horizontal() {
                e = edges[e].prev;
            }
            let e2 = e;
            while edges[e].is_horizontal() {
                e = edges[e].next;
            }
            if edges[e].top.y == edges[edges[e].prev].bot.y {
                // an intermediate horizontal
                continue;
            }
            if edges[edges[e2].prev].bot.x < edges[e].bot.x {
                e = e2;
            }
            break;
        }
        e
    }

    /// Links one bound through `next_in_lml` and returns the first edge past
    /// its top.
    fn process_bound(&mut self, mut e: EdgeId, next_is_forward: bool) -> EdgeId {
        let mut result = e;

        if self.edges[e].is_horizontal() {
            // Consecutive horizontals may head left before going right.
            let e_start = if next_is_forward {
                self.edges[e].prev
            } else {
                self.edges[e].next
            };
            let bot_x = self.edges[e].bot.x;
            if self.edges[e_start].is_horizontal() {
                if self.edges[e_start].bot.x != bot_x && self.edges[e_start].top.x != bot_x {
                    self.edges[e].reverse_horizontal();
                }
            } else if self.edges[e_start].bot.x != bot_x {
                self.edges[e].reverse_horizontal();
            }
        }

        let e_start = e;
        if next_is_forward {
            while self.edges[result].top.y == self.edges[self.edges[result].next].bot.y {
                result = self.edges[result].next;
            }
            if self.edges[result].is_horizontal() {
                // A top horizontal joins this bound only when the preceding
                // edge attaches to its left vertex.
                let mut horz = result;
                while self.edges[self.edges[horz].prev].is_horizontal() {
                    horz = self.edges[horz].prev;
                }
                let horz_prev = self.edges[horz].prev;
                if self.edges[horz_prev].top.x > self.edges[self.edges[result].next].top.x {
                    result = horz_prev;
                }
            }
            while e != result {
                self.edges[e].next_in_lml = Some(self.edges[e].next);
                self.reverse_trailing_horizontal(e, e_start, self.edges[e].prev);
                e = self.edges[e].next;
            }
            self.reverse_trailing_horizontal(e, e_start, self.edges[e].prev);
            self.edges[result].next
        } else {
            while self.edges[result].top.y == self.edges[self.edges[result].prev].bot.y {
                result = self.edges[result].prev;
            }
            if self.edges[result].is_horizontal() {
                let mut horz = result;
                while self.edges[self.edges[horz].next].is_horizontal() {
                    horz = self.edges[horz].next;
                }
                let horz_next = self.edges[horz].next;
                if self.edges[horz_next].top.x >= self.edges[self.edges[result].prev].top.x {
                    result = horz_next;
                }
            }
            while e != result {
                self.edges[e].next_in_lml = Some(self.edges[e].prev);
                self.reverse_trailing_horizontal(e, e_start, self.edges[e].next);
                e = self.edges[e].prev;
            }
            self.reverse_trailing_horizontal(e, e_start, self.edges[e].next);
            self.edges[result].prev
        }
    }

    fn reverse_trailing_horizontal(&mut self, e: EdgeId, e_start: EdgeId, behind: EdgeId) {
        if self.edges[e].is_horizontal()
            && e != e_start
            && self.edges[e].bot.x != self.edges[behind].top.x
        {
            self.edges[e].reverse_horizontal();
        }
    }

    /// Rewinds the minima list, scanbeam and edge state before a sweep.
    pub(super) fn reset(&mut self) {
        self.current_lm = 0;
        self.scanbeam.clear();
        self.minima.sort_by(|a, b| b.y.cmp(&a.y));
        for i in 0..self.minima.len() {
            let lm = self.minima[i];
            self.insert_scanbeam(lm.y);
            for (id, side) in [
                (lm.left_bound, EdgeSide::Left),
                (lm.right_bound, EdgeSide::Right),
            ] {
                let edge = &mut self.edges[id];
                edge.curr = edge.bot;
                edge.side = side;
                edge.out_idx = None;
            }
        }
        self.active_edges = None;
    }

    pub(super) fn pop_local_minima(&mut self, y: i64) -> Option<LocalMinimum> {
        let lm = *self.minima.get(self.current_lm)?;
        if lm.y != y {
            return None;
        }
        self.current_lm += 1;
        Some(lm)
    }

    pub(super) fn local_minima_pending(&self) -> bool {
        self.current_lm < self.minima.len()
    }

    pub(super) fn insert_scanbeam(&mut self, y: i64) {
        self.scanbeam.push(y);
    }

    /// Pops the largest pending scanline, dropping duplicates.
    pub(super) fn pop_scanbeam(&mut self) -> Option<i64> {
        let y = self.scanbeam.pop()?;
        while self.scanbeam.peek() == Some(&y) {
            self.scanbeam.pop();
        }
        Some(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(x: i64, y: i64) -> IntPoint {
        IntPoint::new(x, y)
    }

    #[test]
    fn test_range_test_switches_to_full_range() {
        let mut full = false;
        assert!(range_test(ip(LO_RANGE, -LO_RANGE), &mut full));
        assert!(!full);
        assert!(range_test(ip(LO_RANGE + 1, 0), &mut full));
        assert!(full);
        assert!(!range_test(ip(0, HI_RANGE + 1), &mut full));
    }

    #[test]
    fn test_slopes_equal_full_range() {
        let big = 3_000_000_000;
        let a = ip(0, 0);
        let b = ip(big, big + 1);
        let c = ip(2 * big, 2 * big + 2);
        assert!(slopes_equal3(a, b, c, true));
        assert!(!slopes_equal3(a, b, ip(2 * big, 2 * big + 3), true));
    }

    #[test]
    fn test_add_path_rejects_degenerate() {
        let mut clipper = ClippingEngine::new();
        assert!(!clipper.add_path(&[ip(0, 0), ip(10, 0)], PolyType::Subject));
        assert!(!clipper.add_path(&[ip(0, 0), ip(5, 0), ip(10, 0)], PolyType::Subject));
        assert!(!clipper.add_path(&[ip(0, 0), ip(0, 0), ip(0, 0), ip(0, 0)], PolyType::Subject));
        assert!(!clipper.add_path(&[ip(0, 0), ip(5, 5), ip(10, 10), ip(0, 0)], PolyType::Subject));
        assert!(clipper.add_path(&[ip(0, 0), ip(10, 0), ip(5, 5)], PolyType::Subject));
    }

    #[test]
    fn test_local_minima_of_square() {
        let mut clipper = ClippingEngine::new();
        assert!(clipper.add_path(&[ip(0, 0), ip(10, 0), ip(10, 10), ip(0, 10)], PolyType::Subject));
        assert_eq!(clipper.minima.len(), 1);
        assert_eq!(clipper.minima[0].y, 10);
    }
}
