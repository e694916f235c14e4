//! The scanbeam sweep: active edge list maintenance, winding counts,
//! horizontal edges, intersections and maxima.

use std::collections::BinaryHeap;

use super::edge::{edge_slopes_equal, slopes_equal4, EdgeId, LocalMinimum, TEdge};
use super::output::{GhostJoin, Join, OutPt, OutPtId, OutRec};
use super::{ClipType, IntPoint, Paths, PolyFillType, PolyType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Direction {
    LeftToRight,
    RightToLeft,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct IntersectNode {
    pub edge1: EdgeId,
    pub edge2: EdgeId,
    pub pt: IntPoint,
}

/// Edge lists threaded through [`TEdge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum List {
    Active,
    Sorted,
}

#[derive(Debug)]
pub(super) enum SweepError {
    /// Nothing was added.
    Empty,
    /// The sweep reached a state it cannot resolve.
    Invariant(&'static str),
}

pub(super) type Sweep<T = ()> = std::result::Result<T, SweepError>;

/// Boolean operations on closed integer paths.
///
/// Paths are added as subject or clip, then [`execute`](Self::execute)
/// sweeps them and returns the resulting outer loops and holes. Added paths
/// survive an execute, so the same engine can run several operations in
/// sequence; output state never does.
///
/// ```
/// use polynest_d2::clipper::{ClipType, ClippingEngine, IntPoint, PolyFillType, PolyType};
///
/// let square = |x: i64| vec![
///     IntPoint::new(x, 0),
///     IntPoint::new(x + 10, 0),
///     IntPoint::new(x + 10, 10),
///     IntPoint::new(x, 10),
/// ];
/// let mut clipper = ClippingEngine::new();
/// clipper.add_path(&square(0), PolyType::Subject);
/// clipper.add_path(&square(5), PolyType::Subject);
/// let merged = clipper.execute(ClipType::Union, PolyFillType::NonZero).unwrap();
/// assert_eq!(merged.len(), 1);
/// ```
#[derive(Debug)]
pub struct ClippingEngine {
    pub(super) edges: Vec<TEdge>,
    pub(super) minima: Vec<LocalMinimum>,
    pub(super) current_lm: usize,
    pub(super) scanbeam: BinaryHeap<i64>,
    pub(super) active_edges: Option<EdgeId>,
    pub(super) sorted_edges: Option<EdgeId>,
    pub(super) intersections: Vec<IntersectNode>,
    pub(super) maxima: Vec<i64>,
    pub(super) poly_outs: Vec<OutRec>,
    pub(super) out_pts: Vec<OutPt>,
    pub(super) joins: Vec<Join>,
    pub(super) ghost_joins: Vec<GhostJoin>,
    pub(super) use_full_range: bool,
    pub(super) preserve_collinear: bool,
    pub(super) strictly_simple: bool,
    pub(super) reverse_output: bool,
    pub(super) clip_type: ClipType,
    pub(super) subj_fill: PolyFillType,
    pub(super) clip_fill: PolyFillType,
}

impl Default for ClippingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ClippingEngine {
    pub fn new() -> Self {
        Self {
            edges: Vec::new(),
            minima: Vec::new(),
            current_lm: 0,
            scanbeam: BinaryHeap::new(),
            active_edges: None,
            sorted_edges: None,
            intersections: Vec::new(),
            maxima: Vec::new(),
            poly_outs: Vec::new(),
            out_pts: Vec::new(),
            joins: Vec::new(),
            ghost_joins: Vec::new(),
            use_full_range: false,
            preserve_collinear: false,
            strictly_simple: false,
            reverse_output: false,
            clip_type: ClipType::Union,
            subj_fill: PolyFillType::EvenOdd,
            clip_fill: PolyFillType::EvenOdd,
        }
    }

    /// Splits output rings that touch themselves at a vertex.
    pub fn set_strictly_simple(&mut self, value: bool) {
        self.strictly_simple = value;
    }

    /// Emits outer loops with negative area and holes with positive area.
    pub fn set_reverse_solution(&mut self, value: bool) {
        self.reverse_output = value;
    }

    /// Keeps collinear vertices that are not spikes.
    pub fn set_preserve_collinear(&mut self, value: bool) {
        self.preserve_collinear = value;
    }

    /// True once a coordinate beyond [`super::LO_RANGE`] was added.
    pub fn uses_full_range(&self) -> bool {
        self.use_full_range
    }

    /// Drops every added path.
    pub fn clear(&mut self) {
        self.edges.clear();
        self.minima.clear();
        self.current_lm = 0;
        self.use_full_range = false;
        self.dispose_output();
    }

    /// Runs `clip_type` with the same fill rule for subject and clip paths.
    pub fn execute(&mut self, clip_type: ClipType, fill: PolyFillType) -> Option<Paths> {
        self.execute_with(clip_type, fill, fill)
    }

    /// Runs `clip_type`. Returns `None` when nothing usable came out of the
    /// sweep: no paths were added, or the sweep hit a state it could not
    /// resolve (logged as a warning).
    pub fn execute_with(
        &mut self,
        clip_type: ClipType,
        subj_fill: PolyFillType,
        clip_fill: PolyFillType,
    ) -> Option<Paths> {
        self.clip_type = clip_type;
        self.subj_fill = subj_fill;
        self.clip_fill = clip_fill;

        let result = match self.execute_internal() {
            Ok(()) => Some(self.build_result()),
            Err(SweepError::Empty) => {
                log::debug!("clipping skipped: no paths");
                None
            }
            Err(SweepError::Invariant(reason)) => {
                log::warn!("clipping sweep abandoned: {}", reason);
                None
            }
        };
        self.dispose_output();
        result
    }

    fn execute_internal(&mut self) -> Sweep {
        self.reset();
        self.maxima.clear();
        self.sorted_edges = None;

        let mut bot_y = self.pop_scanbeam().ok_or(SweepError::Empty)?;
        self.insert_local_minima_into_ael(bot_y);
        loop {
            let top_y = match self.pop_scanbeam() {
                Some(y) => y,
                None if self.local_minima_pending() => {
                    return Err(SweepError::Invariant("local minima left without a scanbeam"))
                }
                None => break,
            };
            self.process_horizontals()?;
            self.ghost_joins.clear();
            self.process_intersections(top_y)?;
            self.process_edges_at_top_of_scanbeam(top_y)?;
            bot_y = top_y;
            self.insert_local_minima_into_ael(bot_y);
        }

        self.finish_output();
        Ok(())
    }

    pub(super) fn dispose_output(&mut self) {
        self.poly_outs.clear();
        self.out_pts.clear();
        self.joins.clear();
        self.ghost_joins.clear();
        self.intersections.clear();
        self.maxima.clear();
        self.active_edges = None;
        self.sorted_edges = None;
    }

    // ---- fill rules -------------------------------------------------------

    /// Fill rules for `poly_typ` and for the opposite type.
    fn fill_types(&self, poly_typ: PolyType) -> (PolyFillType, PolyFillType) {
        match poly_typ {
            PolyType::Subject => (self.subj_fill, self.clip_fill),
            PolyType::Clip => (self.clip_fill, self.subj_fill),
        }
    }

    fn is_even_odd_fill_type(&self, e: EdgeId) -> bool {
        self.fill_types(self.edges[e].poly_typ).0 == PolyFillType::EvenOdd
    }

    fn is_even_odd_alt_fill_type(&self, e: EdgeId) -> bool {
        self.fill_types(self.edges[e].poly_typ).1 == PolyFillType::EvenOdd
    }

    fn set_winding_count(&mut self, edge: EdgeId) {
        let poly_typ = self.edges[edge].poly_typ;
        let wind_delta = self.edges[edge].wind_delta;

        // nearest preceding edge of the same type
        let mut e = self.edges[edge].prev_in_ael;
        while let Some(id) = e {
            if self.edges[id].poly_typ == poly_typ && self.edges[id].wind_delta != 0 {
                break;
            }
            e = self.edges[id].prev_in_ael;
        }

        let (wind_cnt, wind_cnt2, mut e) = match e {
            None => (wind_delta, 0, self.active_edges),
            Some(prev) => {
                let p = &self.edges[prev];
                let wind_cnt = if self.is_even_odd_fill_type(edge) {
                    wind_delta
                } else if p.wind_cnt * p.wind_delta < 0 {
                    // prev is heading toward zero: outside it
                    if p.wind_cnt.abs() > 1 {
                        if p.wind_delta * wind_delta < 0 {
                            p.wind_cnt
                        } else {
                            p.wind_cnt + wind_delta
                        }
                    } else {
                        wind_delta
                    }
                } else if p.wind_delta * wind_delta < 0 {
                    p.wind_cnt
                } else {
                    p.wind_cnt + wind_delta
                };
                (wind_cnt, p.wind_cnt2, p.next_in_ael)
            }
        };

        let even_odd_alt = self.is_even_odd_alt_fill_type(edge);
        let mut wind_cnt2 = wind_cnt2;
        while let Some(id) = e {
            if id == edge {
                break;
            }
            if even_odd_alt {
                wind_cnt2 = if wind_cnt2 == 0 { 1 } else { 0 };
            } else {
                wind_cnt2 += self.edges[id].wind_delta;
            }
            e = self.edges[id].next_in_ael;
        }

        let edge = &mut self.edges[edge];
        edge.wind_cnt = wind_cnt;
        edge.wind_cnt2 = wind_cnt2;
    }

    pub(super) fn is_contributing(&self, e: EdgeId) -> bool {
        let edge = &self.edges[e];
        let (pft, pft2) = self.fill_types(edge.poly_typ);

        let filled = match pft {
            PolyFillType::EvenOdd => true,
            PolyFillType::NonZero => edge.wind_cnt.abs() == 1,
            PolyFillType::Positive => edge.wind_cnt == 1,
            PolyFillType::Negative => edge.wind_cnt == -1,
        };
        if !filled {
            return false;
        }

        let inside_other = match pft2 {
            PolyFillType::EvenOdd | PolyFillType::NonZero => edge.wind_cnt2 != 0,
            PolyFillType::Positive => edge.wind_cnt2 > 0,
            PolyFillType::Negative => edge.wind_cnt2 < 0,
        };
        match self.clip_type {
            ClipType::Intersection => inside_other,
            ClipType::Union => !inside_other,
            ClipType::Difference => match edge.poly_typ {
                PolyType::Subject => !inside_other,
                PolyType::Clip => inside_other,
            },
            ClipType::Xor => true,
        }
    }

    // ---- edge lists -------------------------------------------------------

    fn head(&self, list: List) -> Option<EdgeId> {
        match list {
            List::Active => self.active_edges,
            List::Sorted => self.sorted_edges,
        }
    }

    fn set_head(&mut self, list: List, e: Option<EdgeId>) {
        match list {
            List::Active => self.active_edges = e,
            List::Sorted => self.sorted_edges = e,
        }
    }

    fn next_in(&self, e: EdgeId, list: List) -> Option<EdgeId> {
        match list {
            List::Active => self.edges[e].next_in_ael,
            List::Sorted => self.edges[e].next_in_sel,
        }
    }

    fn prev_in(&self, e: EdgeId, list: List) -> Option<EdgeId> {
        match list {
            List::Active => self.edges[e].prev_in_ael,
            List::Sorted => self.edges[e].prev_in_sel,
        }
    }

    fn set_next_in(&mut self, e: EdgeId, list: List, value: Option<EdgeId>) {
        match list {
            List::Active => self.edges[e].next_in_ael = value,
            List::Sorted => self.edges[e].next_in_sel = value,
        }
    }

    fn set_prev_in(&mut self, e: EdgeId, list: List, value: Option<EdgeId>) {
        match list {
            List::Active => self.edges[e].prev_in_ael = value,
            List::Sorted => self.edges[e].prev_in_sel = value,
        }
    }

    fn delete_from(&mut self, list: List, e: EdgeId) {
        let prev = self.prev_in(e, list);
        let next = self.next_in(e, list);
        if prev.is_none() && next.is_none() && self.head(list) != Some(e) {
            // already removed
            return;
        }
        match prev {
            Some(p) => self.set_next_in(p, list, next),
            None => self.set_head(list, next),
        }
        if let Some(n) = next {
            self.set_prev_in(n, list, prev);
        }
        self.set_next_in(e, list, None);
        self.set_prev_in(e, list, None);
    }

    pub(super) fn delete_from_ael(&mut self, e: EdgeId) {
        self.delete_from(List::Active, e);
    }

    fn swap_positions(&mut self, list: List, e1: EdgeId, e2: EdgeId) {
        // either edge may already be out of the list
        if self.next_in(e1, list) == self.prev_in(e1, list)
            || self.next_in(e2, list) == self.prev_in(e2, list)
        {
            return;
        }

        if self.next_in(e1, list) == Some(e2) {
            let next = self.next_in(e2, list);
            if let Some(n) = next {
                self.set_prev_in(n, list, Some(e1));
            }
            let prev = self.prev_in(e1, list);
            if let Some(p) = prev {
                self.set_next_in(p, list, Some(e2));
            }
            self.set_prev_in(e2, list, prev);
            self.set_next_in(e2, list, Some(e1));
            self.set_prev_in(e1, list, Some(e2));
            self.set_next_in(e1, list, next);
        } else if self.next_in(e2, list) == Some(e1) {
            let next = self.next_in(e1, list);
            if let Some(n) = next {
                self.set_prev_in(n, list, Some(e2));
            }
            let prev = self.prev_in(e2, list);
            if let Some(p) = prev {
                self.set_next_in(p, list, Some(e1));
            }
            self.set_prev_in(e1, list, prev);
            self.set_next_in(e1, list, Some(e2));
            self.set_prev_in(e2, list, Some(e1));
            self.set_next_in(e2, list, next);
        } else {
            let next = self.next_in(e1, list);
            let prev = self.prev_in(e1, list);
            let e2_next = self.next_in(e2, list);
            let e2_prev = self.prev_in(e2, list);
            self.set_next_in(e1, list, e2_next);
            if let Some(n) = e2_next {
                self.set_prev_in(n, list, Some(e1));
            }
            self.set_prev_in(e1, list, e2_prev);
            if let Some(p) = e2_prev {
                self.set_next_in(p, list, Some(e1));
            }
            self.set_next_in(e2, list, next);
            if let Some(n) = next {
                self.set_prev_in(n, list, Some(e2));
            }
            self.set_prev_in(e2, list, prev);
            if let Some(p) = prev {
                self.set_next_in(p, list, Some(e2));
            }
        }

        if self.prev_in(e1, list).is_none() {
            self.set_head(list, Some(e1));
        } else if self.prev_in(e2, list).is_none() {
            self.set_head(list, Some(e2));
        }
    }

    pub(super) fn swap_positions_in_ael(&mut self, e1: EdgeId, e2: EdgeId) {
        self.swap_positions(List::Active, e1, e2);
    }

    fn add_edge_to_sel(&mut self, e: EdgeId) {
        // horizontals are processed in any order, so push to the front
        let head = self.sorted_edges;
        self.edges[e].prev_in_sel = None;
        self.edges[e].next_in_sel = head;
        if let Some(h) = head {
            self.edges[h].prev_in_sel = Some(e);
        }
        self.sorted_edges = Some(e);
    }

    fn pop_edge_from_sel(&mut self) -> Option<EdgeId> {
        let e = self.sorted_edges?;
        self.delete_from(List::Sorted, e);
        Some(e)
    }

    fn copy_ael_to_sel(&mut self) {
        let mut e = self.active_edges;
        self.sorted_edges = e;
        while let Some(id) = e {
            let edge = &mut self.edges[id];
            edge.prev_in_sel = edge.prev_in_ael;
            edge.next_in_sel = edge.next_in_ael;
            e = edge.next_in_ael;
        }
    }

    /// True if `e2` belongs before `e1` in the active edge list.
    fn e2_inserts_before_e1(&self, e1: EdgeId, e2: EdgeId) -> bool {
        let (a, b) = (&self.edges[e1], &self.edges[e2]);
        if b.curr.x == a.curr.x {
            if b.top.y > a.top.y {
                b.top.x < a.top_x(b.top.y)
            } else {
                a.top.x > b.top_x(a.top.y)
            }
        } else {
            b.curr.x < a.curr.x
        }
    }

    fn insert_edge_into_ael(&mut self, edge: EdgeId, start: Option<EdgeId>) {
        let Some(head) = self.active_edges else {
            self.edges[edge].prev_in_ael = None;
            self.edges[edge].next_in_ael = None;
            self.active_edges = Some(edge);
            return;
        };
        if start.is_none() && self.e2_inserts_before_e1(head, edge) {
            self.edges[edge].prev_in_ael = None;
            self.edges[edge].next_in_ael = Some(head);
            self.edges[head].prev_in_ael = Some(edge);
            self.active_edges = Some(edge);
            return;
        }

        let mut start = start.unwrap_or(head);
        while let Some(next) = self.edges[start].next_in_ael {
            if self.e2_inserts_before_e1(next, edge) {
                break;
            }
            start = next;
        }
        let next = self.edges[start].next_in_ael;
        self.edges[edge].next_in_ael = next;
        if let Some(n) = next {
            self.edges[n].prev_in_ael = Some(edge);
        }
        self.edges[edge].prev_in_ael = Some(start);
        self.edges[start].next_in_ael = Some(edge);
    }

    /// Replaces `e` in the active edge list with the next edge of its bound.
    fn update_edge_into_ael(&mut self, e: EdgeId) -> Sweep<EdgeId> {
        let next = self.edges[e]
            .next_in_lml
            .ok_or(SweepError::Invariant("bound has no further edge"))?;
        let prev_ael = self.edges[e].prev_in_ael;
        let next_ael = self.edges[e].next_in_ael;
        match prev_ael {
            Some(p) => self.edges[p].next_in_ael = Some(next),
            None => self.active_edges = Some(next),
        }
        if let Some(n) = next_ael {
            self.edges[n].prev_in_ael = Some(next);
        }

        let old = &self.edges[e];
        let (out_idx, side, wind_delta, wind_cnt, wind_cnt2) =
            (old.out_idx, old.side, old.wind_delta, old.wind_cnt, old.wind_cnt2);
        let edge = &mut self.edges[next];
        edge.out_idx = out_idx;
        edge.side = side;
        edge.wind_delta = wind_delta;
        edge.wind_cnt = wind_cnt;
        edge.wind_cnt2 = wind_cnt2;
        edge.curr = edge.bot;
        edge.prev_in_ael = prev_ael;
        edge.next_in_ael = next_ael;
        if !edge.is_horizontal() {
            let y = edge.top.y;
            self.insert_scanbeam(y);
        }
        Ok(next)
    }

    // ---- local minima -----------------------------------------------------

    fn insert_local_minima_into_ael(&mut self, bot_y: i64) {
        while let Some(lm) = self.pop_local_minima(bot_y) {
            let (lb, rb) = (lm.left_bound, lm.right_bound);
            self.insert_edge_into_ael(lb, None);
            self.insert_edge_into_ael(rb, Some(lb));
            self.set_winding_count(lb);
            self.edges[rb].wind_cnt = self.edges[lb].wind_cnt;
            self.edges[rb].wind_cnt2 = self.edges[lb].wind_cnt2;

            let op1 = if self.is_contributing(lb) {
                let bot = self.edges[lb].bot;
                Some(self.add_local_min_poly(lb, rb, bot))
            } else {
                None
            };
            self.insert_scanbeam(self.edges[lb].top.y);

            if self.edges[rb].is_horizontal() {
                self.add_edge_to_sel(rb);
                if let Some(next) = self.edges[rb].next_in_lml {
                    self.insert_scanbeam(self.edges[next].top.y);
                }
            } else {
                self.insert_scanbeam(self.edges[rb].top.y);
            }

            if let Some(op1) = op1 {
                // a ghost horizontal overlapped by rb becomes a real join
                if self.edges[rb].is_horizontal() {
                    let (rb_bot, rb_top) = (self.edges[rb].bot.x, self.edges[rb].top.x);
                    for i in 0..self.ghost_joins.len() {
                        let ghost = self.ghost_joins[i];
                        let ghost_x = self.out_pts[ghost.out_pt].pt.x;
                        if horz_segments_overlap(ghost_x, ghost.off_pt.x, rb_bot, rb_top) {
                            self.add_join(ghost.out_pt, op1, ghost.off_pt);
                        }
                    }
                }

                if let Some(prev) = self.edges[lb].prev_in_ael {
                    let (l, p) = (&self.edges[lb], &self.edges[prev]);
                    if l.out_idx.is_some()
                        && p.curr.x == l.bot.x
                        && p.out_idx.is_some()
                        && slopes_equal4(p.bot, p.top, l.curr, l.top, self.use_full_range)
                    {
                        let (bot, top) = (l.bot, l.top);
                        let op2 = self.add_out_pt(prev, bot);
                        self.add_join(op1, op2, top);
                    }
                }
            }

            if self.edges[lb].next_in_ael != Some(rb) {
                if let (Some(op1), Some(prev)) = (op1, self.edges[rb].prev_in_ael) {
                    let (r, p) = (&self.edges[rb], &self.edges[prev]);
                    if r.out_idx.is_some()
                        && p.out_idx.is_some()
                        && slopes_equal4(p.curr, p.top, r.curr, r.top, self.use_full_range)
                    {
                        let (bot, top) = (r.bot, r.top);
                        let op2 = self.add_out_pt(prev, bot);
                        self.add_join(op1, op2, top);
                    }
                }

                // rb must sit right of every edge between the bounds
                let mut e = self.edges[lb].next_in_ael;
                while let Some(id) = e {
                    if id == rb {
                        break;
                    }
                    let pt = self.edges[lb].curr;
                    self.intersect_edges(rb, id, pt);
                    e = self.edges[id].next_in_ael;
                }
            }
        }
    }

    // ---- intersections of two edges ---------------------------------------

    /// Updates winding counts and output where `e1` crosses `e2`. `e1` must
    /// be right of `e2` above the intersection.
    pub(super) fn intersect_edges(&mut self, e1: EdgeId, e2: EdgeId, pt: IntPoint) {
        let e1_contributing = self.edges[e1].out_idx.is_some();
        let e2_contributing = self.edges[e2].out_idx.is_some();

        let same_type = self.edges[e1].poly_typ == self.edges[e2].poly_typ;
        if same_type {
            if self.is_even_odd_fill_type(e1) {
                let tmp = self.edges[e1].wind_cnt;
                self.edges[e1].wind_cnt = self.edges[e2].wind_cnt;
                self.edges[e2].wind_cnt = tmp;
            } else {
                let (d1, d2) = (self.edges[e1].wind_delta, self.edges[e2].wind_delta);
                let a = &mut self.edges[e1];
                if a.wind_cnt + d2 == 0 {
                    a.wind_cnt = -a.wind_cnt;
                } else {
                    a.wind_cnt += d2;
                }
                let b = &mut self.edges[e2];
                if b.wind_cnt - d1 == 0 {
                    b.wind_cnt = -b.wind_cnt;
                } else {
                    b.wind_cnt -= d1;
                }
            }
        } else {
            let (d1, d2) = (self.edges[e1].wind_delta, self.edges[e2].wind_delta);
            if self.is_even_odd_fill_type(e2) {
                let a = &mut self.edges[e1];
                a.wind_cnt2 = if a.wind_cnt2 == 0 { 1 } else { 0 };
            } else {
                self.edges[e1].wind_cnt2 += d2;
            }
            if self.is_even_odd_fill_type(e1) {
                let b = &mut self.edges[e2];
                b.wind_cnt2 = if b.wind_cnt2 == 0 { 1 } else { 0 };
            } else {
                self.edges[e2].wind_cnt2 -= d1;
            }
        }

        let (e1_fill, e1_fill2) = self.fill_types(self.edges[e1].poly_typ);
        let (e2_fill, e2_fill2) = self.fill_types(self.edges[e2].poly_typ);
        let e1_wc = fill_count(e1_fill, self.edges[e1].wind_cnt);
        let e2_wc = fill_count(e2_fill, self.edges[e2].wind_cnt);
        let unit = |wc: i32| wc == 0 || wc == 1;

        if e1_contributing && e2_contributing {
            if !unit(e1_wc) || !unit(e2_wc) || (!same_type && self.clip_type != ClipType::Xor) {
                self.add_local_max_poly(e1, e2, pt);
            } else {
                self.add_out_pt(e1, pt);
                self.add_out_pt(e2, pt);
                self.swap_sides(e1, e2);
                self.swap_poly_indexes(e1, e2);
            }
        } else if e1_contributing {
            if unit(e2_wc) {
                self.add_out_pt(e1, pt);
                self.swap_sides(e1, e2);
                self.swap_poly_indexes(e1, e2);
            }
        } else if e2_contributing {
            if unit(e1_wc) {
                self.add_out_pt(e2, pt);
                self.swap_sides(e1, e2);
                self.swap_poly_indexes(e1, e2);
            }
        } else if unit(e1_wc) && unit(e2_wc) {
            // neither edge is contributing yet
            let e1_wc2 = fill_count(e1_fill2, self.edges[e1].wind_cnt2);
            let e2_wc2 = fill_count(e2_fill2, self.edges[e2].wind_cnt2);

            if !same_type {
                self.add_local_min_poly(e1, e2, pt);
            } else if e1_wc == 1 && e2_wc == 1 {
                let starts = match self.clip_type {
                    ClipType::Intersection => e1_wc2 > 0 && e2_wc2 > 0,
                    ClipType::Union => e1_wc2 <= 0 && e2_wc2 <= 0,
                    ClipType::Difference => match self.edges[e1].poly_typ {
                        PolyType::Clip => e1_wc2 > 0 && e2_wc2 > 0,
                        PolyType::Subject => e1_wc2 <= 0 && e2_wc2 <= 0,
                    },
                    ClipType::Xor => true,
                };
                if starts {
                    self.add_local_min_poly(e1, e2, pt);
                }
            } else {
                self.swap_sides(e1, e2);
            }
        }
    }

    fn swap_sides(&mut self, e1: EdgeId, e2: EdgeId) {
        let side = self.edges[e1].side;
        self.edges[e1].side = self.edges[e2].side;
        self.edges[e2].side = side;
    }

    fn swap_poly_indexes(&mut self, e1: EdgeId, e2: EdgeId) {
        let idx = self.edges[e1].out_idx;
        self.edges[e1].out_idx = self.edges[e2].out_idx;
        self.edges[e2].out_idx = idx;
    }

    // ---- horizontals ------------------------------------------------------

    fn process_horizontals(&mut self) -> Sweep {
        while let Some(e) = self.pop_edge_from_sel() {
            self.process_horizontal(e)?;
        }
        Ok(())
    }

    fn horz_direction(&self, e: EdgeId) -> (Direction, i64, i64) {
        let edge = &self.edges[e];
        if edge.bot.x < edge.top.x {
            (Direction::LeftToRight, edge.bot.x, edge.top.x)
        } else {
            (Direction::RightToLeft, edge.top.x, edge.bot.x)
        }
    }

    fn next_in_ael_dir(&self, e: EdgeId, dir: Direction) -> Option<EdgeId> {
        match dir {
            Direction::LeftToRight => self.edges[e].next_in_ael,
            Direction::RightToLeft => self.edges[e].prev_in_ael,
        }
    }

    /// Joins the output of `horz` at `op` with every overlapping horizontal
    /// still waiting in the sorted edge list.
    fn join_overlapping_horizontals(&mut self, horz: EdgeId, op: OutPtId) {
        let (bot_x, top_x) = (self.edges[horz].bot.x, self.edges[horz].top.x);
        let mut next_horz = self.sorted_edges;
        while let Some(nh) = next_horz {
            let other = &self.edges[nh];
            if other.out_idx.is_some() && horz_segments_overlap(bot_x, top_x, other.bot.x, other.top.x) {
                let off = other.top;
                if let Some(op2) = self.get_last_out_pt(nh) {
                    self.add_join(op2, op, off);
                }
            }
            next_horz = self.edges[nh].next_in_sel;
        }
    }

    /// Horizontal edges are processed as though they were between scanbeams,
    /// intersecting every edge they pass over.
    fn process_horizontal(&mut self, mut horz: EdgeId) -> Sweep {
        let (mut dir, mut horz_left, mut horz_right) = self.horz_direction(horz);

        let mut e_last_horz = horz;
        while let Some(next) = self.edges[e_last_horz].next_in_lml {
            if !self.edges[next].is_horizontal() {
                break;
            }
            e_last_horz = next;
        }
        let e_max_pair = if self.edges[e_last_horz].next_in_lml.is_none() {
            self.get_maxima_pair(e_last_horz)
        } else {
            None
        };

        // Cursors into the sorted maxima: `max_fwd` indexes the next maximum
        // going right, `max_rev - 1` the next one going left.
        let n_max = self.maxima.len();
        let mut max_fwd = n_max;
        let mut max_rev = 0;
        if n_max > 0 {
            let bot_x = self.edges[horz].bot.x;
            let last_top_x = self.edges[e_last_horz].top.x;
            if dir == Direction::LeftToRight {
                max_fwd = 0;
                while max_fwd < n_max && self.maxima[max_fwd] <= bot_x {
                    max_fwd += 1;
                }
                if max_fwd < n_max && self.maxima[max_fwd] >= last_top_x {
                    max_fwd = n_max;
                }
            } else {
                max_rev = n_max;
                while max_rev > 0 && self.maxima[max_rev - 1] > bot_x {
                    max_rev -= 1;
                }
                if max_rev > 0 && self.maxima[max_rev - 1] <= last_top_x {
                    max_rev = 0;
                }
            }
        }

        let mut op1: Option<OutPtId> = None;
        loop {
            let is_last_horz = horz == e_last_horz;
            let mut e = self.next_in_ael_dir(horz, dir);
            while let Some(eid) = e {
                let e_curr_x = self.edges[eid].curr.x;

                // add vertices where maxima touch the horizontal
                if n_max > 0 {
                    let y = self.edges[horz].bot.y;
                    let contributing = self.edges[horz].out_idx.is_some();
                    match dir {
                        Direction::LeftToRight => {
                            while max_fwd < n_max && self.maxima[max_fwd] < e_curr_x {
                                if contributing {
                                    self.add_out_pt(horz, IntPoint::new(self.maxima[max_fwd], y));
                                }
                                max_fwd += 1;
                            }
                        }
                        Direction::RightToLeft => {
                            while max_rev > 0 && self.maxima[max_rev - 1] > e_curr_x {
                                if contributing {
                                    self.add_out_pt(horz, IntPoint::new(self.maxima[max_rev - 1], y));
                                }
                                max_rev -= 1;
                            }
                        }
                    }
                }

                if (dir == Direction::LeftToRight && e_curr_x > horz_right)
                    || (dir == Direction::RightToLeft && e_curr_x < horz_left)
                {
                    break;
                }

                // End of an intermediate horizontal. Smaller dx lies right
                // of larger dx above the horizontal.
                if e_curr_x == self.edges[horz].top.x {
                    if let Some(next) = self.edges[horz].next_in_lml {
                        if self.edges[eid].dx < self.edges[next].dx {
                            break;
                        }
                    }
                }

                if self.edges[horz].out_idx.is_some() {
                    let op = self.add_out_pt(horz, self.edges[eid].curr);
                    op1 = Some(op);
                    self.join_overlapping_horizontals(horz, op);
                    let bot = self.edges[horz].bot;
                    self.add_ghost_join(op, bot);
                }

                if Some(eid) == e_max_pair && is_last_horz {
                    if self.edges[horz].out_idx.is_some() {
                        let top = self.edges[horz].top;
                        self.add_local_max_poly(horz, eid, top);
                    }
                    self.delete_from_ael(horz);
                    self.delete_from_ael(eid);
                    return Ok(());
                }

                let pt = IntPoint::new(e_curr_x, self.edges[horz].curr.y);
                match dir {
                    Direction::LeftToRight => self.intersect_edges(horz, eid, pt),
                    Direction::RightToLeft => self.intersect_edges(eid, horz, pt),
                }
                let e_next = self.next_in_ael_dir(eid, dir);
                self.swap_positions_in_ael(horz, eid);
                e = e_next;
            }

            match self.edges[horz].next_in_lml {
                Some(next) if self.edges[next].is_horizontal() => {}
                _ => break,
            }
            horz = self.update_edge_into_ael(horz)?;
            if self.edges[horz].out_idx.is_some() {
                let bot = self.edges[horz].bot;
                self.add_out_pt(horz, bot);
            }
            (dir, horz_left, horz_right) = self.horz_direction(horz);
        }

        if self.edges[horz].out_idx.is_some() && op1.is_none() {
            if let Some(op) = self.get_last_out_pt(horz) {
                self.join_overlapping_horizontals(horz, op);
                let top = self.edges[horz].top;
                self.add_ghost_join(op, top);
            }
        }

        if self.edges[horz].next_in_lml.is_some() {
            if self.edges[horz].out_idx.is_some() {
                let op1 = self.add_out_pt(horz, self.edges[horz].top);
                horz = self.update_edge_into_ael(horz)?;
                // horz is no longer horizontal here
                let (prev, next) = (self.edges[horz].prev_in_ael, self.edges[horz].next_in_ael);
                let neighbour = prev
                    .filter(|&p| self.collinear_at_bottom(horz, p, true))
                    .or_else(|| next.filter(|&n| self.collinear_at_bottom(horz, n, true)));
                if let Some(other) = neighbour {
                    let (bot, top) = (self.edges[horz].bot, self.edges[horz].top);
                    let op2 = self.add_out_pt(other, bot);
                    self.add_join(op1, op2, top);
                }
            } else {
                self.update_edge_into_ael(horz)?;
            }
        } else {
            if self.edges[horz].out_idx.is_some() {
                let top = self.edges[horz].top;
                self.add_out_pt(horz, top);
            }
            self.delete_from_ael(horz);
        }
        Ok(())
    }

    /// True when `other` is a contributing edge that starts where `e` does,
    /// continues upward and is collinear with it.
    fn collinear_at_bottom(&self, e: EdgeId, other: EdgeId, by_delta: bool) -> bool {
        let (a, b) = (&self.edges[e], &self.edges[other]);
        b.curr.x == a.bot.x
            && b.curr.y == a.bot.y
            && b.wind_delta != 0
            && b.out_idx.is_some()
            && b.curr.y > b.top.y
            && if by_delta {
                edge_slopes_equal(a, b, self.use_full_range)
            } else {
                slopes_equal4(a.curr, a.top, b.curr, b.top, self.use_full_range)
            }
    }

    fn get_maxima_pair(&self, e: EdgeId) -> Option<EdgeId> {
        let edge = &self.edges[e];
        let (next, prev) = (&self.edges[edge.next], &self.edges[edge.prev]);
        if next.top == edge.top && next.next_in_lml.is_none() {
            Some(edge.next)
        } else if prev.top == edge.top && prev.next_in_lml.is_none() {
            Some(edge.prev)
        } else {
            None
        }
    }

    /// Like [`get_maxima_pair`](Self::get_maxima_pair) but ignores a pair
    /// that has already left the active edge list.
    fn get_maxima_pair_ex(&self, e: EdgeId) -> Option<EdgeId> {
        self.get_maxima_pair(e).filter(|&pair| {
            let p = &self.edges[pair];
            !(p.next_in_ael == p.prev_in_ael && !p.is_horizontal())
        })
    }

    // ---- intersections within a scanbeam ----------------------------------

    fn process_intersections(&mut self, top_y: i64) -> Sweep {
        if self.active_edges.is_none() {
            return Ok(());
        }
        self.build_intersect_list(top_y);
        let count = self.intersections.len();
        if count == 0 {
            return Ok(());
        }
        if count > 1 && !self.fixup_intersection_order() {
            self.intersections.clear();
            self.sorted_edges = None;
            return Err(SweepError::Invariant(
                "intersections cannot be ordered between adjacent edges",
            ));
        }
        self.process_intersect_list();
        self.sorted_edges = None;
        Ok(())
    }

    /// Bubble sorts a copy of the active edge list by X at `top_y`, recording
    /// an intersection for every swap.
    fn build_intersect_list(&mut self, top_y: i64) {
        let mut e = self.active_edges;
        self.sorted_edges = e;
        while let Some(id) = e {
            let edge = &mut self.edges[id];
            edge.prev_in_sel = edge.prev_in_ael;
            edge.next_in_sel = edge.next_in_ael;
            edge.curr.x = edge.top_x(top_y);
            e = edge.next_in_ael;
        }

        loop {
            let mut is_modified = false;
            let Some(mut e) = self.sorted_edges else {
                break;
            };
            while let Some(e_next) = self.edges[e].next_in_sel {
                if self.edges[e].curr.x > self.edges[e_next].curr.x {
                    let mut pt = self.intersect_point(e, e_next);
                    if pt.y < top_y {
                        pt = IntPoint::new(self.edges[e].top_x(top_y), top_y);
                    }
                    self.intersections.push(IntersectNode {
                        edge1: e,
                        edge2: e_next,
                        pt,
                    });
                    self.swap_positions(List::Sorted, e, e_next);
                    is_modified = true;
                } else {
                    e = e_next;
                }
            }
            match self.edges[e].prev_in_sel {
                Some(prev) => self.edges[prev].next_in_sel = None,
                None => break,
            }
            if !is_modified {
                break;
            }
        }
        self.sorted_edges = None;
    }

    fn edges_adjacent(&self, node: &IntersectNode) -> bool {
        let e1 = &self.edges[node.edge1];
        e1.next_in_sel == Some(node.edge2) || e1.prev_in_sel == Some(node.edge2)
    }

    /// Orders intersections bottom-most first so that each one is between
    /// edges adjacent at the time it is processed.
    fn fixup_intersection_order(&mut self) -> bool {
        self.copy_ael_to_sel();
        self.intersections.sort_by(|a, b| b.pt.y.cmp(&a.pt.y));
        let count = self.intersections.len();
        for i in 0..count {
            if !self.edges_adjacent(&self.intersections[i]) {
                let mut j = i + 1;
                while j < count && !self.edges_adjacent(&self.intersections[j]) {
                    j += 1;
                }
                if j == count {
                    return false;
                }
                self.intersections.swap(i, j);
            }
            let node = self.intersections[i];
            self.swap_positions(List::Sorted, node.edge1, node.edge2);
        }
        true
    }

    fn process_intersect_list(&mut self) {
        let nodes = std::mem::take(&mut self.intersections);
        for node in &nodes {
            self.intersect_edges(node.edge1, node.edge2, node.pt);
            self.swap_positions_in_ael(node.edge1, node.edge2);
        }
    }

    fn intersect_point(&self, e1: EdgeId, e2: EdgeId) -> IntPoint {
        let (a, b) = (&self.edges[e1], &self.edges[e2]);
        if a.dx == b.dx {
            let y = a.curr.y;
            return IntPoint::new(a.top_x(y), y);
        }

        let mut ip = if a.dx == 0.0 {
            let x = a.bot.x;
            let y = if b.is_horizontal() {
                b.bot.y
            } else {
                let b2 = b.bot.y as f64 - b.bot.x as f64 / b.dx;
                super::clipper_round(x as f64 / b.dx + b2)
            };
            IntPoint::new(x, y)
        } else if b.dx == 0.0 {
            let x = b.bot.x;
            let y = if a.is_horizontal() {
                a.bot.y
            } else {
                let b1 = a.bot.y as f64 - a.bot.x as f64 / a.dx;
                super::clipper_round(x as f64 / a.dx + b1)
            };
            IntPoint::new(x, y)
        } else {
            let b1 = a.bot.x as f64 - a.bot.y as f64 * a.dx;
            let b2 = b.bot.x as f64 - b.bot.y as f64 * b.dx;
            let q = (b2 - b1) / (a.dx - b.dx);
            let x = if a.dx.abs() < b.dx.abs() {
                a.dx * q + b1
            } else {
                b.dx * q + b2
            };
            IntPoint::new(super::clipper_round(x), super::clipper_round(q))
        };

        if ip.y < a.top.y || ip.y < b.top.y {
            ip.y = a.top.y.max(b.top.y);
            ip.x = if a.dx.abs() < b.dx.abs() {
                a.top_x(ip.y)
            } else {
                b.top_x(ip.y)
            };
        }
        // never below the bottom of the scanbeam
        if ip.y > a.curr.y {
            ip.y = a.curr.y;
            ip.x = if a.dx.abs() > b.dx.abs() {
                b.top_x(ip.y)
            } else {
                a.top_x(ip.y)
            };
        }
        ip
    }

    // ---- top of scanbeam --------------------------------------------------

    fn is_maxima(&self, e: EdgeId, y: i64) -> bool {
        self.edges[e].top.y == y && self.edges[e].next_in_lml.is_none()
    }

    fn is_intermediate(&self, e: EdgeId, y: i64) -> bool {
        self.edges[e].top.y == y && self.edges[e].next_in_lml.is_some()
    }

    fn process_edges_at_top_of_scanbeam(&mut self, top_y: i64) -> Sweep {
        let mut e = self.active_edges;
        while let Some(mut id) = e {
            // Maxima are treated as bent horizontals, except those paired
            // with an actual horizontal.
            let mut is_maxima_edge = self.is_maxima(id, top_y);
            if is_maxima_edge {
                if let Some(pair) = self.get_maxima_pair_ex(id) {
                    is_maxima_edge = !self.edges[pair].is_horizontal();
                }
            }

            if is_maxima_edge {
                if self.strictly_simple {
                    self.maxima.push(self.edges[id].top.x);
                }
                let prev = self.edges[id].prev_in_ael;
                self.do_maxima(id)?;
                e = match prev {
                    Some(p) => self.edges[p].next_in_ael,
                    None => self.active_edges,
                };
                continue;
            }

            let promote = self.is_intermediate(id, top_y)
                && self.edges[id]
                    .next_in_lml
                    .map_or(false, |next| self.edges[next].is_horizontal());
            if promote {
                id = self.update_edge_into_ael(id)?;
                if self.edges[id].out_idx.is_some() {
                    let bot = self.edges[id].bot;
                    self.add_out_pt(id, bot);
                }
                self.add_edge_to_sel(id);
            } else {
                let edge = &mut self.edges[id];
                edge.curr = IntPoint::new(edge.top_x(top_y), top_y);
            }

            // an edge touched by another gets a vertex on both
            if self.strictly_simple {
                if let Some(prev) = self.edges[id].prev_in_ael {
                    let (a, p) = (&self.edges[id], &self.edges[prev]);
                    if a.out_idx.is_some() && p.out_idx.is_some() && p.curr.x == a.curr.x {
                        let pt = a.curr;
                        let op = self.add_out_pt(prev, pt);
                        let op2 = self.add_out_pt(id, pt);
                        self.add_join(op, op2, pt);
                    }
                }
            }

            e = self.edges[id].next_in_ael;
        }

        self.maxima.sort_unstable();
        self.process_horizontals()?;
        self.maxima.clear();

        // promote intermediate vertices
        let mut e = self.active_edges;
        while let Some(mut id) = e {
            if self.is_intermediate(id, top_y) {
                let op = if self.edges[id].out_idx.is_some() {
                    let top = self.edges[id].top;
                    Some(self.add_out_pt(id, top))
                } else {
                    None
                };
                id = self.update_edge_into_ael(id)?;

                if let Some(op) = op {
                    let (prev, next) = (self.edges[id].prev_in_ael, self.edges[id].next_in_ael);
                    let neighbour = prev
                        .filter(|&p| self.collinear_at_bottom(id, p, false))
                        .or_else(|| next.filter(|&n| self.collinear_at_bottom(id, n, false)));
                    if let Some(other) = neighbour {
                        let (bot, top) = (self.edges[id].bot, self.edges[id].top);
                        let op2 = self.add_out_pt(other, bot);
                        self.add_join(op, op2, top);
                    }
                }
            }
            e = self.edges[id].next_in_ael;
        }
        Ok(())
    }

    fn do_maxima(&mut self, e: EdgeId) -> Sweep {
        let Some(pair) = self.get_maxima_pair_ex(e) else {
            if self.edges[e].out_idx.is_some() {
                let top = self.edges[e].top;
                self.add_out_pt(e, top);
            }
            self.delete_from_ael(e);
            return Ok(());
        };

        let mut next = self.edges[e].next_in_ael;
        while let Some(n) = next {
            if n == pair {
                break;
            }
            let top = self.edges[e].top;
            self.intersect_edges(e, n, top);
            self.swap_positions_in_ael(e, n);
            next = self.edges[e].next_in_ael;
        }

        match (self.edges[e].out_idx, self.edges[pair].out_idx) {
            (None, None) => {}
            (Some(_), Some(_)) => {
                let top = self.edges[e].top;
                self.add_local_max_poly(e, pair, top);
            }
            _ => return Err(SweepError::Invariant("maxima pair shares a single output ring")),
        }
        self.delete_from_ael(e);
        self.delete_from_ael(pair);
        Ok(())
    }
}

/// Winding count as seen by `fill`.
fn fill_count(fill: PolyFillType, wind_cnt: i32) -> i32 {
    match fill {
        PolyFillType::Positive => wind_cnt,
        PolyFillType::Negative => -wind_cnt,
        _ => wind_cnt.abs(),
    }
}

pub(super) fn horz_segments_overlap(mut a1: i64, mut a2: i64, mut b1: i64, mut b2: i64) -> bool {
    if a1 > a2 {
        std::mem::swap(&mut a1, &mut a2);
    }
    if b1 > b2 {
        std::mem::swap(&mut b1, &mut b2);
    }
    a1 < b2 && b1 < a2
}

#[cfg(test)]
mod tests {
    use super::super::{area, IntPoint, Path};
    use super::*;

    fn rect(x: i64, y: i64, w: i64, h: i64) -> Path {
        vec![
            IntPoint::new(x, y),
            IntPoint::new(x + w, y),
            IntPoint::new(x + w, y + h),
            IntPoint::new(x, y + h),
        ]
    }

    fn total_area(paths: &Paths) -> f64 {
        paths.iter().map(|p| area(p)).sum()
    }

    #[test]
    fn test_union_of_one_square_is_itself() {
        let mut clipper = ClippingEngine::new();
        let square = rect(0, 0, 100, 100);
        assert!(clipper.add_path(&square, PolyType::Subject));
        let result = clipper.execute(ClipType::Union, PolyFillType::NonZero).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].len(), 4);
        for pt in &square {
            assert!(result[0].contains(pt));
        }
    }

    #[test]
    fn test_union_of_overlapping_squares() {
        let mut clipper = ClippingEngine::new();
        clipper.add_path(&rect(0, 0, 10, 10), PolyType::Subject);
        clipper.add_path(&rect(5, 5, 10, 10), PolyType::Subject);
        let result = clipper.execute(ClipType::Union, PolyFillType::NonZero).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].len(), 8);
        assert_eq!(area(&result[0]).abs(), 175.0);
    }

    #[test]
    fn test_difference_leaves_hole() {
        let mut clipper = ClippingEngine::new();
        clipper.add_path(&rect(0, 0, 30, 30), PolyType::Subject);
        clipper.add_path(&rect(10, 10, 10, 10), PolyType::Clip);
        let result = clipper.execute(ClipType::Difference, PolyFillType::NonZero).unwrap();
        assert_eq!(result.len(), 2);
        // outer positive, hole negative
        assert_eq!(total_area(&result), 800.0);
        assert!(result.iter().any(|p| area(p) < 0.0));
    }

    #[test]
    fn test_difference_removes_everything() {
        let mut clipper = ClippingEngine::new();
        clipper.add_path(&rect(10, 10, 10, 10), PolyType::Subject);
        clipper.add_path(&rect(0, 0, 30, 30), PolyType::Clip);
        let result = clipper.execute(ClipType::Difference, PolyFillType::NonZero).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_intersection() {
        let mut clipper = ClippingEngine::new();
        clipper.add_path(&rect(0, 0, 10, 10), PolyType::Subject);
        clipper.add_path(&rect(5, 0, 10, 10), PolyType::Clip);
        let result = clipper
            .execute(ClipType::Intersection, PolyFillType::NonZero)
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(area(&result[0]).abs(), 50.0);
    }

    #[test]
    fn test_fill_rules_follow_winding() {
        // both squares wound the same way: positive fill keeps them
        let mut clipper = ClippingEngine::new();
        let sq = rect(0, 0, 10, 10);
        clipper.add_path(&sq, PolyType::Subject);
        let positive = clipper.execute(ClipType::Union, PolyFillType::Positive).unwrap();
        let negative = clipper.execute(ClipType::Union, PolyFillType::Negative).unwrap();
        // area() > 0 means a positive winding number inside
        assert_eq!(positive.len(), 1);
        assert!(negative.is_empty());
    }

    #[test]
    fn test_reverse_solution() {
        let mut clipper = ClippingEngine::new();
        clipper.add_path(&rect(0, 0, 10, 10), PolyType::Subject);
        let normal = clipper.execute(ClipType::Union, PolyFillType::NonZero).unwrap();
        clipper.set_reverse_solution(true);
        let reversed = clipper.execute(ClipType::Union, PolyFillType::NonZero).unwrap();
        assert!(area(&normal[0]) > 0.0);
        assert!(area(&reversed[0]) < 0.0);
    }

    #[test]
    fn test_touching_squares_merge() {
        let mut clipper = ClippingEngine::new();
        clipper.add_path(&rect(0, 0, 10, 10), PolyType::Subject);
        clipper.add_path(&rect(10, 0, 10, 10), PolyType::Subject);
        let result = clipper.execute(ClipType::Union, PolyFillType::NonZero).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(area(&result[0]).abs(), 200.0);
        assert_eq!(result[0].len(), 4);
    }

    #[test]
    fn test_full_range_coordinates() {
        let big = 1_000_000_000_000;
        let mut clipper = ClippingEngine::new();
        clipper.add_path(&rect(0, 0, big, big), PolyType::Subject);
        clipper.add_path(&rect(big / 2, big / 2, big, big), PolyType::Subject);
        assert!(clipper.uses_full_range());
        let result = clipper.execute(ClipType::Union, PolyFillType::NonZero).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].len(), 8);
    }

    #[test]
    fn test_empty_execute_returns_none() {
        let mut clipper = ClippingEngine::new();
        assert!(clipper.execute(ClipType::Union, PolyFillType::NonZero).is_none());
    }

    #[test]
    fn test_horz_segments_overlap() {
        assert!(horz_segments_overlap(0, 10, 5, 15));
        assert!(horz_segments_overlap(10, 0, 15, 5));
        assert!(!horz_segments_overlap(0, 10, 10, 20));
    }
}
