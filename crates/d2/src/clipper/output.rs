//! Output rings: linked point records grown by the sweep, merged at maxima,
//! joined along shared edges and cleaned once the sweep completes.

use super::edge::{pt2_is_between_pt1_and_pt3, slopes_equal3, slopes_equal4, EdgeId, EdgeSide, HORIZONTAL};
use super::engine::{ClippingEngine, Direction};
use super::{IntPoint, Path, Paths};

pub(super) type OutPtId = usize;

#[derive(Debug, Clone, Copy)]
pub(super) struct OutPt {
    /// Owning ring, possibly merged away; see [`ClippingEngine::get_out_rec`].
    pub idx: usize,
    pub pt: IntPoint,
    pub next: OutPtId,
    pub prev: OutPtId,
}

#[derive(Debug, Clone)]
pub(super) struct OutRec {
    /// Equal to the ring's own position unless it was merged into another.
    pub idx: usize,
    pub is_hole: bool,
    pub first_left: Option<usize>,
    pub pts: Option<OutPtId>,
    pub bottom_pt: Option<OutPtId>,
}

/// Two output points lying on a shared edge that ends at `off_pt`.
#[derive(Debug, Clone, Copy)]
pub(super) struct Join {
    pub out_pt1: OutPtId,
    pub out_pt2: OutPtId,
    pub off_pt: IntPoint,
}

/// A horizontal output edge that may still be overlapped by a horizontal
/// starting later in the same scanbeam.
#[derive(Debug, Clone, Copy)]
pub(super) struct GhostJoin {
    pub out_pt: OutPtId,
    pub off_pt: IntPoint,
}

fn get_dx(pt1: IntPoint, pt2: IntPoint) -> f64 {
    if pt1.y == pt2.y {
        HORIZONTAL
    } else {
        (pt2.x - pt1.x) as f64 / (pt2.y - pt1.y) as f64
    }
}

/// Overlap of `[a1, a2]` and `[b1, b2]`, if it is not empty.
fn get_overlap(a1: i64, a2: i64, b1: i64, b2: i64) -> Option<(i64, i64)> {
    let (a_lo, a_hi) = if a1 < a2 { (a1, a2) } else { (a2, a1) };
    let (b_lo, b_hi) = if b1 < b2 { (b1, b2) } else { (b2, b1) };
    let (left, right) = (a_lo.max(b_lo), a_hi.min(b_hi));
    (left < right).then_some((left, right))
}

impl ClippingEngine {
    fn create_out_rec(&mut self) -> usize {
        let idx = self.poly_outs.len();
        self.poly_outs.push(OutRec {
            idx,
            is_hole: false,
            first_left: None,
            pts: None,
            bottom_pt: None,
        });
        idx
    }

    fn new_out_pt(&mut self, idx: usize, pt: IntPoint) -> OutPtId {
        let id = self.out_pts.len();
        self.out_pts.push(OutPt {
            idx,
            pt,
            next: id,
            prev: id,
        });
        id
    }

    /// Follows merged rings to the one that absorbed them.
    pub(super) fn get_out_rec(&self, mut idx: usize) -> usize {
        while self.poly_outs[idx].idx != idx {
            idx = self.poly_outs[idx].idx;
        }
        idx
    }

    pub(super) fn add_out_pt(&mut self, e: EdgeId, pt: IntPoint) -> OutPtId {
        let Some(rec) = self.edges[e].out_idx else {
            let rec = self.create_out_rec();
            let op = self.new_out_pt(rec, pt);
            self.poly_outs[rec].pts = Some(op);
            self.set_hole_state(e, rec);
            self.edges[e].out_idx = Some(rec);
            return op;
        };

        let rec_idx = self.poly_outs[rec].idx;
        let Some(front) = self.poly_outs[rec].pts else {
            let op = self.new_out_pt(rec_idx, pt);
            self.poly_outs[rec].pts = Some(op);
            return op;
        };

        // front is the left-most point, front.prev the right-most
        let to_front = self.edges[e].side == EdgeSide::Left;
        let back = self.out_pts[front].prev;
        if to_front && pt == self.out_pts[front].pt {
            return front;
        }
        if !to_front && pt == self.out_pts[back].pt {
            return back;
        }

        let op = self.new_out_pt(rec_idx, pt);
        self.out_pts[op].next = front;
        self.out_pts[op].prev = back;
        self.out_pts[back].next = op;
        self.out_pts[front].prev = op;
        if to_front {
            self.poly_outs[rec].pts = Some(op);
        }
        op
    }

    pub(super) fn get_last_out_pt(&self, e: EdgeId) -> Option<OutPtId> {
        let rec = self.edges[e].out_idx?;
        let front = self.poly_outs[rec].pts?;
        Some(match self.edges[e].side {
            EdgeSide::Left => front,
            EdgeSide::Right => self.out_pts[front].prev,
        })
    }

    pub(super) fn add_join(&mut self, out_pt1: OutPtId, out_pt2: OutPtId, off_pt: IntPoint) {
        self.joins.push(Join {
            out_pt1,
            out_pt2,
            off_pt,
        });
    }

    pub(super) fn add_ghost_join(&mut self, out_pt: OutPtId, off_pt: IntPoint) {
        self.ghost_joins.push(GhostJoin { out_pt, off_pt });
    }

    /// A ring is a hole when an odd number of output edges lie left of `e`.
    fn set_hole_state(&mut self, e: EdgeId, rec: usize) {
        let mut e2 = self.edges[e].prev_in_ael;
        let mut e_tmp: Option<EdgeId> = None;
        while let Some(id) = e2 {
            if let Some(idx) = self.edges[id].out_idx {
                if self.edges[id].wind_delta != 0 {
                    match e_tmp {
                        None => e_tmp = Some(id),
                        Some(t) if self.edges[t].out_idx == Some(idx) => e_tmp = None,
                        Some(_) => {}
                    }
                }
            }
            e2 = self.edges[id].prev_in_ael;
        }

        match e_tmp.and_then(|t| self.edges[t].out_idx) {
            Some(first_left) => {
                let is_hole = !self.poly_outs[first_left].is_hole;
                let out = &mut self.poly_outs[rec];
                out.first_left = Some(first_left);
                out.is_hole = is_hole;
            }
            None => {
                let out = &mut self.poly_outs[rec];
                out.first_left = None;
                out.is_hole = false;
            }
        }
    }

    pub(super) fn add_local_min_poly(&mut self, e1: EdgeId, e2: EdgeId, pt: IntPoint) -> OutPtId {
        let (result, e, prev_e) = if self.edges[e2].is_horizontal() || self.edges[e1].dx > self.edges[e2].dx {
            let result = self.add_out_pt(e1, pt);
            self.edges[e2].out_idx = self.edges[e1].out_idx;
            self.edges[e1].side = EdgeSide::Left;
            self.edges[e2].side = EdgeSide::Right;
            let prev_e = if self.edges[e1].prev_in_ael == Some(e2) {
                self.edges[e2].prev_in_ael
            } else {
                self.edges[e1].prev_in_ael
            };
            (result, e1, prev_e)
        } else {
            let result = self.add_out_pt(e2, pt);
            self.edges[e1].out_idx = self.edges[e2].out_idx;
            self.edges[e1].side = EdgeSide::Right;
            self.edges[e2].side = EdgeSide::Left;
            let prev_e = if self.edges[e2].prev_in_ael == Some(e1) {
                self.edges[e1].prev_in_ael
            } else {
                self.edges[e2].prev_in_ael
            };
            (result, e2, prev_e)
        };

        if let Some(prev) = prev_e {
            let (p, edge) = (&self.edges[prev], &self.edges[e]);
            if p.out_idx.is_some() && p.top.y < pt.y && edge.top.y < pt.y {
                let x_prev = p.top_x(pt.y);
                let x_e = edge.top_x(pt.y);
                if x_prev == x_e
                    && edge.wind_delta != 0
                    && p.wind_delta != 0
                    && slopes_equal4(
                        IntPoint::new(x_prev, pt.y),
                        p.top,
                        IntPoint::new(x_e, pt.y),
                        edge.top,
                        self.use_full_range,
                    )
                {
                    let top = edge.top;
                    let op = self.add_out_pt(prev, pt);
                    self.add_join(result, op, top);
                }
            }
        }
        result
    }

    pub(super) fn add_local_max_poly(&mut self, e1: EdgeId, e2: EdgeId, pt: IntPoint) {
        self.add_out_pt(e1, pt);
        let (i1, i2) = (self.edges[e1].out_idx, self.edges[e2].out_idx);
        if i1 == i2 {
            self.edges[e1].out_idx = None;
            self.edges[e2].out_idx = None;
        } else if i1 < i2 {
            self.append_polygon(e1, e2);
        } else {
            self.append_polygon(e2, e1);
        }
    }

    /// Merges the ring of `e2` into the ring of `e1`.
    fn append_polygon(&mut self, e1: EdgeId, e2: EdgeId) {
        let (Some(r1), Some(r2)) = (self.edges[e1].out_idx, self.edges[e2].out_idx) else {
            return;
        };
        let hole_state_rec = if self.outrec1_right_of_outrec2(r1, r2) {
            r2
        } else if self.outrec1_right_of_outrec2(r2, r1) {
            r1
        } else {
            self.get_lowermost_rec(r1, r2)
        };

        let (Some(p1_lft), Some(p2_lft)) = (self.poly_outs[r1].pts, self.poly_outs[r2].pts) else {
            return;
        };
        let p1_rt = self.out_pts[p1_lft].prev;
        let p2_rt = self.out_pts[p2_lft].prev;

        let e1_side = self.edges[e1].side;
        match (e1_side, self.edges[e2].side) {
            (EdgeSide::Left, EdgeSide::Left) => {
                // z y x a b c
                self.reverse_poly_pt_links(p2_lft);
                self.out_pts[p2_lft].next = p1_lft;
                self.out_pts[p1_lft].prev = p2_lft;
                self.out_pts[p1_rt].next = p2_rt;
                self.out_pts[p2_rt].prev = p1_rt;
                self.poly_outs[r1].pts = Some(p2_rt);
            }
            (EdgeSide::Left, EdgeSide::Right) => {
                // x y z a b c
                self.out_pts[p2_rt].next = p1_lft;
                self.out_pts[p1_lft].prev = p2_rt;
                self.out_pts[p2_lft].prev = p1_rt;
                self.out_pts[p1_rt].next = p2_lft;
                self.poly_outs[r1].pts = Some(p2_lft);
            }
            (EdgeSide::Right, EdgeSide::Right) => {
                // a b c z y x
                self.reverse_poly_pt_links(p2_lft);
                self.out_pts[p1_rt].next = p2_rt;
                self.out_pts[p2_rt].prev = p1_rt;
                self.out_pts[p2_lft].next = p1_lft;
                self.out_pts[p1_lft].prev = p2_lft;
            }
            (EdgeSide::Right, EdgeSide::Left) => {
                // a b c x y z
                self.out_pts[p1_rt].next = p2_lft;
                self.out_pts[p2_lft].prev = p1_rt;
                self.out_pts[p1_lft].prev = p2_rt;
                self.out_pts[p2_rt].next = p1_lft;
            }
        }

        self.poly_outs[r1].bottom_pt = None;
        if hole_state_rec == r2 {
            if self.poly_outs[r2].first_left != Some(r1) {
                self.poly_outs[r1].first_left = self.poly_outs[r2].first_left;
            }
            self.poly_outs[r1].is_hole = self.poly_outs[r2].is_hole;
        }
        let out2 = &mut self.poly_outs[r2];
        out2.pts = None;
        out2.bottom_pt = None;
        out2.first_left = Some(r1);

        self.edges[e1].out_idx = None;
        self.edges[e2].out_idx = None;

        let mut e = self.active_edges;
        while let Some(id) = e {
            if self.edges[id].out_idx == Some(r2) {
                self.edges[id].out_idx = Some(r1);
                self.edges[id].side = e1_side;
                break;
            }
            e = self.edges[id].next_in_ael;
        }
        self.poly_outs[r2].idx = self.poly_outs[r1].idx;
    }

    fn reverse_poly_pt_links(&mut self, start: OutPtId) {
        let mut pp = start;
        loop {
            let op = &mut self.out_pts[pp];
            let next = op.next;
            op.next = op.prev;
            op.prev = next;
            pp = next;
            if pp == start {
                break;
            }
        }
    }

    fn outrec1_right_of_outrec2(&self, r1: usize, r2: usize) -> bool {
        let mut r = r1;
        // first_left chains are acyclic; the bound only guards the walk
        for _ in 0..=self.poly_outs.len() {
            match self.poly_outs[r].first_left {
                Some(fl) if fl == r2 => return true,
                Some(fl) => r = fl,
                None => return false,
            }
        }
        false
    }

    fn bottom_pt_of(&mut self, rec: usize) -> Option<OutPtId> {
        if self.poly_outs[rec].bottom_pt.is_none() {
            let pts = self.poly_outs[rec].pts?;
            self.poly_outs[rec].bottom_pt = Some(self.get_bottom_pt(pts));
        }
        self.poly_outs[rec].bottom_pt
    }

    fn get_lowermost_rec(&mut self, r1: usize, r2: usize) -> usize {
        let (Some(b1), Some(b2)) = (self.bottom_pt_of(r1), self.bottom_pt_of(r2)) else {
            return r1;
        };
        let (p1, p2) = (self.out_pts[b1].pt, self.out_pts[b2].pt);
        if p1.y > p2.y {
            r1
        } else if p1.y < p2.y {
            r2
        } else if p1.x < p2.x {
            r1
        } else if p1.x > p2.x {
            r2
        } else if self.out_pts[b1].next == b1 {
            r2
        } else if self.out_pts[b2].next == b2 {
            r1
        } else if self.first_is_bottom_pt(b1, b2) {
            r1
        } else {
            r2
        }
    }

    /// Lowest then left-most point of a ring.
    fn get_bottom_pt(&self, mut pp: OutPtId) -> OutPtId {
        let mut dups: Option<OutPtId> = None;
        let mut p = self.out_pts[pp].next;
        while p != pp {
            let (ptp, ptb) = (self.out_pts[p].pt, self.out_pts[pp].pt);
            if ptp.y > ptb.y {
                pp = p;
                dups = None;
            } else if ptp.y == ptb.y && ptp.x <= ptb.x {
                if ptp.x < ptb.x {
                    dups = None;
                    pp = p;
                } else if self.out_pts[p].next != pp && self.out_pts[p].prev != pp {
                    dups = Some(p);
                }
            }
            p = self.out_pts[p].next;
        }

        if let Some(mut dup) = dups {
            // several vertices share the bottom point: pick the one whose
            // edges leave at the shallowest angle
            while dup != p {
                if !self.first_is_bottom_pt(p, dup) {
                    pp = dup;
                }
                dup = self.out_pts[dup].next;
                while self.out_pts[dup].pt != self.out_pts[pp].pt {
                    dup = self.out_pts[dup].next;
                }
            }
        }
        pp
    }

    fn neighbour_dx(&self, btm: OutPtId, forward: bool) -> f64 {
        let pt = self.out_pts[btm].pt;
        let step = |op: OutPtId| {
            if forward {
                self.out_pts[op].next
            } else {
                self.out_pts[op].prev
            }
        };
        let mut p = step(btm);
        while self.out_pts[p].pt == pt && p != btm {
            p = step(p);
        }
        get_dx(pt, self.out_pts[p].pt).abs()
    }

    fn first_is_bottom_pt(&self, btm1: OutPtId, btm2: OutPtId) -> bool {
        let dx1p = self.neighbour_dx(btm1, false);
        let dx1n = self.neighbour_dx(btm1, true);
        let dx2p = self.neighbour_dx(btm2, false);
        let dx2n = self.neighbour_dx(btm2, true);

        if dx1p.max(dx1n) == dx2p.max(dx2n) && dx1p.min(dx1n) == dx2p.min(dx2n) {
            // otherwise identical, so use orientation
            self.out_pts_area(btm1) > 0.0
        } else {
            (dx1p >= dx2p && dx1p >= dx2n) || (dx1n >= dx2p && dx1n >= dx2n)
        }
    }

    /// Signed area of a ring, positive when it will be emitted with a
    /// positive [`super::area`].
    fn out_pts_area(&self, start: OutPtId) -> f64 {
        let mut a = 0.0;
        let mut op = start;
        loop {
            let (p, prev) = (self.out_pts[op].pt, self.out_pts[self.out_pts[op].prev].pt);
            a += (prev.x as f64 + p.x as f64) * (prev.y as f64 - p.y as f64);
            op = self.out_pts[op].next;
            if op == start {
                break;
            }
        }
        a * 0.5
    }

    fn dup_out_pt(&mut self, op: OutPtId, insert_after: bool) -> OutPtId {
        let OutPt { idx, pt, next, prev } = self.out_pts[op];
        let result = self.new_out_pt(idx, pt);
        if insert_after {
            self.out_pts[result].next = next;
            self.out_pts[result].prev = op;
            self.out_pts[next].prev = result;
            self.out_pts[op].next = result;
        } else {
            self.out_pts[result].prev = prev;
            self.out_pts[result].next = op;
            self.out_pts[prev].next = result;
            self.out_pts[op].prev = result;
        }
        result
    }

    fn update_out_pt_idxs(&mut self, rec: usize) {
        let Some(start) = self.poly_outs[rec].pts else {
            return;
        };
        let idx = self.poly_outs[rec].idx;
        let mut op = start;
        loop {
            self.out_pts[op].idx = idx;
            op = self.out_pts[op].prev;
            if op == start {
                break;
            }
        }
    }

    /// `Some(true)` inside, `Some(false)` outside, `None` on the boundary.
    fn point_in_out_polygon(&self, pt: IntPoint, start: OutPtId) -> Option<bool> {
        let mut inside = false;
        let mut op = start;
        loop {
            let a = self.out_pts[op].pt;
            let b = self.out_pts[self.out_pts[op].next].pt;
            if b.y == pt.y && (b.x == pt.x || (a.y == pt.y && ((b.x > pt.x) == (a.x < pt.x)))) {
                return None;
            }
            if (a.y < pt.y) != (b.y < pt.y) {
                let crossing = if a.x >= pt.x && b.x > pt.x {
                    true
                } else if a.x >= pt.x || b.x > pt.x {
                    let d = (a.x - pt.x) as f64 * (b.y - pt.y) as f64
                        - (b.x - pt.x) as f64 * (a.y - pt.y) as f64;
                    if d == 0.0 {
                        return None;
                    }
                    (d > 0.0) == (b.y > a.y)
                } else {
                    false
                };
                if crossing {
                    inside = !inside;
                }
            }
            op = self.out_pts[op].next;
            if op == start {
                break;
            }
        }
        Some(inside)
    }

    /// True when the ring at `outer` contains the ring at `inner`.
    fn poly2_contains_poly1(&self, inner: OutPtId, outer: OutPtId) -> bool {
        let mut op = inner;
        loop {
            if let Some(inside) = self.point_in_out_polygon(self.out_pts[op].pt, outer) {
                return inside;
            }
            op = self.out_pts[op].next;
            if op == inner {
                break;
            }
        }
        true
    }

    // ---- after the sweep --------------------------------------------------

    pub(super) fn finish_output(&mut self) {
        for i in 0..self.poly_outs.len() {
            self.fix_orientation(i);
        }
        if !self.joins.is_empty() {
            self.join_common_edges();
        }
        let mut i = 0;
        while i < self.poly_outs.len() {
            if self.poly_outs[i].pts.is_some() {
                self.fixup_out_polygon(i);
            }
            i += 1;
        }
        if self.strictly_simple {
            self.do_simple_polygons();
        }
    }

    /// Outer rings come out with positive area and holes with negative,
    /// unless the solution is reversed.
    fn fix_orientation(&mut self, rec: usize) {
        if let Some(pts) = self.poly_outs[rec].pts {
            if (self.poly_outs[rec].is_hole ^ self.reverse_output) == (self.out_pts_area(pts) > 0.0) {
                self.reverse_poly_pt_links(pts);
            }
        }
    }

    fn join_common_edges(&mut self) {
        for i in 0..self.joins.len() {
            let mut join = self.joins[i];
            let r1 = self.get_out_rec(self.out_pts[join.out_pt1].idx);
            let mut r2 = self.get_out_rec(self.out_pts[join.out_pt2].idx);
            if self.poly_outs[r1].pts.is_none() || self.poly_outs[r2].pts.is_none() {
                continue;
            }

            let hole_state_rec = if r1 == r2 {
                r1
            } else if self.outrec1_right_of_outrec2(r1, r2) {
                r2
            } else if self.outrec1_right_of_outrec2(r2, r1) {
                r1
            } else {
                self.get_lowermost_rec(r1, r2)
            };

            if !self.join_points(&mut join, r1, r2) {
                continue;
            }

            if r1 == r2 {
                // the ring was split in two
                self.poly_outs[r1].pts = Some(join.out_pt1);
                self.poly_outs[r1].bottom_pt = None;
                r2 = self.create_out_rec();
                self.poly_outs[r2].pts = Some(join.out_pt2);
                self.update_out_pt_idxs(r2);

                if self.poly2_contains_poly1(join.out_pt2, join.out_pt1) {
                    self.poly_outs[r2].is_hole = !self.poly_outs[r1].is_hole;
                    self.poly_outs[r2].first_left = Some(r1);
                    self.fix_orientation(r2);
                } else if self.poly2_contains_poly1(join.out_pt1, join.out_pt2) {
                    self.poly_outs[r2].is_hole = self.poly_outs[r1].is_hole;
                    self.poly_outs[r1].is_hole = !self.poly_outs[r2].is_hole;
                    self.poly_outs[r2].first_left = self.poly_outs[r1].first_left;
                    self.poly_outs[r1].first_left = Some(r2);
                    self.fix_orientation(r1);
                } else {
                    self.poly_outs[r2].is_hole = self.poly_outs[r1].is_hole;
                    self.poly_outs[r2].first_left = self.poly_outs[r1].first_left;
                }
            } else {
                // two rings became one
                self.poly_outs[r2].pts = None;
                self.poly_outs[r2].bottom_pt = None;
                self.poly_outs[r2].idx = self.poly_outs[r1].idx;

                self.poly_outs[r1].is_hole = self.poly_outs[hole_state_rec].is_hole;
                if hole_state_rec == r2 {
                    self.poly_outs[r1].first_left = self.poly_outs[r2].first_left;
                }
                self.poly_outs[r2].first_left = Some(r1);
            }
        }
    }

    /// Walks from `op` past points equal to `op` in one direction.
    fn skip_equal(&self, op: OutPtId, forward: bool) -> OutPtId {
        let pt = self.out_pts[op].pt;
        let step = |p: OutPtId| {
            if forward {
                self.out_pts[p].next
            } else {
                self.out_pts[p].prev
            }
        };
        let mut b = step(op);
        while self.out_pts[b].pt == pt && b != op {
            b = step(b);
        }
        b
    }

    /// Cross links `op1` and `op2` so their rings split or merge there.
    fn splice(&mut self, join: &mut Join, op1: OutPtId, op2: OutPtId, reverse: bool) {
        if reverse {
            let op1b = self.dup_out_pt(op1, false);
            let op2b = self.dup_out_pt(op2, true);
            self.out_pts[op1].prev = op2;
            self.out_pts[op2].next = op1;
            self.out_pts[op1b].next = op2b;
            self.out_pts[op2b].prev = op1b;
            join.out_pt1 = op1;
            join.out_pt2 = op1b;
        } else {
            let op1b = self.dup_out_pt(op1, true);
            let op2b = self.dup_out_pt(op2, false);
            self.out_pts[op1].next = op2;
            self.out_pts[op2].prev = op1;
            self.out_pts[op1b].prev = op2b;
            self.out_pts[op2b].next = op1b;
            join.out_pt1 = op1;
            join.out_pt2 = op1b;
        }
    }

    fn join_points(&mut self, join: &mut Join, r1: usize, r2: usize) -> bool {
        let (mut op1, mut op2) = (join.out_pt1, join.out_pt2);
        let off = join.off_pt;
        let is_horizontal = self.out_pts[op1].pt.y == off.y;

        if is_horizontal && off == self.out_pts[op1].pt && off == self.out_pts[op2].pt {
            // two rings touching at a single vertex in strictly simple mode
            if r1 != r2 {
                return false;
            }
            let mut op1b = self.out_pts[op1].next;
            while op1b != op1 && self.out_pts[op1b].pt == off {
                op1b = self.out_pts[op1b].next;
            }
            let reverse1 = self.out_pts[op1b].pt.y > off.y;
            let mut op2b = self.out_pts[op2].next;
            while op2b != op2 && self.out_pts[op2b].pt == off {
                op2b = self.out_pts[op2b].next;
            }
            let reverse2 = self.out_pts[op2b].pt.y > off.y;
            if reverse1 == reverse2 {
                return false;
            }
            self.splice(join, op1, op2, reverse1);
            return true;
        }

        if is_horizontal {
            // The overlap along the horizontal is not known yet: expand both
            // points to the full extent of their horizontal runs first.
            let mut op1b = op1;
            loop {
                let prev = self.out_pts[op1].prev;
                if self.out_pts[prev].pt.y != self.out_pts[op1].pt.y || prev == op1b || prev == op2 {
                    break;
                }
                op1 = prev;
            }
            loop {
                let next = self.out_pts[op1b].next;
                if self.out_pts[next].pt.y != self.out_pts[op1b].pt.y || next == op1 || next == op2 {
                    break;
                }
                op1b = next;
            }
            let next = self.out_pts[op1b].next;
            if next == op1 || next == op2 {
                // a flat ring
                return false;
            }

            let mut op2b = op2;
            loop {
                let prev = self.out_pts[op2].prev;
                if self.out_pts[prev].pt.y != self.out_pts[op2].pt.y || prev == op2b || prev == op1b {
                    break;
                }
                op2 = prev;
            }
            loop {
                let next = self.out_pts[op2b].next;
                if self.out_pts[next].pt.y != self.out_pts[op2b].pt.y || next == op2 || next == op1 {
                    break;
                }
                op2b = next;
            }
            let next = self.out_pts[op2b].next;
            if next == op2 || next == op1 {
                return false;
            }

            let (p1, p1b, p2, p2b) = (
                self.out_pts[op1].pt,
                self.out_pts[op1b].pt,
                self.out_pts[op2].pt,
                self.out_pts[op2b].pt,
            );
            let Some((left, right)) = get_overlap(p1.x, p1b.x, p2.x, p2b.x) else {
                return false;
            };

            // Joining overlapping edges leaves a spike. Keep op1 and op2 off
            // the discarded side since later joins may still need them.
            let within = |x: i64| x >= left && x <= right;
            let (pt, discard_left) = if within(p1.x) {
                (p1, p1.x > p1b.x)
            } else if within(p2.x) {
                (p2, p2.x > p2b.x)
            } else if within(p1b.x) {
                (p1b, p1b.x > p1.x)
            } else {
                (p2b, p2b.x > p2.x)
            };
            join.out_pt1 = op1;
            join.out_pt2 = op2;
            return self.join_horz(op1, op1b, op2, op2b, pt, discard_left);
        }

        // Non-horizontal: op1 and op2 share a Y and lie below off_pt. Find
        // which way each ring runs toward off_pt.
        let full = self.use_full_range;
        let p1 = self.out_pts[op1].pt;
        let mut op1b = self.skip_equal(op1, true);
        let leaves = |engine: &Self, from: IntPoint, to: OutPtId| {
            let to = engine.out_pts[to].pt;
            to.y > from.y || !slopes_equal3(from, to, off, full)
        };
        let reverse1 = leaves(self, p1, op1b);
        if reverse1 {
            op1b = self.skip_equal(op1, false);
            if leaves(self, p1, op1b) {
                return false;
            }
        }

        let p2 = self.out_pts[op2].pt;
        let mut op2b = self.skip_equal(op2, true);
        let reverse2 = leaves(self, p2, op2b);
        if reverse2 {
            op2b = self.skip_equal(op2, false);
            if leaves(self, p2, op2b) {
                return false;
            }
        }

        if op1b == op1 || op2b == op2 || op1b == op2b || (r1 == r2 && reverse1 == reverse2) {
            return false;
        }
        self.splice(join, op1, op2, reverse1);
        true
    }

    /// Moves `op` along its horizontal run up to `pt` and splits a copy off
    /// on the kept side.
    fn join_horz_side(&mut self, mut op: OutPtId, pt: IntPoint, dir: Direction, discard_left: bool) -> (OutPtId, OutPtId) {
        loop {
            let next = self.out_pts[op].next;
            let (nx, cx) = (self.out_pts[next].pt, self.out_pts[op].pt);
            let along = match dir {
                Direction::LeftToRight => nx.x <= pt.x && nx.x >= cx.x,
                Direction::RightToLeft => nx.x >= pt.x && nx.x <= cx.x,
            };
            if !along || nx.y != pt.y {
                break;
            }
            op = next;
        }
        let step_past = (dir == Direction::LeftToRight) == discard_left;
        if step_past && self.out_pts[op].pt.x != pt.x {
            op = self.out_pts[op].next;
        }
        let insert_after = !step_past;
        let mut opb = self.dup_out_pt(op, insert_after);
        if self.out_pts[opb].pt != pt {
            op = opb;
            self.out_pts[op].pt = pt;
            opb = self.dup_out_pt(op, insert_after);
        }
        (op, opb)
    }

    fn join_horz(
        &mut self,
        op1: OutPtId,
        op1b: OutPtId,
        op2: OutPtId,
        op2b: OutPtId,
        pt: IntPoint,
        discard_left: bool,
    ) -> bool {
        let direction = |a: OutPtId, b: OutPtId| {
            if self.out_pts[a].pt.x > self.out_pts[b].pt.x {
                Direction::RightToLeft
            } else {
                Direction::LeftToRight
            }
        };
        let dir1 = direction(op1, op1b);
        let dir2 = direction(op2, op2b);
        if dir1 == dir2 {
            return false;
        }

        let (op1, op1b) = self.join_horz_side(op1, pt, dir1, discard_left);
        let (op2, op2b) = self.join_horz_side(op2, pt, dir2, discard_left);

        if (dir1 == Direction::LeftToRight) == discard_left {
            self.out_pts[op1].prev = op2;
            self.out_pts[op2].next = op1;
            self.out_pts[op1b].next = op2b;
            self.out_pts[op2b].prev = op1b;
        } else {
            self.out_pts[op1].next = op2;
            self.out_pts[op2].prev = op1;
            self.out_pts[op1b].prev = op2b;
            self.out_pts[op2b].next = op1b;
        }
        true
    }

    /// Removes duplicate points, spikes and collinear runs from a ring.
    fn fixup_out_polygon(&mut self, rec: usize) {
        let preserve_col = self.preserve_collinear || self.strictly_simple;
        self.poly_outs[rec].bottom_pt = None;
        let Some(mut pp) = self.poly_outs[rec].pts else {
            return;
        };
        let mut last_ok: Option<OutPtId> = None;
        loop {
            let OutPt { prev, next, pt, .. } = self.out_pts[pp];
            if prev == pp || prev == next {
                self.poly_outs[rec].pts = None;
                return;
            }
            let (pt_prev, pt_next) = (self.out_pts[prev].pt, self.out_pts[next].pt);
            if pt == pt_next
                || pt == pt_prev
                || (slopes_equal3(pt_prev, pt, pt_next, self.use_full_range)
                    && (!preserve_col || !pt2_is_between_pt1_and_pt3(pt_prev, pt, pt_next)))
            {
                last_ok = None;
                self.out_pts[prev].next = next;
                self.out_pts[next].prev = prev;
                pp = prev;
            } else if Some(pp) == last_ok {
                break;
            } else {
                if last_ok.is_none() {
                    last_ok = Some(pp);
                }
                pp = next;
            }
        }
        self.poly_outs[rec].pts = Some(pp);
    }

    /// Splits rings that pass through the same vertex twice.
    fn do_simple_polygons(&mut self) {
        let mut i = 0;
        while i < self.poly_outs.len() {
            let rec = i;
            i += 1;
            let Some(mut op) = self.poly_outs[rec].pts else {
                continue;
            };
            loop {
                let mut op2 = self.out_pts[op].next;
                while Some(op2) != self.poly_outs[rec].pts {
                    let a = self.out_pts[op];
                    let b = self.out_pts[op2];
                    if a.pt == b.pt && b.next != op && b.prev != op {
                        let (op3, op4) = (a.prev, b.prev);
                        self.out_pts[op].prev = op4;
                        self.out_pts[op4].next = op;
                        self.out_pts[op2].prev = op3;
                        self.out_pts[op3].next = op2;

                        self.poly_outs[rec].pts = Some(op);
                        let rec2 = self.create_out_rec();
                        self.poly_outs[rec2].pts = Some(op2);
                        self.update_out_pt_idxs(rec2);

                        if self.poly2_contains_poly1(op2, op) {
                            self.poly_outs[rec2].is_hole = !self.poly_outs[rec].is_hole;
                            self.poly_outs[rec2].first_left = Some(rec);
                        } else if self.poly2_contains_poly1(op, op2) {
                            self.poly_outs[rec2].is_hole = self.poly_outs[rec].is_hole;
                            self.poly_outs[rec].is_hole = !self.poly_outs[rec2].is_hole;
                            self.poly_outs[rec2].first_left = self.poly_outs[rec].first_left;
                            self.poly_outs[rec].first_left = Some(rec2);
                        } else {
                            self.poly_outs[rec2].is_hole = self.poly_outs[rec].is_hole;
                            self.poly_outs[rec2].first_left = self.poly_outs[rec].first_left;
                        }
                        op2 = op;
                    }
                    op2 = self.out_pts[op2].next;
                }
                op = self.out_pts[op].next;
                if Some(op) == self.poly_outs[rec].pts {
                    break;
                }
            }
        }
    }

    fn ring_len(&self, start: OutPtId) -> usize {
        let mut count = 0;
        let mut op = start;
        loop {
            count += 1;
            op = self.out_pts[op].next;
            if op == start {
                break;
            }
        }
        count
    }

    pub(super) fn build_result(&self) -> Paths {
        let mut paths = Paths::with_capacity(self.poly_outs.len());
        for out in &self.poly_outs {
            let Some(pts) = out.pts else {
                continue;
            };
            let mut p = self.out_pts[pts].prev;
            let count = self.ring_len(p);
            if count < 2 {
                continue;
            }
            let mut path = Path::with_capacity(count);
            for _ in 0..count {
                path.push(self.out_pts[p].pt);
                p = self.out_pts[p].prev;
            }
            paths.push(path);
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_overlap() {
        assert_eq!(get_overlap(0, 10, 5, 20), Some((5, 10)));
        assert_eq!(get_overlap(10, 0, 20, 5), Some((5, 10)));
        assert_eq!(get_overlap(0, 10, 10, 20), None);
    }

    #[test]
    fn test_get_dx() {
        assert_eq!(get_dx(IntPoint::new(0, 0), IntPoint::new(5, 0)), HORIZONTAL);
        assert_eq!(get_dx(IntPoint::new(0, 0), IntPoint::new(5, 10)), 0.5);
    }

    #[test]
    fn test_ring_helpers() {
        let mut clipper = ClippingEngine::new();
        let rec = clipper.create_out_rec();
        let pts = [(0, 0), (10, 0), (10, 10), (0, 10)];
        let ids: Vec<OutPtId> = pts
            .iter()
            .map(|&(x, y)| clipper.new_out_pt(rec, IntPoint::new(x, y)))
            .collect();
        for i in 0..ids.len() {
            clipper.out_pts[ids[i]].next = ids[(i + 1) % ids.len()];
            clipper.out_pts[ids[i]].prev = ids[(i + ids.len() - 1) % ids.len()];
        }
        clipper.poly_outs[rec].pts = Some(ids[0]);

        assert_eq!(clipper.ring_len(ids[0]), 4);
        assert_eq!(clipper.out_pts_area(ids[0]).abs(), 100.0);
        assert_eq!(clipper.get_bottom_pt(ids[0]), ids[3]);
        assert_eq!(clipper.point_in_out_polygon(IntPoint::new(5, 5), ids[0]), Some(true));
        assert_eq!(clipper.point_in_out_polygon(IntPoint::new(15, 5), ids[0]), Some(false));
        assert_eq!(clipper.point_in_out_polygon(IntPoint::new(10, 5), ids[0]), None);

        let area = clipper.out_pts_area(ids[0]);
        clipper.reverse_poly_pt_links(ids[0]);
        assert_eq!(clipper.out_pts_area(ids[0]), -area);

        // emitted by walking prev links, so the path keeps the ring's sign
        let result = clipper.build_result();
        assert_eq!(result.len(), 1);
        assert_eq!(super::super::area(&result[0]), -area);
    }
}
