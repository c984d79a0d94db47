// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// The Bentley-Ottmann style sweep that turns a set of contours into a mesh
// whose interior faces are x-monotone.
//
// The sweep line moves left to right (increasing x, then y). The edges it
// currently crosses are kept in an ordered dictionary from bottom to top;
// the strip between two neighboring edges is an `ActiveRegion`, which
// carries the winding number of that strip. Every vertex is an event:
//   1. regions whose edges end at the event are closed and their faces
//      labelled inside or outside;
//   2. edges leaving the event to the right are inserted;
//   3. neighbors that changed are checked for intersections, which split
//      both edges at a new vertex queued as a later event.
// A vertex with no left-going edges is connected to the mesh on its left
// when it lies inside, which is what keeps every inside face monotone.
//
// Sweep state never lives on the mesh records: edge windings, the region
// owning each active edge and the queue handle of each vertex are side
// tables keyed by mesh handles. The only output is `Face::inside`.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::arena::{Arena, Id};
use crate::dict::{Dict, NodeId};
use crate::error::{Result, TessError};
use crate::geom::{edge_eval, edge_intersect, edge_sign, vert_eq, vert_leq, BoundingBox, Point};
use crate::mesh::{EdgeId, Mesh, QuadEdgeId, VertexId};
use crate::priorityq::{EventHandle, PriorityQ};
use crate::tess::FillRule;

pub type RegionId = Id<ActiveRegion>;

/// Winding contribution of every edge, counted when crossing it from right
/// to left. Stored once per undirected edge; the reverse direction carries
/// the opposite sign. Edges without an entry contribute nothing.
#[derive(Clone, Debug, Default)]
pub(crate) struct EdgeWindings {
    by_quad: HashMap<QuadEdgeId, i32>,
}

impl EdgeWindings {
    pub fn with_capacity(edges: usize) -> Self {
        EdgeWindings {
            by_quad: HashMap::with_capacity(edges),
        }
    }

    #[inline]
    pub fn get(&self, e: EdgeId) -> i32 {
        let w = self.by_quad.get(&e.quad()).copied().unwrap_or(0);
        if e.slot() == 0 {
            w
        } else {
            -w
        }
    }

    #[inline]
    pub fn set(&mut self, e: EdgeId, winding: i32) {
        let w = if e.slot() == 0 { winding } else { -winding };
        self.by_quad.insert(e.quad(), w);
    }

    /// Adds the winding of `src` onto `dst`.
    pub fn add(&mut self, dst: EdgeId, src: EdgeId) {
        let w = self.get(dst) + self.get(src);
        self.set(dst, w);
    }

    /// The second half of a split edge runs the same way as the first.
    pub fn inherit(&mut self, e_new: EdgeId, e_org: EdgeId) {
        let w = self.get(e_org);
        self.set(e_new, w);
    }

    pub fn remove(&mut self, e: EdgeId) {
        self.by_quad.remove(&e.quad());
    }
}

/// The area between two adjacent edges crossing the sweep line.
#[derive(Clone, Debug)]
pub struct ActiveRegion {
    /// Upper edge, directed right to left.
    e_up: EdgeId,
    /// Dictionary node holding this region.
    node_up: Option<NodeId<RegionId>>,
    /// Winding number of the region.
    winding_number: i32,
    inside: bool,
    /// Fake edge at y = ±infinity.
    sentinel: bool,
    /// Upper or lower edge changed; needs an ordering/intersection check.
    dirty: bool,
    /// Temporary edge added for a right vertex, replaced later.
    fix_upper_edge: bool,
}

impl ActiveRegion {
    fn new(e_up: EdgeId) -> Self {
        ActiveRegion {
            e_up,
            node_up: None,
            winding_number: 0,
            inside: false,
            sentinel: false,
            dirty: false,
            fix_upper_edge: false,
        }
    }
}

/// Queued sweep event. Keys compare by position, then by vertex handle, so
/// coincident vertices come out in a fixed order.
#[derive(Copy, Clone, Debug)]
pub(crate) struct EventKey {
    pub position: Point,
    pub vertex: VertexId,
}

fn event_leq(a: &EventKey, b: &EventKey) -> bool {
    if vert_eq(a.position, b.position) {
        a.vertex <= b.vertex
    } else {
        vert_leq(a.position, b.position)
    }
}

fn inconsistent(msg: &'static str) -> TessError {
    TessError::InternalInconsistency(msg)
}

/// Ordering of two active edges at the current event: true if `e1` is at
/// or below `e2` where they cross the sweep line.
fn edge_leq(mesh: &Mesh, event: VertexId, e1: EdgeId, e2: EdgeId) -> bool {
    let ev = mesh.position(event);
    let (o1, d1) = (mesh.org_position(e1), mesh.dst_position(e1));
    let (o2, d2) = (mesh.org_position(e2), mesh.dst_position(e2));

    if mesh.dst(e1) == event {
        if mesh.dst(e2) == event {
            // Both edges end at the event: sort by slope.
            if vert_leq(o1, o2) {
                return edge_sign(d2, o1, o2) <= 0.0;
            }
            return edge_sign(d1, o2, o1) >= 0.0;
        }
        return edge_sign(d2, ev, o2) <= 0.0;
    }
    if mesh.dst(e2) == event {
        return edge_sign(d1, ev, o1) >= 0.0;
    }

    let t1 = edge_eval(d1, ev, o1);
    let t2 = edge_eval(d2, ev, o2);
    t1 >= t2
}

// ─────────────────────────────── Pre-sweep cleanup ──────────────────────────

/// Merge zero-length edges away and drop contours with fewer than three
/// edges.
pub(crate) fn remove_degenerate_edges(mesh: &mut Mesh) {
    let snapshot: Vec<EdgeId> = mesh.edges().collect();
    let mut dropped = 0usize;
    for mut e in snapshot {
        if !mesh.contains_edge(e) {
            continue;
        }
        let mut e_lnext = mesh.lnext(e);

        if vert_eq(mesh.org_position(e), mesh.dst_position(e)) && mesh.lnext(e_lnext) != e {
            // Zero-length edge on a contour with at least three edges.
            mesh.splice(e_lnext, e);
            mesh.delete_edge(e);
            dropped += 1;
            e = e_lnext;
            e_lnext = mesh.lnext(e);
        }
        if mesh.lnext(e_lnext) == e {
            // Contour made of one or two edges.
            if e_lnext != e {
                mesh.delete_edge(e_lnext);
                dropped += 1;
            }
            mesh.delete_edge(e);
            dropped += 1;
        }
    }
    if dropped > 0 {
        log::warn!("dropped {} degenerate contour edges", dropped);
    }
}

/// Remove faces bounded by only two edges, folding their winding into the
/// neighbor.
pub(crate) fn remove_degenerate_faces(mesh: &mut Mesh, windings: &mut EdgeWindings) {
    let snapshot: Vec<_> = mesh.faces().collect();
    for f in snapshot {
        if !mesh.contains_face(f) {
            continue;
        }
        let Some(e) = mesh.face(f).edge() else {
            continue;
        };
        debug_assert!(mesh.lnext(e) != e);
        if mesh.lnext(mesh.lnext(e)) == e {
            let onext = mesh.onext(e);
            windings.add(onext, e);
            windings.remove(e);
            mesh.delete_edge(e);
        }
    }
}

// ─────────────────────────────────── Sweep ──────────────────────────────────

/// Run the sweep over `mesh`, marking every face as inside or outside under
/// `fill_rule`. `windings` holds the contribution of every contour edge.
/// `bounds` must cover every vertex. `cancel` is polled once per event.
pub(crate) fn compute_interior(
    mesh: &mut Mesh,
    windings: &mut EdgeWindings,
    fill_rule: FillRule,
    bounds: BoundingBox,
    cancel: &mut dyn FnMut() -> bool,
) -> Result<()> {
    remove_degenerate_edges(mesh);

    let mut pq = PriorityQ::with_capacity(mesh.vertices_count(), event_leq);
    let mut handles = HashMap::with_capacity(mesh.vertices_count());
    for v in mesh.vertices() {
        let handle = pq.insert(EventKey {
            position: mesh.position(v),
            vertex: v,
        });
        handles.insert(v, handle);
    }
    pq.init();

    // Sentinels sit outside the bounding box; the margin keeps them apart
    // when the box is empty.
    let w = bounds.width() + 0.01;
    let h = bounds.height() + 0.01;
    let smin = bounds.min.x - w;
    let smax = bounds.max.x + w;
    let tmin = bounds.min.y - h;
    let tmax = bounds.max.y + h;

    let bottom = make_sentinel_edge(mesh, smin, smax, tmin);
    let top = make_sentinel_edge(mesh, smin, smax, tmax);

    let mut sweep = Sweep {
        event: mesh.dst(bottom),
        mesh,
        windings,
        active: HashMap::new(),
        dict: Dict::new(),
        regions: Arena::new(),
        pq,
        handles,
        fill_rule,
        cancel,
        events: 0,
    };
    sweep.add_sentinel(bottom);
    sweep.event = sweep.mesh.dst(top);
    sweep.add_sentinel(top);

    sweep.run()?;
    sweep.done_edge_dict();

    remove_degenerate_faces(sweep.mesh, sweep.windings);
    Ok(())
}

fn make_sentinel_edge(mesh: &mut Mesh, smin: f64, smax: f64, t: f64) -> EdgeId {
    let e = mesh.make_edge();
    let org = mesh.org(e);
    let dst = mesh.dst(e);
    mesh.vertex_mut(org).position = Point::new(smax, t);
    mesh.vertex_mut(dst).position = Point::new(smin, t);
    e
}

struct Sweep<'a> {
    mesh: &'a mut Mesh,
    windings: &'a mut EdgeWindings,
    /// Region whose upper edge is the key, for every edge in the dictionary.
    active: HashMap<EdgeId, RegionId>,
    /// Active regions, bottom to top.
    dict: Dict<RegionId>,
    regions: Arena<ActiveRegion>,
    pq: PriorityQ<EventKey>,
    /// Queue handle of every vertex still waiting to be swept.
    handles: HashMap<VertexId, EventHandle>,
    /// Vertex currently being processed.
    event: VertexId,
    fill_rule: FillRule,
    cancel: &'a mut dyn FnMut() -> bool,
    events: usize,
}

impl<'a> Sweep<'a> {
    fn run(&mut self) -> Result<()> {
        while let Some(key) = self.pq.extract_min() {
            let v = key.vertex;
            if !self.mesh.contains_vertex(v) {
                continue;
            }
            self.handles.remove(&v);

            // Merge every vertex at exactly the same position into `v`.
            while let Some(&next) = self.pq.minimum() {
                if !vert_eq(next.position, key.position) {
                    break;
                }
                self.pq.extract_min();
                if !self.mesh.contains_vertex(next.vertex) {
                    continue;
                }
                self.handles.remove(&next.vertex);
                let a = self.mesh.an_edge(v)?;
                let b = self.mesh.an_edge(next.vertex)?;
                self.mesh.splice(a, b);
            }

            if (self.cancel)() {
                log::debug!("sweep cancelled after {} events", self.events);
                return Err(TessError::Cancelled);
            }
            self.events += 1;
            self.sweep_event(v)?;
        }
        log::trace!("sweep finished after {} events", self.events);
        Ok(())
    }

    /// Split `e` at a new vertex; both halves keep the winding of `e`.
    fn split_edge(&mut self, e: EdgeId) -> EdgeId {
        let e_new = self.mesh.split_edge(e);
        self.windings.inherit(e_new, e);
        e_new
    }

    fn delete_edge(&mut self, e: EdgeId) {
        self.windings.remove(e);
        self.active.remove(&e);
        self.active.remove(&e.sym());
        self.mesh.delete_edge(e);
    }

    #[inline]
    fn active_region(&self, e: EdgeId) -> Option<RegionId> {
        self.active.get(&e).copied()
    }

    #[inline]
    fn event_position(&self) -> Point {
        self.mesh.position(self.event)
    }

    #[inline]
    fn e_up(&self, reg: RegionId) -> EdgeId {
        self.regions[reg].e_up
    }

    fn node_of(&self, reg: RegionId) -> NodeId<RegionId> {
        match self.regions[reg].node_up {
            Some(node) => node,
            None => panic!("region {:?} is not in the dictionary", reg),
        }
    }

    fn region_above(&self, reg: RegionId) -> Option<RegionId> {
        let node = self.dict.next(Some(self.node_of(reg)))?;
        Some(*self.dict.key(node))
    }

    fn region_below(&self, reg: RegionId) -> Option<RegionId> {
        let node = self.dict.prev(Some(self.node_of(reg)))?;
        Some(*self.dict.key(node))
    }

    fn above(&self, reg: RegionId) -> Result<RegionId> {
        self.region_above(reg)
            .ok_or_else(|| inconsistent("no region above"))
    }

    fn below(&self, reg: RegionId) -> Result<RegionId> {
        self.region_below(reg)
            .ok_or_else(|| inconsistent("no region below"))
    }

    fn region_leq(&self, r1: RegionId, r2: RegionId) -> bool {
        edge_leq(self.mesh, self.event, self.e_up(r1), self.e_up(r2))
    }

    fn is_winding_inside(&self, n: i32) -> bool {
        match self.fill_rule {
            FillRule::OddEven | FillRule::EvenOdd => n & 1 != 0,
            FillRule::Any => n != 0,
            FillRule::NonZero => unreachable!("non-zero fill is rejected before the sweep"),
        }
    }

    // ─────── Region bookkeeping ────────────────────────────────────────────

    /// Insert `reg` below the node `above` (or at the top when `None`),
    /// walking down past regions that sort above it.
    fn insert_region(&mut self, above: Option<NodeId<RegionId>>, reg: RegionId) -> NodeId<RegionId> {
        let mut cursor = match above {
            Some(node) => self.dict.prev(Some(node)),
            None => self.dict.max(),
        };
        while let Some(node) = cursor {
            if self.region_leq(*self.dict.key(node), reg) {
                break;
            }
            cursor = self.dict.prev(Some(node));
        }
        let successor = match cursor {
            Some(node) => self.dict.next(Some(node)),
            None => self.dict.min(),
        };
        match successor {
            Some(node) => self.dict.insert_before(node, reg),
            None => {
                self.dict
                    .insert_by(reg, &|_: &RegionId, _: &RegionId| Ordering::Greater)
                    .0
            }
        }
    }

    fn add_sentinel(&mut self, e: EdgeId) {
        let mut region = ActiveRegion::new(e);
        region.sentinel = true;
        let reg = self.regions.alloc(region);
        let node = self.insert_region(None, reg);
        self.regions[reg].node_up = Some(node);
    }

    fn add_region_below(&mut self, reg_above: RegionId, e_new_up: EdgeId) -> RegionId {
        let reg_new = self.regions.alloc(ActiveRegion::new(e_new_up));
        let above = self.regions[reg_above].node_up;
        let node = self.insert_region(above, reg_new);
        self.regions[reg_new].node_up = Some(node);
        self.active.insert(e_new_up, reg_new);
        reg_new
    }

    fn delete_region(&mut self, reg: RegionId) {
        let region = self.regions.free(reg);
        if region.fix_upper_edge {
            debug_assert_eq!(self.windings.get(region.e_up), 0);
        }
        self.active.remove(&region.e_up);
        if let Some(node) = region.node_up {
            self.dict.delete_node(node);
        }
    }

    /// Replace the temporary upper edge of `reg` with `new_edge`.
    fn fix_upper_edge(&mut self, reg: RegionId, new_edge: EdgeId) {
        debug_assert!(self.regions[reg].fix_upper_edge);
        let old = self.e_up(reg);
        self.delete_edge(old);
        let region = &mut self.regions[reg];
        region.fix_upper_edge = false;
        region.e_up = new_edge;
        self.active.insert(new_edge, reg);
    }

    /// Point `reg` at a different upper edge.
    fn set_e_up(&mut self, reg: RegionId, e: EdgeId) {
        let old = self.e_up(reg);
        if self.active_region(old) == Some(reg) {
            self.active.remove(&old);
        }
        self.regions[reg].e_up = e;
        self.active.insert(e, reg);
    }

    fn compute_winding(&mut self, reg: RegionId) -> Result<()> {
        let above = self.above(reg)?;
        let winding = self.regions[above].winding_number + self.windings.get(self.e_up(reg));
        let inside = self.is_winding_inside(winding);
        let region = &mut self.regions[reg];
        region.winding_number = winding;
        region.inside = inside;
        Ok(())
    }

    /// Label the face to the left of the region's upper edge and delete the region.
    fn finish_region(&mut self, reg: RegionId) {
        let e = self.e_up(reg);
        let f = self.mesh.lface(e);
        self.mesh.face_mut(f).inside = self.regions[reg].inside;
        self.mesh.set_face_edge(f, e);
        self.delete_region(reg);
    }

    /// The region above the topmost edge sharing the origin of `reg`'s upper edge.
    fn top_left_region(&mut self, reg: RegionId) -> Result<RegionId> {
        let org = self.mesh.org(self.e_up(reg));
        let mut reg = reg;
        loop {
            reg = self.above(reg)?;
            if self.mesh.org(self.e_up(reg)) != org {
                break;
            }
        }

        // A temporary edge from connect_right_vertex is fixed now.
        if self.regions[reg].fix_upper_edge {
            let below = self.below(reg)?;
            let from = self.e_up(below).sym();
            let to = self.mesh.lnext(self.e_up(reg));
            let e = self.mesh.connect_loops(from, to);
            self.fix_upper_edge(reg, e);
            reg = self.above(reg)?;
        }
        Ok(reg)
    }

    /// The region above the topmost edge sharing the destination of `reg`'s upper edge.
    fn top_right_region(&self, reg: RegionId) -> Result<RegionId> {
        let dst = self.mesh.dst(self.e_up(reg));
        let mut reg = reg;
        loop {
            reg = self.above(reg)?;
            if self.mesh.dst(self.e_up(reg)) != dst {
                return Ok(reg);
            }
        }
    }

    /// Close every region from `reg_first` down to (not including)
    /// `reg_last`, relinking the mesh so their upper edges are consecutive
    /// around the event. Returns the lowest left-going edge.
    fn finish_left_regions(&mut self, reg_first: RegionId, reg_last: Option<RegionId>) -> Result<EdgeId> {
        let mut reg_prev = reg_first;
        let mut e_prev = self.e_up(reg_first);

        while Some(reg_prev) != reg_last {
            self.regions[reg_prev].fix_upper_edge = false;
            let reg = self.below(reg_prev)?;
            let mut e = self.e_up(reg);

            if self.mesh.org(e) != self.mesh.org(e_prev) {
                if !self.regions[reg].fix_upper_edge {
                    // Last left-going edge. There may be more such edges in
                    // the mesh, so the region is finished, not just deleted.
                    self.finish_region(reg_prev);
                    break;
                }
                let from = self.mesh.lprev(e_prev);
                e = self.mesh.connect_loops(from, e.sym());
                self.fix_upper_edge(reg, e);
            }

            if self.mesh.onext(e_prev) != e {
                let oprev = self.mesh.oprev(e);
                self.mesh.splice(oprev, e);
                self.mesh.splice(e_prev, e);
            }
            self.finish_region(reg_prev);
            e_prev = self.e_up(reg);
            reg_prev = reg;
        }
        Ok(e_prev)
    }

    /// Insert the right-going edges from `e_first` up to (not including)
    /// `e_last` below `reg_up`, then walk all right-going edges of the
    /// event updating winding numbers and mesh order.
    fn add_right_edges(
        &mut self,
        reg_up: RegionId,
        e_first: EdgeId,
        e_last: EdgeId,
        e_top_left: Option<EdgeId>,
        clean_up: bool,
    ) -> Result<()> {
        let mut e = e_first;
        loop {
            debug_assert!(vert_leq(self.mesh.org_position(e), self.mesh.dst_position(e)));
            self.add_region_below(reg_up, e.sym());
            e = self.mesh.onext(e);
            if e == e_last {
                break;
            }
        }

        let e_top_left = match e_top_left {
            Some(e) => e,
            None => {
                let below = self.below(reg_up)?;
                self.mesh.rprev(self.e_up(below))
            }
        };

        let mut reg_prev = reg_up;
        let mut e_prev = e_top_left;
        let mut first_time = true;
        loop {
            let reg = self.below(reg_prev)?;
            let e = self.e_up(reg).sym();
            if self.mesh.org(e) != self.mesh.org(e_prev) {
                break;
            }

            if self.mesh.onext(e) != e_prev {
                // Relink e just below e_prev.
                let oprev = self.mesh.oprev(e);
                self.mesh.splice(oprev, e);
                let prev_oprev = self.mesh.oprev(e_prev);
                self.mesh.splice(prev_oprev, e);
            }

            let winding = self.regions[reg_prev].winding_number - self.windings.get(e);
            let inside = self.is_winding_inside(winding);
            self.regions[reg].winding_number = winding;
            self.regions[reg].inside = inside;

            // Two outgoing edges with the same slope are merged before any
            // intersection test.
            self.regions[reg_prev].dirty = true;
            if !first_time && self.check_for_right_splice(reg_prev)? {
                self.windings.add(e, e_prev);
                self.delete_region(reg_prev);
                self.delete_edge(e_prev);
            }
            first_time = false;
            reg_prev = reg;
            e_prev = e;
        }
        self.regions[reg_prev].dirty = true;

        if clean_up {
            self.walk_dirty_regions(reg_prev)?;
        }
        Ok(())
    }

    // ─────── Ordering repairs and intersections ────────────────────────────

    /// Repair the dictionary order at the origins of the edges above and
    /// below `reg_up`. Returns true if the mesh changed.
    fn check_for_right_splice(&mut self, reg_up: RegionId) -> Result<bool> {
        let reg_lo = self.below(reg_up)?;
        let e_up = self.e_up(reg_up);
        let e_lo = self.e_up(reg_lo);
        let up_org = self.mesh.org_position(e_up);
        let lo_org = self.mesh.org_position(e_lo);

        if vert_leq(up_org, lo_org) {
            if edge_sign(self.mesh.dst_position(e_lo), up_org, lo_org) > 0.0 {
                return Ok(false);
            }
            if !vert_eq(up_org, lo_org) {
                // Splice the origin of e_up into e_lo.
                self.split_edge(e_lo.sym());
                let oprev = self.mesh.oprev(e_lo);
                self.mesh.splice(e_up, oprev);
                self.regions[reg_up].dirty = true;
                self.regions[reg_lo].dirty = true;
            } else if self.mesh.org(e_up) != self.mesh.org(e_lo) {
                // Same position: merge, discarding the origin of e_up.
                let v = self.mesh.org(e_up);
                if let Some(handle) = self.handles.remove(&v) {
                    self.pq.delete(handle);
                }
                let oprev = self.mesh.oprev(e_lo);
                self.mesh.splice(oprev, e_up);
            }
        } else {
            if edge_sign(self.mesh.dst_position(e_up), lo_org, up_org) < 0.0 {
                return Ok(false);
            }
            // Splice the origin of e_lo into e_up.
            let above = self.above(reg_up)?;
            self.regions[above].dirty = true;
            self.regions[reg_up].dirty = true;
            self.split_edge(e_up.sym());
            let oprev = self.mesh.oprev(e_lo);
            self.mesh.splice(oprev, e_up);
        }
        Ok(true)
    }

    /// Repair the dictionary order at the destinations of the edges above
    /// and below `reg_up`. Returns true if the mesh changed.
    fn check_for_left_splice(&mut self, reg_up: RegionId) -> Result<bool> {
        let reg_lo = self.below(reg_up)?;
        let e_up = self.e_up(reg_up);
        let e_lo = self.e_up(reg_lo);
        let up_dst = self.mesh.dst_position(e_up);
        let lo_dst = self.mesh.dst_position(e_lo);
        if vert_eq(up_dst, lo_dst) {
            // Distinct vertices at one position are merged when swept.
            return Ok(false);
        }

        if vert_leq(up_dst, lo_dst) {
            if edge_sign(up_dst, lo_dst, self.mesh.org_position(e_up)) < 0.0 {
                return Ok(false);
            }
            // The destination of e_lo is above e_up: splice it into e_up.
            let above = self.above(reg_up)?;
            self.regions[above].dirty = true;
            self.regions[reg_up].dirty = true;
            let e = self.split_edge(e_up);
            self.mesh.splice(e_lo.sym(), e);
            let f = self.mesh.lface(e);
            self.mesh.face_mut(f).inside = self.regions[reg_up].inside;
        } else {
            if edge_sign(lo_dst, up_dst, self.mesh.org_position(e_lo)) > 0.0 {
                return Ok(false);
            }
            // The destination of e_up is below e_lo: splice it into e_lo.
            self.regions[reg_up].dirty = true;
            self.regions[reg_lo].dirty = true;
            let e = self.split_edge(e_lo);
            let lnext = self.mesh.lnext(e_up);
            self.mesh.splice(lnext, e_lo.sym());
            let f = self.mesh.rface(e);
            self.mesh.face_mut(f).inside = self.regions[reg_up].inside;
        }
        Ok(true)
    }

    /// Test the edges above and below `reg_up` for an intersection and, if
    /// they cross, split both at a new vertex. Returns true if the dirty
    /// regions were already walked.
    fn check_for_intersect(&mut self, reg_up: RegionId) -> Result<bool> {
        let mut reg_lo = self.below(reg_up)?;
        let e_up = self.e_up(reg_up);
        let e_lo = self.e_up(reg_lo);
        let org_up = self.mesh.org(e_up);
        let org_lo = self.mesh.org(e_lo);
        let dst_up = self.mesh.dst(e_up);
        let dst_lo = self.mesh.dst(e_lo);
        let (ou, ol) = (self.mesh.position(org_up), self.mesh.position(org_lo));
        let (du, dl) = (self.mesh.position(dst_up), self.mesh.position(dst_lo));
        let event = self.event;
        let ev = self.event_position();

        if vert_eq(dl, du) {
            return Ok(false);
        }
        debug_assert!(org_up != event && org_lo != event);
        debug_assert!(!self.regions[reg_up].fix_upper_edge && !self.regions[reg_lo].fix_upper_edge);

        if org_up == org_lo {
            return Ok(false);
        }
        if vert_eq(ou, ol) {
            // Distinct right endpoints at one position. Intersecting the
            // two edges would bend them, so merge the endpoints instead.
            self.check_for_right_splice(reg_up)?;
            return Ok(false);
        }

        let t_min_up = ou.y.min(du.y);
        let t_max_lo = ol.y.max(dl.y);
        if t_min_up > t_max_lo {
            return Ok(false);
        }

        if vert_leq(ou, ol) {
            if edge_sign(dl, ou, ol) > 0.0 {
                return Ok(false);
            }
        } else if edge_sign(du, ol, ou) < 0.0 {
            return Ok(false);
        }

        let mut isect = edge_intersect(du, ou, dl, ol);
        // Keep the crossing to the right of the sweep line and no further
        // right than the leftmost origin.
        if vert_leq(isect, ev) {
            isect = ev;
        }
        let org_min = if vert_leq(ou, ol) { ou } else { ol };
        if vert_leq(org_min, isect) {
            isect = org_min;
        }
        log::trace!("edges cross near ({}, {})", isect.x, isect.y);

        if vert_eq(isect, ou) || vert_eq(isect, ol) {
            // Crossing at one of the right endpoints.
            self.check_for_right_splice(reg_up)?;
            return Ok(false);
        }

        if (!vert_eq(du, ev) && edge_sign(du, ev, isect) >= 0.0)
            || (!vert_eq(dl, ev) && edge_sign(dl, ev, isect) <= 0.0)
        {
            // Rounding put the new upper or lower edge on the wrong side
            // of the event.
            if dst_lo == event {
                // Splice dst_lo into e_up and process the new regions.
                self.split_edge(e_up.sym());
                self.mesh.splice(e_lo.sym(), e_up);
                let reg_up = self.top_left_region(reg_up)?;
                let below = self.below(reg_up)?;
                let e_up = self.e_up(below);
                self.finish_left_regions(below, Some(reg_lo))?;
                let first = self.mesh.oprev(e_up);
                self.add_right_edges(reg_up, first, e_up, Some(e_up), true)?;
                return Ok(true);
            }
            if dst_up == event {
                // Splice dst_up into e_lo and process the new regions.
                self.split_edge(e_lo.sym());
                let lnext = self.mesh.lnext(e_up);
                let oprev = self.mesh.oprev(e_lo);
                self.mesh.splice(lnext, oprev);
                reg_lo = reg_up;
                let reg_up = self.top_right_region(reg_up)?;
                let below = self.below(reg_up)?;
                let e = self.mesh.rprev(self.e_up(below));
                let new_lo = self.mesh.oprev(e_lo);
                self.set_e_up(reg_lo, new_lo);
                let e_lo = self.finish_left_regions(reg_lo, None)?;
                let first = self.mesh.onext(e_lo);
                let last = self.mesh.rprev(e_up);
                self.add_right_edges(reg_up, first, last, Some(e), true)?;
                return Ok(true);
            }
            // Called from connect_right_vertex: split whichever edge passes
            // on the wrong side and leave the splice to the caller.
            if edge_sign(du, ev, isect) >= 0.0 {
                let above = self.above(reg_up)?;
                self.regions[above].dirty = true;
                self.regions[reg_up].dirty = true;
                self.split_edge(e_up.sym());
                let v = self.mesh.org(e_up);
                self.mesh.vertex_mut(v).position = ev;
            }
            if edge_sign(dl, ev, isect) <= 0.0 {
                self.regions[reg_up].dirty = true;
                self.regions[reg_lo].dirty = true;
                self.split_edge(e_lo.sym());
                let v = self.mesh.org(e_lo);
                self.mesh.vertex_mut(v).position = ev;
            }
            return Ok(false);
        }

        // General case: split both edges and join them at a new vertex.
        self.split_edge(e_up.sym());
        self.split_edge(e_lo.sym());
        let oprev = self.mesh.oprev(e_lo);
        self.mesh.splice(oprev, e_up);
        let v = self.mesh.org(e_up);
        let handle = self.pq.insert(EventKey {
            position: isect,
            vertex: v,
        });
        self.handles.insert(v, handle);
        let vertex = self.mesh.vertex_mut(v);
        vertex.position = isect;
        vertex.source = None;

        let above = self.above(reg_up)?;
        self.regions[above].dirty = true;
        self.regions[reg_up].dirty = true;
        self.regions[reg_lo].dirty = true;
        Ok(false)
    }

    /// Re-establish the ordering invariants for every dirty region,
    /// walking from the lowest dirty region upwards.
    fn walk_dirty_regions(&mut self, reg_up: RegionId) -> Result<()> {
        let mut reg_up = reg_up;
        let mut reg_lo = self.below(reg_up)?;

        loop {
            while self.regions[reg_lo].dirty {
                reg_up = reg_lo;
                reg_lo = self.below(reg_lo)?;
            }
            if !self.regions[reg_up].dirty {
                reg_lo = reg_up;
                match self.region_above(reg_up) {
                    Some(reg) if self.regions[reg].dirty => reg_up = reg,
                    _ => return Ok(()),
                }
            }
            self.regions[reg_up].dirty = false;
            let mut e_up = self.e_up(reg_up);
            let mut e_lo = self.e_up(reg_lo);

            if self.mesh.dst(e_up) != self.mesh.dst(e_lo) && self.check_for_left_splice(reg_up)? {
                // A temporary edge is no longer needed once the
                // destinations are ordered.
                if self.regions[reg_lo].fix_upper_edge {
                    self.delete_region(reg_lo);
                    self.delete_edge(e_lo);
                    reg_lo = self.below(reg_up)?;
                    e_lo = self.e_up(reg_lo);
                } else if self.regions[reg_up].fix_upper_edge {
                    self.delete_region(reg_up);
                    self.delete_edge(e_up);
                    reg_up = self.above(reg_lo)?;
                    e_up = self.e_up(reg_up);
                }
            }

            if self.mesh.org(e_up) != self.mesh.org(e_lo) {
                if self.mesh.dst(e_up) != self.mesh.dst(e_lo)
                    && !self.regions[reg_up].fix_upper_edge
                    && !self.regions[reg_lo].fix_upper_edge
                    && (self.mesh.dst(e_up) == self.event || self.mesh.dst(e_lo) == self.event)
                {
                    if self.check_for_intersect(reg_up)? {
                        return Ok(());
                    }
                } else {
                    self.check_for_right_splice(reg_up)?;
                }
            }

            if self.mesh.org(e_up) == self.mesh.org(e_lo) && self.mesh.dst(e_up) == self.mesh.dst(e_lo) {
                // Two-edge loop: fold it away.
                self.windings.add(e_lo, e_up);
                self.delete_region(reg_up);
                self.delete_edge(e_up);
                reg_up = self.above(reg_lo)?;
            }
        }
    }

    // ─────── Event handlers ────────────────────────────────────────────────

    /// The event has left-going edges but no right-going ones. Add a
    /// temporary edge so the region below it keeps an upper edge.
    fn connect_right_vertex(&mut self, reg_up: RegionId, e_bottom_left: EdgeId) -> Result<()> {
        let mut reg_up = reg_up;
        let mut e_bottom_left = e_bottom_left;
        let mut e_top_left = self.mesh.onext(e_bottom_left);
        let reg_lo = self.below(reg_up)?;
        let e_up = self.e_up(reg_up);
        let e_lo = self.e_up(reg_lo);
        let mut degenerate = false;

        if self.mesh.dst(e_up) != self.mesh.dst(e_lo) {
            self.check_for_intersect(reg_up)?;
        }

        // The upper or lower edge may now pass through the event.
        let ev = self.event_position();
        if vert_eq(self.mesh.org_position(e_up), ev) {
            let oprev = self.mesh.oprev(e_top_left);
            self.mesh.splice(oprev, e_up);
            reg_up = self.top_left_region(reg_up)?;
            let below = self.below(reg_up)?;
            e_top_left = self.e_up(below);
            self.finish_left_regions(below, Some(reg_lo))?;
            degenerate = true;
        }
        if vert_eq(self.mesh.org_position(e_lo), ev) {
            let oprev = self.mesh.oprev(e_lo);
            self.mesh.splice(e_bottom_left, oprev);
            e_bottom_left = self.finish_left_regions(reg_lo, None)?;
            degenerate = true;
        }
        if degenerate {
            let first = self.mesh.onext(e_bottom_left);
            return self.add_right_edges(reg_up, first, e_top_left, Some(e_top_left), true);
        }

        // Connect to the closer of the two origins.
        let target = if vert_leq(self.mesh.org_position(e_lo), self.mesh.org_position(e_up)) {
            self.mesh.oprev(e_lo)
        } else {
            e_up
        };
        let from = self.mesh.lprev(e_bottom_left);
        let e_new = self.mesh.connect_loops(from, target);

        // No cleanup yet, or e_new could vanish before it is marked.
        let onext = self.mesh.onext(e_new);
        self.add_right_edges(reg_up, e_new, onext, Some(onext), false)?;
        let reg = self
            .active_region(e_new.sym())
            .ok_or_else(|| inconsistent("temporary edge has no region"))?;
        self.regions[reg].fix_upper_edge = true;
        self.walk_dirty_regions(reg_up)
    }

    /// The event lies exactly on the upper edge of `reg_up`.
    fn connect_left_degenerate(&mut self, reg_up: RegionId, v_event: VertexId) -> Result<()> {
        let e = self.e_up(reg_up);
        let ev = self.mesh.position(v_event);

        if vert_eq(self.mesh.org_position(e), ev) {
            // Unprocessed vertex at the same place: merge and wait for it.
            let an = self.mesh.an_edge(v_event)?;
            self.mesh.splice(e, an);
            return Ok(());
        }

        if !vert_eq(self.mesh.dst_position(e), ev) {
            // Splice the event into the edge passing through it.
            self.split_edge(e.sym());
            if self.regions[reg_up].fix_upper_edge {
                let unused = self.mesh.onext(e);
                self.delete_edge(unused);
                self.regions[reg_up].fix_upper_edge = false;
            }
            let an = self.mesh.an_edge(v_event)?;
            self.mesh.splice(an, e);
            return self.sweep_event(v_event);
        }

        // The event coincides with the already processed destination of e.
        let reg_up = self.top_right_region(reg_up)?;
        let reg = self.below(reg_up)?;
        let mut e_top_right = self.e_up(reg).sym();
        let e_last = self.mesh.onext(e_top_right);
        let mut e_top_left = Some(e_last);
        if self.regions[reg].fix_upper_edge {
            // Only a temporary edge went right; real ones replace it.
            debug_assert!(e_last != e_top_right);
            self.delete_region(reg);
            self.delete_edge(e_top_right);
            e_top_right = self.mesh.oprev(e_last);
        }
        let an = self.mesh.an_edge(v_event)?;
        self.mesh.splice(an, e_top_right);
        if !self.mesh.edge_goes_left(e_last) {
            e_top_left = None;
        }
        let first = self.mesh.onext(e_top_right);
        self.add_right_edges(reg_up, first, e_last, e_top_left, true)
    }

    /// The event has only right-going edges.
    fn connect_left_vertex(&mut self, v_event: VertexId) -> Result<()> {
        let an = self.mesh.an_edge(v_event)?;

        // Locate the region containing the event.
        let key = self.regions.alloc(ActiveRegion::new(an.sym()));
        let found = {
            let mesh = &*self.mesh;
            let regions = &self.regions;
            let event = self.event;
            self.dict.find_next_by(&key, &|a: &RegionId, b: &RegionId| {
                if edge_leq(mesh, event, regions[*a].e_up, regions[*b].e_up) {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            })
        };
        self.regions.free(key);
        let node = found.ok_or_else(|| inconsistent("event lies above every region"))?;
        let reg_up = *self.dict.key(node);

        let reg_lo = self
            .region_below(reg_up)
            .ok_or_else(|| inconsistent("no region below event"))?;
        let e_up = self.e_up(reg_up);
        let e_lo = self.e_up(reg_lo);
        let ev = self.mesh.position(v_event);

        if edge_sign(self.mesh.dst_position(e_up), ev, self.mesh.org_position(e_up)) == 0.0 {
            return self.connect_left_degenerate(reg_up, v_event);
        }

        // Connect to the rightmost processed vertex of either chain.
        let reg = if vert_leq(self.mesh.dst_position(e_lo), self.mesh.dst_position(e_up)) {
            reg_up
        } else {
            reg_lo
        };

        if self.regions[reg_up].inside || self.regions[reg].fix_upper_edge {
            let e_new = if reg == reg_up {
                let to = self.mesh.lnext(e_up);
                self.mesh.connect_loops(an.sym(), to)
            } else {
                let from = self.mesh.dnext(e_lo);
                self.mesh.connect_loops(from, an).sym()
            };
            if self.regions[reg].fix_upper_edge {
                self.fix_upper_edge(reg, e_new);
            } else {
                let reg_new = self.add_region_below(reg_up, e_new);
                self.compute_winding(reg_new)?;
            }
            self.sweep_event(v_event)
        } else {
            // Outside: no connection needed.
            self.add_right_edges(reg_up, an, an, None, true)
        }
    }

    fn sweep_event(&mut self, v_event: VertexId) -> Result<()> {
        self.event = v_event;
        let p = self.event_position();
        log::trace!("event {:?} at ({}, {})", v_event, p.x, p.y);

        // Find an edge of the event already in the dictionary.
        let start = self.mesh.an_edge(v_event)?;
        let mut e = start;
        let region = loop {
            if let Some(reg) = self.active_region(e) {
                if self.regions.contains(reg) {
                    break reg;
                }
            }
            e = self.mesh.onext(e);
            if e == start {
                return self.connect_left_vertex(v_event);
            }
        };

        // Close the regions between the left-going edges.
        let reg_up = self.top_left_region(region)?;
        let reg = self.below(reg_up)?;
        let e_top_left = self.e_up(reg);
        let e_bottom_left = self.finish_left_regions(reg, None)?;

        // Then add the right-going edges.
        if self.mesh.onext(e_bottom_left) == e_top_left {
            self.connect_right_vertex(reg_up, e_bottom_left)
        } else {
            let first = self.mesh.onext(e_bottom_left);
            self.add_right_edges(reg_up, first, e_top_left, Some(e_top_left), true)
        }
    }

    /// Drop the remaining regions: the two sentinels and at most one
    /// temporary edge.
    fn done_edge_dict(&mut self) {
        let mut fixed_edges = 0;
        while let Some(node) = self.dict.min() {
            let reg = *self.dict.key(node);
            if !self.regions[reg].sentinel {
                debug_assert!(self.regions[reg].fix_upper_edge);
                fixed_edges += 1;
            }
            debug_assert_eq!(self.regions[reg].winding_number, 0);
            self.delete_region(reg);
        }
        debug_assert!(fixed_edges <= 1);
    }
}
