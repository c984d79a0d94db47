// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Quad-edge planar subdivision.
//
// Every undirected edge is one `QuadEdge` record holding four directed
// edges: slots 0 and 2 are the primal edge and its reverse, slots 1 and 3
// the dual edge and its reverse. An `EdgeId` is a quad handle plus a slot,
// so Rot/Sym/InvRot are slot arithmetic and every other navigation step is
// one `onext` lookup away.
//
// Primal slots carry their origin vertex; dual slots carry the face they
// originate from, so `lface(e)` is the face stored on `inv_rot(e)`.
//
// Design:
//   - `splice_rings` is the Guibas/Stolfi primitive. It touches only the
//     `onext` rings and leaves vertex and face records to the caller.
//   - `make_edge`, `splice`, `delete_edge`, `add_edge_vertex`, `split_edge`
//     and `connect` keep vertex and face records up to date; the sweep uses
//     these.
//   - `add_sub_manifold`, `make_vertex_edge`, `kill_vertex_edge`,
//     `make_face_edge` and `kill_face_edge` are the Euler operators.
//   - Every public operation leaves V - E + F == 2 per connected component.

mod builder;
mod delaunay;
mod monotone;

pub use builder::FaceListBuilder;

use crate::arena::{Arena, Id};
use crate::error::{Result, TessError};
use crate::geom::{point, vert_leq, Point};
use std::fmt;

pub type VertexId = Id<Vertex>;
pub type FaceId = Id<Face>;
pub type QuadEdgeId = Id<QuadEdge>;

/// One of the four directed edges of a [`QuadEdge`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId {
    quad: QuadEdgeId,
    slot: u8,
}

impl EdgeId {
    #[inline]
    pub fn quad(self) -> QuadEdgeId {
        self.quad
    }

    #[inline]
    pub fn slot(self) -> u8 {
        self.slot
    }

    /// Dual edge, rotated 90 degrees counter-clockwise.
    #[inline]
    pub fn rot(self) -> EdgeId {
        EdgeId {
            quad: self.quad,
            slot: (self.slot + 1) & 3,
        }
    }

    #[inline]
    pub fn inv_rot(self) -> EdgeId {
        EdgeId {
            quad: self.quad,
            slot: (self.slot + 3) & 3,
        }
    }

    /// Same edge, opposite direction.
    #[inline]
    pub fn sym(self) -> EdgeId {
        EdgeId {
            quad: self.quad,
            slot: (self.slot + 2) & 3,
        }
    }

    /// True for slots 0 and 2, which join vertices.
    #[inline]
    pub fn is_primal(self) -> bool {
        self.slot & 1 == 0
    }
}

#[derive(Clone, Debug)]
pub struct DirectedEdge {
    /// Next edge counter-clockwise around the origin.
    onext: EdgeId,
    /// Origin vertex (primal slots).
    vertex: Option<VertexId>,
    /// Origin face (dual slots).
    face: Option<FaceId>,
    pub data: usize,
}

#[derive(Clone, Debug)]
pub struct QuadEdge {
    edges: [DirectedEdge; 4],
}

impl QuadEdge {
    /// An isolated edge: both primal slots are alone in their origin rings
    /// and the dual slots form the single face ring around it.
    fn isolated(quad: QuadEdgeId) -> Self {
        let edge = |onext: u8| DirectedEdge {
            onext: EdgeId { quad, slot: onext },
            vertex: None,
            face: None,
            data: 0,
        };
        QuadEdge {
            edges: [edge(0), edge(3), edge(2), edge(1)],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Vertex {
    pub position: Point,
    an_edge: Option<EdgeId>,
    pub data: usize,
    /// Index of the input point this vertex came from.
    pub(crate) source: Option<u32>,
}

impl Vertex {
    fn new(position: Point, an_edge: Option<EdgeId>) -> Self {
        Vertex {
            position,
            an_edge,
            data: 0,
            source: None,
        }
    }

    /// Representative outgoing edge, `None` for an isolated vertex.
    #[inline]
    pub fn edge(&self) -> Option<EdgeId> {
        self.an_edge
    }

    /// Index of the input point this vertex came from, `None` for vertices
    /// created by the sweep where edges cross.
    #[inline]
    pub fn source(&self) -> Option<u32> {
        self.source
    }
}

#[derive(Clone, Debug, Default)]
pub struct Face {
    an_edge: Option<EdgeId>,
    pub data: usize,
    /// Set by the sweep for faces inside the filled area.
    pub inside: bool,
}

impl Face {
    /// Representative edge with this face on its left.
    #[inline]
    pub fn edge(&self) -> Option<EdgeId> {
        self.an_edge
    }
}

/// A planar subdivision owning all of its vertices, faces and edges.
#[derive(Default)]
pub struct Mesh {
    vertices: Arena<Vertex>,
    faces: Arena<Face>,
    quads: Arena<QuadEdge>,
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mesh")
            .field("vertices", &self.vertices.len())
            .field("edges", &self.quads.len())
            .field("faces", &self.faces.len())
            .finish()
    }
}

impl Mesh {
    pub fn new() -> Self {
        Mesh {
            vertices: Arena::new(),
            faces: Arena::new(),
            quads: Arena::new(),
        }
    }

    /// Drop every record. All outstanding handles become stale.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
        self.quads.clear();
    }

    /// Reserve room for the given number of additional records.
    pub fn try_reserve(&mut self, vertices: usize, edges: usize, faces: usize) -> Result<()> {
        self.vertices.try_reserve(vertices)?;
        self.quads.try_reserve(edges)?;
        self.faces.try_reserve(faces)?;
        Ok(())
    }

    // ─────────────────────────────── Counts & iteration ─────────────────────

    #[inline]
    pub fn vertices_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn faces_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of undirected edges.
    #[inline]
    pub fn edges_count(&self) -> usize {
        self.quads.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.ids()
    }

    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.ids()
    }

    /// One primal directed edge per undirected edge.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.quads.ids().map(|quad| EdgeId { quad, slot: 0 })
    }

    #[inline]
    pub fn vertex(&self, v: VertexId) -> &Vertex {
        &self.vertices[v]
    }

    #[inline]
    pub fn vertex_mut(&mut self, v: VertexId) -> &mut Vertex {
        &mut self.vertices[v]
    }

    #[inline]
    pub fn face(&self, f: FaceId) -> &Face {
        &self.faces[f]
    }

    #[inline]
    pub fn face_mut(&mut self, f: FaceId) -> &mut Face {
        &mut self.faces[f]
    }

    /// Representative outgoing edge of `v`, required by the sweep.
    #[inline]
    pub(crate) fn an_edge(&self, v: VertexId) -> Result<EdgeId> {
        self.vertices[v]
            .an_edge
            .ok_or(TessError::InternalInconsistency("vertex without edges"))
    }

    #[inline]
    pub(crate) fn set_face_edge(&mut self, f: FaceId, e: EdgeId) {
        self.faces[f].an_edge = Some(e);
    }

    #[inline]
    pub fn contains_vertex(&self, v: VertexId) -> bool {
        self.vertices.contains(v)
    }

    #[inline]
    pub fn contains_face(&self, f: FaceId) -> bool {
        self.faces.contains(f)
    }

    #[inline]
    pub fn contains_edge(&self, e: EdgeId) -> bool {
        self.quads.contains(e.quad)
    }

    #[inline]
    pub fn position(&self, v: VertexId) -> Point {
        self.vertices[v].position
    }

    #[inline]
    pub fn edge_data(&self, e: EdgeId) -> usize {
        self.slot(e).data
    }

    #[inline]
    pub fn set_edge_data(&mut self, e: EdgeId, data: usize) {
        self.slot_mut(e).data = data;
    }

    /// Edges leaving the origin of `e`, counter-clockwise, starting at `e`.
    pub fn org_ring(&self, e: EdgeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.cycle(e, |mesh, x| mesh.onext(x))
    }

    /// Edges bounding the left face of `e`, counter-clockwise, starting at `e`.
    pub fn face_loop(&self, e: EdgeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.cycle(e, |mesh, x| mesh.lnext(x))
    }

    fn cycle<'a>(
        &'a self,
        start: EdgeId,
        step: impl Fn(&Mesh, EdgeId) -> EdgeId + 'a,
    ) -> impl Iterator<Item = EdgeId> + 'a {
        let mut next = Some(start);
        std::iter::from_fn(move || {
            let current = next?;
            let following = step(self, current);
            next = (following != start).then_some(following);
            Some(current)
        })
    }

    /// Vertices around face `f`, in counter-clockwise order.
    pub fn face_vertices(&self, f: FaceId) -> Vec<VertexId> {
        match self.faces[f].an_edge {
            Some(e) => self.face_loop(e).map(|x| self.org(x)).collect(),
            None => Vec::new(),
        }
    }

    /// Every face bounded by exactly three edges.
    pub fn triangles(&self) -> Vec<[VertexId; 3]> {
        let mut out = Vec::new();
        for (_, face) in self.faces.iter() {
            let Some(e) = face.an_edge else {
                continue;
            };
            let e1 = self.lnext(e);
            let e2 = self.lnext(e1);
            if self.lnext(e2) == e {
                out.push([self.org(e), self.org(e1), self.org(e2)]);
            }
        }
        out
    }

    // ───────────────────────────────── Navigation ───────────────────────────

    #[inline]
    fn slot(&self, e: EdgeId) -> &DirectedEdge {
        &self.quads[e.quad].edges[e.slot as usize]
    }

    #[inline]
    fn slot_mut(&mut self, e: EdgeId) -> &mut DirectedEdge {
        &mut self.quads[e.quad].edges[e.slot as usize]
    }

    /// Next edge counter-clockwise around the origin.
    #[inline]
    pub fn onext(&self, e: EdgeId) -> EdgeId {
        self.slot(e).onext
    }

    #[inline]
    fn set_onext(&mut self, e: EdgeId, next: EdgeId) {
        self.slot_mut(e).onext = next;
    }

    /// Next edge clockwise around the origin.
    #[inline]
    pub fn oprev(&self, e: EdgeId) -> EdgeId {
        self.onext(e.rot()).rot()
    }

    /// Next edge counter-clockwise around the left face.
    #[inline]
    pub fn lnext(&self, e: EdgeId) -> EdgeId {
        self.onext(e.inv_rot()).rot()
    }

    #[inline]
    pub fn lprev(&self, e: EdgeId) -> EdgeId {
        self.onext(e).sym()
    }

    /// Next edge counter-clockwise around the right face.
    #[inline]
    pub fn rnext(&self, e: EdgeId) -> EdgeId {
        self.onext(e.rot()).inv_rot()
    }

    #[inline]
    pub fn rprev(&self, e: EdgeId) -> EdgeId {
        self.onext(e.sym())
    }

    /// Next edge counter-clockwise around the destination.
    #[inline]
    pub fn dnext(&self, e: EdgeId) -> EdgeId {
        self.onext(e.sym()).sym()
    }

    #[inline]
    pub fn dprev(&self, e: EdgeId) -> EdgeId {
        self.onext(e.inv_rot()).inv_rot()
    }

    #[inline]
    pub fn org(&self, e: EdgeId) -> VertexId {
        match self.slot(e).vertex {
            Some(v) => v,
            None => panic!("edge {:?} has no origin vertex", e),
        }
    }

    #[inline]
    pub fn dst(&self, e: EdgeId) -> VertexId {
        self.org(e.sym())
    }

    #[inline]
    pub fn lface(&self, e: EdgeId) -> FaceId {
        match self.slot(e.inv_rot()).face {
            Some(f) => f,
            None => panic!("edge {:?} has no left face", e),
        }
    }

    #[inline]
    pub fn rface(&self, e: EdgeId) -> FaceId {
        self.lface(e.sym())
    }

    #[inline]
    fn set_org(&mut self, e: EdgeId, v: Option<VertexId>) {
        self.slot_mut(e).vertex = v;
    }

    #[inline]
    fn set_lface(&mut self, e: EdgeId, f: Option<FaceId>) {
        self.slot_mut(e.inv_rot()).face = f;
    }

    #[inline]
    pub fn org_position(&self, e: EdgeId) -> Point {
        self.vertices[self.org(e)].position
    }

    #[inline]
    pub fn dst_position(&self, e: EdgeId) -> Point {
        self.vertices[self.dst(e)].position
    }

    /// True if the edge points towards decreasing sweep order.
    #[inline]
    pub fn edge_goes_left(&self, e: EdgeId) -> bool {
        vert_leq(self.dst_position(e), self.org_position(e))
    }

    #[inline]
    pub fn edge_goes_right(&self, e: EdgeId) -> bool {
        vert_leq(self.org_position(e), self.dst_position(e))
    }

    // ─────────────────────────────── The primitive ──────────────────────────

    /// Guibas/Stolfi splice: exchanges the origin rings of `a` and `b`, and
    /// independently the rings of their left faces. Joins two rings into one
    /// or splits one ring into two.
    ///
    /// Only the rings change. Vertex and face records are left as they were;
    /// callers are responsible for repairing them.
    pub fn splice_rings(&mut self, a: EdgeId, b: EdgeId) {
        let alpha = self.onext(a).rot();
        let beta = self.onext(b).rot();

        let a_next = self.onext(a);
        let b_next = self.onext(b);
        let alpha_next = self.onext(alpha);
        let beta_next = self.onext(beta);

        self.set_onext(a, b_next);
        self.set_onext(b, a_next);
        self.set_onext(alpha, beta_next);
        self.set_onext(beta, alpha_next);
    }

    fn alloc_quad(&mut self) -> EdgeId {
        let quad = self.quads.alloc_with(QuadEdge::isolated);
        EdgeId { quad, slot: 0 }
    }

    /// Set the origin of every edge in the ring of `e` to `v`.
    fn set_ring_org(&mut self, e: EdgeId, v: Option<VertexId>) {
        let mut x = e;
        loop {
            self.set_org(x, v);
            x = self.onext(x);
            if x == e {
                break;
            }
        }
    }

    /// Set the left face of every edge in the loop of `e` to `f`.
    fn set_loop_face(&mut self, e: EdgeId, f: Option<FaceId>) {
        let mut x = e;
        loop {
            self.set_lface(x, f);
            x = self.lnext(x);
            if x == e {
                break;
            }
        }
    }

    /// New vertex record owning the origin ring of `e`.
    fn new_vertex_on_ring(&mut self, e: EdgeId, position: Point) -> VertexId {
        let v = self.vertices.alloc(Vertex::new(position, Some(e)));
        self.set_ring_org(e, Some(v));
        v
    }

    /// New face record owning the left loop of `e`; `inside` is copied from `like`.
    fn new_face_on_loop(&mut self, e: EdgeId, like: Option<FaceId>) -> FaceId {
        let inside = like.map_or(false, |f| self.faces[f].inside);
        let f = self.faces.alloc(Face {
            an_edge: Some(e),
            data: 0,
            inside,
        });
        self.set_loop_face(e, Some(f));
        f
    }

    /// Free `v`, handing its ring over to `new_org`.
    fn kill_vertex_record(&mut self, v: VertexId, new_org: Option<VertexId>) {
        if let Some(e) = self.vertices[v].an_edge {
            self.set_ring_org(e, new_org);
        }
        self.vertices.free(v);
    }

    /// Free `f`, handing its loop over to `new_face`.
    fn kill_face_record(&mut self, f: FaceId, new_face: Option<FaceId>) {
        if let Some(e) = self.faces[f].an_edge {
            self.set_loop_face(e, new_face);
        }
        self.faces.free(f);
    }

    // ─────────────────────────────── Bare records ───────────────────────────

    /// A vertex with no incident edges.
    pub fn add_vertex(&mut self, position: Point) -> VertexId {
        self.vertices.alloc(Vertex::new(position, None))
    }

    /// A face with no bounding edges.
    pub fn add_face(&mut self) -> FaceId {
        self.faces.alloc(Face::default())
    }

    // ───────────────────────────── Editing operators ────────────────────────

    /// A new component made of one edge, two vertices and one face.
    pub fn make_edge(&mut self) -> EdgeId {
        let e = self.alloc_quad();
        let origin = point(0.0, 0.0);
        self.new_vertex_on_ring(e, origin);
        self.new_vertex_on_ring(e.sym(), origin);
        self.new_face_on_loop(e, None);
        e
    }

    /// Splice that keeps vertex and face records consistent.
    ///
    /// If the origins differ they are merged (the origin of `e_dst` is
    /// destroyed); otherwise the shared origin is split and `e_dst` gets a
    /// new vertex. Faces behave the same way.
    pub fn splice(&mut self, e_org: EdgeId, e_dst: EdgeId) {
        if e_org == e_dst {
            return;
        }

        let org_vertex = self.org(e_org);
        let dst_vertex = self.org(e_dst);
        let joining_vertices = dst_vertex != org_vertex;
        if joining_vertices {
            self.kill_vertex_record(dst_vertex, Some(org_vertex));
        }

        let org_face = self.lface(e_org);
        let dst_face = self.lface(e_dst);
        let joining_loops = dst_face != org_face;
        if joining_loops {
            self.kill_face_record(dst_face, Some(org_face));
        }

        self.splice_rings(e_dst, e_org);

        if !joining_vertices {
            let position = self.vertices[org_vertex].position;
            self.new_vertex_on_ring(e_dst, position);
            self.vertices[org_vertex].an_edge = Some(e_org);
        }
        if !joining_loops {
            self.new_face_on_loop(e_dst, Some(org_face));
            self.faces[org_face].an_edge = Some(e_org);
        }
    }

    /// Remove an edge. Faces on either side are merged; a vertex left with
    /// no edges is deleted, and so is the face of a component that vanishes.
    pub fn delete_edge(&mut self, e_del: EdgeId) {
        let e_del_sym = e_del.sym();

        let left = self.lface(e_del);
        let right = self.rface(e_del);
        let joining_loops = left != right;
        if joining_loops {
            self.kill_face_record(left, Some(right));
        }

        if self.onext(e_del) == e_del {
            let v = self.org(e_del);
            self.kill_vertex_record(v, None);
        } else {
            let rface = self.rface(e_del);
            self.faces[rface].an_edge = Some(self.oprev(e_del));
            let org = self.org(e_del);
            self.vertices[org].an_edge = Some(self.onext(e_del));

            let oprev = self.oprev(e_del);
            self.splice_rings(e_del, oprev);
            if !joining_loops {
                let like = self.lface(e_del);
                self.new_face_on_loop(e_del, Some(like));
            }
        }

        if self.onext(e_del_sym) == e_del_sym {
            let v = self.org(e_del_sym);
            self.kill_vertex_record(v, None);
            let f = self.lface(e_del_sym);
            self.kill_face_record(f, None);
        } else {
            let lface = self.lface(e_del);
            self.faces[lface].an_edge = Some(self.oprev(e_del_sym));
            let org = self.org(e_del_sym);
            self.vertices[org].an_edge = Some(self.onext(e_del_sym));

            let oprev = self.oprev(e_del_sym);
            self.splice_rings(e_del_sym, oprev);
        }

        self.quads.free(e_del.quad);
    }

    /// New edge `e_new` with `lnext(e_org) == e_new`, ending at a new vertex
    /// placed on the destination of `e_org`.
    pub fn add_edge_vertex(&mut self, e_org: EdgeId) -> EdgeId {
        let e_new = self.alloc_quad();
        let e_new_sym = e_new.sym();

        let lnext = self.lnext(e_org);
        self.splice_rings(e_new, lnext);

        let dst = self.dst(e_org);
        self.set_org(e_new, Some(dst));
        let position = self.vertices[dst].position;
        self.new_vertex_on_ring(e_new_sym, position);

        let f = self.lface(e_org);
        self.set_lface(e_new, Some(f));
        self.set_lface(e_new_sym, Some(f));
        e_new
    }

    /// Split `e_org` in two at a new vertex. `e_org` keeps its origin and
    /// ends at the new vertex; the returned edge runs from the new vertex
    /// to the old destination.
    pub fn split_edge(&mut self, e_org: EdgeId) -> EdgeId {
        let temp = self.add_edge_vertex(e_org);
        let e_new = temp.sym();

        let e_org_sym = e_org.sym();
        let oprev = self.oprev(e_org_sym);
        self.splice_rings(e_org_sym, oprev);
        self.splice_rings(e_org_sym, e_new);

        let mid = self.org(e_new);
        self.set_org(e_org_sym, Some(mid));
        let far = self.dst(e_new);
        self.vertices[far].an_edge = Some(e_new.sym());
        let rface = self.rface(e_org);
        self.set_lface(e_new.sym(), Some(rface));
        e_new
    }

    /// New edge from `dst(e_org)` to `org(e_dst)`.
    ///
    /// If both edges share a left face it is split in two and the new face
    /// lies on the left of the returned edge; otherwise the two loops are
    /// joined and the face of `e_dst` is destroyed.
    ///
    /// The edges must share a left face or lie in different components.
    /// Joining two faces of one component would add a handle.
    pub fn connect(&mut self, e_org: EdgeId, e_dst: EdgeId) -> EdgeId {
        debug_assert!(
            self.lface(e_org) == self.lface(e_dst)
                || !self.connected(self.dst(e_org), self.org(e_dst)),
            "connect joins two faces of one component"
        );
        self.connect_loops(e_org, e_dst)
    }

    /// `connect` without the face precondition. The sweep joins loops of
    /// one component while its face records are still provisional.
    pub(crate) fn connect_loops(&mut self, e_org: EdgeId, e_dst: EdgeId) -> EdgeId {
        let e_new = self.alloc_quad();
        let e_new_sym = e_new.sym();

        let org_face = self.lface(e_org);
        let dst_face = self.lface(e_dst);
        let joining_loops = dst_face != org_face;
        if joining_loops {
            self.kill_face_record(dst_face, Some(org_face));
        }

        let lnext = self.lnext(e_org);
        self.splice_rings(e_new, lnext);
        self.splice_rings(e_new_sym, e_dst);

        let from = self.dst(e_org);
        let to = self.org(e_dst);
        self.set_org(e_new, Some(from));
        self.set_org(e_new_sym, Some(to));
        self.set_lface(e_new, Some(org_face));
        self.set_lface(e_new_sym, Some(org_face));

        self.faces[org_face].an_edge = Some(e_new_sym);
        if !joining_loops {
            self.new_face_on_loop(e_new, Some(org_face));
        }
        e_new
    }

    // ───────────────────────────── Euler operators ──────────────────────────

    /// New minimal component: one vertex, one self-loop edge, two faces.
    pub fn add_sub_manifold(&mut self) -> EdgeId {
        let e = self.make_edge();
        self.splice(e, e.sym());
        e
    }

    /// The edge leaving `vertex` with `face` on its left.
    ///
    /// Panics if `vertex` does not touch `face`.
    pub fn oriented_edge(&self, vertex: VertexId, face: FaceId) -> EdgeId {
        let start = match self.vertices[vertex].an_edge {
            Some(e) => e,
            None => panic!("vertex {:?} has no edges", vertex),
        };
        match self.org_ring(start).find(|&e| self.lface(e) == face) {
            Some(e) => e,
            None => panic!("vertex {:?} is not on face {:?}", vertex, face),
        }
    }

    /// Split `vertex` in two, joined by a new edge from `vertex` to the new
    /// vertex with `left` on its left and `right` on its right. The edges
    /// leaving `vertex` between `right` and `left` (counter-clockwise) move
    /// to the new vertex.
    pub fn make_vertex_edge(&mut self, vertex: VertexId, left: FaceId, right: FaceId) -> EdgeId {
        let a = self.oriented_edge(vertex, left);
        let b = self.oriented_edge(vertex, right);
        let e = self.alloc_quad();

        if a != b {
            self.splice_rings(a, b);
            self.splice_rings(b, e);
            self.splice_rings(a, e.sym());
        } else {
            self.splice_rings(b, e);
        }

        let position = self.vertices[vertex].position;
        self.set_ring_org(e, Some(vertex));
        self.vertices[vertex].an_edge = Some(e);
        self.new_vertex_on_ring(e.sym(), position);

        self.set_loop_face(e, Some(left));
        self.faces[left].an_edge = Some(e);
        self.set_loop_face(e.sym(), Some(right));
        self.faces[right].an_edge = Some(e.sym());
        e
    }

    /// Contract `e`, merging its destination into its origin.
    ///
    /// Panics if `e` is a loop or an isolated edge.
    pub fn kill_vertex_edge(&mut self, e: EdgeId) {
        let v = self.org(e);
        let w = self.dst(e);
        assert!(v != w, "cannot contract a self-loop");
        let e_sym = e.sym();
        let left = self.lface(e);
        let right = self.rface(e);
        let a = self.oprev(e_sym);
        let b = self.oprev(e);
        assert!(!(a == e_sym && b == e), "cannot contract an isolated edge");

        if a != e_sym {
            self.splice_rings(a, e_sym);
        }
        if b != e {
            self.splice_rings(b, e);
        }
        if a != e_sym && b != e {
            self.splice_rings(a, b);
        }
        self.quads.free(e.quad);

        let keep = if a != e_sym { a } else { b };
        self.set_ring_org(keep, Some(v));
        self.vertices[v].an_edge = Some(keep);
        self.vertices.free(w);

        if a != e_sym {
            self.set_loop_face(a, Some(left));
            self.faces[left].an_edge = Some(a);
        }
        if b != e {
            self.set_loop_face(b, Some(right));
            self.faces[right].an_edge = Some(b);
        }
    }

    /// Split `face` with a new edge from `org` to `dest`, both of which must
    /// lie on its boundary. The new face is on the left of the result.
    pub fn make_face_edge(&mut self, face: FaceId, org: VertexId, dest: VertexId) -> EdgeId {
        let a = self.oriented_edge(org, face);
        let b = self.oriented_edge(dest, face);
        let a_prev = self.lprev(a);
        self.connect(a_prev, b)
    }

    /// Remove `e`, merging its left face into its right face.
    ///
    /// Panics if the same face lies on both sides.
    pub fn kill_face_edge(&mut self, e: EdgeId) {
        assert!(
            self.lface(e) != self.rface(e),
            "edge does not separate two faces"
        );
        self.delete_edge(e);
    }

    // ──────────────────────────────── Validation ────────────────────────────

    /// V - E + F over the whole mesh.
    pub fn euler_characteristic(&self) -> i64 {
        self.vertices.len() as i64 - self.quads.len() as i64 + self.faces.len() as i64
    }

    /// True if an edge path joins `a` and `b`.
    pub fn connected(&self, a: VertexId, b: VertexId) -> bool {
        if a == b {
            return true;
        }
        let mut seen = std::collections::HashSet::from([a]);
        let mut stack = vec![a];
        while let Some(v) = stack.pop() {
            let Some(start) = self.vertices[v].an_edge else {
                continue;
            };
            for e in self.org_ring(start) {
                let w = self.dst(e);
                if w == b {
                    return true;
                }
                if seen.insert(w) {
                    stack.push(w);
                }
            }
        }
        false
    }

    /// Number of connected components, counting isolated vertices.
    pub fn components(&self) -> usize {
        let mut parent: std::collections::HashMap<VertexId, VertexId> =
            self.vertices.ids().map(|v| (v, v)).collect();

        fn find(parent: &mut std::collections::HashMap<VertexId, VertexId>, v: VertexId) -> VertexId {
            let mut root = v;
            while parent[&root] != root {
                root = parent[&root];
            }
            let mut x = v;
            while parent[&x] != root {
                let next = parent[&x];
                parent.insert(x, root);
                x = next;
            }
            root
        }

        for e in self.edges() {
            let a = find(&mut parent, self.org(e));
            let b = find(&mut parent, self.dst(e));
            if a != b {
                parent.insert(a, b);
            }
        }
        let ids: Vec<VertexId> = self.vertices.ids().collect();
        let mut roots: Vec<VertexId> = ids.into_iter().map(|v| find(&mut parent, v)).collect();
        roots.sort();
        roots.dedup();
        roots.len()
    }

    /// Full structural check: ring closure, record agreement and
    /// representative edges.
    pub fn check(&self) -> Result<()> {
        fn fail(msg: &'static str) -> Result<()> {
            Err(TessError::InternalInconsistency(msg))
        }

        for quad in self.quads.ids() {
            for slot in 0..4u8 {
                let e = EdgeId { quad, slot };
                let next = self.onext(e);
                if !self.quads.contains(next.quad) {
                    return fail("onext points at a freed edge");
                }
                if next.is_primal() != e.is_primal() {
                    return fail("onext mixes primal and dual edges");
                }
                if self.onext(self.oprev(e)) != e {
                    return fail("onext and oprev disagree");
                }
                if e.is_primal() {
                    let Some(v) = self.slot(e).vertex else {
                        return fail("primal edge without origin");
                    };
                    if !self.vertices.contains(v) {
                        return fail("edge origin is a freed vertex");
                    }
                    if self.slot(next).vertex != Some(v) {
                        return fail("origin ring with mixed vertices");
                    }
                    let Some(f) = self.slot(e.inv_rot()).face else {
                        return fail("edge without left face");
                    };
                    if !self.faces.contains(f) {
                        return fail("left face is a freed face");
                    }
                    if self.slot(self.lnext(e).inv_rot()).face != Some(f) {
                        return fail("face loop with mixed faces");
                    }
                }
            }
        }

        for (v, vertex) in self.vertices.iter() {
            if let Some(e) = vertex.an_edge {
                if !self.quads.contains(e.quad) || self.slot(e).vertex != Some(v) {
                    return fail("vertex representative edge does not leave it");
                }
            }
        }
        for (f, face) in self.faces.iter() {
            if let Some(e) = face.an_edge {
                if !self.quads.contains(e.quad) || self.slot(e.inv_rot()).face != Some(f) {
                    return fail("face representative edge does not bound it");
                }
            }
        }
        Ok(())
    }
}
