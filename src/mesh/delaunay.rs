// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Delaunay triangulation of a point cloud, built incrementally.
//
// Sites are inserted in a shuffled order into a triangulation of a large
// enclosing quadrilateral. Each site is located by a walk over the
// triangles, joined to the corners of its triangle, and the edges facing
// it are flipped until every triangle around it has an empty circumcircle.
// The quadrilateral's corners are removed at the end. That can take hull
// edges with them, so the pockets left along the boundary are filled by
// ear clipping and a final round of flips restores the Delaunay property.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{EdgeId, FaceId, Mesh, VertexId};
use crate::error::{Result, TessError};
use crate::geom::{is_in_circle, polygon_signed_area, twice_signed_area, BoundingBox, Point, Real};

const SHUFFLE_SEED: u64 = 0x7e55_2d1a_u64;

/// True if `p` lies strictly to the right of `e`.
#[inline]
fn right_of(mesh: &Mesh, p: Point, e: EdgeId) -> bool {
    twice_signed_area(p, mesh.dst_position(e), mesh.org_position(e)) > 0.0
}

impl Mesh {
    /// Delaunay triangulation of `points`.
    ///
    /// Points closer than `epsilon` to an already inserted point are
    /// skipped. Every vertex keeps the index of its input point as its
    /// source. Triangles are the faces marked inside; the convex hull
    /// boundary is the one face left outside. Points that end up on no
    /// edge (a lone point) are not kept.
    pub fn build_from_points_cloud(points: &[Point], epsilon: Real) -> Result<Mesh> {
        if !(epsilon >= 0.0 && epsilon.is_finite()) {
            return Err(TessError::InvalidParameter(format!(
                "epsilon must be finite and non-negative, got {}",
                epsilon
            )));
        }
        if let Some(i) = points.iter().position(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(TessError::InvalidParameter(format!(
                "point {} has a non-finite coordinate",
                i
            )));
        }

        let mut mesh = Mesh::new();
        if points.is_empty() {
            return Ok(mesh);
        }
        mesh.try_reserve(points.len() + 4, 3 * points.len() + 5, 2 * points.len() + 2)?;

        let bounds = BoundingBox::from_points(points);
        let corners = mesh.add_enclosing_quad(&bounds);
        let mut start = corners.1;

        let mut order: Vec<usize> = (0..points.len()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(SHUFFLE_SEED));

        let mut skipped = 0usize;
        for index in order {
            let p = points[index];
            let e = mesh.delaunay_locate(p, start);
            let near = |v: VertexId| (mesh.position(v) - p).length() <= epsilon;
            if near(mesh.org(e)) || near(mesh.dst(e)) || near(mesh.org(mesh.lprev(e))) {
                skipped += 1;
                continue;
            }
            start = mesh.delaunay_insert(p, index, e, epsilon);
        }

        for v in corners.0 {
            while mesh.contains_vertex(v) {
                match mesh.vertex(v).edge() {
                    Some(e) => mesh.delete_edge(e),
                    None => {
                        mesh.vertices.free(v);
                    }
                }
            }
        }

        let filled = mesh.fill_hull_pockets();
        let flips = mesh.legalize();
        if filled > 0 {
            log::trace!("delaunay: filled {} hull pockets, {} flips", filled, flips);
        }

        let faces: Vec<FaceId> = mesh.faces().collect();
        for f in faces {
            let pts: Vec<Point> = mesh
                .face_vertices(f)
                .into_iter()
                .map(|v| mesh.position(v))
                .collect();
            mesh.face_mut(f).inside = pts.len() == 3 && polygon_signed_area(&pts) > 0.0;
        }
        log::debug!(
            "delaunay: {} points, {} skipped as duplicates, {} triangles",
            points.len(),
            skipped,
            mesh.faces().filter(|&f| mesh.face(f).inside).count()
        );
        Ok(mesh)
    }

    /// Two triangles covering a square well outside `bounds`. Returns the
    /// corner vertices and an edge with a triangle on its left.
    fn add_enclosing_quad(&mut self, bounds: &BoundingBox) -> ([VertexId; 4], EdgeId) {
        let size = bounds.width().max(bounds.height()).max(1.0);
        let c = bounds.center();
        let r = 10.0 * size;
        let corner = [
            Point::new(c.x - r, c.y - r),
            Point::new(c.x + r, c.y - r),
            Point::new(c.x + r, c.y + r),
            Point::new(c.x - r, c.y + r),
        ];

        let ab = self.make_edge();
        let bc = self.add_edge_vertex(ab);
        let cd = self.add_edge_vertex(bc);
        self.connect(cd, ab);
        let ca = self.connect(bc, ab);

        let vertices = [self.org(ab), self.org(bc), self.org(cd), self.dst(cd)];
        for (v, p) in vertices.iter().zip(corner) {
            self.vertex_mut(*v).position = p;
        }
        (vertices, ca)
    }

    /// An edge of the triangle containing `p`, with the triangle on its
    /// left, or an edge with `p` at one of its ends.
    fn delaunay_locate(&self, p: Point, start: EdgeId) -> EdgeId {
        let mut e = start;
        let limit = 4 * self.edges_count() + 16;
        for _ in 0..limit {
            if self.org_position(e) == p || self.dst_position(e) == p {
                return e;
            } else if right_of(self, p, e) {
                e = e.sym();
            } else if !right_of(self, p, self.onext(e)) {
                e = self.onext(e);
            } else if !right_of(self, p, self.dprev(e)) {
                e = self.dprev(e);
            } else {
                return e;
            }
        }

        // The walk cycled on a degenerate configuration: scan the triangles.
        log::trace!("delaunay walk gave up at ({}, {}), scanning", p.x, p.y);
        for f in self.faces() {
            let Some(e) = self.face(f).edge() else {
                continue;
            };
            let e1 = self.lnext(e);
            let e2 = self.lnext(e1);
            if self.lnext(e2) != e {
                continue;
            }
            if [e, e1, e2].iter().all(|&x| !right_of(self, p, x))
                && twice_signed_area(self.org_position(e), self.org_position(e1), self.org_position(e2)) > 0.0
            {
                return e;
            }
        }
        e
    }

    /// Insert `p` into the triangle left of `e` and restore the Delaunay
    /// property around it. Returns an edge leaving the new vertex.
    fn delaunay_insert(&mut self, p: Point, index: usize, e: EdgeId, epsilon: Real) -> EdgeId {
        let mut e = e;
        let (o, d) = (self.org_position(e), self.dst_position(e));
        let length = (d - o).length();
        if twice_signed_area(o, d, p).abs() <= epsilon.max(Real::EPSILON) * length {
            // On the edge: open it up into a quadrilateral first.
            let t = self.oprev(e);
            self.delete_edge(e);
            e = t;
        }

        let prev = self.lprev(e);
        let mut base = self.add_edge_vertex(prev);
        let v = self.dst(base);
        self.vertex_mut(v).position = p;
        self.vertex_mut(v).source = Some(index as u32);
        let first = base;

        loop {
            base = self.connect(e, base.sym());
            e = self.oprev(base);
            if self.lnext(e) == first {
                break;
            }
        }

        loop {
            let t = self.oprev(e);
            let t_dst = self.dst_position(t);
            if right_of(self, t_dst, e)
                && is_in_circle(self.org_position(e), t_dst, self.dst_position(e), p)
            {
                e = self.flip_edge(e);
                e = self.oprev(e);
            } else if self.onext(e) == first {
                return first;
            } else {
                e = self.lprev(self.onext(e));
            }
        }
    }

    /// True if the left face of `e` is a counter-clockwise triangle.
    fn left_is_triangle(&self, e: EdgeId) -> bool {
        let e1 = self.lnext(e);
        let e2 = self.lnext(e1);
        self.lnext(e2) == e
            && twice_signed_area(self.org_position(e), self.org_position(e1), self.org_position(e2))
                > 0.0
    }

    /// Clip ears off the faces that are not triangles until no boundary
    /// vertex is reflex, so the triangles cover the convex hull. Returns the
    /// number of triangles added.
    fn fill_hull_pockets(&mut self) -> usize {
        let mut added = 0;
        'scan: loop {
            let outer: Vec<EdgeId> = self
                .faces()
                .filter_map(|f| self.face(f).edge())
                .filter(|&e| !self.left_is_triangle(e))
                .collect();
            for start in outer {
                let boundary: Vec<EdgeId> = self.face_loop(start).collect();
                for &e in &boundary {
                    let e1 = self.lnext(e);
                    let (a, b, c) = (self.org(e), self.dst(e), self.dst(e1));
                    if a == c {
                        continue;
                    }
                    let (pa, pb, pc) = (self.position(a), self.position(b), self.position(c));
                    if twice_signed_area(pa, pb, pc) <= 0.0 {
                        continue;
                    }
                    let blocked = boundary
                        .iter()
                        .map(|&x| self.org(x))
                        .filter(|&w| w != a && w != b && w != c)
                        .any(|w| {
                            let q = self.position(w);
                            twice_signed_area(pa, pb, q) >= 0.0
                                && twice_signed_area(pb, pc, q) >= 0.0
                                && twice_signed_area(pc, pa, q) >= 0.0
                        });
                    if blocked {
                        continue;
                    }
                    // The new triangle a, b, c lies on the left of the new edge.
                    self.connect(e1, e);
                    added += 1;
                    continue 'scan;
                }
            }
            return added;
        }
    }

    /// Flip edges between two triangles until every such edge is locally
    /// Delaunay. Returns the number of flips.
    fn legalize(&mut self) -> usize {
        let mut stack: Vec<EdgeId> = self.edges().collect();
        let limit = 8 * stack.len() * stack.len() + 64;
        let mut flips = 0;
        while let Some(e) = stack.pop() {
            if !self.contains_edge(e) || !self.left_is_triangle(e) || !self.left_is_triangle(e.sym()) {
                continue;
            }
            let (o, d) = (self.org_position(e), self.dst_position(e));
            let apex = self.dst_position(self.lnext(e));
            let other = self.dst_position(self.lnext(e.sym()));
            if !is_in_circle(o, d, apex, other)
                || twice_signed_area(o, other, apex) <= 0.0
                || twice_signed_area(d, apex, other) <= 0.0
            {
                continue;
            }
            if flips == limit {
                log::warn!("delaunay: gave up legalizing after {} flips", flips);
                break;
            }
            let n = self.flip_edge(e);
            flips += 1;
            stack.extend([
                self.lnext(n),
                self.lprev(n),
                self.lnext(n.sym()),
                self.lprev(n.sym()),
            ]);
        }
        flips
    }

    /// Replace the diagonal `e` of the quadrilateral formed by its two
    /// triangles with the other diagonal. Returns the new edge, which runs
    /// between the apexes in the same rotational sense as `e`.
    pub fn flip_edge(&mut self, e: EdgeId) -> EdgeId {
        let a = self.oprev(e);
        let b = self.oprev(e.sym());
        self.delete_edge(e);
        let b_next = self.lnext(b);
        self.connect(a, b_next)
    }
}
