// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Triangulation of x-monotone faces.

use super::{FaceId, Mesh};
use crate::geom::{edge_sign, vert_leq};

impl Mesh {
    /// Triangulate a face that is monotone in the sweep direction.
    ///
    /// The face must be a counter-clockwise simple polygon with at least
    /// three edges. The upper and lower chains are walked leftwards from the
    /// rightmost vertex, cutting off convex corners of whichever chain is
    /// further right. The remaining fan is closed from the leftmost vertex.
    pub fn tessellate_mono_region(&mut self, face: FaceId) {
        let mut up = match self.face(face).edge() {
            Some(e) => e,
            None => panic!("face {:?} has no edges", face),
        };
        assert!(
            self.lnext(up) != up && self.lnext(self.lnext(up)) != up,
            "face must have at least 3 edges"
        );

        // Find the edge whose origin is the rightmost vertex.
        while vert_leq(self.dst_position(up), self.org_position(up)) {
            up = self.lprev(up);
        }
        while vert_leq(self.org_position(up), self.dst_position(up)) {
            up = self.lnext(up);
        }
        let mut lo = self.lprev(up);

        while self.lnext(up) != lo {
            if vert_leq(self.dst_position(up), self.org_position(lo)) {
                // up's destination is on the left: cut triangles off lo's origin.
                while self.lnext(lo) != up {
                    let lo_lnext = self.lnext(lo);
                    let convex = edge_sign(
                        self.org_position(lo),
                        self.dst_position(lo),
                        self.dst_position(lo_lnext),
                    ) <= 0.0;
                    if !self.edge_goes_left(lo_lnext) && !convex {
                        break;
                    }
                    lo = self.connect(lo_lnext, lo).sym();
                }
                lo = self.lprev(lo);
            } else {
                // lo's origin is on the left: cut triangles off up's destination.
                while self.lnext(lo) != up {
                    let up_lprev = self.lprev(up);
                    let convex = edge_sign(
                        self.dst_position(up),
                        self.org_position(up),
                        self.org_position(up_lprev),
                    ) >= 0.0;
                    if !self.edge_goes_right(up_lprev) && !convex {
                        break;
                    }
                    up = self.connect(up, up_lprev).sym();
                }
                up = self.lnext(up);
            }
        }

        // Close the remaining fan.
        assert!(self.lnext(lo) != up);
        while self.lnext(self.lnext(lo)) != up {
            let lo_lnext = self.lnext(lo);
            lo = self.connect(lo_lnext, lo).sym();
        }
    }

    /// Triangulate every face marked inside.
    pub fn tessellate_interior(&mut self) {
        let inside: Vec<FaceId> = self.faces().filter(|&f| self.face(f).inside).collect();
        for f in inside {
            if self.contains_face(f) {
                self.tessellate_mono_region(f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{point, polygon_signed_area, Point};

    /// A single counter-clockwise polygon; returns its inner face.
    fn polygon(mesh: &mut Mesh, pts: &[Point]) -> FaceId {
        let mut e = mesh.make_edge();
        mesh.splice(e, e.sym());
        let first = e;
        for (i, &p) in pts.iter().enumerate() {
            if i > 0 {
                mesh.split_edge(e);
                e = mesh.lnext(e);
            }
            let v = mesh.org(e);
            mesh.vertex_mut(v).position = p;
        }
        let f = mesh.lface(first);
        mesh.face_mut(f).inside = true;
        f
    }

    /// Total area of the inside faces, checking each is a triangle.
    fn triangle_area(mesh: &Mesh) -> f64 {
        mesh.faces()
            .filter(|&f| mesh.face(f).inside)
            .map(|f| {
                let pts: Vec<Point> = mesh
                    .face_vertices(f)
                    .into_iter()
                    .map(|v| mesh.position(v))
                    .collect();
                assert_eq!(pts.len(), 3);
                polygon_signed_area(&pts)
            })
            .sum()
    }

    #[test]
    fn square_becomes_two_triangles() {
        let mut mesh = Mesh::new();
        let pts = [
            point(0.0, 0.0),
            point(4.0, 0.0),
            point(4.0, 4.0),
            point(0.0, 4.0),
        ];
        polygon(&mut mesh, &pts);
        mesh.tessellate_interior();
        mesh.check().unwrap();
        let inside = mesh.faces().filter(|&f| mesh.face(f).inside).count();
        assert_eq!(inside, 2);
        assert!((triangle_area(&mesh) - 16.0).abs() < 1e-12);
    }

    #[test]
    fn monotone_chain_with_reflex_vertices() {
        let mut mesh = Mesh::new();
        // Monotone in x with reflex corners on both chains.
        let pts = [
            point(0.0, 0.0),
            point(2.0, -1.0),
            point(4.0, 0.5),
            point(6.0, -1.0),
            point(8.0, 0.0),
            point(6.0, 2.0),
            point(4.0, 1.0),
            point(2.0, 2.0),
        ];
        let area = polygon_signed_area(&pts);
        polygon(&mut mesh, &pts);
        mesh.tessellate_interior();
        mesh.check().unwrap();
        let inside = mesh.faces().filter(|&f| mesh.face(f).inside).count();
        assert_eq!(inside, pts.len() - 2);
        assert!((triangle_area(&mesh) - area).abs() < 1e-9);
    }

    #[test]
    fn triangle_is_left_alone() {
        let mut mesh = Mesh::new();
        polygon(
            &mut mesh,
            &[point(0.0, 0.0), point(1.0, 0.0), point(0.0, 1.0)],
        );
        let edges = mesh.edges_count();
        mesh.tessellate_interior();
        assert_eq!(mesh.edges_count(), edges);
    }
}
