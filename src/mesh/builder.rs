// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Mesh construction from an indexed face list.
//
// The builder never goes through `splice`. It collects every face corner,
// groups the corners around each vertex into arcs (runs of faces that
// share edges, in counter-clockwise order), links the arcs into origin
// rings and then writes the rings, face loops and records in one pass.
// Edges used by a single face get a boundary face on their other side.

use std::collections::HashMap;

use super::{EdgeId, FaceId, Mesh, VertexId};
use crate::error::{Result, TessError};
use crate::geom::Point;

/// One-shot builder turning `points` plus index lists into a [`Mesh`].
///
/// Every face lists the indices of its corners counter-clockwise. Faces
/// that share an edge must traverse it in opposite directions.
#[derive(Clone, Debug)]
pub struct FaceListBuilder<'a> {
    points: &'a [Point],
    faces: Vec<Vec<usize>>,
    check_manifold: bool,
}

/// Maximal counter-clockwise run of corners around one vertex.
#[derive(Copy, Clone, Debug)]
struct Arc {
    /// First outgoing edge of the run.
    first: EdgeId,
    /// Last outgoing edge of the run; its left side is a boundary when the
    /// run does not close on itself.
    last: EdgeId,
}

impl<'a> FaceListBuilder<'a> {
    pub fn new(points: &'a [Point]) -> Self {
        FaceListBuilder {
            points,
            faces: Vec::new(),
            check_manifold: false,
        }
    }

    /// Require a single connected 2-manifold (V - E + F == 2 once boundary
    /// loops are closed, and no vertex shared by separate fans).
    pub fn check_manifold(mut self, check: bool) -> Self {
        self.check_manifold = check;
        self
    }

    /// Add one face.
    pub fn face(mut self, indices: &[usize]) -> Self {
        self.faces.push(indices.to_vec());
        self
    }

    /// Add several faces.
    pub fn faces<I, F>(mut self, faces: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: AsRef<[usize]>,
    {
        self.faces
            .extend(faces.into_iter().map(|f| f.as_ref().to_vec()));
        self
    }

    fn validate(&self) -> Result<()> {
        for (i, face) in self.faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(TessError::InvalidParameter(format!(
                    "face {} has {} indices, at least 3 are required",
                    i,
                    face.len()
                )));
            }
            for (k, &index) in face.iter().enumerate() {
                if index >= self.points.len() {
                    return Err(TessError::InvalidParameter(format!(
                        "face {} refers to point {} but only {} points were given",
                        i,
                        index,
                        self.points.len()
                    )));
                }
                if face[..k].contains(&index) {
                    return Err(TessError::InvalidParameter(format!(
                        "face {} visits point {} twice",
                        i, index
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn build(self) -> Result<Mesh> {
        self.validate()?;
        let mut mesh = Mesh::new();
        if self.faces.is_empty() {
            return Ok(mesh);
        }

        let corners: usize = self.faces.iter().map(Vec::len).sum();
        mesh.try_reserve(self.points.len(), corners, self.faces.len() + 1)?;

        // One quad per undirected edge; slot 0 follows its first traversal.
        let mut directed: HashMap<(usize, usize), EdgeId> = HashMap::with_capacity(corners);
        let mut owner: HashMap<EdgeId, usize> = HashMap::with_capacity(corners);
        let mut loops: Vec<Vec<EdgeId>> = Vec::with_capacity(self.faces.len());
        for (f, face) in self.faces.iter().enumerate() {
            let mut loop_edges = Vec::with_capacity(face.len());
            for k in 0..face.len() {
                let (a, b) = (face[k], face[(k + 1) % face.len()]);
                let e = match directed.get(&(a, b)) {
                    Some(&e) => e,
                    None => {
                        let e = mesh.alloc_quad();
                        directed.insert((a, b), e);
                        directed.insert((b, a), e.sym());
                        e
                    }
                };
                if owner.insert(e, f).is_some() {
                    return Err(TessError::InvalidParameter(format!(
                        "edge {} -> {} is used by more than one face with the same orientation",
                        a, b
                    )));
                }
                loop_edges.push(e);
            }
            loops.push(loop_edges);
        }

        // lnext inside each input face.
        let mut lnext: HashMap<EdgeId, EdgeId> = HashMap::with_capacity(directed.len());
        for edges in &loops {
            for k in 0..edges.len() {
                lnext.insert(edges[k], edges[(k + 1) % edges.len()]);
            }
        }

        // Origin of every directed edge.
        let mut origin: HashMap<EdgeId, usize> = HashMap::with_capacity(directed.len());
        for (&(a, _), &e) in &directed {
            origin.insert(e, a);
        }

        // Within a fan, onext(lnext(e)) == sym(e). Runs that start at an
        // edge whose reverse has no face are the arcs of their vertex.
        let mut onext: HashMap<EdgeId, EdgeId> = HashMap::with_capacity(directed.len());
        for (&e, &n) in &lnext {
            onext.insert(n, e.sym());
        }
        let mut arcs: HashMap<usize, Vec<Arc>> = HashMap::new();
        let mut starts: Vec<EdgeId> = directed
            .values()
            .copied()
            .filter(|e| !owner.contains_key(&e.sym()))
            .collect();
        starts.sort();
        for first in starts {
            let mut last = first;
            while let Some(&next) = onext.get(&last) {
                last = next;
            }
            arcs.entry(origin[&first]).or_default().push(Arc { first, last });
        }

        // Chain the arcs of each vertex into one ring.
        let mut vertex_ids: Vec<usize> = arcs.keys().copied().collect();
        vertex_ids.sort_unstable();
        for v in vertex_ids {
            let fans = &arcs[&v];
            if self.check_manifold && fans.len() > 1 {
                return Err(TessError::InvalidParameter(format!(
                    "point {} joins {} separate fans",
                    v,
                    fans.len()
                )));
            }
            for k in 0..fans.len() {
                onext.insert(fans[k].last, fans[(k + 1) % fans.len()].first);
            }
        }

        for (&e, &next) in &onext {
            mesh.set_onext(e, next);
        }
        debug_assert_eq!(onext.len(), directed.len());

        // Boundary edges: lnext(e) == oprev(sym(e)), read from the rings.
        let mut oprev: HashMap<EdgeId, EdgeId> = HashMap::with_capacity(onext.len());
        for (&e, &next) in &onext {
            oprev.insert(next, e);
        }
        let mut boundary: Vec<EdgeId> = directed
            .values()
            .copied()
            .filter(|e| !owner.contains_key(e))
            .collect();
        boundary.sort();
        for &e in &boundary {
            lnext.insert(e, oprev[&e.sym()]);
        }
        for (&e, &n) in &lnext {
            mesh.set_onext(e.inv_rot(), n.inv_rot());
        }

        // Vertex records for the points that are used.
        let mut vertices: HashMap<usize, VertexId> = HashMap::new();
        let mut used: Vec<usize> = origin.values().copied().collect();
        used.sort_unstable();
        used.dedup();
        for index in used {
            let v = mesh.add_vertex(self.points[index]);
            mesh.vertex_mut(v).source = Some(index as u32);
            vertices.insert(index, v);
        }
        // Sorted so each vertex keeps its lowest edge as representative.
        let mut by_edge: Vec<(EdgeId, usize)> = origin.iter().map(|(&e, &i)| (e, i)).collect();
        by_edge.sort_unstable();
        let mut degree: HashMap<usize, usize> = HashMap::new();
        for &(e, index) in &by_edge {
            let v = vertices[&index];
            mesh.set_org(e, Some(v));
            if mesh.vertices[v].an_edge.is_none() {
                mesh.vertices[v].an_edge = Some(e);
            }
            *degree.entry(index).or_default() += 1;
        }
        let mut by_index: Vec<(usize, VertexId)> = vertices.iter().map(|(&i, &v)| (i, v)).collect();
        by_index.sort_unstable_by_key(|&(i, _)| i);
        for (index, v) in by_index {
            let ring = mesh.vertex(v).edge().map_or(0, |e| mesh.org_ring(e).count());
            if ring != degree[&index] {
                // A closed fan cannot be linked with other faces at its center.
                return Err(TessError::InvalidParameter(format!(
                    "point {} is the center of a closed fan and also touches other faces",
                    index
                )));
            }
        }

        // Face records: input faces in order, then one per boundary loop.
        for (f, edges) in loops.iter().enumerate() {
            let face = mesh.add_face();
            mesh.faces[face].data = f;
            mesh.faces[face].an_edge = Some(edges[0]);
            for &e in edges {
                mesh.set_lface(e, Some(face));
            }
        }
        let mut outer: Vec<FaceId> = Vec::new();
        for &e in &boundary {
            if mesh.slot(e.inv_rot()).face.is_some() {
                continue;
            }
            let face = mesh.add_face();
            mesh.faces[face].data = usize::MAX;
            mesh.faces[face].an_edge = Some(e);
            mesh.set_loop_face(e, Some(face));
            outer.push(face);
        }
        log::debug!(
            "built mesh from {} faces: {} vertices, {} edges, {} boundary loops",
            self.faces.len(),
            mesh.vertices_count(),
            mesh.edges_count(),
            outer.len()
        );

        if self.check_manifold {
            let components = mesh.components();
            if components != 1 || mesh.euler_characteristic() != 2 {
                return Err(TessError::InvalidParameter(format!(
                    "face list is not a connected 2-manifold (V - E + F = {} over {} components)",
                    mesh.euler_characteristic(),
                    components
                )));
            }
        }
        Ok(mesh)
    }
}

impl Mesh {
    /// Build a mesh from `points` and counter-clockwise index lists.
    ///
    /// Input faces keep their position in `data`; boundary faces get
    /// `usize::MAX`.
    pub fn build_from_faces<F: AsRef<[usize]>>(
        points: &[Point],
        faces: &[F],
        check_manifold: bool,
    ) -> Result<Mesh> {
        FaceListBuilder::new(points)
            .faces(faces)
            .check_manifold(check_manifold)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::point;

    fn square_points() -> Vec<Point> {
        vec![
            point(0.0, 0.0),
            point(1.0, 0.0),
            point(1.0, 1.0),
            point(0.0, 1.0),
            point(0.5, 0.5),
        ]
    }

    #[test]
    fn single_triangle() {
        let pts = square_points();
        let mesh = Mesh::build_from_faces(&pts, &[[0usize, 1, 2]], true).unwrap();
        mesh.check().unwrap();
        assert_eq!(mesh.vertices_count(), 3);
        assert_eq!(mesh.edges_count(), 3);
        assert_eq!(mesh.faces_count(), 2);
    }

    #[test]
    fn fan_around_center_is_a_disk() {
        let pts = square_points();
        let faces = [[0usize, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4]];
        let mesh = Mesh::build_from_faces(&pts, &faces, true).unwrap();
        mesh.check().unwrap();
        assert_eq!(mesh.vertices_count(), 5);
        assert_eq!(mesh.edges_count(), 8);
        assert_eq!(mesh.faces_count(), 5);
        assert_eq!(mesh.euler_characteristic(), 2);

        let outer: Vec<FaceId> = mesh
            .faces()
            .filter(|&f| mesh.face(f).data == usize::MAX)
            .collect();
        assert_eq!(outer.len(), 1);
        assert_eq!(mesh.face_vertices(outer[0]).len(), 4);

        let center = mesh
            .vertices()
            .find(|&v| mesh.position(v) == point(0.5, 0.5))
            .unwrap();
        let e = mesh.vertex(center).edge().unwrap();
        assert_eq!(mesh.org_ring(e).count(), 4);
    }

    #[test]
    fn closed_tetrahedron_has_no_boundary() {
        let pts = square_points();
        let faces = [[0usize, 1, 2], [0, 2, 3], [0, 3, 1], [1, 3, 2]];
        let mesh = Mesh::build_from_faces(&pts, &faces, true).unwrap();
        mesh.check().unwrap();
        assert_eq!(mesh.faces_count(), 4);
        assert_eq!(mesh.euler_characteristic(), 2);
    }

    #[test]
    fn short_face_is_rejected() {
        let pts = square_points();
        let err = Mesh::build_from_faces(&pts, &[vec![0usize, 1]], false).unwrap_err();
        assert!(matches!(err, TessError::InvalidParameter(_)));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let pts = square_points();
        let err = Mesh::build_from_faces(&pts, &[[0usize, 1, 9]], false).unwrap_err();
        assert!(matches!(err, TessError::InvalidParameter(_)));
    }

    #[test]
    fn same_orientation_twice_is_rejected() {
        let pts = square_points();
        let err = Mesh::build_from_faces(&pts, &[[0usize, 1, 2], [0, 1, 3]], false).unwrap_err();
        assert!(matches!(err, TessError::InvalidParameter(_)));
    }

    #[test]
    fn pinched_vertex_needs_the_manifold_check_off() {
        let pts = vec![
            point(0.0, 0.0),
            point(1.0, 0.0),
            point(0.0, 1.0),
            point(-1.0, 0.0),
            point(0.0, -1.0),
        ];
        let faces = [[0usize, 1, 2], [0, 3, 4]];
        assert!(Mesh::build_from_faces(&pts, &faces, true).is_err());
        let mesh = Mesh::build_from_faces(&pts, &faces, false).unwrap();
        mesh.check().unwrap();
        assert_eq!(mesh.vertices_count(), 5);
        assert_eq!(mesh.edges_count(), 6);
    }

    #[test]
    fn representative_edge_is_lowest_in_ring() {
        let pts = square_points();
        let faces = [[0usize, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4]];
        let first = Mesh::build_from_faces(&pts, &faces, true).unwrap();
        let second = Mesh::build_from_faces(&pts, &faces, true).unwrap();
        let spokes = |mesh: &Mesh| {
            let mut out: Vec<(u32, u32)> = mesh
                .vertices()
                .map(|v| {
                    let e = mesh.vertex(v).edge().unwrap();
                    assert!(mesh.org_ring(e).all(|x| x >= e));
                    let to = mesh.dst(e);
                    (mesh.vertex(v).source().unwrap(), mesh.vertex(to).source().unwrap())
                })
                .collect();
            out.sort_unstable();
            out
        };
        assert_eq!(spokes(&first), spokes(&second));
    }

    #[test]
    fn builder_collects_faces_incrementally() {
        let pts = square_points();
        let mesh = FaceListBuilder::new(&pts)
            .face(&[0, 1, 2])
            .face(&[0, 2, 3])
            .check_manifold(true)
            .build()
            .unwrap();
        mesh.check().unwrap();
        assert_eq!(mesh.edges_count(), 5);
        assert_eq!(mesh.faces_count(), 3);
    }
}
