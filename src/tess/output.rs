// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Triangle output assembled from the inside faces of a swept mesh.

use std::collections::HashMap;

use crate::error::{Result, TessError};
use crate::geom::{BoundingBox, Point, Real};
use crate::mesh::{Mesh, VertexId};

/// Result of a tessellation: a shared point list plus index triples.
///
/// Triangles are counter-clockwise. Points are numbered in the order the
/// triangles first use them.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct Tessellation {
    pub points: Vec<Point>,
    pub indices: Vec<[u32; 3]>,
    /// For each output point, the index of the input point it came from,
    /// or `None` for points created where edges cross.
    pub sources: Vec<Option<u32>>,
    /// Bounding box of the input points, `None` for empty input.
    pub bounds: Option<BoundingBox>,
}

impl Tessellation {
    pub(crate) fn from_mesh(mesh: &Mesh, bounds: BoundingBox) -> Result<Tessellation> {
        let mut out = Tessellation {
            bounds: Some(bounds),
            ..Tessellation::default()
        };
        let mut numbering: HashMap<VertexId, u32> = HashMap::new();

        for f in mesh.faces() {
            let face = mesh.face(f);
            if !face.inside {
                continue;
            }
            let Some(e0) = face.edge() else {
                continue;
            };
            let e1 = mesh.lnext(e0);
            let e2 = mesh.lnext(e1);
            if mesh.lnext(e2) != e0 {
                return Err(TessError::InternalInconsistency(
                    "interior face is not a triangle",
                ));
            }

            let mut triangle = [0u32; 3];
            for (slot, e) in triangle.iter_mut().zip([e0, e1, e2]) {
                let v = mesh.org(e);
                *slot = *numbering.entry(v).or_insert_with(|| {
                    out.points.push(mesh.position(v));
                    out.sources.push(mesh.vertex(v).source);
                    (out.points.len() - 1) as u32
                });
            }
            out.indices.push(triangle);
        }
        Ok(out)
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounds
    }

    /// The triangles with their corner positions.
    pub fn triangles(&self) -> impl Iterator<Item = [Point; 3]> + '_ {
        self.indices.iter().map(move |t| {
            [
                self.points[t[0] as usize],
                self.points[t[1] as usize],
                self.points[t[2] as usize],
            ]
        })
    }

    /// `[x0, y0, x1, y1, x2, y2]` for every triangle, one after the other.
    pub fn flat_coordinates(&self) -> Vec<Real> {
        let mut coords = Vec::with_capacity(self.indices.len() * 6);
        for t in self.triangles() {
            for p in t {
                coords.push(p.x);
                coords.push(p.y);
            }
        }
        coords
    }

    /// Sum of the triangle areas.
    pub fn area(&self) -> Real {
        self.triangles()
            .map(|[a, b, c]| crate::geom::signed_area(a, b, c))
            .sum()
    }
}
