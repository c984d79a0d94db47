// quadtess: 2D polygon tessellation over a quad-edge planar mesh
// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)

//! Triangulates closed polygonal contours, including self-intersecting and
//! overlapping ones, under an odd-even or any-coverage fill rule.
//!
//! ```
//! use quadtess::{point, tessellate, FillRule};
//!
//! let square = [point(0.0, 0.0), point(10.0, 0.0), point(10.0, 10.0), point(0.0, 10.0)];
//! let out = tessellate(&square, &[4], FillRule::OddEven).unwrap();
//! assert_eq!(out.triangle_count(), 2);
//! assert!((out.area() - 100.0).abs() < 1e-9);
//! ```
//!
//! The building blocks are public too: [`dict::OrderedDict`] is the AVL
//! tree used for the sweep status, and [`mesh::Mesh`] is the quad-edge
//! subdivision with its Euler operators and two builders.

pub mod arena;
pub mod dict;
pub mod error;
pub mod geom;
pub mod mesh;
pub mod priorityq;
mod sweep;
pub mod tess;

pub use error::{Result, TessError};
pub use geom::{point, vector, BoundingBox, Point, Real, Vector};
pub use mesh::{EdgeId, FaceId, FaceListBuilder, Mesh, VertexId};
pub use tess::{
    tessellate, tessellate_with_options, FillRule, Tessellation, Tessellator, TessellatorOptions,
};
