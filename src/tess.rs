// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Public tessellation entry points.
//
// A call validates its input, loads every contour into a fresh mesh, runs
// the sweep to mark the inside faces, triangulates those faces and copies
// the triangles out. The mesh is dropped before returning, on success and
// on failure alike.

mod output;

pub use output::Tessellation;

use crate::error::{Result, TessError};
use crate::geom::{polygon_signed_area, BoundingBox, Point};
use crate::mesh::{EdgeId, Mesh};
use crate::sweep::{self, EdgeWindings};

// ─────────────────────────────── Public types ──────────────────────────────────

/// How crossing numbers map to inside and outside.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum FillRule {
    /// Inside where the crossing number is odd.
    OddEven,
    /// Same as `OddEven`.
    EvenOdd,
    /// Inside where the crossing number is non-zero. Not implemented;
    /// requesting it fails with [`TessError::Unsupported`].
    NonZero,
    /// Inside wherever any contour covers the point. Each contour is
    /// oriented so its net enclosed area is positive before the crossing
    /// numbers are summed, so overlapping contours never cancel.
    Any,
}

impl FillRule {
    pub fn is_supported(self) -> bool {
        !matches!(self, FillRule::NonZero)
    }
}

impl Default for FillRule {
    fn default() -> Self {
        TessellatorOptions::DEFAULT_FILL_RULE
    }
}

/// Parameters for a tessellation.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub struct TessellatorOptions {
    /// See the documentation of [`FillRule`].
    ///
    /// Default value: `EvenOdd`.
    pub fill_rule: FillRule,
}

impl TessellatorOptions {
    pub const DEFAULT_FILL_RULE: FillRule = FillRule::EvenOdd;

    pub const DEFAULT: Self = TessellatorOptions {
        fill_rule: Self::DEFAULT_FILL_RULE,
    };

    #[inline]
    pub fn even_odd() -> Self {
        Self::DEFAULT.with_fill_rule(FillRule::EvenOdd)
    }

    #[inline]
    pub fn any() -> Self {
        Self::DEFAULT.with_fill_rule(FillRule::Any)
    }

    #[inline]
    pub const fn with_fill_rule(mut self, fill_rule: FillRule) -> Self {
        self.fill_rule = fill_rule;
        self
    }
}

impl Default for TessellatorOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ─────────────────────────── Tessellator ──────────────────────────────────────

/// Reusable tessellator holding options and an optional cancellation check.
///
/// Every call to [`Tessellator::tessellate`] builds and drops its own mesh,
/// so nothing carries over between calls except the configuration.
pub struct Tessellator {
    options: TessellatorOptions,
    cancel: Option<Box<dyn FnMut() -> bool>>,
}

impl Default for Tessellator {
    fn default() -> Self {
        Self::new()
    }
}

impl Tessellator {
    pub fn new() -> Self {
        Self::with_options(TessellatorOptions::DEFAULT)
    }

    pub fn with_options(options: TessellatorOptions) -> Self {
        Tessellator {
            options,
            cancel: None,
        }
    }

    pub fn options(&self) -> &TessellatorOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: TessellatorOptions) {
        self.options = options;
    }

    /// Install a check polled once per sweep event. Returning `true` makes
    /// the running call fail with [`TessError::Cancelled`].
    pub fn set_cancel_check(&mut self, check: impl FnMut() -> bool + 'static) {
        self.cancel = Some(Box::new(check));
    }

    pub fn clear_cancel_check(&mut self) {
        self.cancel = None;
    }

    /// Triangulate the contours in `points`, split by `counts`: the first
    /// `counts[0]` points are the first contour, and so on. Contours are
    /// implicitly closed.
    pub fn tessellate(&mut self, points: &[Point], counts: &[usize]) -> Result<Tessellation> {
        let fill_rule = self.options.fill_rule;
        if !fill_rule.is_supported() {
            return Err(TessError::Unsupported(fill_rule));
        }
        validate_contours(points, counts)?;
        if points.is_empty() {
            return Ok(Tessellation::default());
        }

        let bounds = BoundingBox::from_points(points);
        let mut mesh = Mesh::new();
        mesh.try_reserve(points.len() + 4, points.len() + 8, counts.len() + 2)?;
        let mut windings = EdgeWindings::with_capacity(points.len());
        let mut start = 0;
        for &count in counts {
            add_contour(&mut mesh, &mut windings, &points[start..start + count], start);
            start += count;
        }
        log::debug!(
            "tessellating {} contours, {} points, fill rule {:?}",
            counts.len(),
            points.len(),
            fill_rule
        );

        let mut never = || false;
        let cancel: &mut dyn FnMut() -> bool = match self.cancel.as_mut() {
            Some(check) => &mut **check,
            None => &mut never,
        };
        sweep::compute_interior(&mut mesh, &mut windings, fill_rule, bounds, cancel)?;
        mesh.tessellate_interior();

        let tessellation = Tessellation::from_mesh(&mesh, bounds)?;
        log::debug!(
            "produced {} triangles over {} points",
            tessellation.indices.len(),
            tessellation.points.len()
        );
        Ok(tessellation)
    }
}

/// Triangulate with the given fill rule and default options otherwise.
pub fn tessellate(points: &[Point], counts: &[usize], fill_rule: FillRule) -> Result<Tessellation> {
    tessellate_with_options(
        points,
        counts,
        &TessellatorOptions::DEFAULT.with_fill_rule(fill_rule),
    )
}

pub fn tessellate_with_options(
    points: &[Point],
    counts: &[usize],
    options: &TessellatorOptions,
) -> Result<Tessellation> {
    Tessellator::with_options(*options).tessellate(points, counts)
}

fn validate_contours(points: &[Point], counts: &[usize]) -> Result<()> {
    for (i, &count) in counts.iter().enumerate() {
        if count < 3 {
            return Err(TessError::InvalidParameter(format!(
                "contour {} has {} points, at least 3 are required",
                i, count
            )));
        }
    }
    let total = counts
        .iter()
        .try_fold(0usize, |sum, &count| sum.checked_add(count));
    if total != Some(points.len()) {
        return Err(TessError::InvalidParameter(format!(
            "contour counts do not add up to the {} points given",
            points.len()
        )));
    }
    if let Some(i) = points.iter().position(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return Err(TessError::InvalidParameter(format!(
            "point {} has a non-finite coordinate",
            i
        )));
    }
    Ok(())
}

/// Load one closed contour as a loop of edges. The winding of its edges is
/// signed so the area it encloses gains +1, clockwise or not.
fn add_contour(mesh: &mut Mesh, windings: &mut EdgeWindings, points: &[Point], first_index: usize) {
    let winding = if polygon_signed_area(points) < 0.0 { -1 } else { 1 };
    let mut e: Option<EdgeId> = None;
    for (i, &p) in points.iter().enumerate() {
        let current = match e {
            None => {
                // A single self-loop; later points are split into it.
                let e = mesh.make_edge();
                mesh.splice(e, e.sym());
                e
            }
            Some(prev) => {
                mesh.split_edge(prev);
                mesh.lnext(prev)
            }
        };
        let org = mesh.org(current);
        let vertex = mesh.vertex_mut(org);
        vertex.position = p;
        vertex.source = Some((first_index + i) as u32);
        windings.set(current, winding);
        e = Some(current);
    }
}
