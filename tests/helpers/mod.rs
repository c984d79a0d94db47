// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Shared test utilities for the integration tests.

#![allow(dead_code)]

use quadtess::geom::signed_area;
use quadtess::{point, FillRule, Mesh, Point, Real, Tessellation};

/// Tessellate a list of contours given as `(x, y)` tuples.
pub fn tessellate_contours(contours: &[&[(Real, Real)]], rule: FillRule) -> Tessellation {
    let (points, counts) = flatten(contours);
    quadtess::tessellate(&points, &counts, rule)
        .unwrap_or_else(|e| panic!("tessellation failed for {:?}: {}", rule, e))
}

/// Concatenate contours into the point list and count list the API takes.
pub fn flatten(contours: &[&[(Real, Real)]]) -> (Vec<Point>, Vec<usize>) {
    let mut points = Vec::new();
    let mut counts = Vec::new();
    for contour in contours {
        points.extend(contour.iter().map(|&(x, y)| point(x, y)));
        counts.push(contour.len());
    }
    (points, counts)
}

/// Axis-aligned square as four counter-clockwise corners.
pub fn square(x: Real, y: Real, size: Real) -> Vec<(Real, Real)> {
    vec![(x, y), (x + size, y), (x + size, y + size), (x, y + size)]
}

/// Regular star with `spikes` outer points, counter-clockwise.
pub fn star(spikes: usize, outer: Real, inner: Real) -> Vec<Point> {
    let n = spikes * 2;
    (0..n)
        .map(|i| {
            let angle = i as Real / n as Real * std::f64::consts::TAU;
            let r = if i % 2 == 0 { outer } else { inner };
            point(r * angle.cos(), r * angle.sin())
        })
        .collect()
}

/// Area of a simple polygon by the shoelace formula, unsigned.
pub fn polygon_area(points: &[Point]) -> Real {
    quadtess::geom::polygon_signed_area(points).abs()
}

pub fn assert_area_approx(actual: Real, expected: Real, tolerance: Real, label: &str) {
    assert!(
        (actual - expected).abs() < tolerance,
        "{}: expected area ~{}, got {} (diff={})",
        label,
        expected,
        actual,
        (actual - expected).abs()
    );
}

/// Structural checks every tessellation result must pass.
pub fn verify_valid_output(out: &Tessellation) {
    assert_eq!(
        out.points.len(),
        out.sources.len(),
        "one source entry per output point"
    );
    let n = out.points.len() as u32;
    for (i, tri) in out.indices.iter().enumerate() {
        for &idx in tri {
            assert!(idx < n, "triangle {} references point {} of {}", i, idx, n);
        }
        assert!(
            tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2],
            "triangle {} repeats a corner: {:?}",
            i,
            tri
        );
    }
    for (i, [a, b, c]) in out.triangles().enumerate() {
        assert!(
            signed_area(a, b, c) >= -1e-9 * (1.0 + a.to_vector().square_length()),
            "triangle {} is clockwise: {:?} {:?} {:?}",
            i,
            a,
            b,
            c
        );
    }
    for p in &out.points {
        assert!(p.x.is_finite() && p.y.is_finite(), "non-finite output point");
    }
    if let Some(bounds) = out.bounding_box() {
        for p in &out.points {
            assert!(
                p.x >= bounds.min.x - 1e-9
                    && p.x <= bounds.max.x + 1e-9
                    && p.y >= bounds.min.y - 1e-9
                    && p.y <= bounds.max.y + 1e-9,
                "point {:?} outside {:?}",
                p,
                bounds
            );
        }
    }
}

/// Mesh consistency plus `V - E + F = 2` per connected component.
pub fn assert_euler(mesh: &Mesh) {
    mesh.check().expect("mesh should be consistent");
    assert_eq!(
        mesh.euler_characteristic(),
        2 * mesh.components() as i64,
        "V={} E={} F={}",
        mesh.vertices_count(),
        mesh.edges_count(),
        mesh.faces_count()
    );
}

/// Total area of the faces a builder marked inside.
pub fn inside_area(mesh: &Mesh) -> Real {
    mesh.faces()
        .filter(|&f| mesh.face(f).inside)
        .map(|f| {
            let corners: Vec<Point> = mesh
                .face_vertices(f)
                .into_iter()
                .map(|v| mesh.position(v))
                .collect();
            quadtess::geom::polygon_signed_area(&corners)
        })
        .sum()
}

/// Convex hull by Andrew's monotone chain, counter-clockwise, collinear
/// points dropped.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }
    let mut hull: Vec<Point> = Vec::with_capacity(pts.len() * 2);
    for pass in 0..2 {
        let start = hull.len();
        let iter: Box<dyn Iterator<Item = &Point>> = if pass == 0 {
            Box::new(pts.iter())
        } else {
            Box::new(pts.iter().rev())
        };
        for &p in iter {
            while hull.len() >= start + 2
                && signed_area(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
            {
                hull.pop();
            }
            hull.push(p);
        }
        hull.pop();
    }
    hull
}
