// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Property tests over generated polygons.

mod helpers;

use helpers::{flatten, polygon_area, star, verify_valid_output};
use proptest::prelude::*;
use quadtess::geom::signed_area;
use quadtess::{point, tessellate, FillRule, Point, Tessellation};

fn regular_polygon(sides: usize, radius: f64, cx: f64, cy: f64, phase: f64) -> Vec<Point> {
    (0..sides)
        .map(|i| {
            let angle = phase + i as f64 / sides as f64 * std::f64::consts::TAU;
            point(cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect()
}

/// Odd-even membership by counting crossings of a ray towards +x.
fn crossing_parity(contours: &[Vec<(f64, f64)>], p: Point) -> bool {
    let mut inside = false;
    for contour in contours {
        for (i, &a) in contour.iter().enumerate() {
            let b = contour[(i + 1) % contour.len()];
            if (a.1 > p.y) != (b.1 > p.y) {
                let x = a.0 + (p.y - a.1) * (b.0 - a.0) / (b.1 - a.1);
                if x > p.x {
                    inside = !inside;
                }
            }
        }
    }
    inside
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let t = ((p - a).dot(ab) / ab.square_length().max(f64::MIN_POSITIVE)).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

/// Number of triangles containing `p`, or `None` when `p` is too close to
/// a triangle side to tell.
fn coverage(out: &Tessellation, p: Point) -> Option<usize> {
    let mut count = 0;
    for t in out.triangles() {
        if (0..3).any(|k| distance_to_segment(p, t[k], t[(k + 1) % 3]) < 1e-7) {
            return None;
        }
        if (0..3).all(|k| signed_area(t[k], t[(k + 1) % 3], p) > 0.0) {
            count += 1;
        }
    }
    Some(count)
}

fn grid_contours() -> impl Strategy<Value = Vec<Vec<(f64, f64)>>> {
    let contour = prop::collection::vec((0i32..=6, 0i32..=6), 3..8)
        .prop_map(|pts| pts.into_iter().map(|(x, y)| (x as f64, y as f64)).collect());
    prop::collection::vec(contour, 1..=3)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn odd_even_matches_crossing_parity_on_grid_input(contours in grid_contours()) {
        let refs: Vec<&[(f64, f64)]> = contours.iter().map(|c| c.as_slice()).collect();
        let (points, counts) = flatten(&refs);
        let out = tessellate(&points, &counts, FillRule::OddEven).unwrap();
        verify_valid_output(&out);
        let edges: Vec<(Point, Point)> = contours
            .iter()
            .flat_map(|c| {
                (0..c.len()).map(move |i| {
                    let (a, b) = (c[i], c[(i + 1) % c.len()]);
                    (point(a.0, a.1), point(b.0, b.1))
                })
            })
            .collect();
        for i in 0..24 {
            for j in 0..24 {
                let p = point(-0.4 + i as f64 * 0.29 + 0.0137, -0.4 + j as f64 * 0.29 + 0.0071);
                if edges.iter().any(|&(a, b)| distance_to_segment(p, a, b) < 1e-7) {
                    continue;
                }
                let Some(covered) = coverage(&out, p) else {
                    continue;
                };
                let expected = usize::from(crossing_parity(&contours, p));
                prop_assert_eq!(covered, expected, "at {:?} for {:?}", p, contours);
            }
        }
    }

    #[test]
    fn any_ignores_contour_orientation(
        contours in grid_contours(),
        flips in prop::collection::vec(any::<bool>(), 3),
    ) {
        let refs: Vec<&[(f64, f64)]> = contours.iter().map(|c| c.as_slice()).collect();
        let (points, counts) = flatten(&refs);
        let reversed: Vec<Vec<(f64, f64)>> = contours
            .iter()
            .zip(&flips)
            .map(|(c, &flip)| {
                let mut c = c.clone();
                if flip {
                    c.reverse();
                }
                c
            })
            .collect();
        let refs: Vec<&[(f64, f64)]> = reversed.iter().map(|c| c.as_slice()).collect();
        let (flipped_points, _) = flatten(&refs);
        let a = tessellate(&points, &counts, FillRule::Any).unwrap();
        let b = tessellate(&flipped_points, &counts, FillRule::Any).unwrap();
        prop_assert!((a.area() - b.area()).abs() <= 1e-9 * a.area().max(1.0));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn convex_polygon_area_and_count(
        sides in 3usize..64,
        radius in 0.5f64..500.0,
        cx in -1000.0f64..1000.0,
        cy in -1000.0f64..1000.0,
        phase in 0.0f64..std::f64::consts::TAU,
    ) {
        let pts = regular_polygon(sides, radius, cx, cy, phase);
        let expected = polygon_area(&pts);
        for rule in [FillRule::OddEven, FillRule::Any] {
            let out = tessellate(&pts, &[sides], rule).unwrap();
            verify_valid_output(&out);
            prop_assert_eq!(out.triangle_count(), sides - 2);
            prop_assert!((out.area() - expected).abs() <= 1e-7 * expected.max(1.0));
        }
    }

    #[test]
    fn star_polygon_area_and_count(
        spikes in 3usize..24,
        inner in 0.1f64..0.45,
        outer in 1.0f64..100.0,
    ) {
        let pts = star(spikes, outer, inner * outer);
        let expected = polygon_area(&pts);
        let out = tessellate(&pts, &[pts.len()], FillRule::OddEven).unwrap();
        verify_valid_output(&out);
        prop_assert_eq!(out.triangle_count(), pts.len() - 2);
        prop_assert!((out.area() - expected).abs() <= 1e-7 * expected.max(1.0));
    }

    #[test]
    fn clockwise_input_gives_the_same_area(
        sides in 3usize..32,
        radius in 1.0f64..50.0,
    ) {
        let ccw = regular_polygon(sides, radius, 0.0, 0.0, 0.3);
        let mut cw = ccw.clone();
        cw.reverse();
        let a = tessellate(&ccw, &[sides], FillRule::OddEven).unwrap();
        let b = tessellate(&cw, &[sides], FillRule::OddEven).unwrap();
        prop_assert!((a.area() - b.area()).abs() <= 1e-7 * a.area().max(1.0));
    }

    #[test]
    fn tessellation_is_deterministic(
        coords in prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0), 3..24),
    ) {
        // Arbitrary, usually self-intersecting, single contour.
        let pts: Vec<Point> = coords.iter().map(|&(x, y)| point(x, y)).collect();
        let first = tessellate(&pts, &[pts.len()], FillRule::OddEven).unwrap();
        let second = tessellate(&pts, &[pts.len()], FillRule::OddEven).unwrap();
        verify_valid_output(&first);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn any_covers_at_least_odd_even(
        coords in prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0), 3..16),
    ) {
        let pts: Vec<Point> = coords.iter().map(|&(x, y)| point(x, y)).collect();
        let odd = tessellate(&pts, &[pts.len()], FillRule::OddEven).unwrap();
        let any = tessellate(&pts, &[pts.len()], FillRule::Any).unwrap();
        prop_assert!(any.area() + 1e-6 >= odd.area());
    }
}
