// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Face-list and point-cloud mesh construction.

mod helpers;

use helpers::{assert_euler, convex_hull, inside_area, polygon_area};
use proptest::prelude::*;
use quadtess::geom::{in_circle, signed_area};
use quadtess::{point, FaceListBuilder, Mesh, Point, TessError};

fn grid(n: usize) -> (Vec<Point>, Vec<[usize; 4]>) {
    let points = (0..=n)
        .flat_map(|y| (0..=n).map(move |x| point(x as f64, y as f64)))
        .collect();
    let stride = n + 1;
    let faces = (0..n)
        .flat_map(|y| {
            (0..n).map(move |x| {
                let i = y * stride + x;
                [i, i + 1, i + 1 + stride, i + stride]
            })
        })
        .collect();
    (points, faces)
}

#[test]
fn quad_grid_from_faces() {
    let (points, faces) = grid(3);
    let mesh = Mesh::build_from_faces(&points, &faces, true).unwrap();
    assert_euler(&mesh);
    assert_eq!(mesh.vertices_count(), 16);
    assert_eq!(mesh.edges_count(), 24);
    // Nine quads plus the outer boundary.
    assert_eq!(mesh.faces_count(), 10);

    let mut input_faces: Vec<usize> = mesh
        .faces()
        .map(|f| mesh.face(f).data)
        .filter(|&d| d != usize::MAX)
        .collect();
    input_faces.sort_unstable();
    assert_eq!(input_faces, (0..9).collect::<Vec<_>>());

    for f in mesh.faces() {
        let data = mesh.face(f).data;
        if data == usize::MAX {
            assert_eq!(mesh.face_vertices(f).len(), 12);
            continue;
        }
        let corners: Vec<usize> = mesh
            .face_vertices(f)
            .into_iter()
            .map(|v| mesh.vertex(v).source().unwrap() as usize)
            .collect();
        // Same cyclic sequence as the input face.
        let start = corners.iter().position(|&c| c == faces[data][0]).unwrap();
        let rotated: Vec<usize> = (0..4).map(|k| corners[(start + k) % 4]).collect();
        assert_eq!(rotated, faces[data].to_vec());
    }
}

#[test]
fn octahedron_is_closed() {
    let points = vec![
        point(1.0, 0.0),
        point(0.0, 1.0),
        point(-1.0, 0.0),
        point(0.0, -1.0),
        point(0.0, 0.0),
        point(0.5, 0.5),
    ];
    // Top fan around 4 and bottom fan around 5, both wound consistently.
    let faces = [
        [0, 1, 4],
        [1, 2, 4],
        [2, 3, 4],
        [3, 0, 4],
        [1, 0, 5],
        [2, 1, 5],
        [3, 2, 5],
        [0, 3, 5],
    ];
    let mesh = Mesh::build_from_faces(&points, &faces, true).unwrap();
    assert_euler(&mesh);
    assert_eq!(mesh.faces_count(), 8);
    assert_eq!(mesh.edges_count(), 12);
    assert!(mesh.faces().all(|f| mesh.face(f).data != usize::MAX));
}

#[test]
fn builder_accumulates_faces() {
    let points = [point(0.0, 0.0), point(1.0, 0.0), point(1.0, 1.0), point(0.0, 1.0)];
    let mesh = FaceListBuilder::new(&points)
        .face(&[0, 1, 2])
        .faces([[0usize, 2, 3]])
        .check_manifold(true)
        .build()
        .unwrap();
    assert_euler(&mesh);
    // The boundary face is the square itself.
    assert_eq!(mesh.triangles().len(), 2);
    assert_eq!(mesh.faces_count(), 3);
}

#[test]
fn malformed_faces_are_rejected() {
    let points = [point(0.0, 0.0), point(1.0, 0.0), point(0.0, 1.0)];
    let short: &[&[usize]] = &[&[0, 1]];
    let out_of_range: &[&[usize]] = &[&[0, 1, 3]];
    let repeated: &[&[usize]] = &[&[0, 1, 1]];
    let flipped_twice: &[&[usize]] = &[&[0, 1, 2], &[0, 1, 2]];
    for faces in [short, out_of_range, repeated, flipped_twice] {
        let err = Mesh::build_from_faces(&points, faces, false).unwrap_err();
        assert!(matches!(err, TessError::InvalidParameter(_)), "{:?}", faces);
    }
}

#[test]
fn disconnected_faces_fail_the_manifold_check() {
    let points = [
        point(0.0, 0.0),
        point(1.0, 0.0),
        point(0.0, 1.0),
        point(5.0, 0.0),
        point(6.0, 0.0),
        point(5.0, 1.0),
    ];
    let faces = [[0usize, 1, 2], [3, 4, 5]];
    let mesh = Mesh::build_from_faces(&points, &faces, false).unwrap();
    assert_euler(&mesh);
    assert_eq!(mesh.components(), 2);
    assert!(Mesh::build_from_faces(&points, &faces, true).is_err());
}

#[test]
fn point_cloud_covers_its_hull() {
    let points: Vec<Point> = (0..5)
        .flat_map(|y| (0..5).map(move |x| point(x as f64 + 0.01 * y as f64, y as f64)))
        .collect();
    let mesh = Mesh::build_from_points_cloud(&points, 1e-9).unwrap();
    assert_euler(&mesh);
    assert_eq!(mesh.vertices_count(), 25);
    // The hull is a parallelogram of area 4 x 4.
    assert!((inside_area(&mesh) - 16.0).abs() < 1e-6);
}

#[test]
fn concave_pockets_on_the_hull_are_filled() {
    // Points hugging a circle leave the sweep's outer chain concave.
    let mut points: Vec<Point> = (0..24)
        .map(|i| {
            let angle = i as f64 / 24.0 * std::f64::consts::TAU;
            point(50.0 * angle.cos(), 50.0 * angle.sin())
        })
        .collect();
    points.push(point(0.3, -0.2));
    let mesh = Mesh::build_from_points_cloud(&points, 1e-9).unwrap();
    assert_euler(&mesh);
    let hull = convex_hull(&points);
    assert_eq!(hull.len(), 24);
    let triangles = mesh.faces().filter(|&f| mesh.face(f).inside).count();
    assert_eq!(triangles, 2 * points.len() - 2 - hull.len());
    assert!((inside_area(&mesh) - polygon_area(&hull)).abs() < 1e-6);
}

#[test]
fn empty_cloud_gives_empty_mesh() {
    let mesh = Mesh::build_from_points_cloud(&[], 0.0).unwrap();
    assert_eq!(mesh.vertices_count(), 0);
    assert_eq!(mesh.faces_count(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn point_cloud_is_delaunay(
        coords in prop::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 3..40),
    ) {
        let points: Vec<Point> = coords.iter().map(|&(x, y)| point(x, y)).collect();
        let mesh = Mesh::build_from_points_cloud(&points, 1e-9).unwrap();
        mesh.check().unwrap();
        prop_assert_eq!(mesh.euler_characteristic(), 2 * mesh.components() as i64);

        let hull = polygon_area(&convex_hull(&points));
        let covered = inside_area(&mesh);
        prop_assert!(
            (covered - hull).abs() <= 1e-9 * hull.max(1.0),
            "triangles cover {} of hull area {}",
            covered,
            hull
        );

        for f in mesh.faces().filter(|&f| mesh.face(f).inside) {
            let corners: Vec<Point> = mesh
                .face_vertices(f)
                .into_iter()
                .map(|v| mesh.position(v))
                .collect();
            prop_assert_eq!(corners.len(), 3);
            prop_assert!(signed_area(corners[0], corners[1], corners[2]) > 0.0);
            for &q in &points {
                if corners.contains(&q) {
                    continue;
                }
                let scale = 1e-9 * (1.0 + q.to_vector().square_length()).powi(2);
                prop_assert!(in_circle(corners[0], corners[1], corners[2], q) <= scale);
            }
        }
    }
}
