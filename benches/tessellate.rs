// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)

//! Criterion benchmarks for the tessellator, the Delaunay builder and the
//! ordered dictionary.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use quadtess::dict::OrderedDict;
use quadtess::{point, tessellate, FillRule, Mesh, Point};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn star(spikes: usize) -> Vec<Point> {
    let n = spikes * 2;
    (0..n)
        .map(|i| {
            let angle = i as f64 / n as f64 * std::f64::consts::TAU;
            let r = if i % 2 == 0 { 100.0 } else { 40.0 };
            point(r * angle.cos(), r * angle.sin())
        })
        .collect()
}

fn random_points(n: usize, seed: u64) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| point(rng.gen_range(-100.0..100.0), rng.gen_range(-100.0..100.0)))
        .collect()
}

fn bench_tessellate(c: &mut Criterion) {
    let mut group = c.benchmark_group("tessellate");
    for &spikes in &[8usize, 64, 512] {
        let pts = star(spikes);
        group.bench_with_input(BenchmarkId::new("star", spikes), &pts, |b, pts| {
            b.iter(|| tessellate(black_box(pts), &[pts.len()], FillRule::OddEven).unwrap())
        });
    }
    for &n in &[16usize, 128] {
        // A random contour crosses itself roughly n^2 / 10 times.
        let pts = random_points(n, 11);
        group.bench_with_input(BenchmarkId::new("self_intersecting", n), &pts, |b, pts| {
            b.iter(|| tessellate(black_box(pts), &[pts.len()], FillRule::Any).unwrap())
        });
    }
    group.finish();
}

fn bench_delaunay(c: &mut Criterion) {
    let mut group = c.benchmark_group("delaunay");
    for &n in &[100usize, 1000, 5000] {
        let pts = random_points(n, 42);
        group.bench_with_input(BenchmarkId::new("points_cloud", n), &pts, |b, pts| {
            b.iter(|| Mesh::build_from_points_cloud(black_box(pts), 1e-9).unwrap())
        });
    }
    group.finish();
}

fn bench_dict(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordered_dict");
    for &n in &[1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::new("insert_delete", n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let mut rng = StdRng::seed_from_u64(7);
                    (0..n).map(|_| rng.gen::<u32>()).collect::<Vec<_>>()
                },
                |keys| {
                    let mut dict = OrderedDict::new();
                    for &k in &keys {
                        dict.insert(k);
                    }
                    for k in keys.iter().step_by(2) {
                        dict.delete(k);
                    }
                    black_box(dict.nodes_count())
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tessellate, bench_delaunay, bench_dict);
criterion_main!(benches);
