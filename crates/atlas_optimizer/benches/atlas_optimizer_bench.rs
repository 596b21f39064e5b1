use std::hint::black_box;

use atlas_optimizer::clustering::{
    dbscan::Dbscan,
    hierarchical::{ClusterTree, Metrics},
    kmeans::KMeans,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use smallvec::smallvec;

/// Points on a golden-angle spiral, dense near the center.
fn spiral(count: usize) -> Vec<(f64, f64)> {
    let golden_angle = std::f64::consts::PI * (3.0 - 5f64.sqrt());
    (0..count)
        .map(|i| {
            let radius = (i as f64).sqrt();
            let angle = i as f64 * golden_angle;
            (radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

fn euclidean(a: &(f64, f64), b: &(f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

fn kmeans_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmeans");
    for count in [200, 1000] {
        let points = spiral(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &points, |b, points| {
            b.iter(|| KMeans::new(8).cluster(black_box(points), euclidean))
        });
    }
    group.finish();
}

fn dbscan_benchmark(c: &mut Criterion) {
    let points = spiral(1000);
    c.bench_function("dbscan 1000", |b| {
        b.iter(|| {
            Dbscan::new(1.5, 4).cluster(
                points.len(),
                |from, to| euclidean(&points[from], &points[to]),
                |members, _| members.len() < 50,
            )
        })
    });
}

fn hierarchical_benchmark(c: &mut Criterion) {
    let points = spiral(300);
    c.bench_function("average linkage 300", |b| {
        b.iter(|| {
            let metrics: Vec<Metrics> = points.iter().map(|_| smallvec![1.0, 300.0]).collect();
            let tree = ClusterTree::average_linkage(metrics, |from, to| {
                euclidean(&points[from], &points[to])
            });
            black_box(tree.cut(6, 1))
        })
    });
}

criterion_group!(
    benches,
    kmeans_benchmark,
    dbscan_benchmark,
    hierarchical_benchmark
);
criterion_main!(benches);
