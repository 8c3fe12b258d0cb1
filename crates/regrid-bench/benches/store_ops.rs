//! Criterion micro-benchmarks for cell sets and their scalar attributes.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use regrid_arena::{ArenaConfig, ChunkAllocator};
use regrid_core::Dimension;
use regrid_store::CellSet;

/// Build a point set with one `weight` scalar and `count` live nodes.
fn make_points(count: usize) -> (ChunkAllocator, CellSet, Vec<regrid_core::Node>) {
    let mut alloc = ChunkAllocator::new(ArenaConfig::new()).unwrap();
    let mut points = CellSet::create(Dimension::Points).unwrap();
    points.add_scalar(&mut alloc, "weight").unwrap();
    let nodes = (0..count)
        .map(|_| points.node_new(&mut alloc).unwrap())
        .collect();
    (alloc, points, nodes)
}

/// Benchmark: release and re-acquire every other node of 10K.
fn bench_node_churn(c: &mut Criterion) {
    let (mut alloc, mut points, mut nodes) = make_points(10_000);
    c.bench_function("node_churn_10k", |b| {
        b.iter(|| {
            for n in nodes.iter_mut().step_by(2) {
                points.node_remove(&mut alloc, *n).unwrap();
                *n = points.node_new(&mut alloc).unwrap();
            }
        });
    });
}

/// Benchmark: write then read one scalar on 10K nodes.
fn bench_scalar_rw(c: &mut Criterion) {
    let (mut alloc, points, nodes) = make_points(10_000);
    c.bench_function("scalar_rw_10k", |b| {
        b.iter(|| {
            for (i, &n) in nodes.iter().enumerate() {
                points.set_scalar(&mut alloc, "weight", n, i as f64).unwrap();
            }
            let mut sum = 0.0;
            for &n in &nodes {
                sum += points.scalar(&alloc, "weight", n).unwrap();
            }
            black_box(sum);
        });
    });
}

/// Benchmark: walk the used lists of 10K nodes.
fn bench_node_walk(c: &mut Criterion) {
    let (alloc, points, _) = make_points(10_000);
    c.bench_function("node_walk_10k", |b| {
        b.iter(|| black_box(points.nodes(&alloc).unwrap().len()));
    });
}

criterion_group!(benches, bench_node_churn, bench_scalar_rw, bench_node_walk);
criterion_main!(benches);
