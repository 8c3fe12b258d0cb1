//! Criterion micro-benchmarks for buddy chunk allocation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use regrid_arena::{ArenaConfig, ChunkAllocator};
use regrid_core::limits::MAX_DEPTH;

/// Benchmark: allocate then free 1024 single pages.
fn bench_page_churn(c: &mut Criterion) {
    let mut alloc = ChunkAllocator::new(ArenaConfig::new()).unwrap();
    let mut ids = Vec::with_capacity(1024);
    c.bench_function("page_churn_1024", |b| {
        b.iter(|| {
            for _ in 0..1024 {
                ids.push(alloc.allocate_page().unwrap());
            }
            for id in ids.drain(..) {
                alloc.deallocate(id).unwrap();
            }
        });
    });
}

/// Benchmark: interleaved allocations across every depth class, freed in
/// reverse so buddies merge back into roots.
fn bench_mixed_depths(c: &mut Criterion) {
    let mut alloc = ChunkAllocator::new(ArenaConfig::new()).unwrap();
    let mut ids = Vec::with_capacity(256);
    c.bench_function("mixed_depth_256", |b| {
        b.iter(|| {
            for i in 0..256u32 {
                let depth = (i % (u32::from(MAX_DEPTH) + 1)) as u8;
                ids.push(alloc.allocate(depth).unwrap());
            }
            while let Some(id) = ids.pop() {
                alloc.deallocate(id).unwrap();
            }
        });
    });
}

/// Benchmark: resolve chunk addresses for 1024 live pages.
fn bench_address(c: &mut Criterion) {
    let mut alloc = ChunkAllocator::new(ArenaConfig::new()).unwrap();
    let ids: Vec<_> = (0..1024).map(|_| alloc.allocate_page().unwrap()).collect();
    c.bench_function("address_1024", |b| {
        b.iter(|| {
            for &id in &ids {
                black_box(alloc.address(id).unwrap());
            }
        });
    });
}

criterion_group!(benches, bench_page_churn, bench_mixed_depths, bench_address);
criterion_main!(benches);
