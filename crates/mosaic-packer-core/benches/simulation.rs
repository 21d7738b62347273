use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mosaic_packer_core::prelude::*;
use std::hint::black_box;

/// Opaque disc centred in a `side`×`side` mask.
fn disc_mask(side: u32) -> MaskModel {
    let r = side as f64 / 2.0;
    let alpha: Vec<u8> = (0..side * side)
        .map(|i| {
            let (x, y) = ((i % side) as f64 + 0.5 - r, (i / side) as f64 + 0.5 - r);
            if x * x + y * y <= r * r { 255 } else { 0 }
        })
        .collect();
    MaskModel::from_alpha(side, side, &alpha).expect("mask")
}

fn bench_estimate_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate_fill");
    for side in [400u32, 800, 1200] {
        let mask = disc_mask(side);
        group.bench_with_input(BenchmarkId::new("tile_110_overlap_25", side), &mask, |b, mask| {
            b.iter(|| black_box(estimate_fill(mask, 500, 110, 25, ExhaustionPolicy::StopRow)));
        });
    }
    group.finish();
}

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    group.sample_size(10);
    let mask = disc_mask(800);
    group.bench_function("sequential", |b| {
        b.iter(|| black_box(rank(&mask, 300)));
    });
    let parallel = RankerConfig {
        parallel: true,
        ..RankerConfig::default()
    };
    group.bench_function("parallel_flag", |b| {
        b.iter(|| black_box(rank_configurations(&mask, 300, &parallel)));
    });
    group.finish();
}

criterion_group!(benches, bench_estimate_fill, bench_rank);
criterion_main!(benches);
