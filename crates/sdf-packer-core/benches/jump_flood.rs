use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sdf_packer_core::prelude::*;
use std::hint::black_box;

fn random_mask(size: u32) -> SolidityMask {
    let mut rng = StdRng::seed_from_u64(size as u64);
    let discs: Vec<(f32, f32, f32)> = (0..8)
        .map(|_| {
            (
                rng.gen_range(0.0..size as f32),
                rng.gen_range(0.0..size as f32),
                rng.gen_range(2.0..size as f32 / 4.0),
            )
        })
        .collect();
    let alpha = (0..size * size)
        .map(|i| {
            let (x, y) = ((i % size) as f32, (i / size) as f32);
            let inside = discs
                .iter()
                .any(|&(cx, cy, r)| (x - cx).powi(2) + (y - cy).powi(2) <= r * r);
            if inside { 1.0 } else { 0.0 }
        })
        .collect();
    SolidityMask::from_alpha(size, size, alpha)
}

fn bench_cpu_backend(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_distance_field");

    for size in [64u32, 128, 256] {
        let mask = random_mask(size);
        group.throughput(Throughput::Elements((size * size) as u64));

        group.bench_with_input(BenchmarkId::new("parallel", size), &mask, |b, mask| {
            let cpu = CpuBackend::new();
            b.iter(|| black_box(cpu.distance_field(mask, 8.0)));
        });

        group.bench_with_input(BenchmarkId::new("sequential", size), &mask, |b, mask| {
            let cpu = CpuBackend::sequential();
            b.iter(|| black_box(cpu.distance_field(mask, 8.0)));
        });
    }

    group.finish();
}

fn bench_atlas_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("atlas_layout");
    let mut rng = StdRng::seed_from_u64(1);
    let sizes: Vec<(u32, u32)> = (0..200)
        .map(|_| (rng.gen_range(16..=72), rng.gen_range(16..=72)))
        .collect();

    for family in [
        PackAlgorithm::Shelf,
        PackAlgorithm::Guillotine,
        PackAlgorithm::MaxRects,
        PackAlgorithm::Auto,
    ] {
        let cfg = AtlasConfig::builder().family(family.clone()).build();
        group.bench_with_input(
            BenchmarkId::new("family", format!("{family:?}")),
            &cfg,
            |b, cfg| {
                b.iter(|| black_box(sdf_packer_core::layout_sizes(&sizes, cfg)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_cpu_backend, bench_atlas_layout);
criterion_main!(benches);
