//! # Generation Benchmarks
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strata::generation::utils::create_rng;
use strata::{generate_multi_level, GenerationParams, GeneratorKind, PoissonDiscSampler};

/// Benchmark: every single-biome generator on an 80x50 map.
fn bench_single_biome(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_biome_80x50");
    let params = GenerationParams::new("fantasy").with_size(80, 50);

    for kind in GeneratorKind::SINGLE_BIOME {
        group.bench_with_input(BenchmarkId::from_parameter(kind.name()), &kind, |b, &kind| {
            b.iter(|| kind.generate(black_box(42), &params))
        });
    }

    group.finish();
}

/// Benchmark: cave generation as the map grows.
fn bench_cellular_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("cellular_scaling");

    for size in [64_i64, 128, 256] {
        let params = GenerationParams::new("fantasy").with_size(size, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &params, |b, params| {
            b.iter(|| GeneratorKind::Cellular.generate(black_box(7), params))
        });
    }

    group.finish();
}

/// Benchmark: Poisson-disc sampling over a large forest floor.
fn bench_poisson(c: &mut Criterion) {
    let sampler = PoissonDiscSampler::new(500.0, 500.0, 4.0);
    c.bench_function("poisson_500x500", |b| {
        b.iter(|| black_box(sampler.sample(&mut create_rng(3))).len())
    });
}

/// Benchmark: composite maps and stitched stacks.
fn bench_composite_and_stitching(c: &mut Criterion) {
    let composite = GenerationParams::new("fantasy").with_size(100, 80);
    c.bench_function("composite_100x80", |b| {
        b.iter(|| GeneratorKind::Composite.generate(black_box(7), &composite))
    });

    let base = GenerationParams::new("fantasy");
    c.bench_function("multi_level_5", |b| {
        b.iter(|| generate_multi_level(5, black_box(99), &base))
    });
}

criterion_group!(
    benches,
    bench_single_biome,
    bench_cellular_scaling,
    bench_poisson,
    bench_composite_and_stitching
);
criterion_main!(benches);
