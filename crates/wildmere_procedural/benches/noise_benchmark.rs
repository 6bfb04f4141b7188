//! Benchmark for height-field sampling.
//!
//! TARGET: 1,000,000 blended height samples per second
//!
//! Run with: cargo bench --package wildmere_procedural --bench noise_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use wildmere_procedural::{BiomeClassifier, HeightFieldGenerator, NoiseField};

fn benchmark_base_noise(c: &mut Criterion) {
    let noise = NoiseField::new();

    c.bench_function("base_noise_sample", |b| {
        let mut x = 0.0f32;
        b.iter(|| {
            x += 0.1;
            black_box(noise.base(black_box(x), black_box(x * 0.7)))
        });
    });
}

fn benchmark_biome_weights(c: &mut Criterion) {
    let classifier = BiomeClassifier::new();

    c.bench_function("biome_weights", |b| {
        let mut x = 0.0f32;
        b.iter(|| {
            x += 1.3;
            black_box(classifier.weights(black_box(x), black_box(-x)))
        });
    });
}

fn benchmark_million_heights(c: &mut Criterion) {
    let gen = HeightFieldGenerator::new();

    let mut group = c.benchmark_group("million_heights");
    group.throughput(Throughput::Elements(1_000_000));
    group.sample_size(10);

    group.bench_function("1M_height_samples", |b| {
        b.iter(|| {
            for i in 0..1_000_000 {
                let x = (i % 1000) as f32 * 0.5;
                let z = (i / 1000) as f32 * 0.5;
                black_box(gen.height(x, z));
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_base_noise,
    benchmark_biome_weights,
    benchmark_million_heights
);
criterion_main!(benches);
