//! Benchmark for chunk generation and streaming.
//!
//! TARGET: a 5x5 initial load well under one 60 Hz frame budget per chunk
//!
//! Run with: cargo bench --package wildmere_procedural --bench chunk_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use wildmere_procedural::{ChunkCoord, ChunkLayout, ChunkManager, HeightFieldGenerator, NoSpawn, TerrainChunk};

fn benchmark_single_chunk(c: &mut Criterion) {
    let gen = HeightFieldGenerator::new();
    let layout = ChunkLayout::default();

    c.bench_function("single_chunk_generation", |b| {
        let mut coord = 0i32;
        b.iter(|| {
            coord = coord.wrapping_add(1);
            black_box(TerrainChunk::generated(ChunkCoord::new(coord, coord / 2), layout, &gen))
        });
    });
}

fn benchmark_initial_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming");
    group.throughput(Throughput::Elements(25));
    group.sample_size(20);

    group.bench_function("initial_5x5_load", |b| {
        b.iter(|| {
            let mut manager = ChunkManager::default();
            black_box(manager.force_initial_chunk_load(0.0, 0.0, &mut NoSpawn))
        });
    });

    group.bench_function("boundary_crossing", |b| {
        let mut manager = ChunkManager::default();
        manager.force_initial_chunk_load(0.0, 0.0, &mut NoSpawn);
        let mut x = 16.0f32;
        b.iter(|| {
            x += 32.0;
            black_box(manager.update_chunks_around_player(x, 16.0, &mut NoSpawn))
        });
    });

    group.finish();
}

fn benchmark_height_queries(c: &mut Criterion) {
    let mut manager = ChunkManager::default();
    manager.force_initial_chunk_load(0.0, 0.0, &mut NoSpawn);

    c.bench_function("chunk_manager_height_at", |b| {
        let mut t = 0.0f32;
        b.iter(|| {
            t = (t + 0.37) % 150.0;
            black_box(manager.height_at(black_box(t - 75.0), black_box(75.0 - t)))
        });
    });
}

criterion_group!(
    benches,
    benchmark_single_chunk,
    benchmark_initial_load,
    benchmark_height_queries
);
criterion_main!(benches);
