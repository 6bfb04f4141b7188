//! # Chunk Streaming Integration Test
//!
//! Proves the loaded set follows the player with one chunk of hysteresis
//! and that the player never stands on unloaded ground.

use std::time::{Duration, Instant};

use wildmere_procedural::{
    ChunkCoord, ChunkManager, ChunkManagerConfig, ChunkWorkerPool, NoSpawn, SpawnBuffer,
};

/// Test: moving inside one chunk never loads or unloads anything.
#[test]
fn test_no_work_inside_chunk() {
    let mut manager = ChunkManager::default();
    manager.force_initial_chunk_load(16.0, 16.0, &mut NoSpawn);
    let before = manager.stats();

    for step in 0..300 {
        let t = step as f32 * 0.1;
        let report = manager.update_chunks_around_player(1.0 + t, 31.0 - t, &mut NoSpawn);
        assert!(report.is_noop(), "step {step} did work: {report:?}");
    }

    assert_eq!(manager.stats(), before);
    assert_eq!(manager.loaded_count(), 25);
}

/// Test: crossing east loads exactly the uncovered column and unloads only
/// chunks beyond the hysteresis ring.
#[test]
fn test_crossing_loads_new_column() {
    let mut manager = ChunkManager::default();
    manager.force_initial_chunk_load(16.0, 16.0, &mut NoSpawn);
    let before = manager.loaded_coords();

    // (0,0) -> (1,0): column x=3 is new, x=-2 is still within distance 3.
    let report = manager.update_chunks_around_player(48.0, 16.0, &mut NoSpawn);
    assert_eq!(report.loaded, 5);
    assert_eq!(report.unloaded, 0);
    assert_eq!(manager.loaded_count(), 30);
    for z in -2..=2 {
        assert!(manager.is_loaded(ChunkCoord::new(3, z)));
    }
    for coord in before {
        assert!(manager.is_loaded(coord), "{coord:?} should still be loaded");
    }

    // (1,0) -> (2,0): column x=4 is new, x=-2 is now at distance 4.
    let report = manager.update_chunks_around_player(80.0, 16.0, &mut NoSpawn);
    assert_eq!(report.loaded, 5);
    assert_eq!(report.unloaded, 5);
    for z in -2..=2 {
        assert!(!manager.is_loaded(ChunkCoord::new(-2, z)));
        assert!(manager.is_loaded(ChunkCoord::new(4, z)));
    }
}

/// Test: stepping back and forth across a border does not thrash.
#[test]
fn test_border_oscillation_is_cheap() {
    let mut manager = ChunkManager::default();
    manager.force_initial_chunk_load(31.0, 16.0, &mut NoSpawn);
    manager.update_chunks_around_player(33.0, 16.0, &mut NoSpawn);
    let loaded_after_first_cross = manager.stats().chunks_loaded;

    for i in 0..20 {
        let x = if i % 2 == 0 { 31.0 } else { 33.0 };
        let report = manager.update_chunks_around_player(x, 16.0, &mut NoSpawn);
        assert_eq!(report.loaded, 0);
        assert_eq!(report.unloaded, 0);
    }
    assert_eq!(manager.stats().chunks_loaded, loaded_after_first_cross);
    assert_eq!(manager.stats().boundary_crossings, 21);
}

/// Test: walk 3,000 units diagonally without ever leaving loaded terrain.
#[test]
fn test_long_walk_stays_on_loaded_ground() {
    let mut manager = ChunkManager::default();
    manager.force_initial_chunk_load(0.0, 0.0, &mut NoSpawn);

    let start = Instant::now();
    for step in 0..3_000 {
        let p = step as f32;
        manager.update_chunks_around_player(p, -p * 0.5, &mut NoSpawn);
        assert!(
            manager.try_height_at(p, -p * 0.5).is_some(),
            "no ground under the player at step {step}"
        );
        assert!(manager.loaded_count() <= 49, "{} chunks resident", manager.loaded_count());
    }
    println!("Walked 3,000 units in {:?}", start.elapsed());
    println!("Stats: {:?}", manager.stats());
}

/// Test: spawns are produced for each newly created chunk.
#[test]
fn test_spawns_follow_new_chunks() {
    let mut manager = ChunkManager::default();
    let mut sink = SpawnBuffer::default();
    manager.force_initial_chunk_load(0.0, 0.0, &mut sink);

    let stats = manager.stats();
    assert_eq!(stats.resources_spawned as usize, sink.resources.len());
    assert_eq!(stats.npcs_spawned as usize, sink.npcs.len());

    let before = sink.resources.len() + sink.npcs.len();
    manager.update_chunks_around_player(5.0, 7.0, &mut sink);
    assert_eq!(sink.resources.len() + sink.npcs.len(), before, "same chunk spawns nothing");

    for r in &sink.resources {
        let h = manager.height_at(r.position.x, r.position.z);
        assert!((r.position.y - h).abs() < 1e-4);
    }
}

/// Test: worker-pool streaming converges to the same chunk set.
#[test]
fn test_worker_pool_matches_synchronous_streaming() {
    let config = ChunkManagerConfig::default();
    let mut sync = ChunkManager::new(config);
    let mut pooled = ChunkManager::new(config);
    let mut pool = ChunkWorkerPool::new(3, config.layout, *pooled.generator());

    for &(x, z) in &[(0.0, 0.0), (40.0, 0.0), (40.0, 70.0)] {
        sync.update_chunks_around_player(x, z, &mut NoSpawn);
        pooled.request_chunks_around_player(x, z, &mut pool);
    }

    let deadline = Instant::now() + Duration::from_secs(60);
    while pool.pending_count() > 0 && Instant::now() < deadline {
        pooled.integrate_completed(&mut pool, &mut NoSpawn);
        std::thread::sleep(Duration::from_millis(2));
    }

    // The pool may have finished chunks the player has since walked away
    // from; those are discarded, so only the wanted set remains.
    let center = sync.player_chunk().unwrap();
    for coord in center.neighborhood(config.render_distance) {
        assert!(pooled.is_loaded(coord), "{coord:?} missing from pooled manager");
        assert_eq!(
            pooled.chunk(coord).unwrap().vertices(),
            sync.chunk(coord).unwrap().vertices()
        );
    }
}
