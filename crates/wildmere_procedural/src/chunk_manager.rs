//! # Chunk Manager
//!
//! Keeps the square neighborhood around the player loaded and answers
//! every terrain height query gameplay makes.
//!
//! ## Streaming
//!
//! ```text
//!   load radius   = render_distance        (5x5 at the default of 2)
//!   unload radius = render_distance + 1    (one chunk of hysteresis)
//! ```
//!
//! Work only happens when the player crosses a chunk boundary. Walking
//! around inside one chunk is a no-op, and stepping back and forth across
//! a border never unloads the chunk just left.
//!
//! ## Spawning
//!
//! Each chunk inserted into the map is handed to the spawn generator, and
//! the results are appended to a caller-supplied [`SpawnSink`]. Whether a
//! reloaded key spawns again is decided by [`RespawnPolicy`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use wildmere_shared::RENDER_DISTANCE;

use crate::biome::Biome;
use crate::chunk::{ChunkCoord, ChunkKey, ChunkLayout, TerrainChunk};
use crate::heightfield::HeightFieldGenerator;
use crate::noise::WorldSeed;
use crate::spawn::{SpawnGenerator, SpawnSink};
use crate::worker::ChunkWorkerPool;

/// Read-only terrain height surface used by gameplay and picking.
pub trait TerrainQuery {
    /// Height at world coordinates, 0.0 where nothing is known.
    fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        self.try_height_at(world_x, world_z).unwrap_or(0.0)
    }

    /// Height at world coordinates, `None` where nothing is known.
    fn try_height_at(&self, world_x: f32, world_z: f32) -> Option<f32>;
}

impl TerrainQuery for HeightFieldGenerator {
    fn try_height_at(&self, world_x: f32, world_z: f32) -> Option<f32> {
        Some(self.height(world_x, world_z))
    }
}

/// What happens to entities when a previously loaded chunk loads again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RespawnPolicy {
    /// Spawn every time the chunk is created, including reloads.
    #[default]
    EveryLoad,
    /// Spawn only the first time a chunk key is ever created.
    OncePerKey,
}

/// Streaming parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkManagerConfig {
    /// Chunk dimensions.
    pub layout: ChunkLayout,
    /// Chebyshev load radius in chunks.
    pub render_distance: i32,
    /// Reload spawn behavior.
    pub respawn_policy: RespawnPolicy,
    /// Seed for spawn placement.
    pub seed: WorldSeed,
}

impl Default for ChunkManagerConfig {
    fn default() -> Self {
        Self {
            layout: ChunkLayout::default(),
            render_distance: RENDER_DISTANCE,
            respawn_policy: RespawnPolicy::default(),
            seed: WorldSeed::default(),
        }
    }
}

/// Outcome of one streaming call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingReport {
    /// Chunks created and inserted.
    pub loaded: usize,
    /// Chunks removed.
    pub unloaded: usize,
    /// Chunks handed to a worker pool.
    pub requested: usize,
}

impl StreamingReport {
    /// True if nothing changed.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.loaded == 0 && self.unloaded == 0 && self.requested == 0
    }
}

/// Running totals since the manager was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingStats {
    /// Chunk boundaries the player crossed.
    pub boundary_crossings: u64,
    /// Chunks inserted into the map.
    pub chunks_loaded: u64,
    /// Chunks removed from the map.
    pub chunks_unloaded: u64,
    /// Worker results dropped because the player moved away first.
    pub stale_results: u64,
    /// Resource nodes spawned.
    pub resources_spawned: u64,
    /// NPCs spawned.
    pub npcs_spawned: u64,
}

/// Owner of all loaded chunks.
#[derive(Debug)]
pub struct ChunkManager {
    config: ChunkManagerConfig,
    generator: HeightFieldGenerator,
    spawner: SpawnGenerator,
    chunks: HashMap<ChunkKey, TerrainChunk>,
    player_chunk: Option<ChunkCoord>,
    visited: HashSet<ChunkKey>,
    stats: StreamingStats,
}

impl Default for ChunkManager {
    fn default() -> Self {
        Self::new(ChunkManagerConfig::default())
    }
}

impl ChunkManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new(config: ChunkManagerConfig) -> Self {
        Self::with_generator(config, HeightFieldGenerator::new())
    }

    /// Creates an empty manager with a custom height field.
    #[must_use]
    pub fn with_generator(config: ChunkManagerConfig, generator: HeightFieldGenerator) -> Self {
        Self {
            config,
            generator,
            spawner: SpawnGenerator::new(config.seed),
            chunks: HashMap::new(),
            player_chunk: None,
            visited: HashSet::new(),
            stats: StreamingStats::default(),
        }
    }

    /// Streaming parameters.
    #[must_use]
    pub const fn config(&self) -> &ChunkManagerConfig {
        &self.config
    }

    /// Chunk dimensions.
    #[must_use]
    pub const fn layout(&self) -> ChunkLayout {
        self.config.layout
    }

    /// The height field chunks are generated from.
    #[must_use]
    pub const fn generator(&self) -> &HeightFieldGenerator {
        &self.generator
    }

    /// Chunks beyond this Chebyshev distance are unloaded.
    #[must_use]
    pub const fn unload_distance(&self) -> i32 {
        self.config.render_distance + 1
    }

    /// Chunk the player was last seen in.
    #[must_use]
    pub const fn player_chunk(&self) -> Option<ChunkCoord> {
        self.player_chunk
    }

    /// Totals since creation.
    #[must_use]
    pub const fn stats(&self) -> StreamingStats {
        self.stats
    }

    /// Number of chunks in the map.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.chunks.len()
    }

    /// True if the chunk is in the map.
    #[must_use]
    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord.key())
    }

    /// A loaded chunk.
    #[must_use]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&TerrainChunk> {
        self.chunks.get(&coord.key())
    }

    /// All loaded chunks, in no particular order.
    pub fn chunks(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.chunks.values()
    }

    /// Coordinates of all loaded chunks, sorted.
    #[must_use]
    pub fn loaded_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self.chunks.keys().map(|k| k.unpack()).collect();
        coords.sort_unstable();
        coords
    }

    /// Chunk containing a world position.
    #[must_use]
    pub fn chunk_coord_of(&self, world_x: f32, world_z: f32) -> ChunkCoord {
        self.config.layout.chunk_coord_of(world_x, world_z)
    }

    /// Discrete biome of a loaded chunk.
    #[must_use]
    pub fn biome_for_chunk(&self, coord: ChunkCoord) -> Option<Biome> {
        self.chunk(coord).map(TerrainChunk::biome)
    }

    /// Discrete biome at any world position, loaded or not.
    #[must_use]
    pub fn biome_at(&self, world_x: f32, world_z: f32) -> Biome {
        self.generator.classifier().classify(world_x, world_z)
    }

    /// Loads the full neighborhood around the player, skipping only chunks
    /// already present. Used once at startup and after teleports.
    pub fn force_initial_chunk_load(
        &mut self,
        player_x: f32,
        player_z: f32,
        sink: &mut dyn SpawnSink,
    ) -> StreamingReport {
        let center = self.chunk_coord_of(player_x, player_z);
        self.player_chunk = Some(center);
        let loaded = self.load_neighborhood(center, sink);

        tracing::info!(
            "Initial load around chunk ({}, {}): {} chunks",
            center.x,
            center.z,
            loaded
        );
        StreamingReport {
            loaded,
            ..StreamingReport::default()
        }
    }

    /// Streams chunks after the player moved.
    ///
    /// No-op unless the player is in a different chunk than last time.
    pub fn update_chunks_around_player(
        &mut self,
        player_x: f32,
        player_z: f32,
        sink: &mut dyn SpawnSink,
    ) -> StreamingReport {
        let Some(center) = self.cross_boundary(player_x, player_z) else {
            return StreamingReport::default();
        };

        let loaded = self.load_neighborhood(center, sink);
        let unloaded = self.unload_distant(center);

        tracing::info!(
            "Entered chunk ({}, {}): loaded {}, unloaded {}, {} resident",
            center.x,
            center.z,
            loaded,
            unloaded,
            self.chunks.len()
        );
        StreamingReport {
            loaded,
            unloaded,
            requested: 0,
        }
    }

    /// Like [`Self::update_chunks_around_player`], but hands missing chunks
    /// to a worker pool instead of generating them here.
    ///
    /// Unloading still happens immediately. Finished chunks enter the map
    /// through [`Self::integrate_completed`].
    pub fn request_chunks_around_player(
        &mut self,
        player_x: f32,
        player_z: f32,
        pool: &mut ChunkWorkerPool,
    ) -> StreamingReport {
        let Some(center) = self.cross_boundary(player_x, player_z) else {
            return StreamingReport::default();
        };

        let requested = center
            .neighborhood(self.config.render_distance)
            .filter(|coord| !self.is_loaded(*coord))
            .filter(|coord| pool.submit(*coord))
            .count();
        let unloaded = self.unload_distant(center);

        tracing::info!(
            "Entered chunk ({}, {}): requested {}, unloaded {}",
            center.x,
            center.z,
            requested,
            unloaded
        );
        StreamingReport {
            loaded: 0,
            unloaded,
            requested,
        }
    }

    /// Moves finished worker results into the map.
    ///
    /// Results for chunks already loaded, or now beyond the unload radius,
    /// are dropped.
    pub fn integrate_completed(&mut self, pool: &mut ChunkWorkerPool, sink: &mut dyn SpawnSink) -> StreamingReport {
        let mut report = StreamingReport::default();
        for chunk in pool.drain_completed() {
            let wanted = self
                .player_chunk
                .is_some_and(|center| center.chebyshev_distance(chunk.coord()) <= self.unload_distance());
            if !wanted || self.chunks.contains_key(&chunk.key()) {
                self.stats.stale_results += 1;
                continue;
            }
            self.insert_chunk(chunk, sink);
            report.loaded += 1;
        }
        if report.loaded > 0 {
            tracing::debug!("Integrated {} chunks from workers", report.loaded);
        }
        report
    }

    /// Terrain height, 0.0 when the owning chunk is not loaded.
    #[must_use]
    pub fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        self.try_height_at(world_x, world_z).unwrap_or(0.0)
    }

    /// Terrain height, `None` when the owning chunk is not loaded.
    #[must_use]
    pub fn try_height_at(&self, world_x: f32, world_z: f32) -> Option<f32> {
        self.chunk(self.chunk_coord_of(world_x, world_z))?
            .try_height_at(world_x, world_z)
    }

    /// Drops every chunk and forgets the player position.
    pub fn clear(&mut self) {
        self.stats.chunks_unloaded += self.chunks.len() as u64;
        self.chunks.clear();
        self.player_chunk = None;
    }

    /// Records the player's chunk and returns it if it changed.
    fn cross_boundary(&mut self, player_x: f32, player_z: f32) -> Option<ChunkCoord> {
        let center = self.chunk_coord_of(player_x, player_z);
        if self.player_chunk == Some(center) {
            return None;
        }
        self.player_chunk = Some(center);
        self.stats.boundary_crossings += 1;
        Some(center)
    }

    fn load_neighborhood(&mut self, center: ChunkCoord, sink: &mut dyn SpawnSink) -> usize {
        let mut loaded = 0;
        for coord in center.neighborhood(self.config.render_distance) {
            if self.is_loaded(coord) {
                continue;
            }
            let chunk = TerrainChunk::generated(coord, self.config.layout, &self.generator);
            self.insert_chunk(chunk, sink);
            loaded += 1;
        }
        loaded
    }

    fn unload_distant(&mut self, center: ChunkCoord) -> usize {
        let limit = self.unload_distance();
        let before = self.chunks.len();
        self.chunks
            .retain(|key, _| key.unpack().chebyshev_distance(center) <= limit);
        let unloaded = before - self.chunks.len();
        self.stats.chunks_unloaded += unloaded as u64;
        unloaded
    }

    fn insert_chunk(&mut self, chunk: TerrainChunk, sink: &mut dyn SpawnSink) {
        let key = chunk.key();
        let first_visit = self.visited.insert(key);
        let spawn = match self.config.respawn_policy {
            RespawnPolicy::EveryLoad => true,
            RespawnPolicy::OncePerKey => first_visit,
        };
        if spawn {
            let (resources, npcs) = self.spawner.populate(&chunk, sink);
            self.stats.resources_spawned += resources as u64;
            self.stats.npcs_spawned += npcs as u64;
        }
        self.chunks.insert(key, chunk);
        self.stats.chunks_loaded += 1;
    }
}

impl TerrainQuery for ChunkManager {
    fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        Self::height_at(self, world_x, world_z)
    }

    fn try_height_at(&self, world_x: f32, world_z: f32) -> Option<f32> {
        Self::try_height_at(self, world_x, world_z)
    }
}
