//! # Wildmere Procedural Terrain
//!
//! Deterministic terrain for an endless world.
//!
//! ## Design Principles
//!
//! 1. **Pure**: height is a function of world `(x, z)` only
//! 2. **Chunked**: the world is generated in fixed-size square tiles
//! 3. **Seamless**: neighbouring tiles agree on shared edges without talking
//! 4. **Streamable**: tiles load and unload around the player on demand
//!
//! ## Core Components
//!
//! - [`NoiseField`]: sine/cosine octave composition
//! - [`BiomeClassifier`]: smooth biome weights and hard spawn categories
//! - [`HeightFieldGenerator`]: biome-blended terrain height
//! - [`TerrainChunk`]: vertex grid, triangle list, validation
//! - [`ChunkManager`]: streaming, height queries, spawn orchestration
//! - [`SpawnGenerator`]: per-chunk resource and NPC placement
//! - [`ChunkWorkerPool`]: optional background generation
//!
//! ## Example
//!
//! ```rust
//! use wildmere_procedural::{ChunkManager, NoSpawn};
//!
//! let mut manager = ChunkManager::default();
//! manager.force_initial_chunk_load(0.0, 0.0, &mut NoSpawn);
//! assert_eq!(manager.loaded_count(), 25);
//!
//! // Moving inside the same chunk does nothing.
//! let report = manager.update_chunks_around_player(5.0, 5.0, &mut NoSpawn);
//! assert!(report.is_noop());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod biome;
pub mod chunk;
pub mod chunk_manager;
pub mod heightfield;
pub mod noise;
pub mod spawn;
pub mod worker;

pub use biome::{Biome, BiomeClassifier, BiomeWeights};
pub use chunk::{ChunkCoord, ChunkKey, ChunkLayout, ChunkValidation, TerrainChunk, TerrainVertex};
pub use chunk_manager::{
    ChunkManager, ChunkManagerConfig, RespawnPolicy, StreamingReport, StreamingStats, TerrainQuery,
};
pub use heightfield::{BiomeHeightProfile, HeightFieldGenerator, HeightSample};
pub use noise::{NoiseField, WorldSeed};
pub use spawn::{
    NoSpawn, NpcKind, NpcSpawn, ResourceKind, ResourceSpawn, SpawnBuffer, SpawnGenerator, SpawnSink, SpawnTable,
};
pub use worker::ChunkWorkerPool;
