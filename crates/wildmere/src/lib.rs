//! # Wildmere
//!
//! Exploration and survival gameplay on streamed procedural terrain.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               WILDMERE                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐    │
//! │  │  wildmere_      │     │   GameWorld     │     │   render        │    │
//! │  │  procedural     │────>│                 │────>│   (boundary)    │    │
//! │  │                 │     │  • Player       │     │                 │    │
//! │  │  • Height field │     │  • NPC AI       │     │  • Mesh cache   │    │
//! │  │  • Chunks       │<────│  • Combat       │     │  • Instances    │    │
//! │  │  • Spawns       │     │  • Mining       │     │                 │    │
//! │  └─────────────────┘     └────────┬────────┘     └─────────────────┘    │
//! │                                   │                                     │
//! │                          ┌────────┴────────┐                            │
//! │                          │   GameLoop      │                            │
//! │                          │  frame timing   │                            │
//! │                          └─────────────────┘                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: TOML runtime configuration
//! - `gameplay`: combat, NPCs, player, resources, skills
//! - `world`: entity store, commands and the world tick
//! - `picking`: ray against terrain
//! - `render`: renderer boundary
//! - `game_loop`: frame orchestration and timing

pub mod config;
pub mod error;
pub mod game_loop;
pub mod gameplay;
pub mod picking;
pub mod render;
pub mod world;

pub use wildmere_procedural as procedural;
pub use wildmere_shared as shared;

pub use config::WildmereConfig;
pub use error::{ConfigError, ConfigResult};
pub use game_loop::{FrameContext, FrameStats, FrameStatsAccumulator, GameLoop, GameLoopConfig};
pub use picking::ray_terrain_intersection;
pub use render::{entity_instances, entity_transform, ChunkMeshCache, EntityInstance, MeshHandle, RenderBackend};
pub use world::{Command, EntityStore, GameWorld, TickReport};
