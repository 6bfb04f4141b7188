//! # Spawn Generation
//!
//! Populates a freshly created chunk with resource nodes and NPCs.
//!
//! Every decision is a hash of `(seed, chunk_x, chunk_z, attempt, channel)`,
//! so the same chunk coordinates always yield the same entities. There is
//! no global random state and no "already spawned" memory here; callers
//! decide when to run generation (see [`crate::RespawnPolicy`]).
//!
//! ```text
//! for attempt in 0..table.attempts:
//!     roll = unit(hash(.., attempt, ACCEPT))
//!     if roll > table.threshold:
//!         x, z  = chunk origin + unit(hash(.., X|Z)) * chunk world size
//!         y     = chunk height at (x, z)
//!         kind  = weighted pick by unit(hash(.., KIND))
//! ```

use serde::{Deserialize, Serialize};
use wildmere_shared::Vec3;

use crate::biome::Biome;
use crate::chunk::{ChunkCoord, TerrainChunk};
use crate::noise::{hash_coords, unit_from_hash, WorldSeed};

const RESOURCE_STREAM: u64 = 0x5245_534f;
const NPC_STREAM: u64 = 0x004e_5043;

const CHANNEL_ACCEPT: u64 = 1;
const CHANNEL_X: u64 = 2;
const CHANNEL_Z: u64 = 3;
const CHANNEL_KIND: u64 = 4;
const CHANNEL_IDLE: u64 = 5;

/// Mineable ore type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResourceKind {
    /// Common surface ore.
    Copper = 0,
    /// Mountain ore.
    Iron = 1,
    /// Plain rock.
    Stone = 2,
}

impl ResourceKind {
    /// All kinds, in table order.
    pub const ALL: [Self; 3] = [Self::Copper, Self::Iron, Self::Stone];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Copper => "Copper",
            Self::Iron => "Iron",
            Self::Stone => "Stone",
        }
    }
}

/// NPC archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NpcKind {
    /// Roaming fighter.
    Wanderer = 0,
    /// Harmless local; flees instead of fighting.
    Villager = 1,
    /// Slow, tough trader.
    Merchant = 2,
}

impl NpcKind {
    /// All kinds, in table order.
    pub const ALL: [Self; 3] = [Self::Wanderer, Self::Villager, Self::Merchant];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wanderer => "Wanderer",
            Self::Villager => "Villager",
            Self::Merchant => "Merchant",
        }
    }
}

/// Per-biome spawn density.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnTable {
    /// Deterministic attempts per chunk.
    pub attempts: u32,
    /// An attempt spawns when its roll exceeds this.
    pub threshold: f32,
    /// Relative weight per kind, in `ALL` order.
    pub weights: [u32; 3],
}

impl SpawnTable {
    /// Resource density for a biome.
    #[must_use]
    pub const fn resources(biome: Biome) -> Self {
        match biome {
            Biome::Swamp => Self { attempts: 2, threshold: 0.75, weights: [1, 1, 3] },
            Biome::Desert => Self { attempts: 4, threshold: 0.55, weights: [5, 1, 4] },
            Biome::Grassland => Self { attempts: 4, threshold: 0.6, weights: [3, 1, 4] },
            Biome::Mountains => Self { attempts: 8, threshold: 0.35, weights: [2, 5, 3] },
        }
    }

    /// NPC density for a biome.
    #[must_use]
    pub const fn npcs(biome: Biome) -> Self {
        match biome {
            Biome::Swamp => Self { attempts: 1, threshold: 0.8, weights: [6, 2, 0] },
            Biome::Desert => Self { attempts: 2, threshold: 0.7, weights: [5, 1, 2] },
            Biome::Grassland => Self { attempts: 3, threshold: 0.55, weights: [3, 5, 2] },
            Biome::Mountains => Self { attempts: 2, threshold: 0.75, weights: [6, 1, 1] },
        }
    }

    /// Index into `weights` for a roll in `[0, 1)`.
    fn pick(&self, roll: f32) -> usize {
        let total: u32 = self.weights.iter().sum();
        if total == 0 {
            return 0;
        }
        let mut target = roll * total as f32;
        for (i, &w) in self.weights.iter().enumerate() {
            if target < w as f32 {
                return i;
            }
            target -= w as f32;
        }
        self.weights.iter().rposition(|&w| w > 0).unwrap_or(0)
    }
}

/// A resource node to be created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResourceSpawn {
    /// Ore type.
    pub kind: ResourceKind,
    /// World position on the terrain surface.
    pub position: Vec3,
    /// Chunk that produced it.
    pub chunk: ChunkCoord,
}

/// An NPC to be created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NpcSpawn {
    /// Archetype.
    pub kind: NpcKind,
    /// World position on the terrain surface.
    pub position: Vec3,
    /// Chunk that produced it.
    pub chunk: ChunkCoord,
    /// Per-entity value in `[0, 1)` used to vary idle durations.
    pub jitter: f32,
}

/// Receives entities produced when a chunk is created.
///
/// The chunk manager only appends through this trait; it never owns or
/// reads back the collections behind it.
pub trait SpawnSink {
    /// A resource node was generated.
    fn spawn_resource(&mut self, spawn: ResourceSpawn);
    /// An NPC was generated.
    fn spawn_npc(&mut self, spawn: NpcSpawn);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSpawn;

impl SpawnSink for NoSpawn {
    fn spawn_resource(&mut self, _spawn: ResourceSpawn) {}
    fn spawn_npc(&mut self, _spawn: NpcSpawn) {}
}

/// Collects spawns into vectors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpawnBuffer {
    /// Generated resources, in spawn order.
    pub resources: Vec<ResourceSpawn>,
    /// Generated NPCs, in spawn order.
    pub npcs: Vec<NpcSpawn>,
}

impl SpawnSink for SpawnBuffer {
    fn spawn_resource(&mut self, spawn: ResourceSpawn) {
        self.resources.push(spawn);
    }

    fn spawn_npc(&mut self, spawn: NpcSpawn) {
        self.npcs.push(spawn);
    }
}

/// Deterministic per-chunk entity placement.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpawnGenerator {
    seed: WorldSeed,
}

impl SpawnGenerator {
    /// Creates a generator for a world seed.
    #[must_use]
    pub const fn new(seed: WorldSeed) -> Self {
        Self { seed }
    }

    /// The seed placement is keyed on.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Resource nodes for a generated chunk.
    #[must_use]
    pub fn resources(&self, chunk: &TerrainChunk) -> Vec<ResourceSpawn> {
        let seed = self.seed.derive(RESOURCE_STREAM);
        let table = SpawnTable::resources(chunk.biome());
        self.accepted(seed, chunk, &table)
            .map(|(attempt, position)| {
                let roll = self.roll(seed, chunk.coord(), attempt, CHANNEL_KIND);
                ResourceSpawn {
                    kind: ResourceKind::ALL[table.pick(roll)],
                    position,
                    chunk: chunk.coord(),
                }
            })
            .collect()
    }

    /// NPCs for a generated chunk.
    #[must_use]
    pub fn npcs(&self, chunk: &TerrainChunk) -> Vec<NpcSpawn> {
        let seed = self.seed.derive(NPC_STREAM);
        let table = SpawnTable::npcs(chunk.biome());
        self.accepted(seed, chunk, &table)
            .map(|(attempt, position)| {
                let roll = self.roll(seed, chunk.coord(), attempt, CHANNEL_KIND);
                NpcSpawn {
                    kind: NpcKind::ALL[table.pick(roll)],
                    position,
                    chunk: chunk.coord(),
                    jitter: self.roll(seed, chunk.coord(), attempt, CHANNEL_IDLE),
                }
            })
            .collect()
    }

    /// Runs both generators and feeds the results to a sink.
    ///
    /// Returns `(resources, npcs)` spawned.
    pub fn populate(&self, chunk: &TerrainChunk, sink: &mut dyn SpawnSink) -> (usize, usize) {
        let resources = self.resources(chunk);
        let npcs = self.npcs(chunk);
        let counts = (resources.len(), npcs.len());
        for spawn in resources {
            sink.spawn_resource(spawn);
        }
        for spawn in npcs {
            sink.spawn_npc(spawn);
        }
        if counts != (0, 0) {
            tracing::debug!(
                "Chunk ({}, {}) [{}]: spawned {} resources, {} NPCs",
                chunk.coord().x,
                chunk.coord().z,
                chunk.biome().name(),
                counts.0,
                counts.1
            );
        }
        counts
    }

    #[inline]
    fn roll(&self, seed: WorldSeed, coord: ChunkCoord, attempt: u32, channel: u64) -> f32 {
        unit_from_hash(hash_coords(seed, coord.x, coord.z, attempt, channel))
    }

    /// Accepted attempts with their surface positions.
    fn accepted<'a>(
        &'a self,
        seed: WorldSeed,
        chunk: &'a TerrainChunk,
        table: &'a SpawnTable,
    ) -> impl Iterator<Item = (u32, Vec3)> + 'a {
        let coord = chunk.coord();
        let layout = chunk.layout();
        let (origin_x, origin_z) = layout.origin(coord);
        let size = layout.world_size();

        (0..table.attempts)
            .filter(move |&attempt| self.roll(seed, coord, attempt, CHANNEL_ACCEPT) > table.threshold)
            .map(move |attempt| {
                let x = origin_x + self.roll(seed, coord, attempt, CHANNEL_X) * size;
                let z = origin_z + self.roll(seed, coord, attempt, CHANNEL_Z) * size;
                (attempt, Vec3::new(x, chunk.height_at(x, z), z))
            })
    }
}
