//! # Renderer Boundary
//!
//! The simulation never talks to a graphics API. A renderer implements
//! [`RenderBackend`] and receives:
//!
//! - chunk meshes, as vertex and index slices, kept in step with the
//!   loaded chunk set by [`ChunkMeshCache`]
//! - per-frame entity batches of [`EntityInstance`] (`Pod`, ready to copy
//!   into an instance buffer)

use std::collections::{HashMap, HashSet};

use bytemuck::{Pod, Zeroable};
use wildmere_procedural::{ChunkCoord, ChunkKey, ChunkManager, NpcKind, ResourceKind, TerrainVertex};
use wildmere_shared::{Quaternion, Transform, Vec3};

use crate::gameplay::player::HIT_FLASH_DURATION;
use crate::world::GameWorld;

/// Opaque renderer-side mesh id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// What the simulation needs from a renderer.
pub trait RenderBackend {
    /// Uploads a chunk mesh. `None` means the upload failed; the chunk is
    /// then drawn without terrain until it reloads.
    fn create_chunk_mesh(
        &mut self,
        coord: ChunkCoord,
        vertices: &[TerrainVertex],
        indices: &[u32],
    ) -> Option<MeshHandle>;

    /// Releases a chunk mesh.
    fn destroy_chunk_mesh(&mut self, handle: MeshHandle);
}

/// Mesh changes made by one [`ChunkMeshCache::sync`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshSyncReport {
    /// Meshes uploaded.
    pub created: usize,
    /// Meshes released.
    pub destroyed: usize,
    /// Uploads the backend refused.
    pub failed: usize,
}

/// Renderer handles for the currently loaded chunks.
#[derive(Debug, Default)]
pub struct ChunkMeshCache {
    meshes: HashMap<ChunkKey, MeshHandle>,
    failed: HashSet<ChunkKey>,
}

impl ChunkMeshCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live meshes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// True if no meshes are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Handle for a chunk, if uploaded.
    #[must_use]
    pub fn handle(&self, coord: ChunkCoord) -> Option<MeshHandle> {
        self.meshes.get(&coord.key()).copied()
    }

    /// Releases meshes of unloaded chunks and uploads new ones.
    ///
    /// A chunk whose upload failed is not retried while it stays loaded.
    pub fn sync(&mut self, chunks: &ChunkManager, backend: &mut dyn RenderBackend) -> MeshSyncReport {
        let mut report = MeshSyncReport::default();

        self.meshes.retain(|key, handle| {
            let keep = chunks.is_loaded(key.unpack());
            if !keep {
                backend.destroy_chunk_mesh(*handle);
                report.destroyed += 1;
            }
            keep
        });
        self.failed.retain(|key| chunks.is_loaded(key.unpack()));

        for chunk in chunks.chunks() {
            let key = chunk.key();
            if self.meshes.contains_key(&key) || self.failed.contains(&key) {
                continue;
            }
            match backend.create_chunk_mesh(chunk.coord(), chunk.vertices(), chunk.indices()) {
                Some(handle) => {
                    self.meshes.insert(key, handle);
                    report.created += 1;
                }
                None => {
                    tracing::warn!(
                        "Mesh upload failed for chunk ({}, {}); drawing without it",
                        chunk.coord().x,
                        chunk.coord().z
                    );
                    self.failed.insert(key);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Releases every mesh.
    pub fn clear(&mut self, backend: &mut dyn RenderBackend) {
        for (_, handle) in self.meshes.drain() {
            backend.destroy_chunk_mesh(handle);
        }
        self.failed.clear();
    }
}

/// Backend that keeps no GPU state; hands out sequential handles and
/// counts uploaded geometry. Used by the headless binary.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_handle: u64,
    live: usize,
    /// Vertices uploaded so far.
    pub vertices_uploaded: usize,
    /// Indices uploaded so far.
    pub indices_uploaded: usize,
}

impl HeadlessBackend {
    /// Meshes created and not yet destroyed.
    #[must_use]
    pub const fn live_meshes(&self) -> usize {
        self.live
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_chunk_mesh(
        &mut self,
        _coord: ChunkCoord,
        vertices: &[TerrainVertex],
        indices: &[u32],
    ) -> Option<MeshHandle> {
        self.next_handle += 1;
        self.live += 1;
        self.vertices_uploaded += vertices.len();
        self.indices_uploaded += indices.len();
        Some(MeshHandle(self.next_handle))
    }

    fn destroy_chunk_mesh(&mut self, _handle: MeshHandle) {
        self.live = self.live.saturating_sub(1);
    }
}

// ============================================================================
// ENTITY INSTANCES
// ============================================================================

/// Unit-cube scale for the player.
pub const PLAYER_SCALE: f32 = 1.0;
/// Unit-cube scale for NPCs.
pub const NPC_SCALE: f32 = 0.9;
/// Unit-cube scale for resource nodes.
pub const RESOURCE_SCALE: f32 = 0.6;

const PLAYER_COLOR: [f32; 4] = [0.2, 0.4, 0.9, 1.0];
const FLASH_COLOR: [f32; 4] = [1.0, 0.15, 0.15, 1.0];

/// Per-instance GPU data: model matrix and tint.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct EntityInstance {
    /// Column-major model matrix.
    pub model: [[f32; 4]; 4],
    /// RGBA tint.
    pub color: [f32; 4],
}

/// World matrix for a unit cube standing at `position`.
#[must_use]
pub fn entity_transform(position: Vec3, yaw: f32, scale: f32) -> [[f32; 4]; 4] {
    Transform::new(position, Quaternion::from_yaw(yaw), scale).to_matrix()
}

/// NPC tint by archetype.
#[must_use]
pub const fn npc_color(kind: NpcKind) -> [f32; 4] {
    match kind {
        NpcKind::Wanderer => [0.8, 0.5, 0.2, 1.0],
        NpcKind::Villager => [0.3, 0.8, 0.3, 1.0],
        NpcKind::Merchant => [0.7, 0.3, 0.8, 1.0],
    }
}

/// Resource tint by ore.
#[must_use]
pub const fn resource_color(kind: ResourceKind) -> [f32; 4] {
    match kind {
        ResourceKind::Copper => [0.85, 0.45, 0.2, 1.0],
        ResourceKind::Iron => [0.6, 0.6, 0.65, 1.0],
        ResourceKind::Stone => [0.5, 0.5, 0.45, 1.0],
    }
}

/// Blends toward red while a hit flash is running.
fn flash_tint(base: [f32; 4], flash: f32) -> [f32; 4] {
    let t = (flash / HIT_FLASH_DURATION).clamp(0.0, 1.0);
    std::array::from_fn(|i| base[i] + (FLASH_COLOR[i] - base[i]) * t)
}

/// Instance batch for everything visible this frame: the player first,
/// then active NPCs, then active resource nodes, skipping anything on an
/// unloaded chunk.
#[must_use]
pub fn entity_instances(world: &GameWorld) -> Vec<EntityInstance> {
    let entities = world.entities();
    let player = world.player();
    let mut out = Vec::with_capacity(1 + entities.npcs().len() + entities.resources().len());

    out.push(EntityInstance {
        model: entity_transform(player.position, player.yaw, PLAYER_SCALE),
        color: flash_tint(PLAYER_COLOR, player.hit_flash()),
    });
    let visible = |position: Vec3| world.is_on_loaded_ground(position);
    out.extend(entities.active_npcs().filter(|npc| visible(npc.position)).map(|npc| EntityInstance {
        model: entity_transform(npc.position, npc.yaw, NPC_SCALE),
        color: flash_tint(npc_color(npc.kind), npc.hit_flash()),
    }));
    out.extend(entities.active_resources().filter(|node| visible(node.position)).map(|node| EntityInstance {
        model: entity_transform(node.position, 0.0, RESOURCE_SCALE),
        color: resource_color(node.kind),
    }));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WildmereConfig;
    use crate::gameplay::combat::ScriptedRolls;
    use wildmere_procedural::{ChunkManagerConfig, NoSpawn};

    #[derive(Default)]
    struct FlakyBackend {
        inner: HeadlessBackend,
        refuse: Option<ChunkCoord>,
        destroyed: Vec<MeshHandle>,
    }

    impl RenderBackend for FlakyBackend {
        fn create_chunk_mesh(
            &mut self,
            coord: ChunkCoord,
            vertices: &[TerrainVertex],
            indices: &[u32],
        ) -> Option<MeshHandle> {
            if self.refuse == Some(coord) {
                return None;
            }
            self.inner.create_chunk_mesh(coord, vertices, indices)
        }

        fn destroy_chunk_mesh(&mut self, handle: MeshHandle) {
            self.destroyed.push(handle);
            self.inner.destroy_chunk_mesh(handle);
        }
    }

    #[test]
    fn test_cache_follows_loaded_chunks() {
        let mut manager = ChunkManager::new(ChunkManagerConfig::default());
        let mut backend = FlakyBackend::default();
        let mut cache = ChunkMeshCache::new();

        manager.force_initial_chunk_load(0.0, 0.0, &mut NoSpawn);
        let report = cache.sync(&manager, &mut backend);
        assert_eq!(report.created, 25);
        assert_eq!(cache.len(), 25);
        assert_eq!(backend.inner.vertices_uploaded, 25 * 65 * 65);

        assert_eq!(cache.sync(&manager, &mut backend), MeshSyncReport::default());

        // Jump to chunk (4, 0): columns -2..=0 unload, 3..=6 load
        manager.update_chunks_around_player(32.0 * 4.0 + 1.0, 0.0, &mut NoSpawn);
        let report = cache.sync(&manager, &mut backend);
        assert_eq!(report.destroyed, 15);
        assert_eq!(report.created, 20);
        assert_eq!(cache.len(), manager.loaded_count());
        assert_eq!(backend.inner.live_meshes(), cache.len());
    }

    #[test]
    fn test_failed_upload_is_not_retried() {
        let mut manager = ChunkManager::new(ChunkManagerConfig::default());
        let mut backend = FlakyBackend {
            refuse: Some(ChunkCoord::new(1, 1)),
            ..FlakyBackend::default()
        };
        let mut cache = ChunkMeshCache::new();
        manager.force_initial_chunk_load(0.0, 0.0, &mut NoSpawn);

        let report = cache.sync(&manager, &mut backend);
        assert_eq!((report.created, report.failed), (24, 1));
        assert!(cache.handle(ChunkCoord::new(1, 1)).is_none());
        assert_eq!(cache.sync(&manager, &mut backend).failed, 0);

        cache.clear(&mut backend);
        assert!(cache.is_empty());
        assert_eq!(backend.destroyed.len(), 24);
    }

    #[test]
    fn test_entity_transform_places_and_scales() {
        let m = entity_transform(Vec3::new(1.0, 2.0, 3.0), 0.0, 0.5);
        assert_eq!(m[3], [1.0, 2.0, 3.0, 1.0]);
        assert!((m[0][0] - 0.5).abs() < 1e-6);
        assert!((m[1][1] - 0.5).abs() < 1e-6);

        let turned = entity_transform(Vec3::ZERO, std::f32::consts::FRAC_PI_2, 1.0);
        // +X maps to -Z after a quarter turn around +Y
        assert!(turned[0][0].abs() < 1e-6);
        assert!((turned[0][2] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_instances_skip_inactive_entities() {
        let mut world = GameWorld::with_rolls(&WildmereConfig::default(), ScriptedRolls::default());
        let npcs = world.entities().npcs().len();
        let resources = world.entities().resources().len();
        assert_eq!(entity_instances(&world).len(), 1 + npcs + resources);

        if let Some(npc) = world.entities_mut().npc_mut(crate::gameplay::npc::NpcId(0)) {
            npc.take_damage(10_000.0, 1.0);
            assert_eq!(entity_instances(&world).len(), npcs + resources);
        }
        let instances = entity_instances(&world);
        let bytes: &[u8] = bytemuck::cast_slice(&instances[..1]);
        assert_eq!(bytes.len(), std::mem::size_of::<EntityInstance>());
    }

    #[test]
    fn test_instances_skip_unloaded_chunks() {
        use wildmere_procedural::{NpcSpawn, SpawnSink};

        let mut world = GameWorld::with_rolls(&WildmereConfig::default(), ScriptedRolls::default());
        let before = entity_instances(&world).len();
        let far = Vec3::new(-2_000.0, 0.0, 40.0);
        let chunk = world.chunks().chunk_coord_of(far.x, far.z);
        world.entities_mut().spawn_npc(NpcSpawn {
            kind: NpcKind::Merchant,
            position: far,
            chunk,
            jitter: 0.5,
        });
        assert_eq!(entity_instances(&world).len(), before);
    }

    #[test]
    fn test_flash_tint_blends() {
        assert_eq!(flash_tint(PLAYER_COLOR, 0.0), PLAYER_COLOR);
        let full = flash_tint(PLAYER_COLOR, HIT_FLASH_DURATION);
        for (a, b) in full.iter().zip(FLASH_COLOR) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
