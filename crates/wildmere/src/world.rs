//! # Game World
//!
//! Owns every piece of simulation state and advances it one tick at a time.
//!
//! ## Tick Order
//!
//! ```text
//! tick(dt):
//!   1. player action (chase/attack, walk/mine) and movement
//!   2. NPC AI (may damage the player)
//!   3. respawn check: a dead player respawns at the origin and every
//!      NPC drops its combat target
//!   4. chunk streaming around the player (spawns into the entity store)
//!   5. periodic stats log, throttled by the tick counter
//! ```
//!
//! Entities are never removed. Defeated NPCs and depleted nodes stay in
//! their slot, so [`NpcId`] and [`ResourceId`] remain valid forever.
//! NPCs standing on an unloaded chunk are frozen until it loads again.

use wildmere_procedural::{
    ChunkManager, NpcSpawn, ResourceSpawn, SpawnSink, StreamingReport, TerrainQuery,
};
use wildmere_shared::constants::MAX_DELTA_TIME;
use wildmere_shared::{Ray, Vec3};

use crate::config::WildmereConfig;
use crate::gameplay::combat::{roll_attack, AttackOutcome, CombatRng, RollSource};
use crate::gameplay::npc::{Npc, NpcContext, NpcId};
use crate::gameplay::player::{Player, PlayerAction, MINING_RANGE, PLAYER_ATTACK_RANGE};
use crate::gameplay::resource::{MineOutcome, ResourceId, ResourceNode};
use crate::gameplay::skills::SkillKind;
use crate::picking::ray_terrain_intersection;

/// Mining experience per strike.
pub const MINING_XP_PER_STRIKE: u32 = 10;
/// Bonus mining experience for depleting a node.
pub const MINING_XP_PER_DEPLETION: u32 = 25;
/// Combat experience per landed hit.
pub const COMBAT_XP_PER_HIT: u32 = 5;
/// Bonus combat experience for defeating an NPC.
pub const COMBAT_XP_PER_KILL: u32 = 25;

// ============================================================================
// ENTITY STORE
// ============================================================================

/// Append-only collections of spawned entities.
#[derive(Clone, Debug, Default)]
pub struct EntityStore {
    resources: Vec<ResourceNode>,
    npcs: Vec<Npc>,
}

impl EntityStore {
    /// All resource nodes, active or not.
    #[must_use]
    pub fn resources(&self) -> &[ResourceNode] {
        &self.resources
    }

    /// All NPCs, active or not.
    #[must_use]
    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    /// Resource node by id.
    #[must_use]
    pub fn resource(&self, id: ResourceId) -> Option<&ResourceNode> {
        self.resources.get(id.0 as usize)
    }

    /// NPC by id.
    #[must_use]
    pub fn npc(&self, id: NpcId) -> Option<&Npc> {
        self.npcs.get(id.0 as usize)
    }

    /// Mutable NPC by id.
    pub fn npc_mut(&mut self, id: NpcId) -> Option<&mut Npc> {
        self.npcs.get_mut(id.0 as usize)
    }

    /// Mutable resource node by id.
    pub fn resource_mut(&mut self, id: ResourceId) -> Option<&mut ResourceNode> {
        self.resources.get_mut(id.0 as usize)
    }

    /// NPCs still in play.
    pub fn active_npcs(&self) -> impl Iterator<Item = &Npc> {
        self.npcs.iter().filter(|npc| npc.is_active())
    }

    /// Resource nodes not yet depleted.
    pub fn active_resources(&self) -> impl Iterator<Item = &ResourceNode> {
        self.resources.iter().filter(|node| node.is_active())
    }

    /// Closest active NPC within `radius` of a point.
    #[must_use]
    pub fn nearest_npc(&self, position: Vec3, radius: f32) -> Option<NpcId> {
        nearest(self.active_npcs().map(|n| (n.id, n.position)), position, radius)
    }

    /// Closest active resource node within `radius` of a point.
    #[must_use]
    pub fn nearest_resource(&self, position: Vec3, radius: f32) -> Option<ResourceId> {
        nearest(self.active_resources().map(|r| (r.id, r.position)), position, radius)
    }
}

fn nearest<I: Copy>(items: impl Iterator<Item = (I, Vec3)>, position: Vec3, radius: f32) -> Option<I> {
    items
        .map(|(id, p)| (id, p.distance_xz(position)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

impl SpawnSink for EntityStore {
    fn spawn_resource(&mut self, spawn: ResourceSpawn) {
        let id = ResourceId(self.resources.len() as u32);
        self.resources.push(ResourceNode::from_spawn(id, &spawn));
    }

    fn spawn_npc(&mut self, spawn: NpcSpawn) {
        let id = NpcId(self.npcs.len() as u32);
        self.npcs.push(Npc::from_spawn(id, &spawn));
    }
}

// ============================================================================
// COMMANDS AND REPORTS
// ============================================================================

/// Player intent from the input layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Walk to a point.
    MoveTo(Vec3),
    /// Stop walking and cancel the current action.
    Stop,
    /// Toggle sprint.
    SetSprint(bool),
    /// Engage an NPC.
    Attack(NpcId),
    /// Mine a resource node.
    Mine(ResourceId),
    /// Walk to where a picking ray meets the ground.
    ClickTerrain(Ray),
}

/// What happened during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Chunk streaming work done this tick.
    pub streaming: StreamingReport,
    /// Player attack made this tick.
    pub player_attack: Option<AttackOutcome>,
    /// Mining strike made this tick.
    pub mined: Option<MineOutcome>,
    /// Attacks NPCs made on the player.
    pub npc_attacks: u32,
    /// Damage the player took.
    pub damage_taken: f32,
    /// True if the player respawned.
    pub respawned: bool,
}

// ============================================================================
// GAME WORLD
// ============================================================================

/// The whole simulation.
pub struct GameWorld {
    config: WildmereConfig,
    chunks: ChunkManager,
    entities: EntityStore,
    player: Player,
    rolls: Box<dyn RollSource + Send>,
    tick: u64,
    clock: f64,
}

impl GameWorld {
    /// Builds the world around the origin.
    ///
    /// Combat rolls are seeded from `simulation.combat_seed`, or from the
    /// clock when unset.
    #[must_use]
    pub fn new(config: &WildmereConfig) -> Self {
        let rolls = config
            .simulation
            .combat_seed
            .map_or_else(CombatRng::from_clock, CombatRng::from_seed);
        Self::with_rolls(config, rolls)
    }

    /// Builds the world with an explicit roll source.
    pub fn with_rolls(config: &WildmereConfig, rolls: impl RollSource + Send + 'static) -> Self {
        let mut chunks = ChunkManager::new(config.chunk_manager_config());
        let mut entities = EntityStore::default();
        chunks.force_initial_chunk_load(0.0, 0.0, &mut entities);

        let spawn = Vec3::new(0.0, chunks.height_at(0.0, 0.0), 0.0);
        let player = Player::new(&config.player, spawn);

        tracing::info!(
            "World ready: {} chunks, {} resources, {} NPCs",
            chunks.loaded_count(),
            entities.resources.len(),
            entities.npcs.len()
        );
        Self {
            config: *config,
            chunks,
            entities,
            player,
            rolls: Box::new(rolls),
            tick: 0,
            clock: 0.0,
        }
    }

    /// Runtime configuration.
    #[must_use]
    pub const fn config(&self) -> &WildmereConfig {
        &self.config
    }

    /// Loaded terrain.
    #[must_use]
    pub const fn chunks(&self) -> &ChunkManager {
        &self.chunks
    }

    /// Spawned entities.
    #[must_use]
    pub const fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Mutable entities, for scripted scenarios.
    pub fn entities_mut(&mut self) -> &mut EntityStore {
        &mut self.entities
    }

    /// The player.
    #[must_use]
    pub const fn player(&self) -> &Player {
        &self.player
    }

    /// Mutable player, for scripted scenarios.
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Game clock in seconds.
    #[must_use]
    pub const fn clock(&self) -> f64 {
        self.clock
    }

    /// Applies a player command. Returns false if it was rejected.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::MoveTo(target) => {
                self.player.set_action(PlayerAction::None);
                self.player.set_target(target);
                true
            }
            Command::Stop => {
                self.player.stop();
                true
            }
            Command::SetSprint(on) => {
                self.player.set_sprint(on);
                true
            }
            Command::Attack(id) => {
                let valid = self.entities.npc(id).is_some_and(Npc::is_active);
                if valid {
                    self.player.set_action(PlayerAction::Attack(id));
                } else {
                    tracing::debug!("Ignoring attack on unknown or defeated NPC {}", id.0);
                }
                valid
            }
            Command::Mine(id) => {
                let valid = self.entities.resource(id).is_some_and(ResourceNode::is_active);
                if valid {
                    self.player.set_action(PlayerAction::Mine(id));
                } else {
                    tracing::debug!("Ignoring mine on unknown or depleted node {}", id.0);
                }
                valid
            }
            Command::ClickTerrain(ray) => match ray_terrain_intersection(&ray, &self.chunks) {
                Some(point) => self.apply(Command::MoveTo(point)),
                None => false,
            },
        }
    }

    /// Advances the simulation by `dt` seconds (clamped to
    /// [`MAX_DELTA_TIME`]).
    pub fn tick(&mut self, dt: f32) -> TickReport {
        let dt = dt.clamp(0.0, MAX_DELTA_TIME);
        self.tick += 1;
        self.clock += f64::from(dt);
        let now = self.clock;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        // 1. Player
        self.drive_player_action(now, &mut report);
        self.player.update(dt, &self.chunks);

        // 2. NPCs
        let health_before = self.player.health().current();
        let chunks = &self.chunks;
        let terrain = StreamedTerrain(chunks);
        let mut ctx = NpcContext {
            dt,
            now,
            terrain: &terrain,
            rolls: self.rolls.as_mut(),
        };
        for npc in &mut self.entities.npcs {
            if !on_loaded_ground(chunks, npc.position) {
                continue;
            }
            if npc.update(&mut ctx, &mut self.player).is_some() {
                report.npc_attacks += 1;
            }
        }
        report.damage_taken = health_before - self.player.health().current();

        // 3. Respawn
        if self.player.is_dead() {
            self.player.respawn(&self.chunks);
            for npc in &mut self.entities.npcs {
                npc.clear_combat_target();
            }
            report.respawned = true;
        }

        // 4. Streaming
        report.streaming =
            self.chunks
                .update_chunks_around_player(self.player.position.x, self.player.position.z, &mut self.entities);
        if !report.streaming.is_noop() {
            self.player.position.y = self.chunks.height_at(self.player.position.x, self.player.position.z);
        }

        // 5. Stats
        let interval = self.config.simulation.stats_interval_ticks;
        if interval > 0 && self.tick % interval == 0 {
            self.log_stats();
        }
        report
    }

    /// True if the chunk under `position` is loaded. Entities elsewhere
    /// are neither simulated nor drawn.
    #[must_use]
    pub fn is_on_loaded_ground(&self, position: Vec3) -> bool {
        on_loaded_ground(&self.chunks, position)
    }

    /// Logs a one-line summary of world state.
    pub fn log_stats(&self) {
        let stats = self.chunks.stats();
        let p = self.player.position;
        tracing::info!(
            "tick {} t={:.1}s | player ({:.1}, {:.1}, {:.1}) hp {:.0} | chunks {} (crossings {}) | npcs {}/{} | resources {}/{} | ore {}",
            self.tick,
            self.clock,
            p.x,
            p.y,
            p.z,
            self.player.health().current(),
            self.chunks.loaded_count(),
            stats.boundary_crossings,
            self.entities.active_npcs().count(),
            self.entities.npcs.len(),
            self.entities.active_resources().count(),
            self.entities.resources.len(),
            self.player.inventory.total()
        );
    }

    fn drive_player_action(&mut self, now: f64, report: &mut TickReport) {
        match self.player.action() {
            PlayerAction::None => {}
            PlayerAction::Attack(id) => report.player_attack = self.drive_attack(id, now),
            PlayerAction::Mine(id) => report.mined = self.drive_mining(id, now),
        }
    }

    fn drive_attack(&mut self, id: NpcId, now: f64) -> Option<AttackOutcome> {
        let Some(npc) = self.entities.npcs.get_mut(id.0 as usize).filter(|n| n.is_active()) else {
            self.player.set_action(PlayerAction::None);
            return None;
        };
        if self.player.position.distance_xz(npc.position) > PLAYER_ATTACK_RANGE {
            self.player.set_target(npc.position);
            return None;
        }
        self.player.hold_position();
        if !self.player.attack_ready(now) {
            return None;
        }
        self.player.record_attack(now);

        let outcome = roll_attack(&self.player.combat, npc.preset.combat.dodge_chance, self.rolls.as_mut());
        if let AttackOutcome::Hit { damage } = outcome {
            if npc.take_damage(damage, now) > 0.0 {
                self.player.skills.add_xp(SkillKind::Combat, COMBAT_XP_PER_HIT);
            }
            npc.provoke(self.player.target_handle());
            if !npc.is_active() {
                self.player.skills.add_xp(SkillKind::Combat, COMBAT_XP_PER_KILL);
                self.player.set_action(PlayerAction::None);
            }
        }
        tracing::debug!("Player attacks {} {}: {:?}", npc.kind.name(), id.0, outcome);
        Some(outcome)
    }

    fn drive_mining(&mut self, id: ResourceId, now: f64) -> Option<MineOutcome> {
        let Some(node) = self.entities.resources.get_mut(id.0 as usize).filter(|n| n.is_active()) else {
            self.player.set_action(PlayerAction::None);
            return None;
        };
        if self.player.position.distance_xz(node.position) > MINING_RANGE {
            self.player.set_target(node.position);
            return None;
        }
        self.player.hold_position();
        if !self.player.mine_ready(now) {
            return None;
        }
        self.player.record_mine(now);

        let outcome = node.mine(self.player.mining_damage());
        match outcome {
            MineOutcome::Damaged { .. } => {
                self.player.skills.add_xp(SkillKind::Mining, MINING_XP_PER_STRIKE);
            }
            MineOutcome::Depleted { kind, amount } => {
                self.player
                    .skills
                    .add_xp(SkillKind::Mining, MINING_XP_PER_STRIKE + MINING_XP_PER_DEPLETION);
                self.player.inventory.add(kind, amount);
                self.player.set_action(PlayerAction::None);
                tracing::info!("Mined {} {} ore", amount, kind.name());
            }
            MineOutcome::Inactive => {}
        }
        Some(outcome)
    }
}

fn on_loaded_ground(chunks: &ChunkManager, position: Vec3) -> bool {
    chunks.is_loaded(chunks.chunk_coord_of(position.x, position.z))
}

/// Loaded chunks first, the height function where nothing is loaded.
///
/// An NPC can step off loaded ground during a tick; it lands on the real
/// surface instead of the 0.0 fallback and freezes there.
struct StreamedTerrain<'a>(&'a ChunkManager);

impl TerrainQuery for StreamedTerrain<'_> {
    fn try_height_at(&self, world_x: f32, world_z: f32) -> Option<f32> {
        let chunks = self.0;
        Some(
            chunks
                .try_height_at(world_x, world_z)
                .unwrap_or_else(|| chunks.generator().height(world_x, world_z)),
        )
    }
}

impl TerrainQuery for GameWorld {
    fn try_height_at(&self, world_x: f32, world_z: f32) -> Option<f32> {
        self.chunks.try_height_at(world_x, world_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::combat::ScriptedRolls;
    use wildmere_procedural::{NpcKind, ResourceKind};

    fn world() -> GameWorld {
        GameWorld::with_rolls(&WildmereConfig::default(), ScriptedRolls::new([], 0.5))
    }

    #[test]
    fn test_world_starts_on_loaded_ground() {
        let w = world();
        assert_eq!(w.chunks().loaded_count(), 25);
        let p = w.player().position;
        assert_eq!(p.y, w.chunks().height_at(0.0, 0.0));
        assert_eq!(w.tick_count(), 0);
    }

    #[test]
    fn test_spawn_ids_match_slots() {
        let w = world();
        for (i, npc) in w.entities().npcs().iter().enumerate() {
            assert_eq!(npc.id, NpcId(i as u32));
        }
        for (i, node) in w.entities().resources().iter().enumerate() {
            assert_eq!(node.id, ResourceId(i as u32));
        }
    }

    #[test]
    fn test_move_command_walks_player() {
        let mut w = world();
        assert!(w.apply(Command::MoveTo(Vec3::new(4.0, 0.0, 0.0))));
        for _ in 0..20 {
            w.tick(0.05);
        }
        let p = w.player().position;
        assert!((p.x - 4.0).abs() < 1e-4);
        assert_eq!(p.y, w.chunks().height_at(p.x, p.z));
        assert!((w.clock() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut w = world();
        w.tick(5.0);
        assert!((w.clock() - f64::from(MAX_DELTA_TIME)).abs() < 1e-9);
    }

    #[test]
    fn test_commands_on_missing_entities_are_rejected() {
        let mut w = world();
        assert!(!w.apply(Command::Attack(NpcId(u32::MAX))));
        assert!(!w.apply(Command::Mine(ResourceId(u32::MAX))));
        assert_eq!(w.player().action(), PlayerAction::None);
    }

    #[test]
    fn test_npcs_on_unloaded_chunks_are_frozen() {
        let mut w = world();
        let far = Vec3::new(1_000.0, 0.0, 0.0);
        let chunk = w.chunks().chunk_coord_of(far.x, far.z);
        w.entities_mut().spawn_npc(NpcSpawn {
            kind: NpcKind::Wanderer,
            position: far,
            chunk,
            jitter: 0.0,
        });
        let id = NpcId(w.entities().npcs().len() as u32 - 1);
        if let Some(npc) = w.entities_mut().npc_mut(id) {
            npc.start_wandering(Vec3::new(1.0, 0.0, 0.0));
        }
        assert!(!w.is_on_loaded_ground(far));

        for _ in 0..10 {
            w.tick(0.1);
        }
        let npc = w.entities().npc(id).map(|n| (n.position, n.state_timer()));
        assert_eq!(npc, Some((far, 0.0)));
    }

    #[test]
    fn test_npc_stepping_off_loaded_ground_keeps_real_height() {
        let w = world();
        // Chunks -2..=2 are loaded around the origin.
        let edge = 3.0 * w.config().layout().world_size() + 3.0;
        let terrain = StreamedTerrain(w.chunks());
        assert_eq!(w.chunks().try_height_at(edge, 0.0), None);
        assert_eq!(terrain.height_at(edge, 0.0), w.chunks().generator().height(edge, 0.0));
    }

    #[test]
    fn test_entity_store_appends() {
        let mut store = EntityStore::default();
        store.spawn_resource(ResourceSpawn {
            kind: ResourceKind::Iron,
            position: Vec3::new(1.0, 0.0, 1.0),
            chunk: wildmere_procedural::ChunkCoord::new(0, 0),
        });
        store.spawn_npc(NpcSpawn {
            kind: NpcKind::Merchant,
            position: Vec3::new(5.0, 0.0, 5.0),
            chunk: wildmere_procedural::ChunkCoord::new(0, 0),
            jitter: 0.25,
        });
        assert_eq!(store.resource(ResourceId(0)).map(|r| r.kind), Some(ResourceKind::Iron));
        assert_eq!(store.nearest_npc(Vec3::new(4.0, 0.0, 4.0), 3.0), Some(NpcId(0)));
        assert_eq!(store.nearest_npc(Vec3::ZERO, 3.0), None);
        assert_eq!(store.nearest_resource(Vec3::ZERO, 3.0), Some(ResourceId(0)));
    }
}
