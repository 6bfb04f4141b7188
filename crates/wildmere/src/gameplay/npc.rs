//! # NPC System
//!
//! Per-entity AI for the three NPC archetypes.
//!
//! ## State Machine
//!
//! ```text
//!            timer >= max_state_time              arrived / 15 s
//!   Idle ─────────────────────────> MovingToTarget ──────────────> Idle
//!    │
//!    │ hostile or targeted, player within aggro range
//!    ├──(Villager)──> Fleeing ──(reached flee point / 8 s)──> Idle
//!    │
//!    └──(others)───> ApproachingEnemy ──(within combat range)──> InCombat
//!                         │                                      │
//!                         └── beyond 1.5x aggro / 10 s ──> Idle <─┘ beyond 1.5x aggro
//!                                                                   or player down
//! ```
//!
//! `Wandering` is a continuous velocity walk that no transition enters.
//!
//! ## Invariants
//!
//! - Health stays in `[0, max]`.
//! - `is_active()` is false exactly when health has reached zero.
//! - Inactive NPCs keep their slot; they are skipped, never removed.

use wildmere_procedural::noise::{hash_coords, unit_from_hash};
use wildmere_procedural::{NpcKind, NpcSpawn, TerrainQuery, WorldSeed};
use wildmere_shared::Vec3;

use super::combat::{roll_attack, AttackOutcome, CombatStats, Health, RollSource};
use super::player::{CombatTarget, Player, HIT_FLASH_DURATION};

// ============================================================================
// NPC CONSTANTS
// ============================================================================

/// Seconds of invulnerability after taking damage.
pub const NPC_INVULNERABILITY: f64 = 0.5;

/// Distance at which a wander target counts as reached.
pub const NPC_ARRIVAL_DISTANCE: f32 = 1.0;

/// Give up on a wander target after this long.
pub const MOVE_TIMEOUT: f32 = 15.0;

/// Give up chasing after this long.
pub const APPROACH_TIMEOUT: f32 = 10.0;

/// Stop fleeing after this long.
pub const FLEE_TIMEOUT: f32 = 8.0;

/// Disengage once the player is this many aggro ranges away.
pub const DISENGAGE_FACTOR: f32 = 1.5;

/// How far a villager runs from the spot it was threatened at.
pub const FLEE_DISTANCE: f32 = 12.0;

/// Wander radius bounds around the home point.
pub const WANDER_MIN_RADIUS: f32 = 2.0;
/// Wander radius bounds around the home point.
pub const WANDER_MAX_RADIUS: f32 = 8.0;

const FLEE_SPEED_FACTOR: f32 = 1.5;
const WANDER_STREAM: WorldSeed = WorldSeed::new(0x5741_4e44_4552);
const CHANNEL_ANGLE: u64 = 1;
const CHANNEL_RADIUS: u64 = 2;
const CHANNEL_IDLE: u64 = 3;

// ============================================================================
// NPC PRESETS
// ============================================================================

/// Fixed stats for one archetype.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NpcPreset {
    /// Walking speed, units per second.
    pub speed: f32,
    /// Starting and maximum health.
    pub max_health: f32,
    /// Combat numbers.
    pub combat: CombatStats,
    /// Distance kept from the player while fighting.
    pub combat_range: f32,
    /// Distance at which the player is noticed.
    pub aggro_range: f32,
    /// Base idle duration in seconds.
    pub base_idle_time: f32,
}

impl NpcPreset {
    /// Preset table lookup.
    #[must_use]
    pub const fn for_kind(kind: NpcKind) -> Self {
        match kind {
            NpcKind::Wanderer => Self {
                speed: 2.0,
                max_health: 60.0,
                combat: CombatStats {
                    damage: 8.0,
                    hit_chance: 0.7,
                    dodge_chance: 0.2,
                    attack_cooldown: 1.5,
                },
                combat_range: 2.0,
                aggro_range: 10.0,
                base_idle_time: 3.0,
            },
            NpcKind::Villager => Self {
                speed: 1.5,
                max_health: 40.0,
                combat: CombatStats::passive(0.3),
                combat_range: 2.0,
                aggro_range: 8.0,
                base_idle_time: 5.0,
            },
            NpcKind::Merchant => Self {
                speed: 1.2,
                max_health: 100.0,
                combat: CombatStats {
                    damage: 12.0,
                    hit_chance: 0.8,
                    dodge_chance: 0.25,
                    attack_cooldown: 2.0,
                },
                combat_range: 2.5,
                aggro_range: 12.0,
                base_idle_time: 8.0,
            },
        }
    }
}

// ============================================================================
// AI STATE MACHINE
// ============================================================================

/// AI behavior states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NpcState {
    /// Standing still until the idle timer runs out.
    #[default]
    Idle,
    /// Walking to a wander target.
    MovingToTarget,
    /// Walking with a fixed velocity. No transition enters this state.
    Wandering,
    /// Closing in on the player.
    ApproachingEnemy,
    /// Fighting the player.
    InCombat,
    /// Running away from the player (villagers).
    Fleeing,
}

impl NpcState {
    /// True for the states that track the player.
    #[must_use]
    pub const fn is_hostile_engagement(self) -> bool {
        matches!(self, Self::ApproachingEnemy | Self::InCombat)
    }
}

/// Per-tick inputs shared by every NPC.
pub struct NpcContext<'a> {
    /// Seconds since the last tick.
    pub dt: f32,
    /// Game clock in seconds.
    pub now: f64,
    /// Ground height source.
    pub terrain: &'a dyn TerrainQuery,
    /// Combat rolls.
    pub rolls: &'a mut dyn RollSource,
}

/// Stable slot index of an NPC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NpcId(pub u32);

// ============================================================================
// NPC COMPONENT
// ============================================================================

/// A non-player character.
#[derive(Clone, Debug)]
pub struct Npc {
    /// Slot index.
    pub id: NpcId,
    /// Archetype.
    pub kind: NpcKind,
    /// Stats for the archetype.
    pub preset: NpcPreset,
    /// World position (feet).
    pub position: Vec3,
    /// Velocity applied this tick.
    pub velocity: Vec3,
    /// Heading in radians around the up axis.
    pub yaw: f32,
    /// Spawn point; wander targets are picked around it.
    pub home: Vec3,
    state: NpcState,
    target_position: Vec3,
    health: Health,
    active: bool,
    hostile: bool,
    startled: bool,
    combat_target: Option<CombatTarget>,
    state_timer: f32,
    max_state_time: f32,
    last_attack_time: f64,
    last_damage_time: f64,
    hit_flash: f32,
    seed_offset: i32,
    rolls_drawn: u32,
}

impl Npc {
    /// Creates an idle NPC.
    ///
    /// `jitter` in `[0, 1)` varies the first idle duration.
    #[must_use]
    pub fn new(id: NpcId, kind: NpcKind, position: Vec3, jitter: f32) -> Self {
        let preset = NpcPreset::for_kind(kind);
        Self {
            id,
            kind,
            preset,
            position,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            home: position,
            state: NpcState::Idle,
            target_position: position,
            health: Health::new(preset.max_health),
            active: true,
            hostile: false,
            startled: false,
            combat_target: None,
            state_timer: 0.0,
            max_state_time: preset.base_idle_time * (0.5 + jitter),
            last_attack_time: f64::NEG_INFINITY,
            last_damage_time: f64::NEG_INFINITY,
            hit_flash: 0.0,
            seed_offset: (jitter * 16_777_216.0) as i32,
            rolls_drawn: 0,
        }
    }

    /// Creates an NPC from a spawn descriptor.
    #[must_use]
    pub fn from_spawn(id: NpcId, spawn: &NpcSpawn) -> Self {
        Self::new(id, spawn.kind, spawn.position, spawn.jitter)
    }

    /// Current AI state.
    #[must_use]
    pub const fn state(&self) -> NpcState {
        self.state
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> Health {
        self.health
    }

    /// False once defeated.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// True once damaged (never for villagers).
    #[must_use]
    pub const fn is_hostile(&self) -> bool {
        self.hostile
    }

    /// The player handle this NPC is reacting to.
    #[must_use]
    pub const fn combat_target(&self) -> Option<CombatTarget> {
        self.combat_target
    }

    /// Where the NPC is currently walking.
    #[must_use]
    pub const fn target_position(&self) -> Vec3 {
        self.target_position
    }

    /// Seconds in the current state.
    #[must_use]
    pub const fn state_timer(&self) -> f32 {
        self.state_timer
    }

    /// Remaining hit-flash time.
    #[must_use]
    pub const fn hit_flash(&self) -> f32 {
        self.hit_flash
    }

    /// True if the invulnerability window has passed.
    #[must_use]
    pub fn can_take_damage(&self, now: f64) -> bool {
        now - self.last_damage_time >= NPC_INVULNERABILITY
    }

    /// Applies damage. Returns damage actually taken.
    ///
    /// Health clamps at zero; reaching zero deactivates the NPC for good.
    /// A surviving villager is startled into fleeing, anyone else turns
    /// hostile for good.
    pub fn take_damage(&mut self, amount: f32, now: f64) -> f32 {
        if !self.active || !self.can_take_damage(now) {
            return 0.0;
        }
        let taken = self.health.apply_damage(amount);
        self.last_damage_time = now;
        self.hit_flash = HIT_FLASH_DURATION;

        if self.health.is_depleted() {
            self.active = false;
            self.velocity = Vec3::ZERO;
            self.combat_target = None;
            tracing::info!("{} {} defeated", self.kind.name(), self.id.0);
        } else if self.kind == NpcKind::Villager {
            self.startled = true;
        } else {
            self.turn_hostile();
        }
        taken
    }

    /// Restores health while active.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.active {
            self.health.heal(amount)
        } else {
            0.0
        }
    }

    /// Reacts to being attacked by the player.
    ///
    /// Villagers remember the attacker and flee; everyone else turns
    /// hostile for good.
    pub fn provoke(&mut self, attacker: CombatTarget) {
        if !self.active {
            return;
        }
        self.combat_target = Some(attacker);
        if self.kind != NpcKind::Villager {
            self.turn_hostile();
        }
    }

    fn turn_hostile(&mut self) {
        if !self.hostile {
            self.hostile = true;
            tracing::debug!("{} {} turned hostile", self.kind.name(), self.id.0);
        }
    }

    /// Drops the combat target; engaged NPCs go idle.
    pub fn clear_combat_target(&mut self) {
        self.combat_target = None;
        if self.state.is_hostile_engagement() {
            self.enter(NpcState::Idle);
        }
    }

    /// Walks with a fixed velocity until the idle timer elapses.
    pub fn start_wandering(&mut self, velocity: Vec3) {
        self.velocity = Vec3::new(velocity.x, 0.0, velocity.z);
        self.enter(NpcState::Wandering);
    }

    /// Advances AI by one tick. Returns the outcome of an attack on the
    /// player, if one was made.
    pub fn update(&mut self, ctx: &mut NpcContext<'_>, player: &mut Player) -> Option<AttackOutcome> {
        if !self.active {
            return None;
        }
        let dt = ctx.dt;
        self.hit_flash = (self.hit_flash - dt).max(0.0);
        self.state_timer += dt;

        if let Some(target) = self.combat_target {
            if !player.is_valid_target(target) {
                self.clear_combat_target();
            }
        }

        let distance = self.position.distance_xz(player.position);
        self.check_aggro(distance, player);

        let mut attack = None;
        match self.state {
            NpcState::Idle => {
                self.velocity = Vec3::ZERO;
                if self.state_timer >= self.max_state_time {
                    self.pick_wander_target();
                    self.enter(NpcState::MovingToTarget);
                }
            }
            NpcState::MovingToTarget => {
                let remaining = self.position.distance_xz(self.target_position);
                if remaining < NPC_ARRIVAL_DISTANCE || self.state_timer >= MOVE_TIMEOUT {
                    self.go_idle();
                } else {
                    self.walk_toward(self.target_position, self.preset.speed);
                }
            }
            NpcState::Wandering => {
                if self.state_timer >= self.max_state_time {
                    self.go_idle();
                }
            }
            NpcState::ApproachingEnemy => {
                if distance > self.preset.aggro_range * DISENGAGE_FACTOR || self.state_timer >= APPROACH_TIMEOUT {
                    self.disengage();
                } else if distance <= self.preset.combat_range {
                    self.velocity = Vec3::ZERO;
                    self.enter(NpcState::InCombat);
                } else {
                    self.walk_toward(player.position, self.preset.speed);
                }
            }
            NpcState::InCombat => {
                if player.is_dead() || distance > self.preset.aggro_range * DISENGAGE_FACTOR {
                    self.disengage();
                } else {
                    self.keep_combat_range(player.position, distance);
                    attack = self.try_attack(ctx, player, distance);
                }
            }
            NpcState::Fleeing => {
                let remaining = self.position.distance_xz(self.target_position);
                if remaining < NPC_ARRIVAL_DISTANCE || self.state_timer >= FLEE_TIMEOUT {
                    self.combat_target = None;
                    self.startled = false;
                    self.go_idle();
                } else {
                    self.walk_toward(self.target_position, self.preset.speed * FLEE_SPEED_FACTOR);
                }
            }
        }

        self.position += self.velocity * dt;
        self.position.y = ctx.terrain.height_at(self.position.x, self.position.z);
        attack
    }

    /// Non-combat states react to a nearby player once hostile or targeted.
    fn check_aggro(&mut self, distance: f32, player: &Player) {
        let engaged = matches!(
            self.state,
            NpcState::ApproachingEnemy | NpcState::InCombat | NpcState::Fleeing
        );
        let alerted = self.hostile || self.startled || self.combat_target.is_some();
        if engaged || !alerted || player.is_dead() || distance > self.preset.aggro_range {
            return;
        }

        if self.kind == NpcKind::Villager {
            let away = player.position.direction_xz_to(self.position);
            let away = if away == Vec3::ZERO { Vec3::new(1.0, 0.0, 0.0) } else { away };
            self.target_position = self.position + away * FLEE_DISTANCE;
            self.enter(NpcState::Fleeing);
        } else {
            self.combat_target = Some(player.target_handle());
            self.enter(NpcState::ApproachingEnemy);
        }
    }

    /// Approach, back off or circle to stay near `combat_range`.
    fn keep_combat_range(&mut self, player_pos: Vec3, distance: f32) {
        let range = self.preset.combat_range;
        let toward = self.position.direction_xz_to(player_pos);
        self.yaw = toward.x.atan2(toward.z);

        if distance > range * 1.2 {
            self.velocity = toward * self.preset.speed;
        } else if distance < range * 0.6 {
            self.velocity = -toward * self.preset.speed;
        } else {
            let side = if self.id.0 % 2 == 0 { 1.0 } else { -1.0 };
            let strafe = Vec3::new(-toward.z, 0.0, toward.x) * side;
            self.velocity = strafe * (self.preset.speed * 0.5);
        }
    }

    fn try_attack(&mut self, ctx: &mut NpcContext<'_>, player: &mut Player, distance: f32) -> Option<AttackOutcome> {
        let stats = self.preset.combat;
        if !stats.can_attack()
            || distance > self.preset.combat_range * 1.25
            || ctx.now - self.last_attack_time < f64::from(stats.attack_cooldown)
        {
            return None;
        }
        self.last_attack_time = ctx.now;

        let outcome = roll_attack(&stats, player.combat.dodge_chance, ctx.rolls);
        if let AttackOutcome::Hit { damage } = outcome {
            player.take_damage(damage, ctx.now);
        }
        tracing::debug!("{} {} attacks player: {:?}", self.kind.name(), self.id.0, outcome);
        Some(outcome)
    }

    fn walk_toward(&mut self, target: Vec3, speed: f32) {
        let dir = self.position.direction_xz_to(target);
        self.velocity = dir * speed;
        if dir != Vec3::ZERO {
            self.yaw = dir.x.atan2(dir.z);
        }
    }

    fn disengage(&mut self) {
        self.combat_target = None;
        self.go_idle();
    }

    fn go_idle(&mut self) {
        self.velocity = Vec3::ZERO;
        self.max_state_time = self.preset.base_idle_time * (0.5 + self.roll(CHANNEL_IDLE));
        self.enter(NpcState::Idle);
    }

    fn pick_wander_target(&mut self) {
        let angle = self.roll(CHANNEL_ANGLE) * std::f32::consts::TAU;
        let radius = WANDER_MIN_RADIUS + self.roll(CHANNEL_RADIUS) * (WANDER_MAX_RADIUS - WANDER_MIN_RADIUS);
        self.target_position = Vec3::new(
            self.home.x + angle.cos() * radius,
            self.home.y,
            self.home.z + angle.sin() * radius,
        );
    }

    fn enter(&mut self, state: NpcState) {
        if self.state != state {
            tracing::debug!("{} {}: {:?} -> {:?}", self.kind.name(), self.id.0, self.state, state);
        }
        self.state = state;
        self.state_timer = 0.0;
    }

    /// Per-NPC deterministic value in `[0, 1)`.
    fn roll(&mut self, channel: u64) -> f32 {
        self.rolls_drawn = self.rolls_drawn.wrapping_add(1);
        unit_from_hash(hash_coords(
            WANDER_STREAM,
            self.id.0 as i32,
            self.seed_offset,
            self.rolls_drawn,
            channel,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerSection;
    use crate::gameplay::combat::ScriptedRolls;

    struct Flat;

    impl TerrainQuery for Flat {
        fn try_height_at(&self, _x: f32, _z: f32) -> Option<f32> {
            Some(0.0)
        }
    }

    fn step(npc: &mut Npc, player: &mut Player, rolls: &mut ScriptedRolls, dt: f32, now: f64) -> Option<AttackOutcome> {
        let mut ctx = NpcContext {
            dt,
            now,
            terrain: &Flat,
            rolls,
        };
        npc.update(&mut ctx, player)
    }

    fn player_at(x: f32, z: f32) -> Player {
        Player::new(&PlayerSection::default(), Vec3::new(x, 0.0, z))
    }

    #[test]
    fn test_presets() {
        let w = NpcPreset::for_kind(NpcKind::Wanderer);
        assert_eq!((w.speed, w.max_health, w.aggro_range), (2.0, 60.0, 10.0));
        let v = NpcPreset::for_kind(NpcKind::Villager);
        assert!(!v.combat.can_attack());
        let m = NpcPreset::for_kind(NpcKind::Merchant);
        assert_eq!(m.combat.damage, 12.0);
    }

    #[test]
    fn test_idle_then_wander_then_idle() {
        let mut npc = Npc::new(NpcId(1), NpcKind::Wanderer, Vec3::ZERO, 0.0);
        let mut player = player_at(500.0, 500.0);
        let mut rolls = ScriptedRolls::default();

        // max_state_time = 3.0 * 0.5
        let mut now = 0.0;
        for _ in 0..14 {
            now += 0.1;
            step(&mut npc, &mut player, &mut rolls, 0.1, now);
        }
        assert_eq!(npc.state(), NpcState::Idle);
        for _ in 0..2 {
            now += 0.1;
            step(&mut npc, &mut player, &mut rolls, 0.1, now);
        }
        assert_eq!(npc.state(), NpcState::MovingToTarget);
        let target = npc.target_position();
        let r = target.distance_xz(npc.home);
        assert!((WANDER_MIN_RADIUS - 1e-3..=WANDER_MAX_RADIUS + 1e-3).contains(&r));

        for _ in 0..200 {
            now += 0.1;
            step(&mut npc, &mut player, &mut rolls, 0.1, now);
            if npc.state() == NpcState::Idle {
                break;
            }
        }
        assert_eq!(npc.state(), NpcState::Idle);
        assert!(npc.position.distance_xz(target) < NPC_ARRIVAL_DISTANCE + 0.3);
    }

    #[test]
    fn test_peaceful_npc_ignores_player() {
        let mut npc = Npc::new(NpcId(0), NpcKind::Wanderer, Vec3::ZERO, 0.9);
        let mut player = player_at(3.0, 0.0);
        let mut rolls = ScriptedRolls::default();
        step(&mut npc, &mut player, &mut rolls, 0.1, 0.1);
        assert_eq!(npc.state(), NpcState::Idle);
    }

    #[test]
    fn test_hostile_npc_approaches_then_fights() {
        let mut npc = Npc::new(NpcId(0), NpcKind::Wanderer, Vec3::ZERO, 0.9);
        let mut player = player_at(6.0, 0.0);
        let mut rolls = ScriptedRolls::new([], 0.0);
        npc.provoke(player.target_handle());
        assert!(npc.is_hostile());

        step(&mut npc, &mut player, &mut rolls, 0.1, 0.1);
        assert_eq!(npc.state(), NpcState::ApproachingEnemy);

        let mut now = 0.1;
        while npc.state() == NpcState::ApproachingEnemy && now < 5.0 {
            now += 0.1;
            step(&mut npc, &mut player, &mut rolls, 0.1, now);
        }
        assert_eq!(npc.state(), NpcState::InCombat);
        assert!(npc.position.distance_xz(player.position) <= 2.0 + 1e-3);
    }

    #[test]
    fn test_combat_attack_respects_cooldown() {
        let mut npc = Npc::new(NpcId(0), NpcKind::Wanderer, Vec3::ZERO, 0.5);
        let mut player = player_at(1.5, 0.0);
        // hit 0.1 < 0.7, dodge 0.9 > 0.3 -> hit each time
        let mut rolls = ScriptedRolls::new([0.1, 0.9, 0.1, 0.9], 0.5);
        npc.provoke(player.target_handle());

        // Already inside combat range: approach and engage in one tick.
        assert_eq!(step(&mut npc, &mut player, &mut rolls, 0.1, 0.1), None);
        assert_eq!(npc.state(), NpcState::InCombat);

        let first = step(&mut npc, &mut player, &mut rolls, 0.1, 0.2);
        assert_eq!(first, Some(AttackOutcome::Hit { damage: 8.0 }));
        assert_eq!(player.health().current(), 92.0);

        assert_eq!(step(&mut npc, &mut player, &mut rolls, 0.1, 1.0), None, "still cooling down");
        let second = step(&mut npc, &mut player, &mut rolls, 0.1, 1.8);
        assert!(second.is_some_and(AttackOutcome::is_hit));
        assert_eq!(player.health().current(), 84.0);
    }

    #[test]
    fn test_disengages_when_player_far() {
        let mut npc = Npc::new(NpcId(0), NpcKind::Merchant, Vec3::ZERO, 0.5);
        let mut player = player_at(10.0, 0.0);
        let mut rolls = ScriptedRolls::default();
        npc.provoke(player.target_handle());
        step(&mut npc, &mut player, &mut rolls, 0.1, 0.1);
        assert_eq!(npc.state(), NpcState::ApproachingEnemy);

        player.position = Vec3::new(100.0, 0.0, 0.0);
        step(&mut npc, &mut player, &mut rolls, 0.1, 0.2);
        assert_eq!(npc.state(), NpcState::Idle);
        assert!(npc.combat_target().is_none());
        assert!(npc.is_hostile(), "hostility never reverts");
    }

    #[test]
    fn test_villager_flees_and_never_turns_hostile() {
        let mut npc = Npc::new(NpcId(3), NpcKind::Villager, Vec3::ZERO, 0.5);
        let mut player = player_at(-2.0, 0.0);
        let mut rolls = ScriptedRolls::default();
        npc.provoke(player.target_handle());
        assert!(!npc.is_hostile());

        step(&mut npc, &mut player, &mut rolls, 0.1, 0.1);
        assert_eq!(npc.state(), NpcState::Fleeing);
        assert!(npc.target_position().x > 0.0, "runs away from the player");

        let mut now = 0.1;
        while npc.state() == NpcState::Fleeing && now < 20.0 {
            now += 0.1;
            step(&mut npc, &mut player, &mut rolls, 0.1, now);
        }
        assert_eq!(npc.state(), NpcState::Idle);
        assert!(npc.combat_target().is_none());
        assert!(npc.position.x > 5.0);
    }

    #[test]
    fn test_damage_alone_turns_npc_hostile() {
        let mut npc = Npc::new(NpcId(0), NpcKind::Wanderer, Vec3::ZERO, 0.5);
        let mut player = player_at(4.0, 0.0);
        let mut rolls = ScriptedRolls::default();
        assert_eq!(npc.take_damage(10.0, 1.0), 10.0);
        assert!(npc.is_hostile());

        step(&mut npc, &mut player, &mut rolls, 0.1, 1.1);
        assert_eq!(npc.state(), NpcState::ApproachingEnemy);
        assert_eq!(npc.combat_target(), Some(player.target_handle()));
    }

    #[test]
    fn test_damaged_villager_flees_once() {
        let mut npc = Npc::new(NpcId(3), NpcKind::Villager, Vec3::ZERO, 0.5);
        let mut player = player_at(4.0, 0.0);
        let mut rolls = ScriptedRolls::default();
        npc.take_damage(10.0, 1.0);
        assert!(!npc.is_hostile());

        step(&mut npc, &mut player, &mut rolls, 0.1, 1.1);
        assert_eq!(npc.state(), NpcState::Fleeing);

        let mut now = 1.1;
        while npc.state() == NpcState::Fleeing && now < 20.0 {
            now += 0.1;
            step(&mut npc, &mut player, &mut rolls, 0.1, now);
        }
        assert_eq!(npc.state(), NpcState::Idle);

        // Calm again: the player walking up no longer scares it.
        player.position = npc.position + Vec3::new(2.0, 0.0, 0.0);
        step(&mut npc, &mut player, &mut rolls, 0.1, now + 0.1);
        assert_eq!(npc.state(), NpcState::Idle);
    }

    #[test]
    fn test_stale_target_is_cleared_after_respawn() {
        let mut npc = Npc::new(NpcId(0), NpcKind::Wanderer, Vec3::ZERO, 0.5);
        let mut player = player_at(5.0, 0.0);
        let mut rolls = ScriptedRolls::default();
        npc.provoke(player.target_handle());
        step(&mut npc, &mut player, &mut rolls, 0.1, 0.1);
        assert!(npc.state().is_hostile_engagement());

        player.take_damage(1_000.0, 0.2);
        player.respawn(&Flat);
        player.position = Vec3::new(50.0, 0.0, 0.0);
        step(&mut npc, &mut player, &mut rolls, 0.1, 0.3);
        assert_eq!(npc.state(), NpcState::Idle);
        assert!(npc.combat_target().is_none());
    }

    #[test]
    fn test_wandering_walks_then_idles() {
        let mut npc = Npc::new(NpcId(0), NpcKind::Wanderer, Vec3::ZERO, 0.0);
        let mut player = player_at(500.0, 0.0);
        let mut rolls = ScriptedRolls::default();
        npc.start_wandering(Vec3::new(1.0, 0.0, 0.0));
        step(&mut npc, &mut player, &mut rolls, 1.0, 1.0);
        assert_eq!(npc.state(), NpcState::Wandering);
        assert!((npc.position.x - 1.0).abs() < 1e-5);
        step(&mut npc, &mut player, &mut rolls, 1.0, 2.0);
        assert_eq!(npc.state(), NpcState::Idle);
    }

    #[test]
    fn test_invulnerability_and_defeat() {
        let mut npc = Npc::new(NpcId(0), NpcKind::Wanderer, Vec3::ZERO, 0.5);
        assert_eq!(npc.take_damage(25.0, 1.0), 25.0);
        assert_eq!(npc.take_damage(25.0, 1.3), 0.0, "inside 0.5 s window");
        assert_eq!(npc.take_damage(25.0, 1.6), 25.0);
        assert_eq!(npc.health().current(), 10.0);
        assert_eq!(npc.take_damage(25.0, 2.2), 10.0);
        assert_eq!(npc.health().current(), 0.0);
        assert!(!npc.is_active());
        assert_eq!(npc.heal(10.0), 0.0);

        let mut player = player_at(1.0, 0.0);
        let mut rolls = ScriptedRolls::default();
        let before = npc.position;
        assert_eq!(step(&mut npc, &mut player, &mut rolls, 0.1, 3.0), None);
        assert_eq!(npc.position, before, "inactive NPCs are skipped");
    }
}
