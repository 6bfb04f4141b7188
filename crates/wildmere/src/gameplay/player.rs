//! # Player
//!
//! The single player entity. Lives for the whole session; dying resets
//! health and position in place instead of recreating the player.
//!
//! Movement is target-driven: while a target is set the player walks (or
//! sprints) toward it on the ground plane and clears it on arrival.

use wildmere_procedural::TerrainQuery;
use wildmere_shared::Vec3;

use super::combat::{CombatStats, Health};
use super::npc::NpcId;
use super::resource::ResourceId;
use super::skills::{Inventory, Skills};
use crate::config::PlayerSection;

/// Arrival distance for move targets.
pub const ARRIVAL_DISTANCE: f32 = 0.1;

/// Seconds of invulnerability after taking damage.
pub const PLAYER_INVULNERABILITY: f64 = 1.0;

/// Reach for melee attacks.
pub const PLAYER_ATTACK_RANGE: f32 = 2.5;

/// Reach for mining.
pub const MINING_RANGE: f32 = 3.0;

/// Seconds between mining strikes.
pub const MINING_COOLDOWN: f64 = 1.0;

/// Seconds the hit flash stays visible.
pub const HIT_FLASH_DURATION: f32 = 0.2;

/// Player combat numbers.
pub const PLAYER_COMBAT: CombatStats = CombatStats {
    damage: 15.0,
    hit_chance: 0.85,
    dodge_chance: 0.3,
    attack_cooldown: 1.0,
};

/// Non-owning reference from an NPC to the player.
///
/// Stamped with the player's respawn generation; a target from an older
/// generation no longer refers to anyone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CombatTarget {
    /// Player generation at the time the target was taken.
    pub generation: u32,
}

/// What the player is doing besides walking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayerAction {
    /// Nothing.
    #[default]
    None,
    /// Closing in on and fighting an NPC.
    Attack(NpcId),
    /// Walking to and mining a resource node.
    Mine(ResourceId),
}

/// The player entity.
#[derive(Clone, Debug)]
pub struct Player {
    /// World position (feet).
    pub position: Vec3,
    /// Heading in radians around the up axis.
    pub yaw: f32,
    /// Combat numbers.
    pub combat: CombatStats,
    /// Skill experience.
    pub skills: Skills,
    /// Collected ore.
    pub inventory: Inventory,
    target_position: Vec3,
    has_target: bool,
    sprinting: bool,
    move_speed: f32,
    sprint_speed: f32,
    health: Health,
    action: PlayerAction,
    last_damage_time: f64,
    last_attack_time: f64,
    last_mine_time: f64,
    hit_flash: f32,
    generation: u32,
    deaths: u32,
}

impl Player {
    /// Creates a player at a position.
    #[must_use]
    pub fn new(settings: &PlayerSection, position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            combat: PLAYER_COMBAT,
            skills: Skills::default(),
            inventory: Inventory::default(),
            target_position: position,
            has_target: false,
            sprinting: false,
            move_speed: settings.move_speed,
            sprint_speed: settings.sprint_speed,
            health: Health::new(settings.max_health),
            action: PlayerAction::None,
            last_damage_time: f64::NEG_INFINITY,
            last_attack_time: f64::NEG_INFINITY,
            last_mine_time: f64::NEG_INFINITY,
            hit_flash: 0.0,
            generation: 0,
            deaths: 0,
        }
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> Health {
        self.health
    }

    /// True at zero health, until respawned.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health.is_depleted()
    }

    /// Move target, if any.
    #[must_use]
    pub fn target(&self) -> Option<Vec3> {
        self.has_target.then_some(self.target_position)
    }

    /// Current action.
    #[must_use]
    pub const fn action(&self) -> PlayerAction {
        self.action
    }

    /// Handle NPCs store when they engage the player.
    #[must_use]
    pub const fn target_handle(&self) -> CombatTarget {
        CombatTarget {
            generation: self.generation,
        }
    }

    /// True if a handle still refers to the living player.
    #[must_use]
    pub fn is_valid_target(&self, handle: CombatTarget) -> bool {
        handle.generation == self.generation && !self.is_dead()
    }

    /// Respawn count.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Times the player has died.
    #[must_use]
    pub const fn deaths(&self) -> u32 {
        self.deaths
    }

    /// Remaining hit-flash time.
    #[must_use]
    pub const fn hit_flash(&self) -> f32 {
        self.hit_flash
    }

    /// True while sprint is toggled on.
    #[must_use]
    pub const fn is_sprinting(&self) -> bool {
        self.sprinting
    }

    /// Speed used for the next step.
    #[must_use]
    pub const fn current_speed(&self) -> f32 {
        if self.sprinting {
            self.sprint_speed
        } else {
            self.move_speed
        }
    }

    /// Walks toward a point.
    pub fn set_target(&mut self, target: Vec3) {
        self.target_position = target;
        self.has_target = true;
    }

    /// Stops walking and abandons any action.
    pub fn stop(&mut self) {
        self.has_target = false;
        self.action = PlayerAction::None;
    }

    /// Stops walking but keeps the current action.
    pub fn hold_position(&mut self) {
        self.has_target = false;
    }

    /// Toggles sprinting.
    pub fn set_sprint(&mut self, sprinting: bool) {
        self.sprinting = sprinting;
    }

    /// Starts an action; walking is driven by it from now on.
    pub fn set_action(&mut self, action: PlayerAction) {
        self.action = action;
    }

    /// Advances movement by `dt` seconds and snaps to the ground.
    pub fn update(&mut self, dt: f32, terrain: &dyn TerrainQuery) {
        self.hit_flash = (self.hit_flash - dt).max(0.0);

        if self.has_target {
            let distance = self.position.distance_xz(self.target_position);
            let step = self.current_speed() * dt;
            if distance < ARRIVAL_DISTANCE || step >= distance {
                self.position.x = self.target_position.x;
                self.position.z = self.target_position.z;
                self.has_target = false;
            } else {
                let dir = self.position.direction_xz_to(self.target_position);
                self.position += dir * step;
                self.yaw = dir.x.atan2(dir.z);
            }
        }

        self.position.y = terrain.height_at(self.position.x, self.position.z);
    }

    /// True if the 1 s invulnerability window has passed.
    #[must_use]
    pub fn can_take_damage(&self, now: f64) -> bool {
        now - self.last_damage_time >= PLAYER_INVULNERABILITY
    }

    /// Applies damage unless invulnerable or already dead.
    ///
    /// Returns damage actually taken.
    pub fn take_damage(&mut self, amount: f32, now: f64) -> f32 {
        if self.is_dead() || !self.can_take_damage(now) {
            return 0.0;
        }
        let taken = self.health.apply_damage(amount);
        self.last_damage_time = now;
        self.hit_flash = HIT_FLASH_DURATION;
        if self.is_dead() {
            self.deaths += 1;
            tracing::info!("Player defeated (death #{})", self.deaths);
        }
        taken
    }

    /// Restores health, clamped to maximum. The dead only come back
    /// through [`Player::respawn`].
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.is_dead() {
            return 0.0;
        }
        self.health.heal(amount)
    }

    /// Full health at the world origin. Invalidates every existing
    /// [`CombatTarget`].
    pub fn respawn(&mut self, terrain: &dyn TerrainQuery) {
        self.health.reset();
        self.position = Vec3::new(0.0, terrain.height_at(0.0, 0.0), 0.0);
        self.target_position = self.position;
        self.has_target = false;
        self.action = PlayerAction::None;
        self.hit_flash = 0.0;
        self.generation = self.generation.wrapping_add(1);
        tracing::info!("Player respawned at origin (generation {})", self.generation);
    }

    /// True if the attack cooldown has passed.
    #[must_use]
    pub fn attack_ready(&self, now: f64) -> bool {
        now - self.last_attack_time >= f64::from(self.combat.attack_cooldown)
    }

    /// Marks an attack as made.
    pub fn record_attack(&mut self, now: f64) {
        self.last_attack_time = now;
    }

    /// True if the mining cooldown has passed.
    #[must_use]
    pub fn mine_ready(&self, now: f64) -> bool {
        now - self.last_mine_time >= MINING_COOLDOWN
    }

    /// Marks a mining strike as made.
    pub fn record_mine(&mut self, now: f64) {
        self.last_mine_time = now;
    }

    /// Damage per mining strike: `10 + 2 * (level - 1)`.
    #[must_use]
    pub fn mining_damage(&self) -> f32 {
        10.0 + 2.0 * (self.skills.mining.level() - 1) as f32
    }
}
