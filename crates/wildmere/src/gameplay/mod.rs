//! # Gameplay Systems
//!
//! Entities that live on top of the streamed terrain:
//! - Combat resolution shared by everyone
//! - NPCs and their AI state machine
//! - The player
//! - Resource nodes, skills and inventory

pub mod combat;
pub mod npc;
pub mod player;
pub mod resource;
pub mod skills;

pub use combat::{
    resolve_attack, roll_attack, AttackOutcome, AttackRolls, CombatRng, CombatStats, Health, RollSource, ScriptedRolls,
};
pub use npc::{Npc, NpcContext, NpcId, NpcPreset, NpcState};
pub use player::{CombatTarget, Player, PlayerAction, PLAYER_ATTACK_RANGE, MINING_RANGE};
pub use resource::{MineOutcome, ResourceId, ResourceNode};
pub use skills::{Inventory, Skill, SkillKind, Skills};
