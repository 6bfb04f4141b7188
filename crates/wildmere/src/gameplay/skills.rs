//! Skills and inventory.

use serde::{Deserialize, Serialize};
use wildmere_procedural::ResourceKind;

/// Experience needed per level.
pub const XP_PER_LEVEL: u32 = 100;

/// Trainable skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    /// Raises mining damage.
    Mining,
    /// Tracks fighting experience.
    Combat,
}

impl SkillKind {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mining => "Mining",
            Self::Combat => "Combat",
        }
    }
}

/// Experience in one skill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    xp: u32,
}

impl Skill {
    /// Total experience.
    #[must_use]
    pub const fn xp(&self) -> u32 {
        self.xp
    }

    /// `1 + xp / 100`.
    #[must_use]
    pub const fn level(&self) -> u32 {
        1 + self.xp / XP_PER_LEVEL
    }

    /// Adds experience. Returns the new level if it went up.
    pub fn add_xp(&mut self, amount: u32) -> Option<u32> {
        let before = self.level();
        self.xp = self.xp.saturating_add(amount);
        (self.level() > before).then(|| self.level())
    }
}

/// All of the player's skills.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    /// Mining skill.
    pub mining: Skill,
    /// Combat skill.
    pub combat: Skill,
}

impl Skills {
    /// One skill by kind.
    #[must_use]
    pub const fn get(&self, kind: SkillKind) -> &Skill {
        match kind {
            SkillKind::Mining => &self.mining,
            SkillKind::Combat => &self.combat,
        }
    }

    /// Adds experience to a skill, logging level-ups.
    pub fn add_xp(&mut self, kind: SkillKind, amount: u32) -> Option<u32> {
        let skill = match kind {
            SkillKind::Mining => &mut self.mining,
            SkillKind::Combat => &mut self.combat,
        };
        let level = skill.add_xp(amount);
        if let Some(level) = level {
            tracing::info!("{} reached level {}", kind.name(), level);
        }
        level
    }
}

/// Ore counts by kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    counts: [u32; 3],
}

impl Inventory {
    /// Adds ore.
    pub fn add(&mut self, kind: ResourceKind, amount: u32) {
        let slot = &mut self.counts[kind as usize];
        *slot = slot.saturating_add(amount);
    }

    /// Ore held of one kind.
    #[must_use]
    pub const fn count(&self, kind: ResourceKind) -> u32 {
        self.counts[kind as usize]
    }

    /// Ore held across all kinds.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}
