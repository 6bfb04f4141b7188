//! # Resource Nodes
//!
//! Mineable ore deposits placed by chunk spawn generation. A node loses
//! health to mining strikes and goes permanently inactive when depleted;
//! it is never removed from its collection, so ids stay valid.

use wildmere_procedural::{ResourceKind, ResourceSpawn};
use wildmere_shared::Vec3;

use super::combat::Health;

/// Stable slot index of a resource node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u32);

/// Health of a fresh node.
#[must_use]
pub const fn node_health(kind: ResourceKind) -> f32 {
    match kind {
        ResourceKind::Copper => 30.0,
        ResourceKind::Iron => 50.0,
        ResourceKind::Stone => 20.0,
    }
}

/// Ore granted when a node is depleted.
#[must_use]
pub const fn ore_yield(kind: ResourceKind) -> u32 {
    match kind {
        ResourceKind::Copper => 2,
        ResourceKind::Iron => 1,
        ResourceKind::Stone => 3,
    }
}

/// Result of one mining strike.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MineOutcome {
    /// Node took damage and is still standing.
    Damaged {
        /// Health left.
        remaining: f32,
    },
    /// Node broke on this strike.
    Depleted {
        /// Ore type.
        kind: ResourceKind,
        /// Ore granted.
        amount: u32,
    },
    /// Node was already depleted.
    Inactive,
}

/// A mineable deposit.
#[derive(Clone, Debug)]
pub struct ResourceNode {
    /// Slot index.
    pub id: ResourceId,
    /// Ore type.
    pub kind: ResourceKind,
    /// World position on the terrain.
    pub position: Vec3,
    health: Health,
    active: bool,
}

impl ResourceNode {
    /// Creates a full-health node.
    #[must_use]
    pub fn new(id: ResourceId, kind: ResourceKind, position: Vec3) -> Self {
        Self {
            id,
            kind,
            position,
            health: Health::new(node_health(kind)),
            active: true,
        }
    }

    /// Creates a node from a spawn descriptor.
    #[must_use]
    pub fn from_spawn(id: ResourceId, spawn: &ResourceSpawn) -> Self {
        Self::new(id, spawn.kind, spawn.position)
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> Health {
        self.health
    }

    /// False once depleted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Applies one strike.
    pub fn mine(&mut self, damage: f32) -> MineOutcome {
        if !self.active {
            return MineOutcome::Inactive;
        }
        self.health.apply_damage(damage);
        if self.health.is_depleted() {
            self.active = false;
            tracing::debug!("{} node {} depleted", self.kind.name(), self.id.0);
            MineOutcome::Depleted {
                kind: self.kind,
                amount: ore_yield(self.kind),
            }
        } else {
            MineOutcome::Damaged {
                remaining: self.health.current(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mining_depletes_once() {
        let mut node = ResourceNode::new(ResourceId(0), ResourceKind::Copper, Vec3::ZERO);
        assert_eq!(node.mine(10.0), MineOutcome::Damaged { remaining: 20.0 });
        assert_eq!(node.mine(10.0), MineOutcome::Damaged { remaining: 10.0 });
        assert_eq!(
            node.mine(12.0),
            MineOutcome::Depleted {
                kind: ResourceKind::Copper,
                amount: 2
            }
        );
        assert!(!node.is_active());
        assert_eq!(node.health().current(), 0.0);
        assert_eq!(node.mine(10.0), MineOutcome::Inactive);
    }

    #[test]
    fn test_yields() {
        assert_eq!(ore_yield(ResourceKind::Copper), 2);
        assert_eq!(ore_yield(ResourceKind::Iron), 1);
        assert_eq!(ore_yield(ResourceKind::Stone), 3);
    }
}
