//! # Combat Resolution
//!
//! Hit, dodge and damage arithmetic shared by NPCs and the player.
//!
//! An attack draws two independent uniform rolls in `[0, 1)`:
//!
//! ```text
//! hit   iff  hit_roll < attacker.hit_chance
//!       AND  dodge_roll > defender.dodge_chance
//! ```
//!
//! Damage on a hit is the attacker's fixed damage value; it is never
//! randomized.
//!
//! Rolls come from a [`RollSource`]. The game uses [`CombatRng`]; tests and
//! replays use [`ScriptedRolls`] to force exact sequences.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Health pool clamped to `[0, max]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Health {
    /// Full health.
    #[must_use]
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    /// Current health.
    #[inline]
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Maximum health.
    #[inline]
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Current over maximum, in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    /// True at zero health.
    #[inline]
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    /// Subtracts damage, never going below zero. Returns damage taken.
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        let amount = amount.max(0.0);
        let before = self.current;
        self.current = (self.current - amount).max(0.0);
        before - self.current
    }

    /// Adds health, never exceeding the maximum. Returns health gained.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let amount = amount.max(0.0);
        let before = self.current;
        self.current = (self.current + amount).min(self.max);
        self.current - before
    }

    /// Back to full.
    pub fn reset(&mut self) {
        self.current = self.max;
    }
}

/// Offensive and defensive numbers for one combatant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CombatStats {
    /// Damage dealt per hit.
    pub damage: f32,
    /// Probability a swing connects, before the defender's dodge.
    pub hit_chance: f32,
    /// Probability of dodging an incoming swing.
    pub dodge_chance: f32,
    /// Seconds between attacks.
    pub attack_cooldown: f32,
}

impl CombatStats {
    /// Non-combatant: never attacks, still dodges.
    #[must_use]
    pub const fn passive(dodge_chance: f32) -> Self {
        Self {
            damage: 0.0,
            hit_chance: 0.0,
            dodge_chance,
            attack_cooldown: 0.0,
        }
    }

    /// True if this combatant ever attacks.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.damage > 0.0 && self.hit_chance > 0.0
    }
}

/// Source of uniform rolls in `[0, 1)`.
pub trait RollSource {
    /// Next roll.
    fn roll(&mut self) -> f32;
}

/// Seeded PRNG for live combat.
#[derive(Clone, Debug)]
pub struct CombatRng {
    rng: ChaCha8Rng,
}

impl CombatRng {
    /// Reproducible rolls from a fixed seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seeded from the system clock.
    #[must_use]
    pub fn from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64);
        Self::from_seed(nanos)
    }
}

impl RollSource for CombatRng {
    fn roll(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }
}

/// Replays a fixed list of rolls, then repeats a fallback.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRolls {
    rolls: VecDeque<f32>,
    fallback: f32,
}

impl ScriptedRolls {
    /// Rolls in order, then `fallback` forever.
    #[must_use]
    pub fn new(rolls: impl IntoIterator<Item = f32>, fallback: f32) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            fallback,
        }
    }

    /// Rolls not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl RollSource for ScriptedRolls {
    fn roll(&mut self) -> f32 {
        self.rolls.pop_front().unwrap_or(self.fallback)
    }
}

/// The two rolls behind one attack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackRolls {
    /// Compared against the attacker's hit chance.
    pub hit: f32,
    /// Compared against the defender's dodge chance.
    pub dodge: f32,
}

impl AttackRolls {
    /// Draws a hit roll then a dodge roll.
    pub fn draw(source: &mut dyn RollSource) -> Self {
        let hit = source.roll();
        let dodge = source.roll();
        Self { hit, dodge }
    }
}

/// Result of one attack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttackOutcome {
    /// Connected for this much damage.
    Hit {
        /// Damage to apply.
        damage: f32,
    },
    /// Hit roll failed.
    Missed,
    /// Hit roll passed but the defender dodged.
    Dodged,
}

impl AttackOutcome {
    /// Damage dealt, zero unless a hit.
    #[must_use]
    pub const fn damage(self) -> f32 {
        match self {
            Self::Hit { damage } => damage,
            Self::Missed | Self::Dodged => 0.0,
        }
    }

    /// True for a hit.
    #[must_use]
    pub const fn is_hit(self) -> bool {
        matches!(self, Self::Hit { .. })
    }
}

/// Resolves one attack from already-drawn rolls.
#[must_use]
pub fn resolve_attack(attacker: &CombatStats, defender_dodge: f32, rolls: AttackRolls) -> AttackOutcome {
    if rolls.hit >= attacker.hit_chance {
        AttackOutcome::Missed
    } else if rolls.dodge <= defender_dodge {
        AttackOutcome::Dodged
    } else {
        AttackOutcome::Hit {
            damage: attacker.damage,
        }
    }
}

/// Draws rolls and resolves one attack.
pub fn roll_attack(attacker: &CombatStats, defender_dodge: f32, source: &mut dyn RollSource) -> AttackOutcome {
    resolve_attack(attacker, defender_dodge, AttackRolls::draw(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attacker() -> CombatStats {
        CombatStats {
            damage: 12.0,
            hit_chance: 0.8,
            dodge_chance: 0.1,
            attack_cooldown: 1.0,
        }
    }

    #[test]
    fn test_hit_iff_both_rolls_pass() {
        let a = attacker();
        let cases = [
            (0.79, 0.31, true),
            (0.0, 0.99, true),
            (0.8, 0.9, false),
            (0.5, 0.3, false),
            (0.5, 0.1, false),
            (0.95, 0.05, false),
        ];
        for (hit, dodge, expected) in cases {
            let outcome = resolve_attack(&a, 0.3, AttackRolls { hit, dodge });
            assert_eq!(outcome.is_hit(), expected, "hit={hit} dodge={dodge}");
        }
    }

    #[test]
    fn test_miss_and_dodge_are_distinguished() {
        let a = attacker();
        assert_eq!(resolve_attack(&a, 0.3, AttackRolls { hit: 0.9, dodge: 0.9 }), AttackOutcome::Missed);
        assert_eq!(resolve_attack(&a, 0.3, AttackRolls { hit: 0.1, dodge: 0.2 }), AttackOutcome::Dodged);
        assert_eq!(
            resolve_attack(&a, 0.3, AttackRolls { hit: 0.1, dodge: 0.5 }),
            AttackOutcome::Hit { damage: 12.0 }
        );
    }

    #[test]
    fn test_scripted_rolls_order() {
        let mut rolls = ScriptedRolls::new([0.1, 0.9, 0.95, 0.5], 0.0);
        assert!(roll_attack(&attacker(), 0.3, &mut rolls).is_hit());
        assert_eq!(roll_attack(&attacker(), 0.3, &mut rolls), AttackOutcome::Missed);
        assert_eq!(rolls.remaining(), 0);
        assert_eq!(rolls.roll(), 0.0);
    }

    #[test]
    fn test_health_clamps() {
        let mut h = Health::new(60.0);
        assert_eq!(h.apply_damage(25.0), 25.0);
        assert_eq!(h.apply_damage(25.0), 25.0);
        assert_eq!(h.apply_damage(25.0), 10.0);
        assert_eq!(h.current(), 0.0);
        assert!(h.is_depleted());
        assert_eq!(h.heal(500.0), 60.0);
        assert_eq!(h.current(), 60.0);
        assert_eq!(h.apply_damage(-5.0), 0.0);
    }

    #[test]
    fn test_seeded_rng_is_reproducible_and_in_range() {
        let mut a = CombatRng::from_seed(7);
        let mut b = CombatRng::from_seed(7);
        for _ in 0..1000 {
            let r = a.roll();
            assert_eq!(r.to_bits(), b.roll().to_bits());
            assert!((0.0..1.0).contains(&r));
        }
    }

    #[test]
    fn test_passive_never_attacks() {
        assert!(!CombatStats::passive(0.3).can_attack());
        assert!(attacker().can_attack());
    }
}
