//! Shared damage formula for basic attacks and skill-modified attacks.
//!
//! `calculate_damage` is pure with respect to the combatants: it returns the
//! damage plus any lifesteal heal and on-hit statuses, and the caller applies
//! them. All randomness comes from the supplied RNG.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::status::{StatusEffect, StatusKind};
use super::Element;
use crate::constants::{BASE_CRIT_DAMAGE, DAMAGE_VARIANCE_MAX, DAMAGE_VARIANCE_MIN};

/// Which side a combatant fights on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Player,
    Monster,
}

/// Attack/defense pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackType {
    Physical,
    Magical,
    Ranged,
}

/// Innate "chance to apply a status on hit" entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnHitStatus {
    pub kind: StatusKind,
    pub chance: f64,
    pub magnitude: f64,
    pub duration: i32,
}

/// Snapshot of a combatant's stats as the damage formula sees them
#[derive(Debug, Clone, PartialEq)]
pub struct CombatProfile {
    pub side: Side,
    pub hp: i32,
    pub max_hp: i32,
    pub physical_attack: i32,
    pub magical_attack: i32,
    pub ranged_attack: i32,
    pub physical_defense: i32,
    pub magical_defense: i32,
    pub crit_chance: f64,
    pub crit_damage: f64,
    pub evasion: f64,
    pub lifesteal: f64,
    pub elemental_damage: Vec<(Element, f64)>,
    pub elemental_damage_bonus: f64,
    pub on_hit: Vec<OnHitStatus>,
    /// Flat defense stripped from monsters (player uniques only)
    pub aura_defense_reduction: i32,
}

impl CombatProfile {
    /// Bare profile with only the stats the formula always needs
    pub fn basic(side: Side, max_hp: i32, attack: i32, defense: i32) -> Self {
        Self {
            side,
            hp: max_hp,
            max_hp,
            physical_attack: attack,
            magical_attack: attack,
            ranged_attack: attack,
            physical_defense: defense,
            magical_defense: defense,
            crit_chance: 0.0,
            crit_damage: BASE_CRIT_DAMAGE,
            evasion: 0.0,
            lifesteal: 0.0,
            elemental_damage: Vec::new(),
            elemental_damage_bonus: 0.0,
            on_hit: Vec::new(),
            aura_defense_reduction: 0,
        }
    }

    pub fn attack(&self, attack_type: AttackType) -> i32 {
        match attack_type {
            AttackType::Physical => self.physical_attack,
            AttackType::Magical => self.magical_attack,
            AttackType::Ranged => self.ranged_attack,
        }
    }

    /// Ranged attacks are resisted by physical defense
    pub fn defense(&self, attack_type: AttackType) -> i32 {
        match attack_type {
            AttackType::Physical | AttackType::Ranged => self.physical_defense,
            AttackType::Magical => self.magical_defense,
        }
    }

    /// Temporarily scale the relevant attack stat for a skill hit
    pub fn with_scaled_attack(mut self, attack_type: AttackType, coefficient: f64) -> Self {
        let scale = |v: i32| (v as f64 * coefficient).floor() as i32;
        match attack_type {
            AttackType::Physical => self.physical_attack = scale(self.physical_attack),
            AttackType::Magical => self.magical_attack = scale(self.magical_attack),
            AttackType::Ranged => self.ranged_attack = scale(self.ranged_attack),
        }
        self
    }
}

/// Variance window. `min == max` pins the factor without touching the RNG.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageRolls {
    pub variance_min: f64,
    pub variance_max: f64,
}

impl Default for DamageRolls {
    fn default() -> Self {
        Self {
            variance_min: DAMAGE_VARIANCE_MIN,
            variance_max: DAMAGE_VARIANCE_MAX,
        }
    }
}

impl DamageRolls {
    pub fn pinned(factor: f64) -> Self {
        Self {
            variance_min: factor,
            variance_max: factor,
        }
    }

    fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.variance_max <= self.variance_min {
            self.variance_min
        } else {
            rng.gen_range(self.variance_min..=self.variance_max)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DamageResult {
    pub damage: i32,
    pub is_critical: bool,
    pub is_evaded: bool,
    /// Lifesteal heal for the attacker, already clamped to its missing hp
    pub heal: i32,
    /// Statuses to apply to the defender
    pub statuses: Vec<StatusEffect>,
}

/// Bernoulli draw that skips the RNG at the certain ends
pub fn roll_chance<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    if chance.is_nan() || chance <= 0.0 {
        false
    } else if chance >= 1.0 {
        true
    } else {
        rng.gen::<f64>() < chance
    }
}

pub fn calculate_damage<R: Rng + ?Sized>(
    attacker: &CombatProfile,
    defender: &CombatProfile,
    attack_type: AttackType,
    rolls: &DamageRolls,
    rng: &mut R,
) -> DamageResult {
    if roll_chance(rng, defender.evasion) {
        return DamageResult {
            is_evaded: true,
            ..DamageResult::default()
        };
    }

    let attack = attacker.attack(attack_type);
    let mut defense = defender.defense(attack_type);
    if attacker.side == Side::Player && defender.side == Side::Monster {
        defense = (defense - attacker.aura_defense_reduction).max(0);
    }

    let mut base = (attack - defense).max(1) as f64;

    let is_critical = roll_chance(rng, attacker.crit_chance);
    if is_critical {
        base *= attacker.crit_damage;
    }

    base *= rolls.roll(rng);

    let elemental = attacker
        .elemental_damage
        .iter()
        .map(|(_, value)| *value)
        .sum::<f64>()
        * (1.0 + attacker.elemental_damage_bonus);

    let damage = (base + elemental).floor().max(0.0) as i32;

    let mut heal = 0;
    if attacker.side == Side::Player && attacker.lifesteal > 0.0 {
        let missing = (attacker.max_hp - attacker.hp).max(0);
        heal = ((damage as f64 * attacker.lifesteal).floor() as i32).min(missing);
    }

    let statuses = attacker
        .on_hit
        .iter()
        .filter(|entry| roll_chance(rng, entry.chance))
        .map(|entry| StatusEffect::new(entry.kind, entry.magnitude, entry.duration))
        .collect();

    DamageResult {
        damage,
        is_critical,
        is_evaded: false,
        heal,
        statuses,
    }
}
