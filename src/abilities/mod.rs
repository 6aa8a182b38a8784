//! Player skill catalog.
//!
//! Actives are learned into a small slot bar and cast in combat. Each active
//! resolves to a `SkillEffect` from (caster stats, level) alone; the combat
//! resolver runs the damage formula with it. Passives mutate derived stats in
//! ascending `apply_order` at the end of the progression pipeline.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::combat::damage::AttackType;
use crate::combat::status::StatusEffect;
use crate::combat::Element;
use crate::constants::{MAX_LIFESTEAL, MAX_MANA_COST_REDUCTION};
use crate::player::DerivedStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkillId {
    PowerStrike,
    ShieldBash,
    Whirlwind,
    Fireball,
    FrostNova,
    PrecisionShot,
    Heal,
    IronSkin,
    Vigor,
    ArcaneMind,
    KeenEye,
    Bloodthirst,
    Fortitude,
}

impl SkillId {
    pub fn key(&self) -> &'static str {
        match self {
            SkillId::PowerStrike => "powerStrike",
            SkillId::ShieldBash => "shieldBash",
            SkillId::Whirlwind => "whirlwind",
            SkillId::Fireball => "fireball",
            SkillId::FrostNova => "frostNova",
            SkillId::PrecisionShot => "precisionShot",
            SkillId::Heal => "heal",
            SkillId::IronSkin => "ironSkin",
            SkillId::Vigor => "vigor",
            SkillId::ArcaneMind => "arcaneMind",
            SkillId::KeenEye => "keenEye",
            SkillId::Bloodthirst => "bloodthirst",
            SkillId::Fortitude => "fortitude",
        }
    }

    /// Lookup by persisted/UI key. Unknown keys are logged.
    pub fn from_key(key: &str) -> Option<Self> {
        let found = SKILLS.iter().map(|def| def.id).find(|id| id.key() == key);
        if found.is_none() {
            warn!(key, "unknown skill id");
        }
        found
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillKind {
    Active,
    Passive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillTree {
    Warrior,
    Mage,
    Ranger,
}

/// Mana cost, either flat or indexed by level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillCost {
    Flat(u32),
    PerLevel(&'static [u32]),
}

impl SkillCost {
    /// Cost at `level` (1-based). Levels past the table reuse its last entry.
    pub fn at_level(&self, level: u32) -> u32 {
        match self {
            SkillCost::Flat(cost) => *cost,
            SkillCost::PerLevel(table) => {
                let idx = (level.max(1) - 1) as usize;
                table
                    .get(idx)
                    .or_else(|| table.last())
                    .copied()
                    .unwrap_or(0)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillDef {
    pub id: SkillId,
    pub name: &'static str,
    pub kind: SkillKind,
    pub tree: SkillTree,
    pub max_level: u32,
    /// Skill points per level learned
    pub cost_per_level: u32,
    pub mana: SkillCost,
    pub cooldown: u32,
    /// Each must be at its own max level before this can be learned
    pub dependencies: &'static [SkillId],
    pub element: Option<Element>,
    pub requires_shield: bool,
    /// Passive ordering; lower runs first
    pub apply_order: u32,
}

impl SkillDef {
    pub fn is_active(&self) -> bool {
        self.kind == SkillKind::Active
    }

    /// Mana cost after the caster's cost reduction
    pub fn mana_cost(&self, level: u32, mana_cost_reduction: f64) -> i32 {
        let base = self.mana.at_level(level) as f64;
        (base * (1.0 - mana_cost_reduction.clamp(0.0, 1.0))).floor() as i32
    }
}

const fn active(
    id: SkillId,
    name: &'static str,
    tree: SkillTree,
    mana: SkillCost,
    cooldown: u32,
    dependencies: &'static [SkillId],
    element: Option<Element>,
) -> SkillDef {
    SkillDef {
        id,
        name,
        kind: SkillKind::Active,
        tree,
        max_level: 5,
        cost_per_level: 1,
        mana,
        cooldown,
        dependencies,
        element,
        requires_shield: false,
        apply_order: 0,
    }
}

const fn passive(
    id: SkillId,
    name: &'static str,
    tree: SkillTree,
    apply_order: u32,
    dependencies: &'static [SkillId],
) -> SkillDef {
    SkillDef {
        id,
        name,
        kind: SkillKind::Passive,
        tree,
        max_level: 3,
        cost_per_level: 1,
        mana: SkillCost::Flat(0),
        cooldown: 0,
        dependencies,
        element: None,
        requires_shield: false,
        apply_order,
    }
}

pub static SKILLS: &[SkillDef] = &[
    active(SkillId::PowerStrike, "Power Strike", SkillTree::Warrior, SkillCost::Flat(8), 2, &[], None),
    SkillDef {
        requires_shield: true,
        ..active(SkillId::ShieldBash, "Shield Bash", SkillTree::Warrior, SkillCost::Flat(10), 4, &[], None)
    },
    SkillDef {
        cost_per_level: 2,
        ..active(
            SkillId::Whirlwind,
            "Whirlwind",
            SkillTree::Warrior,
            SkillCost::PerLevel(&[14, 16, 18, 20, 22]),
            3,
            &[SkillId::PowerStrike],
            None,
        )
    },
    active(
        SkillId::Fireball,
        "Fireball",
        SkillTree::Mage,
        SkillCost::PerLevel(&[10, 12, 14, 16, 18]),
        2,
        &[],
        Some(Element::Fire),
    ),
    active(
        SkillId::FrostNova,
        "Frost Nova",
        SkillTree::Mage,
        SkillCost::Flat(15),
        3,
        &[SkillId::Fireball],
        Some(Element::Ice),
    ),
    active(SkillId::PrecisionShot, "Precision Shot", SkillTree::Ranger, SkillCost::Flat(8), 2, &[], None),
    active(
        SkillId::Heal,
        "Heal",
        SkillTree::Mage,
        SkillCost::PerLevel(&[12, 14, 16, 18, 20]),
        4,
        &[],
        Some(Element::Holy),
    ),
    passive(SkillId::IronSkin, "Iron Skin", SkillTree::Warrior, 10, &[]),
    passive(SkillId::Vigor, "Vigor", SkillTree::Warrior, 20, &[]),
    passive(SkillId::ArcaneMind, "Arcane Mind", SkillTree::Mage, 20, &[]),
    passive(SkillId::KeenEye, "Keen Eye", SkillTree::Ranger, 30, &[]),
    passive(SkillId::Bloodthirst, "Bloodthirst", SkillTree::Warrior, 40, &[SkillId::Vigor]),
    passive(SkillId::Fortitude, "Fortitude", SkillTree::Warrior, 50, &[SkillId::IronSkin]),
];

/// Definition lookup. Missing definitions are logged and treated as absent.
pub fn skill_def(id: SkillId) -> Option<&'static SkillDef> {
    let def = SKILLS.iter().find(|def| def.id == id);
    if def.is_none() {
        warn!(skill = id.key(), "skill has no definition");
    }
    def
}

/// What casting an active skill does
#[derive(Debug, Clone, PartialEq)]
pub enum SkillEffect {
    /// Run the damage formula with the attack stat scaled by `coefficient`
    Damage {
        attack_type: AttackType,
        coefficient: f64,
        /// Added to crit chance for this hit only
        crit_bonus: f64,
        /// Applied to the target when the hit lands
        status: Option<StatusEffect>,
        message: String,
    },
    /// Self-targeted, skips the damage formula
    Heal { amount: i32, message: String },
}

impl SkillDef {
    /// Pure effect of an active skill. Passives return `None`.
    pub fn effect(&self, caster: &DerivedStats, level: u32) -> Option<SkillEffect> {
        let lvl = level.max(1) as f64;
        let damage = |attack_type, coefficient: f64, crit_bonus, status| SkillEffect::Damage {
            attack_type,
            coefficient,
            crit_bonus,
            status,
            message: format!("You use {}!", self.name),
        };
        let effect = match self.id {
            SkillId::PowerStrike => damage(AttackType::Physical, 1.5 + 0.1 * lvl, 0.0, None),
            SkillId::ShieldBash => damage(
                AttackType::Physical,
                1.0,
                0.0,
                Some(StatusEffect::stun(1 + level as i32 / 3)),
            ),
            SkillId::Whirlwind => damage(AttackType::Physical, 1.2 + 0.2 * lvl, 0.0, None),
            SkillId::Fireball => damage(AttackType::Magical, 1.8 + 0.15 * lvl, 0.0, None),
            SkillId::FrostNova => damage(
                AttackType::Magical,
                1.3 + 0.1 * lvl,
                0.0,
                Some(StatusEffect::stun(1)),
            ),
            SkillId::PrecisionShot => damage(AttackType::Ranged, 1.4 + 0.1 * lvl, 0.3, None),
            SkillId::Heal => {
                let amount = (caster.max_hp as f64 * 0.2).floor() as i32 + 10 * level as i32;
                SkillEffect::Heal {
                    amount,
                    message: format!("You cast {} and recover {amount} HP.", self.name),
                }
            }
            SkillId::IronSkin
            | SkillId::Vigor
            | SkillId::ArcaneMind
            | SkillId::KeenEye
            | SkillId::Bloodthirst
            | SkillId::Fortitude => return None,
        };
        Some(effect)
    }

    /// Mutate derived stats for a learned passive. Actives are a no-op.
    pub fn apply_passive(&self, stats: &mut DerivedStats, level: u32) {
        let lvl = level as f64;
        match self.id {
            SkillId::IronSkin => stats.physical_defense += 2 * level as i32,
            SkillId::Vigor => {
                stats.max_hp += (stats.max_hp as f64 * 0.05 * lvl).floor() as i32;
            }
            SkillId::ArcaneMind => {
                stats.max_mp += (stats.max_mp as f64 * 0.05 * lvl).floor() as i32;
                stats.mana_cost_reduction =
                    (stats.mana_cost_reduction + 0.03 * lvl).min(MAX_MANA_COST_REDUCTION);
            }
            SkillId::KeenEye => {
                stats.crit_chance = (stats.crit_chance + 0.01 * lvl).min(1.0);
            }
            SkillId::Bloodthirst => {
                stats.lifesteal = (stats.lifesteal + 0.01 * lvl).min(MAX_LIFESTEAL);
            }
            // Reads defense after Iron Skin has run
            SkillId::Fortitude => stats.max_hp += stats.physical_defense * level as i32,
            SkillId::PowerStrike
            | SkillId::ShieldBash
            | SkillId::Whirlwind
            | SkillId::Fireball
            | SkillId::FrostNova
            | SkillId::PrecisionShot
            | SkillId::Heal => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::status::StatusKind;

    #[test]
    fn test_every_id_has_a_definition() {
        for def in SKILLS {
            assert_eq!(skill_def(def.id).map(|d| d.id), Some(def.id));
            assert_eq!(SkillId::from_key(def.id.key()), Some(def.id));
        }
        assert_eq!(SKILLS.iter().filter(|d| d.is_active()).count(), 7);
        assert_eq!(SKILLS.iter().filter(|d| !d.is_active()).count(), 6);
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(SkillId::from_key("meteorSwarm"), None);
    }

    #[test]
    fn test_per_level_cost_clamps_to_table() {
        let cost = SkillCost::PerLevel(&[10, 12]);
        assert_eq!(cost.at_level(1), 10);
        assert_eq!(cost.at_level(2), 12);
        assert_eq!(cost.at_level(9), 12);
        assert_eq!(SkillCost::PerLevel(&[]).at_level(1), 0);
    }

    #[test]
    fn test_mana_cost_reduction() {
        let def = skill_def(SkillId::Fireball).unwrap();
        assert_eq!(def.mana_cost(1, 0.0), 10);
        assert_eq!(def.mana_cost(1, 0.25), 7);
    }

    #[test]
    fn test_effects_are_pure() {
        let stats = DerivedStats::default();
        let def = skill_def(SkillId::ShieldBash).unwrap();
        assert!(def.requires_shield);
        let a = def.effect(&stats, 3);
        let b = def.effect(&stats, 3);
        assert_eq!(a, b);
        match a {
            Some(SkillEffect::Damage { status: Some(s), .. }) => {
                assert_eq!(s.kind, StatusKind::Stun);
                assert_eq!(s.duration, 2);
            }
            other => panic!("unexpected effect {other:?}"),
        }
        assert!(skill_def(SkillId::Vigor).unwrap().effect(&stats, 1).is_none());
    }

    #[test]
    fn test_passive_order_matters() {
        let mut in_order = DerivedStats {
            max_hp: 100,
            physical_defense: 10,
            ..DerivedStats::default()
        };
        let mut reversed = in_order.clone();
        let iron = skill_def(SkillId::IronSkin).unwrap();
        let fort = skill_def(SkillId::Fortitude).unwrap();
        assert!(iron.apply_order < fort.apply_order);

        iron.apply_passive(&mut in_order, 1);
        fort.apply_passive(&mut in_order, 1);
        fort.apply_passive(&mut reversed, 1);
        iron.apply_passive(&mut reversed, 1);
        assert_eq!(in_order.max_hp, 112);
        assert_eq!(reversed.max_hp, 110);
    }
}
