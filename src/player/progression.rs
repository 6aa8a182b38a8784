//! Derived-stat pipeline and experience curve.
//!
//! `recalculate` is pure: base stats + equipment + learned skills in,
//! `DerivedStats` out. Stages run in a fixed order and later stages read
//! the totals of earlier ones:
//!
//! 1. primary totals (base + item stats + primary affixes)
//! 2. primary -> derived formulas
//! 3. item affixes
//! 4. set bonuses
//! 5. unique special effects that act on the wearer
//! 6. clamps
//! 7. passives in ascending `apply_order`
//!
//! Stage 8, clamping current hp/mp, needs the mutable player and lives in
//! `PlayerState::refresh_derived`.

use std::collections::BTreeMap;

use tracing::debug;

use super::{DerivedStats, PlayerState, PrimaryStats};
use crate::abilities::{skill_def, SkillDef, SkillId};
use crate::combat::damage::OnHitStatus;
use crate::constants::*;
use crate::equipment::sets::active_set_bonuses;
use crate::equipment::{Affix, Equipment, FlatStat, PrimaryStat, SpecialEffect};

/// Experience needed to go from `level` to `level + 1`
pub fn xp_to_next(level: u32) -> u64 {
    let l = level.max(1) as f64;
    (100.0 * l * l.sqrt()).floor() as u64
}

pub fn recalculate(
    base: &PrimaryStats,
    equipment: &Equipment,
    learned_skills: &BTreeMap<SkillId, u32>,
) -> DerivedStats {
    let totals = total_stats(base, equipment);
    let mut stats = base_formulas(&totals);

    for (_, item) in equipment.items() {
        for affix in &item.affixes {
            apply_affix(&mut stats, affix);
        }
    }

    for bonus in active_set_bonuses(equipment) {
        for affix in bonus.affixes {
            apply_affix(&mut stats, affix);
        }
        if let Some(special) = bonus.special {
            stats.special_effects.push(special.to_string());
        }
    }

    for (_, item) in equipment.items() {
        for effect in &item.special_effects {
            match effect {
                SpecialEffect::PhysicalBlockChance(v) => stats.physical_block_chance += v,
                SpecialEffect::CritChance(v) => stats.crit_chance += v,
                // Acts on the opponent; see `aura_defense_reduction`
                SpecialEffect::AuraDefenseReduction(_) => {}
            }
        }
    }

    clamp(&mut stats);

    let mut passives: Vec<(&SkillDef, u32)> = learned_skills
        .iter()
        .filter(|(_, level)| **level > 0)
        .filter_map(|(id, level)| skill_def(*id).map(|def| (def, *level)))
        .filter(|(def, _)| !def.is_active())
        .collect();
    passives.sort_by_key(|(def, _)| (def.apply_order, def.id));
    for (def, level) in passives {
        def.apply_passive(&mut stats, level);
    }

    stats
}

fn total_stats(base: &PrimaryStats, equipment: &Equipment) -> PrimaryStats {
    let mut totals = base.clone();
    for (_, item) in equipment.items() {
        for (stat, value) in &item.stats {
            totals.add(*stat, *value);
        }
        for affix in &item.affixes {
            if let Affix::Primary { stat, value } = affix {
                totals.add(*stat, *value);
            }
        }
    }
    totals
}

fn base_formulas(t: &PrimaryStats) -> DerivedStats {
    let half = |v: i32| (v as f64 * 0.5).floor() as i32;
    let fifth = |v: i32| (v as f64 * 0.2).floor() as i32;
    DerivedStats {
        max_hp: 50 + t.strength * 2 + t.vitality * 10,
        max_mp: 30 + t.intelligence * 5 + t.spirit * 3,
        physical_attack: 5 + t.strength * 2 + half(t.agility) + fifth(t.vitality),
        magical_attack: 5 + t.intelligence * 2 + half(t.spirit),
        ranged_attack: 5 + t.agility * 2 + half(t.strength),
        physical_defense: 2 + t.vitality + half(t.strength),
        magical_defense: 2 + t.spirit + half(t.intelligence),
        speed: 10 + half(t.agility),
        crit_chance: BASE_CRIT_CHANCE + t.agility as f64 * 0.001 + t.luck as f64 * 0.0025,
        crit_damage: BASE_CRIT_DAMAGE + t.strength as f64 * 0.002,
        evasion: t.agility as f64 * 0.002 + t.luck as f64 * 0.001,
        magic_find: t.luck as f64 * 0.01,
        total_stats: t.clone(),
        ..DerivedStats::default()
    }
}

/// Non-primary affix application. Primary affixes were folded into totals.
fn apply_affix(stats: &mut DerivedStats, affix: &Affix) {
    match *affix {
        Affix::Primary { .. } => {}
        Affix::Flat { stat, value } => {
            let whole = value.floor() as i32;
            match stat {
                FlatStat::MaxHp => stats.max_hp += whole,
                FlatStat::MaxMp => stats.max_mp += whole,
                FlatStat::PhysicalAttack => stats.physical_attack += whole,
                FlatStat::MagicalAttack => stats.magical_attack += whole,
                FlatStat::RangedAttack => stats.ranged_attack += whole,
                FlatStat::PhysicalDefense => stats.physical_defense += whole,
                FlatStat::MagicalDefense => stats.magical_defense += whole,
                FlatStat::Speed => stats.speed += whole,
                FlatStat::CritChance => stats.crit_chance += value,
                FlatStat::CritDamage => stats.crit_damage += value,
                FlatStat::Evasion => stats.evasion += value,
                FlatStat::Lifesteal => stats.lifesteal += value,
                FlatStat::BlockChance => stats.physical_block_chance += value,
                FlatStat::MagicFind => stats.magic_find += value,
                FlatStat::ManaCostReduction => stats.mana_cost_reduction += value,
                FlatStat::ElementalDamageBonus => stats.elemental_damage_bonus += value,
            }
        }
        Affix::ElementalDamage { element, value } => {
            *stats.elemental_damage.entry(element).or_insert(0.0) += value;
        }
        Affix::StatusOnHit {
            status,
            chance,
            magnitude,
            duration,
        } => stats.on_hit.push(OnHitStatus {
            kind: status,
            chance,
            magnitude,
            duration,
        }),
    }
}

fn clamp(stats: &mut DerivedStats) {
    stats.evasion = stats.evasion.clamp(0.0, MAX_EVASION);
    stats.crit_chance = stats.crit_chance.clamp(0.0, 1.0);
    stats.physical_block_chance = stats.physical_block_chance.clamp(0.0, MAX_BLOCK_CHANCE);
    stats.lifesteal = stats.lifesteal.clamp(0.0, MAX_LIFESTEAL);
    stats.mana_cost_reduction = stats.mana_cost_reduction.clamp(0.0, MAX_MANA_COST_REDUCTION);
    stats.magic_find = stats.magic_find.max(0.0);
    stats.crit_damage = stats.crit_damage.max(1.0);
    stats.elemental_damage_bonus = stats.elemental_damage_bonus.max(0.0);
    stats.max_hp = stats.max_hp.max(1);
    stats.max_mp = stats.max_mp.max(0);
    stats.speed = stats.speed.max(1);
    for v in [
        &mut stats.physical_attack,
        &mut stats.magical_attack,
        &mut stats.ranged_attack,
        &mut stats.physical_defense,
        &mut stats.magical_defense,
    ] {
        *v = (*v).max(0);
    }
}

/// Flat defense stripped from monsters by equipped uniques
pub fn aura_defense_reduction(equipment: &Equipment) -> i32 {
    equipment
        .items()
        .flat_map(|(_, item)| item.special_effects.iter())
        .map(|effect| match effect {
            SpecialEffect::AuraDefenseReduction(v) => *v,
            SpecialEffect::PhysicalBlockChance(_) | SpecialEffect::CritChance(_) => 0,
        })
        .sum()
}

impl PlayerState {
    /// Recompute derived stats and clamp current hp/mp to the new maximums
    pub fn refresh_derived(&mut self) {
        self.derived = recalculate(&self.base, &self.equipment, &self.learned_skills);
        self.hp = self.hp.clamp(0, self.derived.max_hp);
        self.mp = self.mp.clamp(0, self.derived.max_mp);
        debug!(
            max_hp = self.derived.max_hp,
            max_mp = self.derived.max_mp,
            "derived stats refreshed"
        );
    }

    pub fn xp_to_next(&self) -> u64 {
        xp_to_next(self.level)
    }

    /// Add experience. Returns every level reached, in order.
    pub fn gain_xp(&mut self, amount: u64) -> Vec<u32> {
        self.xp += amount;
        let mut reached = Vec::new();
        while self.xp >= xp_to_next(self.level) {
            self.xp -= xp_to_next(self.level);
            self.level += 1;
            self.stat_points += STAT_POINTS_PER_LEVEL;
            self.skill_points += SKILL_POINTS_PER_LEVEL;
            reached.push(self.level);
        }
        if !reached.is_empty() {
            self.refresh_derived();
            self.hp = self.derived.max_hp;
            self.mp = self.derived.max_mp;
            tracing::info!(level = self.level, "player leveled up");
        }
        reached
    }

    /// Primary stat total after equipment, for display
    pub fn total_stat(&self, stat: PrimaryStat) -> i32 {
        self.derived.total_stats.get(stat)
    }
}
