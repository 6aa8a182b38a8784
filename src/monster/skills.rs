//! Monster skills as pure functions.
//!
//! A skill reads the caster's stats and a view of its target and returns a
//! list of mutations. The combat resolver applies them; skills never touch
//! game state directly.

use serde::{Deserialize, Serialize};

use super::stats::MonsterStats;
use crate::combat::status::{StatusEffect, StatusKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MonsterSkill {
    SavageStrike,
    Rend,
    PoisonSpit,
    HeavyBash,
    Regenerate,
    WarCry,
    FireBreath,
    FrostBolt,
    ShadowBolt,
    LifeDrain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuffStat {
    PhysicalAttack,
    PhysicalDefense,
}

/// One state change requested by a skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkillMutation {
    DamageTarget { amount: i32 },
    HealSelf { amount: i32 },
    ApplyStatus(StatusEffect),
    BuffSelf { stat: BuffStat, amount: i32 },
}

/// What a monster skill can see of its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    pub physical_defense: i32,
    pub magical_defense: i32,
    pub max_hp: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillOutcome {
    pub mutations: Vec<SkillMutation>,
    pub message: String,
}

fn hit(attack: i32, coefficient: f64, defense: i32) -> i32 {
    ((attack as f64 * coefficient).floor() as i32 - defense).max(1)
}

impl MonsterSkill {
    pub fn name(&self) -> &'static str {
        match self {
            MonsterSkill::SavageStrike => "Savage Strike",
            MonsterSkill::Rend => "Rend",
            MonsterSkill::PoisonSpit => "Poison Spit",
            MonsterSkill::HeavyBash => "Heavy Bash",
            MonsterSkill::Regenerate => "Regenerate",
            MonsterSkill::WarCry => "War Cry",
            MonsterSkill::FireBreath => "Fire Breath",
            MonsterSkill::FrostBolt => "Frost Bolt",
            MonsterSkill::ShadowBolt => "Shadow Bolt",
            MonsterSkill::LifeDrain => "Life Drain",
        }
    }

    /// Turns before the skill is usable again
    pub fn cooldown(&self) -> u32 {
        match self {
            MonsterSkill::HeavyBash | MonsterSkill::LifeDrain => 4,
            MonsterSkill::Regenerate | MonsterSkill::WarCry => 5,
            _ => 3,
        }
    }

    pub fn resolve(&self, caster_name: &str, caster: &MonsterStats, target: &TargetView) -> SkillOutcome {
        use SkillMutation::*;

        let mutations = match self {
            MonsterSkill::SavageStrike => vec![DamageTarget {
                amount: hit(caster.physical_attack, 1.5, target.physical_defense),
            }],
            MonsterSkill::Rend => vec![
                DamageTarget {
                    amount: hit(caster.physical_attack, 1.0, target.physical_defense),
                },
                ApplyStatus(StatusEffect::new(StatusKind::Bleed, 2.0, 3)),
            ],
            MonsterSkill::PoisonSpit => vec![
                DamageTarget {
                    amount: hit(caster.magical_attack, 0.8, target.magical_defense),
                },
                ApplyStatus(StatusEffect::new(StatusKind::Poison, 3.0, 4)),
            ],
            MonsterSkill::HeavyBash => vec![
                DamageTarget {
                    amount: hit(caster.physical_attack, 1.2, target.physical_defense),
                },
                ApplyStatus(StatusEffect::stun(1)),
            ],
            MonsterSkill::Regenerate => vec![HealSelf {
                amount: (caster.max_hp as f64 * 0.15).floor() as i32,
            }],
            MonsterSkill::WarCry => vec![BuffSelf {
                stat: BuffStat::PhysicalAttack,
                amount: ((caster.physical_attack as f64 * 0.2).floor() as i32).max(1),
            }],
            MonsterSkill::FireBreath => vec![DamageTarget {
                amount: hit(caster.magical_attack, 1.6, target.magical_defense),
            }],
            MonsterSkill::FrostBolt => vec![DamageTarget {
                amount: hit(caster.magical_attack, 1.3, target.magical_defense),
            }],
            MonsterSkill::ShadowBolt => vec![DamageTarget {
                amount: hit(caster.magical_attack, 1.5, target.magical_defense),
            }],
            MonsterSkill::LifeDrain => {
                let amount = hit(caster.magical_attack, 1.0, target.magical_defense);
                vec![
                    DamageTarget { amount },
                    HealSelf {
                        amount: (amount as f64 * 0.5).floor() as i32,
                    },
                ]
            }
        };

        SkillOutcome {
            mutations,
            message: format!("{caster_name} uses {}!", self.name()),
        }
    }
}
