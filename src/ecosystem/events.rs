//! Dungeon event flags with hysteresis.
//!
//! Every flag is set at one threshold and cleared at a different, safer one,
//! so a value hovering around a single boundary cannot flip it back and forth.

use serde::Serialize;
use tracing::info;

use super::EcosystemState;
use crate::generation::Biome;

/// Measured quantity that drives one flag
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum EventTrigger {
    /// Summed population of species keys: set when `< set_below`, clear when `>= clear_at`
    PopulationLow {
        species: &'static [&'static str],
        set_below: u32,
        clear_at: u32,
    },
    /// Magical energy: set when any biome is `> set_above`, clear when all are `< clear_below`
    MagicalEnergyHigh {
        biomes: &'static [Biome],
        set_above: f64,
        clear_below: f64,
    },
    /// Temperature: same shape as magical energy
    TemperatureHigh {
        biomes: &'static [Biome],
        set_above: f64,
        clear_below: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EventRule {
    pub flag: &'static str,
    pub trigger: EventTrigger,
    /// Species id force-spawned while the flag is active
    pub boss: &'static str,
    pub biomes: &'static [Biome],
}

pub const EVENT_RULES: &[EventRule] = &[
    EventRule {
        flag: "goblinKingEnraged",
        trigger: EventTrigger::PopulationLow {
            species: &["goblin"],
            set_below: 20,
            clear_at: 50,
        },
        boss: "GOBLIN_KING",
        biomes: &[Biome::Forest, Biome::Cave],
    },
    EventRule {
        flag: "slimeKingAwakened",
        trigger: EventTrigger::PopulationLow {
            species: &["slime", "poisonSlime"],
            set_below: 30,
            clear_at: 60,
        },
        boss: "SLIME_KING",
        biomes: &[Biome::Forest],
    },
    EventRule {
        flag: "skeletonLordAwakened",
        trigger: EventTrigger::PopulationLow {
            species: &["skeleton", "skeletonArcher"],
            set_below: 30,
            clear_at: 60,
        },
        boss: "SKELETON_LORD",
        biomes: &[Biome::Cave, Biome::Ice],
    },
    EventRule {
        flag: "zombieLordAwakened",
        trigger: EventTrigger::PopulationLow {
            species: &["zombie"],
            set_below: 20,
            clear_at: 50,
        },
        boss: "ZOMBIE_LORD",
        biomes: &[Biome::Cave],
    },
    EventRule {
        flag: "lavaLordAwakened",
        trigger: EventTrigger::MagicalEnergyHigh {
            biomes: &[Biome::Volcano],
            set_above: 0.95,
            clear_below: 0.80,
        },
        boss: "LAVA_LORD",
        biomes: &[Biome::Volcano],
    },
    EventRule {
        flag: "archlichAwakened",
        trigger: EventTrigger::MagicalEnergyHigh {
            biomes: &[Biome::Ice, Biome::Cave],
            set_above: 0.95,
            clear_below: 0.80,
        },
        boss: "ARCHLICH",
        biomes: &[Biome::Ice, Biome::Cave],
    },
    EventRule {
        flag: "dragonOverlordAwakened",
        trigger: EventTrigger::TemperatureHigh {
            biomes: &[Biome::Volcano],
            set_above: 45.0,
            clear_below: 40.0,
        },
        boss: "DRAGON_OVERLORD",
        biomes: &[Biome::Volcano],
    },
];

/// A flag that flipped during a check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagChange {
    pub flag: &'static str,
    pub active: bool,
}

fn env_values(
    state: &EcosystemState,
    biomes: &[Biome],
    read: impl Fn(&super::EnvironmentState) -> f64,
) -> Vec<f64> {
    biomes
        .iter()
        .filter_map(|b| state.environment(*b))
        .map(read)
        .collect()
}

/// `Some(true)` to set, `Some(false)` to clear, `None` inside the dead band
fn evaluate(state: &EcosystemState, trigger: &EventTrigger) -> Option<bool> {
    match trigger {
        EventTrigger::PopulationLow {
            species,
            set_below,
            clear_at,
        } => {
            let total: u32 = species.iter().map(|k| state.population(k)).sum();
            if total < *set_below {
                Some(true)
            } else if total >= *clear_at {
                Some(false)
            } else {
                None
            }
        }
        EventTrigger::MagicalEnergyHigh {
            biomes,
            set_above,
            clear_below,
        } => threshold_high(&env_values(state, biomes, |e| e.magical_energy), *set_above, *clear_below),
        EventTrigger::TemperatureHigh {
            biomes,
            set_above,
            clear_below,
        } => threshold_high(&env_values(state, biomes, |e| e.temperature), *set_above, *clear_below),
    }
}

fn threshold_high(values: &[f64], set_above: f64, clear_below: f64) -> Option<bool> {
    if values.iter().any(|v| *v > set_above) {
        Some(true)
    } else if !values.is_empty() && values.iter().all(|v| *v < clear_below) {
        Some(false)
    } else {
        None
    }
}

pub fn check_dungeon_events(state: &mut EcosystemState) -> Vec<FlagChange> {
    let mut changes = Vec::new();
    for rule in EVENT_RULES {
        let current = state.flag(rule.flag);
        let next = evaluate(state, &rule.trigger).unwrap_or(current);
        if next != current {
            info!(flag = rule.flag, active = next, boss = rule.boss, "dungeon event flag changed");
            changes.push(FlagChange {
                flag: rule.flag,
                active: next,
            });
        }
        state.event_flags.insert(rule.flag.to_string(), next);
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monster::species::SpeciesCatalog;

    fn state() -> EcosystemState {
        EcosystemState::initial(&SpeciesCatalog::default())
    }

    #[test]
    fn test_rule_thresholds_are_distinct() {
        for rule in EVENT_RULES {
            match rule.trigger {
                EventTrigger::PopulationLow {
                    set_below,
                    clear_at,
                    ..
                } => assert!(set_below < clear_at, "{}", rule.flag),
                EventTrigger::MagicalEnergyHigh {
                    set_above,
                    clear_below,
                    ..
                }
                | EventTrigger::TemperatureHigh {
                    set_above,
                    clear_below,
                    ..
                } => assert!(clear_below < set_above, "{}", rule.flag),
            }
        }
    }

    #[test]
    fn test_goblin_hysteresis() {
        let mut s = state();
        s.monster_population.insert("goblin".into(), 19);
        let changes = check_dungeon_events(&mut s);
        assert_eq!(
            changes,
            vec![FlagChange {
                flag: "goblinKingEnraged",
                active: true
            }]
        );

        for pop in [20, 35, 49] {
            s.monster_population.insert("goblin".into(), pop);
            assert!(check_dungeon_events(&mut s).is_empty());
            assert!(s.flag("goblinKingEnraged"), "cleared early at {pop}");
        }

        s.monster_population.insert("goblin".into(), 50);
        check_dungeon_events(&mut s);
        assert!(!s.flag("goblinKingEnraged"));

        s.monster_population.insert("goblin".into(), 25);
        check_dungeon_events(&mut s);
        assert!(!s.flag("goblinKingEnraged"), "set above the set threshold");
    }

    #[test]
    fn test_slime_pair_sums_populations() {
        let mut s = state();
        s.monster_population.insert("slime".into(), 15);
        s.monster_population.insert("poisonSlime".into(), 14);
        check_dungeon_events(&mut s);
        assert!(s.flag("slimeKingAwakened"));
    }

    #[test]
    fn test_archlich_any_set_all_clear() {
        let mut s = state();
        s.environment_state.get_mut("cave").unwrap().magical_energy = 0.96;
        check_dungeon_events(&mut s);
        assert!(s.flag("archlichAwakened"));

        s.environment_state.get_mut("cave").unwrap().magical_energy = 0.5;
        s.environment_state.get_mut("ice").unwrap().magical_energy = 0.85;
        check_dungeon_events(&mut s);
        assert!(s.flag("archlichAwakened"), "ice still above clear threshold");

        s.environment_state.get_mut("ice").unwrap().magical_energy = 0.79;
        check_dungeon_events(&mut s);
        assert!(!s.flag("archlichAwakened"));
    }

    #[test]
    fn test_dragon_temperature_band() {
        let mut s = state();
        s.environment_state.get_mut("volcano").unwrap().temperature = 45.5;
        check_dungeon_events(&mut s);
        assert!(s.flag("dragonOverlordAwakened"));
        s.environment_state.get_mut("volcano").unwrap().temperature = 42.0;
        check_dungeon_events(&mut s);
        assert!(s.flag("dragonOverlordAwakened"));
        s.environment_state.get_mut("volcano").unwrap().temperature = 39.9;
        check_dungeon_events(&mut s);
        assert!(!s.flag("dragonOverlordAwakened"));
    }
}
