//! Dungeon ecosystem simulation.
//!
//! Tracks per-species populations, per-biome environment variables and
//! boolean event flags. Player actions flow in through
//! [`Ecosystem::apply_action_effect`]; the monster generator reads the state
//! back out as spawn weighting.

pub mod events;
pub mod persist;

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::combat::Element;
use crate::constants::*;
use crate::generation::Biome;
use crate::monster::species::{species_key, SpeciesCatalog};

pub use events::{EventRule, FlagChange, EVENT_RULES};

/// Environment variables of one biome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentState {
    pub temperature: f64,
    pub humidity: f64,
    pub magical_energy: f64,
    #[serde(default)]
    pub pollution_level: f64,
    #[serde(rename = "type")]
    pub biome_type: String,
}

impl EnvironmentState {
    pub fn new(biome: Biome, temperature: f64, humidity: f64, magical_energy: f64, pollution: f64) -> Self {
        Self {
            temperature,
            humidity,
            magical_energy,
            pollution_level: pollution,
            biome_type: biome.key().to_string(),
        }
    }

    pub fn initial(biome: Biome) -> Self {
        match biome {
            Biome::Forest => Self::new(biome, 20.0, 0.6, 0.3, 0.1),
            Biome::Ice => Self::new(biome, -10.0, 0.4, 0.5, 0.05),
            Biome::Cave => Self::new(biome, 12.0, 0.7, 0.5, 0.2),
            Biome::Volcano => Self::new(biome, 40.0, 0.2, 0.6, 0.4),
        }
    }

    /// Non-finite values collapse to the lower bound
    pub fn clamp(&mut self) {
        fn fix(value: f64, min: f64, max: f64) -> f64 {
            if value.is_finite() {
                value.clamp(min, max)
            } else {
                min
            }
        }
        self.temperature = fix(self.temperature, TEMPERATURE_MIN, TEMPERATURE_MAX);
        self.humidity = fix(self.humidity, 0.0, 1.0);
        self.magical_energy = fix(self.magical_energy, 0.0, 1.0);
        self.pollution_level = fix(self.pollution_level, 0.0, 1.0);
    }

    pub fn in_range(&self) -> bool {
        (TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&self.temperature)
            && (0.0..=1.0).contains(&self.humidity)
            && (0.0..=1.0).contains(&self.magical_energy)
            && (0.0..=1.0).contains(&self.pollution_level)
    }

    /// Elemental presence nudge; `direction` is +1 (skill use) or -1 (kill)
    pub fn nudge(&mut self, element: Element, direction: f64) {
        let temperature = match element {
            Element::Fire => 0.5,
            Element::Ice => -0.5,
            _ => 0.1,
        };
        let humidity = match element {
            Element::Poison => 0.02,
            _ => 0.01,
        };
        let magical_energy = match element {
            Element::Lightning => 0.03,
            Element::Dark => 0.02,
            _ => 0.01,
        };
        let pollution = match element {
            Element::Poison => 0.05,
            _ => 0.01,
        };
        self.temperature += temperature * direction;
        self.humidity += humidity * direction;
        self.magical_energy += magical_energy * direction;
        self.pollution_level += pollution * direction;
        self.clamp();
    }
}

/// Persisted ecosystem shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcosystemState {
    pub monster_population: BTreeMap<String, u32>,
    pub environment_state: BTreeMap<String, EnvironmentState>,
    pub event_flags: BTreeMap<String, bool>,
}

impl EcosystemState {
    /// Hardcoded starting state used when nothing valid was persisted
    pub fn initial(catalog: &SpeciesCatalog) -> Self {
        let monster_population = catalog
            .all()
            .iter()
            .map(|s| {
                let count = if s.is_natural() {
                    INITIAL_POPULATION
                } else {
                    INITIAL_BOSS_POPULATION
                };
                (s.key(), count)
            })
            .collect();
        let environment_state = Biome::ALL
            .iter()
            .map(|b| (b.key().to_string(), EnvironmentState::initial(*b)))
            .collect();
        let event_flags = EVENT_RULES
            .iter()
            .map(|rule| (rule.flag.to_string(), false))
            .collect();
        Self {
            monster_population,
            environment_state,
            event_flags,
        }
    }

    pub fn population(&self, key: &str) -> u32 {
        self.monster_population.get(key).copied().unwrap_or(0)
    }

    pub fn environment(&self, biome: Biome) -> Option<&EnvironmentState> {
        self.environment_state.get(biome.key())
    }

    pub fn flag(&self, name: &str) -> bool {
        self.event_flags.get(name).copied().unwrap_or(false)
    }

    /// Clamp everything into documented ranges
    pub fn sanitize(&mut self) {
        for count in self.monster_population.values_mut() {
            *count = (*count).min(POPULATION_CAP);
        }
        for env in self.environment_state.values_mut() {
            env.clamp();
        }
    }
}

/// Player actions the ecosystem reacts to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EcosystemAction {
    KillMonster { species: String },
    UseSkill { element: Option<Element> },
    PlayerLevelUp { level: u32 },
    BossKilled { species: String },
}

fn grow(count: u32, factor: f64) -> u32 {
    let value = (count as f64 * factor - 1e-9).ceil().max(0.0) as u32;
    value.min(POPULATION_CAP)
}

fn shrink(count: u32, factor: f64) -> u32 {
    let value = (count as f64 * factor + 1e-9).floor().max(0.0) as u32;
    value.min(POPULATION_CAP)
}

/// Live ecosystem: persisted state plus the biome the player is in
#[derive(Debug, Clone, PartialEq)]
pub struct Ecosystem {
    pub state: EcosystemState,
    pub current_biome: Biome,
}

impl Ecosystem {
    pub fn new(state: EcosystemState, current_biome: Biome) -> Self {
        Self {
            state,
            current_biome,
        }
    }

    pub fn initial(catalog: &SpeciesCatalog) -> Self {
        Self::new(EcosystemState::initial(catalog), Biome::Forest)
    }

    fn adjust(&mut self, key: &str, f: impl Fn(u32) -> u32) {
        let entry = self.state.monster_population.entry(key.to_string()).or_insert(0);
        *entry = f(*entry).min(POPULATION_CAP);
    }

    fn nudge_current(&mut self, element: Element, direction: f64) {
        if let Some(env) = self.state.environment_state.get_mut(self.current_biome.key()) {
            env.nudge(element, direction);
        }
    }

    pub fn apply_action_effect(
        &mut self,
        action: &EcosystemAction,
        catalog: &SpeciesCatalog,
    ) -> Vec<FlagChange> {
        match action {
            EcosystemAction::KillMonster { species } => {
                let key = species_key(species);
                self.adjust(&key, |c| c.saturating_sub(1));

                match catalog.get(species) {
                    Some(def) => {
                        for prey in def.ecology.prey {
                            self.adjust(&species_key(prey), |c| grow(c, PREY_GROWTH));
                        }
                        for predator in def.ecology.predators {
                            self.adjust(&species_key(predator), |c| shrink(c, PREDATOR_DECLINE));
                        }
                        for rival in def.ecology.competitors {
                            self.adjust(&species_key(rival), |c| grow(c, COMPETITOR_GROWTH));
                        }
                        if let Some(element) = def.ecology.element {
                            self.nudge_current(element, -1.0);
                        }
                    }
                    None => warn!(species = %species, "kill reported for unknown species"),
                }
            }
            EcosystemAction::UseSkill { element } => {
                if let Some(element) = element {
                    self.nudge_current(*element, 1.0);
                }
            }
            EcosystemAction::PlayerLevelUp { level } => {
                debug!(level, "ecosystem grows with player level");
                for count in self.state.monster_population.values_mut() {
                    *count = grow(*count, LEVEL_UP_GROWTH);
                }
            }
            EcosystemAction::BossKilled { species } => {
                let key = species_key(species);
                self.adjust(&key, |c| c / 2);
                self.state
                    .event_flags
                    .insert(format!("{key}_defeated"), true);
            }
        }
        self.check_dungeon_events()
    }

    /// Re-evaluate every event rule against the current state
    pub fn check_dungeon_events(&mut self) -> Vec<FlagChange> {
        events::check_dungeon_events(&mut self.state)
    }

    /// Natural recovery tick, run once per map transition
    pub fn recover_dungeon_state<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<FlagChange> {
        for count in self.state.monster_population.values_mut() {
            if *count < RECOVERY_POPULATION_CAP {
                *count += 1;
            }
        }
        for env in self.state.environment_state.values_mut() {
            env.temperature +=
                rng.gen_range(-RECOVERY_TEMPERATURE_WALK..=RECOVERY_TEMPERATURE_WALK);
            env.humidity += rng.gen_range(-RECOVERY_RATIO_WALK..=RECOVERY_RATIO_WALK);
            env.magical_energy += rng.gen_range(-RECOVERY_RATIO_WALK..=RECOVERY_RATIO_WALK);
            env.pollution_level += rng.gen_range(-RECOVERY_RATIO_WALK..=RECOVERY_RATIO_WALK);
            env.clamp();
        }
        self.check_dungeon_events()
    }

    /// Boss forced by an active event flag for this biome, if any
    pub fn forced_boss(&self, biome: Biome) -> Option<&'static str> {
        EVENT_RULES
            .iter()
            .find(|rule| rule.biomes.contains(&biome) && self.state.flag(rule.flag))
            .map(|rule| rule.boss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::rng_from_seed;

    fn setup() -> (Ecosystem, SpeciesCatalog) {
        let catalog = SpeciesCatalog::default();
        (Ecosystem::initial(&catalog), catalog)
    }

    fn kill(species: &str) -> EcosystemAction {
        EcosystemAction::KillMonster {
            species: species.to_string(),
        }
    }

    #[test]
    fn test_initial_state() {
        let (eco, _) = setup();
        assert_eq!(eco.state.population("goblin"), 100);
        assert_eq!(eco.state.population("goblinKing"), 10);
        let ice = eco.state.environment(Biome::Ice).unwrap();
        assert_eq!(ice.temperature, -10.0);
        assert_eq!(ice.biome_type, "ice");
        assert!(eco.state.event_flags.values().all(|f| !f));
    }

    #[test]
    fn test_kill_adjusts_food_web() {
        let (mut eco, catalog) = setup();
        eco.apply_action_effect(&kill("GOBLIN"), &catalog);
        assert_eq!(eco.state.population("goblin"), 99);
        // prey up (ceil), predators down (floor), competitors up (ceil)
        assert_eq!(eco.state.population("slime"), 101);
        assert_eq!(eco.state.population("wolf"), 99);
        assert_eq!(eco.state.population("troll"), 99);
        assert_eq!(eco.state.population("skeleton"), 101);
    }

    #[test]
    fn test_kill_never_goes_negative() {
        let (mut eco, catalog) = setup();
        eco.state.monster_population.insert("bat".into(), 0);
        eco.apply_action_effect(&kill("BAT"), &catalog);
        assert_eq!(eco.state.population("bat"), 0);
    }

    #[test]
    fn test_growth_capped() {
        let (mut eco, catalog) = setup();
        eco.state.monster_population.insert("slime".into(), 200);
        eco.apply_action_effect(&kill("GOBLIN"), &catalog);
        assert_eq!(eco.state.population("slime"), 200);
        eco.apply_action_effect(&EcosystemAction::PlayerLevelUp { level: 2 }, &catalog);
        assert_eq!(eco.state.population("slime"), 200);
        assert_eq!(eco.state.population("wolf"), 100);
    }

    #[test]
    fn test_elemental_kill_cools_fire_presence() {
        let (mut eco, catalog) = setup();
        eco.current_biome = Biome::Volcano;
        eco.apply_action_effect(&kill("FIRE_IMP"), &catalog);
        let env = eco.state.environment(Biome::Volcano).unwrap();
        assert!((env.temperature - 39.5).abs() < 1e-9);
        assert!((env.pollution_level - 0.39).abs() < 1e-9);
    }

    #[test]
    fn test_skill_use_warms_current_biome_only() {
        let (mut eco, catalog) = setup();
        eco.current_biome = Biome::Ice;
        eco.apply_action_effect(
            &EcosystemAction::UseSkill {
                element: Some(Element::Fire),
            },
            &catalog,
        );
        assert!((eco.state.environment(Biome::Ice).unwrap().temperature + 9.5).abs() < 1e-9);
        assert_eq!(eco.state.environment(Biome::Forest).unwrap().temperature, 20.0);

        eco.apply_action_effect(&EcosystemAction::UseSkill { element: None }, &catalog);
        assert!((eco.state.environment(Biome::Ice).unwrap().temperature + 9.5).abs() < 1e-9);
    }

    #[test]
    fn test_boss_killed_halves_and_marks_defeat() {
        let (mut eco, catalog) = setup();
        eco.apply_action_effect(
            &EcosystemAction::BossKilled {
                species: "GOBLIN_KING".into(),
            },
            &catalog,
        );
        assert_eq!(eco.state.population("goblinKing"), 5);
        assert!(eco.state.flag("goblinKing_defeated"));
    }

    #[test]
    fn test_recovery_walks_toward_soft_cap() {
        let (mut eco, _) = setup();
        eco.state.monster_population.insert("goblin".into(), 40);
        eco.state.monster_population.insert("wolf".into(), 150);
        let mut rng = rng_from_seed(5);
        for _ in 0..100 {
            eco.recover_dungeon_state(&mut rng);
        }
        assert_eq!(eco.state.population("goblin"), 100);
        assert_eq!(eco.state.population("wolf"), 150);
        assert!(eco.state.environment_state.values().all(|e| e.in_range()));
    }

    #[test]
    fn test_forced_boss_follows_flags() {
        let (mut eco, catalog) = setup();
        assert_eq!(eco.forced_boss(Biome::Forest), None);
        eco.state.monster_population.insert("goblin".into(), 19);
        eco.check_dungeon_events();
        assert_eq!(eco.forced_boss(Biome::Forest), Some("GOBLIN_KING"));
        assert_eq!(eco.forced_boss(Biome::Cave), Some("GOBLIN_KING"));
        assert_eq!(eco.forced_boss(Biome::Volcano), None);
        eco.state.monster_population.insert("goblin".into(), 48);
        eco.apply_action_effect(&EcosystemAction::PlayerLevelUp { level: 3 }, &catalog);
        assert_eq!(eco.state.population("goblin"), 49);
        assert!(eco.state.flag("goblinKingEnraged"), "50 not reached yet");
        eco.apply_action_effect(&EcosystemAction::PlayerLevelUp { level: 4 }, &catalog);
        assert_eq!(eco.state.population("goblin"), 50);
        assert!(!eco.state.flag("goblinKingEnraged"));
    }

    #[test]
    fn test_action_serialization_shape() {
        let json = serde_json::to_string(&kill("GOBLIN")).unwrap();
        assert_eq!(json, r#"{"type":"KILL_MONSTER","species":"GOBLIN"}"#);
    }
}
