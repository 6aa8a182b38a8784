use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::combat::damage::DamageRolls;
use crate::constants::*;
use crate::error::ConfigError;
use crate::logging::TracingConfig;
use crate::monster::stats::StatVariance;

/// Session tunables. Loadable from RON or JSON; missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub seed: u64,
    pub map_width: usize,
    pub map_height: usize,
    pub wfc_max_attempts: u32,
    pub monsters_per_map: usize,
    pub items_per_map: usize,
    pub inventory_capacity: usize,
    pub skill_slots: usize,
    pub turn_delay_ms: u64,
    pub boss_chance: f64,
    pub unique_chance: f64,
    pub set_chance: f64,
    pub monster_skill_chance: f64,
    pub damage_variance: (f64, f64),
    pub stat_variance: (f64, f64),
    pub starting_gold: u64,
    pub player_name: String,
    pub logging: TracingConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            map_width: DEFAULT_MAP_WIDTH,
            map_height: DEFAULT_MAP_HEIGHT,
            wfc_max_attempts: WFC_MAX_ATTEMPTS,
            monsters_per_map: 8,
            items_per_map: 3,
            inventory_capacity: DEFAULT_INVENTORY_CAPACITY,
            skill_slots: SKILL_SLOT_COUNT,
            turn_delay_ms: TURN_DELAY_MS,
            boss_chance: BOSS_CHANCE,
            unique_chance: UNIQUE_CHANCE,
            set_chance: SET_CHANCE,
            monster_skill_chance: MONSTER_SKILL_CHANCE,
            damage_variance: (DAMAGE_VARIANCE_MIN, DAMAGE_VARIANCE_MAX),
            stat_variance: (0.8, 1.2),
            starting_gold: STARTING_GOLD,
            player_name: "Adventurer".into(),
            logging: TracingConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if self.map_width == 0 || self.map_height == 0 {
            return invalid(format!("map size {}x{}", self.map_width, self.map_height));
        }
        if self.wfc_max_attempts == 0 {
            return invalid("wfc_max_attempts must be at least 1".into());
        }
        if self.inventory_capacity == 0 {
            return invalid("inventory_capacity must be at least 1".into());
        }
        for (name, chance) in [
            ("boss_chance", self.boss_chance),
            ("unique_chance", self.unique_chance),
            ("set_chance", self.set_chance),
            ("monster_skill_chance", self.monster_skill_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return invalid(format!("{name} {chance} outside [0, 1]"));
            }
        }
        for (name, (min, max)) in [
            ("damage_variance", self.damage_variance),
            ("stat_variance", self.stat_variance),
        ] {
            if !(min > 0.0 && min <= max && max.is_finite()) {
                return invalid(format!("{name} ({min}, {max}) is not a positive range"));
            }
        }
        Ok(())
    }

    pub fn damage_rolls(&self) -> DamageRolls {
        DamageRolls {
            variance_min: self.damage_variance.0,
            variance_max: self.damage_variance.1,
        }
    }

    pub fn monster_variance(&self) -> StatVariance {
        StatVariance {
            min: self.stat_variance.0,
            max: self.stat_variance.1,
        }
    }
}
