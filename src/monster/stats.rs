//! Archetypes, tiers and monster stat blocks.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{BOSS_HP_MULT, BOSS_POWER_MULT, BOSS_THREAT_BONUS};
use crate::generation::weighted_index;

/// Stat-scaling template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Tank,
    Bruiser,
    Rusher,
    Caster,
    Evasive,
    GlassCannon,
    Standard,
    TankySlow,
    Elite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchetypeMultipliers {
    pub hp: f64,
    pub physical_attack: f64,
    pub magical_attack: f64,
    pub defense: f64,
    pub speed: f64,
    /// Flat base evasion, not a multiplier
    pub evasion: f64,
}

impl Archetype {
    pub fn multipliers(&self) -> ArchetypeMultipliers {
        let (hp, physical_attack, magical_attack, defense, speed, evasion) = match self {
            Archetype::Tank => (1.6, 0.8, 0.6, 1.6, 0.7, 0.0),
            Archetype::Bruiser => (1.3, 1.3, 0.6, 1.1, 0.9, 0.0),
            Archetype::Rusher => (0.8, 1.2, 0.5, 0.8, 1.5, 0.0),
            Archetype::Caster => (0.8, 0.6, 1.6, 0.8, 1.0, 0.0),
            Archetype::Evasive => (0.9, 1.0, 0.8, 0.8, 1.3, 0.15),
            Archetype::GlassCannon => (0.6, 1.6, 1.6, 0.5, 1.1, 0.0),
            Archetype::Standard => (1.0, 1.0, 1.0, 1.0, 1.0, 0.0),
            Archetype::TankySlow => (1.8, 1.0, 0.6, 1.4, 0.6, 0.0),
            Archetype::Elite => (1.5, 1.4, 1.4, 1.3, 1.1, 0.05),
        };
        ArchetypeMultipliers {
            hp,
            physical_attack,
            magical_attack,
            defense,
            speed,
            evasion,
        }
    }

    /// Casters open with magic, everyone else hits physically
    pub fn prefers_magic(&self) -> bool {
        matches!(self, Archetype::Caster)
    }
}

/// Power tier. Ordered weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Advanced,
    Elite,
    Epic,
    Legendary,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Basic,
        Tier::Advanced,
        Tier::Elite,
        Tier::Epic,
        Tier::Legendary,
    ];

    pub fn stat_multiplier(&self) -> f64 {
        match self {
            Tier::Basic => 1.0,
            Tier::Advanced => 1.2,
            Tier::Elite => 1.5,
            Tier::Epic => 2.0,
            Tier::Legendary => 3.0,
        }
    }

    pub fn threat_bonus(&self) -> i32 {
        match self {
            Tier::Basic => 0,
            Tier::Advanced => 3,
            Tier::Elite => 6,
            Tier::Epic => 10,
            Tier::Legendary => 15,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tier::Basic => "",
            Tier::Advanced => "Advanced",
            Tier::Elite => "Elite",
            Tier::Epic => "Epic",
            Tier::Legendary => "Legendary",
        }
    }
}

/// Tier weights by player level band, indexed like `Tier::ALL`
pub fn tier_weights(player_level: u32) -> [f64; 5] {
    match player_level {
        0..=4 => [100.0, 0.0, 0.0, 0.0, 0.0],
        5..=9 => [80.0, 20.0, 0.0, 0.0, 0.0],
        10..=19 => [60.0, 30.0, 10.0, 0.0, 0.0],
        20..=34 => [45.0, 30.0, 18.0, 7.0, 0.0],
        35..=49 => [35.0, 30.0, 20.0, 12.0, 3.0],
        _ => [25.0, 30.0, 22.0, 15.0, 8.0],
    }
}

pub fn roll_tier<R: Rng + ?Sized>(player_level: u32, rng: &mut R) -> Tier {
    weighted_index(&tier_weights(player_level), rng)
        .map(|i| Tier::ALL[i])
        .unwrap_or(Tier::Basic)
}

/// Bosses are at least elite, and capped at epic before level 20
pub fn boss_tier(rolled: Tier, player_level: u32) -> Tier {
    let tier = rolled.max(Tier::Elite);
    if player_level < 20 {
        tier.min(Tier::Epic)
    } else {
        tier
    }
}

/// Bucketed ramp over (level gap + tier threat + boss bonus)
pub fn threat_color(level: u32, player_level: u32, tier: Tier, is_boss: bool) -> &'static str {
    let mut diff = level as i32 - player_level as i32 + tier.threat_bonus();
    if is_boss {
        diff += BOSS_THREAT_BONUS;
    }
    match diff {
        i32::MIN..=-5 => "#9e9e9e",
        -4..=-2 => "#4caf50",
        -1..=2 => "#ffffff",
        3..=5 => "#ffeb3b",
        6..=10 => "#ff9800",
        11..=15 => "#f44336",
        _ => "#9c27b0",
    }
}

/// Per-stat random factor window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatVariance {
    pub min: f64,
    pub max: f64,
}

impl Default for StatVariance {
    fn default() -> Self {
        Self { min: 0.8, max: 1.2 }
    }
}

impl StatVariance {
    pub fn none() -> Self {
        Self { min: 1.0, max: 1.0 }
    }

    fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max <= self.min {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterStats {
    pub max_hp: i32,
    pub hp: i32,
    pub physical_attack: i32,
    pub magical_attack: i32,
    pub physical_defense: i32,
    pub magical_defense: i32,
    pub speed: i32,
    pub evasion: f64,
    pub luck: i32,
}

pub fn build_stats<R: Rng + ?Sized>(
    level: u32,
    archetype: Archetype,
    tier: Tier,
    is_boss: bool,
    variance: &StatVariance,
    rng: &mut R,
) -> MonsterStats {
    let lvl = level as f64;
    let arch = archetype.multipliers();
    let (boss_hp, boss_power) = if is_boss {
        (BOSS_HP_MULT, BOSS_POWER_MULT)
    } else {
        (1.0, 1.0)
    };
    let tier_mult = tier.stat_multiplier();

    let mut scaled = |base: f64, arch_mult: f64, boss_mult: f64, floor: i32| -> i32 {
        let value = base * arch_mult * boss_mult * tier_mult * variance.roll(rng);
        (value.floor() as i32).max(floor)
    };

    let max_hp = scaled(50.0 + 18.0 * lvl, arch.hp, boss_hp, 1);
    let physical_attack = scaled(5.0 + 3.0 * lvl, arch.physical_attack, boss_power, 1);
    let magical_attack = scaled(5.0 + 3.0 * lvl, arch.magical_attack, boss_power, 1);
    let physical_defense = scaled(2.0 + 1.5 * lvl, arch.defense, boss_power, 0);
    let magical_defense = scaled(2.0 + 1.5 * lvl, arch.defense, boss_power, 0);
    let speed = scaled(5.0 + 0.5 * lvl, arch.speed, 1.0, 1);

    MonsterStats {
        max_hp,
        hp: max_hp,
        physical_attack,
        magical_attack,
        physical_defense,
        magical_defense,
        speed,
        evasion: arch.evasion,
        luck: (level / 2) as i32,
    }
}
