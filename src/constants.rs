//! Centralized game constants for the dungeon procedural core.
//!
//! Per-entity data (species, skills, base items, tile tables) lives in the
//! catalog of the owning module. Only cross-cutting tunables live here.

// =====================================================
// Map generation
// =====================================================

/// Default WFC grid width
pub const DEFAULT_MAP_WIDTH: usize = 24;

/// Default WFC grid height
pub const DEFAULT_MAP_HEIGHT: usize = 16;

/// Attempts before a map transition is declared failed
pub const WFC_MAX_ATTEMPTS: u32 = 10;

/// Wood-tile weight multiplier next to an already collapsed lake tile
pub const LAKESHORE_WOOD_FACTOR: f64 = 0.3;

/// Collapsed non-walkable neighbours needed to trigger the anti-softlock bias
pub const SOFTLOCK_NEIGHBOR_THRESHOLD: usize = 2;

/// Walkable weight multiplier when the anti-softlock bias fires
pub const SOFTLOCK_WALKABLE_FACTOR: f64 = 3.0;

/// Non-walkable weight multiplier when the anti-softlock bias fires
pub const SOFTLOCK_BLOCKING_FACTOR: f64 = 0.2;

// =====================================================
// Ecosystem
// =====================================================

/// Hard population cap per species
pub const POPULATION_CAP: u32 = 200;

/// Natural recovery grows populations toward this soft cap
pub const RECOVERY_POPULATION_CAP: u32 = 100;

/// Prey multiplier when a predator is killed
pub const PREY_GROWTH: f64 = 1.01;

/// Predator multiplier when one of its prey is killed
pub const PREDATOR_DECLINE: f64 = 1.0 - 0.007;

/// Competitor multiplier when a rival species is killed
pub const COMPETITOR_GROWTH: f64 = 1.005;

/// Global population multiplier on player level up
pub const LEVEL_UP_GROWTH: f64 = 1.005;

/// Temperature clamp (degrees)
pub const TEMPERATURE_MIN: f64 = -20.0;
pub const TEMPERATURE_MAX: f64 = 50.0;

/// Random walk amplitude applied on natural recovery
pub const RECOVERY_TEMPERATURE_WALK: f64 = 0.5;
pub const RECOVERY_RATIO_WALK: f64 = 0.01;

/// Initial population for naturally spawning species
pub const INITIAL_POPULATION: u32 = 100;

/// Initial population for event-only (boss) species
pub const INITIAL_BOSS_POPULATION: u32 = 10;

// =====================================================
// Monster generation
// =====================================================

/// Scarcity/abundance pivots for spawn weighting
pub const SCARCITY_PIVOT: f64 = 50.0;
pub const ABUNDANCE_PIVOT: f64 = 150.0;
pub const MIN_SPAWN_WEIGHT: f64 = 0.1;

/// Levels past a basic species' minimum before it evolves
pub const EVOLUTION_LEVEL_GAP: u32 = 10;

/// How far below an evolved form's minimum level the player may still meet it
pub const EVOLUTION_LEVEL_SLACK: u32 = 5;

/// Chance that any spawned monster is a boss
pub const BOSS_CHANCE: f64 = 0.05;

/// Boss stat multipliers
pub const BOSS_HP_MULT: f64 = 2.5;
pub const BOSS_POWER_MULT: f64 = 1.8;

/// Extra threat for bosses when picking a threat color
pub const BOSS_THREAT_BONUS: i32 = 15;

/// Chance a monster uses a skill instead of a basic attack
pub const MONSTER_SKILL_CHANCE: f64 = 0.35;

// =====================================================
// Combat
// =====================================================

/// Default critical damage multiplier
pub const BASE_CRIT_DAMAGE: f64 = 1.5;

/// Base critical chance for player and monsters
pub const BASE_CRIT_CHANCE: f64 = 0.05;

/// Damage variance window
pub const DAMAGE_VARIANCE_MIN: f64 = 0.9;
pub const DAMAGE_VARIANCE_MAX: f64 = 1.1;

/// Status tick ratios of max hp per point of magnitude
pub const BLEED_TICK_RATIO: f64 = 0.01;
pub const POISON_TICK_RATIO: f64 = 0.005;

/// Logical pause between combat turns
pub const TURN_DELAY_MS: u64 = 600;

/// Flee chance bounds
pub const FLEE_BASE_CHANCE: f64 = 0.5;
pub const FLEE_SPEED_FACTOR: f64 = 0.02;

// =====================================================
// Player
// =====================================================

pub const EQUIPMENT_SLOT_COUNT: usize = 11;
pub const SKILL_SLOT_COUNT: usize = 5;
pub const DEFAULT_INVENTORY_CAPACITY: usize = 40;
pub const STAT_POINTS_PER_LEVEL: u32 = 5;
pub const SKILL_POINTS_PER_LEVEL: u32 = 1;
pub const STARTING_PRIMARY_STAT: i32 = 5;
pub const STARTING_GOLD: u64 = 100;

/// Derived stat clamps
pub const MAX_EVASION: f64 = 0.75;
pub const MAX_BLOCK_CHANCE: f64 = 0.75;
pub const MAX_LIFESTEAL: f64 = 0.08;
pub const MAX_MANA_COST_REDUCTION: f64 = 0.5;

// =====================================================
// Items
// =====================================================

pub const UNIQUE_CHANCE: f64 = 0.25;
pub const SET_CHANCE: f64 = 0.30;
pub const ITEM_LEVEL_SPREAD: i32 = 5;
pub const UNIQUE_BONUS_AFFIXES_MIN: usize = 4;
pub const UNIQUE_BONUS_AFFIXES_MAX: usize = 7;

/// Sell price when neither a rarity budget nor a merchant price is known
pub const FALLBACK_ITEM_VALUE: u64 = 10;

/// Drop chance for non-boss kills
pub const LOOT_DROP_CHANCE: f64 = 0.25;

/// Merchant stock size per map
pub const MERCHANT_STOCK: usize = 6;

// =====================================================
// Engine
// =====================================================

/// Messages kept in the engine's rolling log
pub const MESSAGE_LOG_CAPACITY: usize = 100;
