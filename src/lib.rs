//! Dungeon Procedural Core
//!
//! Deterministic simulation core for a tile-based dungeon roguelike:
//! - Wave Function Collapse map generation with per-biome adjacency rules
//! - Dungeon ecosystem (populations, environment, event flags)
//! - Ecosystem-weighted monster generation
//! - Item generation (rarity budgets, affixes, uniques, sets)
//! - Turn-based combat with status effects, skills and cooldowns
//! - Player progression (derived stat pipeline, skill trees)
//! - Simulation context with a logical turn scheduler

pub mod abilities;
pub mod combat;
pub mod constants;
pub mod economy;
pub mod ecosystem;
pub mod engine;
pub mod equipment;
pub mod error;
pub mod generation;
pub mod logging;
pub mod loot;
pub mod monster;
pub mod player;
pub mod storage;

pub use engine::{GameConfig, GameEngine};
pub use error::{ActionRejected, GenerationError};
