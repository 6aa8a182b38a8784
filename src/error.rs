//! Error types shared across the simulation engines.
//!
//! Generation failures and persistence problems are real errors. Expected
//! player-facing refusals (not enough gold, skill on cooldown, ...) are
//! `ActionRejected` values returned from validated mutations.

use thiserror::Error;

/// Map generation failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("invalid map dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("tile set is empty")]
    EmptyTileSet,
    #[error("contradiction at ({x}, {y}): no tile options left")]
    Contradiction { x: usize, y: usize },
    #[error("map generation failed after {attempts} attempts")]
    AttemptsExhausted { attempts: u32 },
}

/// Monster spawning failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpawnError {
    #[error("species catalog has no candidates")]
    NoCandidates,
    #[error("no walkable, spawnable and unoccupied tile left")]
    NoFreeTile,
}

/// Persistence failures (the storage backend itself is a collaborator)
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("saved state has no entry for '{0}'")]
    MissingEntry(String),
}

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A validated mutation was refused. The `Display` text is shown to the player.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionRejected {
    #[error("Inventory is full.")]
    InventoryFull,
    #[error("No item at inventory position {0}.")]
    NoSuchItem(usize),
    #[error("Nothing is equipped in the {0} slot.")]
    SlotEmpty(String),
    #[error("Not enough gold: need {needed}, have {available}.")]
    NotEnoughGold { needed: u64, available: u64 },
    #[error("Not enough mana: need {needed}, have {available}.")]
    NotEnoughMana { needed: i32, available: i32 },
    #[error("{0} is on cooldown for {1} more turn(s).")]
    OnCooldown(String, u32),
    #[error("Not enough skill points: need {needed}, have {available}.")]
    NotEnoughSkillPoints { needed: u32, available: u32 },
    #[error("No stat points to allocate.")]
    NoStatPoints,
    #[error("{skill} requires {dependency} at max level.")]
    DependencyNotMastered { skill: String, dependency: String },
    #[error("{0} is already at max level.")]
    MaxLevel(String),
    #[error("{0} has not been learned.")]
    NotLearned(String),
    #[error("{0} is a passive skill.")]
    PassiveSkill(String),
    #[error("Skill slot {0} does not exist.")]
    InvalidSkillSlot(usize),
    #[error("Skill slot {0} is empty.")]
    EmptySkillSlot(usize),
    #[error("Unknown skill: {0}.")]
    UnknownSkill(String),
    #[error("{0} requires a shield.")]
    RequiresShield(String),
    #[error("No combat in progress.")]
    NoCombat,
    #[error("Already in combat.")]
    AlreadyInCombat,
    #[error("It is not your turn.")]
    NotYourTurn,
    #[error("No monster with id {0}.")]
    NoSuchMonster(u64),
    #[error("The way is blocked.")]
    Blocked,
    #[error("No merchant stock at position {0}.")]
    NoSuchStock(usize),
    #[error("No map has been generated yet.")]
    NoMap,
}
