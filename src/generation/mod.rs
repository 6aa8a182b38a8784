pub mod tiles;
pub mod wfc;

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

pub use tiles::{BiomeTileSet, TileClass, TileDef, TileId, TileRules};
pub use wfc::{generate, MapTile, TileMap, WfcGenerator};

/// The simulation RNG. Every engine takes `&mut impl Rng`, sessions own one of these.
pub type GameRng = Xoshiro256PlusPlus;

pub fn rng_from_seed(seed: u64) -> GameRng {
    Xoshiro256PlusPlus::seed_from_u64(seed)
}

/// Session seed - the root of all procedural generation in a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSeed {
    pub seed: u64,
}

impl Default for MapSeed {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl MapSeed {
    /// Deterministic per-map hash from session seed, map index and biome
    pub fn map_hash(&self, map_index: u32, biome: Biome) -> u64 {
        let mut hasher = Sha3_256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(map_index.to_le_bytes());
        hasher.update(biome.key().as_bytes());
        let result = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&result[0..8]);
        u64::from_le_bytes(bytes)
    }
}

/// Dungeon biome. Exactly one is current at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Biome {
    Forest,
    Ice,
    Cave,
    Volcano,
}

impl Biome {
    pub const ALL: [Biome; 4] = [Biome::Forest, Biome::Ice, Biome::Cave, Biome::Volcano];

    /// Key used in persisted ecosystem state
    pub fn key(&self) -> &'static str {
        match self {
            Biome::Forest => "forest",
            Biome::Ice => "ice",
            Biome::Cave => "cave",
            Biome::Volcano => "volcano",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.key() == key)
    }

    /// Base render color, also the fallback when tile sprites are missing
    pub fn base_color(&self) -> &'static str {
        match self {
            Biome::Forest => "#2d5a27",
            Biome::Ice => "#cfe8f3",
            Biome::Cave => "#3b3b3b",
            Biome::Volcano => "#5a1f14",
        }
    }
}

/// Grid direction. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    /// Step from (x, y) inside a width x height grid
    pub fn step(&self, x: usize, y: usize, width: usize, height: usize) -> Option<(usize, usize)> {
        match self {
            Direction::Up => y.checked_sub(1).map(|ny| (x, ny)),
            Direction::Down => (y + 1 < height).then_some((x, y + 1)),
            Direction::Left => x.checked_sub(1).map(|nx| (nx, y)),
            Direction::Right => (x + 1 < width).then_some((x + 1, y)),
        }
    }
}

/// Weighted random draw over a weight list. Non-finite and non-positive
/// weights never win. Returns `None` when nothing can be drawn.
pub fn weighted_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let usable = |w: f64| w.is_finite() && w > 0.0;
    let total: f64 = weights.iter().copied().filter(|w| usable(*w)).sum();
    if total <= 0.0 {
        return None;
    }

    let mut roll = rng.gen::<f64>() * total;
    let mut last = None;
    for (i, w) in weights.iter().copied().enumerate() {
        if !usable(w) {
            continue;
        }
        last = Some(i);
        if roll < w {
            return Some(i);
        }
        roll -= w;
    }
    // Float rounding can leave a sliver past the final bucket
    last
}
