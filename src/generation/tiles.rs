//! Adjacency tile model.
//!
//! Each biome owns a static table of tile types (walkability, spawnability,
//! base weight) and directional adjacency rules. The WFC generator consumes
//! the table through the `TileRules` strategy trait, so swapping biome means
//! handing the generator a different rule object.

use serde::Serialize;

use super::{Biome, Direction};

/// Index of a tile type inside its tile set
pub type TileId = usize;

/// Broad tile class used by the contextual WFC heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TileClass {
    Ground,
    Water,
    Vegetation,
    Rock,
    Hazard,
}

/// Immutable tile type properties
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileDef {
    pub name: &'static str,
    pub class: TileClass,
    pub walkable: bool,
    pub spawnable: bool,
    pub base_weight: f64,
    pub transparency: Option<f32>,
    pub fallback_color: &'static str,
}

impl TileDef {
    pub const fn new(
        name: &'static str,
        class: TileClass,
        walkable: bool,
        spawnable: bool,
        base_weight: f64,
        fallback_color: &'static str,
    ) -> Self {
        Self {
            name,
            class,
            walkable,
            spawnable,
            base_weight,
            transparency: None,
            fallback_color,
        }
    }

    pub const fn with_transparency(mut self, alpha: f32) -> Self {
        self.transparency = Some(alpha);
        self
    }
}

/// Strategy consumed by the WFC generator
pub trait TileRules {
    fn tiles(&self) -> &[TileDef];

    /// Tiles permitted as the neighbour of `tile` in direction `dir`
    fn allowed(&self, tile: TileId, dir: Direction) -> &[TileId];

    fn biome(&self) -> Option<Biome> {
        None
    }

    fn tile(&self, id: TileId) -> Option<&TileDef> {
        self.tiles().get(id)
    }

    fn lookup(&self, name: &str) -> Option<TileId> {
        self.tiles().iter().position(|t| t.name == name)
    }

    fn permits(&self, tile: TileId, dir: Direction, neighbor: TileId) -> bool {
        self.allowed(tile, dir).contains(&neighbor)
    }
}

/// Concrete tile table for one biome (or a custom table in tests/tools)
#[derive(Debug, Clone, Serialize)]
pub struct BiomeTileSet {
    pub biome: Option<Biome>,
    pub tiles: Vec<TileDef>,
    /// `adjacency[tile][direction]` (Up, Down, Left, Right)
    pub adjacency: Vec<[Vec<TileId>; 4]>,
}

impl TileRules for BiomeTileSet {
    fn tiles(&self) -> &[TileDef] {
        &self.tiles
    }

    fn allowed(&self, tile: TileId, dir: Direction) -> &[TileId] {
        self.adjacency
            .get(tile)
            .map(|dirs| dirs[dir.index()].as_slice())
            .unwrap_or(&[])
    }

    fn biome(&self) -> Option<Biome> {
        self.biome
    }
}

/// Builds adjacency tables where every rule is inserted in both directions
pub struct RuleBuilder {
    tiles: Vec<TileDef>,
    adjacency: Vec<[Vec<TileId>; 4]>,
}

impl RuleBuilder {
    pub fn new(tiles: Vec<TileDef>) -> Self {
        let adjacency = vec![Default::default(); tiles.len()];
        Self { tiles, adjacency }
    }

    fn id(&self, name: &str) -> Option<TileId> {
        self.tiles.iter().position(|t| t.name == name)
    }

    /// `b` may sit in direction `dir` of `a` (and `a` opposite of `b`)
    pub fn allow(mut self, a: &str, b: &str, dirs: &[Direction]) -> Self {
        let (Some(ia), Some(ib)) = (self.id(a), self.id(b)) else {
            tracing::warn!(a, b, "adjacency rule references unknown tile, skipped");
            return self;
        };
        for dir in dirs {
            push_unique(&mut self.adjacency[ia][dir.index()], ib);
            push_unique(&mut self.adjacency[ib][dir.opposite().index()], ia);
        }
        self
    }

    pub fn allow_all(self, a: &str, b: &str) -> Self {
        self.allow(a, b, &Direction::ALL)
    }

    pub fn build(self, biome: Option<Biome>) -> BiomeTileSet {
        BiomeTileSet {
            biome,
            tiles: self.tiles,
            adjacency: self.adjacency,
        }
    }
}

fn push_unique(list: &mut Vec<TileId>, id: TileId) {
    if !list.contains(&id) {
        list.push(id);
        list.sort_unstable();
    }
}

impl BiomeTileSet {
    /// Static rule table for a biome
    pub fn for_biome(biome: Biome) -> Self {
        match biome {
            Biome::Forest => forest(),
            Biome::Ice => ice(),
            Biome::Cave => cave(),
            Biome::Volcano => volcano(),
        }
    }
}

/// Shared shape of every biome table: one primary ground tile that accepts
/// everything, a secondary ground tile, water, vegetation and rock.
fn standard_rules(tiles: Vec<TileDef>, names: [&str; 5]) -> RuleBuilder {
    let [ground, ground2, water, wood, rock] = names;
    let mut builder = RuleBuilder::new(tiles);
    for name in names {
        builder = builder.allow_all(ground, name);
    }
    builder
        .allow_all(ground2, ground2)
        .allow_all(ground2, water)
        .allow_all(ground2, wood)
        .allow_all(ground2, rock)
        .allow_all(water, water)
        .allow_all(wood, wood)
        .allow_all(wood, rock)
        .allow_all(rock, rock)
}

fn forest() -> BiomeTileSet {
    let tiles = vec![
        TileDef::new("grass", TileClass::Ground, true, true, 60.0, "#4c8c3f"),
        TileDef::new("flowers", TileClass::Ground, true, true, 12.0, "#8fbf5a"),
        TileDef::new("forest_lake", TileClass::Water, false, false, 8.0, "#2f6fb0")
            .with_transparency(0.8),
        TileDef::new("oak", TileClass::Vegetation, false, false, 10.0, "#1f4a1a"),
        TileDef::new("boulder", TileClass::Rock, false, false, 4.0, "#7a7a72"),
    ];
    standard_rules(tiles, ["grass", "flowers", "forest_lake", "oak", "boulder"])
        .build(Some(Biome::Forest))
}

fn ice() -> BiomeTileSet {
    let tiles = vec![
        TileDef::new("snow", TileClass::Ground, true, true, 60.0, "#f4f8fb"),
        TileDef::new("ice_floor", TileClass::Ground, true, true, 15.0, "#bfe3f2"),
        TileDef::new("frozen_lake", TileClass::Water, true, false, 7.0, "#8cc7e8")
            .with_transparency(0.9),
        TileDef::new("pine", TileClass::Vegetation, false, false, 9.0, "#24503c"),
        TileDef::new("ice_rock", TileClass::Rock, false, false, 5.0, "#9fb4c2"),
    ];
    standard_rules(tiles, ["snow", "ice_floor", "frozen_lake", "pine", "ice_rock"])
        .build(Some(Biome::Ice))
}

fn cave() -> BiomeTileSet {
    let tiles = vec![
        TileDef::new("cave_floor", TileClass::Ground, true, true, 60.0, "#5b5048"),
        TileDef::new("gravel", TileClass::Ground, true, true, 14.0, "#6e655c"),
        TileDef::new("underground_pool", TileClass::Water, false, false, 6.0, "#1d3f5c"),
        TileDef::new("mushroom_cluster", TileClass::Vegetation, true, false, 6.0, "#8a5fa8"),
        TileDef::new("cave_wall", TileClass::Rock, false, false, 12.0, "#2a2522"),
    ];
    // Mushrooms only grow beneath walls, never on top of them
    let mut builder = RuleBuilder::new(tiles);
    for name in ["cave_floor", "gravel", "underground_pool", "mushroom_cluster", "cave_wall"] {
        builder = builder.allow_all("cave_floor", name);
    }
    builder
        .allow_all("gravel", "gravel")
        .allow_all("gravel", "underground_pool")
        .allow_all("gravel", "mushroom_cluster")
        .allow_all("gravel", "cave_wall")
        .allow_all("underground_pool", "underground_pool")
        .allow_all("mushroom_cluster", "mushroom_cluster")
        .allow_all("cave_wall", "cave_wall")
        .allow(
            "cave_wall",
            "mushroom_cluster",
            &[Direction::Down, Direction::Left, Direction::Right],
        )
        .build(Some(Biome::Cave))
}

fn volcano() -> BiomeTileSet {
    let tiles = vec![
        TileDef::new("ash", TileClass::Ground, true, true, 55.0, "#4a4340"),
        TileDef::new("basalt", TileClass::Ground, true, true, 18.0, "#2e2a29"),
        TileDef::new("lava_pool", TileClass::Water, false, false, 8.0, "#e2571e")
            .with_transparency(1.0),
        TileDef::new("charred_tree", TileClass::Vegetation, false, false, 6.0, "#1a1210"),
        TileDef::new("obsidian_spire", TileClass::Rock, false, false, 6.0, "#140f1c"),
    ];
    standard_rules(
        tiles,
        ["ash", "basalt", "lava_pool", "charred_tree", "obsidian_spire"],
    )
    .build(Some(Biome::Volcano))
}
