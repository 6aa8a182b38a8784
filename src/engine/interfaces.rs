//! Collaborator seams: rendering, sprite assets and persistence.
//!
//! The simulation hands a `RenderSnapshot` to a `Renderer` and never waits
//! on it. Sprite availability only changes what the snapshot names; a
//! missing sprite falls back to a color.

use std::collections::HashSet;

use serde::Serialize;

use crate::generation::{Biome, TileRules};

pub use crate::storage::{JsonFileStore, MemoryStore, StateStore};

pub trait Renderer {
    fn redraw(&mut self, snapshot: &RenderSnapshot);
}

pub trait AssetLoader {
    fn sprite_available(&self, key: &str) -> bool;
}

/// Set of sprite keys the host managed to load
#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    loaded: HashSet<String>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_loaded(&mut self, key: impl Into<String>) {
        self.loaded.insert(key.into());
    }
}

impl AssetLoader for AssetManifest {
    fn sprite_available(&self, key: &str) -> bool {
        self.loaded.contains(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Visual {
    Sprite(String),
    Color(String),
}

pub fn tile_sprite_key(tile: &str, biome: Biome) -> String {
    format!("tiles/{}/{tile}", biome.key())
}

pub fn monster_sprite_key(monster_type: &str) -> String {
    format!("monsters/{}", monster_type.to_lowercase())
}

/// Sprite when loaded, else the tile's fallback color, else the biome color
pub fn tile_visual<T: TileRules + ?Sized>(
    tile: &str,
    biome: Biome,
    rules: &T,
    assets: &dyn AssetLoader,
) -> Visual {
    let key = tile_sprite_key(tile, biome);
    if assets.sprite_available(&key) {
        return Visual::Sprite(key);
    }
    let color = rules
        .lookup(tile)
        .and_then(|id| rules.tile(id))
        .map(|def| def.fallback_color)
        .unwrap_or_else(|| biome.base_color());
    Visual::Color(color.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterMarker {
    pub id: u64,
    pub x: usize,
    pub y: usize,
    pub name: String,
    pub visual: Visual,
    pub threat_color: String,
    pub is_boss: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMarker {
    pub x: usize,
    pub y: usize,
    pub name: String,
    pub color: String,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSnapshot {
    pub biome: Biome,
    pub width: usize,
    pub height: usize,
    /// `tiles[y][x]`
    pub tiles: Vec<Vec<Visual>>,
    pub player: (usize, usize),
    pub player_hp: i32,
    pub player_max_hp: i32,
    pub monsters: Vec<MonsterMarker>,
    pub items: Vec<ItemMarker>,
    pub in_combat: bool,
    pub messages: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::BiomeTileSet;

    #[test]
    fn test_missing_sprite_falls_back_to_color() {
        let rules = BiomeTileSet::for_biome(Biome::Forest);
        let none = AssetManifest::new();
        let grass = rules.tiles.iter().find(|t| t.name == "grass").unwrap();
        assert_eq!(
            tile_visual("grass", Biome::Forest, &rules, &none),
            Visual::Color(grass.fallback_color.to_string())
        );
        assert_eq!(
            tile_visual("no_such_tile", Biome::Forest, &rules, &none),
            Visual::Color(Biome::Forest.base_color().to_string())
        );
    }

    #[test]
    fn test_loaded_sprite_is_used() {
        let rules = BiomeTileSet::for_biome(Biome::Ice);
        let mut assets = AssetManifest::new();
        assets.mark_loaded(tile_sprite_key("snow", Biome::Ice));
        assert_eq!(
            tile_visual("snow", Biome::Ice, &rules, &assets),
            Visual::Sprite("tiles/ice/snow".into())
        );
    }
}
