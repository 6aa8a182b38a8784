//! Wave Function Collapse map generator.
//!
//! Collapses a width x height grid over a biome's tile set: pick the
//! uncollapsed cell with minimum weighted Shannon entropy, collapse it with a
//! weighted draw (locally biased away from lakeshore forests and walled-in
//! pockets), then propagate adjacency constraints until a fixpoint. A
//! contradiction resets the grid and retries up to a bounded attempt count.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::tiles::{TileClass, TileId, TileRules};
use super::{weighted_index, Biome, Direction};
use crate::constants::*;
use crate::error::GenerationError;
use crate::logging::TimingSpan;

/// A cell of the wave. Options only ever shrink.
#[derive(Debug, Clone, PartialEq)]
pub struct TileCell {
    pub x: usize,
    pub y: usize,
    pub collapsed: bool,
    /// Remaining tile options, ascending
    pub options: Vec<TileId>,
}

impl TileCell {
    fn new(x: usize, y: usize, tile_count: usize) -> Self {
        Self {
            x,
            y,
            collapsed: false,
            options: (0..tile_count).collect(),
        }
    }

    /// Weighted Shannon entropy: ln(ΣW) − Σ(W·lnW)/ΣW
    pub fn entropy<T: TileRules + ?Sized>(&self, rules: &T) -> f64 {
        let mut sum = 0.0;
        let mut sum_wlogw = 0.0;
        for &id in &self.options {
            let w = rules.tile(id).map(|t| t.base_weight).unwrap_or(0.0);
            if w > 0.0 {
                sum += w;
                sum_wlogw += w * w.ln();
            }
        }
        if sum <= 0.0 {
            return 0.0;
        }
        sum.ln() - sum_wlogw / sum
    }
}

/// Output cell: only the resolved tile name survives generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTile {
    pub name: String,
}

/// A fully collapsed map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMap {
    pub width: usize,
    pub height: usize,
    pub biome: Option<Biome>,
    /// `tiles[y][x]`
    pub tiles: Vec<Vec<MapTile>>,
}

impl TileMap {
    pub fn tile(&self, x: usize, y: usize) -> Option<&MapTile> {
        self.tiles.get(y).and_then(|row| row.get(x))
    }

    fn props<'a, T: TileRules + ?Sized>(
        &self,
        x: usize,
        y: usize,
        rules: &'a T,
    ) -> Option<&'a super::TileDef> {
        let tile = self.tile(x, y)?;
        match rules.lookup(&tile.name) {
            Some(id) => rules.tile(id),
            None => {
                warn!(tile = %tile.name, x, y, "unknown tile name, treated as blocking");
                None
            }
        }
    }

    /// Unknown tiles and out-of-bounds positions are never walkable
    pub fn is_walkable<T: TileRules + ?Sized>(&self, x: usize, y: usize, rules: &T) -> bool {
        self.props(x, y, rules).is_some_and(|t| t.walkable)
    }

    pub fn is_spawnable<T: TileRules + ?Sized>(&self, x: usize, y: usize, rules: &T) -> bool {
        self.props(x, y, rules)
            .is_some_and(|t| t.walkable && t.spawnable)
    }

    /// All (x, y) positions satisfying a predicate, row-major
    pub fn positions_where(&self, mut pred: impl FnMut(usize, usize) -> bool) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if pred(x, y) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    /// Adjacent pairs whose tiles break the rule table (empty for any generated map)
    pub fn adjacency_violations<T: TileRules + ?Sized>(
        &self,
        rules: &T,
    ) -> Vec<((usize, usize), Direction)> {
        let mut violations = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let Some(here) = self.tile(x, y).and_then(|t| rules.lookup(&t.name)) else {
                    violations.push(((x, y), Direction::Up));
                    continue;
                };
                for dir in Direction::ALL {
                    let Some((nx, ny)) = dir.step(x, y, self.width, self.height) else {
                        continue;
                    };
                    let there = self.tile(nx, ny).and_then(|t| rules.lookup(&t.name));
                    if !there.is_some_and(|n| rules.permits(here, dir, n)) {
                        violations.push(((x, y), dir));
                    }
                }
            }
        }
        violations
    }
}

/// WFC engine bound to one tile rule strategy
pub struct WfcGenerator<'a, T: TileRules + ?Sized> {
    rules: &'a T,
    width: usize,
    height: usize,
    max_attempts: u32,
}

impl<'a, T: TileRules + ?Sized> WfcGenerator<'a, T> {
    pub fn new(rules: &'a T, width: usize, height: usize) -> Self {
        Self {
            rules,
            width,
            height,
            max_attempts: WFC_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Run attempts until one fully collapses. Exhaustion is fatal for the caller.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TileMap, GenerationError> {
        let _timing = TimingSpan::new("wfc_generate");

        if self.width == 0 || self.height == 0 {
            return Err(GenerationError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.rules.tiles().is_empty() {
            return Err(GenerationError::EmptyTileSet);
        }

        for attempt in 1..=self.max_attempts {
            match self.attempt(rng) {
                Ok(cells) => {
                    debug!(attempt, width = self.width, height = self.height, "map collapsed");
                    return Ok(self.to_map(&cells));
                }
                Err(GenerationError::Contradiction { x, y }) => {
                    debug!(attempt, x, y, "contradiction, resetting wave");
                }
                Err(other) => return Err(other),
            }
        }

        error!(
            attempts = self.max_attempts,
            biome = ?self.rules.biome(),
            "map generation exhausted its attempts"
        );
        Err(GenerationError::AttemptsExhausted {
            attempts: self.max_attempts,
        })
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn attempt<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<TileCell>, GenerationError> {
        let tile_count = self.rules.tiles().len();
        let mut cells: Vec<TileCell> = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| TileCell::new(x, y, tile_count)))
            .collect();

        while let Some(idx) = self.min_entropy_cell(&cells, rng)? {
            self.collapse(&mut cells, idx, rng)?;
            self.propagate(&mut cells, idx)?;
        }

        if let Some(cell) = cells.iter().find(|c| !c.collapsed) {
            return Err(GenerationError::Contradiction {
                x: cell.x,
                y: cell.y,
            });
        }
        Ok(cells)
    }

    /// Uniform tie-break among the cells of minimum entropy
    fn min_entropy_cell<R: Rng + ?Sized>(
        &self,
        cells: &[TileCell],
        rng: &mut R,
    ) -> Result<Option<usize>, GenerationError> {
        const EPSILON: f64 = 1e-9;
        let mut min_entropy = f64::INFINITY;
        let mut candidates: Vec<usize> = Vec::new();

        for (idx, cell) in cells.iter().enumerate() {
            if cell.collapsed {
                continue;
            }
            if cell.options.is_empty() {
                return Err(GenerationError::Contradiction {
                    x: cell.x,
                    y: cell.y,
                });
            }
            let entropy = cell.entropy(self.rules);
            if entropy < min_entropy - EPSILON {
                min_entropy = entropy;
                candidates.clear();
                candidates.push(idx);
            } else if (entropy - min_entropy).abs() <= EPSILON {
                candidates.push(idx);
            }
        }

        if candidates.is_empty() {
            return Ok(None);
        }
        Ok(Some(candidates[rng.gen_range(0..candidates.len())]))
    }

    fn collapsed_neighbors(&self, cells: &[TileCell], x: usize, y: usize) -> Vec<TileId> {
        Direction::ALL
            .iter()
            .filter_map(|dir| dir.step(x, y, self.width, self.height))
            .map(|(nx, ny)| &cells[self.index(nx, ny)])
            .filter(|c| c.collapsed)
            .filter_map(|c| c.options.first().copied())
            .collect()
    }

    /// Collapse one cell using a locally re-weighted copy of the base weights
    fn collapse<R: Rng + ?Sized>(
        &self,
        cells: &mut [TileCell],
        idx: usize,
        rng: &mut R,
    ) -> Result<(), GenerationError> {
        let (x, y) = (cells[idx].x, cells[idx].y);
        let neighbors = self.collapsed_neighbors(cells, x, y);

        let class_of = |id: TileId| self.rules.tile(id).map(|t| t.class);
        let walkable = |id: TileId| self.rules.tile(id).is_some_and(|t| t.walkable);

        let near_lake = neighbors
            .iter()
            .any(|&n| class_of(n) == Some(TileClass::Water));
        let blocking_neighbors = neighbors.iter().filter(|&&n| !walkable(n)).count();
        let hemmed_in = blocking_neighbors >= SOFTLOCK_NEIGHBOR_THRESHOLD;

        let options = cells[idx].options.clone();
        let weights: Vec<f64> = options
            .iter()
            .map(|&id| {
                let mut w = self.rules.tile(id).map(|t| t.base_weight).unwrap_or(0.0);
                if near_lake && class_of(id) == Some(TileClass::Vegetation) {
                    w *= LAKESHORE_WOOD_FACTOR;
                }
                if hemmed_in {
                    w *= if walkable(id) {
                        SOFTLOCK_WALKABLE_FACTOR
                    } else {
                        SOFTLOCK_BLOCKING_FACTOR
                    };
                }
                w
            })
            .collect();

        let Some(pick) = weighted_index(&weights, rng) else {
            return Err(GenerationError::Contradiction { x, y });
        };

        let cell = &mut cells[idx];
        cell.options = vec![options[pick]];
        cell.collapsed = true;
        Ok(())
    }

    /// Intersect neighbour options with what the current cell's options allow,
    /// checking the rule in both directions.
    fn propagate(&self, cells: &mut [TileCell], start: usize) -> Result<(), GenerationError> {
        let mut stack = vec![start];

        while let Some(idx) = stack.pop() {
            let (x, y) = (cells[idx].x, cells[idx].y);
            let current = cells[idx].options.clone();

            for dir in Direction::ALL {
                let Some((nx, ny)) = dir.step(x, y, self.width, self.height) else {
                    continue;
                };
                let nidx = self.index(nx, ny);
                if cells[nidx].collapsed {
                    continue;
                }

                let before = cells[nidx].options.len();
                cells[nidx].options.retain(|&candidate| {
                    current.iter().any(|&c| {
                        self.rules.permits(c, dir, candidate)
                            && self.rules.permits(candidate, dir.opposite(), c)
                    })
                });

                let after = cells[nidx].options.len();
                if after == 0 {
                    return Err(GenerationError::Contradiction { x: nx, y: ny });
                }
                if after < before {
                    stack.push(nidx);
                }
            }
        }
        Ok(())
    }

    fn to_map(&self, cells: &[TileCell]) -> TileMap {
        let mut tiles = Vec::with_capacity(self.height);
        for y in 0..self.height {
            let row = (0..self.width)
                .map(|x| {
                    let id = cells[self.index(x, y)].options[0];
                    let name = self
                        .rules
                        .tile(id)
                        .map(|t| t.name.to_string())
                        .unwrap_or_default();
                    MapTile { name }
                })
                .collect();
            tiles.push(row);
        }
        TileMap {
            width: self.width,
            height: self.height,
            biome: self.rules.biome(),
            tiles,
        }
    }
}

/// Convenience entry point: `generate(width, height, tile set)`
pub fn generate<T: TileRules + ?Sized, R: Rng + ?Sized>(
    width: usize,
    height: usize,
    rules: &T,
    max_attempts: u32,
    rng: &mut R,
) -> Result<TileMap, GenerationError> {
    WfcGenerator::new(rules, width, height)
        .with_max_attempts(max_attempts)
        .generate(rng)
}
