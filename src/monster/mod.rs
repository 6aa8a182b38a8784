//! Monster generation from the ecosystem-weighted species pool.
//!
//! Pipeline: candidate filter (widened until non-empty) -> evolution
//! substitution -> ecosystem weighting -> weighted draw, then tier, boss,
//! level and stat rolls, then placement on a free spawnable tile. An active
//! dungeon event short-circuits the draw with its boss species.

pub mod skills;
pub mod species;
pub mod stats;

use std::collections::{BTreeMap, HashSet};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::combat::damage::roll_chance;
use crate::combat::status::StatusEffects;
use crate::constants::*;
use crate::ecosystem::EcosystemState;
use crate::error::SpawnError;
use crate::generation::{weighted_index, Biome, TileMap, TileRules};

pub use skills::{MonsterSkill, SkillMutation};
pub use species::{Species, SpeciesCatalog};
pub use stats::{Archetype, MonsterStats, StatVariance, Tier};

/// A live monster on the current map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterInstance {
    pub id: u64,
    /// Species id, e.g. `GOBLIN`
    pub monster_type: String,
    pub name: String,
    pub x: usize,
    pub y: usize,
    pub level: u32,
    pub tier: Tier,
    pub archetype: Archetype,
    pub stats: MonsterStats,
    pub is_boss: bool,
    pub skills: Vec<MonsterSkill>,
    pub status_effects: StatusEffects,
    pub skill_cooldowns: BTreeMap<MonsterSkill, u32>,
    pub threat_color: String,
}

impl MonsterInstance {
    pub fn is_alive(&self) -> bool {
        self.stats.hp > 0
    }

    /// Skills whose cooldown has run out
    pub fn ready_skills(&self) -> Vec<MonsterSkill> {
        self.skills
            .iter()
            .copied()
            .filter(|s| self.skill_cooldowns.get(s).copied().unwrap_or(0) == 0)
            .collect()
    }

    pub fn tick_cooldowns(&mut self) {
        for turns in self.skill_cooldowns.values_mut() {
            *turns = turns.saturating_sub(1);
        }
    }
}

/// Scarcity boost below 50, abundance discount above 150
pub fn population_factor(population: u32) -> f64 {
    let pop = population as f64;
    if pop < SCARCITY_PIVOT {
        1.0 + (SCARCITY_PIVOT - pop) / SCARCITY_PIVOT
    } else if pop > ABUNDANCE_PIVOT {
        (1.0 - (pop - ABUNDANCE_PIVOT) / SCARCITY_PIVOT).max(MIN_SPAWN_WEIGHT)
    } else {
        1.0
    }
}

/// Inputs for one spawn
#[derive(Debug, Clone, Copy)]
pub struct SpawnRequest<'a> {
    pub id: u64,
    pub biome: Biome,
    pub player_level: u32,
    /// Species id forced by an active dungeon event
    pub forced_boss: Option<&'a str>,
}

/// Spawns monsters from a species catalog
#[derive(Debug, Clone)]
pub struct MonsterGenerator<'a> {
    catalog: &'a SpeciesCatalog,
    boss_chance: f64,
    variance: StatVariance,
}

impl<'a> MonsterGenerator<'a> {
    pub fn new(catalog: &'a SpeciesCatalog) -> Self {
        Self {
            catalog,
            boss_chance: BOSS_CHANCE,
            variance: StatVariance::default(),
        }
    }

    pub fn with_boss_chance(mut self, chance: f64) -> Self {
        self.boss_chance = chance.clamp(0.0, 1.0);
        self
    }

    pub fn with_variance(mut self, variance: StatVariance) -> Self {
        self.variance = variance;
        self
    }

    /// Natural candidates, widened step by step until something matches
    pub fn candidates(&self, biome: Biome, player_level: u32) -> Vec<&'a Species> {
        let catalog: &'a SpeciesCatalog = self.catalog;
        let filters: [&dyn Fn(&Species) -> bool; 4] = [
            &|s: &Species| s.is_natural() && s.lives_in(biome) && s.min_player_level <= player_level,
            &|s: &Species| s.is_natural() && s.lives_in(biome) && s.min_player_level <= player_level + 5,
            &|s: &Species| s.is_natural() && s.min_player_level <= player_level,
            &|s: &Species| s.is_natural(),
        ];
        for (step, filter) in filters.iter().enumerate() {
            let found: Vec<&'a Species> = catalog.all().iter().filter(|&s| filter(s)).collect();
            if !found.is_empty() {
                if step > 0 {
                    debug!(?biome, player_level, step, "widened spawn candidates");
                }
                return found;
            }
        }
        catalog.all().iter().collect()
    }

    /// Swap a basic species for its evolved form once the player outgrows it
    pub fn evolve(&self, species: &'a Species, player_level: u32) -> &'a Species {
        let Some(evolved_id) = species.evolved_form else {
            return species;
        };
        let Some(evolved) = self.catalog.get(evolved_id) else {
            return species;
        };
        if player_level >= species.min_player_level + EVOLUTION_LEVEL_GAP
            && evolved.min_player_level <= player_level + EVOLUTION_LEVEL_SLACK
        {
            evolved
        } else {
            species
        }
    }

    /// Ecosystem weight: population pressure times environment mismatch penalties
    pub fn spawn_weight(&self, species: &Species, ecosystem: &EcosystemState, biome: Biome) -> f64 {
        let mut weight = population_factor(ecosystem.population(&species.key()));
        if let Some(env) = ecosystem.environment(biome) {
            let pref = &species.ecology.preference;
            if !pref.temperature.contains(env.temperature) {
                weight *= 0.5;
            }
            if !pref.humidity.contains(env.humidity) {
                weight *= 0.8;
            }
            if !pref.magical_energy.contains(env.magical_energy) {
                weight *= 0.7;
            }
            if !pref.pollution.contains(env.pollution_level) {
                weight *= 0.9;
            }
        }
        weight
    }

    /// Returns the species and whether it was forced by an event
    pub fn select_species<R: Rng + ?Sized>(
        &self,
        ecosystem: &EcosystemState,
        request: &SpawnRequest<'_>,
        rng: &mut R,
    ) -> Result<(&'a Species, bool), SpawnError> {
        if let Some(boss_id) = request.forced_boss {
            match self.catalog.get(boss_id) {
                Some(boss) => return Ok((boss, true)),
                None => warn!(boss = boss_id, "forced boss missing from catalog"),
            }
        }

        let mut pool: Vec<&'a Species> = Vec::new();
        for species in self.candidates(request.biome, request.player_level) {
            let species = self.evolve(species, request.player_level);
            if !pool.iter().any(|s| s.id == species.id) {
                pool.push(species);
            }
        }
        if pool.is_empty() {
            return Err(SpawnError::NoCandidates);
        }

        let weights: Vec<f64> = pool
            .iter()
            .map(|s| self.spawn_weight(s, ecosystem, request.biome))
            .collect();
        let pick = weighted_index(&weights, rng).unwrap_or_else(|| rng.gen_range(0..pool.len()));
        Ok((pool[pick], false))
    }

    pub fn roll_level<R: Rng + ?Sized>(
        &self,
        species: &Species,
        player_level: u32,
        is_boss: bool,
        rng: &mut R,
    ) -> u32 {
        let offset: i32 = if is_boss {
            rng.gen_range(0..=4)
        } else {
            rng.gen_range(-2..=2)
        };
        let level = (player_level as i32 + offset).max(1) as u32;
        level.max(species.min_player_level)
    }

    /// Build an unplaced instance of `species`
    pub fn create<R: Rng + ?Sized>(
        &self,
        id: u64,
        species: &Species,
        player_level: u32,
        forced_boss: bool,
        rng: &mut R,
    ) -> MonsterInstance {
        let is_boss = forced_boss || roll_chance(rng, self.boss_chance);
        let rolled = species
            .initial_tier
            .unwrap_or_else(|| stats::roll_tier(player_level, rng));
        let tier = if is_boss {
            stats::boss_tier(rolled, player_level)
        } else {
            rolled
        };
        let level = self.roll_level(species, player_level, is_boss, rng);
        let block = stats::build_stats(level, species.archetype, tier, is_boss, &self.variance, rng);

        let name = match (is_boss, tier.title()) {
            (true, title) => format!("{title} {} (Boss)", species.name),
            (false, "") => species.name.to_string(),
            (false, title) => format!("{title} {}", species.name),
        };

        MonsterInstance {
            id,
            monster_type: species.id.to_string(),
            name,
            x: 0,
            y: 0,
            level,
            tier,
            archetype: species.archetype,
            stats: block,
            is_boss,
            skills: species.skills.to_vec(),
            status_effects: StatusEffects::default(),
            skill_cooldowns: species.skills.iter().map(|s| (*s, 0)).collect(),
            threat_color: stats::threat_color(level, player_level, tier, is_boss).to_string(),
        }
    }

    /// Full pipeline: select, roll and place on a free spawnable tile
    pub fn generate<T: TileRules + ?Sized, R: Rng + ?Sized>(
        &self,
        map: &TileMap,
        rules: &T,
        occupied: &HashSet<(usize, usize)>,
        ecosystem: &EcosystemState,
        request: &SpawnRequest<'_>,
        rng: &mut R,
    ) -> Result<MonsterInstance, SpawnError> {
        let free = map.positions_where(|x, y| {
            !occupied.contains(&(x, y)) && map.is_spawnable(x, y, rules)
        });
        if free.is_empty() {
            return Err(SpawnError::NoFreeTile);
        }

        let (species, forced) = self.select_species(ecosystem, request, rng)?;
        let mut monster = self.create(request.id, species, request.player_level, forced, rng);
        let (x, y) = free[rng.gen_range(0..free.len())];
        monster.x = x;
        monster.y = y;
        debug!(
            id = monster.id,
            species = species.id,
            level = monster.level,
            boss = monster.is_boss,
            x,
            y,
            "monster spawned"
        );
        Ok(monster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{generate, rng_from_seed, BiomeTileSet};

    fn eco() -> (SpeciesCatalog, EcosystemState) {
        let catalog = SpeciesCatalog::default();
        let state = EcosystemState::initial(&catalog);
        (catalog, state)
    }

    #[test]
    fn test_population_factor() {
        assert_eq!(population_factor(100), 1.0);
        assert_eq!(population_factor(0), 2.0);
        assert_eq!(population_factor(25), 1.5);
        assert_eq!(population_factor(175), 0.5);
        assert!((population_factor(200) - MIN_SPAWN_WEIGHT).abs() < 1e-12);
    }

    #[test]
    fn test_candidates_never_empty() {
        let (catalog, _) = eco();
        let gen = MonsterGenerator::new(&catalog);
        for biome in Biome::ALL {
            for level in [0, 1, 5, 30, 99] {
                assert!(!gen.candidates(biome, level).is_empty());
            }
        }
        let only_bosses = SpeciesCatalog::new(
            species::standard_species()
                .into_iter()
                .filter(|s| !s.is_natural())
                .collect(),
        );
        let gen = MonsterGenerator::new(&only_bosses);
        assert!(!gen.candidates(Biome::Forest, 1).is_empty());
    }

    #[test]
    fn test_candidates_respect_biome_and_level() {
        let (catalog, _) = eco();
        let gen = MonsterGenerator::new(&catalog);
        let found = gen.candidates(Biome::Volcano, 1);
        // no volcano species at level 1: second step lets in level <= 6
        assert!(found.iter().all(|s| s.lives_in(Biome::Volcano) && s.min_player_level <= 6));
        assert!(found.iter().all(|s| s.is_natural()));
    }

    #[test]
    fn test_evolution_window() {
        let (catalog, _) = eco();
        let gen = MonsterGenerator::new(&catalog);
        let goblin = catalog.get("GOBLIN").unwrap();
        assert_eq!(gen.evolve(goblin, 10).id, "GOBLIN");
        assert_eq!(gen.evolve(goblin, 11).id, "HOBGOBLIN");
        let slime = catalog.get("SLIME").unwrap();
        assert_eq!(gen.evolve(slime, 11).id, "POISON_SLIME");
        let wolf = catalog.get("WOLF").unwrap();
        // dire wolf needs 14, wolf evolves at 12: 14 <= 12 + 5
        assert_eq!(gen.evolve(wolf, 12).id, "DIRE_WOLF");
    }

    #[test]
    fn test_forced_boss_short_circuits() {
        let (catalog, state) = eco();
        let gen = MonsterGenerator::new(&catalog);
        let mut rng = rng_from_seed(3);
        let request = SpawnRequest {
            id: 1,
            biome: Biome::Forest,
            player_level: 3,
            forced_boss: Some("GOBLIN_KING"),
        };
        let (species, forced) = gen.select_species(&state, &request, &mut rng).unwrap();
        assert_eq!(species.id, "GOBLIN_KING");
        assert!(forced);
        let monster = gen.create(1, species, 3, forced, &mut rng);
        assert!(monster.is_boss);
        assert_eq!(monster.tier, Tier::Elite);
        assert!(monster.name.contains("Goblin King"));
        assert!(monster.level >= 5);
    }

    #[test]
    fn test_scarce_species_favoured() {
        let (catalog, mut state) = eco();
        let gen = MonsterGenerator::new(&catalog);
        let goblin = catalog.get("GOBLIN").unwrap();
        let base = gen.spawn_weight(goblin, &state, Biome::Forest);
        state.monster_population.insert("goblin".into(), 10);
        assert!(gen.spawn_weight(goblin, &state, Biome::Forest) > base);
        let imp = catalog.get("FIRE_IMP").unwrap();
        assert!(gen.spawn_weight(imp, &state, Biome::Ice) < gen.spawn_weight(imp, &state, Biome::Volcano));
    }

    #[test]
    fn test_monster_levels_floor_at_species_minimum() {
        let (catalog, _) = eco();
        let gen = MonsterGenerator::new(&catalog).with_boss_chance(0.0);
        let treant = catalog.get("TREANT").unwrap();
        let mut rng = rng_from_seed(9);
        for id in 0..50 {
            let m = gen.create(id, treant, 1, false, &mut rng);
            assert!(m.level >= 8);
            assert_eq!(m.tier, Tier::Advanced);
            assert!(!m.is_boss);
        }
    }

    #[test]
    fn test_generate_places_on_free_spawnable_tile() {
        let (catalog, state) = eco();
        let rules = BiomeTileSet::for_biome(Biome::Cave);
        let mut rng = rng_from_seed(21);
        let map = generate(12, 10, &rules, 10, &mut rng).unwrap();
        let gen = MonsterGenerator::new(&catalog);
        let mut occupied = HashSet::new();
        for id in 0..20 {
            let request = SpawnRequest {
                id,
                biome: Biome::Cave,
                player_level: 4,
                forced_boss: None,
            };
            let m = gen.generate(&map, &rules, &occupied, &state, &request, &mut rng).unwrap();
            assert!(map.is_spawnable(m.x, m.y, &rules));
            assert!(occupied.insert((m.x, m.y)), "tile reused");
            assert!(m.stats.hp > 0);
        }
    }

    #[test]
    fn test_generate_reports_full_map() {
        let (catalog, state) = eco();
        let rules = BiomeTileSet::for_biome(Biome::Forest);
        let map = generate(1, 1, &rules, 10, &mut rng_from_seed(1)).unwrap();
        let occupied: HashSet<_> = [(0, 0)].into_iter().collect();
        let gen = MonsterGenerator::new(&catalog);
        let request = SpawnRequest {
            id: 1,
            biome: Biome::Forest,
            player_level: 1,
            forced_boss: None,
        };
        assert_eq!(
            gen.generate(&map, &rules, &occupied, &state, &request, &mut rng_from_seed(2)),
            Err(SpawnError::NoFreeTile)
        );
    }
}
