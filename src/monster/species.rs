//! Static species catalog with ecology.
//!
//! Species ids are SCREAMING_SNAKE (`POISON_SLIME`); the ecosystem keys
//! populations by the camelCase form (`poisonSlime`). Boss species are
//! event-only: they never enter the natural spawn pool and appear only when
//! a dungeon event forces them.

use serde::Serialize;
use tracing::warn;

use super::skills::MonsterSkill;
use super::stats::{Archetype, Tier};
use crate::combat::Element;
use crate::generation::Biome;

/// Inclusive preferred range for one environment variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvironmentPreference {
    pub temperature: Band,
    pub humidity: Band,
    pub magical_energy: Band,
    pub pollution: Band,
}

impl Default for EnvironmentPreference {
    fn default() -> Self {
        Self {
            temperature: Band::new(-20.0, 50.0),
            humidity: Band::new(0.0, 1.0),
            magical_energy: Band::new(0.0, 1.0),
            pollution: Band::new(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ecology {
    pub prey: &'static [&'static str],
    pub predators: &'static [&'static str],
    pub competitors: &'static [&'static str],
    pub preference: EnvironmentPreference,
    pub element: Option<Element>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpawnKind {
    Natural,
    EventOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Species {
    pub id: &'static str,
    pub name: &'static str,
    pub archetype: Archetype,
    pub biomes: &'static [Biome],
    pub skills: &'static [MonsterSkill],
    pub min_player_level: u32,
    pub ecology: Ecology,
    pub evolved_form: Option<&'static str>,
    pub initial_tier: Option<Tier>,
    pub spawn: SpawnKind,
}

impl Species {
    fn new(
        id: &'static str,
        name: &'static str,
        archetype: Archetype,
        biomes: &'static [Biome],
        min_player_level: u32,
    ) -> Self {
        Self {
            id,
            name,
            archetype,
            biomes,
            skills: &[],
            min_player_level,
            ecology: Ecology::default(),
            evolved_form: None,
            initial_tier: None,
            spawn: SpawnKind::Natural,
        }
    }

    fn skills(mut self, skills: &'static [MonsterSkill]) -> Self {
        self.skills = skills;
        self
    }

    fn food_web(
        mut self,
        prey: &'static [&'static str],
        predators: &'static [&'static str],
        competitors: &'static [&'static str],
    ) -> Self {
        self.ecology.prey = prey;
        self.ecology.predators = predators;
        self.ecology.competitors = competitors;
        self
    }

    fn element(mut self, element: Element) -> Self {
        self.ecology.element = Some(element);
        self
    }

    fn prefers(mut self, temperature: Band, humidity: Band) -> Self {
        self.ecology.preference.temperature = temperature;
        self.ecology.preference.humidity = humidity;
        self
    }

    fn magic(mut self, magical_energy: Band) -> Self {
        self.ecology.preference.magical_energy = magical_energy;
        self
    }

    fn tolerates_pollution(mut self, pollution: Band) -> Self {
        self.ecology.preference.pollution = pollution;
        self
    }

    fn evolves_into(mut self, id: &'static str) -> Self {
        self.evolved_form = Some(id);
        self
    }

    fn tier(mut self, tier: Tier) -> Self {
        self.initial_tier = Some(tier);
        self
    }

    fn boss(mut self) -> Self {
        self.spawn = SpawnKind::EventOnly;
        self
    }

    pub fn key(&self) -> String {
        species_key(self.id)
    }

    pub fn is_natural(&self) -> bool {
        self.spawn == SpawnKind::Natural
    }

    pub fn lives_in(&self, biome: Biome) -> bool {
        self.biomes.contains(&biome)
    }
}

/// `POISON_SLIME` -> `poisonSlime`
pub fn species_key(id: &str) -> String {
    let mut key = String::with_capacity(id.len());
    let mut upper_next = false;
    for ch in id.chars() {
        if ch == '_' || ch == ' ' || ch == '-' {
            upper_next = !key.is_empty();
            continue;
        }
        if upper_next {
            key.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            key.extend(ch.to_lowercase());
        }
    }
    key
}

/// Validated species collection
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesCatalog {
    species: Vec<Species>,
}

impl Default for SpeciesCatalog {
    fn default() -> Self {
        Self::new(standard_species())
    }
}

impl SpeciesCatalog {
    /// Malformed definitions are dropped with a warning instead of poisoning the pool
    pub fn new(definitions: Vec<Species>) -> Self {
        let ids: Vec<&'static str> = definitions.iter().map(|s| s.id).collect();
        let species = definitions
            .into_iter()
            .filter(|s| {
                if s.biomes.is_empty() {
                    warn!(species = s.id, "species has no biomes, skipped");
                    return false;
                }
                true
            })
            .map(|mut s| {
                if let Some(evolved) = s.evolved_form {
                    if !ids.contains(&evolved) {
                        warn!(species = s.id, evolved, "unknown evolved form ignored");
                        s.evolved_form = None;
                    }
                }
                s
            })
            .collect();
        Self { species }
    }

    pub fn all(&self) -> &[Species] {
        &self.species
    }

    pub fn get(&self, id: &str) -> Option<&Species> {
        self.species.iter().find(|s| s.id == id)
    }

    pub fn by_key(&self, key: &str) -> Option<&Species> {
        self.species.iter().find(|s| s.key() == key)
    }

    pub fn natural(&self) -> impl Iterator<Item = &Species> {
        self.species.iter().filter(|s| s.is_natural())
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}

const WARM: Band = Band::new(5.0, 35.0);
const COLD: Band = Band::new(-20.0, 5.0);
const HOT: Band = Band::new(25.0, 50.0);
const TEMPERATE: Band = Band::new(0.0, 30.0);
const DAMP: Band = Band::new(0.4, 1.0);
const DRY: Band = Band::new(0.0, 0.5);
const ANY_RATIO: Band = Band::new(0.0, 1.0);
const ARCANE: Band = Band::new(0.4, 1.0);
const CLEAN: Band = Band::new(0.0, 0.4);

pub fn standard_species() -> Vec<Species> {
    use Archetype::*;
    use Biome::*;
    use MonsterSkill::*;

    vec![
        // Forest
        Species::new("SLIME", "Slime", Standard, &[Forest], 1)
            .skills(&[Regenerate])
            .food_web(&[], &["GOBLIN", "GIANT_SPIDER"], &["BAT"])
            .prefers(WARM, DAMP)
            .evolves_into("POISON_SLIME"),
        Species::new("POISON_SLIME", "Poison Slime", Tank, &[Forest, Cave], 8)
            .skills(&[PoisonSpit, Regenerate])
            .food_web(&[], &["GOBLIN"], &["SLIME", "ZOMBIE"])
            .element(Element::Poison)
            .prefers(WARM, DAMP),
        Species::new("GOBLIN", "Goblin", Standard, &[Forest, Cave], 1)
            .skills(&[Rend, WarCry])
            .food_web(&["SLIME"], &["WOLF", "TROLL"], &["SKELETON"])
            .prefers(TEMPERATE, ANY_RATIO)
            .evolves_into("HOBGOBLIN"),
        Species::new("HOBGOBLIN", "Hobgoblin", Bruiser, &[Forest, Cave], 12)
            .skills(&[Rend, WarCry, HeavyBash])
            .food_web(&["SLIME", "GOBLIN"], &["TROLL"], &["SKELETON_KNIGHT"])
            .prefers(TEMPERATE, ANY_RATIO),
        Species::new("WOLF", "Wolf", Rusher, &[Forest, Ice], 2)
            .skills(&[SavageStrike, Rend])
            .food_web(&["GOBLIN"], &["TROLL", "YETI"], &["GIANT_SPIDER"])
            .prefers(Band::new(-15.0, 30.0), ANY_RATIO)
            .evolves_into("DIRE_WOLF"),
        Species::new("DIRE_WOLF", "Dire Wolf", Rusher, &[Forest, Ice], 14)
            .skills(&[SavageStrike, Rend])
            .food_web(&["GOBLIN", "WOLF"], &["YETI"], &["TROLL"])
            .prefers(Band::new(-15.0, 30.0), ANY_RATIO),
        Species::new("GIANT_SPIDER", "Giant Spider", Evasive, &[Forest, Cave], 3)
            .skills(&[PoisonSpit])
            .food_web(&["BAT", "SLIME"], &[], &["WOLF"])
            .element(Element::Poison)
            .prefers(WARM, DAMP),
        Species::new("TREANT", "Treant", TankySlow, &[Forest], 8)
            .skills(&[Regenerate, HeavyBash])
            .food_web(&[], &[], &["TROLL"])
            .element(Element::Earth)
            .prefers(WARM, DAMP)
            .tolerates_pollution(CLEAN)
            .tier(Tier::Advanced),
        // Cave
        Species::new("BAT", "Cave Bat", Rusher, &[Cave], 1)
            .skills(&[LifeDrain])
            .food_web(&[], &["GIANT_SPIDER"], &["SLIME"])
            .prefers(TEMPERATE, DAMP),
        Species::new("SKELETON", "Skeleton", Standard, &[Cave, Ice], 2)
            .skills(&[Rend])
            .food_web(&[], &[], &["GOBLIN", "ZOMBIE"])
            .element(Element::Dark)
            .magic(ARCANE)
            .evolves_into("SKELETON_KNIGHT"),
        Species::new("SKELETON_ARCHER", "Skeleton Archer", GlassCannon, &[Cave, Ice], 4)
            .skills(&[SavageStrike])
            .food_web(&[], &[], &["SKELETON"])
            .element(Element::Dark)
            .magic(ARCANE),
        Species::new("SKELETON_KNIGHT", "Skeleton Knight", Tank, &[Cave, Ice], 15)
            .skills(&[HeavyBash, Rend])
            .food_web(&[], &[], &["HOBGOBLIN"])
            .element(Element::Dark)
            .magic(ARCANE),
        Species::new("ZOMBIE", "Zombie", TankySlow, &[Cave], 3)
            .skills(&[PoisonSpit])
            .food_web(&["BAT"], &[], &["SKELETON"])
            .element(Element::Poison)
            .prefers(TEMPERATE, DAMP)
            .evolves_into("GHOUL"),
        Species::new("GHOUL", "Ghoul", Bruiser, &[Cave], 13)
            .skills(&[LifeDrain, Rend])
            .food_web(&["ZOMBIE", "BAT"], &[], &["SKELETON_KNIGHT"])
            .element(Element::Dark)
            .prefers(TEMPERATE, DAMP),
        Species::new("DARK_MAGE", "Dark Mage", Caster, &[Cave], 9)
            .skills(&[ShadowBolt, LifeDrain])
            .food_web(&[], &["TROLL"], &["SKELETON"])
            .element(Element::Dark)
            .magic(ARCANE),
        Species::new("TROLL", "Troll", Bruiser, &[Cave, Forest], 12)
            .skills(&[Regenerate, HeavyBash])
            .food_web(&["GOBLIN", "WOLF", "DARK_MAGE"], &[], &["TREANT", "YETI"])
            .prefers(TEMPERATE, DAMP),
        // Ice
        Species::new("YETI", "Yeti", Tank, &[Ice], 5)
            .skills(&[HeavyBash, WarCry])
            .food_web(&["WOLF", "DIRE_WOLF"], &[], &["TROLL"])
            .element(Element::Ice)
            .prefers(COLD, ANY_RATIO),
        Species::new("ICE_ELEMENTAL", "Ice Elemental", Caster, &[Ice], 7)
            .skills(&[FrostBolt])
            .food_web(&[], &[], &["FROST_WRAITH"])
            .element(Element::Ice)
            .prefers(COLD, ANY_RATIO)
            .magic(ARCANE),
        Species::new("FROST_WRAITH", "Frost Wraith", Evasive, &[Ice], 10)
            .skills(&[FrostBolt, LifeDrain])
            .food_web(&[], &[], &["ICE_ELEMENTAL"])
            .element(Element::Ice)
            .prefers(COLD, ANY_RATIO)
            .magic(ARCANE)
            .tier(Tier::Advanced),
        // Volcano
        Species::new("FIRE_IMP", "Fire Imp", Rusher, &[Volcano], 4)
            .skills(&[FireBreath])
            .food_web(&[], &["SALAMANDER"], &[])
            .element(Element::Fire)
            .prefers(HOT, DRY),
        Species::new("SALAMANDER", "Salamander", Evasive, &[Volcano], 6)
            .skills(&[FireBreath, Rend])
            .food_web(&["FIRE_IMP"], &["FIRE_DRAKE"], &["MAGMA_GOLEM"])
            .element(Element::Fire)
            .prefers(HOT, DRY),
        Species::new("MAGMA_GOLEM", "Magma Golem", Tank, &[Volcano], 10)
            .skills(&[HeavyBash])
            .food_web(&[], &[], &["SALAMANDER"])
            .element(Element::Fire)
            .prefers(HOT, DRY),
        Species::new("FIRE_DRAKE", "Fire Drake", GlassCannon, &[Volcano], 15)
            .skills(&[FireBreath, SavageStrike])
            .food_web(&["SALAMANDER", "FIRE_IMP"], &[], &[])
            .element(Element::Fire)
            .prefers(HOT, DRY)
            .tier(Tier::Elite),
        // Event bosses
        Species::new("GOBLIN_KING", "Goblin King", Elite, &[Forest, Cave], 5)
            .skills(&[WarCry, HeavyBash, Rend])
            .boss(),
        Species::new("SLIME_KING", "Slime King", Elite, &[Forest], 3)
            .skills(&[PoisonSpit, Regenerate])
            .element(Element::Poison)
            .boss(),
        Species::new("SKELETON_LORD", "Skeleton Lord", Elite, &[Cave, Ice], 8)
            .skills(&[Rend, ShadowBolt])
            .element(Element::Dark)
            .boss(),
        Species::new("ZOMBIE_LORD", "Zombie Lord", Elite, &[Cave], 8)
            .skills(&[PoisonSpit, LifeDrain])
            .element(Element::Poison)
            .boss(),
        Species::new("LAVA_LORD", "Lava Lord", Elite, &[Volcano], 15)
            .skills(&[FireBreath, HeavyBash])
            .element(Element::Fire)
            .boss(),
        Species::new("ARCHLICH", "Archlich", Elite, &[Ice, Cave], 20)
            .skills(&[ShadowBolt, FrostBolt, LifeDrain])
            .element(Element::Dark)
            .boss(),
        Species::new("DRAGON_OVERLORD", "Dragon Overlord", Elite, &[Volcano], 25)
            .skills(&[FireBreath, SavageStrike, WarCry])
            .element(Element::Fire)
            .boss(),
    ]
}
