//! Item generation.
//!
//! Rarity roll, then a base item, then one of three mutually exclusive
//! branches tried in order:
//! 1. Unique: mystic/legacy only, gated by a chance, needs a unique
//!    defined for the rolled slot and rarity.
//! 2. Set: epic and above, gated by a chance, needs a set piece for the
//!    rolled base item.
//! 3. Normal: budget-allocated primary stats plus rarity-scaled affixes.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, warn};

use crate::combat::damage::roll_chance;
use crate::combat::status::StatusKind;
use crate::combat::Element;
use crate::constants::*;
use crate::equipment::sets::set_piece_for;
use crate::equipment::{
    Affix, FlatStat, Item, ItemSlot, PrimaryStat, Rarity, RarityConfig, RarityTable, SpecialEffect, SET_COLOR,
    UNIQUE_COLOR,
};
use crate::generation::weighted_index;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseItem {
    pub name: &'static str,
    pub slot: ItemSlot,
}

const fn base(name: &'static str, slot: ItemSlot) -> BaseItem {
    BaseItem { name, slot }
}

pub static BASE_ITEMS: &[BaseItem] = &[
    base("Short Sword", ItemSlot::Weapon),
    base("War Axe", ItemSlot::Weapon),
    base("Hunting Bow", ItemSlot::Weapon),
    base("Oak Staff", ItemSlot::Weapon),
    base("Buckler", ItemSlot::Shield),
    base("Tower Shield", ItemSlot::Shield),
    base("Iron Helm", ItemSlot::Helmet),
    base("Leather Cap", ItemSlot::Helmet),
    base("Chain Mail", ItemSlot::Armor),
    base("Robe", ItemSlot::Armor),
    base("Leather Vest", ItemSlot::Armor),
    base("Gauntlets", ItemSlot::Gloves),
    base("Leather Gloves", ItemSlot::Gloves),
    base("Leather Boots", ItemSlot::Boots),
    base("Studded Belt", ItemSlot::Belt),
    base("Amulet", ItemSlot::Amulet),
    base("Ring", ItemSlot::Ring),
    base("Traveler's Cloak", ItemSlot::Cloak),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum AffixKind {
    Primary(PrimaryStat),
    Flat(FlatStat),
    Elemental(Element),
    OnHit {
        status: StatusKind,
        magnitude: f64,
        duration: i32,
    },
}

/// Affix roll range before rarity scaling
#[derive(Debug, Clone, Copy, PartialEq)]
struct AffixTemplate {
    kind: AffixKind,
    min_rarity: Rarity,
    min: f64,
    max: f64,
}

const fn tpl(kind: AffixKind, min_rarity: Rarity, min: f64, max: f64) -> AffixTemplate {
    AffixTemplate {
        kind,
        min_rarity,
        min,
        max,
    }
}

static AFFIX_TEMPLATES: &[AffixTemplate] = {
    use AffixKind::*;
    use Rarity::*;
    &[
        tpl(Primary(PrimaryStat::Strength), Uncommon, 1.0, 4.0),
        tpl(Primary(PrimaryStat::Agility), Uncommon, 1.0, 4.0),
        tpl(Primary(PrimaryStat::Intelligence), Uncommon, 1.0, 4.0),
        tpl(Primary(PrimaryStat::Vitality), Uncommon, 1.0, 4.0),
        tpl(Primary(PrimaryStat::Spirit), Uncommon, 1.0, 4.0),
        tpl(Primary(PrimaryStat::Luck), Uncommon, 1.0, 3.0),
        tpl(Flat(FlatStat::MaxHp), Uncommon, 5.0, 20.0),
        tpl(Flat(FlatStat::MaxMp), Uncommon, 3.0, 12.0),
        tpl(Flat(FlatStat::PhysicalAttack), Uncommon, 2.0, 6.0),
        tpl(Flat(FlatStat::MagicalAttack), Uncommon, 2.0, 6.0),
        tpl(Flat(FlatStat::RangedAttack), Uncommon, 2.0, 6.0),
        tpl(Flat(FlatStat::PhysicalDefense), Uncommon, 2.0, 5.0),
        tpl(Flat(FlatStat::MagicalDefense), Uncommon, 2.0, 5.0),
        tpl(Flat(FlatStat::Speed), Rare, 1.0, 3.0),
        tpl(Flat(FlatStat::CritChance), Rare, 0.01, 0.03),
        tpl(Flat(FlatStat::CritDamage), Rare, 0.05, 0.15),
        tpl(Flat(FlatStat::Evasion), Rare, 0.01, 0.03),
        tpl(Flat(FlatStat::MagicFind), Rare, 0.05, 0.15),
        tpl(Flat(FlatStat::Lifesteal), Epic, 0.005, 0.015),
        tpl(Flat(FlatStat::BlockChance), Epic, 0.02, 0.05),
        tpl(Flat(FlatStat::ManaCostReduction), Epic, 0.02, 0.05),
        tpl(Flat(FlatStat::ElementalDamageBonus), Epic, 0.05, 0.10),
        tpl(Elemental(Element::Fire), Rare, 2.0, 6.0),
        tpl(Elemental(Element::Ice), Rare, 2.0, 6.0),
        tpl(Elemental(Element::Lightning), Rare, 2.0, 6.0),
        tpl(Elemental(Element::Poison), Rare, 2.0, 6.0),
        tpl(Elemental(Element::Earth), Rare, 2.0, 6.0),
        tpl(Elemental(Element::Dark), Epic, 3.0, 8.0),
        tpl(Elemental(Element::Holy), Epic, 3.0, 8.0),
        tpl(
            OnHit {
                status: StatusKind::Poison,
                magnitude: 2.0,
                duration: 3,
            },
            Rare,
            0.05,
            0.10,
        ),
        tpl(
            OnHit {
                status: StatusKind::Bleed,
                magnitude: 2.0,
                duration: 3,
            },
            Epic,
            0.05,
            0.10,
        ),
        tpl(
            OnHit {
                status: StatusKind::Stun,
                magnitude: 0.0,
                duration: 1,
            },
            Mystic,
            0.03,
            0.06,
        ),
    ]
};

/// Higher rarities roll bigger numbers from the same template
pub fn rarity_scale(rarity: Rarity) -> f64 {
    match rarity {
        Rarity::Common => 1.0,
        Rarity::Uncommon => 1.25,
        Rarity::Rare => 1.5,
        Rarity::Epic => 1.75,
        Rarity::Mystic => 2.0,
        Rarity::Legacy => 2.25,
    }
}

impl AffixTemplate {
    fn roll<R: Rng + ?Sized>(&self, rarity: Rarity, rng: &mut R) -> Affix {
        let scale = rarity_scale(rarity);
        let drawn = if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        };
        match self.kind {
            AffixKind::Primary(stat) => Affix::Primary {
                stat,
                value: ((drawn.round()) * scale).round().max(1.0) as i32,
            },
            AffixKind::Flat(stat) => Affix::Flat {
                stat,
                value: drawn * scale,
            },
            AffixKind::Elemental(element) => Affix::ElementalDamage {
                element,
                value: drawn * scale,
            },
            AffixKind::OnHit {
                status,
                magnitude,
                duration,
            } => Affix::StatusOnHit {
                status,
                chance: (drawn * scale).min(1.0),
                magnitude,
                duration,
            },
        }
    }
}

/// A named, hand-authored item
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueDef {
    pub name: &'static str,
    pub slot: ItemSlot,
    pub rarities: &'static [Rarity],
    pub stats: &'static [(PrimaryStat, i32)],
    pub special_effects: &'static [SpecialEffect],
    pub affixes: &'static [Affix],
}

pub static UNIQUE_ITEMS: &[UniqueDef] = &[
    UniqueDef {
        name: "Aegis of the Mountain",
        slot: ItemSlot::Shield,
        rarities: &[Rarity::Mystic, Rarity::Legacy],
        stats: &[(PrimaryStat::Vitality, 15), (PrimaryStat::Strength, 8)],
        special_effects: &[SpecialEffect::PhysicalBlockChance(0.15)],
        affixes: &[],
    },
    UniqueDef {
        name: "Stormcaller",
        slot: ItemSlot::Weapon,
        rarities: &[Rarity::Legacy],
        stats: &[(PrimaryStat::Intelligence, 18), (PrimaryStat::Agility, 6)],
        special_effects: &[],
        affixes: &[Affix::ElementalDamage {
            element: Element::Lightning,
            value: 12.0,
        }],
    },
    UniqueDef {
        name: "Shadowfang",
        slot: ItemSlot::Weapon,
        rarities: &[Rarity::Mystic, Rarity::Legacy],
        stats: &[(PrimaryStat::Agility, 14), (PrimaryStat::Luck, 6)],
        special_effects: &[SpecialEffect::CritChance(0.05)],
        affixes: &[Affix::StatusOnHit {
            status: StatusKind::Bleed,
            chance: 0.2,
            magnitude: 3.0,
            duration: 3,
        }],
    },
    UniqueDef {
        name: "Crown of the Lich",
        slot: ItemSlot::Helmet,
        rarities: &[Rarity::Legacy],
        stats: &[(PrimaryStat::Intelligence, 12), (PrimaryStat::Spirit, 12)],
        special_effects: &[SpecialEffect::AuraDefenseReduction(5)],
        affixes: &[],
    },
    UniqueDef {
        name: "Windwalker Boots",
        slot: ItemSlot::Boots,
        rarities: &[Rarity::Mystic, Rarity::Legacy],
        stats: &[(PrimaryStat::Agility, 12)],
        special_effects: &[],
        affixes: &[
            Affix::Flat {
                stat: FlatStat::Speed,
                value: 5.0,
            },
            Affix::Flat {
                stat: FlatStat::Evasion,
                value: 0.05,
            },
        ],
    },
];

/// Generates items against a rarity table
#[derive(Debug, Clone)]
pub struct ItemGenerator<'a> {
    rarities: &'a RarityTable,
    unique_chance: f64,
    set_chance: f64,
}

impl<'a> ItemGenerator<'a> {
    pub fn new(rarities: &'a RarityTable) -> Self {
        Self {
            rarities,
            unique_chance: UNIQUE_CHANCE,
            set_chance: SET_CHANCE,
        }
    }

    pub fn with_unique_chance(mut self, chance: f64) -> Self {
        self.unique_chance = chance.clamp(0.0, 1.0);
        self
    }

    pub fn with_set_chance(mut self, chance: f64) -> Self {
        self.set_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Config for `rarity`, falling back to an affix-free, zero-budget entry
    fn config(&self, rarity: Rarity) -> RarityConfig {
        self.rarities.get(rarity).cloned().unwrap_or_else(|| {
            warn!(rarity = rarity.key(), "rarity missing from table");
            RarityConfig {
                rarity,
                weight: 0.0,
                budget: 0,
                affix_count: 0,
                color: "#ffffff".into(),
            }
        })
    }

    /// Weighted draw over the table's fixed weights
    pub fn roll_rarity<R: Rng + ?Sized>(&self, rng: &mut R) -> Rarity {
        let weights: Vec<f64> = self.rarities.entries.iter().map(|e| e.weight).collect();
        weighted_index(&weights, rng)
            .map(|idx| self.rarities.entries[idx].rarity)
            .unwrap_or(Rarity::Common)
    }

    /// `count` affixes from the rarity's pool, without replacement
    pub fn roll_affixes<R: Rng + ?Sized>(&self, rarity: Rarity, count: usize, rng: &mut R) -> Vec<Affix> {
        let mut pool: Vec<&AffixTemplate> = AFFIX_TEMPLATES
            .iter()
            .filter(|t| t.min_rarity <= rarity)
            .collect();
        let mut affixes = Vec::with_capacity(count);
        for _ in 0..count {
            if pool.is_empty() {
                break;
            }
            let template = pool.swap_remove(rng.gen_range(0..pool.len()));
            affixes.push(template.roll(rarity, rng));
        }
        affixes
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        id: u64,
        player_level: u32,
        magic_find: f64,
        desired_rarity: Option<Rarity>,
        rng: &mut R,
    ) -> Item {
        let spread = rng.gen_range(-ITEM_LEVEL_SPREAD..=ITEM_LEVEL_SPREAD);
        let level = (player_level as i32 + spread).max(1) as u32;
        let rarity = desired_rarity.unwrap_or_else(|| self.roll_rarity(rng));
        let base = BASE_ITEMS[rng.gen_range(0..BASE_ITEMS.len())];

        let item = self
            .try_unique(id, level, rarity, base, rng)
            .or_else(|| self.try_set(id, level, rarity, base, rng))
            .unwrap_or_else(|| self.normal(id, level, rarity, base, rng));
        debug!(
            id,
            name = %item.name,
            rarity = rarity.key(),
            level,
            magic_find,
            "item generated"
        );
        item
    }

    fn blank(&self, id: u64, level: u32, rarity: Rarity, base: BaseItem) -> Item {
        Item {
            id,
            name: base.name.to_string(),
            base_name: base.name.to_string(),
            level,
            slot: base.slot,
            rarity,
            stats: BTreeMap::new(),
            affixes: Vec::new(),
            is_unique: false,
            is_set_item: false,
            set_id: None,
            special_effects: Vec::new(),
            prefix: None,
            color: self.config(rarity).color,
            price: None,
        }
    }

    fn try_unique<R: Rng + ?Sized>(
        &self,
        id: u64,
        level: u32,
        rarity: Rarity,
        base: BaseItem,
        rng: &mut R,
    ) -> Option<Item> {
        if !matches!(rarity, Rarity::Mystic | Rarity::Legacy) || !roll_chance(rng, self.unique_chance) {
            return None;
        }
        let matching: Vec<&UniqueDef> = UNIQUE_ITEMS
            .iter()
            .filter(|u| u.slot == base.slot && u.rarities.contains(&rarity))
            .collect();
        if matching.is_empty() {
            return None;
        }
        let def = matching[rng.gen_range(0..matching.len())];

        let bonus = rng.gen_range(UNIQUE_BONUS_AFFIXES_MIN..=UNIQUE_BONUS_AFFIXES_MAX);
        let mut affixes = def.affixes.to_vec();
        affixes.extend(self.roll_affixes(rarity, bonus, rng));

        Some(Item {
            name: def.name.to_string(),
            stats: def.stats.iter().copied().collect(),
            affixes,
            is_unique: true,
            special_effects: def.special_effects.to_vec(),
            color: UNIQUE_COLOR.to_string(),
            ..self.blank(id, level, rarity, base)
        })
    }

    fn try_set<R: Rng + ?Sized>(
        &self,
        id: u64,
        level: u32,
        rarity: Rarity,
        base: BaseItem,
        rng: &mut R,
    ) -> Option<Item> {
        if !matches!(rarity, Rarity::Epic | Rarity::Mystic | Rarity::Legacy) || !roll_chance(rng, self.set_chance) {
            return None;
        }
        let (set, piece) = set_piece_for(base.slot, base.name)?;
        Some(Item {
            name: piece.name.to_string(),
            stats: piece.stats.iter().copied().collect(),
            is_set_item: true,
            set_id: Some(set.id.to_string()),
            color: SET_COLOR.to_string(),
            ..self.blank(id, level, rarity, base)
        })
    }

    fn normal<R: Rng + ?Sized>(&self, id: u64, level: u32, rarity: Rarity, base: BaseItem, rng: &mut R) -> Item {
        let config = self.config(rarity);
        let mut remaining = (config.budget as f64 * (1.0 + level as f64 / 10.0)).floor() as i64;
        let mut stats = BTreeMap::new();
        while remaining >= 1 {
            let amount = rng.gen_range(1..=(remaining / 4).max(1));
            let stat = PrimaryStat::ALL[rng.gen_range(0..PrimaryStat::ALL.len())];
            *stats.entry(stat).or_insert(0) += amount as i32;
            remaining -= amount * 2;
        }

        let affixes = self.roll_affixes(rarity, config.affix_count, rng);
        let prefix = affixes.first().map(|a| a.prefix().to_string());
        let name = match &prefix {
            Some(p) => format!("{p} {}", base.name),
            None => base.name.to_string(),
        };
        Item {
            name,
            stats,
            affixes,
            prefix,
            ..self.blank(id, level, rarity, base)
        }
    }
}
