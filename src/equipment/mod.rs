//! Item model: rarities, slots, affixes and special effects.
//!
//! Affixes are a closed tagged union. Primary-stat affixes feed the stat
//! totals; every other kind is applied by exhaustive match in the
//! progression pipeline.

pub mod sets;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combat::status::StatusKind;
use crate::combat::Element;

/// The six primary stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryStat {
    Strength,
    Agility,
    Intelligence,
    Vitality,
    Spirit,
    Luck,
}

impl PrimaryStat {
    pub const ALL: [PrimaryStat; 6] = [
        PrimaryStat::Strength,
        PrimaryStat::Agility,
        PrimaryStat::Intelligence,
        PrimaryStat::Vitality,
        PrimaryStat::Spirit,
        PrimaryStat::Luck,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PrimaryStat::Strength => "Strength",
            PrimaryStat::Agility => "Agility",
            PrimaryStat::Intelligence => "Intelligence",
            PrimaryStat::Vitality => "Vitality",
            PrimaryStat::Spirit => "Spirit",
            PrimaryStat::Luck => "Luck",
        }
    }
}

/// Derived stats an affix can add to directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlatStat {
    MaxHp,
    MaxMp,
    PhysicalAttack,
    MagicalAttack,
    RangedAttack,
    PhysicalDefense,
    MagicalDefense,
    Speed,
    CritChance,
    CritDamage,
    Evasion,
    Lifesteal,
    BlockChance,
    MagicFind,
    ManaCostReduction,
    ElementalDamageBonus,
}

/// Rolled secondary modifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Affix {
    Primary { stat: PrimaryStat, value: i32 },
    Flat { stat: FlatStat, value: f64 },
    ElementalDamage { element: Element, value: f64 },
    StatusOnHit {
        status: StatusKind,
        chance: f64,
        magnitude: f64,
        duration: i32,
    },
}

impl Affix {
    /// Display-name prefix keyed by affix type (elemental affixes by element)
    pub fn prefix(&self) -> &'static str {
        match self {
            Affix::Primary { stat, .. } => match stat {
                PrimaryStat::Strength => "Mighty",
                PrimaryStat::Agility => "Quick",
                PrimaryStat::Intelligence => "Clever",
                PrimaryStat::Vitality => "Hale",
                PrimaryStat::Spirit => "Serene",
                PrimaryStat::Luck => "Fortunate",
            },
            Affix::Flat { stat, .. } => match stat {
                FlatStat::MaxHp => "Sturdy",
                FlatStat::MaxMp => "Wise",
                FlatStat::PhysicalAttack => "Brutal",
                FlatStat::MagicalAttack => "Arcane",
                FlatStat::RangedAttack => "Keen",
                FlatStat::PhysicalDefense => "Reinforced",
                FlatStat::MagicalDefense => "Warded",
                FlatStat::Speed => "Swift",
                FlatStat::CritChance => "Precise",
                FlatStat::CritDamage => "Deadly",
                FlatStat::Evasion => "Nimble",
                FlatStat::Lifesteal => "Vampiric",
                FlatStat::BlockChance => "Guarding",
                FlatStat::MagicFind => "Lucky",
                FlatStat::ManaCostReduction => "Efficient",
                FlatStat::ElementalDamageBonus => "Empowered",
            },
            Affix::ElementalDamage { element, .. } => match element {
                Element::Fire => "Blazing",
                Element::Ice => "Frozen",
                Element::Lightning => "Shocking",
                Element::Poison => "Venomous",
                Element::Dark => "Shadow",
                Element::Holy => "Holy",
                Element::Earth => "Earthen",
            },
            Affix::StatusOnHit { status, .. } => match status {
                StatusKind::Bleed => "Serrated",
                StatusKind::Poison => "Toxic",
                StatusKind::Stun => "Crushing",
            },
        }
    }

    /// Identity used for "without replacement" draws
    pub fn kind_key(&self) -> String {
        match self {
            Affix::Primary { stat, .. } => format!("primary:{stat:?}"),
            Affix::Flat { stat, .. } => format!("flat:{stat:?}"),
            Affix::ElementalDamage { element, .. } => format!("element:{element:?}"),
            Affix::StatusOnHit { status, .. } => format!("status:{status:?}"),
        }
    }
}

/// Unique-item effects beyond plain stats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum SpecialEffect {
    PhysicalBlockChance(f64),
    CritChance(f64),
    /// Strips flat defense from monsters the wearer hits
    AuraDefenseReduction(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Mystic,
    Legacy,
}

impl Rarity {
    pub const ALL: [Rarity; 6] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Mystic,
        Rarity::Legacy,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Mystic => "mystic",
            Rarity::Legacy => "legacy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RarityConfig {
    pub rarity: Rarity,
    pub weight: f64,
    pub budget: u32,
    pub affix_count: usize,
    pub color: String,
}

/// Rarity lookup table. Lookups can miss when a host supplies a partial table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RarityTable {
    pub entries: Vec<RarityConfig>,
}

impl Default for RarityTable {
    fn default() -> Self {
        let row = |rarity, weight, budget, affix_count, color: &str| RarityConfig {
            rarity,
            weight,
            budget,
            affix_count,
            color: color.to_string(),
        };
        Self {
            entries: vec![
                row(Rarity::Common, 60.0, 20, 0, "#ffffff"),
                row(Rarity::Uncommon, 25.0, 35, 1, "#1eff00"),
                row(Rarity::Rare, 10.0, 55, 2, "#0070dd"),
                row(Rarity::Epic, 4.0, 80, 3, "#a335ee"),
                row(Rarity::Mystic, 0.8, 110, 4, "#ff8000"),
                row(Rarity::Legacy, 0.2, 150, 5, "#e6cc80"),
            ],
        }
    }
}

impl RarityTable {
    pub fn get(&self, rarity: Rarity) -> Option<&RarityConfig> {
        self.entries.iter().find(|e| e.rarity == rarity)
    }
}

pub const UNIQUE_COLOR: &str = "#ff4040";
pub const SET_COLOR: &str = "#00ff96";

/// What kind of equipment an item is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemSlot {
    Weapon,
    Shield,
    Helmet,
    Armor,
    Gloves,
    Boots,
    Belt,
    Amulet,
    Ring,
    Cloak,
}

/// The 11 fixed equipment positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipSlot {
    Weapon,
    Shield,
    Helmet,
    Armor,
    Gloves,
    Boots,
    Belt,
    Amulet,
    Ring1,
    Ring2,
    Cloak,
}

impl EquipSlot {
    pub const ALL: [EquipSlot; 11] = [
        EquipSlot::Weapon,
        EquipSlot::Shield,
        EquipSlot::Helmet,
        EquipSlot::Armor,
        EquipSlot::Gloves,
        EquipSlot::Boots,
        EquipSlot::Belt,
        EquipSlot::Amulet,
        EquipSlot::Ring1,
        EquipSlot::Ring2,
        EquipSlot::Cloak,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            EquipSlot::Weapon => "weapon",
            EquipSlot::Shield => "shield",
            EquipSlot::Helmet => "helmet",
            EquipSlot::Armor => "armor",
            EquipSlot::Gloves => "gloves",
            EquipSlot::Boots => "boots",
            EquipSlot::Belt => "belt",
            EquipSlot::Amulet => "amulet",
            EquipSlot::Ring1 => "ring1",
            EquipSlot::Ring2 => "ring2",
            EquipSlot::Cloak => "cloak",
        }
    }

    pub fn accepts(&self, slot: ItemSlot) -> bool {
        self.item_slot() == slot
    }

    pub fn item_slot(&self) -> ItemSlot {
        match self {
            EquipSlot::Weapon => ItemSlot::Weapon,
            EquipSlot::Shield => ItemSlot::Shield,
            EquipSlot::Helmet => ItemSlot::Helmet,
            EquipSlot::Armor => ItemSlot::Armor,
            EquipSlot::Gloves => ItemSlot::Gloves,
            EquipSlot::Boots => ItemSlot::Boots,
            EquipSlot::Belt => ItemSlot::Belt,
            EquipSlot::Amulet => ItemSlot::Amulet,
            EquipSlot::Ring1 | EquipSlot::Ring2 => ItemSlot::Ring,
            EquipSlot::Cloak => ItemSlot::Cloak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub base_name: String,
    pub level: u32,
    pub slot: ItemSlot,
    pub rarity: Rarity,
    pub stats: BTreeMap<PrimaryStat, i32>,
    pub affixes: Vec<Affix>,
    pub is_unique: bool,
    pub is_set_item: bool,
    pub set_id: Option<String>,
    pub special_effects: Vec<SpecialEffect>,
    pub prefix: Option<String>,
    pub color: String,
    /// Merchant asking price, only set on merchant stock
    pub price: Option<u64>,
}

impl Item {
    pub fn stat(&self, stat: PrimaryStat) -> i32 {
        self.stats.get(&stat).copied().unwrap_or(0)
    }
}

/// Equipped items keyed by slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    slots: BTreeMap<EquipSlot, Item>,
}

impl Equipment {
    pub fn get(&self, slot: EquipSlot) -> Option<&Item> {
        self.slots.get(&slot)
    }

    /// Returns the previously equipped item
    pub fn set(&mut self, slot: EquipSlot, item: Item) -> Option<Item> {
        self.slots.insert(slot, item)
    }

    pub fn take(&mut self, slot: EquipSlot) -> Option<Item> {
        self.slots.remove(&slot)
    }

    pub fn items(&self) -> impl Iterator<Item = (EquipSlot, &Item)> {
        self.slots.iter().map(|(slot, item)| (*slot, item))
    }

    pub fn has_shield(&self) -> bool {
        self.slots.contains_key(&EquipSlot::Shield)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot an item of `slot` kind should go to: first empty ring, else ring 1
    pub fn target_slot(&self, slot: ItemSlot) -> EquipSlot {
        match slot {
            ItemSlot::Ring => {
                if self.get(EquipSlot::Ring1).is_none() {
                    EquipSlot::Ring1
                } else if self.get(EquipSlot::Ring2).is_none() {
                    EquipSlot::Ring2
                } else {
                    EquipSlot::Ring1
                }
            }
            other => EquipSlot::ALL
                .into_iter()
                .find(|s| s.accepts(other))
                .unwrap_or(EquipSlot::Weapon),
        }
    }
}
