//! Item sets. Bonuses stack per tier once enough pieces are worn.

use std::collections::BTreeMap;

use super::{Affix, Equipment, FlatStat, ItemSlot, PrimaryStat};
use crate::combat::status::StatusKind;

#[derive(Debug, Clone, PartialEq)]
pub struct SetPiece {
    /// Base item this piece replaces when the set branch fires
    pub base_name: &'static str,
    pub slot: ItemSlot,
    pub name: &'static str,
    pub stats: &'static [(PrimaryStat, i32)],
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetBonus {
    pub pieces: usize,
    pub affixes: &'static [Affix],
    /// Recorded for display, no numeric effect
    pub special: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub pieces: &'static [SetPiece],
    pub bonuses: &'static [SetBonus],
}

pub static ITEM_SETS: &[SetDefinition] = &[
    SetDefinition {
        id: "warlord",
        name: "Warlord's Regalia",
        pieces: &[
            SetPiece {
                base_name: "Iron Helm",
                slot: ItemSlot::Helmet,
                name: "Warlord's Helm",
                stats: &[(PrimaryStat::Strength, 6), (PrimaryStat::Vitality, 6)],
            },
            SetPiece {
                base_name: "Chain Mail",
                slot: ItemSlot::Armor,
                name: "Warlord's Hauberk",
                stats: &[(PrimaryStat::Vitality, 10), (PrimaryStat::Strength, 4)],
            },
            SetPiece {
                base_name: "Gauntlets",
                slot: ItemSlot::Gloves,
                name: "Warlord's Grip",
                stats: &[(PrimaryStat::Strength, 8)],
            },
        ],
        bonuses: &[
            SetBonus {
                pieces: 2,
                affixes: &[Affix::Flat {
                    stat: FlatStat::PhysicalDefense,
                    value: 10.0,
                }],
                special: None,
            },
            SetBonus {
                pieces: 3,
                affixes: &[
                    Affix::Flat {
                        stat: FlatStat::PhysicalAttack,
                        value: 15.0,
                    },
                    Affix::StatusOnHit {
                        status: StatusKind::Bleed,
                        chance: 0.15,
                        magnitude: 3.0,
                        duration: 3,
                    },
                ],
                special: Some("Warlord's Resolve"),
            },
        ],
    },
    SetDefinition {
        id: "arcanist",
        name: "Arcanist's Vestments",
        pieces: &[
            SetPiece {
                base_name: "Robe",
                slot: ItemSlot::Armor,
                name: "Arcanist's Robe",
                stats: &[(PrimaryStat::Intelligence, 10), (PrimaryStat::Spirit, 4)],
            },
            SetPiece {
                base_name: "Amulet",
                slot: ItemSlot::Amulet,
                name: "Arcanist's Focus",
                stats: &[(PrimaryStat::Intelligence, 6), (PrimaryStat::Spirit, 6)],
            },
            SetPiece {
                base_name: "Ring",
                slot: ItemSlot::Ring,
                name: "Arcanist's Signet",
                stats: &[(PrimaryStat::Intelligence, 8)],
            },
        ],
        bonuses: &[
            SetBonus {
                pieces: 2,
                affixes: &[Affix::Flat {
                    stat: FlatStat::MaxMp,
                    value: 30.0,
                }],
                special: None,
            },
            SetBonus {
                pieces: 3,
                affixes: &[
                    Affix::Flat {
                        stat: FlatStat::ManaCostReduction,
                        value: 0.15,
                    },
                    Affix::Flat {
                        stat: FlatStat::ElementalDamageBonus,
                        value: 0.25,
                    },
                ],
                special: Some("Arcane Surge"),
            },
        ],
    },
];

pub fn set_definition(id: &str) -> Option<&'static SetDefinition> {
    ITEM_SETS.iter().find(|set| set.id == id)
}

/// Set piece matching a rolled base item
pub fn set_piece_for(slot: ItemSlot, base_name: &str) -> Option<(&'static SetDefinition, &'static SetPiece)> {
    ITEM_SETS.iter().find_map(|set| {
        set.pieces
            .iter()
            .find(|piece| piece.slot == slot && piece.base_name == base_name)
            .map(|piece| (set, piece))
    })
}

/// Equipped piece count per set id
pub fn equipped_set_counts(equipment: &Equipment) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for (_, item) in equipment.items() {
        if let Some(set_id) = item.set_id.as_deref().filter(|_| item.is_set_item) {
            *counts.entry(set_id.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Bonuses whose piece requirement is met, in definition order
pub fn active_set_bonuses(equipment: &Equipment) -> Vec<&'static SetBonus> {
    let counts = equipped_set_counts(equipment);
    let mut active = Vec::new();
    for (set_id, count) in counts {
        match set_definition(&set_id) {
            Some(set) => active.extend(set.bonuses.iter().filter(|b| count >= b.pieces)),
            None => tracing::warn!(set = %set_id, "equipped item references unknown set"),
        }
    }
    active
}
