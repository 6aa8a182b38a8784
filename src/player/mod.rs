//! Player state and the validated mutations the UI calls into.
//!
//! Derived stats are never edited directly. Every mutation of equipment,
//! primary stats or learned skills ends in `refresh_derived`, which also
//! clamps current hp/mp.

pub mod inventory;
pub mod progression;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::abilities::{skill_def, SkillId};
use crate::combat::damage::{CombatProfile, OnHitStatus, Side};
use crate::combat::status::StatusEffects;
use crate::combat::Element;
use crate::constants::*;
use crate::equipment::{EquipSlot, Equipment, PrimaryStat};
use crate::error::ActionRejected;

pub use inventory::Inventory;
pub use progression::{aura_defense_reduction, recalculate, xp_to_next};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryStats {
    pub strength: i32,
    pub agility: i32,
    pub intelligence: i32,
    pub vitality: i32,
    pub spirit: i32,
    pub luck: i32,
}

impl PrimaryStats {
    pub fn uniform(value: i32) -> Self {
        Self {
            strength: value,
            agility: value,
            intelligence: value,
            vitality: value,
            spirit: value,
            luck: value,
        }
    }

    pub fn get(&self, stat: PrimaryStat) -> i32 {
        match stat {
            PrimaryStat::Strength => self.strength,
            PrimaryStat::Agility => self.agility,
            PrimaryStat::Intelligence => self.intelligence,
            PrimaryStat::Vitality => self.vitality,
            PrimaryStat::Spirit => self.spirit,
            PrimaryStat::Luck => self.luck,
        }
    }

    pub fn add(&mut self, stat: PrimaryStat, amount: i32) {
        let slot = match stat {
            PrimaryStat::Strength => &mut self.strength,
            PrimaryStat::Agility => &mut self.agility,
            PrimaryStat::Intelligence => &mut self.intelligence,
            PrimaryStat::Vitality => &mut self.vitality,
            PrimaryStat::Spirit => &mut self.spirit,
            PrimaryStat::Luck => &mut self.luck,
        };
        *slot += amount;
    }
}

/// Output of the progression pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub total_stats: PrimaryStats,
    pub max_hp: i32,
    pub max_mp: i32,
    pub physical_attack: i32,
    pub magical_attack: i32,
    pub ranged_attack: i32,
    pub physical_defense: i32,
    pub magical_defense: i32,
    pub speed: i32,
    pub crit_chance: f64,
    pub crit_damage: f64,
    pub evasion: f64,
    pub lifesteal: f64,
    pub physical_block_chance: f64,
    /// Reported only; rarity weights ignore it
    pub magic_find: f64,
    pub mana_cost_reduction: f64,
    pub elemental_damage: BTreeMap<Element, f64>,
    pub elemental_damage_bonus: f64,
    pub on_hit: Vec<OnHitStatus>,
    /// Set-bonus specials surfaced to the UI
    pub special_effects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub name: String,
    pub level: u32,
    pub xp: u64,
    pub gold: u64,
    pub hp: i32,
    pub mp: i32,
    pub stat_points: u32,
    pub skill_points: u32,
    pub base: PrimaryStats,
    pub equipment: Equipment,
    pub inventory: Inventory,
    pub learned_skills: BTreeMap<SkillId, u32>,
    pub skill_slots: Vec<Option<SkillId>>,
    pub status_effects: StatusEffects,
    pub skill_cooldowns: BTreeMap<SkillId, u32>,
    pub x: usize,
    pub y: usize,
    #[serde(skip)]
    derived: DerivedStats,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new("Adventurer", DEFAULT_INVENTORY_CAPACITY, SKILL_SLOT_COUNT, STARTING_GOLD)
    }
}

impl PlayerState {
    pub fn new(name: &str, inventory_capacity: usize, skill_slots: usize, gold: u64) -> Self {
        let mut player = Self {
            name: name.to_string(),
            level: 1,
            xp: 0,
            gold,
            hp: 0,
            mp: 0,
            stat_points: 0,
            skill_points: 1,
            base: PrimaryStats::uniform(STARTING_PRIMARY_STAT),
            equipment: Equipment::default(),
            inventory: Inventory::with_capacity(inventory_capacity),
            learned_skills: BTreeMap::new(),
            skill_slots: vec![None; skill_slots],
            status_effects: StatusEffects::default(),
            skill_cooldowns: BTreeMap::new(),
            x: 0,
            y: 0,
            derived: DerivedStats::default(),
        };
        player.refresh_derived();
        player.hp = player.derived.max_hp;
        player.mp = player.derived.max_mp;
        player
    }

    pub fn derived(&self) -> &DerivedStats {
        &self.derived
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn skill_level(&self, id: SkillId) -> u32 {
        self.learned_skills.get(&id).copied().unwrap_or(0)
    }

    pub fn cooldown(&self, id: SkillId) -> u32 {
        self.skill_cooldowns.get(&id).copied().unwrap_or(0)
    }

    pub fn tick_cooldowns(&mut self) {
        for turns in self.skill_cooldowns.values_mut() {
            *turns = turns.saturating_sub(1);
        }
    }

    /// Damage-formula view of the player
    pub fn combat_profile(&self) -> CombatProfile {
        let d = &self.derived;
        CombatProfile {
            side: Side::Player,
            hp: self.hp,
            max_hp: d.max_hp,
            physical_attack: d.physical_attack,
            magical_attack: d.magical_attack,
            ranged_attack: d.ranged_attack,
            physical_defense: d.physical_defense,
            magical_defense: d.magical_defense,
            crit_chance: d.crit_chance,
            crit_damage: d.crit_damage,
            evasion: d.evasion,
            lifesteal: d.lifesteal,
            elemental_damage: d.elemental_damage.iter().map(|(e, v)| (*e, *v)).collect(),
            elemental_damage_bonus: d.elemental_damage_bonus,
            on_hit: d.on_hit.clone(),
            aura_defense_reduction: aura_defense_reduction(&self.equipment),
        }
    }

    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).min(self.derived.max_hp);
        self.hp - before
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.hp = (self.hp - amount.max(0)).max(0);
    }

    /// Spend skill points on one level of `id`. Returns the new level.
    pub fn learn_skill(&mut self, id: SkillId) -> Result<u32, ActionRejected> {
        let def = skill_def(id).ok_or_else(|| ActionRejected::UnknownSkill(id.key().into()))?;
        let current = self.skill_level(id);
        if current >= def.max_level {
            return Err(ActionRejected::MaxLevel(def.name.into()));
        }
        if self.skill_points < def.cost_per_level {
            return Err(ActionRejected::NotEnoughSkillPoints {
                needed: def.cost_per_level,
                available: self.skill_points,
            });
        }
        for dep in def.dependencies {
            let mastered = skill_def(*dep).is_some_and(|d| self.skill_level(*dep) >= d.max_level);
            if !mastered {
                return Err(ActionRejected::DependencyNotMastered {
                    skill: def.name.into(),
                    dependency: skill_def(*dep).map_or(dep.key(), |d| d.name).into(),
                });
            }
        }

        self.skill_points -= def.cost_per_level;
        self.learned_skills.insert(id, current + 1);
        self.refresh_derived();
        info!(skill = id.key(), level = current + 1, "skill learned");
        Ok(current + 1)
    }

    /// Put a learned active skill in a slot, moving it if already slotted
    pub fn equip_skill_to_slot(&mut self, id: SkillId, slot: usize) -> Result<(), ActionRejected> {
        if slot >= self.skill_slots.len() {
            return Err(ActionRejected::InvalidSkillSlot(slot));
        }
        let def = skill_def(id).ok_or_else(|| ActionRejected::UnknownSkill(id.key().into()))?;
        if self.skill_level(id) == 0 {
            return Err(ActionRejected::NotLearned(def.name.into()));
        }
        if !def.is_active() {
            return Err(ActionRejected::PassiveSkill(def.name.into()));
        }
        for existing in self.skill_slots.iter_mut() {
            if *existing == Some(id) {
                *existing = None;
            }
        }
        self.skill_slots[slot] = Some(id);
        Ok(())
    }

    pub fn allocate_stat_point(&mut self, stat: PrimaryStat) -> Result<i32, ActionRejected> {
        if self.stat_points == 0 {
            return Err(ActionRejected::NoStatPoints);
        }
        self.stat_points -= 1;
        self.base.add(stat, 1);
        self.refresh_derived();
        Ok(self.base.get(stat))
    }

    /// Equip from the inventory. A displaced item takes the vacated position.
    pub fn equip_item(&mut self, index: usize) -> Result<EquipSlot, ActionRejected> {
        let item = self
            .inventory
            .remove(index)
            .ok_or(ActionRejected::NoSuchItem(index))?;
        let target = self.equipment.target_slot(item.slot);
        if let Some(previous) = self.equipment.set(target, item) {
            self.inventory.insert(index, previous);
        }
        self.refresh_derived();
        Ok(target)
    }

    /// Move an equipped item back into the inventory
    pub fn unequip_item(&mut self, slot: EquipSlot) -> Result<usize, ActionRejected> {
        if self.equipment.get(slot).is_none() {
            return Err(ActionRejected::SlotEmpty(slot.key().into()));
        }
        if self.inventory.is_full() {
            return Err(ActionRejected::InventoryFull);
        }
        let item = self
            .equipment
            .take(slot)
            .ok_or_else(|| ActionRejected::SlotEmpty(slot.key().into()))?;
        let index = self
            .inventory
            .add(item)
            .map_err(|_| ActionRejected::InventoryFull)?;
        self.refresh_derived();
        Ok(index)
    }

    /// Respawn after a lost fight: half hp, 10% of gold gone, statuses cleared
    pub fn apply_defeat_penalty(&mut self) -> u64 {
        let lost = self.gold / 10;
        self.gold -= lost;
        self.hp = (self.derived.max_hp / 2).max(1);
        self.status_effects.clear();
        self.skill_cooldowns.clear();
        info!(gold_lost = lost, "player defeated");
        lost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::{Item, ItemSlot, Rarity};

    fn item(id: u64, slot: ItemSlot, strength: i32) -> Item {
        let mut stats = BTreeMap::new();
        stats.insert(PrimaryStat::Strength, strength);
        Item {
            id,
            name: format!("Item {id}"),
            base_name: "Item".into(),
            level: 1,
            slot,
            rarity: Rarity::Common,
            stats,
            affixes: Vec::new(),
            is_unique: false,
            is_set_item: false,
            set_id: None,
            special_effects: Vec::new(),
            prefix: None,
            color: "#ffffff".into(),
            price: None,
        }
    }

    #[test]
    fn test_new_player_is_full() {
        let p = PlayerState::default();
        assert_eq!(p.derived().max_hp, 110);
        assert_eq!(p.hp, 110);
        assert_eq!(p.mp, p.derived().max_mp);
        assert_eq!(p.skill_slots.len(), SKILL_SLOT_COUNT);
    }

    #[test]
    fn test_learn_skill_needs_points() {
        let mut p = PlayerState::default();
        p.skill_points = 0;
        let before = p.clone();
        assert_eq!(
            p.learn_skill(SkillId::PowerStrike),
            Err(ActionRejected::NotEnoughSkillPoints {
                needed: 1,
                available: 0
            })
        );
        assert_eq!(p, before);
    }

    #[test]
    fn test_learn_skill_needs_mastered_dependency() {
        let mut p = PlayerState::default();
        p.skill_points = 20;
        p.learn_skill(SkillId::PowerStrike).unwrap();
        let before = p.clone();
        assert!(matches!(
            p.learn_skill(SkillId::Whirlwind),
            Err(ActionRejected::DependencyNotMastered { .. })
        ));
        assert_eq!(p, before);

        for _ in 0..4 {
            p.learn_skill(SkillId::PowerStrike).unwrap();
        }
        assert_eq!(
            p.learn_skill(SkillId::PowerStrike),
            Err(ActionRejected::MaxLevel("Power Strike".into()))
        );
        assert_eq!(p.learn_skill(SkillId::Whirlwind), Ok(1));
        assert_eq!(p.skill_points, 20 - 5 - 2);
    }

    #[test]
    fn test_passive_refreshes_derived() {
        let mut p = PlayerState::default();
        p.learn_skill(SkillId::IronSkin).unwrap();
        assert_eq!(p.derived().physical_defense, 9 + 2);
    }

    #[test]
    fn test_equip_skill_to_slot() {
        let mut p = PlayerState::default();
        p.skill_points = 5;
        assert!(matches!(
            p.equip_skill_to_slot(SkillId::Fireball, 0),
            Err(ActionRejected::NotLearned(_))
        ));
        p.learn_skill(SkillId::Fireball).unwrap();
        p.learn_skill(SkillId::Vigor).unwrap();
        assert!(matches!(
            p.equip_skill_to_slot(SkillId::Vigor, 0),
            Err(ActionRejected::PassiveSkill(_))
        ));
        assert_eq!(
            p.equip_skill_to_slot(SkillId::Fireball, 99),
            Err(ActionRejected::InvalidSkillSlot(99))
        );
        p.equip_skill_to_slot(SkillId::Fireball, 0).unwrap();
        p.equip_skill_to_slot(SkillId::Fireball, 2).unwrap();
        assert_eq!(p.skill_slots[0], None);
        assert_eq!(p.skill_slots[2], Some(SkillId::Fireball));
    }

    #[test]
    fn test_allocate_stat_point() {
        let mut p = PlayerState::default();
        assert_eq!(p.allocate_stat_point(PrimaryStat::Vitality), Err(ActionRejected::NoStatPoints));
        p.stat_points = 1;
        assert_eq!(p.allocate_stat_point(PrimaryStat::Vitality), Ok(6));
        assert_eq!(p.derived().max_hp, 120);
        assert_eq!(p.stat_points, 0);
    }

    #[test]
    fn test_equip_swaps_into_same_position() {
        let mut p = PlayerState::default();
        p.inventory.add(item(1, ItemSlot::Weapon, 3)).unwrap();
        p.inventory.add(item(2, ItemSlot::Weapon, 8)).unwrap();
        assert_eq!(p.equip_item(0), Ok(EquipSlot::Weapon));
        assert_eq!(p.derived().total_stats.strength, 8);
        assert_eq!(p.equip_item(0), Ok(EquipSlot::Weapon));
        assert_eq!(p.equipment.get(EquipSlot::Weapon).map(|i| i.id), Some(2));
        assert_eq!(p.inventory.get(0).map(|i| i.id), Some(1));
        assert_eq!(p.inventory.used_slots(), 1);
        assert_eq!(p.equip_item(7), Err(ActionRejected::NoSuchItem(7)));
    }

    #[test]
    fn test_rings_fill_both_slots() {
        let mut p = PlayerState::default();
        p.inventory.add(item(1, ItemSlot::Ring, 1)).unwrap();
        p.inventory.add(item(2, ItemSlot::Ring, 1)).unwrap();
        assert_eq!(p.equip_item(0), Ok(EquipSlot::Ring1));
        assert_eq!(p.equip_item(0), Ok(EquipSlot::Ring2));
        assert!(p.inventory.is_empty());
    }

    #[test]
    fn test_unequip_fails_when_full() {
        let mut p = PlayerState::new("Test", 1, 3, 0);
        p.inventory.add(item(1, ItemSlot::Helmet, 2)).unwrap();
        p.equip_item(0).unwrap();
        p.inventory.add(item(2, ItemSlot::Boots, 2)).unwrap();
        assert_eq!(p.unequip_item(EquipSlot::Helmet), Err(ActionRejected::InventoryFull));
        assert!(p.equipment.get(EquipSlot::Helmet).is_some());
        assert_eq!(
            p.unequip_item(EquipSlot::Cloak),
            Err(ActionRejected::SlotEmpty("cloak".into()))
        );
    }

    #[test]
    fn test_unequip_clamps_hp() {
        let mut p = PlayerState::default();
        let mut belt = item(1, ItemSlot::Belt, 0);
        belt.stats.insert(PrimaryStat::Vitality, 10);
        p.inventory.add(belt).unwrap();
        p.equip_item(0).unwrap();
        p.hp = p.derived().max_hp;
        assert_eq!(p.hp, 210);
        p.unequip_item(EquipSlot::Belt).unwrap();
        assert_eq!(p.hp, 110);
    }

    #[test]
    fn test_gain_xp_multi_level() {
        let mut p = PlayerState::default();
        let levels = p.gain_xp(100 + 282 + 10);
        assert_eq!(levels, vec![2, 3]);
        assert_eq!(p.xp, 10);
        assert_eq!(p.stat_points, 10);
        assert_eq!(p.skill_points, 3);
        assert_eq!(p.hp, p.derived().max_hp);
    }

    #[test]
    fn test_defeat_penalty() {
        let mut p = PlayerState::default();
        p.gold = 155;
        p.hp = 0;
        assert_eq!(p.apply_defeat_penalty(), 15);
        assert_eq!(p.gold, 140);
        assert_eq!(p.hp, 55);
    }
}
