//! Simulation context.
//!
//! `GameEngine` owns all session state and is its single writer: map
//! generation, spawning, combat and ecosystem feedback all run through it
//! in turn order. Hosts drive it with player commands plus `advance_time`,
//! and read it back through `render_snapshot`.
//!
//! Submodules:
//!   - `config`:     session tunables (RON / JSON)
//!   - `scheduler`:  logical turn clock with cancellable continuations
//!   - `interfaces`: renderer, asset and storage seams

pub mod config;
pub mod interfaces;
pub mod scheduler;

use std::collections::{HashSet, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::abilities::SkillId;
use crate::combat::{victory_rewards, CombatOutcome, CombatPhase, CombatRules, Encounter, TurnReport};
use crate::constants::MESSAGE_LOG_CAPACITY;
use crate::economy::Merchant;
use crate::ecosystem::persist::{load_ecosystem, save_ecosystem};
use crate::ecosystem::{Ecosystem, EcosystemAction, FlagChange};
use crate::equipment::{EquipSlot, Item, PrimaryStat, Rarity, RarityTable};
use crate::error::{ActionRejected, GenerationError, PersistError};
use crate::generation::{rng_from_seed, Biome, BiomeTileSet, Direction, GameRng, MapSeed, TileMap, WfcGenerator};
use crate::logging::TimingSpan;
use crate::loot::ItemGenerator;
use crate::monster::{MonsterGenerator, MonsterInstance, SpawnRequest, SpeciesCatalog};
use crate::player::PlayerState;

pub use config::GameConfig;
pub use interfaces::{AssetLoader, AssetManifest, ItemMarker, MonsterMarker, RenderSnapshot, Renderer, Visual};
pub use scheduler::{ScheduledTurn, TurnActor, TurnScheduler, TurnTicket};

use interfaces::{monster_sprite_key, tile_visual};

/// An item lying on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundItem {
    pub x: usize,
    pub y: usize,
    pub item: Item,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapSummary {
    pub map_index: u32,
    pub biome: Biome,
    pub width: usize,
    pub height: usize,
    pub player: (usize, usize),
    pub monsters: usize,
    pub bosses: usize,
    pub ground_items: usize,
    /// Flags flipped by the recovery tick that preceded the transition
    pub flag_changes: Vec<FlagChange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { x: usize, y: usize },
    PickedUp { x: usize, y: usize, item: String },
    /// Stepped onto an item that did not fit; it stays on the ground
    LeftBehind { x: usize, y: usize, item: String },
    Engaged { monster_id: u64, encounter_id: u64 },
}

pub struct GameEngine {
    pub config: GameConfig,
    rng: GameRng,
    map_seed: MapSeed,
    map_index: u32,
    biome: Biome,
    rules: BiomeTileSet,
    map: Option<TileMap>,
    monsters: Vec<MonsterInstance>,
    ground_items: Vec<GroundItem>,
    player: PlayerState,
    ecosystem: Ecosystem,
    species: SpeciesCatalog,
    rarities: RarityTable,
    merchant: Merchant,
    scheduler: TurnScheduler,
    encounter: Option<Encounter>,
    next_id: u64,
    messages: VecDeque<String>,
}

impl GameEngine {
    pub fn new(config: GameConfig) -> Self {
        let species = SpeciesCatalog::default();
        let ecosystem = Ecosystem::initial(&species);
        Self::build(config, ecosystem, species)
    }

    /// Resume with an existing ecosystem (e.g. one loaded from a store)
    pub fn with_ecosystem(config: GameConfig, ecosystem: Ecosystem) -> Self {
        Self::build(config, ecosystem, SpeciesCatalog::default())
    }

    fn build(config: GameConfig, ecosystem: Ecosystem, species: SpeciesCatalog) -> Self {
        let player = PlayerState::new(
            &config.player_name,
            config.inventory_capacity,
            config.skill_slots,
            config.starting_gold,
        );
        let biome = ecosystem.current_biome;
        Self {
            rng: rng_from_seed(config.seed),
            map_seed: MapSeed { seed: config.seed },
            map_index: 0,
            biome,
            rules: BiomeTileSet::for_biome(biome),
            map: None,
            monsters: Vec::new(),
            ground_items: Vec::new(),
            player,
            ecosystem,
            species,
            rarities: RarityTable::default(),
            merchant: Merchant::default(),
            scheduler: TurnScheduler::new(),
            encounter: None,
            next_id: 0,
            messages: VecDeque::new(),
            config,
        }
    }

    // ---- read access ----

    pub fn biome(&self) -> Biome {
        self.biome
    }

    pub fn map_index(&self) -> u32 {
        self.map_index
    }

    pub fn map(&self) -> Option<&TileMap> {
        self.map.as_ref()
    }

    pub fn rules(&self) -> &BiomeTileSet {
        &self.rules
    }

    pub fn monsters(&self) -> &[MonsterInstance] {
        &self.monsters
    }

    pub fn ground_items(&self) -> &[GroundItem] {
        &self.ground_items
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    /// Direct access for hosts and tools. Call `refresh_derived` after
    /// touching base stats or equipment.
    pub fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }

    pub fn ecosystem(&self) -> &Ecosystem {
        &self.ecosystem
    }

    pub fn species(&self) -> &SpeciesCatalog {
        &self.species
    }

    pub fn rarities(&self) -> &RarityTable {
        &self.rarities
    }

    pub fn merchant(&self) -> &Merchant {
        &self.merchant
    }

    pub fn encounter(&self) -> Option<&Encounter> {
        self.encounter.as_ref()
    }

    pub fn in_combat(&self) -> bool {
        self.encounter.as_ref().is_some_and(|e| !e.is_over())
    }

    pub fn pending_turns(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    fn push_message(&mut self, message: impl Into<String>) {
        if self.messages.len() >= MESSAGE_LOG_CAPACITY {
            self.messages.pop_front();
        }
        self.messages.push_back(message.into());
    }

    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn combat_rules(&self) -> CombatRules {
        CombatRules {
            rolls: self.config.damage_rolls(),
            monster_skill_chance: self.config.monster_skill_chance,
        }
    }

    fn item_generator<'a>(rarities: &'a RarityTable, config: &GameConfig) -> ItemGenerator<'a> {
        ItemGenerator::new(rarities)
            .with_unique_chance(config.unique_chance)
            .with_set_chance(config.set_chance)
    }

    fn note_flags(&mut self, changes: Vec<FlagChange>) {
        for change in changes {
            info!(flag = change.flag, active = change.active, "dungeon event flag changed");
            self.push_message(if change.active {
                format!("The dungeon stirs: {} is now active.", change.flag)
            } else {
                format!("The dungeon calms: {} has subsided.", change.flag)
            });
        }
    }

    fn feed_ecosystem(&mut self, action: EcosystemAction) {
        let changes = self.ecosystem.apply_action_effect(&action, &self.species);
        self.note_flags(changes);
    }

    // ---- map transitions ----

    /// Generate and populate the next map. On failure the current map,
    /// biome, monsters and items are left exactly as they were.
    pub fn enter_map(&mut self, biome: Biome) -> Result<MapSummary, GenerationError> {
        let _timing = TimingSpan::new("enter_map");
        let map_index = self.map_index + 1;
        let mut map_rng = rng_from_seed(self.map_seed.map_hash(map_index, biome));
        let rules = BiomeTileSet::for_biome(biome);
        let map = WfcGenerator::new(&rules, self.config.map_width, self.config.map_height)
            .with_max_attempts(self.config.wfc_max_attempts)
            .generate(&mut map_rng)
            .map_err(|e| {
                error!(error = %e, biome = biome.key(), map_index, "map transition aborted");
                e
            })?;

        let flag_changes = self.ecosystem.recover_dungeon_state(&mut self.rng);
        self.note_flags(flag_changes.clone());

        if let Some(encounter) = self.encounter.take() {
            debug!(encounter = encounter.id, "encounter abandoned by map transition");
        }
        let dropped = self.scheduler.cancel_all();
        if dropped > 0 {
            debug!(dropped, "queued turns cancelled by map transition");
        }
        self.map_index = map_index;
        self.biome = biome;
        self.ecosystem.current_biome = biome;
        self.monsters.clear();
        self.ground_items.clear();

        let walkable = map.positions_where(|x, y| map.is_walkable(x, y, &rules));
        let (px, py) = match walkable.choose(&mut map_rng) {
            Some(&pos) => pos,
            None => {
                warn!(map_index, "map has no walkable tile, player placed at origin");
                (0, 0)
            }
        };
        self.player.x = px;
        self.player.y = py;

        let mut occupied: HashSet<(usize, usize)> = HashSet::from([(px, py)]);
        let forced = self.ecosystem.forced_boss(biome);
        let monsters = MonsterGenerator::new(&self.species)
            .with_boss_chance(self.config.boss_chance)
            .with_variance(self.config.monster_variance());
        for n in 0..self.config.monsters_per_map {
            self.next_id += 1;
            let request = SpawnRequest {
                id: self.next_id,
                biome,
                player_level: self.player.level,
                forced_boss: if n == 0 { forced } else { None },
            };
            match monsters.generate(&map, &rules, &occupied, &self.ecosystem.state, &request, &mut map_rng) {
                Ok(monster) => {
                    occupied.insert((monster.x, monster.y));
                    self.monsters.push(monster);
                }
                Err(e) => {
                    warn!(error = %e, spawned = n, "monster spawning stopped early");
                    break;
                }
            }
        }

        let items = Self::item_generator(&self.rarities, &self.config);
        let level = self.player.level;
        let magic_find = self.player.derived().magic_find;
        let free = map.positions_where(|x, y| !occupied.contains(&(x, y)) && map.is_walkable(x, y, &rules));
        let spots: Vec<(usize, usize)> = free
            .choose_multiple(&mut map_rng, self.config.items_per_map)
            .copied()
            .collect();
        for (x, y) in spots {
            self.next_id += 1;
            let item = items.generate(self.next_id, level, magic_find, None, &mut map_rng);
            self.ground_items.push(GroundItem { x, y, item });
        }
        let next_id = &mut self.next_id;
        self.merchant = Merchant::stocked(
            &items,
            &self.rarities,
            level,
            || {
                *next_id += 1;
                *next_id
            },
            &mut map_rng,
        );

        let summary = MapSummary {
            map_index,
            biome,
            width: map.width,
            height: map.height,
            player: (px, py),
            monsters: self.monsters.len(),
            bosses: self.monsters.iter().filter(|m| m.is_boss).count(),
            ground_items: self.ground_items.len(),
            flag_changes,
        };
        self.map = Some(map);
        self.rules = rules;
        info!(
            map_index,
            biome = biome.key(),
            monsters = summary.monsters,
            bosses = summary.bosses,
            items = summary.ground_items,
            "entered map"
        );
        self.push_message(format!("You enter the {} depths (map {map_index}).", biome.key()));
        Ok(summary)
    }

    // ---- exploration ----

    pub fn move_player(&mut self, direction: Direction) -> Result<MoveOutcome, ActionRejected> {
        if self.in_combat() {
            return Err(ActionRejected::AlreadyInCombat);
        }
        let map = self.map.as_ref().ok_or(ActionRejected::NoMap)?;
        let (x, y) = direction
            .step(self.player.x, self.player.y, map.width, map.height)
            .ok_or(ActionRejected::Blocked)?;
        if !map.is_walkable(x, y, &self.rules) {
            return Err(ActionRejected::Blocked);
        }

        let target = self
            .monsters
            .iter()
            .find(|m| m.x == x && m.y == y && m.is_alive())
            .map(|m| m.id);
        if let Some(monster_id) = target {
            let encounter_id = self.start_encounter(monster_id)?;
            return Ok(MoveOutcome::Engaged {
                monster_id,
                encounter_id,
            });
        }

        self.player.x = x;
        self.player.y = y;
        let Some(index) = self.ground_items.iter().position(|g| g.x == x && g.y == y) else {
            return Ok(MoveOutcome::Moved { x, y });
        };
        let ground = self.ground_items.remove(index);
        let name = ground.item.name.clone();
        match self.player.inventory.add(ground.item) {
            Ok(_) => {
                self.push_message(format!("You pick up {name}."));
                Ok(MoveOutcome::PickedUp { x, y, item: name })
            }
            Err(item) => {
                self.ground_items.insert(index, GroundItem { x, y, item });
                self.push_message(format!("Your inventory is full; {name} stays on the ground."));
                Ok(MoveOutcome::LeftBehind { x, y, item: name })
            }
        }
    }

    // ---- combat ----

    /// Engage a monster. Returns the encounter id.
    pub fn start_encounter(&mut self, monster_id: u64) -> Result<u64, ActionRejected> {
        if self.in_combat() {
            return Err(ActionRejected::AlreadyInCombat);
        }
        let monster = self
            .monsters
            .iter()
            .find(|m| m.id == monster_id && m.is_alive())
            .ok_or(ActionRejected::NoSuchMonster(monster_id))?;
        self.next_id += 1;
        let encounter = Encounter::begin(self.next_id, &self.player, monster);
        let id = encounter.id;
        let phase = encounter.phase();
        for line in encounter.log.clone() {
            self.push_message(line);
        }
        self.encounter = Some(encounter);

        match phase {
            CombatPhase::MonsterTurn => {
                self.scheduler
                    .schedule(id, TurnActor::Monster, self.config.turn_delay_ms);
            }
            CombatPhase::PlayerTurn => {
                self.step(|enc, player, monster, _, _| enc.start_player_turn(player, monster))?;
            }
            CombatPhase::Ended(_) => {}
        }
        Ok(id)
    }

    /// Run one resolver step against the active encounter, then apply its
    /// consequences (ecosystem feedback, scheduling, rewards).
    fn step(
        &mut self,
        action: impl FnOnce(
            &mut Encounter,
            &mut PlayerState,
            &mut MonsterInstance,
            &CombatRules,
            &mut GameRng,
        ) -> Result<TurnReport, ActionRejected>,
    ) -> Result<TurnReport, ActionRejected> {
        let rules = self.combat_rules();
        let encounter = self.encounter.as_mut().ok_or(ActionRejected::NoCombat)?;
        let monster_id = encounter.monster_id;
        let monster = self
            .monsters
            .iter_mut()
            .find(|m| m.id == monster_id)
            .ok_or(ActionRejected::NoSuchMonster(monster_id))?;
        let report = action(encounter, &mut self.player, monster, &rules, &mut self.rng)?;

        for line in &report.messages {
            self.push_message(line.clone());
        }
        if report.used_skill {
            self.feed_ecosystem(EcosystemAction::UseSkill {
                element: report.skill_element,
            });
        }
        match self.encounter.as_ref().map(|e| (e.id, e.phase())) {
            Some((_, CombatPhase::Ended(outcome))) => self.finish_encounter(outcome),
            Some((id, CombatPhase::MonsterTurn)) => {
                self.scheduler
                    .schedule(id, TurnActor::Monster, self.config.turn_delay_ms);
            }
            _ => {}
        }
        Ok(report)
    }

    pub fn player_attack(&mut self) -> Result<TurnReport, ActionRejected> {
        self.step(|enc, player, monster, rules, rng| enc.player_attack(player, monster, rules, rng))
    }

    pub fn player_use_skill(&mut self, slot: usize) -> Result<TurnReport, ActionRejected> {
        self.step(|enc, player, monster, rules, rng| enc.player_use_skill(slot, player, monster, rules, rng))
    }

    pub fn player_flee(&mut self) -> Result<TurnReport, ActionRejected> {
        self.step(|enc, player, monster, _, rng| enc.player_flee(player, monster, rng))
    }

    /// Move the logical clock forward, running every turn that falls due.
    /// Turns queued for an encounter that has since ended are dropped.
    pub fn advance_time(&mut self, ms: u64) -> Vec<TurnReport> {
        let target = self.scheduler.now_ms().saturating_add(ms);
        let mut reports = Vec::new();
        while let Some(due) = self.scheduler.next_due().filter(|due| *due <= target) {
            let elapsed = due - self.scheduler.now_ms();
            for turn in self.scheduler.advance(elapsed) {
                if let Some(report) = self.run_scheduled(turn) {
                    reports.push(report);
                }
            }
        }
        let rest = target - self.scheduler.now_ms();
        self.scheduler.advance(rest);
        reports
    }

    fn run_scheduled(&mut self, turn: ScheduledTurn) -> Option<TurnReport> {
        let live = self
            .encounter
            .as_ref()
            .is_some_and(|e| e.id == turn.ticket.encounter_id && !e.is_over());
        if !live {
            debug!(ticket = turn.ticket.id, encounter = turn.ticket.encounter_id, "stale turn dropped");
            return None;
        }
        let result = match turn.actor {
            TurnActor::Monster => self.step(|enc, player, monster, rules, rng| enc.monster_turn(player, monster, rules, rng)),
            TurnActor::Player => self.step(|enc, player, monster, _, _| enc.start_player_turn(player, monster)),
        };
        match result {
            Ok(report) => {
                if turn.actor == TurnActor::Monster {
                    if let Some(enc) = self.encounter.as_ref().filter(|e| e.phase() == CombatPhase::PlayerTurn) {
                        let id = enc.id;
                        self.scheduler
                            .schedule(id, TurnActor::Player, self.config.turn_delay_ms);
                    }
                }
                Some(report)
            }
            Err(rejected) => {
                debug!(%rejected, actor = ?turn.actor, "scheduled turn no longer applies");
                None
            }
        }
    }

    fn finish_encounter(&mut self, outcome: CombatOutcome) {
        let Some(encounter) = self.encounter.take() else {
            return;
        };
        self.scheduler.cancel_encounter(encounter.id);
        self.player.status_effects.clear();
        match outcome {
            CombatOutcome::Victory => self.claim_victory(encounter.monster_id),
            CombatOutcome::Defeat => {
                let lost = self.player.apply_defeat_penalty();
                self.push_message(format!("You lose {lost} gold and wake up battered."));
            }
            CombatOutcome::Fled => {}
        }
        info!(encounter = encounter.id, ?outcome, turns = encounter.turn, "encounter finished");
    }

    fn claim_victory(&mut self, monster_id: u64) {
        let Some(index) = self.monsters.iter().position(|m| m.id == monster_id) else {
            warn!(monster_id, "defeated monster already gone");
            return;
        };
        let monster = self.monsters.remove(index);
        let rewards = victory_rewards(&monster, &mut self.rng);
        self.player.gold += rewards.gold;
        let levels = self.player.gain_xp(rewards.xp);
        self.push_message(format!(
            "{} is slain. You gain {} XP and {} gold.",
            monster.name, rewards.xp, rewards.gold
        ));

        self.feed_ecosystem(EcosystemAction::KillMonster {
            species: monster.monster_type.clone(),
        });
        if monster.is_boss {
            self.feed_ecosystem(EcosystemAction::BossKilled {
                species: monster.monster_type.clone(),
            });
        }
        for level in levels {
            self.push_message(format!("Level up! You are now level {level}."));
            self.feed_ecosystem(EcosystemAction::PlayerLevelUp { level });
        }

        if rewards.drops_loot {
            self.drop_loot(&monster);
        }
    }

    fn drop_loot(&mut self, monster: &MonsterInstance) {
        let id = self.alloc_id();
        let level = self.player.level;
        let magic_find = self.player.derived().magic_find;
        let item = Self::item_generator(&self.rarities, &self.config)
            .generate(id, level, magic_find, None, &mut self.rng);
        let name = item.name.clone();
        match self.player.inventory.add(item) {
            Ok(_) => self.push_message(format!("{} dropped {name}.", monster.name)),
            Err(item) => {
                self.push_message(format!("{} dropped {name}, but your bag is full.", monster.name));
                self.ground_items.push(GroundItem {
                    x: monster.x,
                    y: monster.y,
                    item,
                });
            }
        }
    }

    // ---- validated UI mutations ----

    fn audit<T>(&mut self, result: Result<T, ActionRejected>) -> Result<T, ActionRejected> {
        if let Err(rejected) = &result {
            debug!(%rejected, "action rejected");
            self.push_message(rejected.to_string());
        }
        result
    }

    pub fn learn_skill(&mut self, id: SkillId) -> Result<u32, ActionRejected> {
        let result = self.player.learn_skill(id);
        self.audit(result)
    }

    pub fn equip_skill_to_slot(&mut self, id: SkillId, slot: usize) -> Result<(), ActionRejected> {
        let result = self.player.equip_skill_to_slot(id, slot);
        self.audit(result)
    }

    pub fn allocate_stat_point(&mut self, stat: PrimaryStat) -> Result<i32, ActionRejected> {
        let result = self.player.allocate_stat_point(stat);
        self.audit(result)
    }

    pub fn equip_item(&mut self, index: usize) -> Result<EquipSlot, ActionRejected> {
        let result = self.player.equip_item(index);
        self.audit(result)
    }

    pub fn unequip_item(&mut self, slot: EquipSlot) -> Result<usize, ActionRejected> {
        let result = self.player.unequip_item(slot);
        self.audit(result)
    }

    pub fn buy_item(&mut self, index: usize) -> Result<usize, ActionRejected> {
        let result = self.merchant.buy_item(index, &mut self.player);
        self.audit(result)
    }

    pub fn sell_item(&mut self, index: usize) -> Result<u64, ActionRejected> {
        let result = self.merchant.sell_item(index, &mut self.player, &self.rarities);
        self.audit(result)
    }

    // ---- persistence ----

    pub fn save_ecosystem(&self, store: &mut dyn interfaces::StateStore) -> Result<(), PersistError> {
        save_ecosystem(store, &self.ecosystem.state)
    }

    /// Replace the ecosystem with the stored one (or a fresh one when the
    /// stored data is missing or corrupt)
    pub fn load_ecosystem(&mut self, store: &dyn interfaces::StateStore) {
        self.ecosystem.state = load_ecosystem(store, &self.species);
        let changes = self.ecosystem.check_dungeon_events();
        self.note_flags(changes);
    }

    // ---- rendering ----

    pub fn render_snapshot(&self, assets: &dyn AssetLoader) -> RenderSnapshot {
        let (width, height, tiles) = match &self.map {
            Some(map) => (
                map.width,
                map.height,
                map.tiles
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|t| tile_visual(&t.name, self.biome, &self.rules, assets))
                            .collect()
                    })
                    .collect(),
            ),
            None => (0, 0, Vec::new()),
        };
        let monsters = self
            .monsters
            .iter()
            .map(|m| {
                let key = monster_sprite_key(&m.monster_type);
                let visual = if assets.sprite_available(&key) {
                    Visual::Sprite(key)
                } else {
                    Visual::Color(m.threat_color.clone())
                };
                MonsterMarker {
                    id: m.id,
                    x: m.x,
                    y: m.y,
                    name: m.name.clone(),
                    visual,
                    threat_color: m.threat_color.clone(),
                    is_boss: m.is_boss,
                }
            })
            .collect();
        let items = self
            .ground_items
            .iter()
            .map(|g| ItemMarker {
                x: g.x,
                y: g.y,
                name: g.item.name.clone(),
                color: g.item.color.clone(),
            })
            .collect();
        RenderSnapshot {
            biome: self.biome,
            width,
            height,
            tiles,
            player: (self.player.x, self.player.y),
            player_hp: self.player.hp,
            player_max_hp: self.player.derived().max_hp,
            monsters,
            items,
            in_combat: self.in_combat(),
            messages: self.messages.iter().rev().take(5).rev().cloned().collect(),
        }
    }

    pub fn render(&self, renderer: &mut dyn Renderer, assets: &dyn AssetLoader) {
        renderer.redraw(&self.render_snapshot(assets));
    }

    /// Roll an item outside of loot drops (tools and tests)
    pub fn roll_item<R: Rng + ?Sized>(&mut self, rarity: Option<Rarity>, rng: &mut R) -> Item {
        let id = self.alloc_id();
        let level = self.player.level;
        let magic_find = self.player.derived().magic_find;
        Self::item_generator(&self.rarities, &self.config).generate(id, level, magic_find, rarity, rng)
    }
}

// =====================================================
// Tests
// =====================================================
