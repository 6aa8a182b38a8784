//! Turn-based combat resolver.
//!
//! An `Encounter` is a small state machine:
//!
//! ```text
//! PlayerTurn --(attack | skill | failed flee)--> MonsterTurn --(act | stunned)--> PlayerTurn
//!     \                                              /
//!      `---------------> Ended(outcome) <-----------'
//! ```
//!
//! The faster side opens (ties go to the player). `Ended` is terminal.
//! Cooldowns of both sides tick exactly once, when a player turn opens;
//! status effects tick at the start of their owner's turn.

pub mod damage;
pub mod status;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::abilities::{skill_def, SkillEffect};
use crate::constants::*;
use crate::error::ActionRejected;
use crate::monster::skills::{BuffStat, TargetView};
use crate::monster::{MonsterInstance, MonsterSkill, SkillMutation};
use crate::player::PlayerState;
use damage::{calculate_damage, roll_chance, AttackType, CombatProfile, DamageResult, DamageRolls, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Ice,
    Lightning,
    Poison,
    Dark,
    Holy,
    Earth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatOutcome {
    Victory,
    Defeat,
    Fled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatPhase {
    PlayerTurn,
    MonsterTurn,
    Ended(CombatOutcome),
}

/// Tunables the resolver reads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatRules {
    pub rolls: DamageRolls,
    pub monster_skill_chance: f64,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            rolls: DamageRolls::default(),
            monster_skill_chance: MONSTER_SKILL_CHANCE,
        }
    }
}

/// Result of one step of the state machine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnReport {
    pub messages: Vec<String>,
    pub outcome: Option<CombatOutcome>,
    /// Element of the skill the player cast, if any
    pub skill_element: Option<Element>,
    pub used_skill: bool,
    /// The acting side lost its turn to a stun
    pub skipped: bool,
    pub damage_dealt: i32,
}

/// Damage-formula view of a monster
pub fn monster_profile(monster: &MonsterInstance) -> CombatProfile {
    let s = &monster.stats;
    CombatProfile {
        hp: s.hp,
        max_hp: s.max_hp,
        physical_attack: s.physical_attack,
        magical_attack: s.magical_attack,
        ranged_attack: s.physical_attack,
        physical_defense: s.physical_defense,
        magical_defense: s.magical_defense,
        crit_chance: BASE_CRIT_CHANCE,
        evasion: s.evasion,
        ..CombatProfile::basic(Side::Monster, s.max_hp, s.physical_attack, s.physical_defense)
    }
}

/// Rewards for killing `monster`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rewards {
    pub xp: u64,
    pub gold: u64,
    pub drops_loot: bool,
}

pub fn victory_rewards<R: Rng + ?Sized>(monster: &MonsterInstance, rng: &mut R) -> Rewards {
    let level = monster.level as u64;
    let mut xp = (monster.level as f64 * 10.0 * monster.tier.stat_multiplier()).floor() as u64;
    if monster.is_boss {
        xp *= 5;
    }
    let gold = level * 3 + rng.gen_range(0..=level);
    let drops_loot = monster.is_boss || roll_chance(rng, LOOT_DROP_CHANCE);
    Rewards { xp, gold, drops_loot }
}

/// Chance the player escapes, from the speed difference
pub fn flee_chance(player_speed: i32, monster_speed: i32) -> f64 {
    (FLEE_BASE_CHANCE + (player_speed - monster_speed) as f64 * FLEE_SPEED_FACTOR).clamp(0.1, 0.9)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub id: u64,
    pub monster_id: u64,
    pub turn: u32,
    pub log: Vec<String>,
    phase: CombatPhase,
    player_turn_started: bool,
}

impl Encounter {
    pub fn begin(id: u64, player: &PlayerState, monster: &MonsterInstance) -> Self {
        let phase = if monster.stats.speed > player.derived().speed {
            CombatPhase::MonsterTurn
        } else {
            CombatPhase::PlayerTurn
        };
        debug!(id, monster = monster.id, ?phase, "encounter started");
        Self {
            id,
            monster_id: monster.id,
            turn: 1,
            log: vec![format!("You engage {}!", monster.name)],
            phase,
            player_turn_started: false,
        }
    }

    pub fn phase(&self) -> CombatPhase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, CombatPhase::Ended(_))
    }

    pub fn outcome(&self) -> Option<CombatOutcome> {
        match self.phase {
            CombatPhase::Ended(outcome) => Some(outcome),
            _ => None,
        }
    }

    fn expect_phase(&self, expected: CombatPhase) -> Result<(), ActionRejected> {
        match self.phase {
            CombatPhase::Ended(_) => Err(ActionRejected::NoCombat),
            phase if phase == expected => Ok(()),
            _ => Err(ActionRejected::NotYourTurn),
        }
    }

    fn end(&mut self, outcome: CombatOutcome, report: &mut TurnReport) {
        self.phase = CombatPhase::Ended(outcome);
        report.outcome = Some(outcome);
        report.messages.push(
            match outcome {
                CombatOutcome::Victory => "Victory!",
                CombatOutcome::Defeat => "You have been defeated...",
                CombatOutcome::Fled => "You fled from combat.",
            }
            .to_string(),
        );
        debug!(id = self.id, ?outcome, turn = self.turn, "encounter ended");
    }

    fn record(&mut self, report: &TurnReport) {
        self.log.extend(report.messages.iter().cloned());
    }

    /// Cooldowns, then the player's statuses. May end the turn or the fight.
    fn open_player_turn(&mut self, player: &mut PlayerState, monster: &mut MonsterInstance) -> TurnReport {
        let mut report = TurnReport::default();
        if self.player_turn_started {
            return report;
        }
        self.player_turn_started = true;
        player.tick_cooldowns();
        monster.tick_cooldowns();

        let max_hp = player.derived().max_hp;
        let tick = player.status_effects.tick(&mut player.hp, max_hp, &player.name);
        report.messages.extend(tick.messages);
        if tick.defeated {
            self.end(CombatOutcome::Defeat, &mut report);
        } else if player.status_effects.is_stunned() {
            report.skipped = true;
            report.messages.push("You are stunned and lose your turn.".into());
            self.phase = CombatPhase::MonsterTurn;
        }
        report
    }

    /// Open the player's turn. Idempotent within one turn.
    pub fn start_player_turn(
        &mut self,
        player: &mut PlayerState,
        monster: &mut MonsterInstance,
    ) -> Result<TurnReport, ActionRejected> {
        self.expect_phase(CombatPhase::PlayerTurn)?;
        let report = self.open_player_turn(player, monster);
        self.record(&report);
        Ok(report)
    }

    fn land_player_hit(
        &mut self,
        player: &mut PlayerState,
        monster: &mut MonsterInstance,
        result: DamageResult,
        report: &mut TurnReport,
    ) {
        if result.is_evaded {
            report.messages.push(format!("{} evades your attack.", monster.name));
            return;
        }
        monster.stats.hp = (monster.stats.hp - result.damage).max(0);
        report.damage_dealt += result.damage;
        report.messages.push(if result.is_critical {
            format!("Critical hit! You deal {} damage to {}.", result.damage, monster.name)
        } else {
            format!("You deal {} damage to {}.", result.damage, monster.name)
        });
        if result.heal > 0 {
            let healed = player.heal(result.heal);
            report.messages.push(format!("You drain {healed} HP."));
        }
        for status in result.statuses {
            report
                .messages
                .push(format!("{} is afflicted with {}.", monster.name, status.kind.label()));
            monster.status_effects.apply(status);
        }
    }

    fn close_player_turn(&mut self, monster: &MonsterInstance, report: &mut TurnReport) {
        if monster.is_alive() {
            self.phase = CombatPhase::MonsterTurn;
        } else {
            self.end(CombatOutcome::Victory, report);
        }
        self.record(report);
    }

    /// Opens the turn if needed. The flag is false when the turn was lost
    /// to a stun or the fight ended during the status tick.
    fn prepare_action(
        &mut self,
        player: &mut PlayerState,
        monster: &mut MonsterInstance,
    ) -> Result<(TurnReport, bool), ActionRejected> {
        self.expect_phase(CombatPhase::PlayerTurn)?;
        let report = self.open_player_turn(player, monster);
        let can_act = self.phase == CombatPhase::PlayerTurn;
        if !can_act {
            self.record(&report);
        }
        Ok((report, can_act))
    }

    pub fn player_attack<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerState,
        monster: &mut MonsterInstance,
        rules: &CombatRules,
        rng: &mut R,
    ) -> Result<TurnReport, ActionRejected> {
        let (mut report, can_act) = self.prepare_action(player, monster)?;
        if !can_act {
            return Ok(report);
        }
        let result = calculate_damage(
            &player.combat_profile(),
            &monster_profile(monster),
            AttackType::Physical,
            &rules.rolls,
            rng,
        );
        self.land_player_hit(player, monster, result, &mut report);
        self.close_player_turn(monster, &mut report);
        Ok(report)
    }

    pub fn player_use_skill<R: Rng + ?Sized>(
        &mut self,
        slot: usize,
        player: &mut PlayerState,
        monster: &mut MonsterInstance,
        rules: &CombatRules,
        rng: &mut R,
    ) -> Result<TurnReport, ActionRejected> {
        let (mut report, can_act) = self.prepare_action(player, monster)?;
        if !can_act {
            return Ok(report);
        }
        if let Err(rejected) = self.validate_skill(slot, player) {
            self.record(&report);
            return Err(rejected);
        }
        let Some(id) = player.skill_slots.get(slot).copied().flatten() else {
            return Err(ActionRejected::EmptySkillSlot(slot));
        };
        let Some(def) = skill_def(id) else {
            return Err(ActionRejected::UnknownSkill(id.key().into()));
        };
        let level = player.skill_level(id);
        player.mp -= def.mana_cost(level, player.derived().mana_cost_reduction);
        player.skill_cooldowns.insert(id, def.cooldown);
        report.used_skill = true;
        report.skill_element = def.element;

        match def.effect(player.derived(), level) {
            Some(SkillEffect::Heal { amount, message }) => {
                player.heal(amount);
                report.messages.push(message);
            }
            Some(SkillEffect::Damage {
                attack_type,
                coefficient,
                crit_bonus,
                status,
                message,
            }) => {
                report.messages.push(message);
                let mut attacker = player.combat_profile().with_scaled_attack(attack_type, coefficient);
                attacker.crit_chance = (attacker.crit_chance + crit_bonus).min(1.0);
                let mut result =
                    calculate_damage(&attacker, &monster_profile(monster), attack_type, &rules.rolls, rng);
                if let Some(status) = status.filter(|_| !result.is_evaded) {
                    result.statuses.push(status);
                }
                self.land_player_hit(player, monster, result, &mut report);
            }
            None => warn!(skill = id.key(), "active skill produced no effect"),
        }
        self.close_player_turn(monster, &mut report);
        Ok(report)
    }

    fn validate_skill(&self, slot: usize, player: &PlayerState) -> Result<(), ActionRejected> {
        let id = player
            .skill_slots
            .get(slot)
            .ok_or(ActionRejected::InvalidSkillSlot(slot))?
            .ok_or(ActionRejected::EmptySkillSlot(slot))?;
        let def = skill_def(id).ok_or_else(|| ActionRejected::UnknownSkill(id.key().into()))?;
        if !def.is_active() {
            return Err(ActionRejected::PassiveSkill(def.name.into()));
        }
        let level = player.skill_level(id);
        if level == 0 {
            return Err(ActionRejected::NotLearned(def.name.into()));
        }
        if def.requires_shield && !player.equipment.has_shield() {
            return Err(ActionRejected::RequiresShield(def.name.into()));
        }
        let cost = def.mana_cost(level, player.derived().mana_cost_reduction);
        if player.mp < cost {
            return Err(ActionRejected::NotEnoughMana {
                needed: cost,
                available: player.mp,
            });
        }
        let cooldown = player.cooldown(id);
        if cooldown > 0 {
            return Err(ActionRejected::OnCooldown(def.name.into(), cooldown));
        }
        Ok(())
    }

    pub fn player_flee<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerState,
        monster: &mut MonsterInstance,
        rng: &mut R,
    ) -> Result<TurnReport, ActionRejected> {
        let (mut report, can_act) = self.prepare_action(player, monster)?;
        if !can_act {
            return Ok(report);
        }
        let chance = flee_chance(player.derived().speed, monster.stats.speed);
        if roll_chance(rng, chance) {
            self.end(CombatOutcome::Fled, &mut report);
        } else {
            report.messages.push("You fail to escape!".into());
            self.phase = CombatPhase::MonsterTurn;
        }
        self.record(&report);
        Ok(report)
    }

    pub fn monster_turn<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerState,
        monster: &mut MonsterInstance,
        rules: &CombatRules,
        rng: &mut R,
    ) -> Result<TurnReport, ActionRejected> {
        self.expect_phase(CombatPhase::MonsterTurn)?;
        let mut report = TurnReport::default();

        let tick = monster
            .status_effects
            .tick(&mut monster.stats.hp, monster.stats.max_hp, &monster.name);
        report.messages.extend(tick.messages);

        if tick.defeated {
            self.end(CombatOutcome::Victory, &mut report);
            self.record(&report);
            return Ok(report);
        }

        if monster.status_effects.is_stunned() {
            report.skipped = true;
            report.messages.push(format!("{} is stunned!", monster.name));
        } else {
            let ready = monster.ready_skills();
            if !ready.is_empty() && roll_chance(rng, rules.monster_skill_chance) {
                let skill = ready[rng.gen_range(0..ready.len())];
                self.monster_skill(skill, player, monster, &mut report);
            } else {
                self.monster_attack(player, monster, rules, rng, &mut report);
            }
        }

        if !player.is_alive() {
            self.end(CombatOutcome::Defeat, &mut report);
        } else {
            self.phase = CombatPhase::PlayerTurn;
            self.player_turn_started = false;
            self.turn += 1;
        }
        self.record(&report);
        Ok(report)
    }

    fn monster_attack<R: Rng + ?Sized>(
        &mut self,
        player: &mut PlayerState,
        monster: &MonsterInstance,
        rules: &CombatRules,
        rng: &mut R,
        report: &mut TurnReport,
    ) {
        if roll_chance(rng, player.derived().physical_block_chance) {
            report.messages.push(format!("You block {}'s attack.", monster.name));
            return;
        }
        let result = calculate_damage(
            &monster_profile(monster),
            &player.combat_profile(),
            AttackType::Physical,
            &rules.rolls,
            rng,
        );
        if result.is_evaded {
            report.messages.push(format!("You evade {}'s attack.", monster.name));
            return;
        }
        player.take_damage(result.damage);
        report.messages.push(if result.is_critical {
            format!("{} lands a critical hit for {} damage!", monster.name, result.damage)
        } else {
            format!("{} hits you for {} damage.", monster.name, result.damage)
        });
        for status in result.statuses {
            player.status_effects.apply(status);
        }
    }

    /// Monster skills skip evasion and block
    fn monster_skill(
        &mut self,
        skill: MonsterSkill,
        player: &mut PlayerState,
        monster: &mut MonsterInstance,
        report: &mut TurnReport,
    ) {
        let target = TargetView {
            physical_defense: player.derived().physical_defense,
            magical_defense: player.derived().magical_defense,
            max_hp: player.derived().max_hp,
        };
        let outcome = skill.resolve(&monster.name, &monster.stats, &target);
        monster.skill_cooldowns.insert(skill, skill.cooldown());
        report.messages.push(outcome.message);

        for mutation in outcome.mutations {
            match mutation {
                SkillMutation::DamageTarget { amount } => {
                    player.take_damage(amount);
                    report.messages.push(format!("You take {amount} damage."));
                }
                SkillMutation::HealSelf { amount } => {
                    let before = monster.stats.hp;
                    monster.stats.hp = (monster.stats.hp + amount.max(0)).min(monster.stats.max_hp);
                    report
                        .messages
                        .push(format!("{} recovers {} HP.", monster.name, monster.stats.hp - before));
                }
                SkillMutation::ApplyStatus(status) => {
                    report
                        .messages
                        .push(format!("You are afflicted with {}.", status.kind.label()));
                    player.status_effects.apply(status);
                }
                SkillMutation::BuffSelf { stat, amount } => match stat {
                    BuffStat::PhysicalAttack => monster.stats.physical_attack += amount,
                    BuffStat::PhysicalDefense => monster.stats.physical_defense += amount,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::SkillId;
    use crate::combat::status::{StatusEffect, StatusKind};
    use crate::generation::rng_from_seed;
    use crate::monster::{MonsterGenerator, SpeciesCatalog, StatVariance, Tier};

    fn monster(species: &str, player_level: u32) -> MonsterInstance {
        let catalog = SpeciesCatalog::default();
        let gen = MonsterGenerator::new(&catalog)
            .with_boss_chance(0.0)
            .with_variance(StatVariance::none());
        let species = catalog.get(species).unwrap();
        let mut rng = rng_from_seed(11);
        gen.create(1, species, player_level, false, &mut rng)
    }

    fn pinned() -> CombatRules {
        CombatRules {
            rolls: DamageRolls::pinned(1.0),
            monster_skill_chance: 0.0,
        }
    }

    fn deterministic_player() -> PlayerState {
        let mut p = PlayerState::default();
        p.base.agility = 0;
        p.base.luck = 0;
        p.refresh_derived();
        p.hp = p.derived().max_hp;
        p
    }

    #[test]
    fn test_faster_side_opens() {
        let player = PlayerState::default();
        let mut slow = monster("SLIME", 1);
        slow.stats.speed = 1;
        assert_eq!(Encounter::begin(1, &player, &slow).phase(), CombatPhase::PlayerTurn);
        slow.stats.speed = player.derived().speed;
        assert_eq!(Encounter::begin(1, &player, &slow).phase(), CombatPhase::PlayerTurn);
        slow.stats.speed = player.derived().speed + 1;
        assert_eq!(Encounter::begin(1, &player, &slow).phase(), CombatPhase::MonsterTurn);
    }

    #[test]
    fn test_attack_then_monster_turn() {
        let mut rng = rng_from_seed(1);
        let mut player = deterministic_player();
        let mut m = monster("SLIME", 1);
        m.stats.speed = 0;
        m.stats.evasion = 0.0;
        m.stats.physical_defense = 3;
        m.stats.hp = 500;
        m.stats.max_hp = 500;
        let mut enc = Encounter::begin(7, &player, &m);

        let report = enc.player_attack(&mut player, &mut m, &pinned(), &mut rng).unwrap();
        let base = player.derived().physical_attack - 3;
        let crit = (base as f64 * player.derived().crit_damage).floor() as i32;
        assert!(report.damage_dealt == base || report.damage_dealt == crit);
        assert_eq!(enc.phase(), CombatPhase::MonsterTurn);
        assert_eq!(
            enc.player_attack(&mut player, &mut m, &pinned(), &mut rng),
            Err(ActionRejected::NotYourTurn)
        );

        enc.monster_turn(&mut player, &mut m, &pinned(), &mut rng).unwrap();
        assert_eq!(enc.phase(), CombatPhase::PlayerTurn);
        assert_eq!(enc.turn, 2);
    }

    #[test]
    fn test_kill_ends_in_victory_and_is_terminal() {
        let mut rng = rng_from_seed(2);
        let mut player = deterministic_player();
        let mut m = monster("SLIME", 1);
        m.stats.speed = 0;
        m.stats.evasion = 0.0;
        m.stats.hp = 1;
        let mut enc = Encounter::begin(1, &player, &m);
        let report = enc.player_attack(&mut player, &mut m, &pinned(), &mut rng).unwrap();
        assert_eq!(report.outcome, Some(CombatOutcome::Victory));
        assert!(enc.is_over());
        assert_eq!(
            enc.monster_turn(&mut player, &mut m, &pinned(), &mut rng),
            Err(ActionRejected::NoCombat)
        );
        assert_eq!(
            enc.player_flee(&mut player, &mut m, &mut rng),
            Err(ActionRejected::NoCombat)
        );
    }

    #[test]
    fn test_stunned_player_loses_turn() {
        let mut player = deterministic_player();
        let mut m = monster("GOBLIN", 1);
        m.stats.speed = 0;
        player.status_effects.apply(StatusEffect::stun(1));
        let mut enc = Encounter::begin(1, &player, &m);
        let report = enc.start_player_turn(&mut player, &mut m).unwrap();
        assert!(report.skipped);
        assert_eq!(enc.phase(), CombatPhase::MonsterTurn);
    }

    #[test]
    fn test_stun_of_one_skips_exactly_one_monster_turn() {
        let mut rng = rng_from_seed(3);
        let mut player = deterministic_player();
        let mut m = monster("GOBLIN", 1);
        m.stats.speed = 0;
        m.stats.hp = 10_000;
        m.stats.max_hp = 10_000;
        m.status_effects.apply(StatusEffect::stun(1));
        let mut enc = Encounter::begin(1, &player, &m);
        enc.player_attack(&mut player, &mut m, &pinned(), &mut rng).unwrap();
        let first = enc.monster_turn(&mut player, &mut m, &pinned(), &mut rng).unwrap();
        assert!(first.skipped);
        enc.player_attack(&mut player, &mut m, &pinned(), &mut rng).unwrap();
        let second = enc.monster_turn(&mut player, &mut m, &pinned(), &mut rng).unwrap();
        assert!(!second.skipped);
    }

    #[test]
    fn test_poison_can_kill_before_acting() {
        let mut rng = rng_from_seed(4);
        let mut player = deterministic_player();
        let mut m = monster("SLIME", 1);
        m.stats.speed = 1_000;
        m.stats.hp = 1;
        m.status_effects.apply(StatusEffect::new(StatusKind::Poison, 400.0, 3));
        let mut enc = Encounter::begin(1, &player, &m);
        let hp_before = player.hp;
        let report = enc.monster_turn(&mut player, &mut m, &pinned(), &mut rng).unwrap();
        assert_eq!(report.outcome, Some(CombatOutcome::Victory));
        assert_eq!(player.hp, hp_before);
    }

    #[test]
    fn test_skill_validation_and_cooldown() {
        let mut rng = rng_from_seed(5);
        let mut player = deterministic_player();
        player.skill_points = 5;
        player.learn_skill(SkillId::Fireball).unwrap();
        player.learn_skill(SkillId::ShieldBash).unwrap();
        player.equip_skill_to_slot(SkillId::Fireball, 0).unwrap();
        player.equip_skill_to_slot(SkillId::ShieldBash, 1).unwrap();

        let mut m = monster("SLIME", 1);
        m.stats.speed = 0;
        m.stats.evasion = 0.0;
        m.stats.hp = 10_000;
        m.stats.max_hp = 10_000;
        let mut enc = Encounter::begin(1, &player, &m);

        assert_eq!(
            enc.player_use_skill(4, &mut player, &mut m, &pinned(), &mut rng),
            Err(ActionRejected::EmptySkillSlot(4))
        );
        assert_eq!(
            enc.player_use_skill(1, &mut player, &mut m, &pinned(), &mut rng),
            Err(ActionRejected::RequiresShield("Shield Bash".into()))
        );

        let mp = player.mp;
        let report = enc
            .player_use_skill(0, &mut player, &mut m, &pinned(), &mut rng)
            .unwrap();
        assert!(report.used_skill);
        assert_eq!(report.skill_element, Some(Element::Fire));
        assert_eq!(player.mp, mp - 10);
        assert_eq!(player.cooldown(SkillId::Fireball), 2);

        enc.monster_turn(&mut player, &mut m, &pinned(), &mut rng).unwrap();
        assert_eq!(
            enc.player_use_skill(0, &mut player, &mut m, &pinned(), &mut rng),
            Err(ActionRejected::OnCooldown("Fireball".into(), 1))
        );
        enc.player_attack(&mut player, &mut m, &pinned(), &mut rng).unwrap();
        enc.monster_turn(&mut player, &mut m, &pinned(), &mut rng).unwrap();
        assert!(enc
            .player_use_skill(0, &mut player, &mut m, &pinned(), &mut rng)
            .is_ok());
    }

    #[test]
    fn test_not_enough_mana() {
        let mut rng = rng_from_seed(6);
        let mut player = deterministic_player();
        player.learn_skill(SkillId::Fireball).unwrap();
        player.equip_skill_to_slot(SkillId::Fireball, 0).unwrap();
        player.mp = 3;
        let mut m = monster("SLIME", 1);
        m.stats.speed = 0;
        let mut enc = Encounter::begin(1, &player, &m);
        assert_eq!(
            enc.player_use_skill(0, &mut player, &mut m, &pinned(), &mut rng),
            Err(ActionRejected::NotEnoughMana {
                needed: 10,
                available: 3
            })
        );
        assert_eq!(player.mp, 3);
        assert_eq!(enc.phase(), CombatPhase::PlayerTurn);
    }

    #[test]
    fn test_monster_cooldowns_tick_once_per_round() {
        let mut rng = rng_from_seed(7);
        let mut player = deterministic_player();
        player.hp = 100_000;
        let mut m = monster("GOBLIN", 1);
        m.stats.speed = 0;
        m.stats.hp = 10_000;
        m.stats.max_hp = 10_000;
        let skill = m.skills[0];
        m.skill_cooldowns.insert(skill, 3);
        let mut enc = Encounter::begin(1, &player, &m);
        enc.start_player_turn(&mut player, &mut m).unwrap();
        enc.start_player_turn(&mut player, &mut m).unwrap();
        assert_eq!(m.skill_cooldowns[&skill], 2);
        enc.player_attack(&mut player, &mut m, &pinned(), &mut rng).unwrap();
        assert_eq!(m.skill_cooldowns[&skill], 2);
    }

    #[test]
    fn test_flee_chance_bounds() {
        assert_eq!(flee_chance(10, 10), 0.5);
        assert_eq!(flee_chance(100, 0), 0.9);
        assert_eq!(flee_chance(0, 100), 0.1);
        assert!((flee_chance(15, 10) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_rewards() {
        let mut rng = rng_from_seed(8);
        let mut m = monster("GOBLIN", 10);
        m.level = 10;
        m.tier = Tier::Elite;
        let r = victory_rewards(&m, &mut rng);
        assert_eq!(r.xp, 150);
        assert!((30..=40).contains(&r.gold));
        m.is_boss = true;
        let r = victory_rewards(&m, &mut rng);
        assert_eq!(r.xp, 750);
        assert!(r.drops_loot);
    }
}
