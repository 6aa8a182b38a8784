//! Headless session runner.
//!
//! Usage: `dungeon-sim [config.ron]`
//!
//! Plays a scripted run across every biome: walk to the nearest monster,
//! fight it with the first skill slot, spend points on level up. Prints the
//! final ecosystem state as JSON.

use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::{Context, Result};
use tracing::{info, warn};

use dungeon_core::abilities::SkillId;
use dungeon_core::combat::CombatPhase;
use dungeon_core::engine::{GameConfig, GameEngine, MoveOutcome};
use dungeon_core::equipment::PrimaryStat;
use dungeon_core::generation::{Biome, Direction};
use dungeon_core::logging::init_tracing;

const MAPS_PER_RUN: usize = 8;
const STEPS_PER_MAP: usize = 400;
const TURNS_PER_FIGHT: usize = 300;

fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::load_ron(&path).with_context(|| format!("loading config from {path}"))?,
        None => GameConfig::default(),
    };
    init_tracing(&config.logging);
    info!(seed = config.seed, filter = %config.logging.directives(), "starting headless session");

    let mut engine = GameEngine::new(config);
    engine.learn_skill(SkillId::PowerStrike)?;
    engine.equip_skill_to_slot(SkillId::PowerStrike, 0)?;

    for map in 0..MAPS_PER_RUN {
        let biome = Biome::ALL[map % Biome::ALL.len()];
        let summary = engine
            .enter_map(biome)
            .with_context(|| format!("entering map {} ({})", map + 1, biome.key()))?;
        info!(
            map = summary.map_index,
            biome = biome.key(),
            monsters = summary.monsters,
            bosses = summary.bosses,
            "map ready"
        );
        explore(&mut engine);
    }

    let player = engine.player();
    info!(
        level = player.level,
        gold = player.gold,
        items = player.inventory.used_slots(),
        "session finished"
    );
    println!("{}", engine.ecosystem().state.to_json_pretty()?);
    Ok(())
}

/// Hunt monsters until the map is cleared or the step budget runs out
fn explore(engine: &mut GameEngine) {
    for _ in 0..STEPS_PER_MAP {
        if engine.monsters().is_empty() {
            break;
        }
        let Some(direction) = next_step(engine) else {
            info!("no reachable monster left on this map");
            break;
        };
        match engine.move_player(direction) {
            Ok(MoveOutcome::Engaged { .. }) => fight(engine),
            Ok(_) => {}
            Err(rejected) => {
                warn!(%rejected, "scripted move refused");
                break;
            }
        }
        spend_points(engine);
    }
}

fn fight(engine: &mut GameEngine) {
    let delay = engine.config.turn_delay_ms;
    for _ in 0..TURNS_PER_FIGHT {
        if !engine.in_combat() {
            return;
        }
        let my_turn = engine
            .encounter()
            .is_some_and(|e| e.phase() == CombatPhase::PlayerTurn);
        if my_turn && engine.player_use_skill(0).is_err() {
            let _ = engine.player_attack();
        }
        engine.advance_time(delay);
    }
    if engine.in_combat() {
        let _ = engine.player_flee();
        engine.advance_time(delay);
    }
}

fn spend_points(engine: &mut GameEngine) {
    while engine.player().stat_points > 0 {
        let stat = if engine.player().stat_points % 2 == 0 {
            PrimaryStat::Strength
        } else {
            PrimaryStat::Vitality
        };
        if engine.allocate_stat_point(stat).is_err() {
            break;
        }
    }
    while engine.player().skill_points > 0 && engine.learn_skill(SkillId::PowerStrike).is_ok() {}
}

/// First step of a shortest walkable path toward the nearest monster
fn next_step(engine: &GameEngine) -> Option<Direction> {
    let map = engine.map()?;
    let rules = engine.rules();
    let start = (engine.player().x, engine.player().y);
    let targets: HashSet<(usize, usize)> = engine.monsters().iter().map(|m| (m.x, m.y)).collect();

    let mut first: HashMap<(usize, usize), Direction> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    while let Some((x, y)) = queue.pop_front() {
        for dir in Direction::ALL {
            let Some(next) = dir.step(x, y, map.width, map.height) else {
                continue;
            };
            if next == start || first.contains_key(&next) || !map.is_walkable(next.0, next.1, rules) {
                continue;
            }
            let initial = if (x, y) == start { dir } else { *first.get(&(x, y))? };
            if targets.contains(&next) {
                return Some(initial);
            }
            first.insert(next, initial);
            queue.push_back(next);
        }
    }
    None
}
