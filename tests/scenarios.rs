//! End-to-end sessions driven only through the public engine surface.

use dungeon_core::abilities::SkillId;
use dungeon_core::ecosystem::persist::ECOSYSTEM_KEY;
use dungeon_core::engine::{AssetManifest, GameConfig, GameEngine};
use dungeon_core::equipment::{PrimaryStat, Rarity};
use dungeon_core::generation::{rng_from_seed, Biome};
use dungeon_core::player::PrimaryStats;
use dungeon_core::storage::{JsonFileStore, MemoryStore, StateStore};

fn config(seed: u64) -> GameConfig {
    GameConfig {
        seed,
        map_width: 14,
        map_height: 10,
        monsters_per_map: 5,
        items_per_map: 2,
        ..GameConfig::default()
    }
}

fn make_strong(engine: &mut GameEngine) {
    let player = engine.player_mut();
    player.base = PrimaryStats::uniform(300);
    player.refresh_derived();
    player.hp = player.derived().max_hp;
}

/// Fight the first monster on the map to completion
fn fight_first_monster(engine: &mut GameEngine) -> u64 {
    let id = engine.monsters()[0].id;
    engine.start_encounter(id).unwrap();
    let delay = engine.config.turn_delay_ms;
    for _ in 0..200 {
        if !engine.in_combat() {
            break;
        }
        let _ = engine.player_attack();
        engine.advance_time(delay * 2);
    }
    assert!(!engine.in_combat(), "fight did not finish");
    id
}

#[test]
fn fresh_player_derived_stats() {
    let engine = GameEngine::new(GameConfig::default());
    let player = engine.player();
    assert_eq!(player.level, 1);
    assert_eq!(player.base, PrimaryStats::uniform(5));
    assert_eq!(player.derived().max_hp, 110);
    assert_eq!(player.hp, 110);
}

#[test]
fn walk_through_every_biome() {
    let mut engine = GameEngine::new(config(2024));
    for (n, biome) in Biome::ALL.iter().enumerate() {
        let summary = engine.enter_map(*biome).unwrap();
        assert_eq!(summary.map_index, n as u32 + 1);
        assert_eq!(engine.biome(), *biome);

        let map = engine.map().unwrap();
        assert!(map.adjacency_violations(engine.rules()).is_empty());
        assert!(engine.monsters().len() <= 5);
        for monster in engine.monsters() {
            assert!(map.is_spawnable(monster.x, monster.y, engine.rules()));
        }
        let snapshot = engine.render_snapshot(&AssetManifest::new());
        assert_eq!(snapshot.tiles.len(), 10);
    }
    assert_eq!(engine.map_index(), 4);
}

#[test]
fn same_seed_same_dungeon() {
    let mut a = GameEngine::new(config(99));
    let mut b = GameEngine::new(config(99));
    for biome in [Biome::Ice, Biome::Volcano] {
        a.enter_map(biome).unwrap();
        b.enter_map(biome).unwrap();
        assert_eq!(a.map(), b.map());
        assert_eq!(a.monsters(), b.monsters());
    }
}

#[test]
fn victory_feeds_back_into_the_ecosystem() {
    let mut engine = GameEngine::new(config(7));
    engine.enter_map(Biome::Forest).unwrap();
    assert!(!engine.monsters().is_empty());
    make_strong(&mut engine);

    let before = engine.ecosystem().state.clone();
    let gold = engine.player().gold;
    let monsters = engine.monsters().len();

    let id = fight_first_monster(&mut engine);
    assert!(engine.monsters().iter().all(|m| m.id != id));
    assert_eq!(engine.monsters().len(), monsters - 1);
    assert!(engine.player().gold > gold);
    assert_ne!(engine.ecosystem().state, before);
    assert_eq!(engine.pending_turns(), 0);
    assert!(engine.messages().any(|m| m.contains("slain")));
}

#[test]
fn progression_through_the_ui() {
    let mut engine = GameEngine::new(config(11));
    assert_eq!(engine.learn_skill(SkillId::PowerStrike), Ok(1));
    assert_eq!(engine.equip_skill_to_slot(SkillId::PowerStrike, 0), Ok(()));

    engine.player_mut().stat_points = 2;
    let hp = engine.player().derived().max_hp;
    engine.allocate_stat_point(PrimaryStat::Vitality).unwrap();
    assert_eq!(engine.player().derived().max_hp, hp + 10);
    engine.allocate_stat_point(PrimaryStat::Strength).unwrap();
    assert_eq!(engine.player().derived().max_hp, hp + 12);
    assert_eq!(engine.player().stat_points, 0);

    let item = engine.roll_item(Some(Rarity::Rare), &mut rng_from_seed(3));
    let index = engine.player_mut().inventory.add(item).unwrap();
    let slot = engine.equip_item(index).unwrap();
    assert!(engine.player().equipment.get(slot).is_some());
    let back = engine.unequip_item(slot).unwrap();
    assert!(engine.player().inventory.get(back).is_some());
    assert!(engine.player().equipment.get(slot).is_none());
}

#[test]
fn ecosystem_survives_a_memory_store() {
    let mut engine = GameEngine::new(config(5));
    engine.enter_map(Biome::Cave).unwrap();
    make_strong(&mut engine);
    fight_first_monster(&mut engine);

    let mut store = MemoryStore::new();
    engine.save_ecosystem(&mut store).unwrap();

    let mut resumed = GameEngine::new(config(5));
    resumed.load_ecosystem(&store);
    assert_eq!(resumed.ecosystem().state, engine.ecosystem().state);
}

#[test]
fn ecosystem_survives_a_json_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = GameEngine::new(config(6));
    engine.enter_map(Biome::Volcano).unwrap();
    make_strong(&mut engine);
    fight_first_monster(&mut engine);

    let mut store = JsonFileStore::new(dir.path());
    engine.save_ecosystem(&mut store).unwrap();

    let reopened = JsonFileStore::new(dir.path());
    let mut resumed = GameEngine::new(config(6));
    resumed.load_ecosystem(&reopened);
    assert_eq!(resumed.ecosystem().state, engine.ecosystem().state);
}

#[test]
fn corrupt_save_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonFileStore::new(dir.path());
    store.save(ECOSYSTEM_KEY, "{ definitely not json").unwrap();

    let fresh = GameEngine::new(config(8));
    let mut engine = GameEngine::new(config(8));
    engine.load_ecosystem(&store);
    assert_eq!(engine.ecosystem().state, fresh.ecosystem().state);
}

#[test]
fn leaving_mid_fight_abandons_the_encounter() {
    let mut engine = GameEngine::new(config(13));
    engine.enter_map(Biome::Forest).unwrap();
    let id = engine.monsters()[0].id;
    engine.start_encounter(id).unwrap();
    assert!(engine.in_combat());

    engine.enter_map(Biome::Ice).unwrap();
    assert!(!engine.in_combat());
    assert_eq!(engine.pending_turns(), 0);
    assert!(engine.advance_time(60_000).is_empty());
}
