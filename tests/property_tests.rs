//! Property-based tests using proptest
//!
//! Invariants that must hold for ALL inputs:
//! - WFC: every generated map is fully collapsed and adjacency-consistent
//! - WFC: same seed and inputs → identical map
//! - Ecosystem: populations stay in [0, 200], environments stay clamped
//! - Event flags: set and clear thresholds never coincide (hysteresis)
//! - Progression: derived stats are a pure function of their inputs
//! - Combat: full evasion always evades, damage is never negative
//! - Items: a requested rarity is always honored

use proptest::prelude::*;

use dungeon_core::combat::damage::{calculate_damage, AttackType, CombatProfile, DamageRolls, Side};
use dungeon_core::combat::Element;
use dungeon_core::constants::POPULATION_CAP;
use dungeon_core::economy::sell_price;
use dungeon_core::ecosystem::{Ecosystem, EcosystemAction};
use dungeon_core::equipment::{Equipment, Rarity, RarityTable};
use dungeon_core::generation::{generate, rng_from_seed, Biome, BiomeTileSet};
use dungeon_core::loot::ItemGenerator;
use dungeon_core::monster::SpeciesCatalog;
use dungeon_core::player::{recalculate, PlayerState, PrimaryStats};

fn biome_strategy() -> impl Strategy<Value = Biome> {
    prop::sample::select(Biome::ALL.to_vec())
}

fn element_strategy() -> impl Strategy<Value = Option<Element>> {
    prop::option::of(prop::sample::select(vec![
        Element::Fire,
        Element::Ice,
        Element::Lightning,
        Element::Poison,
        Element::Dark,
        Element::Holy,
        Element::Earth,
    ]))
}

fn action_strategy() -> impl Strategy<Value = EcosystemAction> {
    let ids: Vec<String> = SpeciesCatalog::default()
        .all()
        .iter()
        .map(|s| s.id.to_string())
        .collect();
    prop_oneof![
        prop::sample::select(ids.clone()).prop_map(|species| EcosystemAction::KillMonster { species }),
        prop::sample::select(ids).prop_map(|species| EcosystemAction::BossKilled { species }),
        element_strategy().prop_map(|element| EcosystemAction::UseSkill { element }),
        (1u32..100).prop_map(|level| EcosystemAction::PlayerLevelUp { level }),
    ]
}

// ============================================================
// WFC Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_generated_maps_are_consistent(
        seed in any::<u64>(),
        biome in biome_strategy(),
        width in 1usize..20,
        height in 1usize..20,
    ) {
        let rules = BiomeTileSet::for_biome(biome);
        let map = generate(width, height, &rules, 10, &mut rng_from_seed(seed)).unwrap();
        prop_assert_eq!(map.width, width);
        prop_assert_eq!(map.height, height);
        prop_assert_eq!(map.tiles.len(), height);
        prop_assert!(map.tiles.iter().all(|row| row.len() == width));
        let violations = map.adjacency_violations(&rules);
        prop_assert!(violations.is_empty(), "violations: {:?}", violations);
    }

    #[test]
    fn prop_generation_is_deterministic(seed in any::<u64>(), biome in biome_strategy()) {
        let rules = BiomeTileSet::for_biome(biome);
        let a = generate(16, 12, &rules, 10, &mut rng_from_seed(seed)).unwrap();
        let b = generate(16, 12, &rules, 10, &mut rng_from_seed(seed)).unwrap();
        prop_assert_eq!(a, b);
    }
}

// ============================================================
// Ecosystem Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_population_and_environment_stay_clamped(
        seed in any::<u64>(),
        actions in prop::collection::vec(action_strategy(), 1..200),
        biome in biome_strategy(),
    ) {
        let catalog = SpeciesCatalog::default();
        let mut eco = Ecosystem::initial(&catalog);
        eco.current_biome = biome;
        let mut rng = rng_from_seed(seed);
        for (i, action) in actions.iter().enumerate() {
            eco.apply_action_effect(action, &catalog);
            if i % 7 == 0 {
                eco.recover_dungeon_state(&mut rng);
            }
            prop_assert!(eco.state.monster_population.values().all(|c| *c <= POPULATION_CAP));
            prop_assert!(eco.state.environment_state.values().all(|e| e.in_range()));
        }
    }

    #[test]
    fn prop_goblin_flag_has_hysteresis(populations in prop::collection::vec(0u32..=200, 1..100)) {
        let catalog = SpeciesCatalog::default();
        let mut eco = Ecosystem::initial(&catalog);
        let mut expected = false;
        for population in populations {
            eco.state.monster_population.insert("goblin".into(), population);
            eco.check_dungeon_events();
            if !expected && population < 20 {
                expected = true;
            } else if expected && population >= 50 {
                expected = false;
            }
            prop_assert_eq!(eco.state.flag("goblinKingEnraged"), expected, "population {}", population);
        }
    }

    #[test]
    fn prop_flag_never_flips_back_in_one_step(population in 0u32..20) {
        let catalog = SpeciesCatalog::default();
        let mut eco = Ecosystem::initial(&catalog);
        eco.state.monster_population.insert("goblin".into(), population);
        eco.check_dungeon_events();
        prop_assert!(eco.state.flag("goblinKingEnraged"));
        // Anything below the clearing threshold keeps the latch set
        for recovered in population..50 {
            eco.state.monster_population.insert("goblin".into(), recovered);
            eco.check_dungeon_events();
            prop_assert!(eco.state.flag("goblinKingEnraged"));
        }
    }
}

// ============================================================
// Progression and Combat Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_recalculate_is_pure(
        stats in prop::array::uniform6(0i32..500),
    ) {
        let base = PrimaryStats {
            strength: stats[0],
            agility: stats[1],
            intelligence: stats[2],
            vitality: stats[3],
            spirit: stats[4],
            luck: stats[5],
        };
        let equipment = Equipment::default();
        let skills = Default::default();
        let a = recalculate(&base, &equipment, &skills);
        let b = recalculate(&base, &equipment, &skills);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_full_evasion_always_evades(seed in any::<u64>(), atk in 0i32..10_000, def in 0i32..10_000) {
        let attacker = CombatProfile::basic(Side::Player, 100, atk, 0);
        let mut defender = CombatProfile::basic(Side::Monster, 100, 0, def);
        defender.evasion = 1.0;
        let result = calculate_damage(&attacker, &defender, AttackType::Physical, &DamageRolls::default(), &mut rng_from_seed(seed));
        prop_assert!(result.is_evaded);
        prop_assert_eq!(result.damage, 0);
    }

    #[test]
    fn prop_damage_is_never_negative(seed in any::<u64>(), atk in 0i32..500, def in 0i32..500) {
        let attacker = CombatProfile::basic(Side::Player, 100, atk, 0);
        let defender = CombatProfile::basic(Side::Monster, 100, 0, def);
        let result = calculate_damage(&attacker, &defender, AttackType::Physical, &DamageRolls::default(), &mut rng_from_seed(seed));
        prop_assert!(result.damage >= 0);
    }

    #[test]
    fn prop_hp_never_exceeds_max(damage in 0i32..1000, heal in 0i32..1000) {
        let mut player = PlayerState::default();
        player.take_damage(damage);
        prop_assert!(player.hp >= 0);
        player.heal(heal);
        prop_assert!(player.hp <= player.derived().max_hp);
    }
}

// ============================================================
// Item Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_requested_rarity_is_honored(
        seed in any::<u64>(),
        level in 1u32..80,
        rarity in prop::sample::select(Rarity::ALL.to_vec()),
    ) {
        let table = RarityTable::default();
        let item = ItemGenerator::new(&table).generate(1, level, 0.0, Some(rarity), &mut rng_from_seed(seed));
        prop_assert_eq!(item.rarity, rarity);
        prop_assert!(item.level >= 1);
        prop_assert!(item.level + 5 >= level && item.level <= level + 5);
    }

    #[test]
    fn prop_sell_price_is_rarity_budget(seed in any::<u64>(), level in 1u32..60) {
        let table = RarityTable::default();
        let item = ItemGenerator::new(&table).generate(1, level, 0.0, None, &mut rng_from_seed(seed));
        let budget = table.get(item.rarity).map(|c| u64::from(c.budget)).unwrap_or_default();
        prop_assert_eq!(sell_price(&item, &table), budget);
    }
}
