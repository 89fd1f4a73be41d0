//! Dungeon generation: reproducibility and structural guarantees.

use delve::{
    validate_connectivity, DelveResult, DungeonGenerator, GameRng, GenerationConfig, Generator, RoomGraph,
    RoomType, Seed,
};
use proptest::prelude::*;

fn generate(config: &GenerationConfig) -> DelveResult<RoomGraph> {
    let mut rng = config.create_rng();
    DungeonGenerator::new().generate(config, &mut rng)
}

#[test]
fn test_same_seed_same_dungeon() -> DelveResult<()> {
    let config = GenerationConfig::with_shape("abc", 20, 3, 0.3);
    let first = generate(&config)?;
    let second = generate(&config)?;

    assert_eq!(first, second);
    assert_eq!(serde_json::to_string(&first)?, serde_json::to_string(&second)?);
    assert_eq!(first.level_count(), 20);
    Ok(())
}

#[test]
fn test_text_and_numeric_seeds_are_stable() {
    assert_eq!(Seed::from("abc").to_u64(), Seed::from("abc").to_u64());
    assert_ne!(Seed::from("abc").to_u64(), Seed::from("abd").to_u64());
    assert_eq!(Seed::from(7u64).to_u64(), 7);
}

#[test]
fn test_different_seeds_give_different_dungeons() -> DelveResult<()> {
    let a = generate(&GenerationConfig::with_shape("abc", 20, 3, 0.3))?;
    let b = generate(&GenerationConfig::with_shape("xyz", 20, 3, 0.3))?;
    assert_ne!(a, b);
    Ok(())
}

#[test]
fn test_generation_advances_the_session_stream() -> DelveResult<()> {
    let config = GenerationConfig::with_shape("abc", 12, 3, 0.3);
    let mut rng = config.create_rng();
    let mut witness = GameRng::from_seed(&config.seed);
    let _ = DungeonGenerator::new().generate(&config, &mut rng)?;
    assert_ne!(rng.next_u32(), witness.next_u32());
    Ok(())
}

#[test]
fn test_invalid_shapes_are_rejected() {
    for config in [
        GenerationConfig::with_shape("bad", 2, 3, 0.3),
        GenerationConfig::with_shape("bad", 10, 0, 0.3),
        GenerationConfig::with_shape("bad", 10, 3, 1.5),
    ] {
        assert!(generate(&config).is_err(), "{:?} should be rejected", config);
    }
}

#[test]
fn test_single_room_levels_stay_connected() -> DelveResult<()> {
    let graph = generate(&GenerationConfig::with_shape("narrow", 8, 1, 0.0))?;
    assert_eq!(graph.len(), 8);
    assert_eq!(graph.route_to_boss(graph.entrance_id()).map(|r| r.len()), Some(8));
    assert!(validate_connectivity(&graph).is_empty());
    Ok(())
}

fn check_structure(graph: &RoomGraph, config: &GenerationConfig) {
    assert!(validate_connectivity(graph).is_empty(), "{:?}", validate_connectivity(graph));
    assert_eq!(graph.level_count() as u32, config.levels);

    let ids: Vec<u32> = graph.rooms().map(|room| room.id).collect();
    assert_eq!(ids, (0..graph.len() as u32).collect::<Vec<_>>());

    let entrance = graph.room(graph.entrance_id()).unwrap();
    assert_eq!(entrance.room_type, RoomType::Entrance);
    let boss = graph.room(graph.boss_id()).unwrap();
    assert_eq!(boss.room_type, RoomType::Boss);
    assert_eq!(boss.level, config.levels);

    for layer in graph.layers() {
        assert!(!layer.room_ids.is_empty());
        assert!(layer.room_ids.len() as u32 <= config.max_rooms_per_level);
    }

    let reachable = graph.reachable_from(graph.entrance_id());
    assert_eq!(reachable.len(), graph.len());
    for room in graph.rooms() {
        assert!(graph.route_to_boss(room.id).is_some(), "room {} cannot reach the boss", room.id);
        for next in graph.successors(room.id) {
            assert_eq!(graph.room(next).unwrap().level, room.level + 1);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_every_room_is_on_a_path_to_the_boss(
        seed in any::<u64>(),
        levels in 3u32..30,
        max_rooms in 1u32..5,
        convergence in 0.0f64..=1.0,
    ) {
        let config = GenerationConfig::with_shape(seed, levels, max_rooms, convergence);
        let graph = generate(&config).unwrap();
        check_structure(&graph, &config);
    }

    #[test]
    fn prop_generation_is_reproducible(seed in "[a-z]{1,12}") {
        let config = GenerationConfig::for_testing(seed.as_str());
        prop_assert_eq!(generate(&config).unwrap(), generate(&config).unwrap());
    }
}
