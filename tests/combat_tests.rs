//! Combat scenarios driven through the public engine API.

use delve::{
    mitigate_damage, tick_statuses, Bestiary, CombatAction, CombatEngine, CombatStats, CombatStatus,
    Combatant, DelveResult, Enemy, GameRng, Lazy, Player, PlayerClass, Room, RoomState, RoomType,
    StatusEffect, StatusKind, TurnSlot,
};
use proptest::prelude::*;

fn fighter(rng: &mut GameRng) -> Player {
    Player::new("Tester", PlayerClass::Fighter, rng)
}

fn active_room(room_type: RoomType, enemies: Vec<Enemy>, rng: &mut GameRng) -> Room {
    let mut room = Room::new(5, room_type, 4, rng);
    room.state = RoomState::Active;
    room.enemies = Lazy::Loaded(enemies);
    room
}

fn brute(rng: &mut GameRng, health: i32, speed: i32) -> Enemy {
    Enemy::new(rng.uuid(), "Brute", 4, CombatStats::new(health, 0, 6, 2, speed))
}

#[test]
fn test_boss_flee_is_rejected_without_spending_the_turn() -> DelveResult<()> {
    let mut rng = GameRng::from_u64(21);
    let mut player = fighter(&mut rng);
    let boss = brute(&mut rng, 400, 1).promoted("Boss", 3.0, 1.5, 1.25);
    let room = active_room(RoomType::Boss, vec![boss], &mut rng);
    let mut engine = CombatEngine::start(&room, &player)?.with_flee_chance(1.0);
    engine.run_until_player_turn(&mut player, &mut rng)?;

    let round = engine.round();
    let result = engine.player_action(CombatAction::Flee, &mut player, &mut rng)?;
    assert!(!result.success);
    assert!(!result.turn_consumed);
    assert_eq!(engine.status(), CombatStatus::InProgress);
    assert_eq!(engine.current_actor(), Some(TurnSlot::Player));
    assert_eq!(engine.round(), round);
    Ok(())
}

#[test]
fn test_lethal_poison_resolves_before_the_player_acts() -> DelveResult<()> {
    let mut rng = GameRng::from_u64(22);
    let mut player = fighter(&mut rng);
    player.stats.health = 3;
    player.apply_status(StatusEffect::new(StatusKind::Poison, 3, 5));
    let enemy = brute(&mut rng, 30, 1);
    let room = active_room(RoomType::Combat, vec![enemy], &mut rng);
    let mut engine = CombatEngine::start(&room, &player)?;

    engine.run_until_player_turn(&mut player, &mut rng)?;
    assert_eq!(engine.status(), CombatStatus::Defeat);
    assert_eq!(player.health(), 0);
    assert_eq!(engine.enemies()[0].health(), 30);
    assert!(engine.player_action(CombatAction::Attack { target: 0 }, &mut player, &mut rng).is_err());
    Ok(())
}

#[test]
fn test_faster_enemies_act_first() -> DelveResult<()> {
    let mut rng = GameRng::from_u64(23);
    let mut player = fighter(&mut rng);
    let quick = brute(&mut rng, 200, 50);
    let room = active_room(RoomType::Combat, vec![quick], &mut rng);
    let mut engine = CombatEngine::start(&room, &player)?;
    assert_eq!(engine.turn_order(), &[TurnSlot::Enemy(0), TurnSlot::Player]);

    let before = player.health();
    engine.run_until_player_turn(&mut player, &mut rng)?;
    assert!(player.health() < before);
    assert!(engine.awaiting_player());
    assert!(engine.log().len() >= 2);
    Ok(())
}

#[test]
fn test_failed_flee_spends_the_turn() -> DelveResult<()> {
    let mut rng = GameRng::from_u64(24);
    let mut player = fighter(&mut rng);
    let room = active_room(RoomType::Combat, vec![brute(&mut rng, 200, 1)], &mut rng);
    let mut engine = CombatEngine::start(&room, &player)?.with_flee_chance(0.0);
    engine.run_until_player_turn(&mut player, &mut rng)?;

    let result = engine.player_action(CombatAction::Flee, &mut player, &mut rng)?;
    assert!(!result.success);
    assert!(result.turn_consumed);
    assert_eq!(engine.current_actor(), Some(TurnSlot::Enemy(0)));
    Ok(())
}

#[test]
fn test_potion_in_combat() -> DelveResult<()> {
    let mut rng = GameRng::from_u64(25);
    let mut player = fighter(&mut rng);
    player.stats.health = 10;
    let potion = player.inventory[0].id;
    let room = active_room(RoomType::Combat, vec![brute(&mut rng, 200, 1)], &mut rng);
    let mut engine = CombatEngine::start(&room, &player)?;
    engine.run_until_player_turn(&mut player, &mut rng)?;

    let result = engine.player_action(CombatAction::UseItem { item_id: potion }, &mut player, &mut rng)?;
    assert!(result.success);
    assert!(player.health() > 10);
    assert!(player.find_item(potion).is_none());
    Ok(())
}

#[tokio::test]
async fn test_loaded_elite_fights_through_the_engine() -> DelveResult<()> {
    let mut rng = GameRng::from_u64(26);
    let mut player = fighter(&mut rng);
    let mut room = Room::new(3, RoomType::Elite, 2, &mut rng);
    room.state = RoomState::Available;
    room.enter(&mut rng)?;
    let loaded = room.ensure_enemies_loaded(&Bestiary::new(), &mut rng).await?.to_vec();
    assert_eq!(loaded.len(), 1);
    assert!(loaded[0].name.starts_with("Elite "));

    let mut engine = CombatEngine::start(&room, &player)?;
    for _ in 0..200 {
        engine.run_until_player_turn(&mut player, &mut rng)?;
        if engine.is_over() {
            break;
        }
        engine.player_action(CombatAction::Attack { target: 0 }, &mut player, &mut rng)?;
    }
    assert!(matches!(engine.status(), CombatStatus::Victory | CombatStatus::Defeat));
    Ok(())
}

proptest! {
    #[test]
    fn prop_damage_never_drops_below_one(raw in -50i32..500, defense in 0i32..500) {
        let dealt = mitigate_damage(raw, defense);
        prop_assert!(dealt >= 1);
        prop_assert_eq!(dealt, (raw - defense / 2).max(1));
    }

    #[test]
    fn prop_hits_never_heal(health in 1i32..300, raw in -20i32..300, defense in 0i32..100) {
        let mut rng = GameRng::from_u64(1);
        let mut enemy = Enemy::new(rng.uuid(), "Target", 1, CombatStats::new(health, 0, 1, defense, 1));
        let dealt = enemy.receive_damage(raw);
        prop_assert!(dealt >= 1);
        prop_assert_eq!(enemy.health(), (health - dealt).max(0));
    }

    #[test]
    fn prop_status_effects_expire_on_schedule(turns in 1u32..8, magnitude in 0i32..20) {
        let mut effects = vec![StatusEffect::new(StatusKind::Burn, turns, magnitude)];
        let mut total = 0;
        for _ in 0..turns {
            prop_assert_eq!(effects.len(), 1);
            total += tick_statuses(&mut effects).damage;
        }
        prop_assert!(effects.is_empty());
        prop_assert_eq!(total, magnitude * turns as i32);
    }
}
