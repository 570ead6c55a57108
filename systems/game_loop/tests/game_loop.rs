use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use rampart_core::{
    AttackProfile, AttackType, EnemyBehavior, EnemySpawn, EntityKind, Event, Faction,
    GameStateSnapshot, InputState, Player, PlayerSpawn, ProjectileSpawn, RegenProfile,
    SpawnZoneController, TargetingStrategy, Terrain, Tower, TowerKind, TowerSpawn, TowerUpgrades,
    Vec2, Weapon,
};
use rampart_system_actions::ProcessorConfig;
use rampart_system_game_loop::{GameConfig, GameLoop};
use rampart_system_spawning::{Config, SpawnPoint, Spawning};
use rampart_world::SessionConfig;

const DT: f32 = 0.1;

fn config(lives: u32, drop_chance: f32) -> GameConfig {
    GameConfig {
        session: SessionConfig {
            starting_lives: lives,
            starting_currency: 0,
        },
        processor: ProcessorConfig {
            drop_chance,
            ..ProcessorConfig::default()
        },
        roll_seed: 0x4d59_5df4_d0f3_3173,
        ..GameConfig::default()
    }
}

fn idle_waves() -> Spawning {
    Spawning::new(Config::new(Duration::from_secs(1), 1), Vec::new())
}

fn game(lives: u32) -> GameLoop<Spawning> {
    let mut game = GameLoop::new(config(lives, 0.0), idle_waves(), ());
    game.world_mut()
        .set_terrain(Some(Terrain::open(40, 40, 10.0)));
    game
}

fn enemy(position: Vec2, health: u32, behavior: EnemyBehavior) -> EnemySpawn {
    EnemySpawn {
        position,
        health,
        behavior,
        reward: 5,
        armor: 0,
        speed: 0.0,
        radius: 5.0,
        attack: AttackProfile {
            damage: 10,
            range: 5.0,
            interval: 1.0,
        },
        path: Vec::new(),
        target: None,
    }
}

fn player(position: Vec2, health: u32) -> PlayerSpawn {
    PlayerSpawn {
        position,
        health,
        speed: 80.0,
        armor: 0,
        weapon: Weapon {
            damage: 6,
            fire_rate: 4.0,
            projectile_speed: 300.0,
            auto_range: 150.0,
        },
        regen: RegenProfile {
            amount: 1,
            interval: 2.0,
        },
        pickup_radius: 12.0,
        progression: None,
    }
}

fn tower(kind: TowerKind, position: Vec2) -> TowerSpawn {
    TowerSpawn {
        kind,
        strategy: TargetingStrategy::Closest,
        position,
        armor: 10,
        upgrades: TowerUpgrades::default(),
    }
}

fn count(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

#[test]
fn projectile_kills_enemy_with_single_hit() {
    let mut game = game(3);
    let target = game
        .world_mut()
        .add_enemy(enemy(Vec2::new(100.0, 100.0), 10, EnemyBehavior::Chaser))
        .expect("enemy");
    let shot = game
        .world_mut()
        .add_projectile(ProjectileSpawn {
            owner: None,
            faction: Faction::Friendly,
            position: Vec2::new(90.0, 100.0),
            velocity: Vec2::new(100.0, 0.0),
            damage: 10,
            attack: AttackType::Normal,
            speed: 100.0,
            radius: 2.0,
            homing_target: None,
            ttl: 2.0,
            on_hit: None,
        })
        .expect("projectile");

    let report = game.update(DT, &InputState::default());

    assert_eq!(
        count(&report.events, |event| matches!(
            event,
            Event::EntityDamaged { target: hit, .. } if *hit == target
        )),
        1
    );
    assert_eq!(
        count(&report.events, |event| matches!(event, Event::EnemyKilled { .. })),
        1
    );
    let removed: Vec<_> = report.removed.iter().map(|entry| entry.id).collect();
    assert_eq!(removed, vec![target, shot]);
    assert!(game.world().enemies().is_empty());
    assert_eq!(game.counters().score, 25);
    assert_eq!(game.counters().enemies_killed, 1);
    assert_eq!(game.waves().killed(), 1);
}

#[test]
fn lethal_hit_on_last_life_ends_the_session() {
    let mut game = game(1);
    let hero = game
        .world_mut()
        .spawn_player(player(Vec2::new(200.0, 200.0), 5))
        .expect("player");
    for x in [214.0, 186.0] {
        let _ = game
            .world_mut()
            .add_enemy(enemy(Vec2::new(x, 200.0), 30, EnemyBehavior::Chaser))
            .expect("enemy");
    }

    let report = game.update(DT, &InputState::default());

    assert_eq!(
        count(&report.events, |event| matches!(
            event,
            Event::EntityDamaged { target, .. } if *target == hero
        )),
        1,
        "damage after the lethal hit must be ignored"
    );
    assert_eq!(count(&report.events, |event| *event == Event::GameOver), 1);
    assert!(report
        .removed
        .iter()
        .any(|entry| entry.id == hero && entry.kind == EntityKind::Player));
    assert!(report.counters.game_over);
    assert!(!report.counters.player_alive);
    assert_eq!(report.counters.lives, 0);
}

#[test]
fn tower_fires_once_per_interval() {
    let mut game = game(3);
    let _ = game
        .world_mut()
        .add_tower(tower(TowerKind::Basic, Vec2::new(100.0, 100.0)))
        .expect("tower");
    let _ = game
        .world_mut()
        .add_enemy(enemy(Vec2::new(150.0, 100.0), 500, EnemyBehavior::Chaser))
        .expect("enemy");

    let mut shots = 0;
    for _ in 0..4 {
        let report = game.update(DT, &InputState::default());
        shots += count(&report.events, |event| {
            matches!(
                event,
                Event::EntitySpawned {
                    kind: EntityKind::Projectile,
                    ..
                }
            )
        });
    }

    assert_eq!(shots, 1);
}

#[test]
fn escaping_path_follower_costs_a_life() {
    let mut game = game(3);
    let mut spawn = enemy(Vec2::new(100.0, 100.0), 20, EnemyBehavior::PathFollower);
    spawn.speed = 100.0;
    spawn.path = vec![Vec2::new(105.0, 100.0)];
    let runner = game.world_mut().add_enemy(spawn).expect("enemy");

    let report = game.update(DT, &InputState::default());

    assert!(report.events.contains(&Event::LivesLost {
        amount: 1,
        remaining: 2,
    }));
    assert!(report.removed.iter().any(|entry| entry.id == runner));
    assert_eq!(report.counters.lives, 2);
    assert_eq!(report.counters.enemies_killed, 0);
}

#[derive(Debug, Default)]
struct Ambush {
    fired: bool,
}

impl SpawnZoneController for Ambush {
    fn update(
        &mut self,
        _dt: f32,
        snapshot: &GameStateSnapshot,
        _towers: &[Tower],
        _player: Option<&Player>,
    ) -> Vec<EnemySpawn> {
        if self.fired || snapshot.player_position.is_none() {
            return Vec::new();
        }
        self.fired = true;
        vec![enemy(Vec2::new(50.0, 50.0), 10, EnemyBehavior::Chaser)]
    }

    fn reset(&mut self) {
        self.fired = false;
    }
}

#[test]
fn spawned_enemies_target_the_player_by_default() {
    let mut game = GameLoop::new(config(3, 0.0), idle_waves(), Ambush::default());
    game.world_mut()
        .set_terrain(Some(Terrain::open(40, 40, 10.0)));
    let hero = game
        .world_mut()
        .spawn_player(player(Vec2::new(300.0, 300.0), 20))
        .expect("player");

    let report = game.update(DT, &InputState::default());

    assert_eq!(
        count(&report.events, |event| matches!(
            event,
            Event::EntitySpawned {
                kind: EntityKind::Enemy,
                ..
            }
        )),
        1
    );
    assert_eq!(game.world().enemies()[0].target, Some(hero));
}

#[test]
fn paused_ticks_change_nothing() {
    let mut game = game(3);
    let _ = game
        .world_mut()
        .spawn_player(player(Vec2::new(200.0, 200.0), 20))
        .expect("player");
    let moving = InputState {
        movement: Vec2::X,
        ..InputState::default()
    };

    game.pause();
    assert!(game.is_paused());
    let report = game.update(DT, &moving);

    assert!(report.paused);
    assert!(report.events.is_empty());
    assert_eq!(report.counters.tick, 0);
    assert_eq!(
        game.world().player().map(|p| p.body.position),
        Some(Vec2::new(200.0, 200.0))
    );

    game.resume();
    let report = game.update(DT, &moving);
    assert!(!report.paused);
    assert_eq!(report.counters.tick, 1);
}

#[test]
fn reset_returns_to_an_empty_session() {
    let mut game = scenario();
    for _ in 0..120 {
        let _ = game.update(DT, &InputState::default());
    }
    assert!(game.counters().tick > 0);

    game.reset();

    assert!(game.world().enemies().is_empty());
    assert!(game.world().player().is_none());
    assert!(game.world().terrain().is_some());
    assert!(game.events().is_empty());
    assert_eq!(game.counters().tick, 0);
    assert_eq!(game.counters().wave, 0);
    assert_eq!(game.counters().score, 0);
}

#[test]
fn live_count_is_conserved_across_cleanup() {
    let mut game = scenario();
    let mut stored = stored_entities(&game);

    for tick in 0..400 {
        let report = game.update(DT, &script(tick));
        let spawned = count(&report.events, |event| {
            matches!(event, Event::EntitySpawned { .. })
        });
        let after = stored_entities(&game);
        assert_eq!(
            after,
            stored + spawned - report.removed.len(),
            "tick {tick} lost track of an entity"
        );
        stored = after;
    }
}

#[test]
fn identical_sessions_publish_identical_event_logs() {
    let first = replay();
    let second = replay();

    assert!(!first.is_empty());
    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(fingerprint(&first), fingerprint(&second));
}

fn scenario() -> GameLoop<Spawning> {
    let spawners = vec![
        SpawnPoint {
            position: Vec2::new(5.0, 200.0),
            path: vec![Vec2::new(200.0, 200.0), Vec2::new(395.0, 200.0)],
        },
        SpawnPoint {
            position: Vec2::new(200.0, 5.0),
            path: vec![Vec2::new(200.0, 120.0), Vec2::new(200.0, 395.0)],
        },
    ];
    let waves = Spawning::new(Config::new(Duration::from_millis(400), 0xface), spawners);
    let mut game = GameLoop::new(config(20, 0.5), waves, ());
    let world = game.world_mut();
    world.set_terrain(Some(Terrain::open(40, 40, 10.0)));
    let _ = world.add_tower(tower(TowerKind::Basic, Vec2::new(140.0, 160.0)));
    let _ = world.add_tower(tower(TowerKind::Frost, Vec2::new(260.0, 240.0)));
    let _ = world.add_tower(tower(TowerKind::Cannon, Vec2::new(240.0, 120.0)));
    let _ = world.spawn_player(player(Vec2::new(300.0, 300.0), 40));
    game
}

fn script(tick: usize) -> InputState {
    let movement = match (tick / 30) % 4 {
        0 => Vec2::X,
        1 => Vec2::Y,
        2 => Vec2::NEG_X,
        _ => Vec2::NEG_Y,
    };
    InputState {
        movement,
        aim: None,
        fire: false,
        auto_fire: true,
    }
}

fn stored_entities(game: &GameLoop<Spawning>) -> usize {
    let world = game.world();
    world.enemies().len()
        + world.towers().len()
        + world.projectiles().len()
        + world.collectibles().len()
        + usize::from(world.player().is_some())
}

fn replay() -> Vec<String> {
    let mut game = scenario();
    let mut log = Vec::new();
    for tick in 0..600 {
        let report = game.update(DT, &script(tick));
        log.extend(report.events.iter().map(|event| format!("{tick}:{event:?}")));
    }
    log
}

fn fingerprint(log: &[String]) -> u64 {
    let mut hasher = DefaultHasher::new();
    log.hash(&mut hasher);
    hasher.finish()
}
