#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick orchestrator that drives the Rampart simulation.
//!
//! One call to [`GameLoop::update`] advances the session by one tick:
//! controllers spawn enemies, every per-kind update function runs against an
//! immutable view of the world, the collected deltas are applied in a single
//! batch, the collected actions are applied in collection order, and finally
//! bodies are integrated and dead entities are removed.

use std::collections::BTreeSet;

use rampart_core::{
    Action, DeterministicRoll, EnemySpawn, EntityDelta, EntityKind, Event, InputState,
    SpawnZoneController, UpdateResult, WaveController,
};
use rampart_system_actions::{ActionProcessor, ProcessorConfig};
use rampart_system_enemy::update_enemy;
use rampart_system_player::update_player;
use rampart_system_projectile::update_projectile;
use rampart_system_stuck_cache::StuckPositionCache;
use rampart_system_tower::update_tower;
use rampart_world::{query, Limits, Removed, SessionConfig, World};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Session parameters consumed by [`GameLoop::new`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Starting lives and currency.
    pub session: SessionConfig,
    /// Repository capacity limits.
    pub limits: Limits,
    /// Action processor tunables.
    pub processor: ProcessorConfig,
    /// Seed of the per-entity rolls used for critical hits.
    pub roll_seed: u64,
}

/// Derived counters recomputed at the end of every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Counters {
    /// Index of the last simulated tick.
    pub tick: u64,
    /// Accumulated game time in seconds.
    pub elapsed: f32,
    /// Living enemies.
    pub enemies: usize,
    /// Living towers.
    pub towers: usize,
    /// Living projectiles.
    pub projectiles: usize,
    /// Collectibles still on the ground.
    pub collectibles: usize,
    /// Whether a living player is present.
    pub player_alive: bool,
    /// Lives remaining.
    pub lives: u32,
    /// Current score.
    pub score: u64,
    /// Current currency.
    pub currency: u64,
    /// Current wave number.
    pub wave: u32,
    /// Enemies of the current wave still waiting to spawn.
    pub pending: u32,
    /// Whether the session ran out of lives.
    pub game_over: bool,
    /// Enemies killed over the whole session.
    pub enemies_killed: u32,
}

/// Outcome of a single call to [`GameLoop::update`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Whether the tick was skipped because the loop is paused.
    pub paused: bool,
    /// Events published during the tick, in publication order.
    pub events: Vec<Event>,
    /// Entities removed at the end of the tick, in identifier order.
    pub removed: Vec<Removed>,
    /// Counters after the tick.
    pub counters: Counters,
}

/// Drives the world through fixed update phases each tick.
#[derive(Debug)]
pub struct GameLoop<W, Z = ()> {
    world: World,
    waves: W,
    zones: Z,
    processor: ActionProcessor,
    stuck: StuckPositionCache,
    roll: DeterministicRoll,
    elapsed: f32,
    tick: u64,
    paused: bool,
    counters: Counters,
    events: Vec<Event>,
}

impl<W, Z> GameLoop<W, Z>
where
    W: WaveController,
    Z: SpawnZoneController,
{
    /// Creates a loop over an empty world.
    ///
    /// Terrain, towers and the player are placed through
    /// [`GameLoop::world_mut`] before the first tick.
    #[must_use]
    pub fn new(config: GameConfig, waves: W, zones: Z) -> Self {
        let world = World::new(config.session, config.limits);
        let mut game = Self {
            world,
            waves,
            zones,
            processor: ActionProcessor::new(config.processor),
            stuck: StuckPositionCache::new(),
            roll: DeterministicRoll::new(config.roll_seed),
            elapsed: 0.0,
            tick: 0,
            paused: false,
            counters: Counters::default(),
            events: Vec::new(),
        };
        game.refresh_counters();
        game
    }

    /// Read access to the entity repository.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access for placing entities between ticks.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Wave controller driving the session.
    #[must_use]
    pub fn waves(&self) -> &W {
        &self.waves
    }

    /// Counters published at the end of the last tick.
    #[must_use]
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Events published during the last simulated tick.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Stops subsequent ticks from advancing the simulation.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Lets subsequent ticks advance the simulation again.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Reports whether the loop is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Returns the session to its initial state.
    ///
    /// Every entity is removed, the terrain is kept, and the stuck cache,
    /// clock, counters, controllers and drop rolls start over.
    pub fn reset(&mut self) {
        self.world.clear();
        self.stuck.clear();
        self.processor.reset();
        self.waves.reset();
        self.zones.reset();
        self.elapsed = 0.0;
        self.tick = 0;
        self.paused = false;
        self.events.clear();
        self.counters = Counters::default();
        self.refresh_counters();
        debug!("session reset");
    }

    /// Advances the simulation by `dt` seconds.
    pub fn update(&mut self, dt: f32, input: &InputState) -> TickReport {
        if self.paused {
            return TickReport {
                paused: true,
                events: Vec::new(),
                removed: Vec::new(),
                counters: self.counters,
            };
        }

        self.tick += 1;
        self.elapsed += dt;
        self.events.clear();

        self.spawn_enemies(dt);

        let (deltas, actions) = self.collect_updates(dt, input);
        let _ = self.world.batch_update(&deltas);
        let placed: BTreeSet<_> = deltas
            .iter()
            .filter(|delta| delta.repositions())
            .map(|delta| delta.id)
            .collect();

        self.processor
            .process(&actions, &mut self.world, &mut self.events);
        for event in &self.events {
            if let Event::EnemyKilled { enemy, .. } = event {
                self.waves.enemy_killed(*enemy);
                self.counters.enemies_killed = self.counters.enemies_killed.saturating_add(1);
            }
        }

        self.world.integrate(dt, &placed);
        self.world.age_collectibles(dt);

        let removed = self.world.cleanup_dead_entities();
        for entry in removed.iter().filter(|entry| entry.kind == EntityKind::Enemy) {
            self.waves.enemy_removed(entry.id);
        }

        self.refresh_counters();
        trace!(
            tick = self.tick,
            actions = actions.len(),
            events = self.events.len(),
            removed = removed.len(),
            "tick complete"
        );

        TickReport {
            paused: false,
            events: self.events.clone(),
            removed,
            counters: self.counters,
        }
    }

    fn spawn_enemies(&mut self, dt: f32) {
        let snapshot = query::snapshot(&self.world, self.elapsed);
        let wave_spawns = self.waves.update(dt);
        let zone_spawns =
            self.zones
                .update(dt, &snapshot, self.world.towers(), self.world.player());
        self.world.session_mut().set_wave(self.waves.wave());

        let player = self
            .world
            .player()
            .filter(|player| player.body.alive)
            .map(|player| player.body.id);

        for (spawn, from_wave) in wave_spawns
            .into_iter()
            .map(|spawn| (spawn, true))
            .chain(zone_spawns.into_iter().map(|spawn| (spawn, false)))
        {
            let spawn = EnemySpawn {
                target: spawn.target.or(player),
                ..spawn
            };
            match self.world.add_enemy(spawn) {
                Ok(id) => {
                    if from_wave {
                        self.waves.enemy_spawned(id);
                    }
                    self.events.push(Event::EntitySpawned {
                        id,
                        kind: EntityKind::Enemy,
                    });
                }
                Err(error) => {
                    debug!(%error, "enemy spawn rejected");
                    self.events.push(Event::SpawnRejected {
                        kind: EntityKind::Enemy,
                    });
                }
            }
        }
    }

    fn collect_updates(&mut self, dt: f32, input: &InputState) -> (Vec<EntityDelta>, Vec<Action>) {
        let context = self.world.context(dt, self.elapsed, self.tick, self.roll);
        let mut deltas = Vec::new();
        let mut actions = Vec::new();
        let mut gather = |result: UpdateResult| {
            if !result.delta.is_empty() {
                deltas.push(result.delta);
            }
            actions.extend(result.actions);
        };

        for enemy in context.enemies {
            gather(update_enemy(enemy, &context, &mut self.stuck));
        }
        for tower in context.towers {
            gather(update_tower(tower, &context));
        }
        if let Some(player) = context.player {
            gather(update_player(player, &context, input));
        }
        for projectile in context.projectiles {
            gather(update_projectile(projectile, &context));
        }

        (deltas, actions)
    }

    fn refresh_counters(&mut self) {
        let world = &self.world;
        let session = world.session();
        self.counters = Counters {
            tick: self.tick,
            elapsed: self.elapsed,
            enemies: query::living_enemies(world),
            towers: world.towers().iter().filter(|t| t.body.alive).count(),
            projectiles: world.projectiles().iter().filter(|p| p.body.alive).count(),
            collectibles: world.collectibles().iter().filter(|c| c.body.alive).count(),
            player_alive: world.player().is_some_and(|player| player.body.alive),
            lives: session.lives(),
            score: session.score(),
            currency: session.currency(),
            wave: self.waves.wave(),
            pending: self.waves.pending(),
            game_over: session.is_game_over(),
            enemies_killed: self.counters.enemies_killed,
        };
    }
}
