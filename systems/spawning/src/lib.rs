#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic reference wave controller.
//!
//! Waves spawn one enemy per interval from a seeded choice of spawn points,
//! cycling through the configured enemy templates. A new wave begins once
//! every enemy of the previous wave has left the world and the break between
//! waves has elapsed.

use std::{collections::BTreeSet, time::Duration};

use rampart_core::{
    AttackProfile, EnemyBehavior, EnemySpawn, EntityId, Vec2, WaveController,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;
const HEALTH_GROWTH_PER_WAVE: f32 = 0.2;

/// Location enemies enter from, with the path its path followers walk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Entry position.
    pub position: Vec2,
    /// Waypoints walked by path followers entering here.
    pub path: Vec<Vec2>,
}

/// Blueprint for enemies emitted by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    /// Movement and targeting behaviour.
    pub behavior: EnemyBehavior,
    /// Health during the first wave.
    pub health: u32,
    /// Reward granted when killed.
    pub reward: u32,
    /// Armor rating.
    pub armor: u32,
    /// Movement speed.
    pub speed: f32,
    /// Collision radius.
    pub radius: f32,
    /// Attack parameters.
    pub attack: AttackProfile,
}

impl EnemyTemplate {
    /// Walks the path and bites whatever blocks it.
    pub const GRUNT: Self = Self {
        behavior: EnemyBehavior::PathFollower,
        health: 30,
        reward: 5,
        armor: 10,
        speed: 40.0,
        radius: 8.0,
        attack: AttackProfile {
            damage: 4,
            range: 6.0,
            interval: 1.0,
        },
    };

    /// Fast melee hunter of the player.
    pub const RUNNER: Self = Self {
        behavior: EnemyBehavior::Chaser,
        health: 18,
        reward: 4,
        armor: 0,
        speed: 70.0,
        radius: 6.0,
        attack: AttackProfile {
            damage: 3,
            range: 4.0,
            interval: 0.8,
        },
    };

    /// Keeps its distance and shoots.
    pub const ARCHER: Self = Self {
        behavior: EnemyBehavior::Ranged,
        health: 22,
        reward: 6,
        armor: 5,
        speed: 35.0,
        radius: 7.0,
        attack: AttackProfile {
            damage: 5,
            range: 120.0,
            interval: 1.6,
        },
    };

    fn instantiate(&self, wave: u32, spawner: &SpawnPoint) -> EnemySpawn {
        let growth = 1.0 + HEALTH_GROWTH_PER_WAVE * wave.saturating_sub(1) as f32;
        EnemySpawn {
            position: spawner.position,
            health: ((self.health as f32) * growth).round() as u32,
            behavior: self.behavior,
            reward: self.reward,
            armor: self.armor,
            speed: self.speed,
            radius: self.radius,
            attack: self.attack,
            path: spawner.path.clone(),
            target: None,
        }
    }
}

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Debug)]
pub struct Config {
    spawn_interval: Duration,
    rng_seed: u64,
    wave_size: u32,
    wave_growth: u32,
    wave_break: Duration,
    templates: Vec<EnemyTemplate>,
}

impl Config {
    /// Creates a new configuration using the provided spawn cadence and seed.
    ///
    /// Waves start with eight enemies, grow by two per wave and are separated
    /// by a three second break.
    #[must_use]
    pub fn new(spawn_interval: Duration, rng_seed: u64) -> Self {
        Self {
            spawn_interval,
            rng_seed,
            wave_size: 8,
            wave_growth: 2,
            wave_break: Duration::from_secs(3),
            templates: vec![
                EnemyTemplate::GRUNT,
                EnemyTemplate::GRUNT,
                EnemyTemplate::RUNNER,
                EnemyTemplate::ARCHER,
            ],
        }
    }

    /// Overrides the first wave's size and the growth per subsequent wave.
    #[must_use]
    pub fn with_wave_size(mut self, wave_size: u32, wave_growth: u32) -> Self {
        self.wave_size = wave_size;
        self.wave_growth = wave_growth;
        self
    }

    /// Overrides the pause between a cleared wave and the next one.
    #[must_use]
    pub fn with_wave_break(mut self, wave_break: Duration) -> Self {
        self.wave_break = wave_break;
        self
    }

    /// Overrides the enemy templates cycled through by the controller.
    #[must_use]
    pub fn with_templates(mut self, templates: Vec<EnemyTemplate>) -> Self {
        self.templates = templates;
        self
    }
}

/// Wave controller that deterministically emits enemies at fixed spawn points.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    spawners: Vec<SpawnPoint>,
    accumulator: Duration,
    rng_state: u64,
    template_index: usize,
    wave: u32,
    pending: u32,
    break_remaining: Duration,
    alive: BTreeSet<EntityId>,
    killed: u32,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config, spawners: Vec<SpawnPoint>) -> Self {
        Self {
            accumulator: Duration::ZERO,
            rng_state: config.rng_seed,
            template_index: 0,
            wave: 0,
            pending: 0,
            break_remaining: Duration::ZERO,
            alive: BTreeSet::new(),
            killed: 0,
            config,
            spawners,
        }
    }

    /// Enemies of the controller killed by damage so far.
    #[must_use]
    pub fn killed(&self) -> u32 {
        self.killed
    }

    /// Spawned enemies that are still in the world.
    #[must_use]
    pub fn alive(&self) -> usize {
        self.alive.len()
    }

    fn wave_size(&self, wave: u32) -> u32 {
        self.config
            .wave_size
            .saturating_add(self.config.wave_growth.saturating_mul(wave.saturating_sub(1)))
    }

    fn start_wave(&mut self, wave: u32) {
        self.wave = wave;
        self.pending = self.wave_size(wave);
        self.accumulator = Duration::ZERO;
        self.break_remaining = self.config.wave_break;
        debug!(wave, enemies = self.pending, "wave started");
    }

    fn resolve_spawn_attempts(&mut self) -> u32 {
        let interval = self.config.spawn_interval.as_nanos();
        if interval == 0 {
            return 0;
        }

        let due = self.accumulator.as_nanos() / interval;
        let attempts = u32::try_from(due).unwrap_or(u32::MAX).min(self.pending);
        if attempts == self.pending {
            self.accumulator = Duration::ZERO;
        } else {
            self.accumulator -= self.config.spawn_interval * attempts;
        }
        attempts
    }

    fn select_spawner(&mut self) -> Option<&SpawnPoint> {
        if self.spawners.is_empty() {
            return None;
        }
        let value = self.advance_rng();
        let index = (value % self.spawners.len() as u64) as usize;
        self.spawners.get(index)
    }

    fn advance_rng(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.rng_state
    }

    fn next_template(&mut self) -> Option<EnemyTemplate> {
        let templates = &self.config.templates;
        if templates.is_empty() {
            return None;
        }
        let template = templates[self.template_index % templates.len()];
        self.template_index = (self.template_index + 1) % templates.len();
        Some(template)
    }
}

impl WaveController for Spawning {
    fn update(&mut self, dt: f32) -> Vec<EnemySpawn> {
        if self.config.spawn_interval.is_zero()
            || self.spawners.is_empty()
            || self.config.templates.is_empty()
        {
            return Vec::new();
        }

        let elapsed = to_duration(dt);
        if self.wave == 0 {
            self.start_wave(1);
        }

        if self.pending == 0 {
            if !self.alive.is_empty() {
                return Vec::new();
            }
            self.break_remaining = self.break_remaining.saturating_sub(elapsed);
            if !self.break_remaining.is_zero() {
                return Vec::new();
            }
            self.start_wave(self.wave + 1);
            return Vec::new();
        }

        self.accumulator = self.accumulator.saturating_add(elapsed);
        let attempts = self.resolve_spawn_attempts();
        self.pending -= attempts;

        let mut spawns = Vec::with_capacity(attempts as usize);
        for _ in 0..attempts {
            let Some(template) = self.next_template() else {
                break;
            };
            let wave = self.wave;
            let Some(spawner) = self.select_spawner() else {
                break;
            };
            spawns.push(template.instantiate(wave, spawner));
        }
        spawns
    }

    fn enemy_spawned(&mut self, enemy: EntityId) {
        let _ = self.alive.insert(enemy);
    }

    fn enemy_killed(&mut self, _enemy: EntityId) {
        self.killed = self.killed.saturating_add(1);
    }

    fn enemy_removed(&mut self, enemy: EntityId) {
        let _ = self.alive.remove(&enemy);
    }

    fn wave(&self) -> u32 {
        self.wave
    }

    fn pending(&self) -> u32 {
        self.pending
    }

    fn reset(&mut self) {
        *self = Self::new(self.config.clone(), std::mem::take(&mut self.spawners));
    }
}

fn to_duration(seconds: f32) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(seconds).unwrap_or(Duration::MAX)
}
