#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Applies a tick's collected actions to the world and publishes events.
//!
//! Actions are consumed strictly in collection order. Every action that names
//! an entity first checks that the entity still exists and is alive, so an
//! entity that died earlier in the batch is never damaged, healed, collected
//! or rewarded again.

use rampart_core::{
    Action, AttackType, CollectibleReward, CollectibleSpawn, EffectKind, EntityId, EntityKind,
    Event, SoundCue, StatusEffect, Vec2,
};
use rampart_system_combat::{resolve_damage, resolve_heal, Defender, Strike};
use rampart_world::{World, WorldError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

/// Tunables of the action processor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Probability in `0.0..=1.0` that a killed enemy drops a collectible.
    pub drop_chance: f32,
    /// Score granted per point of enemy reward.
    pub score_multiplier: u64,
    /// Seed of the drop-roll generator.
    pub seed: u64,
    /// Seconds a dropped collectible stays on the ground.
    pub collectible_ttl: f32,
    /// Health restored by health drops.
    pub health_drop: u32,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            drop_chance: 0.2,
            score_multiplier: 5,
            seed: 0x5eed_0f_d20b,
            collectible_ttl: 10.0,
            health_drop: 10,
        }
    }
}

/// Stateful interpreter that turns actions into world mutations and events.
#[derive(Debug)]
pub struct ActionProcessor {
    config: ProcessorConfig,
    rng: ChaCha8Rng,
}

impl ActionProcessor {
    /// Creates a processor whose drop rolls are seeded from the configuration.
    #[must_use]
    pub fn new(config: ProcessorConfig) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        }
    }

    /// Configuration the processor was created with.
    #[must_use]
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Restores the drop-roll generator to its initial seed.
    pub fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
    }

    /// Applies every action in order, appending the resulting events to `out`.
    pub fn process(&mut self, actions: &[Action], world: &mut World, out: &mut Vec<Event>) {
        for action in actions {
            self.apply(action, world, out);
        }
    }

    fn apply(&mut self, action: &Action, world: &mut World, out: &mut Vec<Event>) {
        match *action {
            Action::DamageEntity {
                target,
                amount,
                attack,
                effect,
                ..
            } => self.damage(target, amount, attack, effect, world, out),
            Action::HealEntity { target, amount } => heal(target, amount, world, out),
            Action::SpawnProjectile(spawn) => {
                let inserted = world.add_projectile(spawn);
                record_spawn(EntityKind::Projectile, inserted, out);
            }
            Action::SpawnCollectible(spawn) => {
                let inserted = world.add_collectible(spawn);
                record_spawn(EntityKind::Collectible, inserted, out);
            }
            Action::DestroyEntity { target } => match world.body_mut(target) {
                Some(body) if body.alive => body.alive = false,
                _ => trace!(entity = target.get(), "destroy of missing entity ignored"),
            },
            Action::Collect {
                collectible,
                collector,
            } => collect(collectible, collector, world, out),
            Action::AddCurrency { amount } => add_currency(amount, world, out),
            Action::AddExperience { amount } => add_experience(amount, world, out),
            Action::LoseLives { amount } => lose_lives(amount, world, out),
            Action::PlaySound { cue } => out.push(Event::SoundRequested { cue }),
            Action::CreateEffect { effect, position } => {
                out.push(Event::EffectRequested { effect, position });
            }
        }
    }

    fn damage(
        &mut self,
        target: EntityId,
        amount: u32,
        attack: AttackType,
        effect: Option<StatusEffect>,
        world: &mut World,
        out: &mut Vec<Event>,
    ) {
        let Some(kind) = world.kind_of(target) else {
            trace!(entity = target.get(), "damage to unknown entity ignored");
            return;
        };
        let armor = match kind {
            EntityKind::Enemy => world.enemy_mut(target).map(|enemy| enemy.armor),
            EntityKind::Tower => world.tower_mut(target).map(|tower| tower.armor),
            EntityKind::Player => world.player_mut().map(|player| player.armor),
            EntityKind::Projectile | EntityKind::Collectible => None,
        };
        let Some(armor) = armor else {
            trace!(entity = target.get(), ?kind, "entity cannot take damage");
            return;
        };
        let Some(body) = world.body_mut(target).filter(|body| body.alive) else {
            trace!(entity = target.get(), "damage to dead entity ignored");
            return;
        };

        let outcome = resolve_damage(
            Strike {
                damage: amount,
                attack,
            },
            Defender {
                armor,
                health: body.health,
            },
        );
        body.health = outcome.remaining;
        out.push(Event::EntityDamaged {
            target,
            amount: outcome.amount,
            critical: outcome.critical,
        });

        if outcome.lethal {
            match kind {
                EntityKind::Enemy => self.enemy_killed(target, world, out),
                EntityKind::Tower => tower_destroyed(target, world, out),
                EntityKind::Player => player_defeated(world, out),
                EntityKind::Projectile | EntityKind::Collectible => {}
            }
        } else if let (EntityKind::Enemy, Some(effect)) = (kind, effect) {
            if let Some(enemy) = world.enemy_mut(target) {
                enemy.status.apply(effect);
            }
        }
    }

    /// Kills a living enemy and grants its rewards.
    ///
    /// Score grows by the reward times the configured multiplier, currency by
    /// the reward, and a player with progression gains the reward as
    /// experience. Enemies that are missing or already dead are ignored, so
    /// rewards are granted at most once.
    pub fn enemy_killed(&mut self, enemy: EntityId, world: &mut World, out: &mut Vec<Event>) {
        let Some(slain) = world.enemy_mut(enemy).filter(|slain| slain.body.alive) else {
            trace!(enemy = enemy.get(), "reward for missing enemy ignored");
            return;
        };
        slain.body.alive = false;
        slain.body.health = 0;
        slain.body.velocity = Vec2::ZERO;
        let reward = slain.reward;
        let position = slain.body.position;

        out.push(Event::EnemyKilled {
            enemy,
            reward,
            position,
        });
        world
            .session_mut()
            .add_score(u64::from(reward).saturating_mul(self.config.score_multiplier));
        add_currency(reward, world, out);
        add_experience(reward, world, out);

        if self.config.drop_chance > 0.0 && self.rng.gen::<f32>() < self.config.drop_chance {
            let reward = match world.player() {
                Some(player) if player.body.alive && player.body.health < player.body.max_health => {
                    CollectibleReward::Health(self.config.health_drop)
                }
                _ => CollectibleReward::Currency(reward.div_ceil(2).max(1)),
            };
            let inserted = world.add_collectible(CollectibleSpawn {
                position,
                reward,
                ttl: self.config.collectible_ttl,
            });
            record_spawn(EntityKind::Collectible, inserted, out);
        }

        out.push(Event::EffectRequested {
            effect: EffectKind::EnemyBurst,
            position,
        });
        out.push(Event::SoundRequested {
            cue: SoundCue::EnemyDeath,
        });
    }
}

fn record_spawn(kind: EntityKind, inserted: Result<EntityId, WorldError>, out: &mut Vec<Event>) {
    match inserted {
        Ok(id) => out.push(Event::EntitySpawned { id, kind }),
        Err(error) => {
            debug!(%error, "spawn rejected");
            out.push(Event::SpawnRejected { kind });
        }
    }
}

fn heal(target: EntityId, amount: u32, world: &mut World, out: &mut Vec<Event>) {
    let Some(body) = world.body_mut(target).filter(|body| body.alive) else {
        trace!(entity = target.get(), "heal of missing entity ignored");
        return;
    };
    let outcome = resolve_heal(body.health, body.max_health, amount);
    body.health = outcome.health;
    if outcome.restored > 0 {
        out.push(Event::EntityHealed {
            target,
            amount: outcome.restored,
        });
    }
}

fn collect(collectible: EntityId, collector: EntityId, world: &mut World, out: &mut Vec<Event>) {
    if !world.is_alive(collector) {
        trace!(collector = collector.get(), "collect by missing entity ignored");
        return;
    }
    let Some(item) = world
        .collectible_mut(collectible)
        .filter(|item| item.body.alive)
    else {
        trace!(collectible = collectible.get(), "collectible already gone");
        return;
    };
    item.body.alive = false;
    let reward = item.reward;
    let position = item.body.position;

    match reward {
        CollectibleReward::Currency(amount) => add_currency(amount, world, out),
        CollectibleReward::Health(amount) => heal(collector, amount, world, out),
    }
    out.push(Event::CollectiblePicked {
        collectible,
        collector,
        reward,
    });
    out.push(Event::EffectRequested {
        effect: EffectKind::Sparkle,
        position,
    });
    out.push(Event::SoundRequested {
        cue: SoundCue::Pickup,
    });
}

fn add_currency(amount: u32, world: &mut World, out: &mut Vec<Event>) {
    if amount == 0 {
        return;
    }
    let total = world.session_mut().add_currency(u64::from(amount));
    out.push(Event::CurrencyChanged { amount, total });
}

fn add_experience(amount: u32, world: &mut World, out: &mut Vec<Event>) {
    let Some(progression) = world
        .player_mut()
        .and_then(|player| player.progression.as_mut())
    else {
        return;
    };
    if amount == 0 {
        return;
    }
    progression.gain(amount);
    out.push(Event::ExperienceGained {
        amount,
        total: progression.experience,
        level: progression.level,
    });
}

fn lose_lives(amount: u32, world: &mut World, out: &mut Vec<Event>) {
    let loss = world.session_mut().lose_lives(amount);
    if loss.lost > 0 {
        out.push(Event::LivesLost {
            amount: loss.lost,
            remaining: loss.remaining,
        });
    }
    if loss.game_over {
        info!("no lives remaining, game over");
        out.push(Event::GameOver);
    }
}

fn tower_destroyed(tower: EntityId, world: &mut World, out: &mut Vec<Event>) {
    let Some(body) = world.body_mut(tower) else {
        return;
    };
    body.alive = false;
    let position = body.position;
    out.push(Event::TowerDestroyed { tower });
    out.push(Event::EffectRequested {
        effect: EffectKind::Debris,
        position,
    });
    out.push(Event::SoundRequested {
        cue: SoundCue::TowerDestroyed,
    });
}

fn player_defeated(world: &mut World, out: &mut Vec<Event>) {
    let loss = world.session_mut().lose_lives(1);
    let Some(player) = world.player_mut() else {
        warn!("lethal hit on a player that is not present");
        return;
    };

    if loss.remaining > 0 {
        player.body.position = player.spawn_point;
        player.body.velocity = Vec2::ZERO;
        player.body.health = player.body.max_health;
    } else {
        player.body.alive = false;
        player.body.health = 0;
    }

    if loss.lost > 0 {
        out.push(Event::LivesLost {
            amount: loss.lost,
            remaining: loss.remaining,
        });
    }
    out.push(Event::PlayerDefeated {
        lives_remaining: loss.remaining,
    });
    out.push(Event::SoundRequested {
        cue: SoundCue::PlayerHurt,
    });
    if loss.game_over {
        info!("player defeated with no lives remaining, game over");
        out.push(Event::GameOver);
    }
}
