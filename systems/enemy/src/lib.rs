#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure enemy update: status timers, target selection, attacks and movement.
//!
//! Path followers walk their waypoints and cost the session a life when they
//! walk off the end of the path. Chasers and ranged enemies close in on their
//! target until it is within attack reach. Repeated movement failures are
//! recovered with help from the shared [`StuckPositionCache`].

use rampart_core::{
    Action, AttackType, DeltaDetail, EffectKind, EnemyBehavior, Enemy, EntityId, Faction,
    ProjectileSpawn, SoundCue, StallTracker, StatusEffects, Terrain, TickContext, UpdateResult,
    Vec2,
};
use rampart_system_stuck_cache::StuckPositionCache;
use tracing::{debug, warn};

/// Consecutive blocked ticks before an enemy attempts recovery.
pub const STALL_THRESHOLD: u32 = 3;

/// Sideways distance of a first-time recovery nudge.
pub const NUDGE_DISTANCE: f32 = 12.0;

/// Sideways distance of the alternate route taken at a known stuck position.
pub const SIDESTEP_DISTANCE: f32 = 24.0;

/// Travel speed of projectiles fired by ranged enemies.
pub const ENEMY_PROJECTILE_SPEED: f32 = 240.0;

const ENEMY_PROJECTILE_RADIUS: f32 = 4.0;
const ENEMY_PROJECTILE_TTL: f32 = 3.0;

/// Computes the enemy's changes for this tick.
///
/// The cache is the only state the function writes; enemies are updated in
/// identifier order so its contents stay deterministic.
pub fn update_enemy(
    enemy: &Enemy,
    context: &TickContext<'_>,
    stuck: &mut StuckPositionCache,
) -> UpdateResult {
    let id = enemy.body.id;
    if !enemy.body.alive {
        return UpdateResult::noop(id);
    }
    let Some(terrain) = context.terrain else {
        warn!(enemy = id.get(), "terrain missing, enemy left idle");
        return UpdateResult::noop(id);
    };

    let mut step = Step {
        result: UpdateResult::noop(id),
        path_index: enemy.path_index,
        status: enemy.status.advanced(context.dt),
        stall: enemy.stall,
    };

    if enemy.status.is_stunned() {
        step.result.delta.velocity = Some(Vec2::ZERO);
        step.result.delta.cooldown = Some((enemy.attack_cooldown - context.dt).max(0.0));
        return step.finish();
    }

    if enemy.behavior == EnemyBehavior::PathFollower && enemy.path_index >= enemy.path.len() {
        escape(enemy, &mut step.result);
        return step.finish();
    }

    let target = resolve_target(enemy, context);
    let selected = target.map(|target| target.id);
    if selected != enemy.target {
        step.result.delta.target = Some(selected);
    }

    let in_range = target.is_some_and(|target| target.reach_from(enemy) <= enemy.attack.range);
    let cooldown = match target {
        Some(target) if in_range && enemy.attack_cooldown <= 0.0 => {
            attack(enemy, target, &mut step.result.actions);
            enemy.attack.interval
        }
        _ => (enemy.attack_cooldown - context.dt).max(0.0),
    };
    step.result.delta.cooldown = Some(cooldown);

    let destination = match enemy.behavior {
        EnemyBehavior::PathFollower => enemy.path.get(enemy.path_index).copied(),
        EnemyBehavior::Chaser | EnemyBehavior::Ranged => {
            target.filter(|_| !in_range).map(|target| target.position)
        }
    };

    match destination {
        Some(destination) => advance(enemy, destination, terrain, context, stuck, &mut step),
        None => step.result.delta.velocity = Some(Vec2::ZERO),
    }
    step.finish()
}

struct Step {
    result: UpdateResult,
    path_index: usize,
    status: StatusEffects,
    stall: StallTracker,
}

impl Step {
    fn finish(mut self) -> UpdateResult {
        self.result.delta.detail = Some(DeltaDetail::Enemy {
            path_index: self.path_index,
            status: self.status,
            stall: self.stall,
        });
        self.result
    }
}

#[derive(Clone, Copy, Debug)]
struct Target {
    id: EntityId,
    position: Vec2,
    radius: f32,
}

impl Target {
    fn reach_from(&self, enemy: &Enemy) -> f32 {
        enemy.body.position.distance(self.position) - enemy.radius - self.radius
    }
}

fn resolve_target(enemy: &Enemy, context: &TickContext<'_>) -> Option<Target> {
    enemy
        .target
        .and_then(|id| {
            context
                .hostile_target(id)
                .map(|(position, radius)| Target {
                    id,
                    position,
                    radius,
                })
        })
        .or_else(|| {
            context.living_player().map(|player| Target {
                id: player.body.id,
                position: player.body.position,
                radius: player.radius,
            })
        })
}

fn attack(enemy: &Enemy, target: Target, actions: &mut Vec<Action>) {
    match enemy.behavior {
        EnemyBehavior::PathFollower | EnemyBehavior::Chaser => {
            actions.push(Action::DamageEntity {
                target: target.id,
                source: Some(enemy.body.id),
                amount: enemy.attack.damage,
                attack: AttackType::Normal,
                effect: None,
            });
            actions.push(Action::PlaySound {
                cue: SoundCue::EnemyStrike,
            });
        }
        EnemyBehavior::Ranged => {
            let direction = (target.position - enemy.body.position).normalize_or_zero();
            actions.push(Action::SpawnProjectile(ProjectileSpawn {
                owner: Some(enemy.body.id),
                faction: Faction::Hostile,
                position: enemy.body.position,
                velocity: direction * ENEMY_PROJECTILE_SPEED,
                damage: enemy.attack.damage,
                attack: AttackType::Normal,
                speed: ENEMY_PROJECTILE_SPEED,
                radius: ENEMY_PROJECTILE_RADIUS,
                homing_target: Some(target.id),
                ttl: ENEMY_PROJECTILE_TTL,
                on_hit: None,
            }));
        }
    }
}

fn advance(
    enemy: &Enemy,
    destination: Vec2,
    terrain: &Terrain,
    context: &TickContext<'_>,
    stuck: &mut StuckPositionCache,
    step: &mut Step,
) {
    let position = enemy.body.position;
    let offset = destination - position;
    let distance = offset.length();
    if distance <= f32::EPSILON {
        step.result.delta.velocity = Some(Vec2::ZERO);
        arrive(enemy, step);
        return;
    }

    let direction = offset / distance;
    let speed =
        enemy.speed * step.status.speed_multiplier() * terrain.speed_multiplier(position);
    let travel = (speed * context.dt).min(distance);
    let next = position + direction * travel;

    if speed <= 0.0 {
        step.result.delta.velocity = Some(Vec2::ZERO);
        return;
    }
    if terrain.is_blocked(next) {
        step.result.delta.velocity = Some(Vec2::ZERO);
        recover(enemy, direction, terrain, context.elapsed, stuck, step);
        return;
    }

    step.stall = StallTracker::default();
    step.result.delta.position = Some(next);
    step.result.delta.velocity = Some(direction * speed);
    if travel >= distance {
        arrive(enemy, step);
    }
}

fn arrive(enemy: &Enemy, step: &mut Step) {
    if enemy.behavior != EnemyBehavior::PathFollower {
        return;
    }
    step.path_index += 1;
    if step.path_index >= enemy.path.len() {
        escape(enemy, &mut step.result);
    }
}

fn escape(enemy: &Enemy, result: &mut UpdateResult) {
    debug!(enemy = enemy.body.id.get(), "enemy reached the end of its path");
    result.delta.mark_dead = true;
    result.delta.velocity = Some(Vec2::ZERO);
    result.actions.push(Action::LoseLives { amount: 1 });
}

fn recover(
    enemy: &Enemy,
    direction: Vec2,
    terrain: &Terrain,
    now: f32,
    stuck: &mut StuckPositionCache,
    step: &mut Step,
) {
    step.stall.blocked_ticks += 1;
    if step.stall.blocked_ticks < STALL_THRESHOLD {
        return;
    }
    step.stall = StallTracker::default();

    let position = enemy.body.position;
    let known = stuck.is_stuck(position, now);
    stuck.record_stuck(position, now);

    if known {
        if enemy.behavior == EnemyBehavior::PathFollower && step.path_index + 1 < enemy.path.len()
        {
            step.path_index += 1;
            debug!(
                enemy = enemy.body.id.get(),
                waypoint = step.path_index,
                "known stuck position, skipping waypoint"
            );
        } else if let Some(sidestep) = sideways(position, direction, SIDESTEP_DISTANCE, terrain) {
            step.result.delta.position = Some(sidestep);
        }
        return;
    }

    if let Some(nudged) = sideways(position, direction, NUDGE_DISTANCE, terrain) {
        step.result.delta.position = Some(nudged);
        step.result.actions.push(Action::CreateEffect {
            effect: EffectKind::Dust,
            position,
        });
    }
}

fn sideways(position: Vec2, direction: Vec2, distance: f32, terrain: &Terrain) -> Option<Vec2> {
    let normal = direction.perp();
    [normal, -normal]
        .into_iter()
        .map(|side| position + side * distance)
        .find(|candidate| !terrain.is_blocked(*candidate))
}
