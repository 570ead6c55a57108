#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure player update that resolves one tick of sampled input.

use rampart_core::{
    Action, AttackType, DeltaDetail, Embodied, Enemy, Faction, InputState, Player,
    ProjectileSpawn, SoundCue, TickContext, UpdateResult, Vec2,
};
use tracing::warn;

/// Seconds a player projectile stays in flight before expiring.
pub const PLAYER_PROJECTILE_TTL: f32 = 1.5;

const PLAYER_PROJECTILE_RADIUS: f32 = 3.0;

/// Computes the player's changes for this tick.
#[must_use]
pub fn update_player(
    player: &Player,
    context: &TickContext<'_>,
    input: &InputState,
) -> UpdateResult {
    let id = player.body.id;
    if !player.body.alive {
        return UpdateResult::noop(id);
    }
    let Some(terrain) = context.terrain else {
        warn!(player = id.get(), "terrain missing, player input ignored");
        return UpdateResult::noop(id);
    };

    let mut result = UpdateResult::noop(id);
    let origin = player.body.position;

    let direction = input.movement.normalize_or_zero();
    let speed = player.speed * terrain.speed_multiplier(origin);
    let next = origin + direction * speed * context.dt;
    if direction != Vec2::ZERO && speed > 0.0 && !terrain.is_blocked(next) {
        result.delta.position = Some(next);
        result.delta.velocity = Some(direction * speed);
    } else if player.body.velocity != Vec2::ZERO {
        result.delta.velocity = Some(Vec2::ZERO);
    }

    if player.fire_cooldown <= 0.0 {
        if let Some(shot) = aim(player, context, input) {
            result.actions.push(Action::SpawnProjectile(shot));
            result.actions.push(Action::PlaySound {
                cue: SoundCue::PlayerFire,
            });
            result.delta.cooldown = Some(fire_interval(player));
        }
    } else {
        result.delta.cooldown = Some((player.fire_cooldown - context.dt).max(0.0));
    }

    let regen_cooldown = if player.body.health < player.body.max_health {
        let remaining = player.regen_cooldown - context.dt;
        if remaining <= 0.0 && player.regen.amount > 0 {
            result.actions.push(Action::HealEntity {
                target: id,
                amount: player.regen.amount,
            });
            player.regen.interval
        } else {
            remaining.max(0.0)
        }
    } else {
        player.regen.interval
    };
    result.delta.detail = Some(DeltaDetail::Player { regen_cooldown });

    let reach = player.pickup_radius;
    for collectible in context.collectibles.iter().filter(|c| c.body.alive) {
        if collectible.position().distance(origin) <= reach + collectible.radius() {
            result.actions.push(Action::Collect {
                collectible: collectible.body.id,
                collector: id,
            });
        }
    }

    result
}

fn fire_interval(player: &Player) -> f32 {
    if player.weapon.fire_rate > 0.0 {
        1.0 / player.weapon.fire_rate
    } else {
        f32::INFINITY
    }
}

fn aim(
    player: &Player,
    context: &TickContext<'_>,
    input: &InputState,
) -> Option<ProjectileSpawn> {
    let origin = player.body.position;
    let (direction, homing_target) = match input.aim {
        Some(point) if input.fire => {
            let direction = (point - origin).normalize_or_zero();
            if direction == Vec2::ZERO {
                return None;
            }
            (direction, None)
        }
        _ if input.auto_fire => {
            let enemy = nearest_enemy(origin, player.weapon.auto_range, context)?;
            let direction = (enemy.body.position - origin).normalize_or_zero();
            (direction, Some(enemy.body.id))
        }
        _ => return None,
    };

    Some(ProjectileSpawn {
        owner: Some(player.body.id),
        faction: Faction::Friendly,
        position: origin,
        velocity: direction * player.weapon.projectile_speed,
        damage: player.weapon.damage,
        attack: AttackType::Normal,
        speed: player.weapon.projectile_speed,
        radius: PLAYER_PROJECTILE_RADIUS,
        homing_target,
        ttl: PLAYER_PROJECTILE_TTL,
        on_hit: None,
    })
}

fn nearest_enemy<'a>(origin: Vec2, range: f32, context: &TickContext<'a>) -> Option<&'a Enemy> {
    context
        .living_enemies()
        .map(|enemy| (enemy.body.position.distance(origin), enemy))
        .filter(|(distance, _)| *distance <= range)
        .fold(None, |best: Option<(f32, &'a Enemy)>, current| match best {
            Some(existing) if existing.0 <= current.0 => Some(existing),
            _ => Some(current),
        })
        .map(|(_, enemy)| enemy)
}
