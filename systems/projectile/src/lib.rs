#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure projectile update: lifetime, homing, flight and collision.

use rampart_core::{
    Action, DeltaDetail, EffectKind, Embodied, EntityId, Faction, Projectile, TickContext,
    UpdateResult, Vec2,
};
use tracing::trace;

/// Radius searched for a replacement target when the homing target is lost.
pub const RETARGET_RADIUS: f32 = 150.0;

/// Computes the projectile's changes for this tick.
///
/// A projectile hits at most one entity and dies with the hit.
#[must_use]
pub fn update_projectile(projectile: &Projectile, context: &TickContext<'_>) -> UpdateResult {
    let id = projectile.body.id;
    if !projectile.body.alive {
        return UpdateResult::noop(id);
    }

    let mut result = UpdateResult::noop(id);
    let ttl = projectile.ttl - context.dt;
    let mut homing_target = projectile.homing_target;
    let mut retargeted = projectile.retargeted;

    if ttl <= 0.0 {
        result.delta.mark_dead = true;
    } else {
        let origin = projectile.body.position;
        let mut velocity = projectile.body.velocity;

        if let Some(target) = homing_target {
            let aim = match locate(projectile, target, context) {
                Some(position) => Some(position),
                None if !retargeted => {
                    retargeted = true;
                    let replacement = nearest_target(projectile, context);
                    trace!(
                        projectile = id.get(),
                        found = replacement.is_some(),
                        "homing target lost, retargeting"
                    );
                    homing_target = replacement.map(|(id, _)| id);
                    replacement.map(|(_, position)| position)
                }
                None => {
                    homing_target = None;
                    None
                }
            };
            if let Some(aim) = aim {
                let direction = (aim - origin).normalize_or_zero();
                if direction != Vec2::ZERO {
                    velocity = direction * projectile.speed;
                }
            }
        }

        let next = origin + velocity * context.dt;
        result.delta.position = Some(next);
        result.delta.velocity = Some(velocity);

        if let Some(hit) = first_hit(projectile, origin, next, context) {
            result.actions.push(Action::DamageEntity {
                target: hit,
                source: projectile.owner,
                amount: projectile.damage,
                attack: projectile.attack,
                effect: projectile.on_hit,
            });
            result.actions.push(Action::CreateEffect {
                effect: EffectKind::Impact,
                position: next,
            });
            result.delta.mark_dead = true;
        } else if context.terrain.is_some_and(|terrain| !terrain.contains(next)) {
            result.delta.mark_dead = true;
        }
    }

    result.delta.detail = Some(DeltaDetail::Projectile {
        ttl: ttl.max(0.0),
        homing_target,
        retargeted,
    });
    result
}

/// Position of a living entity the projectile may hit.
fn locate(projectile: &Projectile, id: EntityId, context: &TickContext<'_>) -> Option<Vec2> {
    match projectile.faction {
        Faction::Friendly => context
            .enemy(id)
            .filter(|enemy| enemy.body.alive)
            .map(|enemy| enemy.body.position),
        Faction::Hostile => context.hostile_target(id).map(|(position, _)| position),
    }
}

fn nearest_target(projectile: &Projectile, context: &TickContext<'_>) -> Option<(EntityId, Vec2)> {
    let origin = projectile.body.position;
    targets(projectile, context)
        .map(|(id, position, _)| (id, position, position.distance(origin)))
        .filter(|(_, _, distance)| *distance <= RETARGET_RADIUS)
        .fold(None, |best: Option<(EntityId, Vec2, f32)>, current| {
            match best {
                Some(existing) if existing.2 < current.2 => Some(existing),
                Some(existing) if existing.2 == current.2 && existing.0 < current.0 => {
                    Some(existing)
                }
                _ => Some(current),
            }
        })
        .map(|(id, position, _)| (id, position))
}

fn first_hit(
    projectile: &Projectile,
    from: Vec2,
    to: Vec2,
    context: &TickContext<'_>,
) -> Option<EntityId> {
    targets(projectile, context)
        .filter(|(_, position, radius)| {
            segment_distance(from, to, *position) <= projectile.radius + radius
        })
        .map(|(id, _, _)| id)
        .min()
}

/// Living entities the projectile's faction may hit, with position and radius.
fn targets<'a>(
    projectile: &Projectile,
    context: &TickContext<'a>,
) -> Box<dyn Iterator<Item = (EntityId, Vec2, f32)> + 'a> {
    match projectile.faction {
        Faction::Friendly => Box::new(context.living_enemies().map(describe)),
        Faction::Hostile => Box::new(
            context
                .living_player()
                .map(describe)
                .into_iter()
                .chain(context.living_towers().map(describe)),
        ),
    }
}

fn describe<T: Embodied>(entity: &T) -> (EntityId, Vec2, f32) {
    (entity.id(), entity.position(), entity.radius())
}

fn segment_distance(from: Vec2, to: Vec2, point: Vec2) -> f32 {
    let segment = to - from;
    let length_squared = segment.length_squared();
    if length_squared <= f32::EPSILON {
        return point.distance(from);
    }
    let t = ((point - from).dot(segment) / length_squared).clamp(0.0, 1.0);
    point.distance(from + segment * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::{
        AttackProfile, AttackType, DeterministicRoll, Enemy, EnemyBehavior, EnemySpawn, Player,
        PlayerSpawn, ProjectileSpawn, RegenProfile, Terrain, Weapon,
    };

    fn projectile(faction: Faction, position: Vec2, velocity: Vec2) -> Projectile {
        Projectile::from_spawn(
            EntityId::new(20),
            ProjectileSpawn {
                owner: Some(EntityId::new(2)),
                faction,
                position,
                velocity,
                damage: 10,
                attack: AttackType::Normal,
                speed: 100.0,
                radius: 2.0,
                homing_target: None,
                ttl: 2.0,
                on_hit: None,
            },
        )
    }

    fn enemy(id: u32, position: Vec2) -> Enemy {
        Enemy::from_spawn(
            EntityId::new(id),
            EnemySpawn {
                position,
                health: 10,
                behavior: EnemyBehavior::Chaser,
                reward: 1,
                armor: 0,
                speed: 0.0,
                radius: 5.0,
                attack: AttackProfile {
                    damage: 1,
                    range: 5.0,
                    interval: 1.0,
                },
                path: Vec::new(),
                target: None,
            },
        )
    }

    fn context<'a>(
        enemies: &'a [Enemy],
        player: Option<&'a Player>,
        terrain: Option<&'a Terrain>,
    ) -> TickContext<'a> {
        TickContext {
            dt: 0.1,
            elapsed: 1.0,
            tick: 10,
            enemies,
            towers: &[],
            projectiles: &[],
            collectibles: &[],
            player,
            terrain,
            roll: DeterministicRoll::new(3),
        }
    }

    fn flight(result: &UpdateResult) -> (f32, Option<EntityId>, bool) {
        match result.delta.detail {
            Some(DeltaDetail::Projectile {
                ttl,
                homing_target,
                retargeted,
            }) => (ttl, homing_target, retargeted),
            ref other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn hit_emits_single_damage_and_dies() {
        let subject = projectile(Faction::Friendly, Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0));
        let enemies = [enemy(3, Vec2::new(12.0, 0.0)), enemy(4, Vec2::new(11.0, 0.0))];

        let result = update_projectile(&subject, &context(&enemies, None, None));

        let damage: Vec<_> = result
            .actions
            .iter()
            .filter(|action| matches!(action, Action::DamageEntity { .. }))
            .collect();
        assert_eq!(
            damage,
            vec![&Action::DamageEntity {
                target: EntityId::new(3),
                source: Some(EntityId::new(2)),
                amount: 10,
                attack: AttackType::Normal,
                effect: None,
            }]
        );
        assert!(result.delta.mark_dead);
    }

    #[test]
    fn fast_projectile_does_not_tunnel() {
        let subject = projectile(Faction::Friendly, Vec2::ZERO, Vec2::new(1_000.0, 0.0));
        let enemies = [enemy(3, Vec2::new(50.0, 0.0))];

        let result = update_projectile(&subject, &context(&enemies, None, None));

        assert!(result.delta.mark_dead);
        assert_eq!(result.actions.len(), 2);
    }

    #[test]
    fn expired_projectile_dies_without_hitting() {
        let mut subject = projectile(Faction::Friendly, Vec2::ZERO, Vec2::new(100.0, 0.0));
        subject.ttl = 0.05;
        let enemies = [enemy(3, Vec2::new(5.0, 0.0))];

        let result = update_projectile(&subject, &context(&enemies, None, None));

        assert!(result.delta.mark_dead);
        assert!(result.actions.is_empty());
    }

    #[test]
    fn homing_reaims_at_living_target() {
        let mut subject = projectile(Faction::Friendly, Vec2::ZERO, Vec2::new(100.0, 0.0));
        subject.homing_target = Some(EntityId::new(3));
        let enemies = [enemy(3, Vec2::new(0.0, 100.0))];

        let result = update_projectile(&subject, &context(&enemies, None, None));

        assert_eq!(result.delta.velocity, Some(Vec2::new(0.0, 100.0)));
        assert_eq!(result.delta.position, Some(Vec2::new(0.0, 10.0)));
    }

    #[test]
    fn lost_target_retargets_once_within_radius() {
        let mut subject = projectile(Faction::Friendly, Vec2::ZERO, Vec2::new(100.0, 0.0));
        subject.homing_target = Some(EntityId::new(3));
        let mut dead = enemy(3, Vec2::new(40.0, 0.0));
        dead.body.alive = false;
        let enemies = [dead, enemy(5, Vec2::new(0.0, -90.0)), enemy(6, Vec2::new(0.0, 160.0))];

        let result = update_projectile(&subject, &context(&enemies, None, None));

        assert_eq!(flight(&result).1, Some(EntityId::new(5)));
        assert!(flight(&result).2);
        assert_eq!(result.delta.velocity, Some(Vec2::new(0.0, -100.0)));
    }

    #[test]
    fn failed_retarget_keeps_last_velocity() {
        let mut subject = projectile(Faction::Friendly, Vec2::ZERO, Vec2::new(100.0, 0.0));
        subject.homing_target = Some(EntityId::new(3));
        let enemies = [enemy(6, Vec2::new(0.0, 160.0))];

        let result = update_projectile(&subject, &context(&enemies, None, None));

        assert_eq!(flight(&result), (1.9, None, true));
        assert_eq!(result.delta.velocity, Some(Vec2::new(100.0, 0.0)));
    }

    #[test]
    fn retarget_search_happens_only_once() {
        let mut subject = projectile(Faction::Friendly, Vec2::ZERO, Vec2::new(100.0, 0.0));
        subject.homing_target = Some(EntityId::new(3));
        subject.retargeted = true;
        let enemies = [enemy(5, Vec2::new(0.0, 90.0))];

        let result = update_projectile(&subject, &context(&enemies, None, None));

        assert_eq!(flight(&result).1, None);
        assert_eq!(result.delta.velocity, Some(Vec2::new(100.0, 0.0)));
    }

    #[test]
    fn leaving_terrain_bounds_kills_projectile() {
        let terrain = Terrain::open(2, 2, 10.0);
        let subject = projectile(Faction::Friendly, Vec2::new(15.0, 15.0), Vec2::new(100.0, 0.0));

        let result = update_projectile(&subject, &context(&[], None, Some(&terrain)));

        assert!(result.delta.mark_dead);
        assert!(result.actions.is_empty());
    }

    #[test]
    fn hostile_projectile_hits_player_not_enemies() {
        let player = Player::from_spawn(
            EntityId::new(1),
            PlayerSpawn {
                position: Vec2::new(20.0, 0.0),
                health: 50,
                speed: 50.0,
                armor: 0,
                weapon: Weapon {
                    damage: 1,
                    fire_rate: 1.0,
                    projectile_speed: 100.0,
                    auto_range: 10.0,
                },
                regen: RegenProfile {
                    amount: 0,
                    interval: 1.0,
                },
                pickup_radius: 5.0,
                progression: None,
            },
        );
        let subject = projectile(Faction::Hostile, Vec2::ZERO, Vec2::new(100.0, 0.0));
        let enemies = [enemy(3, Vec2::new(5.0, 0.0))];

        let result = update_projectile(&subject, &context(&enemies, Some(&player), None));

        assert!(matches!(
            result.actions.first(),
            Some(Action::DamageEntity { target, .. }) if *target == EntityId::new(1)
        ));
    }
}
