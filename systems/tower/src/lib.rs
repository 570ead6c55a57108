#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure tower update that selects a target and fires homing projectiles.

use rampart_core::{
    Action, AttackType, Enemy, EntityId, Faction, ProjectileSpawn, SoundCue, TargetingStrategy,
    TickContext, Tower, UpdateResult,
};
use tracing::trace;

/// Seconds a tower projectile stays in flight before expiring.
pub const TOWER_PROJECTILE_TTL: f32 = 2.0;

const TOWER_PROJECTILE_RADIUS: f32 = 4.0;
const CRIT_SALT: u64 = 0x7a11;

/// Computes the tower's changes for this tick.
#[must_use]
pub fn update_tower(tower: &Tower, context: &TickContext<'_>) -> UpdateResult {
    let id = tower.body.id;
    if !tower.body.alive {
        return UpdateResult::noop(id);
    }

    let mut result = UpdateResult::noop(id);
    let target = select_target(tower, context.living_enemies());
    let selected = target.map(|enemy| enemy.body.id);
    if selected != tower.target {
        result.delta.target = Some(selected);
    }

    match target {
        Some(enemy) if tower.cooldown <= 0.0 => {
            fire(tower, enemy, context, &mut result.actions);
            result.delta.cooldown = Some(tower.fire_interval());
        }
        _ if tower.cooldown > 0.0 => {
            result.delta.cooldown = Some((tower.cooldown - context.dt).max(0.0));
        }
        _ => {}
    }

    result
}

/// Picks the enemy the tower should shoot among `enemies` by its strategy.
///
/// Only enemies within range are considered; ties go to the lower identifier.
pub fn select_target<'a>(
    tower: &Tower,
    enemies: impl Iterator<Item = &'a Enemy>,
) -> Option<&'a Enemy> {
    let origin = tower.body.position;
    let range = tower.range();
    let mut best: Option<Candidate<'a>> = None;

    for enemy in enemies {
        let distance = origin.distance(enemy.body.position);
        if distance > range + enemy.radius {
            continue;
        }
        let current = Candidate { enemy, distance };
        match &mut best {
            Some(existing) => {
                if current.precedes(existing, tower.strategy) {
                    *existing = current;
                }
            }
            None => best = Some(current),
        }
    }

    best.map(|candidate| candidate.enemy)
}

#[derive(Clone, Copy, Debug)]
struct Candidate<'a> {
    enemy: &'a Enemy,
    distance: f32,
}

impl Candidate<'_> {
    fn precedes(&self, other: &Self, strategy: TargetingStrategy) -> bool {
        let ordering = match strategy {
            TargetingStrategy::Closest => other.distance.total_cmp(&self.distance),
            TargetingStrategy::First => {
                let (index, progress) = self.enemy.path_progress();
                let (other_index, other_progress) = other.enemy.path_progress();
                index
                    .cmp(&other_index)
                    .then(progress.total_cmp(&other_progress))
            }
            TargetingStrategy::Strongest => {
                self.enemy.body.health.cmp(&other.enemy.body.health)
            }
        };
        ordering.is_gt() || (ordering.is_eq() && self.id() < other.id())
    }

    fn id(&self) -> EntityId {
        self.enemy.body.id
    }
}

fn fire(tower: &Tower, enemy: &Enemy, context: &TickContext<'_>, actions: &mut Vec<Action>) {
    let origin = tower.body.position;
    let speed = tower.kind.projectile_speed();
    let direction = (enemy.body.position - origin).normalize_or_zero();
    let roll = context.roll.unit(context.tick, tower.body.id, CRIT_SALT);
    let critical = roll < tower.kind.crit_chance();
    let attack = if critical {
        AttackType::Critical
    } else {
        tower.kind.attack_type()
    };

    trace!(
        tower = tower.body.id.get(),
        enemy = enemy.body.id.get(),
        critical,
        "tower fired"
    );
    actions.push(Action::SpawnProjectile(ProjectileSpawn {
        owner: Some(tower.body.id),
        faction: Faction::Friendly,
        position: origin,
        velocity: direction * speed,
        damage: tower.damage(),
        attack,
        speed,
        radius: TOWER_PROJECTILE_RADIUS,
        homing_target: Some(enemy.body.id),
        ttl: TOWER_PROJECTILE_TTL,
        on_hit: tower.kind.on_hit(),
    }));
    actions.push(Action::PlaySound {
        cue: SoundCue::TowerFire,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::{
        AttackProfile, DeterministicRoll, EnemyBehavior, EnemySpawn, StatusEffect, TowerKind,
        TowerSpawn, TowerUpgrades, Vec2,
    };

    fn tower(kind: TowerKind, strategy: TargetingStrategy) -> Tower {
        Tower::from_spawn(
            EntityId::new(1),
            TowerSpawn {
                kind,
                strategy,
                position: Vec2::ZERO,
                armor: 0,
                upgrades: TowerUpgrades::default(),
            },
        )
    }

    fn enemy(id: u32, position: Vec2, health: u32) -> Enemy {
        Enemy::from_spawn(
            EntityId::new(id),
            EnemySpawn {
                position,
                health,
                behavior: EnemyBehavior::PathFollower,
                reward: 1,
                armor: 0,
                speed: 10.0,
                radius: 5.0,
                attack: AttackProfile {
                    damage: 1,
                    range: 5.0,
                    interval: 1.0,
                },
                path: vec![Vec2::new(500.0, 0.0)],
                target: None,
            },
        )
    }

    fn context(enemies: &[Enemy]) -> TickContext<'_> {
        TickContext {
            dt: 0.1,
            elapsed: 1.0,
            tick: 10,
            enemies,
            towers: &[],
            projectiles: &[],
            collectibles: &[],
            player: None,
            terrain: None,
            roll: DeterministicRoll::new(99),
        }
    }

    fn spawned(result: &UpdateResult) -> Vec<ProjectileSpawn> {
        result
            .actions
            .iter()
            .filter_map(|action| match action {
                Action::SpawnProjectile(spawn) => Some(*spawn),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn ready_tower_fires_exactly_once() {
        let subject = tower(TowerKind::Cannon, TargetingStrategy::Closest);
        let enemies = [enemy(5, Vec2::new(50.0, 0.0), 30)];

        let result = update_tower(&subject, &context(&enemies));

        let shots = spawned(&result);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].homing_target, Some(EntityId::new(5)));
        assert_eq!(shots[0].attack, AttackType::True);
        assert_eq!(shots[0].velocity, Vec2::new(300.0, 0.0));
        assert_eq!(result.delta.cooldown, Some(subject.fire_interval()));
        assert_eq!(result.delta.target, Some(Some(EntityId::new(5))));
        assert!(result.actions.contains(&Action::PlaySound {
            cue: SoundCue::TowerFire,
        }));
    }

    #[test]
    fn cooling_tower_never_fires() {
        let mut subject = tower(TowerKind::Basic, TargetingStrategy::Closest);
        subject.cooldown = 0.05;
        let enemies = [enemy(5, Vec2::new(50.0, 0.0), 30)];

        let result = update_tower(&subject, &context(&enemies));

        assert!(spawned(&result).is_empty());
        assert_eq!(result.delta.cooldown, Some(0.0));
    }

    #[test]
    fn idle_tower_without_targets_changes_nothing() {
        let subject = tower(TowerKind::Basic, TargetingStrategy::Closest);
        let enemies = [enemy(5, Vec2::new(900.0, 0.0), 30)];

        let result = update_tower(&subject, &context(&enemies));

        assert!(result.is_noop());
    }

    #[test]
    fn dead_enemies_are_never_targeted() {
        let subject = tower(TowerKind::Basic, TargetingStrategy::Closest);
        let mut corpse = enemy(5, Vec2::new(10.0, 0.0), 30);
        corpse.body.alive = false;
        let enemies = [corpse, enemy(6, Vec2::new(80.0, 0.0), 30)];

        let result = update_tower(&subject, &context(&enemies));

        assert_eq!(result.delta.target, Some(Some(EntityId::new(6))));
    }

    #[test]
    fn strategies_choose_expected_enemy() {
        let enemies = [
            enemy(3, Vec2::new(30.0, 0.0), 10),
            enemy(4, Vec2::new(120.0, 0.0), 80),
            enemy(7, Vec2::new(60.0, 0.0), 40),
        ];
        let context = context(&enemies);
        let pick = |strategy| {
            select_target(&tower(TowerKind::Basic, strategy), context.living_enemies())
                .map(|enemy| enemy.body.id)
        };

        assert_eq!(pick(TargetingStrategy::Closest), Some(EntityId::new(3)));
        assert_eq!(pick(TargetingStrategy::First), Some(EntityId::new(4)));
        assert_eq!(pick(TargetingStrategy::Strongest), Some(EntityId::new(4)));
    }

    #[test]
    fn ties_prefer_lower_identifier() {
        let enemies = [
            enemy(2, Vec2::new(0.0, 40.0), 50),
            enemy(9, Vec2::new(40.0, 0.0), 50),
        ];
        let context = context(&enemies);
        for strategy in [TargetingStrategy::Closest, TargetingStrategy::Strongest] {
            let chosen =
                select_target(&tower(TowerKind::Basic, strategy), context.living_enemies());
            assert_eq!(chosen.map(|enemy| enemy.body.id), Some(EntityId::new(2)));
        }
    }

    #[test]
    fn frost_shots_carry_slow() {
        let subject = tower(TowerKind::Frost, TargetingStrategy::Closest);
        let enemies = [enemy(5, Vec2::new(50.0, 0.0), 30)];

        let shots = spawned(&update_tower(&subject, &context(&enemies)));

        assert!(matches!(shots[0].on_hit, Some(StatusEffect::Slow { .. })));
    }

    #[test]
    fn critical_rolls_are_reproducible() {
        let subject = tower(TowerKind::Sniper, TargetingStrategy::Closest);
        let enemies = [enemy(5, Vec2::new(50.0, 0.0), 30)];

        let first = update_tower(&subject, &context(&enemies));
        let second = update_tower(&subject, &context(&enemies));

        assert_eq!(first, second);
        assert!(matches!(
            spawned(&first)[0].attack,
            AttackType::Normal | AttackType::Critical
        ));
    }
}
