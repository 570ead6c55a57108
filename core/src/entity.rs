//! Entity variants owned by the repository and borrowed by update systems.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{AttackType, EntityId};

/// State shared by every entity variant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Identifier allocated by the repository.
    pub id: EntityId,
    /// World position in world units.
    pub position: Vec2,
    /// Velocity in world units per second.
    pub velocity: Vec2,
    /// Current health.
    pub health: u32,
    /// Maximum health heals are clamped to.
    pub max_health: u32,
    /// Liveness flag; flips to `false` exactly once and drives removal.
    pub alive: bool,
}

impl Body {
    /// Creates a living, motionless body at full health.
    #[must_use]
    pub const fn new(id: EntityId, position: Vec2, max_health: u32) -> Self {
        Self {
            id,
            position,
            velocity: Vec2::ZERO,
            health: max_health,
            max_health,
            alive: true,
        }
    }
}

/// Read access to the body and collision radius of any entity variant.
pub trait Embodied {
    /// Shared body state.
    fn body(&self) -> &Body;

    /// Collision radius in world units.
    fn radius(&self) -> f32;

    /// Identifier of the entity.
    fn id(&self) -> EntityId {
        self.body().id
    }

    /// Current world position.
    fn position(&self) -> Vec2 {
        self.body().position
    }

    /// Reports whether the entity is still alive.
    fn is_alive(&self) -> bool {
        self.body().alive
    }
}

/// Movement and targeting behaviour of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyBehavior {
    /// Walks its waypoint path and strikes whatever it targets along the way.
    PathFollower,
    /// Walks straight toward its target and strikes in melee.
    Chaser,
    /// Approaches its target until in range, then fires hostile projectiles.
    Ranged,
}

/// Attack parameters of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackProfile {
    /// Raw damage per attack.
    pub damage: u32,
    /// Reach measured between collision edges, in world units.
    pub range: f32,
    /// Seconds between attacks.
    pub interval: f32,
}

/// Status effect delivered by a projectile hit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum StatusEffect {
    /// Multiplies movement speed by `factor` for `duration` seconds.
    Slow {
        /// Speed multiplier in `0.0..=1.0`.
        factor: f32,
        /// Seconds the slow lasts.
        duration: f32,
    },
    /// Prevents movement and attacks for `duration` seconds.
    Stun {
        /// Seconds the stun lasts.
        duration: f32,
    },
}

/// Active status timers on an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    /// Speed multiplier while slowed.
    pub slow_factor: f32,
    /// Seconds of slow remaining.
    pub slow_remaining: f32,
    /// Seconds of stun remaining.
    pub stun_remaining: f32,
}

impl Default for StatusEffects {
    fn default() -> Self {
        Self {
            slow_factor: 1.0,
            slow_remaining: 0.0,
            stun_remaining: 0.0,
        }
    }
}

impl StatusEffects {
    /// Applies a new effect, keeping the stronger slow and the longer timers.
    pub fn apply(&mut self, effect: StatusEffect) {
        match effect {
            StatusEffect::Slow { factor, duration } => {
                let factor = factor.clamp(0.0, 1.0);
                if self.slow_remaining <= 0.0 || factor < self.slow_factor {
                    self.slow_factor = factor;
                }
                self.slow_remaining = self.slow_remaining.max(duration);
            }
            StatusEffect::Stun { duration } => {
                self.stun_remaining = self.stun_remaining.max(duration);
            }
        }
    }

    /// Reports whether the enemy is currently stunned.
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.stun_remaining > 0.0
    }

    /// Speed multiplier contributed by active effects.
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        if self.slow_remaining > 0.0 {
            self.slow_factor
        } else {
            1.0
        }
    }

    /// Returns the timers advanced by `dt` seconds.
    #[must_use]
    pub fn advanced(self, dt: f32) -> Self {
        let slow_remaining = (self.slow_remaining - dt).max(0.0);
        Self {
            slow_factor: if slow_remaining > 0.0 {
                self.slow_factor
            } else {
                1.0
            },
            slow_remaining,
            stun_remaining: (self.stun_remaining - dt).max(0.0),
        }
    }
}

/// Consecutive movement failures observed for an enemy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StallTracker {
    /// Number of consecutive ticks in which the next step was blocked.
    pub blocked_ticks: u32,
}

/// Hostile unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    /// Shared body state.
    pub body: Body,
    /// Movement and targeting behaviour.
    pub behavior: EnemyBehavior,
    /// Reward value granted when the enemy is killed.
    pub reward: u32,
    /// Armor rating reducing physical damage.
    pub armor: u32,
    /// Base movement speed in world units per second.
    pub speed: f32,
    /// Collision radius in world units.
    pub radius: f32,
    /// Attack parameters.
    pub attack: AttackProfile,
    /// Seconds until the next attack is allowed.
    pub attack_cooldown: f32,
    /// Entity the enemy attacks; defaults to the player.
    pub target: Option<EntityId>,
    /// Waypoints walked by path followers.
    pub path: Vec<Vec2>,
    /// Index of the next waypoint in `path`.
    pub path_index: usize,
    /// Active status timers.
    pub status: StatusEffects,
    /// Consecutive movement failures.
    pub stall: StallTracker,
}

impl Enemy {
    /// Materialises an enemy from its spawn description.
    #[must_use]
    pub fn from_spawn(id: EntityId, spawn: EnemySpawn) -> Self {
        Self {
            body: Body::new(id, spawn.position, spawn.health),
            behavior: spawn.behavior,
            reward: spawn.reward,
            armor: spawn.armor,
            speed: spawn.speed,
            radius: spawn.radius,
            attack: spawn.attack,
            attack_cooldown: 0.0,
            target: spawn.target,
            path: spawn.path,
            path_index: 0,
            status: StatusEffects::default(),
            stall: StallTracker::default(),
        }
    }

    /// Fraction of the path already walked, used by "first" targeting.
    #[must_use]
    pub fn path_progress(&self) -> (usize, f32) {
        let remaining = self
            .path
            .get(self.path_index)
            .map_or(0.0, |waypoint| waypoint.distance(self.body.position));
        (self.path_index, -remaining)
    }
}

impl Embodied for Enemy {
    fn body(&self) -> &Body {
        &self.body
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

/// Description of an enemy requested by a wave or spawn-zone controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    /// Initial position.
    pub position: Vec2,
    /// Initial and maximum health.
    pub health: u32,
    /// Movement and targeting behaviour.
    pub behavior: EnemyBehavior,
    /// Reward value granted when killed.
    pub reward: u32,
    /// Armor rating.
    pub armor: u32,
    /// Base movement speed.
    pub speed: f32,
    /// Collision radius.
    pub radius: f32,
    /// Attack parameters.
    pub attack: AttackProfile,
    /// Waypoints for path followers.
    pub path: Vec<Vec2>,
    /// Explicit target; the orchestrator defaults it to the player when absent.
    pub target: Option<EntityId>,
}

/// Kinds of tower that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerKind {
    /// Balanced all-rounder.
    Basic,
    /// Long range, slow, hard-hitting, high crit chance.
    Sniper,
    /// Short range, heavy shells that pierce armor.
    Cannon,
    /// Light damage that slows its victims.
    Frost,
}

impl TowerKind {
    /// Targeting range before upgrades, in world units.
    #[must_use]
    pub const fn base_range(self) -> f32 {
        match self {
            Self::Basic => 160.0,
            Self::Sniper => 320.0,
            Self::Cannon => 120.0,
            Self::Frost => 140.0,
        }
    }

    /// Damage per projectile before upgrades.
    #[must_use]
    pub const fn base_damage(self) -> u32 {
        match self {
            Self::Basic => 10,
            Self::Sniper => 40,
            Self::Cannon => 25,
            Self::Frost => 4,
        }
    }

    /// Shots per second before upgrades.
    #[must_use]
    pub const fn base_fire_rate(self) -> f32 {
        match self {
            Self::Basic => 2.0,
            Self::Sniper => 0.5,
            Self::Cannon => 0.8,
            Self::Frost => 1.5,
        }
    }

    /// Projectile travel speed in world units per second.
    #[must_use]
    pub const fn projectile_speed(self) -> f32 {
        match self {
            Self::Basic => 420.0,
            Self::Sniper => 900.0,
            Self::Cannon => 300.0,
            Self::Frost => 380.0,
        }
    }

    /// Probability in `0.0..=1.0` that a shot is critical.
    #[must_use]
    pub const fn crit_chance(self) -> f32 {
        match self {
            Self::Sniper => 0.25,
            Self::Basic => 0.05,
            Self::Cannon | Self::Frost => 0.0,
        }
    }

    /// Attack type of a regular, non-critical shot.
    #[must_use]
    pub const fn attack_type(self) -> AttackType {
        match self {
            Self::Cannon => AttackType::True,
            Self::Basic | Self::Sniper | Self::Frost => AttackType::Normal,
        }
    }

    /// Status effect carried by the tower's projectiles.
    #[must_use]
    pub const fn on_hit(self) -> Option<StatusEffect> {
        match self {
            Self::Frost => Some(StatusEffect::Slow {
                factor: 0.5,
                duration: 1.5,
            }),
            Self::Basic | Self::Sniper | Self::Cannon => None,
        }
    }

    /// Structural health of a freshly built tower.
    #[must_use]
    pub const fn max_health(self) -> u32 {
        match self {
            Self::Basic | Self::Frost => 100,
            Self::Sniper => 70,
            Self::Cannon => 150,
        }
    }
}

/// Strategy a tower uses to pick its target among enemies in range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetingStrategy {
    /// Nearest enemy.
    #[default]
    Closest,
    /// Enemy furthest along its path.
    First,
    /// Enemy with the most health.
    Strongest,
}

/// Upgrade levels purchased for a tower.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TowerUpgrades {
    /// Damage upgrade level; each level adds 25% damage.
    pub damage: u8,
    /// Range upgrade level; each level adds 10% range.
    pub range: u8,
    /// Fire-rate upgrade level; each level adds 15% fire rate.
    pub rate: u8,
}

/// Stationary defensive structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tower {
    /// Shared body state.
    pub body: Body,
    /// Kind of tower.
    pub kind: TowerKind,
    /// Target selection strategy.
    pub strategy: TargetingStrategy,
    /// Armor rating reducing physical damage.
    pub armor: u32,
    /// Collision radius in world units.
    pub radius: f32,
    /// Seconds until the tower may fire again.
    pub cooldown: f32,
    /// Enemy selected on the previous tick.
    pub target: Option<EntityId>,
    /// Purchased upgrade levels.
    pub upgrades: TowerUpgrades,
}

impl Tower {
    /// Materialises a tower from its spawn description.
    #[must_use]
    pub fn from_spawn(id: EntityId, spawn: TowerSpawn) -> Self {
        Self {
            body: Body::new(id, spawn.position, spawn.kind.max_health()),
            kind: spawn.kind,
            strategy: spawn.strategy,
            armor: spawn.armor,
            radius: 16.0,
            cooldown: 0.0,
            target: None,
            upgrades: spawn.upgrades,
        }
    }

    /// Targeting range including upgrades.
    #[must_use]
    pub fn range(&self) -> f32 {
        self.kind.base_range() * (1.0 + 0.1 * f32::from(self.upgrades.range))
    }

    /// Damage per projectile including upgrades.
    #[must_use]
    pub fn damage(&self) -> u32 {
        let scale = 1.0 + 0.25 * f32::from(self.upgrades.damage);
        (self.kind.base_damage() as f32 * scale).round() as u32
    }

    /// Seconds between shots including upgrades.
    #[must_use]
    pub fn fire_interval(&self) -> f32 {
        let rate = self.kind.base_fire_rate() * (1.0 + 0.15 * f32::from(self.upgrades.rate));
        1.0 / rate
    }
}

impl Embodied for Tower {
    fn body(&self) -> &Body {
        &self.body
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

/// Description of a tower to construct.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerSpawn {
    /// Kind of tower.
    pub kind: TowerKind,
    /// Target selection strategy.
    pub strategy: TargetingStrategy,
    /// World position.
    pub position: Vec2,
    /// Armor rating.
    pub armor: u32,
    /// Purchased upgrade levels.
    pub upgrades: TowerUpgrades,
}

/// Player weapon parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    /// Raw damage per projectile.
    pub damage: u32,
    /// Shots per second.
    pub fire_rate: f32,
    /// Projectile speed in world units per second.
    pub projectile_speed: f32,
    /// Radius within which automatic fire acquires enemies.
    pub auto_range: f32,
}

/// Passive health regeneration parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegenProfile {
    /// Health restored per pulse.
    pub amount: u32,
    /// Seconds between pulses.
    pub interval: f32,
}

/// Experience capability of a player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    /// Accumulated experience.
    pub experience: u32,
    /// Current level, starting at 1.
    pub level: u32,
}

impl Progression {
    /// Experience required per level.
    pub const EXPERIENCE_PER_LEVEL: u32 = 100;

    /// Creates a level-one progression with no experience.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            experience: 0,
            level: 1,
        }
    }

    /// Adds experience and recomputes the level.
    pub fn gain(&mut self, amount: u32) {
        self.experience = self.experience.saturating_add(amount);
        self.level = 1 + self.experience / Self::EXPERIENCE_PER_LEVEL;
    }
}

/// The player-controlled avatar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Shared body state.
    pub body: Body,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Armor rating reducing physical damage.
    pub armor: u32,
    /// Collision radius in world units.
    pub radius: f32,
    /// Weapon parameters.
    pub weapon: Weapon,
    /// Seconds until the weapon may fire again.
    pub fire_cooldown: f32,
    /// Passive regeneration parameters.
    pub regen: RegenProfile,
    /// Seconds until the next regeneration pulse.
    pub regen_cooldown: f32,
    /// Radius within which collectibles are picked up.
    pub pickup_radius: f32,
    /// Position the player respawns at after losing a life.
    pub spawn_point: Vec2,
    /// Experience capability, absent for players that cannot level up.
    pub progression: Option<Progression>,
}

impl Player {
    /// Materialises a player from its spawn description.
    #[must_use]
    pub fn from_spawn(id: EntityId, spawn: PlayerSpawn) -> Self {
        Self {
            body: Body::new(id, spawn.position, spawn.health),
            speed: spawn.speed,
            armor: spawn.armor,
            radius: 10.0,
            weapon: spawn.weapon,
            fire_cooldown: 0.0,
            regen: spawn.regen,
            regen_cooldown: spawn.regen.interval,
            pickup_radius: spawn.pickup_radius,
            spawn_point: spawn.position,
            progression: spawn.progression,
        }
    }
}

impl Embodied for Player {
    fn body(&self) -> &Body {
        &self.body
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

/// Description of the player avatar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSpawn {
    /// Spawn and respawn position.
    pub position: Vec2,
    /// Initial and maximum health.
    pub health: u32,
    /// Movement speed.
    pub speed: f32,
    /// Armor rating.
    pub armor: u32,
    /// Weapon parameters.
    pub weapon: Weapon,
    /// Passive regeneration parameters.
    pub regen: RegenProfile,
    /// Collectible pickup radius.
    pub pickup_radius: f32,
    /// Experience capability.
    pub progression: Option<Progression>,
}

/// Side a projectile fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Fired by towers or the player; hits enemies.
    Friendly,
    /// Fired by enemies; hits the player and towers.
    Hostile,
}

/// In-flight projectile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Shared body state.
    pub body: Body,
    /// Entity that fired the projectile.
    pub owner: Option<EntityId>,
    /// Side the projectile fights for.
    pub faction: Faction,
    /// Raw damage dealt on hit.
    pub damage: u32,
    /// Attack classification of the hit.
    pub attack: AttackType,
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Collision radius in world units.
    pub radius: f32,
    /// Target the projectile homes toward.
    pub homing_target: Option<EntityId>,
    /// Set once the projectile used its single retarget search.
    pub retargeted: bool,
    /// Seconds of flight remaining.
    pub ttl: f32,
    /// Status effect applied on hit.
    pub on_hit: Option<StatusEffect>,
}

impl Projectile {
    /// Materialises a projectile from its spawn description.
    #[must_use]
    pub fn from_spawn(id: EntityId, spawn: ProjectileSpawn) -> Self {
        let mut body = Body::new(id, spawn.position, 1);
        body.velocity = spawn.velocity;
        Self {
            body,
            owner: spawn.owner,
            faction: spawn.faction,
            damage: spawn.damage,
            attack: spawn.attack,
            speed: spawn.speed,
            radius: spawn.radius,
            homing_target: spawn.homing_target,
            retargeted: false,
            ttl: spawn.ttl,
            on_hit: spawn.on_hit,
        }
    }
}

impl Embodied for Projectile {
    fn body(&self) -> &Body {
        &self.body
    }

    fn radius(&self) -> f32 {
        self.radius
    }
}

/// Parameters of a projectile requested through [`crate::Action::SpawnProjectile`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpawn {
    /// Entity firing the projectile.
    pub owner: Option<EntityId>,
    /// Side the projectile fights for.
    pub faction: Faction,
    /// Launch position.
    pub position: Vec2,
    /// Launch velocity.
    pub velocity: Vec2,
    /// Raw damage dealt on hit.
    pub damage: u32,
    /// Attack classification.
    pub attack: AttackType,
    /// Travel speed.
    pub speed: f32,
    /// Collision radius.
    pub radius: f32,
    /// Target to home toward.
    pub homing_target: Option<EntityId>,
    /// Seconds of flight.
    pub ttl: f32,
    /// Status effect applied on hit.
    pub on_hit: Option<StatusEffect>,
}

/// Reward granted when a collectible is picked up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectibleReward {
    /// Adds currency to the session economy.
    Currency(u32),
    /// Restores health to the collector.
    Health(u32),
}

/// Pickup dropped by a defeated enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    /// Shared body state.
    pub body: Body,
    /// Reward granted on pickup.
    pub reward: CollectibleReward,
    /// Seconds before the collectible disappears.
    pub ttl: f32,
}

impl Collectible {
    /// Materialises a collectible from its spawn description.
    #[must_use]
    pub fn from_spawn(id: EntityId, spawn: CollectibleSpawn) -> Self {
        Self {
            body: Body::new(id, spawn.position, 1),
            reward: spawn.reward,
            ttl: spawn.ttl,
        }
    }
}

impl Embodied for Collectible {
    fn body(&self) -> &Body {
        &self.body
    }

    fn radius(&self) -> f32 {
        6.0
    }
}

/// Parameters of a collectible requested through [`crate::Action::SpawnCollectible`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectibleSpawn {
    /// Drop position.
    pub position: Vec2,
    /// Reward granted on pickup.
    pub reward: CollectibleReward,
    /// Seconds before the collectible disappears.
    pub ttl: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stronger_slow_replaces_weaker_one() {
        let mut status = StatusEffects::default();
        status.apply(StatusEffect::Slow {
            factor: 0.8,
            duration: 1.0,
        });
        status.apply(StatusEffect::Slow {
            factor: 0.5,
            duration: 0.5,
        });
        assert!((status.speed_multiplier() - 0.5).abs() < f32::EPSILON);
        assert!((status.slow_remaining - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn expired_slow_restores_full_speed() {
        let mut status = StatusEffects::default();
        status.apply(StatusEffect::Slow {
            factor: 0.5,
            duration: 0.2,
        });
        let status = status.advanced(0.5);
        assert!((status.speed_multiplier() - 1.0).abs() < f32::EPSILON);
        assert_eq!(status.slow_remaining, 0.0);
    }

    #[test]
    fn tower_upgrades_scale_stats() {
        let mut tower = Tower::from_spawn(
            EntityId::new(1),
            TowerSpawn {
                kind: TowerKind::Basic,
                strategy: TargetingStrategy::Closest,
                position: Vec2::ZERO,
                armor: 0,
                upgrades: TowerUpgrades::default(),
            },
        );
        assert_eq!(tower.damage(), 10);
        assert!((tower.fire_interval() - 0.5).abs() < 1e-6);

        tower.upgrades = TowerUpgrades {
            damage: 2,
            range: 1,
            rate: 0,
        };
        assert_eq!(tower.damage(), 15);
        assert!((tower.range() - 176.0).abs() < 1e-3);
    }

    #[test]
    fn progression_levels_every_hundred_experience() {
        let mut progression = Progression::new();
        progression.gain(99);
        assert_eq!(progression.level, 1);
        progression.gain(1);
        assert_eq!(progression.level, 2);
        progression.gain(250);
        assert_eq!(progression.experience, 350);
        assert_eq!(progression.level, 4);
    }
}
