#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rampart simulation.
//!
//! This crate defines the message surface that connects the tick
//! orchestrator, the authoritative entity repository, and the pure per-kind
//! update systems. Update systems read an immutable [`TickContext`] and
//! respond exclusively with an [`UpdateResult`]: an [`EntityDelta`] for the
//! entity itself plus a list of [`Action`] values. The action processor
//! applies those actions to the repository and broadcasts [`Event`] values for
//! external sinks (audio, effects, economy presentation) to react to.

mod context;
mod controller;
mod delta;
mod entity;
mod roll;
mod terrain;

use serde::{Deserialize, Serialize};

pub use context::{GameStateSnapshot, InputState, TickContext};
pub use controller::{SpawnZoneController, WaveController};
pub use delta::{DeltaDetail, EntityDelta, UpdateResult};
pub use entity::{
    AttackProfile, Body, Collectible, CollectibleReward, CollectibleSpawn, Embodied, Enemy,
    EnemyBehavior, EnemySpawn, Faction, Player, PlayerSpawn, Progression, Projectile, ProjectileSpawn,
    RegenProfile, StallTracker, StatusEffect, StatusEffects, TargetingStrategy, Tower, TowerKind,
    TowerSpawn, TowerUpgrades, Weapon,
};
pub use glam::Vec2;
pub use roll::DeterministicRoll;
pub use terrain::{Terrain, TerrainKind};

/// Unique identifier assigned to any entity by the repository.
///
/// All entity kinds share one identifier space so actions can target an id
/// without knowing which kind it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Discriminates the entity variants stored by the repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Hostile unit advancing on the player or along a path.
    Enemy,
    /// Stationary defensive structure.
    Tower,
    /// The player-controlled avatar.
    Player,
    /// In-flight projectile.
    Projectile,
    /// Pickup dropped by a defeated enemy.
    Collectible,
}

/// Classification of an attack as seen by the combat resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttackType {
    /// Physical damage reduced by armor.
    #[default]
    Normal,
    /// Physical damage with the critical multiplier applied before armor.
    Critical,
    /// Damage that bypasses armor entirely.
    True,
}

/// Audio cue requested from the external sound sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// A tower fired a projectile.
    TowerFire,
    /// The player fired a projectile.
    PlayerFire,
    /// An enemy landed a melee hit.
    EnemyStrike,
    /// An enemy died.
    EnemyDeath,
    /// A tower was destroyed.
    TowerDestroyed,
    /// The player lost a life.
    PlayerHurt,
    /// A collectible was picked up.
    Pickup,
}

/// Visual effect requested from the external effect sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Small spark at a projectile impact site.
    Impact,
    /// Burst emitted when an enemy dies.
    EnemyBurst,
    /// Debris left behind by a destroyed tower.
    Debris,
    /// Flash when a collectible is picked up.
    Sparkle,
    /// Dust kicked up when an enemy is nudged off a stuck position.
    Dust,
}

/// Requested side effect or store mutation produced by an update system.
///
/// Actions are plain data: they carry identifiers, never references, so they
/// can be applied after every update system has run for the tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Applies damage to the entity with the provided identifier.
    DamageEntity {
        /// Entity receiving the damage.
        target: EntityId,
        /// Entity responsible for the damage, if known.
        source: Option<EntityId>,
        /// Raw damage before armor and critical scaling.
        amount: u32,
        /// Classification of the attack.
        attack: AttackType,
        /// Status effect applied to the target if it survives.
        effect: Option<StatusEffect>,
    },
    /// Restores health to the entity with the provided identifier.
    HealEntity {
        /// Entity receiving the heal.
        target: EntityId,
        /// Amount of health to restore before clamping.
        amount: u32,
    },
    /// Inserts a new projectile into the repository.
    SpawnProjectile(ProjectileSpawn),
    /// Inserts a new collectible into the repository.
    SpawnCollectible(CollectibleSpawn),
    /// Marks the entity dead without granting rewards.
    DestroyEntity {
        /// Entity to destroy.
        target: EntityId,
    },
    /// Transfers a collectible's reward to the collecting entity.
    Collect {
        /// Collectible being picked up.
        collectible: EntityId,
        /// Entity picking the collectible up.
        collector: EntityId,
    },
    /// Adds currency to the session economy.
    AddCurrency {
        /// Amount of currency granted.
        amount: u32,
    },
    /// Grants experience to the player if it supports progression.
    AddExperience {
        /// Amount of experience granted.
        amount: u32,
    },
    /// Removes lives from the session.
    LoseLives {
        /// Number of lives lost.
        amount: u32,
    },
    /// Requests an audio cue from the sound sink.
    PlaySound {
        /// Cue to play.
        cue: SoundCue,
    },
    /// Requests a visual effect from the effect sink.
    CreateEffect {
        /// Effect to create.
        effect: EffectKind,
        /// World position of the effect.
        position: Vec2,
    },
}

/// Events broadcast after the action processor applied a tick's actions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Confirms that an entity was inserted into the repository.
    EntitySpawned {
        /// Identifier assigned to the entity.
        id: EntityId,
        /// Kind of the inserted entity.
        kind: EntityKind,
    },
    /// Reports that a spawn request was refused by the repository.
    SpawnRejected {
        /// Kind of entity that could not be inserted.
        kind: EntityKind,
    },
    /// Confirms that damage was dealt to an entity.
    EntityDamaged {
        /// Entity that received the damage.
        target: EntityId,
        /// Final damage after armor.
        amount: u32,
        /// Whether the hit was critical.
        critical: bool,
    },
    /// Confirms that health was restored to an entity.
    EntityHealed {
        /// Entity that was healed.
        target: EntityId,
        /// Health actually restored after clamping.
        amount: u32,
    },
    /// Announces that an enemy died to damage.
    EnemyKilled {
        /// Identifier of the defeated enemy.
        enemy: EntityId,
        /// Reward value carried by the enemy.
        reward: u32,
        /// Position at which the enemy died.
        position: Vec2,
    },
    /// Announces that a tower was destroyed.
    TowerDestroyed {
        /// Identifier of the destroyed tower.
        tower: EntityId,
    },
    /// Announces that the player took a lethal hit.
    PlayerDefeated {
        /// Lives left after the defeat.
        lives_remaining: u32,
    },
    /// Reports that the session lost lives.
    LivesLost {
        /// Lives lost by this change.
        amount: u32,
        /// Lives left after the change.
        remaining: u32,
    },
    /// Reports a change to the session currency.
    CurrencyChanged {
        /// Currency granted by this change.
        amount: u32,
        /// Currency total after the change.
        total: u64,
    },
    /// Reports experience gained by the player.
    ExperienceGained {
        /// Experience granted.
        amount: u32,
        /// Experience total after the change.
        total: u32,
        /// Player level after the change.
        level: u32,
    },
    /// Reports that a collectible was picked up.
    CollectiblePicked {
        /// Collectible that was consumed.
        collectible: EntityId,
        /// Entity that collected it.
        collector: EntityId,
        /// Reward that was granted.
        reward: CollectibleReward,
    },
    /// Requests an audio cue from the sound sink.
    SoundRequested {
        /// Cue to play.
        cue: SoundCue,
    },
    /// Requests a visual effect from the effect sink.
    EffectRequested {
        /// Effect to create.
        effect: EffectKind,
        /// World position of the effect.
        position: Vec2,
    },
    /// Announces that the session ran out of lives.
    GameOver,
}
