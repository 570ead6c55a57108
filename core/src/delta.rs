//! State deltas returned by the update systems.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{Action, EntityId, StallTracker, StatusEffects};

/// Subset of an entity's fields that changed during a tick.
///
/// `None` means "unchanged". The repository applies deltas in one batch after
/// every update system ran, so no system ever observes a sibling's delta.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityDelta {
    /// Entity the delta applies to.
    pub id: EntityId,
    /// New position; entities without one are integrated from velocity.
    pub position: Option<Vec2>,
    /// New velocity.
    pub velocity: Option<Vec2>,
    /// New health.
    pub health: Option<u32>,
    /// New primary cooldown: enemy attack, tower fire, or player weapon.
    pub cooldown: Option<f32>,
    /// New target selection; `Some(None)` clears the target.
    pub target: Option<Option<EntityId>>,
    /// Marks the entity dead.
    pub mark_dead: bool,
    /// Kind-specific persistent state.
    pub detail: Option<DeltaDetail>,
}

impl EntityDelta {
    /// Creates an empty delta for the entity.
    #[must_use]
    pub const fn new(id: EntityId) -> Self {
        Self {
            id,
            position: None,
            velocity: None,
            health: None,
            cooldown: None,
            target: None,
            mark_dead: false,
            detail: None,
        }
    }

    /// Reports whether the delta changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.position.is_none()
            && self.velocity.is_none()
            && self.health.is_none()
            && self.cooldown.is_none()
            && self.target.is_none()
            && !self.mark_dead
            && self.detail.is_none()
    }

    /// Reports whether the delta places the entity explicitly.
    #[must_use]
    pub const fn repositions(&self) -> bool {
        self.position.is_some()
    }
}

/// Kind-specific fields carried by an [`EntityDelta`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DeltaDetail {
    /// Enemy pathing and status state.
    Enemy {
        /// Index of the next waypoint.
        path_index: usize,
        /// Status timers after this tick.
        status: StatusEffects,
        /// Movement failure tracker after this tick.
        stall: StallTracker,
    },
    /// Player regeneration state.
    Player {
        /// Seconds until the next regeneration pulse.
        regen_cooldown: f32,
    },
    /// Projectile flight state.
    Projectile {
        /// Seconds of flight remaining.
        ttl: f32,
        /// Target the projectile homes toward.
        homing_target: Option<EntityId>,
        /// Whether the single retarget search has been used.
        retargeted: bool,
    },
}

/// Output of a per-kind update system for a single entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateResult {
    /// Changes to the entity itself.
    pub delta: EntityDelta,
    /// Requested side effects, in the order they were produced.
    pub actions: Vec<Action>,
}

impl UpdateResult {
    /// Result that changes nothing and requests nothing.
    #[must_use]
    pub const fn noop(id: EntityId) -> Self {
        Self {
            delta: EntityDelta::new(id),
            actions: Vec::new(),
        }
    }

    /// Reports whether the result changes nothing and requests nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.delta.is_empty() && self.actions.is_empty()
    }
}
