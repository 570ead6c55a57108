//! Tick-scoped inputs handed to the update systems.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    Collectible, DeterministicRoll, Embodied, Enemy, EntityId, Player, Projectile, Terrain, Tower,
};

/// Immutable, tick-scoped view over the repository.
///
/// Every slice is sorted by ascending [`EntityId`]; lookups rely on that
/// ordering. A context is built fresh for each tick and never mutated.
#[derive(Clone, Copy, Debug)]
pub struct TickContext<'a> {
    /// Seconds elapsed since the previous tick.
    pub dt: f32,
    /// Accumulated game time in seconds, including this tick.
    pub elapsed: f32,
    /// Index of the tick being simulated, starting at 1.
    pub tick: u64,
    /// Enemies present at the start of the update phase.
    pub enemies: &'a [Enemy],
    /// Towers present at the start of the update phase.
    pub towers: &'a [Tower],
    /// Projectiles present at the start of the update phase.
    pub projectiles: &'a [Projectile],
    /// Collectibles present at the start of the update phase.
    pub collectibles: &'a [Collectible],
    /// The player, if it has been spawned.
    pub player: Option<&'a Player>,
    /// Terrain grid, if one has been configured.
    pub terrain: Option<&'a Terrain>,
    /// Session-seeded source of per-entity random rolls.
    pub roll: DeterministicRoll,
}

impl<'a> TickContext<'a> {
    /// Looks up an enemy by identifier.
    #[must_use]
    pub fn enemy(&self, id: EntityId) -> Option<&'a Enemy> {
        find_by_id(self.enemies, id)
    }

    /// Looks up a tower by identifier.
    #[must_use]
    pub fn tower(&self, id: EntityId) -> Option<&'a Tower> {
        find_by_id(self.towers, id)
    }

    /// Iterator over enemies that are still alive, in identifier order.
    pub fn living_enemies(&self) -> impl Iterator<Item = &'a Enemy> + 'a {
        self.enemies.iter().filter(|enemy| enemy.body.alive)
    }

    /// Iterator over towers that are still alive, in identifier order.
    pub fn living_towers(&self) -> impl Iterator<Item = &'a Tower> + 'a {
        self.towers.iter().filter(|tower| tower.body.alive)
    }

    /// The player if it exists and is alive.
    #[must_use]
    pub fn living_player(&self) -> Option<&'a Player> {
        self.player.filter(|player| player.body.alive)
    }

    /// Resolves a living entity that enemies may attack: the player or a tower.
    ///
    /// Returns the target's position and collision radius.
    #[must_use]
    pub fn hostile_target(&self, id: EntityId) -> Option<(Vec2, f32)> {
        if let Some(player) = self.living_player() {
            if player.body.id == id {
                return Some((player.body.position, player.radius));
            }
        }
        self.tower(id)
            .filter(|tower| tower.body.alive)
            .map(|tower| (tower.body.position, tower.radius))
    }
}

fn find_by_id<T: Embodied>(entities: &[T], id: EntityId) -> Option<&T> {
    entities
        .binary_search_by_key(&id, |entity| entity.id())
        .ok()
        .map(|index| &entities[index])
}

/// Player input sampled by the external input layer for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    /// Desired movement direction; normalised by the player system.
    pub movement: Vec2,
    /// World position the player aims at.
    pub aim: Option<Vec2>,
    /// Manual fire trigger held this tick.
    pub fire: bool,
    /// Automatic fire at the nearest enemy in range.
    pub auto_fire: bool,
}

/// Read-only summary handed to spawn-zone controllers each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    /// Lives remaining in the session.
    pub lives: u32,
    /// Current score.
    pub score: u64,
    /// Current currency.
    pub currency: u64,
    /// Current wave number.
    pub wave: u32,
    /// Living enemies in the repository.
    pub enemies: usize,
    /// Living towers in the repository.
    pub towers: usize,
    /// Living projectiles in the repository.
    pub projectiles: usize,
    /// Player position, if a living player exists.
    pub player_position: Option<Vec2>,
    /// Accumulated game time in seconds.
    pub elapsed: f32,
}
