//! Contracts implemented by the external spawn controllers.

use crate::{EnemySpawn, EntityId, GameStateSnapshot, Player, Tower};

/// Source of wave enemies.
///
/// The orchestrator inserts returned spawns into the repository, defaulting
/// their target to the player, and reports back the identifiers it assigned
/// and the enemies it removed.
pub trait WaveController {
    /// Advances the wave clock and returns enemies due to spawn this tick.
    fn update(&mut self, dt: f32) -> Vec<EnemySpawn>;

    /// Called once for every enemy inserted on behalf of this controller.
    fn enemy_spawned(&mut self, _enemy: EntityId) {}

    /// Called once when an enemy dies to damage.
    fn enemy_killed(&mut self, _enemy: EntityId) {}

    /// Called once when any enemy leaves the repository, killed or escaped.
    fn enemy_removed(&mut self, _enemy: EntityId) {}

    /// Current wave number, starting at 1 once the first wave begins.
    fn wave(&self) -> u32;

    /// Enemies of the current wave that have not spawned yet.
    fn pending(&self) -> u32;

    /// Returns the controller to its initial state.
    fn reset(&mut self);
}

/// Source of enemies that react to the state of the session.
pub trait SpawnZoneController {
    /// Advances zone timers and returns enemies due to spawn this tick.
    fn update(
        &mut self,
        dt: f32,
        snapshot: &GameStateSnapshot,
        towers: &[Tower],
        player: Option<&Player>,
    ) -> Vec<EnemySpawn>;

    /// Returns the controller to its initial state.
    fn reset(&mut self);
}

/// Sessions without spawn zones.
impl SpawnZoneController for () {
    fn update(
        &mut self,
        _dt: f32,
        _snapshot: &GameStateSnapshot,
        _towers: &[Tower],
        _player: Option<&Player>,
    ) -> Vec<EnemySpawn> {
        Vec::new()
    }

    fn reset(&mut self) {}
}
