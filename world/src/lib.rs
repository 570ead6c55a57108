#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative entity repository for Rampart.
//!
//! The world owns every live entity exclusively. Update systems borrow it
//! through a [`TickContext`] and the orchestrator mutates it in whole-world
//! batch passes: [`World::batch_update`] for deltas, the action processor for
//! actions, then [`World::integrate`] and [`World::cleanup_dead_entities`].

mod session;

use std::collections::{BTreeMap, BTreeSet};

use rampart_core::{
    Body, Collectible, CollectibleSpawn, DeltaDetail, DeterministicRoll, Enemy, EnemySpawn,
    EntityDelta, EntityId, EntityKind, Player, PlayerSpawn, Projectile, ProjectileSpawn, Terrain,
    TickContext, Tower, TowerSpawn,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

pub use session::{LifeLoss, Session, SessionConfig};

/// Errors reported when the repository refuses an insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The per-kind capacity limit has been reached.
    #[error("{kind:?} capacity of {limit} reached")]
    CapacityExceeded {
        /// Kind whose capacity is exhausted.
        kind: EntityKind,
        /// Configured limit for the kind.
        limit: usize,
    },
    /// A player is already present.
    #[error("a player is already present")]
    PlayerExists,
}

/// Capacity limits for entity kinds that can grow without bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum simultaneously stored enemies.
    pub max_enemies: usize,
    /// Maximum simultaneously stored towers.
    pub max_towers: usize,
    /// Maximum simultaneously stored projectiles.
    pub max_projectiles: usize,
    /// Maximum simultaneously stored collectibles.
    pub max_collectibles: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_enemies: 512,
            max_towers: 128,
            max_projectiles: 1_024,
            max_collectibles: 256,
        }
    }
}

/// Entity removed by [`World::cleanup_dead_entities`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Removed {
    /// Identifier of the removed entity.
    pub id: EntityId,
    /// Kind of the removed entity.
    pub kind: EntityKind,
}

/// Represents the authoritative Rampart entity store and session economy.
#[derive(Debug)]
pub struct World {
    enemies: Vec<Enemy>,
    towers: Vec<Tower>,
    projectiles: Vec<Projectile>,
    collectibles: Vec<Collectible>,
    player: Option<Player>,
    index: BTreeMap<EntityId, EntityKind>,
    next_id: u32,
    terrain: Option<Terrain>,
    session_config: SessionConfig,
    session: Session,
    limits: Limits,
}

impl Default for World {
    fn default() -> Self {
        Self::new(SessionConfig::default(), Limits::default())
    }
}

impl World {
    /// Creates an empty world without terrain.
    #[must_use]
    pub fn new(session_config: SessionConfig, limits: Limits) -> Self {
        Self {
            enemies: Vec::new(),
            towers: Vec::new(),
            projectiles: Vec::new(),
            collectibles: Vec::new(),
            player: None,
            index: BTreeMap::new(),
            next_id: 1,
            terrain: None,
            session_config,
            session: Session::new(session_config),
            limits,
        }
    }

    /// Replaces the terrain grid; `None` leaves terrain-dependent entities idle.
    pub fn set_terrain(&mut self, terrain: Option<Terrain>) {
        self.terrain = terrain;
    }

    /// Terrain grid, if configured.
    #[must_use]
    pub fn terrain(&self) -> Option<&Terrain> {
        self.terrain.as_ref()
    }

    /// Removes every entity and restores the starting session values.
    ///
    /// Terrain is map configuration and survives the reset.
    pub fn clear(&mut self) {
        self.enemies.clear();
        self.towers.clear();
        self.projectiles.clear();
        self.collectibles.clear();
        self.player = None;
        self.index.clear();
        self.next_id = 1;
        self.session = Session::new(self.session_config);
    }

    /// Session economy.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable session economy.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Enemies in identifier order, including ones that died this tick.
    #[must_use]
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// Towers in identifier order, including ones that died this tick.
    #[must_use]
    pub fn towers(&self) -> &[Tower] {
        &self.towers
    }

    /// Projectiles in identifier order, including ones that died this tick.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Collectibles in identifier order, including ones that died this tick.
    #[must_use]
    pub fn collectibles(&self) -> &[Collectible] {
        &self.collectibles
    }

    /// The player, if spawned.
    #[must_use]
    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    /// Kind of the entity with the provided identifier.
    #[must_use]
    pub fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        self.index.get(&id).copied()
    }

    /// Inserts an enemy.
    pub fn add_enemy(&mut self, spawn: EnemySpawn) -> Result<EntityId, WorldError> {
        ensure_capacity(EntityKind::Enemy, self.enemies.len(), self.limits.max_enemies)?;
        let id = self.allocate(EntityKind::Enemy);
        self.enemies.push(Enemy::from_spawn(id, spawn));
        Ok(id)
    }

    /// Inserts a tower.
    pub fn add_tower(&mut self, spawn: TowerSpawn) -> Result<EntityId, WorldError> {
        ensure_capacity(EntityKind::Tower, self.towers.len(), self.limits.max_towers)?;
        let id = self.allocate(EntityKind::Tower);
        self.towers.push(Tower::from_spawn(id, spawn));
        Ok(id)
    }

    /// Inserts a projectile.
    pub fn add_projectile(&mut self, spawn: ProjectileSpawn) -> Result<EntityId, WorldError> {
        ensure_capacity(
            EntityKind::Projectile,
            self.projectiles.len(),
            self.limits.max_projectiles,
        )?;
        let id = self.allocate(EntityKind::Projectile);
        self.projectiles.push(Projectile::from_spawn(id, spawn));
        Ok(id)
    }

    /// Inserts a collectible.
    pub fn add_collectible(&mut self, spawn: CollectibleSpawn) -> Result<EntityId, WorldError> {
        ensure_capacity(
            EntityKind::Collectible,
            self.collectibles.len(),
            self.limits.max_collectibles,
        )?;
        let id = self.allocate(EntityKind::Collectible);
        self.collectibles.push(Collectible::from_spawn(id, spawn));
        Ok(id)
    }

    /// Inserts the player; only one may exist at a time.
    pub fn spawn_player(&mut self, spawn: PlayerSpawn) -> Result<EntityId, WorldError> {
        if self.player.is_some() {
            return Err(WorldError::PlayerExists);
        }
        let id = self.allocate(EntityKind::Player);
        self.player = Some(Player::from_spawn(id, spawn));
        Ok(id)
    }

    /// Removes an entity immediately; returns `false` for unknown identifiers.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(kind) = self.index.remove(&id) else {
            return false;
        };
        match kind {
            EntityKind::Enemy => remove_by_id(&mut self.enemies, id, |enemy| enemy.body.id),
            EntityKind::Tower => remove_by_id(&mut self.towers, id, |tower| tower.body.id),
            EntityKind::Projectile => {
                remove_by_id(&mut self.projectiles, id, |projectile| projectile.body.id)
            }
            EntityKind::Collectible => {
                remove_by_id(&mut self.collectibles, id, |collectible| collectible.body.id)
            }
            EntityKind::Player => {
                let _ = self.player.take();
            }
        }
        true
    }

    /// Mutable access to an enemy.
    pub fn enemy_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        find_mut(&mut self.enemies, id, |enemy| enemy.body.id)
    }

    /// Mutable access to a tower.
    pub fn tower_mut(&mut self, id: EntityId) -> Option<&mut Tower> {
        find_mut(&mut self.towers, id, |tower| tower.body.id)
    }

    /// Mutable access to a projectile.
    pub fn projectile_mut(&mut self, id: EntityId) -> Option<&mut Projectile> {
        find_mut(&mut self.projectiles, id, |projectile| projectile.body.id)
    }

    /// Mutable access to a collectible.
    pub fn collectible_mut(&mut self, id: EntityId) -> Option<&mut Collectible> {
        find_mut(&mut self.collectibles, id, |collectible| collectible.body.id)
    }

    /// Mutable access to the player.
    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.player.as_mut()
    }

    /// Mutable access to the body of any entity.
    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut Body> {
        match self.kind_of(id)? {
            EntityKind::Enemy => self.enemy_mut(id).map(|enemy| &mut enemy.body),
            EntityKind::Tower => self.tower_mut(id).map(|tower| &mut tower.body),
            EntityKind::Projectile => self.projectile_mut(id).map(|projectile| &mut projectile.body),
            EntityKind::Collectible => {
                self.collectible_mut(id).map(|collectible| &mut collectible.body)
            }
            EntityKind::Player => self.player_mut().map(|player| &mut player.body),
        }
    }

    /// Reports whether the entity exists and is alive.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        query::body(self, id).is_some_and(|body| body.alive)
    }

    /// Builds the immutable view handed to update systems.
    #[must_use]
    pub fn context(
        &self,
        dt: f32,
        elapsed: f32,
        tick: u64,
        roll: DeterministicRoll,
    ) -> TickContext<'_> {
        TickContext {
            dt,
            elapsed,
            tick,
            enemies: &self.enemies,
            towers: &self.towers,
            projectiles: &self.projectiles,
            collectibles: &self.collectibles,
            player: self.player.as_ref(),
            terrain: self.terrain.as_ref(),
            roll,
        }
    }

    /// Applies every delta in order; returns how many matched a stored entity.
    ///
    /// Fields left `None` in a delta are untouched. Deltas for unknown
    /// identifiers are skipped.
    pub fn batch_update(&mut self, deltas: &[EntityDelta]) -> usize {
        let mut applied = 0;
        for delta in deltas {
            if self.apply_delta(delta) {
                applied += 1;
            } else {
                trace!(id = delta.id.get(), "delta for unknown entity skipped");
            }
        }
        applied
    }

    fn apply_delta(&mut self, delta: &EntityDelta) -> bool {
        let Some(kind) = self.kind_of(delta.id) else {
            return false;
        };
        match kind {
            EntityKind::Enemy => {
                let Some(enemy) = self.enemy_mut(delta.id) else {
                    return false;
                };
                apply_body(&mut enemy.body, delta);
                if let Some(cooldown) = delta.cooldown {
                    enemy.attack_cooldown = cooldown;
                }
                if let Some(target) = delta.target {
                    enemy.target = target;
                }
                if let Some(DeltaDetail::Enemy {
                    path_index,
                    status,
                    stall,
                }) = &delta.detail
                {
                    enemy.path_index = *path_index;
                    enemy.status = *status;
                    enemy.stall = *stall;
                }
            }
            EntityKind::Tower => {
                let Some(tower) = self.tower_mut(delta.id) else {
                    return false;
                };
                apply_body(&mut tower.body, delta);
                if let Some(cooldown) = delta.cooldown {
                    tower.cooldown = cooldown;
                }
                if let Some(target) = delta.target {
                    tower.target = target;
                }
            }
            EntityKind::Player => {
                let Some(player) = self.player_mut() else {
                    return false;
                };
                apply_body(&mut player.body, delta);
                if let Some(cooldown) = delta.cooldown {
                    player.fire_cooldown = cooldown;
                }
                if let Some(DeltaDetail::Player { regen_cooldown }) = &delta.detail {
                    player.regen_cooldown = *regen_cooldown;
                }
            }
            EntityKind::Projectile => {
                let Some(projectile) = self.projectile_mut(delta.id) else {
                    return false;
                };
                apply_body(&mut projectile.body, delta);
                if let Some(DeltaDetail::Projectile {
                    ttl,
                    homing_target,
                    retargeted,
                }) = &delta.detail
                {
                    projectile.ttl = *ttl;
                    projectile.homing_target = *homing_target;
                    projectile.retargeted = *retargeted;
                }
            }
            EntityKind::Collectible => {
                let Some(collectible) = self.collectible_mut(delta.id) else {
                    return false;
                };
                apply_body(&mut collectible.body, delta);
            }
        }
        true
    }

    /// Advances living entities along their velocity, skipping `placed` ones.
    ///
    /// Entities whose delta already set a position this tick are listed in
    /// `placed` and are not moved twice.
    pub fn integrate(&mut self, dt: f32, placed: &BTreeSet<EntityId>) {
        let step = |body: &mut Body| {
            if body.alive && !placed.contains(&body.id) {
                body.position += body.velocity * dt;
            }
        };
        self.enemies.iter_mut().for_each(|enemy| step(&mut enemy.body));
        self.towers.iter_mut().for_each(|tower| step(&mut tower.body));
        self.projectiles
            .iter_mut()
            .for_each(|projectile| step(&mut projectile.body));
        if let Some(player) = self.player.as_mut() {
            step(&mut player.body);
        }
    }

    /// Counts down collectible lifetimes, killing expired ones.
    pub fn age_collectibles(&mut self, dt: f32) {
        for collectible in self.collectibles.iter_mut().filter(|c| c.body.alive) {
            collectible.ttl -= dt;
            if collectible.ttl <= 0.0 {
                collectible.body.alive = false;
            }
        }
    }

    /// Removes every dead entity and reports them in identifier order.
    pub fn cleanup_dead_entities(&mut self) -> Vec<Removed> {
        let mut removed = Vec::new();
        drain_dead(&mut self.enemies, EntityKind::Enemy, |e| &e.body, &mut removed);
        drain_dead(&mut self.towers, EntityKind::Tower, |t| &t.body, &mut removed);
        drain_dead(
            &mut self.projectiles,
            EntityKind::Projectile,
            |p| &p.body,
            &mut removed,
        );
        drain_dead(
            &mut self.collectibles,
            EntityKind::Collectible,
            |c| &c.body,
            &mut removed,
        );
        if let Some(player) = self.player.as_ref() {
            if !player.body.alive {
                removed.push(Removed {
                    id: player.body.id,
                    kind: EntityKind::Player,
                });
                self.player = None;
            }
        }
        for entry in &removed {
            let _ = self.index.remove(&entry.id);
        }
        removed.sort_by_key(|entry| entry.id);
        removed
    }

    fn allocate(&mut self, kind: EntityKind) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let _ = self.index.insert(id, kind);
        id
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use rampart_core::{Body, EntityId, EntityKind, GameStateSnapshot};

    use super::World;

    /// Body of any entity by identifier.
    #[must_use]
    pub fn body(world: &World, id: EntityId) -> Option<&Body> {
        match world.kind_of(id)? {
            EntityKind::Enemy => find(world.enemies(), id, |e| &e.body),
            EntityKind::Tower => find(world.towers(), id, |t| &t.body),
            EntityKind::Projectile => find(world.projectiles(), id, |p| &p.body),
            EntityKind::Collectible => find(world.collectibles(), id, |c| &c.body),
            EntityKind::Player => world.player().map(|player| &player.body),
        }
    }

    /// Number of living entities of every kind.
    #[must_use]
    pub fn living_count(world: &World) -> usize {
        living_enemies(world)
            + world.towers().iter().filter(|t| t.body.alive).count()
            + world.projectiles().iter().filter(|p| p.body.alive).count()
            + world.collectibles().iter().filter(|c| c.body.alive).count()
            + usize::from(world.player().is_some_and(|player| player.body.alive))
    }

    /// Number of living enemies.
    #[must_use]
    pub fn living_enemies(world: &World) -> usize {
        world.enemies().iter().filter(|e| e.body.alive).count()
    }

    /// Read-only summary handed to spawn-zone controllers.
    #[must_use]
    pub fn snapshot(world: &World, elapsed: f32) -> GameStateSnapshot {
        let session = world.session();
        GameStateSnapshot {
            lives: session.lives(),
            score: session.score(),
            currency: session.currency(),
            wave: session.wave(),
            enemies: living_enemies(world),
            towers: world.towers().iter().filter(|t| t.body.alive).count(),
            projectiles: world.projectiles().iter().filter(|p| p.body.alive).count(),
            player_position: world
                .player()
                .filter(|player| player.body.alive)
                .map(|player| player.body.position),
            elapsed,
        }
    }

    fn find<T>(entities: &[T], id: EntityId, body: impl Fn(&T) -> &Body) -> Option<&Body> {
        entities
            .binary_search_by_key(&id, |entity| body(entity).id)
            .ok()
            .map(|index| body(&entities[index]))
    }
}

fn ensure_capacity(kind: EntityKind, len: usize, limit: usize) -> Result<(), WorldError> {
    if len >= limit {
        Err(WorldError::CapacityExceeded { kind, limit })
    } else {
        Ok(())
    }
}

fn apply_body(body: &mut Body, delta: &EntityDelta) {
    if let Some(position) = delta.position {
        body.position = position;
    }
    if let Some(velocity) = delta.velocity {
        body.velocity = velocity;
    }
    if let Some(health) = delta.health {
        body.health = health.min(body.max_health);
    }
    if delta.mark_dead {
        body.alive = false;
    }
}

fn find_mut<T>(entities: &mut [T], id: EntityId, key: impl Fn(&T) -> EntityId) -> Option<&mut T> {
    entities
        .binary_search_by_key(&id, |entity| key(entity))
        .ok()
        .map(move |index| &mut entities[index])
}

fn remove_by_id<T>(entities: &mut Vec<T>, id: EntityId, key: impl Fn(&T) -> EntityId) {
    if let Ok(index) = entities.binary_search_by_key(&id, |entity| key(entity)) {
        let _ = entities.remove(index);
    }
}

fn drain_dead<T>(
    entities: &mut Vec<T>,
    kind: EntityKind,
    body: impl Fn(&T) -> &Body,
    removed: &mut Vec<Removed>,
) {
    entities.retain(|entity| {
        let body = body(entity);
        if body.alive {
            true
        } else {
            removed.push(Removed { id: body.id, kind });
            false
        }
    });
}
