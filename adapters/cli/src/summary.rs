use std::fmt::Write as _;

use rampart_core::{EntityKind, Event};
use rampart_system_game_loop::{Counters, TickReport};
use serde::Serialize;

/// Aggregated outcome of a headless session.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub(crate) struct Summary {
    /// Ticks actually simulated.
    pub(crate) ticks: u64,
    /// Counters published by the final tick.
    pub(crate) counters: Counters,
    /// Enemies inserted by the controllers.
    pub(crate) enemies_spawned: u64,
    /// Projectiles fired by towers, the player and ranged enemies.
    pub(crate) projectiles_fired: u64,
    /// Damage dealt after armor, summed over every hit.
    pub(crate) damage_dealt: u64,
    /// Hits that landed as critical.
    pub(crate) critical_hits: u64,
    /// Towers destroyed by enemies.
    pub(crate) towers_destroyed: u64,
    /// Collectibles picked up by the player.
    pub(crate) collectibles_picked: u64,
    /// Spawn requests refused for lack of capacity.
    pub(crate) spawns_rejected: u64,
    /// Tick on which the session ran out of lives.
    pub(crate) game_over_tick: Option<u64>,
}

impl Summary {
    /// Folds one tick's report into the summary.
    pub(crate) fn record(&mut self, report: &TickReport) {
        if report.paused {
            return;
        }
        self.ticks += 1;
        self.counters = report.counters;

        for event in &report.events {
            match event {
                Event::EntitySpawned {
                    kind: EntityKind::Enemy,
                    ..
                } => self.enemies_spawned += 1,
                Event::EntitySpawned {
                    kind: EntityKind::Projectile,
                    ..
                } => self.projectiles_fired += 1,
                Event::EntityDamaged {
                    amount, critical, ..
                } => {
                    self.damage_dealt += u64::from(*amount);
                    self.critical_hits += u64::from(*critical);
                }
                Event::TowerDestroyed { .. } => self.towers_destroyed += 1,
                Event::CollectiblePicked { .. } => self.collectibles_picked += 1,
                Event::SpawnRejected { .. } => self.spawns_rejected += 1,
                Event::GameOver => {
                    let _ = self.game_over_tick.get_or_insert(report.counters.tick);
                }
                _ => {}
            }
        }
    }

    /// Human-readable rendering of the summary.
    pub(crate) fn render(&self) -> String {
        let counters = &self.counters;
        let mut text = String::new();
        let _ = writeln!(
            text,
            "simulated {} ticks ({:.1}s of game time)",
            self.ticks, counters.elapsed
        );
        let _ = writeln!(
            text,
            "wave {} ({} pending), {} enemies alive",
            counters.wave, counters.pending, counters.enemies
        );
        let _ = writeln!(
            text,
            "enemies spawned {}, killed {}",
            self.enemies_spawned, counters.enemies_killed
        );
        let _ = writeln!(
            text,
            "projectiles fired {}, damage dealt {} ({} critical hits)",
            self.projectiles_fired, self.damage_dealt, self.critical_hits
        );
        let _ = writeln!(
            text,
            "towers standing {}, destroyed {}",
            counters.towers, self.towers_destroyed
        );
        let _ = writeln!(
            text,
            "score {}, currency {}, pickups {}",
            counters.score, counters.currency, self.collectibles_picked
        );
        if self.spawns_rejected > 0 {
            let _ = writeln!(text, "spawns rejected {}", self.spawns_rejected);
        }
        match self.game_over_tick {
            Some(tick) => {
                let _ = writeln!(text, "game over on tick {tick}");
            }
            None => {
                let _ = writeln!(text, "lives remaining {}", counters.lives);
            }
        }
        text
    }
}
