#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Time-bounded memory of positions where enemies failed to make progress.
//!
//! Positions are quantized to a coarse grid so nearby failures share an
//! entry. Entries expire after [`ENTRY_TTL`] seconds of simulated time and are
//! purged lazily whenever the cache is queried or written.

use std::collections::BTreeMap;

use rampart_core::Vec2;
use tracing::trace;

/// Seconds an entry stays valid after it was recorded; it is gone once this much time has passed.
pub const ENTRY_TTL: f32 = 30.0;

/// Distance within which a query matches a recorded position.
pub const PROXIMITY: f32 = 20.0;

/// Grid spacing used to quantize recorded positions.
pub const QUANTUM: f32 = 10.0;

type CellKey = (i32, i32);

/// Cache of recently stuck positions keyed by quantized coordinates.
#[derive(Clone, Debug, Default)]
pub struct StuckPositionCache {
    entries: BTreeMap<CellKey, f32>,
}

impl StuckPositionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that an enemy was stuck at `position` at game time `now`.
    pub fn record_stuck(&mut self, position: Vec2, now: f32) {
        self.purge(now);
        let _ = self.entries.insert(quantize(position), now);
    }

    /// Reports whether a live entry lies within [`PROXIMITY`] of `position`.
    pub fn is_stuck(&mut self, position: Vec2, now: f32) -> bool {
        self.purge(now);
        let reach = (PROXIMITY / QUANTUM).ceil() as i32;
        let (column, row) = quantize(position);
        let low = (column - reach, i32::MIN);
        let high = (column + reach, i32::MAX);
        self.entries.range(low..=high).any(|(&(x, y), _)| {
            (y - row).abs() <= reach && cell_center(x, y).distance(position) <= PROXIMITY
        })
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of live entries, including ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge(&mut self, now: f32) {
        let before = self.entries.len();
        self.entries.retain(|_, recorded| now - *recorded < ENTRY_TTL);
        let purged = before - self.entries.len();
        if purged > 0 {
            trace!(purged, "expired stuck positions purged");
        }
    }
}

fn quantize(position: Vec2) -> CellKey {
    (
        (position.x / QUANTUM).round() as i32,
        (position.y / QUANTUM).round() as i32,
    )
}

fn cell_center(x: i32, y: i32) -> Vec2 {
    Vec2::new(x as f32 * QUANTUM, y as f32 * QUANTUM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_position_is_stuck_nearby() {
        let mut cache = StuckPositionCache::new();
        cache.record_stuck(Vec2::new(103.0, 48.0), 1.0);

        assert!(cache.is_stuck(Vec2::new(100.0, 50.0), 2.0));
        assert!(cache.is_stuck(Vec2::new(115.0, 60.0), 2.0));
        assert!(!cache.is_stuck(Vec2::new(140.0, 50.0), 2.0));
    }

    #[test]
    fn nearby_failures_share_an_entry() {
        let mut cache = StuckPositionCache::new();
        cache.record_stuck(Vec2::new(101.0, 49.0), 0.0);
        cache.record_stuck(Vec2::new(99.0, 51.0), 0.5);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let mut cache = StuckPositionCache::new();
        cache.record_stuck(Vec2::new(0.0, 0.0), 0.0);

        assert!(cache.is_stuck(Vec2::ZERO, 29.0));
        assert!(!cache.is_stuck(Vec2::ZERO, 31.0));
        assert!(cache.is_empty());
    }

    #[test]
    fn entry_expires_exactly_at_ttl() {
        let mut cache = StuckPositionCache::new();
        cache.record_stuck(Vec2::new(40.0, 40.0), 5.0);

        assert!(cache.is_stuck(Vec2::new(40.0, 40.0), 34.5));
        assert!(!cache.is_stuck(Vec2::new(40.0, 40.0), 5.0 + ENTRY_TTL));
        assert!(cache.is_empty());
    }

    #[test]
    fn recording_refreshes_timestamp() {
        let mut cache = StuckPositionCache::new();
        cache.record_stuck(Vec2::ZERO, 0.0);
        cache.record_stuck(Vec2::ZERO, 20.0);
        assert!(cache.is_stuck(Vec2::ZERO, 45.0));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut cache = StuckPositionCache::new();
        cache.record_stuck(Vec2::new(5.0, 5.0), 0.0);
        cache.clear();
        assert!(!cache.is_stuck(Vec2::new(5.0, 5.0), 0.0));
    }
}
