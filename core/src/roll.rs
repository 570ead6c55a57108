//! Stateless per-entity random rolls derived from a session seed.

use serde::{Deserialize, Serialize};

use crate::EntityId;

/// Hash-based roll source that keeps update systems pure.
///
/// The same seed, tick, entity and salt always yield the same roll, so
/// replays reproduce every critical hit without threading RNG state through
/// the update systems.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeterministicRoll {
    seed: u64,
}

impl DeterministicRoll {
    /// Creates a roll source from a session seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed the roll source was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform roll in `0.0..1.0` for the entity on the given tick.
    #[must_use]
    pub fn unit(&self, tick: u64, entity: EntityId, salt: u64) -> f32 {
        let mut state = self.seed;
        state = splitmix(state ^ tick.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        state = splitmix(state ^ u64::from(entity.get()));
        state = splitmix(state ^ salt);
        (state >> 40) as f32 / (1u64 << 24) as f32
    }
}

fn splitmix(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut mixed = state;
    mixed = (mixed ^ (mixed >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    mixed = (mixed ^ (mixed >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    mixed ^ (mixed >> 31)
}
