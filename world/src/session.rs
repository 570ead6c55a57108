//! Session economy: lives, score, currency and wave bookkeeping.

use serde::{Deserialize, Serialize};

/// Starting values applied when a session begins or resets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lives the session starts with.
    pub starting_lives: u32,
    /// Currency the session starts with.
    pub starting_currency: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_lives: 3,
            starting_currency: 100,
        }
    }
}

/// Outcome of removing lives from the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifeLoss {
    /// Lives actually removed after saturation.
    pub lost: u32,
    /// Lives left after the change.
    pub remaining: u32,
    /// Set when this loss ended the session.
    pub game_over: bool,
}

/// Aggregate state of the running session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    lives: u32,
    score: u64,
    currency: u64,
    wave: u32,
    game_over: bool,
}

impl Session {
    /// Creates a session from its starting configuration.
    #[must_use]
    pub const fn new(config: SessionConfig) -> Self {
        Self {
            lives: config.starting_lives,
            score: 0,
            currency: config.starting_currency,
            wave: 0,
            game_over: false,
        }
    }

    /// Lives remaining.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// Accumulated score.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Currency available.
    #[must_use]
    pub const fn currency(&self) -> u64 {
        self.currency
    }

    /// Wave number last published by the wave controller.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Reports whether the session ran out of lives.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Adds to the score.
    pub fn add_score(&mut self, amount: u64) {
        self.score = self.score.saturating_add(amount);
    }

    /// Adds currency and returns the new total.
    pub fn add_currency(&mut self, amount: u64) -> u64 {
        self.currency = self.currency.saturating_add(amount);
        self.currency
    }

    /// Spends currency; returns `false` without change when funds are short.
    pub fn spend(&mut self, amount: u64) -> bool {
        if self.currency < amount {
            return false;
        }
        self.currency -= amount;
        true
    }

    /// Records the wave number published by the wave controller.
    pub fn set_wave(&mut self, wave: u32) {
        self.wave = wave;
    }

    /// Removes lives; reaching zero ends the session exactly once.
    pub fn lose_lives(&mut self, amount: u32) -> LifeLoss {
        let lost = amount.min(self.lives);
        self.lives -= lost;
        let game_over = self.lives == 0 && !self.game_over && lost > 0;
        if game_over {
            self.game_over = true;
        }
        LifeLoss {
            lost,
            remaining: self.lives,
            game_over,
        }
    }
}
