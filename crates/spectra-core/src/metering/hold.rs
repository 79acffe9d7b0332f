//! Stepped peak-hold indicator.

use crate::math::METER_FLOOR_DB;

/// Holds the highest recent level for a fixed time, then snaps straight down
/// to the live level (no interpolated decay).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct HoldIndicator {
    value_db: f32,
    held_secs: f32,
}

impl Default for HoldIndicator {
    fn default() -> Self {
        Self {
            value_db: METER_FLOOR_DB,
            held_secs: 0.0,
        }
    }
}

impl HoldIndicator {
    pub fn value(&self) -> f32 {
        self.value_db
    }

    /// Seconds since the hold value last changed.
    pub fn held_secs(&self) -> f32 {
        self.held_secs
    }

    /// `level_db` is the level that may raise the hold; `live_db` is what the
    /// hold falls back to once `hold_secs` have passed without a new peak.
    pub fn update(&mut self, level_db: f32, live_db: f32, elapsed_secs: f32, hold_secs: f32) -> f32 {
        if level_db > self.value_db {
            self.value_db = level_db;
            self.held_secs = 0.0;
            return self.value_db;
        }

        self.held_secs += elapsed_secs;
        if self.held_secs >= hold_secs {
            self.value_db = live_db;
            self.held_secs = 0.0;
        }
        self.value_db
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
