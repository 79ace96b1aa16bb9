//! Player configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Absolute limits for any configured rate
pub const RATE_LIMITS: (f32, f32) = (0.5, 3.0);

/// Player preferences and behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Rate applied to newly created books (0.5 - 3.0)
    pub default_rate: f32,

    /// Rate change step for faster/slower
    pub rate_step: f32,

    /// Lowest rate the player will apply
    pub min_rate: f32,

    /// Highest rate the player will apply
    pub max_rate: f32,

    /// Seconds moved by skip forward/back
    pub skip_interval_secs: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_rate: 1.0,
            rate_step: 0.25,
            min_rate: RATE_LIMITS.0,
            max_rate: RATE_LIMITS.1,
            skip_interval_secs: 15,
        }
    }
}

impl PlayerConfig {
    /// Clamps `rate` into `[min_rate, max_rate]`
    pub fn clamp_rate(&self, rate: f32) -> f32 {
        if rate.is_nan() {
            return self.default_rate;
        }
        rate.clamp(self.min_rate, self.max_rate)
    }
}

impl ConfigSection for PlayerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let (lo, hi) = RATE_LIMITS;
        Validator::collect_errors(vec![
            Validator::in_range(self.min_rate, lo, hi, "player.min_rate"),
            Validator::in_range(self.max_rate, lo, hi, "player.max_rate"),
            Validator::ordered(self.min_rate, self.max_rate, "player.min_rate"),
            Validator::in_range(
                self.default_rate,
                self.min_rate,
                self.max_rate,
                "player.default_rate",
            ),
            Validator::in_range(self.rate_step, 0.05, 0.5, "player.rate_step"),
            Validator::in_range(self.skip_interval_secs, 1, 120, "player.skip_interval_secs"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.default_rate = other.default_rate;
        self.rate_step = other.rate_step;
        self.min_rate = other.min_rate;
        self.max_rate = other.max_rate;
        self.skip_interval_secs = other.skip_interval_secs;
    }

    fn section_name(&self) -> &'static str {
        "player"
    }
}
