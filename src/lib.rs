//! Brick Smash - orchestration core for a Breakout-style arcade game
//!
//! Core modules:
//! - `sim`: Game state machine, event bus, registries, level generation
//! - `platform`: Host engine interfaces (entities, presentation, scenes)
//! - `persistence`: Key-value storage for the max score
//! - `settings`: Data-driven game balance and level patterns

pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use highscores::MaxScore;
pub use settings::GameConfig;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Simulation ticks per second
    pub const TICKS_PER_SECOND: u64 = 120;

    /// Score is clamped to this value
    pub const MAX_SCORE: u32 = 999_999;
    /// Level is clamped to this value
    pub const MAX_LEVEL: u32 = 999;

    /// Spawn roll is drawn from [0, POWER_UP_ROLL_RANGE)
    pub const POWER_UP_ROLL_RANGE: u32 = 99;

    /// Alpha of a spent life indicator
    pub const LIFE_SPENT_ALPHA: f32 = 0.3;
    /// Alpha of an available life indicator
    pub const LIFE_AVAILABLE_ALPHA: f32 = 1.0;
}

/// Convert a duration in seconds to whole simulation ticks (rounded to nearest)
#[inline]
pub fn secs_to_ticks(secs: f32) -> u64 {
    (secs.max(0.0) * consts::TICKS_PER_SECOND as f32).round() as u64
}
