//! Game balance and layout configuration
//!
//! Loaded from a JSON file when one is given, otherwise the built-in defaults
//! are used. Every field has a default so partial files are fine.

use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use crate::sim::{Pattern, PowerUpKind};

/// Paddle movement and power-up caps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaddleConfig {
    /// Base speed, units per second
    pub move_speed: f32,
    /// Speed added per speed-up power-up
    pub speed_step: f32,
    /// Speed-up power-ups stop at this speed
    pub max_speed: f32,
    /// Scale added per size-up power-up
    pub size_step: f32,
    /// Size-up power-ups stop at this scale
    pub max_scale: f32,
    /// Paddle x is clamped to `[-x_boundary, x_boundary]`
    pub x_boundary: f32,
    /// Height of the paddle, where balls and bullets spawn from
    pub y: f32,
}

impl Default for PaddleConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            speed_step: 1.0,
            max_speed: 25.0,
            size_step: 0.25,
            max_scale: 2.5,
            x_boundary: 7.8,
            y: -4.0,
        }
    }
}

/// Gun power-up volley
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GunConfig {
    /// Bullets per volley
    pub shots: u32,
    /// Seconds the volley is spread over
    pub duration_secs: f32,
}

impl Default for GunConfig {
    fn default() -> Self {
        Self {
            shots: 5,
            duration_secs: 5.0,
        }
    }
}

/// Everything tunable about a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for level layout and power-up rolls
    pub seed: u64,
    /// Brick value = initial strength * multiplier
    pub point_multiplier: u32,
    /// Lives at run start, also the cap for add-life power-ups
    pub max_lives: u32,
    /// Level increment per cleared level
    pub level_step: u32,
    /// How long bricks stay non-solid after a bulldozer
    pub bulldozer_secs: f32,
    /// Offset above the paddle where new balls appear
    pub ball_spawn_offset: f32,
    /// Play area scene loaded when a run starts
    pub scene_name: String,
    pub paddle: PaddleConfig,
    pub gun: GunConfig,
    /// Power-up draw table. Repeat a kind to raise its odds.
    pub power_ups: Vec<PowerUpKind>,
    pub patterns: Vec<Pattern>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            point_multiplier: 10,
            max_lives: 3,
            level_step: 1,
            bulldozer_secs: 5.0,
            ball_spawn_offset: 0.6,
            scene_name: "MainScene".to_string(),
            paddle: PaddleConfig::default(),
            gun: GunConfig::default(),
            power_ups: PowerUpKind::ALL.to_vec(),
            patterns: Pattern::builtin(),
        }
    }
}

impl GameConfig {
    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: GameConfig = serde_json::from_str(&json)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        log::info!(
            "Loaded config from {} ({} patterns)",
            path.display(),
            config.patterns.len()
        );
        Ok(config)
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }

    /// Reject configurations that would fail at level-build time
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.patterns.is_empty() {
            bail!("config has no level patterns");
        }
        if let Some(empty) = self.patterns.iter().find(|p| p.bricks.is_empty()) {
            bail!("pattern '{}' has no brick slots", empty.name);
        }
        if self.max_lives == 0 {
            bail!("max_lives must be at least 1");
        }
        if self.level_step == 0 {
            bail!("level_step must be at least 1");
        }
        if self.gun.shots == 0 {
            bail!("gun.shots must be at least 1");
        }
        if self.paddle.x_boundary < 0.0 {
            bail!("paddle.x_boundary must not be negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        config.validate().unwrap();
        assert_eq!(config.point_multiplier, 10);
        assert_eq!(config.max_lives, 3);
        assert_eq!(config.power_ups.len(), 6);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{ "seed": 7, "gun": { "shots": 3 } }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.gun.shots, 3);
        assert_eq!(config.gun.duration_secs, 5.0);
        assert_eq!(config.patterns, Pattern::builtin());
    }

    #[test]
    fn test_validate_rejects_missing_patterns() {
        let mut config = GameConfig {
            patterns: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.patterns = vec![Pattern {
            name: "walls-only".to_string(),
            bricks: Vec::new(),
            walls: vec![Vec3::ZERO],
        }];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("walls-only"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        let config = GameConfig {
            seed: 99,
            level_step: 2,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(GameConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_reports_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = GameConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing config"));
    }
}
