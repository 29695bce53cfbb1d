//! Power-up kinds and the level-scaled spawn roll

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::registry::Handle;
use super::stage::{EntityKind, Stage};
use crate::consts::POWER_UP_ROLL_RANGE;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Paddle grows
    SizeUp,
    /// Paddle moves faster
    SpeedUp,
    /// Bricks stop blocking for a while
    Bulldozer,
    /// Extra ball at the paddle
    AddBall,
    /// Restore one life
    AddLife,
    /// Paddle fires a bullet volley
    Gun,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 6] = [
        PowerUpKind::SizeUp,
        PowerUpKind::SpeedUp,
        PowerUpKind::Bulldozer,
        PowerUpKind::AddBall,
        PowerUpKind::AddLife,
        PowerUpKind::Gun,
    ];
}

/// Rolls for a power-up each time a brick is destroyed
#[derive(Debug, Clone)]
pub struct PowerUpSpawner {
    rng: Pcg32,
    /// Candidate kinds. Repeating a kind raises its odds.
    kinds: Vec<PowerUpKind>,
}

impl PowerUpSpawner {
    pub fn new(seed: u64, kinds: Vec<PowerUpKind>) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            kinds,
        }
    }

    /// Decide whether a power-up drops at `level`, and which one.
    ///
    /// Draws uniformly from `[0, 99)` and drops iff the draw is below the
    /// level, so level 0 never drops and level 99 and up always does.
    pub fn roll(&mut self, level: u32) -> Option<PowerUpKind> {
        let draw = self.rng.random_range(0..POWER_UP_ROLL_RANGE);
        if draw >= level || self.kinds.is_empty() {
            return None;
        }
        let index = self.rng.random_range(0..self.kinds.len());
        Some(self.kinds[index])
    }

    /// Roll and, on success, spawn the power-up at `position`
    pub fn maybe_spawn(
        &mut self,
        stage: &mut Stage,
        position: Vec3,
        level: u32,
    ) -> Option<(Handle, PowerUpKind)> {
        let kind = self.roll(level)?;
        let handle = stage.spawn(EntityKind::PowerUp(kind), position);
        log::debug!("Power-up {:?} dropped at {}", kind, position);
        Some((handle, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_zero_never_spawns() {
        let mut spawner = PowerUpSpawner::new(7, PowerUpKind::ALL.to_vec());
        for _ in 0..2000 {
            assert_eq!(spawner.roll(0), None);
        }
    }

    #[test]
    fn test_level_99_always_spawns() {
        let mut spawner = PowerUpSpawner::new(7, PowerUpKind::ALL.to_vec());
        for _ in 0..2000 {
            assert!(spawner.roll(99).is_some());
            assert!(spawner.roll(500).is_some());
        }
    }

    #[test]
    fn test_only_configured_kinds_drop() {
        let mut spawner = PowerUpSpawner::new(3, vec![PowerUpKind::Gun, PowerUpKind::Gun]);
        for _ in 0..200 {
            assert_eq!(spawner.roll(99), Some(PowerUpKind::Gun));
        }
    }

    #[test]
    fn test_empty_kind_list_never_spawns() {
        let mut spawner = PowerUpSpawner::new(3, Vec::new());
        assert_eq!(spawner.roll(99), None);
    }

    #[test]
    fn test_drop_rate_tracks_level() {
        let mut spawner = PowerUpSpawner::new(11, PowerUpKind::ALL.to_vec());
        let drops = (0..9900).filter(|_| spawner.roll(33).is_some()).count();
        // Expected 3300; allow generous slack for a seeded sample
        assert!((2800..3800).contains(&drops), "drops = {}", drops);
    }
}
