//! Level layout generation and brick bookkeeping
//!
//! A level is one randomly chosen `Pattern` instantiated at a difficulty:
//! walls go in the wall slots, bricks of random strength in the brick slots.
//! Walls are never counted as bricks, so they never block a level clear.

use std::fmt;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::brick::Brick;
use super::registry::{Handle, Registry};
use super::stage::{EntityKind, Stage};
use super::timers::{TimedAction, TimerId, TimerQueue, TimerScope};

/// Brick grid spacing used by the built-in patterns
const COLUMN_SPACING: f32 = 1.6;
const ROW_SPACING: f32 = 0.7;
/// Height of the top brick row
const TOP_ROW_Y: f32 = 4.5;

/// Immutable layout template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    /// Destructible brick positions
    pub bricks: Vec<Vec3>,
    /// Indestructible wall positions
    #[serde(default)]
    pub walls: Vec<Vec3>,
}

impl Pattern {
    /// Layouts shipped with the game
    pub fn builtin() -> Vec<Pattern> {
        vec![Self::classic(), Self::checker(), Self::fortress()]
    }

    /// Full grid, 9 columns by 4 rows
    fn classic() -> Pattern {
        let bricks = grid(9, 4).map(|(col, row)| slot(col, row, 9)).collect();
        Pattern {
            name: "classic".to_string(),
            bricks,
            walls: Vec::new(),
        }
    }

    /// Every other cell of a 9 by 5 grid
    fn checker() -> Pattern {
        let bricks = grid(9, 5)
            .filter(|(col, row)| (col + row) % 2 == 0)
            .map(|(col, row)| slot(col, row, 9))
            .collect();
        Pattern {
            name: "checker".to_string(),
            bricks,
            walls: Vec::new(),
        }
    }

    /// Brick core guarded by wall columns on both sides
    fn fortress() -> Pattern {
        let (walls, bricks) = grid(9, 4)
            .map(|(col, row)| ((col, row), slot(col, row, 9)))
            .partition::<Vec<_>, _>(|((col, row), _)| (*col == 0 || *col == 8) && *row > 0);
        Pattern {
            name: "fortress".to_string(),
            bricks: bricks.into_iter().map(|(_, pos)| pos).collect(),
            walls: walls.into_iter().map(|(_, pos)| pos).collect(),
        }
    }
}

fn grid(cols: u32, rows: u32) -> impl Iterator<Item = (u32, u32)> {
    (0..rows).flat_map(move |row| (0..cols).map(move |col| (col, row)))
}

fn slot(col: u32, row: u32, cols: u32) -> Vec3 {
    let half_width = (cols - 1) as f32 * COLUMN_SPACING / 2.0;
    Vec3::new(
        col as f32 * COLUMN_SPACING - half_width,
        TOP_ROW_Y - row as f32 * ROW_SPACING,
        0.0,
    )
}

/// Pattern data problems that make a level impossible to build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    /// No patterns configured at all
    NoPatterns,
    /// The named pattern has no brick slots, so it could never be cleared
    EmptyPattern(String),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::NoPatterns => write!(f, "no level patterns configured"),
            LevelError::EmptyPattern(name) => write!(f, "pattern '{}' has no brick slots", name),
        }
    }
}

impl std::error::Error for LevelError {}

/// Builds levels and tracks their bricks and walls
#[derive(Debug)]
pub struct LevelGenerator {
    rng: Pcg32,
    patterns: Vec<Pattern>,
    point_multiplier: u32,
    bricks: Registry<Brick>,
    walls: Registry<()>,
    /// Pending bulldozer revert, if a bulldozer is active
    bulldozer: Option<TimerId>,
}

impl LevelGenerator {
    pub fn new(seed: u64, patterns: Vec<Pattern>, point_multiplier: u32) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            patterns,
            point_multiplier,
            bricks: Registry::new(),
            walls: Registry::new(),
            bulldozer: None,
        }
    }

    /// Replace the current level with a fresh one at `level` difficulty.
    ///
    /// Returns the number of bricks spawned. On error nothing is touched.
    pub fn build_level(
        &mut self,
        stage: &mut Stage,
        timers: &mut TimerQueue<TimedAction>,
        level: u32,
    ) -> Result<usize, LevelError> {
        if self.patterns.is_empty() {
            return Err(LevelError::NoPatterns);
        }
        let index = self.rng.random_range(0..self.patterns.len());
        let pattern = &self.patterns[index];
        if pattern.bricks.is_empty() {
            return Err(LevelError::EmptyPattern(pattern.name.clone()));
        }
        let pattern = pattern.clone();

        self.clear_level(stage, timers);

        for &position in &pattern.walls {
            let handle = stage.spawn(EntityKind::Wall, position);
            self.walls.add(handle, ());
        }

        let max_strength = level.max(1);
        for &position in &pattern.bricks {
            let strength = self.rng.random_range(1..=max_strength);
            let handle = stage.spawn(EntityKind::Brick { strength }, position);
            self.bricks
                .add(handle, Brick::new(handle, position, strength, self.point_multiplier));
        }

        log::info!(
            "Level {} built from pattern '{}': {} bricks, {} walls",
            level,
            pattern.name,
            self.bricks.len(),
            self.walls.len()
        );
        Ok(self.bricks.len())
    }

    /// Forget a brick whose entity was already destroyed by its own lifecycle
    pub fn eliminate_brick(&mut self, handle: Handle) -> Option<Brick> {
        self.bricks.remove(handle)
    }

    /// Destroy every brick and wall. Safe to call on an empty level.
    pub fn clear_level(&mut self, stage: &mut Stage, timers: &mut TimerQueue<TimedAction>) {
        timers.cancel_scope(TimerScope::Level);
        self.bulldozer = None;

        let bricks = self.bricks.clear();
        let walls = self.walls.clear();
        if bricks.is_empty() && walls.is_empty() {
            return;
        }
        for handle in bricks.iter().chain(walls.iter()) {
            stage.despawn(*handle);
        }
        log::debug!("Level cleared: {} bricks, {} walls", bricks.len(), walls.len());
    }

    /// Make every live brick non-solid until `now + duration_ticks`.
    ///
    /// A second activation before the revert pushes the revert back.
    pub fn activate_bulldozer(
        &mut self,
        stage: &mut Stage,
        timers: &mut TimerQueue<TimedAction>,
        now: u64,
        duration_ticks: u64,
    ) {
        if let Some(pending) = self.bulldozer.take() {
            timers.cancel(pending);
        }
        for (handle, brick) in self.bricks.iter_mut() {
            if brick.solid {
                brick.solid = false;
                stage.set_solid(handle, false);
            }
        }
        self.bulldozer = Some(timers.schedule(
            now + duration_ticks,
            TimerScope::Level,
            TimedAction::RestoreBrickSolidity,
        ));
        log::info!("Bulldozer active for {} ticks", duration_ticks);
    }

    /// End the bulldozer effect
    pub fn restore_solidity(&mut self, stage: &mut Stage) {
        self.bulldozer = None;
        for (handle, brick) in self.bricks.iter_mut() {
            if !brick.solid {
                brick.solid = true;
                stage.set_solid(handle, true);
            }
        }
        log::debug!("Bulldozer expired");
    }

    pub fn bulldozer_active(&self) -> bool {
        self.bulldozer.is_some()
    }

    pub fn brick(&self, handle: Handle) -> Option<&Brick> {
        self.bricks.get(handle)
    }

    pub fn brick_mut(&mut self, handle: Handle) -> Option<&mut Brick> {
        self.bricks.get_mut(handle)
    }

    pub fn bricks(&self) -> &Registry<Brick> {
        &self.bricks
    }

    pub fn brick_count(&self) -> usize {
        self.bricks.len()
    }

    pub fn wall_count(&self) -> usize {
        self.walls.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::{HeadlessWorld, WorldLog};

    fn five_slot_pattern() -> Pattern {
        Pattern {
            name: "row".to_string(),
            bricks: (0..5).map(|i| Vec3::new(i as f32, 4.0, 0.0)).collect(),
            walls: Vec::new(),
        }
    }

    fn stage() -> (Stage, WorldLog) {
        let world = HeadlessWorld::default();
        let log = world.log();
        (Stage::new(Box::new(world)), log)
    }

    #[test]
    fn test_build_level_three_with_five_slots() {
        let (mut stage, _) = stage();
        let mut timers = TimerQueue::new();
        let mut level = LevelGenerator::new(42, vec![five_slot_pattern()], 10);

        let count = level.build_level(&mut stage, &mut timers, 3).unwrap();
        assert_eq!(count, 5);
        assert_eq!(level.brick_count(), 5);
        for (_, brick) in level.bricks().iter() {
            assert!((1..=3).contains(&brick.initial_strength()));
            assert_eq!(brick.points(), brick.initial_strength() * 10);
        }
    }

    #[test]
    fn test_walls_are_not_bricks() {
        let (mut stage, log) = stage();
        let mut timers = TimerQueue::new();
        let pattern = Pattern {
            name: "walled".to_string(),
            bricks: vec![Vec3::ZERO],
            walls: vec![Vec3::X, Vec3::NEG_X],
        };
        let mut level = LevelGenerator::new(1, vec![pattern], 10);
        level.build_level(&mut stage, &mut timers, 1).unwrap();

        assert_eq!(level.brick_count(), 1);
        assert_eq!(level.wall_count(), 2);
        assert_eq!(log.borrow().live_count(), 3);
    }

    #[test]
    fn test_missing_patterns_abort_build() {
        let (mut stage, log) = stage();
        let mut timers = TimerQueue::new();

        let mut none = LevelGenerator::new(1, Vec::new(), 10);
        assert_eq!(none.build_level(&mut stage, &mut timers, 1), Err(LevelError::NoPatterns));

        let empty = Pattern {
            name: "hollow".to_string(),
            bricks: Vec::new(),
            walls: vec![Vec3::ZERO],
        };
        let mut hollow = LevelGenerator::new(1, vec![empty], 10);
        assert_eq!(
            hollow.build_level(&mut stage, &mut timers, 1),
            Err(LevelError::EmptyPattern("hollow".to_string()))
        );
        assert_eq!(log.borrow().live_count(), 0);
    }

    #[test]
    fn test_clear_level_twice() {
        let (mut stage, log) = stage();
        let mut timers = TimerQueue::new();
        let mut level = LevelGenerator::new(9, Pattern::builtin(), 10);
        level.build_level(&mut stage, &mut timers, 4).unwrap();
        let despawns_before = log.borrow().despawned.len();

        level.clear_level(&mut stage, &mut timers);
        assert_eq!(level.brick_count(), 0);
        let despawns_after_first = log.borrow().despawned.len();
        assert!(despawns_after_first > despawns_before);

        level.clear_level(&mut stage, &mut timers);
        assert_eq!(level.brick_count(), 0);
        assert_eq!(log.borrow().despawned.len(), despawns_after_first);
        assert_eq!(log.borrow().live_count(), 0);
    }

    #[test]
    fn test_eliminate_brick_keeps_entity() {
        let (mut stage, log) = stage();
        let mut timers = TimerQueue::new();
        let mut level = LevelGenerator::new(5, vec![five_slot_pattern()], 10);
        level.build_level(&mut stage, &mut timers, 1).unwrap();

        let handle = level.bricks().handles()[0];
        assert!(level.eliminate_brick(handle).is_some());
        assert!(level.eliminate_brick(handle).is_none());
        assert_eq!(level.brick_count(), 4);
        assert!(log.borrow().despawned.is_empty());
    }

    #[test]
    fn test_bulldozer_rearm_and_clear() {
        let (mut stage, log) = stage();
        let mut timers = TimerQueue::new();
        let mut level = LevelGenerator::new(5, vec![five_slot_pattern()], 10);
        level.build_level(&mut stage, &mut timers, 1).unwrap();

        level.activate_bulldozer(&mut stage, &mut timers, 0, 100);
        level.activate_bulldozer(&mut stage, &mut timers, 50, 100);
        assert_eq!(timers.len(), 1, "re-activation replaces the pending revert");
        assert!(level.bricks().iter().all(|(_, b)| !b.solid));
        assert!(log.borrow().non_solid.len() == 5);

        level.clear_level(&mut stage, &mut timers);
        assert!(timers.is_empty(), "clearing the level cancels the revert");
        assert!(!level.bulldozer_active());
    }

    #[test]
    fn test_builtin_patterns_are_usable() {
        for pattern in Pattern::builtin() {
            assert!(!pattern.bricks.is_empty(), "{}", pattern.name);
        }
        let fortress = Pattern::fortress();
        assert_eq!(fortress.walls.len(), 6);
        assert_eq!(fortress.bricks.len(), 30);
    }
}
