//! Game phase machine and clamped counters
//!
//! The phase only changes through `PhaseMachine::transition`, which checks the
//! transition table. There is no setter that bypasses it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameState {
    /// Title screen, waiting for a run to start
    #[default]
    Boot,
    /// Active gameplay
    InGame,
    /// Gameplay frozen by the player
    Paused,
    /// Run ended, final score on screen
    GameOver,
}

impl GameState {
    /// Whether `self -> to` is a legal transition
    pub fn can_transition_to(self, to: GameState) -> bool {
        use GameState::*;
        matches!(
            (self, to),
            (Boot, InGame) | (InGame, Paused) | (Paused, InGame) | (InGame, GameOver) | (GameOver, Boot)
        )
    }

    /// Host time scale while in this phase
    pub fn time_scale(self) -> f32 {
        match self {
            GameState::Boot | GameState::InGame => 1.0,
            GameState::Paused | GameState::GameOver => 0.0,
        }
    }
}

/// Rejected phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub from: GameState,
    pub to: GameState,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal game state transition {:?} -> {:?}", self.from, self.to)
    }
}

impl std::error::Error for TransitionError {}

/// Current and previous phase
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PhaseMachine {
    current: GameState,
    previous: GameState,
}

impl PhaseMachine {
    pub fn current(&self) -> GameState {
        self.current
    }

    pub fn previous(&self) -> GameState {
        self.previous
    }

    /// Move to `to` if the transition table allows it
    pub fn transition(&mut self, to: GameState) -> Result<(), TransitionError> {
        if !self.current.can_transition_to(to) {
            return Err(TransitionError {
                from: self.current,
                to,
            });
        }
        self.previous = self.current;
        self.current = to;
        Ok(())
    }
}

/// Unsigned counter clamped to `[0, max]` on every mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    value: u32,
    max: u32,
}

impl Counter {
    pub fn new(value: u32, max: u32) -> Self {
        Self {
            value: value.min(max),
            max,
        }
    }

    pub fn get(&self) -> u32 {
        self.value
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Add a signed delta, saturating at both bounds. Returns the new value.
    pub fn add(&mut self, delta: i64) -> u32 {
        self.set(self.value as i64 + delta)
    }

    /// Store `value` clamped to the counter's range. Returns the new value.
    pub fn set(&mut self, value: i64) -> u32 {
        self.value = value.clamp(0, self.max as i64) as u32;
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    pub fn is_full(&self) -> bool {
        self.value == self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{MAX_LEVEL, MAX_SCORE};
    use proptest::prelude::*;

    #[test]
    fn test_transition_table() {
        use GameState::*;
        let all = [Boot, InGame, Paused, GameOver];
        let legal = [
            (Boot, InGame),
            (InGame, Paused),
            (Paused, InGame),
            (InGame, GameOver),
            (GameOver, Boot),
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_phase_machine_keeps_previous() {
        let mut phase = PhaseMachine::default();
        assert_eq!(phase.current(), GameState::Boot);

        phase.transition(GameState::InGame).unwrap();
        phase.transition(GameState::Paused).unwrap();
        assert_eq!(phase.current(), GameState::Paused);
        assert_eq!(phase.previous(), GameState::InGame);
    }

    #[test]
    fn test_rejected_transition_leaves_state_untouched() {
        let mut phase = PhaseMachine::default();
        let err = phase.transition(GameState::GameOver).unwrap_err();
        assert_eq!(err.from, GameState::Boot);
        assert_eq!(err.to, GameState::GameOver);
        assert_eq!(phase.current(), GameState::Boot);
        assert_eq!(phase.previous(), GameState::Boot);
    }

    #[test]
    fn test_counter_saturates() {
        let mut lives = Counter::new(3, 3);
        assert_eq!(lives.add(1), 3);
        assert_eq!(lives.add(-5), 0);
        assert!(lives.is_zero());
        assert_eq!(Counter::new(10, 3).get(), 3);
    }

    proptest! {
        #[test]
        fn score_and_level_stay_in_range(deltas in proptest::collection::vec(-2_000_000i64..2_000_000, 0..64)) {
            let mut score = Counter::new(0, MAX_SCORE);
            let mut level = Counter::new(0, MAX_LEVEL);
            for delta in deltas {
                let s = score.add(delta);
                let l = level.add(delta / 1000);
                prop_assert!(s <= MAX_SCORE);
                prop_assert!(l <= MAX_LEVEL);
            }
        }
    }
}
