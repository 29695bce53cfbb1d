//! Fixed timestep simulation tick
//!
//! One call advances the session by `SIM_DT`. Inputs are applied in a fixed
//! order so a seed plus an input sequence always replays identically:
//! UI actions, scene load polling, paddle movement, contacts, due timers.

use super::collision::Contact;
use super::events::GameEvent;
use super::game::Game;
use super::state::GameState;
use crate::consts::SIM_DT;

/// Named intents fired by menus and buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Start,
    Pause,
    Resume,
    Quit,
    /// Leave the game over screen
    ExitToTitle,
    Respawn,
}

impl UiAction {
    /// Bus event carrying this intent
    pub fn event(self) -> GameEvent {
        match self {
            UiAction::Start => GameEvent::StartGame,
            UiAction::Pause => GameEvent::PauseGame,
            UiAction::Resume => GameEvent::ResumeGame,
            UiAction::Quit => GameEvent::QuitGame,
            UiAction::ExitToTitle => GameEvent::ExitGameOver,
            UiAction::Respawn => GameEvent::RespawnGame,
        }
    }
}

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Horizontal paddle input in -1..1
    pub paddle_axis: f32,
    /// UI intents, applied first and in order
    pub actions: Vec<UiAction>,
    /// Contacts reported by the host physics since the last tick
    pub contacts: Vec<Contact>,
}

impl TickInput {
    /// Input carrying a single UI action
    pub fn action(action: UiAction) -> Self {
        Self {
            actions: vec![action],
            ..Default::default()
        }
    }
}

impl Game {
    /// Dispatch a UI intent through the bus
    pub fn action(&mut self, action: UiAction) {
        self.publish(action.event());
    }

    /// Advance the session by one fixed timestep
    pub fn tick(&mut self, input: &TickInput) {
        for &action in &input.actions {
            self.action(action);
        }

        match self.orch.state() {
            GameState::Boot => {
                if let Err(err) = self.orch.poll_scene_load() {
                    log::warn!("Scene load finished but the run could not start: {}", err);
                }
                self.flush();
            }
            GameState::InGame => {
                self.orch.advance(input.paddle_axis, SIM_DT);
                for &contact in &input.contacts {
                    self.contact(contact);
                }
                // Contacts may have ended the run
                if self.orch.state() == GameState::InGame {
                    self.orch.fire_due_timers();
                    self.flush();
                }
            }
            // Time scale is zero: nothing moves, no timer fires
            GameState::Paused | GameState::GameOver => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::platform::headless;
    use crate::settings::GameConfig;
    use crate::sim::Collider;

    fn new_game(seed: u64) -> Game {
        let (host, _) = headless::host(2, Box::new(MemoryStore::new()));
        let config = GameConfig {
            seed,
            ..Default::default()
        };
        Game::new(config, host).unwrap()
    }

    #[test]
    fn test_tick_boot_to_in_game() {
        let mut game = new_game(12345);
        assert_eq!(game.state(), GameState::Boot);

        // Ticks without a start stay in Boot
        game.tick(&TickInput::default());
        assert_eq!(game.state(), GameState::Boot);
        assert_eq!(game.orchestrator().time_ticks(), 0);

        game.tick(&TickInput::action(UiAction::Start));
        assert_eq!(game.state(), GameState::Boot);
        game.tick(&TickInput::default());
        game.tick(&TickInput::default());
        assert_eq!(game.state(), GameState::InGame);
        assert_eq!(game.orchestrator().balls().len(), 1);
    }

    #[test]
    fn test_tick_pause() {
        let mut game = new_game(12345);
        game.tick(&TickInput::action(UiAction::Start));
        while game.state() != GameState::InGame {
            game.tick(&TickInput::default());
        }

        game.tick(&TickInput::action(UiAction::Pause));
        assert_eq!(game.state(), GameState::Paused);
        let x = game.orchestrator().paddle().x;
        game.tick(&TickInput {
            paddle_axis: 1.0,
            ..Default::default()
        });
        assert_eq!(game.orchestrator().paddle().x, x);

        game.tick(&TickInput::action(UiAction::Resume));
        assert_eq!(game.state(), GameState::InGame);
    }

    #[test]
    fn test_paddle_moves_only_in_game() {
        let mut game = new_game(1);
        let right = TickInput {
            paddle_axis: 1.0,
            ..Default::default()
        };
        game.tick(&right);
        assert_eq!(game.orchestrator().paddle().x, 0.0);

        game.tick(&TickInput::action(UiAction::Start));
        while game.state() != GameState::InGame {
            game.tick(&TickInput::default());
        }
        for _ in 0..120 {
            game.tick(&right);
        }
        assert!((game.orchestrator().paddle().x - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_contacts_after_game_over_are_dropped() {
        let mut game = new_game(3);
        game.tick(&TickInput::action(UiAction::Start));
        while game.state() != GameState::InGame {
            game.tick(&TickInput::default());
        }
        let brick = game.orchestrator().level_generator().bricks().handles()[0];

        for _ in 0..3 {
            let ball = game.orchestrator().balls().handles()[0];
            game.tick(&TickInput {
                contacts: vec![
                    Contact::new(Collider::Ball(ball), Collider::KillZone),
                    Contact::new(Collider::Ball(ball), Collider::Brick(brick)),
                ],
                ..Default::default()
            });
        }
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.orchestrator().score(), 0);
    }

    #[test]
    fn test_determinism() {
        // Two sessions with the same seed and inputs end in the same state
        let mut game1 = new_game(99999);
        let mut game2 = new_game(99999);

        let mut inputs = vec![TickInput::action(UiAction::Start)];
        inputs.extend((0..4).map(|_| TickInput::default()));
        inputs.push(TickInput {
            paddle_axis: -0.5,
            ..Default::default()
        });

        for input in &inputs {
            game1.tick(input);
            game2.tick(input);
        }

        let (a, b) = (game1.orchestrator(), game2.orchestrator());
        assert_eq!(a.time_ticks(), b.time_ticks());
        assert_eq!(a.balls().handles(), b.balls().handles());
        let strengths = |g: &Game| {
            g.orchestrator()
                .level_generator()
                .bricks()
                .iter()
                .map(|(h, b)| (h, b.initial_strength(), b.position))
                .collect::<Vec<_>>()
        };
        assert_eq!(strengths(&game1), strengths(&game2));
        assert!((a.paddle().x - b.paddle().x).abs() < 0.0001);
    }
}
