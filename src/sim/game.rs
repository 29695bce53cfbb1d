//! Game orchestrator
//!
//! `Orchestrator` owns every piece of run state (phase, score, level, lives,
//! live entities, timers) and implements the gameplay rules. `Game` pairs it
//! with the event bus: UI intents and collision outcomes become events, the
//! bus routes them to the orchestrator, and the orchestrator re-broadcasts
//! phase changes for presentation subscribers.
//!
//! Everything is constructed once in `Game::new` from a `GameConfig` and a
//! `Host`. There are no globals.

use std::fmt;

use glam::Vec3;

use super::brick::HitOutcome;
use super::collision::{Contact, Interaction, Striker, classify};
use super::events::{DispatchReport, EventBus, EventKind, GameEvent, Outbox, SubscriptionId};
use super::level::{LevelError, LevelGenerator};
use super::paddle::Paddle;
use super::powerup::{PowerUpKind, PowerUpSpawner};
use super::registry::{Handle, Registry};
use super::stage::{EntityKind, Stage};
use super::state::{Counter, GameState, PhaseMachine, TransitionError};
use super::timers::{TimedAction, TimerQueue, TimerScope};
use crate::consts::*;
use crate::highscores::MaxScore;
use crate::persistence::KeyValueStore;
use crate::platform::{EntityWorld, Presentation, SceneLoad, SceneLoader};
use crate::secs_to_ticks;
use crate::settings::GameConfig;

/// Seed offsets so layout and power-up rolls use independent streams
const LEVEL_RNG_STREAM: u64 = 0x4C45_5645_4C00;
const POWER_UP_RNG_STREAM: u64 = 0x504F_5745_5200;

/// Host engine collaborators, injected at construction
pub struct Host {
    pub world: Box<dyn EntityWorld>,
    pub presentation: Box<dyn Presentation>,
    pub scenes: Box<dyn SceneLoader>,
    pub store: Box<dyn KeyValueStore>,
}

/// Why an orchestrator request did not go through
#[derive(Debug, Clone, PartialEq)]
pub enum GameError {
    /// Request not valid in the current state
    Rejected {
        request: &'static str,
        state: GameState,
    },
    /// Start requested while the previous start is still loading
    StartPending,
    Transition(TransitionError),
    Level(LevelError),
}

impl GameError {
    /// Rejections are expected UI noise, not faults
    pub fn is_rejection(&self) -> bool {
        !matches!(self, GameError::Level(_))
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::Rejected { request, state } => {
                write!(f, "'{}' is not allowed while {:?}", request, state)
            }
            GameError::StartPending => write!(f, "a run is already starting"),
            GameError::Transition(err) => err.fmt(f),
            GameError::Level(err) => write!(f, "level build failed: {}", err),
        }
    }
}

impl std::error::Error for GameError {}

impl From<TransitionError> for GameError {
    fn from(err: TransitionError) -> Self {
        GameError::Transition(err)
    }
}

impl From<LevelError> for GameError {
    fn from(err: LevelError) -> Self {
        GameError::Level(err)
    }
}

/// Log rejections and swallow them; keep real faults for the bus to report
fn tolerate(err: GameError) -> anyhow::Result<()> {
    if err.is_rejection() {
        log::warn!("Ignored request: {}", err);
        Ok(())
    } else {
        Err(err.into())
    }
}

/// Owner of all run state and gameplay rules
pub struct Orchestrator {
    config: GameConfig,
    phase: PhaseMachine,
    score: Counter,
    level: Counter,
    lives: Counter,
    balls: Registry<()>,
    bullets: Registry<()>,
    power_ups: Registry<PowerUpKind>,
    paddle: Paddle,
    level_gen: LevelGenerator,
    spawner: PowerUpSpawner,
    timers: TimerQueue<TimedAction>,
    stage: Stage,
    presentation: Box<dyn Presentation>,
    scenes: Box<dyn SceneLoader>,
    max_score: MaxScore,
    /// Scene load a starting run is waiting on
    pending_load: Option<SceneLoad>,
    /// Simulation clock, only advances while in game
    time_ticks: u64,
    outbox: Vec<GameEvent>,
}

impl Outbox for Orchestrator {
    fn emit(&mut self, event: GameEvent) {
        self.outbox.push(event);
    }

    fn take_emitted(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.outbox)
    }
}

impl Orchestrator {
    pub fn new(config: GameConfig, host: Host) -> Self {
        let Host {
            world,
            presentation,
            scenes,
            store,
        } = host;
        let level_gen = LevelGenerator::new(
            config.seed ^ LEVEL_RNG_STREAM,
            config.patterns.clone(),
            config.point_multiplier,
        );
        let spawner = PowerUpSpawner::new(config.seed ^ POWER_UP_RNG_STREAM, config.power_ups.clone());

        Self {
            phase: PhaseMachine::default(),
            score: Counter::new(0, MAX_SCORE),
            level: Counter::new(0, MAX_LEVEL),
            lives: Counter::new(config.max_lives, config.max_lives),
            balls: Registry::new(),
            bullets: Registry::new(),
            power_ups: Registry::new(),
            paddle: Paddle::new(&config.paddle),
            level_gen,
            spawner,
            timers: TimerQueue::new(),
            stage: Stage::new(world),
            presentation,
            scenes,
            max_score: MaxScore::new(store),
            pending_load: None,
            time_ticks: 0,
            outbox: Vec::new(),
            config,
        }
    }

    /// Title screen setup: stored max score, full lives, boot screen
    fn boot(&mut self) {
        let max_score = self.max_score.read();
        self.presentation.write_max_score(max_score);
        self.restore_life_indicators();
        self.presentation.show_screen(self.phase.current());
        self.stage.set_time_scale(self.phase.current().time_scale());
        self.stage.update_paddle(&self.paddle);
        log::info!("Booted, max score {}", max_score);
    }

    pub fn state(&self) -> GameState {
        self.phase.current()
    }

    pub fn previous_state(&self) -> GameState {
        self.phase.previous()
    }

    pub fn score(&self) -> u32 {
        self.score.get()
    }

    pub fn level(&self) -> u32 {
        self.level.get()
    }

    pub fn lives(&self) -> u32 {
        self.lives.get()
    }

    /// Stored max score
    pub fn max_score(&self) -> u32 {
        self.max_score.read()
    }

    pub fn balls(&self) -> &Registry<()> {
        &self.balls
    }

    pub fn bullets(&self) -> &Registry<()> {
        &self.bullets
    }

    pub fn power_ups(&self) -> &Registry<PowerUpKind> {
        &self.power_ups
    }

    pub fn level_generator(&self) -> &LevelGenerator {
        &self.level_gen
    }

    pub fn paddle(&self) -> &Paddle {
        &self.paddle
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// True between `start_game` and the scene load completing
    pub fn is_starting(&self) -> bool {
        self.pending_load.is_some()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    fn require(&self, state: GameState, request: &'static str) -> Result<(), GameError> {
        if self.phase.current() == state {
            Ok(())
        } else {
            Err(GameError::Rejected {
                request,
                state: self.phase.current(),
            })
        }
    }

    /// The only place the phase changes
    fn transition(&mut self, to: GameState) -> Result<(), TransitionError> {
        self.phase.transition(to)?;
        let (current, previous) = (self.phase.current(), self.phase.previous());
        self.stage.set_time_scale(current.time_scale());
        log::info!("Game state {:?} -> {:?}", previous, current);
        self.emit(GameEvent::GameStateChanged { current, previous });
        Ok(())
    }

    /// Begin a run: reset score and lives, build the first level, load the play area.
    ///
    /// The switch to `InGame` happens in `poll_scene_load` once the host
    /// reports the scene ready.
    pub fn start_game(&mut self) -> Result<(), GameError> {
        self.require(GameState::Boot, "start game")?;
        if self.pending_load.is_some() {
            return Err(GameError::StartPending);
        }

        let mut level = self.level;
        let next = level.add(self.config.level_step as i64);
        if let Err(err) = self.level_gen.build_level(&mut self.stage, &mut self.timers, next) {
            log::error!("Cannot start run: {}", err);
            return Err(err.into());
        }
        self.level = level;
        self.presentation.write_level(next);

        self.score.set(0);
        self.presentation.write_score(0);
        self.lives.set(self.config.max_lives as i64);
        self.restore_life_indicators();
        self.paddle.reset(&self.config.paddle);
        self.stage.update_paddle(&self.paddle);

        self.pending_load = Some(self.scenes.load_async(&self.config.scene_name));
        log::info!("Starting run at level {}, loading '{}'", next, self.config.scene_name);
        Ok(())
    }

    /// Finish a pending start once the scene is loaded. Returns true when the run began.
    pub fn poll_scene_load(&mut self) -> Result<bool, GameError> {
        let Some(load) = self.pending_load else {
            return Ok(false);
        };
        if !self.scenes.is_complete(load) {
            return Ok(false);
        }
        self.pending_load = None;
        self.transition(GameState::InGame)?;
        self.spawn_ball();
        Ok(true)
    }

    pub fn pause(&mut self) -> Result<(), GameError> {
        self.require(GameState::InGame, "pause")?;
        self.transition(GameState::Paused)?;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), GameError> {
        self.require(GameState::Paused, "resume")?;
        self.transition(GameState::InGame)?;
        Ok(())
    }

    /// Score a destroyed brick, maybe drop a power-up, rebuild when the level is clear
    pub fn on_brick_destroyed(
        &mut self,
        brick: Handle,
        position: Vec3,
        points: u32,
    ) -> Result<(), GameError> {
        if self.phase.current() == GameState::GameOver {
            log::debug!("Ignoring destruction of brick {} after game over", brick);
            return Ok(());
        }
        if self.level_gen.eliminate_brick(brick).is_none() {
            log::debug!("Brick {} is not registered, ignoring", brick);
            return Ok(());
        }

        if let Some((handle, kind)) =
            self.spawner.maybe_spawn(&mut self.stage, position, self.level.get())
        {
            self.power_ups.add(handle, kind);
        }
        let score = self.score.add(points as i64);
        self.presentation.write_score(score);
        log::debug!("Brick {} destroyed for {} points, score {}", brick, points, score);

        if self.level_gen.brick_count() == 0 {
            self.advance_level()?;
        }
        Ok(())
    }

    fn advance_level(&mut self) -> Result<(), GameError> {
        let next = self.level.add(self.config.level_step as i64);
        self.presentation.write_level(next);
        log::info!("Level cleared, advancing to level {}", next);
        if let Err(err) = self.level_gen.build_level(&mut self.stage, &mut self.timers, next) {
            log::error!("Cannot build level {}: {}", next, err);
            return Err(err.into());
        }
        Ok(())
    }

    /// Forget a lost ball. Losing the last one costs a life.
    ///
    /// Only valid in game: the run can only end from `InGame`, so a loss
    /// reported while paused is rejected and the ball stays live.
    pub fn on_ball_destroyed(&mut self, ball: Handle) -> Result<(), GameError> {
        self.require(GameState::InGame, "lose ball")?;
        if self.balls.remove(ball).is_none() {
            log::debug!("Ball {} is not live, ignoring", ball);
            return Ok(());
        }
        if !self.balls.is_empty() {
            return Ok(());
        }

        let lives = self.lives.add(-1);
        self.presentation.set_life_alpha(lives as usize, LIFE_SPENT_ALPHA);
        log::info!("Last ball lost, {} lives left", lives);
        if lives > 0 {
            self.spawn_ball();
            Ok(())
        } else {
            self.end_run()
        }
    }

    /// Game over: persist the max score, tear down the level, show final scores
    fn end_run(&mut self) -> Result<(), GameError> {
        self.require(GameState::InGame, "end run")?;
        let score = self.score.get();
        let best = self.max_score.record(score);

        self.level_gen.clear_level(&mut self.stage, &mut self.timers);
        despawn_all(&mut self.stage, &mut self.balls);
        despawn_all(&mut self.stage, &mut self.bullets);
        despawn_all(&mut self.stage, &mut self.power_ups);
        self.timers.cancel_scope(TimerScope::Run);

        self.transition(GameState::GameOver)?;
        self.presentation.write_final_score(score, best);
        self.scenes.unload(&self.config.scene_name);
        log::info!("Game over: score {}, max score {}", score, best);
        Ok(())
    }

    /// Leave the game over screen for the title screen
    pub fn on_exit_game_over(&mut self) -> Result<(), GameError> {
        self.require(GameState::GameOver, "exit game over")?;
        self.score.set(0);
        self.level.set(0);
        self.presentation.write_max_score(self.max_score.read());
        self.transition(GameState::Boot)?;
        self.restore_life_indicators();
        Ok(())
    }

    /// Start over. From `Paused` the current run is forfeited first.
    pub fn respawn(&mut self) -> Result<(), GameError> {
        match self.phase.current() {
            GameState::GameOver => {}
            GameState::Paused => {
                self.transition(GameState::InGame)?;
                self.end_run()?;
            }
            state => {
                return Err(GameError::Rejected {
                    request: "respawn",
                    state,
                });
            }
        }
        self.on_exit_game_over()?;
        self.start_game()
    }

    pub fn quit(&mut self) {
        log::info!("Quit requested");
        self.presentation.request_quit();
    }

    /// Apply a caught power-up
    pub fn on_power_up_collected(&mut self, kind: PowerUpKind) -> Result<(), GameError> {
        self.require(GameState::InGame, "collect power-up")?;
        log::debug!("Power-up collected: {:?}", kind);
        let paddle = self.config.paddle.clone();
        match kind {
            PowerUpKind::SizeUp => {
                if self.paddle.grow(paddle.size_step, paddle.max_scale) {
                    self.stage.update_paddle(&self.paddle);
                }
            }
            PowerUpKind::SpeedUp => {
                if self.paddle.speed_up(paddle.speed_step, paddle.max_speed) {
                    self.stage.update_paddle(&self.paddle);
                }
            }
            PowerUpKind::Bulldozer => self.emit(GameEvent::BulldozerActivated),
            PowerUpKind::AddBall => self.add_ball()?,
            PowerUpKind::AddLife => self.add_life(),
            PowerUpKind::Gun => self.start_gun_volley(),
        }
        Ok(())
    }

    /// Extra ball at the paddle
    pub fn add_ball(&mut self) -> Result<(), GameError> {
        self.require(GameState::InGame, "add ball")?;
        self.spawn_ball();
        Ok(())
    }

    /// One more life, up to the cap
    pub fn add_life(&mut self) {
        if self.lives.is_full() {
            return;
        }
        let lives = self.lives.add(1);
        self.presentation
            .set_life_alpha(lives as usize - 1, LIFE_AVAILABLE_ALPHA);
    }

    /// Bricks stop blocking for the configured duration
    pub fn activate_bulldozer(&mut self) {
        let duration = secs_to_ticks(self.config.bulldozer_secs);
        self.level_gen
            .activate_bulldozer(&mut self.stage, &mut self.timers, self.time_ticks, duration);
    }

    /// Schedule the gun volley: first shot now, the rest spread over the duration
    fn start_gun_volley(&mut self) {
        let shots = self.config.gun.shots.max(1);
        let spacing = secs_to_ticks(self.config.gun.duration_secs / shots as f32);
        for shot in 0..shots as u64 {
            self.timers.schedule(
                self.time_ticks + shot * spacing,
                TimerScope::Run,
                TimedAction::FireBullet,
            );
        }
        log::debug!("Gun volley: {} shots every {} ticks", shots, spacing);
    }

    fn fire_bullet(&mut self) {
        let position = Vec3::new(self.paddle.x, self.config.paddle.y, 0.0);
        let handle = self.stage.spawn(EntityKind::Bullet, position);
        self.bullets.add(handle, ());
    }

    fn spawn_ball(&mut self) -> Handle {
        let position = Vec3::new(
            self.paddle.x,
            self.config.paddle.y + self.config.ball_spawn_offset,
            0.0,
        );
        let handle = self.stage.spawn(EntityKind::Ball, position);
        self.balls.add(handle, ());
        handle
    }

    fn restore_life_indicators(&mut self) {
        for index in 0..self.lives.max() as usize {
            self.presentation.set_life_alpha(index, LIFE_AVAILABLE_ALPHA);
        }
    }

    /// Advance the clock one tick and move the paddle
    pub fn advance(&mut self, paddle_axis: f32, dt: f32) {
        self.time_ticks += 1;
        if paddle_axis != 0.0 {
            self.paddle.drive(paddle_axis, dt);
            self.stage.update_paddle(&self.paddle);
        }
    }

    /// Run every timer due at the current tick
    pub fn fire_due_timers(&mut self) {
        for action in self.timers.drain_due(self.time_ticks) {
            match action {
                TimedAction::RestoreBrickSolidity => self.level_gen.restore_solidity(&mut self.stage),
                TimedAction::FireBullet => self.fire_bullet(),
            }
        }
    }

    /// Apply one physics contact. Ignored outside gameplay.
    pub fn on_contact(&mut self, contact: Contact) {
        if self.phase.current() != GameState::InGame {
            log::debug!("Contact outside gameplay ignored: {:?}", contact);
            return;
        }
        match classify(contact) {
            Interaction::BallLost(ball) => {
                if self.balls.contains(ball) {
                    self.stage.despawn(ball);
                    self.emit(GameEvent::BallDestroyed { ball });
                }
            }
            Interaction::BrickStruck { brick, striker } => {
                let live = match striker {
                    Striker::Ball(ball) => self.balls.contains(ball),
                    Striker::Bullet(bullet) => self.spend_bullet(bullet),
                };
                if live {
                    self.strike_brick(brick);
                }
            }
            Interaction::BulletSpent(bullet) => {
                self.spend_bullet(bullet);
            }
            Interaction::PowerUpCaught { power_up, .. } => {
                if let Some(kind) = self.power_ups.remove(power_up) {
                    self.stage.despawn(power_up);
                    self.emit(GameEvent::PowerUpCollected { kind });
                }
            }
            Interaction::PowerUpMissed(power_up) => {
                if self.power_ups.remove(power_up).is_some() {
                    self.stage.despawn(power_up);
                }
            }
            Interaction::Ignored => {}
        }
    }

    /// Remove a bullet. Returns false if it was already gone.
    fn spend_bullet(&mut self, bullet: Handle) -> bool {
        if self.bullets.remove(bullet).is_none() {
            return false;
        }
        self.stage.despawn(bullet);
        true
    }

    /// Solid bricks lose one hit; non-solid bricks (bulldozer) break outright
    fn strike_brick(&mut self, handle: Handle) {
        let Some(brick) = self.level_gen.brick_mut(handle) else {
            return;
        };
        let outcome = if brick.solid {
            brick.on_hit()
        } else {
            brick.demolish()
        };
        match outcome {
            HitOutcome::Damaged { remaining } => {
                self.presentation.set_brick_strength(handle, remaining);
            }
            HitOutcome::Destroyed { position, points } => {
                // Announce first, then release the entity
                self.emit(GameEvent::BrickDestroyed {
                    brick: handle,
                    position,
                    points,
                });
                self.stage.despawn(handle);
            }
            HitOutcome::AlreadyDestroyed => {}
        }
    }
}

fn despawn_all<T>(stage: &mut Stage, registry: &mut Registry<T>) {
    for handle in registry.clear() {
        stage.despawn(handle);
    }
}

/// Orchestrator wired to its event bus
pub struct Game {
    pub(super) bus: EventBus<Orchestrator>,
    pub(super) orch: Orchestrator,
}

impl Game {
    /// Validate the config, wire the bus and show the title screen
    pub fn new(config: GameConfig, host: Host) -> anyhow::Result<Self> {
        config.validate()?;
        let mut game = Self {
            bus: EventBus::new(),
            orch: Orchestrator::new(config, host),
        };
        game.wire();
        game.orch.boot();
        Ok(game)
    }

    fn wire(&mut self) {
        let bus = &mut self.bus;
        bus.subscribe(EventKind::StartGame, "orchestrator.start_game", |o, _| {
            o.start_game().or_else(tolerate)
        });
        bus.subscribe(EventKind::PauseGame, "orchestrator.pause", |o, _| {
            o.pause().or_else(tolerate)
        });
        bus.subscribe(EventKind::ResumeGame, "orchestrator.resume", |o, _| {
            o.resume().or_else(tolerate)
        });
        bus.subscribe(EventKind::ExitGameOver, "orchestrator.exit_game_over", |o, _| {
            o.on_exit_game_over().or_else(tolerate)
        });
        bus.subscribe(EventKind::RespawnGame, "orchestrator.respawn", |o, _| {
            o.respawn().or_else(tolerate)
        });
        bus.subscribe(EventKind::QuitGame, "orchestrator.quit", |o, _| {
            o.quit();
            Ok(())
        });
        bus.subscribe(EventKind::BrickDestroyed, "orchestrator.brick_destroyed", |o, ev| {
            match *ev {
                GameEvent::BrickDestroyed {
                    brick,
                    position,
                    points,
                } => o.on_brick_destroyed(brick, position, points).or_else(tolerate),
                _ => Ok(()),
            }
        });
        bus.subscribe(EventKind::BallDestroyed, "orchestrator.ball_destroyed", |o, ev| {
            match *ev {
                GameEvent::BallDestroyed { ball } => o.on_ball_destroyed(ball).or_else(tolerate),
                _ => Ok(()),
            }
        });
        bus.subscribe(EventKind::PowerUpCollected, "orchestrator.power_up", |o, ev| {
            match *ev {
                GameEvent::PowerUpCollected { kind } => {
                    o.on_power_up_collected(kind).or_else(tolerate)
                }
                _ => Ok(()),
            }
        });
        bus.subscribe(EventKind::BulldozerActivated, "level.bulldozer", |o, _| {
            o.activate_bulldozer();
            Ok(())
        });
        bus.subscribe(EventKind::GameStateChanged, "presentation.screens", |o, ev| {
            if let GameEvent::GameStateChanged { current, .. } = *ev {
                o.presentation.show_screen(current);
            }
            Ok(())
        });
    }

    /// Add an external subscriber, after the built-in ones
    pub fn subscribe<F>(&mut self, kind: EventKind, name: &'static str, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut Orchestrator, &GameEvent) -> anyhow::Result<()> + 'static,
    {
        self.bus.subscribe(kind, name, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Dispatch an event and everything it triggers
    pub fn publish(&mut self, event: GameEvent) -> DispatchReport {
        self.bus.publish(&mut self.orch, event)
    }

    /// Deliver one physics contact and dispatch its consequences
    pub fn contact(&mut self, contact: Contact) {
        self.orch.on_contact(contact);
        self.flush();
    }

    /// Dispatch events the orchestrator emitted outside a bus dispatch
    pub(super) fn flush(&mut self) {
        for event in self.orch.take_emitted() {
            self.bus.publish(&mut self.orch, event);
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orch
    }

    pub fn state(&self) -> GameState {
        self.orch.state()
    }
}
