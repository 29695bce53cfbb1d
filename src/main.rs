//! Brick Smash headless runner
//!
//! Drives the orchestration core with an autoplay bot instead of an engine:
//! contacts are invented from a seeded RNG, host commands are recorded.
//! Useful to soak-test rules and balance changes.
//!
//! Usage:
//!   RUST_LOG=info cargo run --release -- --ticks 60000 --store prefs.json

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use brick_smash::GameConfig;
use brick_smash::consts::TICKS_PER_SECOND;
use brick_smash::persistence::{JsonFileStore, KeyValueStore, MemoryStore};
use brick_smash::platform::headless;
use brick_smash::sim::{Collider, Contact, Game, GameState, Handle, TickInput, UiAction};

#[derive(Parser, Debug)]
#[command(name = "brick-smash")]
#[command(about = "Run Brick Smash headless with an autoplay bot", version)]
struct Args {
    /// Session seed, overrides the config file
    #[arg(long)]
    seed: Option<u64>,
    /// JSON game config
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the effective config to this path and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,
    /// Simulation ticks to run (120 per second)
    #[arg(long, default_value_t = 36_000)]
    ticks: u64,
    /// JSON file for the max score, in-memory if omitted
    #[arg(long)]
    store: Option<PathBuf>,
    /// Scene load latency in ticks
    #[arg(long, default_value_t = 30)]
    scene_latency: u32,
}

/// Invents player behavior and physics contacts
struct Autoplay {
    rng: Pcg32,
    axis: f32,
    /// Ticks spent on the game over screen
    idle: u64,
}

impl Autoplay {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed ^ 0xB07),
            axis: 0.0,
            idle: 0,
        }
    }

    fn pick(&mut self, handles: &[Handle]) -> Option<Handle> {
        if handles.is_empty() {
            None
        } else {
            Some(handles[self.rng.random_range(0..handles.len())])
        }
    }

    fn next_input(&mut self, game: &Game) -> TickInput {
        let mut input = TickInput::default();
        let orch = game.orchestrator();

        match orch.state() {
            GameState::Boot => {
                if !orch.is_starting() {
                    input.actions.push(UiAction::Start);
                }
            }
            GameState::GameOver => {
                self.idle += 1;
                if self.idle >= 2 * TICKS_PER_SECOND {
                    self.idle = 0;
                    input.actions.push(UiAction::ExitToTitle);
                }
            }
            GameState::Paused => input.actions.push(UiAction::Resume),
            GameState::InGame => {
                self.axis = (self.axis + self.rng.random_range(-0.2..0.2)).clamp(-1.0, 1.0);
                input.paddle_axis = self.axis;

                let balls = orch.balls().handles();
                let bricks = orch.level_generator().bricks().handles();
                if self.rng.random_bool(0.03) {
                    if let (Some(ball), Some(brick)) = (self.pick(&balls), self.pick(&bricks)) {
                        input
                            .contacts
                            .push(Contact::new(Collider::Ball(ball), Collider::Brick(brick)));
                    }
                }
                if self.rng.random_bool(0.002) {
                    if let Some(ball) = self.pick(&balls) {
                        input
                            .contacts
                            .push(Contact::new(Collider::Ball(ball), Collider::KillZone));
                    }
                }
                for (power_up, kind) in orch.power_ups().iter() {
                    let roll: f32 = self.rng.random();
                    if roll < 0.005 {
                        input
                            .contacts
                            .push(Contact::new(Collider::PowerUp(power_up, *kind), Collider::Player));
                    } else if roll < 0.01 {
                        input
                            .contacts
                            .push(Contact::new(Collider::PowerUp(power_up, *kind), Collider::KillZone));
                    }
                }
                for bullet in orch.bullets().handles() {
                    if self.rng.random_bool(0.05) {
                        let other = match self.pick(&bricks) {
                            Some(brick) if self.rng.random_bool(0.5) => Collider::Brick(brick),
                            _ => Collider::Wall,
                        };
                        input.contacts.push(Contact::new(Collider::Bullet(bullet), other));
                    }
                }
                if self.rng.random_bool(0.0005) {
                    input.actions.push(UiAction::Pause);
                }
            }
        }
        input
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(path) = &args.dump_config {
        config.save(path)?;
        println!("Config written to {}", path.display());
        return Ok(());
    }

    let store: Box<dyn KeyValueStore> = match &args.store {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    };
    let (host, logs) = headless::host(args.scene_latency, store);
    let seed = config.seed;
    let mut game = Game::new(config, host)?;
    let mut bot = Autoplay::new(seed);

    log::info!("Brick Smash (headless) starting with seed {:#x}", seed);

    let mut runs = 0u32;
    let mut best_level = 0u32;
    for _ in 0..args.ticks {
        let input = bot.next_input(&game);
        let before = game.state();
        game.tick(&input);
        if before == GameState::Boot && game.state() == GameState::InGame {
            runs += 1;
        }
        best_level = best_level.max(game.orchestrator().level());
    }

    let orch = game.orchestrator();
    let world = logs.world.borrow();
    println!();
    println!("=== SESSION ===");
    println!("  Seed:       {:#x}", orch.config().seed);
    println!("  Ticks:      {}", args.ticks);
    println!("  Runs:       {}", runs);
    println!("  Best level: {}", best_level);
    println!("  Max score:  {}", orch.max_score());
    println!("  State:      {:?}", orch.state());
    println!("  Score:      {}", orch.score());
    println!("  Spawned:    {} entities", world.spawned.len());
    Ok(())
}
