//! Game orchestration module
//!
//! All gameplay rules live here. This module must stay deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by handle)
//! - No rendering or physics, host engines are reached through `platform`

pub mod brick;
pub mod collision;
pub mod events;
pub mod game;
pub mod level;
pub mod paddle;
pub mod powerup;
pub mod registry;
pub mod stage;
pub mod state;
pub mod tick;
pub mod timers;

pub use brick::{Brick, HitOutcome};
pub use collision::{Collider, Contact, Interaction, Striker, classify};
pub use events::{DispatchReport, EventBus, EventKind, GameEvent, Outbox, SubscriptionId};
pub use game::{Game, Host, Orchestrator};
pub use level::{LevelError, LevelGenerator, Pattern};
pub use paddle::Paddle;
pub use powerup::{PowerUpKind, PowerUpSpawner};
pub use registry::{Handle, Registry};
pub use stage::{EntityKind, Stage};
pub use state::{Counter, GameState, PhaseMachine, TransitionError};
pub use tick::{TickInput, UiAction};
pub use timers::{TimedAction, TimerId, TimerQueue, TimerScope};
