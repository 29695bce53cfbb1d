//! Host engine interfaces
//!
//! The core never renders, simulates physics or loads assets. It talks to the
//! host through these traits:
//! - `EntityWorld`: materialize/destroy entities, toggle brick solidity, time scale
//! - `Presentation`: HUD text, life indicators, screen switching
//! - `SceneLoader`: asynchronous play-area loading, polled per tick
//!
//! `headless` has recording implementations for tests and the demo binary.

pub mod headless;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::sim::{EntityKind, GameState, Handle, Paddle};

/// Entity side of the host engine
pub trait EntityWorld {
    /// Create an entity of `kind` at `position`, identified by `handle` from now on
    fn spawn(&mut self, handle: Handle, kind: EntityKind, position: Vec3);
    /// Destroy an entity. Unknown handles are ignored.
    fn despawn(&mut self, handle: Handle);
    /// Make a brick block balls (`true`) or let them through (`false`)
    fn set_solid(&mut self, handle: Handle, solid: bool);
    /// Mirror the paddle's position and size
    fn update_paddle(&mut self, paddle: &Paddle);
    /// 1.0 runs the simulation, 0.0 freezes it
    fn set_time_scale(&mut self, scale: f32);
}

/// Display commands
pub trait Presentation {
    fn write_score(&mut self, score: u32);
    fn write_level(&mut self, level: u32);
    /// Title screen max score
    fn write_max_score(&mut self, max_score: u32);
    /// Game over screen score and max score
    fn write_final_score(&mut self, score: u32, max_score: u32);
    /// Transparency of life indicator `index` (0-based)
    fn set_life_alpha(&mut self, index: usize, alpha: f32);
    /// Visual strength of a damaged brick
    fn set_brick_strength(&mut self, brick: Handle, strength: u32);
    /// Show the screen that belongs to `state`, hide the others
    fn show_screen(&mut self, state: GameState);
    /// Close the application
    fn request_quit(&mut self);
}

/// Token for an in-flight scene load
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SceneLoad(pub u32);

/// Asynchronous scene loading
pub trait SceneLoader {
    /// Start loading `name` additively
    fn load_async(&mut self, name: &str) -> SceneLoad;
    /// Poll an in-flight load
    fn is_complete(&mut self, load: SceneLoad) -> bool;
    /// Drop a loaded scene
    fn unload(&mut self, name: &str);
}
