//! Bridge between core bookkeeping and the host's entity world
//!
//! The core owns entity identity: `Stage` allocates the handle and then asks
//! the host to materialize the entity under it.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::paddle::Paddle;
use super::powerup::PowerUpKind;
use super::registry::{Handle, HandleAllocator};
use crate::platform::EntityWorld;

/// What the host should instantiate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Ball,
    /// Destructible brick showing its current strength
    Brick { strength: u32 },
    /// Indestructible decoration from a pattern's wall slots
    Wall,
    Bullet,
    PowerUp(PowerUpKind),
}

/// Handle allocator plus the host world it spawns into
pub struct Stage {
    world: Box<dyn EntityWorld>,
    handles: HandleAllocator,
}

impl Stage {
    pub fn new(world: Box<dyn EntityWorld>) -> Self {
        Self {
            world,
            handles: HandleAllocator::default(),
        }
    }

    /// Allocate a handle and spawn `kind` at `position` under it
    pub fn spawn(&mut self, kind: EntityKind, position: Vec3) -> Handle {
        let handle = self.handles.next();
        log::debug!("Spawn {:?} {} at {}", kind, handle, position);
        self.world.spawn(handle, kind, position);
        handle
    }

    pub fn despawn(&mut self, handle: Handle) {
        log::debug!("Despawn {}", handle);
        self.world.despawn(handle);
    }

    pub fn set_solid(&mut self, handle: Handle, solid: bool) {
        self.world.set_solid(handle, solid);
    }

    pub fn update_paddle(&mut self, paddle: &Paddle) {
        self.world.update_paddle(paddle);
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.world.set_time_scale(scale);
    }
}
