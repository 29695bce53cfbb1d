//! Per-brick hit counting

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::registry::Handle;

/// Result of a ball or bullet reaching a brick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HitOutcome {
    /// Brick survives with `remaining` hits left
    Damaged { remaining: u32 },
    /// Brick ran out of hits. Reported exactly once per brick.
    Destroyed { position: Vec3, points: u32 },
    /// Brick was already destroyed, nothing happens
    AlreadyDestroyed,
}

/// A destructible brick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brick {
    pub handle: Handle,
    pub position: Vec3,
    /// Strength at spawn time
    initial_strength: u32,
    /// Hits left before destruction, always in `[0, initial_strength]`
    remaining: u32,
    points: u32,
    /// False while a bulldozer is active: balls pass through and destroy it
    pub solid: bool,
}

impl Brick {
    /// Create a brick of `strength` (at least 1), worth `strength * multiplier` points
    pub fn new(handle: Handle, position: Vec3, strength: u32, multiplier: u32) -> Self {
        let strength = strength.max(1);
        Self {
            handle,
            position,
            initial_strength: strength,
            remaining: strength,
            points: strength.saturating_mul(multiplier),
            solid: true,
        }
    }

    pub fn initial_strength(&self) -> u32 {
        self.initial_strength
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn is_destroyed(&self) -> bool {
        self.remaining == 0
    }

    /// Take one hit
    pub fn on_hit(&mut self) -> HitOutcome {
        match self.remaining {
            0 => HitOutcome::AlreadyDestroyed,
            1 => self.demolish(),
            n => {
                self.remaining = n - 1;
                HitOutcome::Damaged {
                    remaining: self.remaining,
                }
            }
        }
    }

    /// Destroy outright, whatever strength is left
    pub fn demolish(&mut self) -> HitOutcome {
        if self.remaining == 0 {
            return HitOutcome::AlreadyDestroyed;
        }
        self.remaining = 0;
        HitOutcome::Destroyed {
            position: self.position,
            points: self.points,
        }
    }
}
