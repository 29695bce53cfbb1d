//! The player's paddle
//!
//! Only horizontal position and the two stackable effects are tracked here.
//! Collision shape and rendering belong to the host.

use serde::{Deserialize, Serialize};

use crate::settings::PaddleConfig;

/// Paddle state owned by the core
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    /// Horizontal position, kept within `[-bound, bound]`
    pub x: f32,
    /// Width multiplier from size-up power-ups
    pub scale: f32,
    /// Units per second at full axis deflection
    pub speed: f32,
    bound: f32,
}

impl Paddle {
    pub fn new(config: &PaddleConfig) -> Self {
        Self {
            x: 0.0,
            scale: 1.0,
            speed: config.move_speed,
            bound: config.x_boundary,
        }
    }

    /// Back to spawn position and base stats
    pub fn reset(&mut self, config: &PaddleConfig) {
        *self = Self::new(config);
    }

    /// Move by `axis` (-1..1) for `dt` seconds and keep in bounds
    pub fn drive(&mut self, axis: f32, dt: f32) {
        let axis = axis.clamp(-1.0, 1.0);
        self.x = (self.x + axis * self.speed * dt).clamp(-self.bound, self.bound);
    }

    /// Grow by `step` unless already at `max`. Returns true if it grew.
    pub fn grow(&mut self, step: f32, max: f32) -> bool {
        if self.scale >= max {
            return false;
        }
        self.scale += step;
        true
    }

    /// Speed up by `step` unless already at `max`. Returns true if it changed.
    pub fn speed_up(&mut self, step: f32, max: f32) -> bool {
        if self.speed >= max {
            return false;
        }
        self.speed += step;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_stays_in_bounds() {
        let config = PaddleConfig::default();
        let mut paddle = Paddle::new(&config);
        for _ in 0..10_000 {
            paddle.drive(1.0, 0.1);
        }
        assert_eq!(paddle.x, config.x_boundary);
        for _ in 0..10_000 {
            paddle.drive(-3.0, 0.1);
        }
        assert_eq!(paddle.x, -config.x_boundary);
    }

    #[test]
    fn test_effects_stop_at_cap() {
        let config = PaddleConfig::default();
        let mut paddle = Paddle::new(&config);
        let mut grows = 0;
        while paddle.grow(config.size_step, config.max_scale) {
            grows += 1;
        }
        // 1.0 -> 2.5 in 0.25 steps
        assert_eq!(grows, 6);
        assert!(!paddle.grow(config.size_step, config.max_scale));

        let mut speedups = 0;
        while paddle.speed_up(config.speed_step, config.max_speed) {
            speedups += 1;
        }
        assert_eq!(speedups, 20);
        assert_eq!(paddle.speed, config.max_speed);

        paddle.reset(&config);
        assert_eq!(paddle.scale, 1.0);
        assert_eq!(paddle.speed, config.move_speed);
    }
}
