//! Contact classification
//!
//! The host physics reports which two colliders touched. This module maps
//! that unordered pair onto the gameplay interaction it means. Pure function,
//! no state.

use serde::{Deserialize, Serialize};

use super::powerup::PowerUpKind;
use super::registry::Handle;

/// Collider categories the host can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Collider {
    /// The paddle
    Player,
    Ball(Handle),
    Bullet(Handle),
    Brick(Handle),
    /// Indestructible pattern wall or arena wall
    Wall,
    /// Trigger volume below the paddle
    KillZone,
    PowerUp(Handle, PowerUpKind),
}

/// One touch/overlap between two colliders, in either order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub a: Collider,
    pub b: Collider,
}

impl Contact {
    pub fn new(a: Collider, b: Collider) -> Self {
        Self { a, b }
    }
}

/// What hit a brick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Striker {
    Ball(Handle),
    /// Bullets are spent on impact
    Bullet(Handle),
}

/// Gameplay meaning of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Ball fell into the kill zone
    BallLost(Handle),
    BrickStruck { brick: Handle, striker: Striker },
    /// Bullet hit something that stops it
    BulletSpent(Handle),
    /// Paddle caught a power-up
    PowerUpCaught { power_up: Handle, kind: PowerUpKind },
    /// Power-up fell past the paddle
    PowerUpMissed(Handle),
    /// Nothing gameplay-relevant (ball on paddle, ball on wall, ...)
    Ignored,
}

/// Classify a contact regardless of collider order
pub fn classify(contact: Contact) -> Interaction {
    classify_ordered(contact.a, contact.b).unwrap_or_else(|| {
        classify_ordered(contact.b, contact.a).unwrap_or(Interaction::Ignored)
    })
}

fn classify_ordered(a: Collider, b: Collider) -> Option<Interaction> {
    use Collider::*;
    let interaction = match (a, b) {
        (Ball(ball), KillZone) => Interaction::BallLost(ball),
        (Ball(ball), Brick(brick)) => Interaction::BrickStruck {
            brick,
            striker: Striker::Ball(ball),
        },
        (Bullet(bullet), Brick(brick)) => Interaction::BrickStruck {
            brick,
            striker: Striker::Bullet(bullet),
        },
        (Bullet(bullet), Wall | KillZone) => Interaction::BulletSpent(bullet),
        (Player, PowerUp(power_up, kind)) => Interaction::PowerUpCaught { power_up, kind },
        (PowerUp(power_up, _), KillZone) => Interaction::PowerUpMissed(power_up),
        _ => return None,
    };
    Some(interaction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_symmetric() {
        let pairs = [
            (Collider::Ball(Handle(1)), Collider::KillZone),
            (Collider::Bullet(Handle(2)), Collider::Brick(Handle(3))),
            (Collider::Player, Collider::PowerUp(Handle(4), PowerUpKind::Gun)),
            (Collider::PowerUp(Handle(5), PowerUpKind::AddLife), Collider::KillZone),
            (Collider::Bullet(Handle(6)), Collider::Wall),
        ];
        for (a, b) in pairs {
            assert_eq!(classify(Contact::new(a, b)), classify(Contact::new(b, a)));
            assert_ne!(classify(Contact::new(a, b)), Interaction::Ignored);
        }
    }

    #[test]
    fn test_brick_strikers() {
        assert_eq!(
            classify(Contact::new(Collider::Brick(Handle(9)), Collider::Ball(Handle(1)))),
            Interaction::BrickStruck {
                brick: Handle(9),
                striker: Striker::Ball(Handle(1))
            }
        );
    }

    #[test]
    fn test_irrelevant_contacts_are_ignored() {
        let pairs = [
            (Collider::Ball(Handle(1)), Collider::Player),
            (Collider::Ball(Handle(1)), Collider::Wall),
            (Collider::Ball(Handle(1)), Collider::Ball(Handle(2))),
            (Collider::Player, Collider::KillZone),
            (Collider::PowerUp(Handle(3), PowerUpKind::SizeUp), Collider::Brick(Handle(4))),
        ];
        for (a, b) in pairs {
            assert_eq!(classify(Contact::new(a, b)), Interaction::Ignored);
        }
    }
}
