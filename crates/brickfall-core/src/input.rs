//! Player input actions.
//!
//! The runtime never sees devices. A front end maps keys or buttons to an
//! [`InputAction`] and pushes the resulting command:
//!
//! - realtime actions ([`InputAction::is_realtime`]) every frame while held
//! - edge-triggered actions once per press

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::command::{Action, Command};
use crate::config::WorldConfig;

/// Abstract player intent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputAction {
    /// Accelerate left.
    MoveLeft,
    /// Accelerate right.
    MoveRight,
    /// Jump.
    Jump,
    /// Throw a projectile.
    Fire,
}

impl InputAction {
    /// Every action.
    pub const ALL: [Self; 4] = [Self::MoveLeft, Self::MoveRight, Self::Jump, Self::Fire];

    /// Returns true for actions polled every frame while held.
    #[must_use]
    pub const fn is_realtime(self) -> bool {
        matches!(self, Self::MoveLeft | Self::MoveRight)
    }

    /// Command for this action, addressed to every player.
    #[must_use]
    pub fn command(self, config: &WorldConfig) -> Command {
        let force = config.player.move_force;
        let action = match self {
            Self::MoveLeft => Action::ApplyForce(Vec2::new(-force, 0.0)),
            Self::MoveRight => Action::ApplyForce(Vec2::new(force, 0.0)),
            Self::Jump => Action::Jump,
            Self::Fire => Action::Fire,
        };
        Command::new(Category::PLAYER, action)
    }
}
