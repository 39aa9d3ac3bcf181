//! Deferred, mask-addressed commands and the FIFO bus that carries them.
//!
//! A [`Command`] pairs a [`Category`] mask with an [`Action`]. Actions carry
//! only data; the world dispatcher interprets them against each receiving
//! node, so a queued command never borrows the object that produced it.
//!
//! # Delivery
//!
//! The world drains the [`CommandQueue`] once per frame. Each command is
//! delivered depth-first to every node whose category intersects the mask.
//! A command pushed while the queue drains is delivered in the same drain,
//! after everything queued before it.
//!
//! # Example
//!
//! ```
//! use brickfall_core::category::Category;
//! use brickfall_core::command::{Action, Command, CommandQueue};
//!
//! let mut queue = CommandQueue::new();
//! queue.push(Command::new(Category::PLAYER, Action::Jump));
//! queue.push(Command::new(Category::PLAYER, Action::Fire));
//!
//! assert_eq!(queue.pop().map(|c| c.action), Some(Action::Jump));
//! assert_eq!(queue.pop().map(|c| c.action), Some(Action::Fire));
//! assert!(queue.is_empty());
//! ```

use std::collections::VecDeque;
use std::fmt;

use glam::Vec2;

use crate::category::Category;
use crate::entity::item::ItemKind;
use crate::geometry::Rect;
use crate::scene::NodeId;

/// Request to create a new node under the receiving node.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Spawn {
    /// A pickup, positioned at its center in world space.
    Item {
        /// Kind of pickup.
        kind: ItemKind,
        /// Spawn point (world space).
        position: Vec2,
    },
    /// A player projectile.
    Projectile {
        /// Spawn point (world space).
        position: Vec2,
        /// Initial velocity.
        velocity: Vec2,
        /// Player that fired it; receives the new node id as an observer.
        owner: NodeId,
    },
}

impl Spawn {
    /// Spawn point in world space.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        match *self {
            Self::Item { position, .. } | Self::Projectile { position, .. } => position,
        }
    }
}

/// Operation applied to every node a command reaches.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Action {
    /// Adds a velocity impulse to a player. Only the horizontal part applies
    /// while the player has no footing.
    ApplyForce(Vec2),
    /// Makes a grounded player jump.
    Jump,
    /// Makes a fire-capable player launch a projectile.
    Fire,
    /// Removes the receiving body if its world bounds no longer intersect
    /// the given rectangle.
    RemoveOutside(Rect),
    /// Registers the receiving body for this frame's collision pass.
    CollectBody,
    /// Attaches a new node as a child of the receiver.
    Spawn(Spawn),
    /// Emits a particle burst at a world position.
    EmitParticles(Vec2),
    /// Triggers the receiver's externally caused death.
    Kill,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApplyForce(_) => write!(f, "ApplyForce"),
            Self::Jump => write!(f, "Jump"),
            Self::Fire => write!(f, "Fire"),
            Self::RemoveOutside(_) => write!(f, "RemoveOutside"),
            Self::CollectBody => write!(f, "CollectBody"),
            Self::Spawn(_) => write!(f, "Spawn"),
            Self::EmitParticles(_) => write!(f, "EmitParticles"),
            Self::Kill => write!(f, "Kill"),
        }
    }
}

/// An action addressed to every node whose category intersects `mask`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Command {
    /// Receiving categories.
    pub mask: Category,
    /// What to do to each receiver.
    pub action: Action,
}

impl Command {
    /// Creates a command.
    #[must_use]
    pub const fn new(mask: Category, action: Action) -> Self {
        Self { mask, action }
    }

    /// Returns true if a node tagged `category` receives this command.
    #[must_use]
    pub const fn addresses(&self, category: Category) -> bool {
        self.mask.intersects(category)
    }
}

/// Strict FIFO queue of pending commands.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    queue: VecDeque<Command>,
}

impl CommandQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a command.
    pub fn push(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    /// Removes and returns the oldest command.
    pub fn pop(&mut self) -> Option<Command> {
        self.queue.pop_front()
    }

    /// Returns true if no command is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of pending commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Drops every pending command.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Iterates over pending commands, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Command> + '_ {
        self.queue.iter()
    }
}
