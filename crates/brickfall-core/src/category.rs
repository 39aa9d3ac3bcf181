//! Category taxonomy for scene nodes.
//!
//! A [`Category`] is a bitmask that tags every node in the scene graph. The
//! same bits serve two purposes:
//!
//! - **Broadcast addressing**: a [`Command`](crate::command::Command) is
//!   delivered to every node whose category intersects the command's mask.
//! - **Contact lookup**: behavior tables key their collision responses on the
//!   other body's category.
//!
//! Each concrete node kind owns exactly one bit. Composite masks (for
//! example [`Category::TILES`] or [`Category::OUT_OF_WORLD`]) are unions of
//! those bits and are only ever used as masks, never as a node's own tag.
//!
//! # Example
//!
//! ```
//! use brickfall_core::category::Category;
//!
//! let mask = Category::PLAYER;
//! assert!(mask.intersects(Category::SMALL_PLAYER));
//! assert!(!mask.intersects(Category::GOOMBA));
//! assert!(!Category::NONE.intersects(Category::ALL));
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Bitmask identifying a node's kind or layer.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    pub struct Category: u32 {
        /// Scene layer drawn behind the front layer (spawned items, projectiles).
        const BACK_LAYER = 1 << 0;
        /// Scene layer holding tiles, enemies and the player.
        const FRONT_LAYER = 1 << 1;
        /// Player in small form.
        const SMALL_PLAYER = 1 << 2;
        /// Player in big form.
        const BIG_PLAYER = 1 << 3;
        /// Particle emitter node.
        const PARTICLE_SYSTEM = 1 << 4;
        /// Player-fired projectile.
        const PROJECTILE = 1 << 5;
        /// Indestructible ground or wall tile.
        const BLOCK = 1 << 6;
        /// Breakable brick.
        const BRICK = 1 << 7;
        /// Box holding a single coin.
        const SOLO_COIN_BOX = 1 << 8;
        /// Box holding several coins.
        const COINS_BOX = 1 << 9;
        /// Box holding a mushroom.
        const TRANSFORM_BOX = 1 << 10;
        /// Box holding a flower.
        const FIRE_BOX = 1 << 11;
        /// Box holding a star.
        const SHIFT_BOX = 1 << 12;
        /// Emptied box.
        const SOLID_BOX = 1 << 13;
        /// Coin placed in the level.
        const STATIC_COIN = 1 << 14;
        /// Coin popped out of a box.
        const MOVING_COIN = 1 << 15;
        /// Growth pickup.
        const MUSHROOM = 1 << 16;
        /// Fire pickup.
        const FLOWER = 1 << 17;
        /// Invincibility pickup.
        const STAR = 1 << 18;
        /// Walking enemy that is crushed when stomped.
        const GOOMBA = 1 << 19;
        /// Walking enemy that retreats into a shell when stomped.
        const TROOPA = 1 << 20;
        /// Shell left behind by a troopa.
        const SHELL = 1 << 21;

        /// Either player form.
        const PLAYER = Self::SMALL_PLAYER.bits() | Self::BIG_PLAYER.bits();
        /// Every enemy kind.
        const ENEMY = Self::GOOMBA.bits() | Self::TROOPA.bits() | Self::SHELL.bits();
        /// Every box that can still be emptied.
        const BOXES = Self::SOLO_COIN_BOX.bits()
            | Self::COINS_BOX.bits()
            | Self::TRANSFORM_BOX.bits()
            | Self::FIRE_BOX.bits()
            | Self::SHIFT_BOX.bits();
        /// Every tile kind, including emptied boxes.
        const TILES = Self::BLOCK.bits()
            | Self::BRICK.bits()
            | Self::BOXES.bits()
            | Self::SOLID_BOX.bits();
        /// Every coin kind.
        const COINS = Self::STATIC_COIN.bits() | Self::MOVING_COIN.bits();
        /// Every pickup kind.
        const ITEMS = Self::COINS.bits()
            | Self::MUSHROOM.bits()
            | Self::FLOWER.bits()
            | Self::STAR.bits();
        /// Bodies that are removed once they leave the world bounds.
        const OUT_OF_WORLD = Self::PLAYER.bits()
            | Self::PROJECTILE.bits()
            | Self::ENEMY.bits()
            | Self::MUSHROOM.bits()
            | Self::STAR.bits()
            | Self::MOVING_COIN.bits();
        /// Every collidable body.
        const ALL = Self::TILES.bits()
            | Self::ITEMS.bits()
            | Self::PLAYER.bits()
            | Self::ENEMY.bits()
            | Self::PROJECTILE.bits();
    }
}

impl Category {
    /// The empty category. Nodes tagged with it receive no broadcast commands.
    pub const NONE: Self = Self::empty();

    /// Returns true if this category belongs to a collidable body.
    #[must_use]
    pub const fn is_collidable(self) -> bool {
        self.intersects(Self::ALL)
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::NONE
    }
}
