//! Level records.
//!
//! A level is a rectangle plus a flat list of placed objects:
//!
//! ```json
//! {
//!   "width": 640, "height": 240,
//!   "objects": [
//!     { "kind": "player", "position": [32, 192], "size": [16, 16] },
//!     { "kind": "coins_box", "position": [96, 144], "size": [16, 16], "count": 5 }
//!   ]
//! }
//! ```
//!
//! Positions are top-left corners. [`LevelObject::origin`] converts them to
//! the origin convention of the entity being placed: bottom-center for
//! players and enemies, center for tiles and items.

use std::fmt;
use std::io::Read;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::{EnemyKind, ItemKind, TileKind};
use crate::error::LevelError;
use crate::geometry::Rect;

/// Kind tag of a placed object.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Player start.
    Player,
    /// Goomba.
    Goomba,
    /// Troopa.
    Troopa,
    /// Block.
    Block,
    /// Brick.
    Brick,
    /// Box with one coin.
    SoloCoinBox,
    /// Box with `count` coins.
    CoinsBox,
    /// Box with a mushroom.
    TransformBox,
    /// Box with a flower.
    FireBox,
    /// Box with a star.
    ShiftBox,
    /// Empty box.
    SolidBox,
    /// Coin.
    Coin,
    /// Mushroom.
    Mushroom,
    /// Flower.
    Flower,
    /// Star.
    Star,
}

/// Entity family an [`ObjectKind`] places.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Placement {
    /// The player.
    Player,
    /// An enemy.
    Enemy(EnemyKind),
    /// A tile.
    Tile(TileKind),
    /// An item.
    Item(ItemKind),
}

impl ObjectKind {
    /// What this kind places.
    #[must_use]
    pub const fn placement(self) -> Placement {
        match self {
            Self::Player => Placement::Player,
            Self::Goomba => Placement::Enemy(EnemyKind::Goomba),
            Self::Troopa => Placement::Enemy(EnemyKind::Troopa),
            Self::Block => Placement::Tile(TileKind::Block),
            Self::Brick => Placement::Tile(TileKind::Brick),
            Self::SoloCoinBox => Placement::Tile(TileKind::SoloCoinBox),
            Self::CoinsBox => Placement::Tile(TileKind::CoinsBox),
            Self::TransformBox => Placement::Tile(TileKind::TransformBox),
            Self::FireBox => Placement::Tile(TileKind::FireBox),
            Self::ShiftBox => Placement::Tile(TileKind::ShiftBox),
            Self::SolidBox => Placement::Tile(TileKind::SolidBox),
            Self::Coin => Placement::Item(ItemKind::Coin),
            Self::Mushroom => Placement::Item(ItemKind::Mushroom),
            Self::Flower => Placement::Item(ItemKind::Flower),
            Self::Star => Placement::Item(ItemKind::Star),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Player => "player",
            Self::Goomba => "goomba",
            Self::Troopa => "troopa",
            Self::Block => "block",
            Self::Brick => "brick",
            Self::SoloCoinBox => "solo_coin_box",
            Self::CoinsBox => "coins_box",
            Self::TransformBox => "transform_box",
            Self::FireBox => "fire_box",
            Self::ShiftBox => "shift_box",
            Self::SolidBox => "solid_box",
            Self::Coin => "coin",
            Self::Mushroom => "mushroom",
            Self::Flower => "flower",
            Self::Star => "star",
        };
        write!(f, "{name}")
    }
}

/// One placed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelObject {
    /// What to place.
    pub kind: ObjectKind,
    /// Top-left corner in world space.
    pub position: Vec2,
    /// Width and height.
    pub size: Vec2,
    /// Items held by a box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl LevelObject {
    /// Creates an object without a count.
    #[must_use]
    pub const fn new(kind: ObjectKind, position: Vec2, size: Vec2) -> Self {
        Self {
            kind,
            position,
            size,
            count: None,
        }
    }

    /// Sets the item count.
    #[must_use]
    pub const fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Placed rectangle.
    #[must_use]
    pub const fn rect(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.size.x, self.size.y)
    }

    /// Entity origin in world space for this object's kind.
    #[must_use]
    pub fn origin(&self) -> Vec2 {
        let rect = self.rect();
        match self.kind.placement() {
            Placement::Player | Placement::Enemy(_) => {
                Vec2::new(rect.center().x, rect.max().y)
            }
            Placement::Tile(_) | Placement::Item(_) => rect.center(),
        }
    }

    /// Item count, defaulting to one.
    #[must_use]
    pub fn count_or_default(&self) -> u32 {
        self.count.unwrap_or(1)
    }
}

/// A parsed level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Placed objects, in load order.
    #[serde(default)]
    pub objects: Vec<LevelObject>,
}

impl Level {
    /// Parses and validates a level from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::Parse`] for malformed JSON or unknown kinds, and
    /// any error from [`Level::validate`].
    pub fn from_json(text: &str) -> Result<Self, LevelError> {
        let level: Self = serde_json::from_str(text)?;
        level.validate()?;
        Ok(level)
    }

    /// Reads, parses and validates a level.
    ///
    /// # Errors
    ///
    /// Returns [`LevelError::Io`] if reading fails, otherwise as
    /// [`Level::from_json`].
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, LevelError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_json(&text)
    }

    /// Checks the level for structural problems.
    ///
    /// # Errors
    ///
    /// - [`LevelError::InvalidDimensions`] for a level without area
    /// - [`LevelError::InvalidSize`] for an object without area
    /// - [`LevelError::EmptyBox`] for a coins box with no coins
    /// - [`LevelError::DuplicatePlayer`] for more than one player start
    pub fn validate(&self) -> Result<(), LevelError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(LevelError::InvalidDimensions);
        }
        for (index, object) in self.objects.iter().enumerate() {
            if !(object.size.x > 0.0 && object.size.y > 0.0) {
                return Err(LevelError::InvalidSize {
                    index,
                    kind: object.kind.to_string(),
                });
            }
            if object.kind == ObjectKind::CoinsBox && object.count.unwrap_or(0) == 0 {
                return Err(LevelError::EmptyBox { index });
            }
        }
        let players = self
            .objects
            .iter()
            .filter(|object| object.kind == ObjectKind::Player)
            .count();
        if players > 1 {
            return Err(LevelError::DuplicatePlayer(players));
        }
        Ok(())
    }

    /// The level rectangle.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// The player start, if any.
    #[must_use]
    pub fn player_start(&self) -> Option<&LevelObject> {
        self.objects
            .iter()
            .find(|object| object.kind == ObjectKind::Player)
    }
}
