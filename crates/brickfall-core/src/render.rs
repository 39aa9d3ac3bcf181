//! Draw and asset contracts.
//!
//! The core never rasterizes. Nodes describe what to draw as [`Sprite`]s and
//! hand them, together with their composed world transform, to a
//! [`RenderSink`] supplied by the caller. Textures are referenced by opaque
//! [`TextureHandle`]s acquired once at startup from a [`TextureProvider`].
//!
//! # Example
//!
//! ```
//! use brickfall_core::render::{TextureHandle, TextureHolder, TextureId, TextureProvider};
//! use brickfall_core::error::AssetError;
//!
//! struct Atlas;
//!
//! impl TextureProvider for Atlas {
//!     fn acquire(&mut self, id: TextureId) -> Result<TextureHandle, AssetError> {
//!         Ok(TextureHandle::new(id as u32))
//!     }
//! }
//!
//! let textures = TextureHolder::load(&mut Atlas).unwrap();
//! assert_eq!(textures.get(TextureId::Tiles), TextureHandle::new(TextureId::Tiles as u32));
//! ```

use std::fmt;

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::geometry::IntRect;

// =============================================================================
// Textures
// =============================================================================

/// Symbolic texture identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TextureId {
    /// Player sprite sheet.
    Player,
    /// Enemy sprite sheet.
    Enemies,
    /// Pickup sprite sheet.
    Items,
    /// Tile sprite sheet.
    Tiles,
    /// Particle texture.
    Particle,
}

impl TextureId {
    /// Every identifier, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Player,
        Self::Enemies,
        Self::Items,
        Self::Tiles,
        Self::Particle,
    ];
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Enemies => write!(f, "Enemies"),
            Self::Items => write!(f, "Items"),
            Self::Tiles => write!(f, "Tiles"),
            Self::Particle => write!(f, "Particle"),
        }
    }
}

/// Opaque handle to a texture owned by the external renderer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(u32);

impl TextureHandle {
    /// Wraps a renderer-specific texture index.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the renderer-specific index.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// External texture loader.
pub trait TextureProvider {
    /// Returns a handle for `id`, or [`AssetError::Missing`] if the provider
    /// cannot supply it.
    ///
    /// # Errors
    ///
    /// Returns an error if the texture is unavailable.
    fn acquire(&mut self, id: TextureId) -> Result<TextureHandle, AssetError>;
}

/// Handles for every [`TextureId`], acquired up front.
///
/// Loading every texture at startup means entities spawned mid-game can look
/// up their handle without a failure path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureHolder {
    handles: [TextureHandle; 5],
}

impl TextureHolder {
    /// Acquires every texture from `provider`.
    ///
    /// # Errors
    ///
    /// Returns the first [`AssetError`] reported by the provider.
    pub fn load<P: TextureProvider + ?Sized>(provider: &mut P) -> Result<Self, AssetError> {
        let mut handles = [TextureHandle::new(0); 5];
        for (slot, id) in handles.iter_mut().zip(TextureId::ALL) {
            *slot = provider.acquire(id)?;
        }
        tracing::debug!(count = handles.len(), "textures acquired");
        Ok(Self { handles })
    }

    /// Returns the handle for `id`.
    #[must_use]
    pub const fn get(&self, id: TextureId) -> TextureHandle {
        self.handles[id as usize]
    }
}

// =============================================================================
// Sprites
// =============================================================================

/// One textured quad.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sprite {
    /// Texture to sample.
    pub texture: TextureHandle,
    /// Texel rectangle to sample.
    pub frame: IntRect,
    /// Local point that lands on the node's position.
    pub origin: Vec2,
}

impl Sprite {
    /// Creates a sprite.
    #[must_use]
    pub const fn new(texture: TextureHandle, frame: IntRect, origin: Vec2) -> Self {
        Self {
            texture,
            frame,
            origin,
        }
    }
}

/// Receives draw calls from the scene graph.
pub trait RenderSink {
    /// Draws `sprite` with the given world transform.
    fn draw_sprite(&mut self, sprite: &Sprite, transform: Affine2);
}

/// Sink that records every draw call, useful for inspection.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    /// Recorded calls, in submission order.
    pub calls: Vec<(Sprite, Affine2)>,
}

impl RenderSink for RecordingSink {
    fn draw_sprite(&mut self, sprite: &Sprite, transform: Affine2) {
        self.calls.push((*sprite, transform));
    }
}

// =============================================================================
// Animation
// =============================================================================

/// Frame strip played at a fixed rate.
///
/// Frame lookups never fail: an out-of-range index yields the fallback
/// frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    frames: Vec<IntRect>,
    fallback: IntRect,
    frame_time: f32,
    elapsed: f32,
    index: usize,
    repeat: bool,
}

impl Animation {
    /// Creates a looping animation.
    ///
    /// # Arguments
    ///
    /// * `frames` - Frames in playback order
    /// * `fallback` - Frame returned when no frame is available
    /// * `frame_time` - Seconds per frame
    #[must_use]
    pub fn new(frames: Vec<IntRect>, fallback: IntRect, frame_time: f32) -> Self {
        Self {
            frames,
            fallback,
            frame_time,
            elapsed: 0.0,
            index: 0,
            repeat: true,
        }
    }

    /// Creates a single-frame animation.
    #[must_use]
    pub fn still(frame: IntRect) -> Self {
        Self::new(vec![frame], frame, f32::INFINITY)
    }

    /// Creates an animation from a horizontal strip of `count` frames
    /// starting at `first`.
    #[must_use]
    pub fn strip(first: IntRect, count: usize, frame_time: f32) -> Self {
        let frames = (0..count)
            .map(|i| {
                let step = i32::try_from(i).unwrap_or(i32::MAX).saturating_mul(first.width);
                IntRect::new(first.left + step, first.top, first.width, first.height)
            })
            .collect();
        Self::new(frames, first, frame_time)
    }

    /// Stops at the last frame instead of looping.
    #[must_use]
    pub fn once(mut self) -> Self {
        self.repeat = false;
        self
    }

    /// Advances playback by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.frames.len() < 2 || !self.frame_time.is_finite() || self.frame_time <= 0.0 {
            return;
        }
        self.elapsed += dt;
        while self.elapsed >= self.frame_time {
            self.elapsed -= self.frame_time;
            if self.index + 1 < self.frames.len() {
                self.index += 1;
            } else if self.repeat {
                self.index = 0;
            }
        }
    }

    /// Restarts playback from the first frame.
    pub fn restart(&mut self) {
        self.index = 0;
        self.elapsed = 0.0;
    }

    /// Current frame, or the fallback if the strip is empty.
    #[must_use]
    pub fn frame(&self) -> IntRect {
        self.frames.get(self.index).copied().unwrap_or(self.fallback)
    }

    /// Frame at `index`, or the fallback if out of range.
    #[must_use]
    pub fn frame_at(&self, index: usize) -> IntRect {
        self.frames.get(index).copied().unwrap_or(self.fallback)
    }

    /// Index of the current frame.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}
