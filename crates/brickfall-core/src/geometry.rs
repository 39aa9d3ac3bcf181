//! Geometry primitives: axis-aligned rectangles and node transforms.
//!
//! - [`Rect`]: floating-point AABB used for bounding boxes and sensors
//! - [`IntRect`]: integer texture rectangle used for sprite frames
//! - [`Transform`]: translation/rotation/scale of a scene node
//!
//! All coordinates follow screen conventions: `x` grows to the right and
//! `y` grows downward, so "up" is negative `y`.

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

// =============================================================================
// Rect
// =============================================================================

/// Axis-aligned rectangle described by its top-left corner and size.
///
/// # Example
///
/// ```
/// use brickfall_core::geometry::Rect;
///
/// let a = Rect::new(0.0, 0.0, 16.0, 16.0);
/// let b = Rect::new(8.0, 0.0, 16.0, 16.0);
/// let overlap = a.intersection(&b).unwrap();
/// assert_eq!(overlap.width, 8.0);
/// assert_eq!(overlap.height, 16.0);
///
/// // Touching edges do not count as an intersection.
/// let c = Rect::new(16.0, 0.0, 16.0, 16.0);
/// assert!(!a.intersects(&c));
/// ```
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Creates a rectangle of the given size centered on `center`.
    #[must_use]
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        let min = center - size * 0.5;
        Self::new(min.x, min.y, size.x, size.y)
    }

    /// Creates a rectangle spanning two corners given in any order.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Top-left corner.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    /// Bottom-right corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.left + self.width, self.top + self.height)
    }

    /// Width and height as a vector.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.min() + self.size() * 0.5
    }

    /// Returns true if the rectangle has no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Returns true if the point lies inside the rectangle (edges inclusive
    /// on the top-left, exclusive on the bottom-right).
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x >= self.left && point.x < max.x && point.y >= self.top && point.y < max.y
    }

    /// Returns the overlapping region, if the rectangles overlap with a
    /// positive area. Rectangles that only share an edge do not overlap.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let min = self.min().max(other.min());
        let max = self.max().min(other.max());
        if min.x < max.x && min.y < max.y {
            Some(Self::from_corners(min, max))
        } else {
            None
        }
    }

    /// Returns true if the rectangles overlap with a positive area.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.intersection(other).is_some()
    }

    /// Returns the rectangle moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.left + offset.x, self.top + offset.y, self.width, self.height)
    }

    /// Returns the rectangle grown by `margin` on every side.
    #[must_use]
    pub fn inflated(&self, margin: f32) -> Self {
        Self::new(
            self.left - margin,
            self.top - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Returns the axis-aligned bounds of this rectangle after applying
    /// `transform` to its four corners.
    #[must_use]
    pub fn transformed(&self, transform: &Affine2) -> Self {
        let max = self.max();
        let corners = [
            transform.transform_point2(self.min()),
            transform.transform_point2(Vec2::new(max.x, self.top)),
            transform.transform_point2(Vec2::new(self.left, max.y)),
            transform.transform_point2(max),
        ];
        let lo = corners.iter().fold(corners[0], |acc, c| acc.min(*c));
        let hi = corners.iter().fold(corners[0], |acc, c| acc.max(*c));
        Self::from_corners(lo, hi)
    }
}

/// Integer texture rectangle for sprite frames.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntRect {
    /// Left texel.
    pub left: i32,
    /// Top texel.
    pub top: i32,
    /// Width in texels.
    pub width: i32,
    /// Height in texels.
    pub height: i32,
}

impl IntRect {
    /// Creates a texture rectangle.
    #[must_use]
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Size as a float vector.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

// =============================================================================
// Transform
// =============================================================================

/// Local transform of a scene node.
///
/// The matrix applies scale, then rotation, then translation. A node's world
/// transform is its parent's world matrix multiplied by this matrix.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Translation relative to the parent.
    pub position: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    /// Per-axis scale. A negative component mirrors the node.
    pub scale: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        rotation: 0.0,
        scale: Vec2::ONE,
    };

    /// Creates an unrotated, unscaled transform at `position`.
    #[must_use]
    pub const fn at(position: Vec2) -> Self {
        Self {
            position,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }

    /// Returns the affine matrix for this transform.
    #[must_use]
    pub fn matrix(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(self.scale, self.rotation, self.position)
    }

    /// Moves the transform by `offset`.
    pub fn translate(&mut self, offset: Vec2) {
        self.position += offset;
    }

    /// Rotates the transform by `angle` radians.
    pub fn rotate(&mut self, angle: f32) {
        self.rotation = (self.rotation + angle) % std::f32::consts::TAU;
    }
}
