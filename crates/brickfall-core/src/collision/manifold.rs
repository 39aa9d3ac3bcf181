//! Contact manifolds.

use glam::Vec2;

use crate::geometry::Rect;

/// Push-out descriptor for one side of a contact.
///
/// `axis` is a unit vector along exactly one coordinate axis and `depth` is
/// signed: `axis * depth` is the displacement that moves the receiving body
/// out of the other one. The two sides of a contact receive the same axis
/// with opposite depth signs.
///
/// # Example
///
/// ```
/// use brickfall_core::collision::Manifold;
/// use brickfall_core::geometry::Rect;
/// use glam::Vec2;
///
/// let a = Rect::new(0.0, 0.0, 16.0, 16.0);
/// let b = Rect::new(8.0, 0.0, 16.0, 16.0);
/// let m = Manifold::between(&a, a.center(), &b, b.center()).unwrap();
///
/// assert!(m.is_horizontal());
/// assert_eq!(m.depth, 8.0);
/// assert_eq!(m.push_out(), Vec2::new(8.0, 0.0));
/// assert_eq!(m.reversed().push_out(), Vec2::new(-8.0, 0.0));
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Manifold {
    /// Separating axis: `Vec2::X` or `Vec2::Y`.
    pub axis: Vec2,
    /// Signed penetration along `axis`.
    pub depth: f32,
}

impl Manifold {
    /// Creates a manifold.
    #[must_use]
    pub const fn new(axis: Vec2, depth: f32) -> Self {
        Self { axis, depth }
    }

    /// Computes the manifold handed to `second` for two overlapping boxes.
    ///
    /// The axis is the one with the smaller overlap extent; a square overlap
    /// resolves vertically. The sign follows `second_origin - first_origin`
    /// along that axis, with a zero difference counted as positive. The
    /// first body's manifold is [`Manifold::reversed`].
    ///
    /// # Returns
    ///
    /// `None` if the boxes do not overlap with a positive area.
    #[must_use]
    pub fn between(
        first_bounds: &Rect,
        first_origin: Vec2,
        second_bounds: &Rect,
        second_origin: Vec2,
    ) -> Option<Self> {
        let overlap = first_bounds.intersection(second_bounds)?;
        let delta = second_origin - first_origin;
        let sign = |d: f32| if d < 0.0 { -1.0 } else { 1.0 };
        if overlap.width < overlap.height {
            Some(Self::new(Vec2::X, overlap.width * sign(delta.x)))
        } else {
            Some(Self::new(Vec2::Y, overlap.height * sign(delta.y)))
        }
    }

    /// The manifold for the other side of the same contact.
    #[must_use]
    pub fn reversed(self) -> Self {
        Self::new(self.axis, -self.depth)
    }

    /// Displacement that separates the receiving body.
    #[must_use]
    pub fn push_out(&self) -> Vec2 {
        self.axis * self.depth
    }

    /// Returns true for a side contact.
    #[must_use]
    pub fn is_horizontal(&self) -> bool {
        self.axis.x != 0.0
    }

    /// Returns true for a top or bottom contact.
    #[must_use]
    pub fn is_vertical(&self) -> bool {
        self.axis.y != 0.0
    }

    /// Returns true if the receiving body is pushed upward, i.e. it sits on
    /// top of the other body.
    #[must_use]
    pub fn pushes_up(&self) -> bool {
        self.axis.y * self.depth < 0.0
    }

    /// Returns true if the receiving body is pushed downward, i.e. the
    /// other body is on top of it.
    #[must_use]
    pub fn pushes_down(&self) -> bool {
        self.axis.y * self.depth > 0.0
    }

    /// Horizontal push direction: `-1.0`, `1.0`, or `0.0` for vertical
    /// contacts.
    #[must_use]
    pub fn horizontal_sign(&self) -> f32 {
        let x = self.push_out().x;
        if x == 0.0 {
            0.0
        } else {
            x.signum()
        }
    }
}
