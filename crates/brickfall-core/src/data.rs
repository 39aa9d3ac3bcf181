//! Sprite data tables.
//!
//! [`DataTables`] describes, per entity kind, which texture to sample and
//! which frames to show. It is plain data with serde support so it can be
//! loaded alongside a level; [`DataTables::default`] matches the standard
//! sprite sheets.

use serde::{Deserialize, Serialize};

use crate::geometry::IntRect;
use crate::render::Animation;

/// A horizontal run of equally sized frames.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strip {
    /// First frame; later frames follow to the right.
    pub first: IntRect,
    /// Number of frames.
    pub frames: usize,
    /// Seconds per frame.
    pub frame_time: f32,
}

impl Strip {
    /// A one-frame strip.
    #[must_use]
    pub const fn still(frame: IntRect) -> Self {
        Self {
            first: frame,
            frames: 1,
            frame_time: 0.0,
        }
    }

    /// Builds a looping [`Animation`] for this strip.
    #[must_use]
    pub fn animation(&self) -> Animation {
        if self.frames <= 1 {
            Animation::still(self.first)
        } else {
            Animation::strip(self.first, self.frames, self.frame_time)
        }
    }
}

/// Frames for one player form.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerFrames {
    /// Standing still.
    pub idle: IntRect,
    /// Running cycle.
    pub run: Strip,
    /// In the air.
    pub jump: IntRect,
    /// Dying.
    pub death: IntRect,
    /// Vertical texel offset of the fire-capable palette.
    pub fire_offset: i32,
}

/// Frames for one enemy kind.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyFrames {
    /// Walking cycle.
    pub walk: Strip,
    /// Flattened after a stomp.
    pub crushed: IntRect,
}

/// Frames for one tile kind.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileFrames {
    /// Idle animation.
    pub idle: Strip,
    /// Frame shown once a box is emptied.
    pub spent: IntRect,
}

/// Per-kind sprite data for every entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataTables {
    /// Small player.
    pub small_player: PlayerFrames,
    /// Big player.
    pub big_player: PlayerFrames,
    /// Goomba.
    pub goomba: EnemyFrames,
    /// Troopa.
    pub troopa: EnemyFrames,
    /// Shell.
    pub shell: EnemyFrames,
    /// Placed coin.
    pub coin: Strip,
    /// Coin popped from a box.
    pub moving_coin: Strip,
    /// Mushroom.
    pub mushroom: Strip,
    /// Flower.
    pub flower: Strip,
    /// Star.
    pub star: Strip,
    /// Block.
    pub block: TileFrames,
    /// Brick.
    pub brick: TileFrames,
    /// Every box kind.
    pub boxes: TileFrames,
    /// Projectile.
    pub projectile: IntRect,
    /// Particle.
    pub particle: IntRect,
}

impl Default for DataTables {
    fn default() -> Self {
        let small_player = PlayerFrames {
            idle: IntRect::new(80, 32, 16, 16),
            run: Strip {
                first: IntRect::new(96, 32, 16, 16),
                frames: 3,
                frame_time: 0.08,
            },
            jump: IntRect::new(160, 32, 16, 16),
            death: IntRect::new(176, 32, 16, 16),
            fire_offset: 96,
        };
        let big_player = PlayerFrames {
            idle: IntRect::new(80, 0, 16, 32),
            run: Strip {
                first: IntRect::new(96, 0, 16, 32),
                frames: 3,
                frame_time: 0.08,
            },
            jump: IntRect::new(160, 0, 16, 32),
            death: IntRect::new(80, 0, 16, 32),
            fire_offset: 96,
        };
        let walker = EnemyFrames {
            walk: Strip {
                first: IntRect::new(0, 16, 16, 16),
                frames: 2,
                frame_time: 0.2,
            },
            crushed: IntRect::new(32, 16, 16, 16),
        };
        let boxes = TileFrames {
            idle: Strip {
                first: IntRect::new(16 * 24, 0, 16, 16),
                frames: 3,
                frame_time: 0.15,
            },
            spent: IntRect::new(16 * 27, 0, 16, 16),
        };
        let brick = TileFrames {
            idle: Strip::still(IntRect::new(16, 0, 16, 16)),
            spent: IntRect::new(16 * 27, 0, 16, 16),
        };
        Self {
            small_player,
            big_player,
            goomba: walker,
            troopa: EnemyFrames {
                walk: Strip {
                    first: IntRect::new(96, 8, 16, 24),
                    frames: 2,
                    frame_time: 0.2,
                },
                crushed: IntRect::new(160, 16, 16, 16),
            },
            shell: EnemyFrames {
                walk: Strip::still(IntRect::new(160, 16, 16, 16)),
                crushed: IntRect::new(160, 16, 16, 16),
            },
            coin: Strip {
                first: IntRect::new(0, 16 * 6, 16, 16),
                frames: 4,
                frame_time: 0.15,
            },
            moving_coin: Strip {
                first: IntRect::new(0, 16 * 7, 16, 16),
                frames: 4,
                frame_time: 0.05,
            },
            mushroom: Strip::still(IntRect::new(0, 0, 16, 16)),
            flower: Strip {
                first: IntRect::new(0, 16 * 2, 16, 16),
                frames: 4,
                frame_time: 0.1,
            },
            star: Strip {
                first: IntRect::new(0, 16 * 3, 16, 16),
                frames: 4,
                frame_time: 0.1,
            },
            block: TileFrames {
                idle: Strip::still(IntRect::new(0, 0, 16, 16)),
                spent: IntRect::new(0, 0, 16, 16),
            },
            brick,
            boxes,
            projectile: IntRect::new(96, 144, 8, 8),
            particle: IntRect::new(0, 0, 4, 4),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn still_strip_builds_single_frame() {
        let frame = IntRect::new(16, 0, 16, 16);
        let mut anim = Strip::still(frame).animation();
        anim.update(5.0);
        assert_eq!(anim.frame(), frame);
    }

    #[test]
    fn box_strip_cycles_three_frames() {
        let data = DataTables::default();
        let mut anim = data.boxes.idle.animation();
        anim.update(0.16);
        assert_eq!(anim.frame().left, 16 * 25);
    }

    #[test]
    fn tables_roundtrip_through_json() {
        let data = DataTables::default();
        let json = serde_json::to_string(&data).unwrap();
        let back: DataTables = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }
}
