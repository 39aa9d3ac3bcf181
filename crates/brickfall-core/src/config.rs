//! Tunable constants for the runtime.
//!
//! [`WorldConfig`] gathers every numeric constant the entities use. It is
//! read once at startup, shared through the
//! [`EntityRegistry`](crate::registry::EntityRegistry), and never mutated
//! afterwards. All values are in pixels and seconds; velocities are pixels
//! per second and `y` grows downward.
//!
//! Friction factors are multiplicative and applied once per tick, so they
//! assume the fixed [`WorldConfig::timestep`].
//!
//! # Example
//!
//! ```
//! use brickfall_core::config::WorldConfig;
//!
//! let config: WorldConfig = serde_json::from_str(r#"{ "gravity": 900.0 }"#).unwrap();
//! assert_eq!(config.gravity, 900.0);
//! assert_eq!(config.player.jump_force, WorldConfig::default().player.jump_force);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Fixed simulation timestep (60 Hz).
pub const FIXED_DT: f32 = 1.0 / 60.0;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Duration of one tick in seconds.
    pub timestep: f32,
    /// Downward acceleration applied to airborne bodies.
    pub gravity: f32,
    /// How far outside the level rectangle a body may travel before it is
    /// removed.
    pub bounds_margin: f32,
    /// Seed for the particle jitter generator.
    pub seed: u64,
    /// Player movement and power-up constants.
    pub player: PlayerTuning,
    /// Enemy constants.
    pub enemy: EnemyTuning,
    /// Pickup constants.
    pub item: ItemTuning,
    /// Tile reaction constants.
    pub tile: TileTuning,
    /// Projectile constants.
    pub projectile: ProjectileTuning,
    /// Particle burst constants.
    pub particles: ParticleTuning,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            timestep: FIXED_DT,
            gravity: 1500.0,
            bounds_margin: 48.0,
            seed: 0,
            player: PlayerTuning::default(),
            enemy: EnemyTuning::default(),
            item: ItemTuning::default(),
            tile: TileTuning::default(),
            projectile: ProjectileTuning::default(),
            particles: ParticleTuning::default(),
        }
    }
}

/// Player constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Velocity added per tick while a move input is held.
    pub move_force: f32,
    /// Upward velocity added by a jump.
    pub jump_force: f32,
    /// Horizontal velocity factor per grounded tick.
    pub ground_friction: f32,
    /// Horizontal velocity factor per airborne tick.
    pub air_friction: f32,
    /// Upward velocity after stomping an enemy.
    pub stomp_bounce: f32,
    /// Upward velocity of the death hop.
    pub death_hop: f32,
    /// Time frozen while shrinking from big to small.
    pub shrink_duration: f32,
    /// Invulnerability window after shrinking.
    pub mercy_duration: f32,
    /// Duration of star invincibility.
    pub star_duration: f32,
    /// Maximum number of live projectiles per player.
    pub max_projectiles: usize,
    /// Horizontal launch speed of a projectile, added to the player's own.
    pub projectile_speed: f32,
    /// Upward launch speed of a projectile.
    pub projectile_lift: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            move_force: 40.0,
            jump_force: 475.0,
            ground_friction: 0.8,
            air_friction: 0.7,
            stomp_bounce: 300.0,
            death_hop: 237.0,
            shrink_duration: 1.5,
            mercy_duration: 1.0,
            star_duration: 5.5,
            max_projectiles: 2,
            projectile_speed: 160.0,
            projectile_lift: 40.0,
        }
    }
}

/// Enemy constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Patrol speed of walkers.
    pub walk_speed: f32,
    /// Upward velocity when knocked out.
    pub knock_hop: f32,
    /// Time a crushed enemy stays visible.
    pub crush_duration: f32,
    /// Speed of a kicked shell.
    pub shell_speed: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            walk_speed: 40.0,
            knock_hop: 230.0,
            crush_duration: 1.0,
            shell_speed: 240.0,
        }
    }
}

/// Pickup constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemTuning {
    /// Upward speed while emerging from a box.
    pub rise_speed: f32,
    /// Fraction of its height an item rises before it activates.
    pub rise_fraction: f32,
    /// Horizontal speed of a released mushroom.
    pub mushroom_speed: f32,
    /// Velocity of a released star.
    pub star_launch: Vec2,
    /// Upward velocity of a star after touching ground.
    pub star_bounce: f32,
    /// Upward launch speed of a coin popped from a box.
    pub coin_pop: f32,
    /// Falling speed at which a popped coin vanishes.
    pub coin_vanish_speed: f32,
}

impl Default for ItemTuning {
    fn default() -> Self {
        Self {
            rise_speed: 20.0,
            rise_fraction: 0.75,
            mushroom_speed: 40.0,
            star_launch: Vec2::new(40.0, -350.0),
            star_bounce: 250.0,
            coin_pop: 475.0,
            coin_vanish_speed: 350.0,
        }
    }
}

/// Tile reaction constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileTuning {
    /// Height of the bump when a tile is hit from below.
    pub bump_height: f32,
    /// Time before a bumped tile settles back.
    pub bump_duration: f32,
    /// Time between a big player's hit and the brick breaking.
    pub break_delay: f32,
}

impl Default for TileTuning {
    fn default() -> Self {
        Self {
            bump_height: 5.2,
            bump_duration: 0.25,
            break_delay: 0.0225,
        }
    }
}

/// Projectile constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Upward velocity after hitting the ground.
    pub bounce: f32,
    /// Time an exploding projectile lingers.
    pub explode_duration: f32,
    /// Spin in radians per second.
    pub spin: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            bounce: 250.0,
            explode_duration: 0.05,
            spin: 10.0_f32.to_radians() * 60.0,
        }
    }
}

/// Particle burst constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleTuning {
    /// Lifetime of one particle.
    pub lifetime: f32,
    /// Particles per burst.
    pub burst_count: usize,
    /// Base velocities cycled through by successive particles.
    pub splat_velocities: Vec<Vec2>,
    /// Maximum random deviation added to each velocity component.
    pub jitter: f32,
    /// Constant acceleration applied to live particles.
    pub force: Vec2,
    /// Spin applied to live particles, radians per second.
    pub spin: f32,
}

impl Default for ParticleTuning {
    fn default() -> Self {
        Self {
            lifetime: 2.5,
            burst_count: 4,
            splat_velocities: vec![
                Vec2::new(-30.0, -90.0),
                Vec2::new(30.0, -90.0),
                Vec2::new(-50.0, -70.0),
                Vec2::new(50.0, -70.0),
            ],
            jitter: 8.0,
            force: Vec2::new(0.0, 250.0),
            spin: std::f32::consts::PI,
        }
    }
}
