//! Debris bursts.
//!
//! A [`ParticleSystem`] node keeps its particles in its own local space and
//! draws them as sprites. It has no bounds and takes no part in collision.
//! Burst jitter comes from a seeded `ChaCha8Rng`, so identical worlds emit
//! identical debris.

use std::collections::VecDeque;

use glam::{Affine2, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::category::Category;
use crate::config::ParticleTuning;
use crate::entity::Body;
use crate::geometry::IntRect;
use crate::render::{RenderSink, Sprite, TextureHandle};

/// One piece of debris.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Particle {
    /// Position in the system's local space.
    pub position: Vec2,
    /// Velocity in pixels per second.
    pub velocity: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
    /// Seconds since emission.
    pub age: f32,
}

/// Per-tick influence applied to every live particle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Affector {
    /// Constant acceleration.
    Force(Vec2),
    /// Constant angular velocity in radians per second.
    Spin(f32),
}

impl Affector {
    fn apply(self, particle: &mut Particle, dt: f32) {
        match self {
            Self::Force(acceleration) => particle.velocity += acceleration * dt,
            Self::Spin(rate) => particle.rotation += rate * dt,
        }
    }
}

/// Emitter and owner of debris particles.
#[derive(Debug)]
pub struct ParticleSystem {
    particles: VecDeque<Particle>,
    affectors: Vec<Affector>,
    tuning: ParticleTuning,
    next_splat: usize,
    rng: ChaCha8Rng,
    sprite: Sprite,
}

impl ParticleSystem {
    /// Creates an empty system.
    #[must_use]
    pub fn new(tuning: ParticleTuning, seed: u64, texture: TextureHandle, frame: IntRect) -> Self {
        let affectors = vec![Affector::Force(tuning.force), Affector::Spin(tuning.spin)];
        Self {
            particles: VecDeque::new(),
            affectors,
            tuning,
            next_splat: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            sprite: Sprite::new(texture, frame, frame.size() * 0.5),
        }
    }

    /// Body for a particle system node.
    #[must_use]
    pub fn body() -> Body {
        Body::new(Category::PARTICLE_SYSTEM)
    }

    /// Live particle count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Returns true if no particle is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Live particles, oldest first.
    pub fn particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.particles.iter()
    }

    /// Emits one burst at `position` (local space).
    pub fn emit(&mut self, position: Vec2) {
        let splats = self.tuning.splat_velocities.len();
        for _ in 0..self.tuning.burst_count {
            let base = if splats == 0 {
                Vec2::ZERO
            } else {
                self.tuning.splat_velocities[self.next_splat % splats]
            };
            self.next_splat = self.next_splat.wrapping_add(1);
            let jitter = self.tuning.jitter;
            let velocity = if jitter > 0.0 {
                base + Vec2::new(
                    self.rng.gen_range(-jitter..jitter),
                    self.rng.gen_range(-jitter..jitter),
                )
            } else {
                base
            };
            self.particles.push_back(Particle {
                position,
                velocity,
                rotation: 0.0,
                age: 0.0,
            });
        }
    }

    /// Ages, expires and integrates every particle.
    pub fn update(&mut self, dt: f32) {
        for particle in &mut self.particles {
            particle.age += dt;
        }
        while self
            .particles
            .front()
            .is_some_and(|p| p.age >= self.tuning.lifetime)
        {
            self.particles.pop_front();
        }
        for particle in &mut self.particles {
            for affector in &self.affectors {
                affector.apply(particle, dt);
            }
            particle.position += particle.velocity * dt;
        }
    }

    /// Submits one sprite per particle.
    pub fn draw(&self, world: Affine2, sink: &mut dyn RenderSink) {
        for particle in &self.particles {
            let local = Affine2::from_angle_translation(particle.rotation, particle.position);
            sink.draw_sprite(&self.sprite, world * local);
        }
    }
}
