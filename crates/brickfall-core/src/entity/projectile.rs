//! Fireballs thrown by a fire-capable player.

use std::sync::Arc;

use glam::{Affine2, Vec2};

use crate::behavior::{Behavior, BehaviorTable};
use crate::category::Category;
use crate::config::WorldConfig;
use crate::entity::{Body, Contact, PeerFlags, UpdateContext};
use crate::geometry::{IntRect, Rect};
use crate::render::{RenderSink, Sprite, TextureHandle};
use crate::scene::NodeId;

/// Behavior state of a [`Projectile`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ProjectileState {
    /// Bouncing along.
    Flying,
    /// Hit something; removed shortly.
    Exploding,
}

const SIZE: Vec2 = Vec2::new(8.0, 8.0);

/// Projectile state.
#[derive(Debug)]
pub struct Projectile {
    state: ProjectileState,
    owner: NodeId,
    angle: f32,
    timer: f32,
    frame: IntRect,
    config: Arc<WorldConfig>,
    texture: TextureHandle,
    table: Arc<BehaviorTable<ProjectileState, Projectile>>,
}

impl Projectile {
    /// Creates a flying projectile fired by `owner`.
    #[must_use]
    pub fn new(
        owner: NodeId,
        frame: IntRect,
        config: Arc<WorldConfig>,
        texture: TextureHandle,
        table: Arc<BehaviorTable<ProjectileState, Self>>,
    ) -> Self {
        Self {
            state: ProjectileState::Flying,
            owner,
            angle: 0.0,
            timer: 0.0,
            frame,
            config,
            texture,
            table,
        }
    }

    /// Body centered at `position`.
    #[must_use]
    pub fn body(position: Vec2, velocity: Vec2) -> Body {
        Body::new(Category::PROJECTILE)
            .at(position)
            .with_bounds(Rect::centered(Vec2::ZERO, SIZE))
            .with_velocity(velocity)
    }

    /// Builds the projectile dispatch table.
    #[must_use]
    pub fn behavior() -> BehaviorTable<ProjectileState, Self> {
        BehaviorTable::new()
            .on_update(ProjectileState::Flying, flying)
            .on_update(ProjectileState::Exploding, exploding)
            .on_contact(ProjectileState::Flying, Category::TILES, solid_contact)
            .on_contact(ProjectileState::Flying, Category::ENEMY, enemy_contact)
    }

    /// Player that fired this projectile.
    #[must_use]
    pub const fn owner(&self) -> NodeId {
        self.owner
    }

    /// State flags reported to the other side of a contact.
    #[must_use]
    pub fn peer_flags(&self) -> PeerFlags {
        match self.state {
            ProjectileState::Flying => PeerFlags::empty(),
            ProjectileState::Exploding => PeerFlags::DYING,
        }
    }

    /// Runs one tick: the state handler, integration.
    pub fn update(&mut self, body: &mut Body, ctx: &mut UpdateContext<'_>) {
        self.tick(body, ctx);
        body.integrate(ctx.dt);
    }

    /// Submits the projectile sprite, spun by its flight angle.
    pub fn draw(&self, world: Affine2, sink: &mut dyn RenderSink) {
        let sprite = Sprite::new(self.texture, self.frame, self.frame.size() * 0.5);
        sink.draw_sprite(&sprite, world * Affine2::from_angle(self.angle));
    }

    fn explode(&mut self, body: &mut Body) {
        body.velocity = Vec2::ZERO;
        self.timer = 0.0;
        tracing::trace!(owner = %self.owner, "projectile exploding");
        self.state = ProjectileState::Exploding;
    }
}

impl Behavior for Projectile {
    type State = ProjectileState;

    fn state(&self) -> ProjectileState {
        self.state
    }

    fn table(&self) -> &BehaviorTable<ProjectileState, Self> {
        &self.table
    }
}

fn flying(projectile: &mut Projectile, body: &mut Body, ctx: &mut UpdateContext<'_>) {
    body.fall(projectile.config.gravity, ctx.dt);
    projectile.angle = (projectile.angle + projectile.config.projectile.spin * ctx.dt)
        .rem_euclid(std::f32::consts::TAU);
}

fn exploding(projectile: &mut Projectile, body: &mut Body, ctx: &mut UpdateContext<'_>) {
    body.velocity = Vec2::ZERO;
    projectile.timer += ctx.dt;
    if projectile.timer >= projectile.config.projectile.explode_duration {
        body.destroy();
    }
}

fn solid_contact(projectile: &mut Projectile, body: &mut Body, contact: &Contact) {
    let manifold = contact.manifold;
    if manifold.is_horizontal() {
        projectile.explode(body);
        return;
    }
    body.move_by(manifold.push_out());
    if manifold.pushes_up() {
        body.velocity.y = -projectile.config.projectile.bounce;
    } else {
        body.velocity.y = body.velocity.y.abs();
    }
}

fn enemy_contact(projectile: &mut Projectile, body: &mut Body, contact: &Contact) {
    if !contact.other.is_dying() {
        projectile.explode(body);
    }
}
