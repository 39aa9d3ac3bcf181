//! Entity module: node state shared by every scene node, plus the
//! per-kind gameplay payloads.
//!
//! - [`Body`]: transform, category, velocity, vitality, foot-sensor count
//!   and removal flag, i.e. everything the scene graph and the collision
//!   passes need to know about a node
//! - [`Entity`]: type-safe storage for the kind-specific state machine
//!   ([`Player`], [`Enemy`], [`Item`], [`Tile`], [`Projectile`],
//!   [`ParticleSystem`]) or [`Entity::Layer`] for plain grouping nodes
//! - [`Peer`] and [`Contact`]: what one side of a collision is told about
//!   the other
//! - [`UpdateContext`]: what an entity sees during its per-tick update
//!
//! # Lifecycle
//!
//! A body with vitality `<= 0` is destroyed. Destroyed bodies ignore contacts
//! and are skipped by the collision pass. On their next update they run a
//! teardown hook (a broken brick emits debris) and mark themselves for
//! removal; the scene graph prunes them at the start of the following frame.

pub mod enemy;
pub mod item;
pub mod particles;
pub mod player;
pub mod projectile;
pub mod tile;

use std::fmt;

use bitflags::bitflags;
use glam::{Affine2, Vec2};

use crate::category::Category;
use crate::collision::Manifold;
use crate::command::{Command, CommandQueue};
use crate::geometry::{Rect, Transform};
use crate::render::RenderSink;
use crate::scene::NodeId;

pub use enemy::{Enemy, EnemyKind, EnemyState};
pub use item::{Item, ItemKind, ItemState};
pub use particles::{Affector, Particle, ParticleSystem};
pub use player::{Abilities, Player, PlayerForm, PlayerState};
pub use projectile::{Projectile, ProjectileState};
pub use tile::{Tile, TileKind, TileState};

// =============================================================================
// Body
// =============================================================================

/// Physical state carried by every scene node.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Transform relative to the parent node.
    pub transform: Transform,
    /// Category tag used for broadcast addressing and contact lookup.
    pub category: Category,
    /// Velocity in pixels per second.
    pub velocity: Vec2,
    /// Primary bounding box in local space. Empty for non-colliding nodes.
    pub bounds: Rect,
    /// Foot-sensor box in local space, if the body senses footing.
    pub foot_sensor: Option<Rect>,
    vitality: i32,
    foot_sense: u32,
    marked_for_removal: bool,
}

impl Body {
    /// Creates a live body at the origin with no bounds.
    #[must_use]
    pub fn new(category: Category) -> Self {
        Self {
            transform: Transform::IDENTITY,
            category,
            velocity: Vec2::ZERO,
            bounds: Rect::default(),
            foot_sensor: None,
            vitality: 1,
            foot_sense: 0,
            marked_for_removal: false,
        }
    }

    /// Sets the local position.
    #[must_use]
    pub fn at(mut self, position: Vec2) -> Self {
        self.transform.position = position;
        self
    }

    /// Sets the local bounding box.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    /// Sets the local foot-sensor box.
    #[must_use]
    pub fn with_sensor(mut self, sensor: Rect) -> Self {
        self.foot_sensor = Some(sensor);
        self
    }

    /// Sets the initial velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Local position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.transform.position
    }

    /// Moves the body by `offset` in parent space.
    pub fn move_by(&mut self, offset: Vec2) {
        self.transform.translate(offset);
    }

    /// Adds `delta` to the velocity.
    pub fn accelerate(&mut self, delta: Vec2) {
        self.velocity += delta;
    }

    /// Applies `gravity * dt` downward.
    pub fn fall(&mut self, gravity: f32, dt: f32) {
        self.velocity.y += gravity * dt;
    }

    /// Advances the position by `velocity * dt`.
    pub fn integrate(&mut self, dt: f32) {
        self.transform.translate(self.velocity * dt);
    }

    /// Remaining vitality.
    #[must_use]
    pub const fn vitality(&self) -> i32 {
        self.vitality
    }

    /// Returns true once vitality has dropped to zero or below.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.vitality <= 0
    }

    /// Drops vitality to zero. The node is removed after its next update.
    pub fn destroy(&mut self) {
        self.vitality = 0;
    }

    /// Destroys the body and marks it for removal at the next prune,
    /// skipping its teardown hook.
    pub fn remove(&mut self) {
        self.destroy();
        self.marked_for_removal = true;
    }

    /// Marks the body for removal at the next prune.
    pub fn mark_for_removal(&mut self) {
        self.marked_for_removal = true;
    }

    /// Returns true if the next prune removes this node.
    #[must_use]
    pub const fn is_marked_for_removal(&self) -> bool {
        self.marked_for_removal
    }

    /// Number of bodies touched by the foot sensor during the last
    /// collision pass.
    #[must_use]
    pub const fn foot_sense(&self) -> u32 {
        self.foot_sense
    }

    /// Returns true if the foot sensor touched anything last pass.
    #[must_use]
    pub const fn has_footing(&self) -> bool {
        self.foot_sense > 0
    }

    /// Clears the foot-sensor count before a collision pass.
    pub fn reset_foot_sense(&mut self) {
        self.foot_sense = 0;
    }

    /// Records one foot-sensor hit.
    pub fn sense_ground(&mut self) {
        self.foot_sense += 1;
    }
}

/// Box of `size` whose origin is its bottom-center.
#[must_use]
pub fn standing_bounds(size: Vec2) -> Rect {
    Rect::new(-size.x * 0.5, -size.y, size.x, size.y)
}

/// Thin probe just below a standing box of `size`, inset one pixel per
/// side so walls do not count as footing.
#[must_use]
pub fn foot_sensor(size: Vec2) -> Rect {
    Rect::new(-size.x * 0.5 + 1.0, 0.0, size.x - 2.0, 2.0)
}

/// Reverses horizontal velocity away from a side contact.
pub(crate) fn turn_away(body: &mut Body, contact: &Contact) {
    let away = contact.manifold.horizontal_sign();
    if away != 0.0 {
        body.velocity.x = body.velocity.x.abs() * away;
    }
}

// =============================================================================
// Contacts
// =============================================================================

bitflags! {
    /// State of the other body that contact handlers branch on.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct PeerFlags: u8 {
        /// The body is dying or otherwise inactive.
        const DYING = 1 << 0;
        /// The body ignores harmful contacts.
        const INVULNERABLE = 1 << 1;
        /// The body destroys enemies on touch.
        const INVINCIBLE = 1 << 2;
        /// The body faces right.
        const FACING_RIGHT = 1 << 3;
        /// The tile is bumping upward and knocks out whatever it touches.
        const BUMPING = 1 << 4;
        /// The enemy cannot hurt on touch.
        const HARMLESS = 1 << 5;
        /// The item has not finished emerging and cannot be picked up.
        const DORMANT = 1 << 6;
    }
}

/// Snapshot of the other body in a contact, taken before either side
/// resolves.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Peer {
    /// Node id of the other body.
    pub id: NodeId,
    /// Category of the other body.
    pub category: Category,
    /// State flags of the other body.
    pub flags: PeerFlags,
    /// Velocity of the other body.
    pub velocity: Vec2,
}

impl Peer {
    /// Returns true if the other body is dying.
    #[must_use]
    pub const fn is_dying(&self) -> bool {
        self.flags.contains(PeerFlags::DYING)
    }
}

/// One side of a resolved collision.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Contact {
    /// Push-out manifold from the receiving body's perspective.
    pub manifold: Manifold,
    /// The other body.
    pub other: Peer,
}

// =============================================================================
// Update Context
// =============================================================================

/// Per-node view passed to entity updates.
pub struct UpdateContext<'a> {
    /// Tick duration in seconds.
    pub dt: f32,
    /// Id of the node being updated.
    pub id: NodeId,
    /// World transform of the node at the start of its update.
    pub world: Affine2,
    commands: &'a mut CommandQueue,
}

impl<'a> UpdateContext<'a> {
    /// Creates a context.
    pub fn new(dt: f32, id: NodeId, world: Affine2, commands: &'a mut CommandQueue) -> Self {
        Self {
            dt,
            id,
            world,
            commands,
        }
    }

    /// World position of the node's origin.
    #[must_use]
    pub fn world_position(&self) -> Vec2 {
        self.world.translation
    }

    /// Queues a command for the next drain.
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }
}

impl fmt::Debug for UpdateContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateContext")
            .field("dt", &self.dt)
            .field("id", &self.id)
            .field("pending", &self.commands.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Entity
// =============================================================================

/// Kind tag for an [`Entity`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Grouping node without behavior.
    Layer,
    /// Player character.
    Player,
    /// Enemy.
    Enemy,
    /// Pickup.
    Item,
    /// Tile.
    Tile,
    /// Projectile.
    Projectile,
    /// Particle emitter.
    Particles,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layer => write!(f, "Layer"),
            Self::Player => write!(f, "Player"),
            Self::Enemy => write!(f, "Enemy"),
            Self::Item => write!(f, "Item"),
            Self::Tile => write!(f, "Tile"),
            Self::Projectile => write!(f, "Projectile"),
            Self::Particles => write!(f, "Particles"),
        }
    }
}

/// Type-safe storage for a node's gameplay state.
#[derive(Debug)]
pub enum Entity {
    /// Grouping node without behavior.
    Layer,
    /// Player character.
    Player(Player),
    /// Enemy.
    Enemy(Enemy),
    /// Pickup.
    Item(Item),
    /// Tile.
    Tile(Tile),
    /// Projectile.
    Projectile(Projectile),
    /// Particle emitter.
    Particles(ParticleSystem),
}

impl Entity {
    /// Returns the kind tag.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Layer => EntityKind::Layer,
            Self::Player(_) => EntityKind::Player,
            Self::Enemy(_) => EntityKind::Enemy,
            Self::Item(_) => EntityKind::Item,
            Self::Tile(_) => EntityKind::Tile,
            Self::Projectile(_) => EntityKind::Projectile,
            Self::Particles(_) => EntityKind::Particles,
        }
    }

    /// Returns the player state, if this is a player.
    #[must_use]
    pub const fn as_player(&self) -> Option<&Player> {
        match self {
            Self::Player(player) => Some(player),
            _ => None,
        }
    }

    /// Returns the mutable player state, if this is a player.
    #[must_use]
    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match self {
            Self::Player(player) => Some(player),
            _ => None,
        }
    }

    /// Returns the enemy state, if this is an enemy.
    #[must_use]
    pub const fn as_enemy(&self) -> Option<&Enemy> {
        match self {
            Self::Enemy(enemy) => Some(enemy),
            _ => None,
        }
    }

    /// Returns the item state, if this is an item.
    #[must_use]
    pub const fn as_item(&self) -> Option<&Item> {
        match self {
            Self::Item(item) => Some(item),
            _ => None,
        }
    }

    /// Returns the tile state, if this is a tile.
    #[must_use]
    pub const fn as_tile(&self) -> Option<&Tile> {
        match self {
            Self::Tile(tile) => Some(tile),
            _ => None,
        }
    }

    /// Returns the projectile state, if this is a projectile.
    #[must_use]
    pub const fn as_projectile(&self) -> Option<&Projectile> {
        match self {
            Self::Projectile(projectile) => Some(projectile),
            _ => None,
        }
    }

    /// Returns the particle system, if this is one.
    #[must_use]
    pub const fn as_particles(&self) -> Option<&ParticleSystem> {
        match self {
            Self::Particles(particles) => Some(particles),
            _ => None,
        }
    }

    /// Returns the mutable particle system, if this is one.
    #[must_use]
    pub fn as_particles_mut(&mut self) -> Option<&mut ParticleSystem> {
        match self {
            Self::Particles(particles) => Some(particles),
            _ => None,
        }
    }

    /// Runs one tick.
    ///
    /// A destroyed body runs its teardown hook and marks itself for removal
    /// instead of updating.
    pub fn update(&mut self, body: &mut Body, ctx: &mut UpdateContext<'_>) {
        if body.is_destroyed() {
            if !body.is_marked_for_removal() {
                if let Self::Tile(tile) = self {
                    tile.on_destroyed(body, ctx);
                }
                body.mark_for_removal();
            }
            return;
        }
        match self {
            Self::Layer => {}
            Self::Player(player) => player.update(body, ctx),
            Self::Enemy(enemy) => enemy.update(body, ctx),
            Self::Item(item) => item.update(body, ctx),
            Self::Tile(tile) => tile.update(body, ctx),
            Self::Projectile(projectile) => projectile.update(body, ctx),
            Self::Particles(particles) => particles.update(ctx.dt),
        }
    }

    /// Responds to one side of a contact.
    ///
    /// # Returns
    ///
    /// `true` if a contact entry handled it. A destroyed body never handles
    /// contacts.
    pub fn resolve(&mut self, body: &mut Body, contact: &Contact) -> bool {
        use crate::behavior::Behavior;

        if body.is_destroyed() {
            return false;
        }
        let handled = match self {
            Self::Layer | Self::Particles(_) => false,
            Self::Player(player) => player.react(body, contact),
            Self::Enemy(enemy) => enemy.react(body, contact),
            Self::Item(item) => item.react(body, contact),
            Self::Tile(tile) => tile.react(body, contact),
            Self::Projectile(projectile) => projectile.react(body, contact),
        };
        if handled {
            tracing::trace!(
                other = %contact.other.id,
                axis = ?contact.manifold.axis,
                depth = contact.manifold.depth,
                "contact handled"
            );
        }
        handled
    }

    /// State flags reported to the other side of a contact.
    #[must_use]
    pub fn peer_flags(&self, body: &Body) -> PeerFlags {
        let mut flags = match self {
            Self::Layer | Self::Particles(_) => PeerFlags::empty(),
            Self::Player(player) => player.peer_flags(),
            Self::Enemy(enemy) => enemy.peer_flags(body),
            Self::Item(item) => item.peer_flags(),
            Self::Tile(tile) => tile.peer_flags(),
            Self::Projectile(projectile) => projectile.peer_flags(),
        };
        if body.is_destroyed() {
            flags |= PeerFlags::DYING;
        }
        flags
    }

    /// Triggers an externally caused death.
    pub fn kill(&mut self, body: &mut Body) {
        match self {
            Self::Player(player) => player.kill(body),
            Self::Enemy(enemy) => enemy.knock_out(body),
            Self::Layer | Self::Particles(_) => {}
            Self::Item(_) | Self::Tile(_) | Self::Projectile(_) => body.destroy(),
        }
    }

    /// Submits this node's visuals.
    ///
    /// # Arguments
    ///
    /// * `body` - This node's body
    /// * `world` - Accumulated transform, ancestors then this node
    /// * `sink` - Receiver of draw calls
    pub fn draw(&self, body: &Body, world: Affine2, sink: &mut dyn RenderSink) {
        match self {
            Self::Layer => {}
            Self::Player(player) => player.draw(body, world, sink),
            Self::Enemy(enemy) => enemy.draw(world, sink),
            Self::Item(item) => item.draw(world, sink),
            Self::Tile(tile) => tile.draw(world, sink),
            Self::Projectile(projectile) => projectile.draw(world, sink),
            Self::Particles(particles) => particles.draw(world, sink),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod body_tests {
        use super::*;

        #[test]
        fn new_body_is_alive() {
            let body = Body::new(Category::GOOMBA);
            assert_eq!(body.vitality(), 1);
            assert!(!body.is_destroyed());
            assert!(!body.is_marked_for_removal());
        }

        #[test]
        fn destroy_defers_removal() {
            let mut body = Body::new(Category::GOOMBA);
            body.destroy();
            assert!(body.is_destroyed());
            assert!(!body.is_marked_for_removal());
        }

        #[test]
        fn remove_marks_immediately() {
            let mut body = Body::new(Category::GOOMBA);
            body.remove();
            assert!(body.is_destroyed());
            assert!(body.is_marked_for_removal());
        }

        #[test]
        fn integrate_uses_velocity() {
            let mut body = Body::new(Category::GOOMBA)
                .at(Vec2::new(10.0, 10.0))
                .with_velocity(Vec2::new(60.0, -30.0));
            body.integrate(0.5);
            assert!((body.position().x - 40.0).abs() < 0.0001);
            assert!((body.position().y - -5.0).abs() < 0.0001);
        }

        #[test]
        fn foot_sense_counts_and_resets() {
            let mut body = Body::new(Category::SMALL_PLAYER);
            body.sense_ground();
            body.sense_ground();
            assert_eq!(body.foot_sense(), 2);
            assert!(body.has_footing());
            body.reset_foot_sense();
            assert!(!body.has_footing());
        }
    }

    mod entity_tests {
        use super::*;

        #[test]
        fn layer_ignores_contacts() {
            let mut layer = Entity::Layer;
            let mut body = Body::new(Category::BACK_LAYER);
            let contact = Contact {
                manifold: Manifold::new(Vec2::Y, -2.0),
                other: Peer {
                    id: NodeId::new(1),
                    category: Category::GOOMBA,
                    flags: PeerFlags::empty(),
                    velocity: Vec2::ZERO,
                },
            };
            assert!(!layer.resolve(&mut body, &contact));
            assert_eq!(layer.kind(), EntityKind::Layer);
        }

        #[test]
        fn destroyed_layer_marks_itself_on_update() {
            let mut layer = Entity::Layer;
            let mut body = Body::new(Category::BACK_LAYER);
            body.destroy();
            let mut queue = CommandQueue::new();
            let mut ctx = UpdateContext::new(0.1, NodeId::new(1), Affine2::IDENTITY, &mut queue);
            layer.update(&mut body, &mut ctx);
            assert!(body.is_marked_for_removal());
        }

        #[test]
        fn destroyed_body_reports_dying() {
            let mut body = Body::new(Category::BRICK);
            body.destroy();
            assert!(Entity::Layer.peer_flags(&body).contains(PeerFlags::DYING));
        }
    }
}
