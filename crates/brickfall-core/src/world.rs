//! World driver with the fixed per-frame order.
//!
//! [`World`] owns the scene, the command bus and the collision passes, and
//! runs one frame per [`World::update`]:
//!
//! 1. **INPUT**: the caller pushes commands ([`World::apply_input`],
//!    [`World::commands_mut`]) before calling `update`
//! 2. **BOUNDS**: queue removal of out-of-world bodies
//! 3. **COLLECT**: queue the collect broadcast for this frame's bodies
//! 4. **DRAIN**: deliver every queued command, including those pushed while
//!    draining
//! 5. **PRUNE**: drop nodes marked for removal
//! 6. **COLLIDE**: broad phase with foot sensing, then contact resolution
//! 7. **UPDATE**: per-entity state handlers, integration and animation
//!
//! # Determinism
//!
//! The scene iterates in [`NodeId`] order, pairs resolve in canonical order
//! and particle jitter is drawn from a seeded generator. Two worlds built
//! from the same level and config that receive the same commands stay
//! identical.
//!
//! # Example
//!
//! ```
//! use brickfall_core::config::WorldConfig;
//! use brickfall_core::error::AssetError;
//! use brickfall_core::level::Level;
//! use brickfall_core::render::{TextureHandle, TextureId, TextureProvider};
//! use brickfall_core::world::World;
//!
//! struct Atlas;
//! impl TextureProvider for Atlas {
//!     fn acquire(&mut self, id: TextureId) -> Result<TextureHandle, AssetError> {
//!         Ok(TextureHandle::new(id as u32))
//!     }
//! }
//!
//! let level = Level::from_json(r#"{ "width": 320, "height": 240, "objects": [
//!     { "kind": "player", "position": [32, 176], "size": [16, 16] },
//!     { "kind": "block", "position": [0, 192], "size": [320, 16] }
//! ] }"#).unwrap();
//!
//! let mut world = World::new(&level, &mut Atlas, WorldConfig::default()).unwrap();
//! for _ in 0..10 {
//!     world.step();
//! }
//! assert_eq!(world.tick(), 10);
//! assert!(world.player().is_some());
//! ```

use std::fmt;

use crate::category::Category;
use crate::collision::{resolve_contacts, BroadPhase};
use crate::command::{Action, Command, CommandQueue, Spawn};
use crate::config::WorldConfig;
use crate::data::DataTables;
use crate::entity::Player;
use crate::error::WorldError;
use crate::geometry::Rect;
use crate::input::InputAction;
use crate::level::{Level, ObjectKind};
use crate::registry::EntityRegistry;
use crate::render::{RenderSink, TextureHolder, TextureProvider};
use crate::scene::{Node, NodeId, SceneGraph};

/// Running game world.
pub struct World {
    graph: SceneGraph,
    commands: CommandQueue,
    registry: EntityRegistry,
    broad_phase: BroadPhase,
    bounds: Rect,
    player: Option<NodeId>,
    back_layer: NodeId,
    front_layer: NodeId,
    particles: NodeId,
    tick: u64,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("nodes", &self.graph.len())
            .field("pending", &self.commands.len())
            .field("bounds", &self.bounds)
            .field("player", &self.player)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

impl World {
    /// Builds a world from a level.
    ///
    /// # Arguments
    ///
    /// * `level` - Level to load
    /// * `provider` - Source of every texture the entities use
    /// * `config` - Tuning for the whole run
    ///
    /// # Errors
    ///
    /// - [`WorldError::Level`] if the level fails validation
    /// - [`WorldError::Asset`] if a texture is missing
    pub fn new<P: TextureProvider + ?Sized>(
        level: &Level,
        provider: &mut P,
        config: WorldConfig,
    ) -> Result<Self, WorldError> {
        level.validate()?;
        let textures = TextureHolder::load(provider)?;
        let registry = EntityRegistry::new(config, DataTables::default(), textures);
        Self::with_registry(level, registry)
    }

    /// Builds a world from a level using an existing registry.
    ///
    /// The back layer receives spawned items and projectiles; the front
    /// layer receives every level object and the particle system.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Scene`] if the scene cannot be assembled.
    pub fn with_registry(level: &Level, registry: EntityRegistry) -> Result<Self, WorldError> {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let back_layer = graph.attach(root, registry.layer(Category::BACK_LAYER))?;
        let front_layer = graph.attach(root, registry.layer(Category::FRONT_LAYER))?;

        let mut player = None;
        for object in &level.objects {
            let id = graph.attach(front_layer, registry.object(object))?;
            if object.kind == ObjectKind::Player {
                player = Some(id);
            }
        }
        let particles = graph.attach(front_layer, registry.particles())?;

        let bounds = level.bounds().inflated(registry.config().bounds_margin);
        tracing::debug!(
            objects = level.objects.len(),
            nodes = graph.len(),
            "world built"
        );

        Ok(Self {
            graph,
            commands: CommandQueue::new(),
            registry,
            broad_phase: BroadPhase::new(),
            bounds,
            player,
            back_layer,
            front_layer,
            particles,
            tick: 0,
        })
    }

    // =========================================================================
    // Frame
    // =========================================================================

    /// Runs one frame with the configured fixed timestep.
    pub fn step(&mut self) {
        self.update(self.registry.config().timestep);
    }

    /// Runs one frame of `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let span = tracing::debug_span!("frame", tick = self.tick);
        let _guard = span.enter();

        // PHASE 2: BOUNDS
        self.commands.push(Command::new(
            Category::OUT_OF_WORLD,
            Action::RemoveOutside(self.bounds),
        ));

        // PHASE 3: COLLECT
        self.commands
            .push(Command::new(Category::ALL, Action::CollectBody));

        // PHASE 4: DRAIN
        let bodies = self.drain();

        // PHASE 5: PRUNE
        let removed = self.graph.prune();
        for (_, node) in self.graph.iter_mut() {
            if let Some(player) = node.entity.as_player_mut() {
                player.settle_shots();
                player.forget_projectiles(&removed);
            }
        }

        // PHASE 6: COLLIDE
        let pairs = self.broad_phase.detect(&mut self.graph, &bodies);
        let contacts = resolve_contacts(&mut self.graph, pairs);
        tracing::trace!(bodies = bodies.len(), contacts, "collision pass");

        // PHASE 7: UPDATE
        self.graph.update(dt, &mut self.commands);

        self.tick += 1;
    }

    /// Delivers queued commands until the queue is empty.
    ///
    /// # Returns
    ///
    /// Bodies gathered by collect broadcasts, in delivery order.
    fn drain(&mut self) -> Vec<NodeId> {
        let Self {
            graph,
            commands,
            registry,
            ..
        } = self;
        let mut collected = Vec::new();
        while let Some(command) = commands.pop() {
            graph.on_command(&command, |graph, id, action| {
                deliver(graph, registry, commands, &mut collected, id, action);
            });
        }
        collected
    }

    // =========================================================================
    // Input and Output
    // =========================================================================

    /// Queues the command for an input action.
    pub fn apply_input(&mut self, action: InputAction) {
        self.commands.push(action.command(self.registry.config()));
    }

    /// Pending commands, delivered at the next update.
    #[must_use]
    pub fn commands_mut(&mut self) -> &mut CommandQueue {
        &mut self.commands
    }

    /// Draws the whole scene.
    pub fn draw(&self, sink: &mut dyn RenderSink) {
        self.graph.draw(sink);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The scene.
    #[must_use]
    pub const fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Mutable scene access for setup and tests.
    #[must_use]
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Shared entity data.
    #[must_use]
    pub const fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Node id of the player, if the level placed one.
    #[must_use]
    pub const fn player_id(&self) -> Option<NodeId> {
        self.player
    }

    /// The player node, while it is still attached.
    #[must_use]
    pub fn player_node(&self) -> Option<&Node> {
        self.graph.get(self.player?)
    }

    /// The player, while it is still attached.
    #[must_use]
    pub fn player(&self) -> Option<&Player> {
        self.player_node()?.entity.as_player()
    }

    /// Layer holding spawned items and projectiles.
    #[must_use]
    pub const fn back_layer(&self) -> NodeId {
        self.back_layer
    }

    /// Layer holding level objects.
    #[must_use]
    pub const fn front_layer(&self) -> NodeId {
        self.front_layer
    }

    /// The particle system node.
    #[must_use]
    pub const fn particles(&self) -> NodeId {
        self.particles
    }

    /// Frames run so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Rectangle outside of which bodies are removed.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }
}

// =============================================================================
// Command Dispatch
// =============================================================================

/// Applies one action to one receiving node.
fn deliver(
    graph: &mut SceneGraph,
    registry: &EntityRegistry,
    queue: &mut CommandQueue,
    collected: &mut Vec<NodeId>,
    id: NodeId,
    action: &Action,
) {
    match *action {
        Action::ApplyForce(force) => {
            if let Some(node) = graph.get_mut(id) {
                if let Some(player) = node.entity.as_player_mut() {
                    player.apply_force(&mut node.body, force);
                }
            }
        }
        Action::Jump => {
            if let Some(node) = graph.get_mut(id) {
                if let Some(player) = node.entity.as_player_mut() {
                    player.jump(&mut node.body);
                }
            }
        }
        Action::Fire => {
            let Some(origin) = graph.world_position(id) else {
                return;
            };
            let Some(node) = graph.get_mut(id) else {
                return;
            };
            let spawn = match node.entity.as_player_mut() {
                Some(player) => player.fire(&node.body, id, origin),
                None => None,
            };
            if let Some(spawn) = spawn {
                queue.push(Command::new(Category::BACK_LAYER, Action::Spawn(spawn)));
            }
        }
        Action::RemoveOutside(area) => {
            let outside = graph
                .world_bounds(id)
                .is_some_and(|bounds| !bounds.intersects(&area));
            if outside {
                if let Some(node) = graph.get_mut(id) {
                    tracing::debug!(node = %id, "left the world");
                    node.body.remove();
                }
            }
        }
        Action::CollectBody => {
            if graph.get(id).is_some_and(|node| !node.body.is_destroyed()) {
                collected.push(id);
            }
        }
        Action::Spawn(spawn) => {
            let local = graph.to_local(id, spawn.position());
            match graph.attach(id, registry.spawn(&spawn, local)) {
                Ok(child) => {
                    tracing::debug!(parent = %id, child = %child, "spawned");
                    if let Spawn::Projectile { owner, .. } = spawn {
                        if let Some(player) = graph
                            .get_mut(owner)
                            .and_then(|node| node.entity.as_player_mut())
                        {
                            player.observe_projectile(child);
                        }
                    }
                }
                Err(err) => tracing::warn!(%err, "dropped spawn"),
            }
        }
        Action::EmitParticles(position) => {
            let local = graph.to_local(id, position);
            match graph.get_mut(id).and_then(|node| node.entity.as_particles_mut()) {
                Some(particles) => particles.emit(local),
                None => tracing::warn!(node = %id, "particle target vanished"),
            }
        }
        Action::Kill => {
            if let Some(node) = graph.get_mut(id) {
                node.entity.kill(&mut node.body);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{world_from, NullTextures};

    #[test]
    fn missing_texture_is_fatal() {
        let level = Level::from_json(r#"{ "width": 100, "height": 100, "objects": [] }"#).unwrap();
        let mut provider = NullTextures::missing(crate::render::TextureId::Enemies);
        let err = World::new(&level, &mut provider, WorldConfig::default()).unwrap_err();
        assert!(matches!(err, WorldError::Asset(_)));
    }

    #[test]
    fn invalid_level_is_fatal() {
        let level = Level {
            width: 0.0,
            height: 10.0,
            objects: Vec::new(),
        };
        let mut provider = NullTextures::default();
        let err = World::new(&level, &mut provider, WorldConfig::default()).unwrap_err();
        assert!(matches!(err, WorldError::Level(_)));
    }

    #[test]
    fn layers_and_particles_are_built() {
        let world = world_from(r#"{ "width": 64, "height": 64, "objects": [
            { "kind": "block", "position": [0, 48], "size": [64, 16] }
        ] }"#);
        let root = world.graph().root();
        assert_eq!(
            world.graph().get(root).unwrap().children(),
            &[world.back_layer(), world.front_layer()]
        );
        assert_eq!(world.graph().get(world.particles()).unwrap().parent(), Some(world.front_layer()));
        assert!(world.player().is_none());
        assert_eq!(world.bounds(), Rect::new(-48.0, -48.0, 160.0, 160.0));
    }

    #[test]
    fn kill_command_reaches_enemies() {
        let mut world = world_from(r#"{ "width": 64, "height": 64, "objects": [
            { "kind": "goomba", "position": [16, 0], "size": [16, 16] }
        ] }"#);
        world
            .commands_mut()
            .push(Command::new(Category::ENEMY, Action::Kill));
        world.step();
        let enemy = world
            .graph()
            .iter()
            .find_map(|(_, node)| node.entity.as_enemy())
            .unwrap();
        assert_eq!(crate::behavior::Behavior::state(enemy), crate::entity::EnemyState::Dying);
    }
}
