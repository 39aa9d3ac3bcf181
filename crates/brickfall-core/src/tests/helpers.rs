//! Test helpers for building worlds and inspecting them.
//!
//! Levels in these tests share one layout convention: a 320x240 world with
//! a floor block whose top edge sits at y = 192, so a 16 px body placed at
//! `(x, 176)` stands on it.

use glam::Vec2;

use crate::behavior::Behavior;
use crate::category::Category;
use crate::config::WorldConfig;
use crate::data::DataTables;
use crate::entity::{Enemy, Item, Tile};
use crate::error::AssetError;
use crate::level::Level;
use crate::registry::EntityRegistry;
use crate::render::{TextureHandle, TextureHolder, TextureId, TextureProvider};
use crate::scene::NodeId;
use crate::world::World;

// =============================================================================
// Textures
// =============================================================================

/// Texture provider that hands out one handle per identifier.
#[derive(Debug, Default)]
pub struct NullTextures {
    missing: Option<TextureId>,
}

impl NullTextures {
    /// A provider that fails for `id`.
    pub fn missing(id: TextureId) -> Self {
        Self { missing: Some(id) }
    }
}

impl TextureProvider for NullTextures {
    fn acquire(&mut self, id: TextureId) -> Result<TextureHandle, AssetError> {
        if self.missing == Some(id) {
            return Err(AssetError::Missing(id));
        }
        Ok(TextureHandle::new(id as u32))
    }
}

// =============================================================================
// Setup
// =============================================================================

/// Routes `tracing` output at debug level and above to the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A registry with default tuning and stub textures.
pub fn registry() -> EntityRegistry {
    registry_with(WorldConfig::default())
}

/// A registry with the given tuning and stub textures.
pub fn registry_with(config: WorldConfig) -> EntityRegistry {
    let textures = TextureHolder::load(&mut NullTextures::default()).unwrap();
    EntityRegistry::new(config, DataTables::default(), textures)
}

/// Builds a world from level JSON with default tuning.
pub fn world_from(json: &str) -> World {
    world_with(json, WorldConfig::default())
}

/// Builds a world from level JSON with the given tuning.
pub fn world_with(json: &str, config: WorldConfig) -> World {
    let level = Level::from_json(json).unwrap();
    World::new(&level, &mut NullTextures::default(), config).unwrap()
}

/// Level JSON for a 320x240 world with a full-width floor and `objects`.
///
/// # Arguments
///
/// * `objects` - Comma-separated JSON object entries, may be empty
pub fn floor_level(objects: &str) -> String {
    let floor = r#"{ "kind": "block", "position": [0, 192], "size": [320, 16] }"#;
    let objects = if objects.trim().is_empty() {
        floor.to_string()
    } else {
        format!("{floor}, {objects}")
    };
    format!(r#"{{ "width": 320, "height": 240, "objects": [{objects}] }}"#)
}

/// Runs `frames` fixed steps.
pub fn run(world: &mut World, frames: usize) {
    for _ in 0..frames {
        world.step();
    }
}

// =============================================================================
// Inspection
// =============================================================================

/// Ids of the nodes whose category intersects `mask`, in id order.
pub fn ids_of(world: &World, mask: Category) -> Vec<NodeId> {
    world
        .graph()
        .iter()
        .filter(|(_, node)| node.body.category.intersects(mask))
        .map(|(id, _)| id)
        .collect()
}

/// World position of `id`.
pub fn position_of(world: &World, id: NodeId) -> Vec2 {
    world.graph().world_position(id).unwrap()
}

/// The first enemy in the scene.
pub fn first_enemy(world: &World) -> Option<&Enemy> {
    world
        .graph()
        .iter()
        .find_map(|(_, node)| node.entity.as_enemy())
}

/// The tile at `id`.
pub fn tile_at(world: &World, id: NodeId) -> &Tile {
    world.graph().get(id).unwrap().entity.as_tile().unwrap()
}

/// Items currently attached to the back layer.
pub fn spawned_items(world: &World) -> Vec<&Item> {
    let layer = world.graph().get(world.back_layer()).unwrap();
    layer
        .children()
        .iter()
        .filter_map(|id| world.graph().get(*id)?.entity.as_item())
        .collect()
}

/// Number of live particles.
pub fn particle_count(world: &World) -> usize {
    world
        .graph()
        .get(world.particles())
        .and_then(|node| node.entity.as_particles())
        .map_or(0, |particles| particles.len())
}

/// Steps until the player reaches `state` or `limit` frames pass.
///
/// # Returns
///
/// The number of frames run, or `None` if the state was never reached.
pub fn step_until_player<S>(world: &mut World, limit: usize, mut reached: S) -> Option<usize>
where
    S: FnMut(&crate::entity::Player) -> bool,
{
    for frame in 1..=limit {
        world.step();
        if world.player().is_some_and(&mut reached) {
            return Some(frame);
        }
    }
    None
}

/// Player state, if the player is still attached.
pub fn player_state(world: &World) -> Option<crate::entity::PlayerState> {
    world.player().map(Behavior::state)
}
