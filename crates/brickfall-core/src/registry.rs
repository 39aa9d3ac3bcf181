//! Startup-time registry of shared entity data.
//!
//! The [`EntityRegistry`] owns everything entities read but never write:
//! the [`WorldConfig`], the sprite [`DataTables`], the prefetched texture
//! handles and one dispatch table per entity kind. Every entity receives
//! `Arc` clones at construction, so a registry built once serves both the
//! level load and every mid-game spawn.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec2;

use crate::behavior::BehaviorTable;
use crate::category::Category;
use crate::command::Spawn;
use crate::config::WorldConfig;
use crate::data::DataTables;
use crate::entity::{
    Enemy, EnemyKind, EnemyState, Entity, Item, ItemKind, ItemState, ParticleSystem, Player,
    PlayerForm, PlayerState, Projectile, ProjectileState, Tile, TileKind, TileState,
};
use crate::level::{LevelObject, Placement};
use crate::render::{TextureHolder, TextureId};
use crate::scene::{NodeId, SceneNode};

const ITEM_KINDS: [ItemKind; 5] = [
    ItemKind::Coin,
    ItemKind::MovingCoin,
    ItemKind::Mushroom,
    ItemKind::Flower,
    ItemKind::Star,
];

const TILE_KINDS: [TileKind; 8] = [
    TileKind::Block,
    TileKind::Brick,
    TileKind::SoloCoinBox,
    TileKind::CoinsBox,
    TileKind::TransformBox,
    TileKind::FireBox,
    TileKind::ShiftBox,
    TileKind::SolidBox,
];

/// Shared read-only data and entity factory.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    config: Arc<WorldConfig>,
    data: Arc<DataTables>,
    textures: TextureHolder,
    player: Arc<BehaviorTable<PlayerState, Player>>,
    enemy: Arc<BehaviorTable<EnemyState, Enemy>>,
    items: HashMap<ItemKind, Arc<BehaviorTable<ItemState, Item>>>,
    tiles: HashMap<TileKind, Arc<BehaviorTable<TileState, Tile>>>,
    projectile: Arc<BehaviorTable<ProjectileState, Projectile>>,
}

impl EntityRegistry {
    /// Builds every dispatch table once.
    #[must_use]
    pub fn new(config: WorldConfig, data: DataTables, textures: TextureHolder) -> Self {
        let items = ITEM_KINDS
            .into_iter()
            .map(|kind| (kind, Arc::new(Item::behavior(kind))))
            .collect();
        let tiles = TILE_KINDS
            .into_iter()
            .map(|kind| (kind, Arc::new(Tile::behavior(kind))))
            .collect();
        Self {
            config: Arc::new(config),
            data: Arc::new(data),
            textures,
            player: Arc::new(Player::behavior()),
            enemy: Arc::new(Enemy::behavior()),
            items,
            tiles,
            projectile: Arc::new(Projectile::behavior()),
        }
    }

    /// Shared tuning.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Shared sprite data.
    #[must_use]
    pub fn data(&self) -> &DataTables {
        &self.data
    }

    /// Prefetched texture handles.
    #[must_use]
    pub const fn textures(&self) -> &TextureHolder {
        &self.textures
    }

    /// A plain layer node.
    #[must_use]
    pub fn layer(&self, category: Category) -> SceneNode {
        SceneNode::layer(category)
    }

    /// A player of `form` with its feet at `origin`.
    #[must_use]
    pub fn player(&self, form: PlayerForm, origin: Vec2) -> SceneNode {
        let player = Player::new(
            form,
            Arc::clone(&self.config),
            Arc::clone(&self.data),
            self.textures.get(TextureId::Player),
            Arc::clone(&self.player),
        );
        SceneNode::new(Player::body(form, origin), Entity::Player(player))
    }

    /// An enemy of `kind` with its feet at `origin`.
    #[must_use]
    pub fn enemy(&self, kind: EnemyKind, origin: Vec2) -> SceneNode {
        let enemy = Enemy::new(
            kind,
            Arc::clone(&self.config),
            Arc::clone(&self.data),
            self.textures.get(TextureId::Enemies),
            Arc::clone(&self.enemy),
        );
        let body = Enemy::body(kind, origin, self.config.enemy.walk_speed);
        SceneNode::new(body, Entity::Enemy(enemy))
    }

    /// An item of `kind` centered at `center`.
    ///
    /// # Arguments
    ///
    /// * `kind` - What the item is
    /// * `center` - Position in the parent's space
    /// * `spawned` - True if it emerges from a box
    #[must_use]
    pub fn item(&self, kind: ItemKind, center: Vec2, spawned: bool) -> SceneNode {
        let table = self
            .items
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::new(Item::behavior(kind)));
        let item = Item::new(
            kind,
            spawned,
            Arc::clone(&self.config),
            &self.data,
            self.textures.get(TextureId::Items),
            table,
        );
        SceneNode::new(Item::body(kind, center, &self.config), Entity::Item(item))
    }

    /// A tile of `kind` and `size` centered at `center`.
    #[must_use]
    pub fn tile(&self, kind: TileKind, center: Vec2, size: Vec2, count: u32) -> SceneNode {
        let table = self
            .tiles
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::new(Tile::behavior(kind)));
        let tile = Tile::new(
            kind,
            count,
            Arc::clone(&self.config),
            &self.data,
            self.textures.get(TextureId::Tiles),
            table,
        );
        SceneNode::new(Tile::body(kind, center, size), Entity::Tile(tile))
    }

    /// A projectile fired by `owner`.
    #[must_use]
    pub fn projectile(&self, owner: NodeId, center: Vec2, velocity: Vec2) -> SceneNode {
        let projectile = Projectile::new(
            owner,
            self.data.projectile,
            Arc::clone(&self.config),
            self.textures.get(TextureId::Items),
            Arc::clone(&self.projectile),
        );
        SceneNode::new(Projectile::body(center, velocity), Entity::Projectile(projectile))
    }

    /// A particle system seeded from the config.
    #[must_use]
    pub fn particles(&self) -> SceneNode {
        let system = ParticleSystem::new(
            self.config.particles.clone(),
            self.config.seed,
            self.textures.get(TextureId::Particle),
            self.data.particle,
        );
        SceneNode::new(ParticleSystem::body(), Entity::Particles(system))
    }

    /// Builds the node for a spawn request at `local`, already converted
    /// into the receiving parent's space.
    #[must_use]
    pub fn spawn(&self, spawn: &Spawn, local: Vec2) -> SceneNode {
        match *spawn {
            Spawn::Item { kind, .. } => self.item(kind, local, true),
            Spawn::Projectile {
                velocity, owner, ..
            } => self.projectile(owner, local, velocity),
        }
    }

    /// Builds the node for a level object.
    #[must_use]
    pub fn object(&self, object: &LevelObject) -> SceneNode {
        let origin = object.origin();
        match object.kind.placement() {
            Placement::Player => self.player(PlayerForm::Small, origin),
            Placement::Enemy(kind) => self.enemy(kind, origin),
            Placement::Tile(kind) => self.tile(kind, origin, object.size, object.count_or_default()),
            Placement::Item(kind) => self.item(kind, origin, false),
        }
    }
}
