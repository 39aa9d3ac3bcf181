//! Pickups: coins, mushrooms, flowers and stars.
//!
//! Items placed in the level start settled. Items spawned from a box start
//! in [`ItemState::Emerging`], rising out of the box without contacts until
//! they have cleared most of their height. Each kind has its own dispatch
//! table, built by [`Item::behavior`].

use std::sync::Arc;

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

use crate::behavior::{Behavior, BehaviorTable};
use crate::category::Category;
use crate::config::WorldConfig;
use crate::data::{DataTables, Strip};
use crate::entity::{turn_away, Body, Contact, PeerFlags, UpdateContext};
use crate::geometry::Rect;
use crate::render::{Animation, RenderSink, Sprite, TextureHandle};

/// Kind of [`Item`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Coin placed in the level.
    Coin,
    /// Coin popped out of a box; it cannot be picked up.
    MovingCoin,
    /// Grows the player.
    Mushroom,
    /// Grants fire.
    Flower,
    /// Grants temporary invincibility.
    Star,
}

impl ItemKind {
    /// Category tag.
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::Coin => Category::STATIC_COIN,
            Self::MovingCoin => Category::MOVING_COIN,
            Self::Mushroom => Category::MUSHROOM,
            Self::Flower => Category::FLOWER,
            Self::Star => Category::STAR,
        }
    }
}

/// Behavior state of an [`Item`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ItemState {
    /// Rising out of a box.
    Emerging,
    /// Moving freely.
    Airborne,
    /// Resting or walking on something.
    Grounded,
}

const SIZE: Vec2 = Vec2::new(16.0, 16.0);

/// Pickup state.
#[derive(Debug)]
pub struct Item {
    kind: ItemKind,
    state: ItemState,
    risen: f32,
    animation: Animation,
    config: Arc<WorldConfig>,
    texture: TextureHandle,
    table: Arc<BehaviorTable<ItemState, Item>>,
}

impl Item {
    /// Creates an item.
    ///
    /// # Arguments
    ///
    /// * `kind` - What the item is
    /// * `spawned` - True if it comes out of a box, false if placed
    /// * `config` - Shared tuning
    /// * `data` - Shared sprite data
    /// * `texture` - Items texture
    /// * `table` - Dispatch table for `kind`
    #[must_use]
    pub fn new(
        kind: ItemKind,
        spawned: bool,
        config: Arc<WorldConfig>,
        data: &DataTables,
        texture: TextureHandle,
        table: Arc<BehaviorTable<ItemState, Self>>,
    ) -> Self {
        let state = match kind {
            ItemKind::MovingCoin => ItemState::Airborne,
            _ if spawned => ItemState::Emerging,
            ItemKind::Mushroom | ItemKind::Star => ItemState::Airborne,
            ItemKind::Coin | ItemKind::Flower => ItemState::Grounded,
        };
        Self {
            kind,
            state,
            risen: 0.0,
            animation: strip(data, kind).animation(),
            config,
            texture,
            table,
        }
    }

    /// Body for an item of `kind` centered at `position`.
    #[must_use]
    pub fn body(kind: ItemKind, position: Vec2, config: &WorldConfig) -> Body {
        let velocity = match kind {
            ItemKind::MovingCoin => Vec2::new(0.0, -config.item.coin_pop),
            _ => Vec2::ZERO,
        };
        Body::new(kind.category())
            .at(position)
            .with_bounds(Rect::centered(Vec2::ZERO, SIZE))
            .with_sensor(Rect::new(-SIZE.x * 0.5 + 1.0, SIZE.y * 0.5, SIZE.x - 2.0, 2.0))
            .with_velocity(velocity)
    }

    /// Builds the dispatch table for `kind`.
    #[must_use]
    pub fn behavior(kind: ItemKind) -> BehaviorTable<ItemState, Self> {
        let table = BehaviorTable::new().on_update(ItemState::Emerging, emerging);
        match kind {
            ItemKind::Coin | ItemKind::Flower => {
                table.on_contact(ItemState::Grounded, Category::PLAYER, collected)
            }
            ItemKind::MovingCoin => table.on_update(ItemState::Airborne, popping),
            ItemKind::Mushroom => table
                .on_update(ItemState::Airborne, falling)
                .on_update(ItemState::Grounded, walking)
                .on_contact(ItemState::Airborne, Category::PLAYER, collected)
                .on_contact(ItemState::Airborne, Category::TILES, walker_solid)
                .on_contact(ItemState::Grounded, Category::PLAYER, collected)
                .on_contact(ItemState::Grounded, Category::TILES, walker_solid),
            ItemKind::Star => table
                .on_update(ItemState::Airborne, falling)
                .on_contact(ItemState::Airborne, Category::PLAYER, collected)
                .on_contact(ItemState::Airborne, Category::TILES, bouncing_solid),
        }
    }

    /// Kind of pickup.
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        self.kind
    }

    /// State flags reported to the other side of a contact.
    #[must_use]
    pub fn peer_flags(&self) -> PeerFlags {
        if self.state == ItemState::Emerging || self.kind == ItemKind::MovingCoin {
            PeerFlags::DORMANT
        } else {
            PeerFlags::empty()
        }
    }

    /// Runs one tick: the state handler, integration, animation.
    pub fn update(&mut self, body: &mut Body, ctx: &mut UpdateContext<'_>) {
        self.tick(body, ctx);
        body.integrate(ctx.dt);
        self.animation.update(ctx.dt);
    }

    /// Submits the item sprite.
    pub fn draw(&self, world: Affine2, sink: &mut dyn RenderSink) {
        let frame = self.animation.frame();
        let sprite = Sprite::new(self.texture, frame, frame.size() * 0.5);
        sink.draw_sprite(&sprite, world);
    }

    fn enter(&mut self, state: ItemState) {
        if self.state != state {
            tracing::trace!(kind = ?self.kind, from = ?self.state, to = ?state, "item state");
            self.state = state;
        }
    }
}

impl Behavior for Item {
    type State = ItemState;

    fn state(&self) -> ItemState {
        self.state
    }

    fn table(&self) -> &BehaviorTable<ItemState, Self> {
        &self.table
    }
}

fn strip(data: &DataTables, kind: ItemKind) -> &Strip {
    match kind {
        ItemKind::Coin => &data.coin,
        ItemKind::MovingCoin => &data.moving_coin,
        ItemKind::Mushroom => &data.mushroom,
        ItemKind::Flower => &data.flower,
        ItemKind::Star => &data.star,
    }
}

// =============================================================================
// Update Handlers
// =============================================================================

fn emerging(item: &mut Item, body: &mut Body, ctx: &mut UpdateContext<'_>) {
    let tuning = &item.config.item;
    if item.risen < SIZE.y * tuning.rise_fraction {
        body.velocity = Vec2::new(0.0, -tuning.rise_speed);
        item.risen += tuning.rise_speed * ctx.dt;
        return;
    }
    match item.kind {
        ItemKind::Mushroom => {
            body.velocity = Vec2::new(tuning.mushroom_speed, 0.0);
            item.enter(ItemState::Airborne);
        }
        ItemKind::Star => {
            body.velocity = tuning.star_launch;
            item.enter(ItemState::Airborne);
        }
        ItemKind::Coin | ItemKind::Flower | ItemKind::MovingCoin => {
            body.velocity = Vec2::ZERO;
            item.enter(ItemState::Grounded);
        }
    }
}

fn falling(item: &mut Item, body: &mut Body, ctx: &mut UpdateContext<'_>) {
    body.fall(item.config.gravity, ctx.dt);
}

fn walking(item: &mut Item, body: &mut Body, ctx: &mut UpdateContext<'_>) {
    if body.has_footing() {
        body.velocity.y = body.velocity.y.min(0.0);
    } else {
        item.enter(ItemState::Airborne);
        falling(item, body, ctx);
    }
}

fn popping(item: &mut Item, body: &mut Body, ctx: &mut UpdateContext<'_>) {
    body.fall(item.config.gravity, ctx.dt);
    if body.velocity.y > item.config.item.coin_vanish_speed {
        body.destroy();
    }
}

// =============================================================================
// Contact Handlers
// =============================================================================

fn collected(_: &mut Item, body: &mut Body, contact: &Contact) {
    if contact.other.is_dying() {
        return;
    }
    body.move_by(contact.manifold.push_out());
    body.destroy();
}

fn walker_solid(item: &mut Item, body: &mut Body, contact: &Contact) {
    let manifold = contact.manifold;
    body.move_by(manifold.push_out());
    if manifold.is_horizontal() {
        turn_away(body, contact);
    } else if manifold.pushes_up() {
        body.velocity.y = body.velocity.y.min(0.0);
        item.enter(ItemState::Grounded);
    } else {
        body.velocity.y = body.velocity.y.abs();
    }
}

fn bouncing_solid(item: &mut Item, body: &mut Body, contact: &Contact) {
    let manifold = contact.manifold;
    body.move_by(manifold.push_out());
    if manifold.is_horizontal() {
        turn_away(body, contact);
    } else if manifold.pushes_up() {
        body.velocity.y = -item.config.item.star_bounce;
    } else {
        body.velocity.y = body.velocity.y.abs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::Manifold;
    use crate::command::CommandQueue;
    use crate::entity::Peer;
    use crate::scene::NodeId;

    fn item(kind: ItemKind, spawned: bool) -> (Item, Body) {
        let config = Arc::new(WorldConfig::default());
        let body = Item::body(kind, Vec2::new(40.0, 40.0), &config);
        let item = Item::new(
            kind,
            spawned,
            config,
            &DataTables::default(),
            TextureHandle::new(2),
            Arc::new(Item::behavior(kind)),
        );
        (item, body)
    }

    fn contact(category: Category, flags: PeerFlags, axis: Vec2, depth: f32) -> Contact {
        Contact {
            manifold: Manifold::new(axis, depth),
            other: Peer {
                id: NodeId::new(3),
                category,
                flags,
                velocity: Vec2::ZERO,
            },
        }
    }

    fn tick(item: &mut Item, body: &mut Body) {
        let mut queue = CommandQueue::new();
        let mut ctx = UpdateContext::new(1.0 / 60.0, NodeId::new(4), Affine2::IDENTITY, &mut queue);
        item.update(body, &mut ctx);
    }

    #[test]
    fn emerging_mushroom_rises_then_walks() {
        let (mut item, mut body) = item(ItemKind::Mushroom, true);
        assert_eq!(item.state(), ItemState::Emerging);
        assert!(item.peer_flags().contains(PeerFlags::DORMANT));
        assert!(!item.react(&mut body, &contact(Category::SMALL_PLAYER, PeerFlags::empty(), Vec2::X, 1.0)));

        for _ in 0..20 {
            tick(&mut item, &mut body);
        }
        assert_eq!(item.state(), ItemState::Emerging);
        assert!(body.position().y < 40.0);

        for _ in 0..40 {
            tick(&mut item, &mut body);
        }
        assert_eq!(item.state(), ItemState::Airborne);
        assert!(body.velocity.x > 0.0);
        assert!(item.peer_flags().is_empty());
    }

    #[test]
    fn collected_unless_player_is_dying() {
        let (mut item, mut body) = item(ItemKind::Mushroom, false);
        item.react(&mut body, &contact(Category::SMALL_PLAYER, PeerFlags::DYING, Vec2::X, 1.0));
        assert!(!body.is_destroyed());
        item.react(&mut body, &contact(Category::SMALL_PLAYER, PeerFlags::empty(), Vec2::X, 1.0));
        assert!(body.is_destroyed());
    }

    #[test]
    fn star_bounces_off_the_ground() {
        let (mut item, mut body) = item(ItemKind::Star, false);
        body.velocity = Vec2::new(40.0, 100.0);
        item.react(&mut body, &contact(Category::BLOCK, PeerFlags::empty(), Vec2::Y, -2.0));
        assert!((body.velocity.y + 250.0).abs() < 0.0001);
        assert_eq!(item.state(), ItemState::Airborne);
    }

    #[test]
    fn placed_coin_only_reacts_to_players() {
        let (mut item, mut body) = item(ItemKind::Coin, false);
        assert_eq!(item.state(), ItemState::Grounded);
        assert!(!item.react(&mut body, &contact(Category::GOOMBA, PeerFlags::empty(), Vec2::X, 1.0)));
        assert!(item.react(&mut body, &contact(Category::BIG_PLAYER, PeerFlags::empty(), Vec2::X, 1.0)));
    }

    #[test]
    fn moving_coin_vanishes_on_the_way_down() {
        let (mut item, mut body) = item(ItemKind::MovingCoin, true);
        assert!(body.velocity.y < 0.0);
        let mut ticks = 0;
        while !body.is_destroyed() && ticks < 120 {
            tick(&mut item, &mut body);
            ticks += 1;
        }
        assert!(body.is_destroyed());
        assert!(body.velocity.y > 350.0);
    }
}
