//! Blocks, bricks and item boxes.
//!
//! Tiles never move on their own. A hit from below only records a pending
//! reaction; the bump, the item spawn and the break happen during the
//! tile's next update so collision geometry never changes mid-pass.
//!
//! ```text
//!   Idle --hit--> Bumped --bump_duration--> Idle | Spent
//!   Idle --big player hits brick--> Breaking --break_delay--> destroyed
//! ```

use std::sync::Arc;

use glam::{Affine2, Vec2};

use crate::behavior::{Behavior, BehaviorTable};
use crate::category::Category;
use crate::command::{Action, Command, Spawn};
use crate::config::WorldConfig;
use crate::data::{DataTables, TileFrames};
use crate::entity::item::ItemKind;
use crate::entity::{Body, Contact, PeerFlags, UpdateContext};
use crate::geometry::{IntRect, Rect};
use crate::render::{Animation, RenderSink, Sprite, TextureHandle};

/// Kind of [`Tile`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// Indestructible ground or wall.
    Block,
    /// Bumped by small players, broken by big ones.
    Brick,
    /// Box with one coin.
    SoloCoinBox,
    /// Box with several coins.
    CoinsBox,
    /// Box with a mushroom.
    TransformBox,
    /// Box with a flower.
    FireBox,
    /// Box with a star.
    ShiftBox,
    /// Emptied box.
    SolidBox,
}

impl TileKind {
    /// Category tag.
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::Block => Category::BLOCK,
            Self::Brick => Category::BRICK,
            Self::SoloCoinBox => Category::SOLO_COIN_BOX,
            Self::CoinsBox => Category::COINS_BOX,
            Self::TransformBox => Category::TRANSFORM_BOX,
            Self::FireBox => Category::FIRE_BOX,
            Self::ShiftBox => Category::SHIFT_BOX,
            Self::SolidBox => Category::SOLID_BOX,
        }
    }

    /// Item released per hit, if the tile is a box.
    #[must_use]
    pub const fn contents(self) -> Option<ItemKind> {
        match self {
            Self::SoloCoinBox | Self::CoinsBox => Some(ItemKind::MovingCoin),
            Self::TransformBox => Some(ItemKind::Mushroom),
            Self::FireBox => Some(ItemKind::Flower),
            Self::ShiftBox => Some(ItemKind::Star),
            Self::Block | Self::Brick | Self::SolidBox => None,
        }
    }

    /// Returns true for kinds that hold items.
    #[must_use]
    pub const fn is_box(self) -> bool {
        self.contents().is_some()
    }
}

/// Behavior state of a [`Tile`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TileState {
    /// Waiting for a hit.
    Idle,
    /// Raised after a hit.
    Bumped,
    /// About to shatter.
    Breaking,
    /// Emptied box; inert.
    Spent,
}

/// Tile state.
#[derive(Debug)]
pub struct Tile {
    kind: TileKind,
    state: TileState,
    remaining: u32,
    timer: f32,
    bump_pending: bool,
    spawn_pending: Option<ItemKind>,
    raised: bool,
    animation: Animation,
    spent_frame: IntRect,
    config: Arc<WorldConfig>,
    texture: TextureHandle,
    table: Arc<BehaviorTable<TileState, Tile>>,
}

impl Tile {
    /// Creates an idle tile.
    ///
    /// # Arguments
    ///
    /// * `kind` - What the tile is
    /// * `count` - Items held by a box; ignored for other kinds
    /// * `config` - Shared tuning
    /// * `data` - Shared sprite data
    /// * `texture` - Tiles texture
    /// * `table` - Dispatch table for `kind`
    #[must_use]
    pub fn new(
        kind: TileKind,
        count: u32,
        config: Arc<WorldConfig>,
        data: &DataTables,
        texture: TextureHandle,
        table: Arc<BehaviorTable<TileState, Self>>,
    ) -> Self {
        let frames = frames(data, kind);
        let (state, animation) = if kind == TileKind::SolidBox {
            (TileState::Spent, Animation::still(frames.spent))
        } else {
            (TileState::Idle, frames.idle.animation())
        };
        Self {
            kind,
            state,
            remaining: if kind.is_box() { count } else { 0 },
            timer: 0.0,
            bump_pending: false,
            spawn_pending: None,
            raised: false,
            animation,
            spent_frame: frames.spent,
            config,
            texture,
            table,
        }
    }

    /// Body for a tile of `kind` and `size` centered at `position`.
    #[must_use]
    pub fn body(kind: TileKind, position: Vec2, size: Vec2) -> Body {
        Body::new(kind.category())
            .at(position)
            .with_bounds(Rect::centered(Vec2::ZERO, size))
    }

    /// Builds the dispatch table for `kind`. Blocks and solid boxes get an
    /// empty table.
    #[must_use]
    pub fn behavior(kind: TileKind) -> BehaviorTable<TileState, Self> {
        let table = BehaviorTable::new();
        match kind {
            TileKind::Block | TileKind::SolidBox => table,
            TileKind::Brick => table
                .on_update(TileState::Bumped, bumped)
                .on_update(TileState::Breaking, breaking)
                .on_contact(TileState::Idle, Category::PLAYER, brick_hit),
            _ => table
                .on_update(TileState::Bumped, bumped)
                .on_contact(TileState::Idle, Category::PLAYER, box_hit),
        }
    }

    /// Kind of tile; an emptied box reports its original kind.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Items left in a box.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// State flags reported to the other side of a contact.
    #[must_use]
    pub fn peer_flags(&self) -> PeerFlags {
        if self.raised {
            PeerFlags::BUMPING
        } else {
            PeerFlags::empty()
        }
    }

    /// Runs one tick: the state handler, animation.
    pub fn update(&mut self, body: &mut Body, ctx: &mut UpdateContext<'_>) {
        self.tick(body, ctx);
        self.animation.update(ctx.dt);
    }

    /// Teardown hook for a destroyed tile: a brick bursts into debris.
    pub fn on_destroyed(&self, body: &Body, ctx: &mut UpdateContext<'_>) {
        if self.kind == TileKind::Brick {
            let center = ctx.world.transform_point2(body.bounds.center());
            ctx.push(Command::new(Category::PARTICLE_SYSTEM, Action::EmitParticles(center)));
        }
    }

    /// Submits the tile sprite.
    pub fn draw(&self, world: Affine2, sink: &mut dyn RenderSink) {
        let frame = self.animation.frame();
        let sprite = Sprite::new(self.texture, frame, frame.size() * 0.5);
        sink.draw_sprite(&sprite, world);
    }

    fn enter(&mut self, state: TileState) {
        if self.state != state {
            tracing::trace!(kind = ?self.kind, from = ?self.state, to = ?state, "tile state");
            self.state = state;
        }
    }

    fn schedule(&mut self, state: TileState) {
        self.bump_pending = true;
        self.timer = 0.0;
        self.enter(state);
    }

    /// Applies a pending bump and releases a pending item.
    fn apply_bump(&mut self, body: &mut Body, ctx: &mut UpdateContext<'_>) {
        if !self.bump_pending {
            return;
        }
        self.bump_pending = false;
        if let Some(kind) = self.spawn_pending.take() {
            let bounds = body.bounds.transformed(&ctx.world);
            let position = Vec2::new(bounds.center().x, bounds.top);
            ctx.push(Command::new(
                Category::BACK_LAYER,
                Action::Spawn(Spawn::Item { kind, position }),
            ));
        }
        body.move_by(Vec2::new(0.0, -self.config.tile.bump_height));
        self.raised = true;
    }

    fn settle(&mut self, body: &mut Body) {
        if self.raised {
            body.move_by(Vec2::new(0.0, self.config.tile.bump_height));
            self.raised = false;
        }
    }
}

impl Behavior for Tile {
    type State = TileState;

    fn state(&self) -> TileState {
        self.state
    }

    fn table(&self) -> &BehaviorTable<TileState, Self> {
        &self.table
    }
}

fn frames(data: &DataTables, kind: TileKind) -> &TileFrames {
    match kind {
        TileKind::Block => &data.block,
        TileKind::Brick => &data.brick,
        _ => &data.boxes,
    }
}

fn hit_from_below(contact: &Contact) -> bool {
    contact.manifold.pushes_up() && !contact.other.is_dying()
}

// =============================================================================
// Update Handlers
// =============================================================================

fn bumped(tile: &mut Tile, body: &mut Body, ctx: &mut UpdateContext<'_>) {
    tile.apply_bump(body, ctx);
    tile.timer += ctx.dt;
    if tile.timer < tile.config.tile.bump_duration {
        return;
    }
    tile.settle(body);
    if tile.kind.is_box() && tile.remaining == 0 {
        body.category = Category::SOLID_BOX;
        tile.animation = Animation::still(tile.spent_frame);
        tile.enter(TileState::Spent);
    } else {
        tile.enter(TileState::Idle);
    }
}

fn breaking(tile: &mut Tile, body: &mut Body, ctx: &mut UpdateContext<'_>) {
    tile.apply_bump(body, ctx);
    tile.timer += ctx.dt;
    if tile.timer >= tile.config.tile.break_delay {
        body.destroy();
    }
}

// =============================================================================
// Contact Handlers
// =============================================================================

fn brick_hit(tile: &mut Tile, _: &mut Body, contact: &Contact) {
    if !hit_from_below(contact) {
        return;
    }
    if contact.other.category.intersects(Category::BIG_PLAYER) {
        tile.schedule(TileState::Breaking);
    } else {
        tile.schedule(TileState::Bumped);
    }
}

fn box_hit(tile: &mut Tile, _: &mut Body, contact: &Contact) {
    if !hit_from_below(contact) || tile.remaining == 0 {
        return;
    }
    tile.remaining -= 1;
    tile.spawn_pending = tile.kind.contents();
    tile.schedule(TileState::Bumped);
}
