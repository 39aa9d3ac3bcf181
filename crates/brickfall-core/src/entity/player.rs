//! Player character.
//!
//! # States
//!
//! | State     | Update                               | Contacts                    |
//! |-----------|--------------------------------------|-----------------------------|
//! | Airborne  | gravity, air friction                | tiles, enemies, items       |
//! | Grounded  | footing check, ground friction       | tiles, enemies, items       |
//! | Shrinking | frozen until the shrink completes    | none                        |
//! | Dying     | falls straight down                  | none                        |
//!
//! The player's origin is the bottom-center of its box, so changing form
//! keeps the feet in place.
//!
//! Input arrives through commands: [`Player::apply_force`],
//! [`Player::jump`] and [`Player::fire`] act directly on the body using the
//! foot-sensor count from the last collision pass.

use std::sync::Arc;

use bitflags::bitflags;
use glam::{Affine2, Vec2};

use crate::behavior::{Behavior, BehaviorTable};
use crate::category::Category;
use crate::command::Spawn;
use crate::config::WorldConfig;
use crate::data::{DataTables, PlayerFrames};
use crate::entity::{foot_sensor, standing_bounds, Body, Contact, PeerFlags, UpdateContext};
use crate::geometry::IntRect;
use crate::render::{Animation, RenderSink, Sprite, TextureHandle};
use crate::scene::NodeId;

/// Behavior state of a [`Player`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PlayerState {
    /// In the air.
    Airborne,
    /// Standing on something.
    Grounded,
    /// Losing the big form after a hit.
    Shrinking,
    /// Terminal; removed once it falls out of the world.
    Dying,
}

/// Size form of a [`Player`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PlayerForm {
    /// One tile tall.
    Small,
    /// Two tiles tall.
    Big,
}

impl PlayerForm {
    /// Category tag for this form.
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::Small => Category::SMALL_PLAYER,
            Self::Big => Category::BIG_PLAYER,
        }
    }

    /// Box size for this form.
    #[must_use]
    pub const fn size(self) -> Vec2 {
        match self {
            Self::Small => Vec2::new(16.0, 16.0),
            Self::Big => Vec2::new(16.0, 32.0),
        }
    }
}

bitflags! {
    /// Powers granted by items.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct Abilities: u8 {
        /// Can throw projectiles.
        const FIREABLE = 1 << 0;
        /// Destroys enemies on touch and ignores harm.
        const INVINCIBLE = 1 << 1;
    }
}

/// Player character state.
#[derive(Debug)]
pub struct Player {
    state: PlayerState,
    form: PlayerForm,
    abilities: Abilities,
    coins: u32,
    facing_right: bool,
    shrink_timer: f32,
    star_timer: f32,
    mercy_timer: f32,
    projectiles: Vec<NodeId>,
    pending_shots: usize,
    run: Animation,
    config: Arc<WorldConfig>,
    data: Arc<DataTables>,
    texture: TextureHandle,
    table: Arc<BehaviorTable<PlayerState, Player>>,
}

impl Player {
    /// Creates an airborne player.
    #[must_use]
    pub fn new(
        form: PlayerForm,
        config: Arc<WorldConfig>,
        data: Arc<DataTables>,
        texture: TextureHandle,
        table: Arc<BehaviorTable<PlayerState, Self>>,
    ) -> Self {
        let run = frames(&data, form).run.animation();
        Self {
            state: PlayerState::Airborne,
            form,
            abilities: Abilities::empty(),
            coins: 0,
            facing_right: true,
            shrink_timer: 0.0,
            star_timer: 0.0,
            mercy_timer: 0.0,
            projectiles: Vec::new(),
            pending_shots: 0,
            run,
            config,
            data,
            texture,
            table,
        }
    }

    /// Body for a player of `form` with its origin at `position`.
    #[must_use]
    pub fn body(form: PlayerForm, position: Vec2) -> Body {
        let size = form.size();
        Body::new(form.category())
            .at(position)
            .with_bounds(standing_bounds(size))
            .with_sensor(foot_sensor(size))
    }

    /// Builds the player dispatch table.
    #[must_use]
    pub fn behavior() -> BehaviorTable<PlayerState, Self> {
        let mut table = BehaviorTable::new()
            .on_update(PlayerState::Airborne, airborne)
            .on_update(PlayerState::Grounded, grounded)
            .on_update(PlayerState::Shrinking, shrinking)
            .on_update(PlayerState::Dying, dying)
            .on_contact(PlayerState::Airborne, Category::TILES, air_solid)
            .on_contact(PlayerState::Grounded, Category::TILES, ground_solid);
        for state in [PlayerState::Airborne, PlayerState::Grounded] {
            table = table
                .on_contact(state, Category::ENEMY, enemy_contact)
                .on_contact(state, Category::MUSHROOM, eat_mushroom)
                .on_contact(state, Category::FLOWER, eat_flower)
                .on_contact(state, Category::STAR, eat_star)
                .on_contact(state, Category::COINS, collect_coin);
        }
        table
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Current size form.
    #[must_use]
    pub const fn form(&self) -> PlayerForm {
        self.form
    }

    /// Granted abilities.
    #[must_use]
    pub const fn abilities(&self) -> Abilities {
        self.abilities
    }

    /// Coins collected.
    #[must_use]
    pub const fn coins(&self) -> u32 {
        self.coins
    }

    /// Returns true if the player faces right.
    #[must_use]
    pub const fn facing_right(&self) -> bool {
        self.facing_right
    }

    /// Returns true while harmful contacts are ignored.
    #[must_use]
    pub fn is_invulnerable(&self) -> bool {
        self.abilities.contains(Abilities::INVINCIBLE) || self.mercy_timer > 0.0
    }

    /// Live projectiles fired by this player.
    #[must_use]
    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    /// Starts tracking a projectile this player fired, settling one pending
    /// shot.
    pub fn observe_projectile(&mut self, id: NodeId) {
        self.pending_shots = self.pending_shots.saturating_sub(1);
        self.projectiles.push(id);
    }

    /// Drops shots whose spawn was never delivered.
    pub fn settle_shots(&mut self) {
        self.pending_shots = 0;
    }

    /// Stops tracking projectiles that were pruned.
    pub fn forget_projectiles(&mut self, removed: &[NodeId]) {
        self.projectiles.retain(|id| !removed.contains(id));
    }

    /// State flags reported to the other side of a contact.
    #[must_use]
    pub fn peer_flags(&self) -> PeerFlags {
        let mut flags = PeerFlags::empty();
        if matches!(self.state, PlayerState::Dying | PlayerState::Shrinking) {
            flags |= PeerFlags::DYING;
        }
        if self.is_invulnerable() {
            flags |= PeerFlags::INVULNERABLE;
        }
        if self.abilities.contains(Abilities::INVINCIBLE) {
            flags |= PeerFlags::INVINCIBLE;
        }
        if self.facing_right {
            flags |= PeerFlags::FACING_RIGHT;
        }
        flags
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    fn accepts_input(&self) -> bool {
        matches!(self.state, PlayerState::Airborne | PlayerState::Grounded)
    }

    /// Adds a movement impulse. Without footing only the horizontal part
    /// applies.
    pub fn apply_force(&mut self, body: &mut Body, force: Vec2) {
        if !self.accepts_input() {
            return;
        }
        let force = if body.has_footing() {
            force
        } else {
            Vec2::new(force.x, 0.0)
        };
        if force.x != 0.0 {
            self.facing_right = force.x > 0.0;
        }
        body.accelerate(force);
    }

    /// Jumps if grounded.
    pub fn jump(&mut self, body: &mut Body) {
        if self.state == PlayerState::Grounded {
            body.velocity.y -= self.config.player.jump_force;
            self.enter(PlayerState::Airborne);
        }
    }

    /// Requests a projectile.
    ///
    /// # Arguments
    ///
    /// * `body` - The player's body
    /// * `owner` - The player's node id
    /// * `origin` - World position of the player's origin
    ///
    /// # Returns
    ///
    /// The spawn request, or `None` if the player cannot fire right now.
    /// Shots still waiting for their spawn count against the cap.
    pub fn fire(&mut self, body: &Body, owner: NodeId, origin: Vec2) -> Option<Spawn> {
        let tuning = &self.config.player;
        if !self.accepts_input()
            || !self.abilities.contains(Abilities::FIREABLE)
            || self.projectiles.len() + self.pending_shots >= tuning.max_projectiles
        {
            return None;
        }
        self.pending_shots += 1;
        let direction = if self.facing_right { 1.0 } else { -1.0 };
        let half = self.form.size() * 0.5;
        Some(Spawn::Projectile {
            position: origin + Vec2::new(direction * half.x, -half.y),
            velocity: Vec2::new(
                body.velocity.x + direction * tuning.projectile_speed,
                -tuning.projectile_lift,
            ),
            owner,
        })
    }

    /// Starts dying with a hop, unless already dying.
    pub fn kill(&mut self, body: &mut Body) {
        if self.state == PlayerState::Dying {
            return;
        }
        body.velocity = Vec2::new(0.0, -self.config.player.death_hop);
        self.abilities = Abilities::empty();
        self.enter(PlayerState::Dying);
    }

    // -------------------------------------------------------------------------
    // Update
    // -------------------------------------------------------------------------

    /// Runs one tick: timers, the state handler, integration, animation.
    pub fn update(&mut self, body: &mut Body, ctx: &mut UpdateContext<'_>) {
        let dt = ctx.dt;
        if self.star_timer > 0.0 {
            self.star_timer -= dt;
            if self.star_timer <= 0.0 {
                self.abilities.remove(Abilities::INVINCIBLE);
            }
        }
        self.mercy_timer = (self.mercy_timer - dt).max(0.0);

        self.tick(body, ctx);
        body.integrate(dt);
        self.run.update(dt);
    }

    fn enter(&mut self, state: PlayerState) {
        if self.state != state {
            tracing::trace!(from = ?self.state, to = ?state, "player state");
            self.state = state;
        }
    }

    fn reshape(&mut self, body: &mut Body, form: PlayerForm) {
        self.form = form;
        let size = form.size();
        body.category = form.category();
        body.bounds = standing_bounds(size);
        body.foot_sensor = Some(foot_sensor(size));
        self.run = frames(&self.data, form).run.animation();
    }

    fn hurt(&mut self, body: &mut Body) {
        match self.form {
            PlayerForm::Big => {
                body.velocity = Vec2::ZERO;
                self.shrink_timer = 0.0;
                self.abilities.remove(Abilities::FIREABLE);
                self.enter(PlayerState::Shrinking);
            }
            PlayerForm::Small => self.kill(body),
        }
    }

    // -------------------------------------------------------------------------
    // Drawing
    // -------------------------------------------------------------------------

    fn frame(&self, body: &Body) -> IntRect {
        let form = if self.state == PlayerState::Shrinking && blink(self.shrink_timer) {
            PlayerForm::Small
        } else {
            self.form
        };
        let frames = frames(&self.data, form);
        let mut frame = match self.state {
            PlayerState::Dying => frames.death,
            PlayerState::Airborne => frames.jump,
            PlayerState::Grounded if body.velocity.x.abs() > 1.0 => self.run.frame(),
            PlayerState::Grounded | PlayerState::Shrinking => frames.idle,
        };
        if self.abilities.contains(Abilities::FIREABLE) {
            frame.top += frames.fire_offset;
        }
        frame
    }

    /// Submits the player sprite.
    pub fn draw(&self, body: &Body, world: Affine2, sink: &mut dyn RenderSink) {
        if self.mercy_timer > 0.0 && blink(self.mercy_timer) {
            return;
        }
        let frame = self.frame(body);
        let size = frame.size();
        let sprite = Sprite::new(self.texture, frame, Vec2::new(size.x * 0.5, size.y));
        let facing = if self.facing_right { 1.0 } else { -1.0 };
        sink.draw_sprite(&sprite, world * Affine2::from_scale(Vec2::new(facing, 1.0)));
    }
}

impl Behavior for Player {
    type State = PlayerState;

    fn state(&self) -> PlayerState {
        self.state
    }

    fn table(&self) -> &BehaviorTable<PlayerState, Self> {
        &self.table
    }
}

fn frames(data: &DataTables, form: PlayerForm) -> &PlayerFrames {
    match form {
        PlayerForm::Small => &data.small_player,
        PlayerForm::Big => &data.big_player,
    }
}

/// Alternates every tenth of a second.
fn blink(timer: f32) -> bool {
    (timer * 10.0) as i32 % 2 == 0
}

// =============================================================================
// Update Handlers
// =============================================================================

fn airborne(player: &mut Player, body: &mut Body, ctx: &mut UpdateContext<'_>) {
    body.fall(player.config.gravity, ctx.dt);
    body.velocity.x *= player.config.player.air_friction;
}

fn grounded(player: &mut Player, body: &mut Body, ctx: &mut UpdateContext<'_>) {
    if !body.has_footing() {
        player.enter(PlayerState::Airborne);
        airborne(player, body, ctx);
        return;
    }
    body.velocity.y = body.velocity.y.min(0.0);
    body.velocity.x *= player.config.player.ground_friction;
}

fn shrinking(player: &mut Player, body: &mut Body, ctx: &mut UpdateContext<'_>) {
    body.velocity = Vec2::ZERO;
    player.shrink_timer += ctx.dt;
    if player.shrink_timer >= player.config.player.shrink_duration {
        player.reshape(body, PlayerForm::Small);
        player.mercy_timer = player.config.player.mercy_duration;
        player.enter(PlayerState::Airborne);
    }
}

fn dying(player: &mut Player, body: &mut Body, ctx: &mut UpdateContext<'_>) {
    body.velocity.x = 0.0;
    body.fall(player.config.gravity, ctx.dt);
}

// =============================================================================
// Contact Handlers
// =============================================================================

fn air_solid(player: &mut Player, body: &mut Body, contact: &Contact) {
    let manifold = contact.manifold;
    body.move_by(manifold.push_out());
    if manifold.is_horizontal() {
        body.velocity.x = 0.0;
    } else if manifold.pushes_up() {
        body.velocity.y = body.velocity.y.min(0.0);
        player.enter(PlayerState::Grounded);
    } else {
        body.velocity.y = body.velocity.y.abs();
    }
}

fn ground_solid(_: &mut Player, body: &mut Body, contact: &Contact) {
    body.move_by(contact.manifold.push_out());
    if contact.manifold.is_horizontal() {
        body.velocity.x = 0.0;
    }
}

fn enemy_contact(player: &mut Player, body: &mut Body, contact: &Contact) {
    if contact.other.is_dying() || player.is_invulnerable() {
        return;
    }
    let manifold = contact.manifold;
    let harmless = contact.other.flags.contains(PeerFlags::HARMLESS);
    if harmless && !manifold.pushes_up() {
        return;
    }
    body.move_by(manifold.push_out());
    if manifold.pushes_up() {
        body.velocity.y = -player.config.player.stomp_bounce;
        player.enter(PlayerState::Airborne);
    } else {
        player.hurt(body);
    }
}

fn eat_mushroom(player: &mut Player, body: &mut Body, contact: &Contact) {
    if contact.other.flags.contains(PeerFlags::DORMANT) {
        return;
    }
    if player.form == PlayerForm::Small {
        player.reshape(body, PlayerForm::Big);
    }
}

fn eat_flower(player: &mut Player, body: &mut Body, contact: &Contact) {
    if contact.other.flags.contains(PeerFlags::DORMANT) {
        return;
    }
    if player.form == PlayerForm::Small {
        player.reshape(body, PlayerForm::Big);
    }
    player.abilities.insert(Abilities::FIREABLE);
}

fn eat_star(player: &mut Player, _: &mut Body, contact: &Contact) {
    if contact.other.flags.contains(PeerFlags::DORMANT) {
        return;
    }
    player.abilities.insert(Abilities::INVINCIBLE);
    player.star_timer = player.config.player.star_duration;
}

fn collect_coin(player: &mut Player, _: &mut Body, contact: &Contact) {
    if contact.other.flags.contains(PeerFlags::DORMANT) {
        return;
    }
    player.coins += 1;
}
