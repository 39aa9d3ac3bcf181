//! Walking enemies and shells.
//!
//! All enemy kinds share one dispatch table; stomp outcomes branch on
//! [`EnemyKind`]:
//!
//! - a Goomba is crushed flat and removed after a short delay
//! - a Troopa retreats into an idle Shell
//! - a Shell toggles between idle and kicked
//!
//! An idle shell is harmless and can be kicked from the side. A kicked
//! shell knocks out the walkers it runs into.

use std::sync::Arc;

use glam::{Affine2, Vec2};

use crate::behavior::{Behavior, BehaviorTable};
use crate::category::Category;
use crate::config::WorldConfig;
use crate::data::{DataTables, EnemyFrames};
use crate::entity::{foot_sensor, standing_bounds, turn_away, Body, Contact, PeerFlags, UpdateContext};
use crate::render::{Animation, RenderSink, Sprite, TextureHandle};

/// Kind of [`Enemy`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    /// Walker that is crushed by a stomp.
    Goomba,
    /// Walker that retreats into a shell when stomped.
    Troopa,
    /// Kickable shell.
    Shell,
}

impl EnemyKind {
    /// Category tag.
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::Goomba => Category::GOOMBA,
            Self::Troopa => Category::TROOPA,
            Self::Shell => Category::SHELL,
        }
    }

    /// Box size.
    #[must_use]
    pub const fn size(self) -> Vec2 {
        match self {
            Self::Goomba | Self::Shell => Vec2::new(16.0, 16.0),
            Self::Troopa => Vec2::new(16.0, 24.0),
        }
    }
}

/// Behavior state of an [`Enemy`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EnemyState {
    /// Falling.
    Airborne,
    /// Walking on something.
    Grounded,
    /// Crushed or knocked out; terminal.
    Dying,
}

/// Enemy state.
#[derive(Debug)]
pub struct Enemy {
    kind: EnemyKind,
    state: EnemyState,
    crushed: bool,
    timer: f32,
    walk: Animation,
    config: Arc<WorldConfig>,
    data: Arc<DataTables>,
    texture: TextureHandle,
    table: Arc<BehaviorTable<EnemyState, Enemy>>,
}

impl Enemy {
    /// Creates an airborne enemy.
    #[must_use]
    pub fn new(
        kind: EnemyKind,
        config: Arc<WorldConfig>,
        data: Arc<DataTables>,
        texture: TextureHandle,
        table: Arc<BehaviorTable<EnemyState, Self>>,
    ) -> Self {
        let walk = frames(&data, kind).walk.animation();
        Self {
            kind,
            state: EnemyState::Airborne,
            crushed: false,
            timer: 0.0,
            walk,
            config,
            data,
            texture,
            table,
        }
    }

    /// Body for an enemy of `kind` with its origin at `position`. Walkers
    /// start moving left; shells start idle.
    #[must_use]
    pub fn body(kind: EnemyKind, position: Vec2, walk_speed: f32) -> Body {
        let size = kind.size();
        let speed = if kind == EnemyKind::Shell { 0.0 } else { -walk_speed };
        Body::new(kind.category())
            .at(position)
            .with_bounds(standing_bounds(size))
            .with_sensor(foot_sensor(size))
            .with_velocity(Vec2::new(speed, 0.0))
    }

    /// Builds the shared enemy dispatch table.
    #[must_use]
    pub fn behavior() -> BehaviorTable<EnemyState, Self> {
        let mut table = BehaviorTable::new()
            .on_update(EnemyState::Airborne, airborne)
            .on_update(EnemyState::Grounded, grounded)
            .on_update(EnemyState::Dying, dying);
        for state in [EnemyState::Airborne, EnemyState::Grounded] {
            table = table
                .on_contact(state, Category::TILES, solid_contact)
                .on_contact(state, Category::ENEMY, enemy_contact)
                .on_contact(state, Category::PROJECTILE, projectile_contact)
                .on_contact(state, Category::PLAYER, player_contact);
        }
        table
    }

    /// Current kind; a stomped Troopa reports [`EnemyKind::Shell`].
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Returns true if flattened by a stomp.
    #[must_use]
    pub const fn is_crushed(&self) -> bool {
        self.crushed
    }

    /// State flags reported to the other side of a contact.
    #[must_use]
    pub fn peer_flags(&self, body: &Body) -> PeerFlags {
        let mut flags = PeerFlags::empty();
        if self.state == EnemyState::Dying {
            flags |= PeerFlags::DYING;
        }
        if self.kind == EnemyKind::Shell && body.velocity.x == 0.0 {
            flags |= PeerFlags::HARMLESS;
        }
        if body.velocity.x > 0.0 {
            flags |= PeerFlags::FACING_RIGHT;
        }
        flags
    }

    /// Knocks the enemy out: it hops, flips over and falls out of the world.
    pub fn knock_out(&mut self, body: &mut Body) {
        if self.state == EnemyState::Dying {
            return;
        }
        body.velocity = Vec2::new(0.0, -self.config.enemy.knock_hop);
        self.enter(EnemyState::Dying);
    }

    /// Returns true if knocked out rather than crushed.
    #[must_use]
    pub fn is_knocked_out(&self) -> bool {
        self.state == EnemyState::Dying && !self.crushed
    }

    /// Runs one tick: the state handler, integration, animation.
    pub fn update(&mut self, body: &mut Body, ctx: &mut UpdateContext<'_>) {
        self.tick(body, ctx);
        body.integrate(ctx.dt);
        if self.state != EnemyState::Dying {
            self.walk.update(ctx.dt);
        }
    }

    /// Submits the enemy sprite.
    pub fn draw(&self, world: Affine2, sink: &mut dyn RenderSink) {
        let frames = frames(&self.data, self.kind);
        let frame = if self.crushed {
            frames.crushed
        } else {
            self.walk.frame()
        };
        let size = frame.size();
        let sprite = Sprite::new(self.texture, frame, Vec2::new(size.x * 0.5, size.y));
        // upside down, flipped about the feet
        let flip = if self.is_knocked_out() { -1.0 } else { 1.0 };
        sink.draw_sprite(&sprite, world * Affine2::from_scale(Vec2::new(1.0, flip)));
    }

    fn enter(&mut self, state: EnemyState) {
        if self.state != state {
            tracing::trace!(kind = ?self.kind, from = ?self.state, to = ?state, "enemy state");
            self.state = state;
        }
    }

    fn crush(&mut self, body: &mut Body) {
        self.crushed = true;
        self.timer = 0.0;
        body.velocity = Vec2::ZERO;
        self.enter(EnemyState::Dying);
    }

    fn retreat(&mut self, body: &mut Body) {
        self.kind = EnemyKind::Shell;
        let size = EnemyKind::Shell.size();
        body.category = Category::SHELL;
        body.bounds = standing_bounds(size);
        body.foot_sensor = Some(foot_sensor(size));
        body.velocity.x = 0.0;
        self.walk = frames(&self.data, EnemyKind::Shell).walk.animation();
    }

    fn kick(&self, body: &mut Body, direction: f32) {
        body.velocity.x = direction * self.config.enemy.shell_speed;
    }
}

impl Behavior for Enemy {
    type State = EnemyState;

    fn state(&self) -> EnemyState {
        self.state
    }

    fn table(&self) -> &BehaviorTable<EnemyState, Self> {
        &self.table
    }
}

fn frames(data: &DataTables, kind: EnemyKind) -> &EnemyFrames {
    match kind {
        EnemyKind::Goomba => &data.goomba,
        EnemyKind::Troopa => &data.troopa,
        EnemyKind::Shell => &data.shell,
    }
}

fn is_moving_shell(contact: &Contact) -> bool {
    contact.other.category.intersects(Category::SHELL)
        && !contact.other.flags.contains(PeerFlags::HARMLESS)
}

// =============================================================================
// Update Handlers
// =============================================================================

fn airborne(enemy: &mut Enemy, body: &mut Body, ctx: &mut UpdateContext<'_>) {
    body.fall(enemy.config.gravity, ctx.dt);
}

fn grounded(enemy: &mut Enemy, body: &mut Body, ctx: &mut UpdateContext<'_>) {
    if !body.has_footing() {
        enemy.enter(EnemyState::Airborne);
        airborne(enemy, body, ctx);
        return;
    }
    body.velocity.y = body.velocity.y.min(0.0);
}

fn dying(enemy: &mut Enemy, body: &mut Body, ctx: &mut UpdateContext<'_>) {
    if enemy.crushed {
        body.velocity = Vec2::ZERO;
        enemy.timer += ctx.dt;
        if enemy.timer >= enemy.config.enemy.crush_duration {
            body.destroy();
        }
    } else {
        body.velocity.x = 0.0;
        body.fall(enemy.config.gravity, ctx.dt);
    }
}

// =============================================================================
// Contact Handlers
// =============================================================================

fn solid_contact(enemy: &mut Enemy, body: &mut Body, contact: &Contact) {
    if contact.other.flags.contains(PeerFlags::BUMPING) {
        enemy.knock_out(body);
        return;
    }
    let manifold = contact.manifold;
    body.move_by(manifold.push_out());
    if manifold.is_horizontal() {
        turn_away(body, contact);
    } else if manifold.pushes_up() {
        body.velocity.y = body.velocity.y.min(0.0);
        enemy.enter(EnemyState::Grounded);
    } else {
        body.velocity.y = body.velocity.y.abs();
    }
}

fn enemy_contact(enemy: &mut Enemy, body: &mut Body, contact: &Contact) {
    if contact.other.is_dying() {
        return;
    }
    let moving_shell = enemy.kind == EnemyKind::Shell && body.velocity.x != 0.0;
    let runs_through = moving_shell && !contact.other.category.intersects(Category::SHELL);
    if is_moving_shell(contact) && enemy.kind != EnemyKind::Shell {
        enemy.knock_out(body);
    } else if !runs_through {
        solid_contact(enemy, body, contact);
    }
}

fn projectile_contact(enemy: &mut Enemy, body: &mut Body, contact: &Contact) {
    if !contact.other.is_dying() {
        enemy.knock_out(body);
    }
}

fn player_contact(enemy: &mut Enemy, body: &mut Body, contact: &Contact) {
    let player = contact.other;
    if player.is_dying() {
        return;
    }
    if player.flags.contains(PeerFlags::INVINCIBLE) {
        enemy.knock_out(body);
        return;
    }
    // a player in its mercy window ignores the contact, so this side does too
    if player.flags.contains(PeerFlags::INVULNERABLE) {
        return;
    }
    let manifold = contact.manifold;
    let idle = body.velocity.x == 0.0;
    if manifold.pushes_down() {
        match enemy.kind {
            EnemyKind::Goomba => enemy.crush(body),
            EnemyKind::Troopa => enemy.retreat(body),
            EnemyKind::Shell if idle => {
                let direction = if player.flags.contains(PeerFlags::FACING_RIGHT) {
                    1.0
                } else {
                    -1.0
                };
                enemy.kick(body, direction);
            }
            EnemyKind::Shell => body.velocity.x = 0.0,
        }
    } else if manifold.is_horizontal() && enemy.kind == EnemyKind::Shell && idle {
        body.move_by(manifold.push_out());
        enemy.kick(body, manifold.horizontal_sign());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::Manifold;
    use crate::command::CommandQueue;
    use crate::entity::Peer;
    use crate::render::RecordingSink;
    use crate::scene::NodeId;

    fn enemy(kind: EnemyKind) -> (Enemy, Body) {
        let config = Arc::new(WorldConfig::default());
        let body = Enemy::body(kind, Vec2::new(64.0, 64.0), config.enemy.walk_speed);
        let enemy = Enemy::new(
            kind,
            config,
            Arc::new(DataTables::default()),
            TextureHandle::new(1),
            Arc::new(Enemy::behavior()),
        );
        (enemy, body)
    }

    fn contact(category: Category, flags: PeerFlags, axis: Vec2, depth: f32) -> Contact {
        Contact {
            manifold: Manifold::new(axis, depth),
            other: Peer {
                id: NodeId::new(9),
                category,
                flags,
                velocity: Vec2::ZERO,
            },
        }
    }

    fn tick(enemy: &mut Enemy, body: &mut Body, dt: f32) {
        let mut queue = CommandQueue::new();
        let mut ctx = UpdateContext::new(dt, NodeId::new(2), Affine2::IDENTITY, &mut queue);
        enemy.update(body, &mut ctx);
    }

    mod walking_tests {
        use super::*;

        #[test]
        fn walkers_start_moving_left() {
            let (_, body) = enemy(EnemyKind::Goomba);
            assert!((body.velocity.x + 40.0).abs() < 0.0001);
        }

        #[test]
        fn wall_reverses_direction() {
            let (mut enemy, mut body) = enemy(EnemyKind::Goomba);
            enemy.react(&mut body, &contact(Category::BLOCK, PeerFlags::empty(), Vec2::X, 1.0));
            assert!((body.velocity.x - 40.0).abs() < 0.0001);
        }

        #[test]
        fn landing_then_walking_off_the_edge() {
            let (mut enemy, mut body) = enemy(EnemyKind::Goomba);
            body.velocity.y = 80.0;
            enemy.react(&mut body, &contact(Category::BLOCK, PeerFlags::empty(), Vec2::Y, -1.0));
            assert_eq!(enemy.state(), EnemyState::Grounded);
            tick(&mut enemy, &mut body, 1.0 / 60.0);
            assert_eq!(enemy.state(), EnemyState::Airborne);
        }

        #[test]
        fn bumping_tile_knocks_out() {
            let (mut enemy, mut body) = enemy(EnemyKind::Goomba);
            enemy.react(&mut body, &contact(Category::BRICK, PeerFlags::BUMPING, Vec2::Y, -2.0));
            assert_eq!(enemy.state(), EnemyState::Dying);
            assert!(body.velocity.y < 0.0);
        }

        #[test]
        fn projectile_knocks_out_unless_exploding() {
            let (mut enemy, mut body) = enemy(EnemyKind::Troopa);
            enemy.react(&mut body, &contact(Category::PROJECTILE, PeerFlags::DYING, Vec2::X, 1.0));
            assert_eq!(enemy.state(), EnemyState::Airborne);
            enemy.react(&mut body, &contact(Category::PROJECTILE, PeerFlags::empty(), Vec2::X, 1.0));
            assert_eq!(enemy.state(), EnemyState::Dying);
        }
    }

    mod stomp_tests {
        use super::*;

        #[test]
        fn goomba_is_crushed_then_destroyed() {
            let (mut enemy, mut body) = enemy(EnemyKind::Goomba);
            enemy.react(&mut body, &contact(Category::SMALL_PLAYER, PeerFlags::empty(), Vec2::Y, 3.0));
            assert_eq!(enemy.state(), EnemyState::Dying);
            assert!(enemy.is_crushed());
            assert!(enemy.peer_flags(&body).contains(PeerFlags::DYING));

            tick(&mut enemy, &mut body, 0.5);
            assert!(!body.is_destroyed());
            tick(&mut enemy, &mut body, 0.6);
            assert!(body.is_destroyed());
        }

        #[test]
        fn dying_enemy_ignores_contacts() {
            let (mut enemy, mut body) = enemy(EnemyKind::Goomba);
            enemy.knock_out(&mut body);
            assert!(!enemy.react(&mut body, &contact(Category::BLOCK, PeerFlags::empty(), Vec2::Y, -1.0)));
            assert_eq!(enemy.state(), EnemyState::Dying);
        }

        #[test]
        fn troopa_retreats_into_idle_shell() {
            let (mut enemy, mut body) = enemy(EnemyKind::Troopa);
            enemy.react(&mut body, &contact(Category::BIG_PLAYER, PeerFlags::empty(), Vec2::Y, 2.0));
            assert_eq!(enemy.kind(), EnemyKind::Shell);
            assert_eq!(body.category, Category::SHELL);
            assert!((body.bounds.height - 16.0).abs() < 0.0001);
            assert!(enemy.peer_flags(&body).contains(PeerFlags::HARMLESS));
        }

        #[test]
        fn shell_is_kicked_by_facing_then_stopped() {
            let (mut enemy, mut body) = enemy(EnemyKind::Shell);
            let stomp = contact(Category::SMALL_PLAYER, PeerFlags::FACING_RIGHT, Vec2::Y, 2.0);
            enemy.react(&mut body, &stomp);
            assert!((body.velocity.x - 240.0).abs() < 0.0001);
            enemy.react(&mut body, &stomp);
            assert!(body.velocity.x.abs() < 0.0001);
        }

        #[test]
        fn idle_shell_is_kicked_away_from_the_side() {
            let (mut enemy, mut body) = enemy(EnemyKind::Shell);
            enemy.react(&mut body, &contact(Category::SMALL_PLAYER, PeerFlags::empty(), Vec2::X, -3.0));
            assert!((body.velocity.x + 240.0).abs() < 0.0001);
        }

        #[test]
        fn invincible_player_knocks_out() {
            let (mut enemy, mut body) = enemy(EnemyKind::Goomba);
            let flags = PeerFlags::INVINCIBLE | PeerFlags::INVULNERABLE;
            enemy.react(&mut body, &contact(Category::SMALL_PLAYER, flags, Vec2::X, 1.0));
            assert_eq!(enemy.state(), EnemyState::Dying);
            assert!(!enemy.is_crushed());
        }

        #[test]
        fn mercy_window_player_neither_stomps_nor_kicks() {
            let (mut goomba, mut body) = enemy(EnemyKind::Goomba);
            goomba.react(&mut body, &contact(Category::SMALL_PLAYER, PeerFlags::INVULNERABLE, Vec2::Y, 3.0));
            assert_eq!(goomba.state(), EnemyState::Airborne);
            assert!(!goomba.is_crushed());

            let (mut shell, mut body) = enemy(EnemyKind::Shell);
            shell.react(&mut body, &contact(Category::SMALL_PLAYER, PeerFlags::INVULNERABLE, Vec2::X, -3.0));
            assert!(body.velocity.x.abs() < 0.0001);
        }

        #[test]
        fn moving_shell_runs_through_walkers() {
            let (mut shell, mut body) = enemy(EnemyKind::Shell);
            body.velocity.x = 240.0;
            let before = body.position();
            shell.react(&mut body, &contact(Category::GOOMBA, PeerFlags::empty(), Vec2::X, -2.0));
            assert!((body.velocity.x - 240.0).abs() < 0.0001);
            assert_eq!(body.position(), before);
            assert_eq!(shell.state(), EnemyState::Airborne);
        }

        #[test]
        fn moving_shell_bounces_off_walls_and_shells() {
            let (mut shell, mut body) = enemy(EnemyKind::Shell);
            body.velocity.x = 240.0;
            shell.react(&mut body, &contact(Category::SHELL, PeerFlags::empty(), Vec2::X, -2.0));
            assert!((body.velocity.x + 240.0).abs() < 0.0001);
        }

        #[test]
        fn knock_out_flips_the_sprite_not_the_box() {
            let (mut goomba, mut body) = enemy(EnemyKind::Goomba);
            let bounds = body.bounds;
            goomba.knock_out(&mut body);
            assert!(goomba.is_knocked_out());
            assert_eq!(body.transform.scale, Vec2::ONE);
            assert_eq!(body.bounds, bounds);

            let mut sink = RecordingSink::default();
            goomba.draw(body.transform.matrix(), &mut sink);
            let (_, transform) = sink.calls[0];
            assert!(transform.matrix2.y_axis.y < 0.0);
            assert!((transform.translation - body.position()).length() < 0.0001);
        }

        #[test]
        fn moving_shell_knocks_out_walkers() {
            let (mut enemy, mut body) = enemy(EnemyKind::Goomba);
            enemy.react(&mut body, &contact(Category::SHELL, PeerFlags::empty(), Vec2::X, 2.0));
            assert_eq!(enemy.state(), EnemyState::Dying);
        }

        #[test]
        fn idle_shell_is_a_wall_for_walkers() {
            let (mut enemy, mut body) = enemy(EnemyKind::Goomba);
            enemy.react(&mut body, &contact(Category::SHELL, PeerFlags::HARMLESS, Vec2::X, 2.0));
            assert_eq!(enemy.state(), EnemyState::Airborne);
            assert!(body.velocity.x > 0.0);
        }
    }
}
