//! End-to-end gameplay tests.
//!
//! These tests drive complete worlds through input and many frames:
//! walking, jumping, stomping, boxes, bricks, firing and drawing.

use crate::behavior::Behavior;
use crate::category::Category;
use crate::entity::{
    Abilities, EnemyKind, EnemyState, ItemKind, ItemState, PlayerForm, PlayerState, TileState,
};
use crate::input::InputAction;
use crate::render::{RecordingSink, TextureHandle, TextureId};
use crate::world::World;

use super::helpers::{
    first_enemy, floor_level, ids_of, particle_count, player_state, position_of, run,
    spawned_items, step_until_player, tile_at, world_from,
};

const PLAYER: &str = r#"{ "kind": "player", "position": [32, 176], "size": [16, 16] }"#;
const FLOWER: &str = r#"{ "kind": "flower", "position": [32, 176], "size": [16, 16] }"#;

/// A world with the player on the floor plus `objects`, settled for a few
/// frames.
fn settled(objects: &[&str]) -> World {
    let mut all = vec![PLAYER];
    all.extend_from_slice(objects);
    let mut world = world_from(&floor_level(&all.join(", ")));
    run(&mut world, 5);
    world
}

// =============================================================================
// Movement
// =============================================================================

mod movement_tests {
    use super::*;

    #[test]
    fn held_move_input_walks_right() {
        let mut world = settled(&[]);
        let player = world.player_id().unwrap();
        let start = position_of(&world, player);

        for _ in 0..20 {
            world.apply_input(InputAction::MoveRight);
            world.step();
        }
        assert!(position_of(&world, player).x > start.x + 10.0);
        assert!(world.player().unwrap().facing_right());
        assert_eq!(player_state(&world), Some(PlayerState::Grounded));
    }

    #[test]
    fn move_left_turns_the_player_around() {
        let mut world = settled(&[]);
        let player = world.player_id().unwrap();
        let start = position_of(&world, player);

        world.apply_input(InputAction::MoveLeft);
        world.step();
        assert!(!world.player().unwrap().facing_right());
        assert!(position_of(&world, player).x < start.x);
    }

    #[test]
    fn jump_leaves_the_ground_and_lands_again() {
        let mut world = settled(&[]);
        let player = world.player_id().unwrap();

        world.apply_input(InputAction::Jump);
        world.step();
        assert_eq!(player_state(&world), Some(PlayerState::Airborne));
        assert!(world.graph().get(player).unwrap().body.velocity.y < 0.0);

        let frames = step_until_player(&mut world, 120, |p| p.state() == PlayerState::Grounded);
        assert!(frames.is_some());
        assert!((position_of(&world, player).y - 192.0).abs() < 0.01);
    }

    #[test]
    fn jump_is_ignored_in_the_air() {
        let mut world = world_from(&floor_level(PLAYER));
        world.step();
        assert_eq!(player_state(&world), Some(PlayerState::Airborne));

        world.apply_input(InputAction::Jump);
        world.step();
        let player = world.player_id().unwrap();
        assert!(world.graph().get(player).unwrap().body.velocity.y >= 0.0);
    }
}

// =============================================================================
// Enemies
// =============================================================================

mod enemy_tests {
    use super::*;

    #[test]
    fn falling_on_a_goomba_crushes_it_and_bounces() {
        let mut world = world_from(&floor_level(
            r#"{ "kind": "goomba", "position": [96, 176], "size": [16, 16] },
               { "kind": "player", "position": [85, 100], "size": [16, 16] }"#,
        ));
        let player = world.player_id().unwrap();

        let mut stomped = false;
        for _ in 0..30 {
            world.step();
            if first_enemy(&world).is_some_and(|enemy| enemy.is_crushed()) {
                stomped = true;
                break;
            }
        }
        assert!(stomped);
        assert_eq!(player_state(&world), Some(PlayerState::Airborne));
        assert!(world.graph().get(player).unwrap().body.velocity.y < 0.0);

        // crushed bodies linger for a second, then go away
        run(&mut world, 90);
        assert!(ids_of(&world, Category::ENEMY).is_empty());
        assert_ne!(player_state(&world), Some(PlayerState::Dying));
    }

    #[test]
    fn walking_goomba_kills_a_small_player() {
        let mut world = settled(&[r#"{ "kind": "goomba", "position": [72, 176], "size": [16, 16] }"#]);
        let frames = step_until_player(&mut world, 80, |p| p.state() == PlayerState::Dying);
        assert!(frames.is_some());
        assert_eq!(world.player().unwrap().form(), PlayerForm::Small);
    }

    #[test]
    fn big_player_shrinks_instead_of_dying() {
        let mut world = settled(&[
            FLOWER,
            r#"{ "kind": "goomba", "position": [72, 176], "size": [16, 16] }"#,
        ]);
        assert_eq!(world.player().unwrap().form(), PlayerForm::Big);

        let frames = step_until_player(&mut world, 80, |p| p.state() == PlayerState::Shrinking);
        assert!(frames.is_some());
        assert!(!world.player().unwrap().abilities().contains(Abilities::FIREABLE));

        let frames = step_until_player(&mut world, 120, |p| p.form() == PlayerForm::Small);
        assert!(frames.is_some());
        assert!(world.player().unwrap().is_invulnerable());
    }

    #[test]
    fn star_power_knocks_enemies_out() {
        let mut world = settled(&[
            r#"{ "kind": "star", "position": [32, 176], "size": [16, 16] }"#,
            r#"{ "kind": "goomba", "position": [72, 176], "size": [16, 16] }"#,
        ]);
        assert!(world.player().unwrap().abilities().contains(Abilities::INVINCIBLE));
        assert!(ids_of(&world, Category::STAR).is_empty());

        let mut knocked = false;
        for _ in 0..60 {
            world.step();
            if let Some(enemy) = first_enemy(&world) {
                if enemy.state() == EnemyState::Dying {
                    assert!(!enemy.is_crushed());
                    knocked = true;
                    break;
                }
            }
        }
        assert!(knocked);
        assert_ne!(player_state(&world), Some(PlayerState::Dying));
    }

    #[test]
    fn stomped_troopa_becomes_a_shell() {
        let mut world = world_from(&floor_level(
            r#"{ "kind": "troopa", "position": [96, 168], "size": [16, 24] },
               { "kind": "player", "position": [85, 92], "size": [16, 16] }"#,
        ));
        let mut shelled = false;
        for _ in 0..30 {
            world.step();
            if first_enemy(&world).is_some_and(|enemy| enemy.kind() == EnemyKind::Shell) {
                shelled = true;
                break;
            }
        }
        assert!(shelled);
        assert_eq!(ids_of(&world, Category::SHELL).len(), 1);
        assert_ne!(player_state(&world), Some(PlayerState::Dying));
    }
}

// =============================================================================
// Tiles
// =============================================================================

mod tile_tests {
    use super::*;

    fn jump(world: &mut World) {
        world.apply_input(InputAction::Jump);
        world.step();
        assert_eq!(player_state(world), Some(PlayerState::Airborne));
    }

    #[test]
    fn head_bump_empties_a_coin_box() {
        let mut world = settled(&[r#"{ "kind": "solo_coin_box", "position": [32, 144], "size": [16, 16] }"#]);
        let tile = ids_of(&world, Category::SOLO_COIN_BOX)[0];

        jump(&mut world);
        let mut saw_coin = false;
        for _ in 0..30 {
            world.step();
            saw_coin |= spawned_items(&world)
                .iter()
                .any(|item| item.kind() == ItemKind::MovingCoin);
        }
        assert!(saw_coin);
        assert_eq!(tile_at(&world, tile).remaining(), 0);
        assert_eq!(tile_at(&world, tile).state(), TileState::Spent);
        assert_eq!(world.graph().get(tile).unwrap().body.category, Category::SOLID_BOX);
        assert_eq!(world.player().unwrap().coins(), 0);
    }

    #[test]
    fn transform_box_releases_an_emerging_mushroom() {
        let mut world = settled(&[r#"{ "kind": "transform_box", "position": [32, 144], "size": [16, 16] }"#]);

        jump(&mut world);
        let mut emerging = None;
        for _ in 0..20 {
            world.step();
            if let Some(item) = spawned_items(&world).first() {
                emerging = Some((item.kind(), item.state()));
                break;
            }
        }
        assert_eq!(emerging, Some((ItemKind::Mushroom, ItemState::Emerging)));
    }

    #[test]
    fn small_player_only_bumps_a_brick() {
        let mut world = settled(&[r#"{ "kind": "brick", "position": [32, 144], "size": [16, 16] }"#]);
        let brick = ids_of(&world, Category::BRICK)[0];

        jump(&mut world);
        let mut bumped = false;
        for _ in 0..40 {
            world.step();
            bumped |= tile_at(&world, brick).state() == TileState::Bumped;
        }
        assert!(bumped);
        assert_eq!(tile_at(&world, brick).state(), TileState::Idle);
        assert_eq!(particle_count(&world), 0);
    }

    #[test]
    fn big_player_breaks_a_brick_into_debris() {
        let mut world = settled(&[FLOWER, r#"{ "kind": "brick", "position": [32, 128], "size": [16, 16] }"#]);
        assert_eq!(world.player().unwrap().form(), PlayerForm::Big);

        jump(&mut world);
        run(&mut world, 20);
        assert!(ids_of(&world, Category::BRICK).is_empty());
        assert_eq!(
            particle_count(&world),
            world.registry().config().particles.burst_count
        );
    }
}

// =============================================================================
// Projectiles
// =============================================================================

mod fire_tests {
    use super::*;

    #[test]
    fn flower_grants_fire_with_a_live_projectile_cap() {
        let mut world = settled(&[FLOWER]);
        let player = world.player().unwrap();
        assert_eq!(player.form(), PlayerForm::Big);
        assert!(player.abilities().contains(Abilities::FIREABLE));
        assert!(ids_of(&world, Category::FLOWER).is_empty());

        for expected in [1, 2, 2] {
            world.apply_input(InputAction::Fire);
            world.step();
            assert_eq!(world.player().unwrap().projectile_count(), expected);
        }
        assert_eq!(ids_of(&world, Category::PROJECTILE).len(), 2);

        // projectiles bounce off the end of the floor and leave the world
        run(&mut world, 200);
        assert_eq!(world.player().unwrap().projectile_count(), 0);
        assert!(ids_of(&world, Category::PROJECTILE).is_empty());
    }

    #[test]
    fn fire_presses_in_one_frame_respect_the_cap() {
        let mut world = settled(&[FLOWER]);
        for _ in 0..4 {
            world.apply_input(InputAction::Fire);
        }
        world.step();

        let cap = world.registry().config().player.max_projectiles;
        assert_eq!(ids_of(&world, Category::PROJECTILE).len(), cap);
        assert_eq!(world.player().unwrap().projectile_count(), cap);

        // the next frame still has no room
        world.apply_input(InputAction::Fire);
        world.step();
        assert_eq!(ids_of(&world, Category::PROJECTILE).len(), cap);
    }

    #[test]
    fn small_player_cannot_fire() {
        let mut world = settled(&[]);
        world.apply_input(InputAction::Fire);
        world.step();
        assert_eq!(world.player().unwrap().projectile_count(), 0);
        assert!(ids_of(&world, Category::PROJECTILE).is_empty());
    }
}

// =============================================================================
// Drawing
// =============================================================================

mod draw_tests {
    use super::*;

    #[test]
    fn draw_submits_one_sprite_per_visible_body_in_tree_order() {
        let world = settled(&[r#"{ "kind": "goomba", "position": [200, 176], "size": [16, 16] }"#]);
        let mut sink = RecordingSink::default();
        world.draw(&mut sink);

        let textures: Vec<TextureHandle> = sink.calls.iter().map(|(sprite, _)| sprite.texture).collect();
        assert_eq!(
            textures,
            vec![
                TextureHandle::new(TextureId::Tiles as u32),
                TextureHandle::new(TextureId::Player as u32),
                TextureHandle::new(TextureId::Enemies as u32),
            ]
        );
        let player = world.player_id().unwrap();
        let (_, transform) = sink.calls[1];
        assert_eq!(transform.translation, position_of(&world, player));
    }
}
