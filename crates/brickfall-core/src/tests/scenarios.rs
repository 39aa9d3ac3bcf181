//! Edge-case scenarios for footing, landing, dispatch and detach.
//!
//! Each test sets up the smallest world that shows one behavior and checks
//! it frame by frame.

use glam::Vec2;

use crate::behavior::Behavior;
use crate::category::Category;
use crate::collision::{resolve_contacts, BroadPhase, Manifold};
use crate::command::{Action, Command};
use crate::entity::{EnemyKind, EnemyState, PlayerState};
use crate::error::SceneError;
use crate::scene::SceneGraph;

use super::helpers::{
    first_enemy, floor_level, ids_of, player_state, position_of, registry, run, world_from,
};

/// A player standing on the floor after settling in.
fn standing_player() -> crate::world::World {
    let mut world = world_from(&floor_level(
        r#"{ "kind": "player", "position": [32, 176], "size": [16, 16] }"#,
    ));
    run(&mut world, 5);
    world
}

// =============================================================================
// Contact Geometry
// =============================================================================

mod overlap_tests {
    use super::*;

    #[test]
    fn side_overlap_pushes_bodies_apart_horizontally() {
        let registry = registry();
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph
            .attach(root, registry.enemy(EnemyKind::Goomba, Vec2::new(8.0, 100.0)))
            .unwrap();
        let b = graph
            .attach(root, registry.enemy(EnemyKind::Goomba, Vec2::new(16.0, 100.0)))
            .unwrap();

        let manifold = Manifold::between(
            &graph.world_bounds(a).unwrap(),
            graph.world_position(a).unwrap(),
            &graph.world_bounds(b).unwrap(),
            graph.world_position(b).unwrap(),
        )
        .unwrap();
        assert!(manifold.is_horizontal());
        assert!((manifold.depth - 8.0).abs() < 0.0001);

        let mut broad = BroadPhase::new();
        let pairs = broad.detect(&mut graph, &[a, b]).clone();
        assert_eq!(pairs.len(), 1);
        assert_eq!(resolve_contacts(&mut graph, &pairs), 1);

        // each side moved by the full depth, away from the other
        assert!((position_of_graph(&graph, a).x - 0.0).abs() < 0.0001);
        assert!((position_of_graph(&graph, b).x - 24.0).abs() < 0.0001);
        assert!(graph.get(a).unwrap().body.velocity.x < 0.0);
        assert!(graph.get(b).unwrap().body.velocity.x > 0.0);
    }

    fn position_of_graph(graph: &SceneGraph, id: crate::scene::NodeId) -> Vec2 {
        graph.world_position(id).unwrap()
    }

    #[test]
    fn falling_player_lands_with_zero_vertical_speed() {
        let mut world = world_from(&floor_level(
            r#"{ "kind": "player", "position": [32, 176], "size": [16, 16] }"#,
        ));
        let player = world.player_id().unwrap();

        world.step();
        assert_eq!(player_state(&world), Some(PlayerState::Airborne));
        assert!(world.graph().get(player).unwrap().body.velocity.y > 0.0);

        world.step();
        assert_eq!(player_state(&world), Some(PlayerState::Grounded));
        let body = &world.graph().get(player).unwrap().body;
        assert!(body.velocity.y.abs() < 0.0001);
        assert!((position_of(&world, player).y - 192.0).abs() < 0.01);
    }
}

// =============================================================================
// Footing
// =============================================================================

mod footing_tests {
    use super::*;

    #[test]
    fn grounded_player_stays_put() {
        let mut world = standing_player();
        let player = world.player_id().unwrap();
        let before = position_of(&world, player);
        run(&mut world, 30);
        assert_eq!(player_state(&world), Some(PlayerState::Grounded));
        assert_eq!(position_of(&world, player), before);
        assert_eq!(world.graph().get(player).unwrap().body.foot_sense(), 1);
    }

    #[test]
    fn losing_support_goes_airborne_on_the_next_frame() {
        let mut world = standing_player();
        let floor = ids_of(&world, Category::BLOCK)[0];

        world.graph_mut().get_mut(floor).unwrap().body.remove();
        assert_eq!(player_state(&world), Some(PlayerState::Grounded));

        world.step();
        assert!(world.graph().get(floor).is_none());
        let player = world.player_id().unwrap();
        assert_eq!(world.graph().get(player).unwrap().body.foot_sense(), 0);
        assert_eq!(player_state(&world), Some(PlayerState::Airborne));
    }

    #[test]
    fn enemy_walks_off_an_edge_and_falls() {
        let mut world = world_from(
            r#"{ "width": 320, "height": 240, "objects": [
                { "kind": "block", "position": [64, 192], "size": [32, 16] },
                { "kind": "goomba", "position": [72, 176], "size": [16, 16] }
            ] }"#,
        );
        run(&mut world, 5);
        let enemy = first_enemy(&world).unwrap();
        assert_eq!(enemy.state(), EnemyState::Grounded);

        // the sensor clears the edge after about 23 px at 40 px/s
        run(&mut world, 40);
        let enemy = first_enemy(&world).unwrap();
        assert_eq!(enemy.state(), EnemyState::Airborne);
    }
}

// =============================================================================
// Dispatch
// =============================================================================

mod dispatch_tests {
    use super::*;

    #[test]
    fn unmatched_mask_reaches_nobody() {
        let mut world = standing_player();
        world
            .commands_mut()
            .push(Command::new(Category::COINS, Action::Kill));
        world
            .commands_mut()
            .push(Command::new(Category::NONE, Action::Kill));
        world.step();
        assert_eq!(player_state(&world), Some(PlayerState::Grounded));
    }

    #[test]
    fn kill_reaches_the_player_through_its_composite() {
        let mut world = standing_player();
        world
            .commands_mut()
            .push(Command::new(Category::PLAYER, Action::Kill));
        world.step();
        assert_eq!(player_state(&world), Some(PlayerState::Dying));
    }

    #[test]
    fn dying_player_ignores_the_floor_and_leaves_the_world() {
        let mut world = standing_player();
        let player = world.player_id().unwrap();
        world
            .commands_mut()
            .push(Command::new(Category::PLAYER, Action::Kill));
        world.step();
        assert!(world.graph().get(player).unwrap().body.velocity.y < 0.0);

        run(&mut world, 20);
        assert!(position_of(&world, player).y > 192.0);
        assert_eq!(player_state(&world), Some(PlayerState::Dying));

        run(&mut world, 100);
        assert!(world.player().is_none());
        assert!(world.graph().get(player).is_none());
    }

    #[test]
    fn out_of_world_sweep_skips_static_tiles() {
        let mut world = world_from(
            r#"{ "width": 64, "height": 64, "objects": [
                { "kind": "block", "position": [500, 0], "size": [16, 16] },
                { "kind": "goomba", "position": [500, 0], "size": [16, 16] }
            ] }"#,
        );
        world.step();
        assert_eq!(ids_of(&world, Category::BLOCK).len(), 1);
        assert!(ids_of(&world, Category::ENEMY).is_empty());
    }
}

// =============================================================================
// Scene Edits
// =============================================================================

mod detach_tests {
    use super::*;

    #[test]
    fn detaching_a_non_child_leaves_the_tree_alone() {
        let mut world = standing_player();
        let player = world.player_id().unwrap();
        let back = world.back_layer();
        let nodes = world.graph().len();

        let err = world.graph_mut().detach(back, player).unwrap_err();
        assert_eq!(
            err,
            SceneError::NotAChild {
                parent: back,
                child: player
            }
        );
        assert_eq!(world.graph().len(), nodes);
        assert_eq!(
            world.graph().get(player).unwrap().parent(),
            Some(world.front_layer())
        );
    }

    #[test]
    fn detached_player_can_be_reattached_elsewhere() {
        let mut world = standing_player();
        let player = world.player_id().unwrap();
        let front = world.front_layer();
        let back = world.back_layer();

        let node = world.graph_mut().detach(front, player).unwrap();
        assert!(world.player().is_none());
        let id = world.graph_mut().attach(back, node).unwrap();
        assert_eq!(world.graph().get(id).unwrap().parent(), Some(back));
        assert_eq!(world.graph().get(id).unwrap().body.category, Category::SMALL_PLAYER);
    }
}
