//! Collision detection and contact resolution.
//!
//! Runs once per frame over the bodies gathered by the collect broadcast.
//!
//! # Architecture
//!
//! 1. [`BroadPhase::detect`] tests every ordered pair of collected bodies:
//!    - primary box against primary box, recording the unordered
//!      [`CollisionPair`] once
//!    - foot sensor of the first against the primary box of the second,
//!      incrementing the first body's foot-sensor count
//! 2. [`resolve_contacts`] walks the pairs in canonical order, computes a
//!    [`Manifold`] from the current boxes and dispatches it to both sides:
//!    the second body first, then the first body with the reversed manifold.
//!
//! Both peers are snapshotted before either side resolves, so each side
//! reacts to the other's state as it was when the contact was detected.
//!
//! # Invariants
//!
//! - Each physical contact is represented once per frame, ordered by
//!   [`NodeId`].
//! - Destroyed bodies take part in neither detection nor resolution.
//! - Foot-sensor counts are written here and only read during the update
//!   that follows.
//!
//! The pair test is quadratic in the number of bodies, which stays in the
//! tens for a loaded level section.

mod manifold;

pub use manifold::Manifold;

use std::collections::BTreeSet;

use crate::entity::Contact;
use crate::geometry::Rect;
use crate::scene::{NodeId, SceneGraph};

/// Unordered pair of colliding bodies, stored with the smaller id first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollisionPair {
    first: NodeId,
    second: NodeId,
}

impl CollisionPair {
    /// Creates the canonical pair for two ids given in any order.
    #[must_use]
    pub fn new(a: NodeId, b: NodeId) -> Self {
        Self {
            first: a.min(b),
            second: a.max(b),
        }
    }

    /// The smaller id.
    #[must_use]
    pub const fn first(&self) -> NodeId {
        self.first
    }

    /// The larger id.
    #[must_use]
    pub const fn second(&self) -> NodeId {
        self.second
    }
}

/// World-space shapes of one collected body.
#[derive(Debug, Copy, Clone)]
struct Shape {
    id: NodeId,
    bounds: Rect,
    sensor: Option<Rect>,
}

/// All-pairs AABB detector with foot sensing.
#[derive(Debug, Clone, Default)]
pub struct BroadPhase {
    pairs: BTreeSet<CollisionPair>,
}

impl BroadPhase {
    /// Creates an empty detector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the pair set and foot-sensor counts for `bodies`.
    ///
    /// Ids that are no longer attached or whose bodies are destroyed are
    /// skipped.
    ///
    /// # Arguments
    ///
    /// * `graph` - Scene holding the bodies; foot-sensor counts are written
    /// * `bodies` - Bodies collected for this frame
    ///
    /// # Returns
    ///
    /// The overlapping pairs, in canonical order.
    pub fn detect(&mut self, graph: &mut SceneGraph, bodies: &[NodeId]) -> &BTreeSet<CollisionPair> {
        self.pairs.clear();

        let shapes: Vec<Shape> = bodies
            .iter()
            .filter(|id| graph.get(**id).is_some_and(|node| !node.body.is_destroyed()))
            .filter_map(|&id| {
                Some(Shape {
                    id,
                    bounds: graph.world_bounds(id)?,
                    sensor: graph.world_sensor(id),
                })
            })
            .collect();

        for shape in &shapes {
            if let Some(node) = graph.get_mut(shape.id) {
                node.body.reset_foot_sense();
            }
        }

        for a in &shapes {
            for b in &shapes {
                if a.id == b.id {
                    continue;
                }
                if a.bounds.intersects(&b.bounds) {
                    self.pairs.insert(CollisionPair::new(a.id, b.id));
                }
                if let Some(sensor) = a.sensor {
                    if sensor.intersects(&b.bounds) {
                        if let Some(node) = graph.get_mut(a.id) {
                            node.body.sense_ground();
                        }
                    }
                }
            }
        }

        tracing::trace!(bodies = shapes.len(), pairs = self.pairs.len(), "broad phase");
        &self.pairs
    }

    /// Pairs found by the last [`BroadPhase::detect`].
    #[must_use]
    pub fn pairs(&self) -> &BTreeSet<CollisionPair> {
        &self.pairs
    }
}

/// Resolves every pair through symmetric double dispatch.
///
/// For each pair the manifold is recomputed from the bodies' current boxes;
/// a pair separated by an earlier resolution in the same pass, or involving
/// a body destroyed earlier in the pass, is skipped. The second body resolves
/// first, then the first body receives the reversed manifold. A body
/// destroyed by its own response ignores any further contacts.
///
/// # Returns
///
/// The number of pairs that produced a manifold.
pub fn resolve_contacts<'a, I>(graph: &mut SceneGraph, pairs: I) -> usize
where
    I: IntoIterator<Item = &'a CollisionPair>,
{
    let mut resolved = 0;
    for pair in pairs {
        let (first, second) = (pair.first(), pair.second());
        let alive = |graph: &SceneGraph, id| graph.get(id).is_some_and(|n| !n.body.is_destroyed());
        if !alive(graph, first) || !alive(graph, second) {
            continue;
        }

        let (Some(first_bounds), Some(second_bounds)) =
            (graph.world_bounds(first), graph.world_bounds(second))
        else {
            continue;
        };
        let (Some(first_origin), Some(second_origin)) =
            (graph.world_position(first), graph.world_position(second))
        else {
            continue;
        };
        let Some(manifold) =
            Manifold::between(&first_bounds, first_origin, &second_bounds, second_origin)
        else {
            continue;
        };
        let (Some(first_peer), Some(second_peer)) = (graph.peer(first), graph.peer(second)) else {
            continue;
        };

        if let Some(node) = graph.get_mut(second) {
            let contact = Contact {
                manifold,
                other: first_peer,
            };
            node.entity.resolve(&mut node.body, &contact);
        }
        if let Some(node) = graph.get_mut(first) {
            let contact = Contact {
                manifold: manifold.reversed(),
                other: second_peer,
            };
            node.entity.resolve(&mut node.body, &contact);
        }
        resolved += 1;
    }
    resolved
}
