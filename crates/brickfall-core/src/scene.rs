//! Scene graph: an owning tree of transformable nodes.
//!
//! The [`SceneGraph`] stores attached nodes in an arena keyed by
//! [`NodeId`]. Each stored [`Node`] records its parent id and an ordered list
//! of child ids; the graph owns every node reachable from the root. A
//! subtree outside the graph is an owned [`SceneNode`] value: attaching one
//! moves it into the arena, detaching returns it to the caller.
//!
//! # Architecture
//!
//! - **Ids**: assigned monotonically on attach and never reused, so
//!   iteration over the `BTreeMap` is deterministic and a stale id simply
//!   fails to resolve. Ids are only meaningful while a node is attached; a
//!   detached and re-attached subtree receives fresh ids.
//! - **Transforms**: a node's world transform is its ancestors' transforms
//!   applied before its own (`parent_world * local`).
//! - **Traversal**: update, draw and command delivery all walk the tree
//!   depth-first in attachment order, parent before children.
//!
//! # Invariants
//!
//! - Every non-root node has exactly one parent, and appears exactly once in
//!   that parent's child list.
//! - Nodes are never removed mid-traversal; dead nodes are marked and later
//!   dropped by [`SceneGraph::prune`].
//!
//! # Example
//!
//! ```
//! use brickfall_core::category::Category;
//! use brickfall_core::entity::{Body, Entity};
//! use brickfall_core::scene::{SceneGraph, SceneNode};
//! use glam::Vec2;
//!
//! let mut graph = SceneGraph::new();
//! let layer = graph
//!     .attach(graph.root(), SceneNode::layer(Category::FRONT_LAYER).at(Vec2::new(100.0, 0.0)))
//!     .unwrap();
//! let child = graph
//!     .attach(layer, SceneNode::new(Body::new(Category::BLOCK).at(Vec2::new(5.0, 5.0)), Entity::Layer))
//!     .unwrap();
//!
//! assert_eq!(graph.world_position(child), Some(Vec2::new(105.0, 5.0)));
//!
//! let detached = graph.detach(layer, child).unwrap();
//! assert!(!graph.contains(child));
//! assert_eq!(detached.body.position(), Vec2::new(5.0, 5.0));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::command::{Action, Command, CommandQueue};
use crate::entity::{Body, Entity, Peer, UpdateContext};
use crate::error::SceneError;
use crate::geometry::Rect;
use crate::render::RenderSink;

// =============================================================================
// Node Identity
// =============================================================================

/// Identifier of a node attached to a [`SceneGraph`].
///
/// Ordered by numeric value, which is also attachment order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Creates a `NodeId` from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

// =============================================================================
// Detached Subtrees
// =============================================================================

/// An owned subtree that is not part of any graph.
#[derive(Debug)]
pub struct SceneNode {
    /// Physical state of the subtree root.
    pub body: Body,
    /// Gameplay state of the subtree root.
    pub entity: Entity,
    children: Vec<SceneNode>,
}

impl SceneNode {
    /// Creates a childless node.
    #[must_use]
    pub fn new(body: Body, entity: Entity) -> Self {
        Self {
            body,
            entity,
            children: Vec::new(),
        }
    }

    /// Creates a behavior-less grouping node.
    #[must_use]
    pub fn layer(category: Category) -> Self {
        Self::new(Body::new(category), Entity::Layer)
    }

    /// Sets the local position.
    #[must_use]
    pub fn at(mut self, position: Vec2) -> Self {
        self.body.transform.position = position;
        self
    }

    /// Appends a child.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Appends a child.
    pub fn push_child(&mut self, child: Self) {
        self.children.push(child);
    }

    /// Children in attachment order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Number of nodes in the subtree, including this one.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_len).sum::<usize>()
    }
}

// =============================================================================
// Attached Nodes
// =============================================================================

/// A node stored in the graph.
#[derive(Debug)]
pub struct Node {
    /// Physical state.
    pub body: Body,
    /// Gameplay state.
    pub entity: Entity,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// Parent id, or `None` for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child ids in attachment order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena-backed owning tree of scene nodes.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates a graph holding only a root node of category
    /// [`Category::NONE`].
    #[must_use]
    pub fn new() -> Self {
        let root = NodeId::new(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(
            root,
            Node {
                body: Body::new(Category::NONE),
                entity: Entity::Layer,
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    /// Id of the root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Number of attached nodes, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if only the root is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Returns true if `id` is attached.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Returns an attached node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns an attached node mutably.
    #[must_use]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Iterates over attached nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Iterates mutably over attached nodes in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut Node)> + '_ {
        self.nodes.iter_mut().map(|(id, node)| (*id, node))
    }

    // -------------------------------------------------------------------------
    // Ownership
    // -------------------------------------------------------------------------

    /// Moves `node` and its descendants into the graph under `parent`.
    ///
    /// The subtree is appended after the parent's existing children and its
    /// nodes receive ids in depth-first order.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownNode`] if `parent` is not attached.
    pub fn attach(&mut self, parent: NodeId, node: SceneNode) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(&parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        Ok(self.insert_subtree(parent, node))
    }

    fn insert_subtree(&mut self, parent: NodeId, node: SceneNode) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;

        let SceneNode {
            body,
            entity,
            children,
        } = node;
        self.nodes.insert(
            id,
            Node {
                body,
                entity,
                parent: Some(parent),
                children: Vec::new(),
            },
        );
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.push(id);
        }
        for child in children {
            self.insert_subtree(id, child);
        }
        id
    }

    /// Removes `child` and its descendants from under `parent` and returns
    /// them as an owned subtree.
    ///
    /// # Errors
    ///
    /// - [`SceneError::UnknownNode`] if `parent` is not attached
    /// - [`SceneError::NotAChild`] if `child` is not a direct child of
    ///   `parent`
    pub fn detach(&mut self, parent: NodeId, child: NodeId) -> Result<SceneNode, SceneError> {
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(SceneError::UnknownNode(parent))?;
        let index = parent_node
            .children
            .iter()
            .position(|id| *id == child)
            .ok_or(SceneError::NotAChild { parent, child })?;
        parent_node.children.remove(index);
        self.take_subtree(child)
            .ok_or(SceneError::UnknownNode(child))
    }

    fn take_subtree(&mut self, id: NodeId) -> Option<SceneNode> {
        let node = self.nodes.remove(&id)?;
        let children = node
            .children
            .into_iter()
            .filter_map(|child| self.take_subtree(child))
            .collect();
        Some(SceneNode {
            body: node.body,
            entity: node.entity,
            children,
        })
    }

    // -------------------------------------------------------------------------
    // Transforms
    // -------------------------------------------------------------------------

    /// World transform of `id`: ancestors applied before the node itself.
    #[must_use]
    pub fn world_transform(&self, id: NodeId) -> Option<Affine2> {
        let mut node = self.nodes.get(&id)?;
        let mut world = node.body.transform.matrix();
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            world = node.body.transform.matrix() * world;
        }
        Some(world)
    }

    /// World position of the origin of `id`.
    #[must_use]
    pub fn world_position(&self, id: NodeId) -> Option<Vec2> {
        self.world_transform(id).map(|world| world.translation)
    }

    /// Primary bounding box of `id` in world space.
    #[must_use]
    pub fn world_bounds(&self, id: NodeId) -> Option<Rect> {
        let world = self.world_transform(id)?;
        Some(self.nodes.get(&id)?.body.bounds.transformed(&world))
    }

    /// Foot-sensor box of `id` in world space, if it has one.
    #[must_use]
    pub fn world_sensor(&self, id: NodeId) -> Option<Rect> {
        let world = self.world_transform(id)?;
        let sensor = self.nodes.get(&id)?.body.foot_sensor?;
        Some(sensor.transformed(&world))
    }

    /// Converts a world position into the local space of `id`'s children.
    #[must_use]
    pub fn to_local(&self, id: NodeId, world_position: Vec2) -> Vec2 {
        self.world_transform(id)
            .map_or(world_position, |world| {
                world.inverse().transform_point2(world_position)
            })
    }

    /// Snapshot of `id` as seen by the other side of a contact.
    #[must_use]
    pub fn peer(&self, id: NodeId) -> Option<Peer> {
        let node = self.nodes.get(&id)?;
        Some(Peer {
            id,
            category: node.body.category,
            flags: node.entity.peer_flags(&node.body),
            velocity: node.body.velocity,
        })
    }

    // -------------------------------------------------------------------------
    // Traversal
    // -------------------------------------------------------------------------

    /// Ids in depth-first pre-order from the root, children in attachment
    /// order.
    #[must_use]
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                order.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    /// Ids of every node `command` is delivered to, in delivery order.
    #[must_use]
    pub fn command_targets(&self, mask: Category) -> Vec<NodeId> {
        self.depth_first()
            .into_iter()
            .filter(|id| {
                self.nodes
                    .get(id)
                    .is_some_and(|node| node.body.category.intersects(mask))
            })
            .collect()
    }

    /// Delivers `command` to every node whose category intersects its mask.
    ///
    /// Targets are fixed before the first delivery, so nodes attached by the
    /// handler are not visited, and a target removed by an earlier delivery
    /// is skipped. Non-matching nodes never stop the walk from reaching
    /// their descendants.
    ///
    /// # Returns
    ///
    /// The number of nodes the handler ran for.
    pub fn on_command<F>(&mut self, command: &Command, mut handler: F) -> usize
    where
        F: FnMut(&mut Self, NodeId, &Action),
    {
        let mut delivered = 0;
        for id in self.command_targets(command.mask) {
            if self.contains(id) {
                handler(self, id, &command.action);
                delivered += 1;
            }
        }
        delivered
    }

    /// Runs one tick for every node, parent before children.
    ///
    /// Children are read from the parent after its own update, using the
    /// parent's updated transform. Nodes attached during the traversal are
    /// first visited next tick.
    pub fn update(&mut self, dt: f32, commands: &mut CommandQueue) {
        self.update_node(self.root, Affine2::IDENTITY, dt, commands);
    }

    fn update_node(&mut self, id: NodeId, parent_world: Affine2, dt: f32, commands: &mut CommandQueue) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        let world = parent_world * node.body.transform.matrix();
        let mut ctx = UpdateContext::new(dt, id, world, commands);
        node.entity.update(&mut node.body, &mut ctx);

        let world = parent_world * node.body.transform.matrix();
        let children = node.children.clone();
        for child in children {
            self.update_node(child, world, dt, commands);
        }
    }

    /// Draws the whole tree.
    pub fn draw(&self, sink: &mut dyn RenderSink) {
        self.draw_subtree(self.root, Affine2::IDENTITY, sink);
    }

    /// Draws `id` and its descendants.
    ///
    /// # Arguments
    ///
    /// * `id` - Subtree root
    /// * `accumulated` - World transform of `id`'s parent
    /// * `sink` - Receiver of draw calls
    pub fn draw_subtree(&self, id: NodeId, accumulated: Affine2, sink: &mut dyn RenderSink) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let world = accumulated * node.body.transform.matrix();
        node.entity.draw(&node.body, world, sink);
        for child in &node.children {
            self.draw_subtree(*child, world, sink);
        }
    }

    /// Drops every non-root node marked for removal, with its descendants.
    ///
    /// A single top-down sweep: a marked node takes its whole subtree with
    /// it, so nothing below it needs checking. Calling it again without any
    /// new marks removes nothing.
    ///
    /// # Returns
    ///
    /// Ids of every removed node.
    pub fn prune(&mut self) -> Vec<NodeId> {
        let mut removed = Vec::new();
        for id in self.depth_first() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if id == self.root || !node.body.is_marked_for_removal() {
                continue;
            }
            if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
                parent.children.retain(|child| *child != id);
            }
            self.drop_subtree(id, &mut removed);
        }
        if !removed.is_empty() {
            tracing::debug!(removed = removed.len(), "pruned scene nodes");
        }
        removed
    }

    fn drop_subtree(&mut self, id: NodeId, removed: &mut Vec<NodeId>) {
        if let Some(node) = self.nodes.remove(&id) {
            removed.push(id);
            for child in node.children {
                self.drop_subtree(child, removed);
            }
        }
    }
}
