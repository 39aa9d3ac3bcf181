//! Error types.
//!
//! Only startup and structural operations report errors. Once a [`World`]
//! is running, failures are absorbed in place: out-of-bounds bodies are
//! removed, contacts against destroyed bodies are ignored, and missing
//! animation frames fall back to a default frame.
//!
//! [`World`]: crate::world::World

use thiserror::Error;

use crate::render::TextureId;
use crate::scene::NodeId;

/// Structural errors raised by [`SceneGraph`](crate::scene::SceneGraph).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// The node is not a direct child of the given parent.
    #[error("node {child} is not a direct child of node {parent}")]
    NotAChild {
        /// Parent that was asked to give up the child.
        parent: NodeId,
        /// Node that was not found in the parent's children.
        child: NodeId,
    },
    /// No node with this id is attached to the graph.
    #[error("node {0} is not attached to the scene")]
    UnknownNode(NodeId),
}

/// Errors raised while reading or validating level data.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The level text is not valid JSON for the level schema.
    #[error("malformed level data: {0}")]
    Parse(#[from] serde_json::Error),
    /// The level file could not be read.
    #[error("failed to read level data: {0}")]
    Io(#[from] std::io::Error),
    /// An object has a zero or negative width or height.
    #[error("object {index} ({kind}) has a non-positive size")]
    InvalidSize {
        /// Position of the object in the level's object list.
        index: usize,
        /// Object kind, for diagnostics.
        kind: String,
    },
    /// A multi-coin box declares no coins.
    #[error("object {index} is a coins box with no coins")]
    EmptyBox {
        /// Position of the object in the level's object list.
        index: usize,
    },
    /// More than one player start is present.
    #[error("level declares {0} player starts, expected at most one")]
    DuplicatePlayer(usize),
    /// The level rectangle has no area.
    #[error("level dimensions must be positive")]
    InvalidDimensions,
}

/// Errors raised while acquiring visual resources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// The provider has no texture for this identifier.
    #[error("missing texture: {0}")]
    Missing(TextureId),
}

/// Fatal startup errors for [`World::new`](crate::world::World::new).
#[derive(Debug, Error)]
pub enum WorldError {
    /// Level data was rejected.
    #[error(transparent)]
    Level(#[from] LevelError),
    /// A required texture was unavailable.
    #[error(transparent)]
    Asset(#[from] AssetError),
    /// Scene construction failed.
    #[error(transparent)]
    Scene(#[from] SceneError),
}
