//! Crate-level tests that drive whole worlds.
//!
//! Unit tests live next to the code they cover; this module holds the
//! tests that need a loaded level and several frames:
//! - **Scenario tests**: contact and command behavior checked end to end
//! - **Integration tests**: player-facing gameplay across many frames
//! - **Determinism tests**: identical inputs give identical worlds
//!
//! # Test Structure
//!
//! - `scenarios.rs`: Edge cases of footing, landing, dispatch and detach
//! - `integration.rs`: Walking, jumping, stomping, boxes, bricks, firing
//! - `determinism.rs`: Replays with equal and different seeds
//! - `helpers.rs`: Texture stubs, level builders and world accessors

mod helpers;
mod integration;
mod scenarios;

// Re-export for convenience
pub use helpers::*;
