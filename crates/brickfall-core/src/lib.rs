//! # Brickfall Core
//!
//! Runtime core for a 2D tile-based platform game.
//!
//! This crate owns the part of the game that decides, every frame, which
//! bodies touch, in what order contacts resolve and how each entity reacts.
//! Windowing, input devices, audio and rasterization stay outside; the core
//! talks to them through commands, a texture provider and a render sink.
//!
//! ## Architecture
//!
//! - **Scene** ([`scene`]): an arena-backed tree of transformable nodes with
//!   depth-first update, draw and mask-addressed command delivery
//! - **Command bus** ([`command`]): a FIFO of data-only commands addressed
//!   by [`Category`](category::Category) mask
//! - **Collision** ([`collision`]): all-pairs AABB detection with foot
//!   sensing and symmetric manifold dispatch
//! - **Behavior** ([`behavior`]): per-state update handlers and per-state,
//!   per-category contact tables driving every entity kind in [`entity`]
//! - **World** ([`world`]): the fixed per-frame order tying them together
//!
//! ## Usage
//!
//! ```rust,ignore
//! use brickfall_core::{config::WorldConfig, level::Level, world::World};
//!
//! let level = Level::from_reader(std::fs::File::open("level.json")?)?;
//! let mut world = World::new(&level, &mut atlas, WorldConfig::default())?;
//! loop {
//!     world.apply_input(InputAction::Jump);
//!     world.step();
//!     world.draw(&mut renderer);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod behavior;
pub mod category;
pub mod collision;
pub mod command;
pub mod config;
pub mod data;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod input;
pub mod level;
pub mod registry;
pub mod render;
pub mod scene;
pub mod world;

#[cfg(test)]
mod tests;
