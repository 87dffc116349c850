//! Component definitions for the dungeon world.
//!
//! Components are pure data structs attached to entities.
//! The behaviour that moves them around lives in `generation` and `systems`.

mod common;
mod connector;
mod part;
mod socket;

pub use common::*;
pub use connector::*;
pub use part::*;
pub use socket::*;
