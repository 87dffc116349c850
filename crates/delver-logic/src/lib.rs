//! Pure dungeon layout logic for Delver.
//!
//! This crate contains everything about module placement that is
//! independent of the ECS world or any runtime. Functions take plain data
//! and return results, making them unit-testable and reusable by the
//! generator core and the headless harness alike.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Retry budgets, kind weights, tolerances (`GeneratorConfig`) |
//! | [`constants`] | Part kinds, socket size classes, connector kinds |
//! | [`geometry`] | Poses, bounds, capsules, socket-to-socket alignment |
//! | [`layout`] | Layout snapshot and validation (overlap, connectivity, connectors) |

pub mod config;
pub mod constants;
pub mod geometry;
pub mod layout;

pub use glam::{Quat, Vec3};
