//! Delver Core - socket-driven dungeon generation
//!
//! Grows a dungeon out of prefab modules by snapping sockets together,
//! either in one batch or on demand around a moving viewer.
//!
//! # Architecture
//!
//! The dungeon lives in a `hecs` ECS world:
//! - **Entities**: modules, connectors (doors, locked doors, fillers), scenery
//! - **Components**: pure data (`Transform`, `Collider`, `ModulePart`, `Links`, ...)
//! - **Generation**: the placement engine and the proximity driver
//! - **Systems**: per-frame logic (door triggers, visibility)
//!
//! # Example
//!
//! ```rust,no_run
//! use delver_core::prelude::*;
//!
//! let config = GeneratorConfig::seeded(42);
//! let mut engine = PlacementEngine::new(PrefabCatalog::standard(), config);
//! engine.generate(25)?;
//! engine.seal_unoccupied_sockets()?;
//! let layout = engine.snapshot();
//! # Ok::<(), delver_core::error::GenerationError>(())
//! ```

pub mod catalog;
pub mod components;
pub mod engine;
pub mod error;
pub mod generation;
pub mod snapshot;
pub mod spatial;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::catalog::{PrefabCatalog, PrefabId};
    pub use crate::components::*;
    pub use crate::engine::DungeonEngine;
    pub use crate::error::{CatalogError, GenerationError};
    pub use crate::generation::{ExpansionDriver, PlacementEngine, StepOutcome};
    pub use crate::spatial::{ColliderIndex, SpatialQuery};
    pub use delver_logic::config::GeneratorConfig;
}
