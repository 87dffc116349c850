//! Error types for catalog loading and generation.

use hecs::Entity;
use thiserror::Error;

use crate::catalog::PrefabId;
use crate::components::SocketId;

/// A catalog that cannot drive generation.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no entrance prefab is assigned")]
    MissingEntrance,
    #[error("no door connector is assigned")]
    MissingDoor,
    #[error("no filler connector is assigned")]
    MissingFiller,
    #[error("room, special room and hallway pools are all empty")]
    EmptyPools,
    #[error("prefab id {0:?} is not in the catalog")]
    UnknownPrefab(PrefabId),
    #[error("prefab '{0}' has no sockets")]
    NoSockets(String),
    #[error("could not parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure of a generation call.
///
/// Running out of retries is not an error; it shows up as an abandoned
/// step in the call's report.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("configuration error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("entity {0:?} is not a placed module")]
    NotAModule(Entity),
    #[error("module {entity:?} has no {socket}")]
    NoSuchSocket { entity: Entity, socket: SocketId },
}
