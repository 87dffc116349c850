//! Systems - per-frame logic that operates on components

mod doors;
mod visibility;

pub use doors::*;
pub use visibility::*;
