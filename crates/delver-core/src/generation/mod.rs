//! Generation - socket-driven placement of dungeon modules.

mod expansion;
mod placement;
pub mod selection;

pub use expansion::*;
pub use placement::*;
