//! Connector and scenery components.

use delver_logic::constants::ConnectorKind;

/// Marker left at a socket once it is linked or sealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connector {
    pub kind: ConnectorKind,
}

impl Connector {
    pub fn new(kind: ConnectorKind) -> Self {
        Self { kind }
    }
}

/// Trigger state of a traversable door.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoorState {
    pub open: bool,
    /// Whether the agent was inside the trigger last frame.
    pub agent_inside: bool,
}

/// Static level geometry placed outside the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenery {
    pub name: String,
}
