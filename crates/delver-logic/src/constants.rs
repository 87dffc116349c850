//! Shared enums: part kinds, socket size classes and connector kinds.
//!
//! Plain data with no ECS dependency. Both the generator core and the
//! headless harness use these.

use serde::{Deserialize, Serialize};

/// What a placed module is, structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartKind {
    Room,
    Hallway,
    DeadEnd,
    Entrance,
}

impl PartKind {
    pub fn all() -> &'static [PartKind] {
        &[
            PartKind::Room,
            PartKind::Hallway,
            PartKind::DeadEnd,
            PartKind::Entrance,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            PartKind::Room => "room",
            PartKind::Hallway => "hallway",
            PartKind::DeadEnd => "dead-end",
            PartKind::Entrance => "entrance",
        }
    }
}

/// Socket width class. Two sockets can only be joined when their classes match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SizeClass {
    #[default]
    Small,
    Large,
}

/// The marker object left at a socket once its fate is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorKind {
    /// Shared, traversable door between two linked parts.
    Door,
    /// Socket pruned because static scenery blocks it.
    LockedDoor,
    /// Wall sealing a socket nothing was ever attached to.
    Filler,
}

impl ConnectorKind {
    pub fn is_traversable(self) -> bool {
        matches!(self, ConnectorKind::Door)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_doors_are_traversable() {
        assert!(ConnectorKind::Door.is_traversable());
        assert!(!ConnectorKind::LockedDoor.is_traversable());
        assert!(!ConnectorKind::Filler.is_traversable());
    }

    #[test]
    fn test_default_size_class_is_small() {
        assert_eq!(SizeClass::default(), SizeClass::Small);
    }

    #[test]
    fn test_part_kind_labels_unique() {
        let labels: std::collections::HashSet<_> =
            PartKind::all().iter().map(|k| k.label()).collect();
        assert_eq!(labels.len(), PartKind::all().len());
    }
}
